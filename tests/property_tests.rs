use dupsweep::duplicates::group_by_digest;
use dupsweep::scanner::{hash_to_hex, hex_to_hash, FileEntry, HashAlgorithm, Hasher, HasherConfig};
use proptest::prelude::*;
use sha2::{Digest as _, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

proptest! {
    #[test]
    fn test_hash_determinism(content in prop::collection::vec(any::<u8>(), 0..20_000)) {
        let hasher = Hasher::new();
        let first = hasher.hash_reader(Cursor::new(&content)).unwrap();
        let second = hasher.hash_reader(Cursor::new(&content)).unwrap();

        prop_assert_eq!(first, second);
        let expected: [u8; 32] = Sha256::digest(&content).into();
        prop_assert_eq!(first, expected);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest(
        content in prop::collection::vec(any::<u8>(), 0..20_000),
        chunk_size in 1usize..10_000,
        blake in any::<bool>(),
    ) {
        let algorithm = if blake { HashAlgorithm::Blake3 } else { HashAlgorithm::Sha256 };
        let reference = Hasher::with_config(HasherConfig::default().with_algorithm(algorithm))
            .hash_reader(Cursor::new(&content))
            .unwrap();
        let chunked = Hasher::with_config(
            HasherConfig::default()
                .with_algorithm(algorithm)
                .with_chunk_size(chunk_size),
        )
        .hash_reader(Cursor::new(&content))
        .unwrap();

        prop_assert_eq!(reference, chunked);
    }

    #[test]
    fn test_hex_roundtrip(digest in prop::array::uniform32(any::<u8>())) {
        let hex = hash_to_hex(&digest);
        prop_assert_eq!(hex.len(), 64);
        prop_assert_eq!(hex_to_hash(&hex), Some(digest));
    }

    #[test]
    fn test_group_by_digest_invariants(keys in prop::collection::vec(0u8..8, 0..60)) {
        let items: Vec<([u8; 32], FileEntry)> = keys
            .iter()
            .enumerate()
            .map(|(i, &k)| ([k; 32], FileEntry::new(PathBuf::from(format!("/f/{i}")), u64::from(k), i)))
            .collect();

        let mut counts: HashMap<u8, usize> = HashMap::new();
        for &k in &keys {
            *counts.entry(k).or_default() += 1;
        }

        let groups = group_by_digest(items);

        // Exactly the digests seen twice or more produce a group.
        let shared = counts.values().filter(|&&n| n > 1).count();
        prop_assert_eq!(groups.len(), shared);

        let mut seen = Vec::new();
        for group in &groups {
            prop_assert!(group.len() >= 2);
            prop_assert_eq!(group.len(), counts[&group.hash[0]]);
            for file in &group.files {
                prop_assert_eq!(keys[file.index], group.hash[0]);
                prop_assert_eq!(file.size, group.size);
                seen.push(file.index);
            }
            prop_assert!(group.files.windows(2).all(|w| w[0].index < w[1].index));
        }

        // No file belongs to two groups.
        let before = seen.len();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), before);

        // Groups ordered by their first member.
        prop_assert!(groups.windows(2).all(|w| w[0].files[0].index < w[1].files[0].index));
    }

    #[test]
    fn test_grouping_ignores_arrival_order(
        keys in prop::collection::vec(0u8..5, 0..40),
        seed in any::<u64>(),
    ) {
        let items: Vec<([u8; 32], FileEntry)> = keys
            .iter()
            .enumerate()
            .map(|(i, &k)| ([k; 32], FileEntry::new(PathBuf::from(format!("/f/{i}")), 1, i)))
            .collect();

        let mut shuffled = items.clone();
        let len = shuffled.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let j = usize::try_from(state % (i as u64 + 1)).unwrap();
                shuffled.swap(i, j);
            }
        }

        prop_assert_eq!(group_by_digest(items), group_by_digest(shuffled));
    }
}
