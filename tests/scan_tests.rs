use dupsweep::duplicates::{find_duplicates, DuplicateFinder, FinderConfig};
use dupsweep::scanner::{ExcludeMode, HashAlgorithm, Hasher, HasherConfig, WalkerConfig};
use sha2::{Digest as _, Sha256};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn rel_paths(root: &Path, group: &dupsweep::duplicates::DuplicateGroup) -> Vec<String> {
    group
        .files
        .iter()
        .map(|f| {
            f.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_groups_of_two_and_three() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a1.txt", b"AAAA");
    write(dir.path(), "a2.txt", b"AAAA");
    write(dir.path(), "b1.txt", b"BBBB");
    write(dir.path(), "b2.txt", b"BBBB");
    write(dir.path(), "b3.txt", b"BBBB");
    write(dir.path(), "c1.txt", b"CCCC");

    let (groups, summary) = find_duplicates(dir.path(), &[]).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(rel_paths(dir.path(), &groups[0]), vec!["a1.txt", "a2.txt"]);
    assert_eq!(
        rel_paths(dir.path(), &groups[1]),
        vec!["b1.txt", "b2.txt", "b3.txt"]
    );
    assert!(groups
        .iter()
        .all(|g| g.files.iter().all(|f| !f.path.ends_with("c1.txt"))));
    assert_eq!(summary.duplicate_files, 3);
    assert_eq!(summary.reclaimable_space, 12);
}

#[test]
fn test_digest_is_sha256_of_content() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x", b"hello world");
    write(dir.path(), "y", b"hello world");

    let (groups, _) = find_duplicates(dir.path(), &[]).unwrap();

    let expected: [u8; 32] = Sha256::digest(b"hello world").into();
    assert_eq!(groups[0].hash, expected);
}

#[test]
fn test_nested_directories_grouped_in_walk_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "z_top.txt", b"same");
    write(dir.path(), "a_dir/deep/copy.txt", b"same");
    write(dir.path(), "m_dir/copy.txt", b"same");

    let (groups, _) = find_duplicates(dir.path(), &[]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(
        rel_paths(dir.path(), &groups[0]),
        vec!["a_dir/deep/copy.txt", "m_dir/copy.txt", "z_top.txt"]
    );
}

#[test]
fn test_excluded_paths_never_grouped() {
    let dir = tempdir().unwrap();
    write(dir.path(), "src/main.py", b"print(1)");
    write(dir.path(), ".git/objects/ab", b"print(1)");
    write(dir.path(), "__pycache__/main.pyc", b"print(1)");
    write(dir.path(), "node_modules/pkg/index.js", b"print(1)");

    let excluded = WalkerConfig::default_excludes();
    let (groups, summary) = find_duplicates(dir.path(), &excluded).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.hashed_files, 1);
    assert_eq!(summary.excluded_paths, 3);
}

#[test]
fn test_substring_exclusion_also_hits_file_names() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep.txt", b"dup");
    write(dir.path(), "my_venvault.txt", b"dup");

    let excluded = vec!["venv".to_string()];
    let (substring, _) = find_duplicates(dir.path(), &excluded).unwrap();
    assert!(substring.is_empty());

    let config = FinderConfig::default().with_walker_config(
        WalkerConfig::default()
            .with_excluded(excluded)
            .with_exclude_mode(ExcludeMode::Segment),
    );
    let (segment, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(segment.len(), 1);
}

#[test]
fn test_parallel_hashing_keeps_discovery_order() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(dir.path(), &format!("f{i:02}.bin"), &[(i % 4) as u8; 2048]);
    }

    let sequential = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap()
        .0;
    let parallel = DuplicateFinder::new(FinderConfig::default().with_io_threads(8))
        .find_duplicates(dir.path())
        .unwrap()
        .0;

    assert_eq!(sequential, parallel);
    assert_eq!(parallel.len(), 4);
    assert!(parallel[0].files[0].path.ends_with("f00.bin"));
    for group in &parallel {
        assert!(group.files.windows(2).all(|w| w[0].index < w[1].index));
    }
}

#[test]
fn test_repeated_scans_are_identical() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one/a", b"x");
    write(dir.path(), "two/a", b"x");
    write(dir.path(), "three/b", b"y");
    write(dir.path(), "four/b", b"y");

    let first = find_duplicates(dir.path(), &[]).unwrap().0;
    let second = find_duplicates(dir.path(), &[]).unwrap().0;

    assert_eq!(first, second);
}

#[test]
fn test_blake3_groups_the_same_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"content");
    write(dir.path(), "b", b"content");
    write(dir.path(), "c", b"other");

    let config = FinderConfig::default()
        .with_hasher_config(HasherConfig::default().with_algorithm(HashAlgorithm::Blake3));
    let (groups, _) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].hash, *blake3::hash(b"content").as_bytes());
}

#[test]
fn test_large_file_hashed_in_chunks() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..5 * 1024 * 1024 + 17).map(|i| (i % 251) as u8).collect();
    write(dir.path(), "big1.bin", &content);
    write(dir.path(), "big2.bin", &content);

    let (groups, _) = find_duplicates(dir.path(), &[]).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, content.len() as u64);

    let expected: [u8; 32] = Sha256::digest(&content).into();
    let small_chunks = Hasher::with_config(HasherConfig::default().with_chunk_size(1000));
    assert_eq!(small_chunks.hash_file(&dir.path().join("big1.bin")).unwrap(), expected);
}

#[test]
fn test_no_duplicates_is_not_an_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"2");

    let (groups, summary) = find_duplicates(dir.path(), &[]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 2);
    assert!(!summary.has_errors());
}

#[test]
fn test_max_size_filter_skips_large_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1", b"tiny");
    write(dir.path(), "small2", b"tiny");
    write(dir.path(), "large1", &[1u8; 1000]);
    write(dir.path(), "large2", &[1u8; 1000]);

    let config = FinderConfig::default().with_walker_config(WalkerConfig::new(
        Vec::new(),
        ExcludeMode::Substring,
        Some(100),
    ));
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 4);
    assert_eq!(summary.total_files, 2);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"dup");
    write(dir.path(), "b", b"dup");
    write(dir.path(), "locked", b"dup");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read it anyway.
    if fs::read(&locked).is_ok() {
        return;
    }

    let (groups, summary) = find_duplicates(dir.path(), &[]).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failed_files, 1);
    assert!(summary.has_errors());
}
