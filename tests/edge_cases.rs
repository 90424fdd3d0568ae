use dupsweep::actions::{remove_duplicates, RemovalConfig};
use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
use std::fs::{self, File};
use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1.txt")).unwrap();
    File::create(dir.path().join("empty2.txt")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 0);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_empty_root() {
    let dir = tempdir().unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert!((summary.wasted_percentage() - 0.0).abs() < f64::EPSILON);
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"abcd").unwrap();
    fs::write(dir.path().join("b"), b"abce").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
}

#[test]
fn test_special_characters_in_filenames() {
    let dir = tempdir().unwrap();

    let names = [
        ("file with spaces.txt", "duplicate1.txt", b"content".as_slice()),
        ("café_🦀.txt", "duplicate2.txt", b"unicode content".as_slice()),
        ("special_!@#$%^&()_+.txt", "duplicate3.txt", b"special content".as_slice()),
    ];
    for (name, copy, content) in names {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(content)
            .unwrap();
        fs::write(dir.path().join(copy), content).unwrap();
    }

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 3);
    assert!(groups
        .iter()
        .flat_map(|g| &g.files)
        .any(|f| f.path.ends_with("café_🦀.txt")));
}

#[test]
fn test_deeply_nested_paths() {
    let dir = tempdir().unwrap();
    let mut current = dir.path().to_path_buf();
    for i in 0..15 {
        current = current.join(format!("level_{i}"));
    }
    fs::create_dir_all(&current).unwrap();
    fs::write(current.join("deep.txt"), b"deep content").unwrap();
    fs::write(dir.path().join("shallow.txt"), b"deep content").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files[0].path.ends_with("deep.txt"));
    assert_eq!(summary.total_files, 2);
}

#[test]
fn test_shutdown_before_scan_returns_partial() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();
    fs::write(dir.path().join("b"), b"x").unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let config = FinderConfig::default().with_shutdown_flag(flag);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(summary.interrupted);
    assert!(groups.is_empty());
    assert_eq!(summary.failed_files, 0);
}

#[test]
fn test_shutdown_stops_removal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();
    fs::write(dir.path().join("b"), b"x").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let report = remove_duplicates(
        &groups,
        &RemovalConfig::default().with_shutdown_flag(flag),
    );

    assert!(report.interrupted);
    assert_eq!(report.deleted_count(), 0);
    assert!(dir.path().join("b").exists());
}

#[cfg(unix)]
#[test]
fn test_symlink_removal_leaves_target() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let target = dir.path().join("a_target.txt");
    fs::write(&target, b"linked content").unwrap();
    symlink(&target, dir.path().join("b_link.txt")).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].files[1].is_symlink);

    let report = remove_duplicates(&groups, &RemovalConfig::default());

    assert_eq!(report.deleted_count(), 1);
    assert_eq!(report.bytes_freed, 0);
    assert!(fs::symlink_metadata(dir.path().join("b_link.txt")).is_err());
    assert_eq!(fs::read(&target).unwrap(), b"linked content");
}

#[cfg(unix)]
#[test]
fn test_symlinked_original_preserves_its_target() {
    use dupsweep::actions::RemovalOutcome;
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let target = dir.path().join("b_target.txt");
    let link = dir.path().join("a_link.txt");
    fs::write(&target, b"linked content").unwrap();
    symlink(&target, &link).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].files[0].is_symlink);
    assert_eq!(summary.reclaimable_space, 0);

    let report = remove_duplicates(&groups, &RemovalConfig::default());

    assert_eq!(report.deleted_count(), 0);
    assert_eq!(report.entries[1].outcome, RemovalOutcome::KeptLinkTarget);
    assert_eq!(fs::read(&target).unwrap(), b"linked content");
    assert_eq!(fs::read(&link).unwrap(), b"linked content");
}

#[cfg(unix)]
#[test]
fn test_hardlinks_reclaim_nothing() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("a.bin");
    fs::write(&original, vec![7u8; 1000]).unwrap();
    fs::hard_link(&original, dir.path().join("b.bin")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.reclaimable_space, 0);

    let dry = remove_duplicates(&groups, &RemovalConfig::default().with_dry_run(true));
    assert_eq!(dry.bytes_would_free, 0);

    let report = remove_duplicates(&groups, &RemovalConfig::default());
    assert_eq!(report.deleted_count(), 1);
    assert_eq!(report.bytes_freed, 0);
    assert_eq!(fs::read(&original).unwrap().len(), 1000);
}

#[cfg(unix)]
#[test]
fn test_directory_symlink_not_followed() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("file.txt"), b"only once").unwrap();
    symlink(&real, dir.path().join("alias")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}
