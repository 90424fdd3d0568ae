use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dupsweep::duplicates::{group_by_digest, DuplicateFinder, FinderConfig};
use dupsweep::scanner::{FileEntry, HashAlgorithm, Hasher, HasherConfig, Walker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Binary tree of directories, `files_per_dir` files in each; every fourth
// file shares content with its neighbours.
fn setup_test_dir(depth: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    create_dir_recursive(temp_dir.path(), depth, files_per_dir);
    temp_dir
}

fn create_dir_recursive(path: &Path, depth: usize, files_per_dir: usize) {
    if depth == 0 {
        return;
    }
    fs::create_dir_all(path).expect("Failed to create dir");

    for i in 0..files_per_dir {
        let content = format!("content block {}", i % 4);
        fs::write(path.join(format!("file_{i}.txt")), content).expect("Failed to write file");
    }

    for i in 0..2 {
        create_dir_recursive(&path.join(format!("dir_{i}")), depth - 1, files_per_dir);
    }
}

fn bench_walker(c: &mut Criterion) {
    let temp_dir = setup_test_dir(4, 10);

    c.bench_function("walker_150_files", |b| {
        b.iter(|| {
            let walker = Walker::new(temp_dir.path(), WalkerConfig::default());
            let files: Vec<_> = walker.walk().collect();
            black_box(files);
        });
    });
}

fn bench_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");

    for size_kb in [1, 1024, 10240] {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bench_file.dat");
        fs::write(&file_path, vec![b'a'; size_kb * 1024]).expect("Failed to write bench file");

        for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
            let hasher = Hasher::with_config(HasherConfig::default().with_algorithm(algorithm));
            group.bench_with_input(
                format!("{algorithm:?}_{size_kb}KB"),
                &file_path,
                |b, path| {
                    b.iter(|| black_box(hasher.hash_file(path).unwrap()));
                },
            );
        }
    }
    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let items: Vec<([u8; 32], FileEntry)> = (0..10_000)
        .map(|i| {
            let digest = [(i % 997) as u8; 32];
            (digest, FileEntry::new(PathBuf::from(format!("/f/{i}")), 64, i))
        })
        .collect();

    c.bench_function("group_by_digest_10k", |b| {
        b.iter(|| black_box(group_by_digest(items.clone())));
    });
}

fn bench_full_scan(c: &mut Criterion) {
    let temp_dir = setup_test_dir(5, 20);
    let mut group = c.benchmark_group("full_scan");

    for threads in [1, 4] {
        group.bench_function(format!("threads_{threads}"), |b| {
            b.iter(|| {
                let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(threads));
                black_box(finder.find_duplicates(temp_dir.path()).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_walker,
    bench_hasher,
    bench_grouping,
    bench_full_scan
);
criterion_main!(benches);
