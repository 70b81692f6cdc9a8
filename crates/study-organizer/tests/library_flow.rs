use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use study_organizer::{
    query, Category, CategoryFilter, Config, ErrorKind, MaterialsLibrary, SortKey,
};

struct Fixture {
    _dir: TempDir,
    library: MaterialsLibrary,
    source: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let library = MaterialsLibrary::open(Config::new(dir.path().join("StudyMaterials"))).unwrap();
    let source = dir.path().join("downloads");
    fs::create_dir(&source).unwrap();
    Fixture {
        _dir: dir,
        library,
        source,
    }
}

fn write(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![b'x'; len]).unwrap();
    path
}

fn paths(library: &MaterialsLibrary) -> BTreeSet<PathBuf> {
    library
        .entries()
        .iter()
        .map(|e| e.path().to_path_buf())
        .collect()
}

fn ingest_sample(f: &mut Fixture) {
    for (name, len) in [("a.pdf", 10), ("b.jpg", 20), ("notes.txt", 5)] {
        let file = write(&f.source, name, len);
        f.library.ingest_file(&file).unwrap();
    }
}

#[test]
fn ingest_three_files_and_aggregate() {
    let mut f = fixture();
    ingest_sample(&mut f);

    let categories: BTreeSet<Category> = f.library.entries().iter().map(|e| e.category()).collect();
    let stats = f.library.stats();

    assert_eq!(f.library.len(), 3);
    assert_eq!(
        categories,
        BTreeSet::from([Category::Pdf, Category::Images, Category::Documents])
    );
    assert_eq!(stats.count(Category::Pdf), 1);
    assert_eq!(stats.count(Category::Images), 1);
    assert_eq!(stats.count(Category::Documents), 1);
    assert_eq!(stats.counts_by_category.len(), 3);
    assert_eq!(stats.total, 3);
    assert!((stats.progress - 0.06).abs() < 1e-9);
}

#[test]
fn query_by_name_fragment() {
    let mut f = fixture();
    ingest_sample(&mut f);

    let results = query(&f.library.entries(), "b", CategoryFilter::All, SortKey::Name);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name(), "b.jpg");
}

#[test]
fn organize_then_rescan() {
    let mut f = fixture();
    ingest_sample(&mut f);
    let root = f.library.root().to_path_buf();

    let report = f.library.organize();
    assert!(report.is_clean());
    assert_eq!(report.moved.len(), 3);
    // organize leaves the index alone
    assert!(f.library.get(&root.join("a.pdf")).is_some());

    f.library.rescan().unwrap();

    assert!(root.join("PDF").is_dir());
    assert!(root.join("Images").is_dir());
    assert!(root.join("Documents").is_dir());
    assert_eq!(
        paths(&f.library),
        BTreeSet::from([
            root.join("PDF/a.pdf"),
            root.join("Images/b.jpg"),
            root.join("Documents/notes.txt"),
        ])
    );
    let pdf = f.library.get(&root.join("PDF/a.pdf")).unwrap();
    assert_eq!(pdf.category(), Category::Pdf);
    assert_eq!(pdf.size(), 10);

    let again = f.library.organize();
    assert!(again.moved.is_empty());
    assert!(again.is_clean());
}

#[test]
fn ingest_folder_then_rescan_matches_disk() {
    let mut f = fixture();
    fs::create_dir_all(f.source.join("term1/week2")).unwrap();
    write(&f.source, "outline.rtf", 3);
    write(&f.source.join("term1"), "lecture.mp4", 30);
    write(&f.source.join("term1/week2"), "diagram.bmp", 7);

    let result = f.library.ingest_folder(&f.source);
    assert!(result.is_clean());
    let incremental = paths(&f.library);

    f.library.rescan().unwrap();

    assert_eq!(paths(&f.library), incremental);
    assert_eq!(incremental.len(), 3);
}

#[test]
fn same_file_twice_is_one_entry() {
    let mut f = fixture();
    let file = write(&f.source, "syllabus.pdf", 4);

    let first = f.library.ingest_file(&file).unwrap();
    let second = f.library.ingest_file(&file).unwrap();

    assert_eq!(first, second);
    assert_eq!(f.library.len(), 1);
}

#[test]
fn organize_collision_moves_one_and_reports_other() {
    let mut f = fixture();
    let root = f.library.root().to_path_buf();
    fs::create_dir_all(root.join("old")).unwrap();
    fs::create_dir_all(root.join("older")).unwrap();
    fs::write(root.join("old/summary.docx"), b"one").unwrap();
    fs::write(root.join("older/summary.docx"), b"two").unwrap();
    f.library.rescan().unwrap();

    let report = f.library.organize();

    assert_eq!(report.moved.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].error.kind(), ErrorKind::Collision);
    let kept = fs::read(root.join("Documents/summary.docx")).unwrap();
    let left = fs::read(&report.failures[0].path).unwrap();
    assert_ne!(kept, left);
}

#[test]
fn remove_then_rescan_agree() {
    let mut f = fixture();
    ingest_sample(&mut f);
    let target = f.library.root().join("b.jpg");

    f.library.remove(&target).unwrap();
    let incremental = paths(&f.library);
    f.library.rescan().unwrap();

    assert_eq!(paths(&f.library), incremental);
    assert!(!target.exists());
    assert_eq!(
        f.library.remove(&target).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn rename_outside_library_changes_category_on_rescan() {
    let mut f = fixture();
    let file = write(&f.source, "scan.pdf", 2);
    let entry = f.library.ingest_file(&file).unwrap();
    assert_eq!(entry.category(), Category::Pdf);

    fs::rename(entry.path(), f.library.root().join("scan.png")).unwrap();
    f.library.rescan().unwrap();

    let entries = f.library.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category(), Category::Images);
}

#[test]
fn file_named_like_category_folder_stays_out_of_index() {
    let mut f = fixture();
    ingest_sample(&mut f);
    assert!(f.library.organize().is_clean());
    f.library.rescan().unwrap();
    let organized = paths(&f.library);
    let images = write(&f.source, "Images", 1);

    let err = f.library.ingest_file(&images).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(paths(&f.library), organized);

    f.library.rescan().unwrap();
    assert_eq!(paths(&f.library), organized);
    assert!(f.library.organize().moved.is_empty());
}
