use filetime::{set_file_mtime, FileTime};
use rustview::library::{
    is_image_path, list_directory, modification_time, LibraryError, ListOptions,
};
use std::fs::{self, File};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

#[test]
fn test_listing_classifies_and_orders_entries() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("2024")).unwrap();
    fs::create_dir(dir.path().join("Archive")).unwrap();
    fs::write(dir.path().join("b.JPG"), b"jpeg bytes").unwrap();
    fs::write(dir.path().join("a.webp"), b"webp bytes").unwrap();
    fs::write(dir.path().join("Notes.txt"), b"hello").unwrap();

    let entries = list_directory(dir.path(), &ListOptions::default()).unwrap();
    let summary: Vec<(&str, bool, bool)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.is_dir, e.is_image))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("2024", true, false),
            ("Archive", true, false),
            ("a.webp", false, true),
            ("b.JPG", false, true),
            ("Notes.txt", false, false),
        ]
    );
    assert_eq!(entries[3].size, 10);
    assert_eq!(entries[0].size, 0);
    assert_eq!(entries[2].path, dir.path().join("a.webp"));
}

#[test]
fn test_listing_is_not_recursive() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    File::create(nested.join("deep.png")).unwrap();

    let entries = list_directory(dir.path(), &ListOptions::default()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "nested");
}

#[test]
fn test_images_only_keeps_folders() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    File::create(dir.path().join("x.gif")).unwrap();
    File::create(dir.path().join("x.doc")).unwrap();

    let options = ListOptions {
        images_only: true,
        ..ListOptions::default()
    };
    let names: Vec<String> = list_directory(dir.path(), &options)
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["sub", "x.gif"]);
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();
    assert!(list_directory(dir.path(), &ListOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_modification_time_matches_filetime() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stamp.png");
    File::create(&path).unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(1_234_567_890, 0)).unwrap();

    let modified = modification_time(&path).unwrap();
    assert_eq!(
        modified,
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_234_567_890)
    );

    let listed = list_directory(dir.path(), &ListOptions::default()).unwrap();
    assert_eq!(listed[0].modified, Some(modified));
}

#[test]
fn test_missing_directory_error() {
    let dir = tempdir().unwrap();
    let result = list_directory(&dir.path().join("missing"), &ListOptions::default());
    assert!(matches!(result, Err(LibraryError::NotFound(_))));
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_skipped() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("ok.png")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("nowhere.png"), dir.path().join("dangling.png"))
        .unwrap();

    let entries = list_directory(dir.path(), &ListOptions::default()).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["ok.png"]);
}

#[test]
fn test_is_image_path_variants() {
    for name in ["a.jpg", "a.JPEG", "a.png", "a.gif", "a.bmp", "a.tif", "a.TIFF", "a.webp", "a.ico"] {
        assert!(is_image_path(std::path::Path::new(name)), "{name}");
    }
    for name in ["a.txt", "a", ".png", "a.pngx"] {
        assert!(!is_image_path(std::path::Path::new(name)), "{name}");
    }
}
