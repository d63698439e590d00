//! Integration tests for sidecar reconciliation and directory listing

mod common;

use bridge_desktop::TokioFileSystem;
use common::*;
use core_metadata::hashing::sha256_hex;
use core_metadata::{scan_directory, DescriptionRecord};
use std::path::Path;
use tempfile::TempDir;

fn write_sidecar(dir: &Path, name: &str, hash: Option<&str>) {
    let mut json = serde_json::json!({ "description": format!("about {name}") });
    if let Some(hash) = hash {
        json["fileHash"] = serde_json::Value::from(hash);
    }
    std::fs::write(dir.join(name), serde_json::to_vec_pretty(&json).unwrap()).unwrap();
}

#[tokio::test]
async fn test_reconcile_matches_second_candidate_by_hash() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a.mp4"), b"first candidate");
    write(&dir.path().join("b.mp4"), b"second candidate");
    write_sidecar(
        dir.path(),
        "old-name.mp4.desc.json",
        Some(&sha256_hex(b"second candidate")),
    );

    let report = service().reconcile(dir.path()).await.unwrap();

    assert_eq!(
        report.reconciled,
        vec![("old-name.mp4.desc.json".to_string(), "b.mp4.desc.json".to_string())]
    );
    assert!(report.orphaned.is_empty());
    assert!(dir.path().join("b.mp4.desc.json").exists());
    assert!(!dir.path().join("a.mp4.desc.json").exists());
    assert!(!dir.path().join("old-name.mp4.desc.json").exists());
}

#[tokio::test]
async fn test_reconcile_reports_unmatched_orphan_in_place() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a.png"), &sample_png());
    write_sidecar(dir.path(), "vanished.png.desc.json", Some(&sha256_hex(b"elsewhere")));

    let report = service().reconcile(dir.path()).await.unwrap();

    assert!(report.reconciled.is_empty());
    assert_eq!(report.orphaned, vec!["vanished.png.desc.json".to_string()]);
    assert!(dir.path().join("vanished.png.desc.json").exists());
    assert!(!dir.path().join("a.png.desc.json").exists());
}

#[tokio::test]
async fn test_reconcile_orphan_without_hash() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a.mp3"), b"audio");
    write_sidecar(dir.path(), "legacy.mp3.desc.json", None);

    let report = service().reconcile(dir.path()).await.unwrap();
    assert_eq!(report.orphaned, vec!["legacy.mp3.desc.json".to_string()]);
    assert!(report.reconciled.is_empty());
}

#[tokio::test]
async fn test_reconcile_duplicate_content_first_listed_wins() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("copy-b.wav"), b"same bytes");
    write(&dir.path().join("copy-a.wav"), b"same bytes");
    let hash = sha256_hex(b"same bytes");
    write_sidecar(dir.path(), "one.wav.desc.json", Some(&hash));
    write_sidecar(dir.path(), "two.wav.desc.json", Some(&hash));
    write_sidecar(dir.path(), "three.wav.desc.json", Some(&hash));

    let report = service().reconcile(dir.path()).await.unwrap();

    assert_eq!(
        report.reconciled,
        vec![
            ("one.wav.desc.json".to_string(), "copy-a.wav.desc.json".to_string()),
            ("three.wav.desc.json".to_string(), "copy-b.wav.desc.json".to_string()),
        ]
    );
    assert_eq!(report.orphaned, vec!["two.wav.desc.json".to_string()]);
}

#[tokio::test]
async fn test_reconcile_leaves_tracked_sidecars_alone() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("kept.mp4"), b"video");
    write_sidecar(dir.path(), "kept.mp4.desc.json", Some(&sha256_hex(b"other")));

    let report = service().reconcile(dir.path()).await.unwrap();
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_reattached_record_is_readable_after_rename() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("draft.mp3");
    write(&original, b"podcast");

    let service = service();
    service
        .write(&original, DescriptionRecord::new("episode one"))
        .await
        .unwrap();
    // populate the cache under the old path
    assert!(service.read(&original).await.is_some());

    let renamed = dir.path().join("final.mp3");
    std::fs::rename(&original, &renamed).unwrap();

    let report = service.reconcile(dir.path()).await.unwrap();
    assert_eq!(report.reconciled.len(), 1);

    assert!(service.read(&original).await.is_none());
    assert_eq!(
        service.read(&renamed).await.unwrap().description(),
        Some("episode one")
    );
}

#[tokio::test]
async fn test_scan_directory_example() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a.txt"), b"notes");
    write(&dir.path().join("b.png"), &sample_png());
    write_sidecar(dir.path(), "b.png.desc.json", None);
    write(&dir.path().join(".hidden.png"), &sample_png());
    std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

    let listing = scan_directory(&TokioFileSystem::new(), dir.path()).await.unwrap();
    assert_eq!(listing.text_files, vec!["a.txt".to_string()]);
    assert_eq!(listing.multimedia_files, vec!["b.png".to_string()]);
}

#[tokio::test]
async fn test_list_directory_reconciles_first() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("renamed.flac"), b"lossless");
    write(&dir.path().join("readme.md"), b"# kb");
    write_sidecar(dir.path(), "original.flac.desc.json", Some(&sha256_hex(b"lossless")));

    let listing = service().list_directory(dir.path()).await.unwrap();

    assert_eq!(listing.text_files, vec!["readme.md".to_string()]);
    assert_eq!(listing.multimedia_files, vec!["renamed.flac".to_string()]);
    assert!(dir.path().join("renamed.flac.desc.json").exists());
}

#[tokio::test]
async fn test_list_directory_without_reconcile() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("renamed.flac"), b"lossless");
    write_sidecar(dir.path(), "original.flac.desc.json", Some(&sha256_hex(b"lossless")));

    let config = config_builder(9).reconcile_on_list(false).build().unwrap();
    let listing = core_metadata::DescriptionService::new(&config)
        .list_directory(dir.path())
        .await
        .unwrap();

    assert_eq!(listing.multimedia_files, vec!["renamed.flac".to_string()]);
    assert!(dir.path().join("original.flac.desc.json").exists());
}
