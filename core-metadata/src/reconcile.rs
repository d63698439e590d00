//! Content-hash reconciliation
//!
//! Repairs sidecar ↔ media associations after media files were renamed
//! outside the engine. Works on one directory snapshot:
//!
//! 1. Sidecars whose media file is present are left alone.
//! 2. Every other sidecar is *orphaned*. Multimedia files without any
//!    sidecar are *candidates*.
//! 3. Each orphan with a stored `fileHash` is matched against the candidates
//!    in listing order. The first candidate with an equal SHA-256 wins, the
//!    sidecar is renamed onto it and the candidate is consumed. Candidates
//!    are hashed lazily, at most once per pass, and only until a match is
//!    found.
//! 4. Orphans without a hash or without a match are reported as orphaned and
//!    left where they are.
//!
//! Matching is greedy: among byte-identical candidates the first listed one
//! receives the sidecar.

use bridge_traits::storage::FileSystemAccess;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::hashing::hash_file;
use crate::media::{is_hidden_name, is_multimedia_name, media_name_for_sidecar, SIDECAR_SUFFIX};
use crate::sidecar::SidecarStore;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// `(old sidecar name, new sidecar name)` for every rename performed
    pub reconciled: Vec<(String, String)>,
    /// Sidecars left without a media file
    pub orphaned: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.reconciled.is_empty() && self.orphaned.is_empty()
    }
}

struct Candidate {
    name: String,
    hash: Option<String>,
    taken: bool,
}

impl Candidate {
    fn matches(&self, stored: &str) -> bool {
        !self.taken && self.hash.as_deref() == Some(stored)
    }
}

pub struct Reconciler {
    fs: Arc<dyn FileSystemAccess>,
    store: SidecarStore,
    hash_concurrency: usize,
}

impl Reconciler {
    pub fn new(fs: Arc<dyn FileSystemAccess>, store: SidecarStore, hash_concurrency: usize) -> Self {
        Self {
            fs,
            store,
            hash_concurrency: hash_concurrency.max(1),
        }
    }

    /// Run one pass over `dir`
    ///
    /// Only a failure to list the directory is an error; everything else is
    /// folded into the report.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn reconcile(&self, dir: &Path) -> Result<ReconciliationReport> {
        let names: Vec<String> = self
            .fs
            .list_directory(dir)
            .await?
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str().map(str::to_string))
            .collect();
        let present: HashSet<&str> = names.iter().map(String::as_str).collect();

        let mut orphans: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| media_name_for_sidecar(name).is_some_and(|media| !present.contains(media)))
            .collect();
        orphans.sort_unstable();

        let mut report = ReconciliationReport::default();
        if orphans.is_empty() {
            return Ok(report);
        }

        let mut candidate_names: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !is_hidden_name(name) && is_multimedia_name(name))
            .filter(|name| !present.contains(format!("{name}{SIDECAR_SUFFIX}").as_str()))
            .collect();
        candidate_names.sort_unstable();

        // Candidates are hashed in listing order only as far as matching needs
        let fs = self.fs.as_ref();
        let pending = stream::iter(candidate_names.into_iter().map(str::to_string))
            .map(move |name| async move {
                let hash = match hash_file(fs, &dir.join(&name)).await {
                    Ok(hash) => Some(hash),
                    Err(e) => {
                        warn!(path = %name, error = %e, "Failed to hash reconciliation candidate");
                        None
                    }
                };
                Candidate {
                    name,
                    hash,
                    taken: false,
                }
            })
            .buffered(self.hash_concurrency);
        futures::pin_mut!(pending);
        let mut hashed: Vec<Candidate> = Vec::new();

        for orphan in orphans {
            let Some(stored) = self.stored_hash(&dir.join(orphan)).await else {
                debug!(sidecar = orphan, "Orphaned sidecar has no file hash");
                report.orphaned.push(orphan.to_string());
                continue;
            };

            let mut matched = hashed.iter().position(|c| c.matches(&stored));
            while matched.is_none() {
                let Some(candidate) = pending.next().await else {
                    break;
                };
                if candidate.matches(&stored) {
                    matched = Some(hashed.len());
                }
                hashed.push(candidate);
            }

            let Some(index) = matched else {
                report.orphaned.push(orphan.to_string());
                continue;
            };
            let candidate = &mut hashed[index];

            let new_name = format!("{}{}", candidate.name, SIDECAR_SUFFIX);
            match self.fs.rename(&dir.join(orphan), &dir.join(&new_name)).await {
                Ok(()) => {
                    candidate.taken = true;
                    if let Some(old_media) = media_name_for_sidecar(orphan) {
                        self.store.invalidate(&dir.join(old_media)).await;
                    }
                    self.store.invalidate(&dir.join(&candidate.name)).await;
                    info!(from = orphan, to = %new_name, "Reattached orphaned sidecar");
                    report.reconciled.push((orphan.to_string(), new_name));
                }
                Err(e) => {
                    warn!(sidecar = orphan, error = %e, "Failed to rename orphaned sidecar");
                    report.orphaned.push(orphan.to_string());
                }
            }
        }

        if !report.is_clean() {
            info!(
                reconciled = report.reconciled.len(),
                orphaned = report.orphaned.len(),
                "Reconciliation finished"
            );
        }
        Ok(report)
    }

    async fn stored_hash(&self, sidecar: &Path) -> Option<String> {
        match self.store.load_sidecar_file(sidecar).await {
            Ok(record) => record.and_then(|r| r.file_hash).filter(|h| !h.is_empty()),
            Err(e) => {
                warn!(sidecar = ?sidecar, error = %e, "Unreadable orphaned sidecar");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::sha256_hex;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{FileMetadata, FixedClock};
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use mockall::mock;
    use std::path::PathBuf;

    mock! {
        pub Fs {}

        #[async_trait::async_trait]
        impl FileSystemAccess for Fs {
            async fn exists(&self, path: &Path) -> BridgeResult<bool>;
            async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
            async fn read_file(&self, path: &Path) -> BridgeResult<Bytes>;
            async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()>;
            async fn delete_file(&self, path: &Path) -> BridgeResult<()>;
            async fn rename(&self, from: &Path, to: &Path) -> BridgeResult<()>;
            async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>>;
        }
    }

    fn reconciler(fs: MockFs) -> Reconciler {
        let fs: Arc<dyn FileSystemAccess> = Arc::new(fs);
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()));
        let store = SidecarStore::new(fs.clone(), clock, 8, false);
        Reconciler::new(fs, store, 1)
    }

    fn expect_listing(fs: &mut MockFs, names: &'static [&'static str]) {
        fs.expect_list_directory()
            .returning(move |dir| Ok(names.iter().map(|name| dir.join(name)).collect()));
    }

    fn expect_sidecar(fs: &mut MockFs, path: &'static str, json: String) {
        fs.expect_read_file()
            .withf(move |p| p == Path::new(path))
            .times(1)
            .returning(move |_| Ok(Bytes::from(json.clone())));
    }

    fn expect_media(fs: &mut MockFs, path: &'static str, data: &'static [u8], times: usize) {
        fs.expect_read_file()
            .withf(move |p| p == Path::new(path))
            .times(times)
            .returning(move |_| Ok(Bytes::from_static(data)));
    }

    fn hash_json(data: &[u8]) -> String {
        format!(r#"{{"fileHash":"{}"}}"#, sha256_hex(data))
    }

    #[tokio::test]
    async fn test_hashing_stops_at_first_match() {
        let mut fs = MockFs::new();
        expect_listing(&mut fs, &["a.mp4", "b.mp4", "c.mp4", "old.mp4.desc.json"]);
        expect_sidecar(&mut fs, "/kb/old.mp4.desc.json", hash_json(b"video a"));
        expect_media(&mut fs, "/kb/a.mp4", b"video a", 1);
        expect_media(&mut fs, "/kb/b.mp4", b"video b", 0);
        expect_media(&mut fs, "/kb/c.mp4", b"video c", 0);
        fs.expect_rename()
            .withf(|from, to| {
                from == Path::new("/kb/old.mp4.desc.json") && to == Path::new("/kb/a.mp4.desc.json")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let report = reconciler(fs).reconcile(Path::new("/kb")).await.unwrap();
        assert_eq!(
            report.reconciled,
            vec![("old.mp4.desc.json".to_string(), "a.mp4.desc.json".to_string())]
        );
        assert!(report.orphaned.is_empty());
    }

    #[tokio::test]
    async fn test_candidates_hashed_once_per_pass() {
        let mut fs = MockFs::new();
        expect_listing(
            &mut fs,
            &["a.mp4", "b.mp4", "x.mp4.desc.json", "y.mp4.desc.json"],
        );
        expect_sidecar(&mut fs, "/kb/x.mp4.desc.json", hash_json(b"video b"));
        expect_sidecar(&mut fs, "/kb/y.mp4.desc.json", hash_json(b"video a"));
        expect_media(&mut fs, "/kb/a.mp4", b"video a", 1);
        expect_media(&mut fs, "/kb/b.mp4", b"video b", 1);
        fs.expect_rename().times(2).returning(|_, _| Ok(()));

        let report = reconciler(fs).reconcile(Path::new("/kb")).await.unwrap();
        assert_eq!(
            report.reconciled,
            vec![
                ("x.mp4.desc.json".to_string(), "b.mp4.desc.json".to_string()),
                ("y.mp4.desc.json".to_string(), "a.mp4.desc.json".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_orphan_without_hash_reads_no_media() {
        let mut fs = MockFs::new();
        expect_listing(&mut fs, &["a.mp4", "old.mp4.desc.json"]);
        expect_sidecar(&mut fs, "/kb/old.mp4.desc.json", r#"{"description":"legacy"}"#.to_string());
        expect_media(&mut fs, "/kb/a.mp4", b"video a", 0);
        fs.expect_rename().never();

        let report = reconciler(fs).reconcile(Path::new("/kb")).await.unwrap();
        assert_eq!(report.orphaned, vec!["old.mp4.desc.json".to_string()]);
        assert!(report.reconciled.is_empty());
    }
}
