//! Directory classifier
//!
//! Splits the regular files of one directory into text knowledge files and
//! multimedia files. Dotfiles and description sidecars are skipped.

use bridge_traits::storage::FileSystemAccess;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::media::{is_hidden_name, is_multimedia_name, is_sidecar_name, is_text_name, MultimediaFile};

/// File names of one directory, each list sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub text_files: Vec<String>,
    pub multimedia_files: Vec<String>,
}

impl DirectoryListing {
    /// Classified multimedia entries joined onto `dir`
    pub fn multimedia_in(&self, dir: &Path) -> Vec<MultimediaFile> {
        self.multimedia_files
            .iter()
            .map(|name| MultimediaFile::from_path(dir.join(name)))
            .collect()
    }
}

pub async fn scan_directory(fs: &dyn FileSystemAccess, dir: &Path) -> Result<DirectoryListing> {
    let entries = fs.list_directory(dir).await?;
    let mut listing = DirectoryListing::default();

    for entry in entries {
        let Some(name) = entry.file_name().and_then(|n| n.to_str()) else {
            debug!(path = ?entry, "Skipping entry with non UTF-8 name");
            continue;
        };
        if is_hidden_name(name) || is_sidecar_name(name) {
            continue;
        }

        let is_text = is_text_name(name);
        let is_media = is_multimedia_name(name);
        if !is_text && !is_media {
            continue;
        }

        match fs.metadata(&entry).await {
            Ok(meta) if meta.is_file => {}
            Ok(_) => continue,
            Err(e) => {
                debug!(path = ?entry, error = %e, "Skipping entry without metadata");
                continue;
            }
        }

        if is_text {
            listing.text_files.push(name.to_string());
        } else {
            listing.multimedia_files.push(name.to_string());
        }
    }

    listing.text_files.sort();
    listing.multimedia_files.sort();

    debug!(
        dir = ?dir,
        text = listing.text_files.len(),
        multimedia = listing.multimedia_files.len(),
        "Scanned directory"
    );
    Ok(listing)
}
