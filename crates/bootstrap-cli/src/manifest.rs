//! Manifest discovery
//!
//! Finds every `*.json` manifest below a directory and chains their records
//! into one lazy stream. Files are read one at a time, only when the stream
//! reaches them.

use crate::transform::{ManifestRecords, RecordsPreparer};
use bootstrap_common::types::Record;
use bootstrap_common::{BootstrapError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// List manifest files below `dir`, sorted by path
pub fn discover_manifests(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BootstrapError::config(format!(
            "MANIFESTS_DIR '{}' is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }

    info!(dir = %dir.display(), manifests = files.len(), "Discovered manifest files");
    Ok(files)
}

/// Lazy record stream over a set of manifest files
pub struct ManifestStream {
    preparer: RecordsPreparer,
    files: std::vec::IntoIter<PathBuf>,
    current: Option<ManifestRecords>,
}

impl ManifestStream {
    pub fn new(preparer: RecordsPreparer, files: Vec<PathBuf>) -> Self {
        Self {
            preparer,
            files: files.into_iter(),
            current: None,
        }
    }

    /// Discover manifests under `dir` and stream their records
    pub fn open(preparer: RecordsPreparer, dir: &Path) -> Result<Self> {
        Ok(Self::new(preparer, discover_manifests(dir)?))
    }

    fn open_next_file(&mut self) -> Option<Result<()>> {
        let path = self.files.next()?;
        debug!(path = %path.display(), "Reading manifest");

        let opened = std::fs::read_to_string(&path)
            .map_err(BootstrapError::from)
            .and_then(|content| self.preparer.manifest_records(&path, &content));

        Some(opened.map(|records| self.current = Some(records)))
    }
}

impl Iterator for ManifestStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.as_mut().and_then(Iterator::next) {
                return Some(record);
            }
            self.current = None;

            if let Err(e) = self.open_next_file()? {
                return Some(Err(e));
            }
        }
    }
}
