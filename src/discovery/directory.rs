//! Directory scanning for manifest units

use crate::config::DiscoveryConfig;
use crate::core::{ExtensionUnit, UnitCandidate};
use crate::discovery::location::{Candidates, ExtensionLocation};
use crate::discovery::manifest::ManifestUnit;
use crate::error::{Result, SparseError};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A directory whose manifest files are extension units.
///
/// Only files directly inside the directory are candidates; sub-directories
/// and hidden files are never descended into or loaded.
#[derive(Debug, Clone)]
pub struct DirectoryLocation {
    root: PathBuf,
    config: DiscoveryConfig,
}

impl DirectoryLocation {
    pub fn new(root: impl Into<PathBuf>, config: &DiscoveryConfig) -> Self {
        Self {
            root: root.into(),
            config: config.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a file at `path` would be loaded as a manifest
    fn is_candidate_path(&self, path: &Path) -> bool {
        if !self.config.include_hidden && is_hidden(path) {
            return false;
        }
        if !self.config.is_manifest(path) {
            debug!("Skipping non-manifest file {}", path.display());
            return false;
        }
        true
    }

    fn candidate(&self, entry: DirEntry) -> Option<UnitCandidate> {
        if !entry.file_type().is_file() {
            return None;
        }

        let path = entry.path();
        if !self.is_candidate_path(path) {
            return None;
        }

        match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) => Some(UnitCandidate::at_path(name, path)),
            None => {
                warn!("Skipping manifest with non UTF-8 name: {}", path.display());
                None
            }
        }
    }
}

impl ExtensionLocation for DirectoryLocation {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn enumerate(&self) -> Result<Candidates<'_>> {
        let metadata = fs::metadata(&self.root)
            .map_err(|e| SparseError::location_unavailable(&self.root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(SparseError::location_unavailable(
                &self.root,
                "not a directory",
            ));
        }
        // Surface permission problems before handing out a lazy iterator
        fs::read_dir(&self.root)
            .map_err(|e| SparseError::location_unavailable(&self.root, e.to_string()))?;

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        Ok(Box::new(walker.filter_map(move |entry| match entry {
            Ok(entry) => self.candidate(entry).map(Ok),
            Err(e) => {
                // Entries that would be filtered anyway cannot fail discovery
                if let Some(path) = e.path() {
                    if !self.is_candidate_path(path) {
                        warn!("Ignoring unreadable entry {}: {}", path.display(), e);
                        return None;
                    }
                }
                let unit = e
                    .path()
                    .and_then(|p| p.file_stem())
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| self.root.display().to_string());
                Some(Err(SparseError::unit_load(
                    unit,
                    format!("error traversing directory: {}", e),
                )))
            }
        })))
    }

    fn load(&self, candidate: &UnitCandidate) -> Result<Box<dyn ExtensionUnit>> {
        let path = candidate
            .locator()
            .ok_or_else(|| SparseError::unit_load(candidate.name(), "candidate has no path"))?;
        Ok(Box::new(ManifestUnit::load(candidate.name(), path)?))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
