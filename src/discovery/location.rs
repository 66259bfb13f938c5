//! Extension locations
//!
//! A location knows how to list its candidate units and how to load one of
//! them. [`StaticLocation`] is a catalogue of unit factories compiled into
//! the binary; [`DirectoryLocation`](super::DirectoryLocation) scans a
//! directory for manifest files.

use crate::core::{ExtensionUnit, UnitCandidate};
use crate::error::{Result, SparseError};

/// Lazy, finite sequence of candidates produced by a location
pub type Candidates<'a> = Box<dyn Iterator<Item = Result<UnitCandidate>> + 'a>;

/// A designated place extension units are discovered from
pub trait ExtensionLocation {
    /// Human readable label used in logs and errors
    fn describe(&self) -> String;

    /// List the leaf units available at this location
    fn enumerate(&self) -> Result<Candidates<'_>>;

    /// Load a unit previously produced by [`enumerate`](Self::enumerate)
    fn load(&self, candidate: &UnitCandidate) -> Result<Box<dyn ExtensionUnit>>;
}

type UnitFactory = Box<dyn Fn() -> Result<Box<dyn ExtensionUnit>>>;

/// Catalogue of units known at build time
pub struct StaticLocation {
    label: String,
    entries: Vec<(String, UnitFactory)>,
}

impl StaticLocation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Add a unit; units are enumerated in insertion order
    pub fn with_unit<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn ExtensionUnit>> + 'static,
    {
        self.entries.push((name.into(), Box::new(factory)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExtensionLocation for StaticLocation {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn enumerate(&self) -> Result<Candidates<'_>> {
        Ok(Box::new(
            self.entries
                .iter()
                .map(|(name, _)| Ok(UnitCandidate::new(name.clone()))),
        ))
    }

    fn load(&self, candidate: &UnitCandidate) -> Result<Box<dyn ExtensionUnit>> {
        let (_, factory) = self
            .entries
            .iter()
            .find(|(name, _)| name == candidate.name())
            .ok_or_else(|| {
                SparseError::unit_load(
                    candidate.name(),
                    format!("not part of {}", self.label),
                )
            })?;
        factory()
    }
}
