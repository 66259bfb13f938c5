//! Load-once cache for extension units

use crate::core::{ExtensionUnit, LoadState, UnitCandidate};
use crate::discovery::location::ExtensionLocation;
use crate::error::{Result, SparseError};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a loaded unit
pub type LoadedHandle = Rc<dyn ExtensionUnit>;

/// Outcome of [`LoadCache::ensure_loaded`]
pub enum LoadOutcome {
    /// The unit was loaded by this call
    Fresh(LoadedHandle),
    /// The unit had already been loaded; its load was not repeated
    Cached(LoadedHandle),
}

impl LoadOutcome {
    pub fn handle(&self) -> &LoadedHandle {
        match self {
            Self::Fresh(handle) | Self::Cached(handle) => handle,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Set of units loaded during one discovery run, keyed by unit name.
///
/// Names only ever enter the set; a unit's load side effects run at most once.
#[derive(Default)]
pub struct LoadCache {
    loaded: HashMap<String, LoadedHandle>,
    order: Vec<String>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `candidate` from `location` unless a unit of that name is loaded
    pub fn ensure_loaded(
        &mut self,
        candidate: &UnitCandidate,
        location: &dyn ExtensionLocation,
    ) -> Result<LoadOutcome> {
        if let Some(handle) = self.loaded.get(candidate.name()) {
            debug!("Unit '{}' already loaded", candidate.name());
            return Ok(LoadOutcome::Cached(Rc::clone(handle)));
        }

        let unit = location.load(candidate).map_err(|e| match e {
            SparseError::UnitLoad { .. } => e,
            other => SparseError::unit_load(candidate.name(), other.to_string()),
        })?;
        if unit.name() != candidate.name() {
            return Err(SparseError::unit_load(
                candidate.name(),
                format!("location produced unit '{}' instead", unit.name()),
            ));
        }

        debug!("Loaded unit '{}' from {}", candidate.name(), location.describe());
        let handle: LoadedHandle = Rc::from(unit);
        self.loaded
            .insert(candidate.name().to_string(), Rc::clone(&handle));
        self.order.push(candidate.name().to_string());
        Ok(LoadOutcome::Fresh(handle))
    }

    pub fn state(&self, name: &str) -> LoadState {
        if self.loaded.contains_key(name) {
            LoadState::Loaded
        } else {
            LoadState::NotLoaded
        }
    }

    /// Loaded unit names in load order
    pub fn loaded_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
