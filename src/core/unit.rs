//! Extension units and the registration capability

use crate::core::registry::Registrar;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// A candidate unit found by enumerating a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCandidate {
    name: String,
    locator: Option<PathBuf>,
}

impl UnitCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: None,
        }
    }

    pub fn at_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            locator: Some(path.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the location found this unit, if it lives on disk
    pub fn locator(&self) -> Option<&Path> {
        self.locator.as_deref()
    }
}

/// Whether a unit has been loaded in the current discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loaded,
}

/// The registration entry point a unit may expose
pub trait SubcommandHook {
    /// Register this unit's subcommands
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()>;
}

/// A loaded extension unit
pub trait ExtensionUnit {
    fn name(&self) -> &str;

    /// The unit's registration hook; `None` for units that contribute nothing
    fn hook(&self) -> Option<&dyn SubcommandHook> {
        None
    }
}
