//! Error types for the sparse front-end
//!
//! Discovery and registration failures are fatal: they abort the run before
//! any handler executes. Usage errors belong to the argument grammar engine
//! and are rendered by it.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for all library operations
#[derive(Error, Debug)]
pub enum SparseError {
    /// An extension location could not be listed
    #[error("Extension location unavailable: {location} ({reason})")]
    LocationUnavailable { location: PathBuf, reason: String },

    /// A candidate unit failed to load
    #[error("Failed to load extension unit '{unit}': {reason}")]
    UnitLoad { unit: String, reason: String },

    /// A unit's registration hook is malformed
    #[error("Malformed registration hook in unit '{unit}': {reason}")]
    MalformedHook { unit: String, reason: String },

    /// A subcommand descriptor failed validation
    #[error("Invalid subcommand '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    /// Two units registered the same subcommand name
    #[error("Subcommand '{name}' registered by unit '{second_unit}' is already provided by unit '{first_unit}'")]
    DuplicateSubcommand {
        name: String,
        first_unit: String,
        second_unit: String,
    },

    /// Sealing was attempted after discovery failed part way
    #[error("Subcommand registry is incomplete: discovery did not finish")]
    IncompleteRegistry,

    /// The command line was rejected by the argument grammar engine
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SparseError>;

impl SparseError {
    /// Create a new location unavailable error
    pub fn location_unavailable(location: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LocationUnavailable {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unit load error
    pub fn unit_load(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnitLoad {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create a new malformed hook error
    pub fn malformed_hook(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedHook {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid descriptor error
    pub fn invalid_descriptor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new duplicate subcommand error
    pub fn duplicate_subcommand(
        name: impl Into<String>,
        first_unit: impl Into<String>,
        second_unit: impl Into<String>,
    ) -> Self {
        Self::DuplicateSubcommand {
            name: name.into(),
            first_unit: first_unit.into(),
            second_unit: second_unit.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LocationUnavailable { .. } | Self::UnitLoad { .. } => ErrorKind::Discovery,
            Self::MalformedHook { .. }
            | Self::InvalidDescriptor { .. }
            | Self::DuplicateSubcommand { .. }
            | Self::IncompleteRegistry => ErrorKind::Registration,
            Self::Usage(_) => ErrorKind::Usage,
            Self::Io(_) => ErrorKind::Other,
        }
    }

    /// Whether this error aborts the run before any handler executes
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Discovery | ErrorKind::Registration)
    }
}

/// Broad error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Discovery,
    Registration,
    Usage,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "DISCOVERY"),
            Self::Registration => write!(f, "REGISTRATION"),
            Self::Usage => write!(f, "USAGE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}
