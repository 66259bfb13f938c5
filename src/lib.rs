//! sparse: an extensible command-line front-end
//!
//! sparse discovers its subcommands at startup, registers each one into a
//! shared argument grammar and dispatches the parsed command line to the
//! selected handler. When no subcommand is selected it prints the top-level
//! help and exits with status 1.
//!
//! # Extension units
//!
//! Subcommands come from extension units found in locations:
//!
//! - a [`StaticLocation`] is a catalogue of units compiled into the binary
//!   (the built-in `list` and `describe` subcommands live in one);
//! - a [`DirectoryLocation`] holds manifest files, markdown documents whose
//!   YAML front matter describes a subcommand that runs an external program.
//!
//! A unit contributes subcommands by exposing a [`SubcommandHook`]. Units
//! without one are loaded and skipped.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sparse::{DiscoveryConfig, Dispatcher, ProgramInfo, Result};
//!
//! fn main() -> Result<()> {
//!     let config = DiscoveryConfig::default().with_extension_dir("commands/");
//!     let registry = sparse::discover(&config, ProgramInfo::default())?;
//!
//!     let parsed = registry.parse_from(["sparse", "list"])?;
//!     let status = Dispatcher::new(&registry).dispatch(parsed, &mut std::io::stdout());
//!     std::process::exit(status.code());
//! }
//! ```
//!
//! # Lifecycle
//!
//! Discovery fully populates a [`SubcommandRegistry`] before anything is
//! parsed. Sealing consumes it into a [`SealedRegistry`], so no unit can
//! register once parsing has begun, and a registry whose discovery failed
//! refuses to seal. Each run then parses once and dispatches once.

pub use crate::config::{DiscoveryConfig, ProgramInfo};
pub use crate::core::{
    ArgValue, BoundArgs, ExitStatus, ExtensionUnit, FlagKind, FlagSpec, Handler, Invocation,
    ParsedInvocation, Registrar, SealedRegistry, SubcommandDescriptor, SubcommandHook,
    SubcommandRegistry, UnitCandidate,
};
pub use crate::discovery::{
    DirectoryLocation, Discovery, DiscoveryReport, ExtensionLocation, StaticLocation,
};
pub use crate::dispatch::Dispatcher;
pub use crate::error::{ErrorKind, Result, SparseError};

pub mod builtin;
pub mod config;
pub mod core;
pub mod discovery;
pub mod dispatch;
pub mod error;

use log::info;
use std::ffi::OsString;
use std::io::Write;

/// Run discovery over every configured location and seal the registry
pub fn discover(config: &DiscoveryConfig, program: ProgramInfo) -> Result<SealedRegistry> {
    let mut discovery = Discovery::new();
    let mut registry = SubcommandRegistry::new();

    if config.include_builtins {
        discovery.discover(&builtin::location(), &mut registry)?;
    }
    for dir in &config.extension_dirs {
        discovery.discover(&DirectoryLocation::new(dir, config), &mut registry)?;
    }

    info!(
        "Discovery complete: {} units loaded, {} subcommands",
        discovery.cache().len(),
        registry.len()
    );
    registry.seal(program)
}

/// Discover, parse `args` (including the program name) and dispatch
pub fn run<I, T>(
    config: &DiscoveryConfig,
    program: ProgramInfo,
    args: I,
    out: &mut dyn Write,
) -> Result<ExitStatus>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let registry = discover(config, program)?;
    let parsed = registry.parse_from(args)?;
    Ok(Dispatcher::new(&registry).dispatch(parsed, out))
}
