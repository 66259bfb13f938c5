//! Subcommand discovery
//!
//! Discovery walks each configured location once at startup: every candidate
//! unit is loaded at most once, units exposing a registration hook register
//! their subcommands, and any failure aborts the whole run.

pub mod capability;
pub mod directory;
pub mod loader;
pub mod location;
pub mod manifest;
pub mod orchestrator;

pub use capability::{has_hook, invoke_hook};
pub use directory::DirectoryLocation;
pub use loader::{LoadCache, LoadOutcome, LoadedHandle};
pub use location::{Candidates, ExtensionLocation, StaticLocation};
pub use manifest::{ManifestHook, ManifestUnit};
pub use orchestrator::{Discovery, DiscoveryReport};
