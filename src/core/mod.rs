//! Core types shared by discovery and dispatch
//!
//! - Extension units and the registration hook they may expose
//! - Subcommand descriptors, flag specifications and handlers
//! - The subcommand registry and its sealed form
//! - Parsed invocations and bound argument values

pub mod descriptor;
pub mod invocation;
pub mod registry;
pub mod unit;

pub use descriptor::{ExitStatus, FlagKind, FlagSpec, Handler, HandlerFn, SubcommandDescriptor};
pub use invocation::{ArgValue, BoundArgs, Invocation, ParsedInvocation};
pub use registry::{Registrar, SealedRegistry, SubcommandRegistry};
pub use unit::{ExtensionUnit, LoadState, SubcommandHook, UnitCandidate};
