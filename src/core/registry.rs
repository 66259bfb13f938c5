//! Subcommand registry
//!
//! [`SubcommandRegistry`] accumulates descriptors while discovery runs. Once
//! every location has been processed it is sealed into a [`SealedRegistry`],
//! which owns the argument grammar and parses command lines. Sealing consumes
//! the mutable registry, so nothing can register after parsing has begun.

use crate::config::ProgramInfo;
use crate::core::descriptor::SubcommandDescriptor;
use crate::core::invocation::{BoundArgs, ParsedInvocation};
use crate::error::{Result, SparseError};
use clap::{Arg, ArgAction, Command};
use log::{debug, info};
use std::collections::HashMap;
use std::ffi::OsString;

/// Id of the top-level help flag handled by the dispatcher
const HELP_ARG: &str = "help";

/// Registry of subcommands populated during discovery
#[derive(Debug, Default)]
pub struct SubcommandRegistry {
    descriptors: Vec<SubcommandDescriptor>,
    index: HashMap<String, usize>,
    poisoned: bool,
}

impl SubcommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration handle scoped to one extension unit
    pub fn registrar(&mut self, unit: impl Into<String>) -> Registrar<'_> {
        Registrar {
            registry: self,
            unit: unit.into(),
            added: 0,
        }
    }

    fn insert(&mut self, descriptor: SubcommandDescriptor) -> Result<()> {
        descriptor.validate()?;

        if let Some(&existing) = self.index.get(descriptor.name()) {
            return Err(SparseError::duplicate_subcommand(
                descriptor.name(),
                self.descriptors[existing].origin(),
                descriptor.origin(),
            ));
        }

        debug!(
            "Registered subcommand '{}' from unit '{}'",
            descriptor.name(),
            descriptor.origin()
        );
        self.index
            .insert(descriptor.name().to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SubcommandDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Subcommand names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(SubcommandDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Mark the registry as untrustworthy after a failed discovery
    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Freeze the registry and build the top-level grammar
    pub fn seal(self, program: ProgramInfo) -> Result<SealedRegistry> {
        if self.poisoned {
            return Err(SparseError::IncompleteRegistry);
        }

        let mut command = Command::new(program.name.clone())
            .version(program.version.clone())
            .disable_help_flag(true)
            .disable_help_subcommand(true)
            .arg(
                Arg::new(HELP_ARG)
                    .short('h')
                    .long("help")
                    .action(ArgAction::SetTrue)
                    .help("Print help"),
            );
        if let Some(about) = &program.about {
            command = command.about(about.clone());
        }
        if let Some(after_help) = &program.after_help {
            command = command.after_help(after_help.clone());
        }
        command = command.subcommands(
            self.descriptors
                .iter()
                .map(SubcommandDescriptor::to_command),
        );

        info!("Sealed registry with {} subcommands", self.descriptors.len());
        Ok(SealedRegistry {
            program,
            descriptors: self.descriptors,
            index: self.index,
            command,
        })
    }
}

/// Registration handle given to a unit's hook.
///
/// Every descriptor added through it is stamped with the unit's name.
#[derive(Debug)]
pub struct Registrar<'r> {
    registry: &'r mut SubcommandRegistry,
    unit: String,
    added: usize,
}

impl Registrar<'_> {
    /// Name of the unit this registrar registers for
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn add(&mut self, descriptor: SubcommandDescriptor) -> Result<()> {
        self.registry
            .insert(descriptor.with_origin(self.unit.clone()))?;
        self.added += 1;
        Ok(())
    }

    /// Number of subcommands added through this registrar
    pub fn added(&self) -> usize {
        self.added
    }
}

/// Frozen registry holding the complete argument grammar
#[derive(Debug)]
pub struct SealedRegistry {
    program: ProgramInfo,
    descriptors: Vec<SubcommandDescriptor>,
    index: HashMap<String, usize>,
    command: Command,
}

impl SealedRegistry {
    pub fn program(&self) -> &ProgramInfo {
        &self.program
    }

    pub fn get(&self, name: &str) -> Option<&SubcommandDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubcommandDescriptor> {
        self.descriptors.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(SubcommandDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Top-level usage and help text
    pub fn render_help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Match a command line (including the program name) against the grammar
    pub fn parse_from<I, T>(&self, args: I) -> Result<ParsedInvocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;

        if matches.get_flag(HELP_ARG) {
            debug!("Top-level help requested");
            return Ok(ParsedInvocation::fallback());
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            debug!("No subcommand selected");
            return Ok(ParsedInvocation::fallback());
        };

        match self.get(name) {
            Some(descriptor) => Ok(ParsedInvocation::resolved(
                name,
                descriptor.handler().clone(),
                BoundArgs::from_matches(descriptor.flag_specs(), sub_matches),
            )),
            None => {
                debug!("Grammar matched unregistered subcommand '{}'", name);
                Ok(ParsedInvocation::fallback())
            }
        }
    }
}
