//! Subcommand descriptors, flag specifications and handlers
//!
//! A descriptor is what a registration hook hands to the registry: the
//! subcommand's name, help text, flags and the handler bound to it. The
//! descriptor is translated into a `clap::Command` when the registry is sealed.

use crate::core::invocation::Invocation;
use crate::error::{Result, SparseError};
use clap::{Arg, ArgAction, Command};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, LazyLock};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid name pattern"));

/// Flag name reserved for the grammar engine's own help flag
const RESERVED_FLAG: &str = "help";
const RESERVED_SHORT: char = 'h';

/// Exit status produced by a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(i32);

impl ExitStatus {
    /// Conventional success
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    /// Generic failure
    pub const FAILURE: ExitStatus = ExitStatus(1);
    /// Returned when no subcommand was selected and help was printed
    pub const HELP_FALLBACK: ExitStatus = ExitStatus(1);

    pub fn from_code(code: i32) -> Self {
        Self(code)
    }

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for ExitStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signature every subcommand handler satisfies
pub type HandlerFn = dyn Fn(&Invocation<'_>, &mut dyn Write) -> ExitStatus + Send + Sync;

/// Opaque, cheaply clonable reference to a subcommand handler
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Invocation<'_>, &mut dyn Write) -> ExitStatus + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the handler
    pub fn call(&self, invocation: &Invocation<'_>, out: &mut dyn Write) -> ExitStatus {
        (self.0)(invocation, out)
    }

    /// Whether both references point at the same bound handler
    pub fn same_as(&self, other: &Handler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// How a flag consumes command-line tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    /// `--name`, no value
    Switch,
    /// `--name VALUE`
    #[default]
    Value,
    /// A bare positional token
    Positional,
}

/// Specification of a single subcommand flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagSpec {
    pub name: String,
    #[serde(default)]
    pub kind: FlagKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FlagSpec {
    fn with_kind(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            kind,
            short: None,
            help: None,
            required: false,
            multiple: false,
            default: None,
        }
    }

    /// A boolean `--name` switch
    pub fn switch(name: impl Into<String>) -> Self {
        Self::with_kind(name, FlagKind::Switch)
    }

    /// A `--name VALUE` option
    pub fn value(name: impl Into<String>) -> Self {
        Self::with_kind(name, FlagKind::Value)
    }

    /// A positional argument
    pub fn positional(name: impl Into<String>) -> Self {
        Self::with_kind(name, FlagKind::Positional)
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn validate(&self, command: &str) -> Result<()> {
        let fail = |reason: String| Err(SparseError::invalid_descriptor(command, reason));

        if !NAME_PATTERN.is_match(&self.name) {
            return fail(format!("invalid flag name '{}'", self.name));
        }
        if self.name == RESERVED_FLAG {
            return fail(format!("flag name '{}' is reserved", RESERVED_FLAG));
        }
        if self.short == Some(RESERVED_SHORT) {
            return fail(format!("short flag '-{}' is reserved", RESERVED_SHORT));
        }
        if let Some(short) = self.short {
            if !short.is_ascii_alphanumeric() {
                return fail(format!("invalid short flag '{}' for '{}'", short, self.name));
            }
            if self.kind == FlagKind::Positional {
                return fail(format!("positional '{}' cannot have a short flag", self.name));
            }
        }
        if self.required && self.default.is_some() {
            return fail(format!(
                "'{}' cannot be both required and have a default",
                self.name
            ));
        }
        if self.kind == FlagKind::Switch
            && (self.required || self.multiple || self.default.is_some())
        {
            return fail(format!(
                "switch '{}' cannot be required, multiple or have a default",
                self.name
            ));
        }
        Ok(())
    }

    fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone());

        arg = match self.kind {
            FlagKind::Switch => arg.long(self.name.clone()).action(ArgAction::SetTrue),
            FlagKind::Value => arg
                .long(self.name.clone())
                .value_name(self.name.to_uppercase())
                .action(if self.multiple {
                    ArgAction::Append
                } else {
                    ArgAction::Set
                }),
            FlagKind::Positional => {
                let arg = arg.value_name(self.name.to_uppercase());
                if self.multiple {
                    arg.action(ArgAction::Append).num_args(1..)
                } else {
                    arg.action(ArgAction::Set)
                }
            }
        };

        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }
        if self.required {
            arg = arg.required(true);
        }
        if let Some(default) = &self.default {
            arg = arg.default_value(default.clone());
        }
        arg
    }
}

/// Definition of one subcommand as registered by an extension unit
#[derive(Clone)]
pub struct SubcommandDescriptor {
    name: String,
    about: Option<String>,
    long_about: Option<String>,
    flags: Vec<FlagSpec>,
    handler: Handler,
    origin: String,
}

impl SubcommandDescriptor {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            about: None,
            long_about: None,
            flags: Vec::new(),
            handler,
            origin: String::new(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn long_about(mut self, long_about: impl Into<String>) -> Self {
        self.long_about = Some(long_about.into());
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = FlagSpec>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn about_text(&self) -> Option<&str> {
        self.about.as_deref()
    }

    pub fn long_about_text(&self) -> Option<&str> {
        self.long_about.as_deref()
    }

    pub fn flag_specs(&self) -> &[FlagSpec] {
        &self.flags
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Name of the extension unit that registered this subcommand
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub(crate) fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Check the descriptor can be turned into a well-formed grammar
    pub fn validate(&self) -> Result<()> {
        if !NAME_PATTERN.is_match(&self.name) {
            return Err(SparseError::invalid_descriptor(
                &self.name,
                "subcommand names must start with a letter or digit and contain only letters, digits, '-' and '_'",
            ));
        }

        let mut names = HashSet::new();
        let mut shorts = HashSet::new();
        let mut seen_optional_positional = false;
        let positionals: Vec<&FlagSpec> = self
            .flags
            .iter()
            .filter(|f| f.kind == FlagKind::Positional)
            .collect();

        for flag in &self.flags {
            flag.validate(&self.name)?;
            if !names.insert(flag.name.as_str()) {
                return Err(SparseError::invalid_descriptor(
                    &self.name,
                    format!("flag '{}' declared more than once", flag.name),
                ));
            }
            if let Some(short) = flag.short {
                if !shorts.insert(short) {
                    return Err(SparseError::invalid_descriptor(
                        &self.name,
                        format!("short flag '-{}' declared more than once", short),
                    ));
                }
            }
        }

        for (i, positional) in positionals.iter().enumerate() {
            if positional.required && seen_optional_positional {
                return Err(SparseError::invalid_descriptor(
                    &self.name,
                    format!(
                        "required positional '{}' follows an optional one",
                        positional.name
                    ),
                ));
            }
            if !positional.required {
                seen_optional_positional = true;
            }
            if positional.multiple && i + 1 != positionals.len() {
                return Err(SparseError::invalid_descriptor(
                    &self.name,
                    format!(
                        "only the last positional may take multiple values, not '{}'",
                        positional.name
                    ),
                ));
            }
        }

        Ok(())
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(self.name.clone());
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        if let Some(long_about) = &self.long_about {
            command = command.long_about(long_about.clone());
        }
        command.args(self.flags.iter().map(FlagSpec::to_arg))
    }
}

impl fmt::Debug for SubcommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubcommandDescriptor")
            .field("name", &self.name)
            .field("about", &self.about)
            .field("flags", &self.flags)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
