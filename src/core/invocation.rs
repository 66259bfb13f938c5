//! Parsed invocations and the argument values bound to them

use crate::core::descriptor::{FlagKind, FlagSpec, Handler};
use crate::core::registry::SealedRegistry;
use clap::ArgMatches;
use std::collections::BTreeMap;

/// Value bound to a single flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Switch(bool),
    Values(Vec<String>),
}

impl ArgValue {
    /// Render the value for substitution into a command line
    pub fn joined(&self) -> String {
        match self {
            Self::Switch(on) => on.to_string(),
            Self::Values(values) => values.join(" "),
        }
    }
}

/// Argument values bound for the selected subcommand, keyed by flag name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArgs {
    values: BTreeMap<String, ArgValue>,
}

impl BoundArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_matches(flags: &[FlagSpec], matches: &ArgMatches) -> Self {
        let mut values = BTreeMap::new();
        for flag in flags {
            let value = match flag.kind {
                FlagKind::Switch => ArgValue::Switch(matches.get_flag(&flag.name)),
                FlagKind::Value | FlagKind::Positional => ArgValue::Values(
                    matches
                        .get_many::<String>(&flag.name)
                        .map(|v| v.cloned().collect())
                        .unwrap_or_default(),
                ),
            };
            values.insert(flag.name.clone(), value);
        }
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Whether a switch was given
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ArgValue::Switch(true)))
    }

    /// First value bound to a value or positional flag
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// All values bound to a value or positional flag
    pub fn values(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(ArgValue::Values(values)) => values,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of matching the live command line against a sealed registry.
///
/// The handler is present exactly when the command line named a registered
/// subcommand, and is then that subcommand's handler.
#[derive(Debug, Clone)]
pub struct ParsedInvocation {
    selected: Option<(String, Handler)>,
    args: BoundArgs,
}

impl ParsedInvocation {
    pub(crate) fn resolved(
        subcommand: impl Into<String>,
        handler: Handler,
        args: BoundArgs,
    ) -> Self {
        Self {
            selected: Some((subcommand.into(), handler)),
            args,
        }
    }

    pub(crate) fn fallback() -> Self {
        Self {
            selected: None,
            args: BoundArgs::new(),
        }
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.selected.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.selected.as_ref().map(|(_, handler)| handler)
    }

    pub fn args(&self) -> &BoundArgs {
        &self.args
    }

    pub fn is_fallback(&self) -> bool {
        self.selected.is_none()
    }
}

/// Context handed to a handler when it is dispatched
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub subcommand: &'a str,
    pub args: &'a BoundArgs,
    pub registry: &'a SealedRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_args_accessors() {
        let mut args = BoundArgs::new();
        args.insert("force", ArgValue::Switch(true));
        args.insert("quiet", ArgValue::Switch(false));
        args.insert("env", ArgValue::Values(vec!["prod".into()]));
        args.insert("files", ArgValue::Values(vec!["a".into(), "b".into()]));

        assert!(args.flag("force"));
        assert!(!args.flag("quiet"));
        assert!(!args.flag("missing"));
        assert_eq!(args.value("env"), Some("prod"));
        assert_eq!(args.values("files"), ["a".to_string(), "b".to_string()]);
        assert_eq!(args.value("force"), None);
        assert!(args.values("missing").is_empty());
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_joined_rendering() {
        assert_eq!(ArgValue::Switch(true).joined(), "true");
        assert_eq!(
            ArgValue::Values(vec!["a".into(), "b".into()]).joined(),
            "a b"
        );
        assert_eq!(ArgValue::Values(Vec::new()).joined(), "");
    }

    #[test]
    fn test_fallback_has_no_handler() {
        let parsed = ParsedInvocation::fallback();
        assert!(parsed.is_fallback());
        assert!(parsed.handler().is_none());
        assert!(parsed.subcommand().is_none());
        assert!(parsed.args().is_empty());
    }
}
