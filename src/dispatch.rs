//! Dispatch of a parsed invocation to its handler

use crate::core::{ExitStatus, Invocation, ParsedInvocation, SealedRegistry};
use log::{debug, warn};
use std::io::Write;

/// Routes a parsed invocation to the handler it resolved to.
///
/// The handler's exit status is returned unchanged. When no subcommand was
/// selected the top-level help is written and [`ExitStatus::HELP_FALLBACK`]
/// is returned.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r SealedRegistry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r SealedRegistry) -> Self {
        Self { registry }
    }

    pub fn dispatch(&self, parsed: ParsedInvocation, out: &mut dyn Write) -> ExitStatus {
        let (Some(subcommand), Some(handler)) = (parsed.subcommand(), parsed.handler()) else {
            debug!("No subcommand selected, printing help");
            if let Err(e) = write!(out, "{}", self.registry.render_help()).and_then(|_| out.flush())
            {
                warn!("Failed to write help: {}", e);
            }
            return ExitStatus::HELP_FALLBACK;
        };

        debug!("Dispatching '{}'", subcommand);
        let invocation = Invocation {
            subcommand,
            args: parsed.args(),
            registry: self.registry,
        };
        let status = handler.call(&invocation, out);
        debug!("'{}' finished with status {}", subcommand, status);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramInfo;
    use crate::core::{FlagSpec, Handler, SubcommandDescriptor, SubcommandRegistry};

    fn registry_with(descriptor: SubcommandDescriptor) -> SealedRegistry {
        let mut registry = SubcommandRegistry::new();
        registry.registrar("test").add(descriptor).unwrap();
        registry.seal(ProgramInfo::new("sparse", "0.0.0")).unwrap()
    }

    #[test]
    fn test_handler_status_is_propagated() {
        let registry = registry_with(SubcommandDescriptor::new(
            "fail",
            Handler::new(|_, _| ExitStatus::from_code(42)),
        ));
        let parsed = registry.parse_from(["sparse", "fail"]).unwrap();

        let mut out = Vec::new();
        let status = Dispatcher::new(&registry).dispatch(parsed, &mut out);
        assert_eq!(status.code(), 42);
        assert!(out.is_empty());
    }

    #[test]
    fn test_handler_sees_bound_args_and_registry() {
        let registry = registry_with(
            SubcommandDescriptor::new(
                "echo",
                Handler::new(|inv, out| {
                    let word = inv.args.value("word").unwrap_or_default();
                    writeln!(out, "{} {} {}", inv.subcommand, word, inv.registry.len()).unwrap();
                    ExitStatus::SUCCESS
                }),
            )
            .flag(FlagSpec::positional("word")),
        );
        let parsed = registry.parse_from(["sparse", "echo", "hi"]).unwrap();

        let mut out = Vec::new();
        let status = Dispatcher::new(&registry).dispatch(parsed, &mut out);
        assert!(status.is_success());
        assert_eq!(String::from_utf8(out).unwrap(), "echo hi 1\n");
    }

    #[test]
    fn test_fallback_prints_help() {
        let registry = registry_with(
            SubcommandDescriptor::new("run", Handler::new(|_, _| ExitStatus::SUCCESS))
                .about("Run things"),
        );
        let parsed = registry.parse_from(["sparse"]).unwrap();

        let mut out = Vec::new();
        let status = Dispatcher::new(&registry).dispatch(parsed, &mut out);
        assert_eq!(status, ExitStatus::HELP_FALLBACK);
        assert_eq!(status.code(), 1);
        let help = String::from_utf8(out).unwrap();
        assert!(help.contains("Usage:"));
        assert!(help.contains("Run things"));
    }
}
