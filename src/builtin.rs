//! Built-in units compiled into the binary

use crate::core::{
    ExitStatus, ExtensionUnit, FlagKind, FlagSpec, Handler, Invocation, Registrar,
    SubcommandDescriptor, SubcommandHook,
};
use crate::discovery::StaticLocation;
use crate::error::Result;
use log::error;
use serde::Serialize;
use std::io::{self, Write};

/// Label of the built-in location
pub const LOCATION_LABEL: &str = "built-in units";

/// The static location holding every built-in unit
pub fn location() -> StaticLocation {
    StaticLocation::new(LOCATION_LABEL)
        .with_unit("list", || Ok(Box::new(ListUnit) as Box<dyn ExtensionUnit>))
        .with_unit("describe", || Ok(Box::new(DescribeUnit) as Box<dyn ExtensionUnit>))
}

struct ListUnit;

impl ExtensionUnit for ListUnit {
    fn name(&self) -> &str {
        "list"
    }

    fn hook(&self) -> Option<&dyn SubcommandHook> {
        Some(self as &dyn SubcommandHook)
    }
}

impl SubcommandHook for ListUnit {
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        registrar.add(
            SubcommandDescriptor::new("list", Handler::new(list))
                .about("List available subcommands and the units providing them")
                .flag(FlagSpec::switch("json").help("Print the listing as JSON")),
        )
    }
}

struct DescribeUnit;

impl ExtensionUnit for DescribeUnit {
    fn name(&self) -> &str {
        "describe"
    }

    fn hook(&self) -> Option<&dyn SubcommandHook> {
        Some(self as &dyn SubcommandHook)
    }
}

impl SubcommandHook for DescribeUnit {
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        registrar.add(
            SubcommandDescriptor::new("describe", Handler::new(describe))
                .about("Show where a subcommand comes from and which flags it takes")
                .flag(
                    FlagSpec::positional("name")
                        .required()
                        .help("Subcommand to describe"),
                ),
        )
    }
}

#[derive(Debug, Serialize)]
struct SubcommandSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    about: Option<&'a str>,
    origin: &'a str,
    flags: &'a [FlagSpec],
}

fn list(invocation: &Invocation<'_>, out: &mut dyn Write) -> ExitStatus {
    let summaries: Vec<SubcommandSummary<'_>> = invocation
        .registry
        .iter()
        .map(|d| SubcommandSummary {
            name: d.name(),
            about: d.about_text(),
            origin: d.origin(),
            flags: d.flag_specs(),
        })
        .collect();

    let result = if invocation.args.flag("json") {
        write_json(&summaries, out)
    } else {
        write_table(&summaries, out)
    };

    report(result)
}

fn write_json(summaries: &[SubcommandSummary<'_>], out: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summaries)?;
    writeln!(out)
}

fn write_table(summaries: &[SubcommandSummary<'_>], out: &mut dyn Write) -> io::Result<()> {
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for summary in summaries {
        writeln!(
            out,
            "{:<width$}  {}  [{}]",
            summary.name,
            summary.about.unwrap_or("-"),
            summary.origin,
            width = width
        )?;
    }
    Ok(())
}

fn describe(invocation: &Invocation<'_>, out: &mut dyn Write) -> ExitStatus {
    let name = invocation.args.value("name").unwrap_or_default();
    let Some(descriptor) = invocation.registry.get(name) else {
        eprintln!("{}: unknown subcommand '{}'", invocation.registry.program().name, name);
        return ExitStatus::FAILURE;
    };

    let result = (|| -> io::Result<()> {
        writeln!(out, "{}", descriptor.name())?;
        if let Some(about) = descriptor.about_text() {
            writeln!(out, "  {}", about)?;
        }
        writeln!(out, "  provided by: {}", descriptor.origin())?;
        if descriptor.flag_specs().is_empty() {
            writeln!(out, "  flags: none")?;
            return Ok(());
        }
        writeln!(out, "  flags:")?;
        for flag in descriptor.flag_specs() {
            writeln!(out, "    {}", flag_usage(flag))?;
        }
        Ok(())
    })();

    report(result)
}

fn flag_usage(flag: &FlagSpec) -> String {
    let mut usage = match flag.kind {
        FlagKind::Switch => format!("--{}", flag.name),
        FlagKind::Value => format!("--{} <{}>", flag.name, flag.name.to_uppercase()),
        FlagKind::Positional => format!("<{}>", flag.name.to_uppercase()),
    };
    if let Some(short) = flag.short {
        usage = format!("-{}, {}", short, usage);
    }
    if flag.multiple {
        usage.push_str("...");
    }
    if flag.required {
        usage.push_str(" (required)");
    }
    if let Some(default) = &flag.default {
        usage.push_str(&format!(" [default: {}]", default));
    }
    if let Some(help) = &flag.help {
        usage.push_str(&format!("  {}", help));
    }
    usage
}

fn report(result: io::Result<()>) -> ExitStatus {
    match result {
        Ok(()) => ExitStatus::SUCCESS,
        Err(e) => {
            error!("Failed to write output: {}", e);
            ExitStatus::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramInfo;
    use crate::core::{SealedRegistry, SubcommandRegistry};
    use crate::discovery::Discovery;
    use crate::dispatch::Dispatcher;
    use pretty_assertions::assert_eq;

    fn sealed() -> SealedRegistry {
        let mut registry = SubcommandRegistry::new();
        Discovery::new()
            .discover(&location(), &mut registry)
            .unwrap();
        registry
            .registrar("deploy-unit")
            .add(
                SubcommandDescriptor::new("deploy", Handler::new(|_, _| ExitStatus::SUCCESS))
                    .about("Deploy a topology")
                    .flag(FlagSpec::value("env").short('e').required().help("Target")),
            )
            .unwrap();
        registry.seal(ProgramInfo::new("sparse", "0.0.0")).unwrap()
    }

    fn run(registry: &SealedRegistry, args: &[&str]) -> (ExitStatus, String) {
        let parsed = registry.parse_from(args.iter().copied()).unwrap();
        let mut out = Vec::new();
        let status = Dispatcher::new(registry).dispatch(parsed, &mut out);
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list_table() {
        let registry = sealed();
        let (status, out) = run(&registry, &["sparse", "list"]);
        assert!(status.is_success());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("list "));
        assert!(lines[2].contains("Deploy a topology"));
        assert!(lines[2].ends_with("[deploy-unit]"));
    }

    #[test]
    fn test_list_json() {
        let registry = sealed();
        let (status, out) = run(&registry, &["sparse", "list", "--json"]);
        assert!(status.is_success());

        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["name"], "deploy");
        assert_eq!(entries[2]["origin"], "deploy-unit");
        assert_eq!(entries[2]["flags"][0]["name"], "env");
        assert_eq!(entries[2]["flags"][0]["required"], true);
    }

    #[test]
    fn test_describe() {
        let registry = sealed();
        let (status, out) = run(&registry, &["sparse", "describe", "deploy"]);
        assert!(status.is_success());
        assert!(out.contains("provided by: deploy-unit"));
        assert!(out.contains("-e, --env <ENV> (required)  Target"));
    }

    #[test]
    fn test_describe_unknown() {
        let registry = sealed();
        let (status, out) = run(&registry, &["sparse", "describe", "ghost"]);
        assert_eq!(status, ExitStatus::FAILURE);
        assert!(out.is_empty());
    }

    #[test]
    fn test_flag_usage() {
        assert_eq!(flag_usage(&FlagSpec::switch("force")), "--force");
        assert_eq!(
            flag_usage(&FlagSpec::positional("files").multiple()),
            "<FILES>..."
        );
        assert_eq!(
            flag_usage(&FlagSpec::value("mode").default_value("fast")),
            "--mode <MODE> [default: fast]"
        );
    }
}
