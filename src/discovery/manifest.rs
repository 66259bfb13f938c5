//! Manifest extension units
//!
//! A manifest is a markdown file whose YAML front matter may carry a
//! `subcommand` block. The block is the unit's registration hook; the
//! markdown body becomes the subcommand's long help.
//!
//! ```markdown
//! ---
//! subcommand:
//!   about: Submit a topology
//!   flags:
//!     - name: env
//!       short: e
//!       required: true
//!   exec: ["./submit.sh", "--env", "{env}"]
//! ---
//! Submits the topology to the selected environment.
//! ```
//!
//! `{name}` in an `exec` token is a placeholder for the flag `name`. Literal
//! braces are written `{{` and `}}`, so a shell snippet reads
//! `"echo ${{HOME}}"`.

use crate::core::{
    ArgValue, BoundArgs, ExitStatus, ExtensionUnit, FlagSpec, Handler, Registrar,
    SubcommandDescriptor, SubcommandHook,
};
use crate::error::{Result, SparseError};
use gray_matter::{engine::YAML, Matter};
use log::{debug, error, info};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// Front matter key holding the registration hook
const HOOK_KEY: &str = "subcommand";
const FENCE: &str = "---";
/// Environment variable naming the dispatched subcommand in the child process
pub const SUBCOMMAND_ENV: &str = "SPARSE_SUBCOMMAND";

const EXIT_NOT_FOUND: i32 = 127;
const EXIT_CANNOT_EXECUTE: i32 = 126;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z0-9][A-Za-z0-9_-]*)\}")
        .expect("valid placeholder pattern")
});

/// Contents of a manifest's `subcommand` block
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct HookSpec {
    name: Option<String>,
    about: Option<String>,
    #[serde(default)]
    flags: Vec<FlagSpec>,
    exec: Vec<String>,
}

/// A loaded manifest file
#[derive(Debug)]
pub struct ManifestUnit {
    name: String,
    hook: Option<ManifestHook>,
}

/// Registration hook backed by a manifest's `subcommand` block
#[derive(Debug)]
pub struct ManifestHook {
    unit: String,
    path: PathBuf,
    raw: serde_yaml::Value,
    body: String,
}

impl ManifestUnit {
    /// Read and parse a manifest
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SparseError::unit_load(name, format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(name, path, &content)
    }

    /// Parse manifest content read from `path`
    pub fn parse(name: &str, path: &Path, content: &str) -> Result<Self> {
        if !content.trim_start().starts_with(FENCE) {
            debug!("Manifest {} has no front matter", path.display());
            return Ok(Self {
                name: name.to_string(),
                hook: None,
            });
        }

        if !has_closing_fence(content) {
            return Err(SparseError::unit_load(name, "unterminated front matter"));
        }

        let parsed = Matter::<YAML>::new().parse(content);
        let front_matter: serde_yaml::Value = serde_yaml::from_str(&parsed.matter)
            .map_err(|e| SparseError::unit_load(name, format!("invalid front matter: {}", e)))?;

        let raw = match front_matter {
            serde_yaml::Value::Null => None,
            serde_yaml::Value::Mapping(mut map) => map.remove(HOOK_KEY),
            _ => {
                return Err(SparseError::unit_load(
                    name,
                    "front matter must be a mapping",
                ))
            }
        };

        Ok(Self {
            name: name.to_string(),
            hook: raw.map(|raw| ManifestHook {
                unit: name.to_string(),
                path: path.to_path_buf(),
                raw,
                body: parsed.content.trim().to_string(),
            }),
        })
    }
}

impl ExtensionUnit for ManifestUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn hook(&self) -> Option<&dyn SubcommandHook> {
        self.hook.as_ref().map(|h| h as &dyn SubcommandHook)
    }
}

impl ManifestHook {
    fn decode(&self) -> Result<HookSpec> {
        let decoded: HookSpec = serde_yaml::from_value(self.raw.clone())
            .map_err(|e| SparseError::malformed_hook(&self.unit, e.to_string()))?;

        if decoded.exec.is_empty() || decoded.exec[0].trim().is_empty() {
            return Err(SparseError::malformed_hook(
                &self.unit,
                "'exec' must name a program",
            ));
        }

        for token in &decoded.exec {
            for capture in PLACEHOLDER.captures_iter(token) {
                let Some(flag) = capture.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                if !decoded.flags.iter().any(|f| f.name == flag) {
                    return Err(SparseError::malformed_hook(
                        &self.unit,
                        format!("placeholder '{{{}}}' does not name a declared flag", flag),
                    ));
                }
            }
        }

        Ok(decoded)
    }
}

impl SubcommandHook for ManifestHook {
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        let decoded = self.decode()?;
        let name = decoded.name.unwrap_or_else(|| self.unit.clone());
        let program_dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut descriptor = SubcommandDescriptor::new(
            name,
            exec_handler(decoded.exec, program_dir),
        )
        .flags(decoded.flags);
        if let Some(about) = decoded.about {
            descriptor = descriptor.about(about);
        }
        if !self.body.is_empty() {
            descriptor = descriptor.long_about(self.body.clone());
        }

        registrar.add(descriptor)
    }
}

/// Whether the front matter opened at the top of `content` is closed again
fn has_closing_fence(content: &str) -> bool {
    content
        .trim_start()
        .lines()
        .skip(1)
        .any(|line| line.trim_end() == FENCE)
}

/// Expand `{flag}` placeholders in an argv template
pub fn expand_argv(template: &[String], args: &BoundArgs) -> Vec<String> {
    let mut argv = Vec::with_capacity(template.len());

    for token in template {
        let whole = PLACEHOLDER
            .captures(token)
            .filter(|c| c[0].len() == token.len())
            .and_then(|c| c.get(1).map(|m| m.as_str().to_string()));

        if let Some(flag) = whole {
            match args.get(&flag) {
                Some(ArgValue::Switch(true)) => argv.push(format!("--{}", flag)),
                Some(ArgValue::Values(values)) => argv.extend(values.iter().cloned()),
                _ => {}
            }
            continue;
        }

        let expanded = PLACEHOLDER.replace_all(token, |caps: &regex::Captures<'_>| {
            match caps.get(1) {
                Some(flag) => args
                    .get(flag.as_str())
                    .map(ArgValue::joined)
                    .unwrap_or_default(),
                // `{{` or `}}`
                None => caps[0][..1].to_string(),
            }
        });
        argv.push(expanded.into_owned());
    }

    argv
}

/// Resolve a relative program path containing a separator against `base`
fn resolve_program(program: &str, base: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

fn exec_handler(template: Vec<String>, program_dir: PathBuf) -> Handler {
    Handler::new(move |invocation, _out| {
        let argv = expand_argv(&template, invocation.args);
        let Some((program, rest)) = argv.split_first() else {
            error!("Subcommand '{}' expanded to an empty command line", invocation.subcommand);
            return ExitStatus::from_code(EXIT_NOT_FOUND);
        };
        let program = resolve_program(program, &program_dir);

        info!("Running {} {:?}", program.display(), rest);
        let status = Command::new(&program)
            .args(rest)
            .env(SUBCOMMAND_ENV, invocation.subcommand)
            .status();

        match status {
            Ok(status) => exit_status_of(status),
            Err(e) => {
                error!("Failed to run {}: {}", program.display(), e);
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExitStatus::from_code(EXIT_NOT_FOUND)
                } else {
                    ExitStatus::from_code(EXIT_CANNOT_EXECUTE)
                }
            }
        }
    })
}

#[cfg(unix)]
fn exit_status_of(status: std::process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => ExitStatus::from_code(code),
        (None, Some(signal)) => ExitStatus::from_code(128 + signal),
        (None, None) => ExitStatus::FAILURE,
    }
}

#[cfg(not(unix))]
fn exit_status_of(status: std::process::ExitStatus) -> ExitStatus {
    status
        .code()
        .map(ExitStatus::from_code)
        .unwrap_or(ExitStatus::FAILURE)
}
