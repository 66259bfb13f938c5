//! Discovery configuration and program metadata
//!
//! Configuration comes from defaults and the environment only; discovery
//! happens before the command line is parsed, so no flag can influence it.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable listing extension directories
pub const PATH_ENV: &str = "SPARSE_PATH";
/// Environment variable disabling the built-in subcommands
pub const NO_BUILTINS_ENV: &str = "SPARSE_NO_BUILTINS";
/// Name of the extension directory looked up next to the executable
pub const DEFAULT_DIR_NAME: &str = "sparse.d";

/// Configuration for subcommand discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Register the built-in subcommands
    pub include_builtins: bool,
    /// Directories scanned for manifest units, in order
    pub extension_dirs: Vec<PathBuf>,
    /// Include hidden files (starting with .)
    pub include_hidden: bool,
    /// File extensions recognised as manifests
    pub manifest_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include_builtins: true,
            extension_dirs: Vec::new(),
            include_hidden: false,
            manifest_extensions: vec!["md".to_string(), "markdown".to_string()],
        }
    }
}

impl DiscoveryConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os(PATH_ENV),
            env::var_os(NO_BUILTINS_ENV),
            default_extension_dir(),
        )
    }

    fn from_vars(
        path: Option<OsString>,
        no_builtins: Option<OsString>,
        default_dir: Option<PathBuf>,
    ) -> Self {
        let mut config = Self::default();

        config.extension_dirs = match path {
            Some(paths) => env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => default_dir.filter(|d| d.is_dir()).into_iter().collect(),
        };

        if no_builtins.is_some_and(|v| !v.is_empty()) {
            config.include_builtins = false;
        }

        config
    }

    pub fn with_extension_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extension_dirs.push(dir.into());
        self
    }

    pub fn without_builtins(mut self) -> Self {
        self.include_builtins = false;
        self
    }

    /// Whether a path carries one of the manifest extensions
    pub fn is_manifest(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.manifest_extensions.iter().any(|m| *m == ext)
            })
            .unwrap_or(false)
    }
}

/// `<exe dir>/sparse.d`
pub fn default_extension_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    Some(exe.parent()?.join(DEFAULT_DIR_NAME))
}

/// Program metadata used for the top-level grammar and help text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub name: String,
    pub version: String,
    pub about: Option<String>,
    pub after_help: Option<String>,
}

impl ProgramInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            about: None,
            after_help: None,
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn after_help(mut self, after_help: impl Into<String>) -> Self {
        self.after_help = Some(after_help.into());
        self
    }
}

impl Default for ProgramInfo {
    fn default() -> Self {
        Self::new("sparse", env!("CARGO_PKG_VERSION"))
            .about("sparse: an extensible command-line front-end.")
            .after_help(
                "Subcommands are discovered at startup. Drop a manifest file into one of \
                 the directories listed in $SPARSE_PATH (or sparse.d next to the executable) \
                 to add a subcommand; run `sparse list` to see where each one came from.",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert!(config.include_builtins);
        assert!(config.extension_dirs.is_empty());
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_path_env_replaces_default_dir() {
        let default_dir = TempDir::new().unwrap();
        let paths = env::join_paths(["/opt/a", "/opt/b"]).unwrap();
        let config =
            DiscoveryConfig::from_vars(Some(paths), None, Some(default_dir.path().to_path_buf()));
        assert_eq!(
            config.extension_dirs,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn test_default_dir_only_used_when_present() {
        let default_dir = TempDir::new().unwrap();
        let config =
            DiscoveryConfig::from_vars(None, None, Some(default_dir.path().to_path_buf()));
        assert_eq!(config.extension_dirs, vec![default_dir.path().to_path_buf()]);

        let missing = default_dir.path().join("missing");
        let config = DiscoveryConfig::from_vars(None, None, Some(missing));
        assert!(config.extension_dirs.is_empty());
    }

    #[test]
    fn test_no_builtins_env() {
        let config = DiscoveryConfig::from_vars(None, Some("1".into()), None);
        assert!(!config.include_builtins);

        let config = DiscoveryConfig::from_vars(None, Some("".into()), None);
        assert!(config.include_builtins);
    }

    #[test]
    fn test_is_manifest() {
        let config = DiscoveryConfig::default();
        assert!(config.is_manifest(Path::new("deploy.md")));
        assert!(config.is_manifest(Path::new("deploy.MARKDOWN")));
        assert!(!config.is_manifest(Path::new("deploy.txt")));
        assert!(!config.is_manifest(Path::new("deploy")));
    }
}
