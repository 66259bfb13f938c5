//! Discovery orchestration: enumerate, load once, detect the hook, register

use crate::core::SubcommandRegistry;
use crate::discovery::capability::{has_hook, invoke_hook};
use crate::discovery::loader::{LoadCache, LoadOutcome};
use crate::discovery::location::ExtensionLocation;
use crate::error::Result;
use log::{debug, info, warn};

/// Counters describing one call to [`Discovery::discover`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Candidates produced by the location
    pub enumerated: usize,
    /// Units loaded by this call
    pub loaded: usize,
    /// Candidates skipped because a unit of that name was already loaded
    pub already_loaded: usize,
    /// Loaded units without a registration hook
    pub without_hook: usize,
    /// Subcommands added to the registry
    pub registered: usize,
}

/// Discovery orchestrator owning the load cache for one run.
///
/// Any error while processing a location poisons the registry, so a
/// partially populated registry can never be sealed.
#[derive(Default)]
pub struct Discovery {
    cache: LoadCache,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Register every hooked unit found at `location` into `registry`
    pub fn discover(
        &mut self,
        location: &dyn ExtensionLocation,
        registry: &mut SubcommandRegistry,
    ) -> Result<DiscoveryReport> {
        info!("Discovering extension units in {}", location.describe());

        let result = self.discover_units(location, registry);
        match &result {
            Ok(report) => info!(
                "Finished {}: {} candidates, {} subcommands registered",
                location.describe(),
                report.enumerated,
                report.registered
            ),
            Err(e) => {
                warn!("Discovery in {} failed: {}", location.describe(), e);
                registry.poison();
            }
        }
        result
    }

    fn discover_units(
        &mut self,
        location: &dyn ExtensionLocation,
        registry: &mut SubcommandRegistry,
    ) -> Result<DiscoveryReport> {
        let mut report = DiscoveryReport::default();

        for candidate in location.enumerate()? {
            let candidate = candidate?;
            report.enumerated += 1;

            let handle = match self.cache.ensure_loaded(&candidate, location)? {
                LoadOutcome::Fresh(handle) => handle,
                LoadOutcome::Cached(_) => {
                    warn!(
                        "Unit '{}' from {} is already loaded, skipping",
                        candidate.name(),
                        location.describe()
                    );
                    report.already_loaded += 1;
                    continue;
                }
            };
            report.loaded += 1;

            if !has_hook(handle.as_ref()) {
                debug!("Unit '{}' has no registration hook", candidate.name());
                report.without_hook += 1;
                continue;
            }

            report.registered += invoke_hook(handle.as_ref(), registry)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramInfo;
    use crate::core::{
        ExitStatus, ExtensionUnit, Handler, Registrar, SubcommandDescriptor, SubcommandHook,
    };
    use crate::discovery::location::StaticLocation;
    use crate::error::SparseError;
    use pretty_assertions::assert_eq;

    struct Contributor {
        name: String,
        subcommands: Vec<String>,
    }

    impl ExtensionUnit for Contributor {
        fn name(&self) -> &str {
            &self.name
        }

        fn hook(&self) -> Option<&dyn SubcommandHook> {
            Some(self as &dyn SubcommandHook)
        }
    }

    impl SubcommandHook for Contributor {
        fn register(&self, registrar: &mut Registrar<'_>) -> Result<()> {
            for name in &self.subcommands {
                registrar.add(SubcommandDescriptor::new(
                    name.clone(),
                    Handler::new(|_, _| ExitStatus::SUCCESS),
                ))?;
            }
            Ok(())
        }
    }

    struct Silent(String);

    impl ExtensionUnit for Silent {
        fn name(&self) -> &str {
            &self.0
        }
    }

    fn contributor(
        unit: &'static str,
        subcommands: &'static [&'static str],
    ) -> impl Fn() -> Result<Box<dyn ExtensionUnit>> {
        move || {
            Ok(Box::new(Contributor {
                name: unit.to_string(),
                subcommands: subcommands.iter().map(|s| s.to_string()).collect(),
            }) as Box<dyn ExtensionUnit>)
        }
    }

    #[test]
    fn test_discover_registers_in_enumeration_order() {
        let location = StaticLocation::new("test")
            .with_unit("b-unit", contributor("b-unit", &["zulu"]))
            .with_unit("a-unit", contributor("a-unit", &["alpha", "bravo"]));
        let mut registry = SubcommandRegistry::new();
        let mut discovery = Discovery::new();

        let report = discovery.discover(&location, &mut registry).unwrap();

        assert_eq!(
            report,
            DiscoveryReport {
                enumerated: 2,
                loaded: 2,
                already_loaded: 0,
                without_hook: 0,
                registered: 3,
            }
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["zulu", "alpha", "bravo"]);
        assert_eq!(registry.get("bravo").unwrap().origin(), "a-unit");
    }

    #[test]
    fn test_units_without_hook_are_skipped() {
        let location = StaticLocation::new("test")
            .with_unit("quiet", || Ok(Box::new(Silent("quiet".into())) as Box<dyn ExtensionUnit>))
            .with_unit("loud", contributor("loud", &["shout"]));
        let mut registry = SubcommandRegistry::new();

        let report = Discovery::new().discover(&location, &mut registry).unwrap();

        assert_eq!(report.without_hook, 1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_poisoned());
    }

    #[test]
    fn test_second_discovery_is_a_no_op() {
        let location = StaticLocation::new("test").with_unit("one", contributor("one", &["run"]));
        let mut registry = SubcommandRegistry::new();
        let mut discovery = Discovery::new();

        discovery.discover(&location, &mut registry).unwrap();
        let report = discovery.discover(&location, &mut registry).unwrap();

        assert_eq!(report.already_loaded, 1);
        assert_eq!(report.registered, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_subcommand_poisons_registry() {
        let location = StaticLocation::new("test")
            .with_unit("first", contributor("first", &["run"]))
            .with_unit("second", contributor("second", &["run"]));
        let mut registry = SubcommandRegistry::new();

        let err = Discovery::new().discover(&location, &mut registry).unwrap_err();

        assert!(matches!(err, SparseError::DuplicateSubcommand { .. }));
        assert!(registry.is_poisoned());
        assert!(registry.seal(ProgramInfo::default()).is_err());
    }

    #[test]
    fn test_load_failure_aborts_discovery() {
        let location = StaticLocation::new("test")
            .with_unit("broken", || Err(SparseError::unit_load("broken", "boom")))
            .with_unit("fine", contributor("fine", &["run"]));
        let mut registry = SubcommandRegistry::new();
        let mut discovery = Discovery::new();

        let err = discovery.discover(&location, &mut registry).unwrap_err();

        assert!(matches!(err, SparseError::UnitLoad { .. }));
        assert!(registry.is_empty());
        assert!(discovery.cache().is_empty());
    }
}
