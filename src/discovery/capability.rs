//! Detection and invocation of the registration hook

use crate::core::{ExtensionUnit, SubcommandRegistry};
use crate::error::Result;

/// Whether `unit` exposes a registration hook
pub fn has_hook(unit: &dyn ExtensionUnit) -> bool {
    unit.hook().is_some()
}

/// Run `unit`'s hook against `registry`, returning how many subcommands it added.
///
/// Units without a hook add nothing.
pub fn invoke_hook(unit: &dyn ExtensionUnit, registry: &mut SubcommandRegistry) -> Result<usize> {
    let Some(hook) = unit.hook() else {
        return Ok(0);
    };
    let mut registrar = registry.registrar(unit.name());
    hook.register(&mut registrar)?;
    Ok(registrar.added())
}
