use anyhow::{Context, Result};
use std::io::Write;

use sparse::{DiscoveryConfig, Dispatcher, ProgramInfo, SparseError};

fn main() -> Result<()> {
    env_logger::init();

    let config = DiscoveryConfig::from_env();
    let registry = sparse::discover(&config, ProgramInfo::default())
        .context("failed to discover subcommands")?;

    let parsed = match registry.parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(SparseError::Usage(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let mut stdout = std::io::stdout().lock();
    let status = Dispatcher::new(&registry).dispatch(parsed, &mut stdout);
    stdout.flush().ok();
    drop(stdout);

    std::process::exit(status.code());
}
