//! Kernel PRNG seed-control tool.
//!
//! Performs, in order: print diagnostics, load the stored seed into the
//! kernel entropy device, best-effort hypervisor entropy load, store a
//! fresh seed file. The exit code is a bitmask of the failed steps.

use clap::Parser;
use tracing::warn;

use fortuna_rng::kernel::config::SeedPaths;
use fortuna_rng::kernel::seed::{self, SystemHost};

const ERR_LOADSEED: i32 = 1;
const ERR_STORESEED: i32 = 2;
const ERR_PRINTDIAG: i32 = 4;
const ERR_HYPERVISOR: i32 = 8;

/// Default configuration file location.
const CONFIG_PATH: &str = "/etc/fortuna-rng/seedctl.toml";

/// Carries kernel PRNG entropy across reboots.
#[derive(Debug, Parser)]
#[command(name = "seedctl", version, about)]
struct Args {}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Args {} = Args::parse();

    let paths = match load_paths() {
        Ok(paths) => paths,
        Err(code) => std::process::exit(code),
    };

    let mut host = SystemHost::new(paths);
    let mut code = 0;

    if let Err(err) = seed::print_diagnostics(&mut host) {
        warn!(%err, "diagnostics unavailable");
        code |= ERR_PRINTDIAG;
    }

    if let Err(err) = seed::load_seed(&mut host) {
        warn!(%err, "failed to load stored seed");
        code |= ERR_LOADSEED;
    }

    if let Err(err) = seed::load_hypervisor_entropy(&mut host) {
        warn!(%err, "hypervisor entropy unavailable");
        code |= ERR_HYPERVISOR;
    }

    if let Err(err) = seed::store_seed(&mut host) {
        warn!(%err, "failed to store fresh seed");
        code |= ERR_STORESEED;
    }

    std::process::exit(code);
}

fn load_paths() -> Result<SeedPaths, i32> {
    let all_failed = ERR_PRINTDIAG | ERR_LOADSEED | ERR_HYPERVISOR | ERR_STORESEED;

    let paths = SeedPaths::load(std::path::Path::new(CONFIG_PATH)).map_err(|err| {
        eprintln!("bad configuration: {err}");
        all_failed
    })?;
    paths.validate().map_err(|err| {
        eprintln!("bad configuration: {err}");
        all_failed
    })?;
    Ok(paths)
}
