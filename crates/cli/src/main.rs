//! Engine runtime CLI entry point.
//!
//! This binary is the composition root for provisioning. Responsibilities:
//!
//! 1. **Wire observability**: configure `tracing-subscriber` with an
//!    `EnvFilter` (from `RUST_LOG`, default `info`) and either a JSON layer
//!    (`LOG_FORMAT=json`) or human-readable output.
//! 2. **Capture configuration**: read URL and engine overrides from the
//!    environment exactly once into a [`binaries::ProvisionerConfig`].
//! 3. **Provision**: download the CLI and every engine into the target
//!    directory (first argument, default: the shared engine temp dir), then
//!    print the path of each binary a client would launch.
//!
//! ```text
//! fetch-engines [TARGET_DIR]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use binaries::{Provisioner, ProvisionerConfig};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ProvisionerConfig::from_env().context("could not load provisioning config")?;
    let provisioner = Provisioner::new(config);

    let dir = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => provisioner.global_temp_dir(),
    };

    info!(
        dir = %dir.display(),
        platform = %provisioner.config().platform,
        engine_version = %provisioner.config().versions.engine,
        "fetching binaries"
    );

    provisioner
        .fetch_all(&dir)
        .await
        .with_context(|| format!("could not download engines into {}", dir.display()))?;

    for entry in types::ENGINES {
        println!("{}\t{}", entry.name, provisioner.locate_engine(&dir, &entry).display());
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
