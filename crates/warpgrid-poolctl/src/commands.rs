pub mod check;
pub mod status;

use std::path::Path;

use warpgrid_pool::PoolConfig;

/// Load the pool config and install the tracing subscriber.
///
/// `RUST_LOG` wins over the config's `log_level`.
pub fn load_config(path: &Path) -> anyhow::Result<PoolConfig> {
    let config = PoolConfig::from_file(path);
    let level = config
        .as_ref()
        .map(|c| c.log_level.as_str())
        .unwrap_or("info");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    Ok(config?)
}
