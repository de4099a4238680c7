use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use warpgrid_pool::tcp::TcpConnectionFactory;
use warpgrid_pool::{Pool, PoolStatus};

pub async fn status(path: &Path, reserve: usize, format: &str) -> anyhow::Result<()> {
    let config = super::load_config(path)?;
    let factory = Arc::new(TcpConnectionFactory::new());
    let pool = Pool::new(config, factory)?;

    let result = snapshot(&pool, reserve).await;
    // Always hand the connections back, even when a reservation failed.
    pool.purge().await;
    let status = result?;

    let unhealthy = status.unhealthy();
    if unhealthy > 0 {
        warn!(unhealthy, total = status.total(), "pool holds unhealthy connections");
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            print!("{status}");
            println!("unhealthy: {unhealthy}/{}", status.total());
        }
    }
    Ok(())
}

async fn snapshot(pool: &Pool, reserve: usize) -> anyhow::Result<PoolStatus> {
    pool.initialize().await?;

    let mut leases = Vec::with_capacity(reserve);
    for _ in 0..reserve {
        leases.push(pool.reserve().await?);
    }
    info!(reserved = leases.len(), "reserved connections for snapshot");

    pool.log_stats().await;
    Ok(pool.status().await)
}
