use std::path::Path;

use warpgrid_pool::PoolConfig;

pub fn check(path: &Path) -> anyhow::Result<()> {
    let config = super::load_config(path)?;
    println!("✓ {} is a valid pool config", path.display());
    println!("{}", render(&config));
    Ok(())
}

/// Human-readable summary of the effective settings. Never prints the password.
fn render(config: &PoolConfig) -> String {
    let eviction = match (config.keepalive.enabled, config.max_idle()) {
        (true, _) => format!(
            "keepalive every {:?} ({:?})",
            config.keepalive.interval(),
            config.keepalive.probe_query
        ),
        (false, Some(max_idle)) => format!("idle eviction after {max_idle:?}"),
        (false, None) => "none".to_string(),
    };
    [
        format!("  address:         {}", config.address),
        format!("  user:            {}", config.credentials.user),
        format!("  size:            {}..={}", config.min_size, config.max_size),
        format!("  connect timeout: {:?}", config.connect_timeout()),
        format!("  idle policy:     {eviction}"),
        format!("  log level:       {}", config.log_level),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn render_keepalive_config() {
        let file = write_config(
            r#"
address = "db.warp.local:5432"
min_size = 2
max_size = 4

[credentials]
user = "app"
password = "hunter2"

[keepalive]
enabled = true
interval_ms = 30000
"#,
        );
        let config = PoolConfig::from_file(file.path()).unwrap();
        let rendered = render(&config);

        assert!(rendered.contains("db.warp.local:5432"));
        assert!(rendered.contains("2..=4"));
        assert!(rendered.contains("keepalive every 30s"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn render_idle_eviction_config() {
        let file = write_config(
            r#"
address = "db.warp.local:5432"
max_idle_ms = 1500
"#,
        );
        let config = PoolConfig::from_file(file.path()).unwrap();
        assert!(render(&config).contains("idle eviction after 1.5s"));
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let file = write_config(
            r#"
address = "db.warp.local:5432"
min_size = 3
max_size = 1
"#,
        );
        assert!(PoolConfig::from_file(file.path()).is_err());
    }
}
