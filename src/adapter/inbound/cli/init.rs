//! `parimarket init`: write a starter config and create the database.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Starter config written by `init`.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.example.toml");

/// Write the config template to `path` and migrate the configured database.
pub fn execute(path: &Path, config: &Config, force: bool) -> Result<()> {
    let wrote_config = if path.exists() && !force {
        output::note(&format!(
            "{} already exists; keeping it (use --force to overwrite)",
            path.display()
        ));
        false
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, CONFIG_TEMPLATE)?;
        output::success(&format!("Wrote {}", path.display()));
        true
    };

    SqliteStore::open(&config.database.url)?;
    output::success(&format!("Database ready at {}", config.database.url));

    output::json_output(json!({
        "command": "init",
        "config": path.display().to_string(),
        "config_written": wrote_config,
        "database": config.database.url,
    }));
    Ok(())
}
