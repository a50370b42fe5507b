//! Config command handlers.

use anyhow::{Context, Result};
use teadopto_core::config::{self, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

/// Prints the settings in effect after environment overrides.
pub fn show(config: &config::Config) -> Result<()> {
    let timeout = config
        .request_timeout()
        .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()));

    println!("config:       {}", paths::config_path().display());
    println!("session:      {}", paths::session_path().display());
    println!("logs:         {}", paths::logs_dir().display());
    println!("api_base_url: {}", config.api_base_url()?);
    println!("admin_url:    {}", config.admin_url()?);
    println!("timeout:      {timeout}");
    Ok(())
}
