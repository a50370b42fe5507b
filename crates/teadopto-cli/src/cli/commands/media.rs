//! Media path resolution.

use anyhow::{Result, bail};
use teadopto_core::config::Config;
use teadopto_core::media::media_url;

pub fn resolve(config: &Config, path: &str) -> Result<()> {
    let base = config.api_base_url()?;
    let Some(url) = media_url(base.as_str(), path) else {
        bail!("No media path given.");
    };
    println!("{url}");
    Ok(())
}
