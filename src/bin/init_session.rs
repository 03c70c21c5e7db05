//! Session initialization binary: import browser cookies into config.json.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use weibo_group_sender::commands::login;
use weibo_group_sender::config::CONFIG_FILE;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("weibo_group_sender=info".parse()?),
        )
        .init();

    let config_path = std::env::var("WEIBO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));
    login::run(&config_path, None)?;
    Ok(())
}
