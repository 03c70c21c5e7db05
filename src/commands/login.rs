//! Session login/logout: import the browser's cookie string into config.json

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use super::prompt;
use crate::config::Config;
use crate::cookies::missing_required;
use crate::error::Error;

/// Replace the stored cookies with `raw`. Returns the required cookie names
/// that are still missing.
pub fn import_cookies(config: &mut Config, raw: &str) -> crate::Result<Vec<&'static str>> {
    config.set_cookies_from_str(raw);
    if !config.is_logged_in() {
        return Err(Error::InvalidArgument(
            "cookie string contains no name=value pairs".to_string(),
        ));
    }
    Ok(missing_required(&config.cookies))
}

/// Interactive login. Uses `cookie` when given, otherwise reads it from stdin.
pub fn run(config_path: &Path, cookie: Option<String>) -> Result<()> {
    let mut config = Config::load_from_file(config_path)?;

    if cookie.is_none() {
        println!("🔐 Log in to https://api.weibo.com/chat in your browser,");
        println!("   then copy the full Cookie header from any api.weibo.com request.");
    }
    let raw = prompt::value_or_ask(cookie, "Cookie: ")?;
    if raw.is_empty() {
        anyhow::bail!("No cookie string provided");
    }

    let missing = import_cookies(&mut config, &raw)?;
    if !missing.is_empty() {
        warn!(?missing, "Required cookies missing, requests may be rejected");
        println!("⚠️  Missing cookies: {}", missing.join(", "));
    }

    config.save(config_path)?;
    info!(
        cookies = config.cookies.len(),
        path = %config_path.display(),
        "Session cookies saved"
    );
    println!(
        "✅ Saved {} cookies to {}",
        config.cookies.len(),
        config_path.display()
    );
    Ok(())
}

/// Drop stored cookies, keeping the rest of the configuration.
pub fn logout(config_path: &Path) -> Result<()> {
    let mut config = Config::load_from_file(config_path)?;
    if !config.is_logged_in() {
        println!("Not logged in, nothing to clear");
        return Ok(());
    }
    config.cookies.clear();
    config.save(config_path)?;
    info!(path = %config_path.display(), "Session cookies cleared");
    println!("✅ Logged out");
    Ok(())
}
