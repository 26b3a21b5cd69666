//! Host environment lookups and constants

use std::env;

/// Load an environment variable, falling back to a second name
pub fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| env::var(fallback).ok().filter(|v| !v.is_empty()))
}

/// Login name of the invoking user from `USER` / `LOGNAME`
pub fn login_user() -> Option<String> {
    load_with_fallback("USER", "LOGNAME")
}

/// Home directory of the invoking user
pub fn home_dir() -> Option<String> {
    env::var("HOME").ok().filter(|v| !v.is_empty())
}

/// Constants
pub mod constants {
    /// Version
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Config file read when `--config` is not given
    pub const DEFAULT_CONFIG_FILE: &str = "deploy.toml";

    /// Log file used when the config does not name one
    pub const DEFAULT_LOG_FILE: &str = "deployment.log";

    /// NodeSource setup script, `{version}` is the major version
    pub const NODESOURCE_SETUP_URL: &str = "https://deb.nodesource.com/setup_{version}.x";

    /// npm lock file that switches the build to `npm ci`
    pub const LOCK_FILE: &str = "package-lock.json";
}
