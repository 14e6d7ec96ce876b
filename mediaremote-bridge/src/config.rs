use std::collections::HashSet;
use std::env;
use std::time::Duration;

use log::debug;

use crate::apple_script::DEFAULT_SCRIPT_TIMEOUT;
use crate::error::{Error, Result};

pub const DEFAULT_FRAMEWORK_PATH: &str = "/System/Library/PrivateFrameworks/MediaRemote.framework";

const FRAMEWORK_PATH_VAR: &str = "MEDIAREMOTE_FRAMEWORK_PATH";
const POLL_INTERVAL_VAR: &str = "MEDIAREMOTE_POLL_INTERVAL_MS";
const TOGGLE_DELAY_VAR: &str = "MEDIAREMOTE_TOGGLE_DELAY_MS";
const SKIP_DELAY_VAR: &str = "MEDIAREMOTE_SKIP_DELAY_MS";
const SPOTIFY_FALLBACK_VAR: &str = "MEDIAREMOTE_SPOTIFY_FALLBACK";
const ALLOWED_APPS_VAR: &str = "MEDIAREMOTE_ALLOWED_APPS";
const SCRIPT_TIMEOUT_VAR: &str = "MEDIAREMOTE_SCRIPT_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub framework_path: String,
    /// Backup refresh, notifications are not delivered for every player.
    pub poll_interval: Duration,
    /// Wait before refreshing after a play/pause toggle.
    pub toggle_refresh_delay: Duration,
    /// Wait before refreshing after a next/previous track command.
    pub skip_refresh_delay: Duration,
    /// Ask Spotify through AppleScript when MediaRemote returns nothing.
    pub spotify_fallback: bool,
    /// Bundle ids whose sessions are reported. Empty allows every app.
    pub allowed_app_ids: HashSet<String>,
    /// Upper bound for a single AppleScript invocation.
    pub script_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            framework_path: DEFAULT_FRAMEWORK_PATH.to_string(),
            poll_interval: Duration::from_secs(2),
            toggle_refresh_delay: Duration::from_millis(100),
            skip_refresh_delay: Duration::from_millis(300),
            spotify_fallback: true,
            allowed_app_ids: HashSet::new(),
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Config> {
        let mut config = Config::default();

        if let Some(path) = lookup(FRAMEWORK_PATH_VAR) {
            config.framework_path = path;
        }
        if let Some(value) = lookup(POLL_INTERVAL_VAR) {
            config.poll_interval = parse_millis(POLL_INTERVAL_VAR, &value)?;
        }
        if let Some(value) = lookup(TOGGLE_DELAY_VAR) {
            config.toggle_refresh_delay = parse_millis(TOGGLE_DELAY_VAR, &value)?;
        }
        if let Some(value) = lookup(SKIP_DELAY_VAR) {
            config.skip_refresh_delay = parse_millis(SKIP_DELAY_VAR, &value)?;
        }
        if let Some(value) = lookup(SPOTIFY_FALLBACK_VAR) {
            config.spotify_fallback = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(Error::InvalidConfig {
                        key: SPOTIFY_FALLBACK_VAR,
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup(SCRIPT_TIMEOUT_VAR) {
            config.script_timeout = parse_millis(SCRIPT_TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = lookup(ALLOWED_APPS_VAR) {
            config.allowed_app_ids = value
                .split(',')
                .map(str::trim)
                .filter(|x| !x.is_empty())
                .map(str::to_string)
                .collect();
        }

        debug!("Loaded media remote config {config:?}");
        Ok(config)
    }

    pub fn is_app_allowed(&self, app_id: Option<&str>) -> bool {
        if self.allowed_app_ids.is_empty() {
            return true;
        }

        app_id.is_some_and(|x| self.allowed_app_ids.contains(x))
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| Error::InvalidConfig {
        key,
        value: value.to_string(),
    })?;

    if millis == 0 {
        return Err(Error::InvalidConfig {
            key,
            value: value.to_string(),
        });
    }

    Ok(Duration::from_millis(millis))
}
