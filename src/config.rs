//! Lapor configuration.
//!
//! Loaded from `~/.lapor/config.toml`. Every key is optional; a missing file
//! means all defaults.
//!
//! The backend origin is resolved through a chain:
//!
//! 1. `--api-url <url>`: explicit per-command override
//! 2. `API_URL`, `NEXT_PUBLIC_API_URL`, `NEXT_PUBLIC_API_BASE` env vars, in that order
//! 3. `api-url` in the config file
//! 4. `http://localhost:8080`

use std::{env, fs, io, path::PathBuf, time::Duration};

use serde::Deserialize;

/// Origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Environment variables consulted for the backend origin, highest priority first.
pub const API_URL_VARS: [&str; 3] = ["API_URL", "NEXT_PUBLIC_API_URL", "NEXT_PUBLIC_API_BASE"];

/// Lapor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Backend origin, below the flag and environment in priority.
    pub api_url: Option<String>,

    /// Provider the internal forms accept email addresses from.
    pub email_domain: String,

    /// Per-request HTTP timeout.
    pub timeout_secs: u64,

    /// Dashboard refresh interval in `watch` mode.
    pub poll_interval_secs: u64,

    /// Quiet period before a search is sent.
    pub debounce_ms: u64,

    /// Default page size for report lists.
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            email_domain: "gmail.com".to_string(),
            timeout_secs: 30,
            poll_interval_secs: 30,
            debounce_ms: 500,
            page_size: 10,
        }
    }
}

impl Config {
    /// Load config from `~/.lapor/config.toml`, falling back to defaults.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &std::path::Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.lapor/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".lapor").join("config.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Resolve the backend origin from the process environment.
    pub fn api_origin(&self, explicit: Option<&str>) -> String {
        self.api_origin_with(explicit, |name| env::var(name).ok())
    }

    /// Resolve the backend origin with a custom environment lookup.
    ///
    /// Empty values at any level are skipped. Trailing slashes are trimmed.
    pub fn api_origin_with(
        &self,
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> String {
        let non_empty = |s: &str| !s.trim().is_empty();

        let origin = explicit
            .filter(|s| non_empty(s))
            .map(String::from)
            .or_else(|| {
                API_URL_VARS
                    .iter()
                    .find_map(|name| lookup(name).filter(|s| non_empty(s)))
            })
            .or_else(|| self.api_url.clone().filter(|s| non_empty(s)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        origin.trim().trim_end_matches('/').to_string()
    }
}
