use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const CACHE_SIZE_ENV: &str = "TAB_CACHE_SIZE";
pub const ADB_PATH_ENV: &str = "ADB_PATH";
pub const PROXY_PATH_ENV: &str = "IOS_WEBKIT_DEBUG_PROXY_PATH";

pub const DEFAULT_CACHE_CAPACITY: usize = 30;

/// Process-wide settings, read once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cache_capacity: usize,
    pub adb_path: Option<PathBuf>,
    pub proxy_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            adb_path: None,
            proxy_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            cache_capacity: parse_cache_capacity(lookup(CACHE_SIZE_ENV).as_deref()),
            adb_path: non_empty(ADB_PATH_ENV).map(PathBuf::from),
            proxy_path: non_empty(PROXY_PATH_ENV).map(PathBuf::from),
        }
    }
}

/// Positive integers are accepted as-is; anything else falls back to the default.
pub fn parse_cache_capacity(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_CACHE_CAPACITY;
    };
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_CACHE_CAPACITY,
                "Invalid {}, using default",
                CACHE_SIZE_ENV
            );
            DEFAULT_CACHE_CAPACITY
        }
    }
}

fn default_port() -> u16 {
    9222
}

fn default_socket() -> String {
    "chrome_devtools_remote".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_wait_secs() -> u64 {
    2
}

/// Knobs for a single device operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverOptions {
    #[serde(default = "default_port")]
    pub port: u16,
    /// ADB abstract socket Chrome listens on (Android only).
    #[serde(default = "default_socket")]
    pub socket: String,
    /// Per-request network timeout, in seconds.
    #[serde(default = "default_timeout_secs", rename = "timeout")]
    pub timeout_secs: u64,
    /// Settle time after port forwarding / proxy start, in seconds.
    #[serde(default = "default_wait_secs", rename = "wait")]
    pub wait_secs: u64,
    #[serde(default)]
    pub skip_cleanup: bool,
    #[serde(default)]
    pub debug: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            port: default_port(),
            socket: default_socket(),
            timeout_secs: default_timeout_secs(),
            wait_secs: default_wait_secs(),
            skip_cleanup: false,
            debug: false,
        }
    }
}

impl DriverOptions {
    /// Zero port or timeout and a blank socket name mean "use the default".
    pub fn normalized(mut self) -> Self {
        if self.port == 0 {
            self.port = default_port();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.socket.trim().is_empty() {
            self.socket = default_socket();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    /// Overall bound for one operation: driver start, settle wait, and every
    /// request made while the device is held.
    pub fn operation_budget(&self) -> Duration {
        Duration::from_secs(self.timeout_secs + self.wait_secs + 10)
    }

    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}
