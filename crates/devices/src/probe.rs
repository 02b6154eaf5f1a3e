//! Locating the external debugging tools and diagnosing the local setup.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tabrelay_core::{Config, Error, Platform, Result};
use tokio::process::Command;
use tracing::debug;

const ADB_INSTALL_HINT: &str = "Install with:\n\
    - macOS: brew install --cask android-platform-tools\n\
    - Linux: sudo apt install android-tools-adb\n\
    - Windows: Download from developer.android.com/tools/releases/platform-tools";

const PROXY_INSTALL_HINT: &str = "Install with:\n\
    - macOS: brew install ios-webkit-debug-proxy\n\
    - Linux: See github.com/google/ios-webkit-debug-proxy for build instructions\n\
    - Windows: Not officially supported";

/// External executables the drivers shell out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTool {
    Adb,
    WebKitProxy,
}

impl ExternalTool {
    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::Adb if cfg!(windows) => "adb.exe",
            Self::Adb => "adb",
            Self::WebKitProxy => "ios_webkit_debug_proxy",
        }
    }

    fn env_override<'a>(&self, config: &'a Config) -> Option<&'a PathBuf> {
        match self {
            Self::Adb => config.adb_path.as_ref(),
            Self::WebKitProxy => config.proxy_path.as_ref(),
        }
    }

    fn common_paths(&self) -> &'static [&'static str] {
        match self {
            Self::Adb if cfg!(windows) => &["C:\\Android\\platform-tools\\adb.exe"],
            Self::Adb => &["/opt/homebrew/bin/adb", "/usr/local/bin/adb"],
            Self::WebKitProxy => &[
                "/opt/homebrew/bin/ios_webkit_debug_proxy",
                "/usr/local/bin/ios_webkit_debug_proxy",
            ],
        }
    }
}

/// Resolve an executable: env override (if it exists), then PATH, then the
/// usual install locations. Falls back to the bare name so the eventual
/// spawn error names the missing tool.
pub fn locate(tool: ExternalTool, config: &Config) -> PathBuf {
    if let Some(path) = tool.env_override(config) {
        if path.exists() {
            return path.clone();
        }
        debug!(path = %path.display(), "Configured tool path does not exist, searching");
    }
    if let Ok(path) = which::which(tool.binary_name()) {
        return path;
    }
    tool.common_paths()
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(tool.binary_name()))
}

async fn run_capture(program: &Path, args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
}

/// `adb version` must run and identify itself.
pub async fn check_adb_available(config: &Config) -> Result<()> {
    let adb = locate(ExternalTool::Adb, config);
    let output = run_capture(&adb, &["version"]).await.map_err(|e| {
        Error::Precondition(format!("adb command not found or failed: {}. {}", e, ADB_INSTALL_HINT))
    })?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() || !stdout.contains("Android Debug Bridge") {
        return Err(Error::Precondition(
            "adb command did not return expected version output".to_string(),
        ));
    }
    Ok(())
}

/// Connection state summarised from `adb devices`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceScan {
    pub connected: usize,
    pub unauthorized: usize,
}

impl DeviceScan {
    pub fn into_result(self) -> Result<()> {
        if self.connected > 0 {
            return Ok(());
        }
        if self.unauthorized > 0 {
            return Err(Error::Precondition(
                "Android device found but unauthorized. Please:\n\
                 1. Check device screen for USB debugging prompt\n\
                 2. Tap 'Allow' to authorize this computer\n\
                 3. Ensure device is unlocked"
                    .to_string(),
            ));
        }
        Err(Error::Precondition(
            "no Android devices found. Please:\n\
             1. Connect device via USB\n\
             2. Enable USB debugging in Developer Options\n\
             3. Ensure USB cable supports data transfer"
                .to_string(),
        ))
    }
}

pub fn parse_adb_devices(output: &str) -> DeviceScan {
    let mut scan = DeviceScan::default();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') || line.starts_with("List of devices") {
            continue;
        }
        match line.split_whitespace().nth(1) {
            Some("device") => scan.connected += 1,
            Some("unauthorized") => scan.unauthorized += 1,
            _ => {}
        }
    }
    scan
}

pub async fn check_adb_device(config: &Config) -> Result<()> {
    let adb = locate(ExternalTool::Adb, config);
    let output = run_capture(&adb, &["devices"])
        .await
        .map_err(|e| Error::Precondition(format!("failed to list ADB devices: {}", e)))?;
    parse_adb_devices(&String::from_utf8_lossy(&output.stdout)).into_result()
}

/// The proxy has no version flag; being able to run `--help` is the check.
pub async fn check_proxy_available(config: &Config) -> Result<()> {
    let proxy = locate(ExternalTool::WebKitProxy, config);
    run_capture(&proxy, &["--help"]).await.map_err(|e| {
        Error::Precondition(format!(
            "ios_webkit_debug_proxy command not found: {}. {}",
            e, PROXY_INSTALL_HINT
        ))
    })?;
    Ok(())
}

/// Which platforms a diagnosis covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformFilter {
    #[default]
    All,
    Only(Platform),
}

impl PlatformFilter {
    pub fn includes(&self, platform: Platform) -> bool {
        match self {
            Self::All => true,
            Self::Only(p) => *p == platform,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(p) => p.name(),
        }
    }
}

impl FromStr for PlatformFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Platform>().map(Self::Only).map_err(|_| {
            Error::Validation(format!(
                "Unknown platform '{}'. Use 'android', 'ios', or omit for all.",
                s
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Missing,
    Info,
}

impl CheckStatus {
    fn icon(&self) -> &'static str {
        match self {
            Self::Ok => "✅",
            Self::Missing => "❌",
            Self::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Adb,
    AndroidDevice,
    WebKitProxy,
    IosDevice,
}

#[derive(Debug, Clone)]
pub struct Check {
    pub kind: CheckKind,
    pub label: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl Check {
    fn from_result(
        kind: CheckKind,
        label: &'static str,
        ok_detail: &str,
        result: Result<()>,
    ) -> Self {
        match result {
            Ok(()) => Self {
                kind,
                label,
                status: CheckStatus::Ok,
                detail: ok_detail.to_string(),
            },
            Err(e) => Self {
                kind,
                label,
                status: CheckStatus::Missing,
                detail: strip_prefix(e),
            },
        }
    }

    /// External tools are what `check` gates its exit code on.
    pub fn is_tool(&self) -> bool {
        matches!(self.kind, CheckKind::Adb | CheckKind::WebKitProxy)
    }
}

fn strip_prefix(e: Error) -> String {
    match e {
        Error::Precondition(msg) => msg,
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentReport {
    pub filter: PlatformFilter,
    pub checks: Vec<Check>,
}

impl EnvironmentReport {
    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Missing)
    }

    pub fn has_missing_tools(&self) -> bool {
        self.checks
            .iter()
            .any(|c| c.is_tool() && c.status == CheckStatus::Missing)
    }

    fn missing(&self, kind: CheckKind) -> Option<&Check> {
        self.checks
            .iter()
            .find(|c| c.kind == kind && c.status == CheckStatus::Missing)
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Environment Check Results:\n\n");
        for check in &self.checks {
            let _ = writeln!(out, "{} {}: {}", check.status.icon(), check.label, check.detail);
        }

        if !self.has_errors() {
            out.push_str("\n✅ All systems ready for tab transfer operations!\n");
            return out;
        }

        out.push_str("\n🔧 Quick Fixes:\n");
        if self.missing(CheckKind::Adb).is_some() {
            let _ = writeln!(out, "• Install ADB. {}", ADB_INSTALL_HINT);
        }
        if let Some(device) = self.missing(CheckKind::AndroidDevice) {
            if device.detail.contains("unauthorized") {
                out.push_str("• Check Android device screen for USB debugging prompt\n");
            } else {
                out.push_str("• Connect Android device and enable USB debugging\n");
            }
        }
        if self.missing(CheckKind::WebKitProxy).is_some() {
            let _ = writeln!(out, "• Install iOS WebKit Debug Proxy. {}", PROXY_INSTALL_HINT);
        }
        out
    }
}

pub async fn diagnose(config: &Config, filter: PlatformFilter) -> EnvironmentReport {
    let mut checks = Vec::new();

    if filter.includes(Platform::Android) {
        let adb = check_adb_available(config).await;
        let adb_ok = adb.is_ok();
        checks.push(Check::from_result(CheckKind::Adb, "ADB", "Available and working", adb));

        if adb_ok {
            let device = check_adb_device(config).await;
            checks.push(Check::from_result(
                CheckKind::AndroidDevice,
                "Android Device",
                "Connected and authorized",
                device,
            ));
        } else {
            checks.push(Check {
                kind: CheckKind::AndroidDevice,
                label: "Android Device",
                status: CheckStatus::Info,
                detail: "skipped until ADB is available".to_string(),
            });
        }
    }

    if filter.includes(Platform::Ios) {
        let proxy = check_proxy_available(config).await;
        checks.push(Check::from_result(
            CheckKind::WebKitProxy,
            "iOS WebKit Debug Proxy",
            "Available and working",
            proxy,
        ));
        checks.push(Check {
            kind: CheckKind::IosDevice,
            label: "iOS Device",
            status: CheckStatus::Info,
            detail: "connectivity can only be verified during an actual connection. Ensure the \
                     device is connected via USB, unlocked and trusted, with Web Inspector enabled"
                .to_string(),
        });
    }

    EnvironmentReport { filter, checks }
}
