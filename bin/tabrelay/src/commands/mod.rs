pub mod check;
pub mod copy;
pub mod mcp;
pub mod reopen;

use clap::Args;
use tabrelay_core::DriverOptions;

/// Connection flags shared by the device commands.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Local port for the debugging endpoint
    #[arg(short, long, default_value_t = 9222)]
    pub port: u16,

    /// ADB socket name (Android only)
    #[arg(short, long, default_value = "chrome_devtools_remote")]
    pub socket: String,

    /// Network timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    pub timeout: u64,

    /// Seconds to wait after setup before talking to the browser
    #[arg(short, long, default_value_t = 2)]
    pub wait: u64,

    /// Leave the ADB port forward in place afterwards
    #[arg(long)]
    pub skip_cleanup: bool,

    /// Enable debug output from the device tooling
    #[arg(long)]
    pub debug: bool,
}

impl DeviceArgs {
    pub fn options(&self) -> DriverOptions {
        DriverOptions {
            port: self.port,
            socket: self.socket.clone(),
            timeout_secs: self.timeout,
            wait_secs: self.wait,
            skip_cleanup: self.skip_cleanup,
            debug: self.debug,
        }
        .normalized()
    }
}
