use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tabrelay_core::{Config, DriverOptions, Error, Platform, Result};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cdp::{CdpHttpClient, ANDROID_LIST_PATH};
use crate::driver::DeviceDriver;
use crate::probe::{self, ExternalTool};
use crate::source::TabSource;

/// Reaches Chrome on a USB-attached Android device through `adb forward`.
pub struct AndroidDriver {
    config: Config,
    adb: PathBuf,
    options: DriverOptions,
    forwarded: bool,
}

impl AndroidDriver {
    pub fn new(config: &Config, options: DriverOptions) -> Self {
        Self {
            config: config.clone(),
            adb: probe::locate(ExternalTool::Adb, config),
            options,
            forwarded: false,
        }
    }

    fn local_endpoint(&self) -> String {
        format!("tcp:{}", self.options.port)
    }

    fn remote_endpoint(&self) -> String {
        format!("localabstract:{}", self.options.socket)
    }

    async fn run_adb(&self, args: &[&str]) -> Result<()> {
        if self.options.debug {
            info!(adb = %self.adb.display(), ?args, "Executing");
        }
        let output = Command::new(&self.adb)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Transport(format!("failed to run {}: {}", self.adb.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Transport(format!(
                "adb {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceDriver for AndroidDriver {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn check_environment(&self) -> Result<()> {
        probe::check_adb_available(&self.config).await?;
        probe::check_adb_device(&self.config).await
    }

    async fn start(&mut self) -> Result<Arc<dyn TabSource>> {
        let local = self.local_endpoint();
        let remote = self.remote_endpoint();
        self.run_adb(&["-d", "forward", &local, &remote])
            .await
            .map_err(|e| Error::Transport(format!("failed to setup ADB port forwarding: {}", e)))?;
        self.forwarded = true;
        debug!(local = %local, remote = %remote, "Port forward established");

        if !self.options.wait().is_zero() {
            tokio::time::sleep(self.options.wait()).await;
        }

        let client = CdpHttpClient::new(
            &self.options.base_url(),
            ANDROID_LIST_PATH,
            self.options.request_timeout(),
        )?;
        Ok(Arc::new(client))
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.forwarded {
            return Ok(());
        }
        self.forwarded = false;
        if self.options.skip_cleanup {
            debug!(port = self.options.port, "Leaving port forward in place");
            return Ok(());
        }
        let local = self.local_endpoint();
        self.run_adb(&["-d", "forward", "--remove", &local])
            .await
            .map_err(|e| Error::Transport(format!("failed to cleanup ADB port forwarding: {}", e)))
    }
}

impl Drop for AndroidDriver {
    fn drop(&mut self) {
        if self.forwarded && !self.options.skip_cleanup {
            // Best-effort removal when dropped mid-operation
            let local = self.local_endpoint();
            let spawned = std::process::Command::new(&self.adb)
                .args(["-d", "forward", "--remove", local.as_str()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
            if let Err(e) = spawned {
                warn!(error = %e, "Could not remove port forward on drop");
            }
        }
    }
}
