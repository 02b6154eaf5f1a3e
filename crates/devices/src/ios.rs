use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tabrelay_core::{Config, DriverOptions, Error, Platform, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::driver::DeviceDriver;
use crate::probe::{self, ExternalTool};
use crate::source::TabSource;
use crate::webkit::WebKitSource;

/// Reaches Safari on a USB-attached iOS device by running a local
/// ios_webkit_debug_proxy for the duration of the operation.
pub struct IosDriver {
    config: Config,
    proxy: PathBuf,
    options: DriverOptions,
    child: Option<Child>,
}

impl IosDriver {
    pub fn new(config: &Config, options: DriverOptions) -> Self {
        Self {
            config: config.clone(),
            proxy: probe::locate(ExternalTool::WebKitProxy, config),
            options,
            child: None,
        }
    }

    /// Device list on the port below ours, one port per device from ours up.
    fn proxy_args(&self) -> Vec<String> {
        let port = self.options.port;
        let mut args = vec![
            "-F".to_string(),
            "-c".to_string(),
            format!(
                "null:{},:{}-{}",
                port.saturating_sub(1),
                port,
                port.saturating_add(100)
            ),
        ];
        if self.options.debug {
            args.push("--debug".to_string());
        }
        args
    }
}

#[async_trait]
impl DeviceDriver for IosDriver {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    async fn check_environment(&self) -> Result<()> {
        probe::check_proxy_available(&self.config).await
    }

    async fn start(&mut self) -> Result<Arc<dyn TabSource>> {
        let args = self.proxy_args();
        if self.options.debug {
            info!(proxy = %self.proxy.display(), ?args, "Executing");
        }

        let stderr = if self.options.debug { Stdio::inherit() } else { Stdio::null() };
        let child = Command::new(&self.proxy)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::Transport(format!("failed to start ios_webkit_debug_proxy: {}", e))
            })?;
        debug!(pid = ?child.id(), "Proxy started");
        self.child = Some(child);

        if !self.options.wait().is_zero() {
            tokio::time::sleep(self.options.wait()).await;
        }

        let source = WebKitSource::new(&self.options.base_url(), self.options.request_timeout())?;
        Ok(Arc::new(source))
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        debug!("Terminating ios_webkit_debug_proxy");
        child
            .kill()
            .await
            .map_err(|e| Error::Transport(format!("failed to kill ios_webkit_debug_proxy: {}", e)))
    }
}
