//! Device lifecycle: bring the debugging endpoint up, hand out a tab source,
//! tear everything down again.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tabrelay_core::{Config, DriverOptions, Error, Platform, Result};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::android::AndroidDriver;
use crate::ios::IosDriver;
use crate::source::TabSource;

#[async_trait]
pub trait DeviceDriver: Send + Sync {
    fn platform(&self) -> Platform;

    /// Verify the external tooling (and, where possible, the device) is usable.
    async fn check_environment(&self) -> Result<()>;

    /// Make the debugging endpoint reachable and return a source bound to it.
    async fn start(&mut self) -> Result<Arc<dyn TabSource>>;

    /// Undo whatever `start` set up. Safe to call when `start` never ran.
    async fn stop(&mut self) -> Result<()>;
}

/// Builds drivers on demand; the server and CLI hold one of these instead of
/// constructing drivers directly so tests can substitute fakes.
pub trait DriverFactory: Send + Sync {
    fn driver(&self, platform: Platform, options: &DriverOptions) -> Box<dyn DeviceDriver>;
}

/// Drivers backed by the real `adb` and `ios_webkit_debug_proxy` executables.
pub struct SystemDrivers {
    config: Config,
}

impl SystemDrivers {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl DriverFactory for SystemDrivers {
    fn driver(&self, platform: Platform, options: &DriverOptions) -> Box<dyn DeviceDriver> {
        match platform {
            Platform::Android => Box::new(AndroidDriver::new(&self.config, options.clone())),
            Platform::Ios => Box::new(IosDriver::new(&self.config, options.clone())),
        }
    }
}

/// One lock per local debugging port.
///
/// The ADB forward and the WebKit proxy both bind the port on localhost, so
/// whoever holds the guard owns that endpoint from `start` through `stop`,
/// whatever the platform.
#[derive(Default)]
pub struct DeviceLocks {
    ports: Mutex<HashMap<u16, Arc<Mutex<()>>>>,
}

impl DeviceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, port: u16) -> OwnedMutexGuard<()> {
        let lock = self.ports.lock().await.entry(port).or_default().clone();
        if lock.try_lock().is_err() {
            debug!(port, "Waiting for another operation to release the device");
        }
        lock.lock_owned().await
    }
}

/// Run `op` against a started device within `budget`.
///
/// The driver is stopped afterwards whatever happened, including when the
/// budget ran out. A failing stop is logged and never masks the result.
pub async fn with_device<T, F, Fut>(
    mut driver: Box<dyn DeviceDriver>,
    budget: Duration,
    op: F,
) -> Result<T>
where
    F: FnOnce(Arc<dyn TabSource>) -> Fut + Send,
    Fut: Future<Output = Result<T>> + Send,
    T: Send,
{
    let platform = driver.platform();
    debug!(platform = %platform, budget_secs = budget.as_secs(), "Acquiring device");

    let outcome = tokio::time::timeout(budget, async {
        driver.check_environment().await?;
        let source = driver.start().await?;
        op(source).await
    })
    .await;

    if let Err(e) = driver.stop().await {
        warn!(platform = %platform, error = %e, "Device cleanup failed");
    }

    match outcome {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "{} operation did not finish within {}s",
            platform.display_name(),
            budget.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabrelay_core::Tab;

    struct NullSource;

    #[async_trait]
    impl TabSource for NullSource {
        async fn list(&self) -> Result<Vec<Tab>> {
            Ok(vec![Tab::new("1", "One", "https://one.test")])
        }
        async fn open(&self, _url: &str) -> Result<()> {
            Ok(())
        }
        async fn close(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct CountingDriver {
        stops: Arc<AtomicUsize>,
        fail_check: bool,
        fail_stop: bool,
    }

    #[async_trait]
    impl DeviceDriver for CountingDriver {
        fn platform(&self) -> Platform {
            Platform::Android
        }
        async fn check_environment(&self) -> Result<()> {
            if self.fail_check {
                return Err(Error::Precondition("adb missing".into()));
            }
            Ok(())
        }
        async fn start(&mut self) -> Result<Arc<dyn TabSource>> {
            Ok(Arc::new(NullSource))
        }
        async fn stop(&mut self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                return Err(Error::Other("forward already removed".into()));
            }
            Ok(())
        }
    }

    fn driver(
        stops: &Arc<AtomicUsize>,
        fail_check: bool,
        fail_stop: bool,
    ) -> Box<dyn DeviceDriver> {
        Box::new(CountingDriver {
            stops: stops.clone(),
            fail_check,
            fail_stop,
        })
    }

    const BUDGET: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_with_device_runs_op_and_stops() {
        let stops = Arc::new(AtomicUsize::new(0));
        let tabs = with_device(driver(&stops, false, false), BUDGET, |src| async move {
            src.list().await
        })
        .await
        .unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_device_stops_after_failed_check() {
        let stops = Arc::new(AtomicUsize::new(0));
        let err = with_device(driver(&stops, true, false), BUDGET, |src| async move {
            src.list().await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_device_timeout_still_stops() {
        let stops = Arc::new(AtomicUsize::new(0));
        let short = Duration::from_millis(50);
        let err = with_device(driver(&stops, false, false), short, |_src| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_failure_does_not_mask_result() {
        let stops = Arc::new(AtomicUsize::new(0));
        let n = with_device(driver(&stops, false, true), BUDGET, |_src| async move { Ok(7usize) })
            .await
            .unwrap();
        assert_eq!(n, 7);
    }

    #[tokio::test]
    async fn test_same_port_is_held_exclusively() {
        let locks = DeviceLocks::new();
        let held = locks.acquire(9222).await;
        let wait = tokio::time::timeout(Duration::from_millis(50), locks.acquire(9222)).await;
        assert!(wait.is_err());

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(9222)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_other_ports_are_independent() {
        let locks = DeviceLocks::new();
        let _android = locks.acquire(9222).await;
        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(9333)).await;
        assert!(other.is_ok());
    }
}
