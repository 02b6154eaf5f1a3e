use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tabrelay_core::{Config, DriverOptions, Error, Platform, Result, Tab};
use tabrelay_devices::{DeviceDriver, DriverFactory, TabSource};

use crate::ToolContext;

/// One fake phone shared by every driver the factory hands out.
#[derive(Default)]
pub struct FakeDevices {
    pub tabs: Mutex<Vec<Tab>>,
    pub opened: Mutex<Vec<String>>,
    pub closed: Mutex<Vec<String>>,
    pub fail_close: Mutex<HashSet<String>>,
    pub fail_start: Mutex<Option<String>>,
    pub last_platform: Mutex<Option<Platform>>,
    pub hold: Mutex<Option<Duration>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeDevices {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn fail_close(&self, id: &str) {
        self.fail_close.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_start(&self, message: &str) {
        *self.fail_start.lock().unwrap() = Some(message.to_string());
    }

    /// Keep every started driver busy for `hold` before it hands out a source.
    pub fn hold_for(&self, hold: Duration) {
        *self.hold.lock().unwrap() = Some(hold);
    }

    /// Most drivers that were started and not yet stopped at any one time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabSource for FakeDevices {
    async fn list(&self) -> Result<Vec<Tab>> {
        Ok(self.tabs.lock().unwrap().clone())
    }

    async fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<()> {
        if self.fail_close.lock().unwrap().contains(id) {
            return Err(Error::Transport(format!("unexpected status 500 closing tab {}", id)));
        }
        self.closed.lock().unwrap().push(id.to_string());
        self.tabs.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

struct FakeDriver {
    platform: Platform,
    devices: Arc<FakeDevices>,
    started: bool,
}

#[async_trait]
impl DeviceDriver for FakeDriver {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn check_environment(&self) -> Result<()> {
        match self.devices.fail_start.lock().unwrap().clone() {
            Some(msg) => Err(Error::Precondition(msg)),
            None => Ok(()),
        }
    }

    async fn start(&mut self) -> Result<Arc<dyn TabSource>> {
        self.devices.starts.fetch_add(1, Ordering::SeqCst);
        self.started = true;
        let active = self.devices.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.devices.max_active.fetch_max(active, Ordering::SeqCst);
        *self.devices.last_platform.lock().unwrap() = Some(self.platform);

        let hold = *self.devices.hold.lock().unwrap();
        if let Some(hold) = hold {
            tokio::time::sleep(hold).await;
        }
        Ok(self.devices.clone())
    }

    async fn stop(&mut self) -> Result<()> {
        self.devices.stops.fetch_add(1, Ordering::SeqCst);
        if std::mem::take(&mut self.started) {
            self.devices.active.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct FakeFactory(Arc<FakeDevices>);

impl DriverFactory for FakeFactory {
    fn driver(&self, platform: Platform, _options: &DriverOptions) -> Box<dyn DeviceDriver> {
        Box::new(FakeDriver {
            platform,
            devices: self.0.clone(),
            started: false,
        })
    }
}

pub fn context(tabs: Vec<Tab>) -> (ToolContext, Arc<FakeDevices>) {
    let devices = Arc::new(FakeDevices {
        tabs: Mutex::new(tabs),
        ..Default::default()
    });
    let ctx = ToolContext::new(Config::default(), Arc::new(FakeFactory(devices.clone())));
    (ctx, devices)
}

pub fn sample_tabs() -> Vec<Tab> {
    vec![
        Tab::new("1", "GitHub", "https://github.com/x").with_kind("page"),
        Tab::new("2", "Docs", "https://go.dev/doc").with_kind("page"),
    ]
}
