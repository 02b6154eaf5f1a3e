use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::Notify;

use tabrelay_core::{Error, Result, Tab};
use tabrelay_devices::TabSource;

/// Scriptable in-memory device.
#[derive(Default)]
pub struct FakeSource {
    pub tabs: Mutex<Vec<Tab>>,
    pub fail_list: Mutex<bool>,
    pub fail_close: HashSet<String>,
    pub lists: Mutex<usize>,
    pub closed: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        Self {
            tabs: Mutex::new(tabs),
            ..Default::default()
        }
    }

    pub fn failing_close(mut self, ids: &[&str]) -> Self {
        self.fail_close = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TabSource for FakeSource {
    async fn list(&self) -> Result<Vec<Tab>> {
        *self.lists.lock().unwrap() += 1;
        if *self.fail_list.lock().unwrap() {
            return Err(Error::Transport("connection refused".into()));
        }
        Ok(self.tabs.lock().unwrap().clone())
    }

    async fn open(&self, url: &str) -> Result<()> {
        let n = self.tabs.lock().unwrap().len();
        self.tabs
            .lock()
            .unwrap()
            .push(Tab::new(&format!("new-{}", n), "", url));
        Ok(())
    }

    async fn close(&self, id: &str) -> Result<()> {
        if self.fail_close.contains(id) {
            return Err(Error::Transport(format!("unexpected status 500 closing tab {}", id)));
        }
        self.closed.lock().unwrap().push(id.to_string());
        self.tabs.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

/// A device whose listing stalls until `release` is called.
#[derive(Default)]
pub struct GatedSource {
    pub tabs: Vec<Tab>,
    pub entered: Notify,
    pub gate: Notify,
}

impl GatedSource {
    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        Self {
            tabs,
            ..Default::default()
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait::async_trait]
impl TabSource for GatedSource {
    async fn list(&self) -> Result<Vec<Tab>> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.tabs.clone())
    }

    async fn open(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn close(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

pub fn tab(id: &str, title: &str, url: &str) -> Tab {
    Tab::new(id, title, url)
}
