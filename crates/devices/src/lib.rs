//! Device-side plumbing: reaching the remote debugging endpoints of a phone's
//! browser, either through an ADB port forward (Android) or a local
//! ios_webkit_debug_proxy process (iOS).

pub mod android;
pub mod cdp;
pub mod driver;
pub mod ios;
pub mod probe;
pub mod restore;
pub mod source;
pub mod webkit;

pub use driver::{with_device, DeviceDriver, DeviceLocks, DriverFactory, SystemDrivers};
pub use restore::restore_tabs;
pub use source::TabSource;
