pub mod config;
pub mod error;
pub mod format;
pub mod types;

pub use config::{Config, DriverOptions};
pub use error::{Error, Result};
pub use format::OutputFormat;
pub use types::{Platform, Tab};
