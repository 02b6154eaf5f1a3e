//! Serialization of tab documents to the supported wire formats.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::Tab;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/x-yaml",
        }
    }

    /// Lenient parse used for tool arguments: unknown or missing values mean JSON.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }

    /// Pretty JSON or block YAML.
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        match self {
            Self::Json => Ok(serde_json::to_string_pretty(value)?),
            Self::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    pub fn render_tabs(&self, tabs: &[Tab]) -> Result<String> {
        self.render(tabs)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(Error::Validation(format!(
                "unsupported format: {} (supported: json, yaml)",
                other
            ))),
        }
    }
}

/// Parse a tab-list document previously produced by `render_tabs`, in either format.
pub fn parse_tabs(document: &str) -> Result<Vec<Tab>> {
    match serde_json::from_str::<Vec<Tab>>(document) {
        Ok(tabs) => Ok(tabs),
        Err(json_err) => serde_yaml::from_str::<Vec<Tab>>(document).map_err(|yaml_err| {
            Error::Validation(format!(
                "tab list is neither valid JSON ({}) nor YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}
