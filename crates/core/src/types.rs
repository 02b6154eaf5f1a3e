use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A browser tab as reported by a remote debugging endpoint.
///
/// Ids are assigned by the remote browser and are only stable for the
/// lifetime of one device connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Tab {
    pub fn new(id: &str, title: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            kind: String::new(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Targets without a kind are treated as pages.
    pub fn is_page(&self) -> bool {
        self.kind.is_empty() || self.kind == "page"
    }
}

/// Mobile platform family a device driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Android => "Android",
            Self::Ios => "iOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            other => Err(Error::Validation(format!(
                "unsupported platform: {} (use 'android' or 'ios')",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_deserialize_cdp_target() {
        let raw = r#"{
            "description": "",
            "devtoolsFrontendUrl": "/devtools/inspector.html",
            "id": "E1A2",
            "title": "Rust",
            "type": "page",
            "url": "https://www.rust-lang.org/"
        }"#;
        let tab: Tab = serde_json::from_str(raw).unwrap();
        assert_eq!(tab.id, "E1A2");
        assert_eq!(tab.kind, "page");
        assert!(tab.is_page());
    }

    #[test]
    fn test_tab_missing_fields_default_empty() {
        let tab: Tab = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(tab.title, "");
        assert_eq!(tab.url, "");
        assert!(tab.is_page());
    }

    #[test]
    fn test_tab_without_id_decodes_with_empty_id() {
        let tabs: Vec<Tab> =
            serde_json::from_str(r#"[{"title": "A", "url": "https://a.test"}]"#).unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].id, "");
        assert_eq!(tabs[0].url, "https://a.test");
    }

    #[test]
    fn test_tab_omits_empty_kind() {
        let json = serde_json::to_value(Tab::new("1", "a", "https://a")).unwrap();
        assert!(json.get("type").is_none());
        let framed = Tab::new("1", "a", "https://a").with_kind("iframe");
        let json = serde_json::to_value(framed).unwrap();
        assert_eq!(json["type"], "iframe");
    }

    #[test]
    fn test_service_worker_is_not_page() {
        assert!(!Tab::new("1", "", "").with_kind("service_worker").is_page());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!(" iOS ".parse::<Platform>().unwrap(), Platform::Ios);
        assert!("windows".parse::<Platform>().is_err());
        assert_eq!(Platform::Ios.to_string(), "ios");
    }
}
