pub mod cache;
pub mod check;
pub mod close;
pub mod copy;
pub mod reopen;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

use serde_json::{json, Value};
use tabrelay_core::{Error, Platform, Result};

/// Optional `platform` argument; absent or empty means Android.
pub(crate) fn platform_or_android(raw: Option<&str>) -> Result<Platform> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(p) => p.parse(),
        None => Ok(Platform::Android),
    }
}

pub(crate) fn require_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::Validation(format!("'{}' is required", key)))
}

/// JSON-schema fragments shared by the device tools.
pub(crate) fn device_option_properties(with_android_extras: bool) -> Value {
    let mut props = json!({
        "port": {
            "type": "integer",
            "description": "Local port for the debugging endpoint (default: 9222)"
        },
        "timeout": { "type": "integer", "description": "Network timeout in seconds (default: 10)" },
        "wait": {
            "type": "integer",
            "description": "Wait time after setup before fetching, in seconds (default: 2)"
        },
        "debug": { "type": "boolean", "description": "Enable debug output" }
    });
    if with_android_extras {
        props["socket"] = json!({
            "type": "string",
            "description": "ADB socket name (default: chrome_devtools_remote)"
        });
        props["skipCleanup"] = json!({
            "type": "boolean",
            "description": "Leave the ADB port forward in place afterwards"
        });
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_or_android() {
        assert_eq!(platform_or_android(None).unwrap(), Platform::Android);
        assert_eq!(platform_or_android(Some("  ")).unwrap(), Platform::Android);
        assert_eq!(platform_or_android(Some("iOS")).unwrap(), Platform::Ios);
        assert!(platform_or_android(Some("windows")).is_err());
    }

    #[test]
    fn test_require_str() {
        let params = json!({"tabId": "7", "blank": " "});
        assert_eq!(require_str(&params, "tabId").unwrap(), "7");
        assert!(require_str(&params, "blank").is_err());
        assert!(require_str(&params, "missing").is_err());
    }
}
