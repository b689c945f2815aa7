use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform a UI tree came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    /// Sniff the platform from a raw page source.
    ///
    /// Web sources carry an `<html>` or doctype marker, iOS accessibility
    /// dumps use `XCUIElementType*` node names, and Android hierarchy dumps
    /// mention android widget classes or the `<hierarchy>` root.
    pub fn detect(source: &str) -> Option<Platform> {
        let lower = source.to_lowercase();
        if lower.contains("<html") || lower.contains("<!doctype html") {
            Some(Platform::Web)
        } else if source.contains("XCUIElementType") {
            Some(Platform::Ios)
        } else if lower.contains("android") || lower.contains("hierarchy") {
            Some(Platform::Android)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            other => Err(format!(
                "unknown platform '{}', expected ios, android or web",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_web_from_doctype() {
        assert_eq!(
            Platform::detect("<!DOCTYPE html><html><body/></html>"),
            Some(Platform::Web)
        );
    }

    #[test]
    fn detects_ios_from_node_names() {
        let src = r#"<XCUIElementTypeApplication name="App"/>"#;
        assert_eq!(Platform::detect(src), Some(Platform::Ios));
    }

    #[test]
    fn detects_android_from_hierarchy_root() {
        let src = r#"<hierarchy rotation="0"><node class="android.widget.FrameLayout"/></hierarchy>"#;
        assert_eq!(Platform::detect(src), Some(Platform::Android));
    }

    #[test]
    fn unknown_source_is_none() {
        assert_eq!(Platform::detect("{\"not\": \"markup\"}"), None);
    }
}
