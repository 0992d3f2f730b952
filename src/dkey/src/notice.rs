//! The payload put on the diagnostic channel.

use serde::{Deserialize, Serialize};

use crate::descriptor::Severity;

/// A single deprecation warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationNotice {
    /// Deprecated key, rendered with `Display`.
    pub key: String,
    /// Warning message.
    pub message: String,
    /// Category the notice is emitted under.
    pub severity: Severity,
    /// Set when a filter promoted the notice to an error.
    #[serde(default)]
    pub escalated: bool,
}

impl DeprecationNotice {
    pub fn new(key: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            severity,
            escalated: false,
        }
    }

    pub fn escalate(mut self) -> Self {
        self.escalated = true;
        self
    }

    /// Format for display.
    pub fn format(&self) -> String {
        let level = if self.escalated { "ERROR" } else { "WARNING" };
        format!("[{}] ({}) {}", level, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format() {
        let notice = DeprecationNotice::new(
            "a",
            "Key `a` is deprecated.",
            Severity::EndUser,
        );
        assert_eq!(
            notice.format(),
            "[WARNING] (end user) Key `a` is deprecated."
        );
        assert_eq!(
            notice.escalate().format(),
            "[ERROR] (end user) Key `a` is deprecated."
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let notice = DeprecationNotice::new("a", "gone", "plugin api".into());
        let notice = notice.escalate();
        let encoded = toml::to_string(&notice).unwrap();
        assert!(encoded.contains("severity = \"plugin api\""));

        let decoded: DeprecationNotice = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, notice);

        let minimal = "key = \"b\"\nmessage = \"m\"\nseverity = \"developer\"";
        let decoded: DeprecationNotice = toml::from_str(minimal).unwrap();
        assert!(!decoded.escalated);
        assert!(matches!(decoded.severity, Severity::Developer));
    }
}
