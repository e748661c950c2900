//! Log severity levels as understood by Cloud Logging.

use serde::{Serialize, Serializer};

/// Six-level severity attached to every [`LogEntry`](crate::entry::LogEntry).
///
/// Numeric codes run from `0` ([`Severity::Default`]) to `5`
/// ([`Severity::Fatal`]). Conversion from an integer is total: any code
/// outside that range becomes [`Severity::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Default,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Number of defined levels.
    pub const COUNT: i32 = 6;

    /// Label written into the `severity` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl From<i32> for Severity {
    fn from(code: i32) -> Self {
        match code {
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Warn,
            4 => Severity::Error,
            5 => Severity::Fatal,
            _ => Severity::Default,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_every_code() {
        let labels: Vec<&str> = (0..Severity::COUNT)
            .map(|code| Severity::from(code).as_str())
            .collect();
        assert_eq!(
            labels,
            ["DEFAULT", "DEBUG", "INFO", "WARN", "ERROR", "FATAL"]
        );
    }

    #[test]
    fn unknown_codes_fall_back_to_default() {
        for code in [-1, 6, 42, i32::MIN, i32::MAX] {
            assert_eq!(Severity::from(code), Severity::Default);
            assert_eq!(Severity::from(code).to_string(), "DEFAULT");
        }
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), r#""WARN""#);
        assert_eq!(serde_json::to_string(&Severity::default()).unwrap(), r#""DEFAULT""#);
    }
}
