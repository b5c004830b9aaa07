//! Alarm severity classification

/// Marker that escalates an alarm to a phone call when found in its name
const CRITICAL_MARKER: &str = "critical";

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Routine warning, chat only
    #[default]
    Warning,
    /// Chat and a phone call
    Critical,
}

impl Severity {
    /// Classify an alarm by its name
    pub fn from_alarm_name(alarm_name: &str) -> Self {
        if classify(alarm_name) {
            Self::Critical
        } else {
            Self::Warning
        }
    }

    /// Whether this severity warrants a phone call
    pub fn is_critical(self) -> bool {
        self == Self::Critical
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// True when the alarm name contains "critical" in any letter case
pub fn classify(alarm_name: &str) -> bool {
    alarm_name.to_lowercase().contains(CRITICAL_MARKER)
}
