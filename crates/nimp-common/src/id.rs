//! Process id types for the liveness check.
//!
//! A [`PidToken`] keeps the text a pid was given as, because the report
//! echoes that text back verbatim. The liveness probe looks the same text up
//! under the process-information root.

use std::fmt;

/// A pid to check, together with the text that names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PidToken {
    value: u64,
    text: String,
}

impl PidToken {
    /// Token from a validated command-line argument; `text` is kept as given.
    pub fn from_arg(value: u16, text: impl Into<String>) -> Self {
        PidToken {
            value: u64::from(value),
            text: text.into(),
        }
    }

    /// Token for an integer scanned from a pidfile; text is its decimal form.
    pub fn from_scanned(value: u64) -> Self {
        PidToken {
            value,
            text: value.to_string(),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Directory entry name under the process-information root.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for PidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Result of checking one pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidRecord {
    pub pid: PidToken,
    pub alive: bool,
}

impl PidRecord {
    pub fn new(pid: PidToken, alive: bool) -> Self {
        PidRecord { pid, alive }
    }
}

impl fmt::Display for PidRecord {
    /// CSV row: `<pid>,<0|1>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.pid, u8::from(self.alive))
    }
}
