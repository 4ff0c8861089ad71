//! Exit codes for nimptool.
//!
//! Exit codes are the only machine-readable failure signal; callers parse
//! stdout for results and must treat any non-zero code as "results up to
//! the failure are trustworthy, the rest unknown".
//!
//! - 0: success
//! - 1: identity, group database or I/O failure
//! - 2: bad usage or invalid pid argument

use nimp_common::{Error, ErrorCategory};

/// Exit codes for nimptool operations.
///
/// These codes are a stable contract for the portal that shells out to us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command completed and all output was written.
    Success = 0,

    /// Lookup or I/O failure; partial output may precede it.
    Failure = 1,

    /// Missing/unknown command, malformed arguments or invalid pid token.
    Usage = 2,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the code name as a string constant.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Success => "OK",
            ExitCode::Failure => "ERR_FAILURE",
            ExitCode::Usage => "ERR_USAGE",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error.category() {
            ErrorCategory::Usage => ExitCode::Usage,
            ErrorCategory::Identity | ErrorCategory::Io => ExitCode::Failure,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Failure.as_i32(), 1);
        assert_eq!(ExitCode::Usage.as_i32(), 2);
    }

    #[test]
    fn test_exit_code_from_error() {
        let invalid = Error::InvalidPid {
            token: "abc".into(),
        };
        assert_eq!(ExitCode::from(&invalid), ExitCode::Usage);
        assert_eq!(
            ExitCode::from(&Error::NoSuchUser { uid: 4242 }),
            ExitCode::Failure
        );
        assert_eq!(
            ExitCode::from(&Error::io("chdir /proc", io::ErrorKind::NotFound.into())),
            ExitCode::Failure
        );
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(ExitCode::Usage.to_string(), "ERR_USAGE (2)");
        assert_eq!(ExitCode::Success.to_string(), "OK (0)");
    }
}
