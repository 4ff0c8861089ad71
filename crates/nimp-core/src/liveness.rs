//! Process liveness checks against the process-information root.
//!
//! A pid is alive iff a directory named after it exists directly under
//! `/proc`. The working directory is changed to the root once per
//! invocation ([`ProcRoot::enter`]) and every pid is then looked up by its
//! relative name, the same way `stat("1234")` would.
//!
//! Pids come from two sources:
//! - command-line arguments: canonical decimal `u16`, validated up front
//! - a pidfile: unsigned integers scanned until end of file or the first
//!   token that is not a number
//!
//! The check is best-effort: a pid can exit or be reused right after it is
//! reported.

use nimp_common::{Error, PidRecord, PidToken, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::iter::Peekable;
use std::path::Path;
use tracing::{debug, trace};

/// Process-information root.
pub const PROC_ROOT: &str = "/proc";

/// CSV header line of the liveness report.
pub const CSV_HEADER: &str = "pid,alive";

/// Parse one command-line pid.
///
/// Accepts only canonical decimal text for a `u16`: ASCII digits, no sign,
/// no surrounding whitespace and no leading zeros (except `"0"` itself).
/// Accepted text therefore always equals the rendering of its value.
pub fn parse_pid_arg(token: &str) -> Result<PidToken> {
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    match token.parse::<u16>() {
        Ok(value) if canonical => Ok(PidToken::from_arg(value, token)),
        _ => Err(Error::InvalidPid {
            token: token.to_string(),
        }),
    }
}

/// Parse every command-line pid, failing on the first invalid one.
pub fn parse_pid_args<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<PidToken>> {
    tokens.iter().map(|t| parse_pid_arg(t.as_ref())).collect()
}

/// Decides whether a pid currently names a running process.
pub trait LivenessProbe {
    fn is_alive(&self, pid: &PidToken) -> bool;
}

/// The process-information root, entered as the working directory.
///
/// Only obtainable through [`ProcRoot::enter`], so holding one means the
/// working directory was changed.
#[derive(Debug)]
pub struct ProcRoot {
    _entered: (),
}

impl ProcRoot {
    /// Change the working directory to `path`.
    ///
    /// The working directory is process-global; call this once, before
    /// checking any pid, and never from more than one thread.
    pub fn enter(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::env::set_current_dir(path)
            .map_err(|e| Error::io(format!("chdir {}", path.display()), e))?;
        debug!(root = %path.display(), "entered process root");
        Ok(ProcRoot { _entered: () })
    }
}

impl LivenessProbe for ProcRoot {
    /// Missing entries, non-directories and permission errors are all
    /// reported as not alive.
    fn is_alive(&self, pid: &PidToken) -> bool {
        fs::metadata(pid.as_str())
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}

/// Check one pid.
pub fn check_pid<P: LivenessProbe + ?Sized>(probe: &P, pid: PidToken) -> PidRecord {
    let alive = probe.is_alive(&pid);
    trace!(pid = %pid, alive, "checked pid");
    PidRecord::new(pid, alive)
}

/// Check each pid in order and write one row per pid.
///
/// Stops at the first source error. Rows written before it stay written,
/// and `pids` is dropped (closing any file behind it) before the error is
/// returned.
pub fn report_pids<P, I, W>(probe: &P, pids: I, report: &mut PidReport<W>) -> Result<()>
where
    P: LivenessProbe + ?Sized,
    I: IntoIterator<Item = Result<PidToken>>,
    W: Write,
{
    for pid in pids {
        let record = check_pid(probe, pid?);
        report.record(&record).map_err(write_error)?;
    }
    Ok(())
}

/// Streaming CSV writer for liveness records.
///
/// Every line is flushed as soon as it is written, so a later failure never
/// retracts rows the caller has already received.
pub struct PidReport<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> PidReport<W> {
    /// Start a report, writing the header line unless `header` is false.
    pub fn begin(mut out: W, header: bool) -> Result<Self> {
        if header {
            writeln!(out, "{}", CSV_HEADER).map_err(write_error)?;
            out.flush().map_err(write_error)?;
        }
        Ok(PidReport { out, rows: 0 })
    }

    pub fn record(&mut self, record: &PidRecord) -> io::Result<()> {
        writeln!(self.out, "{}", record)?;
        self.out.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn write_error(e: io::Error) -> Error {
    Error::io("write stdout", e)
}

/// Scans unsigned integers from a pidfile.
///
/// Leading ASCII whitespace is skipped and a single `+` sign is accepted
/// before the digits. Iteration ends cleanly at end of input or at the
/// first token that is not an unsigned integer (including one that
/// overflows `u64`); the rest of the input is ignored. A read error is
/// yielded once and ends the iteration.
pub struct PidScanner<R: BufRead> {
    bytes: Peekable<io::Bytes<R>>,
    done: bool,
}

impl<R: BufRead> PidScanner<R> {
    pub fn new(reader: R) -> Self {
        PidScanner {
            bytes: reader.bytes().peekable(),
            done: false,
        }
    }

    /// Next byte without consuming it; a pending read error is consumed
    /// and returned.
    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(Err(_)) = self.bytes.peek() {
            if let Some(Err(e)) = self.bytes.next() {
                return Err(e);
            }
        }
        Ok(self.bytes.peek().and_then(|b| b.as_ref().ok().copied()))
    }

    fn scan(&mut self) -> io::Result<Option<u64>> {
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.bytes.next();
        }

        if self.peek_byte()? == Some(b'+') {
            self.bytes.next();
        }

        let mut value: Option<u64> = None;
        while let Some(b) = self.peek_byte()? {
            if !b.is_ascii_digit() {
                break;
            }
            self.bytes.next();
            let next = value
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')));
            match next {
                Some(v) => value = Some(v),
                None => {
                    debug!("pid value overflows u64, stopping scan");
                    return Ok(None);
                }
            }
        }
        Ok(value)
    }
}

impl<R: BufRead> Iterator for PidScanner<R> {
    type Item = io::Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scan() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
