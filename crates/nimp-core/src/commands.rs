//! Command runners.
//!
//! One function per CLI command. Each writes its payload to `out` and
//! returns a typed error; mapping errors to exit codes and messages is
//! left to the binary.

use crate::identity::{enumerate_groups, resolve_identity};
use crate::liveness::{
    parse_pid_args, report_pids, PidReport, PidScanner, ProcRoot, PROC_ROOT,
};
use crate::policy::{account_names, allowed_paths};
use nimp_common::{Error, PidToken, Result};
use std::fs::File;
use std::io::{BufReader, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `checkprocess [--no-header] [pid...]`
///
/// Every token is validated before the root is entered or anything is
/// written. Returns the number of rows written.
pub fn checkprocess<S, W>(tokens: &[S], header: bool, out: W) -> Result<usize>
where
    S: AsRef<str>,
    W: Write,
{
    let pids = parse_pid_args(tokens)?;
    let root = ProcRoot::enter(PROC_ROOT)?;
    let mut report = PidReport::begin(out, header)?;
    report_pids(&root, pids.into_iter().map(Ok), &mut report)?;
    info!(rows = report.rows(), "checkprocess done");
    Ok(report.rows())
}

/// `checkpidfile [--no-header] <path>`
///
/// The pidfile is opened before the working directory changes, so relative
/// paths resolve against the caller's directory. A read error ends the scan
/// after the file is closed; rows written before it stay valid.
pub fn checkpidfile<W: Write>(path: &Path, header: bool, out: W) -> Result<usize> {
    let file = File::open(path).map_err(|e| Error::io(format!("open {}", path.display()), e))?;
    debug!(path = %path.display(), "opened pidfile");

    let root = ProcRoot::enter(PROC_ROOT)?;
    let mut report = PidReport::begin(out, header)?;
    let pids = PidScanner::new(BufReader::new(file)).map(|scanned| {
        scanned
            .map(PidToken::from_scanned)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))
    });
    report_pids(&root, pids, &mut report)?;
    info!(rows = report.rows(), "checkpidfile done");
    Ok(report.rows())
}

/// `getdirs`: one allowed path per line.
pub fn getdirs<W: Write>(out: W) -> Result<Vec<PathBuf>> {
    let identity = resolve_identity()?;
    let groups = enumerate_groups(&identity)?;
    let paths = allowed_paths(&identity, &groups);
    write_paths(out, &paths)?;
    Ok(paths)
}

/// `getacct`: one account group per line, ascending.
pub fn getacct<W: Write>(out: W) -> Result<Vec<String>> {
    let identity = resolve_identity()?;
    let groups = enumerate_groups(&identity)?;
    let accounts: Vec<String> = account_names(&groups).into_iter().collect();
    write_lines(out, &accounts)?;
    Ok(accounts)
}

/// Write paths one per line, byte for byte.
pub fn write_paths<W: Write>(mut out: W, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        out.write_all(path.as_os_str().as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|e| Error::io("write stdout", e))?;
    }
    out.flush().map_err(|e| Error::io("write stdout", e))
}

pub fn write_lines<W: Write, S: AsRef<str>>(mut out: W, lines: &[S]) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line.as_ref()).map_err(|e| Error::io("write stdout", e))?;
    }
    out.flush().map_err(|e| Error::io("write stdout", e))
}
