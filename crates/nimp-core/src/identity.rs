//! Identity and group resolution from the OS user and group databases.
//!
//! Both lookups go through the re-entrant libc calls with a heap buffer
//! that is doubled whenever libc reports `ERANGE`. The group database is
//! walked exactly once through a [`GroupCursor`], which closes the
//! database (`endgrent`) when dropped so it is released on every exit path.
//!
//! The libc group cursor is process-global, so only one [`GroupCursor`]
//! exists at a time; opening a second one blocks until the first is dropped.

use nimp_common::{Error, GroupRecord, GroupSet, Identity, Result};
use std::ffi::{CStr, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Initial scratch buffer size. Large enough for typical HPC group records.
pub const INITIAL_BUFFER_SIZE: usize = 2048;

static GROUP_DB: Mutex<()> = Mutex::new(());

/// Resolve the invoking user by real uid.
pub fn resolve_identity() -> Result<Identity> {
    let uid = unsafe { libc::getuid() };
    lookup_uid(uid)
}

/// Look up a user database entry by uid.
pub fn lookup_uid(uid: u32) -> Result<Identity> {
    let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER_SIZE];
    // SAFETY: passwd is a plain C struct; an all-zero value is valid.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    let rc = call_with_growing_buffer(&mut buf, |buf| unsafe {
        libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
    });
    match rc {
        0 if result.is_null() => return Err(Error::NoSuchUser { uid }),
        0 => {}
        libc::ENOENT | libc::ESRCH => return Err(Error::NoSuchUser { uid }),
        code => {
            return Err(Error::IdentityLookupFailed(io::Error::from_raw_os_error(
                code,
            )))
        }
    }

    // SAFETY: getpwuid_r succeeded; the string fields point into `buf`,
    // which is still alive.
    let (name, home) = unsafe { (c_bytes(pwd.pw_name), c_bytes(pwd.pw_dir)) };
    let identity = Identity::new(
        decode_username(uid, name)?,
        pwd.pw_uid,
        pwd.pw_gid,
        PathBuf::from(OsStr::from_bytes(home)),
    );
    debug!(
        user = %identity.username,
        uid = identity.uid,
        gid = identity.gid,
        "resolved identity"
    );
    Ok(identity)
}

/// User names end up in paths and group member comparisons verbatim, so a
/// name that is not UTF-8 is refused rather than rewritten.
fn decode_username(uid: u32, name: &[u8]) -> Result<String> {
    String::from_utf8(name.to_vec()).map_err(|_| {
        Error::IdentityLookupFailed(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("user name of uid {uid} is not valid UTF-8"),
        ))
    })
}

/// Enumerate the groups `identity` belongs to, primary and supplementary.
pub fn enumerate_groups(identity: &Identity) -> Result<GroupSet> {
    let cursor = GroupCursor::open()?;
    let groups = collect_group_set(identity, cursor)?;
    debug!(user = %identity.username, count = groups.len(), "enumerated groups");
    Ok(groups)
}

/// Keep the records `identity` is a member of, in first-seen order.
///
/// Stops at the first record error.
pub fn collect_group_set<I>(identity: &Identity, records: I) -> Result<GroupSet>
where
    I: IntoIterator<Item = Result<GroupRecord>>,
{
    let mut groups = GroupSet::new();
    for record in records {
        let record = record?;
        if !record.has_member(identity) {
            continue;
        }
        let primary = record.gid == identity.gid;
        if groups.insert(record.name.as_str()) {
            trace!(group = %record.name, gid = record.gid, primary, "member group");
        }
    }
    Ok(groups)
}

/// Entry-at-a-time access to a group database.
pub trait GroupDatabase {
    /// Rewind to the first entry (`setgrent`).
    fn rewind(&mut self) -> io::Result<()>;

    /// Read the next entry using `buf` as scratch space (`getgrent_r`).
    ///
    /// Returns the libc status code and, on success, the decoded entry.
    fn next_entry(&mut self, buf: &mut [libc::c_char]) -> (libc::c_int, Option<GroupRecord>);

    /// Release the database (`endgrent`).
    fn close(&mut self);
}

/// The system group database through the libc NSS entry points.
#[derive(Debug, Default)]
pub struct SystemGroups;

impl GroupDatabase for SystemGroups {
    fn rewind(&mut self) -> io::Result<()> {
        clear_errno();
        unsafe { libc::setgrent() };
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(0) | None => Ok(()),
            Some(_) => Err(err),
        }
    }

    fn next_entry(&mut self, buf: &mut [libc::c_char]) -> (libc::c_int, Option<GroupRecord>) {
        // SAFETY: group is a plain C struct; an all-zero value is valid.
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        let rc = unsafe { libc::getgrent_r(&mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc != 0 || result.is_null() {
            return (rc, None);
        }

        // SAFETY: getgrent_r succeeded; every pointer in `grp` refers into
        // `buf`, and gr_mem is a null-terminated array.
        let record = unsafe {
            let name = String::from_utf8_lossy(c_bytes(grp.gr_name)).into_owned();
            let mut members = Vec::new();
            let mut member = grp.gr_mem;
            while !member.is_null() && !(*member).is_null() {
                members.push(String::from_utf8_lossy(c_bytes(*member)).into_owned());
                member = member.add(1);
            }
            GroupRecord::new(name, grp.gr_gid, members)
        };
        (0, Some(record))
    }

    fn close(&mut self) {
        unsafe { libc::endgrent() };
    }
}

/// Open iteration over a group database.
///
/// Yields one [`GroupRecord`] per entry; an enumeration error is yielded
/// once and ends the iteration. The database is closed when the cursor is
/// dropped, including when opening it failed.
pub struct GroupCursor<D: GroupDatabase = SystemGroups> {
    db: D,
    buf: Vec<libc::c_char>,
    done: bool,
    _lock: MutexGuard<'static, ()>,
}

impl GroupCursor<SystemGroups> {
    /// Rewind the system group database.
    pub fn open() -> Result<Self> {
        GroupCursor::with_database(SystemGroups)
    }
}

impl<D: GroupDatabase> GroupCursor<D> {
    /// Rewind `db` and start iterating over it.
    pub fn with_database(db: D) -> Result<Self> {
        let lock = GROUP_DB.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Armed before the rewind so a failed open is still closed.
        let mut cursor = GroupCursor {
            db,
            buf: vec![0; INITIAL_BUFFER_SIZE],
            done: false,
            _lock: lock,
        };
        cursor.db.rewind().map_err(Error::GroupEnumerationFailed)?;
        Ok(cursor)
    }

    fn next_record(&mut self) -> Option<Result<GroupRecord>> {
        let mut record = None;
        let rc = call_with_growing_buffer(&mut self.buf, |buf| {
            let (rc, entry) = self.db.next_entry(buf);
            record = entry;
            rc
        });
        match rc {
            0 => record.map(Ok),
            libc::ENOENT => None,
            code => Some(Err(Error::GroupEnumerationFailed(
                io::Error::from_raw_os_error(code),
            ))),
        }
    }
}

impl<D: GroupDatabase> Iterator for GroupCursor<D> {
    type Item = Result<GroupRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_record();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl<D: GroupDatabase> Drop for GroupCursor<D> {
    fn drop(&mut self) {
        self.db.close();
    }
}

/// Run a re-entrant lookup, doubling `buf` and repeating the same call
/// while it reports `ERANGE`. Returns the first other status code.
fn call_with_growing_buffer<F>(buf: &mut Vec<libc::c_char>, mut call: F) -> libc::c_int
where
    F: FnMut(&mut [libc::c_char]) -> libc::c_int,
{
    loop {
        match call(buf.as_mut_slice()) {
            libc::ERANGE => grow_buffer(buf),
            rc => return rc,
        }
    }
}

fn grow_buffer(buf: &mut Vec<libc::c_char>) {
    let size = buf.len() * 2;
    trace!(size, "lookup buffer too small, growing");
    buf.resize(size, 0);
}

fn clear_errno() {
    unsafe { *libc::__errno_location() = 0 };
}

/// Bytes of a C string, or an empty slice for a null pointer.
///
/// # Safety
///
/// `ptr` must be null or point to a valid NUL-terminated string that
/// outlives `'a`.
unsafe fn c_bytes<'a>(ptr: *const libc::c_char) -> &'a [u8] {
    if ptr.is_null() {
        return &[];
    }
    CStr::from_ptr(ptr).to_bytes()
}
