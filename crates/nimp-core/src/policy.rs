//! Group-derived storage and account policy.
//!
//! Two independent projections over a user's [`GroupSet`]:
//! - directory access: home, the two scratch tiers, and one QRISdata
//!   collection per quota group (`Q<digits>RW` or `Q<digits>RO`)
//! - accounts: groups matching the legacy account allow-list
//!
//! Both patterns are anchored whole-string matches.

use nimp_common::{GroupSet, Identity};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Scratch tier kept for 30 days.
pub const SCRATCH_30_DAYS: &str = "/30days";
/// Scratch tier kept for 90 days.
pub const SCRATCH_90_DAYS: &str = "/90days";
/// Mount point of the quota collections.
pub const QRISDATA_ROOT: &str = "/QRISdata";

/// Read/write or read-only access group of a quota collection.
static QUOTA_COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Q[0-9]+)R[WO]$").unwrap());

/// Account allow-list, kept in sync with the site `qaccount` script.
static ACCOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(qris-.+|UQ-.+|NCMAS-.+|uqnimrod|sysadmin|support[0-9]*|training|wheel)$")
        .unwrap()
});

/// Quota collection (`Q<digits>`) granted by `group`, if any.
pub fn quota_collection(group: &str) -> Option<&str> {
    QUOTA_COLLECTION
        .captures(group)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_account(group: &str) -> bool {
    ACCOUNT.is_match(group)
}

/// Paths the user may browse, in contract order.
///
/// Home, `/30days/<user>`, `/90days/<user>`, then `/QRISdata/<collection>`
/// for each quota group in group-set order. Not deduplicated.
pub fn allowed_paths(identity: &Identity, groups: &GroupSet) -> Vec<PathBuf> {
    let mut paths = vec![
        identity.home().to_path_buf(),
        Path::new(SCRATCH_30_DAYS).join(&identity.username),
        Path::new(SCRATCH_90_DAYS).join(&identity.username),
    ];

    for group in groups {
        if let Some(collection) = quota_collection(group) {
            trace!(group, collection, "quota collection");
            paths.push(Path::new(QRISDATA_ROOT).join(collection));
        }
    }
    paths
}

/// Account groups, sorted and deduplicated.
pub fn account_names(groups: &GroupSet) -> BTreeSet<String> {
    groups
        .iter()
        .filter(|group| is_account(group))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("alice", 1000, 1000, "/home/alice")
    }

    fn groups(names: &[&str]) -> GroupSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_allowed_paths_contract_order() {
        let paths = allowed_paths(&alice(), &groups(&["Q12RW", "Q99RO", "other"]));
        let expected: Vec<PathBuf> = [
            "/home/alice",
            "/30days/alice",
            "/90days/alice",
            "/QRISdata/Q12",
            "/QRISdata/Q99",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(paths, expected);
    }

    #[test]
    fn test_allowed_paths_without_quota_groups() {
        let paths = allowed_paths(&alice(), &groups(&["alice", "users"]));
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], PathBuf::from("/home/alice"));
    }

    #[test]
    fn test_allowed_paths_follow_group_order_not_sorted() {
        let paths = allowed_paths(&alice(), &groups(&["Q9RO", "Q10RW", "Q1RW"]));
        assert_eq!(
            &paths[3..],
            &[
                PathBuf::from("/QRISdata/Q9"),
                PathBuf::from("/QRISdata/Q10"),
                PathBuf::from("/QRISdata/Q1"),
            ]
        );
    }

    #[test]
    fn test_allowed_paths_not_deduplicated() {
        // Read/write and read-only groups of one collection both grant a path.
        let paths = allowed_paths(&alice(), &groups(&["Q7RW", "Q7RO"]));
        assert_eq!(paths.len(), 5);
        assert_eq!(paths[3], paths[4]);
    }

    #[test]
    fn test_quota_collection_pattern() {
        assert_eq!(quota_collection("Q1234RW"), Some("Q1234"));
        assert_eq!(quota_collection("Q5RO"), Some("Q5"));
        assert_eq!(quota_collection("QRW"), None);
        assert_eq!(quota_collection("Q12R|"), None);
        assert_eq!(quota_collection("Q12RX"), None);
        assert_eq!(quota_collection("Q12RWX"), None);
        assert_eq!(quota_collection("xQ12RW"), None);
        assert_eq!(quota_collection("q12rw"), None);
        assert_eq!(quota_collection("Q١٢RW"), None);
    }

    #[test]
    fn test_account_names_example() {
        let accounts = account_names(&groups(&["qris-foo", "wheel", "random", "support3", "Q1RW"]));
        assert_eq!(
            accounts.into_iter().collect::<Vec<_>>(),
            vec!["qris-foo", "support3", "wheel"]
        );
    }

    #[test]
    fn test_account_pattern_literals() {
        for name in [
            "qris-x", "UQ-RCC", "NCMAS-d99", "uqnimrod", "sysadmin", "support", "support12",
            "training", "wheel",
        ] {
            assert!(is_account(name), "{name} should be an account");
        }
        for name in [
            "qris-", "UQ-", "NCMAS-", "uq-rcc", "wheels", "training1", "support-1", "xwheel",
            "sysadmin2", "",
        ] {
            assert!(!is_account(name), "{name} should not be an account");
        }
    }

    #[test]
    fn test_account_names_sorted() {
        let accounts = account_names(&groups(&["wheel", "UQ-b", "qris-a", "NCMAS-c"]));
        assert_eq!(
            accounts.into_iter().collect::<Vec<_>>(),
            vec!["NCMAS-c", "UQ-b", "qris-a", "wheel"]
        );
    }
}
