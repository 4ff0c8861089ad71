//! User identity and group membership types.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The invoking user, as recorded in the user database for the real uid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub uid: u32,
    /// Primary group id.
    pub gid: u32,
    pub home: PathBuf,
}

impl Identity {
    pub fn new(username: impl Into<String>, uid: u32, gid: u32, home: impl Into<PathBuf>) -> Self {
        Identity {
            username: username.into(),
            uid,
            gid,
            home: home.into(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

/// One entry of the group database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, gid: u32, members: Vec<String>) -> Self {
        GroupRecord {
            name: name.into(),
            gid,
            members,
        }
    }

    /// A user belongs to a group through its primary gid or by being listed
    /// as a member.
    pub fn has_member(&self, identity: &Identity) -> bool {
        self.gid == identity.gid || self.members.iter().any(|m| *m == identity.username)
    }
}

/// Group names in first-seen order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GroupSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = GroupSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter().map(String::as_str as fn(&'a String) -> &'a str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("alice", 1000, 1000, "/home/alice")
    }

    #[test]
    fn test_group_set_keeps_first_seen_order() {
        let set: GroupSet = ["b", "a", "b", "c", "a"].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_group_set_insert_reports_duplicates() {
        let mut set = GroupSet::new();
        assert!(set.insert("wheel"));
        assert!(!set.insert("wheel"));
        assert!(set.contains("wheel"));
        assert!(!set.contains("users"));
    }

    #[test]
    fn test_membership_by_primary_gid() {
        let group = GroupRecord::new("alice", 1000, vec![]);
        assert!(group.has_member(&alice()));
    }

    #[test]
    fn test_membership_by_member_list() {
        let group = GroupRecord::new("wheel", 10, vec!["root".into(), "alice".into()]);
        assert!(group.has_member(&alice()));
    }

    #[test]
    fn test_member_list_match_is_exact() {
        let group = GroupRecord::new("staff", 50, vec!["alice2".into(), "Alice".into()]);
        assert!(!group.has_member(&alice()));
    }
}
