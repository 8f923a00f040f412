//! The mail-store collaborator.
//!
//! Pattern evaluation needs more than the envelope: message bodies, raw
//! headers, the thread graph and knowledge about which addresses belong to the
//! user or to mailing lists. All of that is reached through [`MailStore`].

use std::{
    collections::HashMap,
    io::{BufRead, Cursor},
};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Address, Alias, Email};

/// Access to message content and mailbox-wide knowledge.
pub trait MailStore {
    /// All messages, in mailbox order.
    fn emails(&self) -> &[Email];

    /// Open the body of `email` for reading, if it is available.
    fn open_body(&self, email: &Email) -> Option<Box<dyn BufRead + '_>>;

    /// Open the raw header block of `email`, if it is available.
    fn open_headers(&self, email: &Email) -> Option<Box<dyn BufRead + '_>>;

    /// The message `email` replies to within its thread.
    fn thread_parent(&self, email: &Email) -> Option<&Email>;

    /// Direct replies to `email`, in mailbox order.
    fn thread_children(&self, email: &Email) -> Vec<&Email>;

    /// Does `addr` belong to the user?
    fn is_user_address(&self, addr: &Address) -> bool;

    /// Is `addr` a known mailing list?
    fn is_mailing_list(&self, _addr: &Address) -> bool {
        false
    }

    /// Is `addr` a mailing list the user is subscribed to?
    fn is_subscribed_list(&self, _addr: &Address) -> bool {
        false
    }

    /// Is `addr` a member of the address group `group`?
    fn group_contains(&self, _group: &str, _addr: &Address) -> bool {
        false
    }

    /// Is `addr` listed in the address book?
    fn is_alias(&self, _addr: &Address) -> bool {
        false
    }

    /// Run an external search; returns the matching Message-IDs.
    fn external_search(&self, _query: &str) -> Option<Vec<String>> {
        None
    }

    /// Address-book entries.
    fn aliases(&self) -> &[Alias] {
        &[]
    }
}

/// A [`MailStore`] that keeps everything in memory.
///
/// Used by tests and by the command-line driver, which loads one from a RON
/// fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemStore {
    /// Messages in mailbox order; `Email::index` is kept in sync on push.
    pub emails: Vec<Email>,
    /// Message bodies keyed by `Email::index`.
    pub bodies: HashMap<usize, String>,
    /// Raw header blocks keyed by `Email::index`.
    pub headers: HashMap<usize, String>,
    /// Thread parent of each message, keyed by `Email::index`.
    pub parents: HashMap<usize, usize>,
    /// Addresses that belong to the user.
    pub user_addresses: Vec<String>,
    /// Known mailing lists.
    pub lists: Vec<String>,
    /// Mailing lists the user is subscribed to.
    pub subscribed: Vec<String>,
    /// Address groups: name to member addresses.
    pub groups: HashMap<String, Vec<String>>,
    /// Address book.
    pub aliases: Vec<Alias>,
    /// Canned results for external searches: query to Message-IDs.
    pub searches: HashMap<String, Vec<String>>,
}

impl MemStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, fixing up its index; returns the index.
    pub fn push(&mut self, mut email: Email) -> usize {
        let index = self.emails.len();
        email.index = index;
        self.emails.push(email);
        index
    }

    /// Record that `child` replies to `parent`.
    pub fn set_parent(&mut self, child: usize, parent: usize) {
        self.parents.insert(child, parent);
    }

    /// Set the body of message `index`.
    pub fn set_body(&mut self, index: usize, body: impl Into<String>) {
        self.bodies.insert(index, body.into());
    }

    /// Set the raw headers of message `index`.
    pub fn set_headers(&mut self, index: usize, headers: impl Into<String>) {
        self.headers.insert(index, headers.into());
    }

    /// Register an address that belongs to the user.
    pub fn add_user_address(&mut self, mailbox: impl Into<String>) {
        self.user_addresses.push(mailbox.into());
    }

    /// Make sure every message's `index` matches its position.
    pub fn reindex(&mut self) {
        for (i, e) in self.emails.iter_mut().enumerate() {
            e.index = i;
        }
    }

    /// Does any of `list` match `addr` case-insensitively?
    fn listed(list: &[String], addr: &Address) -> bool {
        list.iter().any(|m| addr.same_mailbox(m))
    }
}

impl MailStore for MemStore {
    fn emails(&self) -> &[Email] {
        &self.emails
    }

    fn open_body(&self, email: &Email) -> Option<Box<dyn BufRead + '_>> {
        let body = self.bodies.get(&email.index)?;
        Some(Box::new(Cursor::new(body.as_bytes())))
    }

    fn open_headers(&self, email: &Email) -> Option<Box<dyn BufRead + '_>> {
        let headers = self.headers.get(&email.index)?;
        Some(Box::new(Cursor::new(headers.as_bytes())))
    }

    fn thread_parent(&self, email: &Email) -> Option<&Email> {
        let parent = self.parents.get(&email.index)?;
        self.emails.get(*parent)
    }

    fn thread_children(&self, email: &Email) -> Vec<&Email> {
        let mut kids: Vec<usize> = self
            .parents
            .iter()
            .filter(|(_, parent)| **parent == email.index)
            .map(|(child, _)| *child)
            .collect();
        kids.sort_unstable();
        kids.into_iter().filter_map(|i| self.emails.get(i)).collect()
    }

    fn is_user_address(&self, addr: &Address) -> bool {
        let hit = Self::listed(&self.user_addresses, addr);
        trace!(mailbox = %addr.mailbox, hit, "user address check");
        hit
    }

    fn is_mailing_list(&self, addr: &Address) -> bool {
        Self::listed(&self.lists, addr) || Self::listed(&self.subscribed, addr)
    }

    fn is_subscribed_list(&self, addr: &Address) -> bool {
        Self::listed(&self.subscribed, addr)
    }

    fn group_contains(&self, group: &str, addr: &Address) -> bool {
        self.groups
            .get(group)
            .is_some_and(|members| Self::listed(members, addr))
    }

    fn is_alias(&self, addr: &Address) -> bool {
        self.aliases
            .iter()
            .any(|a| a.addresses.iter().any(|x| x.same_mailbox(&addr.mailbox)))
    }

    fn external_search(&self, query: &str) -> Option<Vec<String>> {
        self.searches.get(query).cloned()
    }

    fn aliases(&self) -> &[Alias] {
        &self.aliases
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn store() -> MemStore {
        let mut s = MemStore::new();
        for _ in 0..4 {
            s.push(Email::default());
        }
        s.set_parent(1, 0);
        s.set_parent(3, 0);
        s.set_parent(2, 1);
        s
    }

    #[test]
    fn thread_links() {
        let s = store();
        let kids: Vec<usize> = s.thread_children(&s.emails[0]).iter().map(|e| e.index).collect();
        assert_eq!(kids, vec![1, 3]);
        assert_eq!(s.thread_parent(&s.emails[2]).map(|e| e.index), Some(1));
        assert!(s.thread_parent(&s.emails[0]).is_none());
    }

    #[test]
    fn bodies_are_readable() {
        let mut s = store();
        s.set_body(2, "hello\nworld\n");
        let mut text = String::new();
        s.open_body(&s.emails[2])
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "hello\nworld\n");
        assert!(s.open_body(&s.emails[0]).is_none());
    }

    #[test]
    fn user_and_list_membership() {
        let mut s = store();
        s.add_user_address("me@home.org");
        s.lists.push("dev@lists.org".into());
        s.groups.insert("work".into(), vec!["boss@corp.com".into()]);
        assert!(s.is_user_address(&Address::new("ME@home.org")));
        assert!(s.is_mailing_list(&Address::new("dev@lists.org")));
        assert!(!s.is_subscribed_list(&Address::new("dev@lists.org")));
        assert!(s.group_contains("work", &Address::new("boss@corp.com")));
        assert!(!s.group_contains("play", &Address::new("boss@corp.com")));
    }
}
