//! RON fixtures: a mailbox, its store and the settings commands run with.

use std::{fs, path::Path};

use expando::domain::{folder::FolderEntry, index::MailboxInfo, status::StatusInfo};
use hooks::HookConfig;
use maildata::{Clock, Email, FixedClock, MemStore, SystemClock};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Everything a command can read from a fixture file.
///
/// Every field is optional in the file:
///
/// ```ron
/// (
///     now: Some(1704164645),
///     mailbox: (name: "inbox", path: "~/Mail/inbox"),
///     store: (emails: [(envelope: (from: "Bob <bob@x.org>", subject: Some("hi")))]),
/// )
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Frozen time in seconds since the epoch; the system clock when unset.
    pub now: Option<i64>,
    /// Local zone, seconds east of UTC, used with `now`.
    pub zone_offset: i32,
    /// The mailbox the messages are shown in.
    pub mailbox: MailboxInfo,
    /// Messages, aliases and mailbox knowledge.
    pub store: MemStore,
    /// Status bar numbers.
    pub status: StatusInfo,
    /// File browser rows.
    pub folders: Vec<FolderEntry>,
    /// Settings for hook commands.
    pub hooks: HookConfig,
    /// Hostname for generated Message-Ids.
    pub hostname: Option<String>,
}

impl Fixture {
    /// Parse a fixture from RON text.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut fixture: Self = ron::from_str(text).map_err(|source| Error::Fixture {
            path: path.to_path_buf(),
            source,
        })?;
        fixture.store.reindex();
        if fixture.mailbox.msg_count == 0 {
            fixture.mailbox.msg_count = fixture.store.emails.len();
        }
        debug!(path = %path.display(), emails = fixture.store.emails.len(), "loaded fixture");
        Ok(fixture)
    }

    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `path`, or an empty fixture when there is none.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// The clock commands run against.
    pub fn clock(&self) -> Box<dyn Clock> {
        match self.now {
            Some(secs) => Box::new(FixedClock::at(secs).with_offset(self.zone_offset)),
            None => Box::new(SystemClock),
        }
    }

    /// Message `n`, counting from one as the index does.
    pub fn email(&self, n: usize) -> Result<&Email> {
        n.checked_sub(1)
            .and_then(|i| self.store.emails.get(i))
            .ok_or(Error::NoMessage(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_fixture() {
        let src = r#"(
            now: Some(1704164645),
            mailbox: (name: "inbox"),
            store: (
                emails: [
                    (envelope: (from: "Bob <bob@x.org>", subject: Some("hi"))),
                    (envelope: (from: "al@y.org")),
                ],
                user_addresses: ["me@x.org"],
            ),
            hooks: (folder: "/m"),
        )"#;
        let f = Fixture::parse(src, Path::new("t.ron")).unwrap();
        assert_eq!(f.store.emails[1].index, 1);
        assert_eq!(f.mailbox.msg_count, 2);
        assert_eq!(f.hooks.folder, "/m");
        assert_eq!(f.hooks.record, "~/sent");
        assert_eq!(f.clock().now().timestamp(), 1_704_164_645);
        assert!(f.email(2).is_ok());
        assert!(matches!(f.email(0), Err(Error::NoMessage(0))));
        assert!(matches!(f.email(3), Err(Error::NoMessage(3))));
    }

    #[test]
    fn bad_ron_names_the_file() {
        let err = Fixture::parse("(now: nope)", Path::new("bad.ron")).unwrap_err();
        assert!(err.to_string().starts_with("bad fixture bad.ron:"));
    }
}
