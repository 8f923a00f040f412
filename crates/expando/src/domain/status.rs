//! The status bar: `status_format` and `ts_status_format`.

use serde::{Deserialize, Serialize};

use super::{Field, Provider, ValueKind, fields, index::pretty_size};
use crate::{
    definition::{Definition, PAD_EOL, PAD_HARD, PAD_SOFT},
    render::RenderFlags,
};

fields! {
    /// Mailbox-wide counters and settings.
    StatusField {
        /// Mailboxes with new mail.
        UnreadMailboxes => "UNREAD_MAILBOXES", Number;
        /// Deleted messages.
        DeletedCount => "DELETED_COUNT", Number;
        /// Mailbox description.
        Description => "DESCRIPTION", String;
        /// Full mailbox path.
        MailboxPath => "MAILBOX_PATH", String;
        /// Flagged messages.
        FlaggedCount => "FLAGGED_COUNT", Number;
        /// Local hostname.
        Hostname => "HOSTNAME", String;
        /// Mailbox size.
        MailboxSize => "MAILBOX_SIZE", Number;
        /// Messages in the mailbox.
        MessageCount => "MESSAGE_COUNT", Number;
        /// Messages shown under the current limit.
        LimitCount => "LIMIT_COUNT", Number;
        /// New messages.
        NewCount => "NEW_COUNT", Number;
        /// Old unread messages.
        OldCount => "OLD_COUNT", Number;
        /// Postponed messages.
        PostponedCount => "POSTPONED_COUNT", Number;
        /// Read-only and modified indicator.
        Readonly => "READONLY", String;
        /// Read messages.
        ReadCount => "READ_COUNT", Number;
        /// Sort method.
        SortMethod => "SORT", String;
        /// Tagged messages.
        TaggedCount => "TAGGED_COUNT", Number;
        /// Unread messages.
        UnreadCount => "UNREAD_COUNT", Number;
        /// Program version.
        Version => "VERSION", String;
        /// Active limit pattern.
        LimitPattern => "LIMIT_PATTERN", String;
    }
}

/// Codes for `status_format`.
pub static STATUS_FORMAT: &[Definition] = &[
    PAD_SOFT,
    PAD_HARD,
    PAD_EOL,
    Definition::new("b", "unread-mailboxes", Field::Status(StatusField::UnreadMailboxes)),
    Definition::new("d", "deleted-count", Field::Status(StatusField::DeletedCount)),
    Definition::new("D", "description", Field::Status(StatusField::Description)),
    Definition::new("f", "mailbox-path", Field::Status(StatusField::MailboxPath)),
    Definition::new("F", "flagged-count", Field::Status(StatusField::FlaggedCount)),
    Definition::new("h", "hostname", Field::Status(StatusField::Hostname)),
    Definition::new("l", "mailbox-size", Field::Status(StatusField::MailboxSize)),
    Definition::new("m", "message-count", Field::Status(StatusField::MessageCount)),
    Definition::new("M", "limit-count", Field::Status(StatusField::LimitCount)),
    Definition::new("n", "new-count", Field::Status(StatusField::NewCount)),
    Definition::new("o", "old-count", Field::Status(StatusField::OldCount)),
    Definition::new("p", "postponed-count", Field::Status(StatusField::PostponedCount)),
    Definition::new("r", "readonly", Field::Status(StatusField::Readonly)),
    Definition::new("R", "read-count", Field::Status(StatusField::ReadCount)),
    Definition::new("s", "sort", Field::Status(StatusField::SortMethod)),
    Definition::new("t", "tagged-count", Field::Status(StatusField::TaggedCount)),
    Definition::new("u", "unread-count", Field::Status(StatusField::UnreadCount)),
    Definition::new("v", "version", Field::Status(StatusField::Version)),
    Definition::new("V", "limit-pattern", Field::Status(StatusField::LimitPattern)),
];

/// A snapshot of the numbers the status bar shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct StatusInfo {
    pub unread_mailboxes: u64,
    pub deleted: u64,
    pub description: String,
    pub path: String,
    pub flagged: u64,
    pub hostname: String,
    pub size: u64,
    pub messages: u64,
    /// `None` when no limit is active.
    pub limited: Option<u64>,
    pub new: u64,
    pub old: u64,
    pub postponed: u64,
    pub readonly: bool,
    pub modified: bool,
    pub read: u64,
    pub sort: String,
    pub tagged: u64,
    pub unread: u64,
    pub version: String,
    pub limit_pattern: Option<String>,
}

impl StatusInfo {
    /// The `%r` indicator: `%` read-only, `*` modified, space otherwise.
    fn readonly_char(&self) -> char {
        if self.readonly {
            '%'
        } else if self.modified {
            '*'
        } else {
            ' '
        }
    }
}

impl Provider for StatusInfo {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        let Field::Status(f) = field else {
            return None;
        };
        Some(match f {
            StatusField::Description => self.description.clone(),
            StatusField::MailboxPath => self.path.clone(),
            StatusField::Hostname => self.hostname.clone(),
            StatusField::MailboxSize => pretty_size(self.size),
            StatusField::Readonly => self.readonly_char().to_string(),
            StatusField::SortMethod => self.sort.clone(),
            StatusField::Version => self.version.clone(),
            StatusField::LimitPattern => self.limit_pattern.clone().unwrap_or_default(),
            _ => return None,
        })
    }

    fn number(&self, field: Field, _flags: RenderFlags) -> Option<i64> {
        let Field::Status(f) = field else {
            return None;
        };
        let n = match f {
            StatusField::UnreadMailboxes => self.unread_mailboxes,
            StatusField::DeletedCount => self.deleted,
            StatusField::FlaggedCount => self.flagged,
            StatusField::MailboxSize => self.size,
            StatusField::MessageCount => self.messages,
            StatusField::LimitCount => self.limited.unwrap_or(0),
            StatusField::NewCount => self.new,
            StatusField::OldCount => self.old,
            StatusField::PostponedCount => self.postponed,
            StatusField::ReadCount => self.read,
            StatusField::TaggedCount => self.tagged,
            StatusField::UnreadCount => self.unread,
            StatusField::Readonly => u64::from(self.readonly || self.modified),
            StatusField::LimitPattern => u64::from(self.limit_pattern.is_some()),
            _ => return None,
        };
        i64::try_from(n).ok()
    }
}
