//! File-browser rows: `folder_format`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{Field, Provider, ValueKind, fields, index::pretty_size};
use crate::{
    definition::{Definition, PAD_EOL, PAD_HARD, PAD_SOFT},
    render::RenderFlags,
};

fields! {
    /// Fields of one browser entry.
    FolderField {
        /// One-based row number.
        Number => "NUMBER", Number;
        /// Modification time.
        Date => "DATE_STRF", Number;
        /// Description, falling back to the file name.
        Description => "DESCRIPTION", String;
        /// File name, `/` appended for directories.
        Filename => "FILENAME", String;
        /// Permission string, e.g. `drwxr-xr-x`.
        FileMode => "FILE_MODE", String;
        /// Owning group.
        FileGroup => "FILE_GROUP", String;
        /// Owning user.
        FileOwner => "FILE_OWNER", String;
        /// Hard links.
        HardLinks => "HARD_LINKS", Number;
        /// Messages in the mailbox.
        MessageCount => "MESSAGE_COUNT", Number;
        /// New messages.
        NewCount => "NEW_COUNT", Number;
        /// `N` when the mailbox has new mail.
        NewMail => "NEW_MAIL", String;
        /// Size, human readable.
        Size => "FILE_SIZE", Number;
        /// `*` when tagged.
        Tagged => "TAGGED", String;
    }
}

/// Codes for `folder_format`.
pub static FOLDER_FORMAT: &[Definition] = &[
    PAD_SOFT,
    PAD_HARD,
    PAD_EOL,
    Definition::date("[", "date-strf", Field::Folder(FolderField::Date), ']', true),
    Definition::new("C", "number", Field::Folder(FolderField::Number)),
    Definition::new("f", "filename", Field::Folder(FolderField::Filename)),
    Definition::new("F", "file-mode", Field::Folder(FolderField::FileMode)),
    Definition::new("g", "file-group", Field::Folder(FolderField::FileGroup)),
    Definition::new("i", "description", Field::Folder(FolderField::Description)),
    Definition::new("l", "hard-links", Field::Folder(FolderField::HardLinks)),
    Definition::new("m", "message-count", Field::Folder(FolderField::MessageCount)),
    Definition::new("n", "new-count", Field::Folder(FolderField::NewCount)),
    Definition::new("N", "new-mail", Field::Folder(FolderField::NewMail)),
    Definition::new("s", "file-size", Field::Folder(FolderField::Size)),
    Definition::new("t", "tagged", Field::Folder(FolderField::Tagged)),
    Definition::new("u", "file-owner", Field::Folder(FolderField::FileOwner)),
];

/// One row of the file browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct FolderEntry {
    /// Zero-based row number.
    pub num: usize,
    pub name: String,
    pub description: Option<String>,
    pub is_dir: bool,
    pub mode: String,
    pub owner: String,
    pub group: String,
    pub links: u64,
    pub size: u64,
    /// Modification time, seconds since the epoch.
    pub mtime: i64,
    /// Message counts, when the entry is a known mailbox.
    pub messages: Option<u64>,
    pub new: Option<u64>,
    pub tagged: bool,
}

impl FolderEntry {
    /// Name as shown, with a trailing `/` for directories.
    fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl Provider for FolderEntry {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        let Field::Folder(f) = field else {
            return None;
        };
        Some(match f {
            FolderField::Description => self
                .description
                .clone()
                .unwrap_or_else(|| self.display_name()),
            FolderField::Filename => self.display_name(),
            FolderField::FileMode => self.mode.clone(),
            FolderField::FileGroup => self.group.clone(),
            FolderField::FileOwner => self.owner.clone(),
            FolderField::NewMail => if self.new.unwrap_or(0) > 0 { "N" } else { " " }.to_string(),
            FolderField::Size => pretty_size(self.size),
            FolderField::Tagged => if self.tagged { "*" } else { " " }.to_string(),
            // Counts are blank, not zero, for entries that are not mailboxes.
            FolderField::MessageCount if self.messages.is_none() => String::new(),
            FolderField::NewCount if self.new.is_none() => String::new(),
            _ => return None,
        })
    }

    fn number(&self, field: Field, _flags: RenderFlags) -> Option<i64> {
        let Field::Folder(f) = field else {
            return None;
        };
        let n = match f {
            FolderField::Number => u64::try_from(self.num + 1).ok()?,
            FolderField::Date => return Some(self.mtime),
            FolderField::HardLinks => self.links,
            FolderField::MessageCount => self.messages.unwrap_or(0),
            FolderField::NewCount | FolderField::NewMail => self.new.unwrap_or(0),
            FolderField::Size => self.size,
            FolderField::Tagged => u64::from(self.tagged),
            _ => return None,
        };
        i64::try_from(n).ok()
    }

    fn date(&self, field: Field) -> Option<DateTime<FixedOffset>> {
        match field {
            Field::Folder(FolderField::Date) => {
                DateTime::from_timestamp(self.mtime, 0).map(|d| d.fixed_offset())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_get_a_slash() {
        let e = FolderEntry {
            name: "lists".into(),
            is_dir: true,
            ..Default::default()
        };
        let s = e.string(Field::Folder(FolderField::Description), RenderFlags::empty());
        assert_eq!(s.as_deref(), Some("lists/"));
        let count = e.string(Field::Folder(FolderField::MessageCount), RenderFlags::empty());
        assert_eq!(count.as_deref(), Some(""));
    }
}
