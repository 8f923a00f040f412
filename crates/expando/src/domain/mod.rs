//! Data domains and the providers that feed them.
//!
//! Every format code reads one [`Field`]. A field belongs to exactly one
//! domain, and each domain module pairs its field enum with a definition table
//! and a [`Provider`] over the data that domain describes.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::render::RenderFlags;

pub mod alias;
pub mod compress;
pub mod folder;
pub mod index;
pub mod msgid;
pub mod status;

/// Whether a field is naturally text or a number.
///
/// Decides the default alignment: numbers right, text left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    /// Text.
    String,
    /// Integer.
    Number,
}

/// Declare a field enum with its serialised attribute names and kinds.
macro_rules! fields {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $attr:literal, $kind:ident; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            /// Attribute name used by the serialiser.
            pub fn attr(self) -> &'static str {
                match self {
                    $( Self::$variant => $attr, )*
                }
            }

            /// Natural kind of the value.
            pub fn kind(self) -> ValueKind {
                match self {
                    $( Self::$variant => ValueKind::$kind, )*
                }
            }
        }
    };
}
pub(crate) use fields;

fields! {
    /// Codes available in every table.
    GlobalField {
        /// `%*X`
        PaddingSoft => "PADDING_SOFT", String;
        /// `%>X`
        PaddingHard => "PADDING_HARD", String;
        /// `%|X`
        PaddingEol => "PADDING_EOL", String;
    }
}

/// A field in one of the data domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    /// Padding codes.
    Global(GlobalField),
    /// Address-book entries.
    Alias(alias::AliasField),
    /// Per-message data outside the headers.
    Email(index::EmailField),
    /// Header fields.
    Envelope(index::EnvelopeField),
    /// The mailbox the message lives in.
    Mailbox(index::MailboxField),
    /// The status bar.
    Status(status::StatusField),
    /// Compressed-folder shell commands.
    Compress(compress::CompressField),
    /// Message-Id generation.
    MsgId(msgid::MsgIdField),
    /// File-browser entries.
    Folder(folder::FolderField),
}

impl Field {
    /// Domain name used by the serialiser.
    pub fn domain(self) -> &'static str {
        match self {
            Self::Global(_) => "GLOBAL",
            Self::Alias(_) => "ALIAS",
            Self::Email(_) => "EMAIL",
            Self::Envelope(_) => "ENVELOPE",
            Self::Mailbox(_) => "MAILBOX",
            Self::Status(_) => "STATUS",
            Self::Compress(_) => "COMPRESS",
            Self::MsgId(_) => "MSGID",
            Self::Folder(_) => "FOLDER",
        }
    }

    /// Attribute name used by the serialiser.
    pub fn attr(self) -> &'static str {
        match self {
            Self::Global(f) => f.attr(),
            Self::Alias(f) => f.attr(),
            Self::Email(f) => f.attr(),
            Self::Envelope(f) => f.attr(),
            Self::Mailbox(f) => f.attr(),
            Self::Status(f) => f.attr(),
            Self::Compress(f) => f.attr(),
            Self::MsgId(f) => f.attr(),
            Self::Folder(f) => f.attr(),
        }
    }

    /// Natural kind of the value.
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Global(f) => f.kind(),
            Self::Alias(f) => f.kind(),
            Self::Email(f) => f.kind(),
            Self::Envelope(f) => f.kind(),
            Self::Mailbox(f) => f.kind(),
            Self::Status(f) => f.kind(),
            Self::Compress(f) => f.kind(),
            Self::MsgId(f) => f.kind(),
            Self::Folder(f) => f.kind(),
        }
    }
}

/// Supplies field values to the renderer.
///
/// Text is preferred over numbers, so a field can keep a raw number for
/// conditionals while displaying something friendlier. Fields a provider does
/// not know render as empty text or `0`.
pub trait Provider {
    /// Text value of `field`.
    fn string(&self, _field: Field, _flags: RenderFlags) -> Option<String> {
        None
    }

    /// Numeric value of `field`.
    fn number(&self, _field: Field, _flags: RenderFlags) -> Option<i64> {
        None
    }

    /// Date value of `field`, in the zone it was recorded in.
    fn date(&self, _field: Field) -> Option<DateTime<FixedOffset>> {
        None
    }

    /// Value of a code that takes a name parameter, e.g. `%@name@`.
    fn named(&self, _field: Field, _name: &str, _flags: RenderFlags) -> Option<String> {
        None
    }
}

/// A provider that knows nothing; every field renders empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoData;

impl Provider for NoData {}

/// Pad a two-digit time component.
pub(crate) fn two_digits(n: u32) -> String {
    format!("{n:02}")
}
