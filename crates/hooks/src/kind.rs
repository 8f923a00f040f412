//! Hook types and the commands that create them.

use bitflags::bitflags;
use pattern::CompileFlags;

bitflags! {
    /// What a hook is for. `fcc-save-hook` sets two bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HookType: u32 {
        /// Entering a folder.
        const FOLDER = 1;
        /// Where read mail is moved on leaving a folder.
        const MBOX = 1 << 1;
        /// Composing a message.
        const SEND = 1 << 2;
        /// Where a copy of outgoing mail is kept.
        const FCC = 1 << 3;
        /// Default folder to save a message to.
        const SAVE = 1 << 4;
        /// Charset alias.
        const CHARSET = 1 << 5;
        /// iconv charset name.
        const ICONV = 1 << 6;
        /// Displaying a message.
        const MESSAGE = 1 << 7;
        /// Key for an encryption recipient.
        const CRYPT = 1 << 8;
        /// Connecting to a remote account.
        const ACCOUNT = 1 << 9;
        /// Replying to a message.
        const REPLY = 1 << 10;
        /// Any change to a message being composed.
        const SEND2 = 1 << 11;
        /// Opening a compressed folder.
        const OPEN = 1 << 12;
        /// Appending to a compressed folder.
        const APPEND = 1 << 13;
        /// Closing a compressed folder.
        const CLOSE = 1 << 14;
        /// The idle timer.
        const TIMEOUT = 1 << 15;
        /// Program start.
        const STARTUP = 1 << 16;
        /// Program exit.
        const SHUTDOWN = 1 << 17;
        /// Takes no selector.
        const GLOBAL = 1 << 18;
        /// Per-message index format.
        const INDEX_FORMAT = 1 << 19;

        /// Compressed-folder commands.
        const COMPRESS = Self::OPEN.bits() | Self::APPEND.bits() | Self::CLOSE.bits();
        /// Selected by a message pattern rather than a regex.
        const PATTERN = Self::SEND.bits()
            | Self::SEND2.bits()
            | Self::SAVE.bits()
            | Self::FCC.bits()
            | Self::MESSAGE.bits()
            | Self::REPLY.bits();
        /// The payload is a mailbox path rendered with the index codes.
        const PATH = Self::MBOX.bits() | Self::SAVE.bits() | Self::FCC.bits();
    }
}

/// Hook commands and the type each creates.
pub static HOOK_COMMANDS: &[(&str, HookType)] = &[
    ("account-hook", HookType::ACCOUNT),
    ("append-hook", HookType::APPEND),
    ("charset-hook", HookType::CHARSET),
    ("close-hook", HookType::CLOSE),
    ("crypt-hook", HookType::CRYPT),
    ("fcc-hook", HookType::FCC),
    ("fcc-save-hook", HookType::FCC.union(HookType::SAVE)),
    ("folder-hook", HookType::FOLDER),
    ("iconv-hook", HookType::ICONV),
    ("index-format-hook", HookType::INDEX_FORMAT),
    ("mbox-hook", HookType::MBOX),
    ("message-hook", HookType::MESSAGE),
    ("open-hook", HookType::OPEN),
    ("pgp-hook", HookType::CRYPT),
    ("reply-hook", HookType::REPLY),
    ("save-hook", HookType::SAVE),
    ("send-hook", HookType::SEND),
    ("send2-hook", HookType::SEND2),
    ("shutdown-hook", HookType::SHUTDOWN.union(HookType::GLOBAL)),
    ("startup-hook", HookType::STARTUP.union(HookType::GLOBAL)),
    ("timeout-hook", HookType::TIMEOUT.union(HookType::GLOBAL)),
];

/// The hook type a command name creates, ignoring case.
pub fn hook_type(name: &str) -> Option<HookType> {
    HOOK_COMMANDS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, t)| *t)
}

impl HookType {
    /// The command that creates this type, for messages.
    pub fn command_name(self) -> &'static str {
        HOOK_COMMANDS
            .iter()
            .find(|(_, t)| *t == self)
            .map_or("hook", |(n, _)| n)
    }

    /// Several commands may share one selector.
    pub fn allows_many(self) -> bool {
        self.intersects(
            Self::FOLDER
                | Self::SEND
                | Self::SEND2
                | Self::MESSAGE
                | Self::ACCOUNT
                | Self::REPLY
                | Self::CRYPT
                | Self::TIMEOUT
                | Self::STARTUP
                | Self::SHUTDOWN,
        )
    }

    /// The command runs to the end of the line without quoting.
    pub fn command_keeps_spaces(self) -> bool {
        self.intersects(
            Self::FOLDER
                | Self::SEND
                | Self::SEND2
                | Self::MESSAGE
                | Self::ACCOUNT
                | Self::REPLY
                | Self::COMPRESS
                | Self::GLOBAL,
        )
    }

    /// Selector is a folder path that may use mailbox shortcuts.
    pub fn selects_folders(self) -> bool {
        self.intersects(Self::FOLDER | Self::MBOX)
    }

    /// How a pattern selector is compiled, or `None` for regex selectors.
    pub fn compile_flags(self) -> Option<CompileFlags> {
        if self.contains(Self::SEND2) {
            Some(CompileFlags::SEND_MODE_SEARCH)
        } else if self.intersects(Self::SEND | Self::FCC) {
            Some(CompileFlags::empty())
        } else if self.intersects(Self::PATTERN) {
            Some(CompileFlags::FULL_MSG)
        } else {
            None
        }
    }
}
