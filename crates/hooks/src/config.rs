//! Settings the hook commands read.

use serde::{Deserialize, Serialize};

/// Default `default_hook`: a plain word matches the author, or the
/// recipients of mail the user sent.
pub const DEFAULT_HOOK: &str = "~f %s !~P | (~P ~C %s)";

/// Settings the hook commands read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Template that turns a plain word into a pattern for message hooks.
    pub default_hook: Option<String>,
    /// Mail directory, the target of `=` and `+`.
    pub folder: String,
    /// Default fcc mailbox, the target of `<`.
    pub record: String,
    /// Incoming mailbox, the target of `!`.
    pub spool: String,
    /// Home directory, the target of `~`.
    pub home: Option<String>,
    /// The open mailbox, the target of `^`.
    pub current_folder: Option<String>,
    /// Keep outgoing mail in a folder named after the recipient, if it exists.
    pub save_name: bool,
    /// Keep outgoing mail in a folder named after the recipient, always.
    pub force_name: bool,
    /// Use the whole address, not just the local part, for folder names.
    pub save_address: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            default_hook: Some(DEFAULT_HOOK.to_string()),
            folder: "~/Mail".to_string(),
            record: "~/sent".to_string(),
            spool: String::new(),
            home: None,
            current_folder: None,
            save_name: false,
            force_name: false,
            save_address: false,
        }
    }
}
