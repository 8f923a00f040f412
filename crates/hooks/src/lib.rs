//! User-defined hooks for a mail client.
//!
//! Commands such as `folder-hook . 'set sort=threads'` or
//! `send-hook '~t boss' 'set signature=~/.sig-work'` register a selector and
//! a payload. [`Hooks`] stores them in definition order and, when the host
//! reports an event, runs the payloads of the hooks whose selector matches.
//!
//! - [`kind`]: hook types and the commands that create them
//! - [`parse`]: the `*-hook` and `unhook` command parsers
//! - [`registry`]: ordered storage with duplicate handling
//! - [`dispatch`]: events, rc-file sourcing and path lookups
//! - [`paths`]: mailbox shortcuts and address-derived folder names

pub mod charset;
pub mod config;
pub mod dispatch;
mod error;
pub mod kind;
pub mod parse;
pub mod paths;
pub mod registry;
mod token;

#[cfg(test)]
mod property_tests;

pub use charset::{CharsetLookup, LookupKind};
pub use config::{DEFAULT_HOOK, HookConfig};
pub use dispatch::{CommandInterpreter, CommandResult, Hooks};
pub use error::{Error, Result};
pub use kind::{HOOK_COMMANDS, HookType, hook_type};
pub use registry::{Added, Hook, Registry, Selector};
