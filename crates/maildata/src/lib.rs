//! Data model shared by the format, pattern and hook crates.
//!
//! This crate holds the plain data the core operates on, along with the narrow
//! collaborator traits it consumes:
//! - [`address`]: RFC 822 style addresses and address-list parsing
//! - [`message`]: envelopes, emails and their flags
//! - [`alias`]: address-book entries and the menu view over them
//! - [`store`]: the [`MailStore`] collaborator and an in-memory implementation
//! - [`clock`]: wall-clock access for relative dates

pub mod address;
pub mod alias;
pub mod clock;
pub mod message;
pub mod store;

pub use address::{Address, AddressList};
pub use alias::{Alias, AliasView};
pub use clock::{Clock, FixedClock, SystemClock};
pub use message::{Crypt, Email, Envelope, Flags, ThreadInfo};
pub use store::{MailStore, MemStore};
