//! Address-book entries.

use serde::{Deserialize, Serialize};

use crate::AddressList;

/// A named set of addresses from the address book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Alias {
    /// Short name the user types.
    pub name: String,
    /// Addresses the alias expands to.
    pub addresses: AddressList,
    /// Free-form comment.
    pub comment: Option<String>,
    /// User tags.
    pub tags: Vec<String>,
}

/// An alias as shown in a menu: the entry plus its row state.
#[derive(Debug, Clone, Copy)]
pub struct AliasView<'a> {
    /// Zero-based row number.
    pub num: usize,
    /// Row is tagged.
    pub tagged: bool,
    /// Row is marked for deletion.
    pub deleted: bool,
    /// The entry itself.
    pub alias: &'a Alias,
}

impl<'a> AliasView<'a> {
    /// View of `alias` at row `num` with no marks.
    pub fn new(num: usize, alias: &'a Alias) -> Self {
        Self {
            num,
            tagged: false,
            deleted: false,
            alias,
        }
    }
}
