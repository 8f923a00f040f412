//! RFC 822 style addresses and a lenient address-list parser.
//!
//! Parsing is done by `mailparse`, which handles `Name <box@host>`,
//! `"Quoted, Name" <box@host>`, bare `box@host` and `group: a@x, b@y;`.
//! Parenthesised comments are stripped first and a comment becomes the
//! display name of the address it follows when that address has none. Parsing never fails; input mailparse rejects is carried
//! through as bare mailboxes.

use std::{fmt, ops::Deref, slice, str::Chars};

use mailparse::{MailAddr, SingleInfo, addrparse};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Characters that force a display name to be quoted when written out.
const SPECIALS: &[char] = &['(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '.', '[', ']'];

/// A single mailbox with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Display name, e.g. `Bob Smith`.
    #[serde(default)]
    pub personal: Option<String>,
    /// Machine address, e.g. `bob@example.com`.
    pub mailbox: String,
    /// Name of the group this address was listed under.
    #[serde(default)]
    pub group: Option<String>,
}

impl Address {
    /// Create an address without a display name.
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            personal: None,
            mailbox: mailbox.into(),
            group: None,
        }
    }

    /// Create an address with a display name.
    pub fn with_personal(personal: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self {
            personal: Some(personal.into()),
            mailbox: mailbox.into(),
            group: None,
        }
    }

    /// The part of the mailbox before the `@`.
    pub fn local_part(&self) -> &str {
        match self.mailbox.split_once('@') {
            Some((local, _)) => local,
            None => &self.mailbox,
        }
    }

    /// The part of the mailbox after the `@`, if any.
    pub fn domain(&self) -> Option<&str> {
        self.mailbox.split_once('@').map(|(_, domain)| domain)
    }

    /// Case-insensitive comparison of the machine address.
    pub fn same_mailbox(&self, other: &str) -> bool {
        self.mailbox.eq_ignore_ascii_case(other)
    }

    /// Display name if present and non-empty.
    pub fn personal(&self) -> Option<&str> {
        self.personal.as_deref().filter(|p| !p.is_empty())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.personal() {
            Some(p) if p.contains(SPECIALS) => {
                write!(f, "\"{}\" <{}>", p.replace('"', "\\\""), self.mailbox)
            }
            Some(p) => write!(f, "{} <{}>", p, self.mailbox),
            None => f.write_str(&self.mailbox),
        }
    }
}

/// An ordered list of addresses, as found in `To:` or `Cc:`.
///
/// Serialises as the header string so fixtures can be written naturally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AddressList(Vec<Address>);

impl AddressList {
    /// An empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a header value into a list of addresses.
    pub fn parse(s: &str) -> Self {
        Self(parse_list(s))
    }

    /// Append an address.
    pub fn push(&mut self, addr: Address) {
        self.0.push(addr);
    }

    /// Write the list in header form; `display` drops group syntax.
    pub fn write(&self, display: bool) -> String {
        let mut out = String::new();
        let mut open_group: Option<&str> = None;
        for (i, addr) in self.0.iter().enumerate() {
            let group = addr.group.as_deref();
            if !display && open_group.is_some() && open_group != group {
                out.push(';');
                open_group = None;
            }
            if i > 0 {
                out.push_str(", ");
            }
            if !display
                && let Some(name) = group
                && open_group != Some(name)
            {
                out.push_str(name);
                out.push_str(": ");
                open_group = Some(name);
            }
            out.push_str(&addr.to_string());
        }
        if !display && open_group.is_some() {
            out.push(';');
        }
        out
    }
}

impl Deref for AddressList {
    type Target = [Address];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for AddressList {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for AddressList {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<AddressList> for String {
    fn from(list: AddressList) -> Self {
        list.write(false)
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<T: IntoIterator<Item = Address>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.write(true))
    }
}

/// Remove parenthesised comments from a header value.
///
/// Returns the stripped text and, for every address slot that carried a
/// comment, the slot index and the comment text. Slots count addresses, not
/// separators, so group labels and empty groups don't shift them.
fn strip_comments(s: &str) -> (String, Vec<(usize, String)>) {
    let mut out = String::with_capacity(s.len());
    let mut comments: Vec<(usize, String)> = Vec::new();
    let mut slot = 0;
    let mut seen = false;
    let mut quoted = false;
    let mut angle = false;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if quoted {
            out.push(c);
            match c {
                '\\' => out.extend(chars.next()),
                '"' => quoted = false,
                _ => {}
            }
            continue;
        }
        match c {
            '(' => {
                let text = read_comment(&mut chars);
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match comments.last_mut() {
                    Some((last, prev)) if *last == slot => {
                        prev.push(' ');
                        prev.push_str(text);
                    }
                    _ => comments.push((slot, text.to_string())),
                }
                continue;
            }
            '"' => {
                quoted = true;
                seen = true;
            }
            '<' => {
                angle = true;
                seen = true;
            }
            '>' => angle = false,
            ':' if !angle => seen = false,
            ',' | ';' if !angle => {
                if seen {
                    slot += 1;
                }
                seen = false;
            }
            c if !c.is_whitespace() => seen = true,
            _ => {}
        }
        out.push(c);
    }
    (out, comments)
}

/// Read the body of a (possibly nested) comment whose `(` was consumed.
fn read_comment(chars: &mut Chars<'_>) -> String {
    let mut text = String::new();
    let mut depth = 1;
    while let Some(c) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            '\\' => {
                text.extend(chars.next());
                continue;
            }
            _ => {}
        }
        text.push(c);
    }
    text
}

/// Convert one mailparse mailbox into an [`Address`].
fn from_single(info: &SingleInfo, group: Option<&str>) -> Address {
    Address {
        personal: info.display_name.clone().filter(|p| !p.trim().is_empty()),
        mailbox: info.addr.clone(),
        group: group.map(str::to_string),
    }
}

/// Parse `s` into addresses, never failing.
fn parse_list(s: &str) -> Vec<Address> {
    let (stripped, comments) = strip_comments(s);
    let mut out: Vec<Address> = match addrparse(&stripped) {
        Ok(list) => list
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(info) => vec![from_single(info, None)],
                MailAddr::Group(group) => group
                    .addrs
                    .iter()
                    .map(|info| from_single(info, Some(&group.group_name)))
                    .collect(),
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, input = s, "address list not parseable, keeping bare mailboxes");
            stripped
                .split(',')
                .map(|part| part.split_whitespace().collect::<String>())
                .filter(|mailbox| !mailbox.is_empty())
                .map(Address::new)
                .collect()
        }
    };
    // A comment only stands in for the display name when no name was given.
    for (slot, text) in comments {
        if let Some(addr) = out.get_mut(slot)
            && addr.personal.is_none()
        {
            addr.personal = Some(text);
        }
    }
    out
}
