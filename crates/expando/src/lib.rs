//! Printf-style format strings for a mail client.
//!
//! A format string such as `%3i %-15a %> %Y` is parsed once against the
//! definition table of the variable that holds it, producing an [`Expando`].
//! Rendering walks the tree against a [`Provider`] and never exceeds the
//! column budget it is given.
//!
//! - [`format`]: width and alignment prefixes
//! - [`node`]: the parsed tree
//! - [`render`]: rendering, padding and conditionals
//! - [`domain`]: field enums, definition tables and providers per data domain
//! - [`config`]: binding a format string to a named config variable

use maildata::Clock;
use serde::Serialize;
use tracing::trace;

pub mod config;
pub mod definition;
pub mod domain;
mod error;
pub mod format;
pub mod node;
mod parse;
pub mod render;
mod serial;
pub mod width;

#[cfg(test)]
mod property_tests;

pub use config::{ConfigFlags, ExpandoConfig, SetResult, Validator};
pub use definition::{Definition, GLOBAL_FORMAT, PadKind, ParseHook};
pub use domain::{Field, NoData, Provider, ValueKind};
pub use error::{Error, ErrorKind, Result, excerpt_at};
pub use format::{FormatSpec, Justify};
pub use node::Node;
pub use render::{RenderFlags, UNBOUNDED};

use crate::render::Ctx;

/// A parsed format string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expando {
    /// The string as written.
    source: String,
    /// Codes the string was parsed against.
    #[serde(skip)]
    defs: &'static [Definition],
    /// Parsed tree.
    root: Node,
}

impl Expando {
    /// Parse `source` against the codes in `defs`.
    pub fn parse(source: &str, defs: &'static [Definition]) -> Result<Self> {
        let root = parse::parse(source, defs)?;
        trace!(source, "parsed format string");
        Ok(Self {
            source: source.to_string(),
            defs,
            root,
        })
    }

    /// The string as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The table this string was parsed against.
    pub fn defs(&self) -> &'static [Definition] {
        self.defs
    }

    /// Does any directive or condition read `field`?
    pub fn uses_field(&self, field: Field) -> bool {
        let mut found = false;
        self.root.walk(&mut |n| found |= n.field() == Some(field));
        found
    }

    /// Render into `out` using at most `max_cols` cells; returns the cells
    /// used.
    pub fn render(
        &self,
        provider: &dyn Provider,
        flags: RenderFlags,
        max_cols: usize,
        clock: &dyn Clock,
        out: &mut String,
    ) -> usize {
        let ctx = Ctx {
            provider,
            flags,
            clock,
        };
        render::render_node(&self.root, &ctx, max_cols, out)
    }

    /// Render to a new string using at most `max_cols` cells.
    pub fn render_to_string(
        &self,
        provider: &dyn Provider,
        flags: RenderFlags,
        max_cols: usize,
        clock: &dyn Clock,
    ) -> String {
        let mut out = String::new();
        self.render(provider, flags, max_cols, clock, &mut out);
        out
    }

    /// Render with no width limit. Padding does not fill.
    pub fn render_unbounded(&self, provider: &dyn Provider, flags: RenderFlags, clock: &dyn Clock) -> String {
        self.render_to_string(provider, flags, UNBOUNDED, clock)
    }

    /// Canonical debug form of the tree, e.g. `<EXP:(ENVELOPE,SUBJECT)>`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        serial::dump(&self.root, &mut out);
        out
    }

    /// A format string that parses back to the same tree.
    ///
    /// Not necessarily [`Expando::source`]: escapes and conditionals come
    /// out in one canonical spelling.
    pub fn to_source(&self) -> String {
        serial::to_source(&self.root, self.defs, "")
    }
}
