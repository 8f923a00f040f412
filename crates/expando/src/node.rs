//! The parsed form of a format string.

use serde::Serialize;

use crate::{
    definition::{Definition, PadKind},
    domain::Field,
    format::FormatSpec,
};

/// Unit of a relative date window, as in `%<[2w?...>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateUnit {
    /// `y`
    Year,
    /// `m`
    Month,
    /// `w`
    Week,
    /// `d`
    Day,
    /// `H`
    Hour,
    /// `M`
    Minute,
    /// `S`
    Second,
}

impl DateUnit {
    /// Parse a unit letter.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'y' => Self::Year,
            'm' => Self::Month,
            'w' => Self::Week,
            'd' => Self::Day,
            'H' => Self::Hour,
            'M' => Self::Minute,
            'S' => Self::Second,
            _ => return None,
        })
    }

    /// The unit letter.
    pub fn as_char(self) -> char {
        match self {
            Self::Year => 'y',
            Self::Month => 'm',
            Self::Week => 'w',
            Self::Day => 'd',
            Self::Hour => 'H',
            Self::Minute => 'M',
            Self::Second => 'S',
        }
    }
}

/// A strftime parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateFormat {
    /// The strftime string, escapes removed.
    pub strftime: String,
    /// Written with a leading `!`: format in the C locale.
    pub c_locale: bool,
}

/// Extra text attached to a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Param {
    /// Plain code.
    None,
    /// `%[...]` and friends.
    Date(DateFormat),
    /// `%@name@`.
    Name(String),
}

/// A `%X` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandoNode {
    /// The code.
    pub def: &'static Definition,
    /// Width and alignment prefix.
    pub format: Option<FormatSpec>,
    /// Enclosed parameter.
    pub param: Param,
}

/// A padding directive with the content on either side of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaddingNode {
    /// The padding code.
    pub def: &'static Definition,
    /// How spare width is shared out.
    pub kind: PadKind,
    /// Fill unit, one character.
    pub pad: String,
    /// Everything before the directive in its container.
    pub left: Box<Node>,
    /// Everything after it, itself re-padded.
    pub right: Box<Node>,
}

/// A conditional: `%<X?then&else>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    /// A [`Node::CondBool`] or [`Node::CondDate`].
    pub predicate: Node,
    /// Rendered when the predicate holds.
    pub if_true: Node,
    /// Rendered otherwise.
    pub if_false: Node,
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Node {
    /// Nothing; an absent branch.
    Empty,
    /// Literal text.
    Text(String),
    /// A field.
    Expando(ExpandoNode),
    /// Padding between two regions.
    Padding(PaddingNode),
    /// A conditional.
    Condition(Box<Condition>),
    /// Predicate: is the field non-zero or non-empty?
    CondBool(&'static Definition),
    /// Predicate: does the date lie within the last `count` units?
    CondDate {
        /// The date code.
        def: &'static Definition,
        /// Window size; zero means "since the start of the current unit".
        count: u32,
        /// Window unit.
        unit: DateUnit,
    },
    /// A sequence.
    Container(Vec<Node>),
}

impl Node {
    /// Visit this node and every node below it, depth first.
    pub fn walk(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::Padding(p) => {
                p.left.walk(f);
                p.right.walk(f);
            }
            Self::Condition(c) => {
                c.predicate.walk(f);
                c.if_true.walk(f);
                c.if_false.walk(f);
            }
            Self::Container(children) => children.iter().for_each(|c| c.walk(f)),
            Self::Empty
            | Self::Text(_)
            | Self::Expando(_)
            | Self::CondBool(_)
            | Self::CondDate { .. } => {}
        }
    }

    /// The field this node reads, if any.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Expando(e) => Some(e.def.field),
            Self::CondBool(def) | Self::CondDate { def, .. } => Some(def.field),
            _ => None,
        }
    }
}
