//! Format-string parser.
//!
//! A single left-to-right pass turns the string into a flat list of nodes per
//! container. Padding is then hoisted so each padding node owns the content to
//! its left and right.

use std::mem;

use crate::{
    definition::{Definition, ParseHook, find_long, find_short},
    error::{Error, ErrorKind, Result},
    format::{FormatSpec, parse_format},
    node::{Condition, DateFormat, DateUnit, ExpandoNode, Node, PaddingNode, Param},
};

/// Parse `src` against the codes in `defs`.
pub fn parse(src: &str, defs: &'static [Definition]) -> Result<Node> {
    let parser = Parser { src, defs };
    let (nodes, _) = parser.sequence(0, &[])?;
    Ok(repad(nodes))
}

/// Hoist the first padding node in `nodes` so it owns its neighbours.
///
/// The right-hand side is re-padded in turn, so several paddings in one
/// container compose left to right.
pub fn repad(mut nodes: Vec<Node>) -> Node {
    let Some(i) = nodes.iter().position(|n| matches!(n, Node::Padding(_))) else {
        return collapse(nodes);
    };
    let right = nodes.split_off(i + 1);
    match nodes.pop() {
        Some(Node::Padding(mut pad)) => {
            pad.left = Box::new(collapse(nodes));
            pad.right = Box::new(repad(right));
            Node::Padding(pad)
        }
        other => {
            nodes.extend(other);
            nodes.extend(right);
            collapse(nodes)
        }
    }
}

/// Turn a node list into a single node.
fn collapse(mut nodes: Vec<Node>) -> Node {
    match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap_or(Node::Empty),
        _ => Node::Container(nodes),
    }
}

/// Match a relative-date head such as `2w?`; returns the digits, the unit and
/// the length up to (not including) the `?`.
pub fn cond_date_head(s: &str) -> Option<(&str, DateUnit, usize)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    let unit = s[digits..].chars().next().and_then(DateUnit::from_char)?;
    if !s[digits + 1..].starts_with('?') {
        return None;
    }
    Some((&s[..digits], unit, digits + 1))
}

/// Error for a code that is not in the table.
fn unknown(at: usize, rest: &str) -> Error {
    let shown: String = rest.chars().take(1).collect();
    Error::parse(
        ErrorKind::UnknownCode,
        at,
        format!("Unknown expando: %{shown}"),
    )
}

/// Move pending literal text into the node list.
fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(mem::take(text)));
    }
}

/// Parser state: the source and the table codes are resolved against.
struct Parser<'a> {
    /// The whole format string.
    src: &'a str,
    /// Legal codes.
    defs: &'static [Definition],
}

impl Parser<'_> {
    /// Parse nodes from `pos` until end of input or an unescaped char in
    /// `terms`; returns the nodes and the offset of the terminator.
    fn sequence(&self, mut pos: usize, terms: &[char]) -> Result<(Vec<Node>, usize)> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        while let Some(c) = self.src[pos..].chars().next() {
            if terms.contains(&c) {
                break;
            }
            match c {
                '\\' => {
                    let Some(next) = self.src[pos + 1..].chars().next() else {
                        return Err(Error::parse(
                            ErrorKind::TrailingEscape,
                            pos,
                            "Format string ends with a backslash",
                        ));
                    };
                    text.push(match next {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                    pos += 1 + next.len_utf8();
                }
                '%' if self.src[pos + 1..].starts_with('%') => {
                    text.push('%');
                    pos += 2;
                }
                '%' => {
                    flush(&mut text, &mut nodes);
                    let (node, next) = self.directive(pos)?;
                    nodes.push(node);
                    pos = next;
                }
                c => {
                    text.push(c);
                    pos += c.len_utf8();
                }
            }
        }
        flush(&mut text, &mut nodes);
        Ok((nodes, pos))
    }

    /// Parse the directive whose `%` is at `pos`.
    fn directive(&self, pos: usize) -> Result<(Node, usize)> {
        let at = pos + 1;
        let rest = &self.src[at..];
        if rest.starts_with('<') {
            return self.condition(at + 1, '>');
        }
        if rest.starts_with('?') {
            return self.condition(at + 1, '?');
        }
        if rest.starts_with('[') && cond_date_head(&rest[1..]).is_some() {
            return self.condition(at, ']');
        }

        let (format, code_at) = parse_format(self.src, at)?;
        let (def, after) = self.resolve(code_at)?;
        self.code(def, format, code_at, after)
    }

    /// Resolve the code at `at`, long form first; returns the definition and
    /// the offset just past the code.
    fn resolve(&self, at: usize) -> Result<(&'static Definition, usize)> {
        let rest = &self.src[at..];
        if let Some(inner) = rest.strip_prefix('{')
            && let Some(close) = inner.find('}')
            && let Some(def) = find_long(self.defs, &inner[..close])
        {
            return Ok((def, at + close + 2));
        }
        match find_short(self.defs, rest) {
            Some(def) => Ok((def, at + def.short.len())),
            None => Err(unknown(at, rest)),
        }
    }

    /// Build the node for `def`, reading any parameter that follows it.
    fn code(
        &self,
        def: &'static Definition,
        format: Option<FormatSpec>,
        code_at: usize,
        after: usize,
    ) -> Result<(Node, usize)> {
        match def.hook {
            ParseHook::None => Ok((
                Node::Expando(ExpandoNode {
                    def,
                    format,
                    param: Param::None,
                }),
                after,
            )),
            ParseHook::Padding(kind) => {
                if format.is_some() {
                    return Err(Error::parse(
                        ErrorKind::PaddingOutsideAllowed,
                        code_at,
                        "Padding cannot be formatted",
                    ));
                }
                let (pad, next) = match self.src[after..].chars().next() {
                    Some(c) => (c.to_string(), after + c.len_utf8()),
                    None => (" ".to_string(), after),
                };
                let node = PaddingNode {
                    def,
                    kind,
                    pad,
                    left: Box::new(Node::Empty),
                    right: Box::new(Node::Empty),
                };
                Ok((Node::Padding(node), next))
            }
            ParseHook::Date { close, .. } => {
                let (content, next) = self.enclosure(after, close)?;
                let date = match content.strip_prefix('!') {
                    Some(rest) => DateFormat {
                        strftime: rest.to_string(),
                        c_locale: true,
                    },
                    None => DateFormat {
                        strftime: content,
                        c_locale: false,
                    },
                };
                let node = ExpandoNode {
                    def,
                    format,
                    param: Param::Date(date),
                };
                Ok((Node::Expando(node), next))
            }
            ParseHook::Named { close } => {
                let (name, next) = self.enclosure(after, close)?;
                let node = ExpandoNode {
                    def,
                    format,
                    param: Param::Name(name),
                };
                Ok((Node::Expando(node), next))
            }
        }
    }

    /// Read up to `close`, honouring backslash escapes; returns the content
    /// and the offset after the terminator.
    fn enclosure(&self, start: usize, close: char) -> Result<(String, usize)> {
        let mut content = String::new();
        let mut chars = self.src[start..].char_indices();
        while let Some((i, c)) = chars.next() {
            if c == close {
                return Ok((content, start + i + c.len_utf8()));
            }
            if c == '\\' {
                match chars.next() {
                    Some((_, escaped)) => content.push(escaped),
                    None => break,
                }
            } else {
                content.push(c);
            }
        }
        Err(Error::parse(
            ErrorKind::MissingTerminator,
            self.src.len(),
            format!("Expando is missing terminator: '{close}'"),
        ))
    }

    /// Parse a conditional whose predicate starts at `pos` and which ends at
    /// `close`.
    fn condition(&self, pos: usize, close: char) -> Result<(Node, usize)> {
        let (predicate, mut at) = self.predicate(pos)?;
        if !self.src[at..].starts_with('?') {
            return Err(Error::parse(
                ErrorKind::UnterminatedCondition,
                at,
                "Conditional expando is missing '?'",
            ));
        }
        let (if_true, next) = self.sequence(at + 1, &['&', close])?;
        at = next;
        let mut if_false = Vec::new();
        if self.src[at..].starts_with('&') {
            let (nodes, next) = self.sequence(at + 1, &[close])?;
            if_false = nodes;
            at = next;
        }
        if !self.src[at..].starts_with(close) {
            return Err(Error::parse(
                ErrorKind::UnterminatedCondition,
                at,
                format!("Conditional expando is missing '&' or '{close}'"),
            ));
        }
        let cond = Condition {
            predicate,
            if_true: repad(if_true),
            if_false: repad(if_false),
        };
        Ok((Node::Condition(Box::new(cond)), at + close.len_utf8()))
    }

    /// Parse the predicate of a conditional.
    fn predicate(&self, pos: usize) -> Result<(Node, usize)> {
        let (def, after) = self.resolve(pos)?;
        match def.hook {
            ParseHook::None => Ok((Node::CondBool(def), after)),
            ParseHook::Padding(_) => Err(Error::parse(
                ErrorKind::PaddingOutsideAllowed,
                pos,
                "Padding cannot be used as a condition",
            )),
            ParseHook::Date { .. } => {
                let Some((digits, unit, len)) = cond_date_head(&self.src[after..]) else {
                    return Err(Error::parse(
                        ErrorKind::BadDate,
                        after,
                        "Invalid date condition, expected a count and one of 'ymwdHMS'",
                    ));
                };
                let count = if digits.is_empty() {
                    1
                } else {
                    digits.parse::<u32>().map_err(|_| {
                        Error::parse(
                            ErrorKind::BadDate,
                            after,
                            format!("Invalid number: {digits}"),
                        )
                    })?
                };
                Ok((Node::CondDate { def, count, unit }, after + len))
            }
            ParseHook::Named { .. } => Err(Error::parse(
                ErrorKind::BadFormatSpec,
                pos,
                format!("%{} cannot be used as a condition", def.short),
            )),
        }
    }
}
