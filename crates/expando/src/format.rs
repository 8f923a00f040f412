//! The `%-15.20_` style prefix of a directive.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// Widths at or beyond this are rejected.
const WIDTH_LIMIT: usize = 65535;

/// How a field is aligned inside its minimum width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Justify {
    /// Text first, then padding.
    Left,
    /// Padding split around the text, extra cell on the right.
    Center,
    /// Padding first, then text.
    Right,
}

/// Width, alignment and case shaping for one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSpec {
    /// Minimum width in cells.
    pub min_cols: usize,
    /// Maximum width in cells; `None` means unbounded.
    pub max_cols: Option<usize>,
    /// Explicit alignment; `None` lets the field's kind decide.
    pub justify: Option<Justify>,
    /// Leading character for numbers, `' '` or `'0'`.
    pub leader: char,
    /// Lower-case the field after shaping.
    pub lower: bool,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            min_cols: 0,
            max_cols: None,
            justify: None,
            leader: ' ',
            lower: false,
        }
    }
}

impl FormatSpec {
    /// Precision used when printing a number under this spec.
    ///
    /// The maximum width doubles as the digit count; failing that, a `0`
    /// leader pads to the minimum width.
    pub(crate) fn precision(&self) -> Option<usize> {
        match self.max_cols {
            Some(max) => Some(max),
            None if self.leader == '0' => Some(self.min_cols),
            None => None,
        }
    }
}

impl fmt::Display for FormatSpec {
    /// Write the prefix back in source form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.justify {
            Some(Justify::Left) => f.write_str("-")?,
            Some(Justify::Center) => f.write_str("=")?,
            Some(Justify::Right) | None => {}
        }
        // A non-zero precision implies the zero leader.
        if self.leader == '0' && self.max_cols.is_none_or(|m| m == 0) {
            f.write_str("0")?;
        }
        if self.min_cols > 0 {
            write!(f, "{}", self.min_cols)?;
        }
        if let Some(max) = self.max_cols {
            write!(f, ".{max}")?;
        }
        if self.lower {
            f.write_str("_")?;
        }
        Ok(())
    }
}

/// Read a run of ASCII digits starting at byte `at`.
fn digits(src: &str, at: usize) -> Result<(Option<usize>, usize)> {
    let run = src[at..].bytes().take_while(u8::is_ascii_digit).count();
    if run == 0 {
        return Ok((None, at));
    }
    let text = &src[at..at + run];
    match text.parse::<usize>() {
        Ok(n) if n < WIDTH_LIMIT => Ok((Some(n), at + run)),
        _ => Err(Error::parse(
            ErrorKind::BadFormatSpec,
            at,
            format!("Invalid number: {text}"),
        )),
    }
}

/// Parse a format prefix starting at byte `at` of `src`.
///
/// Returns the spec (or `None` when every setting is the default) and the
/// offset of the first byte after it.
pub fn parse_format(src: &str, at: usize) -> Result<(Option<FormatSpec>, usize)> {
    let bytes = src.as_bytes();
    let mut pos = at;
    let mut spec = FormatSpec::default();

    match bytes.get(pos) {
        Some(b'-') => {
            spec.justify = Some(Justify::Left);
            pos += 1;
        }
        Some(b'=') => {
            spec.justify = Some(Justify::Center);
            pos += 1;
        }
        _ => {}
    }

    if bytes.get(pos) == Some(&b'0') {
        if spec.justify != Some(Justify::Left) {
            spec.leader = '0';
        }
        pos += 1;
    }

    let (min, next) = digits(src, pos)?;
    spec.min_cols = min.unwrap_or(0);
    pos = next;

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let (max, next) = digits(src, pos)?;
        pos = next;
        match max {
            Some(m) => {
                spec.max_cols = Some(m);
                spec.leader = if m > 0 { '0' } else { ' ' };
            }
            None => {
                spec.max_cols = Some(0);
                spec.leader = ' ';
            }
        }
    }

    if bytes.get(pos) == Some(&b'_') {
        spec.lower = true;
        pos += 1;
    }

    if spec == FormatSpec::default() {
        Ok((None, pos))
    } else {
        Ok((Some(spec), pos))
    }
}
