//! Numeric and message-number ranges.

use std::fmt;

/// Upper bound of a range with no maximum.
pub const UNBOUNDED: i64 = i64::MAX;

/// An inclusive range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Lower bound.
    pub min: i64,
    /// Upper bound, or [`UNBOUNDED`].
    pub max: i64,
}

impl Range {
    /// A range, with the bounds put in order.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Is `n` inside the range?
    pub fn contains(&self, n: i64) -> bool {
        n >= self.min && n <= self.max
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.max == UNBOUNDED {
            write!(f, "{}-", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Parse a leading integer: decimal, or hex with `0x`, with an optional sign.
/// Returns the value and the bytes consumed; `None` if there are no digits.
pub fn leading_int(s: &str) -> Option<(i64, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let neg = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };
    let hex = s[i..].starts_with("0x") || s[i..].starts_with("0X");
    let (radix, start) = if hex { (16, i + 2) } else { (10, i) };
    let len = s[start..]
        .bytes()
        .take_while(|b| (*b as char).is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let n = i64::from_str_radix(&s[start..start + len], radix).ok()?;
    Some((if neg { -n } else { n }, start + len))
}

/// Apply a `K` or `M` suffix at the start of `s`; returns the scaled value and
/// the suffix length.
fn suffix(n: i64, s: &str) -> (i64, usize) {
    match s.chars().next() {
        Some('k' | 'K') => (n.saturating_mul(1024), 1),
        Some('m' | 'M') => (n.saturating_mul(1_048_576), 1),
        _ => (n, 0),
    }
}

/// An unsigned number with an optional size suffix.
fn sized(s: &str) -> Option<(i64, usize)> {
    if s.starts_with(['-', '+']) {
        return None;
    }
    let (n, len) = leading_int(s)?;
    let (n, extra) = suffix(n, &s[len..]);
    Some((n, len + extra))
}

/// Parse a numeric range at the start of `s`: `N`, `N-M`, `-M`, `N-`, `<N`,
/// `>N`, with optional `K`/`M` suffixes and optional surrounding double
/// quotes. Returns the range and the bytes consumed.
pub fn parse_range(s: &str) -> Result<(Range, usize), String> {
    let mut pos = 0;
    let quoted = s.starts_with('"');
    if quoted {
        pos += 1;
    }
    let rest = &s[pos..];
    let range = if let Some(after) = rest.strip_prefix('<') {
        let (n, len) = sized(after).ok_or_else(|| format!("Invalid range: {rest}"))?;
        if n <= 0 {
            return Err(format!("Invalid range: {rest}"));
        }
        pos += 1 + len;
        Range { min: 0, max: n - 1 }
    } else if let Some(after) = rest.strip_prefix('>') {
        let (n, len) = sized(after).ok_or_else(|| format!("Invalid range: {rest}"))?;
        pos += 1 + len;
        Range {
            min: n.saturating_add(1),
            max: UNBOUNDED,
        }
    } else {
        let (min, len) = match rest.strip_prefix('-') {
            Some(_) => (0, 0),
            None => sized(rest).ok_or_else(|| format!("Invalid range: {rest}"))?,
        };
        pos += len;
        if s[pos..].starts_with('-') {
            pos += 1;
            match sized(&s[pos..]) {
                Some((max, len)) => {
                    pos += len;
                    Range::new(min, max)
                }
                None => Range {
                    min,
                    max: UNBOUNDED,
                },
            }
        } else {
            Range { min, max: min }
        }
    };
    if quoted && s[pos..].starts_with('"') {
        pos += 1;
    }
    Ok((range, pos))
}

/// The mailbox state a message range is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    /// Number of messages in the mailbox.
    pub count: usize,
    /// One-based number of the message under the cursor.
    pub current: Option<usize>,
}

/// One end of a message range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// `^`
    First,
    /// `$`
    Last,
    /// `.`
    Current,
    /// A number.
    Num(i64),
}

/// Why a message range failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRangeError {
    /// No form matched.
    Syntax,
    /// The range refers to the current message and there is none.
    NoCurrent,
}

/// Parse one slot; `signed` allows a leading `-` on numbers.
fn slot(s: &str, signed: bool) -> Option<(Slot, usize)> {
    let lead = s.len() - s.trim_start_matches([' ', '\t']).len();
    let t = &s[lead..];
    let (slot, len) = match t.chars().next()? {
        '^' => (Slot::First, 1),
        '$' => (Slot::Last, 1),
        '.' => (Slot::Current, 1),
        '-' if signed => {
            let (n, len) = sized(&t[1..])?;
            (Slot::Num(-n), len + 1)
        }
        _ => {
            let (n, len) = sized(t)?;
            (Slot::Num(n), len)
        }
    };
    Some((slot, lead + len))
}

/// Resolve a slot; `relative` numbers count from the current message.
fn resolve(slot: Option<Slot>, left: bool, relative: bool, cur: &Cursor) -> Result<i64, MessageRangeError> {
    let count = cur.count as i64;
    let current = || cur.current.map(|c| c as i64).ok_or(MessageRangeError::NoCurrent);
    Ok(match slot {
        None if left => 1,
        None => count,
        Some(Slot::First) => 1,
        Some(Slot::Last) => count,
        Some(Slot::Current) => current()?,
        Some(Slot::Num(n)) if relative => n + current()?,
        Some(Slot::Num(n)) => n,
    })
}

/// Parse a message range: `a,b` (numbers relative to the current message),
/// `a-b`, `<N`, `>N` or a single slot, where a slot is a number, `^` (first),
/// `$` (last) or `.` (current). A bare `0` means the current message.
pub fn parse_message_range(s: &str, cur: &Cursor) -> Result<(Range, usize), MessageRangeError> {
    let mut pos = 0;
    let quoted = s.starts_with('"');
    if quoted {
        pos += 1;
    }
    let (range, len) = message_range(&s[pos..], cur)?;
    pos += len;
    if quoted && s[pos..].starts_with('"') {
        pos += 1;
    }
    Ok((range, pos))
}

/// Parse the unquoted body of a message range.
fn message_range(s: &str, cur: &Cursor) -> Result<(Range, usize), MessageRangeError> {
    let trimmed = s.trim_start_matches([' ', '\t']);
    let lead = s.len() - trimmed.len();
    if let Some(after) = trimmed.strip_prefix('<') {
        let (n, len) = sized(after.trim_start()).ok_or(MessageRangeError::Syntax)?;
        let ws = after.len() - after.trim_start().len();
        return Ok((Range::new(1, n - 1), lead + 1 + ws + len));
    }
    if let Some(after) = trimmed.strip_prefix('>') {
        let (n, len) = sized(after.trim_start()).ok_or(MessageRangeError::Syntax)?;
        let ws = after.len() - after.trim_start().len();
        return Ok((Range::new(n + 1, cur.count as i64), lead + 1 + ws + len));
    }

    // Relative `a,b` first: its slots may carry a sign.
    let left = slot(s, true);
    let after_left = left.map_or(0, |(_, len)| len);
    if s[after_left..].starts_with(',') {
        return pair(s, left, after_left, true, cur);
    }
    let left = slot(s, false);
    let after_left = left.map_or(0, |(_, len)| len);
    if s[after_left..].starts_with('-') {
        return pair(s, left, after_left, false, cur);
    }
    let (slot, len) = left.ok_or(MessageRangeError::Syntax)?;
    let n = match slot {
        Slot::Num(0) => resolve(Some(Slot::Current), true, false, cur)?,
        other => resolve(Some(other), true, false, cur)?,
    };
    Ok((Range::new(n, n), len))
}

/// Finish a two-sided message range whose separator sits at `sep`.
fn pair(
    s: &str,
    left: Option<(Slot, usize)>,
    sep: usize,
    relative: bool,
    cur: &Cursor,
) -> Result<(Range, usize), MessageRangeError> {
    let right = slot(&s[sep + 1..], relative);
    let min = resolve(left.map(|l| l.0), true, relative, cur)?;
    let max = resolve(right.map(|r| r.0), false, relative, cur)?;
    let end = sep + 1 + right.map_or(0, |(_, len)| len);
    Ok((Range::new(min, max), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> (i64, i64, usize) {
        let (r, len) = parse_range(s).unwrap();
        (r.min, r.max, len)
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(range("10"), (10, 10, 2));
        assert_eq!(range("10-20 x"), (10, 20, 5));
        assert_eq!(range("-20"), (0, 20, 3));
        assert_eq!(range("10-"), (10, UNBOUNDED, 3));
        assert_eq!(range("<10"), (0, 9, 3));
        assert_eq!(range(">10"), (11, UNBOUNDED, 3));
        assert_eq!(range("1K-2M"), (1024, 2_097_152, 5));
        assert_eq!(range("\"5-6\""), (5, 6, 5));
        assert_eq!(range("0x10"), (16, 16, 4));
        assert_eq!(range("20-10"), (10, 20, 5));
        assert!(parse_range("abc").is_err());
        assert!(parse_range("<0").is_err());
    }

    #[test]
    fn contains_respects_unbounded() {
        let r = Range {
            min: 5,
            max: UNBOUNDED,
        };
        assert!(r.contains(i64::MAX - 1));
        assert!(!r.contains(4));
        assert_eq!(r.to_string(), "5-");
    }

    fn msgs(s: &str, current: Option<usize>) -> Result<(i64, i64), MessageRangeError> {
        let cur = Cursor { count: 50, current };
        parse_message_range(s, &cur).map(|(r, _)| (r.min, r.max))
    }

    #[test]
    fn message_forms() {
        assert_eq!(msgs("3-7", None), Ok((3, 7)));
        assert_eq!(msgs("-7", None), Ok((1, 7)));
        assert_eq!(msgs("40-", None), Ok((40, 50)));
        assert_eq!(msgs("^-$", None), Ok((1, 50)));
        assert_eq!(msgs("<5", None), Ok((1, 4)));
        assert_eq!(msgs(">45", None), Ok((46, 50)));
        assert_eq!(msgs("12", None), Ok((12, 12)));
        assert_eq!(msgs(".", Some(9)), Ok((9, 9)));
        assert_eq!(msgs("0", Some(9)), Ok((9, 9)));
        assert_eq!(msgs("-2,3", Some(10)), Ok((8, 13)));
        assert_eq!(msgs(",", Some(10)), Ok((1, 50)));
        assert_eq!(msgs(".-$", Some(10)), Ok((10, 50)));
        assert_eq!(msgs("9-2", None), Ok((2, 9)));
    }

    #[test]
    fn message_forms_that_need_a_cursor() {
        assert_eq!(msgs(".", None), Err(MessageRangeError::NoCurrent));
        assert_eq!(msgs("1,2", None), Err(MessageRangeError::NoCurrent));
        assert_eq!(msgs("0", None), Err(MessageRangeError::NoCurrent));
        assert_eq!(msgs("x", None), Err(MessageRangeError::Syntax));
    }
}
