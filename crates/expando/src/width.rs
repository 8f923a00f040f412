//! Display-width helpers.
//!
//! Every width here is measured in terminal cells, not bytes or chars, so that
//! wide CJK characters and zero-width combining marks are accounted for.

use unicode_width::UnicodeWidthChar;

use crate::format::Justify;

/// Number of terminal cells `s` occupies, counted glyph by glyph so it
/// always agrees with [`truncate`].
pub fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Cells occupied by a single char; control chars count as zero.
fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Longest prefix of `s` that fits in `cols` cells, and its width.
pub fn truncate(s: &str, cols: usize) -> (&str, usize) {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = char_width(c);
        if used + w > cols {
            return (&s[..i], used);
        }
        used += w;
    }
    (s, used)
}

/// Longest suffix of `s` that fits in `cols` cells, and its width.
pub fn truncate_left(s: &str, cols: usize) -> (&str, usize) {
    let total = str_width(s);
    if total <= cols {
        return (s, total);
    }
    let mut dropped = 0;
    for (i, c) in s.char_indices() {
        let w = char_width(c);
        // Zero-width chars at the cut belong to the dropped glyph.
        if total - dropped <= cols && w > 0 {
            return (&s[i..], total - dropped);
        }
        dropped += w;
    }
    ("", 0)
}

/// Fill `cols` cells by repeating `unit`, topping up with spaces when a whole
/// unit no longer fits.
pub fn fill(unit: &str, cols: usize) -> String {
    let mut out = String::new();
    let uw = str_width(unit);
    let mut used = 0;
    if uw > 0 {
        while used + uw <= cols {
            out.push_str(unit);
            used += uw;
        }
    }
    out.push_str(&" ".repeat(cols - used));
    out
}

/// Shape `text` into a field: cut to `max` cells, then pad with spaces to
/// `min` cells according to `justify`. Returns the field and its width.
pub fn shape(text: &str, min: usize, max: usize, justify: Justify) -> (String, usize) {
    let min = min.min(max);
    let (cut, w) = truncate(text, max);
    if w >= min {
        return (cut.to_string(), w);
    }
    let gap = min - w;
    let (before, after) = match justify {
        Justify::Left => (0, gap),
        Justify::Right => (gap, 0),
        Justify::Center => (gap / 2, gap - gap / 2),
    };
    let mut out = String::with_capacity(cut.len() + gap);
    out.push_str(&" ".repeat(before));
    out.push_str(cut);
    out.push_str(&" ".repeat(after));
    (out, min)
}
