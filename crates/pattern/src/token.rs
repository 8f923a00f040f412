//! Splitting an operator argument off the pattern string.

/// Characters that end an unquoted argument.
const STOP: &[char] = &['~', '%', '=', '!', '|', ';'];

/// Extract one argument token from the start of `s`.
///
/// Unquoted tokens end at whitespace or one of `~ % = ! | ;`. Single quotes
/// are literal, double quotes allow backslash escapes, and a backslash outside
/// quotes takes the next character literally (`\n`, `\t`, `\r` and `\e` are
/// control characters). Returns the token and the bytes consumed; `None` for
/// an unterminated quote.
pub fn extract(s: &str) -> Option<(String, usize)> {
    let mut out = String::new();
    let mut quote: Option<char> = None;
    let mut chars = s.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        if quote.is_none() && (c.is_whitespace() || STOP.contains(&c)) {
            return Some((out, i));
        }
        chars.next();
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (Some('\''), c) => out.push(c),
            (_, '\\') => {
                let (_, next) = chars.next()?;
                out.push(match next {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    'e' | 'E' => '\x1b',
                    other => other,
                });
            }
            (_, c) => out.push(c),
        }
    }
    quote.is_none().then_some((out, s.len()))
}
