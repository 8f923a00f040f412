//! Plain search words.
//!
//! A search like `bob` is not a pattern. It is quoted and dropped into a
//! template such as `~f %s | ~s %s` before compiling; a handful of old
//! keywords map straight to flag tests.

/// Template used when searching the address book.
pub const ALIAS_SIMPLE_SEARCH: &str = "~f %s | ~t %s | ~c %s";

/// Keywords that stand for a flag test, compared without case.
const KEYWORDS: &[(&str, &str)] = &[
    ("all", "~A"),
    ("del", "~D"),
    ("flag", "~F"),
    ("new", "~N"),
    ("old", "~O"),
    ("repl", "~Q"),
    ("read", "~R"),
    ("tag", "~T"),
    ("unread", "~U"),
];

/// Does `input` use pattern syntax outside a backslash escape?
fn is_pattern(input: &str) -> bool {
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let _ignored = chars.next();
            }
            '~' | '=' | '%' => return true,
            _ => {}
        }
    }
    false
}

/// Double-quote `s`, escaping `\` and `"`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Substitute `arg` for every `%s` in `template`; `%%` is a literal `%`.
/// Without a `%s`, `arg` is appended after a space.
fn fill(template: &str, arg: &str) -> String {
    let mut out = String::with_capacity(template.len() + arg.len());
    let mut found = false;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                out.push('%');
                chars.next();
            }
            Some('s') => {
                out.push_str(arg);
                found = true;
                chars.next();
            }
            _ => out.push('%'),
        }
    }
    if !found {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

/// Turn a search string into a pattern.
///
/// Input that already uses `~`, `=` or `%` is returned unchanged. Otherwise
/// `all`, `^` and `.` become `~A`, the keywords `del flag new old repl read
/// tag unread` become their flag test, and anything else is quoted into
/// `template`.
pub fn expand_simple(input: &str, template: &str) -> String {
    if is_pattern(input) {
        return input.to_string();
    }
    if input == "^" || input == "." {
        return "~A".to_string();
    }
    if let Some((_, pattern)) = KEYWORDS.iter().find(|(k, _)| k.eq_ignore_ascii_case(input)) {
        return (*pattern).to_string();
    }
    fill(template, &quote(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(expand_simple("ALL", "~s %s"), "~A");
        assert_eq!(expand_simple(".", "~s %s"), "~A");
        assert_eq!(expand_simple("Unread", "~s %s"), "~U");
        assert_eq!(expand_simple("repl", "~s %s"), "~Q");
    }

    #[test]
    fn patterns_pass_through() {
        assert_eq!(expand_simple("~f bob", "~s %s"), "~f bob");
        assert_eq!(expand_simple("50%", "~s %s"), "50%");
        assert_eq!(expand_simple("a\\~b", "~s %s"), "~s \"a\\\\~b\"");
    }

    #[test]
    fn words_fill_the_template() {
        assert_eq!(
            expand_simple("bob", ALIAS_SIMPLE_SEARCH),
            "~f \"bob\" | ~t \"bob\" | ~c \"bob\""
        );
        assert_eq!(expand_simple("say \"hi\"", "~s %s"), "~s \"say \\\"hi\\\"\"");
        assert_eq!(expand_simple("bob", "100%% ~f"), "100% ~f \"bob\"");
    }
}
