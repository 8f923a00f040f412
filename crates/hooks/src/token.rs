//! Splitting rc-file command lines into words.

/// Translate the character after a backslash.
fn escaped(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'e' => '\x1b',
        other => other,
    }
}

/// Split a line into commands at unquoted `;`. Empty commands are dropped.
pub fn split_commands(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote = None;
    let mut escape = false;
    let mut end = line.len();
    for (i, c) in line.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match (c, quote) {
            ('\\', Some('\'')) => {}
            ('\\', _) => escape = true,
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('#', None) => {
                end = i;
                break;
            }
            (';', None) => {
                out.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(line[start..end].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// A command line being consumed word by word.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    /// What has not been consumed yet.
    rest: &'a str,
}

impl<'a> Line<'a> {
    /// Start at the beginning of `s`.
    pub fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    /// Drop leading blanks.
    fn skip_blanks(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Is there another word before the end or a comment?
    pub fn more(&mut self) -> bool {
        self.skip_blanks();
        !self.rest.is_empty() && !self.rest.starts_with('#')
    }

    /// Consume `c` if it is the next non-blank character.
    pub fn eat(&mut self, c: char) -> bool {
        self.skip_blanks();
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// The unconsumed text.
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// Consume one word. Double quotes allow backslash escapes, single
    /// quotes are literal and an unquoted `#` starts a comment. With
    /// `keep_spaces` the word runs to the end of the line with unquoted
    /// trailing blanks trimmed.
    pub fn word(&mut self, keep_spaces: bool) -> Result<String, String> {
        self.skip_blanks();
        let mut out = String::new();
        let mut chars = self.rest.char_indices();
        let mut end = self.rest.len();
        let mut keep = 0;
        while let Some((i, c)) = chars.next() {
            match c {
                c if c.is_whitespace() && !keep_spaces => {
                    end = i;
                    break;
                }
                '#' => {
                    end = i;
                    break;
                }
                '\\' => {
                    if let Some((_, next)) = chars.next() {
                        out.push(escaped(next));
                    }
                    keep = out.len();
                }
                '"' | '\'' => {
                    let quote = c;
                    loop {
                        match chars.next() {
                            Some((_, q)) if q == quote => break,
                            Some((_, '\\')) if quote == '"' => {
                                if let Some((_, next)) = chars.next() {
                                    out.push(escaped(next));
                                }
                            }
                            Some((_, other)) => out.push(other),
                            None => return Err(format!("mismatched quotes: {}", self.rest)),
                        }
                    }
                    keep = out.len();
                }
                other => {
                    out.push(other);
                    if !other.is_whitespace() {
                        keep = out.len();
                    }
                }
            }
        }
        if keep_spaces {
            out.truncate(keep);
        }
        self.rest = &self.rest[end..];
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        let mut line = Line::new(s);
        let mut out = Vec::new();
        while line.more() {
            out.push(line.word(false).unwrap());
        }
        out
    }

    #[test]
    fn splits_and_unquotes() {
        assert_eq!(words("a  'b c' \"d\\te\""), vec!["a", "b c", "d\te"]);
        assert_eq!(words("x\\ y z # comment"), vec!["x y", "z"]);
        assert_eq!(words("'\\.gz$' \"gzip %t > %f\""), vec!["\\.gz$", "gzip %t > %f"]);
        assert!(Line::new("'open").word(false).is_err());
    }

    #[test]
    fn rest_of_line() {
        let mut line = Line::new(". set sort=threads; set x=1  ");
        assert_eq!(line.word(false).unwrap(), ".");
        assert_eq!(line.word(true).unwrap(), "set sort=threads; set x=1");
        assert!(!line.more());

        let mut line = Line::new("'set sort=threads' # why");
        assert_eq!(line.word(true).unwrap(), "set sort=threads");
        let mut line = Line::new("'a ' ");
        assert_eq!(line.word(true).unwrap(), "a ");
    }

    #[test]
    fn command_separators() {
        assert_eq!(split_commands("set a=1; set b='x;y' ;; push q"), vec!["set a=1", "set b='x;y'", "push q"]);
        assert_eq!(split_commands("echo a\\;b # c; d"), vec!["echo a\\;b"]);
        assert!(split_commands("  # nothing").is_empty());
    }

    #[test]
    fn eat_marks() {
        let mut line = Line::new("  !~s x");
        assert!(line.eat('!'));
        assert!(!line.eat('!'));
        assert_eq!(line.word(false).unwrap(), "~s");
    }
}
