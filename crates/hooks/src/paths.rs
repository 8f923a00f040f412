//! Mailbox shortcuts and folder names derived from addresses.

use maildata::Address;

use crate::config::HookConfig;

/// Expand `~` at the start of `s`.
fn expand_home(s: &str, cfg: &HookConfig) -> String {
    match (s.strip_prefix('~'), &cfg.home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => format!("{home}{rest}"),
        _ => s.to_string(),
    }
}

/// Join a directory and a name with one `/`.
pub fn concat_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Split a leading mailbox shortcut from `s`: returns what it expands to
/// and the rest.
fn shortcut<'a>(s: &'a str, cfg: &HookConfig) -> Option<(String, &'a str)> {
    let mut chars = s.chars();
    let first = chars.next()?;
    let rest = chars.as_str();
    let target = match first {
        '=' | '+' => {
            let folder = expand_home(&cfg.folder, cfg);
            if folder.is_empty() || folder.ends_with('/') {
                folder
            } else {
                format!("{folder}/")
            }
        }
        '^' => cfg.current_folder.clone()?,
        '<' => expand_home(&cfg.record, cfg),
        '!' if rest.is_empty() => cfg.spool.clone(),
        '~' if rest.is_empty() || rest.starts_with('/') => cfg.home.clone()?,
        _ => return None,
    };
    Some((target, rest))
}

/// Expand mailbox shortcuts (`= + ^ < ! ~`) at the start of a path.
pub fn expand_path(s: &str, cfg: &HookConfig) -> String {
    match shortcut(s, cfg) {
        Some((target, rest)) => format!("{target}{rest}"),
        None => s.to_string(),
    }
}

/// Expand mailbox shortcuts in a folder selector. With `regex`, the
/// expansion is escaped so it matches literally while the rest stays a
/// regex.
pub fn expand_path_regex(s: &str, cfg: &HookConfig, regex: bool) -> String {
    match shortcut(s, cfg) {
        Some((target, rest)) if regex => format!("{}{rest}", regex::escape(&target)),
        Some((target, rest)) => format!("{target}{rest}"),
        None => s.to_string(),
    }
}

/// Collapse the folder directory back to `=`.
pub fn pretty_mailbox(path: &str, cfg: &HookConfig) -> String {
    let folder = expand_home(&cfg.folder, cfg);
    let folder = folder.trim_end_matches('/');
    if !folder.is_empty()
        && let Some(rest) = path.strip_prefix(folder)
        && let Some(name) = rest.strip_prefix('/')
        && !name.is_empty()
    {
        return format!("={name}");
    }
    match &cfg.home {
        Some(home) if !home.is_empty() => match path.strip_prefix(home.as_str()) {
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => path.to_string(),
        },
        _ => path.to_string(),
    }
}

/// A folder name for `addr`: the local part (or the whole address with
/// `save_address`), lower-cased, with `/`, blanks and control characters
/// replaced by `_`.
pub fn safe_path(addr: &Address, save_address: bool) -> String {
    let mailbox = if save_address {
        addr.mailbox.as_str()
    } else {
        addr.mailbox
            .split(['%', '@'])
            .next()
            .unwrap_or_default()
    };
    mailbox
        .to_lowercase()
        .chars()
        .map(|c| if c == '/' || c.is_whitespace() || c.is_control() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> HookConfig {
        HookConfig {
            folder: "~/Mail".into(),
            record: "=sent".into(),
            home: Some("/home/me".into()),
            current_folder: Some("/home/me/Mail/inbox".into()),
            ..HookConfig::default()
        }
    }

    #[test]
    fn shortcuts() {
        let c = cfg();
        assert_eq!(expand_path("=lists/dev", &c), "/home/me/Mail/lists/dev");
        assert_eq!(expand_path("+work", &c), "/home/me/Mail/work");
        assert_eq!(expand_path("^", &c), "/home/me/Mail/inbox");
        assert_eq!(expand_path("~/x", &c), "/home/me/x");
        assert_eq!(expand_path("/abs", &c), "/abs");
        assert_eq!(expand_path("~bob/x", &c), "~bob/x");
        assert_eq!(expand_path_regex("=a.b", &c, true), "/home/me/Mail/a.b");
        assert_eq!(expand_path_regex("^.*", &c, true), "/home/me/Mail/inbox.*");
        assert_eq!(expand_path_regex("=x.y", &HookConfig { folder: "/m.d".into(), ..c }, true), "/m\\.d/x.y");
    }

    #[test]
    fn pretty_and_safe() {
        let c = cfg();
        assert_eq!(pretty_mailbox("/home/me/Mail/bob", &c), "=bob");
        assert_eq!(pretty_mailbox("/home/me/sent", &c), "~/sent");
        assert_eq!(pretty_mailbox("/var/mail/me", &c), "/var/mail/me");
        let addr = Address::with_personal("Bob", "Bob.Smith@Example.com");
        assert_eq!(safe_path(&addr, false), "bob.smith");
        assert_eq!(safe_path(&addr, true), "bob.smith@example.com");
        assert_eq!(safe_path(&Address::new("a/b c@x"), false), "a_b_c");
    }
}
