//! Parsers for the `*-hook` and `unhook` commands.
//!
//! Each parser takes the arguments after the command name and returns the
//! records to insert; the registry decides whether they are new.

use std::path::Path;

use expando::{
    Expando,
    domain::{compress::{self, COMPRESS_FORMAT}, index::INDEX_FORMAT},
};
use maildata::Clock;
use pattern::{CompileFlags, Scope};
use regex::RegexBuilder;

use crate::{
    charset::LookupKind,
    config::HookConfig,
    error::{Error, Result},
    kind::{HookType, hook_type},
    paths::{expand_path, expand_path_regex},
    registry::{Hook, Selector},
    token::Line,
};

/// What a parser needs to know besides the arguments.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Settings: `default_hook`, mailbox shortcuts.
    pub config: &'a HookConfig,
    /// Resolves relative dates in selector patterns.
    pub clock: &'a dyn Clock,
    /// Directory of the file being sourced.
    pub source_dir: Option<&'a Path>,
}

/// What `unhook` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhookTarget {
    /// `unhook *`.
    All,
    /// One hook type.
    Kind(HookType),
}

/// Read one word, turning quoting errors into syntax errors.
fn word(line: &mut Line<'_>, keep_spaces: bool) -> Result<String> {
    line.word(keep_spaces).map_err(Error::Syntax)
}

/// Read a word that must be followed by more arguments.
fn leading(line: &mut Line<'_>, name: &str) -> Result<String> {
    let w = word(line, false)?;
    if !line.more() {
        return Err(Error::too_few(name));
    }
    Ok(w)
}

/// Read the final argument.
fn trailing(line: &mut Line<'_>, name: &str, keep_spaces: bool) -> Result<String> {
    let w = word(line, keep_spaces)?;
    if w.is_empty() {
        return Err(Error::too_few(name));
    }
    if line.more() {
        return Err(Error::too_many(name));
    }
    Ok(w)
}

/// Compile a regex selector.
fn regex(src: &str, ignore_case: bool) -> Result<Selector> {
    RegexBuilder::new(src)
        .case_insensitive(ignore_case)
        .build()
        .map(Selector::Regex)
        .map_err(|e| Error::BadRegex {
            regex: src.to_string(),
            message: e.to_string(),
        })
}

/// Turn a plain word into a pattern using `default_hook`.
fn simple(src: &str, cfg: &HookConfig) -> String {
    match &cfg.default_hook {
        Some(template) => pattern::expand_simple(src, template),
        None => src.to_string(),
    }
}

/// Compile a pattern selector for hooks of type `kind`.
fn compile(src: &str, kind: HookType, ctx: &Context<'_>) -> Result<Selector> {
    let flags = kind.compile_flags().unwrap_or_default();
    let p = pattern::compile(src, flags, &Scope::new(ctx.clock))?;
    Ok(Selector::Pattern(Box::new(p)))
}

/// Expand mailbox shortcuts in a folder selector. `-noregex` selectors
/// match the whole path literally.
fn folder_regex(src: &str, use_regex: bool, cfg: &HookConfig) -> Result<String> {
    if src.starts_with('^') && cfg.current_folder.is_none() {
        return Err(Error::ShortcutNotSet);
    }
    let expanded = expand_path_regex(src, cfg, use_regex);
    if expanded.is_empty() && !src.is_empty() {
        return Err(Error::EmptyRegex);
    }
    Ok(if use_regex {
        expanded
    } else {
        format!("^{}$", regex::escape(&expanded))
    })
}

/// Stamp the source directory onto a new record.
fn finish(mut hook: Hook, ctx: &Context<'_>) -> Hook {
    hook.source_dir = ctx.source_dir.map(Path::to_path_buf);
    hook
}

/// Parse the arguments of any `*-hook` command except `charset-hook`,
/// `iconv-hook` and `index-format-hook`.
///
/// Returns one record per type; `fcc-save-hook` yields two.
pub fn parse_hook(kind: HookType, args: &str, ctx: &Context<'_>) -> Result<Vec<Hook>> {
    let name = kind.command_name();
    let mut line = Line::new(args);
    if kind.contains(HookType::GLOBAL) {
        let command = trailing(&mut line, name, true)?;
        let hook = Hook::new(kind, "", false, Selector::Always, &command);
        return Ok(vec![finish(hook, ctx)]);
    }
    if !line.more() {
        return Err(Error::too_few(name));
    }

    let not = line.eat('!');
    let mut src = leading(&mut line, name)?;
    let mut use_regex = true;
    if kind.selects_folders() && src == "-noregex" {
        use_regex = false;
        src = leading(&mut line, name)?;
    }
    let payload = trailing(&mut line, name, kind.command_keeps_spaces())?;

    if kind.intersects(HookType::FCC | HookType::SAVE) {
        let src = simple(&src, ctx.config);
        let mailbox = expand_path(&payload, ctx.config);
        let expando = Expando::parse(&mailbox, INDEX_FORMAT)?;
        return [HookType::FCC, HookType::SAVE]
            .into_iter()
            .filter(|t| kind.contains(*t))
            .map(|t| {
                let mut hook = Hook::new(t, &src, not, compile(&src, t, ctx)?, &mailbox);
                hook.expando = Some(expando.clone());
                Ok(finish(hook, ctx))
            })
            .collect();
    }

    let hook = if kind.intersects(HookType::PATTERN) {
        let src = simple(&src, ctx.config);
        Hook::new(kind, &src, not, compile(&src, kind, ctx)?, &payload)
    } else if kind.selects_folders() {
        let src = folder_regex(&src, use_regex, ctx.config)?;
        let selector = regex(&src, false)?;
        if kind == HookType::MBOX {
            let mailbox = expand_path(&payload, ctx.config);
            let mut hook = Hook::new(kind, &src, not, selector, &mailbox);
            hook.expando = Some(Expando::parse(&mailbox, INDEX_FORMAT)?);
            hook
        } else {
            Hook::new(kind, &src, not, selector, &payload)
        }
    } else if kind.intersects(HookType::COMPRESS) {
        let command = Expando::parse(&payload, COMPRESS_FORMAT).map_err(|_| Error::BadlyFormattedCommand)?;
        if !compress::valid_command(&command) {
            return Err(Error::BadlyFormattedCommand);
        }
        let mut hook = Hook::new(kind, &src, not, regex(&src, false)?, &payload);
        hook.expando = Some(command);
        hook
    } else {
        let ignore_case = kind == HookType::CRYPT;
        Hook::new(kind, &src, not, regex(&src, ignore_case)?, &payload)
    };
    Ok(vec![finish(hook, ctx)])
}

/// Parse `index-format-hook NAME [!]PATTERN FORMAT`. Returns the slot name
/// and the record.
pub fn parse_index_format_hook(args: &str, ctx: &Context<'_>) -> Result<(String, Hook)> {
    let name = HookType::INDEX_FORMAT.command_name();
    let mut line = Line::new(args);
    if !line.more() {
        return Err(Error::too_few(name));
    }
    let slot = word(&mut line, false)?;
    let not = line.eat('!');
    let src = leading(&mut line, name)?;
    let fmt = word(&mut line, false)?;
    let expando = Expando::parse(&fmt, INDEX_FORMAT)?;
    if line.more() {
        return Err(Error::too_many(name));
    }

    let src = simple(&src, ctx.config);
    // Dates are resolved at match time so that `<1d` means the last day
    // relative to when the index is drawn.
    let p = pattern::compile(&src, CompileFlags::FULL_MSG | CompileFlags::DYNAMIC, &Scope::new(ctx.clock))?;
    let mut hook = Hook::new(HookType::INDEX_FORMAT, &src, not, Selector::Pattern(Box::new(p)), &fmt);
    hook.expando = Some(expando);
    Ok((slot, finish(hook, ctx)))
}

/// Parse `charset-hook ALIAS CHARSET` or `iconv-hook CHARSET LOCAL`.
pub fn parse_charset_hook(kind: HookType, args: &str) -> Result<(LookupKind, String, String)> {
    let name = kind.command_name();
    let mut line = Line::new(args);
    let alias = word(&mut line, false)?;
    let charset = word(&mut line, false)?;
    if alias.is_empty() || charset.is_empty() {
        return Err(Error::too_few(name));
    }
    if line.more() {
        return Err(Error::too_many(name));
    }
    let lookup = if kind == HookType::ICONV {
        LookupKind::Iconv
    } else {
        LookupKind::Charset
    };
    Ok((lookup, alias, charset))
}

/// Parse `unhook { * | TYPE } ...`.
pub fn parse_unhook(args: &str) -> Result<Vec<UnhookTarget>> {
    let mut line = Line::new(args);
    if !line.more() {
        return Err(Error::too_few("unhook"));
    }
    let mut targets = Vec::new();
    while line.more() {
        let token = word(&mut line, false)?;
        if token == "*" {
            targets.push(UnhookTarget::All);
        } else {
            let kind = hook_type(&token).ok_or(Error::UnknownHookType(token))?;
            targets.push(UnhookTarget::Kind(kind));
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use maildata::FixedClock;

    use super::*;

    fn with<T>(cfg: &HookConfig, f: impl FnOnce(&Context<'_>) -> T) -> T {
        let clock = FixedClock::at(1_704_164_645);
        let ctx = Context {
            config: cfg,
            clock: &clock,
            source_dir: Some(Path::new("/etc/mail")),
        };
        f(&ctx)
    }

    fn one(kind: HookType, args: &str) -> Result<Hook> {
        let cfg = HookConfig {
            home: Some("/home/me".into()),
            ..HookConfig::default()
        };
        with(&cfg, |ctx| parse_hook(kind, args, ctx)).map(|mut v| v.remove(0))
    }

    #[test]
    fn folder_selectors() {
        let h = one(HookType::FOLDER, "-noregex work 'set sort=threads'").unwrap();
        assert_eq!(h.source, "^work$");
        assert_eq!(h.command, "set sort=threads");
        assert_eq!(h.source_dir.as_deref(), Some(Path::new("/etc/mail")));
        assert!(h.matches_text("work"));
        assert!(!h.matches_text("works/"));

        let h = one(HookType::FOLDER, "=lists push <limit>").unwrap();
        assert_eq!(h.source, "/home/me/Mail/lists");
        assert_eq!(h.command, "push <limit>");

        let h = one(HookType::FOLDER, "! . set x").unwrap();
        assert!(h.not);
        assert!(!h.matches_text("anything"));

        assert!(matches!(one(HookType::FOLDER, "^ set x"), Err(Error::ShortcutNotSet)));
        assert!(matches!(one(HookType::FOLDER, "( set x"), Err(Error::BadRegex { .. })));
        let empty = HookConfig {
            spool: String::new(),
            ..HookConfig::default()
        };
        assert!(matches!(
            with(&empty, |ctx| parse_hook(HookType::FOLDER, "! ! set x", ctx)),
            Err(Error::EmptyRegex)
        ));
    }

    #[test]
    fn argument_counts() {
        let err = one(HookType::FOLDER, "").unwrap_err();
        assert_eq!(err.to_string(), "folder-hook: too few arguments");
        assert!(err.is_warning());
        assert_eq!(
            one(HookType::CRYPT, "bob@ 0x1 0x2").unwrap_err().to_string(),
            "crypt-hook: too many arguments"
        );
        assert_eq!(
            one(HookType::STARTUP | HookType::GLOBAL, "").unwrap_err().to_string(),
            "startup-hook: too few arguments"
        );
        assert!(matches!(one(HookType::SEND, "'~f x"), Err(Error::Syntax(_))));
    }

    #[test]
    fn message_selectors() {
        let h = one(HookType::MESSAGE, "bob 'set pager_stop'").unwrap();
        assert_eq!(h.source, r#"~f "bob" !~P | (~P ~C "bob")"#);
        assert!(matches!(h.selector, Selector::Pattern(_)));

        // Body searches need the full message.
        assert!(one(HookType::MESSAGE, "'~b x' 'set a'").is_ok());
        assert!(matches!(one(HookType::SEND, "'~b x' 'set a'"), Err(Error::Pattern(_))));

        let cfg = HookConfig::default();
        let both = with(&cfg, |ctx| parse_hook(HookType::FCC | HookType::SAVE, "~A =all", ctx)).unwrap();
        let kinds: Vec<_> = both.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, [HookType::FCC, HookType::SAVE]);
        assert!(both.iter().all(|h| h.command == "~/Mail/all" && h.expando.is_some()));
    }

    #[test]
    fn compress_commands() {
        let h = one(HookType::APPEND, r#"'\.gz$' "gzip %t > %f""#).unwrap();
        assert!(h.matches_text("box.gz"));
        assert!(!h.matches_text("box.gzip"));
        assert!(matches!(
            one(HookType::APPEND, r#"'\.gz$' "gzip %t > out""#),
            Err(Error::BadlyFormattedCommand)
        ));
        assert!(matches!(
            one(HookType::OPEN, r#"'\.gz$' "gzip %f""#),
            Err(Error::BadlyFormattedCommand)
        ));
    }

    #[test]
    fn index_format_and_charsets() {
        let cfg = HookConfig::default();
        let (slot, hook) = with(&cfg, |ctx| parse_index_format_hook("date '~d<1d' '%[%H:%M]'", ctx)).unwrap();
        assert_eq!(slot, "date");
        assert_eq!(hook.expando.unwrap().source(), "%[%H:%M]");
        assert!(with(&cfg, |ctx| parse_index_format_hook("date", ctx)).is_err());

        assert_eq!(
            parse_charset_hook(HookType::CHARSET, "x-unknown utf-8").unwrap(),
            (LookupKind::Charset, "x-unknown".to_string(), "utf-8".to_string())
        );
        assert!(parse_charset_hook(HookType::ICONV, "one").unwrap_err().is_warning());
        assert!(parse_charset_hook(HookType::ICONV, "a b c").is_err());
    }

    #[test]
    fn unhook_targets() {
        assert_eq!(
            parse_unhook("* folder-hook").unwrap(),
            [UnhookTarget::All, UnhookTarget::Kind(HookType::FOLDER)]
        );
        assert!(matches!(parse_unhook("bogus"), Err(Error::UnknownHookType(t)) if t == "bogus"));
        assert!(parse_unhook("").is_err());
    }
}
