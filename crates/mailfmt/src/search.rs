//! The `search` subcommand.

use std::fmt::Write;

use expando::{
    Expando, RenderFlags,
    domain::index::{INDEX_FORMAT, IndexData},
};
use maildata::{AliasView, MailStore};
use pattern::{
    ALIAS_SIMPLE_SEARCH, CompileFlags, ExecFlags, PatternCache, Scope, compile, exec, expand_simple,
};
use tracing::debug;

use crate::{
    cli::SearchArgs,
    error::{Error, Result},
    fixture::Fixture,
};

/// Template a plain search word is dropped into.
pub const SIMPLE_SEARCH: &str = "~f %s | ~s %s";

/// Run the `search` subcommand: one line per matching row.
pub fn run(args: &SearchArgs) -> Result<String> {
    let fixture = Fixture::load_or_default(args.fixture.as_deref())?;
    let clock = fixture.clock();
    let store: &dyn MailStore = &fixture.store;

    let template = if args.aliases {
        ALIAS_SIMPLE_SEARCH
    } else {
        SIMPLE_SEARCH
    };
    let src = expand_simple(&args.pattern, template);
    let mut flags = CompileFlags::empty();
    flags.set(CompileFlags::FULL_MSG, args.full);
    let current = args.current.and_then(|n| n.checked_sub(1));
    let scope = Scope::new(clock.as_ref()).with_mailbox(store, current);
    let pat = compile(&src, flags, &scope).map_err(|e| Error::pattern(&e, &src))?;
    debug!(pattern = %src, "searching fixture");

    let mut exec_flags = ExecFlags::empty();
    exec_flags.set(ExecFlags::FULL_ADDRESS, args.full_address);
    let mut cache = PatternCache::new();
    let mut out = String::new();

    if args.aliases {
        for (i, alias) in fixture.store.aliases.iter().enumerate() {
            let view = AliasView::new(i, alias);
            if exec::alias(&pat, exec_flags, &view, Some(&mut cache)) {
                let _ignored = writeln!(out, "{} {}", alias.name, alias.addresses);
            }
        }
        return Ok(out);
    }

    let line = Expando::parse(&args.format, INDEX_FORMAT).map_err(|e| Error::format(&e, &args.format))?;
    for email in &fixture.store.emails {
        cache.clear();
        if pat.exec(exec_flags, Some(store), email, Some(&mut cache), clock.as_ref()) {
            let data = IndexData::new(email).with_mailbox(&fixture.mailbox).with_store(store);
            out.push_str(&line.render_unbounded(&data, RenderFlags::PLAIN, clock.as_ref()));
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;

    fn args(pattern: &str, name: &str) -> SearchArgs {
        let dir = env::temp_dir().join(format!("mailfmt-search-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.ron"));
        fs::write(
            &path,
            r#"(
                now: Some(1704164645),
                store: (
                    emails: [
                        (envelope: (from: "Bob <bob@x.org>", subject: Some("lunch")), flags: (read: true)),
                        (envelope: (from: "al@y.org", subject: Some("Bob's report"))),
                        (envelope: (from: "cy@z.org", subject: Some("misc"))),
                    ],
                    aliases: [
                        (name: "bob", addresses: "Bob <bob@x.org>"),
                        (name: "team", addresses: "al@y.org, cy@z.org", comment: Some("everyone")),
                    ],
                ),
            )"#,
        )
        .unwrap();
        SearchArgs {
            pattern: pattern.into(),
            fixture: Some(path),
            aliases: false,
            full: false,
            full_address: false,
            current: None,
            format: "%C %s".into(),
        }
    }

    #[test]
    fn plain_words_search_from_and_subject() {
        assert_eq!(run(&args("bob", "plain")).unwrap(), "1 lunch\n2 Bob's report\n");
    }

    #[test]
    fn patterns_and_ranges() {
        assert_eq!(run(&args("~U !~f cy", "unread")).unwrap(), "2 Bob's report\n");
        let mut a = args("~m .-$", "range");
        a.current = Some(2);
        assert_eq!(run(&a).unwrap(), "2 Bob's report\n3 misc\n");
    }

    #[test]
    fn body_search_needs_full() {
        let err = run(&args("~b lunch", "body")).unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn alias_search() {
        let mut a = args("team", "aliases");
        a.aliases = true;
        assert_eq!(run(&a).unwrap(), "team al@y.org, cy@z.org\n");
    }
}
