//! The `render` subcommand.

use expando::{
    Expando, Provider, RenderFlags,
    domain::index::IndexData,
};
use maildata::{AliasView, Clock, Email, MailStore};

use crate::{
    cli::{FormatKind, RenderArgs},
    error::{Error, Result},
    fixture::Fixture,
    rc::{self, Recorder},
};

/// Run the `render` subcommand: one output line per row.
pub fn run(args: &RenderArgs) -> Result<String> {
    let fixture = Fixture::load_or_default(args.fixture.as_deref())?;
    let expando = Expando::parse(&args.format, args.kind.definitions())
        .map_err(|e| Error::format(&e, &args.format))?;
    if args.ast {
        return Ok(serde_json::to_string_pretty(&expando)? + "\n");
    }
    if args.dump {
        return Ok(expando.dump() + "\n");
    }

    let mut rec = Recorder::default();
    let hooks = rc::load(&fixture, args.rc.as_deref(), &mut rec)?;
    let clock = hooks.clock();
    let render = |p: &dyn Provider| line(&expando, p, args.width, clock);

    let lines: Vec<String> = match args.kind {
        FormatKind::Index => {
            let store: &dyn MailStore = &fixture.store;
            let resolve = |name: &str, e: &Email| hooks.render_index_format(name, Some(store), e);
            fixture
                .store
                .emails
                .iter()
                .map(|e| {
                    let data = IndexData::new(e)
                        .with_mailbox(&fixture.mailbox)
                        .with_store(store)
                        .with_index_hook(&resolve);
                    render(&data)
                })
                .collect()
        }
        FormatKind::Alias | FormatKind::Query => fixture
            .store
            .aliases
            .iter()
            .enumerate()
            .map(|(i, a)| render(&AliasView::new(i, a)))
            .collect(),
        FormatKind::Status => vec![render(&fixture.status)],
        FormatKind::Folder => fixture.folders.iter().map(|f| render(f)).collect(),
    };

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

/// Render one row, within `width` columns when given.
fn line(expando: &Expando, provider: &dyn Provider, width: Option<usize>, clock: &dyn Clock) -> String {
    match width {
        Some(cols) => expando.render_to_string(provider, RenderFlags::PLAIN, cols, clock),
        None => expando.render_unbounded(provider, RenderFlags::PLAIN, clock),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        path::PathBuf,
        process,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    const FIXTURE: &str = r#"(
        now: Some(1704164645),
        mailbox: (name: "inbox"),
        store: (
            emails: [
                (envelope: (from: "Bob Smith <bob@x.org>", subject: Some("lunch")), date_sent: 1704162845),
                (envelope: (from: "al@y.org", subject: Some("old news")), date_sent: 1703900000),
            ],
            aliases: [(name: "bob", addresses: "Bob Smith <bob@x.org>", comment: Some("work"))],
        ),
        status: (messages: 2, description: "inbox"),
    )"#;

    /// Tests run in parallel, so every file gets its own name.
    static NEXT: AtomicUsize = AtomicUsize::new(0);

    fn write(name: &str, text: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("mailfmt-render-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}-{name}", NEXT.fetch_add(1, Ordering::Relaxed)));
        fs::write(&path, text).unwrap();
        path
    }

    fn args(format: &str, kind: FormatKind) -> RenderArgs {
        RenderArgs {
            format: format.into(),
            kind,
            fixture: Some(write("fixture.ron", FIXTURE)),
            width: None,
            rc: None,
            ast: false,
            dump: false,
        }
    }

    #[test]
    fn index_rows() {
        let out = run(&args("%C|%-8.8s|%n", FormatKind::Index)).unwrap();
        assert_eq!(out, "1|lunch   |Bob Smith\n2|old news|al@y.org\n");
    }

    #[test]
    fn width_limits_rows() {
        let mut a = args("%s%>.", FormatKind::Index);
        a.width = Some(10);
        let out = run(&a).unwrap();
        assert!(out.lines().all(|l| l.chars().count() <= 10));
        assert_eq!(out.lines().next(), Some("lunch....."));
    }

    #[test]
    fn alias_and_status_rows() {
        assert_eq!(run(&args("%a %A [%C]", FormatKind::Alias)).unwrap(), "bob Bob Smith <bob@x.org> [work]\n");
        assert_eq!(run(&args("%D: %m", FormatKind::Status)).unwrap(), "inbox: 2\n");
    }

    #[test]
    fn index_format_hooks_resolve() {
        let mut a = args("%-6@age@|%s", FormatKind::Index);
        a.rc = Some(write("age.rc", "index-format-hook age '~d<1d' 'today'\n"));
        assert_eq!(run(&a).unwrap(), "today |lunch\n      |old news\n");
    }

    #[test]
    fn parse_errors_point_at_the_offset() {
        let err = run(&args("%s %Q", FormatKind::Index)).unwrap_err();
        assert!(err.to_string().starts_with("Format error at offset"));
    }

    #[test]
    fn ast_and_dump() {
        let mut a = args("%s", FormatKind::Index);
        a.dump = true;
        assert!(run(&a).unwrap().starts_with("<EXP:"));
        a.dump = false;
        a.ast = true;
        let json: serde_json::Value = serde_json::from_str(&run(&a).unwrap()).unwrap();
        assert_eq!(json["source"], "%s");
    }
}
