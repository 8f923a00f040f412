#[cfg(test)]
mod tests {
    use std::path::Path;

    use expando::{
        Expando, RenderFlags,
        domain::index::{INDEX_FORMAT, IndexData},
    };
    use hooks::{CommandInterpreter, CommandResult, Error, HookConfig, HookType, Hooks, LookupKind};
    use maildata::{Email, FixedClock, MemStore};

    /// 2024-01-02T03:04:05Z
    const NOW: i64 = 1_704_164_645;

    /// Remembers what it ran.
    #[derive(Default)]
    struct Shell {
        ran: Vec<String>,
    }

    impl CommandInterpreter for Shell {
        fn exec(&mut self, line: &str, _source_dir: Option<&Path>) -> CommandResult {
            self.ran.push(line.to_string());
            CommandResult::Success
        }
    }

    fn hooks(rc: &str, shell: &mut Shell) -> Hooks {
        let mut h = Hooks::new(HookConfig::default(), Box::new(FixedClock::at(NOW)));
        h.source("hooks.rc", rc, None, shell).unwrap();
        h
    }

    #[test]
    fn literal_folder_hook() {
        let mut shell = Shell::default();
        let mut h = hooks("folder-hook -noregex work 'set sort=threads'", &mut shell);
        assert_eq!(h.fire_folder(Some("work"), None, &mut shell).unwrap(), 1);
        assert_eq!(shell.ran, ["set sort=threads"]);
        assert_eq!(h.fire_folder(Some("works/"), None, &mut shell).unwrap(), 0);
        assert_eq!(shell.ran.len(), 1);
    }

    #[test]
    fn catch_all_folder_hook_fires_once() {
        let mut shell = Shell::default();
        let mut h = hooks("folder-hook . 'push <first-entry>'\nfolder-hook . 'push <first-entry>'", &mut shell);
        assert_eq!(h.registry().len(), 1);
        assert_eq!(h.fire_folder(Some("=inbox"), Some("Inbox"), &mut shell).unwrap(), 1);
        assert_eq!(shell.ran, ["push <first-entry>"]);
    }

    #[test]
    fn compress_hook_commands() {
        let mut shell = Shell::default();
        let mut h = hooks(r#"append-hook '\.gz$' "gzip %t > %f""#, &mut shell);
        assert_eq!(
            h.compress_command(HookType::APPEND, "/m/box.gz", "/m/box.gz", "/tmp/box").as_deref(),
            Some("gzip '/tmp/box' > '/m/box.gz'")
        );

        let err = h.command("append-hook", r#"'\.gz$' "gzip %t""#, None).unwrap_err();
        assert!(matches!(err, Error::BadlyFormattedCommand));
        let err = h
            .source("more.rc", "\nappend-hook '\\.bz2$' 'bzip2 > %f'", None, &mut shell)
            .unwrap_err();
        assert_eq!(err.to_string(), "more.rc:2: badly formatted command string");
    }

    #[test]
    fn index_format_hook_by_age() {
        let mut shell = Shell::default();
        let h = hooks("index-format-hook date '~d<1d' '%[%H:%M]'", &mut shell);
        let mut store = MemStore::new();
        let mut recent = Email::default();
        recent.date_sent = NOW - 1800;
        recent.envelope.subject = Some("fresh".into());
        let mut old = recent.clone();
        old.date_sent = NOW - 2 * 86_400;
        old.envelope.subject = Some("stale".into());
        store.push(recent);
        store.push(old);

        let default = Expando::parse("%-10@date@|%s", INDEX_FORMAT).unwrap();
        let resolve = |name: &str, e: &Email| h.render_index_format(name, Some(&store), e);
        let line = |e: &Email| {
            let data = IndexData::new(e).with_store(&store).with_index_hook(&resolve);
            default.render_unbounded(&data, RenderFlags::empty(), h.clock())
        };

        assert_eq!(
            h.index_format("date", Some(&store), &store.emails[0]).map(Expando::source),
            Some("%[%H:%M]")
        );
        assert_eq!(line(&store.emails[0]), "02:34     |fresh");
        assert!(h.index_format("date", Some(&store), &store.emails[1]).is_none());
        assert_eq!(line(&store.emails[1]), "          |stale");
        assert!(h.index_format("other", Some(&store), &store.emails[0]).is_none());
    }

    #[test]
    fn charset_round_trip() {
        let mut shell = Shell::default();
        let mut h = hooks("charset-hook x-mac-roman macintosh\niconv-hook utf-8 UTF8", &mut shell);
        assert_eq!(h.lookup_charset(LookupKind::Charset, "x-mac-roman"), Some("macintosh"));
        assert_eq!(h.lookup_charset(LookupKind::Iconv, "UTF-8"), Some("UTF8"));
        assert_eq!(h.lookup_charset(LookupKind::Charset, "utf-8"), None);
        h.source("more.rc", "unhook iconv-hook", None, &mut shell).unwrap();
        assert_eq!(h.lookup_charset(LookupKind::Charset, "x-mac-roman"), None);
    }

    #[test]
    fn unhook_all_is_refused_inside_a_hook() {
        let mut shell = Shell::default();
        let mut h = hooks(
            "startup-hook 'unhook *'\nstartup-hook 'set after'\nfolder-hook . 'set x'\ncharset-hook a b",
            &mut shell,
        );
        assert_eq!(h.registry().len(), 3);
        // The refusal is a warning, so the next startup hook still runs.
        assert_eq!(h.fire_startup(&mut shell), 2);
        assert_eq!(shell.ran, ["set after"]);
        assert_eq!(h.registry().len(), 3);
        assert_eq!(h.lookup_charset(LookupKind::Charset, "a"), Some("b"));
    }

    #[test]
    fn startup_and_shutdown_fire_once() {
        let mut shell = Shell::default();
        let mut h = hooks("startup-hook 'set a'\nshutdown-hook 'set z'", &mut shell);
        assert_eq!(h.fire_startup(&mut shell), 1);
        assert_eq!(h.fire_startup(&mut shell), 0);
        assert_eq!(h.fire_shutdown(&mut shell), 1);
        assert_eq!(h.fire_shutdown(&mut shell), 0);
        assert_eq!(shell.ran, ["set a", "set z"]);
    }

    #[test]
    fn send_hooks_see_the_draft() {
        let mut shell = Shell::default();
        let mut h = hooks(
            "send-hook . 'unmy_hdr From:'\nsend-hook '~t boss@corp' 'my_hdr From: me@corp'\nsend2-hook '~s urgent' 'set priority'",
            &mut shell,
        );
        let mut draft = Email::default();
        draft.envelope.to = "boss@corp".into();
        draft.envelope.subject = Some("urgent: numbers".into());
        assert_eq!(h.fire_message(HookType::SEND, None, &draft, &mut shell).unwrap(), 2);
        assert_eq!(h.fire_message(HookType::SEND2, None, &draft, &mut shell).unwrap(), 1);
        assert_eq!(shell.ran, ["unmy_hdr From:", "my_hdr From: me@corp", "set priority"]);
    }
}
