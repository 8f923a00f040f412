#[cfg(test)]
mod tests {
    use expando::{
        ConfigFlags, Expando, ExpandoConfig, NoData, RenderFlags,
        domain::{
            alias::{ALIAS_FORMAT, QUERY_FORMAT},
            compress::{COMPRESS_FORMAT, CompressPaths},
            index::{INDEX_FORMAT, IndexData, IndexHookFn, MailboxInfo},
            msgid::{MSGID_FORMAT, generate_message_id},
            status::{STATUS_FORMAT, StatusInfo},
        },
        width::str_width,
    };
    use maildata::{Alias, AliasView, Email, Envelope, FixedClock, MemStore};
    use rand::{SeedableRng, rngs::StdRng};
    use regex::Regex;

    /// 2024-01-02T03:04:05Z
    const NOW: i64 = 1_704_164_645;

    fn bob() -> Alias {
        Alias {
            name: "bob".into(),
            addresses: "bob@ex.com".into(),
            comment: Some("C".into()),
            tags: Vec::new(),
        }
    }

    #[test]
    fn alias_menu_row() {
        let alias = bob();
        let view = AliasView::new(2, &alias);
        let exp = Expando::parse("%3i %f%t %-15a %-56A | %C%> %Y", ALIAS_FORMAT).unwrap();
        let clock = FixedClock::at(NOW);

        let wide = exp.render_to_string(&view, RenderFlags::empty(), 100, &clock);
        let expected_left = format!("  3    {:<15} {:<56} | C", "bob", "<bob@ex.com>");
        assert_eq!(wide, format!("{expected_left}{}", " ".repeat(100 - 83)));

        // At 80 columns the left-hand side is cut and the padding collapses.
        let narrow = exp.render_to_string(&view, RenderFlags::empty(), 80, &clock);
        assert_eq!(str_width(&narrow), 80);
        assert_eq!(narrow, expected_left[..80]);
    }

    #[test]
    fn query_menu_row() {
        let alias = Alias {
            name: "Bob Smith".into(),
            addresses: "Bob Smith <bob@ex.com>".into(),
            comment: Some("work".into()),
            tags: vec!["x".into()],
        };
        let mut view = AliasView::new(0, &alias);
        view.tagged = true;
        let exp = Expando::parse("%3c %t %-25.25a %-25.25n %?e?(%e)?", QUERY_FORMAT).unwrap();
        let out = exp.render_unbounded(&view, RenderFlags::empty(), &FixedClock::at(NOW));
        assert_eq!(
            out,
            format!("  1 * {:<25} {:<25} (work)", "Bob Smith <bob@ex.com>", "Bob Smith")
        );
    }

    #[test]
    fn index_line() {
        let email = Email {
            index: 4,
            envelope: Envelope {
                from: "Bob Smith <bob@x.org>".into(),
                to: "me@home.org".into(),
                subject: Some("Quarterly report".into()),
                ..Default::default()
            },
            date_sent: NOW - 1800,
            size: 12_000,
            ..Default::default()
        };
        let mut store = MemStore::new();
        store.add_user_address("me@home.org");
        let inbox = MailboxInfo {
            name: "inbox".into(),
            path: "/mail/inbox".into(),
            msg_count: 12,
        };
        let data = IndexData::new(&email).with_store(&store).with_mailbox(&inbox);
        let exp = Expando::parse("%4C %Z %[%H:%M] %-12.12L (%4c) %s%*  %b", INDEX_FORMAT).unwrap();
        let out = exp.render_to_string(&data, RenderFlags::empty(), 60, &FixedClock::at(NOW));
        assert_eq!(str_width(&out), 60);
        assert!(out.starts_with("   5 N + 02:34 Bob Smith    ( 12K) Quarterly report"), "{out:?}");
        assert!(out.ends_with(" inbox"), "{out:?}");
    }

    #[test]
    fn index_hook_lookup() {
        let email = Email::default();
        let hook: &IndexHookFn<'_> = &|name, _email| (name == "date").then(|| "today".to_string());
        let data = IndexData::new(&email).with_index_hook(hook);
        let exp = Expando::parse("[%@date@][%@other@]", INDEX_FORMAT).unwrap();
        let out = exp.render_unbounded(&data, RenderFlags::empty(), &FixedClock::at(NOW));
        assert_eq!(out, "[today][]");
    }

    #[test]
    fn status_bar() {
        let info = StatusInfo {
            path: "=inbox".into(),
            messages: 120,
            new: 3,
            ..Default::default()
        };
        let exp = Expando::parse("-%r- %f [Msgs:%?M?%M/?%m%?n? New:%n?]%>-", STATUS_FORMAT).unwrap();
        let out = exp.render_to_string(&info, RenderFlags::empty(), 40, &FixedClock::at(NOW));
        assert_eq!(str_width(&out), 40);
        assert_eq!(out, format!("- - =inbox [Msgs:120 New:3]{}", "-".repeat(13)));
    }

    #[test]
    fn compress_command_quotes_paths() {
        let exp = Expando::parse("gzip -cd %f > %t", COMPRESS_FORMAT).unwrap();
        let paths = CompressPaths {
            from: "/mail/it's.gz",
            to: "/tmp/box",
        };
        let out = exp.render_unbounded(&paths, RenderFlags::empty(), &FixedClock::at(NOW));
        assert_eq!(out, "gzip -cd '/mail/it'\\''s.gz' > '/tmp/box'");
    }

    #[test]
    fn message_id() {
        let mut cfg =
            ExpandoConfig::new("message_id_format", None, MSGID_FORMAT, ConfigFlags::empty()).unwrap();
        assert!(cfg.set("<%z@%f>").is_err());
        cfg.set("%Y%m%d%H%M%S.%r3@%h").unwrap();

        let clock = FixedClock::at(NOW);
        let mut rng = StdRng::seed_from_u64(42);
        let id = generate_message_id(cfg.expando(), &clock, &mut rng, "a.b");
        let re = Regex::new(r"^<20240102030405\.[A-Za-z0-9_-]{4}@a\.b>$").unwrap();
        assert!(re.is_match(&id), "{id}");
    }

    #[test]
    fn pretty_errors_point_at_the_code() {
        let src = "%-15a %Q";
        let err = Expando::parse(src, ALIAS_FORMAT).unwrap_err();
        assert_eq!(
            err.pretty(src),
            "Format error at offset 7\nUnknown expando: %Q\n    | %-15a %Q\n    |        ^\n"
        );
    }

    #[test]
    fn ast_serialises_to_json() {
        let exp = Expando::parse("%<t?*&->", ALIAS_FORMAT).unwrap();
        let json = serde_json::to_value(&exp).unwrap();
        assert_eq!(json["source"], "%<t?*&->");
        assert!(json["root"]["Condition"]["predicate"].get("CondBool").is_some(), "{json}");
        let out = exp.render_unbounded(&NoData, RenderFlags::empty(), &FixedClock::at(NOW));
        assert_eq!(out, "-");
    }
}
