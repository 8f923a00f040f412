#[cfg(test)]
mod tests {
    use maildata::{Alias, AliasView, Email, FixedClock, MemStore};
    use pattern::{
        ALIAS_SIMPLE_SEARCH, CompileFlags, ErrorKind, ExecFlags, PatternCache, Scope, compile,
        expand_simple,
    };

    /// 2024-01-02T03:04:05Z
    const NOW: i64 = 1_704_164_645;

    fn mailbox() -> MemStore {
        let mut store = MemStore::new();
        let mut email = Email::default();
        email.envelope.from = "bob@x.org".into();
        email.envelope.to = "me@home.org".into();
        email.envelope.cc = "work@team.org".into();
        email.date_sent = NOW;
        store.push(email);
        store.add_user_address("me@home.org");
        store
    }

    #[test]
    fn mixed_connectives() {
        let clock = FixedClock::at(NOW);
        let store = mailbox();
        let p = compile("~f bob !~P | (~P ~C work)", CompileFlags::empty(), &Scope::new(&clock)).unwrap();
        assert_eq!(
            p.to_string(),
            "(or (and (~f /bob/) (not (~P))) (and (~P) (~C /work/)))"
        );
        assert!(p.exec(ExecFlags::empty(), Some(&store), &store.emails[0], None, &clock));

        // Sent by the user: the second branch has to carry it.
        let mut mine = store.emails[0].clone();
        mine.envelope.from = "me@home.org".into();
        assert!(p.exec(ExecFlags::empty(), Some(&store), &mine, None, &clock));
        mine.envelope.cc = "boss@corp.org".into();
        assert!(!p.exec(ExecFlags::empty(), Some(&store), &mine, None, &clock));
    }

    #[test]
    fn dynamic_dates_follow_the_clock() {
        let compiled_at = FixedClock::at(NOW);
        let store = mailbox();
        let email = &store.emails[0];
        let p = compile("~d <1d", CompileFlags::DYNAMIC, &Scope::new(&compiled_at)).unwrap();
        assert!(p.is_dynamic());

        let soon = compiled_at.advance(3600);
        assert!(p.exec(ExecFlags::empty(), None, email, None, &soon));
        let later = compiled_at.advance(2 * 86_400);
        assert!(!p.exec(ExecFlags::empty(), None, email, None, &later));

        // Without the flag the range is fixed when compiled.
        let fixed = compile("~d <1d", CompileFlags::empty(), &Scope::new(&compiled_at)).unwrap();
        assert!(!fixed.is_dynamic());
        assert!(fixed.exec(ExecFlags::empty(), None, email, None, &later));
    }

    #[test]
    fn one_cache_serves_many_patterns() {
        let clock = FixedClock::at(NOW);
        let store = mailbox();
        let scope = Scope::new(&clock);
        let rules = ["~p", "~p ~f bob", "!~p", "^~p"];
        let mut cache = PatternCache::new();
        let hits: Vec<bool> = rules
            .iter()
            .map(|src| {
                compile(src, CompileFlags::empty(), &scope).unwrap().exec(
                    ExecFlags::empty(),
                    Some(&store),
                    &store.emails[0],
                    Some(&mut cache),
                    &clock,
                )
            })
            .collect();
        assert_eq!(hits, vec![true, true, false, false]);
    }

    #[test]
    fn address_book_search() {
        let clock = FixedClock::at(NOW);
        let aliases = [
            Alias {
                name: "bob".into(),
                addresses: "Bob Jones <bob@x.org>".into(),
                comment: None,
                tags: Vec::new(),
            },
            Alias {
                name: "carol".into(),
                addresses: "carol@y.org".into(),
                comment: Some("met bob at the conference".into()),
                tags: Vec::new(),
            },
            Alias {
                name: "dave".into(),
                addresses: "dave@z.org".into(),
                comment: None,
                tags: Vec::new(),
            },
        ];
        let src = expand_simple("bob", ALIAS_SIMPLE_SEARCH);
        let p = compile(&src, CompileFlags::empty(), &Scope::new(&clock)).unwrap();
        let names: Vec<&str> = aliases
            .iter()
            .enumerate()
            .filter(|(i, a)| p.alias_exec(ExecFlags::empty(), &AliasView::new(*i, a), None))
            .map(|(_, a)| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["bob", "carol"]);
    }

    #[test]
    fn message_numbers_against_the_open_mailbox() {
        let clock = FixedClock::at(NOW);
        let mut store = mailbox();
        for _ in 0..4 {
            store.push(Email::default());
        }
        let scope = Scope::new(&clock).with_mailbox(&store, Some(2));
        let p = compile("~m -1,1", CompileFlags::empty(), &scope).unwrap();
        let hits: Vec<usize> = store
            .emails
            .iter()
            .filter(|e| p.exec(ExecFlags::empty(), Some(&store), e, None, &clock))
            .map(|e| e.msgno())
            .collect();
        assert_eq!(hits, vec![2, 3, 4]);

        let err = compile("~m .", CompileFlags::empty(), &Scope::new(&clock)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoMailbox);
    }
}
