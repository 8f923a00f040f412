use maildata::{Alias, AliasView, FixedClock};
use proptest::prelude::*;

use crate::{Expando, RenderFlags, domain::alias::ALIAS_FORMAT, width::str_width};

/// One piece of an alias format string.
fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z |:日]{1,6}",
        prop::sample::select(vec![
            "%a", "%A", "%C", "%f", "%i", "%t", "%Y", "%-15a", "%3i", "%.4A", "%=7C", "%-8.3_a",
            "%{name}", "%%", "\\n",
        ])
        .prop_map(str::to_string),
        prop::sample::select(vec!["%>-", "%*.", "%|=", "%> ", "%>日"]).prop_map(str::to_string),
    ]
}

/// A format string, optionally with conditionals around some pieces.
fn format_string() -> impl Strategy<Value = String> {
    let cond = (
        prop::sample::select(vec!["t", "C", "i", "Y"]),
        prop::collection::vec(piece(), 0..3),
        prop::collection::vec(piece(), 0..3),
    )
        .prop_map(|(code, t, f)| format!("%<{code}?{}&{}>", t.concat(), f.concat()));
    prop::collection::vec(prop_oneof![3 => piece(), 1 => cond], 0..8).prop_map(|v| v.concat())
}

fn alias_strategy() -> impl Strategy<Value = (Alias, usize, bool)> {
    (
        "[a-zA-Z日本]{0,12}",
        "[a-z]{1,8}@[a-z]{1,6}\\.com",
        proptest::option::of("[A-Za-z ]{0,20}"),
        prop::collection::vec("[a-z]{1,5}", 0..3),
        0usize..200,
        any::<bool>(),
    )
        .prop_map(|(name, mailbox, comment, tags, num, tagged)| {
            let alias = Alias {
                name,
                addresses: mailbox.as_str().into(),
                comment,
                tags,
            };
            (alias, num, tagged)
        })
}

proptest! {
    #[test]
    fn render_fits_the_budget(
        src in format_string(),
        (alias, num, tagged) in alias_strategy(),
        cols in 0usize..120,
    ) {
        let exp = Expando::parse(&src, ALIAS_FORMAT).unwrap();
        let mut view = AliasView::new(num, &alias);
        view.tagged = tagged;
        let clock = FixedClock::at(0);
        let mut out = String::new();
        let used = exp.render(&view, RenderFlags::empty(), cols, &clock, &mut out);
        prop_assert!(str_width(&out) <= cols, "{src:?} rendered {out:?} in {cols}");
        prop_assert_eq!(used, str_width(&out));
    }
}

proptest! {
    #[test]
    fn source_round_trips(
        src in format_string(),
        (alias, num, tagged) in alias_strategy(),
        cols in 0usize..120,
    ) {
        let exp = Expando::parse(&src, ALIAS_FORMAT).unwrap();
        let again = Expando::parse(&exp.to_source(), ALIAS_FORMAT).unwrap();
        prop_assert_eq!(exp.root(), again.root());

        let mut view = AliasView::new(num, &alias);
        view.tagged = tagged;
        let clock = FixedClock::at(0);
        prop_assert_eq!(
            exp.render_to_string(&view, RenderFlags::empty(), cols, &clock),
            again.render_to_string(&view, RenderFlags::empty(), cols, &clock)
        );
    }
}
