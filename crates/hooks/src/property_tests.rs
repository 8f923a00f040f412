use proptest::prelude::*;
use regex::Regex;

use crate::{
    kind::HookType,
    registry::{Added, Hook, Registry, Selector},
};

/// A small pool of selectors and commands, so duplicates are common.
fn entry() -> impl Strategy<Value = (bool, u8, u8)> {
    (any::<bool>(), 0u8..3, 0u8..3)
}

fn hook((mbox, sel, cmd): (bool, u8, u8)) -> Hook {
    let kind = if mbox { HookType::MBOX } else { HookType::FOLDER };
    let src = format!("r{sel}");
    let re = Regex::new(&src).unwrap();
    Hook::new(kind, &src, false, Selector::Regex(re), &format!("c{cmd}"))
}

proptest! {
    #[test]
    fn insertion_order_survives_dedup(entries in prop::collection::vec(entry(), 0..40)) {
        let mut registry = Registry::new();
        // The expected list: (kind, selector, command) in first-insertion order.
        let mut model: Vec<(bool, u8, u8)> = Vec::new();
        for e in entries {
            let added = registry.add(hook(e));
            let (mbox, sel, _) = e;
            if mbox {
                match model.iter_mut().find(|m| m.0 && m.1 == sel) {
                    Some(m) => {
                        prop_assert_eq!(added, Added::Updated);
                        *m = e;
                    }
                    None => {
                        prop_assert_eq!(added, Added::Inserted);
                        model.push(e);
                    }
                }
            } else if model.contains(&e) {
                prop_assert_eq!(added, Added::Duplicate);
            } else {
                prop_assert_eq!(added, Added::Inserted);
                model.push(e);
            }
        }

        let got: Vec<(bool, String, String)> = registry
            .hooks()
            .iter()
            .map(|h| (h.kind == HookType::MBOX, h.source.clone(), h.command.clone()))
            .collect();
        let want: Vec<(bool, String, String)> = model
            .iter()
            .map(|(m, s, c)| (*m, format!("r{s}"), format!("c{c}")))
            .collect();
        prop_assert_eq!(got, want);

        let serials: Vec<u64> = registry.hooks().iter().map(|h| h.serial).collect();
        prop_assert!(serials.windows(2).all(|w| w[0] < w[1]));
    }
}
