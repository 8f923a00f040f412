//! Turning a tree back into text: a canonical debug form, and format-string
//! source that parses back to the same tree.

use std::fmt::Write as _;

use crate::{
    definition::{Definition, PadKind, ParseHook, find_short},
    format::{FormatSpec, Justify},
    node::{ExpandoNode, Node, Param},
    parse::cond_date_head,
};

/// Append the debug form of `node` to `out`.
pub fn dump(node: &Node, out: &mut String) {
    match node {
        Node::Empty => out.push_str("<EMPTY>"),
        Node::Text(text) => {
            let _ignored = write!(out, "<TEXT:'{}'>", text.escape_debug());
        }
        Node::Expando(e) => dump_expando(e, out),
        Node::Padding(p) => {
            let kind = match p.kind {
                PadKind::FillEol => "FILL_EOL",
                PadKind::HardFill => "HARD_FILL",
                PadKind::SoftFill => "SOFT_FILL",
            };
            let _ignored = write!(out, "<PAD:{kind}:'{}':", p.pad.escape_debug());
            dump(&p.left, out);
            out.push('|');
            dump(&p.right, out);
            out.push('>');
        }
        Node::Condition(c) => {
            out.push_str("<COND:");
            dump(&c.predicate, out);
            out.push('|');
            dump(&c.if_true, out);
            out.push('|');
            dump(&c.if_false, out);
            out.push('>');
        }
        Node::CondBool(def) => {
            let _ignored = write!(out, "<BOOL({},{})>", def.field.domain(), def.field.attr());
        }
        Node::CondDate { def, count, unit } => {
            let _ignored = write!(
                out,
                "<DATE:({},{}):{count}:{}>",
                def.field.domain(),
                def.field.attr(),
                unit.as_char()
            );
        }
        Node::Container(children) => {
            out.push_str("<CONT:");
            for child in children {
                dump(child, out);
            }
            out.push('>');
        }
    }
}

/// Debug form of one field directive.
fn dump_expando(e: &ExpandoNode, out: &mut String) {
    let field = e.def.field;
    let _ignored = write!(out, "<EXP:({},{})", field.domain(), field.attr());
    match &e.param {
        Param::None => {}
        Param::Date(df) => {
            let bang = if df.c_locale { "!" } else { "" };
            let _ignored = write!(out, ":'{bang}{}'", df.strftime.escape_debug());
        }
        Param::Name(name) => {
            let _ignored = write!(out, ":'{}'", name.escape_debug());
        }
    }
    if let Some(fmt) = &e.format {
        dump_format(fmt, out);
    }
    out.push('>');
}

/// Debug form of a format prefix.
fn dump_format(fmt: &FormatSpec, out: &mut String) {
    let justify = match fmt.justify {
        Some(Justify::Left) => "LEFT",
        Some(Justify::Center) => "CENTER",
        Some(Justify::Right) => "RIGHT",
        None => "DEFAULT",
    };
    let _ignored = write!(out, ":{{{},", fmt.min_cols);
    match fmt.max_cols {
        Some(max) => {
            let _ignored = write!(out, "{max}");
        }
        None => out.push_str("MAX"),
    }
    let _ignored = write!(out, ",{justify},'{}'", fmt.leader);
    if fmt.lower {
        out.push_str(",LOWER");
    }
    out.push('}');
}

/// Format-string source for `node`, given the text that will follow it.
pub fn to_source(node: &Node, defs: &'static [Definition], follow: &str) -> String {
    match node {
        Node::Empty | Node::CondBool(_) | Node::CondDate { .. } => String::new(),
        Node::Text(text) => escape_text(text),
        Node::Expando(e) => expando_source(e, defs, follow),
        Node::Padding(p) => {
            let right = to_source(&p.right, defs, follow);
            let directive = format!("%{}{}", p.def.short, p.pad);
            let tail = format!("{directive}{right}{follow}");
            let left = to_source(&p.left, defs, &tail);
            format!("{left}{directive}{right}")
        }
        Node::Condition(c) => {
            let head = match &c.predicate {
                Node::CondBool(def) => code_for(def, defs, "?"),
                Node::CondDate { def, count, unit } => {
                    format!("{}{count}{}", def.short, unit.as_char())
                }
                _ => String::new(),
            };
            let if_true = to_source(&c.if_true, defs, "&");
            let if_false = to_source(&c.if_false, defs, ">");
            format!("%<{head}?{if_true}&{if_false}>")
        }
        Node::Container(children) => {
            let mut tail = follow.to_string();
            let mut parts = Vec::with_capacity(children.len());
            for child in children.iter().rev() {
                let part = to_source(child, defs, &tail);
                tail.insert_str(0, &part);
                parts.push(part);
            }
            parts.reverse();
            parts.concat()
        }
    }
}

/// The short code, or `{long}` when the short one would read differently
/// with `follow` after it.
fn code_for(def: &'static Definition, defs: &'static [Definition], follow: &str) -> String {
    let probe = format!("{}{follow}", def.short);
    match (find_short(defs, &probe), def.long) {
        (Some(found), _) if found == def => def.short.to_string(),
        (_, Some(long)) => format!("{{{long}}}"),
        (_, None) => def.short.to_string(),
    }
}

/// Source for one field directive.
fn expando_source(e: &ExpandoNode, defs: &'static [Definition], follow: &str) -> String {
    let mut out = String::from("%");
    if let Some(fmt) = &e.format {
        let _ignored = write!(out, "{fmt}");
    }
    match (&e.param, e.def.hook) {
        (Param::Date(df), ParseHook::Date { close, .. }) => {
            let mut content = String::new();
            if df.c_locale {
                content.push('!');
            }
            content.push_str(&escape_enclosed(&df.strftime, close));
            // `%[1d?` would read as a date conditional.
            match e.def.long {
                Some(long) if cond_date_head(&content).is_some() => {
                    let _ignored = write!(out, "{{{long}}}");
                }
                _ => out.push_str(e.def.short),
            }
            out.push_str(&content);
            out.push(close);
        }
        (Param::Name(name), ParseHook::Named { close }) => {
            out.push_str(e.def.short);
            out.push_str(&escape_enclosed(name, close));
            out.push(close);
        }
        _ => out.push_str(&code_for(e.def, defs, follow)),
    }
    out
}

/// Escape `text` so it reads back literally anywhere in a format string.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%%"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '&' | '>' | '?' | ']' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape the content of an enclosed parameter.
fn escape_enclosed(text: &str, close: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == close {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Expando,
        domain::{alias::ALIAS_FORMAT, index::INDEX_FORMAT, msgid::MSGID_FORMAT},
    };

    fn dumped(src: &str) -> String {
        Expando::parse(src, INDEX_FORMAT).unwrap().dump()
    }

    fn round_trip(src: &str, defs: &'static [Definition]) {
        let first = Expando::parse(src, defs).unwrap();
        let again = Expando::parse(&first.to_source(), defs).unwrap();
        assert_eq!(first.root(), again.root(), "{src} -> {}", first.to_source());
    }

    #[test]
    fn debug_form() {
        assert_eq!(dumped(""), "<EMPTY>");
        assert_eq!(dumped("a\n"), "<TEXT:'a\\n'>");
        assert_eq!(
            dumped("%-8.3s"),
            "<EXP:(ENVELOPE,SUBJECT):{8,3,LEFT,'0'}>"
        );
        assert_eq!(dumped("%[!%H]"), "<EXP:(EMAIL,DATE_LOCAL):'!%H'>");
        assert_eq!(
            dumped("a%>-b"),
            "<PAD:HARD_FILL:'-':<TEXT:'a'>|<TEXT:'b'>>"
        );
        assert_eq!(
            dumped("%<l?x>"),
            "<COND:<BOOL(EMAIL,LINES)>|<TEXT:'x'>|<EMPTY>>"
        );
        assert_eq!(
            dumped("%<[2w?x&y>"),
            "<COND:<DATE:(EMAIL,DATE_LOCAL):2:w>|<TEXT:'x'>|<TEXT:'y'>>"
        );
        assert_eq!(dumped("%s %C"), "<CONT:<EXP:(ENVELOPE,SUBJECT)><TEXT:' '><EXP:(EMAIL,NUMBER)>>");
    }

    #[test]
    fn source_reproduces_tree() {
        for src in [
            "%3i %f%t %-15a %-56A | %C%> %Y",
            "100%% \\\\ done\\n",
            "%<l?%l lines&empty> %?s?yes?",
            "%[%H:%M] %{!%Y} %(%d\\)) %@hook@",
            "a%*.b%|=",
            "%[1d?today&older]",
            "%=10.4_s",
            "a&b>c?d]e",
        ] {
            let defs = if src.contains("%3i") { ALIAS_FORMAT } else { INDEX_FORMAT };
            round_trip(src, defs);
        }
    }

    #[test]
    fn short_codes_that_would_merge_use_long_names() {
        let exp = Expando::parse("%{random-1}2", MSGID_FORMAT).unwrap();
        assert_eq!(exp.to_source(), "%{random-1}2");
        let exp = Expando::parse("%r1x", MSGID_FORMAT).unwrap();
        assert_eq!(exp.to_source(), "%r1x");
        let exp = Expando::parse("%F%{sender}p", INDEX_FORMAT).unwrap();
        assert_eq!(exp.to_source(), "%F%{sender}p");
    }

    #[test]
    fn dated_content_that_looks_like_a_condition() {
        let exp = Expando::parse("%{date-strf-local}1d?x]", INDEX_FORMAT).unwrap();
        assert_eq!(exp.to_source(), "%{date-strf-local}1d?x]");
        round_trip("%{date-strf-local}1d?x]", INDEX_FORMAT);
    }
}
