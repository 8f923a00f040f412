//! Utilities to render `tracing` events into concise logfmt strings.
//!
//! [`render_event`] extracts level, target, message and the remaining fields
//! from a `tracing::Event`. [`RenderedLog::to_line`] turns the result into a
//! single `key=value` line, which is what the `logging` crate writes to
//! stderr.

use std::fmt::{Debug, Write};

use tracing::{
    Event, Metadata,
    field::{Field, Visit},
};

/// Rendered fields extracted from a tracing Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLog {
    /// Severity level (e.g., INFO, WARN) for the event.
    pub level: String,
    /// Event target (typically the module path).
    pub target: String,
    /// The `message` field, or empty when the event carried none.
    pub message: String,
    /// Remaining fields in recording order, values already rendered.
    pub fields: Vec<(String, String)>,
}

impl RenderedLog {
    /// Render as one logfmt line: `level=debug target=hooks::dispatch msg="..." k=v`.
    ///
    /// The `msg` key is omitted when the event had no message.
    pub fn to_line(&self) -> String {
        let mut out = String::new();
        let _ignored = write!(
            out,
            "level={} target={}",
            self.level.to_ascii_lowercase(),
            quote(&self.target)
        );
        if !self.message.is_empty() {
            let _ignored = write!(out, " msg={}", quote(&self.message));
        }
        for (k, v) in &self.fields {
            let _ignored = write!(out, " {}={}", k, quote(v));
        }
        out
    }
}

/// Quote a logfmt value when it is empty or contains spaces, `=` or quotes.
pub fn quote(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && c != '"' && c != '=');
    if bare {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Extract level, target, message and fields from a tracing Event.
///
/// String fields are kept as-is; everything else uses its `Debug` form.
pub fn render_event(event: &Event<'_>) -> RenderedLog {
    struct MsgVisitor {
        /// Captured `message` field, if present.
        msg: Option<String>,
        /// Non-message fields in recording order.
        fields: Vec<(String, String)>,
    }
    impl Visit for MsgVisitor {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.msg = Some(value.to_string());
            } else {
                self.fields.push((field.name().to_string(), value.to_string()));
            }
        }
        fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
            if field.name() == "message" {
                self.msg = Some(format!("{:?}", value));
            } else {
                self.fields
                    .push((field.name().to_string(), format!("{:?}", value)));
            }
        }
    }
    let meta: &Metadata<'_> = event.metadata();
    let mut vis = MsgVisitor {
        msg: None,
        fields: Vec::new(),
    };
    event.record(&mut vis);
    RenderedLog {
        level: meta.level().to_string(),
        target: meta.target().to_string(),
        message: vis.msg.unwrap_or_default(),
        fields: vis.fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("two words"), "\"two words\"");
        assert_eq!(quote("a=b"), "\"a=b\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn line_layout() {
        let log = RenderedLog {
            level: "WARN".into(),
            target: "hooks::dispatch".into(),
            message: "command failed".into(),
            fields: vec![("file".into(), "hooks.rc".into()), ("line".into(), "3".into())],
        };
        assert_eq!(
            log.to_line(),
            "level=warn target=hooks::dispatch msg=\"command failed\" file=hooks.rc line=3"
        );

        let bare = RenderedLog {
            message: String::new(),
            fields: Vec::new(),
            ..log
        };
        assert_eq!(bare.to_line(), "level=warn target=hooks::dispatch");
    }
}
