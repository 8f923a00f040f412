//! Rendering a parsed tree against a data provider.
//!
//! Rendering never fails. Every node receives a column budget and reports the
//! cells it used, so the output can never exceed the caller's width.

use std::fmt::Write as _;

use bitflags::bitflags;
use chrono::{DateTime, Datelike, Days, FixedOffset, Months, TimeDelta, TimeZone, Timelike, Utc};
use maildata::Clock;
use tracing::trace;

use crate::{
    definition::{Definition, PadKind, ParseHook},
    domain::{Provider, ValueKind},
    format::{FormatSpec, Justify},
    node::{DateFormat, DateUnit, ExpandoNode, Node, PaddingNode, Param},
    width::{fill, shape, truncate, truncate_left},
};

/// Budget meaning "no limit"; padding does not fill against it.
pub const UNBOUNDED: usize = usize::MAX;

bitflags! {
    /// Hints passed through to providers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RenderFlags: u8 {
        /// No colour or decoration.
        const PLAIN = 1;
        /// The menu uses an arrow cursor; rows may be a little narrower.
        const ARROW_CURSOR = 1 << 1;
    }
}

/// What every node needs while rendering.
pub(crate) struct Ctx<'a> {
    /// Field values.
    pub provider: &'a dyn Provider,
    /// Hints for the provider.
    pub flags: RenderFlags,
    /// "Now" and the local zone.
    pub clock: &'a dyn Clock,
}

/// Render `node` into `out` within `max_cols`; returns the cells used.
pub(crate) fn render_node(node: &Node, ctx: &Ctx<'_>, max_cols: usize, out: &mut String) -> usize {
    match node {
        Node::Empty | Node::CondBool(_) | Node::CondDate { .. } => 0,
        Node::Text(text) => {
            let (cut, w) = truncate(text, max_cols);
            out.push_str(cut);
            w
        }
        Node::Expando(e) => render_expando(e, ctx, max_cols, out),
        Node::Padding(p) => render_padding(p, ctx, max_cols, out),
        Node::Condition(c) => {
            let branch = if eval_predicate(&c.predicate, ctx) {
                &c.if_true
            } else {
                &c.if_false
            };
            render_node(branch, ctx, max_cols, out)
        }
        Node::Container(children) => {
            let mut used = 0;
            for child in children {
                used += render_node(child, ctx, max_cols - used, out);
            }
            used
        }
    }
}

/// Cells left for filling after `used`, or none when unbounded.
fn room(max_cols: usize, used: usize) -> usize {
    if max_cols == UNBOUNDED {
        0
    } else {
        max_cols.saturating_sub(used)
    }
}

/// Render a padding node and the regions it owns.
fn render_padding(p: &PaddingNode, ctx: &Ctx<'_>, max_cols: usize, out: &mut String) -> usize {
    match p.kind {
        PadKind::FillEol => {
            let lw = render_node(&p.left, ctx, max_cols, out);
            let gap = room(max_cols, lw);
            out.push_str(&fill(&p.pad, gap));
            lw + gap
        }
        PadKind::HardFill => {
            let mut right = String::new();
            let rw = render_node(&p.right, ctx, max_cols, &mut right);
            let lw = render_node(&p.left, ctx, max_cols - rw, out);
            let gap = room(max_cols, lw + rw);
            out.push_str(&fill(&p.pad, gap));
            out.push_str(&right);
            lw + gap + rw
        }
        PadKind::SoftFill => {
            let lw = render_node(&p.left, ctx, max_cols, out);
            let mut right = String::new();
            render_node(&p.right, ctx, max_cols, &mut right);
            let (cut, rw) = truncate_left(&right, max_cols - lw);
            let gap = room(max_cols, lw + rw);
            out.push_str(&fill(&p.pad, gap));
            out.push_str(cut);
            lw + gap + rw
        }
    }
}

/// Default alignment for a field without an explicit one.
fn default_justify(kind: ValueKind) -> Justify {
    match kind {
        ValueKind::Number => Justify::Right,
        ValueKind::String => Justify::Left,
    }
}

/// Print `n` the way `%.*ld` would under `fmt`.
pub(crate) fn format_number(n: i64, fmt: Option<&FormatSpec>) -> String {
    let precision = match fmt.and_then(FormatSpec::precision) {
        // Leave room for the sign.
        Some(p) if n < 0 => p.saturating_sub(1).max(usize::from(p == 0)),
        Some(p) => p,
        None => 1,
    };
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    if n < 0 {
        out.push('-');
    }
    if precision == 0 && n == 0 {
        return out;
    }
    for _ in digits.len()..precision {
        out.push('0');
    }
    out.push_str(&digits);
    out
}

/// Render a field directive.
fn render_expando(e: &ExpandoNode, ctx: &Ctx<'_>, max_cols: usize, out: &mut String) -> usize {
    let field = e.def.field;
    let fmt = e.format.as_ref();
    let text = match &e.param {
        Param::Date(df) => date_text(e.def, df, ctx),
        Param::Name(name) => ctx
            .provider
            .named(field, name, ctx.flags)
            .unwrap_or_default(),
        Param::None => match ctx.provider.string(field, ctx.flags) {
            Some(s) => s,
            None => match ctx.provider.number(field, ctx.flags) {
                Some(n) => format_number(n, fmt),
                None => {
                    trace!(domain = field.domain(), attr = field.attr(), "no value");
                    match field.kind() {
                        ValueKind::Number => format_number(0, fmt),
                        ValueKind::String => String::new(),
                    }
                }
            },
        },
    };

    let (min, max, justify) = match fmt {
        Some(f) => (
            f.min_cols,
            f.max_cols
                .filter(|m| *m > 0)
                .map_or(max_cols, |m| m.min(max_cols)),
            f.justify.unwrap_or_else(|| default_justify(field.kind())),
        ),
        None => (0, max_cols, Justify::Left),
    };
    let (shaped, w) = shape(&text, min, max, justify);
    if fmt.is_some_and(|f| f.lower) {
        let lowered = shaped.to_lowercase();
        let (cut, w) = truncate(&lowered, max);
        out.push_str(cut);
        return w;
    }
    out.push_str(&shaped);
    w
}

/// Format the date behind `def` with strftime; empty when there is no date or
/// the format is invalid.
fn date_text(def: &Definition, df: &DateFormat, ctx: &Ctx<'_>) -> String {
    let Some(date) = ctx.provider.date(def.field) else {
        return String::new();
    };
    let date = match def.hook {
        ParseHook::Date { local: true, .. } => ctx.clock.to_local(date.with_timezone(&Utc)),
        _ => date,
    };
    // chrono only knows the C locale, so `!` needs no special handling.
    let mut text = String::new();
    if write!(text, "{}", date.format(&df.strftime)).is_err() {
        trace!(format = df.strftime, "invalid strftime format");
        text.clear();
    }
    text
}

/// Evaluate a conditional's predicate.
fn eval_predicate(node: &Node, ctx: &Ctx<'_>) -> bool {
    match node {
        Node::CondBool(def) => {
            let field = def.field;
            if let Some(n) = ctx.provider.number(field, ctx.flags) {
                return n != 0;
            }
            ctx.provider
                .string(field, ctx.flags)
                .is_some_and(|s| !s.is_empty())
        }
        Node::CondDate { def, count, unit } => ctx
            .provider
            .date(def.field)
            .is_some_and(|d| date_within(d, *count, *unit, ctx.clock)),
        _ => false,
    }
}

/// Is `date` within the last `count` units before now?
pub(crate) fn date_within(date: DateTime<FixedOffset>, count: u32, unit: DateUnit, clock: &dyn Clock) -> bool {
    cutoff(clock.local_now(), count, unit).is_some_and(|c| date >= c)
}

/// Start of the window ending at `now`.
///
/// A zero count means the start of the current unit, so `%<[0d?...>` is
/// "today" rather than "the last zero days".
fn cutoff(now: DateTime<FixedOffset>, count: u32, unit: DateUnit) -> Option<DateTime<FixedOffset>> {
    if count == 0 {
        let day = now.date_naive();
        let start = match unit {
            DateUnit::Year => day.with_ordinal(1)?.and_hms_opt(0, 0, 0)?,
            DateUnit::Month => day.with_day(1)?.and_hms_opt(0, 0, 0)?,
            DateUnit::Week => day
                .checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_sunday())))?
                .and_hms_opt(0, 0, 0)?,
            DateUnit::Day => day.and_hms_opt(0, 0, 0)?,
            DateUnit::Hour => day.and_hms_opt(now.hour(), 0, 0)?,
            DateUnit::Minute => day.and_hms_opt(now.hour(), now.minute(), 0)?,
            DateUnit::Second => return Some(now),
        };
        return now.offset().from_local_datetime(&start).single();
    }
    let n = i64::from(count);
    match unit {
        DateUnit::Year => now.checked_sub_months(Months::new(count.checked_mul(12)?)),
        DateUnit::Month => now.checked_sub_months(Months::new(count)),
        DateUnit::Week => now.checked_sub_signed(TimeDelta::try_weeks(n)?),
        DateUnit::Day => now.checked_sub_signed(TimeDelta::try_days(n)?),
        DateUnit::Hour => now.checked_sub_signed(TimeDelta::try_hours(n)?),
        DateUnit::Minute => now.checked_sub_signed(TimeDelta::try_minutes(n)?),
        DateUnit::Second => now.checked_sub_signed(TimeDelta::try_seconds(n)?),
    }
}

#[cfg(test)]
mod tests {
    use maildata::FixedClock;

    use super::*;
    use crate::{
        Expando,
        domain::{Field, NoData},
    };

    /// A provider with a handful of fixed values, for exercising the renderer.
    struct Fixed {
        /// Text for every string field.
        text: &'static str,
        /// Value for every number field.
        num: Option<i64>,
        /// Value for every date field.
        date: Option<DateTime<FixedOffset>>,
    }

    impl Provider for Fixed {
        fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
            (field.kind() == ValueKind::String).then(|| self.text.to_string())
        }

        fn number(&self, _field: Field, _flags: RenderFlags) -> Option<i64> {
            self.num
        }

        fn date(&self, _field: Field) -> Option<DateTime<FixedOffset>> {
            self.date
        }
    }

    const NOW: i64 = 1_704_164_645;

    fn render(src: &str, data: &dyn Provider, cols: usize) -> String {
        let exp = Expando::parse(src, crate::domain::index::INDEX_FORMAT).unwrap();
        exp.render_to_string(data, RenderFlags::empty(), cols, &FixedClock::at(NOW))
    }

    fn text(s: &'static str) -> Fixed {
        Fixed {
            text: s,
            num: None,
            date: None,
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(7, None), "7");
        let spec = |s: &str| crate::format::parse_format(s, 0).unwrap().0;
        assert_eq!(format_number(7, spec("05").as_ref()), "00007");
        assert_eq!(format_number(-7, spec("05").as_ref()), "-0007");
        assert_eq!(format_number(42, spec("5.3").as_ref()), "042");
        assert_eq!(format_number(0, spec(".0").as_ref()), "");
        assert_eq!(format_number(-3, spec(".0").as_ref()), "-3");
        assert_eq!(format_number(12, spec("5").as_ref()), "12");
    }

    #[test]
    fn numbers_right_text_left() {
        let data = Fixed {
            text: "ab",
            num: Some(5),
            date: None,
        };
        assert_eq!(render("[%4C][%4s]", &data, 80), "[   5][ab  ]");
        assert_eq!(render("[%=6s]", &data, 80), "[  ab  ]");
        assert_eq!(render("[%-4C]", &data, 80), "[5   ]");
    }

    #[test]
    fn missing_values() {
        assert_eq!(render("[%s][%C][%3C]", &NoData, 80), "[][0][  0]");
    }

    #[test]
    fn truncation_and_lower() {
        assert_eq!(render("%.3s", &text("ABCDEF"), 80), "ABC");
        assert_eq!(render("%-5.3_s|", &text("ABCDEF"), 80), "abc|");
        assert_eq!(render("%s", &text("日本語"), 5), "日本");
    }

    #[test]
    fn padding_kinds() {
        let data = text("xy");
        assert_eq!(render("ab%|-", &data, 6), "ab----");
        assert_eq!(render("ab%|-cd", &data, 6), "ab----");
        assert_eq!(render("ab%>.cd", &data, 7), "ab...cd");
        assert_eq!(render("abcdef%>.XYZ", &data, 7), "abcdXYZ");
        assert_eq!(render("ab%*.cd", &data, 7), "ab...cd");
        assert_eq!(render("abcdef%*.XYZ", &data, 7), "abcdefZ");
    }

    #[test]
    fn padding_unbounded_does_not_fill() {
        assert_eq!(render("ab%>-cd", &NoData, UNBOUNDED), "abcd");
    }

    #[test]
    fn conditionals() {
        let yes = Fixed {
            text: "x",
            num: Some(3),
            date: None,
        };
        let no = Fixed {
            text: "",
            num: Some(0),
            date: None,
        };
        assert_eq!(render("%<l?has %l&none>", &yes, 80), "has 3");
        assert_eq!(render("%<l?has %l&none>", &no, 80), "none");
        assert_eq!(render("%<s?subj&empty>", &text(""), 80), "empty");
        assert_eq!(render("%<s?subj&empty>", &text("s"), 80), "subj");
    }

    #[test]
    fn dates() {
        let d = DateTime::from_timestamp(NOW - 1800, 0).unwrap().fixed_offset();
        let data = Fixed {
            text: "",
            num: None,
            date: Some(d),
        };
        assert_eq!(render("%[%H:%M]", &data, 80), "02:34");
        assert_eq!(render("%[!%Y]", &data, 80), "2024");
        assert_eq!(render("%<[1H?new&old>", &data, 80), "new");
        assert_eq!(render("%<[10M?new&old>", &data, 80), "old");
        assert_eq!(render("%<[0d?today&before>", &data, 80), "today");
        assert_eq!(render("%[%Q]", &data, 80), "");
    }

    #[test]
    fn calendar_cutoffs() {
        let now = DateTime::from_timestamp(NOW, 0).unwrap().fixed_offset();
        let c = cutoff(now, 1, DateUnit::Month).unwrap();
        assert_eq!(c.format("%Y-%m-%d").to_string(), "2023-12-02");
        let c = cutoff(now, 0, DateUnit::Year).unwrap();
        assert_eq!(c.format("%Y-%m-%d %H").to_string(), "2024-01-01 00");
        // 2024-01-02 is a Tuesday; weeks start on Sunday.
        let c = cutoff(now, 0, DateUnit::Week).unwrap();
        assert_eq!(c.format("%Y-%m-%d").to_string(), "2023-12-31");
    }
}
