//! A `tracing-subscriber` event formatter that writes logfmt lines.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::{
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    registry::LookupSpan,
};

/// Formats each event with [`logfmt::render_event`], one line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogfmtFormat;

impl<S, N> FormatEvent<S, N> for LogfmtFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writeln!(writer, "{}", logfmt::render_event(event).to_line())
    }
}
