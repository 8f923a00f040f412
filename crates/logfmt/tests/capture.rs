#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use logfmt::{RenderedLog, render_event};
    use tracing::{Event, Subscriber, debug, info};
    use tracing_subscriber::{
        layer::{Context, Layer},
        prelude::*,
    };

    /// Collects every rendered event.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<RenderedLog>>>);

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(render_event(event));
        }
    }

    #[test]
    fn events_render_with_fields() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            info!(target: "hooks::dispatch", file = "hooks.rc", line = 3, "sourced");
            debug!(target: "pattern::exec", op = %'~', "no mailbox");
        });

        let logs = capture.0.lock().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, "INFO");
        assert_eq!(logs[0].message, "sourced");
        assert_eq!(
            logs[0].fields,
            [("file".to_string(), "hooks.rc".to_string()), ("line".to_string(), "3".to_string())]
        );
        assert_eq!(
            logs[1].to_line(),
            "level=debug target=pattern::exec msg=\"no mailbox\" op=~"
        );
    }
}
