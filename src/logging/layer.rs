use std::fmt;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::testing::TestingT;

/// Forwards `tracing` events to [`TestingT::log`].
///
/// Each event becomes one line:
/// `outer.inner.level=INFO outer.inner.key=value message`. The names of
/// the enclosing spans, outermost first, prefix every key; span fields come
/// before the event's own fields.
pub struct TestLayer<T> {
    t: T,
}

impl<T: TestingT> TestLayer<T> {
    pub fn new(t: T) -> Self {
        TestLayer { t }
    }
}

/// Fields recorded on a span, kept in its extensions.
#[derive(Default)]
struct SpanFields(Vec<(String, String)>);

#[derive(Default)]
struct FieldCollector {
    fields: Vec<(String, String)>,
    message: String,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

impl<S, T> Layer<S> for TestLayer<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    T: TestingT + Send + Sync + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut collector = FieldCollector::default();
        attrs.record(&mut collector);
        span.extensions_mut().insert(SpanFields(collector.fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut collector = FieldCollector::default();
        values.record(&mut collector);
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.0.extend(collector.fields),
            None => extensions.insert(SpanFields(collector.fields)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut prefix = String::new();
        let mut fields = Vec::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                prefix.push_str(span.name());
                prefix.push('.');
                if let Some(recorded) = span.extensions().get::<SpanFields>() {
                    fields.extend(recorded.0.iter().cloned());
                }
            }
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        fields.extend(collector.fields);

        let mut line = format!("{prefix}level={}", event.metadata().level());
        for (key, value) in &fields {
            line.push_str(&format!(" {prefix}{key}={value}"));
        }
        self.t.log(&format!("{line} {}", collector.message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    use crate::double::{Fake, Spy};

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let spy = Arc::new(Spy::new(Fake::new()));
        let subscriber = Registry::default().with(TestLayer::new(Arc::clone(&spy)));
        tracing::subscriber::with_default(subscriber, f);
        spy.logs()
    }

    #[test]
    fn plain_events() {
        let logs = capture(|| tracing::info!(user = "bob", attempt = 2, "signed in"));
        assert_eq!(logs, vec!["level=INFO user=bob attempt=2 signed in"]);
    }

    #[test]
    fn spans_group_fields() {
        let logs = capture(|| {
            let request = tracing::info_span!("request", id = 7);
            let _request = request.enter();
            let auth = tracing::debug_span!("auth");
            let _auth = auth.enter();
            tracing::warn!(user = "bob", "denied");
        });
        assert_eq!(
            logs,
            vec!["request.auth.level=WARN request.auth.id=7 request.auth.user=bob denied"]
        );
    }

    #[test]
    fn fields_recorded_later() {
        let logs = capture(|| {
            let span = tracing::info_span!("job", status = tracing::field::Empty);
            span.record("status", "done");
            let _job = span.enter();
            tracing::info!("finished");
        });
        assert_eq!(logs, vec!["job.level=INFO job.status=done finished"]);
    }
}
