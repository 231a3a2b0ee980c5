use std::fmt;
use std::fmt::Write as _;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::redact::Redactor;

/// Collects one event's fields into a JSON object so `Redactor` can run over
/// the whole record before anything is written to the sink.
#[derive(Default)]
struct FieldCollector(Map<String, Value>);

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), Value::String(format!("{value:?}")));
    }
}

/// A `FormatEvent` that redacts sensitive field values (§7) before they are
/// serialized — so a call site that logs a struct carrying an email or
/// contact handle never reaches stdout unredacted, instead of trusting every
/// `tracing::info!`/`warn!` call site to scrub its own arguments.
struct RedactingFormatter {
    redactor: Redactor,
    json: bool,
}

impl<S, N> FormatEvent<S, N> for RedactingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let redacted = self.redactor.redact(&Value::Object(collector.0));

        let metadata = event.metadata();
        if self.json {
            let mut line = Map::with_capacity(3);
            line.insert("level".to_string(), Value::String(metadata.level().to_string()));
            line.insert("target".to_string(), Value::String(metadata.target().to_string()));
            line.insert("fields".to_string(), redacted);
            writeln!(writer, "{}", Value::Object(line))
        } else {
            write!(writer, "{} {}", metadata.level(), metadata.target())?;
            if let Value::Object(map) = &redacted {
                for (k, v) in map {
                    write!(writer, " {k}={v}")?;
                }
            }
            writeln!(writer)
        }
    }
}

/// Initializes the process-wide structured logger.
///
/// JSON output in production (`LOG_FORMAT=json`), human-readable pretty
/// output otherwise — matching the teacher's `tracing_subscriber::fmt()`
/// initialization in every binary's `main()`, routed through a redacting
/// `FormatEvent` so `Redactor` actually guards real log output.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::from_default_env().add_directive(
        default_directive
            .parse()
            .expect("default tracing directive must be valid"),
    );

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    tracing_subscriber::fmt()
        .event_format(RedactingFormatter { redactor: Redactor::default(), json })
        .with_env_filter(filter)
        .init();
}
