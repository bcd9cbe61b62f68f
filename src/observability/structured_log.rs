//! Mirror of warning/error events as single-line JSON for log shippers.

use serde_json::json;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub(crate) struct StructuredLogLayer;

impl<S: Subscriber> Layer<S> for StructuredLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        use tracing::field::Visit;

        // Only the levels an alerting pipeline cares about.
        if !matches!(
            event.metadata().level(),
            &tracing::Level::ERROR | &tracing::Level::WARN
        ) {
            return;
        }

        struct JsonVisitor {
            fields: serde_json::Map<String, serde_json::Value>,
        }

        impl Visit for JsonVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                self.fields
                    .insert(field.name().to_string(), json!(format!("{value:?}")));
            }

            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                self.fields.insert(field.name().to_string(), json!(value));
            }

            fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
                self.fields.insert(field.name().to_string(), json!(value));
            }

            fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
                self.fields.insert(field.name().to_string(), json!(value));
            }

            fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
                self.fields.insert(field.name().to_string(), json!(value));
            }

            fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
                self.fields.insert(field.name().to_string(), json!(value));
            }
        }

        let mut visitor = JsonVisitor {
            fields: serde_json::Map::new(),
        };
        event.record(&mut visitor);

        let entry = json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "service": "gaplens",
            "level": event.metadata().level().as_str(),
            "target": event.metadata().target(),
            "fields": visitor.fields,
        });

        eprintln!("{}", serde_json::to_string(&entry).unwrap_or_default());
    }
}
