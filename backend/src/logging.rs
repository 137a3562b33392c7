use std::fmt::Display;

use tracing::{Event, Subscriber};
use tracing_log::NormalizeEvent;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::Context, EnvFilter, Layer, Registry};

const DEFAULT_FILTER: &str = "warn,wheel_backend=info,wheel_shared=info,tower_http=warn";

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }
}

/// Renders one event as a log line, or `None` when it should not be printed.
/// Records forwarded from `log` are printed under their own target, not `log`.
fn format_event(event: &Event<'_>, timestamp: impl Display) -> Option<String> {
    let normalized = event.normalized_metadata();
    let metadata = normalized.as_ref().unwrap_or_else(|| event.metadata());
    let target = metadata.target();

    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    if visitor.0.is_empty() {
        return None;
    }

    match metadata.level().as_str() {
        "ERROR" => Some(format!("[{}] ❌ Error: {} - {}", timestamp, target, visitor.0)),
        "WARN" => Some(format!("[{}] ⚠️ Warning: {} - {}", timestamp, target, visitor.0)),
        "INFO" => Some(format!("[{}] ℹ️ {} - {}", timestamp, target, visitor.0)),
        // Per-crossing ticks are only worth seeing from the wheel crates
        "DEBUG" if target.contains("wheel") => Some(format!("[{}] 🔄 {} - {}", timestamp, target, visitor.0)),
        _ => None,
    }
}

struct CustomLayer;

impl<S: Subscriber> Layer<S> for CustomLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        if let Some(line) = format_event(event, timestamp) {
            println!("{}", line);
        }
    }
}

/// Installs the global subscriber. `log` records from the shared crate are
/// forwarded into it.
pub fn setup() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    Registry::default().with(env_filter).with(CustomLayer).try_init()
}
