//! Observability for repair runs
//!
//! Per-record skip/repair decisions are reported as structured JSON lines.
//! Logging is a side channel: it never changes what a run does, and nothing
//! downstream depends on its text.
//!
//! ```ignore
//! use resetpv::observability::{log_event, Event};
//!
//! log_event(Event::RecordSkipped, &[("key", "/registry/persistentvolumes/pv-1")]);
//! ```

mod events;
mod logger;
mod timer;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use timer::Timer;

/// Render a boolean as a log field value
pub fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
