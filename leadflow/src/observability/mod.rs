//! Observability utilities: stage span timing and subscriber setup.

mod spans;
mod subscriber;

pub use spans::{stage_span, SpanTimer, StageSpanAttributes};
pub use subscriber::{init_tracing, LogFormat};
