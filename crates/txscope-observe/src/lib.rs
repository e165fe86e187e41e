//! Observability setup for txscope: tracing subscriber initialization and
//! OpenTelemetry database attribute names.

pub mod db_attrs;
pub mod tracing_setup;
