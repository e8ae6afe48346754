//! Observability for AeroStore
//!
//! Structured logging through `tracing`. Request spans come from the
//! `TraceLayer` on the HTTP router.

mod logging;

pub use logging::{init_logging, LogFormat, DEFAULT_FILTER};
