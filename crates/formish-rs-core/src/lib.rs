//! # formish-rs-core
//!
//! Foundation types for the formish-rs form library. This crate has no
//! dependency on the schema or widget layers and provides:
//!
//! - [`error`] - Error types for dotted-key structure manipulation
//! - [`value`] - The typed [`Value`](value::Value) data model for converted form data
//! - [`dotted`] - The dotted-key codec between flat payloads and nested data
//! - [`form_data`] - The flat, multi-valued submitted payload
//! - [`text`] - Naming helpers (titles, identifiers, CSS classes)
//! - [`logging`] - Tracing-based logging setup

pub mod dotted;
pub mod error;
pub mod form_data;
pub mod logging;
pub mod text;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use dotted::RawData;
pub use error::{DottedError, DottedResult};
pub use form_data::FormData;
pub use value::{FileValue, Value};
