//! # formish-rs-forms
//!
//! The form facade for formish-rs: binds a schema tree to submitted HTML
//! form data and back. Provides the type converter registry, widgets,
//! bound fields for template rendering, the validation pipeline, and a
//! staging file store for uploads.
//!
//! The library never produces HTML; bound fields expose everything a
//! templating engine needs (names, titles, CSS classes, raw values,
//! errors) and widgets define the wire encoding per field.

pub mod binder;
pub mod converter;
pub mod error;
pub mod field;
pub mod filestore;
pub mod form;
pub mod widgets;

pub use converter::ConverterOptions;
pub use error::{ConversionError, ErrorMap, FieldError, FormError};
pub use field::{BoundField, BoundGroup, BoundItem, BoundSequence};
pub use filestore::{FileStore, TempFileStore};
pub use form::{Action, FieldOptions, Form, Method, FORM_MARKER};
pub use widgets::Widget;
