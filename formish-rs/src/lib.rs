//! # formish-rs
//!
//! Schema-driven HTML form generation and data binding.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `formish-rs` for the whole library, or on individual
//! crates for finer-grained control.
//!
//! ```
//! use formish_rs::forms::Form;
//! use formish_rs::schema::{Attribute, Validator};
//! use formish_rs::core::FormData;
//!
//! let mut form = Form::new(Attribute::structure([
//!     ("name", Attribute::string().validator(Validator::required())),
//!     ("age", Attribute::integer()),
//! ]))
//! .with_name("signup");
//!
//! let payload = FormData::parse("__formish_form__=signup&name=bob&age=30");
//! let data = form.validate(&payload).unwrap();
//! assert_eq!(data.get("age"), Some(&formish_rs::core::Value::Int(30)));
//! ```

/// Foundation types: values, the dotted-key codec, form payloads, errors.
pub use formish_rs_core as core;

/// The schema tree and validators.
pub use formish_rs_schema as schema;

/// Forms, widgets, converters, bound fields, and the file store.
pub use formish_rs_forms as forms;
