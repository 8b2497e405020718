//! # formish-rs-schema
//!
//! The declarative schema layer for formish-rs: a typed tree of leaf and
//! composite attributes ([`Attribute`], [`SchemaType`]) plus the validator
//! vocabulary ([`Validator`], [`Invalid`]) applied to converted data.
//!
//! The schema carries no form or widget knowledge; the forms crate binds
//! attributes to dotted paths and widgets at render/validate time.

pub mod attr;
pub mod validators;

pub use attr::{Attribute, SchemaType};
pub use validators::{Invalid, Validator};
