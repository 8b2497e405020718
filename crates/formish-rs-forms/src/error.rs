//! Error types for conversion and form validation.
//!
//! Conversion and validator failures are caught per field and aggregated
//! into the form's error map; structural problems (a payload that does not
//! belong to this form, a conflicting dotted assignment, a missing action)
//! propagate immediately as [`FormError`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use formish_rs_core::DottedError;
use formish_rs_schema::Invalid;

/// A string-to-type conversion failure.
///
/// Always carries a user-facing message suitable for display next to the
/// field ("Not a valid number", "Invalid date", ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ConversionError {
    /// The user-facing message.
    pub message: String,
}

impl ConversionError {
    /// Creates a conversion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of a form's error map: either the field failed conversion or
/// it converted but failed a schema validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The submitted string could not be converted to the field's type.
    Conversion(ConversionError),
    /// The converted value failed a schema validator.
    Validation(Invalid),
}

impl FieldError {
    /// The primary user-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Conversion(err) => &err.message,
            Self::Validation(err) => &err.message,
        }
    }

    /// All messages, in declaration order for combinator validators.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            Self::Conversion(err) => vec![err.message.as_str()],
            Self::Validation(err) => err.messages(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<ConversionError> for FieldError {
    fn from(err: ConversionError) -> Self {
        Self::Conversion(err)
    }
}

impl From<Invalid> for FieldError {
    fn from(err: Invalid) -> Self {
        Self::Validation(err)
    }
}

/// Per-field failures keyed by dotted path.
pub type ErrorMap = BTreeMap<String, FieldError>;

/// Form-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The submitted payload's form marker does not match this form.
    /// Signals caller misuse, never added to the error map.
    #[error("request does not match form {expected:?} (submitted marker: {submitted:?})")]
    WrongFormName {
        /// This form's name.
        expected: String,
        /// The marker found in the payload, if any.
        submitted: Option<String>,
    },

    /// An action was dispatched on a form with no registered actions.
    #[error("the form does not have any actions")]
    NoAction,

    /// An action name was invalid or already registered.
    #[error("invalid action {name:?}: {reason}")]
    BadAction {
        /// The offending action name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A dotted field name did not resolve against the schema.
    #[error("no field named {name:?}")]
    FieldNotFound {
        /// The dotted name that was requested.
        name: String,
    },

    /// The payload could not be decoded into nested data.
    #[error(transparent)]
    Structure(#[from] DottedError),

    /// Validation failed; the form's error map holds the details and the
    /// retained request data allows an exact redisplay.
    #[error("conversion from request failed with {errors} error(s)")]
    Validation {
        /// The number of failing fields.
        errors: usize,
    },
}
