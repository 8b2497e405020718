//! Validators applied to converted form data.
//!
//! A [`Validator`] checks one typed value and fails with an [`Invalid`]
//! carrying a user-facing message. The `All` and `Any` combinators
//! aggregate child validators; their failures keep the children's messages
//! in declaration order as nested causes.

use std::fmt;

use regex::Regex;
use thiserror::Error;

use formish_rs_core::Value;

/// A failed validation.
///
/// Combinator failures carry the individual failures, first-to-last in
/// validator declaration order, in `causes`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Invalid {
    /// The user-facing message.
    pub message: String,
    /// Nested failures for combinator validators.
    pub causes: Vec<Invalid>,
}

impl Invalid {
    /// Creates a simple validation failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Creates a combinator failure from its child failures.
    ///
    /// The message joins the child messages in order.
    pub fn combined(causes: Vec<Self>) -> Self {
        let message = causes
            .iter()
            .map(|c| c.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        Self { message, causes }
    }

    /// All messages carried by this failure, depth-first, in declaration
    /// order. A simple failure yields its own message only.
    pub fn messages(&self) -> Vec<&str> {
        if self.causes.is_empty() {
            return vec![self.message.as_str()];
        }
        self.causes.iter().flat_map(Invalid::messages).collect()
    }
}

/// A validation rule for one schema attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// The value must be non-empty.
    Required,
    /// String/list length bounds, ignored for empty values.
    Length {
        /// Minimum length.
        min: Option<usize>,
        /// Maximum length.
        max: Option<usize>,
    },
    /// Numeric bounds, ignored for empty values.
    Range {
        /// Minimum value.
        min: Option<f64>,
        /// Maximum value.
        max: Option<f64>,
    },
    /// The string value must match this pattern in full.
    Pattern(String),
    /// All child validators must pass; failures aggregate.
    All(Vec<Validator>),
    /// At least one child validator must pass.
    Any(Vec<Validator>),
}

impl Validator {
    /// Shorthand for [`Validator::Required`].
    pub const fn required() -> Self {
        Self::Required
    }

    /// Length bounds.
    pub const fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Self::Length { min, max }
    }

    /// Numeric bounds.
    pub const fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range { min, max }
    }

    /// Full-match pattern.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// All of the given validators, in order.
    pub fn all(validators: impl IntoIterator<Item = Self>) -> Self {
        Self::All(validators.into_iter().collect())
    }

    /// Any of the given validators.
    pub fn any(validators: impl IntoIterator<Item = Self>) -> Self {
        Self::Any(validators.into_iter().collect())
    }

    /// Whether this validator (or any nested child) is `Required`.
    ///
    /// Used to derive a field's required-ness for rendering.
    pub fn includes_required(&self) -> bool {
        match self {
            Self::Required => true,
            Self::All(children) | Self::Any(children) => {
                children.iter().any(Self::includes_required)
            }
            _ => false,
        }
    }

    /// Validates a converted value.
    pub fn validate(&self, value: &Value) -> Result<(), Invalid> {
        match self {
            Self::Required => {
                if value.is_empty() {
                    Err(Invalid::new("is required"))
                } else {
                    Ok(())
                }
            }
            Self::Length { min, max } => {
                if value.is_empty() {
                    return Ok(());
                }
                let Some(len) = value_length(value) else {
                    return Ok(());
                };
                if let Some(min) = min {
                    if len < *min {
                        return Err(Invalid::new(format!(
                            "must be at least {min} characters long"
                        )));
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        return Err(Invalid::new(format!(
                            "must be at most {max} characters long"
                        )));
                    }
                }
                Ok(())
            }
            Self::Range { min, max } => {
                if value.is_empty() {
                    return Ok(());
                }
                let Some(n) = numeric_value(value) else {
                    return Ok(());
                };
                if let Some(min) = min {
                    if n < *min {
                        return Err(Invalid::new(format!("must be {min} or greater")));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(Invalid::new(format!("must be {max} or less")));
                    }
                }
                Ok(())
            }
            Self::Pattern(pattern) => {
                if value.is_empty() {
                    return Ok(());
                }
                let Value::String(s) = value else {
                    return Ok(());
                };
                let re = Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|e| Invalid::new(format!("invalid pattern: {e}")))?;
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(Invalid::new("does not match the expected pattern"))
                }
            }
            Self::All(children) => {
                let causes: Vec<Invalid> = children
                    .iter()
                    .filter_map(|v| v.validate(value).err())
                    .collect();
                if causes.is_empty() {
                    Ok(())
                } else {
                    Err(Invalid::combined(causes))
                }
            }
            Self::Any(children) => {
                let mut causes = Vec::new();
                for child in children {
                    match child.validate(value) {
                        Ok(()) => return Ok(()),
                        Err(err) => causes.push(err),
                    }
                }
                if causes.is_empty() {
                    Ok(())
                } else {
                    Err(Invalid::combined(causes))
                }
            }
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "Required"),
            Self::Length { min, max } => write!(f, "Length(min={min:?}, max={max:?})"),
            Self::Range { min, max } => write!(f, "Range(min={min:?}, max={max:?})"),
            Self::Pattern(p) => write!(f, "Pattern({p:?})"),
            Self::All(children) => write!(f, "All({} validators)", children.len()),
            Self::Any(children) => write!(f, "Any({} validators)", children.len()),
        }
    }
}

fn value_length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::List(items) | Value::Tuple(items) => Some(items.len()),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        // Lossy above 2^53; range bounds are far smaller in practice.
        Value::Int(i) => Some(*i as f64),
        Value::Float(v) => Some(*v),
        Value::Decimal(s) => s.parse().ok(),
        _ => None,
    }
}
