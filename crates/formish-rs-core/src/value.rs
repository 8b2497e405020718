//! The typed value model for converted form data.
//!
//! [`Value`] is the universal representation of data after conversion from
//! submitted strings: the output of a successful `validate()` is a
//! [`Value::Map`] shaped like the schema tree. The set of variants is
//! closed and matches the schema's leaf and composite types.

use std::collections::BTreeMap;
use std::fmt;

/// A typed form value.
///
/// # Examples
///
/// ```
/// use formish_rs_core::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v, Value::String("hello".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// No value. Empty submissions for optional fields convert to `Null`.
    Null,
    /// A UTF-8 string.
    String(String),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// An exact decimal number, kept as its validated digit string so that
    /// redisplay reproduces the submitted text without precision loss.
    Decimal(String),
    /// A boolean value.
    Bool(bool),
    /// A date without time.
    Date(chrono::NaiveDate),
    /// A time without date.
    Time(chrono::NaiveTime),
    /// An uploaded file reference.
    File(FileValue),
    /// A variable-length list (schema sequences).
    List(Vec<Value>),
    /// A fixed-arity tuple (schema tuples).
    Tuple(Vec<Value>),
    /// Named children (schema structures).
    Map(BTreeMap<String, Value>),
}

/// A reference to an uploaded file.
///
/// The binder never holds file bytes; it pairs a storage key with the
/// metadata needed to redisplay and fetch the content lazily through a
/// file store. A `FileValue` with no `key` marks an unchanged, previously
/// stored file.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct FileValue {
    /// Storage key under which the bytes can be fetched, if any.
    pub key: Option<String>,
    /// The original client-side filename.
    pub filename: Option<String>,
    /// The declared MIME type.
    pub mimetype: Option<String>,
}

impl FileValue {
    /// Creates a file reference for freshly stored content.
    pub fn new(
        key: impl Into<String>,
        filename: impl Into<String>,
        mimetype: impl Into<String>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            filename: Some(filename.into()),
            mimetype: Some(mimetype.into()),
        }
    }

    /// A placeholder marking that an already-stored file was left unchanged.
    pub const fn unchanged() -> Self {
        Self {
            key: None,
            filename: None,
            mimetype: None,
        }
    }

    /// Returns `true` if this reference marks an unchanged stored file.
    pub const fn is_unchanged(&self) -> bool {
        self.key.is_none()
    }
}

impl Value {
    /// Builds a `Value::Map` from an iterator of `(name, value)` pairs.
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a `Value::List` from an iterator of values.
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Returns the named child of a `Map`, if present.
    pub fn get(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Returns the indexed child of a `List` or `Tuple`, if present.
    pub fn at(&self, index: usize) -> Option<&Self> {
        match self {
            Self::List(items) | Self::Tuple(items) => items.get(index),
            _ => None,
        }
    }

    /// Whether this value counts as empty for required checks and for
    /// trimming trailing blank sequence items.
    ///
    /// `Null` and `""` are empty; a container is empty when every child is;
    /// every other scalar is non-empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) | Self::Tuple(items) => items.iter().all(Self::is_empty),
            Self::Map(map) => map.values().all(Self::is_empty),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::String(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::File(file) => write!(f, "{}", file.filename.as_deref().unwrap_or("")),
            Self::List(items) | Self::Tuple(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<chrono::NaiveTime> for Value {
    fn from(v: chrono::NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
