//! Widgets: per-field strategies for moving between typed values and the
//! raw request-data shapes a browser submits.
//!
//! Each widget knows three things about its field: how to serialize a
//! typed value into request-data form for display
//! ([`to_request_data`](Widget::to_request_data)), how to normalize raw
//! submitted data before conversion ([`pre_parse`](Widget::pre_parse)),
//! and how to convert submitted data into a typed value
//! ([`from_request_data`](Widget::from_request_data)).
//!
//! The set of widgets is a closed enum; container widgets
//! (`SequenceDefault`, `StructureDefault`) mark composites whose children
//! the binder recurses into, while every other widget is a leaf whatever
//! its schema type — a sequence rendered as a delimited text input is a
//! leaf from the binder's point of view.

use std::collections::BTreeMap;
use std::sync::Arc;

use formish_rs_core::{FileValue, RawData, Value};
use formish_rs_schema::{Attribute, SchemaType};

use crate::converter::{self, ConverterOptions};
use crate::error::ConversionError;
use crate::filestore::FileStore;

/// A field's rendering/binding strategy.
#[derive(Debug, Clone)]
pub enum Widget {
    /// A single-line text input.
    Input {
        /// Strip surrounding whitespace on submit.
        strip: bool,
    },
    /// A password input; values are never echoed back.
    Password {
        /// Strip surrounding whitespace on submit.
        strip: bool,
    },
    /// A hidden input.
    Hidden {
        /// Strip surrounding whitespace on submit.
        strip: bool,
    },
    /// Two inputs whose values must match.
    CheckedInput {
        /// Strip surrounding whitespace before comparing.
        strip: bool,
    },
    /// Password plus confirmation; values must match.
    CheckedPassword {
        /// Strip surrounding whitespace before comparing.
        strip: bool,
    },
    /// A multi-line text area. Sequence fields bound to a textarea use a
    /// newline delimiter, one item per line.
    Textarea {
        /// Strip surrounding whitespace on submit.
        strip: bool,
        /// Rendering hint for the `cols` attribute.
        cols: Option<u32>,
        /// Rendering hint for the `rows` attribute.
        rows: Option<u32>,
    },
    /// A checkbox; an empty submission means unchecked.
    Checkbox,
    /// Three inputs for year, month, and day.
    DateParts {
        /// Render the day input first.
        day_first: bool,
    },
    /// A single-choice select element.
    SelectChoice {
        /// `(value, label)` pairs.
        options: Vec<(String, String)>,
        /// The unselected option, e.g. `("", "- choose -")`.
        none_option: Option<(String, String)>,
    },
    /// A single-choice radio group.
    RadioChoice {
        /// `(value, label)` pairs.
        options: Vec<(String, String)>,
    },
    /// A checkbox group bound to a sequence; submits repeated values
    /// under one key.
    CheckboxMultiChoice {
        /// `(value, label)` pairs.
        options: Vec<(String, String)>,
    },
    /// A file upload backed by a [`FileStore`].
    FileUpload {
        /// Staging store for uploaded content.
        store: Arc<dyn FileStore>,
    },
    /// The default container widget for schema sequences.
    SequenceDefault {
        /// Minimum number of items to show.
        min: Option<usize>,
        /// Maximum number of items to show.
        max: Option<usize>,
        /// Trim trailing empty items on submit.
        strip_empty: bool,
    },
    /// The default container widget for schema structures.
    StructureDefault,
}

impl Widget {
    /// A stripping text input.
    pub const fn input() -> Self {
        Self::Input { strip: true }
    }

    /// A password input.
    pub const fn password() -> Self {
        Self::Password { strip: true }
    }

    /// A hidden input.
    pub const fn hidden() -> Self {
        Self::Hidden { strip: true }
    }

    /// A checked (enter-twice) input.
    pub const fn checked_input() -> Self {
        Self::CheckedInput { strip: true }
    }

    /// A password with confirmation.
    pub const fn checked_password() -> Self {
        Self::CheckedPassword { strip: true }
    }

    /// A text area.
    pub const fn textarea() -> Self {
        Self::Textarea {
            strip: true,
            cols: None,
            rows: None,
        }
    }

    /// A checkbox.
    pub const fn checkbox() -> Self {
        Self::Checkbox
    }

    /// A year/month/day part input.
    pub const fn date_parts() -> Self {
        Self::DateParts { day_first: false }
    }

    /// A select element with a default "- choose -" none option.
    pub fn select<S: Into<String>>(options: impl IntoIterator<Item = (S, S)>) -> Self {
        Self::SelectChoice {
            options: collect_options(options),
            none_option: Some((String::new(), "- choose -".to_string())),
        }
    }

    /// A radio group.
    pub fn radio<S: Into<String>>(options: impl IntoIterator<Item = (S, S)>) -> Self {
        Self::RadioChoice {
            options: collect_options(options),
        }
    }

    /// A checkbox group for a sequence field.
    pub fn checkbox_multi<S: Into<String>>(options: impl IntoIterator<Item = (S, S)>) -> Self {
        Self::CheckboxMultiChoice {
            options: collect_options(options),
        }
    }

    /// A file upload staging into `store`.
    pub fn file_upload(store: Arc<dyn FileStore>) -> Self {
        Self::FileUpload { store }
    }

    /// The default sequence container.
    pub const fn sequence() -> Self {
        Self::SequenceDefault {
            min: None,
            max: None,
            strip_empty: true,
        }
    }

    /// A sequence container with cardinality bounds.
    pub const fn sequence_bounded(min: Option<usize>, max: Option<usize>) -> Self {
        Self::SequenceDefault {
            min,
            max,
            strip_empty: true,
        }
    }

    /// The default structure container.
    pub const fn structure() -> Self {
        Self::StructureDefault
    }

    /// The default widget for a schema attribute.
    pub fn default_for(attr: &Attribute) -> Self {
        match &attr.schema_type {
            SchemaType::Structure(_) => Self::structure(),
            SchemaType::Sequence(_) => Self::sequence(),
            _ => Self::input(),
        }
    }

    /// A short lowercase name, used in CSS classes.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Password { .. } => "password",
            Self::Hidden { .. } => "hidden",
            Self::CheckedInput { .. } => "checkedinput",
            Self::CheckedPassword { .. } => "checkedpassword",
            Self::Textarea { .. } => "textarea",
            Self::Checkbox => "checkbox",
            Self::DateParts { .. } => "dateparts",
            Self::SelectChoice { .. } => "selectchoice",
            Self::RadioChoice { .. } => "radiochoice",
            Self::CheckboxMultiChoice { .. } => "checkboxmultichoice",
            Self::FileUpload { .. } => "fileupload",
            Self::SequenceDefault { .. } => "sequence",
            Self::StructureDefault => "structure",
        }
    }

    /// Whether the binder recurses into this widget's children.
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::SequenceDefault { .. } | Self::StructureDefault)
    }

    /// Cardinality bounds declared by a sequence container.
    pub const fn sequence_bounds(&self) -> (Option<usize>, Option<usize>) {
        match self {
            Self::SequenceDefault { min, max, .. } => (*min, *max),
            _ => (None, None),
        }
    }

    /// Whether trailing empty sequence items are trimmed on submit.
    pub const fn strips_empty(&self) -> bool {
        matches!(self, Self::SequenceDefault { strip_empty: true, .. })
    }

    /// The `(value, label)` choices of a choice widget.
    pub fn options(&self) -> &[(String, String)] {
        match self {
            Self::SelectChoice { options, .. }
            | Self::RadioChoice { options }
            | Self::CheckboxMultiChoice { options } => options,
            _ => &[],
        }
    }

    /// Converter options this widget threads into conversion.
    pub const fn converter_options(&self) -> ConverterOptions {
        match self {
            Self::Textarea { .. } => ConverterOptions::with_delimiter('\n'),
            _ => ConverterOptions::with_delimiter(','),
        }
    }

    /// The request-data shape of "nothing submitted / nothing to show".
    pub fn none_value(&self) -> RawData {
        match self {
            Self::CheckedInput { .. } | Self::CheckedPassword { .. } => {
                let (first, second) = self.pair_subfields();
                let mut map = BTreeMap::new();
                map.insert(first.to_string(), RawData::value(""));
                map.insert(second.to_string(), RawData::value(""));
                RawData::Map(map)
            }
            Self::DateParts { .. } => {
                let mut map = BTreeMap::new();
                map.insert("year".to_string(), RawData::value(""));
                map.insert("month".to_string(), RawData::value(""));
                map.insert("day".to_string(), RawData::value(""));
                RawData::Map(map)
            }
            Self::FileUpload { .. } => {
                let mut map = BTreeMap::new();
                map.insert("name".to_string(), RawData::value(""));
                map.insert("default".to_string(), RawData::value(""));
                map.insert("mimetype".to_string(), RawData::value(""));
                RawData::Map(map)
            }
            Self::CheckboxMultiChoice { .. } => RawData::Values(Vec::new()),
            Self::SelectChoice { none_option, .. } => {
                RawData::value(none_option.as_ref().map_or("", |(v, _)| v.as_str()))
            }
            Self::SequenceDefault { .. } => RawData::List(Vec::new()),
            Self::StructureDefault => RawData::empty_map(),
            _ => RawData::value(""),
        }
    }

    /// Serializes a typed value into request-data form for display.
    pub fn to_request_data(&self, attr: &Attribute, value: &Value) -> RawData {
        let options = self.converter_options();
        match self {
            Self::CheckedInput { .. } | Self::CheckedPassword { .. } => {
                let s = converter::from_value(attr, value, &options).unwrap_or_default();
                let (first, second) = self.pair_subfields();
                let mut map = BTreeMap::new();
                map.insert(first.to_string(), RawData::value(s.clone()));
                map.insert(second.to_string(), RawData::value(s));
                RawData::Map(map)
            }
            Self::DateParts { .. } => {
                let (y, m, d) = converter::date_to_parts(value);
                let mut map = BTreeMap::new();
                map.insert("year".to_string(), RawData::value(y));
                map.insert("month".to_string(), RawData::value(m));
                map.insert("day".to_string(), RawData::value(d));
                RawData::Map(map)
            }
            Self::CheckboxMultiChoice { .. } => {
                let element = attr.element().unwrap_or(attr);
                match value {
                    Value::List(items) => RawData::Values(
                        items
                            .iter()
                            .map(|item| {
                                converter::from_value(element, item, &options).unwrap_or_default()
                            })
                            .collect(),
                    ),
                    _ => self.none_value(),
                }
            }
            Self::FileUpload { .. } => {
                let (name, mimetype) = match value {
                    Value::File(file) => (
                        file.key
                            .clone()
                            .or_else(|| file.filename.clone())
                            .unwrap_or_default(),
                        file.mimetype.clone().unwrap_or_default(),
                    ),
                    _ => (String::new(), String::new()),
                };
                let mut map = BTreeMap::new();
                map.insert("name".to_string(), RawData::value(name.clone()));
                map.insert("default".to_string(), RawData::value(name));
                map.insert("mimetype".to_string(), RawData::value(mimetype));
                RawData::Map(map)
            }
            Self::SequenceDefault { .. } | Self::StructureDefault => self.none_value(),
            _ => converter::from_value(attr, value, &options)
                .map_or_else(|| self.none_value(), RawData::value),
        }
    }

    /// Normalizes raw submitted data before conversion.
    ///
    /// Missing data becomes the widget's none-value shape, and the upload
    /// widget swaps file content for a store key here so that request data
    /// round-trips symmetrically.
    pub fn pre_parse(
        &self,
        _attr: &Attribute,
        raw: Option<RawData>,
    ) -> Result<RawData, ConversionError> {
        match self {
            Self::FileUpload { store } => {
                let mut data = match raw {
                    Some(data @ RawData::Map(_)) => data,
                    _ => self.none_value(),
                };
                let removed = data
                    .get_opt("remove")
                    .and_then(RawData::first)
                    .is_some_and(|v| !v.is_empty());
                if removed {
                    if let RawData::Map(map) = &mut data {
                        map.insert("name".to_string(), RawData::value(""));
                        map.insert("mimetype".to_string(), RawData::value(""));
                        map.remove("remove");
                        map.remove("file");
                    }
                    return Ok(data);
                }
                let content = data
                    .get_opt("file")
                    .and_then(RawData::first)
                    .unwrap_or("")
                    .to_string();
                if !content.is_empty() {
                    let filename = data
                        .get_opt("filename")
                        .and_then(RawData::first)
                        .unwrap_or("upload")
                        .to_string();
                    let key = store.store(content.as_bytes(), &filename).map_err(|err| {
                        tracing::warn!(%err, "failed to stage uploaded file");
                        ConversionError::new("Failed to store the uploaded file")
                    })?;
                    if let RawData::Map(map) = &mut data {
                        map.insert("name".to_string(), RawData::value(key));
                        map.remove("file");
                    }
                }
                Ok(data)
            }
            Self::CheckboxMultiChoice { .. } => {
                Ok(raw.unwrap_or_else(|| RawData::Values(Vec::new())))
            }
            _ => Ok(raw.unwrap_or_else(|| self.none_value())),
        }
    }

    /// Converts submitted data into a typed value.
    pub fn from_request_data(
        &self,
        attr: &Attribute,
        raw: &RawData,
    ) -> Result<Value, ConversionError> {
        let options = self.converter_options();
        match self {
            Self::Input { strip }
            | Self::Password { strip }
            | Self::Hidden { strip }
            | Self::Textarea { strip, .. } => {
                let first = raw.first().unwrap_or("");
                let s = if *strip { first.trim() } else { first };
                converter::to_value(attr, s, &options)
            }
            Self::Checkbox => {
                let first = raw.first().unwrap_or("");
                if first.is_empty() {
                    if matches!(attr.schema_type, SchemaType::Boolean) {
                        Ok(Value::Bool(false))
                    } else {
                        Ok(Value::Null)
                    }
                } else {
                    converter::to_value(attr, first, &options)
                }
            }
            Self::CheckedInput { strip } | Self::CheckedPassword { strip } => {
                let (first_key, second_key) = self.pair_subfields();
                let a = raw.get_opt(first_key).and_then(RawData::first).unwrap_or("");
                let b = raw
                    .get_opt(second_key)
                    .and_then(RawData::first)
                    .unwrap_or("");
                let (a, b) = if *strip {
                    (a.trim(), b.trim())
                } else {
                    (a, b)
                };
                if a != b {
                    return Err(ConversionError::new(self.mismatch_message()));
                }
                if a.is_empty() {
                    return Ok(Value::Null);
                }
                converter::to_value(attr, a, &options)
            }
            Self::DateParts { .. } => {
                let part = |key: &str| {
                    raw.get_opt(key)
                        .and_then(RawData::first)
                        .unwrap_or("")
                        .to_string()
                };
                converter::date_from_parts(&part("year"), &part("month"), &part("day"))
            }
            Self::SelectChoice { none_option, .. } => {
                let none = none_option.as_ref().map_or("", |(v, _)| v.as_str());
                let first = raw.first().unwrap_or("");
                if first.is_empty() || first == none {
                    Ok(Value::Null)
                } else {
                    converter::to_value(attr, first, &options)
                }
            }
            Self::RadioChoice { .. } => {
                let first = raw.first().unwrap_or("");
                if first.is_empty() {
                    Ok(Value::Null)
                } else {
                    converter::to_value(attr, first, &options)
                }
            }
            Self::CheckboxMultiChoice { .. } => {
                let element = attr.element().unwrap_or(attr);
                let values: &[String] = raw.as_values().unwrap_or(&[]);
                let items = values
                    .iter()
                    .map(|v| converter::to_value(element, v, &options))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(items))
            }
            Self::FileUpload { .. } => {
                let field = |key: &str| raw.get_opt(key).and_then(RawData::first).unwrap_or("");
                let name = field("name");
                if name.is_empty() {
                    return Ok(Value::Null);
                }
                if name == field("default") {
                    return Ok(Value::File(FileValue::unchanged()));
                }
                let mimetype = field("mimetype");
                Ok(Value::File(FileValue {
                    key: Some(name.to_string()),
                    filename: Some(name.to_string()),
                    mimetype: if mimetype.is_empty() {
                        None
                    } else {
                        Some(mimetype.to_string())
                    },
                }))
            }
            Self::SequenceDefault { .. } | Self::StructureDefault => Err(ConversionError::new(
                "A container widget has no direct value",
            )),
        }
    }

    const fn pair_subfields(&self) -> (&'static str, &'static str) {
        match self {
            Self::CheckedPassword { .. } => ("password", "confirm"),
            _ => ("input", "confirm"),
        }
    }

    const fn mismatch_message(&self) -> &'static str {
        match self {
            Self::CheckedPassword { .. } => "Password did not match",
            _ => "Fields did not match",
        }
    }
}

fn collect_options<S: Into<String>>(
    options: impl IntoIterator<Item = (S, S)>,
) -> Vec<(String, String)> {
    options
        .into_iter()
        .map(|(v, l)| (v.into(), l.into()))
        .collect()
}
