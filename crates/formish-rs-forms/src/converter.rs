//! String conversion for every schema leaf and composite type.
//!
//! [`from_value`] serializes a typed value to its wire string;
//! [`to_value`] parses a submitted string back, failing with a
//! [`ConversionError`] that carries a user-facing message. Dispatch is a
//! `match` over the closed [`SchemaType`] set.
//!
//! Sequences and tuples use a small delimited dialect: one CSV-quoted row
//! of converted cells (default delimiter `,`); a sequence of sequences is
//! newline-delimited rows of delimiter-joined cells. Round-trips are exact
//! for every scalar type except `Float`, whose textual form is normalized
//! by formatting (`"1.50"` parses and re-renders as `"1.5"`).

use std::sync::OnceLock;

use formish_rs_core::{FileValue, Value};
use formish_rs_schema::{Attribute, SchemaType};

use crate::error::ConversionError;

/// Options threaded from the widget into the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Cell delimiter for sequence and tuple encodings.
    pub delimiter: char,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl ConverterOptions {
    /// Options with the given delimiter.
    pub const fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }
}

/// Serializes a typed value to its wire string, `None` for `Null`.
pub fn from_value(attr: &Attribute, value: &Value, options: &ConverterOptions) -> Option<String> {
    if matches!(value, Value::Null) {
        return None;
    }
    match &attr.schema_type {
        SchemaType::String
        | SchemaType::Integer
        | SchemaType::Float
        | SchemaType::Decimal
        | SchemaType::Date
        | SchemaType::Time
        | SchemaType::Boolean => Some(value.to_string()),
        SchemaType::File => match value {
            Value::File(file) => Some(
                file.key
                    .clone()
                    .or_else(|| file.filename.clone())
                    .unwrap_or_default(),
            ),
            other => Some(other.to_string()),
        },
        SchemaType::Sequence(element) => match value {
            Value::List(items) => Some(encode_sequence(element, items, options)),
            other => Some(other.to_string()),
        },
        SchemaType::Tuple(fields) => match value {
            Value::Tuple(items) | Value::List(items) => {
                let cells: Vec<String> = fields
                    .iter()
                    .zip(items)
                    .map(|(field, item)| from_value(field, item, options).unwrap_or_default())
                    .collect();
                Some(csv_join(&cells, options.delimiter))
            }
            other => Some(other.to_string()),
        },
        SchemaType::Structure(_) => None,
    }
}

/// Parses a submitted string into a typed value.
///
/// Input is trimmed first; an empty string converts to `Null` for every
/// type (required-ness is a validator concern, not a conversion one).
pub fn to_value(
    attr: &Attribute,
    input: &str,
    options: &ConverterOptions,
) -> Result<Value, ConversionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    match &attr.schema_type {
        SchemaType::String => Ok(Value::String(input.to_string())),
        SchemaType::Integer => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConversionError::new("Not a valid number")),
        SchemaType::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ConversionError::new("Not a valid number")),
        SchemaType::Decimal => {
            if decimal_syntax().is_match(trimmed) {
                Ok(Value::Decimal(trimmed.to_string()))
            } else {
                Err(ConversionError::new("Not a valid number"))
            }
        }
        SchemaType::Boolean => match trimmed {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            other => Err(ConversionError::new(format!(
                "{other:?} should be either True or False"
            ))),
        },
        SchemaType::Date => parse_date(trimmed),
        SchemaType::Time => parse_time(trimmed),
        SchemaType::File => Ok(Value::File(FileValue {
            key: Some(trimmed.to_string()),
            filename: Some(trimmed.to_string()),
            mimetype: None,
        })),
        SchemaType::Sequence(element) => decode_sequence(element, trimmed, options),
        SchemaType::Tuple(fields) => {
            let cells = csv_split(trimmed, options.delimiter)?;
            if cells.len() != fields.len() {
                return Err(ConversionError::new(format!(
                    "Please enter {} values, separated by a '{}'",
                    fields.len(),
                    options.delimiter
                )));
            }
            let items = fields
                .iter()
                .zip(&cells)
                .map(|(field, cell)| to_value(field, cell, options))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Tuple(items))
        }
        SchemaType::Structure(_) => Err(ConversionError::new(
            "A structure cannot be entered as a single value",
        )),
    }
}

/// Splits a date value into `(year, month, day)` display strings.
///
/// Returns empty parts for anything but a date, so a fresh form renders
/// three blank inputs.
pub fn date_to_parts(value: &Value) -> (String, String, String) {
    match value {
        Value::Date(date) => {
            use chrono::Datelike;
            (
                date.year().to_string(),
                date.month().to_string(),
                date.day().to_string(),
            )
        }
        _ => (String::new(), String::new(), String::new()),
    }
}

/// Builds a date from `(year, month, day)` part strings.
///
/// An all-empty triple converts to `Null`; a partially filled or
/// out-of-range triple is an error.
pub fn date_from_parts(year: &str, month: &str, day: &str) -> Result<Value, ConversionError> {
    let (year, month, day) = (year.trim(), month.trim(), day.trim());
    if year.is_empty() && month.is_empty() && day.is_empty() {
        return Ok(Value::Null);
    }
    let invalid = || ConversionError::new("Invalid date");
    let y: i32 = year.parse().map_err(|_| invalid())?;
    let m: u32 = month.parse().map_err(|_| invalid())?;
    let d: u32 = day.parse().map_err(|_| invalid())?;
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .map(Value::Date)
        .ok_or_else(|| ConversionError::new("Invalid date: out of range"))
}

fn decimal_syntax() -> &'static regex::Regex {
    static DECIMAL: OnceLock<regex::Regex> = OnceLock::new();
    DECIMAL.get_or_init(|| regex::Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").unwrap())
}

fn parse_date(input: &str) -> Result<Value, ConversionError> {
    let parts: Vec<&str> = input.split('-').collect();
    if parts.len() != 3 {
        return Err(ConversionError::new("Invalid date"));
    }
    date_from_parts(parts[0], parts[1], parts[2])
}

fn parse_time(input: &str) -> Result<Value, ConversionError> {
    let invalid = || ConversionError::new("Invalid time");
    let (clock, micro) = match input.split_once('.') {
        Some((clock, frac)) => {
            let micro: u32 = frac.parse().map_err(|_| invalid())?;
            (clock, micro)
        }
        None => (input, 0),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(invalid());
    }
    let h: u32 = parts[0].parse().map_err(|_| invalid())?;
    let m: u32 = parts[1].parse().map_err(|_| invalid())?;
    let s: u32 = if parts.len() == 3 {
        parts[2].parse().map_err(|_| invalid())?
    } else {
        0
    };
    chrono::NaiveTime::from_hms_micro_opt(h, m, s, micro)
        .map(Value::Time)
        .ok_or_else(|| ConversionError::new("Invalid time: out of range"))
}

fn encode_sequence(element: &Attribute, items: &[Value], options: &ConverterOptions) -> String {
    // A sequence of sequences becomes newline-delimited rows.
    if matches!(element.schema_type, SchemaType::Sequence(_)) {
        let inner = element.element().unwrap_or(element);
        return items
            .iter()
            .map(|row| match row {
                Value::List(cells) => encode_cells(inner, cells, options),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");
    }
    encode_cells(element, items, options)
}

fn encode_cells(element: &Attribute, items: &[Value], options: &ConverterOptions) -> String {
    let cells: Vec<String> = items
        .iter()
        .map(|item| from_value(element, item, options).unwrap_or_default())
        .collect();
    if options.delimiter == '\n' {
        cells.join("\n")
    } else {
        csv_join(&cells, options.delimiter)
    }
}

fn decode_sequence(
    element: &Attribute,
    input: &str,
    options: &ConverterOptions,
) -> Result<Value, ConversionError> {
    if matches!(element.schema_type, SchemaType::Sequence(_)) {
        let inner = element.element().unwrap_or(element);
        let rows = input
            .split('\n')
            .map(|row| decode_cells(inner, row.trim_end_matches('\r'), options))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::List(rows));
    }
    decode_cells(element, input, options)
}

fn decode_cells(
    element: &Attribute,
    input: &str,
    options: &ConverterOptions,
) -> Result<Value, ConversionError> {
    let cells = if options.delimiter == '\n' {
        input.split('\n').map(str::to_string).collect()
    } else {
        csv_split(input, options.delimiter)?
    };
    let items = cells
        .iter()
        .map(|cell| to_value(element, cell, options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(items))
}

fn csv_join(cells: &[String], delimiter: char) -> String {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(Vec::new());
    writer.write_record(cells).expect("in-memory CSV write");
    let bytes = writer.into_inner().expect("in-memory CSV flush");
    let line = String::from_utf8(bytes).expect("CSV output is UTF-8");
    line.trim_end_matches(['\r', '\n']).to_string()
}

fn csv_split(line: &str, delimiter: char) -> Result<Vec<String>, ConversionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(|cell| cell.trim().to_string()).collect()),
        Some(Err(_)) => Err(ConversionError::new("Could not read the delimited values")),
        None => Ok(Vec::new()),
    }
}
