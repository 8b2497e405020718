//! The recursive walk pairing schema nodes with request data.
//!
//! Three transforms share the same traversal: serializing typed defaults
//! into a request-data view, widget pre-parsing of a submitted payload,
//! and converting submitted data into typed values. Recursion follows the
//! *widget*, not the schema: a composite bound to a container widget is
//! walked child by child, while a sequence bound to (say) a delimited
//! text input is handled by that leaf widget in one go.
//!
//! Conversion failures never abort the walk; every leaf is attempted and
//! failures are collected per dotted path.

use formish_rs_core::{RawData, Value};
use formish_rs_schema::{Attribute, SchemaType};

use crate::error::{ConversionError, ErrorMap, FieldError};
use crate::form::Form;

/// Builds the request-data view of the form's defaults.
pub(crate) fn to_request_data_root(form: &Form) -> RawData {
    to_request_data(form, form.structure(), "", form.defaults())
}

fn to_request_data(form: &Form, attr: &Attribute, path: &str, value: &Value) -> RawData {
    let widget = form.widget_for(path, attr);
    if !widget.is_container() {
        return widget.to_request_data(attr, value);
    }
    match &attr.schema_type {
        SchemaType::Structure(children) => {
            let mut map = std::collections::BTreeMap::new();
            for (name, child) in children {
                let child_value = value.get(name).unwrap_or(&Value::Null);
                map.insert(
                    name.clone(),
                    to_request_data(form, child, &join_key(path, name), child_value),
                );
            }
            RawData::Map(map)
        }
        SchemaType::Sequence(element) => {
            let items = match value {
                Value::List(items) => items.as_slice(),
                _ => &[],
            };
            RawData::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        to_request_data(form, element, &join_key(path, &i.to_string()), item)
                    })
                    .collect(),
            )
        }
        _ => widget.to_request_data(attr, value),
    }
}

/// Runs widget pre-parsing over the submitted payload.
///
/// Returns the normalized request data plus any per-field failures (a
/// file store that refused an upload, for instance).
pub(crate) fn pre_parse_root(form: &Form) -> (RawData, Vec<(String, ConversionError)>) {
    let mut errors = Vec::new();
    let raw = form.raw_request_data();
    let data = pre_parse(form, form.structure(), "", raw, &mut errors);
    (data, errors)
}

fn pre_parse(
    form: &Form,
    attr: &Attribute,
    path: &str,
    raw: Option<&RawData>,
    errors: &mut Vec<(String, ConversionError)>,
) -> RawData {
    let widget = form.widget_for(path, attr);
    if !widget.is_container() {
        return match widget.pre_parse(attr, raw.cloned()) {
            Ok(data) => data,
            Err(err) => {
                errors.push((path.to_string(), err));
                widget.none_value()
            }
        };
    }
    match &attr.schema_type {
        SchemaType::Structure(children) => {
            let mut map = std::collections::BTreeMap::new();
            for (name, child) in children {
                let child_raw = raw.and_then(|r| r.get_opt(name));
                map.insert(
                    name.clone(),
                    pre_parse(form, child, &join_key(path, name), child_raw, errors),
                );
            }
            RawData::Map(map)
        }
        SchemaType::Sequence(element) => {
            let count = raw.map_or(0, RawData::child_count);
            RawData::List(
                (0..count)
                    .map(|i| {
                        let key = i.to_string();
                        let child_raw = raw.and_then(|r| r.get_opt(&key));
                        pre_parse(form, element, &join_key(path, &key), child_raw, errors)
                    })
                    .collect(),
            )
        }
        _ => match widget.pre_parse(attr, raw.cloned()) {
            Ok(data) => data,
            Err(err) => {
                errors.push((path.to_string(), err));
                widget.none_value()
            }
        },
    }
}

/// Converts the pre-parsed request data into typed values.
///
/// All leaves are attempted; failures land in `errors` keyed by dotted
/// path and the failing leaf contributes `Null`.
pub(crate) fn from_request_data_root(form: &Form, errors: &mut ErrorMap) -> Value {
    from_request_data(
        form,
        form.structure(),
        "",
        form.raw_request_data(),
        errors,
    )
}

fn from_request_data(
    form: &Form,
    attr: &Attribute,
    path: &str,
    raw: Option<&RawData>,
    errors: &mut ErrorMap,
) -> Value {
    let widget = form.widget_for(path, attr);
    if !widget.is_container() {
        let none = widget.none_value();
        let leaf_raw = raw.unwrap_or(&none);
        return match widget.from_request_data(attr, leaf_raw) {
            Ok(value) => value,
            Err(err) => {
                errors.insert(path.to_string(), FieldError::Conversion(err));
                Value::Null
            }
        };
    }
    match &attr.schema_type {
        SchemaType::Structure(children) => {
            let mut map = std::collections::BTreeMap::new();
            for (name, child) in children {
                let child_raw = raw.and_then(|r| r.get_opt(name));
                map.insert(
                    name.clone(),
                    from_request_data(form, child, &join_key(path, name), child_raw, errors),
                );
            }
            Value::Map(map)
        }
        SchemaType::Sequence(element) => {
            let count = raw.map_or(0, RawData::child_count);
            let mut items: Vec<Value> = (0..count)
                .map(|i| {
                    let key = i.to_string();
                    let child_raw = raw.and_then(|r| r.get_opt(&key));
                    from_request_data(form, element, &join_key(path, &key), child_raw, errors)
                })
                .collect();
            if widget.strips_empty() {
                while items.last().is_some_and(Value::is_empty) {
                    items.pop();
                }
            }
            Value::List(items)
        }
        _ => {
            let none = widget.none_value();
            let leaf_raw = raw.unwrap_or(&none);
            match widget.from_request_data(attr, leaf_raw) {
                Ok(value) => value,
                Err(err) => {
                    errors.insert(path.to_string(), FieldError::Conversion(err));
                    Value::Null
                }
            }
        }
    }
}

pub(crate) fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}
