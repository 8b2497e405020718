//! Bound fields: schema nodes paired with a dotted path and everything a
//! template needs to render them.
//!
//! Binding is a pure function of the form's current state. A bound item
//! is a snapshot: the eagerly built tree returned by one
//! [`Form::fields`](crate::form::Form::fields) or
//! [`Form::bind`](crate::form::Form::bind) call is the per-render cache,
//! and nothing is memoized inside the schema itself.

use formish_rs_core::text::{normalize_counters, title_from_name};
use formish_rs_core::{RawData, Value};
use formish_rs_schema::{Attribute, SchemaType};

use crate::binder::join_key;
use crate::form::Form;
use crate::widgets::Widget;

/// One bound node: a leaf field, a structure group, or a sequence.
#[derive(Debug, Clone)]
pub enum BoundItem {
    /// A leaf field.
    Field(BoundField),
    /// A bound structure and its children.
    Group(BoundGroup),
    /// A bound sequence, its element fields, and its template element.
    Sequence(BoundSequence),
}

/// A leaf schema node bound to a dotted path.
#[derive(Debug, Clone)]
pub struct BoundField {
    /// The dotted path, e.g. `people.0.name`.
    pub name: String,
    /// Title: explicit option, schema title, or derived from the name.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Whether the validator chain includes `Required`.
    pub required: bool,
    /// The widget used to render and convert this field.
    pub widget: Widget,
    /// The schema type name (`"integer"`, `"date"`, ...).
    pub type_name: &'static str,
    /// Hyphenated identifier: form name plus the path with dashes.
    pub cssname: String,
    /// The space-joined class list for the field's wrapper element.
    pub classes: String,
    /// The raw request-data view for redisplay.
    pub value: RawData,
    /// The field's error message, if validation recorded one.
    pub error: Option<String>,
}

/// A structure schema node bound to a dotted path.
#[derive(Debug, Clone)]
pub struct BoundGroup {
    /// The dotted path; empty for the form's root.
    pub name: String,
    /// Title for the group.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Hyphenated identifier.
    pub cssname: String,
    /// The space-joined class list.
    pub classes: String,
    /// The group's own error message, if any.
    pub error: Option<String>,
    /// Whether any descendant has an error.
    pub contains_error: bool,
    /// The bound children, in schema order.
    pub children: Vec<BoundItem>,
}

/// A sequence schema node bound to a dotted path.
///
/// The number of children follows the submitted data when the form is
/// bound, the defaults otherwise, clamped to the widget's bounds.
#[derive(Debug, Clone)]
pub struct BoundSequence {
    /// The dotted path.
    pub name: String,
    /// Title for the sequence.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Hyphenated identifier.
    pub cssname: String,
    /// The space-joined class list.
    pub classes: String,
    /// The sequence's own error message, if any.
    pub error: Option<String>,
    /// Whether any descendant has an error.
    pub contains_error: bool,
    /// The bound element fields `name.0`, `name.1`, ...
    pub children: Vec<BoundItem>,
    /// The un-indexed `name.*` template element used to stamp out new
    /// items client-side before any data exists.
    pub template: Box<BoundItem>,
}

impl BoundItem {
    /// The dotted path of this item.
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => &f.name,
            Self::Group(g) => &g.name,
            Self::Sequence(s) => &s.name,
        }
    }

    /// The display title.
    pub fn title(&self) -> &str {
        match self {
            Self::Field(f) => &f.title,
            Self::Group(g) => &g.title,
            Self::Sequence(s) => &s.title,
        }
    }

    /// The class list.
    pub fn classes(&self) -> &str {
        match self {
            Self::Field(f) => &f.classes,
            Self::Group(g) => &g.classes,
            Self::Sequence(s) => &s.classes,
        }
    }

    /// The error message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Field(f) => f.error.as_deref(),
            Self::Group(g) => g.error.as_deref(),
            Self::Sequence(s) => s.error.as_deref(),
        }
    }

    /// The bound children; empty for a leaf field.
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Field(_) => &[],
            Self::Group(g) => &g.children,
            Self::Sequence(s) => &s.children,
        }
    }

    /// This item as a leaf field, if it is one.
    pub const fn as_field(&self) -> Option<&BoundField> {
        match self {
            Self::Field(f) => Some(f),
            _ => None,
        }
    }

    /// This item as a sequence, if it is one.
    pub const fn as_sequence(&self) -> Option<&BoundSequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }
}

impl BoundField {
    /// Returns `true` if this field carries an error.
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Binds the schema node at `path` against the given request-data view.
pub(crate) fn bind_item(form: &Form, view: &RawData, path: &str, attr: &Attribute) -> BoundItem {
    let widget = form.widget_for(path, attr);
    if widget.is_container() {
        match &attr.schema_type {
            SchemaType::Structure(children) => {
                return BoundItem::Group(bind_group(form, view, path, attr, children));
            }
            SchemaType::Sequence(element) => {
                return BoundItem::Sequence(bind_sequence(form, view, path, attr, element, &widget));
            }
            _ => {}
        }
    }
    BoundItem::Field(bind_field(form, view, path, attr, widget))
}

fn bind_group(
    form: &Form,
    view: &RawData,
    path: &str,
    attr: &Attribute,
    children: &[(String, Attribute)],
) -> BoundGroup {
    let bound_children = children
        .iter()
        .map(|(name, child)| bind_item(form, view, &join_key(path, name), child))
        .collect();
    let (title, description) = titles(form, path, attr);
    let cssname = cssname(form, path);
    let error = form.error_message(path);
    BoundGroup {
        classes: classes(form, &cssname, attr, "structure", path, error.is_some()),
        contains_error: contains_error(form, path),
        name: path.to_string(),
        title,
        description,
        cssname,
        error,
        children: bound_children,
    }
}

fn bind_sequence(
    form: &Form,
    view: &RawData,
    path: &str,
    attr: &Attribute,
    element: &Attribute,
    widget: &Widget,
) -> BoundSequence {
    // Cardinality: entries present in the view (submitted data when bound,
    // defaults otherwise), clamped to the widget's declared bounds.
    let mut count = view.get_opt(path).map_or(0, RawData::child_count);
    let (min, max) = widget.sequence_bounds();
    if let Some(min) = min {
        count = count.max(min);
    }
    if let Some(max) = max {
        count = count.min(max);
    }
    let children = (0..count)
        .map(|i| bind_item(form, view, &join_key(path, &i.to_string()), element))
        .collect();
    let template = Box::new(bind_item(form, view, &join_key(path, "*"), element));
    let (title, description) = titles(form, path, attr);
    let cssname = cssname(form, path);
    let error = form.error_message(path);
    BoundSequence {
        classes: classes(form, &cssname, attr, "sequence", path, error.is_some()),
        contains_error: contains_error(form, path),
        name: path.to_string(),
        title,
        description,
        cssname,
        error,
        children,
        template,
    }
}

fn bind_field(
    form: &Form,
    view: &RawData,
    path: &str,
    attr: &Attribute,
    widget: Widget,
) -> BoundField {
    let value = if path.contains('*') {
        // Template elements render the registered default, never data.
        let default = form.template_default(path).unwrap_or(Value::Null);
        widget.to_request_data(attr, &default)
    } else {
        view.get_opt(path)
            .cloned()
            .unwrap_or_else(|| widget.none_value())
    };
    let (title, description) = titles(form, path, attr);
    let cssname = cssname(form, path);
    let error = form.error_message(path);
    BoundField {
        classes: classes(form, &cssname, attr, widget.kind(), path, error.is_some()),
        name: path.to_string(),
        title,
        description,
        required: attr.is_required(),
        type_name: attr.type_name(),
        cssname,
        value,
        error,
        widget,
    }
}

fn titles(form: &Form, path: &str, attr: &Attribute) -> (String, Option<String>) {
    let title = form
        .title_option(path)
        .or_else(|| attr.title.clone())
        .unwrap_or_else(|| title_from_name(path.rsplit('.').next().unwrap_or(path)));
    let description = form
        .description_option(path)
        .or_else(|| attr.description.clone());
    (title, description)
}

fn cssname(form: &Form, path: &str) -> String {
    if path.is_empty() {
        form.name().to_string()
    } else {
        format!("{}-{}", form.name(), path.replace('.', "-"))
    }
}

fn classes(
    form: &Form,
    cssname: &str,
    attr: &Attribute,
    widget_kind: &str,
    path: &str,
    has_error: bool,
) -> String {
    let mut classes = vec![
        "field".to_string(),
        normalize_counters(cssname),
        format!("type-{}", attr.type_name()),
        format!("widget-{widget_kind}"),
    ];
    if attr.is_required() {
        classes.push("required".to_string());
    }
    if has_error {
        classes.push("error".to_string());
    }
    if attr.is_composite() && contains_error(form, path) {
        classes.push("contains-error".to_string());
    }
    classes.join(" ")
}

fn contains_error(form: &Form, path: &str) -> bool {
    if path.is_empty() {
        return !form.errors().is_empty();
    }
    let prefix = format!("{path}.");
    form.errors()
        .keys()
        .any(|key| key.starts_with(&prefix) || key == path)
}
