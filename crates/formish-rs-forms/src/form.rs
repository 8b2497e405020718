//! The form facade: the container binding a schema, defaults, submitted
//! data, per-field render options, actions, and accumulated errors.
//!
//! A [`Form`] is request-scoped: construct one per request, optionally
//! assign defaults and per-field options, then either iterate
//! [`fields`](Form::fields) for rendering or call
//! [`validate`](Form::validate) with the submitted payload. On failure the
//! form retains the raw request data and the error map so a re-render
//! shows the user's exact input with messages beside each field.

use std::collections::HashMap;
use std::fmt;

use formish_rs_core::dotted::segment_index;
use formish_rs_core::text::{title_from_name, valid_identifier};
use formish_rs_core::{FormData, RawData, Value};
use formish_rs_schema::Attribute;

use crate::binder;
use crate::error::{ErrorMap, FieldError, FormError};
use crate::field::{bind_item, BoundItem};
use crate::widgets::Widget;

/// The hidden marker field confirming which form a payload belongs to.
///
/// Several forms may coexist on one page; each renders this marker with
/// its own name and [`Form::validate`] rejects payloads whose marker does
/// not match.
pub const FORM_MARKER: &str = "__formish_form__";

/// The HTTP method a form submits with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Submit via query string.
    Get,
    /// Submit via request body.
    #[default]
    Post,
}

/// Per-field render options, keyed by dotted path.
///
/// Paths may use `*` for the un-indexed template element of a sequence;
/// options registered there apply to every element.
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    /// Overrides the schema/derived title.
    pub title: Option<String>,
    /// Overrides the schema description.
    pub description: Option<String>,
    /// Overrides the default widget.
    pub widget: Option<Widget>,
    /// Default value for template (`*`) elements.
    pub default: Option<Value>,
}

/// A submit button with an optional callback.
pub struct Action {
    /// The identifier; also the payload key that triggers this action.
    pub name: String,
    /// The button label.
    pub label: String,
    callback: Option<ActionCallback>,
}

/// Invoked with the submitted payload when the action is dispatched.
pub type ActionCallback = Box<dyn Fn(&FormData) + Send + Sync>;

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// A schema bound into a submittable form.
pub struct Form {
    name: Option<String>,
    structure: Attribute,
    defaults: Value,
    raw: Option<RawData>,
    errors: ErrorMap,
    actions: Vec<Action>,
    item_data: HashMap<String, FieldOptions>,
    action_url: Option<String>,
    method: Method,
}

static NULL: Value = Value::Null;

impl Form {
    /// Creates a form over a root structure attribute.
    pub fn new(structure: Attribute) -> Self {
        Self {
            name: None,
            structure,
            defaults: Value::Map(std::collections::BTreeMap::new()),
            raw: None,
            errors: ErrorMap::new(),
            actions: Vec::new(),
            item_data: HashMap::new(),
            action_url: None,
            method: Method::Post,
        }
    }

    /// Names the form; the name namespaces its CSS identifiers and is the
    /// expected value of the [`FORM_MARKER`] field.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Posts the form somewhere other than the current URL.
    #[must_use]
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    /// Sets the submit method.
    #[must_use]
    pub const fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// The form's name, `"form"` unless one was given.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("form")
    }

    /// The action URL, if one was set.
    pub fn action_url(&self) -> Option<&str> {
        self.action_url.as_deref()
    }

    /// The submit method.
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The root structure attribute.
    pub const fn structure(&self) -> &Attribute {
        &self.structure
    }

    /// The typed default values.
    pub const fn defaults(&self) -> &Value {
        &self.defaults
    }

    /// Replaces the default values and drops any derived or submitted
    /// request-data view.
    pub fn set_defaults(&mut self, defaults: Value) {
        self.defaults = defaults;
        self.raw = None;
        self.errors.clear();
    }

    /// Sets one default by dotted key.
    ///
    /// A key containing `*` registers the template default for all
    /// elements of a sequence instead.
    pub fn set_default(&mut self, key: &str, value: Value) -> Result<(), FormError> {
        if key.contains('*') {
            self.options_mut(key).default = Some(value);
            return Ok(());
        }
        self.attr_at(key)?;
        set_value_at(&mut self.defaults, key, key, value)?;
        self.raw = None;
        Ok(())
    }

    /// Overrides the title rendered for a field.
    pub fn set_title(&mut self, key: &str, title: impl Into<String>) {
        self.options_mut(key).title = Some(title.into());
    }

    /// Overrides the description rendered for a field.
    pub fn set_description(&mut self, key: &str, description: impl Into<String>) {
        self.options_mut(key).description = Some(description.into());
    }

    /// Assigns a widget to a field. Use a `*` segment to cover every
    /// element of a sequence.
    pub fn set_widget(&mut self, key: &str, widget: Widget) {
        self.options_mut(key).widget = Some(widget);
    }

    fn options_mut(&mut self, key: &str) -> &mut FieldOptions {
        self.item_data.entry(key.to_string()).or_default()
    }

    /// Registers an action with a label derived from its name.
    pub fn add_action(&mut self, name: &str) -> Result<(), FormError> {
        self.push_action(name, None, None)
    }

    /// Registers an action with an explicit label.
    pub fn add_action_labeled(&mut self, name: &str, label: &str) -> Result<(), FormError> {
        self.push_action(name, Some(label), None)
    }

    /// Registers an action with a callback invoked on dispatch.
    pub fn add_action_with(
        &mut self,
        name: &str,
        label: Option<&str>,
        callback: ActionCallback,
    ) -> Result<(), FormError> {
        self.push_action(name, label, Some(callback))
    }

    fn push_action(
        &mut self,
        name: &str,
        label: Option<&str>,
        callback: Option<ActionCallback>,
    ) -> Result<(), FormError> {
        if !valid_identifier(name) {
            return Err(FormError::BadAction {
                name: name.to_string(),
                reason: "not a valid identifier".to_string(),
            });
        }
        if self.actions.iter().any(|a| a.name == name) {
            return Err(FormError::BadAction {
                name: name.to_string(),
                reason: "already registered".to_string(),
            });
        }
        self.actions.push(Action {
            name: name.to_string(),
            label: label.map_or_else(|| title_from_name(name), str::to_string),
            callback,
        });
        Ok(())
    }

    /// The registered actions, in order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Finds the action named in the payload and invokes its callback.
    ///
    /// Falls back to the first registered action when no action key is
    /// present; fails with [`FormError::NoAction`] when none are
    /// registered.
    pub fn action(&self, payload: &FormData) -> Result<&Action, FormError> {
        if self.actions.is_empty() {
            return Err(FormError::NoAction);
        }
        let action = self
            .actions
            .iter()
            .find(|a| payload.contains_key(&a.name))
            .unwrap_or(&self.actions[0]);
        if let Some(callback) = &action.callback {
            callback(payload);
        }
        Ok(action)
    }

    /// The per-field error map populated by the last
    /// [`validate`](Form::validate) call.
    pub const fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// The error recorded for one dotted path, if any.
    pub fn error(&self, name: &str) -> Option<&FieldError> {
        self.errors.get(name)
    }

    pub(crate) fn error_message(&self, name: &str) -> Option<String> {
        self.errors.get(name).map(|e| e.message().to_string())
    }

    /// The submitted request data, present once a payload was bound.
    pub const fn request_data(&self) -> Option<&RawData> {
        self.raw.as_ref()
    }

    pub(crate) fn raw_request_data(&self) -> Option<&RawData> {
        self.raw.as_ref()
    }

    /// The request-data view: the submitted payload when bound, otherwise
    /// the defaults serialized through each field's widget.
    ///
    /// Recomputed per call; the bound-item tree built from it is the only
    /// per-render cache.
    pub fn request_data_view(&self) -> RawData {
        self.raw
            .clone()
            .unwrap_or_else(|| binder::to_request_data_root(self))
    }

    /// Binds the form's top-level fields for rendering, in schema order.
    pub fn fields(&self) -> Vec<BoundItem> {
        let view = self.request_data_view();
        self.structure
            .children()
            .iter()
            .map(|(name, attr)| bind_item(self, &view, name, attr))
            .collect()
    }

    /// Binds the schema node at a dotted path.
    ///
    /// Index segments and `*` address sequence elements:
    /// `people.0.name`, `people.*.name`.
    pub fn bind(&self, name: &str) -> Result<BoundItem, FormError> {
        let attr = self.attr_at(name)?.clone();
        let view = self.request_data_view();
        Ok(bind_item(self, &view, name, &attr))
    }

    /// Resolves a dotted path against the schema.
    pub fn attr_at(&self, name: &str) -> Result<&Attribute, FormError> {
        let mut attr = &self.structure;
        for segment in name.split('.') {
            let next = if segment == "*" || segment_index(segment).is_some() {
                attr.element()
            } else {
                attr.child(segment)
            };
            attr = next.ok_or_else(|| FormError::FieldNotFound {
                name: name.to_string(),
            })?;
        }
        Ok(attr)
    }

    pub(crate) fn widget_for(&self, path: &str, attr: &Attribute) -> Widget {
        self.item_data
            .get(&starify(path))
            .and_then(|options| options.widget.clone())
            .unwrap_or_else(|| Widget::default_for(attr))
    }

    pub(crate) fn title_option(&self, path: &str) -> Option<String> {
        self.option(path, |o| o.title.clone())
    }

    pub(crate) fn description_option(&self, path: &str) -> Option<String> {
        self.option(path, |o| o.description.clone())
    }

    pub(crate) fn template_default(&self, path: &str) -> Option<Value> {
        self.option(path, |o| o.default.clone())
    }

    fn option<T>(&self, path: &str, pick: impl Fn(&FieldOptions) -> Option<T>) -> Option<T> {
        self.item_data
            .get(path)
            .and_then(&pick)
            .or_else(|| self.item_data.get(&starify(path)).and_then(&pick))
    }

    /// The typed default value at a dotted path, `Null` when unset.
    pub fn default_at(&self, path: &str) -> &Value {
        let mut value = &self.defaults;
        for segment in path.split('.') {
            let next = segment_index(segment)
                .map_or_else(|| value.get(segment), |index| value.at(index));
            match next {
                Some(v) => value = v,
                None => return &NULL,
            }
        }
        value
    }

    /// Validates a submitted payload against the schema.
    ///
    /// The payload must carry [`FORM_MARKER`] equal to this form's name;
    /// a mismatch is a fatal [`FormError::WrongFormName`], distinct from
    /// any field-level failure. Template keys (containing `*`) are
    /// discarded, the remainder is decoded into nested data, widgets
    /// pre-parse it, every leaf is converted (conversion failures
    /// accumulate rather than aborting), and schema validators run over
    /// the converted data without overwriting conversion errors.
    ///
    /// On success, returns the fully typed nested data. On failure, the
    /// error map and retained request data describe every invalid field
    /// for redisplay.
    pub fn validate(&mut self, payload: &FormData) -> Result<Value, FormError> {
        let submitted = payload.get(FORM_MARKER);
        if submitted != Some(self.name()) {
            return Err(FormError::WrongFormName {
                expected: self.name().to_string(),
                submitted: submitted.map(str::to_string),
            });
        }

        let mut cleaned = FormData::new();
        for (key, values) in payload {
            if key == FORM_MARKER || key.contains('*') {
                continue;
            }
            cleaned.set(key.clone(), values.clone());
        }
        let nested = RawData::from_flat(&cleaned)?;

        self.errors.clear();
        self.raw = Some(nested);

        let (pre_parsed, pre_errors) = binder::pre_parse_root(self);
        self.raw = Some(pre_parsed);
        for (key, err) in pre_errors {
            self.errors.entry(key).or_insert(FieldError::Conversion(err));
        }

        let mut conversion_errors = ErrorMap::new();
        let data = binder::from_request_data_root(self, &mut conversion_errors);
        for (key, err) in conversion_errors {
            self.errors.entry(key).or_insert(err);
        }

        for (key, invalid) in self.structure.validate_tree(&data) {
            if !self.errors.contains_key(&key) {
                self.errors.insert(key, FieldError::Validation(invalid));
            }
        }

        if self.errors.is_empty() {
            tracing::debug!(form = self.name(), "form validated");
            Ok(data)
        } else {
            tracing::debug!(
                form = self.name(),
                errors = self.errors.len(),
                "form validation failed"
            );
            Err(FormError::Validation {
                errors: self.errors.len(),
            })
        }
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name())
            .field("structure", &self.structure)
            .field("bound", &self.raw.is_some())
            .field("errors", &self.errors)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Replaces index segments with `*`, the key under which widgets and
/// template defaults for sequence elements are registered.
fn starify(name: &str) -> String {
    name.split('.')
        .map(|segment| {
            if segment_index(segment).is_some() {
                "*"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn set_value_at(
    value: &mut Value,
    full_key: &str,
    key: &str,
    new_value: Value,
) -> Result<(), FormError> {
    let (segment, rest) = key
        .split_once('.')
        .map_or((key, None), |(seg, rest)| (seg, Some(rest)));
    if let Some(index) = segment_index(segment) {
        let Value::List(items) = value else {
            if matches!(value, Value::Null) && index == 0 {
                *value = Value::List(Vec::new());
                return set_value_at(value, full_key, key, new_value);
            }
            return Err(FormError::FieldNotFound {
                name: full_key.to_string(),
            });
        };
        match rest {
            None => {
                if index < items.len() {
                    items[index] = new_value;
                } else if index == items.len() {
                    items.push(new_value);
                } else {
                    return Err(FormError::FieldNotFound {
                        name: full_key.to_string(),
                    });
                }
                Ok(())
            }
            Some(rest) => {
                if index == items.len() {
                    items.push(Value::Map(std::collections::BTreeMap::new()));
                }
                let slot = items.get_mut(index).ok_or_else(|| FormError::FieldNotFound {
                    name: full_key.to_string(),
                })?;
                set_value_at(slot, full_key, rest, new_value)
            }
        }
    } else {
        if matches!(value, Value::Null) {
            *value = Value::Map(std::collections::BTreeMap::new());
        }
        let Value::Map(map) = value else {
            return Err(FormError::FieldNotFound {
                name: full_key.to_string(),
            });
        };
        match rest {
            None => {
                map.insert(segment.to_string(), new_value);
                Ok(())
            }
            Some(rest) => {
                let slot = map.entry(segment.to_string()).or_insert(Value::Null);
                set_value_at(slot, full_key, rest, new_value)
            }
        }
    }
}
