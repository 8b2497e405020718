//! The schema attribute tree.
//!
//! An [`Attribute`] describes one field or composite: its type, optional
//! title and description, and an optional validator. Attributes are
//! immutable once built and carry no form knowledge; binding to dotted
//! paths and widgets happens in the forms crate.

use std::collections::BTreeMap;

use formish_rs_core::Value;

use crate::validators::{Invalid, Validator};

/// The type of a schema attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    /// A plain string.
    String,
    /// A 64-bit signed integer.
    Integer,
    /// A 64-bit float.
    Float,
    /// An exact decimal number.
    Decimal,
    /// A boolean.
    Boolean,
    /// A calendar date.
    Date,
    /// A time of day.
    Time,
    /// An uploaded file.
    File,
    /// Named, ordered child attributes.
    Structure(Vec<(String, Attribute)>),
    /// A variable-length repetition of one element attribute.
    Sequence(Box<Attribute>),
    /// A fixed, ordered list of attributes.
    Tuple(Vec<Attribute>),
}

/// One node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// The attribute's type.
    pub schema_type: SchemaType,
    /// Optional explicit title; derived from the field name when absent.
    pub title: Option<String>,
    /// Optional description shown alongside the field.
    pub description: Option<String>,
    /// Optional validator applied to the converted value.
    pub validator: Option<Validator>,
}

impl Attribute {
    /// Creates an attribute of the given type with no metadata.
    pub const fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            title: None,
            description: None,
            validator: None,
        }
    }

    /// A string attribute.
    pub const fn string() -> Self {
        Self::new(SchemaType::String)
    }

    /// An integer attribute.
    pub const fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    /// A float attribute.
    pub const fn float() -> Self {
        Self::new(SchemaType::Float)
    }

    /// A decimal attribute.
    pub const fn decimal() -> Self {
        Self::new(SchemaType::Decimal)
    }

    /// A boolean attribute.
    pub const fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    /// A date attribute.
    pub const fn date() -> Self {
        Self::new(SchemaType::Date)
    }

    /// A time attribute.
    pub const fn time() -> Self {
        Self::new(SchemaType::Time)
    }

    /// A file attribute.
    pub const fn file() -> Self {
        Self::new(SchemaType::File)
    }

    /// A structure with named, ordered children.
    pub fn structure<N: Into<String>>(children: impl IntoIterator<Item = (N, Self)>) -> Self {
        Self::new(SchemaType::Structure(
            children.into_iter().map(|(n, a)| (n.into(), a)).collect(),
        ))
    }

    /// A sequence of one element attribute.
    pub fn sequence(element: Self) -> Self {
        Self::new(SchemaType::Sequence(Box::new(element)))
    }

    /// A fixed tuple of attributes.
    pub fn tuple(fields: impl IntoIterator<Item = Self>) -> Self {
        Self::new(SchemaType::Tuple(fields.into_iter().collect()))
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// A short lowercase name for the type, used in CSS classes.
    pub const fn type_name(&self) -> &'static str {
        match &self.schema_type {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Float => "float",
            SchemaType::Decimal => "decimal",
            SchemaType::Boolean => "boolean",
            SchemaType::Date => "date",
            SchemaType::Time => "time",
            SchemaType::File => "file",
            SchemaType::Structure(_) => "structure",
            SchemaType::Sequence(_) => "sequence",
            SchemaType::Tuple(_) => "tuple",
        }
    }

    /// Returns `true` for structures, sequences, and tuples.
    pub const fn is_composite(&self) -> bool {
        matches!(
            self.schema_type,
            SchemaType::Structure(_) | SchemaType::Sequence(_) | SchemaType::Tuple(_)
        )
    }

    /// The named, ordered children of a structure.
    pub fn children(&self) -> &[(String, Self)] {
        match &self.schema_type {
            SchemaType::Structure(children) => children,
            _ => &[],
        }
    }

    /// Looks up a structure child by name.
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// The element attribute of a sequence.
    pub fn element(&self) -> Option<&Self> {
        match &self.schema_type {
            SchemaType::Sequence(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this attribute's validator chain includes `Required`.
    pub fn is_required(&self) -> bool {
        self.validator
            .as_ref()
            .is_some_and(Validator::includes_required)
    }

    /// Validates a converted value against this attribute tree.
    ///
    /// Returns a map from dotted key to failure; the root's own failure is
    /// keyed by the empty string. Children of structures are validated
    /// even when the parent value is missing, so required fields inside an
    /// unsubmitted group still report. Sequence and tuple children are
    /// only descended into when the converted value actually has elements.
    pub fn validate_tree(&self, value: &Value) -> BTreeMap<String, Invalid> {
        let mut errors = BTreeMap::new();
        self.validate_into("", value, &mut errors);
        errors
    }

    fn validate_into(&self, prefix: &str, value: &Value, errors: &mut BTreeMap<String, Invalid>) {
        if let Some(validator) = &self.validator {
            if let Err(err) = validator.validate(value) {
                errors.insert(prefix.to_string(), err);
            }
        }
        match &self.schema_type {
            SchemaType::Structure(children) => {
                for (name, attr) in children {
                    let child_value = value.get(name).unwrap_or(&Value::Null);
                    attr.validate_into(&join_key(prefix, name), child_value, errors);
                }
            }
            SchemaType::Sequence(element) => {
                if let Value::List(items) = value {
                    for (i, item) in items.iter().enumerate() {
                        element.validate_into(&join_key(prefix, &i.to_string()), item, errors);
                    }
                }
            }
            SchemaType::Tuple(fields) => {
                if let Value::Tuple(items) = value {
                    for (i, (attr, item)) in fields.iter().zip(items).enumerate() {
                        attr.validate_into(&join_key(prefix, &i.to_string()), item, errors);
                    }
                }
            }
            _ => {}
        }
    }
}

fn join_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Attribute {
        Attribute::structure([
            (
                "name",
                Attribute::string().validator(Validator::required()),
            ),
            ("age", Attribute::integer()),
            (
                "nicknames",
                Attribute::sequence(Attribute::string().validator(Validator::length(Some(2), None))),
            ),
        ])
    }

    #[test]
    fn test_builders() {
        let attr = Attribute::string()
            .title("Full Name")
            .description("as printed on your passport")
            .validator(Validator::required());
        assert_eq!(attr.title.as_deref(), Some("Full Name"));
        assert!(attr.is_required());
        assert_eq!(attr.type_name(), "string");
        assert!(!attr.is_composite());
    }

    #[test]
    fn test_structure_children() {
        let attr = person();
        assert_eq!(attr.children().len(), 3);
        assert!(attr.child("name").is_some());
        assert!(attr.child("missing").is_none());
        assert!(attr.is_composite());
        assert_eq!(attr.type_name(), "structure");
    }

    #[test]
    fn test_sequence_element() {
        let attr = Attribute::sequence(Attribute::integer());
        assert_eq!(attr.element().unwrap().type_name(), "integer");
        assert!(Attribute::string().element().is_none());
    }

    #[test]
    fn test_validate_tree_ok() {
        let data = Value::map([
            ("name", Value::from("bob")),
            ("age", Value::Int(30)),
            ("nicknames", Value::list([Value::from("rob")])),
        ]);
        assert!(person().validate_tree(&data).is_empty());
    }

    #[test]
    fn test_validate_tree_missing_required() {
        let data = Value::map([("age", Value::Int(30))]);
        let errors = person().validate_tree(&data);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["name"].message, "is required");
    }

    #[test]
    fn test_validate_tree_sequence_elements() {
        let data = Value::map([
            ("name", Value::from("bob")),
            (
                "nicknames",
                Value::list([Value::from("rob"), Value::from("b")]),
            ),
        ]);
        let errors = person().validate_tree(&data);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("nicknames.1"));
    }

    #[test]
    fn test_validate_tree_nested_structure() {
        let schema = Attribute::structure([(
            "address",
            Attribute::structure([(
                "city",
                Attribute::string().validator(Validator::required()),
            )]),
        )]);
        // The group was never submitted; the nested required field still reports.
        let errors = schema.validate_tree(&Value::map(Vec::<(&str, Value)>::new()));
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("address.city"));
    }

    #[test]
    fn test_validate_tree_tuple() {
        let schema = Attribute::structure([(
            "point",
            Attribute::tuple([
                Attribute::integer().validator(Validator::range(Some(0.0), None)),
                Attribute::integer(),
            ]),
        )]);
        let data = Value::map([(
            "point",
            Value::Tuple(vec![Value::Int(-1), Value::Int(2)]),
        )]);
        let errors = schema.validate_tree(&data);
        assert!(errors.contains_key("point.0"));
    }
}
