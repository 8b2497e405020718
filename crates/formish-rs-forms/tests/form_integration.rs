//! Integration tests for the full bind -> render -> validate pipeline.
//!
//! These exercise the library the way a web framework consumes it:
//! building a form over a schema, rendering bound fields (with defaults
//! or with a submitted payload), validating payloads, and redisplaying
//! invalid submissions.

use formish_rs_core::{FormData, RawData, Value};
use formish_rs_forms::form::{Form, FORM_MARKER};
use formish_rs_forms::{BoundItem, FieldError, FormError, Widget};
use formish_rs_schema::{Attribute, Validator};

fn payload(pairs: &[(&str, &str)]) -> FormData {
    pairs.iter().copied().collect()
}

fn signup_form() -> Form {
    Form::new(Attribute::structure([
        (
            "username",
            Attribute::string().validator(Validator::all([
                Validator::required(),
                Validator::length(Some(3), Some(20)),
            ])),
        ),
        ("age", Attribute::integer()),
        ("birthday", Attribute::date()),
    ]))
    .with_name("signup")
}

// ---------------------------------------------------------------------------
// Validation pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_successful_validation_returns_typed_tree() {
    let mut form = signup_form();
    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "signup"),
            ("username", "alice"),
            ("age", "30"),
            ("birthday", "1994-2-27"),
        ]))
        .unwrap();

    assert_eq!(data.get("username"), Some(&Value::from("alice")));
    assert_eq!(data.get("age"), Some(&Value::Int(30)));
    assert_eq!(
        data.get("birthday"),
        Some(&Value::Date(
            chrono::NaiveDate::from_ymd_opt(1994, 2, 27).unwrap()
        ))
    );
}

#[test]
fn test_partial_failure_isolation() {
    let mut form = Form::new(Attribute::structure([
        ("one", Attribute::integer()),
        ("two", Attribute::integer()),
    ]));
    let err = form
        .validate(&payload(&[(FORM_MARKER, "form"), ("one", "3"), ("two", "abc")]))
        .unwrap_err();

    assert!(matches!(err, FormError::Validation { errors: 1 }));
    assert!(form.error("one").is_none());
    assert!(matches!(
        form.error("two"),
        Some(FieldError::Conversion(e)) if e.message == "Not a valid number"
    ));
}

#[test]
fn test_wrong_form_marker_fails_fast() {
    let mut form = signup_form();
    let err = form
        .validate(&payload(&[(FORM_MARKER, "login"), ("username", "alice")]))
        .unwrap_err();
    assert!(matches!(err, FormError::WrongFormName { .. }));
    assert!(form.errors().is_empty());
}

#[test]
fn test_required_message() {
    let mut form = signup_form();
    form.validate(&payload(&[
        (FORM_MARKER, "signup"),
        ("username", ""),
        ("age", ""),
        ("birthday", ""),
    ]))
    .unwrap_err();
    assert_eq!(form.error("username").unwrap().message(), "is required");
}

#[test]
fn test_validator_does_not_overwrite_conversion_error() {
    let mut form = Form::new(Attribute::structure([(
        "age",
        Attribute::integer().validator(Validator::required()),
    )]));
    form.validate(&payload(&[(FORM_MARKER, "form"), ("age", "abc")]))
        .unwrap_err();
    // Conversion failed; the required validator (which also fails on the
    // resulting Null) must not replace the conversion message.
    assert_eq!(form.error("age").unwrap().message(), "Not a valid number");
}

#[test]
fn test_invalid_input_redisplays_verbatim() {
    let mut form = signup_form();
    form.validate(&payload(&[
        (FORM_MARKER, "signup"),
        ("username", "alice"),
        ("age", "  thirty  "),
        ("birthday", "1994-2-30"),
    ]))
    .unwrap_err();

    let fields = form.fields();
    let age = fields[1].as_field().unwrap();
    assert_eq!(age.value, RawData::value("  thirty  "));
    assert_eq!(age.error.as_deref(), Some("Not a valid number"));
    let birthday = fields[2].as_field().unwrap();
    assert_eq!(birthday.value, RawData::value("1994-2-30"));
    assert_eq!(birthday.error.as_deref(), Some("Invalid date: out of range"));
}

// ---------------------------------------------------------------------------
// Nested structures and sequences
// ---------------------------------------------------------------------------

fn team_form() -> Form {
    Form::new(Attribute::structure([
        ("team", Attribute::string()),
        (
            "members",
            Attribute::sequence(Attribute::structure([
                (
                    "name",
                    Attribute::string().validator(Validator::required()),
                ),
                ("age", Attribute::integer()),
            ])),
        ),
    ]))
    .with_name("team")
}

#[test]
fn test_nested_sequence_of_structures() {
    let mut form = team_form();
    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "team"),
            ("team", "red"),
            ("members.0.name", "ann"),
            ("members.0.age", "31"),
            ("members.1.name", "ben"),
            ("members.1.age", "25"),
        ]))
        .unwrap();

    let members = data.get("members").unwrap();
    assert_eq!(members.at(0).unwrap().get("name"), Some(&Value::from("ann")));
    assert_eq!(members.at(1).unwrap().get("age"), Some(&Value::Int(25)));
}

#[test]
fn test_nested_error_keyed_by_dotted_path() {
    let mut form = team_form();
    form.validate(&payload(&[
        (FORM_MARKER, "team"),
        ("team", "red"),
        ("members.0.name", ""),
        ("members.0.age", "31"),
        ("members.1.name", "ben"),
        ("members.1.age", "x"),
    ]))
    .unwrap_err();

    assert_eq!(form.error("members.0.name").unwrap().message(), "is required");
    assert_eq!(
        form.error("members.1.age").unwrap().message(),
        "Not a valid number"
    );
}

#[test]
fn test_sequence_cardinality_from_defaults() {
    let mut form = Form::new(Attribute::structure([(
        "name",
        Attribute::sequence(Attribute::string()),
    )]));
    form.set_defaults(Value::map([(
        "name",
        Value::list([Value::from("1"), Value::from("2"), Value::from("3")]),
    )]));

    let fields = form.fields();
    let seq = fields[0].as_sequence().unwrap();
    assert_eq!(seq.children.len(), 3);
    let names: Vec<&str> = seq.children.iter().map(BoundItem::name).collect();
    assert_eq!(names, vec!["name.0", "name.1", "name.2"]);
}

#[test]
fn test_sequence_cardinality_from_request() {
    let mut form = Form::new(Attribute::structure([(
        "name",
        Attribute::sequence(Attribute::string()),
    )]));
    form.set_defaults(Value::map([(
        "name",
        Value::list([Value::from("1"), Value::from("2"), Value::from("3")]),
    )]));
    form.validate(&payload(&[
        (FORM_MARKER, "form"),
        ("name.0", "a"),
        ("name.1", "b"),
        ("name.2", "c"),
        ("name.3", "d"),
        ("name.4", "e"),
    ]))
    .unwrap();

    // Submitted data wins over defaults for cardinality.
    let fields = form.fields();
    let seq = fields[0].as_sequence().unwrap();
    assert_eq!(seq.children.len(), 5);
    assert_eq!(seq.children[4].name(), "name.4");
}

#[test]
fn test_sequence_cardinality_clamped_by_widget_bounds() {
    let mut form = Form::new(Attribute::structure([(
        "tags",
        Attribute::sequence(Attribute::string()),
    )]));
    form.set_widget("tags", Widget::sequence_bounded(Some(2), Some(4)));

    // No data and no defaults: the minimum still shows two slots.
    let fields = form.fields();
    assert_eq!(fields[0].as_sequence().unwrap().children.len(), 2);

    form.set_defaults(Value::map([(
        "tags",
        Value::list((0..6).map(|i| Value::from(i.to_string()))),
    )]));
    let fields = form.fields();
    assert_eq!(fields[0].as_sequence().unwrap().children.len(), 4);
}

#[test]
fn test_sequence_template_element() {
    let mut form = team_form();
    form.set_default("members.*.age", Value::Int(18)).unwrap();

    let bound = form.bind("members").unwrap();
    let seq = bound.as_sequence().unwrap();
    let template = seq.template.as_field().is_none();
    assert!(template, "template of a structure sequence is a group");

    let age = form.bind("members.*.age").unwrap();
    let age = age.as_field().unwrap();
    assert_eq!(age.name, "members.*.age");
    // The template renders the registered default, not request data.
    assert_eq!(age.value, RawData::value("18"));
}

#[test]
fn test_sequence_strips_trailing_empty_items() {
    let mut form = Form::new(Attribute::structure([(
        "pets",
        Attribute::sequence(Attribute::string()),
    )]));
    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "form"),
            ("pets.0", "cat"),
            ("pets.1", ""),
            ("pets.2", ""),
        ]))
        .unwrap();
    assert_eq!(data.get("pets"), Some(&Value::list([Value::from("cat")])));
}

// ---------------------------------------------------------------------------
// Widgets inside the pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_checked_password_mismatch_in_form() {
    let mut form = Form::new(Attribute::structure([(
        "password",
        Attribute::string().validator(Validator::required()),
    )]))
    .with_name("account");
    form.set_widget("password", Widget::checked_password());

    let err = form
        .validate(&payload(&[
            (FORM_MARKER, "account"),
            ("password.password", "secret"),
            ("password.confirm", "secrit"),
        ]))
        .unwrap_err();

    assert!(matches!(err, FormError::Validation { .. }));
    assert_eq!(
        form.error("password").unwrap().message(),
        "Password did not match"
    );
}

#[test]
fn test_date_parts_widget_in_form() {
    let mut form = Form::new(Attribute::structure([("born", Attribute::date())]));
    form.set_widget("born", Widget::date_parts());

    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "form"),
            ("born.year", "1990"),
            ("born.month", "6"),
            ("born.day", "2"),
        ]))
        .unwrap();
    assert_eq!(
        data.get("born"),
        Some(&Value::Date(
            chrono::NaiveDate::from_ymd_opt(1990, 6, 2).unwrap()
        ))
    );
}

#[test]
fn test_checkbox_multi_choice_in_form() {
    let mut form = Form::new(Attribute::structure([(
        "colors",
        Attribute::sequence(Attribute::string()),
    )]));
    form.set_widget(
        "colors",
        Widget::checkbox_multi([("red", "Red"), ("green", "Green"), ("blue", "Blue")]),
    );

    // Repeated values under one key, as checkbox groups submit.
    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "form"),
            ("colors", "red"),
            ("colors", "blue"),
        ]))
        .unwrap();
    assert_eq!(
        data.get("colors"),
        Some(&Value::list([Value::from("red"), Value::from("blue")]))
    );

    // Nothing ticked means the key is absent entirely.
    let data = form.validate(&payload(&[(FORM_MARKER, "form")])).unwrap();
    assert_eq!(data.get("colors"), Some(&Value::list([])));
}

#[test]
fn test_checkbox_widget_unchecked_means_false() {
    let mut form = Form::new(Attribute::structure([("subscribe", Attribute::boolean())]));
    form.set_widget("subscribe", Widget::checkbox());

    let data = form.validate(&payload(&[(FORM_MARKER, "form")])).unwrap();
    assert_eq!(data.get("subscribe"), Some(&Value::Bool(false)));

    let data = form
        .validate(&payload(&[(FORM_MARKER, "form"), ("subscribe", "True")]))
        .unwrap();
    assert_eq!(data.get("subscribe"), Some(&Value::Bool(true)));
}

// ---------------------------------------------------------------------------
// Rendering metadata
// ---------------------------------------------------------------------------

#[test]
fn test_bound_field_rendering_metadata() {
    let mut form = signup_form();
    form.set_title("age", "Age in years");
    form.set_description("age", "Leave blank if you prefer");

    let fields = form.fields();
    let username = fields[0].as_field().unwrap();
    assert_eq!(username.title, "Username");
    assert!(username.required);
    assert_eq!(username.cssname, "signup-username");
    assert!(username.classes.contains("field"));
    assert!(username.classes.contains("type-string"));
    assert!(username.classes.contains("widget-input"));
    assert!(username.classes.contains("required"));

    let age = fields[1].as_field().unwrap();
    assert_eq!(age.title, "Age in years");
    assert_eq!(age.description.as_deref(), Some("Leave blank if you prefer"));
    assert!(!age.required);
}

#[test]
fn test_sequence_element_classes_are_index_stable() {
    let mut form = team_form();
    form.set_defaults(Value::map([(
        "members",
        Value::list([
            Value::map([("name", Value::from("ann"))]),
            Value::map([("name", Value::from("ben"))]),
        ]),
    )]));

    let name0 = form.bind("members.0.name").unwrap();
    let name1 = form.bind("members.1.name").unwrap();
    let class0: Vec<&str> = name0.classes().split(' ').collect();
    let class1: Vec<&str> = name1.classes().split(' ').collect();
    // Index runs normalize so every element shares a class.
    assert!(class0.contains(&"team-members-n-name"));
    assert_eq!(class0[1], class1[1]);
}

#[test]
fn test_group_contains_error_class() {
    let mut form = team_form();
    form.validate(&payload(&[
        (FORM_MARKER, "team"),
        ("team", "red"),
        ("members.0.name", ""),
        ("members.0.age", "44"),
    ]))
    .unwrap_err();

    let bound = form.bind("members.0").unwrap();
    if let BoundItem::Group(group) = bound {
        assert!(group.contains_error);
        assert!(group.classes.contains("contains-error"));
    } else {
        panic!("expected a group");
    }
}

#[test]
fn test_field_not_found() {
    let form = signup_form();
    assert!(matches!(
        form.bind("nope"),
        Err(FormError::FieldNotFound { .. })
    ));
}

// ---------------------------------------------------------------------------
// Output serialization
// ---------------------------------------------------------------------------

#[test]
fn test_validated_data_serializes() {
    let mut form = team_form();
    let data = form
        .validate(&payload(&[
            (FORM_MARKER, "team"),
            ("team", "red"),
            ("members.0.name", "ann"),
            ("members.0.age", "31"),
        ]))
        .unwrap();

    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["type"], "Map");
}

// ---------------------------------------------------------------------------
// Urlencoded payloads end to end
// ---------------------------------------------------------------------------

#[test]
fn test_urlencoded_round_trip() {
    let mut form = signup_form();
    let body = format!("{FORM_MARKER}=signup&username=alice&age=30&birthday=1994-2-27");
    let data = form.validate(&FormData::parse(&body)).unwrap();
    assert_eq!(data.get("username"), Some(&Value::from("alice")));
}
