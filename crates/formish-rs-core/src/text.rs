//! Naming helpers for titles, identifiers, and CSS classes.

use std::sync::OnceLock;

use regex::Regex;

/// Derives a human-readable title from a field or action name.
///
/// Underscores become spaces, the first letter of each word is
/// capitalized, and camel-case boundaries start a new word.
///
/// # Examples
///
/// ```
/// use formish_rs_core::text::title_from_name;
///
/// assert_eq!(title_from_name("first_name"), "First Name");
/// assert_eq!(title_from_name("dateOfBirth"), "Date Of Birth");
/// assert_eq!(title_from_name("email"), "Email");
/// ```
pub fn title_from_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut last: Option<char> = None;
    for ch in name.chars() {
        if ch == '_' {
            if last != Some('_') {
                out.push(' ');
            }
        } else if last.is_none() || last == Some('_') {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() && !last.is_some_and(char::is_uppercase) {
            out.push(' ');
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        last = Some(ch);
    }
    out
}

/// Returns `true` if `name` is usable as an HTML id / action name.
pub fn valid_identifier(name: &str) -> bool {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").unwrap());
    ident.is_match(name)
}

/// Collapses runs of digits and `*` into the letter `n`.
///
/// Used to build one stable CSS class for every element of a sequence,
/// whatever its index: `form-people-0-name` and `form-people-12-name`
/// both normalize to `form-people-n-name`.
pub fn normalize_counters(name: &str) -> String {
    static COUNTERS: OnceLock<Regex> = OnceLock::new();
    let counters = COUNTERS.get_or_init(|| Regex::new(r"[0-9*]+").unwrap());
    counters.replace_all(name, "n").into_owned()
}
