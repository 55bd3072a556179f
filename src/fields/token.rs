//! `{NAME}` text tokens.
//!
//! A token is an opening brace, a letter or underscore, any number of
//! letters, digits and underscores, and a closing brace. Anything else in
//! braces (`{}`, `{1}`, `{two words}`) is plain text.

use crate::fields::FieldValues;
use memchr::memchr;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static token pattern is valid")
});

/// Whether `text` may hold a token at all.
#[inline]
fn has_brace(text: &str) -> bool {
    memchr(b'{', text.as_bytes()).is_some()
}

/// Token names in `text`, in order of appearance, repeats included.
///
/// # Examples
///
/// ```
/// use liturgy_deck::fields::token::token_names;
///
/// let names: Vec<_> = token_names("Voorganger: {Voorganger}, {datum}").collect();
/// assert_eq!(names, ["Voorganger", "datum"]);
/// ```
pub fn token_names(text: &str) -> impl Iterator<Item = &str> {
    let haystack = if has_brace(text) { text } else { "" };
    TOKEN
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The literal token for `name`.
#[inline]
pub fn token(name: &str) -> String {
    format!("{{{}}}", name)
}

/// Replace every token whose name is in `values`. Other tokens stay as
/// they are. Borrows `text` when nothing changes.
pub fn substitute<'a>(text: &'a str, values: &FieldValues) -> Cow<'a, str> {
    if !has_brace(text) {
        return Cow::Borrowed(text);
    }
    TOKEN.replace_all(text, |caps: &Captures<'_>| match values.get(&caps[1]) {
        Some(value) => value.clone(),
        None => caps[0].to_string(),
    })
}
