//! Turns free text into resource key fragments.

use std::borrow::Cow;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// The maximum length of a synthesized key fragment.
pub const MAX_KEY_LEN: usize = 40;

/// The name the string localizer is available under, e.g. `D["Button.Save"]`.
pub const LOCALIZER: &str = "D";

/// Whether `key` can be stored and written into a lookup expression.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with('.')
        && !key.contains("..")
        && !key.contains(['"', '\\', '\n', '\r'])
}

/// Synthesizes a key fragment from free text.
///
/// Diacritics are stripped, then everything that is not an ASCII letter or
/// digit is dropped, the result is lowercased and capped at
/// [`MAX_KEY_LEN`] characters. An empty result is not a valid key.
///
/// ```
/// assert_eq!(razloc_l10n::synthesize("Add User"), "adduser");
/// assert_eq!(razloc_l10n::synthesize("Crème brûlée!"), "cremebrulee");
/// ```
pub fn synthesize(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .filter(char::is_ascii)
        .collect();

    let mut key: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .filter(|c| *c != '_')
        .collect();
    key = key.trim_matches('_').to_ascii_lowercase();
    key.truncate(MAX_KEY_LEN);
    key
}

/// Splits a run-together identifier into words.
///
/// Text that already contains whitespace is returned unchanged. Otherwise a
/// space is inserted before every uppercase letter that follows a lowercase
/// one.
pub fn humanize(value: &str) -> Cow<'_, str> {
    if value.chars().any(char::is_whitespace) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 4);
    let mut prev_lower = false;
    for c in value.chars() {
        if prev_lower && c.is_uppercase() {
            out.push(' ');
        }
        prev_lower = c.is_lowercase();
        out.push(c);
    }

    if out.len() == value.len() {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(out)
    }
}
