//! Typed conversions for attribute text
//!
//! Attributes are untyped text. These turn that text into Rust values, and
//! back, reporting the offending text when it doesn't fit.
use crate::error::{Error, Result};
use std::{collections::HashMap, fmt::Display, str::FromStr, time::Duration};

/// Plain text attribute, surrounding whitespace removed.
pub fn string(text: &str) -> String {
    text.trim().to_owned()
}

/// Base 10 integer attribute
///
/// # Errors
///
/// - If `text` is not an integer that fits in `T`
pub fn int<T>(attribute: &'static str, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    text.trim().parse().map_err(|e: T::Err| Error::Parse {
        attribute,
        text: text.into(),
        reason: e.to_string(),
    })
}

/// Millisecond attribute
///
/// # Errors
///
/// - If `text` is not a non-negative integer
pub fn duration(attribute: &'static str, text: &str) -> Result<Duration> {
    int::<u64>(attribute, text).map(Duration::from_millis)
}

/// Text for a millisecond attribute
///
/// Sub-millisecond precision is truncated, `1500.7ms` is written as `1500`.
pub fn duration_text(d: Duration) -> String {
    d.as_millis().to_string()
}

/// Space separated list attribute
///
/// Empty text is an empty list. Otherwise the text is split on every single
/// space, so doubled spaces produce empty entries.
pub fn string_list(text: &str) -> Vec<String> {
    let text = text.trim_end_matches('\n');
    if text.is_empty() {
        return Vec::new();
    }
    text.split(' ').map(str::to_owned).collect()
}

/// `KEY=VALUE` lines, like the `uevent` attribute.
///
/// Values may contain `=`, only the first one separates.
/// Duplicate keys keep the last value.
///
/// # Errors
///
/// - If a non-empty line has no `=`
pub fn uevent(attribute: &'static str, text: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for line in text.split_terminator('\n') {
        if line.is_empty() {
            continue;
        }
        let (key, val) = line.split_once('=').ok_or_else(|| Error::Parse {
            attribute,
            text: line.into(),
            reason: "expected KEY=VALUE".into(),
        })?;
        map.insert(key.into(), val.into());
    }
    Ok(map)
}
