//! Value encoding for the text mode of PostgreSQL `COPY ... FROM stdin`.

use std::{borrow::Cow, fmt::Write as _};

use crate::{
    error::ValueError,
    sniff::{ColumnKind, try_parse_float, try_parse_int},
};

/// Token meaning NULL under `NULL AS ''`.
pub const NULL_TOKEN: &str = "";

/// Renders one cell as a COPY token for a column of `kind`.
///
/// Empty, absent and `\N` values become the empty token. Text never fails;
/// integer and float targets fail with [`ValueError::TypeMismatch`] when the
/// value does not parse.
pub fn encode(value: Option<&str>, kind: ColumnKind) -> Result<Cow<'_, str>, ValueError> {
    let value = match value {
        None => return Ok(Cow::Borrowed(NULL_TOKEN)),
        Some(v) if v.is_empty() || v == "\\N" => return Ok(Cow::Borrowed(NULL_TOKEN)),
        Some(v) => v,
    };
    match kind {
        ColumnKind::Integer => encode_integer(value).map(Cow::Owned),
        ColumnKind::Float => encode_float(value).map(Cow::Owned),
        ColumnKind::Text => Ok(escape_control(value)),
    }
}

fn encode_integer(value: &str) -> Result<String, ValueError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok("1".to_string());
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok("0".to_string());
    }
    try_parse_int(trimmed)
        .map(|parsed| parsed.to_string())
        .ok_or_else(|| mismatch(value, ColumnKind::Integer))
}

fn encode_float(value: &str) -> Result<String, ValueError> {
    try_parse_float(value)
        .map(|parsed| parsed.to_string())
        .ok_or_else(|| mismatch(value, ColumnKind::Float))
}

fn mismatch(value: &str, expected: ColumnKind) -> ValueError {
    ValueError::TypeMismatch {
        value: value.to_string(),
        expected,
    }
}

/// Escapes every character below U+0020 as `\xHH`.
pub fn escape_control(value: &str) -> Cow<'_, str> {
    if !value.chars().any(is_low_control) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        if is_low_control(ch) {
            let _ = write!(escaped, "\\x{:02x}", ch as u32);
        } else {
            escaped.push(ch);
        }
    }
    Cow::Owned(escaped)
}

fn is_low_control(ch: char) -> bool {
    (ch as u32) < 0x20
}

/// Rejects a value that opens with `"` and carries an odd number of quotes.
pub fn check_quoting(value: &str) -> Result<(), ValueError> {
    if value.starts_with('"') && value.matches('"').count() % 2 == 1 {
        return Err(ValueError::MalformedQuotedValue {
            value: value.to_string(),
        });
    }
    Ok(())
}
