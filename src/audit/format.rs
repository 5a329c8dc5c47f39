//! Value formatting for the audit log
//!
//! Two rules are used:
//!
//! - field values ([`format_value`]): null is absent, text and date/time
//!   values are double-quoted, except text shaped like a JSON object which is
//!   kept as-is so the stored payload stays parseable
//! - key values ([`format_key_value`]): text and date/time values are
//!   double-quoted, everything else uses its display form

use crate::models::FieldValue;

/// Format a field value for the `oldValue`/`newValue` columns
pub fn format_value(value: &FieldValue) -> Option<String> {
    if value.is_null() {
        return None;
    }

    if (value.is_text() && !value.looks_like_json_object()) || value.is_temporal() {
        return Some(quote(value));
    }

    Some(value.to_string())
}

/// Format a key value for the `keyValues` column
pub fn format_key_value(value: &FieldValue) -> String {
    if value.is_text() || value.is_temporal() {
        quote(value)
    } else {
        value.to_string()
    }
}

fn quote(value: &FieldValue) -> String {
    format!("\"{}\"", value)
}
