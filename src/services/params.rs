//! Endpoint Parameters
//!
//! Required-option checks and the normalization applied to options before
//! they are put on the wire.

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

/// Options passed to an endpoint.
pub type Params = Map<String, Value>;

/// Largest `limit` the API accepts.
pub const MAX_LIMIT: i64 = 1024;

/// Timestamps at or below this are seconds; above it, milliseconds.
const SECONDS_CUTOFF: f64 = 1e10;

/// Check that every `required` option is present as a key.
///
/// A key holding `null` is present; it is simply not sent. The error names
/// the first missing option, or `options` itself when none were given.
pub fn validate_required(
    context: &str,
    options: Option<&Params>,
    required: &[&str],
) -> ApiResult<()> {
    if required.is_empty() {
        return Ok(());
    }

    let options = options
        .ok_or_else(|| ApiError::validation(format!("{} 'options' not set.", context)))?;

    match required
        .iter()
        .find(|name| !options.contains_key(**name))
    {
        Some(name) => Err(ApiError::validation(format!("{} '{}' not set.", context, name))),
        None => Ok(()),
    }
}

/// Build a [`Params`] map from `(key, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Normalize a date option to Unix seconds.
///
/// Numbers (or numeric strings) at or below 1e10 are taken as seconds, larger
/// ones as milliseconds. RFC 3339 strings are parsed. `"last"` passes through.
pub fn normalize_date(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => n.as_f64().and_then(epoch_seconds).map(Value::from),
        Value::String(s) => {
            let s = s.trim();
            if s == "last" {
                return Some(Value::from("last"));
            }
            if let Ok(f) = s.parse::<f64>() {
                return epoch_seconds(f).map(Value::from);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| Value::from(dt.timestamp()))
        }
        _ => None,
    }
}

fn epoch_seconds(value: f64) -> Option<i64> {
    let millis = if value <= SECONDS_CUTOFF {
        value * 1000.0
    } else {
        value
    };
    let seconds = (millis / 1000.0).floor();
    // Rejects NaN, infinities and anything `as i64` would saturate.
    if seconds.is_finite() && seconds.abs() < i64::MAX as f64 {
        Some(seconds as i64)
    } else {
        None
    }
}

/// Parse `limit` as an integer, clamped to [`MAX_LIMIT`].
///
/// Strings are parsed up to the first non-digit, so `"10 rows"` is 10.
pub fn normalize_limit(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s.trim()),
        _ => None,
    }?;
    Some(parsed.min(MAX_LIMIT))
}

fn leading_integer(s: &str) -> Option<i64> {
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

/// Coerce an option to a boolean.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Normalize a measurement type list: arrays are joined with commas, all
/// whitespace is dropped and the result lowercased.
pub fn normalize_type_list(value: &Value) -> Value {
    let joined = match value {
        Value::Array(items) => items.iter().map(wire_string).collect::<Vec<_>>().join(","),
        other => wire_string(other),
    };
    Value::from(
        joined
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase(),
    )
}

/// String form of an option value as sent on the wire.
pub fn wire_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(wire_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Flatten options into wire key/value pairs. `null` options are dropped.
pub fn to_wire_pairs(options: &Params) -> Vec<(String, String)> {
    options
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), wire_string(v)))
        .collect()
}

/// Options for the public data endpoint: `required_data` is normalized like
/// a type list, everything else is forwarded.
pub fn normalize_public_data(mut options: Params) -> Params {
    if let Some(required_data) = options.get("required_data").filter(|v| !v.is_null()) {
        let normalized = normalize_type_list(required_data);
        options.insert("required_data".to_string(), normalized);
    }
    options
}

/// Options for the measure endpoints.
///
/// Only `forward` keys plus the date, limit and flag options are kept; dates,
/// `limit`, `type` and the flags are normalized.
pub fn normalize_measure(context: &str, options: &Params, forward: &[&str]) -> ApiResult<Params> {
    let mut out = Params::new();

    for key in forward {
        if let Some(value) = options.get(*key).filter(|v| !v.is_null()) {
            let value = if *key == "type" {
                normalize_type_list(value)
            } else {
                value.clone()
            };
            out.insert((*key).to_string(), value);
        }
    }

    for key in ["date_begin", "date_end"] {
        if let Some(value) = options.get(key).filter(|v| !v.is_null()) {
            let normalized = normalize_date(value).ok_or_else(|| {
                ApiError::validation(format!("{} '{}' is not a valid date.", context, key))
            })?;
            if key == "date_begin" && normalized.is_string() {
                return Err(ApiError::validation(format!(
                    "{} '{}' is not a valid date.",
                    context, key
                )));
            }
            out.insert(key.to_string(), normalized);
        }
    }

    if let Some(value) = options.get("limit").filter(|v| !v.is_null()) {
        let limit = normalize_limit(value).ok_or_else(|| {
            ApiError::validation(format!("{} 'limit' is not a valid integer.", context))
        })?;
        out.insert("limit".to_string(), Value::from(limit));
    }

    for key in ["optimize", "real_time"] {
        if let Some(value) = options.get(key) {
            out.insert(key.to_string(), Value::from(coerce_bool(value)));
        }
    }

    Ok(out)
}
