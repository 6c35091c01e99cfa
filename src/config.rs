//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zimpact.
//! The Zimpact project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Configuration Resolution
//!
//! Plugins see values from three tiers, in precedence order:
//!
//! 1. the record being processed,
//! 2. the global configuration supplied to `configure`,
//! 3. the plugin's builtin default.
//!
//! Only the network and memory energy coefficients treat a numeric zero as
//! "not provided"; every other field keeps zero as a real value.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{Result, ZiErrorBuilder};
use crate::record::{ZiFields, ZiRecord};

/// Picks the first provided value: record, then global config, then default.
pub fn resolve<'a>(
    record: Option<&'a Value>,
    global: Option<&'a Value>,
    default: Option<&'a Value>,
) -> Option<&'a Value> {
    record
        .filter(|value| !value.is_null())
        .or_else(|| global.filter(|value| !value.is_null()))
        .or(default)
}

/// Like [`resolve`], but a numeric zero in either tier counts as missing.
pub fn resolve_nonzero<'a>(
    record: Option<&'a Value>,
    global: Option<&'a Value>,
    default: Option<&'a Value>,
) -> Option<&'a Value> {
    resolve(
        record.filter(|value| !is_zero(value)),
        global.filter(|value| !is_zero(value)),
        default,
    )
}

/// Builds the merged per-record view: global config overlaid by record fields.
///
/// Keys listed in `zero_is_missing` keep the global value when the record
/// holds a numeric zero.
pub fn merge_layers(record: &ZiRecord, global: Option<&ZiFields>, zero_is_missing: &[&str]) -> ZiFields {
    let mut merged = global.cloned().unwrap_or_default();
    for (key, value) in record.fields() {
        if zero_is_missing.contains(&key.as_str()) {
            if let Some(resolved) = resolve_nonzero(Some(value), global.and_then(|g| g.get(key)), Some(value)) {
                merged.insert(key.clone(), resolved.clone());
            }
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn is_zero(value: &Value) -> bool {
    value.as_f64().map(|number| number == 0.0).unwrap_or(false)
}

/// Returns the configuration as an object, or the plugin's "Configuration data is missing" error.
pub fn config_object<'a>(errors: &ZiErrorBuilder, config: Option<&'a Value>) -> Result<&'a ZiFields> {
    match config {
        Some(Value::Object(fields)) => Ok(fields),
        Some(other) if !other.is_null() => Err(errors.input_validation(format!(
            "Configuration data must be an object, received {}",
            crate::record::value_type_name(other)
        ))),
        _ => Err(errors.missing_config()),
    }
}

/// Deserializes already validated fields into a typed configuration struct.
pub fn from_fields<T: DeserializeOwned>(errors: &ZiErrorBuilder, fields: ZiFields) -> Result<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| errors.input_validation(err.to_string()))
}

fn float_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("float prefix pattern is valid")
    })
}

/// Parses the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// `"12.5kg"` gives `12.5`, `"abc"` and `""` give `None`.
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let matched = float_prefix().find(trimmed)?.as_str();
    match matched.trim_start_matches(['+', '-']) {
        "Infinity" if matched.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => matched.parse().ok(),
    }
}

/// Numeric view of a value: numbers as-is, strings through [`parse_float`].
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float(text),
        _ => None,
    }
}

/// Strict numeric view: the whole string must be a number.
pub fn strict_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if text.trim().is_empty() => Some(0.0),
        Value::String(text) => text.trim().parse().ok().filter(|n: &f64| !n.is_nan()),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    }
}
