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

//! # Zimpact Record Module
//!
//! This module provides the observation record that flows between plugins.
//! A record is an ordered mapping from field name to JSON value. By
//! convention every record carries `timestamp` (ISO-8601 string) and
//! `duration` (seconds), but plugins only enforce the fields they consume.
//!
//! ## Usage Example
//!
//! ```rust
//! use zimpact::record::ZiRecord;
//! use serde_json::json;
//!
//! let mut record = ZiRecord::try_from(json!({
//!     "timestamp": "2023-11-02T10:35:31.820Z",
//!     "duration": 3600,
//!     "energy": 10
//! })).unwrap();
//!
//! record.insert_number("carbon", 5.0);
//! assert_eq!(record.get("carbon"), Some(&json!(5)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::{Result, ZiError};

/// Ordered field map backing records and plugin configuration.
pub type ZiFields = Map<String, Value>;

/// One timestamped, duration-tagged observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZiRecord {
    fields: ZiFields,
}

impl ZiRecord {
    /// Constructs an empty record.
    pub fn new() -> Self {
        ZiRecord {
            fields: ZiFields::new(),
        }
    }

    /// Constructs a record carrying the conventional `timestamp` and `duration` fields.
    pub fn observation(timestamp: impl Into<String>, duration: f64) -> Self {
        let mut record = Self::new();
        record.insert("timestamp", Value::String(timestamp.into()));
        record.insert_number("duration", duration);
        record
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Inserts or overwrites a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(name.into(), value)
    }

    /// Inserts a computed number, storing whole values as JSON integers.
    pub fn insert_number(&mut self, name: impl Into<String>, value: f64) -> Option<Value> {
        self.insert(name, number_value(value))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Numeric view of a field; strings are not coerced.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.get("timestamp").and_then(Value::as_str)
    }

    pub fn duration(&self) -> Option<f64> {
        self.number("duration")
    }

    pub fn fields(&self) -> &ZiFields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ZiFields {
        &mut self.fields
    }

    pub fn into_fields(self) -> ZiFields {
        self.fields
    }

    /// Copies every field of `fields` into the record, overwriting existing keys.
    pub fn extend(&mut self, fields: ZiFields) {
        for (key, value) in fields {
            self.fields.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<ZiFields> for ZiRecord {
    fn from(fields: ZiFields) -> Self {
        ZiRecord { fields }
    }
}

impl From<ZiRecord> for Value {
    fn from(record: ZiRecord) -> Self {
        Value::Object(record.fields)
    }
}

impl TryFrom<Value> for ZiRecord {
    type Error = ZiError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(ZiRecord { fields }),
            other => Err(ZiError::input_validation(format!(
                "record must be an object, received {}",
                value_type_name(&other)
            ))),
        }
    }
}

/// Convenience alias for working on batches of records.
pub type ZiRecordBatch = Vec<ZiRecord>;

/// Converts a computed number into a JSON value.
///
/// Whole numbers become integers so `2 + 3` reads back as `5`; non-finite
/// values have no JSON form and become `null`.
pub fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Type name used in validation messages (`number`, `string`, ...).
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value the way it is quoted inside error messages.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
