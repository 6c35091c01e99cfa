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

//! # Plugins Module
//!
//! This module contains every calculation plugin bundled with Zimpact.
//!
//! ## Plugin Families
//!
//! - **arithmetic**: Sum, Multiply, Subtract, Divide, Coefficient, Exponent
//! - **regex**: Regex extraction
//! - **aggregate**: whole-batch Aggregate
//! - **energy**: ENet, EMem, SciE, SciO, SciM
//! - **sci**: the SCI score with functional-unit time normalization
//! - **tdp**: TdpFinder reference-table lookup
//! - **cloud**: CloudInstanceMetadata and CloudMetadata
//! - **mock**: MockObservations generator
//! - **export**: CsvExport and GrafanaExport
//! - **shell**: ShellExec subprocess bridge
//!
//! ## Usage
//!
//! Plugins are constructed with `new()`, configured once through
//! [`ZiPlugin::configure`](crate::plugin::ZiPlugin::configure), then
//! executed any number of times. The [`registry`](crate::registry) module
//! maps plugin names to these constructors.

pub mod aggregate;
pub mod arithmetic;
pub mod cloud;
pub mod energy;
pub mod export;
pub mod mock;
pub mod regex;
pub mod sci;
pub mod shell;
pub mod tdp;

use serde_json::Value;

use crate::errors::{Result, ZiErrorBuilder};
use crate::record::{display_value, ZiRecord};

/// Looks up a field that must be present and numeric.
pub(crate) fn numeric_field(errors: &ZiErrorBuilder, record: &ZiRecord, name: &str) -> Result<f64> {
    let value = present_field(errors, record, name)?;
    value
        .as_f64()
        .ok_or_else(|| errors.input_validation(format!("{} is not numeric", display_value(value))))
}

/// Looks up a field that must be present.
pub(crate) fn present_field<'a>(
    errors: &ZiErrorBuilder,
    record: &'a ZiRecord,
    name: &str,
) -> Result<&'a Value> {
    record
        .get(name)
        .ok_or_else(|| errors.input_validation(format!("{name} is missing from the input array")))
}

/// JavaScript-style truthiness used for "present" checks on record fields.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
