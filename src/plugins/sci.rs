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

//! # SCI Plugin
//!
//! Computes the Software Carbon Intensity score of each record, expressed per
//! functional unit and per a user-chosen span of time.
//!
//! ## Functional Unit Time
//!
//! `functional-unit-time` is `"<number><sep><unit>"` with `<sep>` one of
//! space, underscore or hyphen (`"1 min"`, `"2_d"`, `"2-d"`). It is checked
//! in this order:
//!
//! 1. present (record, then global config)
//! 2. the leading number is positive
//! 3. exactly one value and one unit
//! 4. the unit is a known synonym
//!
//! Each failure has its own message. Months are four weeks and years are
//! 365 days. The single letter `m` means months, not minutes.
//!
//! ## Formula
//!
//! ```text
//! carbon_per_second = carbon / duration                                  (carbon present)
//!                   = (operational-carbon + embodied-carbon) / duration  (otherwise, written as `carbon`)
//! sci = carbon_per_second * seconds_per_unit * value / factor
//! ```
//!
//! `factor` is `record[record["functional-unit"]]` when that field exists
//! and is neither `"none"` nor empty, else `1`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::config::{coerce_number, parse_float, resolve};
use crate::errors::{Result, ZiError, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::record::{display_value, ZiFields, ZiRecord, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Sci");

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;

/// Seconds in one `unit`, or `None` for an unknown unit.
pub fn seconds_per_unit(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "s" | "second" | "sec" | "secs" | "seconds" => 1.0,
        "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hs" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "ds" | "day" | "days" => DAY,
        "w" | "ws" | "wk" | "wks" | "week" | "weeks" => WEEK,
        "m" | "mnth" | "mth" | "mnths" | "mths" | "month" | "months" => 4.0 * WEEK,
        "y" | "ys" | "yr" | "yrs" | "year" | "years" => 365.0 * DAY,
        _ => return None,
    };
    Some(seconds)
}

fn separator() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-_ ]").expect("separator pattern is valid"))
}

/// Parsed `functional-unit-time`.
#[derive(Clone, Debug, PartialEq)]
pub struct ZiFunctionalUnitTime {
    pub value: f64,
    pub unit: String,
}

impl ZiFunctionalUnitTime {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = separator().split(text).collect();

        let value = tokens.first().and_then(|token| parse_float(token));
        let value = match value {
            Some(value) if value > 0.0 => value,
            _ => return Err(ERRORS.input_validation("functional-unit-time is not a valid positive number")),
        };

        if tokens.len() != 2 {
            return Err(ERRORS.input_validation(
                "Error parsing functional-unit-time. Please ensure you have provided one value and one unit and they are either space, underscore or hyphen separated",
            ));
        }

        let unit = tokens[1];
        if seconds_per_unit(unit).is_none() {
            return Err(ERRORS.input_validation("functional-unit-time is not in recognized unit of time"));
        }

        Ok(Self {
            value,
            unit: unit.to_string(),
        })
    }

    /// Seconds in one unit of the span.
    pub fn unit_seconds(&self) -> f64 {
        seconds_per_unit(&self.unit).unwrap_or(1.0)
    }

    /// Length of the span in seconds.
    pub fn seconds(&self) -> f64 {
        self.value * self.unit_seconds()
    }
}

/// Software Carbon Intensity score.
#[derive(Debug, Default)]
pub struct ZiSci {
    global: Option<ZiFields>,
}

impl ZiSci {
    pub fn new() -> Self {
        Self::default()
    }

    fn base_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("duration", ZiFieldType::number().coerce().gt(0.0)))
            .field(ZiField::optional("carbon", ZiFieldType::number().coerce()))
    }

    fn components_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("operational-carbon", ZiFieldType::number().coerce()))
            .field(ZiField::required("embodied-carbon", ZiFieldType::number().coerce()))
    }

    fn global(&self, key: &str) -> Option<&Value> {
        self.global.as_ref().and_then(|global| global.get(key))
    }

    fn functional_unit_time(&self, record: &ZiRecord) -> Result<ZiFunctionalUnitTime> {
        let raw = resolve(record.get("functional-unit-time"), self.global("functional-unit-time"), None)
            .ok_or_else(|| ERRORS.input_validation("functional-unit-time is not available"))?;
        let parsed = ZiFunctionalUnitTime::parse(&display_value(raw))?;
        if parsed.unit == "m" {
            log::warn!(
                "functional-unit-time unit `m` is interpreted as months; use `min` for minutes"
            );
        }
        Ok(parsed)
    }

    fn factor(&self, record: &ZiRecord) -> Result<f64> {
        let unit_field = resolve(record.get("functional-unit"), self.global("functional-unit"), None)
            .and_then(Value::as_str);
        let Some(unit_field) = unit_field else {
            return Ok(1.0);
        };
        match record.get(unit_field) {
            None => Ok(1.0),
            Some(Value::String(text)) if text.is_empty() || text == "none" => Ok(1.0),
            Some(value) => coerce_number(value).filter(|factor| *factor != 0.0).ok_or_else(|| {
                ZiError::input_validation(ERRORS.message(format!(
                    "functional unit `{}` must be a non-zero number, received {}",
                    unit_field,
                    display_value(value)
                )))
            }),
        }
    }
}

#[async_trait]
impl ZiPlugin for ZiSci {
    fn name(&self) -> &'static str {
        "Sci"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = match config {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) => Some(fields.clone()),
            Some(_) => return Err(ERRORS.input_validation("Configuration data must be an object")),
        };
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let base = Self::base_schema();
        let components = Self::components_schema();
        map_records(inputs, |_, mut record| {
            let time = self.functional_unit_time(&record)?;
            let safe = base.validate(record.fields())?;
            let duration = safe.get("duration").and_then(Value::as_f64).unwrap_or(1.0);

            let carbon_per_second = match safe.get("carbon").and_then(Value::as_f64) {
                Some(carbon) => carbon / duration,
                None => {
                    let parts = components.validate(record.fields())?;
                    let operational = parts.get("operational-carbon").and_then(Value::as_f64).unwrap_or(0.0);
                    let embodied = parts.get("embodied-carbon").and_then(Value::as_f64).unwrap_or(0.0);
                    let per_second = (operational + embodied) / duration;
                    record.insert_number("carbon", per_second);
                    per_second
                }
            };

            let factor = self.factor(&record)?;
            let sci = carbon_per_second * time.unit_seconds() * time.value / factor;
            record.insert_number("sci", sci);
            Ok(record)
        })
    }
}
