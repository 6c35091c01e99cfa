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

//! # Aggregate Plugin
//!
//! Reduces each configured metric over the whole batch to one scalar and
//! broadcasts it to every record as `aggregate-<metric>`. This is a single
//! reduce, not a windowed or grouped aggregation.
//!
//! Configuration is optional:
//!
//! - `metrics`: metric names, default `["energy", "carbon"]`
//! - `method`: `sum` (default) or one of `av`, `avg`, `avrg`, `average`,
//!   `mean`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{coerce_number, from_fields};
use crate::errors::{Result, ZiError, ZiErrorBuilder};
use crate::plugin::ZiPlugin;
use crate::record::{ZiFields, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

/// Reduction applied by [`ZiAggregate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiAggregationMethod {
    Sum,
    Average,
}

impl ZiAggregationMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "sum" => Some(Self::Sum),
            "av" | "avg" | "avrg" | "average" | "mean" => Some(Self::Average),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct ZiAggregateConfig {
    metrics: Vec<String>,
    method: String,
}

/// Whole-batch metric aggregation.
#[derive(Debug)]
pub struct ZiAggregate {
    metrics: Vec<String>,
    method: ZiAggregationMethod,
}

impl Default for ZiAggregate {
    fn default() -> Self {
        Self {
            metrics: vec!["energy".to_string(), "carbon".to_string()],
            method: ZiAggregationMethod::Sum,
        }
    }
}

impl ZiAggregate {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Aggregate");

    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn method(&self) -> ZiAggregationMethod {
        self.method
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new()
            .field(
                ZiField::optional("metrics", ZiFieldType::array(ZiFieldType::string().non_empty()).non_empty())
                    .with_default(serde_json::json!(["energy", "carbon"])),
            )
            .field(ZiField::optional("method", ZiFieldType::string()).with_default(Value::from("sum")))
    }
}

#[async_trait]
impl ZiPlugin for ZiAggregate {
    fn name(&self) -> &'static str {
        "Aggregate"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let errors = Self::ERRORS;
        let fields = match config {
            None | Some(Value::Null) => ZiFields::new(),
            Some(Value::Object(fields)) => fields.clone(),
            Some(_) => return Err(errors.input_validation("Configuration data must be an object")),
        };
        let validated = Self::config_schema().validate(&fields)?;
        let config: ZiAggregateConfig = from_fields(&errors, validated)?;
        let method = ZiAggregationMethod::parse(&config.method).ok_or_else(|| {
            errors.input_validation(format!("Aggregation method `{}` is not supported", config.method))
        })?;

        self.metrics = config.metrics;
        self.method = method;
        Ok(())
    }

    async fn execute(&self, mut inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        if inputs.is_empty() {
            return Ok(inputs);
        }

        let mut aggregates = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let mut total = 0.0;
            for (index, record) in inputs.iter().enumerate() {
                let value = record.get(metric).ok_or_else(|| {
                    ZiError::input_validation(
                        Self::ERRORS.message(format!("`{metric}` is missing from input[{index}]")),
                    )
                })?;
                total += coerce_number(value).ok_or_else(|| {
                    Self::ERRORS.input_validation(format!("`{metric}` is not numeric in input[{index}]"))
                })?;
            }
            let value = match self.method {
                ZiAggregationMethod::Sum => total,
                ZiAggregationMethod::Average => total / inputs.len() as f64,
            };
            aggregates.push((format!("aggregate-{metric}"), value));
        }

        for record in &mut inputs {
            for (name, value) in &aggregates {
                record.insert_number(name.clone(), *value);
            }
        }
        Ok(inputs)
    }
}
