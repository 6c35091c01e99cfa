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

//! # Arithmetic Plugins
//!
//! Single-formula plugins whose global configuration names the input fields
//! and the output field. Configuration keys are kebab-case and preserved
//! verbatim for pipeline manifests:
//!
//! | Plugin      | Keys                                                   |
//! |-------------|--------------------------------------------------------|
//! | Sum         | `input-parameters` (>= 2), `output-parameter`          |
//! | Multiply    | `input-parameters` (>= 2), `output-parameter`          |
//! | Subtract    | `input-parameters` (>= 1), `output-parameter`          |
//! | Divide      | `numerator`, `denominator` (field or number > 0), `output` |
//! | Coefficient | `input-parameter`, `coefficient`, `output-parameter`   |
//! | Exponent    | `input-parameter`, `exponent` (>= 1), `output-parameter` |

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config_object, from_fields, strict_number};
use crate::errors::{Result, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::plugins::{is_truthy, numeric_field, present_field};
use crate::record::{display_value, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

#[derive(Clone, Debug, Deserialize)]
pub struct ZiParametersConfig {
    #[serde(rename = "input-parameters")]
    pub input_parameters: Vec<String>,
    #[serde(rename = "output-parameter")]
    pub output_parameter: String,
}

fn parameters_schema(min_inputs: usize) -> ZiSchema {
    ZiSchema::new()
        .field(ZiField::required(
            "input-parameters",
            ZiFieldType::array(ZiFieldType::string()).min_len(min_inputs),
        ))
        .field(ZiField::required("output-parameter", ZiFieldType::string().non_empty()))
}

fn configure_parameters(
    errors: &ZiErrorBuilder,
    config: Option<&Value>,
    min_inputs: usize,
) -> Result<ZiParametersConfig> {
    let fields = config_object(errors, config)?;
    let validated = parameters_schema(min_inputs).validate(fields)?;
    from_fields(errors, validated)
}

/// Folds the named fields of every record with `op`, starting from `identity`.
fn reduce_records(
    errors: &ZiErrorBuilder,
    config: &ZiParametersConfig,
    inputs: ZiRecordBatch,
    identity: f64,
    op: fn(f64, f64) -> f64,
) -> Result<ZiRecordBatch> {
    map_records(inputs, |_, mut record| {
        let mut acc = identity;
        for name in &config.input_parameters {
            acc = op(acc, numeric_field(errors, &record, name)?);
        }
        record.insert_number(config.output_parameter.clone(), acc);
        Ok(record)
    })
}

/// Adds the named fields.
#[derive(Debug, Default)]
pub struct ZiSum {
    config: Option<ZiParametersConfig>,
}

impl ZiSum {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Sum");

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZiPlugin for ZiSum {
    fn name(&self) -> &'static str {
        "Sum"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.config = Some(configure_parameters(&Self::ERRORS, config, 2)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        reduce_records(&Self::ERRORS, config, inputs, 0.0, |acc, value| acc + value)
    }
}

/// Multiplies the named fields.
#[derive(Debug, Default)]
pub struct ZiMultiply {
    config: Option<ZiParametersConfig>,
}

impl ZiMultiply {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Multiply");

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZiPlugin for ZiMultiply {
    fn name(&self) -> &'static str {
        "Multiply"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.config = Some(configure_parameters(&Self::ERRORS, config, 2)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        reduce_records(&Self::ERRORS, config, inputs, 1.0, |acc, value| acc * value)
    }
}

/// Subtracts every following field from the first one.
///
/// Numeric strings such as `"3"` are accepted.
#[derive(Debug, Default)]
pub struct ZiSubtract {
    config: Option<ZiParametersConfig>,
}

impl ZiSubtract {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Subtract");

    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZiPlugin for ZiSubtract {
    fn name(&self) -> &'static str {
        "Subtract"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.config = Some(configure_parameters(&Self::ERRORS, config, 1)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        let errors = Self::ERRORS;
        map_records(inputs, |_, mut record| {
            let mut values = Vec::with_capacity(config.input_parameters.len());
            for name in &config.input_parameters {
                let value = present_field(&errors, &record, name)?;
                let number = strict_number(value).ok_or_else(|| {
                    errors.input_validation(format!("{} is not numeric", display_value(value)))
                })?;
                values.push(number);
            }
            let mut values = values.into_iter();
            let first = values.next().unwrap_or(0.0);
            let difference = values.fold(first, |acc, value| acc - value);
            record.insert_number(config.output_parameter.clone(), difference);
            Ok(record)
        })
    }
}

/// Denominator of a division: a record field name or a literal number.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ZiDenominator {
    Field(String),
    Literal(f64),
}

#[derive(Clone, Debug, Deserialize)]
pub struct ZiDivideConfig {
    pub numerator: String,
    pub denominator: ZiDenominator,
    pub output: String,
}

/// Divides a numerator field by a field or a literal.
#[derive(Debug, Default)]
pub struct ZiDivide {
    config: Option<ZiDivideConfig>,
}

impl ZiDivide {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Divide");

    pub fn new() -> Self {
        Self::default()
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("numerator", ZiFieldType::string().non_empty()))
            .field(ZiField::required(
                "denominator",
                ZiFieldType::union(vec![ZiFieldType::string(), ZiFieldType::number().gt(0.0)]),
            ))
            .field(ZiField::required("output", ZiFieldType::string()))
    }

    fn record_schema(config: &ZiDivideConfig) -> ZiSchema {
        let schema = ZiSchema::new().field(ZiField::required(
            config.numerator.clone(),
            ZiFieldType::number(),
        ));
        match &config.denominator {
            ZiDenominator::Field(name) => {
                schema.field(ZiField::optional(name.clone(), ZiFieldType::number()))
            }
            ZiDenominator::Literal(_) => schema,
        }
    }
}

#[async_trait]
impl ZiPlugin for ZiDivide {
    fn name(&self) -> &'static str {
        "Divide"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&Self::ERRORS, config)?;
        let validated = Self::config_schema().validate(fields)?;
        self.config = Some(from_fields(&Self::ERRORS, validated)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        let schema = Self::record_schema(config);
        map_records(inputs, |_, mut record| {
            schema.validate(record.fields())?;
            let numerator = record.number(&config.numerator).unwrap_or(f64::NAN);
            let denominator = match &config.denominator {
                ZiDenominator::Literal(value) => *value,
                ZiDenominator::Field(name) => match record.get(name) {
                    Some(value) if is_truthy(value) => value.as_f64().unwrap_or(f64::NAN),
                    _ => {
                        return Err(Self::ERRORS
                            .input_validation(format!("`{name}` is missing from the input")))
                    }
                },
            };
            record.insert_number(config.output.clone(), numerator / denominator);
            Ok(record)
        })
    }
}

#[derive(Clone, Debug)]
struct ZiCoefficientConfig {
    input_parameter: String,
    coefficient: f64,
    output_parameter: String,
}

/// Multiplies one field by a configured constant.
#[derive(Debug, Default)]
pub struct ZiCoefficient {
    config: Option<ZiCoefficientConfig>,
}

impl ZiCoefficient {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Coefficient");

    pub fn new() -> Self {
        Self::default()
    }
}

fn non_empty_str<'a>(fields: &'a crate::record::ZiFields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str).filter(|text| !text.is_empty())
}

#[async_trait]
impl ZiPlugin for ZiCoefficient {
    fn name(&self) -> &'static str {
        "Coefficient"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let errors = Self::ERRORS;
        let fields = config_object(&errors, config)?;
        let input_parameter = non_empty_str(fields, "input-parameter")
            .ok_or_else(|| errors.input_validation("No input parameter was provided in global config"))?;
        let coefficient = fields
            .get("coefficient")
            .and_then(Value::as_f64)
            .filter(|value| *value != 0.0)
            .ok_or_else(|| errors.input_validation("The coefficient is missing from global config"))?;
        let output_parameter = non_empty_str(fields, "output-parameter").ok_or_else(|| {
            errors.input_validation("The output parameter name was missing from global config")
        })?;

        self.config = Some(ZiCoefficientConfig {
            input_parameter: input_parameter.to_string(),
            coefficient,
            output_parameter: output_parameter.to_string(),
        });
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        map_records(inputs, |_, mut record| {
            let value = numeric_field(&Self::ERRORS, &record, &config.input_parameter)?;
            record.insert_number(config.output_parameter.clone(), value * config.coefficient);
            Ok(record)
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ZiExponentConfig {
    #[serde(rename = "input-parameter")]
    pub input_parameter: String,
    pub exponent: f64,
    #[serde(rename = "output-parameter")]
    pub output_parameter: String,
}

/// Raises one field to a configured power.
#[derive(Debug, Default)]
pub struct ZiExponent {
    config: Option<ZiExponentConfig>,
}

impl ZiExponent {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Exponent");

    pub fn new() -> Self {
        Self::default()
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("input-parameter", ZiFieldType::string().non_empty()))
            .field(ZiField::required("exponent", ZiFieldType::number().min(1.0)))
            .field(ZiField::required("output-parameter", ZiFieldType::string().non_empty()))
    }
}

#[async_trait]
impl ZiPlugin for ZiExponent {
    fn name(&self) -> &'static str {
        "Exponent"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&Self::ERRORS, config)?;
        let validated = Self::config_schema().validate(fields)?;
        self.config = Some(from_fields(&Self::ERRORS, validated)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        map_records(inputs, |_, mut record| {
            let base = numeric_field(&Self::ERRORS, &record, &config.input_parameter)?;
            record.insert_number(config.output_parameter.clone(), base.powf(config.exponent));
            Ok(record)
        })
    }
}
