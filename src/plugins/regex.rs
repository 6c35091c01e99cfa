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

//! Regex extraction: writes the first match of `match` found in
//! `record[parameter]` into `output`. A value without a match is an error.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config_object, from_fields};
use crate::errors::{Result, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::plugins::is_truthy;
use crate::record::{display_value, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

#[derive(Clone, Debug, Deserialize)]
struct ZiRegexConfig {
    parameter: String,
    #[serde(rename = "match")]
    pattern: String,
    output: String,
}

#[derive(Debug)]
struct ZiCompiledRegex {
    parameter: String,
    pattern: Regex,
    output: String,
}

/// Extracts the first regex match from a field.
#[derive(Debug, Default)]
pub struct ZiRegex {
    config: Option<ZiCompiledRegex>,
}

impl ZiRegex {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("Regex");

    pub fn new() -> Self {
        Self::default()
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("parameter", ZiFieldType::string().non_empty()))
            .field(ZiField::required("match", ZiFieldType::string().non_empty()))
            .field(ZiField::required("output", ZiFieldType::string()))
    }
}

#[async_trait]
impl ZiPlugin for ZiRegex {
    fn name(&self) -> &'static str {
        "Regex"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let errors = Self::ERRORS;
        let fields = config_object(&errors, config)?;
        let validated = Self::config_schema().validate(fields)?;
        let config: ZiRegexConfig = from_fields(&errors, validated)?;
        let pattern = Regex::new(&config.pattern).map_err(|err| {
            errors.input_validation(format!("`{}` is not a valid regex expression: {}", config.pattern, err))
        })?;

        self.config = Some(ZiCompiledRegex {
            parameter: config.parameter,
            pattern,
            output: config.output,
        });
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        map_records(inputs, |_, mut record| {
            let text = match record.get(&config.parameter) {
                Some(value) if is_truthy(value) => display_value(value),
                _ => {
                    return Err(Self::ERRORS
                        .input_validation(format!("`{}` is missing from the input", config.parameter)))
                }
            };
            let matched = config.pattern.find(&text).map(|found| found.as_str().to_string());
            match matched {
                Some(matched) if !matched.is_empty() => {
                    record.insert(config.output.clone(), Value::String(matched));
                    Ok(record)
                }
                _ => Err(Self::ERRORS.input_validation(format!(
                    "`{}` does not match the /{}/ regex expression",
                    text,
                    config.pattern.as_str()
                ))),
            }
        })
    }
}
