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

//! # CSV Export Plugins
//!
//! Writes the batch to a CSV file and passes it through unchanged.
//!
//! ```json
//! {"output-path": "out/impact.csv", "headers": ["timestamp", "energy"]}
//! ```
//!
//! Without `headers` the columns are the keys of the first record. Rows are
//! CRLF terminated and a field missing from a record is written empty.
//! `GrafanaExport` is the same writer registered under a second name.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config_object, from_fields};
use crate::errors::{Result, ZiError, ZiErrorBuilder};
use crate::plugin::ZiPlugin;
use crate::record::{display_value, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

#[derive(Clone, Debug, Deserialize)]
struct ZiCsvExportConfig {
    #[serde(rename = "output-path")]
    output_path: PathBuf,
    #[serde(default)]
    headers: Vec<String>,
}

/// Renders `batch` as CSV text under `headers`.
pub fn render_csv(headers: &[String], batch: &ZiRecordBatch) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for record in batch {
        writer.write_record(headers.iter().map(|header| {
            record.get(header).map(display_value).unwrap_or_default()
        }))?;
    }
    writer
        .into_inner()
        .map_err(|err| std::io::Error::new(err.error().kind(), err.error().to_string()).into())
}

#[derive(Debug)]
pub struct ZiCsvExport {
    name: &'static str,
    errors: ZiErrorBuilder,
    config: Option<ZiCsvExportConfig>,
}

impl Default for ZiCsvExport {
    fn default() -> Self {
        Self::named("CsvExport")
    }
}

impl ZiCsvExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The writer registered as `GrafanaExport`.
    pub fn grafana() -> Self {
        Self::named("GrafanaExport")
    }

    fn named(name: &'static str) -> Self {
        Self {
            name,
            errors: ZiErrorBuilder::new(name),
            config: None,
        }
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("output-path", ZiFieldType::string()))
            .field(ZiField::optional("headers", ZiFieldType::array(ZiFieldType::string())))
    }

    async fn write(&self, path: &Path, contents: Vec<u8>) -> Result<()> {
        let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(directory) = directory {
            tokio::fs::create_dir_all(directory).await.map_err(|err| {
                ZiError::make_directory(self.errors.message(format!(
                    "Failed to create directory for CSV at path: {} {}",
                    directory.display(),
                    err
                )))
            })?;
        }
        tokio::fs::write(path, contents).await.map_err(|err| {
            ZiError::write_file(
                self.errors
                    .message(format!("Failed to write CSV to {} {}", path.display(), err)),
            )
        })
    }
}

#[async_trait]
impl ZiPlugin for ZiCsvExport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&self.errors, config)?;
        let validated = Self::config_schema().validate(fields)?;
        self.config = Some(from_fields(&self.errors, validated)?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| self.errors.missing_config())?;
        let headers = match (config.headers.is_empty(), inputs.first()) {
            (true, Some(first)) => first.fields().keys().cloned().collect(),
            _ => config.headers.clone(),
        };
        let contents = render_csv(&headers, &inputs).map_err(|err| {
            ZiError::write_file(self.errors.message(format!(
                "Failed to write CSV to {} {}",
                config.output_path.display(),
                err
            )))
        })?;
        self.write(&config.output_path, contents).await?;
        log::info!(
            "{} wrote {} row(s) to {}",
            self.name,
            inputs.len(),
            config.output_path.display()
        );
        Ok(inputs)
    }
}
