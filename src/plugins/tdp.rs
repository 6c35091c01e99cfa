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

//! # TDP Finder Plugin
//!
//! Looks up the thermal design power of the processors named in
//! `physical-processor` and writes the largest one to
//! `cpu/thermal-design-power`.
//!
//! ## Reference Tables
//!
//! `configure({"data-files": [...]})` reads every file before returning.
//! Each row is `name[@frequency],tdp`; the `@...` suffix is dropped and the
//! name trimmed. Rows whose TDP does not parse (headers, blank lines) are
//! skipped. When a name appears more than once, across rows or files, the
//! largest TDP wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config_object, from_fields, parse_float};
use crate::errors::{Result, ZiError, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::record::ZiRecordBatch;
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

pub const OUTPUT_FIELD: &str = "cpu/thermal-design-power";

/// Processor name to TDP map, merged max-wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZiTdpTable {
    entries: HashMap<String, f64>,
}

impl ZiTdpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `tdp` for `name` unless a larger value is already known.
    pub fn insert(&mut self, name: &str, tdp: f64) {
        let name = normalize_name(name);
        if name.is_empty() || tdp.is_nan() {
            return;
        }
        let entry = self.entries.entry(name).or_insert(tdp);
        if *entry < tdp {
            *entry = tdp;
        }
    }

    /// Merges rows of `name[@freq],tdp` CSV text.
    pub fn merge_csv(&mut self, text: &str) -> std::result::Result<usize, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut merged = 0;
        for row in reader.records() {
            let row = row?;
            let (Some(name), Some(tdp)) = (row.get(0), row.get(1)) else {
                continue;
            };
            if let Some(tdp) = parse_float(tdp) {
                self.insert(name, tdp);
                merged += 1;
            }
        }
        Ok(merged)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.split('@').next().unwrap_or_default().trim().to_string()
}

/// Reads and merges one reference table file.
pub(crate) async fn load_table(table: &mut ZiTdpTable, path: &Path) -> Result<usize> {
    let read_error = |err: &dyn std::fmt::Display| {
        ZiError::read_file(format!("Error reading file {}: {}", path.display(), err))
    };
    let text = tokio::fs::read_to_string(path).await.map_err(|err| read_error(&err))?;
    table.merge_csv(&text).map_err(|err| read_error(&err))
}

#[derive(Clone, Debug, Deserialize)]
struct ZiTdpFinderConfig {
    #[serde(rename = "data-files")]
    data_files: Vec<PathBuf>,
}

/// Maximum TDP lookup across a comma-separated processor list.
#[derive(Debug, Default)]
pub struct ZiTdpFinder {
    table: Option<ZiTdpTable>,
}

impl ZiTdpFinder {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("TdpFinder");

    pub fn new() -> Self {
        Self::default()
    }

    /// A finder backed by an already loaded table.
    pub fn with_table(table: ZiTdpTable) -> Self {
        Self { table: Some(table) }
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new().field(ZiField::required(
            "data-files",
            ZiFieldType::array(ZiFieldType::string().non_empty()).non_empty(),
        ))
    }

    fn record_schema() -> ZiSchema {
        ZiSchema::new().field(ZiField::required("physical-processor", ZiFieldType::string()))
    }
}

#[async_trait]
impl ZiPlugin for ZiTdpFinder {
    fn name(&self) -> &'static str {
        "TdpFinder"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&Self::ERRORS, config)?;
        let validated = Self::config_schema().validate(fields)?;
        let config: ZiTdpFinderConfig = from_fields(&Self::ERRORS, validated)?;

        let mut table = ZiTdpTable::new();
        for path in &config.data_files {
            let rows = load_table(&mut table, path).await?;
            log::info!("TdpFinder loaded {} row(s) from {}", rows, path.display());
        }
        self.table = Some(table);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let table = self.table.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        let schema = Self::record_schema();
        map_records(inputs, |index, mut record| {
            let safe = schema.validate(record.fields())?;
            let processors = safe
                .get("physical-processor")
                .and_then(Value::as_str)
                .unwrap_or_default();

            let mut max_tdp = 0.0_f64;
            for processor in processors.split(',').map(str::trim) {
                let tdp = table.get(processor).ok_or_else(|| {
                    ZiError::unsupported_value(Self::ERRORS.message(format!(
                        "'physical-processor': {processor} from input[{index}] is not found in the database"
                    )))
                })?;
                max_tdp = max_tdp.max(tdp);
            }
            record.insert_number(OUTPUT_FIELD, max_tdp);
            Ok(record)
        })
    }
}
