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

//! # Cloud Metadata Plugins
//!
//! Static lookups of cloud instance and region reference data.
//!
//! ## Reference Tables
//!
//! Tables are CSV files with a header row, loaded during `configure` from
//! the paths given under `aws-instances`, `azure-instances` and `gsf-data`.
//! Only the columns used here are read; other columns are ignored.
//!
//! | Table     | Columns read |
//! |-----------|--------------|
//! | instances | `instance-class`, `cpu-cores-available`, `cpu-cores-utilized`, `memory-available`, `cpu-model-name`, `cpu-tdp` |
//! | regions   | `cloud-provider`, `cloud-region`, `cfe-region`, `em-zone-id`, `wt-region-id`, `location`, `geolocation` |
//!
//! ## Azure Instance Types
//!
//! Azure constrained-vCPU sizes are written `<family>-<size>`, e.g.
//! `Standard_M128-64ms`. They are looked up as the family followed by the
//! size with its leading digits removed (`Standard_M128ms`).
//!
//! ## Plugins
//!
//! - [`ZiCloudInstanceMetadata`] reads `cloud-vendor` and
//!   `cloud-instance-type`.
//! - [`ZiCloudMetadata`] reads `cloud/vendor`, `cloud/instance-type` and an
//!   optional `cloud/region`, and can filter the fields it adds.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{config_object, from_fields, parse_float};
use crate::errors::{Result, ZiError, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::record::{number_value, ZiFields, ZiRecordBatch};
use crate::schema::{ZiField, ZiFieldType, ZiSchema};

pub const SUPPORTED_VENDORS: [&str; 2] = ["aws", "azure"];

/// Cloud vendors with instance reference data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiCloudVendor {
    Aws,
    Azure,
}

impl ZiCloudVendor {
    pub fn parse(vendor: &str) -> Option<Self> {
        match vendor {
            "aws" => Some(Self::Aws),
            "azure" => Some(Self::Azure),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
        }
    }

    /// Provider name used in the region table.
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Aws => "Amazon Web Services",
            Self::Azure => "Microsoft Azure",
        }
    }
}

/// One row of an instance table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ZiInstanceRow {
    #[serde(rename = "instance-class")]
    pub instance_class: String,
    #[serde(rename = "cpu-cores-available", default)]
    pub cpu_cores_available: String,
    #[serde(rename = "cpu-cores-utilized", default)]
    pub cpu_cores_utilized: String,
    #[serde(rename = "memory-available", default)]
    pub memory_available: String,
    #[serde(rename = "cpu-model-name", default)]
    pub cpu_model_name: String,
    #[serde(rename = "cpu-tdp", default)]
    pub cpu_tdp: String,
}

/// One row of the GSF region table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ZiRegionRow {
    #[serde(rename = "cloud-provider")]
    pub cloud_provider: String,
    #[serde(rename = "cloud-region")]
    pub cloud_region: String,
    #[serde(rename = "cfe-region", default)]
    pub cfe_region: String,
    #[serde(rename = "em-zone-id", default)]
    pub em_zone_id: String,
    #[serde(rename = "wt-region-id", default)]
    pub wt_region_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub geolocation: String,
}

/// Leading integer of `text`, ignoring surrounding whitespace.
fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

fn int_value(text: &str) -> Value {
    parse_int(text).map(Value::from).unwrap_or(Value::Null)
}

fn float_value(text: &str) -> Value {
    parse_float(text).map(number_value).unwrap_or(Value::Null)
}

impl ZiInstanceRow {
    pub fn vcpus_allocated(&self) -> Value {
        int_value(&self.cpu_cores_utilized)
    }

    pub fn vcpus_total(&self) -> Value {
        int_value(&self.cpu_cores_available)
    }

    pub fn memory_available(&self) -> Value {
        int_value(&self.memory_available)
    }

    pub fn thermal_design_power(&self) -> Value {
        float_value(&self.cpu_tdp)
    }
}

/// `Standard_M128-64ms` becomes `Standard_M128ms`; other names are unchanged.
pub fn normalize_azure_instance_type(instance_type: &str) -> String {
    let mut parts = instance_type.split('-');
    match (parts.next(), parts.next()) {
        (Some(family), Some(size)) => {
            let suffix = size.trim_start_matches(|c: char| c.is_ascii_digit());
            format!("{family}{suffix}")
        }
        _ => instance_type.to_string(),
    }
}

/// Parses a headered CSV table into rows.
pub fn parse_table<T: DeserializeOwned>(text: &str) -> std::result::Result<Vec<T>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes())
        .into_deserialize()
        .collect()
}

async fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let read_error = |err: &dyn std::fmt::Display| {
        ZiError::read_file(format!("Error reading file {}: {}", path.display(), err))
    };
    let text = tokio::fs::read_to_string(path).await.map_err(|err| read_error(&err))?;
    let rows = parse_table(&text).map_err(|err| read_error(&err))?;
    log::info!("loaded {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Paths of the reference tables.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ZiCloudTablesConfig {
    #[serde(rename = "aws-instances", default)]
    pub aws_instances: Option<PathBuf>,
    #[serde(rename = "azure-instances", default)]
    pub azure_instances: Option<PathBuf>,
    #[serde(rename = "gsf-data", default)]
    pub gsf_data: Option<PathBuf>,
}

/// Instance and region reference data, read-only once loaded.
#[derive(Clone, Debug, Default)]
pub struct ZiCloudTables {
    pub aws: Vec<ZiInstanceRow>,
    pub azure: Vec<ZiInstanceRow>,
    pub regions: Vec<ZiRegionRow>,
}

impl ZiCloudTables {
    /// Loads every configured table; a missing path leaves that table empty.
    pub async fn load(config: &ZiCloudTablesConfig) -> Result<Self> {
        let mut tables = Self::default();
        if let Some(path) = &config.aws_instances {
            tables.aws = load_rows(path).await?;
        }
        if let Some(path) = &config.azure_instances {
            tables.azure = load_rows(path).await?;
        }
        if let Some(path) = &config.gsf_data {
            tables.regions = load_rows(path).await?;
        }
        Ok(tables)
    }

    /// Finds an instance row, normalizing Azure constrained sizes first.
    ///
    /// Returns the row and the instance type actually looked up.
    pub fn instance(&self, vendor: ZiCloudVendor, instance_type: &str) -> (Option<&ZiInstanceRow>, String) {
        let (rows, lookup) = match vendor {
            ZiCloudVendor::Aws => (&self.aws, instance_type.to_string()),
            ZiCloudVendor::Azure => (&self.azure, normalize_azure_instance_type(instance_type)),
        };
        let row = rows.iter().find(|row| row.instance_class == lookup);
        (row, lookup)
    }

    /// Finds a region by its cloud region or CFE region name.
    pub fn region(&self, vendor: ZiCloudVendor, region: &str) -> Option<&ZiRegionRow> {
        self.regions.iter().find(|row| {
            row.cloud_provider == vendor.provider_name()
                && (row.cloud_region == region || row.cfe_region == region)
        })
    }
}

fn vendor_field(name: &str) -> ZiField {
    ZiField::required(name, ZiFieldType::enumeration(SUPPORTED_VENDORS))
        .required_message(format!("Only {} is currently supported", SUPPORTED_VENDORS.join(",")))
}

fn vendor_of(fields: &ZiFields, key: &str) -> Option<ZiCloudVendor> {
    fields.get(key).and_then(Value::as_str).and_then(ZiCloudVendor::parse)
}

/// Instance metadata keyed by `cloud-vendor` and `cloud-instance-type`.
#[derive(Debug, Default)]
pub struct ZiCloudInstanceMetadata {
    tables: Option<ZiCloudTables>,
}

impl ZiCloudInstanceMetadata {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("CloudInstanceMetadata");

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: ZiCloudTables) -> Self {
        Self { tables: Some(tables) }
    }

    fn record_schema() -> ZiSchema {
        ZiSchema::new()
            .field(vendor_field("cloud-vendor"))
            .field(ZiField::required("cloud-instance-type", ZiFieldType::string()))
    }
}

#[async_trait]
impl ZiPlugin for ZiCloudInstanceMetadata {
    fn name(&self) -> &'static str {
        "CloudInstanceMetadata"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&Self::ERRORS, config)?;
        let config: ZiCloudTablesConfig = from_fields(&Self::ERRORS, fields.clone())?;
        self.tables = Some(ZiCloudTables::load(&config).await?);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let tables = self.tables.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let safe = schema.validate(record.fields())?;
            let Some(vendor) = vendor_of(&safe, "cloud-vendor") else {
                return Err(Self::ERRORS.input_validation("Only aws,azure is currently supported"));
            };
            let instance_type = safe.get("cloud-instance-type").and_then(Value::as_str).unwrap_or_default();

            let (row, lookup) = tables.instance(vendor, instance_type);
            let row = row.ok_or_else(|| {
                ZiError::unsupported_value(Self::ERRORS.scoped(
                    "cloud-instance-type",
                    format!("'{}' is not supported in '{}'", lookup, vendor.as_str()),
                ))
            })?;

            record.insert("vcpus-allocated", row.vcpus_allocated());
            record.insert("vcpus-total", row.vcpus_total());
            record.insert("memory-available", row.memory_available());
            record.insert("physical-processor", Value::String(row.cpu_model_name.clone()));
            record.insert("thermal-design-power", row.thermal_design_power());
            Ok(record)
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct ZiCloudMetadataConfig {
    #[serde(flatten)]
    tables: ZiCloudTablesConfig,
    #[serde(default)]
    fields: Vec<String>,
}

/// Instance and region metadata keyed by the `cloud/...` fields.
#[derive(Debug, Default)]
pub struct ZiCloudMetadata {
    tables: Option<ZiCloudTables>,
    fields: Vec<String>,
}

impl ZiCloudMetadata {
    const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("CloudMetadata");

    pub fn new() -> Self {
        Self::default()
    }

    /// A plugin backed by loaded tables, adding only `fields` when non-empty.
    pub fn with_tables(tables: ZiCloudTables, fields: Vec<String>) -> Self {
        Self {
            tables: Some(tables),
            fields,
        }
    }

    fn config_schema() -> ZiSchema {
        ZiSchema::new().field(ZiField::optional("fields", ZiFieldType::array(ZiFieldType::string())))
    }

    fn record_schema() -> ZiSchema {
        ZiSchema::new()
            .field(vendor_field("cloud/vendor"))
            .field(ZiField::required("cloud/instance-type", ZiFieldType::string()))
            .field(ZiField::optional("cloud/region", ZiFieldType::string()))
    }

    fn instance_fields(tables: &ZiCloudTables, vendor: ZiCloudVendor, instance_type: &str) -> Result<ZiFields> {
        let (row, _) = tables.instance(vendor, instance_type);
        let row = row.ok_or_else(|| {
            ZiError::unsupported_value(Self::ERRORS.scoped(
                "cloud/instance-type",
                format!(
                    "'{}' instance type is not supported in '{}' cloud vendor",
                    instance_type,
                    vendor.as_str()
                ),
            ))
        })?;

        let mut fields = ZiFields::new();
        fields.insert("vcpus-allocated".into(), row.vcpus_allocated());
        fields.insert("vcpus-total".into(), row.vcpus_total());
        fields.insert("memory-available".into(), row.memory_available());
        fields.insert("physical-processor".into(), Value::String(row.cpu_model_name.clone()));
        fields.insert("cpu/thermal-design-power".into(), row.thermal_design_power());
        Ok(fields)
    }

    fn region_fields(tables: &ZiCloudTables, vendor: ZiCloudVendor, region: &str) -> Result<ZiFields> {
        let row = tables.region(vendor, region).ok_or_else(|| {
            ZiError::unsupported_value(Self::ERRORS.message(format!(
                "'{}' region is not supported in '{}' cloud vendor",
                region,
                vendor.as_str()
            )))
        })?;

        let mut fields = ZiFields::new();
        fields.insert("cloud/region-cfe".into(), Value::String(row.cfe_region.clone()));
        fields.insert("cloud/region-em-zone-id".into(), Value::String(row.em_zone_id.clone()));
        fields.insert("cloud/region-wt-id".into(), Value::String(row.wt_region_id.clone()));
        fields.insert("cloud/region-location".into(), Value::String(row.location.clone()));
        fields.insert(
            "cloud/region-geolocation".into(),
            Value::String(row.geolocation.trim().to_string()),
        );
        Ok(fields)
    }
}

#[async_trait]
impl ZiPlugin for ZiCloudMetadata {
    fn name(&self) -> &'static str {
        "CloudMetadata"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&Self::ERRORS, config)?;
        let validated = Self::config_schema().validate(fields)?;
        let config: ZiCloudMetadataConfig = from_fields(&Self::ERRORS, validated)?;
        self.tables = Some(ZiCloudTables::load(&config.tables).await?);
        self.fields = config.fields;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let tables = self.tables.as_ref().ok_or_else(|| Self::ERRORS.missing_config())?;
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let safe = schema.validate(record.fields())?;
            let Some(vendor) = vendor_of(&safe, "cloud/vendor") else {
                return Err(Self::ERRORS.input_validation("Only aws,azure is currently supported"));
            };

            let mut added = ZiFields::new();
            let instance_type = safe.get("cloud/instance-type").and_then(Value::as_str).unwrap_or_default();
            if !instance_type.is_empty() {
                added.extend(Self::instance_fields(tables, vendor, instance_type)?);
            }
            let region = safe.get("cloud/region").and_then(Value::as_str).unwrap_or_default();
            if !region.is_empty() {
                added.extend(Self::region_fields(tables, vendor, region)?);
            }

            if !self.fields.is_empty() {
                added.retain(|key, _| self.fields.contains(key));
            }
            record.extend(added);
            Ok(record)
        })
    }
}
