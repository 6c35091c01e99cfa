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

//! # Energy and Carbon Component Plugins
//!
//! | Plugin | Formula |
//! |--------|---------|
//! | ENet   | `energy-network = (data-in + data-out) * network-energy-coefficient` |
//! | EMem   | `energy-memory = total-memoryGB * (mem-util / 100) * memory-energy-coefficient` |
//! | SciE   | `energy = energy-cpu + energy-memory + energy-network` |
//! | SciO   | `operational-carbon = grid-carbon-intensity * energy` |
//! | SciM   | `embodied-carbon = total-embodied-emissions * (duration / expected-lifespan) * (reserved / total)` |
//!
//! Every plugin reads a merged view of the record over the optional global
//! configuration, so a field may be supplied once in `configure` and
//! overridden per record.
//!
//! ## Coefficient Defaults
//!
//! The network coefficient defaults to `0.001` kWh/GB and the memory
//! coefficient to `0.38` W/GB. For these two coefficients, and only these,
//! a numeric zero counts as "not provided". The resolved coefficient is
//! written back to the output record.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::merge_layers;
use crate::errors::{Result, ZiErrorBuilder};
use crate::plugin::{map_records, ZiPlugin};
use crate::record::{ZiFields, ZiRecordBatch};
use crate::schema::{select_union, ZiField, ZiFieldType, ZiRefinement, ZiSchema};

pub const DEFAULT_NETWORK_ENERGY_COEFFICIENT: f64 = 0.001;
pub const DEFAULT_MEMORY_ENERGY_COEFFICIENT: f64 = 0.38;

/// Accepts an absent configuration or an object; anything else is rejected.
fn global_fields(errors: &ZiErrorBuilder, config: Option<&Value>) -> Result<Option<ZiFields>> {
    match config {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(fields)) => Ok(Some(fields.clone())),
        Some(_) => Err(errors.input_validation("Configuration data must be an object")),
    }
}

fn number_of(fields: &ZiFields, name: &str) -> f64 {
    fields.get(name).and_then(Value::as_f64).unwrap_or(0.0)
}

macro_rules! global_config_plugin {
    ($plugin:ident, $name:literal) => {
        impl $plugin {
            const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new($name);

            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

/// Network energy from transferred data.
#[derive(Debug, Default)]
pub struct ZiENet {
    global: Option<ZiFields>,
}

global_config_plugin!(ZiENet, "ENet");

impl ZiENet {
    fn record_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("data-in", ZiFieldType::number().min(0.0)))
            .field(ZiField::required("data-out", ZiFieldType::number().min(0.0)))
            .field(
                ZiField::optional("network-energy-coefficient", ZiFieldType::number().min(0.0))
                    .with_default(json!(DEFAULT_NETWORK_ENERGY_COEFFICIENT))
                    .default_when_zero(),
            )
    }
}

#[async_trait]
impl ZiPlugin for ZiENet {
    fn name(&self) -> &'static str {
        "ENet"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = global_fields(&Self::ERRORS, config)?;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let merged = merge_layers(&record, self.global.as_ref(), &["network-energy-coefficient"]);
            let safe = schema.validate(&merged)?;
            let coefficient = number_of(&safe, "network-energy-coefficient");
            let energy = (number_of(&safe, "data-in") + number_of(&safe, "data-out")) * coefficient;
            record.insert_number("network-energy-coefficient", coefficient);
            record.insert_number("energy-network", energy);
            Ok(record)
        })
    }
}

/// Memory energy from utilization.
#[derive(Debug, Default)]
pub struct ZiEMem {
    global: Option<ZiFields>,
}

global_config_plugin!(ZiEMem, "EMem");

impl ZiEMem {
    fn record_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required("total-memoryGB", ZiFieldType::number().gt(0.0)))
            .field(ZiField::required("mem-util", ZiFieldType::number().min(0.0).max(100.0)))
            .field(
                ZiField::optional("memory-energy-coefficient", ZiFieldType::number().min(0.0))
                    .with_default(json!(DEFAULT_MEMORY_ENERGY_COEFFICIENT))
                    .default_when_zero(),
            )
    }
}

#[async_trait]
impl ZiPlugin for ZiEMem {
    fn name(&self) -> &'static str {
        "EMem"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = global_fields(&Self::ERRORS, config)?;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let merged = merge_layers(&record, self.global.as_ref(), &["memory-energy-coefficient"]);
            let safe = schema.validate(&merged)?;
            let coefficient = number_of(&safe, "memory-energy-coefficient");
            let energy =
                number_of(&safe, "total-memoryGB") * (number_of(&safe, "mem-util") / 100.0) * coefficient;
            record.insert_number("memory-energy-coefficient", coefficient);
            record.insert_number("energy-memory", energy);
            Ok(record)
        })
    }
}

const ENERGY_COMPONENTS: [&str; 3] = ["energy-cpu", "energy-memory", "energy-network"];

/// Total energy from whichever components are present.
#[derive(Debug, Default)]
pub struct ZiSciE {
    global: Option<ZiFields>,
}

global_config_plugin!(ZiSciE, "SciE");

impl ZiSciE {
    fn record_schema() -> ZiSchema {
        ENERGY_COMPONENTS
            .iter()
            .fold(ZiSchema::new(), |schema, name| {
                schema.field(ZiField::optional(*name, ZiFieldType::number().min(0.0)))
            })
            .refine(ZiRefinement::at_least_one_defined(
                &ENERGY_COMPONENTS,
                "At least one of energy-cpu,energy-memory,energy-network should present.",
            ))
    }
}

#[async_trait]
impl ZiPlugin for ZiSciE {
    fn name(&self) -> &'static str {
        "SciE"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = global_fields(&Self::ERRORS, config)?;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let merged = merge_layers(&record, self.global.as_ref(), &[]);
            let safe = schema.validate(&merged)?;
            let energy: f64 = ENERGY_COMPONENTS.iter().map(|name| number_of(&safe, name)).sum();
            record.insert_number("energy", energy);
            Ok(record)
        })
    }
}

/// Operational carbon from energy and grid intensity.
#[derive(Debug, Default)]
pub struct ZiSciO {
    global: Option<ZiFields>,
}

global_config_plugin!(ZiSciO, "SciO");

impl ZiSciO {
    fn record_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::optional("grid-carbon-intensity", ZiFieldType::number().coerce()))
            .field(ZiField::optional("energy", ZiFieldType::number().coerce()))
            .refine(ZiRefinement::all_defined(
                &["grid-carbon-intensity", "energy"],
                "Both grid-carbon-intensity and energy should be present.",
            ))
    }
}

#[async_trait]
impl ZiPlugin for ZiSciO {
    fn name(&self) -> &'static str {
        "SciO"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = global_fields(&Self::ERRORS, config)?;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let schema = Self::record_schema();
        map_records(inputs, |_, mut record| {
            let merged = merge_layers(&record, self.global.as_ref(), &[]);
            let safe = schema.validate(&merged)?;
            let carbon = number_of(&safe, "grid-carbon-intensity") * number_of(&safe, "energy");
            record.insert_number("operational-carbon", carbon);
            Ok(record)
        })
    }
}

/// Embodied carbon amortized over reservation time and resource share.
///
/// The ratio pair is `vcpus-allocated / vcpus-total` when both validate,
/// otherwise `resources-reserved / total-resources`. The reservation time is
/// the record's `duration`.
#[derive(Debug, Default)]
pub struct ZiSciM {
    global: Option<ZiFields>,
}

global_config_plugin!(ZiSciM, "SciM");

impl ZiSciM {
    pub const RATIO_PAIRS: [(&'static str, &'static str); 2] = [
        ("vcpus-allocated", "vcpus-total"),
        ("resources-reserved", "total-resources"),
    ];

    fn common_schema() -> ZiSchema {
        ZiSchema::new()
            .field(ZiField::required(
                "total-embodied-emissions",
                ZiFieldType::number().coerce().min(0.0),
            ))
            .field(ZiField::required("expected-lifespan", ZiFieldType::number().coerce().gt(0.0)))
            .field(ZiField::required("duration", ZiFieldType::number().coerce().min(0.0)))
    }

    fn record_schemas() -> Vec<ZiSchema> {
        Self::RATIO_PAIRS
            .iter()
            .map(|(reserved, total)| {
                Self::common_schema()
                    .field(ZiField::required(*reserved, ZiFieldType::number().coerce().min(0.0)))
                    .field(ZiField::required(*total, ZiFieldType::number().coerce().gt(0.0)))
            })
            .collect()
    }
}

#[async_trait]
impl ZiPlugin for ZiSciM {
    fn name(&self) -> &'static str {
        "SciM"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        self.global = global_fields(&Self::ERRORS, config)?;
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let schemas = Self::record_schemas();
        map_records(inputs, |_, mut record| {
            let merged = merge_layers(&record, self.global.as_ref(), &[]);
            let (pair, safe) = select_union(&schemas, &merged)?;
            let (reserved, total) = Self::RATIO_PAIRS[pair];
            let embodied = number_of(&safe, "total-embodied-emissions")
                * (number_of(&safe, "duration") / number_of(&safe, "expected-lifespan"))
                * (number_of(&safe, reserved) / number_of(&safe, total));
            record.insert_number("embodied-carbon", embodied);
            Ok(record)
        })
    }
}
