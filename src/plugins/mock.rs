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

//! # Mock Observations Plugin
//!
//! Synthesizes observation records for every component over a range of
//! time buckets.
//!
//! ## Configuration
//!
//! ```json
//! {
//!   "timestamp-from": "2023-07-06T00:00",
//!   "timestamp-to": "2023-07-06T00:10",
//!   "duration": 60,
//!   "components": [{"instance-type": "A1"}, {"instance-type": "B1"}],
//!   "generators": {
//!     "common": {"region": "uk-west"},
//!     "randint": {"cpu/utilization": {"min": 1, "max": 99}}
//!   },
//!   "seed": 42
//! }
//! ```
//!
//! Buckets start at `timestamp-from` and advance by `duration` seconds while
//! they are not after `timestamp-to`. Timestamps without an offset are read
//! as UTC. Each record is `{timestamp, duration, ...component,
//! ...generated}` with the first input record laid over it. With `seed` the
//! output is reproducible.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use async_trait::async_trait;

use crate::config::config_object;
use crate::errors::{Result, ZiErrorBuilder};
use crate::plugin::ZiPlugin;
use crate::record::{number_value, ZiFields, ZiRecord, ZiRecordBatch};

const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("MockObservations");
const COMMON_ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("CommonGenerator");
const RANDINT_ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("RandIntGenerator");

/// Produces the next set of generated fields.
pub trait ZiGenerator: Send + std::fmt::Debug {
    fn next(&mut self) -> ZiFields;
}

/// Copies a fixed set of fields into every observation.
#[derive(Clone, Debug)]
pub struct ZiCommonGenerator {
    fields: ZiFields,
}

impl ZiCommonGenerator {
    pub fn new(config: &Value) -> Result<Self> {
        match config {
            Value::Object(fields) if !fields.is_empty() => Ok(Self {
                fields: fields.clone(),
            }),
            _ => Err(COMMON_ERRORS.input_validation("Config must not be null or empty")),
        }
    }
}

impl ZiGenerator for ZiCommonGenerator {
    fn next(&mut self) -> ZiFields {
        self.fields.clone()
    }
}

/// Fills one field with a truncated uniform integer in `[min, max)`.
#[derive(Debug)]
pub struct ZiRandIntGenerator {
    field: String,
    min: f64,
    max: f64,
    rng: StdRng,
}

impl ZiRandIntGenerator {
    pub fn new(field: &str, config: &Value, rng: StdRng) -> Result<Self> {
        if field.trim().is_empty() {
            return Err(RANDINT_ERRORS.input_validation("name is empty or all spaces"));
        }
        let config = match config {
            Value::Object(fields) if !fields.is_empty() => fields,
            _ => return Err(RANDINT_ERRORS.input_validation("Config must not be null or empty")),
        };
        let bound = |key: &str| -> Result<f64> {
            let value = config
                .get(key)
                .ok_or_else(|| RANDINT_ERRORS.input_validation(format!("config is missing {key}")))?;
            value
                .as_f64()
                .ok_or_else(|| RANDINT_ERRORS.input_validation(format!("{key} must be a number")))
        };
        Ok(Self {
            field: field.to_string(),
            min: bound("min")?,
            max: bound("max")?,
            rng,
        })
    }
}

impl ZiGenerator for ZiRandIntGenerator {
    fn next(&mut self) -> ZiFields {
        let sample: f64 = self.rng.gen();
        let value = (sample * (self.max - self.min) + self.min).trunc();
        let mut fields = ZiFields::new();
        fields.insert(self.field.clone(), number_value(value));
        fields
    }
}

/// Parses an RFC 3339 timestamp, or a naive one read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Bucket start times from `from` to `to` inclusive, `step` apart.
///
/// Stops early when the next bucket would leave the representable range.
pub fn time_buckets(from: DateTime<Utc>, to: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    let mut buckets = Vec::new();
    let mut current = Some(from);
    while let Some(bucket) = current.filter(|bucket| *bucket <= to) {
        buckets.push(bucket);
        current = bucket.checked_add_signed(step);
    }
    buckets
}

/// Converts a duration in seconds to a bucket step of whole milliseconds.
fn bucket_step(duration: f64) -> Result<Duration> {
    let millis = (duration * 1000.0).round();
    if millis < 1.0 {
        return Err(ERRORS.input_validation("duration must be at least one millisecond"));
    }
    if millis >= i64::MAX as f64 {
        return Err(ERRORS.input_validation("duration is out of range"));
    }
    Duration::try_milliseconds(millis as i64).ok_or_else(|| ERRORS.input_validation("duration is out of range"))
}

#[derive(Clone, Debug)]
struct ZiMockConfig {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    duration: f64,
    components: Vec<ZiFields>,
    generators: ZiFields,
    seed: Option<u64>,
}

/// Generates mock observation records.
#[derive(Debug, Default)]
pub struct ZiMockObservations {
    config: Option<ZiMockConfig>,
}

impl ZiMockObservations {
    pub fn new() -> Self {
        Self::default()
    }

    fn param<'a>(fields: &'a ZiFields, name: &str) -> Result<&'a Value> {
        fields
            .get(name)
            .ok_or_else(|| ERRORS.input_validation(format!("{name} missing from global config")))
    }

    fn timestamp(fields: &ZiFields, name: &str) -> Result<DateTime<Utc>> {
        let value = Self::param(fields, name)?;
        value
            .as_str()
            .and_then(parse_timestamp)
            .ok_or_else(|| ERRORS.input_validation(format!("{name} is not a valid timestamp")))
    }

    fn components(value: &Value) -> Result<Vec<ZiFields>> {
        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            Value::Object(entries) => entries.values().collect(),
            _ => return Err(ERRORS.input_validation("components must be an array or an object")),
        };
        items
            .into_iter()
            .map(|item| {
                item.as_object()
                    .cloned()
                    .ok_or_else(|| ERRORS.input_validation("each component must be an object"))
            })
            .collect()
    }

    /// Builds fresh generators, in configuration order.
    fn generators(config: &ZiMockConfig) -> Result<Vec<Box<dyn ZiGenerator>>> {
        let mut seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut generators: Vec<Box<dyn ZiGenerator>> = Vec::new();
        for (kind, value) in &config.generators {
            match kind.as_str() {
                "common" => generators.push(Box::new(ZiCommonGenerator::new(value)?)),
                "randint" => {
                    let fields = value
                        .as_object()
                        .ok_or_else(|| RANDINT_ERRORS.input_validation("Config must not be null or empty"))?;
                    for (field, bounds) in fields {
                        let rng = StdRng::seed_from_u64(seeds.gen());
                        generators.push(Box::new(ZiRandIntGenerator::new(field, bounds, rng)?));
                    }
                }
                other => log::debug!("MockObservations ignores unknown generator `{other}`"),
            }
        }
        Ok(generators)
    }
}

#[async_trait]
impl ZiPlugin for ZiMockObservations {
    fn name(&self) -> &'static str {
        "MockObservations"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let fields = config_object(&ERRORS, config)?;
        let from = Self::timestamp(fields, "timestamp-from")?;
        let to = Self::timestamp(fields, "timestamp-to")?;
        let duration = Self::param(fields, "duration")?
            .as_f64()
            .filter(|duration| *duration > 0.0)
            .ok_or_else(|| ERRORS.input_validation("duration must be a positive number"))?;
        let components = Self::components(Self::param(fields, "components")?)?;
        let generators = Self::param(fields, "generators")?
            .as_object()
            .cloned()
            .ok_or_else(|| ERRORS.input_validation("generators must be an object"))?;
        let seed = fields.get("seed").and_then(Value::as_u64);

        let config = ZiMockConfig {
            from,
            to,
            duration,
            components,
            generators,
            seed,
        };
        Self::generators(&config)?;
        self.config = Some(config);
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| ERRORS.missing_config())?;
        let step = bucket_step(config.duration)?;
        let buckets = time_buckets(config.from, config.to, step);
        let mut generators = Self::generators(config)?;
        let defaults = inputs.first().map(|record| record.fields().clone());

        let mut outputs = Vec::with_capacity(config.components.len() * buckets.len());
        for component in &config.components {
            for bucket in &buckets {
                let mut record = ZiRecord::observation(
                    bucket.to_rfc3339_opts(SecondsFormat::Millis, true),
                    config.duration,
                );
                record.extend(component.clone());
                for generator in generators.iter_mut() {
                    record.extend(generator.next());
                }
                if let Some(defaults) = &defaults {
                    record.extend(defaults.clone());
                }
                outputs.push(record);
            }
        }
        log::debug!("MockObservations generated {} record(s)", outputs.len());
        Ok(outputs)
    }
}
