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

//! # Zimpact Plugin Module
//!
//! This module defines the contract every calculation plugin implements.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──configure──▶ Configured ──execute──▶ Executing (repeatable)
//! ```
//!
//! Construction is cheap and performs no I/O. `configure` validates and
//! stores the plugin-level ("global") configuration and loads any reference
//! data before it returns. `execute` takes a batch of records and returns
//! one output record per input record, in input order. The first record that
//! fails validation aborts the whole batch.
//!
//! `execute` borrows the plugin immutably, so state stored by `configure`
//! is read-only while batches run and concurrent calls cannot interfere.
//!
//! ## Implementing a Plugin
//!
//! ```rust
//! use async_trait::async_trait;
//! use zimpact::errors::Result;
//! use zimpact::plugin::ZiPlugin;
//! use zimpact::record::ZiRecordBatch;
//!
//! #[derive(Debug)]
//! struct Passthrough;
//!
//! #[async_trait]
//! impl ZiPlugin for Passthrough {
//!     fn name(&self) -> &'static str {
//!         "Passthrough"
//!     }
//!
//!     async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
//!         Ok(inputs)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;
use crate::record::{ZiRecord, ZiRecordBatch};

/// Contract that every Zimpact plugin fulfills.
#[async_trait]
pub trait ZiPlugin: Send + Sync + std::fmt::Debug {
    /// Name used in error messages and registry lookup.
    fn name(&self) -> &'static str;

    /// Validates and stores plugin-level configuration.
    ///
    /// Stateless plugins keep the default, which accepts anything.
    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let _ = config;
        Ok(())
    }

    /// Transforms a batch, one output per input, order preserved.
    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch>;
}

/// Runs a plugin over a batch with debug logging around the call.
pub async fn execute_plugin(plugin: &dyn ZiPlugin, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
    let size = inputs.len();
    log::debug!("executing plugin {} on {} record(s)", plugin.name(), size);
    let outputs = plugin.execute(inputs).await?;
    log::debug!("plugin {} produced {} record(s)", plugin.name(), outputs.len());
    Ok(outputs)
}

/// Applies `compute` to every record in order, stopping at the first error.
///
/// `compute` receives the record index and the record, and returns the
/// enriched record.
pub(crate) fn map_records<F>(inputs: ZiRecordBatch, mut compute: F) -> Result<ZiRecordBatch>
where
    F: FnMut(usize, ZiRecord) -> Result<ZiRecord>,
{
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, record)| compute(index, record))
        .collect()
}
