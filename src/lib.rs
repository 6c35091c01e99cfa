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

//! # Zimpact Core Library
//!
//! This is the main library entry point for Zimpact, a set of composable
//! plugins that compute the energy use and carbon emissions of software
//! from time-series observations.
//!
//! ## Module Overview
//!
//! - **errors**: the five error kinds and the plugin message formatter
//! - **record**: ZiRecord, the ordered field map every plugin reads and enriches
//! - **config**: layering of record values over global configuration
//! - **schema**: declarative field validation with formatted issue messages
//! - **plugin**: the async ZiPlugin contract
//! - **plugins**: the bundled arithmetic, energy, carbon, metadata and IO plugins
//! - **registry**: name to constructor lookup for the bundled plugins
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use zimpact::{ZiPluginRegistry, ZiRecord};
//!
//! # async fn run() -> zimpact::Result<()> {
//! let registry = ZiPluginRegistry::with_defaults();
//! let sum = registry
//!     .instantiate(
//!         "Sum",
//!         Some(&json!({"input-parameters": ["cpu/energy", "memory/energy"], "output-parameter": "energy"})),
//!     )
//!     .await?;
//!
//! let record = ZiRecord::observation("2023-07-06T00:00:00Z", 60.0)
//!     .with_field("cpu/energy", json!(2))
//!     .with_field("memory/energy", json!(3));
//! let outputs = sum.execute(vec![record]).await?;
//! assert_eq!(outputs[0].number("energy"), Some(5.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Records**: observations are ZiRecord maps with `timestamp` and `duration`
//! 2. **Plugins**: each plugin is configured once, then maps a batch to an enriched batch
//! 3. **Registry**: hosts build plugins by name and chain them in any order
//!
//! ## Error Handling
//!
//! All operations return `Result<T, ZiError>`. Messages follow the
//! `<Plugin>(<scope>): <message>.` convention.

#![allow(non_snake_case)]

pub mod config;
pub mod errors;
pub mod plugin;
pub mod plugins;
pub mod record;
pub mod registry;
pub mod schema;

pub use errors::{Result, ZiError, ZiErrorBuilder};
pub use plugin::{execute_plugin, ZiPlugin};
pub use record::{ZiFields, ZiRecord, ZiRecordBatch};
pub use registry::{ZiPluginConstructor, ZiPluginRegistry};
pub use schema::{ZiField, ZiFieldType, ZiIssue, ZiIssueCode, ZiRefinement, ZiSchema};
