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

//! # Plugin Registry Module
//!
//! Maps plugin names to constructors so a host can build plugins from
//! configuration at runtime.
//!
//! ## Registry Operations
//!
//! - Register constructors under unique names
//! - Query the available names
//! - Construct and configure a plugin in one call

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::{Result, ZiError};
use crate::plugin::ZiPlugin;
use crate::plugins::aggregate::ZiAggregate;
use crate::plugins::arithmetic::{ZiCoefficient, ZiDivide, ZiExponent, ZiMultiply, ZiSubtract, ZiSum};
use crate::plugins::cloud::{ZiCloudInstanceMetadata, ZiCloudMetadata};
use crate::plugins::energy::{ZiEMem, ZiENet, ZiSciE, ZiSciM, ZiSciO};
use crate::plugins::export::ZiCsvExport;
use crate::plugins::mock::ZiMockObservations;
use crate::plugins::regex::ZiRegex;
use crate::plugins::sci::ZiSci;
use crate::plugins::shell::ZiShellExec;
use crate::plugins::tdp::ZiTdpFinder;

/// Builds an unconfigured plugin.
pub type ZiPluginConstructor = fn() -> Box<dyn ZiPlugin>;

/// Registry mapping plugin names to their constructors.
#[derive(Debug, Default)]
pub struct ZiPluginRegistry {
    inner: HashMap<String, ZiPluginConstructor>,
}

impl ZiPluginRegistry {
    #[allow(non_snake_case)]
    pub fn new() -> Self {
        ZiPluginRegistry {
            inner: HashMap::new(),
        }
    }

    /// A registry holding every bundled plugin.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("Sum", || Box::new(ZiSum::new()));
        registry.register("Multiply", || Box::new(ZiMultiply::new()));
        registry.register("Subtract", || Box::new(ZiSubtract::new()));
        registry.register("Divide", || Box::new(ZiDivide::new()));
        registry.register("Coefficient", || Box::new(ZiCoefficient::new()));
        registry.register("Exponent", || Box::new(ZiExponent::new()));
        registry.register("Regex", || Box::new(ZiRegex::new()));
        registry.register("Aggregate", || Box::new(ZiAggregate::new()));
        registry.register("ENet", || Box::new(ZiENet::new()));
        registry.register("EMem", || Box::new(ZiEMem::new()));
        registry.register("SciE", || Box::new(ZiSciE::new()));
        registry.register("SciO", || Box::new(ZiSciO::new()));
        registry.register("SciM", || Box::new(ZiSciM::new()));
        registry.register("Sci", || Box::new(ZiSci::new()));
        registry.register("TdpFinder", || Box::new(ZiTdpFinder::new()));
        registry.register("CloudInstanceMetadata", || Box::new(ZiCloudInstanceMetadata::new()));
        registry.register("CloudMetadata", || Box::new(ZiCloudMetadata::new()));
        registry.register("MockObservations", || Box::new(ZiMockObservations::new()));
        registry.register("CsvExport", || Box::new(ZiCsvExport::new()));
        registry.register("GrafanaExport", || Box::new(ZiCsvExport::grafana()));
        registry.register("ShellExec", || Box::new(ZiShellExec::new()));
        registry
    }

    /// Registers `constructor` under `name`, replacing any earlier entry.
    #[allow(non_snake_case)]
    pub fn register(&mut self, name: &str, constructor: ZiPluginConstructor) {
        self.inner.insert(name.to_string(), constructor);
    }

    pub fn get(&self, name: &str) -> Result<ZiPluginConstructor> {
        self.inner
            .get(name)
            .copied()
            .ok_or_else(|| ZiError::unsupported_value(format!("Plugin `{}` is not registered.", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Constructs the plugin registered as `name` and configures it.
    pub async fn instantiate(&self, name: &str, config: Option<&Value>) -> Result<Box<dyn ZiPlugin>> {
        let constructor = self.get(name)?;
        let mut plugin = constructor();
        plugin.configure(config).await?;
        log::debug!("instantiated plugin {}", name);
        Ok(plugin)
    }
}
