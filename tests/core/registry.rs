//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zimpact.
//! The Zimpact project belongs to the Dunimd project team.
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

use serde_json::json;
use zimpact::plugin::execute_plugin;
use zimpact::plugins::arithmetic::ZiSum;
use zimpact::{ZiPlugin, ZiPluginRegistry, ZiRecord};

const BUNDLED: [&str; 21] = [
    "Aggregate",
    "CloudInstanceMetadata",
    "CloudMetadata",
    "Coefficient",
    "CsvExport",
    "Divide",
    "EMem",
    "ENet",
    "Exponent",
    "GrafanaExport",
    "MockObservations",
    "Multiply",
    "Regex",
    "Sci",
    "SciE",
    "SciM",
    "SciO",
    "ShellExec",
    "Subtract",
    "Sum",
    "TdpFinder",
];

#[test]
fn ZiFTRegistryDefaultsListEveryBundledPlugin() {
    let registry = ZiPluginRegistry::with_defaults();

    assert_eq!(registry.names(), BUNDLED.to_vec());
}

#[test]
fn ZiFTRegistryConstructorsReportTheirNames() {
    let registry = ZiPluginRegistry::with_defaults();

    for name in BUNDLED {
        let plugin = (registry.get(name).unwrap())();
        assert_eq!(plugin.name(), name);
    }
}

#[test]
fn ZiFTRegistryUnknownNameIsUnsupported() {
    let registry = ZiPluginRegistry::with_defaults();
    let err = registry.get("Teads").unwrap_err();

    assert_eq!(err.kind(), "UnsupportedValueError");
    assert_eq!(err.message(), "Plugin `Teads` is not registered.");
}

#[test]
fn ZiFTRegistryCustomRegistrationReplacesEntry() {
    let mut registry = ZiPluginRegistry::new();
    assert!(!registry.contains("Total"));

    registry.register("Total", || Box::new(ZiSum::new()));
    assert!(registry.contains("Total"));
    assert_eq!(registry.names(), vec!["Total"]);
}

#[tokio::test]
async fn ZiFTRegistryInstantiateConfiguresPlugin() {
    let registry = ZiPluginRegistry::with_defaults();
    let config = json!({"input-parameters": ["a", "b"], "output-parameter": "c"});
    let plugin = registry.instantiate("Sum", Some(&config)).await.unwrap();

    let record = ZiRecord::observation("2023-07-06T00:00", 1.0)
        .with_field("a", json!(1))
        .with_field("b", json!(2));
    let outputs = execute_plugin(plugin.as_ref(), vec![record]).await.unwrap();

    assert_eq!(outputs[0].get("c"), Some(&json!(3)));
}

#[tokio::test]
async fn ZiFTRegistryInstantiatePropagatesConfigErrors() {
    let registry = ZiPluginRegistry::with_defaults();
    let err = registry.instantiate("Divide", None).await.unwrap_err();

    assert_eq!(err.message(), "Divide: Configuration data is missing.");
}
