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

use serde_json::{json, Value};
use zimpact::plugins::energy::{
    ZiEMem, ZiENet, ZiSciE, ZiSciM, ZiSciO, DEFAULT_MEMORY_ENERGY_COEFFICIENT,
    DEFAULT_NETWORK_ENERGY_COEFFICIENT,
};
use zimpact::{ZiPlugin, ZiRecord};

fn ZiTRecord(fields: Value) -> ZiRecord {
    let mut record = ZiRecord::observation("2023-08-06T00:00", 3600.0);
    record.extend(fields.as_object().cloned().expect("object literal"));
    record
}

fn ZiTAssertClose(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("numeric output");
    assert!(
        (actual - expected).abs() <= 1e-12 * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn ZiFTENetUsesDefaultCoefficient() {
    let outputs = ZiENet::new()
        .execute(vec![ZiTRecord(json!({"data-in": 3, "data-out": 4}))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("network-energy-coefficient"), 0.001);
    ZiTAssertClose(outputs[0].number("energy-network"), 0.007);
    assert_eq!(DEFAULT_NETWORK_ENERGY_COEFFICIENT, 0.001);
}

#[tokio::test]
async fn ZiFTENetZeroCoefficientFallsBackToDefault() {
    let outputs = ZiENet::new()
        .execute(vec![ZiTRecord(
            json!({"data-in": 1, "data-out": 1, "network-energy-coefficient": 0}),
        )])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("network-energy-coefficient"), 0.001);
    ZiTAssertClose(outputs[0].number("energy-network"), 0.002);
}

#[tokio::test]
async fn ZiFTENetGlobalConfigSuppliesFields() {
    let mut enet = ZiENet::new();
    enet.configure(Some(&json!({"network-energy-coefficient": 0.5, "data-out": 1})))
        .await
        .unwrap();
    let outputs = enet
        .execute(vec![ZiTRecord(json!({"data-in": 3}))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("energy-network"), 2.0);
    assert!(!outputs[0].contains("data-out"));
}

#[tokio::test]
async fn ZiFTENetRejectsNegativeData() {
    let err = ZiENet::new()
        .execute(vec![ZiTRecord(json!({"data-in": -1, "data-out": 4}))])
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "\"data-in\" parameter is number must be greater than or equal to 0. Error code: too_small."
    );
}

#[tokio::test]
async fn ZiFTEMemComputesMemoryEnergy() {
    let outputs = ZiEMem::new()
        .execute(vec![ZiTRecord(json!({"total-memoryGB": 16, "mem-util": 50}))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("memory-energy-coefficient"), DEFAULT_MEMORY_ENERGY_COEFFICIENT);
    ZiTAssertClose(outputs[0].number("energy-memory"), 16.0 * 0.5 * 0.38);
}

#[tokio::test]
async fn ZiFTEMemRejectsUtilizationAboveHundred() {
    let err = ZiEMem::new()
        .execute(vec![ZiTRecord(json!({"total-memoryGB": 16, "mem-util": 150}))])
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "\"mem-util\" parameter is number must be less than or equal to 100. Error code: too_big."
    );
}

#[tokio::test]
async fn ZiFTSciESumsPresentComponents() {
    let outputs = ZiSciE::new()
        .execute(vec![
            ZiTRecord(json!({"energy-cpu": 1, "energy-memory": 2, "energy-network": 3})),
            ZiTRecord(json!({"energy-memory": 0.5})),
        ])
        .await
        .unwrap();

    assert_eq!(outputs[0].get("energy"), Some(&json!(6)));
    ZiTAssertClose(outputs[1].number("energy"), 0.5);
}

#[tokio::test]
async fn ZiFTSciERequiresOneComponent() {
    let err = ZiSciE::new()
        .execute(vec![ZiTRecord(json!({}))])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "InputValidationError");
    assert_eq!(
        err.message(),
        "At least one of energy-cpu,energy-memory,energy-network should present."
    );
}

#[tokio::test]
async fn ZiFTSciOMultipliesIntensityAndEnergy() {
    let outputs = ZiSciO::new()
        .execute(vec![ZiTRecord(json!({"grid-carbon-intensity": 200, "energy": "0.5"}))])
        .await
        .unwrap();

    assert_eq!(outputs[0].get("operational-carbon"), Some(&json!(100)));
}

#[tokio::test]
async fn ZiFTSciORequiresBothInputs() {
    let err = ZiSciO::new()
        .execute(vec![ZiTRecord(json!({"energy": 1}))])
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Both grid-carbon-intensity and energy should be present.");
}

fn ZiTEmbodied(extra: Value) -> ZiRecord {
    let mut record = ZiTRecord(json!({
        "total-embodied-emissions": 200,
        "expected-lifespan": 126144000,
    }));
    record.insert("duration", json!(2592000));
    record.extend(extra.as_object().cloned().expect("object literal"));
    record
}

#[tokio::test]
async fn ZiFTSciMAmortizesOverResources() {
    let outputs = ZiSciM::new()
        .execute(vec![ZiTEmbodied(json!({"resources-reserved": 1, "total-resources": 1}))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("embodied-carbon"), 4.10958904109589);
}

#[tokio::test]
async fn ZiFTSciMAmortizesOverVcpus() {
    let outputs = ZiSciM::new()
        .execute(vec![ZiTEmbodied(json!({"vcpus-allocated": 1, "vcpus-total": 64}))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("embodied-carbon"), 0.06421232876712328);
}

#[tokio::test]
async fn ZiFTSciMPrefersVcpusWhenBothPairsValidate() {
    let outputs = ZiSciM::new()
        .execute(vec![ZiTEmbodied(json!({
            "vcpus-allocated": 1,
            "vcpus-total": 64,
            "resources-reserved": 1,
            "total-resources": 1
        }))])
        .await
        .unwrap();

    ZiTAssertClose(outputs[0].number("embodied-carbon"), 0.06421232876712328);
}

#[tokio::test]
async fn ZiFTSciMWithoutRatioPairReportsFirstAlternative() {
    let err = ZiSciM::new()
        .execute(vec![ZiTEmbodied(json!({}))])
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "\"vcpus-allocated\" parameter is required. Error code: invalid_union."
    );
}

#[tokio::test]
async fn ZiFTSciMGlobalConfigSuppliesEmissions() {
    let mut scim = ZiSciM::new();
    scim.configure(Some(&json!({
        "total-embodied-emissions": 200,
        "expected-lifespan": 126144000,
        "resources-reserved": 1,
        "total-resources": 1
    })))
    .await
    .unwrap();

    let mut record = ZiRecord::observation("2023-08-06T00:00", 2592000.0);
    record.insert("total-embodied-emissions", json!("200"));
    let outputs = scim.execute(vec![record]).await.unwrap();

    ZiTAssertClose(outputs[0].number("embodied-carbon"), 4.10958904109589);
}
