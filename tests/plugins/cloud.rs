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

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;
use zimpact::plugins::cloud::{
    parse_table, ZiCloudInstanceMetadata, ZiCloudMetadata, ZiCloudTables, ZiCloudVendor, ZiInstanceRow,
    ZiRegionRow,
};
use zimpact::{ZiPlugin, ZiRecord};

const AWS_INSTANCES: &str = "\
instance-class,cpu-cores-available,cpu-cores-utilized,memory-available,cpu-model-name,cpu-tdp,gpu
m5n.large,96,2,8,Intel Xeon Platinum 8259CL,210,
t3.micro,2,2,1,Intel Xeon Platinum 8175M,240,
";

const AZURE_INSTANCES: &str = "\
instance-class,cpu-cores-available,cpu-cores-utilized,memory-available,cpu-model-name,cpu-tdp
Standard_M128ms,128,128,3892,Intel Xeon Platinum 8280M,205
Standard_A1_v2,1,1,2,Intel Xeon E5-2673 v4,135
";

const REGIONS: &str = "\
cloud-provider,cloud-region,cfe-region,em-zone-id,wt-region-id,location,geolocation
Amazon Web Services,us-east-1,us-east-1,US-MIDA-PJM,PJM_DC,\"Virginia, USA\",\" 38.9,-77.4\"
Microsoft Azure,uksouth,UK South,GB,UK,\"London, UK\",\"51.5,-0.1\"
";

fn ZiTTables() -> ZiCloudTables {
    ZiCloudTables {
        aws: parse_table::<ZiInstanceRow>(AWS_INSTANCES).unwrap(),
        azure: parse_table::<ZiInstanceRow>(AZURE_INSTANCES).unwrap(),
        regions: parse_table::<ZiRegionRow>(REGIONS).unwrap(),
    }
}

fn ZiTRecord(fields: Value) -> ZiRecord {
    let mut record = ZiRecord::observation("2023-07-06T00:00", 300.0);
    record.extend(fields.as_object().cloned().expect("object literal"));
    record
}

fn ZiTWriteTables() -> (TempDir, Value) {
    let dir = tempfile::tempdir().unwrap();
    let aws = dir.path().join("aws-instances.csv");
    let azure = dir.path().join("azure-instances.csv");
    let gsf = dir.path().join("gsf-data.csv");
    fs::write(&aws, AWS_INSTANCES).unwrap();
    fs::write(&azure, AZURE_INSTANCES).unwrap();
    fs::write(&gsf, REGIONS).unwrap();
    let config = json!({
        "aws-instances": aws.display().to_string(),
        "azure-instances": azure.display().to_string(),
        "gsf-data": gsf.display().to_string(),
    });
    (dir, config)
}

#[test]
fn ZiFTCloudTablesIgnoreExtraColumns() {
    let tables = ZiTTables();

    assert_eq!(tables.aws.len(), 2);
    assert_eq!(tables.aws[0].instance_class, "m5n.large");
    assert_eq!(tables.regions[0].location, "Virginia, USA");
    assert!(tables.region(ZiCloudVendor::Azure, "UK South").is_some());
    assert!(tables.region(ZiCloudVendor::Aws, "uksouth").is_none());
}

#[tokio::test]
async fn ZiFTCloudInstanceMetadataEnrichesAwsRecord() {
    let plugin = ZiCloudInstanceMetadata::with_tables(ZiTTables());
    let outputs = plugin
        .execute(vec![ZiTRecord(json!({"cloud-vendor": "aws", "cloud-instance-type": "m5n.large"}))])
        .await
        .unwrap();

    let record = &outputs[0];
    assert_eq!(record.get("vcpus-allocated"), Some(&json!(2)));
    assert_eq!(record.get("vcpus-total"), Some(&json!(96)));
    assert_eq!(record.get("memory-available"), Some(&json!(8)));
    assert_eq!(record.get("physical-processor"), Some(&json!("Intel Xeon Platinum 8259CL")));
    assert_eq!(record.get("thermal-design-power"), Some(&json!(210)));
}

#[tokio::test]
async fn ZiFTCloudInstanceMetadataNormalizesAzureSizes() {
    let plugin = ZiCloudInstanceMetadata::with_tables(ZiTTables());
    let outputs = plugin
        .execute(vec![ZiTRecord(
            json!({"cloud-vendor": "azure", "cloud-instance-type": "Standard_M128-64ms"}),
        )])
        .await
        .unwrap();

    assert_eq!(outputs[0].get("vcpus-total"), Some(&json!(128)));
    assert_eq!(outputs[0].get("cloud-instance-type"), Some(&json!("Standard_M128-64ms")));
}

#[tokio::test]
async fn ZiFTCloudInstanceMetadataUnknownInstance() {
    let plugin = ZiCloudInstanceMetadata::with_tables(ZiTTables());
    let err = plugin
        .execute(vec![ZiTRecord(json!({"cloud-vendor": "aws", "cloud-instance-type": "t2.nano"}))])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UnsupportedValueError");
    assert_eq!(
        err.message(),
        "CloudInstanceMetadata(cloud-instance-type): 't2.nano' is not supported in 'aws'."
    );
}

#[tokio::test]
async fn ZiFTCloudInstanceMetadataRejectsUnknownVendor() {
    let plugin = ZiCloudInstanceMetadata::with_tables(ZiTTables());
    let err = plugin
        .execute(vec![ZiTRecord(json!({"cloud-vendor": "gcp", "cloud-instance-type": "n2"}))])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "InputValidationError");
    assert_eq!(
        err.message(),
        "\"cloud-vendor\" parameter is invalid enum value. expected 'aws' | 'azure', received 'gcp'. Error code: invalid_enum_value."
    );

    let err = plugin
        .execute(vec![ZiTRecord(json!({"cloud-instance-type": "n2"}))])
        .await
        .unwrap_err();
    assert_eq!(
        err.message(),
        "\"cloud-vendor\" parameter is only aws,azure is currently supported. Error code: invalid_type."
    );
}

#[tokio::test]
async fn ZiFTCloudInstanceMetadataLoadsConfiguredFiles() {
    let (_dir, config) = ZiTWriteTables();
    let mut plugin = ZiCloudInstanceMetadata::new();
    plugin.configure(Some(&config)).await.unwrap();
    let outputs = plugin
        .execute(vec![ZiTRecord(json!({"cloud-vendor": "aws", "cloud-instance-type": "t3.micro"}))])
        .await
        .unwrap();

    assert_eq!(outputs[0].get("thermal-design-power"), Some(&json!(240)));
}

#[tokio::test]
async fn ZiFTCloudMetadataAddsInstanceAndRegionFields() {
    let plugin = ZiCloudMetadata::with_tables(ZiTTables(), Vec::new());
    let outputs = plugin
        .execute(vec![ZiTRecord(json!({
            "cloud/vendor": "aws",
            "cloud/instance-type": "m5n.large",
            "cloud/region": "us-east-1"
        }))])
        .await
        .unwrap();

    let record = &outputs[0];
    assert_eq!(record.get("cpu/thermal-design-power"), Some(&json!(210)));
    assert_eq!(record.get("cloud/region-cfe"), Some(&json!("us-east-1")));
    assert_eq!(record.get("cloud/region-em-zone-id"), Some(&json!("US-MIDA-PJM")));
    assert_eq!(record.get("cloud/region-wt-id"), Some(&json!("PJM_DC")));
    assert_eq!(record.get("cloud/region-location"), Some(&json!("Virginia, USA")));
    assert_eq!(record.get("cloud/region-geolocation"), Some(&json!("38.9,-77.4")));
}

#[tokio::test]
async fn ZiFTCloudMetadataFieldFilter() {
    let (_dir, mut config) = ZiTWriteTables();
    config["fields"] = json!(["vcpus-total", "cloud/region-cfe"]);
    let mut plugin = ZiCloudMetadata::new();
    plugin.configure(Some(&config)).await.unwrap();

    let outputs = plugin
        .execute(vec![ZiTRecord(json!({
            "cloud/vendor": "azure",
            "cloud/instance-type": "Standard_A1_v2",
            "cloud/region": "uksouth"
        }))])
        .await
        .unwrap();

    let record = &outputs[0];
    assert_eq!(record.get("vcpus-total"), Some(&json!(1)));
    assert_eq!(record.get("cloud/region-cfe"), Some(&json!("UK South")));
    assert!(!record.contains("vcpus-allocated"));
    assert!(!record.contains("cloud/region-location"));
}

#[tokio::test]
async fn ZiFTCloudMetadataUnknownRegion() {
    let plugin = ZiCloudMetadata::with_tables(ZiTTables(), Vec::new());
    let err = plugin
        .execute(vec![ZiTRecord(json!({
            "cloud/vendor": "aws",
            "cloud/instance-type": "m5n.large",
            "cloud/region": "mars-1"
        }))])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UnsupportedValueError");
    assert_eq!(
        err.message(),
        "CloudMetadata: 'mars-1' region is not supported in 'aws' cloud vendor."
    );
}

#[tokio::test]
async fn ZiFTCloudMetadataUnknownInstanceType() {
    let plugin = ZiCloudMetadata::with_tables(ZiTTables(), Vec::new());
    let err = plugin
        .execute(vec![ZiTRecord(json!({"cloud/vendor": "azure", "cloud/instance-type": "Standard_Z9"}))])
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "CloudMetadata(cloud/instance-type): 'Standard_Z9' instance type is not supported in 'azure' cloud vendor."
    );
}

#[tokio::test]
async fn ZiFTCloudMetadataMissingTableFileIsReadError() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let err = ZiCloudMetadata::new()
        .configure(Some(&json!({"aws-instances": missing.display().to_string()})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ReadFileError");
}
