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
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use zimpact::plugins::tdp::{ZiTdpFinder, ZiTdpTable, OUTPUT_FIELD};
use zimpact::{ZiPlugin, ZiRecord};

fn ZiTWriteTables() -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let intel = dir.path().join("intel.csv");
    let amd = dir.path().join("amd.csv");
    fs::write(
        &intel,
        "Model,TDP\nIntel Xeon Platinum 8275CL@3.0GHz,240\nIntel Xeon E5-2686 v4,145\n",
    )
    .unwrap();
    fs::write(&amd, "Model,TDP\nAMD EPYC 7R13,225\nIntel Xeon E5-2686 v4,150\n\n").unwrap();
    (dir, vec![intel, amd])
}

fn ZiTProcessor(names: &str) -> ZiRecord {
    ZiRecord::observation("2023-07-06T00:00", 3600.0).with_field("physical-processor", json!(names))
}

async fn ZiTFinder(paths: &[PathBuf]) -> ZiTdpFinder {
    let files: Vec<Value> = paths.iter().map(|path| json!(path.display().to_string())).collect();
    let mut finder = ZiTdpFinder::new();
    finder
        .configure(Some(&json!({"data-files": files})))
        .await
        .expect("tables load");
    finder
}

#[tokio::test]
async fn ZiFTTdpFinderTakesMaximumAcrossProcessors() {
    let (_dir, paths) = ZiTWriteTables();
    let finder = ZiTFinder(&paths).await;
    let outputs = finder
        .execute(vec![ZiTProcessor("AMD EPYC 7R13, Intel Xeon Platinum 8275CL")])
        .await
        .unwrap();

    assert_eq!(outputs[0].get(OUTPUT_FIELD), Some(&json!(240)));
}

#[tokio::test]
async fn ZiFTTdpFinderDuplicatesAcrossFilesKeepLargest() {
    let (_dir, paths) = ZiTWriteTables();
    let finder = ZiTFinder(&paths).await;
    let outputs = finder
        .execute(vec![ZiTProcessor("Intel Xeon E5-2686 v4")])
        .await
        .unwrap();

    assert_eq!(outputs[0].get(OUTPUT_FIELD), Some(&json!(150)));
}

#[tokio::test]
async fn ZiFTTdpFinderUnknownProcessorIsUnsupported() {
    let (_dir, paths) = ZiTWriteTables();
    let finder = ZiTFinder(&paths).await;
    let err = finder
        .execute(vec![
            ZiTProcessor("AMD EPYC 7R13"),
            ZiTProcessor("AMD EPYC 7R13, Apple M2"),
        ])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UnsupportedValueError");
    assert_eq!(
        err.message(),
        "TdpFinder: 'physical-processor': Apple M2 from input[1] is not found in the database."
    );
}

#[tokio::test]
async fn ZiFTTdpFinderMissingFileIsReadError() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");
    let mut finder = ZiTdpFinder::new();
    let err = finder
        .configure(Some(&json!({"data-files": [missing.display().to_string()]})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ReadFileError");
    assert!(err
        .message()
        .starts_with(&format!("Error reading file {}:", missing.display())));
}

#[tokio::test]
async fn ZiFTTdpFinderRequiresDataFiles() {
    let err = ZiTdpFinder::new()
        .configure(Some(&json!({"data-files": []})))
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "\"data-files\" parameter is array must contain at least 1 element(s). Error code: too_small."
    );
}

#[tokio::test]
async fn ZiFTTdpFinderRequiresPhysicalProcessor() {
    let mut table = ZiTdpTable::new();
    table.insert("AMD EPYC 7R13", 225.0);
    let finder = ZiTdpFinder::with_table(table);
    let err = finder
        .execute(vec![ZiRecord::observation("2023-07-06T00:00", 1.0)])
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "\"physical-processor\" parameter is required. Error code: invalid_type."
    );
}

#[test]
fn ZiFTTdpTableSkipsUnparsableRows() {
    let mut table = ZiTdpTable::new();
    let merged = table
        .merge_csv("Model,TDP\nAMD EPYC 7R13,225\nBroken row\nIntel Xeon Gold 6148,n/a\n")
        .unwrap();

    assert_eq!(merged, 1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("AMD EPYC 7R13"), Some(225.0));
    assert!(table.get("Intel Xeon Gold 6148").is_none());
}
