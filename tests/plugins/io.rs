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
use zimpact::plugins::export::{render_csv, ZiCsvExport};
use zimpact::plugins::shell::ZiShellExec;
use zimpact::{ZiPlugin, ZiRecord, ZiRecordBatch};

fn ZiTBatch() -> ZiRecordBatch {
    vec![
        ZiRecord::observation("2023-07-06T00:00", 60.0).with_field("energy", json!(1.5)),
        ZiRecord::observation("2023-07-06T00:01", 60.0).with_field("energy", json!(2)),
    ]
}

async fn ZiTExporter(mut exporter: ZiCsvExport, config: Value) -> ZiCsvExport {
    exporter.configure(Some(&config)).await.expect("valid config");
    exporter
}

#[tokio::test]
async fn ZiFTCsvExportWritesFirstRecordKeys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.csv");
    let exporter = ZiTExporter(ZiCsvExport::new(), json!({"output-path": path.display().to_string()})).await;

    let outputs = exporter.execute(ZiTBatch()).await.unwrap();

    assert_eq!(outputs, ZiTBatch());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "timestamp,duration,energy\r\n2023-07-06T00:00,60,1.5\r\n2023-07-06T00:01,60,2\r\n"
    );
}

#[tokio::test]
async fn ZiFTCsvExportUsesConfiguredHeaders() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let exporter = ZiTExporter(
        ZiCsvExport::grafana(),
        json!({"output-path": path.display().to_string(), "headers": ["energy", "carbon"]}),
    )
    .await;

    exporter.execute(ZiTBatch()).await.unwrap();

    assert_eq!(exporter.name(), "GrafanaExport");
    assert_eq!(fs::read_to_string(&path).unwrap(), "energy,carbon\r\n1.5,\r\n2,\r\n");
}

#[tokio::test]
async fn ZiFTCsvExportRequiresOutputPath() {
    let err = ZiCsvExport::new()
        .configure(Some(&json!({"headers": ["energy"]})))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "\"output-path\" parameter is required. Error code: invalid_type.");

    let err = ZiCsvExport::grafana().configure(None).await.unwrap_err();
    assert_eq!(err.message(), "GrafanaExport: Configuration data is missing.");
}

#[tokio::test]
async fn ZiFTCsvExportDirectoryFailure() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let path = blocker.join("sub").join("out.csv");
    let exporter = ZiTExporter(ZiCsvExport::new(), json!({"output-path": path.display().to_string()})).await;

    let err = exporter.execute(ZiTBatch()).await.unwrap_err();

    assert_eq!(err.kind(), "MakeDirectoryError");
    assert!(err.message().starts_with(&format!(
        "CsvExport: Failed to create directory for CSV at path: {}",
        blocker.join("sub").display()
    )));
}

#[tokio::test]
async fn ZiFTCsvExportWriteFailure() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("taken");
    fs::create_dir(&target).unwrap();
    let exporter = ZiTExporter(ZiCsvExport::new(), json!({"output-path": target.display().to_string()})).await;

    let err = exporter.execute(ZiTBatch()).await.unwrap_err();

    assert_eq!(err.kind(), "WriteFileError");
    assert!(err
        .message()
        .starts_with(&format!("CsvExport: Failed to write CSV to {}", target.display())));
}

#[test]
fn ZiFTCsvRenderQuotesEmbeddedCommas() {
    let batch = vec![ZiRecord::new().with_field("location", json!("Virginia, USA"))];
    let bytes = render_csv(&["location".to_string()], &batch).unwrap();

    assert_eq!(String::from_utf8(bytes).unwrap(), "location\r\n\"Virginia, USA\"\r\n");
}

#[tokio::test]
async fn ZiFTShellExecRequiresCommand() {
    let err = ZiShellExec::new()
        .configure(Some(&json!({"other": 1})))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "ShellExec: command missing from global config.");
}

#[tokio::test]
async fn ZiFTShellExecUnknownProgram() {
    let mut shell = ZiShellExec::new();
    shell
        .configure(Some(&json!({"command": "zimpact-no-such-program --execute"})))
        .await
        .unwrap();

    let err = shell.execute(ZiTBatch()).await.unwrap_err();

    assert_eq!(err.kind(), "InputValidationError");
    assert!(err
        .message()
        .starts_with("ShellExec: failed to spawn `zimpact-no-such-program`"));
}

#[cfg(unix)]
#[tokio::test]
async fn ZiFTShellExecRoundTripsThroughProgram() {
    let mut shell = ZiShellExec::new();
    shell
        .configure(Some(&json!({"command": "sed s/^inputs:/outputs:/", "region": "uk-west"})))
        .await
        .unwrap();

    let outputs = shell.execute(ZiTBatch()).await.unwrap();

    assert_eq!(outputs, ZiTBatch());
}

#[cfg(unix)]
#[tokio::test]
async fn ZiFTShellExecScriptOutputs() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("model.sh");
    fs::write(
        &script,
        "cat > /dev/null\nprintf 'outputs:\\n  - energy: 0.25\\n    source: shell\\n'\n",
    )
    .unwrap();
    let mut shell = ZiShellExec::new();
    shell
        .configure(Some(&json!({"command": format!("sh {}", script.display())})))
        .await
        .unwrap();

    let outputs = shell.execute(ZiTBatch()).await.unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].number("energy"), Some(0.25));
    assert_eq!(outputs[0].get("source"), Some(&json!("shell")));
}

#[cfg(unix)]
#[tokio::test]
async fn ZiFTShellExecProgramIgnoringInput() {
    let mut shell = ZiShellExec::new();
    shell.configure(Some(&json!({"command": "true"}))).await.unwrap();
    let inputs = vec![
        ZiRecord::observation("2023-07-06T00:00", 60.0).with_field("notes", json!("x".repeat(1 << 20))),
    ];

    let err = shell.execute(inputs).await.unwrap_err();

    assert_eq!(err.kind(), "InputValidationError");
    assert!(err.message().starts_with("ShellExec: failed to write inputs to `true`"));
}
