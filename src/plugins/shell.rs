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

//! # Shell Exec Plugin
//!
//! Delegates a batch to an external program.
//!
//! The program named by `command` (split on spaces into program and
//! arguments) receives a YAML document on stdin:
//!
//! ```yaml
//! inputs:
//!   - timestamp: 2023-07-06T00:00:00Z
//!     duration: 60
//! config:
//!   any-other-key: value
//! ```
//!
//! and must print a YAML document with an `outputs` list of records.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::config_object;
use crate::errors::{Result, ZiErrorBuilder};
use crate::plugin::ZiPlugin;
use crate::record::{value_type_name, ZiFields, ZiRecord, ZiRecordBatch};

const ERRORS: ZiErrorBuilder = ZiErrorBuilder::new("ShellExec");

#[derive(Clone, Debug)]
struct ZiShellConfig {
    program: String,
    args: Vec<String>,
    rest: ZiFields,
}

/// Runs an external program over the batch.
#[derive(Debug, Default)]
pub struct ZiShellExec {
    config: Option<ZiShellConfig>,
}

impl ZiShellExec {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(config: &ZiShellConfig, input: String) -> Result<Vec<u8>> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ERRORS.input_validation(format!("failed to spawn `{}`: {}", config.program, err)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ERRORS.input_validation("child stdin is unavailable"))?;
        let feed = async move {
            let written = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
            written
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        let output = output
            .map_err(|err| ERRORS.input_validation(format!("failed to run `{}`: {}", config.program, err)))?;
        written.map_err(|err| {
            ERRORS.input_validation(format!("failed to write inputs to `{}`: {}", config.program, err))
        })?;
        if !output.status.success() {
            log::warn!("ShellExec `{}` exited with {}", config.program, output.status);
        }
        Ok(output.stdout)
    }

    fn parse_outputs(stdout: &[u8]) -> Result<ZiRecordBatch> {
        let document: Value = serde_yaml::from_slice(stdout)
            .map_err(|err| ERRORS.input_validation(format!("failed to parse command output as YAML: {err}")))?;
        match document.get("outputs") {
            Some(Value::Array(items)) => items
                .iter()
                .cloned()
                .map(|item| ZiRecord::try_from(item).map_err(|err| ERRORS.input_validation(err.message())))
                .collect(),
            Some(other) => Err(ERRORS.input_validation(format!(
                "outputs must be a list, received {}",
                value_type_name(other)
            ))),
            None => Err(ERRORS.input_validation("command output has no outputs")),
        }
    }
}

#[async_trait]
impl ZiPlugin for ZiShellExec {
    fn name(&self) -> &'static str {
        "ShellExec"
    }

    async fn configure(&mut self, config: Option<&Value>) -> Result<()> {
        let mut rest = config_object(&ERRORS, config)?.clone();
        let command = match rest.shift_remove("command") {
            Some(Value::String(command)) => command,
            Some(other) => {
                return Err(ERRORS.input_validation(format!(
                    "command must be a string, received {}",
                    value_type_name(&other)
                )))
            }
            None => return Err(ERRORS.input_validation("command missing from global config")),
        };
        let mut parts = command.split(' ').filter(|part| !part.is_empty()).map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ERRORS.input_validation("command must not be empty"))?;
        self.config = Some(ZiShellConfig {
            program,
            args: parts.collect(),
            rest,
        });
        Ok(())
    }

    async fn execute(&self, inputs: ZiRecordBatch) -> Result<ZiRecordBatch> {
        let config = self.config.as_ref().ok_or_else(|| ERRORS.missing_config())?;
        let document = json!({
            "inputs": inputs,
            "config": config.rest,
        });
        let input = serde_yaml::to_string(&document)
            .map_err(|err| ERRORS.input_validation(format!("failed to encode inputs as YAML: {err}")))?;
        log::debug!("ShellExec running `{}` on {} record(s)", config.program, inputs.len());
        let stdout = Self::run(config, input).await?;
        Self::parse_outputs(&stdout)
    }
}
