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

//! # Zimpact Error Module
//!
//! This module defines the error taxonomy shared by every plugin and the
//! formatter that builds plugin-prefixed error messages.
//!
//! ## Error Categories
//!
//! - **InputValidation**: malformed or missing record/config fields
//! - **UnsupportedValue**: a well-formed value outside the supported set
//!   (vendor, instance type, processor model)
//! - **ReadFile**: reference data could not be read
//! - **WriteFile**: an exporter could not write its output
//! - **MakeDirectory**: an exporter could not create its output directory
//!
//! Every variant carries the final, human-readable message. Errors are
//! returned to the caller and never retried or logged by the plugins.
//!
//! ## Usage
//!
//! ```rust
//! use zimpact::errors::{Result, ZiError, ZiErrorBuilder};
//!
//! fn check(value: f64) -> Result<f64> {
//!     let errors = ZiErrorBuilder::new("Exponent");
//!     if value.is_nan() {
//!         return Err(ZiError::input_validation(errors.message("value is not numeric")));
//!     }
//!     Ok(value)
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Zimpact.
pub type Result<T> = std::result::Result<T, ZiError>;

/// Canonical error enumeration for Zimpact.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZiError {
    /// Malformed or missing record or configuration fields.
    #[error("{0}")]
    InputValidation(String),

    /// A syntactically valid value that is not in a supported/known set.
    #[error("{0}")]
    UnsupportedValue(String),

    /// Failure to read a reference data file.
    #[error("{0}")]
    ReadFile(String),

    /// Failure to write an export file.
    #[error("{0}")]
    WriteFile(String),

    /// Failure to create an export directory.
    #[error("{0}")]
    MakeDirectory(String),
}

impl ZiError {
    /// Helper to construct input validation errors.
    pub fn input_validation<T: Into<String>>(message: T) -> Self {
        ZiError::InputValidation(message.into())
    }

    /// Helper to construct unsupported value errors.
    pub fn unsupported_value<T: Into<String>>(message: T) -> Self {
        ZiError::UnsupportedValue(message.into())
    }

    /// Helper to construct read file errors.
    pub fn read_file<T: Into<String>>(message: T) -> Self {
        ZiError::ReadFile(message.into())
    }

    /// Helper to construct write file errors.
    pub fn write_file<T: Into<String>>(message: T) -> Self {
        ZiError::WriteFile(message.into())
    }

    /// Helper to construct make directory errors.
    pub fn make_directory<T: Into<String>>(message: T) -> Self {
        ZiError::MakeDirectory(message.into())
    }

    /// Name of the error kind as exposed to pipeline manifests and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ZiError::InputValidation(_) => "InputValidationError",
            ZiError::UnsupportedValue(_) => "UnsupportedValueError",
            ZiError::ReadFile(_) => "ReadFileError",
            ZiError::WriteFile(_) => "WriteFileError",
            ZiError::MakeDirectory(_) => "MakeDirectoryError",
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        match self {
            ZiError::InputValidation(message)
            | ZiError::UnsupportedValue(message)
            | ZiError::ReadFile(message)
            | ZiError::WriteFile(message)
            | ZiError::MakeDirectory(message) => message,
        }
    }
}

/// Formats messages as `<Plugin>(<scope>): <message>.`.
#[derive(Clone, Copy, Debug)]
pub struct ZiErrorBuilder {
    plugin: &'static str,
}

impl ZiErrorBuilder {
    pub const fn new(plugin: &'static str) -> Self {
        Self { plugin }
    }

    pub fn plugin(&self) -> &'static str {
        self.plugin
    }

    /// Message without a scope.
    pub fn message(&self, message: impl AsRef<str>) -> String {
        self.format(None, message.as_ref())
    }

    /// Message with a scope rendered in parentheses after the plugin name.
    pub fn scoped(&self, scope: &str, message: impl AsRef<str>) -> String {
        self.format(Some(scope), message.as_ref())
    }

    pub fn format(&self, scope: Option<&str>, message: &str) -> String {
        match scope {
            Some(scope) if !scope.is_empty() => format!("{}({}): {}.", self.plugin, scope, message),
            _ => format!("{}: {}.", self.plugin, message),
        }
    }

    /// Shorthand for an [`ZiError::InputValidation`] carrying a formatted message.
    pub fn input_validation(&self, message: impl AsRef<str>) -> ZiError {
        ZiError::input_validation(self.message(message))
    }

    /// Shorthand for the error raised when a plugin runs without its configuration.
    pub fn missing_config(&self) -> ZiError {
        self.input_validation("Configuration data is missing")
    }
}
