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

//! # Zimpact Schema Module
//!
//! Declarative validation for plugin configuration and record views. Each
//! plugin declares a [`ZiSchema`] listing the fields it consumes; the shared
//! validator checks presence, type and bounds, applies defaults, coerces
//! numeric strings where asked to, and runs cross-field refinements.
//!
//! ## Error Format
//!
//! Every violated check produces one [`ZiIssue`]. Issues are rendered as
//!
//! ```text
//! "<path>" parameter is <lowercased message>. Error code: <code>.
//! ```
//!
//! where `<path>` joins nested keys with `.` and renders array indices as
//! `[i]`. Refinement failures have no path and are rendered as the bare
//! message. All issues of one validation are joined with `,` into a single
//! [`ZiError::InputValidation`].
//!
//! ## Usage Example
//!
//! ```rust
//! use serde_json::json;
//! use zimpact::schema::{ZiField, ZiFieldType, ZiSchema};
//!
//! let schema = ZiSchema::new()
//!     .field(ZiField::required("data-in", ZiFieldType::number().min(0.0)))
//!     .field(ZiField::optional("coefficient", ZiFieldType::number()).with_default(json!(0.001)));
//!
//! let fields = json!({"data-in": 3}).as_object().cloned().unwrap();
//! let validated = schema.validate(&fields).unwrap();
//! assert_eq!(validated.get("coefficient"), Some(&json!(0.001)));
//! ```

use std::fmt;

use serde_json::Value;

use crate::config::parse_float;
use crate::errors::{Result, ZiError};
use crate::record::{value_type_name, ZiFields};

/// One segment of the path to an offending value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZiPathSegment {
    Key(String),
    Index(usize),
}

/// Machine-readable issue category, rendered after `Error code:`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZiIssueCode {
    InvalidType,
    TooSmall,
    TooBig,
    InvalidEnumValue,
    InvalidUnion,
    Custom,
}

impl ZiIssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZiIssueCode::InvalidType => "invalid_type",
            ZiIssueCode::TooSmall => "too_small",
            ZiIssueCode::TooBig => "too_big",
            ZiIssueCode::InvalidEnumValue => "invalid_enum_value",
            ZiIssueCode::InvalidUnion => "invalid_union",
            ZiIssueCode::Custom => "custom",
        }
    }
}

impl fmt::Display for ZiIssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violated check.
#[derive(Clone, Debug, PartialEq)]
pub struct ZiIssue {
    pub path: Vec<ZiPathSegment>,
    pub code: ZiIssueCode,
    pub message: String,
}

impl ZiIssue {
    pub fn new(code: ZiIssueCode, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            code,
            message: message.into(),
        }
    }

    /// Prepends a segment, used while unwinding out of nested values.
    fn under(mut self, segment: ZiPathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }

    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }

    /// Human-readable rendering of the issue.
    pub fn render(&self) -> String {
        let path = self.path_string();
        if path.is_empty() {
            return self.message.clone();
        }
        format!(
            "\"{}\" parameter is {}. Error code: {}.",
            path,
            self.message.to_lowercase(),
            self.code
        )
    }
}

/// Joins a path with `.`, rendering indices as `[i]`.
pub fn format_path(path: &[ZiPathSegment]) -> String {
    path.iter()
        .map(|segment| match segment {
            ZiPathSegment::Key(key) => key.clone(),
            ZiPathSegment::Index(index) => format!("[{index}]"),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Renders every issue and joins them with `,`.
pub fn format_issues(issues: &[ZiIssue]) -> String {
    issues.iter().map(ZiIssue::render).collect::<Vec<_>>().join(",")
}

/// Numeric bound, inclusive (`>=`/`<=`) or exclusive (`>`/`<`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZiBound {
    pub value: f64,
    pub inclusive: bool,
}

/// The shape a field value must have.
#[derive(Clone, Debug)]
pub enum ZiFieldType {
    Any,
    Number {
        min: Option<ZiBound>,
        max: Option<ZiBound>,
        coerce: bool,
    },
    String {
        min_len: Option<usize>,
    },
    Boolean,
    Enum(Vec<String>),
    Array {
        item: Box<ZiFieldType>,
        min_len: Option<usize>,
    },
    Object(ZiSchema),
    Union(Vec<ZiFieldType>),
}

impl ZiFieldType {
    pub fn number() -> Self {
        ZiFieldType::Number {
            min: None,
            max: None,
            coerce: false,
        }
    }

    pub fn string() -> Self {
        ZiFieldType::String { min_len: None }
    }

    pub fn array(item: ZiFieldType) -> Self {
        ZiFieldType::Array {
            item: Box::new(item),
            min_len: None,
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ZiFieldType::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn union(alternatives: Vec<ZiFieldType>) -> Self {
        ZiFieldType::Union(alternatives)
    }

    /// `value >= bound`.
    pub fn min(self, bound: f64) -> Self {
        self.with_min(ZiBound {
            value: bound,
            inclusive: true,
        })
    }

    /// `value > bound`.
    pub fn gt(self, bound: f64) -> Self {
        self.with_min(ZiBound {
            value: bound,
            inclusive: false,
        })
    }

    /// `value <= bound`.
    pub fn max(self, bound: f64) -> Self {
        self.with_max(ZiBound {
            value: bound,
            inclusive: true,
        })
    }

    /// Accept numeric strings, parsed by their leading numeric prefix.
    pub fn coerce(self) -> Self {
        match self {
            ZiFieldType::Number { min, max, .. } => ZiFieldType::Number {
                min,
                max,
                coerce: true,
            },
            other => other,
        }
    }

    /// Minimum length for strings and arrays.
    pub fn min_len(self, len: usize) -> Self {
        match self {
            ZiFieldType::String { .. } => ZiFieldType::String { min_len: Some(len) },
            ZiFieldType::Array { item, .. } => ZiFieldType::Array {
                item,
                min_len: Some(len),
            },
            other => other,
        }
    }

    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    fn with_min(self, bound: ZiBound) -> Self {
        match self {
            ZiFieldType::Number { max, coerce, .. } => ZiFieldType::Number {
                min: Some(bound),
                max,
                coerce,
            },
            other => other,
        }
    }

    fn with_max(self, bound: ZiBound) -> Self {
        match self {
            ZiFieldType::Number { min, coerce, .. } => ZiFieldType::Number {
                min,
                max: Some(bound),
                coerce,
            },
            other => other,
        }
    }

    /// Checks `value`, returning the (possibly coerced) value or the issues found.
    pub fn check(&self, value: &Value) -> std::result::Result<Value, Vec<ZiIssue>> {
        match self {
            ZiFieldType::Any => Ok(value.clone()),
            ZiFieldType::Number { min, max, coerce } => check_number(value, *min, *max, *coerce),
            ZiFieldType::String { min_len } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| vec![expected("string", value)])?;
                if let Some(len) = min_len {
                    if text.chars().count() < *len {
                        return Err(vec![ZiIssue::new(
                            ZiIssueCode::TooSmall,
                            format!("String must contain at least {len} character(s)"),
                        )]);
                    }
                }
                Ok(value.clone())
            }
            ZiFieldType::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(vec![expected("boolean", other)]),
            },
            ZiFieldType::Enum(values) => check_enum(values, value),
            ZiFieldType::Array { item, min_len } => {
                let items = value
                    .as_array()
                    .ok_or_else(|| vec![expected("array", value)])?;
                let mut issues = Vec::new();
                if let Some(len) = min_len {
                    if items.len() < *len {
                        issues.push(ZiIssue::new(
                            ZiIssueCode::TooSmall,
                            format!("Array must contain at least {len} element(s)"),
                        ));
                    }
                }
                let mut checked = Vec::with_capacity(items.len());
                for (index, element) in items.iter().enumerate() {
                    match item.check(element) {
                        Ok(element) => checked.push(element),
                        Err(found) => issues.extend(
                            found
                                .into_iter()
                                .map(|issue| issue.under(ZiPathSegment::Index(index))),
                        ),
                    }
                }
                if issues.is_empty() {
                    Ok(Value::Array(checked))
                } else {
                    Err(issues)
                }
            }
            ZiFieldType::Object(schema) => {
                let fields = value
                    .as_object()
                    .ok_or_else(|| vec![expected("object", value)])?;
                schema.check(fields).map(Value::Object)
            }
            ZiFieldType::Union(alternatives) => {
                let mut first_failure = None;
                for alternative in alternatives {
                    match alternative.check(value) {
                        Ok(value) => return Ok(value),
                        Err(issues) => {
                            first_failure.get_or_insert(issues);
                        }
                    }
                }
                Err(vec![union_issue(first_failure.unwrap_or_default())])
            }
        }
    }
}

fn expected(kind: &str, received: &Value) -> ZiIssue {
    ZiIssue::new(
        ZiIssueCode::InvalidType,
        format!("Expected {}, received {}", kind, value_type_name(received)),
    )
}

fn check_number(
    value: &Value,
    min: Option<ZiBound>,
    max: Option<ZiBound>,
    coerce: bool,
) -> std::result::Result<Value, Vec<ZiIssue>> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if coerce => Some(parse_float(text).unwrap_or(f64::NAN)),
        other => return Err(vec![expected("number", other)]),
    };
    let number = match number {
        Some(number) if !number.is_nan() => number,
        _ => {
            return Err(vec![ZiIssue::new(
                ZiIssueCode::InvalidType,
                "Expected number, received nan",
            )])
        }
    };

    let mut issues = Vec::new();
    if let Some(bound) = min {
        if bound.inclusive && number < bound.value {
            issues.push(ZiIssue::new(
                ZiIssueCode::TooSmall,
                format!("Number must be greater than or equal to {}", bound.value),
            ));
        } else if !bound.inclusive && number <= bound.value {
            issues.push(ZiIssue::new(
                ZiIssueCode::TooSmall,
                format!("Number must be greater than {}", bound.value),
            ));
        }
    }
    if let Some(bound) = max {
        if bound.inclusive && number > bound.value {
            issues.push(ZiIssue::new(
                ZiIssueCode::TooBig,
                format!("Number must be less than or equal to {}", bound.value),
            ));
        } else if !bound.inclusive && number >= bound.value {
            issues.push(ZiIssue::new(
                ZiIssueCode::TooBig,
                format!("Number must be less than {}", bound.value),
            ));
        }
    }
    if !issues.is_empty() {
        return Err(issues);
    }

    match value {
        Value::String(_) => Ok(crate::record::number_value(number)),
        _ => Ok(value.clone()),
    }
}

fn check_enum(values: &[String], value: &Value) -> std::result::Result<Value, Vec<ZiIssue>> {
    let expected_list = values
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(" | ");
    match value {
        Value::String(text) if values.contains(text) => Ok(value.clone()),
        Value::String(text) => Err(vec![ZiIssue::new(
            ZiIssueCode::InvalidEnumValue,
            format!("Invalid enum value. Expected {expected_list}, received '{text}'"),
        )]),
        other => Err(vec![ZiIssue::new(
            ZiIssueCode::InvalidType,
            format!("Expected {}, received {}", expected_list, value_type_name(other)),
        )]),
    }
}

/// Collapses a failed union into one issue: the first alternative's first issue.
fn union_issue(first_alternative: Vec<ZiIssue>) -> ZiIssue {
    match first_alternative.into_iter().next() {
        Some(issue) => ZiIssue {
            code: ZiIssueCode::InvalidUnion,
            ..issue
        },
        None => ZiIssue::new(ZiIssueCode::InvalidUnion, "Invalid input"),
    }
}

/// A named field with its type, presence rule and default.
#[derive(Clone, Debug)]
pub struct ZiField {
    pub name: String,
    pub kind: ZiFieldType,
    pub required: bool,
    pub default: Option<Value>,
    pub default_when_zero: bool,
    pub required_message: Option<String>,
}

impl ZiField {
    pub fn required(name: impl Into<String>, kind: ZiFieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            default_when_zero: false,
            required_message: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ZiFieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Value substituted when the field is absent.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Also substitute the default when the field holds a numeric zero.
    pub fn default_when_zero(mut self) -> Self {
        self.default_when_zero = true;
        self
    }

    /// Message reported instead of `Required` when the field is absent.
    pub fn required_message(mut self, message: impl Into<String>) -> Self {
        self.required_message = Some(message.into());
        self
    }
}

/// Cross-field predicate evaluated after every field check passed.
#[derive(Clone, Debug)]
pub enum ZiRefinement {
    AllDefined { fields: Vec<String>, message: String },
    AtLeastOneDefined { fields: Vec<String>, message: String },
}

impl ZiRefinement {
    pub fn all_defined(fields: &[&str], message: impl Into<String>) -> Self {
        ZiRefinement::AllDefined {
            fields: fields.iter().map(|field| field.to_string()).collect(),
            message: message.into(),
        }
    }

    pub fn at_least_one_defined(fields: &[&str], message: impl Into<String>) -> Self {
        ZiRefinement::AtLeastOneDefined {
            fields: fields.iter().map(|field| field.to_string()).collect(),
            message: message.into(),
        }
    }

    fn check(&self, fields: &ZiFields) -> Option<ZiIssue> {
        let (holds, message) = match self {
            ZiRefinement::AllDefined { fields: names, message } => {
                (names.iter().all(|name| is_defined(fields, name)), message)
            }
            ZiRefinement::AtLeastOneDefined { fields: names, message } => {
                (names.iter().any(|name| is_defined(fields, name)), message)
            }
        };
        (!holds).then(|| ZiIssue::new(ZiIssueCode::Custom, message.clone()))
    }
}

fn is_defined(fields: &ZiFields, name: &str) -> bool {
    fields.contains_key(name)
}

/// True when every named field is present.
pub fn all_defined(fields: &ZiFields, names: &[&str]) -> bool {
    names.iter().all(|name| is_defined(fields, name))
}

/// True when at least one named field is present.
pub fn at_least_one_defined(fields: &ZiFields, names: &[&str]) -> bool {
    names.iter().any(|name| is_defined(fields, name))
}

/// Declarative object schema: ordered fields plus refinements.
#[derive(Clone, Debug, Default)]
pub struct ZiSchema {
    fields: Vec<ZiField>,
    refinements: Vec<ZiRefinement>,
}

impl ZiSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: ZiField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn refine(mut self, refinement: ZiRefinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    pub fn fields(&self) -> &[ZiField] {
        &self.fields
    }

    /// Validates `candidate`, returning the validated fields or the issue list.
    ///
    /// Unknown keys pass through untouched. Refinements are skipped when any
    /// field check failed.
    pub fn check(&self, candidate: &ZiFields) -> std::result::Result<ZiFields, Vec<ZiIssue>> {
        let mut output = candidate.clone();
        let mut issues = Vec::new();

        for field in &self.fields {
            let present = candidate.get(&field.name).filter(|value| {
                !(field.default_when_zero && value.as_f64() == Some(0.0))
            });

            match present {
                Some(value) => match field.kind.check(value) {
                    Ok(checked) => {
                        output.insert(field.name.clone(), checked);
                    }
                    Err(found) => issues.extend(
                        found
                            .into_iter()
                            .map(|issue| issue.under(ZiPathSegment::Key(field.name.clone()))),
                    ),
                },
                None => {
                    if let Some(default) = &field.default {
                        output.insert(field.name.clone(), default.clone());
                    } else if field.required {
                        let message = field.required_message.as_deref().unwrap_or("Required");
                        issues.push(
                            ZiIssue::new(ZiIssueCode::InvalidType, message)
                                .under(ZiPathSegment::Key(field.name.clone())),
                        );
                    }
                }
            }
        }

        if !issues.is_empty() {
            return Err(issues);
        }

        let failed: Vec<ZiIssue> = self
            .refinements
            .iter()
            .filter_map(|refinement| refinement.check(&output))
            .collect();
        if failed.is_empty() {
            Ok(output)
        } else {
            Err(failed)
        }
    }

    /// Validates `candidate`, raising one InputValidation error for all issues.
    pub fn validate(&self, candidate: &ZiFields) -> Result<ZiFields> {
        self.check(candidate)
            .map_err(|issues| ZiError::input_validation(format_issues(&issues)))
    }
}

/// Validates `candidate` against `schema`.
pub fn validate(schema: &ZiSchema, candidate: &ZiFields) -> Result<ZiFields> {
    schema.validate(candidate)
}

/// Validates against alternatives in order; the first that passes wins.
///
/// When none passes, the error carries only the first alternative's first
/// issue, tagged `invalid_union`.
pub fn validate_union(alternatives: &[ZiSchema], candidate: &ZiFields) -> Result<ZiFields> {
    select_union(alternatives, candidate).map(|(_, fields)| fields)
}

/// Like [`validate_union`], also returning the index of the winning alternative.
pub fn select_union(alternatives: &[ZiSchema], candidate: &ZiFields) -> Result<(usize, ZiFields)> {
    let mut first_failure = None;
    for (index, schema) in alternatives.iter().enumerate() {
        match schema.check(candidate) {
            Ok(fields) => return Ok((index, fields)),
            Err(issues) => {
                first_failure.get_or_insert(issues);
            }
        }
    }
    let issue = union_issue(first_failure.unwrap_or_default());
    Err(ZiError::input_validation(issue.render()))
}
