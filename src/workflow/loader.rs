//! Step loading - format probing and file parsing
//!
//! Backend payloads come in two shapes. A payload whose top-level entries
//! carry a `children` array is treated as nested; anything else is treated
//! as legacy flat. If nested reconstruction fails, the legacy reconciler is
//! tried once; its failure is returned to the caller.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::legacy::reconstruct_from_flat_json;
use super::nested::reconstruct_from_nested_json;
use super::types::Step;
use crate::error::{SunaError, WorkflowError};

/// Wire representation of a `steps` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFormat {
    Nested,
    LegacyFlat,
}

impl std::fmt::Display for StepFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepFormat::Nested => write!(f, "nested"),
            StepFormat::LegacyFlat => write!(f, "legacy flat"),
        }
    }
}

/// Structural probe: nested when any top-level entry has a `children` array
pub fn detect_format(steps: &Value) -> StepFormat {
    let nested = steps.as_array().is_some_and(|items| {
        items
            .iter()
            .any(|item| item.get("children").is_some_and(Value::is_array))
    });

    if nested {
        StepFormat::Nested
    } else {
        StepFormat::LegacyFlat
    }
}

/// Reconstruct a step tree from a backend `steps` payload of either format
pub fn load_steps(steps: &Value) -> Result<Vec<Step>, WorkflowError> {
    let format = detect_format(steps);
    log::debug!("Detected {} steps payload", format);

    match format {
        StepFormat::Nested => match reconstruct_from_nested_json(steps) {
            Ok(tree) => Ok(tree),
            Err(e) => {
                log::warn!(
                    "Nested reconstruction failed ({}), falling back to legacy reconciler",
                    e
                );
                reconstruct_from_flat_json(steps)
            }
        },
        StepFormat::LegacyFlat => reconstruct_from_flat_json(steps),
    }
}

/// Loads step payloads from JSON or YAML files
pub struct StepLoader;

impl StepLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read a steps payload from `path`.
    ///
    /// The file may hold the steps array itself or a workflow record with a
    /// `steps` field.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Value, SunaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let value = match ext.as_str() {
            "json" => Self::parse_json(&content)?,
            "yaml" | "yml" => Self::parse_yaml(&content)?,
            other => return Err(WorkflowError::UnsupportedFormat(other.to_string()).into()),
        };

        Ok(Self::steps_of(value))
    }

    /// Read and reconstruct a step tree from `path`
    pub fn load_tree<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Step>, SunaError> {
        let steps = self.load_file(path)?;
        Ok(load_steps(&steps)?)
    }

    pub fn parse_json(content: &str) -> Result<Value, SunaError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn parse_yaml(content: &str) -> Result<Value, SunaError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn steps_of(value: Value) -> Value {
        match value {
            Value::Object(mut record) if record.contains_key("steps") => {
                record.remove("steps").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

impl Default for StepLoader {
    fn default() -> Self {
        Self::new()
    }
}
