// SPDX-License-Identifier: MIT

//! Tree <-> nested JSON conversion
//!
//! The nested form is the current backend wire format: the same shape as the
//! tree, with every node stamped with a global pre-order `order` and
//! `children` present only when non-empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids;
use super::types::{Conditions, Step, StepKind};
use crate::error::WorkflowError;

/// One node of the nested wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedStep {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NestedStep>,
}

/// Flatten a step tree into the nested wire format.
///
/// Orders start at 1 and are assigned in pre-order across the whole tree:
/// a parent is numbered before its children, and numbering continues into
/// the children before moving on to the next sibling.
pub fn convert_to_nested_json(steps: &[Step]) -> Vec<NestedStep> {
    let (nodes, _) = number_steps(steps, 1);
    nodes
}

/// Numbers `steps` starting at `next_order`; returns the nodes and the next
/// unused order value.
fn number_steps(steps: &[Step], mut next_order: u32) -> (Vec<NestedStep>, u32) {
    let mut nodes = Vec::with_capacity(steps.len());

    for step in steps {
        let order = next_order;
        let (children, after_children) = number_steps(&step.children, next_order + 1);
        next_order = after_children;

        nodes.push(NestedStep {
            id: step.id.clone(),
            name: step.name.clone(),
            description: step.description.clone(),
            step_type: step.kind.type_tag().to_string(),
            config: step.config.clone(),
            conditions: step.conditions().cloned(),
            order,
            children,
        });
    }

    (nodes, next_order)
}

/// Loosely-typed step as found in backend payloads of either format.
///
/// Every field is optional; defaults are applied when materializing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RawStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "hasIssues", default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Value>,
}

impl RawStep {
    pub fn is_condition(&self) -> bool {
        self.step_type.as_deref() == Some(StepKind::CONDITION)
    }

    /// `order`, falling back to the legacy `step_order`, else 0
    pub fn effective_order(&self) -> i64 {
        self.order.or(self.step_order).unwrap_or(0)
    }

    /// Non-empty `children` array, if any
    pub fn child_values(&self) -> Option<&Vec<Value>> {
        match &self.children {
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            _ => None,
        }
    }

    /// Build a childless `Step` with every default applied.
    ///
    /// `path` identifies the entry's position and seeds the id when the
    /// payload has none.
    pub fn materialize(&self, path: &str) -> Result<Step, WorkflowError> {
        let type_tag = self
            .step_type
            .clone()
            .unwrap_or_else(|| StepKind::INSTRUCTION.to_string());

        // Gates that are not objects carry nothing usable
        let conditions = match &self.conditions {
            Some(value @ Value::Object(_)) if type_tag == StepKind::CONDITION => {
                Some(serde_json::from_value::<Conditions>(value.clone()).map_err(|e| {
                    WorkflowError::InvalidSteps(format!("step at {}: bad conditions: {}", path, e))
                })?)
            }
            _ => None,
        };

        let id = match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let payload = serde_json::to_string(self).map_err(|e| {
                    WorkflowError::InvalidSteps(format!("step at {}: {}", path, e))
                })?;
                ids::derived(path, &payload)
            }
        };

        Ok(Step {
            id,
            name: self.name.clone().unwrap_or_default(),
            description: Some(self.description.clone().unwrap_or_default()),
            kind: StepKind::from_parts(&type_tag, conditions),
            config: self.config.clone().unwrap_or_default(),
            order: self.effective_order(),
            enabled: self.enabled != Some(false),
            has_issues: self.has_issues.unwrap_or(false),
            children: Vec::new(),
        })
    }
}

/// Parse a `steps` payload into raw entries. `null` means no steps.
pub(crate) fn parse_raw_steps(steps: &Value) -> Result<Vec<RawStep>, WorkflowError> {
    match steps {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_raw_step(item, &i.to_string()))
            .collect(),
        other => Err(WorkflowError::InvalidSteps(format!(
            "expected an array of steps, found {}",
            json_kind(other)
        ))),
    }
}

fn parse_raw_step(value: &Value, path: &str) -> Result<RawStep, WorkflowError> {
    if !value.is_object() {
        return Err(WorkflowError::InvalidSteps(format!(
            "step at {} is {}, not an object",
            path,
            json_kind(value)
        )));
    }
    serde_json::from_value(value.clone())
        .map_err(|e| WorkflowError::InvalidSteps(format!("step at {}: {}", path, e)))
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rebuild a step tree from the nested wire format.
///
/// This is a field-mapping and defaulting pass: ids are preserved, missing
/// fields get defaults, and `children` is followed only when it is a
/// non-empty array. Parent/child structure is taken as given.
pub fn reconstruct_from_nested_json(steps: &Value) -> Result<Vec<Step>, WorkflowError> {
    let raw = parse_raw_steps(steps)?;
    raw.iter()
        .enumerate()
        .map(|(i, entry)| rebuild(entry, i.to_string()))
        .collect()
}

fn rebuild(entry: &RawStep, path: String) -> Result<Step, WorkflowError> {
    let mut step = entry.materialize(&path)?;

    if let Some(children) = entry.child_values() {
        step.children = children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let child_path = format!("{}.{}", path, i);
                let raw = parse_raw_step(child, &child_path)?;
                rebuild(&raw, child_path)
            })
            .collect::<Result<Vec<_>, _>>()?;
    }

    Ok(step)
}
