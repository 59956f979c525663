// SPDX-License-Identifier: MIT

//! Step tree and workflow record types
//!
//! `Step` is the in-memory, editable representation of a workflow step.
//! Its serialized form (`StepRecord`) matches the tree shape the builder
//! UI exchanges: camelCase keys, a `type` tag and optional `conditions`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::ids;

/// Branch tag of a condition step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionBranch {
    If,
    ElseIf,
    Else,
    /// Any tag the builder does not know about
    Other(String),
}

impl ConditionBranch {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionBranch::If => "if",
            ConditionBranch::ElseIf => "elseif",
            ConditionBranch::Else => "else",
            ConditionBranch::Other(s) => s,
        }
    }

    /// Gate that carried no usable `type`
    pub fn is_untagged(&self) -> bool {
        matches!(self, ConditionBranch::Other(tag) if tag.is_empty())
    }

    /// Sort priority inside a contiguous condition chain
    pub fn priority(&self) -> u8 {
        match self {
            ConditionBranch::If => 0,
            ConditionBranch::ElseIf => 1,
            ConditionBranch::Else => 2,
            ConditionBranch::Other(_) => 0,
        }
    }
}

impl Default for ConditionBranch {
    fn default() -> Self {
        ConditionBranch::Other(String::new())
    }
}

impl From<String> for ConditionBranch {
    fn from(s: String) -> Self {
        match s.as_str() {
            "if" => ConditionBranch::If,
            "elseif" => ConditionBranch::ElseIf,
            "else" => ConditionBranch::Else,
            _ => ConditionBranch::Other(s),
        }
    }
}

impl From<ConditionBranch> for String {
    fn from(b: ConditionBranch) -> Self {
        b.as_str().to_string()
    }
}

impl std::fmt::Display for ConditionBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate attached to a condition step.
///
/// Reading is lenient: a missing or non-string `type` becomes an untagged
/// branch and a non-string `expression` is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_branch",
        skip_serializing_if = "ConditionBranch::is_untagged"
    )]
    pub branch: ConditionBranch,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub expression: Option<String>,
}

fn lenient_branch<'de, D>(deserializer: D) -> Result<ConditionBranch, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(|tag| ConditionBranch::from(tag.to_string()))
        .unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl Conditions {
    pub fn new(branch: ConditionBranch, expression: Option<String>) -> Self {
        Self { branch, expression }
    }
}

/// What a step does
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StepKind {
    /// Plain instruction to the agent
    #[default]
    Instruction,
    /// Branch whose children run when the gate matches.
    /// `None` when a payload tagged `condition` carried no gate.
    Condition(Option<Conditions>),
    /// Tool-specific or otherwise unrecognized type tag
    Other(String),
}

impl StepKind {
    pub const INSTRUCTION: &'static str = "instruction";
    pub const CONDITION: &'static str = "condition";

    pub fn type_tag(&self) -> &str {
        match self {
            StepKind::Instruction => Self::INSTRUCTION,
            StepKind::Condition(_) => Self::CONDITION,
            StepKind::Other(tag) => tag,
        }
    }

    /// Build a kind from a wire `type` tag and its optional gate.
    /// An empty tag reads as an instruction; gates on non-condition kinds
    /// are discarded.
    pub fn from_parts(type_tag: &str, conditions: Option<Conditions>) -> Self {
        match type_tag {
            "" | Self::INSTRUCTION => StepKind::Instruction,
            Self::CONDITION => StepKind::Condition(conditions),
            other => StepKind::Other(other.to_string()),
        }
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        match self {
            StepKind::Condition(c) => c.as_ref(),
            _ => None,
        }
    }

    pub fn is_condition(&self) -> bool {
        matches!(self, StepKind::Condition(_))
    }
}

/// One node of a workflow's step tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StepRecord", into = "StepRecord")]
pub struct Step {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: StepKind,
    pub config: Map<String, Value>,
    /// Position among siblings (tree) or globally (legacy flat payloads)
    pub order: i64,
    pub enabled: bool,
    pub has_issues: bool,
    pub children: Vec<Step>,
}

impl Step {
    fn with_kind(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: ids::fresh(),
            name: name.into(),
            description: None,
            kind,
            config: Map::new(),
            order: 0,
            enabled: true,
            has_issues: false,
            children: Vec::new(),
        }
    }

    /// New instruction step with a fresh id
    pub fn instruction(name: impl Into<String>) -> Self {
        Self::with_kind(name, StepKind::Instruction)
    }

    /// New condition step with a fresh id
    pub fn condition(branch: ConditionBranch, expression: Option<String>) -> Self {
        let name = match &expression {
            Some(expr) => format!("{} {}", branch, expr),
            None => branch.to_string(),
        };
        Self::with_kind(
            name,
            StepKind::Condition(Some(Conditions::new(branch, expression))),
        )
    }

    /// New step that invokes `tool_name`
    pub fn tool(name: impl Into<String>, tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        let mut step = Self::with_kind(name, StepKind::Other(tool_name.clone()));
        step.config
            .insert("tool_name".to_string(), Value::String(tool_name));
        step
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Step>) -> Self {
        self.children = children;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.config.get("tool_name").and_then(Value::as_str)
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        self.kind.conditions()
    }

    pub fn is_condition(&self) -> bool {
        self.kind.is_condition()
    }
}

/// Serialized tree-form step, as the builder UI sends and receives it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_type_tag")]
    pub step_type: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub children: Vec<Step>,
}

fn default_type_tag() -> String {
    StepKind::INSTRUCTION.to_string()
}

fn default_true() -> bool {
    true
}

impl From<StepRecord> for Step {
    fn from(r: StepRecord) -> Self {
        let id = if r.id.is_empty() { ids::fresh() } else { r.id };
        Step {
            id,
            name: r.name,
            description: r.description,
            kind: StepKind::from_parts(&r.step_type, r.conditions),
            config: r.config,
            order: r.order,
            enabled: r.enabled,
            has_issues: r.has_issues,
            children: r.children,
        }
    }
}

impl From<Step> for StepRecord {
    fn from(s: Step) -> Self {
        let step_type = s.kind.type_tag().to_string();
        let conditions = s.kind.conditions().cloned();
        StepRecord {
            id: s.id,
            name: s.name,
            description: s.description,
            step_type,
            config: s.config,
            conditions,
            order: s.order,
            enabled: s.enabled,
            has_issues: s.has_issues,
            children: s.children,
        }
    }
}

/// Lifecycle status of a workflow on the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Paused,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

/// Workflow record as persisted by the backend.
///
/// `steps` stays raw because it may be either the nested or the legacy flat
/// representation; see [`crate::workflow::loader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub agent_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub trigger_phrase: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub steps: Value,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
