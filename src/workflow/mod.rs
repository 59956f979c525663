// SPDX-License-Identifier: MIT

//! Workflow step trees
//!
//! A workflow's steps move between three shapes:
//! - the editable tree ([`Step`])
//! - the nested wire format ([`nested`])
//! - the legacy flat wire format ([`legacy`]), read-only
//!
//! plus a one-way projection for the agent's model ([`llm`]).

pub mod editor;
pub mod ids;
pub mod legacy;
pub mod llm;
pub mod loader;
pub mod nested;
pub mod tree;
pub mod types;

pub use editor::{EditorState, Notice, NoticeLevel, SaveOptions, WorkflowDraft, WorkflowEditor};
pub use legacy::reconstruct_from_flat_json;
pub use llm::{convert_to_llm_format, render_plan, LlmStep};
pub use loader::{detect_format, load_steps, StepFormat, StepLoader};
pub use nested::{convert_to_nested_json, reconstruct_from_nested_json, NestedStep};
pub use types::{ConditionBranch, Conditions, Step, StepKind, Workflow, WorkflowStatus};
