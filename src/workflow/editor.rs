// SPDX-License-Identifier: MIT

//! Workflow editor session
//!
//! Drives one workflow through `Loading -> Ready -> Saving -> Ready`.
//! Steps are edited in memory and persisted wholesale: every save sends the
//! full tree in nested form, never a patch. Failures surface as notices
//! (the UI's toasts) and leave the editor `Ready`.

use std::sync::Arc;

use serde_json::Value;

use super::llm::{convert_to_llm_format, LlmStep};
use super::loader::load_steps;
use super::nested::{convert_to_nested_json, NestedStep};
use super::tree::{self, Direction};
use super::types::{Step, Workflow, WorkflowStatus};
use crate::client::{
    CreateWorkflowRequest, ExecuteWorkflowRequest, UpdateWorkflowRequest, WorkflowBackend,
};
use crate::error::{SunaError, WorkflowError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    Ready,
    Saving,
}

impl std::fmt::Display for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorState::Loading => write!(f, "loading"),
            EditorState::Ready => write!(f, "ready"),
            EditorState::Saving => write!(f, "saving"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Workflow-level fields edited alongside the steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDraft {
    pub name: String,
    pub description: Option<String>,
    pub trigger_phrase: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Mark a newly created workflow active right after creating it
    pub activate_on_create: bool,
}

pub struct WorkflowEditor {
    backend: Arc<dyn WorkflowBackend>,
    agent_id: String,
    workflow_id: Option<String>,
    state: EditorState,
    draft: WorkflowDraft,
    steps: Vec<Step>,
    notices: Vec<Notice>,
}

impl WorkflowEditor {
    /// Editor for a workflow that does not exist yet
    pub fn new(backend: Arc<dyn WorkflowBackend>, agent_id: impl Into<String>) -> Self {
        Self {
            backend,
            agent_id: agent_id.into(),
            workflow_id: None,
            state: EditorState::Ready,
            draft: WorkflowDraft::default(),
            steps: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Editor for an existing workflow, loaded from the backend
    pub async fn open(
        backend: Arc<dyn WorkflowBackend>,
        agent_id: impl Into<String>,
        workflow_id: &str,
    ) -> Result<Self, SunaError> {
        let mut editor = Self::new(backend, agent_id);
        editor.load(workflow_id).await?;
        Ok(editor)
    }

    /// Fetch `workflow_id` and replace the local state with it
    pub async fn load(&mut self, workflow_id: &str) -> Result<(), SunaError> {
        self.ensure_ready()?;
        self.state = EditorState::Loading;

        let result = self.fetch_and_apply(workflow_id).await;
        self.state = EditorState::Ready;

        if let Err(e) = &result {
            log::error!("Failed to load workflow {}: {}", workflow_id, e);
            self.notify(NoticeLevel::Error, format!("Failed to load workflow: {}", e));
        }
        result
    }

    async fn fetch_and_apply(&mut self, workflow_id: &str) -> Result<(), SunaError> {
        let workflow = self
            .backend
            .get_workflow(&self.agent_id, workflow_id)
            .await?;
        self.apply(workflow)
    }

    /// Replace local state with a workflow record
    pub fn apply(&mut self, workflow: Workflow) -> Result<(), SunaError> {
        let steps = load_steps(&workflow.steps)?;

        log::info!(
            "Loaded workflow '{}' ({}) with {} steps",
            workflow.name,
            workflow.id,
            tree::count(&steps)
        );

        self.workflow_id = Some(workflow.id);
        self.draft = WorkflowDraft {
            name: workflow.name,
            description: workflow.description,
            trigger_phrase: workflow.trigger_phrase,
            is_default: workflow.is_default,
        };
        self.steps = steps;
        Ok(())
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }

    pub fn draft(&self) -> &WorkflowDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut WorkflowDraft {
        &mut self.draft
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Replace the whole tree
    pub fn set_steps(&mut self, steps: Vec<Step>) -> Result<(), WorkflowError> {
        self.ensure_ready()?;
        self.steps = steps;
        Ok(())
    }

    pub fn add_step(
        &mut self,
        parent: Option<&str>,
        index: Option<usize>,
        step: Step,
    ) -> Result<(), WorkflowError> {
        self.ensure_ready()?;
        tree::insert(&mut self.steps, parent, index, step)
    }

    pub fn add_step_after(&mut self, after_id: &str, step: Step) -> Result<(), WorkflowError> {
        self.ensure_ready()?;
        tree::insert_after(&mut self.steps, after_id, step)
    }

    pub fn remove_step(&mut self, id: &str) -> Result<Step, WorkflowError> {
        self.ensure_ready()?;
        tree::remove(&mut self.steps, id).ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))
    }

    pub fn move_step(&mut self, id: &str, direction: Direction) -> Result<bool, WorkflowError> {
        self.ensure_ready()?;
        tree::move_step(&mut self.steps, id, direction)
    }

    /// Toggle `enabled` on the in-memory tree. The nested wire format and the
    /// model plan have no `enabled` field, so the flag is not persisted.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), WorkflowError> {
        self.ensure_ready()?;
        tree::set_enabled(&mut self.steps, id, enabled)
    }

    /// Apply `edit` to the step `id`
    pub fn update_step<F>(&mut self, id: &str, edit: F) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut Step),
    {
        self.ensure_ready()?;
        let step = tree::find_mut(&mut self.steps, id)
            .ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))?;
        edit(step);
        Ok(())
    }

    /// The tree as it would be sent on save
    pub fn nested_steps(&self) -> Vec<NestedStep> {
        convert_to_nested_json(&self.steps)
    }

    /// The tree as the agent's model sees it
    pub fn llm_plan(&self) -> Vec<LlmStep> {
        convert_to_llm_format(&self.steps)
    }

    /// Persist the workflow: update when it exists, create otherwise.
    ///
    /// The tree is serialized before any request is issued. When a created
    /// workflow fails to activate, it stays created and a warning is queued.
    pub async fn save(&mut self, options: SaveOptions) -> Result<Workflow, SunaError> {
        self.ensure_ready()?;

        if self.draft.name.trim().is_empty() {
            self.notify(NoticeLevel::Error, "Please enter a workflow name");
            return Err(WorkflowError::MissingName.into());
        }

        self.state = EditorState::Saving;
        let steps = convert_to_nested_json(&self.steps);
        let result = self.persist(steps, options).await;
        self.state = EditorState::Ready;

        match &result {
            Ok(workflow) => {
                self.workflow_id = Some(workflow.id.clone());
                self.notify(NoticeLevel::Info, "Workflow saved");
            }
            Err(e) => {
                log::error!("Failed to save workflow '{}': {}", self.draft.name, e);
                self.notify(NoticeLevel::Error, format!("Failed to save workflow: {}", e));
            }
        }
        result
    }

    async fn persist(
        &mut self,
        steps: Vec<NestedStep>,
        options: SaveOptions,
    ) -> Result<Workflow, SunaError> {
        if let Some(workflow_id) = self.workflow_id.clone() {
            let request = UpdateWorkflowRequest {
                name: Some(self.draft.name.clone()),
                description: self.draft.description.clone(),
                trigger_phrase: self.draft.trigger_phrase.clone(),
                is_default: Some(self.draft.is_default),
                status: None,
                steps: Some(steps),
            };
            let updated = self
                .backend
                .update_workflow(&self.agent_id, &workflow_id, &request)
                .await?;
            log::info!("Updated workflow {}", updated.id);
            return Ok(updated);
        }

        let request = CreateWorkflowRequest {
            name: self.draft.name.clone(),
            description: self.draft.description.clone(),
            trigger_phrase: self.draft.trigger_phrase.clone(),
            is_default: self.draft.is_default,
            steps,
        };
        let created = self
            .backend
            .create_workflow(&self.agent_id, &request)
            .await?;
        log::info!("Created workflow {}", created.id);

        if !options.activate_on_create {
            return Ok(created);
        }

        let activate = UpdateWorkflowRequest {
            status: Some(WorkflowStatus::Active),
            ..Default::default()
        };
        let activated = self
            .backend
            .update_workflow(&self.agent_id, &created.id, &activate)
            .await;
        match activated {
            Ok(active) => Ok(active),
            Err(e) => {
                log::warn!("Workflow {} created but not activated: {}", created.id, e);
                self.notify(
                    NoticeLevel::Warning,
                    format!("Workflow created but could not be activated: {}", e),
                );
                Ok(created)
            }
        }
    }

    /// Run the saved workflow on the backend
    pub async fn execute(&self, input: Option<Value>) -> Result<Value, SunaError> {
        let workflow_id = self
            .workflow_id
            .as_deref()
            .ok_or_else(|| SunaError::other("workflow has not been saved yet"))?;
        let request = ExecuteWorkflowRequest { input_data: input };
        self.backend
            .execute_workflow(&self.agent_id, workflow_id, &request)
            .await
    }

    /// Drain queued notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    fn ensure_ready(&self) -> Result<(), WorkflowError> {
        match self.state {
            EditorState::Ready => Ok(()),
            other => Err(WorkflowError::Busy(other.to_string())),
        }
    }
}
