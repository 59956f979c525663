// SPDX-License-Identifier: MIT

//! Backend API client
//!
//! Workflows live behind the backend's
//! `/triggers/workflows/agents/{agent_id}/workflows` endpoints. The
//! [`WorkflowBackend`] trait is the seam the editor talks to; [`HttpBackend`]
//! is the real implementation.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SunaError;
use crate::workflow::nested::NestedStep;
use crate::workflow::types::{Workflow, WorkflowStatus};

/// Body of a create call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_phrase: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub steps: Vec<NestedStep>,
}

/// Body of an update call; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkflowRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<NestedStep>>,
}

/// Body of an execute call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteWorkflowRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_data: Option<Value>,
}

/// Backend operations on an agent's workflows
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    async fn list_workflows(&self, agent_id: &str) -> Result<Vec<Workflow>, SunaError>;

    async fn create_workflow(
        &self,
        agent_id: &str,
        request: &CreateWorkflowRequest,
    ) -> Result<Workflow, SunaError>;

    async fn update_workflow(
        &self,
        agent_id: &str,
        workflow_id: &str,
        request: &UpdateWorkflowRequest,
    ) -> Result<Workflow, SunaError>;

    async fn delete_workflow(&self, agent_id: &str, workflow_id: &str) -> Result<(), SunaError>;

    async fn execute_workflow(
        &self,
        agent_id: &str,
        workflow_id: &str,
        request: &ExecuteWorkflowRequest,
    ) -> Result<Value, SunaError>;

    /// The backend has no single-workflow read; look it up in the list.
    async fn get_workflow(&self, agent_id: &str, workflow_id: &str) -> Result<Workflow, SunaError> {
        self.list_workflows(agent_id)
            .await?
            .into_iter()
            .find(|w| w.id == workflow_id)
            .ok_or_else(|| SunaError::not_found("Workflow", workflow_id))
    }
}
