use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::Value;

use super::{CreateWorkflowRequest, ExecuteWorkflowRequest, UpdateWorkflowRequest, WorkflowBackend};
use crate::config::Config;
use crate::error::SunaError;
use crate::workflow::types::Workflow;

/// REST implementation of [`WorkflowBackend`]
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, SunaError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(SunaError::config(format!(
                "backend URL '{}' cannot be used as a base",
                base_url
            )));
        }

        log::info!(
            "Backend client: base_url={}, has_token={}",
            base_url,
            access_token.is_some()
        );

        Ok(Self {
            client: Client::new(),
            base_url,
            access_token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SunaError> {
        Self::new(&config.backend_url, config.access_token.clone())
    }

    /// `{base}/triggers/workflows/agents/{agent_id}/workflows/{tail...}`
    fn endpoint(&self, agent_id: &str, tail: &[&str]) -> Result<Url, SunaError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SunaError::config("backend URL cannot be used as a base"))?
            .pop_if_empty()
            .extend(["triggers", "workflows", "agents", agent_id, "workflows"])
            .extend(tail);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, SunaError> {
        log::debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, url)
            .header("Accept", "application/json");

        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        if let Some(b) = body {
            req = req.json(&b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(SunaError::api(status.as_u16(), error_message(&text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// FastAPI-style `{"detail": ...}` bodies are unwrapped; anything else is
/// passed through.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl WorkflowBackend for HttpBackend {
    async fn list_workflows(&self, agent_id: &str) -> Result<Vec<Workflow>, SunaError> {
        let url = self.endpoint(agent_id, &[])?;
        let json = self.request(Method::GET, url, None).await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn create_workflow(
        &self,
        agent_id: &str,
        request: &CreateWorkflowRequest,
    ) -> Result<Workflow, SunaError> {
        let url = self.endpoint(agent_id, &[])?;
        let json = self
            .request(Method::POST, url, Some(serde_json::to_value(request)?))
            .await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn update_workflow(
        &self,
        agent_id: &str,
        workflow_id: &str,
        request: &UpdateWorkflowRequest,
    ) -> Result<Workflow, SunaError> {
        let url = self.endpoint(agent_id, &[workflow_id])?;
        let json = self
            .request(Method::PUT, url, Some(serde_json::to_value(request)?))
            .await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn delete_workflow(&self, agent_id: &str, workflow_id: &str) -> Result<(), SunaError> {
        let url = self.endpoint(agent_id, &[workflow_id])?;
        self.request(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn execute_workflow(
        &self,
        agent_id: &str,
        workflow_id: &str,
        request: &ExecuteWorkflowRequest,
    ) -> Result<Value, SunaError> {
        let url = self.endpoint(agent_id, &[workflow_id, "execute"])?;
        self.request(Method::POST, url, Some(serde_json::to_value(request)?))
            .await
    }
}
