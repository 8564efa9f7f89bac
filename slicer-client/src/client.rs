use std::env;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use slicer_core::error::{Result, SlicerError};

use crate::types::{CreateNodeRequest, CreateNodeResponse, LogsResponse, VmRecord};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Client for the Slicer orchestrator REST API.
#[derive(Debug, Clone)]
pub struct SlicerClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl SlicerClient {
    pub fn new(base_url: &str, token: Option<String>, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SlicerError::Api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build a client from `SLICER_URL` (default `http://127.0.0.1:8080`)
    /// and `SLICER_TOKEN` (optional).
    pub fn from_env(user_agent: &str) -> Result<Self> {
        let base_url =
            env::var("SLICER_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = env::var("SLICER_TOKEN").ok().filter(|t| !t.is_empty());
        Self::new(&base_url, token, user_agent)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(&self, response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SlicerError::Api(format!(
            "failed to {}: {} - {}",
            action, status, body
        )))
    }

    /// Create a node in a host group. The orchestrator picks the hostname
    /// and IP; the userdata script runs on first boot.
    pub async fn create_node(
        &self,
        host_group: &str,
        request: &CreateNodeRequest,
    ) -> Result<CreateNodeResponse> {
        let url = format!("{}/api/host-groups/{}/nodes", self.base_url, host_group);
        debug!(host_group, url = %url, "creating node");

        let response = self
            .authorize(self.http.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to reach orchestrator: {}", e)))?;

        let response = self.check(response, "create node").await?;
        response
            .json()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to parse create response: {}", e)))
    }

    /// List all nodes in a host group, running or booting.
    pub async fn host_group_nodes(&self, host_group: &str) -> Result<Vec<VmRecord>> {
        let url = format!("{}/api/host-groups/{}/nodes", self.base_url, host_group);
        debug!(host_group, url = %url, "listing nodes");

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to reach orchestrator: {}", e)))?;

        let response = self.check(response, "list nodes").await?;
        response
            .json()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to parse node list: {}", e)))
    }

    /// Delete a VM by hostname.
    pub async fn delete_vm(&self, host_group: &str, hostname: &str) -> Result<()> {
        let url = format!(
            "{}/api/host-groups/{}/nodes/{}",
            self.base_url, host_group, hostname
        );
        debug!(host_group, hostname, "deleting VM");

        let response = self
            .authorize(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to reach orchestrator: {}", e)))?;

        self.check(response, "delete VM").await?;
        Ok(())
    }

    /// Fetch the last `lines` lines of a VM's serial console log.
    pub async fn vm_logs(&self, hostname: &str, lines: u32) -> Result<String> {
        let url = format!("{}/api/vms/{}/logs", self.base_url, hostname);
        debug!(hostname, lines, "fetching VM logs");

        let response = self
            .authorize(self.http.get(&url))
            .query(&[("lines", lines)])
            .send()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to reach orchestrator: {}", e)))?;

        let response = self.check(response, "fetch logs").await?;
        let logs: LogsResponse = response
            .json()
            .await
            .map_err(|e| SlicerError::Api(format!("failed to parse log response: {}", e)))?;
        Ok(logs.content)
    }
}
