//! Gateway client.

use crate::auth::TokenProvider;
use crate::channel::{build_endpoint, ChannelConfig};
use crate::error::{ZeebeError, ZeebeResult};
use crate::generated::gateway_protocol as proto;
use crate::generated::gateway_protocol::gateway_client::GatewayClient;
use crate::job::{ActivatedJob, Deployment, ProcessInstance, Topology};
use async_trait::async_trait;
use core_config::zeebe::ZeebeConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Channel;
use tracing::{debug, info};

/// Latest deployed version when creating instances.
const LATEST_VERSION: i32 = -1;

/// Extra time granted to a long poll on top of its own timeout.
const LONG_POLL_SLACK: Duration = Duration::from_secs(10);

/// Parameters for one ActivateJobs call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateJobs {
    pub job_type: String,
    pub worker: String,
    /// Lease length granted to each activated job
    pub timeout: Duration,
    pub max_jobs: u32,
    /// How long the gateway may hold the call open waiting for jobs
    pub request_timeout: Duration,
    /// Variables to fetch; empty fetches all
    pub fetch_variables: Vec<String>,
}

/// Job commands used by workers and completers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Lease up to `request.max_jobs` jobs of a type.
    async fn activate_jobs(&self, request: ActivateJobs) -> ZeebeResult<Vec<ActivatedJob>>;

    /// Complete a job, optionally merging variables into the process.
    async fn complete_job(&self, job_key: i64, variables: Option<serde_json::Value>) -> ZeebeResult<()>;

    /// Fail a job; with `retries > 0` the engine offers it again.
    async fn fail_job(&self, job_key: i64, retries: i32, error_message: String) -> ZeebeResult<()>;
}

/// Client for the workflow engine gateway.
///
/// Cloning is cheap; clones share the channel and the token cache.
#[derive(Clone)]
pub struct ZeebeClient {
    gateway: GatewayClient<Channel>,
    auth: Option<Arc<TokenProvider>>,
    request_timeout: Duration,
}

impl ZeebeClient {
    /// Build a client whose channel connects on first use.
    pub fn connect_lazy(config: &ZeebeConfig) -> ZeebeResult<Self> {
        Self::connect_lazy_with(config, &ChannelConfig::default())
    }

    pub fn connect_lazy_with(config: &ZeebeConfig, channel: &ChannelConfig) -> ZeebeResult<Self> {
        let channel = build_endpoint(config, channel)?.connect_lazy();
        let auth = match &config.credentials {
            Some(credentials) => Some(Arc::new(TokenProvider::new(credentials.clone())?)),
            None => None,
        };

        info!(
            address = %config.address,
            authenticated = auth.is_some(),
            plaintext = config.plaintext,
            "Gateway client created"
        );

        Ok(Self {
            gateway: GatewayClient::new(channel),
            auth,
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Deadline applied to every command except job activation.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn request<T>(&self, message: T, timeout: Duration) -> ZeebeResult<tonic::Request<T>> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(timeout);
        if let Some(auth) = &self.auth {
            request
                .metadata_mut()
                .insert("authorization", auth.authorization().await?);
        }
        Ok(request)
    }

    /// Request the cluster topology.
    pub async fn topology(&self) -> ZeebeResult<Topology> {
        let request = self.request(proto::TopologyRequest {}, self.request_timeout).await?;
        let response = self
            .gateway
            .clone()
            .topology(request)
            .await
            .map_err(|status| ZeebeError::rpc("Topology", status))?;

        Ok(Topology::from(response.into_inner()))
    }

    /// Deploy a process model read from disk.
    pub async fn deploy_resource_file(&self, path: impl AsRef<Path> + Send) -> ZeebeResult<Deployment> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|source| ZeebeError::Resource {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(path = %path.display(), bytes = content.len(), "Deploying resource");

        self.deploy_resource(name, content).await
    }

    /// Deploy a process model from memory.
    pub async fn deploy_resource(&self, name: String, content: Vec<u8>) -> ZeebeResult<Deployment> {
        let request = self
            .request(
                proto::DeployResourceRequest {
                    resources: vec![proto::Resource { name, content }],
                    tenant_id: String::new(),
                },
                self.request_timeout,
            )
            .await?;

        let response = self
            .gateway
            .clone()
            .deploy_resource(request)
            .await
            .map_err(|status| ZeebeError::rpc("DeployResource", status))?;

        Ok(Deployment::from(response.into_inner()))
    }

    /// Start an instance of the latest version of a process.
    pub async fn create_process_instance_latest(
        &self,
        bpmn_process_id: &str,
        variables: Option<&serde_json::Value>,
    ) -> ZeebeResult<ProcessInstance> {
        let variables = match variables {
            Some(variables) => serde_json::to_string(variables)?,
            None => String::new(),
        };

        let request = self
            .request(
                proto::CreateProcessInstanceRequest {
                    bpmn_process_id: bpmn_process_id.to_string(),
                    version: LATEST_VERSION,
                    variables,
                    ..Default::default()
                },
                self.request_timeout,
            )
            .await?;

        let response = self
            .gateway
            .clone()
            .create_process_instance(request)
            .await
            .map_err(|status| ZeebeError::rpc("CreateProcessInstance", status))?;

        Ok(ProcessInstance::from(response.into_inner()))
    }
}

#[async_trait]
impl JobClient for ZeebeClient {
    async fn activate_jobs(&self, request: ActivateJobs) -> ZeebeResult<Vec<ActivatedJob>> {
        let deadline = request.request_timeout + LONG_POLL_SLACK;
        let message = proto::ActivateJobsRequest {
            r#type: request.job_type,
            worker: request.worker,
            timeout: request.timeout.as_millis() as i64,
            max_jobs_to_activate: i32::try_from(request.max_jobs).unwrap_or(i32::MAX),
            fetch_variable: request.fetch_variables,
            request_timeout: request.request_timeout.as_millis() as i64,
            tenant_ids: Vec::new(),
        };

        let mut stream = self
            .gateway
            .clone()
            .activate_jobs(self.request(message, deadline).await?)
            .await
            .map_err(|status| ZeebeError::rpc("ActivateJobs", status))?
            .into_inner();

        let mut jobs = Vec::new();
        while let Some(response) = stream
            .message()
            .await
            .map_err(|status| ZeebeError::rpc("ActivateJobs", status))?
        {
            jobs.extend(response.jobs.into_iter().map(ActivatedJob::from));
        }

        debug!(count = jobs.len(), "Activated jobs");
        Ok(jobs)
    }

    async fn complete_job(&self, job_key: i64, variables: Option<serde_json::Value>) -> ZeebeResult<()> {
        let variables = match variables {
            Some(variables) => serde_json::to_string(&variables)?,
            None => String::new(),
        };

        let request = self
            .request(proto::CompleteJobRequest { job_key, variables }, self.request_timeout)
            .await?;

        self.gateway
            .clone()
            .complete_job(request)
            .await
            .map_err(|status| ZeebeError::rpc("CompleteJob", status))?;

        Ok(())
    }

    async fn fail_job(&self, job_key: i64, retries: i32, error_message: String) -> ZeebeResult<()> {
        let request = self
            .request(
                proto::FailJobRequest {
                    job_key,
                    retries,
                    error_message,
                    ..Default::default()
                },
                self.request_timeout,
            )
            .await?;

        self.gateway
            .clone()
            .fail_job(request)
            .await
            .map_err(|status| ZeebeError::rpc("FailJob", status))?;

        Ok(())
    }
}
