//! Remote-call handles to workers, established once at startup.

use crate::storage::protocol::*;
use crate::types::WorkerId;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

/// Handle for calling one worker over HTTP.
#[derive(Clone)]
pub struct WorkerClient {
    worker: WorkerId,
    base_url: String,
    http_client: reqwest::Client,
}

impl WorkerClient {
    /// Validates the worker address. Nothing is sent until the first call.
    pub fn connect(worker: WorkerId, addr: &str, http_client: reqwest::Client) -> Result<Self> {
        let addr = addr.trim().trim_end_matches('/');
        let base_url = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        };

        let url = reqwest::Url::parse(&base_url)?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(anyhow::anyhow!("worker address {:?} has no host", addr));
        }

        Ok(Self {
            worker,
            base_url,
            http_client,
        })
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &T,
        timeout: Duration,
    ) -> Result<R> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(payload)
            .timeout(timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "{} answered {} on {}",
                self.worker,
                response.status(),
                endpoint
            ));
        }

        Ok(response.json().await?)
    }

    pub async fn put_key_internal(
        &self,
        req: &PutKeyInternalArg,
        timeout: Duration,
    ) -> Result<PutKeyInternalRet> {
        self.post_json(ENDPOINT_PUT_KEY_INTERNAL, req, timeout).await
    }

    pub async fn get_key_internal(
        &self,
        req: &GetKeyInternalArg,
        timeout: Duration,
    ) -> Result<GetKeyInternalRet> {
        self.post_json(ENDPOINT_GET_KEY_INTERNAL, req, timeout).await
    }
}

/// One optional handle per worker. A worker whose handle could not be
/// established stays `None`; calls routed to it fail later instead of
/// bringing the control manager down.
pub struct WorkerPool {
    clients: HashMap<WorkerId, Option<WorkerClient>>,
}

impl WorkerPool {
    pub fn connect<F>(worker_count: u32, resolve: F) -> Self
    where
        F: Fn(WorkerId) -> Option<String>,
    {
        let http_client = reqwest::Client::new();
        let mut clients = HashMap::new();

        for id in 0..worker_count {
            let worker = WorkerId(id);
            let client = match resolve(worker) {
                Some(addr) => match WorkerClient::connect(worker, &addr, http_client.clone()) {
                    Ok(client) => {
                        tracing::info!("Initialized rpc client for {} at {}", worker, addr);
                        Some(client)
                    }
                    Err(e) => {
                        tracing::error!(
                            "Could not initialize rpc client for {} with error: {}",
                            worker,
                            e
                        );
                        None
                    }
                },
                None => {
                    tracing::error!("No address known for {}", worker);
                    None
                }
            };
            clients.insert(worker, client);
        }

        Self { clients }
    }

    pub fn client(&self, worker: WorkerId) -> Option<&WorkerClient> {
        self.clients.get(&worker).and_then(Option::as_ref)
    }

    pub fn connected_count(&self) -> usize {
        self.clients.values().filter(|client| client.is_some()).count()
    }
}
