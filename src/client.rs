//! Typed client for the control manager's client-facing API.

use crate::control::protocol::*;
use crate::storage::protocol::{ENDPOINT_HEALTH, HealthResponse};

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct KvClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl KvClient {
    /// `addr` is `host:port`, optionally prefixed with a scheme.
    pub fn new(addr: &str) -> Self {
        let addr = addr.trim_end_matches('/');
        let base_url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        };
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<R> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("{} failed: {}", endpoint, response.status()));
        }
        Ok(response.json().await?)
    }

    pub async fn put_key(&self, key: &str, value: &str) -> Result<PutKeyRet> {
        let req = PutKeyArg {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.post_json(ENDPOINT_PUT_KEY, &req).await
    }

    pub async fn get_key(&self, key: &str) -> Result<GetKeyRet> {
        let req = GetKeyArg {
            key: key.to_string(),
        };
        self.post_json(ENDPOINT_GET_KEY, &req).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, ENDPOINT_HEALTH))
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }
}
