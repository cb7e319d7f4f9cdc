use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use crate::config::{DEFAULT_IPFS_GATEWAY_URL, DEFAULT_IPFS_UPLOAD_URL};

/// Content-addressed upload capability: store bytes, get back the content
/// identifier.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn add(&self, content: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Reference `ContentStore` over an IPFS node's HTTP API. After upload it
/// probes a public gateway for availability; the probe is best-effort and
/// never fails the upload.
#[derive(Debug, Clone)]
pub struct IpfsNode {
    client: reqwest::Client,
    node_url: String,
    gateway_url: String,
}

impl IpfsNode {
    pub fn new(node_url: Option<String>, gateway_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            node_url: node_url.unwrap_or_else(|| DEFAULT_IPFS_UPLOAD_URL.to_string()),
            gateway_url: gateway_url.unwrap_or_else(|| DEFAULT_IPFS_GATEWAY_URL.to_string()),
        }
    }
}

#[async_trait]
impl ContentStore for IpfsNode {
    async fn add(&self, content: Vec<u8>) -> Result<String> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(content));
        let response = self
            .client
            .post(format!("{}/api/v0/add", self.node_url))
            .multipart(form)
            .send()
            .await
            .context("ipfs add request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("ipfs node returned status {}", response.status()));
        }
        let added: AddResponse = response
            .json()
            .await
            .context("ipfs add response was not json")?;
        debug!("uploaded content as {}", added.hash);

        let gateway_url = format!("{}/ipfs/{}", self.gateway_url, added.hash);
        match self.client.head(&gateway_url).send().await {
            Ok(probe) if probe.status().is_success() => {}
            Ok(probe) => warn!(
                "content not yet available on gateway: status {}",
                probe.status()
            ),
            Err(e) => warn!("gateway availability probe failed: {e}"),
        }

        Ok(added.hash)
    }
}
