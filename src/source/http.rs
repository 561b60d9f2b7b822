use super::{resolve_location, ShardSource};
use crate::core::config::LoaderConfig;
use crate::core::constants::USER_AGENT;
use crate::data::manifest::ShardDescriptor;
use crate::{Error, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

/// Shared HTTP client with the crate's User-Agent. Building the client once
/// avoids the cost of TLS and connection pool setup for every shard.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build reqwest client")
});

/// Fetches the manifest and shards over HTTP(S).
///
/// There is no timeout or retry here: a hung shard request only stalls that
/// shard, and a failed one is retried by the next load cycle.
pub struct HttpSource {
    client: Client,
    manifest_url: String,
    data_base: String,
}

impl HttpSource {
    pub fn new(manifest_url: impl Into<String>, data_base: impl Into<String>) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            manifest_url: manifest_url.into(),
            data_base: data_base.into(),
        }
    }

    /// Build a source with its own client when the config overrides the User-Agent
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let client = if config.user_agent == USER_AGENT {
            HTTP_CLIENT.clone()
        } else {
            Client::builder().user_agent(config.user_agent.as_str()).build()?
        };

        Ok(Self {
            client,
            manifest_url: config.manifest.clone(),
            data_base: config.data_base.clone(),
        })
    }

    pub fn shard_url(&self, shard: &ShardDescriptor) -> String {
        resolve_location(&self.data_base, &shard.source)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        log::debug!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ShardSource for HttpSource {
    async fn fetch_manifest(&self) -> Result<Vec<u8>> {
        self.get(&self.manifest_url).await
    }

    async fn fetch_shard(&self, shard: &ShardDescriptor) -> Result<Vec<u8>> {
        let url = self.shard_url(shard);
        self.get(&url).await
    }

    fn describe(&self) -> String {
        format!("http {}", self.manifest_url)
    }
}
