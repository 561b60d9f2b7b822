use super::ShardSource;
use crate::data::manifest::ShardDescriptor;
use crate::{Error, Result};
use async_trait::async_trait;
use fxhash::FxHashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Response {
    Body(Vec<u8>),
    Status(u16),
}

const MANIFEST_KEY: &str = "<manifest>";

/// In-memory source for embedding prepared data and for tests.
///
/// Responses are keyed by shard filename. Unknown filenames answer 404, and
/// every fetch is counted so callers can check what hit the "network".
#[derive(Debug, Default)]
pub struct MemorySource {
    responses: Mutex<FxHashMap<String, Response>>,
    requests: Mutex<FxHashMap<String, usize>>,
}

impl MemorySource {
    pub fn new(manifest: impl Into<Vec<u8>>) -> Self {
        let source = Self::default();
        source.set(MANIFEST_KEY, Response::Body(manifest.into()));
        source
    }

    pub fn with_shard(self, filename: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_shard(filename, body);
        self
    }

    /// Answer requests for `filename` with an HTTP error status
    pub fn with_status(self, filename: &str, status: u16) -> Self {
        self.set(filename, Response::Status(status));
        self
    }

    /// Replace a shard body, e.g. to heal a previously failing shard
    pub fn set_shard(&self, filename: &str, body: impl Into<Vec<u8>>) {
        self.set(filename, Response::Body(body.into()));
    }

    pub fn set_manifest_status(&self, status: u16) {
        self.set(MANIFEST_KEY, Response::Status(status));
    }

    /// How many times `filename` was fetched
    pub fn request_count(&self, filename: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.get(filename).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn manifest_requests(&self) -> usize {
        self.request_count(MANIFEST_KEY)
    }

    /// Shard fetches across all filenames
    pub fn shard_requests(&self) -> usize {
        self.requests
            .lock()
            .map(|r| {
                r.iter()
                    .filter(|(key, _)| key.as_str() != MANIFEST_KEY)
                    .map(|(_, count)| count)
                    .sum::<usize>()
            })
            .unwrap_or(0)
    }

    fn set(&self, key: &str, response: Response) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(key.to_string(), response);
        }
    }

    fn respond(&self, key: &str) -> Result<Vec<u8>> {
        if let Ok(mut requests) = self.requests.lock() {
            *requests.entry(key.to_string()).or_insert(0) += 1;
        }

        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|r| r.get(key).cloned())
            .unwrap_or(Response::Status(404));

        match response {
            Response::Body(body) => Ok(body),
            Response::Status(status) => Err(Error::Http {
                status,
                url: format!("memory://{key}"),
            }),
        }
    }
}

#[async_trait]
impl ShardSource for MemorySource {
    async fn fetch_manifest(&self) -> Result<Vec<u8>> {
        self.respond(MANIFEST_KEY)
    }

    async fn fetch_shard(&self, shard: &ShardDescriptor) -> Result<Vec<u8>> {
        self.respond(&shard.source)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
