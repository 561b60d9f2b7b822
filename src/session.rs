//! Loader session and its builder
//!
//! A session owns the catalog, the load state and the collaborators for one
//! page view. It is built once the catalog has loaded; a catalog failure is
//! reported as a blocking error and no session is created.

use crate::core::config::{LoaderConfig, LoadingProfile};
use crate::core::viewport::Viewport;
use crate::data::manifest::Catalog;
use crate::layers::cluster::ClusterLayer;
use crate::loading::catalog::load_catalog;
use crate::loading::coordinator::{AllShards, Coordinator, CycleOutcome, RelevancePolicy};
use crate::loading::reactor::ViewportReactor;
use crate::loading::state::Progress;
use crate::runtime::{EventLoopScheduler, HostScheduler};
use crate::source::{http::HttpSource, ShardSource};
use crate::traits::{PointSink, StatusSink};
use crate::ui::reporter::{LogStatus, Reporter};
use crate::Result;
use std::sync::Arc;

/// Builder for creating and configuring loader sessions
pub struct SessionBuilder {
    config: LoaderConfig,
    source: Option<Arc<dyn ShardSource>>,
    sink: Option<Arc<dyn PointSink>>,
    status: Option<Arc<dyn StatusSink>>,
    scheduler: Option<Arc<dyn HostScheduler>>,
    policy: Option<Box<dyn RelevancePolicy>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
            source: None,
            sink: None,
            status: None,
            scheduler: None,
            policy: None,
        }
    }

    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the loading profile.
    ///
    /// Presets only change the batch size of the current config. `Custom`
    /// replaces the whole config.
    pub fn with_profile(mut self, profile: LoadingProfile) -> Self {
        match profile {
            LoadingProfile::Custom(config) => self.config = config,
            preset => self.config.batch_size = preset.resolve().batch_size,
        }
        self
    }

    /// Set where the manifest and shards come from. Defaults to HTTP.
    pub fn with_source(mut self, source: Arc<dyn ShardSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the rendering layer that receives point batches
    pub fn with_sink(mut self, sink: Arc<dyn PointSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn HostScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn RelevancePolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Load the catalog and build the session.
    ///
    /// Configuration and catalog errors are shown as a blocking error on the
    /// status sink before being returned.
    pub async fn start(self) -> Result<LoaderSession> {
        let status = self.status.unwrap_or_else(|| Arc::new(LogStatus));
        let reporter = Arc::new(Reporter::new(status, self.config.error_display()));

        if let Err(e) = self.config.validate() {
            reporter.fatal(&e);
            return Err(e);
        }

        let source = match self.source {
            Some(source) => source,
            None => match HttpSource::from_config(&self.config) {
                Ok(source) => Arc::new(source),
                Err(e) => {
                    reporter.fatal(&e);
                    return Err(e);
                }
            },
        };

        let catalog = match load_catalog(source.as_ref()).await {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                reporter.fatal(&e);
                return Err(e);
            }
        };

        let coordinator = Coordinator::new(
            catalog.clone(),
            source,
            self.sink
                .unwrap_or_else(|| Arc::new(ClusterLayer::default())),
            reporter.clone(),
            self.scheduler
                .unwrap_or_else(|| Arc::new(EventLoopScheduler)),
            self.policy.unwrap_or_else(|| Box::new(AllShards)),
            self.config.batch_size,
        );

        Ok(LoaderSession {
            config: self.config,
            catalog,
            coordinator: Arc::new(coordinator),
            reporter,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LoaderSession {
    config: LoaderConfig,
    catalog: Arc<Catalog>,
    coordinator: Arc<Coordinator>,
    reporter: Arc<Reporter>,
}

impl LoaderSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Start a session over HTTP with the given configuration
    pub async fn from_config(config: LoaderConfig) -> Result<Self> {
        SessionBuilder::new().with_config(config).start().await
    }

    /// Run one load cycle for the given view. `None` loads everything relevant
    /// without a viewport, as on startup.
    pub async fn load_visible(&self, viewport: Option<&Viewport>) -> CycleOutcome {
        self.coordinator.run_cycle(viewport).await
    }

    /// Reactor that turns viewport events into load cycles for this session
    pub fn reactor(&self) -> ViewportReactor {
        ViewportReactor::new(self.coordinator.clone())
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn progress(&self) -> Progress {
        self.coordinator.state().with(|s| s.progress())
    }

    pub fn resident_codes(&self) -> Vec<String> {
        self.coordinator
            .state()
            .with(|s| s.resident_codes().to_vec())
    }

    pub fn is_resident(&self, code: &str) -> bool {
        self.coordinator.state().is_resident(code)
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.state().is_loading()
    }

    /// Render points handed to the rendering layer so far
    pub fn points_loaded(&self) -> usize {
        self.coordinator.state().with(|s| s.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemorySource;
    use crate::Error;

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_fetching() {
        let source = Arc::new(MemorySource::new("{}"));
        let result = SessionBuilder::new()
            .with_config(LoaderConfig::default().with_batch_size(0))
            .with_source(source.clone())
            .start()
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(source.manifest_requests(), 0);
    }

    #[test]
    fn test_custom_profile_replaces_config() {
        let custom = LoaderConfig {
            error_display_ms: 1_500,
            user_agent: "trees-viewer/2".into(),
            ..LoaderConfig::default()
                .with_manifest("https://example.org/idx.json")
                .with_data_base("https://example.org/shards")
                .with_batch_size(64)
        };
        let builder = SessionBuilder::new()
            .with_config(LoaderConfig::default().with_manifest("local.json"))
            .with_profile(LoadingProfile::Custom(custom.clone()));
        assert_eq!(builder.config, custom);

        let preset = SessionBuilder::new()
            .with_config(LoaderConfig::default().with_manifest("local.json"))
            .with_profile(LoadingProfile::Throughput);
        assert_eq!(preset.config.manifest, "local.json");
        assert_eq!(preset.config.batch_size, 2_000);
    }

    #[tokio::test]
    async fn test_profile_sets_batch_size() {
        let source = Arc::new(MemorySource::new(r#"{"districts": []}"#));
        let session = SessionBuilder::new()
            .with_profile(LoadingProfile::Responsive)
            .with_source(source)
            .start()
            .await
            .unwrap();
        assert_eq!(session.config().batch_size, 200);
        assert_eq!(session.catalog().shard_count(), 0);

        let outcome = session.load_visible(None).await;
        assert!(outcome.report().unwrap().loaded.is_empty());
        assert!(!session.is_loading());
    }
}
