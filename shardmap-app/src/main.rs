use anyhow::Context;
use clap::Parser;
use shardmap::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
/// Shardmap - load a sharded point dataset the way the map viewer does
struct Settings {
    /// Manifest URL or path (districts_index.json)
    #[clap(long)]
    manifest: Option<String>,

    /// URL or directory the shard filenames are relative to
    #[clap(long)]
    data: Option<String>,

    /// Features per batch handed to the layer
    #[clap(long)]
    batch_size: Option<usize>,

    /// JSON loader configuration; flags override its values
    #[clap(long)]
    config: Option<PathBuf>,

    /// After the initial load, read `lat lng zoom` lines from stdin as viewport changes
    #[clap(long)]
    watch: bool,
}

impl Settings {
    fn loader_config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                LoaderConfig::from_json_str(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => LoaderConfig::default(),
        };

        if let Some(manifest) = &self.manifest {
            config.manifest = manifest.clone();
            if self.data.is_none() && !is_remote(manifest) {
                if let Some(dir) = Path::new(manifest).parent() {
                    config.data_base = dir.to_string_lossy().into_owned();
                }
            }
        }
        if let Some(data) = &self.data {
            config.data_base = data.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn source_for(config: &LoaderConfig) -> anyhow::Result<Arc<dyn ShardSource>> {
    if is_remote(&config.manifest) {
        Ok(Arc::new(HttpSource::from_config(config)?))
    } else {
        Ok(Arc::new(FsSource::new(&config.manifest, &config.data_base)))
    }
}

/// Parse a `lat lng zoom` command
fn parse_viewport(line: &str) -> Option<Viewport> {
    let mut parts = line.split_whitespace().map(str::parse::<f64>);
    let lat = parts.next()?.ok()?;
    let lng = parts.next()?.ok()?;
    let zoom = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    let center = LatLng::new(lat, lng);
    center.is_valid().then(|| Viewport::new(center, zoom))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    shardmap::init_logging();
    let settings = Settings::parse();
    let config = settings.loader_config()?;

    let layer = Arc::new(ClusterLayer::default());
    let session = SessionBuilder::new()
        .with_source(source_for(&config)?)
        .with_config(config)
        .with_sink(layer.clone())
        .with_status(Arc::new(LogStatus))
        .start()
        .await
        .context("starting loader session")?;

    log::info!(
        "{} shards, {} records declared",
        session.catalog().shard_count(),
        session.catalog().total_records()
    );

    if let Some(report) = session.load_visible(None).await.report() {
        for failure in &report.failed {
            log::warn!("shard {} not loaded: {}", failure.code, failure.error);
        }
    }

    if settings.watch {
        let (notifier, events) = viewport_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_viewport(&line) {
                    Some(viewport) => {
                        if !notifier.moved(viewport) {
                            break;
                        }
                    }
                    None => log::warn!("expected `lat lng zoom`, got {:?}", line),
                }
            }
        });
        let handled = session.reactor().run(events).await;
        log::info!("{} viewport changes handled", handled);
    }

    println!(
        "{} points in layer '{}', shards loaded {}",
        layer.len(),
        layer.id(),
        session.progress()
    );
    Ok(())
}
