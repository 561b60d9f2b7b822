use super::ShardSource;
use crate::data::manifest::ShardDescriptor;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads the manifest and shards from a local directory tree, e.g. the output
/// of the district split script.
pub struct FsSource {
    manifest: PathBuf,
    data_dir: PathBuf,
}

impl FsSource {
    pub fn new(manifest: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Manifest and shards side by side in one directory
    pub fn from_dir(dir: impl AsRef<Path>, manifest_name: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(manifest_name), dir)
    }

    /// Shard file under the data directory. Absolute shard paths are kept as-is.
    pub fn shard_path(&self, shard: &ShardDescriptor) -> PathBuf {
        let relative = shard.source.strip_prefix("./").unwrap_or(&shard.source);
        self.data_dir.join(relative)
    }
}

#[async_trait]
impl ShardSource for FsSource {
    async fn fetch_manifest(&self) -> Result<Vec<u8>> {
        log::debug!("reading manifest {}", self.manifest.display());
        Ok(tokio::fs::read(&self.manifest).await?)
    }

    async fn fetch_shard(&self, shard: &ShardDescriptor) -> Result<Vec<u8>> {
        let path = self.shard_path(shard);
        log::debug!("reading shard {} from {}", shard.code, path.display());
        Ok(tokio::fs::read(&path).await?)
    }

    fn describe(&self) -> String {
        format!("dir {}", self.data_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_reads_split_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("districts_index.json"),
            r#"{"districts": [{"code": "01", "name": "Centro", "filename": "district_01_Centro.geojson"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("district_01_Centro.geojson"),
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();

        let source = FsSource::from_dir(dir.path(), "districts_index.json");
        let manifest = source.fetch_manifest().await.unwrap();
        let catalog = crate::data::manifest::Catalog::from_slice(&manifest).unwrap();

        let body = source.fetch_shard(&catalog.shards()[0]).await.unwrap();
        assert!(!body.is_empty());
    }

    fn descriptor(source: &str) -> ShardDescriptor {
        ShardDescriptor {
            code: "01".into(),
            label: "Centro".into(),
            source: source.into(),
            declared_records: 0,
            size_mb: None,
        }
    }

    #[test]
    fn test_shard_path_joins_data_dir() {
        let source = FsSource::new("/srv/trees/districts_index.json", "/srv/trees");
        assert_eq!(
            source.shard_path(&descriptor("./district_01_Centro.geojson")),
            Path::new("/srv/trees/district_01_Centro.geojson")
        );
        assert_eq!(
            source.shard_path(&descriptor("/mnt/other/a.geojson")),
            Path::new("/mnt/other/a.geojson")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_shard_path_keeps_non_utf8_data_dir() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new(OsStr::from_bytes(b"/srv/\xe1rboles"));
        let source = FsSource::new(dir.join("districts_index.json"), dir);
        let path = source.shard_path(&descriptor("district_01_Centro.geojson"));
        assert_eq!(path, dir.join("district_01_Centro.geojson"));
        assert!(path.starts_with(dir));
    }

    #[tokio::test]
    async fn test_missing_shard_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::from_dir(dir.path(), "districts_index.json");
        let shard = ShardDescriptor {
            code: "09".into(),
            label: "Moncloa".into(),
            source: "missing.geojson".into(),
            declared_records: 0,
            size_mb: None,
        };
        assert!(matches!(source.fetch_shard(&shard).await.unwrap_err(), Error::Io(_)));
    }
}
