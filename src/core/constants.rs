//! Loader-wide constants.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Features handed to the rendering layer per batch. The host gets control back
/// after every full batch, so this bounds the longest synchronous unit of work.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// How long a shard error notification stays on screen.
pub const ERROR_NOTIFICATION_MS: u64 = 5_000;

/// Manifest file produced by the district split script.
pub const DEFAULT_MANIFEST: &str = "data/districts/districts_index.json";

/// Directory the shard filenames in the manifest are relative to.
pub const DEFAULT_DATA_BASE: &str = "data/districts";

/// User-Agent sent with manifest and shard requests.
pub const USER_AGENT: &str = "shardmap/0.1 (+https://github.com/PoHsuanLai/shardmap)";

/// Maximum zoom level accepted from viewport events.
pub const MAX_ZOOM: f64 = 18.0;
