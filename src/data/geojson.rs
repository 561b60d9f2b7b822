//! Shard payloads: GeoJSON feature collections as written by the district split.
//!
//! Parsing is deliberately lenient per feature. A collection only fails to parse
//! when its top level is unusable; a single odd feature never takes the whole
//! shard down, it just fails validation later and gets skipped.

use crate::core::geo::LatLng;
use crate::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Why a feature could not become a render point
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureDefect {
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("geometry has no coordinates array")]
    MissingCoordinates,
    #[error("expected a coordinate pair, got {0} elements")]
    WrongArity(usize),
    #[error("coordinates are not numbers")]
    NonNumeric,
    #[error("coordinates out of range: [{lng}, {lat}]")]
    OutOfRange { lng: f64, lat: f64 },
}

/// One record of a shard, as received
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct RawFeature {
    pub geometry: Option<Value>,
    pub properties: Option<Map<String, Value>>,
}

impl From<Value> for RawFeature {
    fn from(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };

        let geometry = object.remove("geometry").filter(|g| !g.is_null());
        let properties = match object.remove("properties") {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        };

        Self {
            geometry,
            properties,
        }
    }
}

impl RawFeature {
    pub fn new(geometry: Option<Value>, properties: Option<Map<String, Value>>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Validated position of the feature.
    ///
    /// The geometry must carry `coordinates` as exactly two finite numbers in
    /// GeoJSON `[lng, lat]` order, inside the WGS84 ranges.
    pub fn position(&self) -> std::result::Result<LatLng, FeatureDefect> {
        let geometry = self.geometry.as_ref().ok_or(FeatureDefect::MissingGeometry)?;
        let coordinates = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .ok_or(FeatureDefect::MissingCoordinates)?;

        if coordinates.len() != 2 {
            return Err(FeatureDefect::WrongArity(coordinates.len()));
        }

        let lng = coordinates[0].as_f64().ok_or(FeatureDefect::NonNumeric)?;
        let lat = coordinates[1].as_f64().ok_or(FeatureDefect::NonNumeric)?;

        let position = LatLng::from_lng_lat([lng, lat]);
        if !position.is_valid() {
            return Err(FeatureDefect::OutOfRange { lng, lat });
        }
        Ok(position)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }
}

/// Collection-level metadata the split script stamps on every shard
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectionProperties {
    pub district_code: Option<String>,
    pub district_name: Option<String>,
    pub tree_count: Option<u64>,
}

/// Root of a shard file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<RawFeature>,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: Option<CollectionProperties>,
}

fn lenient_properties<'de, D>(deserializer: D) -> std::result::Result<Option<CollectionProperties>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl FeatureCollection {
    pub fn new(features: Vec<RawFeature>) -> Self {
        Self {
            features,
            properties: None,
        }
    }

    /// Parse a shard body
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
