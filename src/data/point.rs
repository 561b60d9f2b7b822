use crate::core::geo::LatLng;
use crate::data::attributes::AttributeBundle;
use crate::data::geojson::{FeatureDefect, RawFeature};
use serde::{Deserialize, Serialize};

/// Renderable form of one shard record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub position: LatLng,
    /// Code of the shard the point was loaded from
    pub shard: String,
    pub attributes: AttributeBundle,
}

impl RenderPoint {
    pub fn from_feature(feature: &RawFeature, shard: &str) -> Result<Self, FeatureDefect> {
        let position = feature.position()?;
        Ok(Self {
            position,
            shard: shard.to_string(),
            attributes: AttributeBundle::resolve(feature.properties.as_ref()),
        })
    }

    pub fn detail_text(&self) -> String {
        self.attributes.detail_text()
    }
}
