pub mod attributes;
pub mod geojson;
pub mod manifest;
pub mod point;
