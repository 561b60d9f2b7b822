//! Attribute resolution for heterogeneous shard sources.
//!
//! Different exports of the dataset name the same field differently: the
//! optimized files use short keys (`sn`, `d`), the intermediate ones English
//! keys, the raw municipal export long Spanish keys. Each logical attribute
//! probes its candidates in a fixed order and takes the first usable value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Species,
    CommonName,
    Diameter,
    Height,
    District,
    Neighborhood,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Species,
        Attribute::CommonName,
        Attribute::Diameter,
        Attribute::Height,
        Attribute::District,
        Attribute::Neighborhood,
    ];

    /// Source keys in priority order
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Attribute::Species => &["sn", "species", "NOMBRE_CIENTIFICO"],
            Attribute::CommonName => &["cn", "common_name", "NOMBRE_COMUN"],
            Attribute::Diameter => &["d", "diameter", "DIAMETRO"],
            Attribute::Height => &["h", "height", "ALTURA"],
            Attribute::District => &["dt", "district", "NBRE_DTO"],
            Attribute::Neighborhood => &["nb", "neighborhood", "NBRE_BARRI"],
        }
    }

    /// Value used when no candidate key holds a usable value
    pub fn default_value(self) -> &'static str {
        match self {
            Attribute::Species => "unknown species",
            Attribute::CommonName => "",
            Attribute::Diameter | Attribute::Height => "N/A",
            Attribute::District | Attribute::Neighborhood => "unknown",
        }
    }

    /// First usable value among the candidates
    pub fn resolve(self, properties: Option<&Map<String, Value>>) -> Option<String> {
        let properties = properties?;
        self.candidates()
            .iter()
            .filter_map(|key| properties.get(*key))
            .find_map(display_value)
    }
}

/// Strings are trimmed and must be non-empty; numbers and booleans are
/// rendered as text. Nulls, arrays and objects count as absent.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Resolved, display-ready attributes of one render point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBundle {
    pub species: String,
    pub common_name: String,
    pub diameter: String,
    pub height: String,
    pub district: String,
    pub neighborhood: String,
}

impl Default for AttributeBundle {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl AttributeBundle {
    pub fn resolve(properties: Option<&Map<String, Value>>) -> Self {
        let get = |attribute: Attribute| {
            attribute
                .resolve(properties)
                .unwrap_or_else(|| attribute.default_value().to_string())
        };

        Self {
            species: get(Attribute::Species),
            common_name: get(Attribute::CommonName),
            diameter: get(Attribute::Diameter),
            height: get(Attribute::Height),
            district: get(Attribute::District),
            neighborhood: get(Attribute::Neighborhood),
        }
    }

    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Species => &self.species,
            Attribute::CommonName => &self.common_name,
            Attribute::Diameter => &self.diameter,
            Attribute::Height => &self.height,
            Attribute::District => &self.district,
            Attribute::Neighborhood => &self.neighborhood,
        }
    }

    pub fn is_default(&self, attribute: Attribute) -> bool {
        self.get(attribute) == attribute.default_value()
    }

    /// Popup text shown when the marker is clicked
    pub fn detail_text(&self) -> String {
        let mut lines = Vec::with_capacity(5);

        if self.common_name.is_empty() {
            lines.push(self.species.clone());
        } else {
            lines.push(format!("{} ({})", self.species, self.common_name));
        }

        lines.push(format!("Diameter: {}", self.with_unit(Attribute::Diameter, "cm")));
        lines.push(format!("Height: {}", self.with_unit(Attribute::Height, "m")));
        lines.push(format!("District: {}", self.district));
        lines.push(format!("Neighborhood: {}", self.neighborhood));

        lines.join("\n")
    }

    fn with_unit(&self, attribute: Attribute, unit: &str) -> String {
        let value = self.get(attribute);
        if self.is_default(attribute) {
            value.to_string()
        } else {
            format!("{value} {unit}")
        }
    }
}
