//! Detection records returned by an inference pipeline.
//!
//! The session never looks inside a detection beyond its geometry and its
//! attribute bag, so alternative pipelines can plug in their own record type
//! by implementing [`Detection`].

use crate::geometry::GeoPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Location of a single detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum DetectionGeometry {
    /// A single point, e.g. a tree crown centre
    Point(GeoPoint),
    /// An outline, e.g. a crown footprint
    Polygon(Vec<GeoPoint>),
}

impl DetectionGeometry {
    /// Render as a GeoJSON geometry object
    pub fn to_geojson(&self) -> Value {
        match self {
            DetectionGeometry::Point(p) => {
                serde_json::json!({ "type": "Point", "coordinates": [p.lon, p.lat] })
            }
            DetectionGeometry::Polygon(ring) => {
                let mut coords: Vec<[f64; 2]> = ring.iter().map(|p| [p.lon, p.lat]).collect();
                if let Some(first) = coords.first().copied() {
                    coords.push(first);
                }
                serde_json::json!({ "type": "Polygon", "coordinates": [coords] })
            }
        }
    }
}

/// Capability set every detection record exposes to the session
pub trait Detection: Clone + std::fmt::Debug {
    /// Where the object was detected
    fn geometry(&self) -> &DetectionGeometry;

    /// Opaque per-detection attributes (label, score, model metadata, ...)
    fn attributes(&self) -> &Map<String, Value>;

    /// Class label, if the pipeline reports one
    fn label(&self) -> Option<&str> {
        self.attributes().get("label").and_then(Value::as_str)
    }

    /// Confidence score, if the pipeline reports one
    fn score(&self) -> Option<f64> {
        self.attributes().get("score").and_then(Value::as_f64)
    }
}

/// Default detection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub geometry: DetectionGeometry,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl DetectionRecord {
    /// Create a point detection with no attributes
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            geometry: DetectionGeometry::Point(GeoPoint::new(lon, lat)),
            attributes: Map::new(),
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.attributes
            .insert("label".to_string(), Value::String(label.into()));
        self
    }

    /// Attach a confidence score
    pub fn with_score(mut self, score: f64) -> Self {
        self.attributes.insert("score".to_string(), Value::from(score));
        self
    }
}

impl Detection for DetectionRecord {
    fn geometry(&self) -> &DetectionGeometry {
        &self.geometry
    }

    fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}
