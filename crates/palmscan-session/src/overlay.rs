//! Results overlay
//!
//! Builds the prediction layer handed to the map surface: one GeoJSON feature
//! per detection, carrying the configured marker style and the region it
//! belongs to. Regions without predictions contribute nothing.

use palmscan_core::{Detection, MarkerStyle, Region};
use serde_json::{json, Map, Value};

/// A named layer of prediction markers
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub name: String,
    pub features: Vec<Value>,
}

impl OverlayLayer {
    /// Build the layer for a region snapshot
    pub fn build<D: Detection>(name: &str, regions: &[Region<D>], style: &MarkerStyle) -> Self {
        let style_props = json!({
            "radius": style.radius,
            "color": style.color,
            "fill_color": style.fill_color,
            "fill_opacity": style.fill_opacity,
            "weight": style.weight,
            "highlight": { "fill_opacity": style.highlight.fill_opacity },
        });

        let features = regions
            .iter()
            .filter_map(|region| region.predictions().map(|p| (region, p.as_slice())))
            .flat_map(|(region, detections)| {
                let style_props = &style_props;
                detections.iter().map(move |det| {
                    let mut properties = Map::new();
                    properties.insert("region_id".to_string(), json!(region.id()));
                    properties.insert("drawn_at".to_string(), json!(region.created_at()));
                    if let Some(label) = det.label() {
                        properties.insert("label".to_string(), json!(label));
                    }
                    if let Some(score) = det.score() {
                        properties.insert("score".to_string(), json!(score));
                    }
                    properties.insert("style".to_string(), style_props.clone());
                    json!({
                        "type": "Feature",
                        "geometry": det.geometry().to_geojson(),
                        "properties": properties,
                    })
                })
            })
            .collect();

        Self {
            name: name.to_string(),
            features,
        }
    }

    /// Number of markers in the layer
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the layer has no markers
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Render as a GeoJSON `FeatureCollection`
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "name": self.name,
            "features": self.features,
        })
    }
}
