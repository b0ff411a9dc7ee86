//! Overlay styling parameters.
//!
//! Purely cosmetic values threaded from configuration to the overlay layer.
//! Reconciliation never reads them.

use serde::{Deserialize, Serialize};

/// Style applied while a marker is hovered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    pub fill_opacity: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self { fill_opacity: 0.9 }
    }
}

/// Circle marker drawn for every detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    /// Circle radius in metres
    pub radius: f64,
    /// Stroke colour
    pub color: String,
    /// Fill colour
    pub fill_color: String,
    /// Fill opacity, 0.0 to 1.0
    pub fill_opacity: f64,
    /// Stroke width in pixels
    pub weight: f64,
    pub highlight: HighlightStyle,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 4.0,
            color: "#f5d90a".to_string(),
            fill_color: "#f5d90a".to_string(),
            fill_opacity: 0.4,
            weight: 1.0,
            highlight: HighlightStyle::default(),
        }
    }
}
