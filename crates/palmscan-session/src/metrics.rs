//! Metrics aggregator
//!
//! Folds a region snapshot into the three figures shown on the dashboard.
//! Pure and cheap enough to run on every render.

use palmscan_core::{Detection, Region};
use serde::Serialize;

/// Square metres per square kilometre
const M2_PER_KM2: f64 = 1e6;

/// Running totals over every region of a session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SessionMetrics {
    /// Sum of region areas in square metres
    pub total_area: f64,
    /// Sum of detections over processed regions
    pub total_count: usize,
    /// `total_count / total_area` per square metre, zero for an empty area
    pub density: f64,
}

impl SessionMetrics {
    /// Aggregate a region snapshot
    pub fn from_regions<D: Detection>(regions: &[Region<D>]) -> Self {
        let (total_area, total_count) = regions
            .iter()
            .fold((0.0, 0usize), |(area, count), region| {
                (area + region.area(), count + region.detection_count())
            });
        Self::from_totals(total_area, total_count)
    }

    /// Build metrics from precomputed totals
    pub fn from_totals(total_area: f64, total_count: usize) -> Self {
        let density = if total_area > 0.0 {
            total_count as f64 / total_area
        } else {
            0.0
        };
        Self {
            total_area,
            total_count,
            density,
        }
    }

    /// Total area in square kilometres
    pub fn area_km2(&self) -> f64 {
        self.total_area / M2_PER_KM2
    }

    /// Detections per square kilometre
    pub fn density_per_km2(&self) -> f64 {
        self.density * M2_PER_KM2
    }
}

impl std::fmt::Display for SessionMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "area {:.2} km², count {}, density {:.2} per km²",
            self.area_km2(),
            self.total_count,
            self.density_per_km2()
        )
    }
}
