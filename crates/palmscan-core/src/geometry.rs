//! Drawing payloads and normalised region geometry.
//!
//! The rendering surface reports every user-drawn shape as a GeoJSON value.
//! [`Drawing`] keeps that payload untouched and uses it as the identity key of
//! a region; [`RegionGeometry`] is the normalised polygon derived from it,
//! used for area computation and as inference input.

use crate::error::GeometryError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Mean equatorial radius of the WGS84 ellipsoid, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Raw drawing payload as emitted by the map drawing tool.
///
/// Equality is structural JSON equality, which is what the reconciler relies
/// on to recognise a drawing it has already processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Drawing(Value);

impl Drawing {
    /// Wrap a raw payload
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    /// Build a rectangle drawing the way the map drawing tool emits it
    pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self(json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [min_lon, min_lat],
                    [min_lon, max_lat],
                    [max_lon, max_lat],
                    [max_lon, min_lat],
                    [min_lon, min_lat],
                ]],
            },
        }))
    }

    /// Borrow the raw payload
    pub fn payload(&self) -> &Value {
        &self.0
    }

}

impl From<Value> for Drawing {
    fn from(payload: Value) -> Self {
        Self(payload)
    }
}

/// A longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Create a new point
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    fn validate(self) -> Result<Self, GeometryError> {
        let in_range = self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat);
        if in_range {
            Ok(self)
        } else {
            Err(GeometryError::CoordinateOutOfRange {
                lon: self.lon,
                lat: self.lat,
            })
        }
    }

    fn from_position(position: &Value) -> Result<Self, GeometryError> {
        let pair = position.as_array().ok_or_else(|| GeometryError::Malformed {
            reason: "position is not an array".to_string(),
        })?;
        match (
            pair.first().and_then(Value::as_f64),
            pair.get(1).and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => Self::new(lon, lat).validate(),
            _ => Err(GeometryError::Malformed {
                reason: "position needs numeric longitude and latitude".to_string(),
            }),
        }
    }
}

/// Axis-aligned bounds in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn from_points(points: &[GeoPoint]) -> Self {
        let mut bounds = Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for p in points {
            bounds.min_lon = bounds.min_lon.min(p.lon);
            bounds.min_lat = bounds.min_lat.min(p.lat);
            bounds.max_lon = bounds.max_lon.max(p.lon);
            bounds.max_lat = bounds.max_lat.max(p.lat);
        }
        bounds
    }

    /// Centre of the bounds
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Normalised polygon derived from a drawing.
///
/// The exterior ring is stored open (no repeated closing vertex). Holes are
/// ignored: drawn regions are simple shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGeometry {
    exterior: Vec<GeoPoint>,
    bounds: BoundingBox,
}

impl RegionGeometry {
    /// Normalise a drawing into a polygon.
    ///
    /// Accepts a GeoJSON `Feature` wrapping a `Polygon`, or a bare `Polygon`.
    pub fn from_drawing(drawing: &Drawing) -> Result<Self, GeometryError> {
        let geometry = Self::geometry_object(drawing.payload())?;

        let geometry_type = geometry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if geometry_type != "Polygon" {
            return Err(GeometryError::UnsupportedType {
                geometry_type: geometry_type.to_string(),
            });
        }

        let ring = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .and_then(|rings| rings.first())
            .and_then(Value::as_array)
            .ok_or_else(|| GeometryError::Malformed {
                reason: "polygon has no exterior ring".to_string(),
            })?;

        let points = ring
            .iter()
            .map(GeoPoint::from_position)
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_ring(points)
    }

    /// Build a geometry from an exterior ring, open or closed
    pub fn from_ring(mut points: Vec<GeoPoint>) -> Result<Self, GeometryError> {
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points.dedup();

        if points.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                count: points.len(),
            });
        }

        let bounds = BoundingBox::from_points(&points);
        Ok(Self {
            exterior: points,
            bounds,
        })
    }

    fn geometry_object(payload: &Value) -> Result<&Value, GeometryError> {
        if !payload.is_object() {
            return Err(GeometryError::Malformed {
                reason: "payload is not an object".to_string(),
            });
        }
        match payload.get("type").and_then(Value::as_str) {
            Some("Feature") => payload
                .get("geometry")
                .filter(|g| g.is_object())
                .ok_or_else(|| GeometryError::Malformed {
                    reason: "feature has no geometry".to_string(),
                }),
            Some(_) => Ok(payload),
            None => Err(GeometryError::Malformed {
                reason: "missing `type` member".to_string(),
            }),
        }
    }

    /// Exterior ring without the closing vertex
    pub fn exterior(&self) -> &[GeoPoint] {
        &self.exterior
    }

    /// Bounding box of the exterior ring
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Surface area in square metres on a spherical earth.
    ///
    /// Uses the ring-area formula `R²/2 · |Σ (λ[i+1] − λ[i−1]) · sin φ[i]|`.
    pub fn area_m2(&self) -> f64 {
        let n = self.exterior.len();
        let mut sum = 0.0;
        for i in 0..n {
            let prev = self.exterior[(i + n - 1) % n];
            let here = self.exterior[i];
            let next = self.exterior[(i + 1) % n];
            sum += (next.lon.to_radians() - prev.lon.to_radians()) * here.lat.to_radians().sin();
        }
        (sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
    }

    /// Render as a closed GeoJSON `Polygon`
    pub fn to_geojson(&self) -> Value {
        let mut ring: Vec<[f64; 2]> = self.exterior.iter().map(|p| [p.lon, p.lat]).collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        json!({ "type": "Polygon", "coordinates": [ring] })
    }
}
