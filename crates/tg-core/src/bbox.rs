//! WGS84 axis-aligned bounding boxes.
//!
//! Serialised as a 4-element array `[min_lng, min_lat, max_lng, max_lat]` so
//! region presets in `regions.yaml` stay compact.

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Axis-aligned envelope in WGS84 longitude/latitude.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self { min_lng, min_lat, max_lng, max_lat }
    }

    /// Parse the CLI form `"minLng,minLat,maxLng,maxLat"`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| CoreError::InvalidBbox(s.to_string()))?;
        if parts.len() != 4 {
            return Err(CoreError::InvalidBbox(s.to_string()));
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }

    /// The degenerate envelope of a single point; grow with [`BBox::extend`].
    pub fn of_point(c: Coord<f64>) -> Self {
        Self { min_lng: c.x, min_lat: c.y, max_lng: c.x, max_lat: c.y }
    }

    /// Tight envelope of a linestring.  Returns `None` for an empty line.
    pub fn of_linestring(line: &LineString<f64>) -> Option<Self> {
        let mut coords = line.coords();
        let mut bbox = Self::of_point(*coords.next()?);
        for c in coords {
            bbox.extend(*c);
        }
        Some(bbox)
    }

    pub fn extend(&mut self, c: Coord<f64>) {
        self.min_lng = self.min_lng.min(c.x);
        self.min_lat = self.min_lat.min(c.y);
        self.max_lng = self.max_lng.max(c.x);
        self.max_lat = self.max_lat.max(c.y);
    }

    #[inline]
    pub fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min_lng && c.x <= self.max_lng && c.y >= self.min_lat && c.y <= self.max_lat
    }

    #[inline]
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Sanity gate for user-supplied envelopes: ordered corners inside the
    /// WGS84 domain.  Skipped with `--skip-bbox-validation`.
    pub fn is_valid(&self) -> bool {
        self.min_lng < self.max_lng
            && self.min_lat < self.max_lat
            && self.min_lng >= -180.0
            && self.max_lng <= 180.0
            && self.min_lat >= -90.0
            && self.max_lat <= 90.0
    }
}

impl From<[f64; 4]> for BBox {
    fn from(a: [f64; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.min_lng, b.min_lat, b.max_lng, b.max_lat]
    }
}

impl std::fmt::Display for BBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}
