//! The input record: a named trail linestring with elevation.
//!
//! The working geometry is 2D (`geo::LineString`); the third dimension is
//! carried as a parallel `elevations` array so planar operations never see
//! it.  Invariant: `elevations.len() == geom.0.len()` whenever the trail has
//! elevation data, else empty.

use geo::{Coord, LineString};

use crate::BBox;

/// One raw trail as delivered by the master store, or a synthetic connector
/// inserted by trail-level bridging.
#[derive(Debug, Clone)]
pub struct Trail {
    /// Stable textual UUID from the source corpus (generated for connectors).
    pub uuid: String,
    pub name: String,
    pub region: String,
    pub source: String,
    pub trail_type: String,
    pub surface: String,
    pub difficulty: String,

    pub length_km: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    pub max_elevation: f64,
    pub min_elevation: f64,
    pub avg_elevation: f64,

    pub bbox: BBox,

    /// 2D working geometry (lng, lat).
    pub geom: LineString<f64>,
    /// Per-coordinate elevations; empty when the source had no 3D data.
    pub elevations: Vec<f64>,

    /// True for synthetic bridging connectors.
    pub connector: bool,
}

impl Trail {
    /// First and last coordinate of the working geometry.
    ///
    /// Callers must have checked [`Trail::has_valid_geometry`] first; an
    /// empty line returns `None`.
    pub fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        let first = self.geom.0.first()?;
        let last = self.geom.0.last()?;
        Some((*first, *last))
    }

    /// Elevation at the first/last coordinate, when elevation data exists.
    pub fn endpoint_elevations(&self) -> (f64, f64) {
        match (self.elevations.first(), self.elevations.last()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => (0.0, 0.0),
        }
    }

    /// Geometry gate applied at ingest: at least two distinct points and all
    /// coordinates finite.  Zero geodesic length is checked separately since
    /// length computation lives above this crate.
    pub fn has_valid_geometry(&self) -> bool {
        let coords = &self.geom.0;
        if coords.len() < 2 {
            return false;
        }
        if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return false;
        }
        // At least two *distinct* points.
        coords.iter().any(|c| *c != coords[0])
    }

    /// Build a synthetic straight connector trail between two endpoints.
    ///
    /// Elevation stats are taken from the two boundary elevations; length is
    /// filled in by the caller (geodesic math lives in `tg-geom`).
    pub fn connector(
        uuid: String,
        region: &str,
        a: Coord<f64>,
        b: Coord<f64>,
        ele_a: f64,
        ele_b: f64,
    ) -> Self {
        let geom = LineString::new(vec![a, b]);
        let mut bbox = BBox::of_point(a);
        bbox.extend(b);
        let rise = ele_b - ele_a;
        Trail {
            uuid,
            name: "connector".to_string(),
            region: region.to_string(),
            source: "bridging".to_string(),
            trail_type: "connector".to_string(),
            surface: String::new(),
            difficulty: String::new(),
            length_km: 0.0,
            elevation_gain: rise.max(0.0),
            elevation_loss: (-rise).max(0.0),
            max_elevation: ele_a.max(ele_b),
            min_elevation: ele_a.min(ele_b),
            avg_elevation: (ele_a + ele_b) * 0.5,
            bbox,
            geom,
            elevations: vec![ele_a, ele_b],
            connector: true,
        }
    }
}
