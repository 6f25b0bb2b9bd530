//! Layered GeoJSON export.
//!
//! One `FeatureCollection` with a `layer` property per feature; per-layer
//! visibility comes from configuration.  Vertex features are colored by
//! degree class, route features by shape.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use tg_core::config::{GeojsonLayers, RouteShape};
use tg_net::{VertexClass, Workspace};
use tg_route::RouteRecommendation;

use crate::store::geometry_geojson;
use crate::OutputResult;

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeojsonStats {
    pub features: usize,
}

fn degree_color(class: VertexClass) -> &'static str {
    match class {
        VertexClass::Endpoint => "#4caf50",
        VertexClass::Connector => "#2196f3",
        VertexClass::Intersection => "#f44336",
    }
}

fn shape_color(shape: RouteShape) -> &'static str {
    match shape {
        RouteShape::Loop => "#9c27b0",
        RouteShape::OutAndBack => "#ff9800",
        RouteShape::PointToPoint => "#009688",
    }
}

/// Write the layered feature collection to `path`.
pub fn write_geojson(
    path: &Path,
    ws: &Workspace,
    routes: &[RouteRecommendation],
    layers: &GeojsonLayers,
) -> OutputResult<GeojsonStats> {
    let mut features: Vec<Value> = Vec::new();

    if layers.trails {
        for t in &ws.trails {
            features.push(json!({
                "type": "Feature",
                "geometry": geometry_geojson(&t.geom, &t.elevations),
                "properties": {
                    "layer": "trails",
                    "trail_uuid": t.uuid,
                    "name": t.name,
                    "trail_type": t.trail_type,
                    "surface": t.surface,
                    "difficulty": t.difficulty,
                    "length_km": t.length_km,
                    "elevation_gain": t.elevation_gain,
                    "elevation_loss": t.elevation_loss,
                    "connector": t.connector,
                },
            }));
        }
    }

    if layers.edges {
        for e in &ws.edges {
            features.push(json!({
                "type": "Feature",
                "geometry": geometry_geojson(&e.geom, &[]),
                "properties": {
                    "layer": "edges",
                    "id": e.id.0,
                    "source": e.source.0,
                    "target": e.target.0,
                    "trail_uuid": e.trail_uuid,
                    "trail_name": e.trail_name,
                    "length_km": e.length_km,
                    "elevation_gain": e.elevation_gain,
                    "elevation_loss": e.elevation_loss,
                    "connector": e.connector,
                },
            }));
        }
    }

    if layers.trail_vertices {
        for t in &ws.trails {
            let Some((start, end)) = t.endpoints() else { continue };
            for (which, c) in [("start", start), ("end", end)] {
                features.push(json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [c.x, c.y] },
                    "properties": {
                        "layer": "trail_vertices",
                        "trail_uuid": t.uuid,
                        "endpoint": which,
                    },
                }));
            }
        }
    }

    if layers.edge_network_vertices {
        for v in &ws.vertices {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [v.coord.x, v.coord.y, v.elevation],
                },
                "properties": {
                    "layer": "edge_network_vertices",
                    "id": v.id.0,
                    "degree": v.cnt,
                    "node_type": v.class().as_str(),
                    "marker-color": degree_color(v.class()),
                },
            }));
        }
    }

    if layers.routes {
        for r in routes {
            features.push(json!({
                "type": "Feature",
                "geometry": geometry_geojson(&r.geom, &[]),
                "properties": {
                    "layer": "routes",
                    "route_uuid": r.uuid,
                    "name": r.name,
                    "pattern": r.pattern_name,
                    "route_shape": r.shape.as_str(),
                    "distance_km": r.distance_km,
                    "elevation_gain": r.elevation_gain,
                    "route_score": r.score,
                    "stroke": shape_color(r.shape),
                },
            }));
        }
    }

    let stats = GeojsonStats { features: features.len() };
    let collection = json!({ "type": "FeatureCollection", "features": features });

    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), &collection)?;

    log::info!("exported {} GeoJSON features to {}", stats.features, path.display());
    Ok(stats)
}
