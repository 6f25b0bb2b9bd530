//! Integration tests for tg-output: store round-trips and export readback.

#[cfg(test)]
mod helpers {
    use geo::{coord, LineString};
    use tempfile::TempDir;

    use tg_core::{BBox, EdgeId, Trail, VertexId};
    use tg_net::model::{Edge, TrailSegment, Vertex};
    use tg_net::Workspace;

    pub fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    pub fn trail(uuid: &str, region: &str, pts: &[(f64, f64)], z: &[f64]) -> Trail {
        let geom: LineString<f64> =
            LineString::new(pts.iter().map(|(x, y)| coord! { x: *x, y: *y }).collect());
        let bbox = BBox::of_linestring(&geom).unwrap();
        Trail {
            uuid: uuid.to_string(),
            name: format!("Trail {uuid}"),
            region: region.to_string(),
            source: "osm".to_string(),
            trail_type: "hiking".to_string(),
            surface: "dirt".to_string(),
            difficulty: "moderate".to_string(),
            length_km: tg_geom::line_length_km(&geom),
            elevation_gain: 10.0,
            elevation_loss: 5.0,
            max_elevation: 1700.0,
            min_elevation: 1600.0,
            avg_elevation: 1650.0,
            bbox,
            geom,
            elevations: z.to_vec(),
            connector: false,
        }
    }

    /// A two-edge workspace with one trail record; the second edge
    /// references a uuid that has no trail row (placeholder case).
    pub fn small_workspace(root: &TempDir) -> Workspace {
        let mut ws = Workspace::create(root.path(), "tg", "test").unwrap();
        ws.trails = vec![trail("t-1", "test", &[(0.0, 0.0), (0.01, 0.0)], &[1600.0, 1650.0])];
        ws.vertices = vec![
            Vertex { id: VertexId(0), coord: coord! { x: 0.0, y: 0.0 }, elevation: 1600.0, cnt: 1, terminus: true },
            Vertex { id: VertexId(1), coord: coord! { x: 0.01, y: 0.0 }, elevation: 1650.0, cnt: 2, terminus: false },
            Vertex { id: VertexId(2), coord: coord! { x: 0.02, y: 0.0 }, elevation: 1660.0, cnt: 1, terminus: true },
        ];
        let geom_a: LineString<f64> =
            LineString::new(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 0.01, y: 0.0 }]);
        let geom_b: LineString<f64> =
            LineString::new(vec![coord! { x: 0.01, y: 0.0 }, coord! { x: 0.02, y: 0.0 }]);
        ws.edges = vec![
            Edge {
                id: EdgeId(0),
                length_km: tg_geom::line_length_km(&geom_a),
                elevation_gain: 50.0,
                elevation_loss: 0.0,
                start_elevation: 1600.0,
                end_elevation: 1650.0,
                source: VertexId(0),
                target: VertexId(1),
                trail_uuid: Some("t-1".to_string()),
                trail_name: Some("Trail t-1".to_string()),
                connector: false,
                composition: vec![TrailSegment {
                    trail_uuid: "t-1".to_string(),
                    trail_name: "Trail t-1".to_string(),
                    weight: 1.0,
                }],
                geom: geom_a,
            },
            Edge {
                id: EdgeId(1),
                length_km: tg_geom::line_length_km(&geom_b),
                elevation_gain: 10.0,
                elevation_loss: 0.0,
                start_elevation: 1650.0,
                end_elevation: 1660.0,
                source: VertexId(1),
                target: VertexId(2),
                trail_uuid: Some("t-missing".to_string()),
                trail_name: Some("Ghost Trail".to_string()),
                connector: false,
                composition: vec![],
                geom: geom_b,
            },
        ];
        ws
    }
}

// ── Trail store ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod store {
    use tg_core::BBox;

    use super::helpers::*;
    use crate::TrailStore;

    #[test]
    fn install_insert_load_round_trip() {
        let dir = tmp();
        let db = dir.path().join("trails.db");
        let mut store = TrailStore::install(&db).unwrap();

        let trails = vec![
            trail("a", "boulder", &[(-105.3, 40.0), (-105.29, 40.0)], &[1600.0, 1620.0]),
            trail("b", "boulder", &[(-105.2, 40.1), (-105.19, 40.1)], &[1700.0, 1710.0]),
            trail("c", "denver", &[(-104.9, 39.7), (-104.89, 39.7)], &[1500.0, 1510.0]),
        ];
        assert_eq!(store.insert_trails(&trails).unwrap(), 3);

        let boulder = store.load_trails("boulder", None, None).unwrap();
        assert_eq!(boulder.len(), 2);
        assert_eq!(boulder[0].uuid, "a");
        assert_eq!(boulder[0].geom.0.len(), 2);
        assert_eq!(boulder[0].elevations, vec![1600.0, 1620.0]);

        let denver = store.load_trails("denver", None, None).unwrap();
        assert_eq!(denver.len(), 1);

        let nowhere = store.load_trails("nowhere", None, None).unwrap();
        assert!(nowhere.is_empty());
    }

    #[test]
    fn source_and_bbox_filters() {
        let dir = tmp();
        let db = dir.path().join("trails.db");
        let mut store = TrailStore::install(&db).unwrap();

        let mut t1 = trail("a", "boulder", &[(-105.3, 40.0), (-105.29, 40.0)], &[0.0, 0.0]);
        t1.source = "osm".to_string();
        let mut t2 = trail("b", "boulder", &[(-105.2, 40.1), (-105.19, 40.1)], &[0.0, 0.0]);
        t2.source = "usgs".to_string();
        store.insert_trails(&[t1, t2]).unwrap();

        let osm_only = store.load_trails("boulder", Some("osm"), None).unwrap();
        assert_eq!(osm_only.len(), 1);
        assert_eq!(osm_only[0].uuid, "a");

        let west = BBox::new(-105.31, 39.9, -105.25, 40.05);
        let in_west = store.load_trails("boulder", None, Some(&west)).unwrap();
        assert_eq!(in_west.len(), 1);
        assert_eq!(in_west[0].uuid, "a");
    }

    #[test]
    fn install_is_idempotent() {
        let dir = tmp();
        let db = dir.path().join("trails.db");
        TrailStore::install(&db).unwrap();
        TrailStore::install(&db).unwrap(); // second call must not fail
    }
}

// ── SQLite export ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod sqlite_export {
    use rusqlite::Connection;

    use super::helpers::*;
    use crate::{write_sqlite, SCHEMA_VERSION};

    #[test]
    fn schema_version_and_table_counts() {
        let dir = tmp();
        let ws = small_workspace(&dir);
        let out = dir.path().join("export.db");
        let stats = write_sqlite(&out, &ws, &[], false).unwrap();

        assert_eq!(stats.trails, 1);
        assert_eq!(stats.placeholder_trails, 1);
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 2);

        let conn = Connection::open(&out).unwrap();
        let version: i64 =
            conn.query_row("SELECT version FROM schema_version", [], |r| r.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let trails: i64 =
            conn.query_row("SELECT COUNT(*) FROM trails", [], |r| r.get(0)).unwrap();
        assert_eq!(trails, 2, "one real + one placeholder");

        let placeholder: String = conn
            .query_row(
                "SELECT name FROM trails WHERE trail_uuid = 't-missing'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(placeholder, "Ghost Trail");

        let nodes: i64 =
            conn.query_row("SELECT COUNT(*) FROM routing_nodes", [], |r| r.get(0)).unwrap();
        assert_eq!(nodes, 3);

        // Node rows carry degree and classification.
        let (node_type, degree): (String, i64) = conn
            .query_row(
                "SELECT node_type, degree FROM routing_nodes WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(node_type, "connector");
        assert_eq!(degree, 2);

        let edges: i64 =
            conn.query_row("SELECT COUNT(*) FROM routing_edges", [], |r| r.get(0)).unwrap();
        assert_eq!(edges, 2);

        let region_trails: i64 = conn
            .query_row(
                "SELECT trail_count FROM region_metadata WHERE region = 'test'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(region_trails, 1);
    }

    #[test]
    fn trails_only_skips_graph_tables() {
        let dir = tmp();
        let ws = small_workspace(&dir);
        let out = dir.path().join("trails_only.db");
        let stats = write_sqlite(&out, &ws, &[], true).unwrap();
        assert_eq!(stats.trails, 1);
        assert_eq!(stats.nodes, 0);
        assert_eq!(stats.edges, 0);

        let conn = Connection::open(&out).unwrap();
        let nodes: i64 =
            conn.query_row("SELECT COUNT(*) FROM routing_nodes", [], |r| r.get(0)).unwrap();
        assert_eq!(nodes, 0);
    }

    #[test]
    fn routes_round_trip_with_json_columns() {
        let dir = tmp();
        let ws = small_workspace(&dir);
        let cfg = {
            // A pattern matching the two-edge out-and-back exactly.
            use tg_core::config::*;
            let mut patterns = Vec::new();
            patterns.push(RoutePattern {
                pattern_name: "oab".to_string(),
                target_distance_km: 2.0 * tg_geom::line_length_km(&ws.edges[0].geom)
                    + 2.0 * tg_geom::line_length_km(&ws.edges[1].geom),
                target_elevation_gain: 60.0,
                route_shape: RouteShape::OutAndBack,
                tolerance_percent: 30.0,
            });
            Config {
                database: DatabaseConfig { path: "unused.db".into() },
                tolerances: Tolerances {
                    intersection_tolerance_m: 2.0,
                    edge_snap_tolerance_m: 1.0,
                    trail_bridging_tolerance_m: 5.0,
                    short_connector_max_length_m: 2.0,
                    min_trail_length_m: 1.0,
                    simplification_tolerance_deg: 1.1 / 111_320.0,
                    min_points_for_simplification: 10,
                },
                bridging: Default::default(),
                routing: RoutingConfig { min_routes_per_pattern: 1, ..Default::default() },
                patterns,
                cost: Default::default(),
                export: Default::default(),
                trailheads: Default::default(),
                workspace: Default::default(),
                regions: Default::default(),
            }
        };
        let (routes, _) = tg_route::generate_routes(&ws, &cfg).unwrap();
        assert!(!routes.is_empty());

        let out = dir.path().join("with_routes.db");
        let stats = write_sqlite(&out, &ws, &routes, false).unwrap();
        assert_eq!(stats.routes, routes.len());

        let conn = Connection::open(&out).unwrap();
        let (shape, edges_json, created): (String, String, String) = conn
            .query_row(
                "SELECT route_shape, route_edges, created_at FROM route_recommendations LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(shape, "out-and-back");
        let ids: Vec<u32> = serde_json::from_str(&edges_json).unwrap();
        assert!(!ids.is_empty());
        assert!(!created.is_empty());
    }
}

// ── GeoJSON export ────────────────────────────────────────────────────────────

#[cfg(test)]
mod geojson_export {
    use tg_core::config::GeojsonLayers;

    use super::helpers::*;
    use crate::write_geojson;

    fn layer_counts(value: &serde_json::Value) -> std::collections::BTreeMap<String, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for f in value["features"].as_array().unwrap() {
            let layer = f["properties"]["layer"].as_str().unwrap().to_string();
            *counts.entry(layer).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn all_layers_written_with_colors() {
        let dir = tmp();
        let ws = small_workspace(&dir);
        let out = dir.path().join("export.geojson");
        let layers = GeojsonLayers {
            trails: true,
            edges: true,
            trail_vertices: true,
            edge_network_vertices: true,
            routes: true,
        };
        let stats = write_geojson(&out, &ws, &[], &layers).unwrap();
        // 1 trail + 2 edges + 2 trail endpoints + 3 vertices.
        assert_eq!(stats.features, 8);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        let counts = layer_counts(&value);
        assert_eq!(counts["trails"], 1);
        assert_eq!(counts["edges"], 2);
        assert_eq!(counts["trail_vertices"], 2);
        assert_eq!(counts["edge_network_vertices"], 3);

        // Degree-2 vertex is blue, endpoints green.
        let vertex_colors: Vec<&str> = value["features"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|f| f["properties"]["layer"] == "edge_network_vertices")
            .map(|f| f["properties"]["marker-color"].as_str().unwrap())
            .collect();
        assert!(vertex_colors.contains(&"#2196f3"));
        assert!(vertex_colors.contains(&"#4caf50"));
    }

    #[test]
    fn layer_visibility_flags_respected() {
        let dir = tmp();
        let ws = small_workspace(&dir);
        let out = dir.path().join("edges_only.geojson");
        let layers = GeojsonLayers {
            trails: false,
            edges: true,
            trail_vertices: false,
            edge_network_vertices: false,
            routes: false,
        };
        let stats = write_geojson(&out, &ws, &[], &layers).unwrap();
        assert_eq!(stats.features, 2);
    }
}
