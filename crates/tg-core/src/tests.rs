//! Unit tests for tg-core.

#[cfg(test)]
mod helpers {
    use crate::config::*;
    use crate::Config;

    /// A minimal valid configuration for validation tests.
    pub fn base_config() -> Config {
        Config {
            database: DatabaseConfig { path: "data/trails.db".into() },
            tolerances: Tolerances {
                intersection_tolerance_m: 2.0,
                edge_snap_tolerance_m: 1.0,
                trail_bridging_tolerance_m: 5.0,
                short_connector_max_length_m: 2.0,
                min_trail_length_m: 5.0,
                simplification_tolerance_deg: 1.1 / 111_320.0,
                min_points_for_simplification: 10,
            },
            bridging: Default::default(),
            routing: Default::default(),
            patterns: vec![],
            cost: Default::default(),
            export: Default::default(),
            trailheads: Default::default(),
            workspace: Default::default(),
            regions: Default::default(),
        }
    }
}

// ── Ids ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ids {
    use crate::{EdgeId, VertexId};

    #[test]
    fn default_is_the_invalid_sentinel() {
        assert_eq!(VertexId::default(), VertexId::INVALID);
        assert_eq!(EdgeId::default(), EdgeId::INVALID);
        assert!(!VertexId::INVALID.is_valid());
        assert!(VertexId(0).is_valid());
    }

    #[test]
    fn row_index_round_trip() {
        let v = VertexId::from_index(42);
        assert_eq!(v.index(), 42);
        assert_eq!(v, VertexId(42));
    }

    #[test]
    fn display_tags_distinguish_the_tables() {
        assert_eq!(VertexId(7).to_string(), "v7");
        assert_eq!(EdgeId(7).to_string(), "e7");
        assert_eq!(EdgeId::INVALID.to_string(), "e-");
    }

    #[test]
    fn ids_are_ordered_and_hashable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(EdgeId(3));
        set.insert(EdgeId(1));
        set.insert(EdgeId(3));
        assert_eq!(set.len(), 2);
        assert!(EdgeId(1) < EdgeId(3));
    }
}

// ── BBox ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod bbox {
    use geo::{coord, LineString};

    use crate::BBox;

    #[test]
    fn parse_cli_form() {
        let b = BBox::parse("-105.3, 39.9, -105.1, 40.1").unwrap();
        assert_eq!(b.min_lng, -105.3);
        assert_eq!(b.max_lat, 40.1);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(BBox::parse("1,2,3").is_err());
        assert!(BBox::parse("a,b,c,d").is_err());
    }

    #[test]
    fn intersects_and_contains() {
        let a = BBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BBox::new(1.0, 1.0, 3.0, 3.0);
        let c = BBox::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(coord! { x: 1.0, y: 1.0 }));
        assert!(!a.contains(coord! { x: 2.5, y: 1.0 }));
    }

    #[test]
    fn of_linestring_covers_all_points() {
        let line = LineString::new(vec![
            coord! { x: -105.3, y: 40.0 },
            coord! { x: -105.2, y: 40.1 },
            coord! { x: -105.4, y: 39.9 },
        ]);
        let b = BBox::of_linestring(&line).unwrap();
        assert_eq!(b.min_lng, -105.4);
        assert_eq!(b.max_lng, -105.2);
        assert_eq!(b.min_lat, 39.9);
        assert_eq!(b.max_lat, 40.1);
    }

    #[test]
    fn validity_gate() {
        assert!(BBox::new(-105.3, 39.9, -105.1, 40.1).is_valid());
        assert!(!BBox::new(-105.1, 39.9, -105.3, 40.1).is_valid()); // reversed lng
        assert!(!BBox::new(-200.0, 39.9, -105.3, 40.1).is_valid()); // out of domain
    }
}

// ── Trail ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod trail {
    use geo::coord;

    use crate::Trail;

    #[test]
    fn connector_carries_elevation_stats() {
        let t = Trail::connector(
            "c-1".into(),
            "boulder",
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.0001, y: 0.0 },
            1600.0,
            1610.0,
        );
        assert!(t.connector);
        assert_eq!(t.elevation_gain, 10.0);
        assert_eq!(t.elevation_loss, 0.0);
        assert_eq!(t.max_elevation, 1610.0);
        assert_eq!(t.geom.0.len(), 2);
        assert_eq!(t.elevations.len(), 2);
    }

    #[test]
    fn geometry_gate_rejects_degenerate_lines() {
        let mut t = Trail::connector(
            "c-2".into(),
            "boulder",
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.0, y: 0.0 },
            0.0,
            0.0,
        );
        // Identical points → no two distinct coordinates.
        assert!(!t.has_valid_geometry());

        t.geom.0[1] = coord! { x: 1.0, y: 0.0 };
        assert!(t.has_valid_geometry());

        t.geom.0[1] = coord! { x: f64::NAN, y: 0.0 };
        assert!(!t.has_valid_geometry());
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use crate::config::{RoutePattern, RouteShape};
    use crate::CoreError;

    use super::helpers::base_config;

    #[test]
    fn base_config_validates() {
        base_config().validate().unwrap();
    }

    #[test]
    fn min_trail_length_hard_gate() {
        let mut cfg = base_config();
        cfg.tolerances.min_trail_length_m = 11.0;
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
        cfg.tolerances.min_trail_length_m = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn priority_weights_must_sum_to_one() {
        let mut cfg = base_config();
        cfg.cost.priority_weights.elevation = 0.9;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn pattern_validation() {
        let mut cfg = base_config();
        cfg.patterns.push(RoutePattern {
            pattern_name: "bad".into(),
            target_distance_km: -1.0,
            target_elevation_gain: 100.0,
            route_shape: RouteShape::Loop,
            tolerance_percent: 20.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_region_error() {
        let cfg = base_config();
        assert!(matches!(cfg.region("nowhere"), Err(CoreError::UnknownRegion(_))));
    }

    #[test]
    fn route_shape_yaml_round_trip() {
        let s: RouteShape = serde_yaml::from_str("out-and-back").unwrap();
        assert_eq!(s, RouteShape::OutAndBack);
        assert_eq!(serde_yaml::to_string(&RouteShape::Loop).unwrap().trim(), "loop");
    }

    #[test]
    fn yaml_deserialize_full_document() {
        let yaml = r#"
database:
  path: data/trails.db
tolerances:
  edge_snap_tolerance_m: 1.0
  trail_bridging_tolerance_m: 5.0
  short_connector_max_length_m: 2.0
  min_trail_length_m: 5.0
patterns:
  - pattern_name: short-loop
    target_distance_km: 5.0
    target_elevation_gain: 250.0
    route_shape: loop
    tolerance_percent: 20.0
"#;
        let cfg: crate::Config = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();
        // Defaults filled in for omitted sections.
        assert_eq!(cfg.tolerances.intersection_tolerance_m, 2.0);
        assert!(cfg.bridging.enabled);
        assert_eq!(cfg.patterns.len(), 1);
    }

    #[test]
    fn band_lookup_falls_through_to_out_of_band() {
        let cost = crate::config::CostConfig::default();
        assert_eq!(cost.elevation.band_cost(75.0), 0.0);
        assert_eq!(cost.elevation.band_cost(25.0), 0.2);
        assert_eq!(cost.elevation.band_cost(500.0), 0.5);
    }
}
