//! Configuration model.
//!
//! Two YAML documents feed the pipeline: the main configuration (database
//! path, tolerances, route patterns, cost model, export layers, trailheads,
//! workspace retention) and the region catalogue with its bbox presets.
//! Both deserialize into the structs below; [`Config::validate`] runs once
//! at CLI entry and every violation is fatal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{BBox, CoreError, CoreResult};

// ── Top level ─────────────────────────────────────────────────────────────────

/// The fully merged run configuration (main file + region catalogue).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub tolerances: Tolerances,
    #[serde(default)]
    pub bridging: BridgingConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub patterns: Vec<RoutePattern>,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub trailheads: TrailheadConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Region catalogue, usually loaded from `regions.yaml` and merged in.
    #[serde(default)]
    pub regions: BTreeMap<String, RegionConfig>,
}

impl Config {
    /// Validate the merged configuration.  Called once at CLI entry; any
    /// violation is a fatal `ConfigurationError`.
    pub fn validate(&self) -> CoreResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(CoreError::Config("database.path must be set".into()));
        }
        self.tolerances.validate()?;
        self.cost.validate()?;
        for p in &self.patterns {
            p.validate()?;
        }
        if self.routing.k_shortest_paths == 0 {
            return Err(CoreError::Config("routing.k_shortest_paths must be ≥ 1".into()));
        }
        if self.routing.max_tolerance_percent < 0.0 {
            return Err(CoreError::Config(
                "routing.max_tolerance_percent must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Resolve a region by name.
    pub fn region(&self, name: &str) -> CoreResult<&RegionConfig> {
        self.regions
            .get(name)
            .ok_or_else(|| CoreError::UnknownRegion(name.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the master trail store (embedded SQLite file).
    pub path: std::path::PathBuf,
}

// ── Regions ───────────────────────────────────────────────────────────────────

/// One region with its full envelope and the three test-size presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub bbox: BBox,
    #[serde(default)]
    pub presets: BTreeMap<String, BBox>,
}

impl RegionConfig {
    /// Resolve a `--test-size` preset (`small` / `medium` / `large`).
    pub fn preset(&self, size: &str) -> Option<BBox> {
        self.presets.get(size).copied()
    }
}

// ── Tolerances ────────────────────────────────────────────────────────────────

/// Every distance knob of the pipeline.  Meters unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tolerances {
    /// Proximity within which crossing detection treats geometries as
    /// touching.
    #[serde(default = "default_intersection_tolerance")]
    pub intersection_tolerance_m: f64,
    /// Snap gate for endpoint→vertex binding and KNN vertex merge.
    pub edge_snap_tolerance_m: f64,
    /// Endpoint gap closed by trail-level bridging and gap midpoint
    /// bridging.
    pub trail_bridging_tolerance_m: f64,
    /// Connector edges shorter than this are merged away or deleted.
    pub short_connector_max_length_m: f64,
    /// Edges shorter than this are degenerate.  Hard CLI gate: must be
    /// present and ≤ 10 m.
    pub min_trail_length_m: f64,
    /// Topology-preserving simplification epsilon, in degrees
    /// (≈ meters / 111320).
    #[serde(default = "default_simplification_tolerance")]
    pub simplification_tolerance_deg: f64,
    /// Only simplify linestrings with more coordinates than this.
    #[serde(default = "default_min_points_for_simplification")]
    pub min_points_for_simplification: usize,
}

fn default_intersection_tolerance() -> f64 {
    2.0
}

fn default_simplification_tolerance() -> f64 {
    // ≈ 1.1 m expressed in degrees.
    1.1 / 111_320.0
}

fn default_min_points_for_simplification() -> usize {
    10
}

impl Tolerances {
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_trail_length_m <= 0.0 || self.min_trail_length_m > 10.0 {
            // The 10 m ceiling guards against a misconfiguration that would
            // silently delete most of the network.
            return Err(CoreError::Config(format!(
                "tolerances.min_trail_length_m must be in (0, 10], got {}",
                self.min_trail_length_m
            )));
        }
        for (name, v) in [
            ("intersection_tolerance_m", self.intersection_tolerance_m),
            ("edge_snap_tolerance_m", self.edge_snap_tolerance_m),
            ("trail_bridging_tolerance_m", self.trail_bridging_tolerance_m),
            ("short_connector_max_length_m", self.short_connector_max_length_m),
            ("simplification_tolerance_deg", self.simplification_tolerance_deg),
        ] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(CoreError::Config(format!(
                    "tolerances.{name} must be a positive number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ── Bridging ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgingConfig {
    pub enabled: bool,
}

impl Default for BridgingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ── Route search ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// K for Yen's k-shortest-paths.
    pub k_shortest_paths: usize,
    /// Below this many results a pattern's tolerance is relaxed.
    pub min_routes_per_pattern: usize,
    /// Hard cap on returned routes per pattern.
    pub max_routes_per_pattern: usize,
    /// At most this many routes per result bin (half-km distance ×
    /// 100 m gain); keeps one pattern from returning a page of
    /// near-interchangeable recommendations.
    pub max_routes_per_bin: usize,
    /// Routes scoring above this are dropped (lower cost is better).
    pub min_route_score: f64,
    /// Ceiling for adaptive tolerance relaxation, percent.
    pub max_tolerance_percent: f64,
    /// Two routes sharing more than this fraction of edge ids are
    /// near-duplicates; only the cheaper survives.
    pub max_edge_overlap_ratio: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            k_shortest_paths: 5,
            min_routes_per_pattern: 2,
            max_routes_per_pattern: 10,
            max_routes_per_bin: 10,
            min_route_score: f64::INFINITY,
            max_tolerance_percent: 50.0,
            max_edge_overlap_ratio: 0.5,
        }
    }
}

/// Requested route shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteShape {
    Loop,
    OutAndBack,
    PointToPoint,
}

impl RouteShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteShape::Loop => "loop",
            RouteShape::OutAndBack => "out-and-back",
            RouteShape::PointToPoint => "point-to-point",
        }
    }
}

impl std::fmt::Display for RouteShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested route pattern: the user's targets plus the starting
/// tolerance band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePattern {
    pub pattern_name: String,
    pub target_distance_km: f64,
    pub target_elevation_gain: f64,
    pub route_shape: RouteShape,
    pub tolerance_percent: f64,
}

impl RoutePattern {
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_distance_km <= 0.0 {
            return Err(CoreError::Config(format!(
                "pattern '{}': target_distance_km must be positive",
                self.pattern_name
            )));
        }
        if self.target_elevation_gain < 0.0 {
            return Err(CoreError::Config(format!(
                "pattern '{}': target_elevation_gain must be non-negative",
                self.pattern_name
            )));
        }
        if !(0.0..=100.0).contains(&self.tolerance_percent) {
            return Err(CoreError::Config(format!(
                "pattern '{}': tolerance_percent must be in [0, 100]",
                self.pattern_name
            )));
        }
        Ok(())
    }
}

// ── Cost model ────────────────────────────────────────────────────────────────

/// Weights of the three cost components.  Must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub elevation: f64,
    pub distance: f64,
    pub shape: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self { elevation: 0.35, distance: 0.35, shape: 0.3 }
    }
}

/// A half-open value band `[min, max)` with its preference cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostBand {
    pub min: f64,
    pub max: f64,
    pub cost: f64,
}

/// One banded cost component: a deviation term shaped by weight/exponent
/// plus a step-function preference over value bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandedCost {
    pub deviation_weight: f64,
    pub deviation_exponent: f64,
    pub bands: Vec<CostBand>,
    /// Cost applied to values beyond the last band.
    pub out_of_band_cost: f64,
}

impl BandedCost {
    /// Preference cost for `value` from the band table.
    pub fn band_cost(&self, value: f64) -> f64 {
        for band in &self.bands {
            if value >= band.min && value < band.max {
                return band.cost;
            }
        }
        self.out_of_band_cost
    }
}

fn default_elevation_cost() -> BandedCost {
    // Bands over gain rate in m/km: moderate climbing preferred.
    BandedCost {
        deviation_weight: 1.0,
        deviation_exponent: 2.0,
        bands: vec![
            CostBand { min: 0.0, max: 50.0, cost: 0.2 },
            CostBand { min: 50.0, max: 100.0, cost: 0.0 },
            CostBand { min: 100.0, max: 150.0, cost: 0.1 },
            CostBand { min: 150.0, max: 200.0, cost: 0.3 },
        ],
        out_of_band_cost: 0.5,
    }
}

fn default_distance_cost() -> BandedCost {
    // Bands over |achieved − target| / target, in percent.
    BandedCost {
        deviation_weight: 1.0,
        deviation_exponent: 2.0,
        bands: vec![
            CostBand { min: 0.0, max: 10.0, cost: 0.0 },
            CostBand { min: 10.0, max: 20.0, cost: 0.1 },
            CostBand { min: 20.0, max: 30.0, cost: 0.3 },
        ],
        out_of_band_cost: 0.5,
    }
}

/// Full preference-cost configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default)]
    pub priority_weights: PriorityWeights,
    #[serde(default = "default_elevation_cost")]
    pub elevation: BandedCost,
    #[serde(default = "default_distance_cost")]
    pub distance: BandedCost,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            priority_weights: PriorityWeights::default(),
            elevation: default_elevation_cost(),
            distance: default_distance_cost(),
        }
    }
}

impl CostConfig {
    pub fn validate(&self) -> CoreResult<()> {
        let w = &self.priority_weights;
        let sum = w.elevation + w.distance + w.shape;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(CoreError::Config(format!(
                "cost.priority_weights must sum to 1.0, got {sum}"
            )));
        }
        if w.elevation < 0.0 || w.distance < 0.0 || w.shape < 0.0 {
            return Err(CoreError::Config("cost.priority_weights must be non-negative".into()));
        }
        Ok(())
    }
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Per-layer visibility for the GeoJSON exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeojsonLayers {
    pub trails: bool,
    pub edges: bool,
    pub trail_vertices: bool,
    pub edge_network_vertices: bool,
    pub routes: bool,
}

impl Default for GeojsonLayers {
    fn default() -> Self {
        Self {
            trails: true,
            edges: true,
            trail_vertices: false,
            edge_network_vertices: true,
            routes: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub geojson_layers: GeojsonLayers,
}

// ── Trailheads ────────────────────────────────────────────────────────────────

/// A configured trailhead coordinate (preferred route start).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailheadCoord {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailheadConfig {
    pub enabled: bool,
    /// Trailheads farther than this from any vertex are ignored.
    pub max_snap_distance_m: f64,
    #[serde(default)]
    pub coordinates: Vec<TrailheadCoord>,
}

impl Default for TrailheadConfig {
    fn default() -> Self {
        Self { enabled: false, max_snap_distance_m: 50.0, coordinates: Vec::new() }
    }
}

// ── Workspace retention ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root directory for staging workspaces.
    pub staging_root: std::path::PathBuf,
    /// Name prefix for staging workspaces.
    pub prefix: String,
    /// Startup pruning keeps at most this many old workspaces.
    pub max_staging_workspaces: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            staging_root: ".staging".into(),
            prefix: "tg".into(),
            max_staging_workspaces: 5,
        }
    }
}
