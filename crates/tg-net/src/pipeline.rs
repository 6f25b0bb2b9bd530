//! The network-construction pipeline: stages 1–8 in order.
//!
//! Each stage is a function of `(&mut Workspace, config)` returning a stats
//! record; the records accumulate into a [`PipelineReport`] that is logged
//! and dumped into the staging directory.  Stages run strictly
//! sequentially — no stage observes in-progress output of another.

use serde::Serialize;

use tg_core::{Config, Trail};

use crate::bridge::{bridge_trails, BridgeStats};
use crate::collapse::{collapse_chains, CollapseStats};
use crate::coverage::{verify_coverage, CoverageStats};
use crate::ingest::{ingest, IngestFilter, IngestStats};
use crate::noding::{node_trails, NodingStats};
use crate::reconcile::{reconcile, ReconcileStats};
use crate::simplify::{simplify_edges, SimplifyStats};
use crate::vertices::{build_vertices, BindStats};
use crate::{NetResult, Workspace};

/// Runtime options resolved from CLI flags (configuration stays in
/// [`Config`]).
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub filter: IngestFilter,
    /// Geometry invariant violations and coverage gaps become fatal.
    pub strict: bool,
    /// `--skip-validation`: skip the coverage verification stage.
    pub skip_validation: bool,
    /// CLI override of the configured intersection tolerance.
    pub intersection_tolerance_m: Option<f64>,
    /// CLI override of the configured simplification tolerance.
    pub simplification_tolerance_deg: Option<f64>,
}

/// Per-stage statistics for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub ingest: IngestStats,
    pub bridging: BridgeStats,
    pub noding: NodingStats,
    pub binding: BindStats,
    pub reconcile: ReconcileStats,
    pub simplify: SimplifyStats,
    pub collapse: CollapseStats,
    pub coverage: Option<CoverageStats>,
    pub final_edges: usize,
    pub final_vertices: usize,
}

/// Run stages 1–8 against `ws`.  Route generation and export consume the
/// finished workspace afterwards.
pub fn run_network_pipeline(
    ws: &mut Workspace,
    trails: Vec<Trail>,
    config: &Config,
    options: &RunOptions,
) -> NetResult<PipelineReport> {
    let tol = &config.tolerances;
    let intersection_tol = options
        .intersection_tolerance_m
        .unwrap_or(tol.intersection_tolerance_m);
    let simplify_tol = options
        .simplification_tolerance_deg
        .unwrap_or(tol.simplification_tolerance_deg);

    let mut report = PipelineReport::default();

    report.ingest = ingest(ws, trails, &options.filter)?;
    report.bridging =
        bridge_trails(ws, tol.trail_bridging_tolerance_m, config.bridging.enabled)?;
    report.noding = node_trails(ws, intersection_tol)?;
    report.binding = build_vertices(ws, tol.edge_snap_tolerance_m)?;
    report.reconcile = reconcile(
        ws,
        tol.edge_snap_tolerance_m,
        tol.trail_bridging_tolerance_m,
        tol.short_connector_max_length_m,
        config.bridging.enabled,
    )?;
    report.simplify = simplify_edges(
        ws,
        simplify_tol,
        tol.min_points_for_simplification,
        tol.min_trail_length_m,
        tol.short_connector_max_length_m,
        tol.edge_snap_tolerance_m,
    )?;
    report.collapse = collapse_chains(ws, options.strict)?;

    if !options.skip_validation {
        report.coverage = Some(verify_coverage(ws, tol.edge_snap_tolerance_m, options.strict)?);
    }

    report.final_edges = ws.edges.len();
    report.final_vertices = ws.vertices.len();

    // Stats land in the staging directory for inspection (`--no-cleanup`).
    let json = serde_json::to_value(&report).expect("report is serializable");
    if let Err(e) = ws.write_artifact("pipeline_report.json", &json) {
        log::debug!("could not write pipeline report: {e}");
    }

    log::info!(
        "network pipeline complete: {} edges, {} vertices",
        report.final_edges,
        report.final_vertices
    );
    Ok(report)
}
