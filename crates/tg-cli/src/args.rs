//! Command-line argument surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Build a routable trail network and route recommendations from a raw
/// trail corpus.
#[derive(Debug, Parser)]
#[command(name = "trailgraph", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Region to build (must exist in regions.yaml).
    #[arg(long, default_value = "boulder")]
    pub region: String,

    /// Output file path (required unless a subcommand runs).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Output format; inferred from the extension when omitted
    /// (.db → sqlite, .geojson/.json → geojson).
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Restrict to an envelope: "minLng,minLat,maxLng,maxLat".
    #[arg(long, conflicts_with = "test_size")]
    pub bbox: Option<String>,

    /// Use a region bbox preset instead of a full build.
    #[arg(long, value_enum)]
    pub test_size: Option<TestSize>,

    /// Restrict ingest to one trail source tag.
    #[arg(long)]
    pub source: Option<String>,

    /// Override the configured simplification tolerance (degrees).
    #[arg(long, value_name = "DEG")]
    pub simplify_tolerance: Option<f64>,

    /// Override the configured intersection tolerance (meters).
    #[arg(long, value_name = "M")]
    pub intersection_tolerance: Option<f64>,

    /// Restrict route starts to configured trailheads.
    #[arg(long)]
    pub use_trailheads_only: bool,

    /// Ignore configured trailheads.
    #[arg(long)]
    pub no_trailheads: bool,

    /// Alias of --no-trailheads kept for script compatibility.
    #[arg(long, hide = true)]
    pub disable_trailheads_only: bool,

    /// Keep the staging workspace on exit (success or failure).
    #[arg(long)]
    pub no_cleanup: bool,

    /// Remove all old staging workspaces before running.
    #[arg(long)]
    pub cleanup_old_schemas: bool,

    /// Remove stray files from the staging root before running.
    #[arg(long)]
    pub cleanup_temp_files: bool,

    /// Retention count for staging workspaces (overrides config).
    #[arg(long, value_name = "N")]
    pub max_staging_schemas: Option<usize>,

    /// Skip coverage verification.
    #[arg(long)]
    pub skip_validation: bool,

    /// Skip the bbox sanity check.
    #[arg(long)]
    pub skip_bbox_validation: bool,

    /// Keep trails that fail the geometry gate.
    #[arg(long)]
    pub skip_geometry_validation: bool,

    /// Geometry invariant violations and coverage gaps become fatal.
    #[arg(long)]
    pub strict: bool,

    /// Debug-level logging.
    #[arg(long, short)]
    pub verbose: bool,

    /// Print the configured test bboxes for the region and exit.
    #[arg(long)]
    pub list_test_bboxes: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the master trail store schema.
    Install {
        /// Create the schema only, without importing anything.
        #[arg(long)]
        empty: bool,
    },
    /// Remove old staging workspaces.
    Cleanup,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Sqlite,
    Geojson,
    TrailsOnly,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TestSize {
    Small,
    Medium,
    Large,
}

impl TestSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestSize::Small => "small",
            TestSize::Medium => "medium",
            TestSize::Large => "large",
        }
    }
}

impl Format {
    /// Infer the format from the output extension; sqlite is the default.
    pub fn infer(explicit: Option<Format>, out: &std::path::Path) -> Format {
        if let Some(f) = explicit {
            return f;
        }
        match out.extension().and_then(|e| e.to_str()) {
            Some("geojson") | Some("json") => Format::Geojson,
            _ => Format::Sqlite,
        }
    }
}
