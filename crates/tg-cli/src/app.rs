//! Configuration loading, subcommand dispatch, and pipeline wiring.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use tg_core::config::RegionConfig;
use tg_core::{BBox, Config};
use tg_net::ingest::IngestFilter;
use tg_net::{run_network_pipeline, RunOptions, Workspace};
use tg_output::{write_geojson, write_sqlite, TrailStore};
use tg_route::generate_routes;

use crate::args::{Cli, Command, Format};

/// Fixed configuration directory (per deployment convention).
const CONFIG_DIR: &str = "configs";

pub fn run(cli: Cli) -> Result<()> {
    let config_dir = Path::new(CONFIG_DIR);
    let mut config = load_config(config_dir)?;
    apply_cli_overrides(&mut config, &cli);

    match cli.command {
        Some(Command::Install { empty }) => return install(&config, empty),
        Some(Command::Cleanup) => return cleanup(&config),
        None => {}
    }

    if cli.list_test_bboxes {
        return list_test_bboxes(&config, &cli.region);
    }

    build(&config, &cli)
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Load and merge the two YAML documents, then validate once.
pub fn load_config(dir: &Path) -> Result<Config> {
    let main_path = dir.join("trailgraph.yaml");
    let raw = fs::read_to_string(&main_path)
        .with_context(|| format!("reading {}", main_path.display()))?;
    let mut config: Config =
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", main_path.display()))?;

    let regions_path = dir.join("regions.yaml");
    if regions_path.exists() {
        #[derive(Deserialize)]
        struct RegionsFile {
            regions: BTreeMap<String, RegionConfig>,
        }
        let raw = fs::read_to_string(&regions_path)
            .with_context(|| format!("reading {}", regions_path.display()))?;
        let file: RegionsFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing {}", regions_path.display()))?;
        config.regions.extend(file.regions);
    }

    config.validate().context("configuration invalid")?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if cli.use_trailheads_only {
        config.trailheads.enabled = true;
    }
    if cli.no_trailheads || cli.disable_trailheads_only {
        config.trailheads.enabled = false;
    }
    if let Some(n) = cli.max_staging_schemas {
        config.workspace.max_staging_workspaces = n;
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn install(config: &Config, empty: bool) -> Result<()> {
    TrailStore::install(&config.database.path)
        .with_context(|| format!("installing store at {}", config.database.path.display()))?;
    if empty {
        log::info!("store initialized empty (schema only)");
    } else {
        log::info!(
            "store initialized; import a trail corpus into {} before building",
            config.database.path.display()
        );
    }
    Ok(())
}

fn cleanup(config: &Config) -> Result<()> {
    let ws = &config.workspace;
    let removed = Workspace::cleanup_all(&ws.staging_root, &ws.prefix)?;
    log::info!("removed {removed} staging workspace(s)");
    Ok(())
}

fn list_test_bboxes(config: &Config, region: &str) -> Result<()> {
    let rc = config.region(region)?;
    println!("{region}: {}", rc.bbox);
    for (name, bbox) in &rc.presets {
        println!("{region}/{name}: {bbox}");
    }
    Ok(())
}

// ── The build command ─────────────────────────────────────────────────────────

fn build(config: &Config, cli: &Cli) -> Result<()> {
    let Some(out) = &cli.out else {
        bail!("--out is required");
    };
    let format = Format::infer(cli.format, out);

    // Resolve the working envelope.
    let region_config = config.region(&cli.region)?;
    let bbox: Option<BBox> = match (&cli.bbox, cli.test_size) {
        (Some(raw), _) => Some(BBox::parse(raw)?),
        (None, Some(size)) => Some(
            region_config
                .preset(size.as_str())
                .with_context(|| format!("region '{}' has no '{}' preset", cli.region, size.as_str()))?,
        ),
        (None, None) => None,
    };
    if let Some(b) = &bbox {
        if !cli.skip_bbox_validation && !b.is_valid() {
            bail!("invalid bbox {b}");
        }
    }

    // Workspace housekeeping before the run.
    let wcfg = &config.workspace;
    if cli.cleanup_old_schemas {
        Workspace::cleanup_all(&wcfg.staging_root, &wcfg.prefix)?;
    } else {
        Workspace::prune_old(&wcfg.staging_root, &wcfg.prefix, wcfg.max_staging_workspaces)?;
    }
    if cli.cleanup_temp_files {
        remove_stray_files(&wcfg.staging_root)?;
    }

    // Load the corpus.
    let store = TrailStore::open(&config.database.path)
        .with_context(|| format!("opening store {}", config.database.path.display()))?;
    let trails = store.load_trails(&cli.region, cli.source.as_deref(), bbox.as_ref())?;

    let options = RunOptions {
        filter: IngestFilter {
            bbox,
            skip_geometry_validation: cli.skip_geometry_validation,
        },
        strict: cli.strict,
        skip_validation: cli.skip_validation,
        intersection_tolerance_m: cli.intersection_tolerance,
        simplification_tolerance_deg: cli.simplify_tolerance,
    };

    // Run with guaranteed teardown (kept only with --no-cleanup).
    let mut ws = Workspace::create(&wcfg.staging_root, &wcfg.prefix, &cli.region)?;
    let result = run_and_export(&mut ws, trails, config, &options, format, out);
    if cli.no_cleanup {
        log::info!("workspace {} preserved for inspection", ws.name);
    } else if let Err(e) = ws.cleanup() {
        log::warn!("workspace teardown failed: {e}");
    }
    result
}

fn run_and_export(
    ws: &mut Workspace,
    trails: Vec<tg_core::Trail>,
    config: &Config,
    options: &RunOptions,
    format: Format,
    out: &Path,
) -> Result<()> {
    let report = run_network_pipeline(ws, trails, config, options)?;

    let routes = if format == Format::TrailsOnly || config.patterns.is_empty() {
        Vec::new()
    } else {
        let (routes, stats) = generate_routes(ws, config)?;
        for p in &stats.patterns {
            log::info!(
                "pattern '{}': {} route(s) at {:.0}% tolerance",
                p.pattern_name,
                p.routes_found,
                p.tolerance_percent_used
            );
        }
        routes
    };

    match format {
        Format::Sqlite => {
            write_sqlite(out, ws, &routes, false)?;
        }
        Format::TrailsOnly => {
            write_sqlite(out, ws, &routes, true)?;
        }
        Format::Geojson => {
            write_geojson(out, ws, &routes, &config.export.geojson_layers)?;
        }
    }

    log::info!(
        "build complete: {} edges, {} vertices, {} route(s) → {}",
        report.final_edges,
        report.final_vertices,
        routes.len(),
        out.display()
    );
    Ok(())
}

/// Delete loose files (not workspace directories) from the staging root.
fn remove_stray_files(root: &Path) -> Result<()> {
    if !root.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            log::debug!("removing stray file {}", entry.path().display());
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
