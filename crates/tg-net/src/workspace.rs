//! The staging workspace: the sole mutable shared state of a run.
//!
//! A `Workspace` owns the trail/edge/vertex tables plus a uniquely named
//! staging directory where the stats report (and any debug dumps) land.
//! Exactly one workspace exists per run; distinct runs use distinct names
//! and may coexist.  Teardown removes the directory; the in-memory tables
//! die with the value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tg_core::{EdgeId, Trail, VertexId};
use tg_geom::{PointIndex, SegmentIndex};

use crate::model::{Edge, Vertex, DEGREE_MIN_EDGE_LENGTH_M};
use crate::NetResult;

/// Staging workspace for one pipeline run.
pub struct Workspace {
    pub name: String,
    pub dir: PathBuf,
    pub region: String,

    pub trails: Vec<Trail>,
    pub edges: Vec<Edge>,
    pub vertices: Vec<Vertex>,
}

impl Workspace {
    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Create a uniquely named workspace directory under `root`.
    pub fn create(root: &Path, prefix: &str, region: &str) -> NetResult<Self> {
        let mut rng = SmallRng::from_entropy();
        let name = format!("{prefix}_{region}_{:06x}", rng.r#gen::<u32>() & 0xff_ffff);
        let dir = root.join(&name);
        fs::create_dir_all(&dir)?;
        log::info!("created staging workspace {name}");
        Ok(Self {
            name,
            dir,
            region: region.to_string(),
            trails: Vec::new(),
            edges: Vec::new(),
            vertices: Vec::new(),
        })
    }

    /// Remove the staging directory.  Idempotent.
    pub fn cleanup(&self) -> NetResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
            log::info!("removed staging workspace {}", self.name);
        }
        Ok(())
    }

    /// Remove every workspace under `root` whose name starts with `prefix`.
    pub fn cleanup_all(root: &Path, prefix: &str) -> NetResult<usize> {
        let mut removed = 0;
        for entry in list_workspaces(root, prefix)? {
            fs::remove_dir_all(&entry)?;
            removed += 1;
        }
        if removed > 0 {
            log::info!("removed {removed} staging workspace(s) under {}", root.display());
        }
        Ok(removed)
    }

    /// Workspaces under `root` older than the newest `keep_latest_n`,
    /// oldest first.
    pub fn list_old(root: &Path, prefix: &str, keep_latest_n: usize) -> NetResult<Vec<PathBuf>> {
        let mut entries: Vec<(SystemTime, PathBuf)> = list_workspaces(root, prefix)?
            .into_iter()
            .map(|p| {
                let mtime = fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, p)
            })
            .collect();
        entries.sort_by_key(|(t, _)| *t);
        let n = entries.len().saturating_sub(keep_latest_n);
        Ok(entries.into_iter().take(n).map(|(_, p)| p).collect())
    }

    /// Startup retention pruning: delete workspaces beyond `keep_latest_n`.
    pub fn prune_old(root: &Path, prefix: &str, keep_latest_n: usize) -> NetResult<usize> {
        let old = Self::list_old(root, prefix, keep_latest_n)?;
        let n = old.len();
        for p in old {
            log::debug!("pruning old workspace {}", p.display());
            fs::remove_dir_all(&p)?;
        }
        Ok(n)
    }

    // ── Spatial views ─────────────────────────────────────────────────────

    /// R-tree over the current vertex table.
    pub fn vertex_index(&self) -> PointIndex {
        PointIndex::build(self.vertices.iter().map(|v| (v.id.0, v.coord)))
    }

    /// R-tree over every segment of every current edge, tagged by edge id.
    pub fn edge_segment_index(&self) -> SegmentIndex {
        SegmentIndex::build(
            self.edges
                .iter()
                .flat_map(|e| e.geom.lines().map(move |seg| (e.id.0, seg))),
        )
    }

    // ── Table maintenance ─────────────────────────────────────────────────

    /// Set every vertex's `cnt` to the number of incident edges longer than
    /// 1 m.  Must run after any pass that touches edges or bindings.
    pub fn recompute_degrees(&mut self) {
        recompute_degrees(&mut self.vertices, &self.edges);
    }

    /// Delete degenerate edges and renumber.  Returns the number removed.
    pub fn remove_degenerate_edges(&mut self) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !e.is_degenerate());
        renumber_edges(&mut self.edges);
        before - self.edges.len()
    }

    /// Delete vertices with no incident edge at all (raw incidence, not the
    /// 1 m-filtered `cnt`) that are not preserved trail termini, renumbering
    /// vertices and rewriting edge bindings.  Returns the number removed.
    pub fn remove_orphan_vertices(&mut self) -> usize {
        let mut incident = vec![false; self.vertices.len()];
        for e in &self.edges {
            if e.source.is_valid() {
                incident[e.source.index()] = true;
            }
            if e.target.is_valid() {
                incident[e.target.index()] = true;
            }
        }
        let keep: Vec<bool> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| incident[i] || v.terminus)
            .collect();
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return 0;
        }
        compact_vertices(&mut self.vertices, &mut self.edges, &keep);
        removed
    }

    // ── Debug artifacts ───────────────────────────────────────────────────

    /// Write a JSON document into the staging directory.
    pub fn write_artifact(&self, file_name: &str, json: &serde_json::Value) -> NetResult<()> {
        let path = self.dir.join(file_name);
        fs::write(path, serde_json::to_vec_pretty(json).expect("serializable value"))?;
        Ok(())
    }
}

/// Immediate child directories of `root` whose name starts with `prefix`.
fn list_workspaces(root: &Path, prefix: &str) -> NetResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}

// ── Shared table helpers ──────────────────────────────────────────────────────
//
// Free functions so the collapse stage can run them against its staged
// copies before committing.

/// Recompute `cnt` for a vertex/edge table pair.
pub(crate) fn recompute_degrees(vertices: &mut [Vertex], edges: &[Edge]) {
    for v in vertices.iter_mut() {
        v.cnt = 0;
    }
    for e in edges {
        if e.length_m() <= DEGREE_MIN_EDGE_LENGTH_M {
            continue;
        }
        if e.source.is_valid() {
            vertices[e.source.index()].cnt += 1;
        }
        if e.target.is_valid() {
            vertices[e.target.index()].cnt += 1;
        }
    }
}

/// Reassign dense edge ids after a retain.
pub(crate) fn renumber_edges(edges: &mut [Edge]) {
    for (i, e) in edges.iter_mut().enumerate() {
        e.id = EdgeId::from_index(i);
    }
}

/// Drop vertices where `keep` is false, renumber the survivors, and rewrite
/// every edge binding through the old→new map.
pub(crate) fn compact_vertices(vertices: &mut Vec<Vertex>, edges: &mut [Edge], keep: &[bool]) {
    let mut remap: Vec<VertexId> = vec![VertexId::INVALID; vertices.len()];
    let mut next = 0;
    for (old, kept) in keep.iter().enumerate() {
        if *kept {
            remap[old] = VertexId::from_index(next);
            next += 1;
        }
    }

    let mut idx = 0;
    vertices.retain(|_| {
        let kept = keep[idx];
        idx += 1;
        kept
    });
    for (i, v) in vertices.iter_mut().enumerate() {
        v.id = VertexId::from_index(i);
    }

    for e in edges.iter_mut() {
        if e.source.is_valid() {
            e.source = remap[e.source.index()];
        }
        if e.target.is_valid() {
            e.target = remap[e.target.index()];
        }
    }
}
