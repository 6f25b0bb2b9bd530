//! Shape classification and route naming.

use tg_core::config::RouteShape;
use tg_core::{EdgeId, VertexId};

/// Classify a route from its vertex and edge sequences.
///
/// - **out-and-back** — the edge list is palindromic around a midpoint
///   (the path retraces itself; it also ends where it started, so this
///   test must run before the loop test);
/// - **loop** — start vertex equals end vertex;
/// - **point-to-point** — everything else.
pub fn classify(vertices: &[VertexId], edges: &[EdgeId]) -> RouteShape {
    if is_palindromic(edges) {
        return RouteShape::OutAndBack;
    }
    if vertices.len() >= 2 && vertices.first() == vertices.last() {
        return RouteShape::Loop;
    }
    RouteShape::PointToPoint
}

fn is_palindromic(edges: &[EdgeId]) -> bool {
    if edges.is_empty() || edges.len() % 2 != 0 {
        return false;
    }
    edges.iter().zip(edges.iter().rev()).all(|(a, b)| a == b)
}

/// Human-readable shape suffix for display names.
fn shape_suffix(shape: RouteShape) -> &'static str {
    match shape {
        RouteShape::Loop => "Loop",
        RouteShape::OutAndBack => "Out-and-Back",
        RouteShape::PointToPoint => "Point-to-Point",
    }
}

/// Generate a route name from the distinct constituent trail names, in
/// encounter order:
///
/// - one trail → the trail name;
/// - two → `"A/B Route"`;
/// - three or more → `"first/last Route"`;
///
/// with the shape suffix appended unless the name already contains it.
pub fn route_name(trail_names: &[String], shape: RouteShape) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for name in trail_names {
        let name = name.trim();
        if name.is_empty() || name == "connector" {
            continue;
        }
        if !distinct.contains(&name) {
            distinct.push(name);
        }
    }

    let base = match distinct.len() {
        0 => "Unnamed Route".to_string(),
        1 => distinct[0].to_string(),
        2 => format!("{}/{} Route", distinct[0], distinct[1]),
        _ => format!("{}/{} Route", distinct[0], distinct[distinct.len() - 1]),
    };

    let suffix = shape_suffix(shape);
    if base.to_lowercase().contains(&suffix.to_lowercase()) {
        base
    } else {
        format!("{base} {suffix}")
    }
}
