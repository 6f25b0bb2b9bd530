//! The preference cost model.
//!
//! Cost measures deviation from the user's pattern — lower is better.
//! Three weighted components: elevation-gain rate, distance, and shape.
//! Each banded component combines a smooth deviation term with a step
//! preference over value bands as `0.7 · deviation + 0.3 · preference`.
//!
//! Everything here is a pure function of (config, pattern, achieved facts),
//! so the model is unit-testable in isolation.

use tg_core::config::{BandedCost, CostConfig, RoutePattern, RouteShape};

/// Weight of the deviation term within one banded component.
const DEVIATION_SHARE: f64 = 0.7;
/// Weight of the band-preference term within one banded component.
const PREFERENCE_SHARE: f64 = 0.3;

/// Achieved metrics of a candidate route.
#[derive(Debug, Clone, Copy)]
pub struct RouteFacts {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub shape: RouteShape,
}

/// Fixed per-shape preference cost.
pub fn shape_cost(shape: RouteShape) -> f64 {
    match shape {
        RouteShape::Loop => 0.0,
        RouteShape::OutAndBack => 0.1,
        RouteShape::PointToPoint => 0.3,
    }
}

/// Elevation component: deviation of the gain *rate* (m/km) from the
/// pattern's implied target rate, plus the rate-band preference.
pub fn elevation_cost(cfg: &BandedCost, pattern: &RoutePattern, facts: &RouteFacts) -> f64 {
    if facts.distance_km <= 0.0 {
        return 1.0;
    }
    let rate = facts.elevation_gain_m / facts.distance_km;
    let target_rate = pattern.target_elevation_gain / pattern.target_distance_km;

    let deviation = if target_rate > 0.0 {
        ((rate - target_rate).abs() / target_rate * cfg.deviation_weight)
            .powf(cfg.deviation_exponent)
    } else {
        // No climbing requested: any gain is pure deviation.
        (rate / 100.0 * cfg.deviation_weight).powf(cfg.deviation_exponent)
    };
    let preference = cfg.band_cost(rate);

    DEVIATION_SHARE * deviation + PREFERENCE_SHARE * preference
}

/// Distance component: symmetric around the target; bands are over the
/// percent deviation `|achieved − target| / target × 100`.
pub fn distance_cost(cfg: &BandedCost, pattern: &RoutePattern, facts: &RouteFacts) -> f64 {
    let deviation_pct =
        (facts.distance_km - pattern.target_distance_km).abs() / pattern.target_distance_km * 100.0;
    let deviation =
        (deviation_pct / 100.0 * cfg.deviation_weight).powf(cfg.deviation_exponent);
    let preference = cfg.band_cost(deviation_pct);

    DEVIATION_SHARE * deviation + PREFERENCE_SHARE * preference
}

/// Total weighted preference cost.  Lower is better; 0 is a perfect match.
pub fn total_cost(cfg: &CostConfig, pattern: &RoutePattern, facts: &RouteFacts) -> f64 {
    let w = &cfg.priority_weights;
    elevation_cost(&cfg.elevation, pattern, facts) * w.elevation
        + distance_cost(&cfg.distance, pattern, facts) * w.distance
        + shape_cost(facts.shape) * w.shape
}
