//! Elevation statistics over aligned z arrays.

/// Summary of an elevation profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationStats {
    pub gain: f64,
    pub loss: f64,
    pub max: f64,
    pub min: f64,
    pub avg: f64,
}

impl ElevationStats {
    /// Compute gain/loss/max/min/avg from a z array.  Empty input yields
    /// the zero profile.
    pub fn of(elevations: &[f64]) -> Self {
        if elevations.is_empty() {
            return Self::default();
        }
        let mut stats = ElevationStats {
            gain: 0.0,
            loss: 0.0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            avg: 0.0,
        };
        let mut sum = 0.0;
        for w in elevations.windows(2) {
            let d = w[1] - w[0];
            if d > 0.0 {
                stats.gain += d;
            } else {
                stats.loss -= d;
            }
        }
        for &z in elevations {
            stats.max = stats.max.max(z);
            stats.min = stats.min.min(z);
            sum += z;
        }
        stats.avg = sum / elevations.len() as f64;
        stats
    }
}
