use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Celestial body reference data
// ---------------------------------------------------------------------------

/// Immutable reference data for a gravitating body. Loaded once from the
/// mission dataset and never mutated during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: String,
    pub name: String,
    /// Gravitational parameter μ (m³/s²).
    pub mu: f64,
    /// Mean equatorial radius (m).
    pub radius: f64,
    /// Sphere-of-influence radius (m).
    pub soi_radius: f64,
}

impl CelestialBody {
    /// Circular orbit speed at radius `r` from the body center.
    pub fn circular_velocity(&self, r: f64) -> f64 {
        (self.mu / r.max(1.0)).sqrt()
    }

    /// Orbital period for semi-major axis `sma`.
    pub fn period(&self, sma: f64) -> f64 {
        2.0 * std::f64::consts::PI * (sma.max(1.0).powi(3) / self.mu).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    pub fn earth() -> CelestialBody {
        CelestialBody {
            id: "earth".into(),
            name: "Earth".into(),
            mu: 3.986_004_418e14,
            radius: 6_378_137.0,
            soi_radius: 9.24e8,
        }
    }

    pub fn moon() -> CelestialBody {
        CelestialBody {
            id: "moon".into(),
            name: "Moon".into(),
            mu: 4.904_869_5e12,
            radius: 1_737_400.0,
            soi_radius: 6.61e7,
        }
    }
}
