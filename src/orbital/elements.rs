use nalgebra::Vector3;
use serde::Serialize;

use crate::orbital::body::CelestialBody;

// ---------------------------------------------------------------------------
// Classical orbital elements (derived, never persisted)
// ---------------------------------------------------------------------------

/// Keplerian elements recomputed on demand from a state vector. The tick
/// loop never stores these; they exist for snapshots and tolerance checks.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KeplerianElements {
    pub sma: f64,       // semi-major axis, m
    pub ecc: f64,       // eccentricity (0 = circular)
    pub inc: f64,       // inclination, rad
}

impl KeplerianElements {
    /// Derive elements from an inertial state vector around `mu`.
    pub fn from_state_vector(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Self {
        let r = pos.norm().max(1.0);
        let v = vel.norm();

        let h = pos.cross(vel);
        let h_mag = h.norm();

        // Eccentricity vector
        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();

        // Semi-major axis from vis-viva energy; near-parabolic falls back
        // to the angular-momentum form
        let energy = 0.5 * v * v - mu / r;
        let sma = if energy.abs() > 1e-12 && ecc < 1.0 - 1e-10 {
            -mu / (2.0 * energy)
        } else {
            h_mag * h_mag / (mu * (1.0 - ecc * ecc).abs().max(1e-10))
        };

        let inc = if h_mag > 1e-10 {
            (h.z / h_mag).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        KeplerianElements { sma, ecc, inc }
    }

    pub fn apoapsis_radius(&self) -> f64 {
        self.sma * (1.0 + self.ecc)
    }

    pub fn periapsis_radius(&self) -> f64 {
        self.sma * (1.0 - self.ecc)
    }

    pub fn period(&self, mu: f64) -> f64 {
        2.0 * std::f64::consts::PI * (self.sma.max(1.0).powi(3) / mu).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Display-oriented orbit figures
// ---------------------------------------------------------------------------

/// Altitude-referenced orbit numbers for snapshots and reports.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrbitFigures {
    pub apoapsis_altitude_m: f64,
    pub periapsis_altitude_m: f64,
    pub eccentricity: f64,
    pub period_s: f64,
}

impl OrbitFigures {
    pub fn derive(pos: &Vector3<f64>, vel: &Vector3<f64>, body: &CelestialBody) -> Self {
        let el = KeplerianElements::from_state_vector(pos, vel, body.mu);
        OrbitFigures {
            apoapsis_altitude_m: el.apoapsis_radius() - body.radius,
            periapsis_altitude_m: el.periapsis_radius() - body.radius,
            eccentricity: el.ecc,
            period_s: el.period(body.mu),
        }
    }
}

/// Inertial state vector for a circular equatorial orbit at `altitude`
/// above `body`, prograde (+Y velocity at +X position).
pub fn circular_state(body: &CelestialBody, altitude: f64) -> (Vector3<f64>, Vector3<f64>) {
    let r = body.radius + altitude;
    let v = body.circular_velocity(r);
    (Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0))
}
