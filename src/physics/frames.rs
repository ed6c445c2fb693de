use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Burn direction frames
// ---------------------------------------------------------------------------

/// Directional frame an impulse is commanded in, resolved against the
/// current state vector at the instant the burn applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnFrame {
    Prograde,
    Retrograde,
    RadialOut,
    RadialIn,
    Normal,
    AntiNormal,
}

impl BurnFrame {
    /// Unit vector for this direction in the inertial frame.
    ///
    /// Degenerate states (zero velocity, zero radius, rectilinear motion)
    /// fall back to fixed axes so the caller never sees a NaN direction.
    pub fn unit_vector(&self, pos: &Vector3<f64>, vel: &Vector3<f64>) -> Vector3<f64> {
        let r_hat = safe_unit(pos, Vector3::x());
        let v_hat = safe_unit(vel, Vector3::y());
        let n_hat = safe_unit(&pos.cross(vel), Vector3::z());

        match self {
            BurnFrame::Prograde => v_hat,
            BurnFrame::Retrograde => -v_hat,
            BurnFrame::RadialOut => r_hat,
            BurnFrame::RadialIn => -r_hat,
            BurnFrame::Normal => n_hat,
            BurnFrame::AntiNormal => -n_hat,
        }
    }
}

fn safe_unit(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 1e-9 {
        v / n
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prograde_follows_velocity() {
        let pos = Vector3::new(7.0e6, 0.0, 0.0);
        let vel = Vector3::new(0.0, 7_500.0, 0.0);
        let u = BurnFrame::Prograde.unit_vector(&pos, &vel);
        assert!((u - Vector3::y()).norm() < 1e-12);
    }

    #[test]
    fn retrograde_opposes_prograde() {
        let pos = Vector3::new(7.0e6, 0.0, 0.0);
        let vel = Vector3::new(0.0, 7_500.0, 0.0);
        let p = BurnFrame::Prograde.unit_vector(&pos, &vel);
        let r = BurnFrame::Retrograde.unit_vector(&pos, &vel);
        assert!((p + r).norm() < 1e-12);
    }

    #[test]
    fn normal_is_orbit_plane_normal() {
        let pos = Vector3::new(7.0e6, 0.0, 0.0);
        let vel = Vector3::new(0.0, 7_500.0, 0.0);
        let n = BurnFrame::Normal.unit_vector(&pos, &vel);
        assert!((n - Vector3::z()).norm() < 1e-12, "Equatorial prograde orbit → +Z normal");
    }

    #[test]
    fn zero_state_falls_back_without_nan() {
        let u = BurnFrame::Prograde.unit_vector(&Vector3::zeros(), &Vector3::zeros());
        assert!(u.norm() > 0.99 && u.iter().all(|c| c.is_finite()));
    }
}
