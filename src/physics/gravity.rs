use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

/// Standard gravity (m/s²), used in the rocket mass-flow relation.
pub const G0: f64 = 9.80665;

// ---------------------------------------------------------------------------
// Two-body gravity
// ---------------------------------------------------------------------------

/// Point-mass gravitational acceleration a = −μ·r/|r|³.
///
/// `pos` is the position vector from the body center (m, inertial).
/// Degenerate radii are floored rather than divided through, so a corrupt
/// state produces zero acceleration instead of stopping the tick loop.
pub fn gravity_accel(mu: f64, pos: &Vector3<f64>) -> Vector3<f64> {
    let r = pos.norm();
    if r < 1.0 {
        return Vector3::zeros();
    }
    -mu / (r * r * r) * pos
}
