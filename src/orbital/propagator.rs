use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::orbital::body::CelestialBody;
use crate::orbital::elements::OrbitFigures;
use crate::physics::frames::BurnFrame;
use crate::physics::gravity::gravity_accel;
use crate::ring::RingBuffer;

// ---------------------------------------------------------------------------
// Orbital state
// ---------------------------------------------------------------------------

/// Reference frame tag carried on the state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTag {
    BodyCenteredInertial,
}

/// Position/velocity at a GET instant. Owned exclusively by the
/// propagator; everything outside sees copies.
#[derive(Debug, Clone, Serialize)]
pub struct OrbitalState {
    pub get_s: f64,
    pub pos: Vector3<f64>, // m
    pub vel: Vector3<f64>, // m/s
    pub frame: FrameTag,
}

/// One applied impulse, kept in a bounded history.
#[derive(Debug, Clone, Serialize)]
pub struct ImpulseRecord {
    pub get_s: f64,
    pub dv_mps: f64,
    pub frame: BurnFrame,
}

/// Altitude-over-time sample for trajectory plots.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrajectorySample {
    pub get_s: f64,
    pub altitude_m: f64,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// History capture settings. Both buffers are fixed-capacity rings.
#[derive(Debug, Clone)]
pub struct PropagatorConfig {
    pub impulse_capacity: usize,
    pub capture_history: bool,
    pub sample_interval_s: f64,
    pub max_samples: usize,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            impulse_capacity: 64,
            capture_history: true,
            sample_interval_s: 10.0,
            max_samples: 2_048,
        }
    }
}

// ---------------------------------------------------------------------------
// Propagator
// ---------------------------------------------------------------------------

/// Per-craft orbit summary handed outward each tick.
#[derive(Debug, Clone, Serialize)]
pub struct OrbitSummary {
    pub get_s: f64,
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub altitude_m: f64,
    pub speed_mps: f64,
    pub figures: OrbitFigures,
    pub total_delta_v_mps: f64,
    pub last_impulse: Option<ImpulseRecord>,
}

/// Integrates a two-body orbital state forward in time and applies
/// instantaneous impulses.
///
/// Integration is RK4 at tick-sized steps, which keeps a circular LEO
/// within a few meters of its analytic radius over multi-hour runs.
/// Explicit Euler at tick rate does not and is deliberately not offered.
pub struct OrbitalPropagator {
    body: CelestialBody,
    state: OrbitalState,
    thrust_accel: Vector3<f64>, // finite-burn accel held constant over a tick, m/s²
    total_delta_v: f64,
    impulses: RingBuffer<ImpulseRecord>,
    samples: RingBuffer<TrajectorySample>,
    next_sample_get: f64,
    config: PropagatorConfig,
}

impl OrbitalPropagator {
    pub fn new(body: CelestialBody, pos: Vector3<f64>, vel: Vector3<f64>, get_s: f64) -> Self {
        Self::with_config(body, pos, vel, get_s, PropagatorConfig::default())
    }

    pub fn with_config(
        body: CelestialBody,
        pos: Vector3<f64>,
        vel: Vector3<f64>,
        get_s: f64,
        config: PropagatorConfig,
    ) -> Self {
        let mut prop = Self {
            body,
            state: OrbitalState {
                get_s,
                pos,
                vel,
                frame: FrameTag::BodyCenteredInertial,
            },
            thrust_accel: Vector3::zeros(),
            total_delta_v: 0.0,
            impulses: RingBuffer::new(config.impulse_capacity),
            samples: RingBuffer::new(config.max_samples),
            next_sample_get: get_s + config.sample_interval_s,
            config,
        };
        prop.capture_sample();
        prop
    }

    pub fn state(&self) -> &OrbitalState {
        &self.state
    }

    pub fn body(&self) -> &CelestialBody {
        &self.body
    }

    pub fn altitude(&self) -> f64 {
        self.state.pos.norm() - self.body.radius
    }

    pub fn total_delta_v(&self) -> f64 {
        self.total_delta_v
    }

    /// Finite-thrust acceleration applied over the next `update` call.
    /// Reset to zero at the start of every tick by the loop.
    pub fn set_thrust_accel(&mut self, accel: Vector3<f64>) {
        self.thrust_accel = accel;
    }

    pub fn thrust_accel(&self) -> Vector3<f64> {
        self.thrust_accel
    }

    /// Advance the state by `dt` seconds, ending at GET `get_s`.
    ///
    /// One RK4 step of two-body gravity plus the current thrust term.
    /// Finite-burn delta-v is accumulated here so script metrics see the
    /// same total as the impulse path.
    pub fn update(&mut self, dt: f64, get_s: f64) {
        if dt <= 0.0 {
            self.state.get_s = get_s;
            return;
        }

        let mu = self.body.mu;
        let thrust = self.thrust_accel;
        let accel = |pos: &Vector3<f64>| gravity_accel(mu, pos) + thrust;

        let (pos, vel) = (self.state.pos, self.state.vel);

        let k1_dr = vel;
        let k1_dv = accel(&pos);
        let k2_dr = vel + k1_dv * (dt * 0.5);
        let k2_dv = accel(&(pos + k1_dr * (dt * 0.5)));
        let k3_dr = vel + k2_dv * (dt * 0.5);
        let k3_dv = accel(&(pos + k2_dr * (dt * 0.5)));
        let k4_dr = vel + k3_dv * dt;
        let k4_dv = accel(&(pos + k3_dr * dt));

        self.state.pos = pos + (k1_dr + 2.0 * k2_dr + 2.0 * k3_dr + k4_dr) * (dt / 6.0);
        self.state.vel = vel + (k1_dv + 2.0 * k2_dv + 2.0 * k3_dv + k4_dv) * (dt / 6.0);
        self.state.get_s = get_s;

        self.total_delta_v += thrust.norm() * dt;

        if self.config.capture_history && get_s >= self.next_sample_get {
            self.capture_sample();
            self.next_sample_get = get_s + self.config.sample_interval_s;
        }
    }

    /// Apply an instantaneous velocity increment resolved from `frame`
    /// into the inertial frame, and record it.
    pub fn apply_delta_v(&mut self, dv_mps: f64, frame: BurnFrame, get_s: f64) {
        let dir = frame.unit_vector(&self.state.pos, &self.state.vel);
        self.state.vel += dir * dv_mps;
        self.total_delta_v += dv_mps.abs();

        let record = ImpulseRecord {
            get_s,
            dv_mps,
            frame,
        };
        log::debug!(
            "impulse {:+.1} m/s {:?} at GET {:.1}s (total {:.1} m/s)",
            dv_mps,
            frame,
            get_s,
            self.total_delta_v
        );
        self.impulses.push(record);
    }

    /// Position/velocity, derived elements, and burn metrics.
    pub fn summary(&self) -> OrbitSummary {
        OrbitSummary {
            get_s: self.state.get_s,
            pos: self.state.pos,
            vel: self.state.vel,
            altitude_m: self.altitude(),
            speed_mps: self.state.vel.norm(),
            figures: OrbitFigures::derive(&self.state.pos, &self.state.vel, &self.body),
            total_delta_v_mps: self.total_delta_v,
            last_impulse: self.impulses.latest().cloned(),
        }
    }

    /// Bounded impulse history, oldest first.
    pub fn impulse_history(&self) -> Vec<ImpulseRecord> {
        self.impulses.to_vec()
    }

    /// Time-sampled altitude trajectory, oldest first. Empty when history
    /// capture is disabled.
    pub fn history_snapshot(&self) -> Vec<TrajectorySample> {
        if self.config.capture_history {
            self.samples.to_vec()
        } else {
            Vec::new()
        }
    }

    fn capture_sample(&mut self) {
        if self.config.capture_history {
            self.samples.push(TrajectorySample {
                get_s: self.state.get_s,
                altitude_m: self.altitude(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::body::presets;
    use crate::orbital::elements::circular_state;

    fn leo_propagator() -> OrbitalPropagator {
        let earth = presets::earth();
        let (pos, vel) = circular_state(&earth, 185_000.0);
        OrbitalPropagator::new(earth, pos, vel, 0.0)
    }

    #[test]
    fn circular_orbit_radius_holds_for_hours() {
        let mut prop = leo_propagator();
        let r0 = prop.state().pos.norm();

        // Two hours of simulated time at the 20 Hz tick rate
        let dt = 0.05;
        let steps = (2.0 * 3_600.0 / dt) as usize;
        for i in 1..=steps {
            prop.update(dt, i as f64 * dt);
        }

        let drift = (prop.state().pos.norm() - r0).abs();
        assert!(
            drift < 5_000.0,
            "Circular orbit drifted {:.0} m after 2 h; allowed 5 km",
            drift
        );
    }

    #[test]
    fn prograde_impulse_raises_apoapsis() {
        let mut prop = leo_propagator();
        let before = prop.summary().figures.apoapsis_altitude_m;
        prop.apply_delta_v(30.0, BurnFrame::Prograde, 0.0);
        let after = prop.summary().figures.apoapsis_altitude_m;
        assert!(
            after > before,
            "Prograde burn must raise apoapsis: {:.0} → {:.0}",
            before,
            after
        );
    }

    #[test]
    fn retrograde_impulse_lowers_periapsis() {
        let mut prop = leo_propagator();
        let before = prop.summary().figures.periapsis_altitude_m;
        prop.apply_delta_v(30.0, BurnFrame::Retrograde, 0.0);
        let after = prop.summary().figures.periapsis_altitude_m;
        assert!(after < before);
    }

    #[test]
    fn delta_v_metrics_accumulate() {
        let mut prop = leo_propagator();
        prop.apply_delta_v(10.0, BurnFrame::Prograde, 0.0);
        prop.apply_delta_v(5.0, BurnFrame::Retrograde, 1.0);
        assert!((prop.total_delta_v() - 15.0).abs() < 1e-12);
        let last = prop.summary().last_impulse.unwrap();
        assert_eq!(last.frame, BurnFrame::Retrograde);
    }

    #[test]
    fn finite_thrust_counts_toward_delta_v() {
        let mut prop = leo_propagator();
        prop.set_thrust_accel(Vector3::new(0.0, 2.0, 0.0));
        prop.update(0.05, 0.05);
        assert!((prop.total_delta_v() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn impulse_history_is_bounded() {
        let earth = presets::earth();
        let (pos, vel) = circular_state(&earth, 185_000.0);
        let config = PropagatorConfig {
            impulse_capacity: 4,
            ..Default::default()
        };
        let mut prop = OrbitalPropagator::with_config(earth, pos, vel, 0.0, config);
        for i in 0..10 {
            prop.apply_delta_v(1.0, BurnFrame::Prograde, i as f64);
        }
        let history = prop.impulse_history();
        assert_eq!(history.len(), 4);
        assert!((history[0].get_s - 6.0).abs() < 1e-12, "Oldest kept entry should be GET 6");
    }

    #[test]
    fn trajectory_sampling_respects_interval() {
        let earth = presets::earth();
        let (pos, vel) = circular_state(&earth, 185_000.0);
        let config = PropagatorConfig {
            sample_interval_s: 1.0,
            max_samples: 8,
            ..Default::default()
        };
        let mut prop = OrbitalPropagator::with_config(earth, pos, vel, 0.0, config);
        let dt = 0.05;
        for i in 1..=400 {
            prop.update(dt, i as f64 * dt); // 20 s
        }
        let samples = prop.history_snapshot();
        assert_eq!(samples.len(), 8, "Ring should cap retained samples");
        let span = samples.last().unwrap().get_s - samples[0].get_s;
        assert!(span >= 7.0, "Samples should be ~1 s apart, span was {:.1}", span);
    }
}
