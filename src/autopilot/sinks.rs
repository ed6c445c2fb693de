use crate::autopilot::script::AttitudeTarget;
use crate::error::SimError;
use crate::rcs::controller::PulseSelector;

// ---------------------------------------------------------------------------
// Script effect seams
// ---------------------------------------------------------------------------

/// Propulsion-side effects a script can command. The simulation
/// implements this against the real propagator, ledger, and RCS
/// controller; runner unit tests drive it against fakes.
pub trait PropulsionSink {
    /// Command main-engine throttle for this tick and meter propellant
    /// for `dt` seconds at that level. Returns mass debited (kg).
    fn throttle_burn(&mut self, level: f64, dt: f64) -> Result<f64, SimError>;

    /// Ullage RCS flow for `dt` seconds, without main-engine thrust.
    /// Returns mass debited (kg).
    fn ullage_burn(&mut self, dt: f64) -> Result<f64, SimError>;

    /// Fire an RCS pulse. Returns total mass consumed (kg).
    fn rcs_pulse(
        &mut self,
        selector: &PulseSelector,
        duration_s: f64,
        count: u32,
        duty_cycle: f64,
    ) -> Result<f64, SimError>;

    /// Accumulated craft delta-v (m/s), impulsive and finite combined.
    fn total_delta_v(&self) -> f64;
}

/// Attitude-side commands. The kernel tracks the commanded target for
/// telemetry; closing the attitude loop is the flight controller's job,
/// outside this core.
pub trait AttitudeSink {
    fn set_attitude(&mut self, target: AttitudeTarget);
}

/// Combined bus handed to the runner each tick — one borrow covering
/// both seams.
pub trait ScriptBus: PropulsionSink + AttitudeSink {}

impl<T: PropulsionSink + AttitudeSink> ScriptBus for T {}
