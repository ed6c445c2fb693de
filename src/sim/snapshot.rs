use serde::Serialize;

use crate::autopilot::pad::BurnReport;
use crate::autopilot::runner::{RunProgress, RunnerStats};
use crate::autopilot::script::AttitudeTarget;
use crate::events::scheduler::{EventCounts, EventView};
use crate::orbital::propagator::OrbitSummary;
use crate::resources::ledger::TankMargin;

// ---------------------------------------------------------------------------
// Outward projections
// ---------------------------------------------------------------------------

/// A failure breadcrumb left by an event effect, for post-run analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Breadcrumb {
    pub get_s: f64,
    pub event_id: String,
    pub note: String,
}

/// Read-only projection of the whole simulation at one GET. Handed to
/// presentation collaborators, never written back.
#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub get_s: f64,
    pub get: String,
    pub orbit: OrbitSummary,
    pub tanks: Vec<TankMargin>,
    pub events: Vec<EventView>,
    pub autopilots: Vec<RunProgress>,
    pub commanded_attitude: Option<AttitudeTarget>,
    pub comms_blackout: bool,
}

/// Aggregate totals emitted once, when a run terminates.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_get_s: f64,
    pub final_get: String,
    pub events: EventCounts,
    pub autopilot: RunnerStats,
    pub total_delta_v_mps: f64,
    pub tanks: Vec<TankMargin>,
    pub reports: Vec<BurnReport>,
    pub breadcrumbs: Vec<Breadcrumb>,
}
