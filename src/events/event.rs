use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Mission events
// ---------------------------------------------------------------------------

/// Where an event sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Armed,
    Active,
    Complete,
    Failed,
    Skipped,
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventStatus::Complete | EventStatus::Failed | EventStatus::Skipped
        )
    }
}

/// A signed quantity change on a named tank, applied by an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub tank_id: String,
    pub delta: f64,
}

/// Side effects applied when an event resolves. Resource deltas hit the
/// ledger; the comms flag and breadcrumb are surfaced on snapshots for
/// external collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectPayload {
    #[serde(default)]
    pub resource_deltas: Vec<ResourceDelta>,
    #[serde(default)]
    pub comms_blackout: Option<bool>,
    #[serde(default)]
    pub breadcrumb: Option<String>,
}

impl EffectPayload {
    pub fn is_empty(&self) -> bool {
        self.resource_deltas.is_empty()
            && self.comms_blackout.is_none()
            && self.breadcrumb.is_none()
    }
}

/// One gated mission event, immutable apart from its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub phase: String,
    pub craft_id: String,
    /// Window open, GET seconds. Absent = open from the start.
    #[serde(default)]
    pub open_get_s: Option<f64>,
    /// Window close, GET seconds. Absent = never expires.
    #[serde(default)]
    pub close_get_s: Option<f64>,
    #[serde(default)]
    pub autopilot_id: Option<String>,
    #[serde(default)]
    pub checklist_id: Option<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub success_effects: EffectPayload,
    #[serde(default)]
    pub failure_effects: EffectPayload,
}
