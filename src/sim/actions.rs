use serde::{Deserialize, Serialize};

use crate::autopilot::script::DskyEntry;

// ---------------------------------------------------------------------------
// Operator actions
// ---------------------------------------------------------------------------

/// Discrete inputs injected from outside the tick loop: crew checklist
/// acknowledgements and manual DSKY work. Applied at the scheduler
/// ordering point of the tick they fall on, exactly where the automated
/// equivalent would run — which is what keeps auto and manual runs
/// comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperatorAction {
    ChecklistAck { checklist_id: String },
    Dsky { craft_id: String, entry: DskyEntry },
}

/// An action stamped with the GET at which it applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedAction {
    pub get_s: f64,
    pub action: OperatorAction,
}

/// Chronological record of every action applied during a run. Feeding
/// the log back into a fresh manual-mode simulation reproduces the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    pub actions: Vec<TimedAction>,
}

impl ActionLog {
    pub fn record(&mut self, get_s: f64, action: OperatorAction) {
        self.actions.push(TimedAction { get_s, action });
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedAction> {
        self.actions.iter()
    }
}
