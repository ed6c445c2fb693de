use thiserror::Error;

// ---------------------------------------------------------------------------
// Recoverable simulation failures
// ---------------------------------------------------------------------------

/// Failures the tick loop can recover from. None of these stop the run:
/// a denied operation surfaces as an aborted autopilot or a failed event
/// and the clock keeps advancing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("tank `{tank}` holds {available:.4}, cannot debit {requested:.4}")]
    ResourceExhausted {
        tank: String,
        requested: f64,
        available: f64,
    },

    #[error("negative amount {amount:.4} requested on tank `{tank}`")]
    NegativeAmount { tank: String, amount: f64 },

    #[error("unknown tank id `{0}`")]
    UnknownTank(String),

    #[error("unknown craft id `{0}`")]
    UnknownCraft(String),

    #[error("unknown autopilot id `{0}`")]
    UnknownAutopilot(String),

    #[error("unknown event id `{0}` (prerequisite of `{1}`)")]
    UnknownEvent(String, String),

    #[error("no thrusters on craft `{craft}` match the pulse request")]
    NoThrustersMatched { craft: String },

    #[error("autopilot `{autopilot}` step {index} ends before its predecessor")]
    NonMonotonicScript { autopilot: String, index: usize },
}
