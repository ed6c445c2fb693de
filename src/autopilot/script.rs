use serde::{Deserialize, Serialize};

use crate::autopilot::pad::{AbortPolicy, BurnPad};
use crate::error::SimError;
use crate::rcs::controller::PulseSelector;

// ---------------------------------------------------------------------------
// Step commands
// ---------------------------------------------------------------------------

/// Commanded attitude angles, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttitudeTarget {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Spacecraft computer keypad entry. Logged as a procedural action; no
/// physical effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DskyEntry {
    #[serde(default)]
    pub verb: Option<u8>,
    #[serde(default)]
    pub noun: Option<u8>,
    #[serde(default)]
    pub program: Option<u8>,
    #[serde(default)]
    pub registers: Vec<String>,
    #[serde(default)]
    pub sequence: Vec<String>,
    #[serde(default, rename = "macro")]
    pub macro_name: Option<String>,
}

/// One autopilot command. A closed set — adding a kind is a compile-time
/// checked change at every dispatch site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    AttitudeHold { roll: f64, pitch: f64, yaw: f64 },
    Throttle { level: f64 },
    ThrottleRamp { from: f64, to: f64 },
    UllageFire,
    RcsPulse {
        selector: PulseSelector,
        duration_s: f64,
        count: u32,
        #[serde(default = "default_duty")]
        duty_cycle: f64,
    },
    Dsky { entry: DskyEntry },
}

fn default_duty() -> f64 {
    1.0
}

impl Step {
    /// Discrete commands dispatch once on entry; continuous commands
    /// re-apply every tick their window is in force.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Step::RcsPulse { .. } | Step::Dsky { .. } | Step::AttitudeHold { .. })
    }
}

/// A step with its window relative to script start. `duration_s` of zero
/// marks a one-shot command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedStep {
    pub start_s: f64,
    #[serde(default)]
    pub duration_s: f64,
    pub step: Step,
}

impl TimedStep {
    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }

    pub fn in_force(&self, elapsed_s: f64) -> bool {
        if self.duration_s > 0.0 {
            elapsed_s >= self.start_s && elapsed_s < self.end_s()
        } else {
            elapsed_s >= self.start_s
        }
    }
}

// ---------------------------------------------------------------------------
// Autopilot definition
// ---------------------------------------------------------------------------

/// Ullage sub-binding: the tank and flow rate drawn while an `UllageFire`
/// step is in force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UllageBinding {
    pub tank_id: String,
    pub flow_kg_s: f64,
}

/// A scripted autopilot: ordered steps, propulsion bindings, expected
/// burn profile, and abort policy. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutopilotDef {
    pub id: String,
    pub craft_id: String,
    /// Main-engine propellant tank.
    pub tank_id: String,
    #[serde(default)]
    pub ullage: Option<UllageBinding>,
    pub steps: Vec<TimedStep>,
    #[serde(default)]
    pub pad: Option<BurnPad>,
    #[serde(default)]
    pub abort_policy: AbortPolicy,
}

impl AutopilotDef {
    /// Total script duration: end of the last step window.
    pub fn duration_s(&self) -> f64 {
        self.steps.iter().map(TimedStep::end_s).fold(0.0, f64::max)
    }

    pub fn first_step_start_s(&self) -> f64 {
        self.steps.first().map(|s| s.start_s).unwrap_or(0.0)
    }

    /// Load-time check: step end times must be non-decreasing. A failure
    /// here is a dataset defect, caught before the run starts — the tick
    /// loop itself tolerates out-of-order steps defensively.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut prev_end = f64::NEG_INFINITY;
        for (index, step) in self.steps.iter().enumerate() {
            if step.end_s() < prev_end {
                return Err(SimError::NonMonotonicScript {
                    autopilot: self.id.clone(),
                    index,
                });
            }
            prev_end = step.end_s();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(start_s: f64, duration_s: f64) -> TimedStep {
        TimedStep {
            start_s,
            duration_s,
            step: Step::Throttle { level: 1.0 },
        }
    }

    fn def(steps: Vec<TimedStep>) -> AutopilotDef {
        AutopilotDef {
            id: "ap_test".into(),
            craft_id: "csm".into(),
            tank_id: "sps".into(),
            ullage: None,
            steps,
            pad: None,
            abort_policy: AbortPolicy::default(),
        }
    }

    #[test]
    fn duration_is_last_window_end() {
        let d = def(vec![step(0.0, 4.0), step(4.0, 6.0)]);
        assert!((d.duration_s() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn monotonic_script_validates() {
        assert!(def(vec![step(0.0, 4.0), step(4.0, 6.0)]).validate().is_ok());
    }

    #[test]
    fn decreasing_end_times_are_a_defect() {
        let err = def(vec![step(0.0, 10.0), step(1.0, 2.0)]).validate().unwrap_err();
        assert!(matches!(err, SimError::NonMonotonicScript { index: 1, .. }));
    }

    #[test]
    fn window_semantics() {
        let timed = step(2.0, 3.0);
        assert!(!timed.in_force(1.9));
        assert!(timed.in_force(2.0));
        assert!(timed.in_force(4.9));
        assert!(!timed.in_force(5.0), "Window is half-open at the end");

        let one_shot = step(2.0, 0.0);
        assert!(one_shot.in_force(2.0));
        assert!(one_shot.in_force(100.0), "Zero-duration stays eligible until dispatched");
    }

    #[test]
    fn step_json_round_trip() {
        let original = Step::RcsPulse {
            selector: PulseSelector::Thrusters(vec!["qa_fwd".into()]),
            duration_s: 0.5,
            count: 4,
            duty_cycle: 0.6,
        };
        let json = serde_json::to_string(&original).unwrap();
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
