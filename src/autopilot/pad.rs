use serde::{Deserialize, Serialize};

use crate::autopilot::script::AttitudeTarget;

// ---------------------------------------------------------------------------
// Expected values and tolerances
// ---------------------------------------------------------------------------

/// An expected value with absolute and/or percentage tolerance. Either
/// tolerance satisfying is sufficient; with neither set the value is
/// informational and always passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expected {
    pub value: f64,
    #[serde(default)]
    pub tol_abs: Option<f64>,
    /// Percentage, e.g. 5.0 = ±5%.
    #[serde(default)]
    pub tol_pct: Option<f64>,
}

impl Expected {
    pub fn exact(value: f64) -> Self {
        Expected {
            value,
            tol_abs: None,
            tol_pct: None,
        }
    }

    pub fn with_abs(value: f64, tol_abs: f64) -> Self {
        Expected {
            value,
            tol_abs: Some(tol_abs),
            tol_pct: None,
        }
    }

    pub fn with_pct(value: f64, tol_pct: f64) -> Self {
        Expected {
            value,
            tol_abs: None,
            tol_pct: Some(tol_pct),
        }
    }

    pub fn deviation(&self, actual: f64) -> f64 {
        actual - self.value
    }

    /// Deviation measured in multiples of the most forgiving configured
    /// tolerance. ≤ 1 passes; values past the abort policy's hard
    /// multiplier abort. No tolerance configured → 0 (always passes).
    pub fn severity(&self, actual: f64) -> f64 {
        let dev = self.deviation(actual).abs();
        let abs_ratio = self.tol_abs.map(|t| {
            if t > 0.0 {
                dev / t
            } else if dev > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        });
        let pct_ratio = self.tol_pct.map(|p| {
            let allowed = self.value.abs() * p / 100.0;
            if allowed > 0.0 {
                dev / allowed
            } else if dev > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        });
        match (abs_ratio, pct_ratio) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => 0.0,
        }
    }

    pub fn within(&self, actual: f64) -> bool {
        self.severity(actual) <= 1.0
    }
}

// ---------------------------------------------------------------------------
// PAD
// ---------------------------------------------------------------------------

/// Pre-Advisory Data: the uplinked expected burn profile scripts are
/// judged against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurnPad {
    #[serde(default)]
    pub delivery_get_s: Option<f64>,
    #[serde(default)]
    pub valid_until_get_s: Option<f64>,
    /// Time of ignition, GET seconds.
    #[serde(default)]
    pub tig_get_s: Option<f64>,
    #[serde(default)]
    pub attitude: Option<AttitudeTarget>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub burn_s: Option<Expected>,
    #[serde(default)]
    pub propellant_kg: Option<Expected>,
    #[serde(default)]
    pub delta_v_mps: Option<Expected>,
    #[serde(default)]
    pub ullage_s: Option<Expected>,
    #[serde(default)]
    pub ullage_kg: Option<Expected>,
}

/// The metric a tolerance check judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnMetric {
    BurnSeconds,
    PropellantKg,
    DeltaVMps,
    UllageSeconds,
    UllageKg,
}

/// One metric's judgement in a completed-burn report.
#[derive(Debug, Clone, Serialize)]
pub struct ToleranceCheck {
    pub metric: BurnMetric,
    pub expected: f64,
    pub actual: f64,
    pub deviation: f64,
    pub severity: f64,
    pub passed: bool,
}

/// How hard a tolerance miss must be before the script aborts rather
/// than completing with a recorded miss. Exposed as policy because the
/// flight rules differ per mission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbortPolicy {
    /// Deviations beyond `hard_multiplier` × tolerance abort the script.
    pub hard_multiplier: f64,
}

impl Default for AbortPolicy {
    fn default() -> Self {
        Self { hard_multiplier: 2.0 }
    }
}

// ---------------------------------------------------------------------------
// Achieved metrics and report
// ---------------------------------------------------------------------------

/// Metrics actually achieved by a script run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BurnMetrics {
    pub burn_s: f64,
    pub propellant_kg: f64,
    pub delta_v_mps: f64,
    pub ullage_s: f64,
    pub ullage_kg: f64,
}

/// Per-script completion summary handed to analysis tooling.
#[derive(Debug, Clone, Serialize)]
pub struct BurnReport {
    pub autopilot_id: String,
    pub completed_get_s: f64,
    pub metrics: BurnMetrics,
    pub checks: Vec<ToleranceCheck>,
    pub status: super::runner::RunnerStatus,
    pub reason: super::runner::FinishReason,
}

impl BurnPad {
    /// Judge achieved metrics against every expected value carried by
    /// this PAD. Checks come back in a fixed metric order.
    pub fn evaluate(&self, metrics: &BurnMetrics) -> Vec<ToleranceCheck> {
        let pairs = [
            (BurnMetric::BurnSeconds, self.burn_s, metrics.burn_s),
            (BurnMetric::PropellantKg, self.propellant_kg, metrics.propellant_kg),
            (BurnMetric::DeltaVMps, self.delta_v_mps, metrics.delta_v_mps),
            (BurnMetric::UllageSeconds, self.ullage_s, metrics.ullage_s),
            (BurnMetric::UllageKg, self.ullage_kg, metrics.ullage_kg),
        ];
        pairs
            .into_iter()
            .filter_map(|(metric, expected, actual)| {
                expected.map(|exp| {
                    let severity = exp.severity(actual);
                    ToleranceCheck {
                        metric,
                        expected: exp.value,
                        actual,
                        deviation: exp.deviation(actual),
                        severity,
                        passed: severity <= 1.0,
                    }
                })
            })
            .collect()
    }
}
