use serde::{Deserialize, Serialize};

use crate::physics::gravity::G0;

// ---------------------------------------------------------------------------
// Thruster geometry
// ---------------------------------------------------------------------------

/// One of six principal translation directions in the craft body frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationAxis {
    XPlus,
    XMinus,
    YPlus,
    YMinus,
    ZPlus,
    ZMinus,
}

/// Signed torque channel a thruster contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorqueAxis {
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
}

/// A single RCS thruster. Static per craft, loaded once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thruster {
    pub id: String,
    pub translation_axis: TranslationAxis,
    #[serde(default)]
    pub torque_axes: Vec<TorqueAxis>,
    pub thrust_n: f64,
    pub isp_s: f64,
    /// Shortest commandable pulse (s).
    pub min_impulse_s: f64,
    /// Fraction of time the thruster may fire continuously.
    pub max_duty_cycle: f64,
}

impl Thruster {
    /// Propellant mass flow while firing (kg/s).
    pub fn mass_flow_kg_s(&self) -> f64 {
        self.thrust_n / (self.isp_s * G0)
    }
}

/// Mounting geometry shared by the thrusters of one quad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcsCluster {
    pub id: String,
    pub radius_m: f64,
    pub angle_deg: f64,
    pub axial_offset_m: f64,
    pub thrusters: Vec<Thruster>,
}

/// Full RCS fit of one craft plus its propellant tank binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftRcs {
    pub craft_id: String,
    pub tank_id: String,
    pub clusters: Vec<RcsCluster>,
}

impl CraftRcs {
    pub fn thruster_count(&self) -> usize {
        self.clusters.iter().map(|c| c.thrusters.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thruster_mass_flow() {
        let thruster = Thruster {
            id: "quad_a_1".into(),
            translation_axis: TranslationAxis::XPlus,
            torque_axes: vec![TorqueAxis::PitchUp],
            thrust_n: 445.0, // R-4D class
            isp_s: 280.0,
            min_impulse_s: 0.012,
            max_duty_cycle: 0.8,
        };
        // 445 / (280 * 9.80665) ≈ 0.162 kg/s
        let flow = thruster.mass_flow_kg_s();
        assert!((flow - 0.162).abs() < 0.001, "Expected ~0.162 kg/s, got {:.4}", flow);
    }
}
