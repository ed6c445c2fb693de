use serde::{Deserialize, Serialize};

use crate::physics::gravity::G0;

// ---------------------------------------------------------------------------
// Craft definition
// ---------------------------------------------------------------------------

/// Main engine parameters driven by `Throttle`/`ThrottleRamp` steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineParams {
    pub thrust_n: f64,
    pub isp_s: f64,
}

impl EngineParams {
    /// Full-throttle propellant mass flow (kg/s).
    pub fn mass_flow_kg_s(&self) -> f64 {
        self.thrust_n / (self.isp_s * G0)
    }
}

/// Spacecraft definition: mass properties, main engine, and the tanks
/// whose contents ride along in the stack mass. Static per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftDef {
    pub id: String,
    pub name: String,
    pub dry_mass_kg: f64,
    pub engine: EngineParams,
    /// Tank ids whose mass-like contents count toward stack mass.
    #[serde(default)]
    pub tanks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_flow_relation() {
        let engine = EngineParams {
            thrust_n: 91_190.0, // SPS-class
            isp_s: 314.0,
        };
        // thrust / (isp * g0) ≈ 29.6 kg/s
        let flow = engine.mass_flow_kg_s();
        assert!((flow - 29.6).abs() < 0.1, "Expected ~29.6 kg/s, got {:.2}", flow);
    }
}
