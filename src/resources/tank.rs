use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Consumable tank definitions
// ---------------------------------------------------------------------------

/// What a tank holds. Mass-like kinds (propellant, life support) count
/// toward craft mass; power is charge and does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankKind {
    Propellant,
    Power,
    LifeSupport,
}

impl TankKind {
    pub fn is_mass(&self) -> bool {
        !matches!(self, TankKind::Power)
    }
}

/// Tsiolkovsky mapping inputs for a propellant tank: the engine it feeds
/// and the stack mass that remains once the tank runs dry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DvReference {
    pub engine_isp_s: f64,
    pub dry_mass_kg: f64,
}

/// Baseline definition for one consumable tank, loaded once per run.
/// Units are kg for mass-like kinds and kWh for power.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankDef {
    pub id: String,
    pub kind: TankKind,
    pub capacity: f64,
    pub initial: f64,
    /// Fraction of capacity held back as mission reserve.
    #[serde(default)]
    pub reserve_fraction: f64,
    /// Baseline draw per second (negative replenishes, e.g. solar charge).
    #[serde(default)]
    pub ambient_rate: f64,
    #[serde(default)]
    pub dv_reference: Option<DvReference>,
}

impl TankDef {
    pub fn propellant(id: impl Into<String>, capacity: f64, initial: f64) -> Self {
        TankDef {
            id: id.into(),
            kind: TankKind::Propellant,
            capacity,
            initial,
            reserve_fraction: 0.0,
            ambient_rate: 0.0,
            dv_reference: None,
        }
    }

    pub fn with_reserve(mut self, fraction: f64) -> Self {
        self.reserve_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_ambient_rate(mut self, rate: f64) -> Self {
        self.ambient_rate = rate;
        self
    }

    pub fn with_dv_reference(mut self, engine_isp_s: f64, dry_mass_kg: f64) -> Self {
        self.dv_reference = Some(DvReference {
            engine_isp_s,
            dry_mass_kg,
        });
        self
    }
}
