use serde::Serialize;

use crate::error::SimError;
use crate::physics::gravity::G0;
use crate::resources::tank::{TankDef, TankKind};

// Float dust guard on over-debit checks
const DEBIT_EPS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Tank handles
// ---------------------------------------------------------------------------

/// Stable handle into the ledger's tank arena. String ids are resolved
/// once at load time; the hot tick path only passes handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TankId(usize);

#[derive(Debug, Clone)]
struct Tank {
    def: TankDef,
    quantity: f64,
    total_debited: f64,
    depletion_logged: bool,
}

// ---------------------------------------------------------------------------
// Margin report
// ---------------------------------------------------------------------------

/// Outward-facing remaining-quantity report for one tank.
#[derive(Debug, Clone, Serialize)]
pub struct TankMargin {
    pub id: String,
    pub kind: TankKind,
    pub quantity: f64,
    pub capacity: f64,
    pub fraction: f64,
    pub below_reserve: bool,
    /// Remaining usable delta-v where a propellant mapping exists.
    pub delta_v_mps: Option<f64>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Tracks every consumable tank as a depleting/replenishing quantity.
///
/// Invariant: quantity ∈ [0, capacity]. Debits fail rather than clamp;
/// credits clamp at capacity. Cross-tank effects are always explicit
/// calls from the RCS controller or the autopilot layer — the ledger
/// itself couples nothing.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    tanks: Vec<Tank>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: impl IntoIterator<Item = TankDef>) -> Self {
        let mut ledger = Self::new();
        for def in defs {
            ledger.add_tank(def);
        }
        ledger
    }

    pub fn add_tank(&mut self, def: TankDef) -> TankId {
        let quantity = def.initial.clamp(0.0, def.capacity);
        self.tanks.push(Tank {
            def,
            quantity,
            total_debited: 0.0,
            depletion_logged: false,
        });
        TankId(self.tanks.len() - 1)
    }

    /// Resolve a string id to a handle. Called once at load time.
    pub fn resolve(&self, id: &str) -> Result<TankId, SimError> {
        self.tanks
            .iter()
            .position(|t| t.def.id == id)
            .map(TankId)
            .ok_or_else(|| SimError::UnknownTank(id.to_string()))
    }

    pub fn id_of(&self, tank: TankId) -> &str {
        &self.tanks[tank.0].def.id
    }

    pub fn quantity(&self, tank: TankId) -> f64 {
        self.tanks[tank.0].quantity
    }

    pub fn total_debited(&self, tank: TankId) -> f64 {
        self.tanks[tank.0].total_debited
    }

    /// Remove `amount` from a tank. Over-debits fail without mutating;
    /// negative requests are rejected, never silently clamped.
    pub fn debit(&mut self, tank: TankId, amount: f64) -> Result<(), SimError> {
        let t = &mut self.tanks[tank.0];
        if amount < 0.0 {
            return Err(SimError::NegativeAmount {
                tank: t.def.id.clone(),
                amount,
            });
        }
        if amount > t.quantity + DEBIT_EPS {
            return Err(SimError::ResourceExhausted {
                tank: t.def.id.clone(),
                requested: amount,
                available: t.quantity,
            });
        }
        t.quantity = (t.quantity - amount).max(0.0);
        t.total_debited += amount;
        Ok(())
    }

    /// Add `amount` to a tank, clamped at capacity.
    pub fn credit(&mut self, tank: TankId, amount: f64) -> Result<(), SimError> {
        let t = &mut self.tanks[tank.0];
        if amount < 0.0 {
            return Err(SimError::NegativeAmount {
                tank: t.def.id.clone(),
                amount,
            });
        }
        t.quantity = (t.quantity + amount).min(t.def.capacity);
        Ok(())
    }

    /// Signed adjustment from an event effect payload. Effects must not
    /// fail, so both directions clamp to the [0, capacity] invariant.
    pub fn apply_delta(&mut self, tank: TankId, delta: f64) {
        let t = &mut self.tanks[tank.0];
        t.quantity = (t.quantity + delta).clamp(0.0, t.def.capacity);
    }

    /// Baseline depletion/replenishment for one tick. Runs dry at zero
    /// (logged once) instead of failing; ambient draw is background load,
    /// not a commanded operation.
    pub fn tick_ambient(&mut self, dt: f64) {
        for t in &mut self.tanks {
            if t.def.ambient_rate == 0.0 {
                continue;
            }
            t.quantity = (t.quantity - t.def.ambient_rate * dt).clamp(0.0, t.def.capacity);
            if t.quantity <= 0.0 && t.def.ambient_rate > 0.0 && !t.depletion_logged {
                log::warn!("tank `{}` depleted by ambient draw", t.def.id);
                t.depletion_logged = true;
            }
        }
    }

    /// Remaining quantity and, for propellant tanks with a delta-v
    /// reference, remaining usable delta-v via the Tsiolkovsky relation.
    pub fn margin_of(&self, tank: TankId) -> TankMargin {
        let t = &self.tanks[tank.0];
        let fraction = if t.def.capacity > 0.0 {
            t.quantity / t.def.capacity
        } else {
            0.0
        };
        let delta_v_mps = t.def.dv_reference.map(|dv| {
            let dry = dv.dry_mass_kg.max(1.0);
            dv.engine_isp_s * G0 * ((dry + t.quantity) / dry).ln()
        });
        TankMargin {
            id: t.def.id.clone(),
            kind: t.def.kind,
            quantity: t.quantity,
            capacity: t.def.capacity,
            fraction,
            below_reserve: fraction < t.def.reserve_fraction,
            delta_v_mps,
        }
    }

    pub fn margins(&self) -> Vec<TankMargin> {
        (0..self.tanks.len()).map(|i| self.margin_of(TankId(i))).collect()
    }

    /// Sum of mass-like tank contents (kg), for craft mass bookkeeping.
    pub fn mass_of(&self, tanks: &[TankId]) -> f64 {
        tanks
            .iter()
            .filter(|id| self.tanks[id.0].def.kind.is_mass())
            .map(|id| self.tanks[id.0].quantity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tank::TankDef;

    fn ledger_with_tank() -> (ResourceLedger, TankId) {
        let mut ledger = ResourceLedger::new();
        let id = ledger.add_tank(TankDef::propellant("sm_rcs", 100.0, 80.0));
        (ledger, id)
    }

    #[test]
    fn debit_and_credit_round_trip() {
        let (mut ledger, tank) = ledger_with_tank();
        ledger.debit(tank, 30.0).unwrap();
        assert!((ledger.quantity(tank) - 50.0).abs() < 1e-12);
        ledger.credit(tank, 10.0).unwrap();
        assert!((ledger.quantity(tank) - 60.0).abs() < 1e-12);
        assert!((ledger.total_debited(tank) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn over_debit_fails_without_mutating() {
        let (mut ledger, tank) = ledger_with_tank();
        let err = ledger.debit(tank, 80.1).unwrap_err();
        assert!(matches!(err, SimError::ResourceExhausted { .. }));
        assert!((ledger.quantity(tank) - 80.0).abs() < 1e-12, "Failed debit must not drain");
    }

    #[test]
    fn negative_amounts_rejected() {
        let (mut ledger, tank) = ledger_with_tank();
        assert!(matches!(
            ledger.debit(tank, -1.0),
            Err(SimError::NegativeAmount { .. })
        ));
        assert!(matches!(
            ledger.credit(tank, -1.0),
            Err(SimError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn credit_clamps_at_capacity() {
        let (mut ledger, tank) = ledger_with_tank();
        ledger.credit(tank, 500.0).unwrap();
        assert!((ledger.quantity(tank) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn ambient_draw_runs_dry_without_failing() {
        let mut ledger = ResourceLedger::new();
        let tank = ledger.add_tank(
            TankDef {
                id: "o2".into(),
                kind: TankKind::LifeSupport,
                capacity: 10.0,
                initial: 1.0,
                reserve_fraction: 0.0,
                ambient_rate: 0.5,
                dv_reference: None,
            },
        );
        for _ in 0..10 {
            ledger.tick_ambient(1.0);
        }
        assert_eq!(ledger.quantity(tank), 0.0);
    }

    #[test]
    fn margin_reports_reserve_and_delta_v() {
        let mut ledger = ResourceLedger::new();
        let tank = ledger.add_tank(
            TankDef::propellant("sps", 1_000.0, 400.0)
                .with_reserve(0.5)
                .with_dv_reference(314.0, 12_000.0),
        );
        let margin = ledger.margin_of(tank);
        assert!(margin.below_reserve, "40% remaining is under the 50% reserve");
        // Tsiolkovsky: 314 * g0 * ln(12400/12000) ≈ 101 m/s
        let dv = margin.delta_v_mps.unwrap();
        assert!((dv - 101.0).abs() < 2.0, "Expected ~101 m/s, got {:.1}", dv);
    }

    #[test]
    fn resolve_then_use_handles() {
        let (ledger, _) = ledger_with_tank();
        let handle = ledger.resolve("sm_rcs").unwrap();
        assert_eq!(ledger.id_of(handle), "sm_rcs");
        assert!(ledger.resolve("missing").is_err());
    }
}
