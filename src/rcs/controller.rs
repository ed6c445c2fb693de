use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::rcs::cluster::{CraftRcs, Thruster, TorqueAxis, TranslationAxis};
use crate::resources::ledger::{ResourceLedger, TankId};

// ---------------------------------------------------------------------------
// Pulse requests
// ---------------------------------------------------------------------------

/// Which thrusters a pulse fires: explicit ids win; otherwise every
/// thruster on the craft matching the translation or torque axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseSelector {
    Axis(TranslationAxis),
    Torque(TorqueAxis),
    Thrusters(Vec<String>),
}

/// Stable handle for a craft registered with the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RcsCraftId(usize);

/// A resolved pulse command.
#[derive(Debug, Clone)]
pub struct PulseRequest {
    pub craft: RcsCraftId,
    pub selector: PulseSelector,
    pub duration_s: f64,
    pub count: u32,
    /// Commanded on-fraction of the pulse train (0, 1].
    pub duty_cycle: f64,
    pub get_s: f64,
    pub autopilot_id: Option<String>,
}

/// Per-cluster consumption line reported to usage listeners.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterUsage {
    pub cluster: String,
    pub firing_s: f64,
    pub mass_kg: f64,
}

/// Result of a completed pulse.
#[derive(Debug, Clone, Serialize)]
pub struct PulseOutcome {
    pub craft_id: String,
    pub mass_kg: f64,
    /// Total thruster-seconds of firing across the selection.
    pub firing_s: f64,
}

/// Telemetry hook notified after every successful pulse.
pub trait UsageListener {
    fn on_pulse(&mut self, craft_id: &str, get_s: f64, usage: &[ClusterUsage]);
}

/// Lifetime aggregate per cluster.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClusterTotals {
    pub pulses: u64,
    pub firing_s: f64,
    pub mass_kg: f64,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct CraftEntry {
    rcs: CraftRcs,
    tank: TankId,
}

/// Translates pulse requests into per-thruster firing time and propellant
/// mass, debiting the craft's bound tank through the ledger.
#[derive(Default)]
pub struct RcsController {
    crafts: Vec<CraftEntry>,
    listeners: Vec<Box<dyn UsageListener>>,
    usage_by_cluster: BTreeMap<String, ClusterTotals>,
}

impl RcsController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a craft's RCS fit, resolving its tank binding.
    pub fn add_craft(
        &mut self,
        rcs: CraftRcs,
        ledger: &ResourceLedger,
    ) -> Result<RcsCraftId, SimError> {
        let tank = ledger.resolve(&rcs.tank_id)?;
        self.crafts.push(CraftEntry { rcs, tank });
        Ok(RcsCraftId(self.crafts.len() - 1))
    }

    pub fn resolve(&self, craft_id: &str) -> Result<RcsCraftId, SimError> {
        self.crafts
            .iter()
            .position(|c| c.rcs.craft_id == craft_id)
            .map(RcsCraftId)
            .ok_or_else(|| SimError::UnknownCraft(craft_id.to_string()))
    }

    pub fn add_listener(&mut self, listener: Box<dyn UsageListener>) {
        self.listeners.push(listener);
    }

    /// Aggregate usage statistics keyed by cluster id.
    pub fn usage_by_cluster(&self) -> &BTreeMap<String, ClusterTotals> {
        &self.usage_by_cluster
    }

    /// Fire a pulse. Resolves the selection, meters firing time per
    /// thruster, and debits the total mass in one call — if the tank
    /// cannot cover it, nothing fires.
    pub fn execute_pulse(
        &mut self,
        req: &PulseRequest,
        ledger: &mut ResourceLedger,
    ) -> Result<PulseOutcome, SimError> {
        let entry = &self.crafts[req.craft.0];
        let craft_id = entry.rcs.craft_id.clone();

        // (cluster idx, thruster) selection across all clusters
        let mut selected: Vec<(usize, &Thruster)> = Vec::new();
        for (ci, cluster) in entry.rcs.clusters.iter().enumerate() {
            for thruster in &cluster.thrusters {
                if selector_matches(&req.selector, thruster) {
                    selected.push((ci, thruster));
                }
            }
        }
        if selected.is_empty() {
            return Err(SimError::NoThrustersMatched { craft: craft_id });
        }

        let commanded_duty = req.duty_cycle.clamp(1e-3, 1.0);
        let count = req.count.max(1) as f64;

        let mut total_mass = 0.0;
        let mut total_firing = 0.0;
        let mut per_cluster: BTreeMap<usize, ClusterUsage> = BTreeMap::new();

        for (ci, thruster) in &selected {
            // Commanded on-time, floored at the minimum impulse per pulse
            // and scaled down where the commanded duty exceeds the
            // thruster's thermal limit.
            let per_pulse = req.duration_s.max(thruster.min_impulse_s);
            let effective_duty = commanded_duty.min(thruster.max_duty_cycle.clamp(1e-3, 1.0));
            let firing = per_pulse * count * (effective_duty / commanded_duty);
            let mass = thruster.mass_flow_kg_s() * firing;

            total_mass += mass;
            total_firing += firing;
            let usage = per_cluster.entry(*ci).or_insert_with(|| ClusterUsage {
                cluster: entry.rcs.clusters[*ci].id.clone(),
                firing_s: 0.0,
                mass_kg: 0.0,
            });
            usage.firing_s += firing;
            usage.mass_kg += mass;
        }

        // Single atomic debit: insufficient propellant denies the pulse
        let tank = entry.tank;
        ledger.debit(tank, total_mass)?;

        let usage: Vec<ClusterUsage> = per_cluster.into_values().collect();
        for line in &usage {
            let totals = self.usage_by_cluster.entry(line.cluster.clone()).or_default();
            totals.pulses += 1;
            totals.firing_s += line.firing_s;
            totals.mass_kg += line.mass_kg;
        }
        for listener in &mut self.listeners {
            listener.on_pulse(&craft_id, req.get_s, &usage);
        }

        log::debug!(
            "rcs pulse on `{}`: {} thrusters, {:.3} kg over {:.2} thruster-s",
            craft_id,
            selected.len(),
            total_mass,
            total_firing
        );

        Ok(PulseOutcome {
            craft_id,
            mass_kg: total_mass,
            firing_s: total_firing,
        })
    }
}

fn selector_matches(selector: &PulseSelector, thruster: &Thruster) -> bool {
    match selector {
        PulseSelector::Axis(axis) => thruster.translation_axis == *axis,
        PulseSelector::Torque(axis) => thruster.torque_axes.contains(axis),
        PulseSelector::Thrusters(ids) => ids.iter().any(|id| *id == thruster.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::gravity::G0;
    use crate::rcs::cluster::RcsCluster;
    use crate::resources::tank::TankDef;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quad(id: &str, axis: TranslationAxis, torque: Vec<TorqueAxis>) -> Thruster {
        Thruster {
            id: id.into(),
            translation_axis: axis,
            torque_axes: torque,
            thrust_n: 445.0,
            isp_s: 280.0,
            min_impulse_s: 0.012,
            max_duty_cycle: 1.0,
        }
    }

    fn test_rig() -> (RcsController, ResourceLedger, RcsCraftId, TankId) {
        let mut ledger = ResourceLedger::new();
        let tank = ledger.add_tank(TankDef::propellant("sm_rcs", 100.0, 100.0));

        let rcs = CraftRcs {
            craft_id: "csm".into(),
            tank_id: "sm_rcs".into(),
            clusters: vec![
                RcsCluster {
                    id: "quad_a".into(),
                    radius_m: 2.0,
                    angle_deg: 0.0,
                    axial_offset_m: 0.5,
                    thrusters: vec![
                        quad("qa_fwd", TranslationAxis::XPlus, vec![TorqueAxis::PitchUp]),
                        quad("qa_aft", TranslationAxis::XMinus, vec![TorqueAxis::PitchDown]),
                    ],
                },
                RcsCluster {
                    id: "quad_b".into(),
                    radius_m: 2.0,
                    angle_deg: 90.0,
                    axial_offset_m: 0.5,
                    thrusters: vec![quad("qb_fwd", TranslationAxis::XPlus, vec![TorqueAxis::YawLeft])],
                },
            ],
        };

        let mut controller = RcsController::new();
        let craft = controller.add_craft(rcs, &ledger).unwrap();
        (controller, ledger, craft, tank)
    }

    fn axis_request(craft: RcsCraftId, duration_s: f64, count: u32) -> PulseRequest {
        PulseRequest {
            craft,
            selector: PulseSelector::Axis(TranslationAxis::XPlus),
            duration_s,
            count,
            duty_cycle: 1.0,
            get_s: 100.0,
            autopilot_id: None,
        }
    }

    #[test]
    fn mass_matches_rocket_relation_and_debit() {
        let (mut controller, mut ledger, craft, tank) = test_rig();
        let outcome = controller
            .execute_pulse(&axis_request(craft, 2.0, 3), &mut ledger)
            .unwrap();

        // Two XPlus thrusters × 2 s × 3 pulses at 445/(280·g0) kg/s each
        let expected = 2.0 * (445.0 / (280.0 * G0)) * 6.0;
        assert!(
            (outcome.mass_kg - expected).abs() < 1e-9,
            "Mass must equal Σ thrust/(isp·g0)·t: {} vs {}",
            outcome.mass_kg,
            expected
        );
        assert!(
            (ledger.total_debited(tank) - outcome.mass_kg).abs() < 1e-12,
            "Debited mass must equal consumed mass"
        );
    }

    #[test]
    fn torque_selection_picks_tagged_thrusters() {
        let (mut controller, mut ledger, craft, _) = test_rig();
        let req = PulseRequest {
            selector: PulseSelector::Torque(TorqueAxis::YawLeft),
            ..axis_request(craft, 1.0, 1)
        };
        let outcome = controller.execute_pulse(&req, &mut ledger).unwrap();
        let expected = (445.0 / (280.0 * G0)) * 1.0; // qb_fwd only
        assert!((outcome.mass_kg - expected).abs() < 1e-9);
    }

    #[test]
    fn explicit_thruster_ids_win() {
        let (mut controller, mut ledger, craft, _) = test_rig();
        let req = PulseRequest {
            selector: PulseSelector::Thrusters(vec!["qa_aft".into()]),
            ..axis_request(craft, 1.0, 2)
        };
        let outcome = controller.execute_pulse(&req, &mut ledger).unwrap();
        assert!((outcome.firing_s - 2.0).abs() < 1e-12, "One thruster, 2 pulses × 1 s");
    }

    #[test]
    fn min_impulse_floors_short_pulses() {
        let (mut controller, mut ledger, craft, _) = test_rig();
        let outcome = controller
            .execute_pulse(&axis_request(craft, 0.001, 1), &mut ledger)
            .unwrap();
        // Two thrusters floored at 12 ms each
        assert!((outcome.firing_s - 0.024).abs() < 1e-12);
    }

    #[test]
    fn duty_cycle_clamp_scales_firing_down() {
        let mut ledger = ResourceLedger::new();
        ledger.add_tank(TankDef::propellant("sm_rcs", 100.0, 100.0));
        let mut thruster = quad("limited", TranslationAxis::ZPlus, vec![]);
        thruster.max_duty_cycle = 0.5;
        let rcs = CraftRcs {
            craft_id: "lm".into(),
            tank_id: "sm_rcs".into(),
            clusters: vec![RcsCluster {
                id: "quad".into(),
                radius_m: 1.5,
                angle_deg: 0.0,
                axial_offset_m: 0.0,
                thrusters: vec![thruster],
            }],
        };
        let mut controller = RcsController::new();
        let craft = controller.add_craft(rcs, &ledger).unwrap();

        let req = PulseRequest {
            craft,
            selector: PulseSelector::Axis(TranslationAxis::ZPlus),
            duration_s: 10.0,
            count: 1,
            duty_cycle: 1.0,
            get_s: 0.0,
            autopilot_id: None,
        };
        let outcome = controller.execute_pulse(&req, &mut ledger).unwrap();
        assert!(
            (outcome.firing_s - 5.0).abs() < 1e-9,
            "10 s continuous at 0.5 duty limit → 5 s on-time, got {}",
            outcome.firing_s
        );
    }

    #[test]
    fn exhausted_tank_denies_whole_pulse() {
        let mut ledger = ResourceLedger::new();
        let tank = ledger.add_tank(TankDef::propellant("sm_rcs", 100.0, 0.01));
        let rcs = CraftRcs {
            craft_id: "csm".into(),
            tank_id: "sm_rcs".into(),
            clusters: vec![RcsCluster {
                id: "quad_a".into(),
                radius_m: 2.0,
                angle_deg: 0.0,
                axial_offset_m: 0.5,
                thrusters: vec![quad("qa_fwd", TranslationAxis::XPlus, vec![])],
            }],
        };
        let mut controller = RcsController::new();
        let craft = controller.add_craft(rcs, &ledger).unwrap();

        let err = controller
            .execute_pulse(&axis_request(craft, 5.0, 2), &mut ledger)
            .unwrap_err();
        assert!(matches!(err, SimError::ResourceExhausted { .. }));
        assert!(
            (ledger.quantity(tank) - 0.01).abs() < 1e-15,
            "Denied pulse must leave the tank untouched"
        );
    }

    #[test]
    fn no_match_is_an_error() {
        let (mut controller, mut ledger, craft, _) = test_rig();
        let req = PulseRequest {
            selector: PulseSelector::Axis(TranslationAxis::YMinus),
            ..axis_request(craft, 1.0, 1)
        };
        assert!(matches!(
            controller.execute_pulse(&req, &mut ledger),
            Err(SimError::NoThrustersMatched { .. })
        ));
    }

    #[test]
    fn listeners_and_aggregates_see_cluster_breakdown() {
        let (mut controller, mut ledger, craft, _) = test_rig();

        #[derive(Default)]
        struct Recorder {
            lines: Rc<RefCell<Vec<(String, f64)>>>,
        }
        impl UsageListener for Recorder {
            fn on_pulse(&mut self, _craft: &str, _get: f64, usage: &[ClusterUsage]) {
                for u in usage {
                    self.lines.borrow_mut().push((u.cluster.clone(), u.mass_kg));
                }
            }
        }

        let lines = Rc::new(RefCell::new(Vec::new()));
        controller.add_listener(Box::new(Recorder { lines: lines.clone() }));
        controller
            .execute_pulse(&axis_request(craft, 1.0, 1), &mut ledger)
            .unwrap();

        let seen = lines.borrow();
        assert_eq!(seen.len(), 2, "XPlus spans quad_a and quad_b");
        assert!(seen.iter().any(|(c, _)| c == "quad_a"));
        assert!(seen.iter().any(|(c, _)| c == "quad_b"));

        let totals = controller.usage_by_cluster();
        assert_eq!(totals["quad_a"].pulses, 1);
        assert!(totals["quad_b"].mass_kg > 0.0);
    }
}
