use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::autopilot::pad::BurnReport;
use crate::autopilot::runner::{AutopilotRunner, RunId, RunnerStatus};
use crate::autopilot::script::{AttitudeTarget, AutopilotDef};
use crate::autopilot::sinks::{AttitudeSink, PropulsionSink};
use crate::craft::{CraftDef, EngineParams};
use crate::error::SimError;
use crate::events::event::{EffectPayload, EventDef, EventStatus};
use crate::events::scheduler::{EventId, EventScheduler};
use crate::orbital::body::CelestialBody;
use crate::orbital::elements::circular_state;
use crate::orbital::propagator::{OrbitalPropagator, PropagatorConfig};
use crate::physics::frames::BurnFrame;
use crate::rcs::cluster::CraftRcs;
use crate::rcs::controller::{PulseRequest, PulseSelector, RcsController, RcsCraftId};
use crate::resources::ledger::{ResourceLedger, TankId};
use crate::resources::tank::TankDef;
use crate::sim::actions::{ActionLog, OperatorAction, TimedAction};
use crate::sim::clock::{format_get, SimClock};
use crate::sim::snapshot::{Breadcrumb, RunSummary, TickSnapshot};

// ---------------------------------------------------------------------------
// Mission definition and configuration
// ---------------------------------------------------------------------------

/// Initial orbital state for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialOrbit {
    Circular { altitude_m: f64 },
    StateVector { pos_m: [f64; 3], vel_mps: [f64; 3] },
}

/// Who works the checklists: a deterministic crew model, or recorded
/// operator actions replayed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewMode {
    Auto,
    Manual,
}

/// The immutable dataset a run is built from. Loading and validating
/// this from files is the surrounding tooling's job; the kernel takes
/// it ready-made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDef {
    pub name: String,
    pub body: CelestialBody,
    pub initial_orbit: InitialOrbit,
    pub crafts: Vec<CraftDef>,
    pub tanks: Vec<TankDef>,
    #[serde(default)]
    pub rcs: Vec<CraftRcs>,
    #[serde(default)]
    pub autopilots: Vec<AutopilotDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

/// Tick-loop configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tick_hz: f64,
    pub start_get_s: f64,
    pub crew: CrewMode,
    /// Auto-crew delay between a checklist arming and its acknowledgement.
    pub checklist_ack_delay_s: f64,
    pub propagator: PropagatorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20.0,
            start_get_s: 0.0,
            crew: CrewMode::Auto,
            checklist_ack_delay_s: 5.0,
            propagator: PropagatorConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved bindings
// ---------------------------------------------------------------------------

/// Per-autopilot handles resolved once at build time, so the tick path
/// never hashes a string.
#[derive(Debug, Clone, Copy)]
struct ScriptBinding {
    engine: EngineParams,
    main_tank: TankId,
    ullage: Option<(TankId, f64)>,
    rcs_craft: Option<RcsCraftId>,
}

// ---------------------------------------------------------------------------
// Script bus: the sinks wired to the real components
// ---------------------------------------------------------------------------

struct SimBus<'a> {
    propagator: &'a mut OrbitalPropagator,
    ledger: &'a mut ResourceLedger,
    rcs: &'a mut RcsController,
    binding: ScriptBinding,
    autopilot_id: &'a str,
    mass_tanks: &'a [TankId],
    dry_mass_kg: f64,
    commanded_attitude: &'a mut Option<AttitudeTarget>,
    get_s: f64,
}

impl PropulsionSink for SimBus<'_> {
    fn throttle_burn(&mut self, level: f64, dt: f64) -> Result<f64, SimError> {
        let level = level.clamp(0.0, 1.0);
        if level <= 0.0 || dt <= 0.0 {
            return Ok(0.0);
        }

        let kg = self.binding.engine.mass_flow_kg_s() * level * dt;
        self.ledger.debit(self.binding.main_tank, kg)?;

        // Thrust along the current velocity direction. Attitude is
        // telemetry here; the burn frame of record is prograde.
        let mass = self.dry_mass_kg + self.ledger.mass_of(self.mass_tanks);
        let accel = self.binding.engine.thrust_n * level / mass.max(1.0);
        let state = self.propagator.state();
        let dir = BurnFrame::Prograde.unit_vector(&state.pos, &state.vel);
        let current = self.propagator.thrust_accel();
        self.propagator.set_thrust_accel(current + dir * accel);
        Ok(kg)
    }

    fn ullage_burn(&mut self, dt: f64) -> Result<f64, SimError> {
        match self.binding.ullage {
            Some((tank, flow_kg_s)) => {
                let kg = flow_kg_s * dt;
                self.ledger.debit(tank, kg)?;
                Ok(kg)
            }
            // Script carries an ullage step with no binding: a dataset
            // gap, tolerated as a dry no-op
            None => Ok(0.0),
        }
    }

    fn rcs_pulse(
        &mut self,
        selector: &PulseSelector,
        duration_s: f64,
        count: u32,
        duty_cycle: f64,
    ) -> Result<f64, SimError> {
        let Some(craft) = self.binding.rcs_craft else {
            log::warn!(
                "autopilot `{}` pulsed RCS on a craft with no thruster fit",
                self.autopilot_id
            );
            return Ok(0.0);
        };
        let req = PulseRequest {
            craft,
            selector: selector.clone(),
            duration_s,
            count,
            duty_cycle,
            get_s: self.get_s,
            autopilot_id: Some(self.autopilot_id.to_string()),
        };
        let outcome = self.rcs.execute_pulse(&req, self.ledger)?;
        Ok(outcome.mass_kg)
    }

    fn total_delta_v(&self) -> f64 {
        self.propagator.total_delta_v()
    }
}

impl AttitudeSink for SimBus<'_> {
    fn set_attitude(&mut self, target: AttitudeTarget) {
        *self.commanded_attitude = Some(target);
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The tick loop. Owns every mutable piece of simulation state and
/// advances it in a fixed order each tick: scheduler transitions →
/// autopilot dispatch → physical mutation → snapshot. Collaborators get
/// immutable snapshots and inject discrete operator actions only.
pub struct Simulation {
    name: String,
    config: SimConfig,
    clock: SimClock,
    propagator: OrbitalPropagator,
    ledger: ResourceLedger,
    rcs: RcsController,
    autopilots: AutopilotRunner,
    scheduler: EventScheduler,
    bindings: Vec<ScriptBinding>,
    run_for_event: Vec<Option<RunId>>,
    armed_get: Vec<Option<f64>>,
    mass_tanks: Vec<TankId>,
    dry_mass_kg: f64,
    pending_actions: Vec<TimedAction>,
    action_log: ActionLog,
    commanded_attitude: Option<AttitudeTarget>,
    comms_blackout: bool,
    breadcrumbs: Vec<Breadcrumb>,
    stopped: bool,
}

impl Simulation {
    pub fn new(def: MissionDef, config: SimConfig) -> Result<Self, SimError> {
        let ledger = ResourceLedger::from_defs(def.tanks.clone());

        let mut rcs = RcsController::new();
        for fit in def.rcs.clone() {
            rcs.add_craft(fit, &ledger)?;
        }

        // Stack mass bookkeeping: every distinct tank named by a craft
        let mut mass_tanks: Vec<TankId> = Vec::new();
        for craft in &def.crafts {
            for tank_id in &craft.tanks {
                let handle = ledger.resolve(tank_id)?;
                if !mass_tanks.contains(&handle) {
                    mass_tanks.push(handle);
                }
            }
        }
        let dry_mass_kg = def.crafts.iter().map(|c| c.dry_mass_kg).sum();

        let mut bindings = Vec::with_capacity(def.autopilots.len());
        for ap in &def.autopilots {
            ap.validate()?;
            let craft = def
                .crafts
                .iter()
                .find(|c| c.id == ap.craft_id)
                .ok_or_else(|| SimError::UnknownCraft(ap.craft_id.clone()))?;
            let ullage = match &ap.ullage {
                Some(binding) => Some((ledger.resolve(&binding.tank_id)?, binding.flow_kg_s)),
                None => None,
            };
            bindings.push(ScriptBinding {
                engine: craft.engine,
                main_tank: ledger.resolve(&ap.tank_id)?,
                ullage,
                rcs_craft: rcs.resolve(&ap.craft_id).ok(),
            });
        }

        let mut autopilots = AutopilotRunner::new(def.autopilots.clone());
        let scheduler = EventScheduler::new(def.events.clone())?;

        let mut run_for_event = vec![None; scheduler.len()];
        for event in scheduler.event_ids() {
            if let Some(ap_id) = scheduler.def(event).autopilot_id.clone() {
                let ap = autopilots.resolve(&ap_id)?;
                run_for_event[event.index()] = Some(autopilots.create_run(ap));
            }
        }

        let (pos, vel) = match def.initial_orbit {
            InitialOrbit::Circular { altitude_m } => circular_state(&def.body, altitude_m),
            InitialOrbit::StateVector { pos_m, vel_mps } => (
                Vector3::new(pos_m[0], pos_m[1], pos_m[2]),
                Vector3::new(vel_mps[0], vel_mps[1], vel_mps[2]),
            ),
        };
        let propagator = OrbitalPropagator::with_config(
            def.body,
            pos,
            vel,
            config.start_get_s,
            config.propagator.clone(),
        );

        let armed_get = vec![None; scheduler.len()];
        Ok(Self {
            name: def.name,
            clock: SimClock::starting_at(config.start_get_s, config.tick_hz),
            config,
            propagator,
            ledger,
            rcs,
            autopilots,
            scheduler,
            bindings,
            run_for_event,
            armed_get,
            mass_tanks,
            dry_mass_kg,
            pending_actions: Vec::new(),
            action_log: ActionLog::default(),
            commanded_attitude: None,
            comms_blackout: false,
            breadcrumbs: Vec::new(),
            stopped: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_s(&self) -> f64 {
        self.clock.get_s()
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    /// Queue an operator action for the tick its GET stamp falls on.
    pub fn inject_action(&mut self, get_s: f64, action: OperatorAction) {
        self.pending_actions.push(TimedAction { get_s, action });
        self.pending_actions
            .sort_by(|a, b| a.get_s.total_cmp(&b.get_s));
    }

    /// External stop request: the current snapshot becomes the last.
    pub fn request_stop(&mut self) {
        self.stopped = true;
    }

    /// Advance one tick and emit the resulting snapshot.
    pub fn step(&mut self) -> TickSnapshot {
        let dt = self.clock.dt();
        let get = self.clock.advance();

        self.propagator.set_thrust_accel(Vector3::zeros());

        // --- Scheduler phase: operator actions, then gating ---
        self.apply_due_actions(get);
        if self.config.crew == CrewMode::Auto {
            self.auto_crew(get);
        }
        for (event, status) in self.scheduler.update(get) {
            if status == EventStatus::Armed {
                self.armed_get[event.index()] = Some(get);
                if let Some(run) = self.run_for_event[event.index()] {
                    self.autopilots.arm(run, get);
                }
            }
        }

        // --- Autopilot phase: dispatch every live script ---
        for event in self.scheduler.event_ids() {
            let Some(run) = self.run_for_event[event.index()] else {
                continue;
            };
            let before = self.autopilots.status(run);
            if before.is_terminal() {
                continue;
            }
            // A skipped or checklist-resolved event must not fire its
            // script after the fact
            if !matches!(
                self.scheduler.status(event),
                EventStatus::Armed | EventStatus::Active
            ) {
                continue;
            }

            let ap = self.autopilots.ap_of_run(run);
            let binding = self.bindings[ap.index()];
            let def_id_owned;
            {
                let def: &AutopilotDef = self.autopilots.def(ap);
                def_id_owned = def.id.clone();
            }
            let mut bus = SimBus {
                propagator: &mut self.propagator,
                ledger: &mut self.ledger,
                rcs: &mut self.rcs,
                binding,
                autopilot_id: &def_id_owned,
                mass_tanks: &self.mass_tanks,
                dry_mass_kg: self.dry_mass_kg,
                commanded_attitude: &mut self.commanded_attitude,
                get_s: get,
            };
            self.autopilots.tick_run(run, get, dt, &mut bus);

            let after = self.autopilots.status(run);
            if before == RunnerStatus::Armed && after != RunnerStatus::Armed {
                self.scheduler.mark_active(event, get);
            }
            match after {
                RunnerStatus::Complete if before != RunnerStatus::Complete => {
                    let effects = self.scheduler.complete(event, get);
                    self.apply_effects(event, &effects, get);
                }
                RunnerStatus::Aborted if before != RunnerStatus::Aborted => {
                    let effects = self.scheduler.fail(event, get);
                    self.apply_effects(event, &effects, get);
                }
                _ => {}
            }
        }

        // --- Physical phase: ambient draw, then integrate ---
        self.ledger.tick_ambient(dt);
        self.propagator.update(dt, get);

        self.snapshot()
    }

    /// Run until the target GET (or an external stop), returning the
    /// aggregate summary. The last emitted snapshot is the final one.
    pub fn run_until(&mut self, target_get_s: f64) -> RunSummary {
        while self.clock.get_s() < target_get_s && !self.stopped {
            self.step();
        }
        self.summary()
    }

    /// Immutable projection of the current state.
    pub fn snapshot(&self) -> TickSnapshot {
        let get_s = self.clock.get_s();
        TickSnapshot {
            tick: self.clock.ticks(),
            get_s,
            get: format_get(get_s),
            orbit: self.propagator.summary(),
            tanks: self.ledger.margins(),
            events: self.scheduler.views(),
            autopilots: self.autopilots.progress(get_s),
            commanded_attitude: self.commanded_attitude,
            comms_blackout: self.comms_blackout,
        }
    }

    pub fn summary(&self) -> RunSummary {
        let get_s = self.clock.get_s();
        RunSummary {
            ticks: self.clock.ticks(),
            final_get_s: get_s,
            final_get: format_get(get_s),
            events: self.scheduler.counts(),
            autopilot: self.autopilots.stats().clone(),
            total_delta_v_mps: self.propagator.total_delta_v(),
            tanks: self.ledger.margins(),
            reports: self.autopilots.reports(),
            breadcrumbs: self.breadcrumbs.clone(),
        }
    }

    pub fn reports(&self) -> Vec<BurnReport> {
        self.autopilots.reports()
    }

    // -----------------------------------------------------------------------
    // Action handling
    // -----------------------------------------------------------------------

    fn apply_due_actions(&mut self, get_s: f64) {
        while let Some(first) = self.pending_actions.first() {
            if first.get_s > get_s {
                break;
            }
            let timed = self.pending_actions.remove(0);
            self.apply_action(get_s, timed.action);
        }
    }

    /// Deterministic crew model: acknowledge armed checklist-only events
    /// a fixed delay after they arm, recording the same action a human
    /// operator would have produced.
    fn auto_crew(&mut self, get_s: f64) {
        for event in self.scheduler.event_ids() {
            if self.scheduler.status(event) != EventStatus::Armed {
                continue;
            }
            let def = self.scheduler.def(event);
            if def.autopilot_id.is_some() {
                continue;
            }
            let Some(checklist_id) = def.checklist_id.clone() else {
                continue;
            };
            let armed = self.armed_get[event.index()].unwrap_or(get_s);
            if get_s >= armed + self.config.checklist_ack_delay_s {
                self.apply_action(get_s, OperatorAction::ChecklistAck { checklist_id });
            }
        }
    }

    fn apply_action(&mut self, get_s: f64, action: OperatorAction) {
        self.action_log.record(get_s, action.clone());
        match action {
            OperatorAction::ChecklistAck { checklist_id } => {
                if let Some(event) = self.scheduler.armed_checklist(&checklist_id) {
                    let effects = self.scheduler.complete(event, get_s);
                    self.apply_effects(event, &effects, get_s);
                } else {
                    log::debug!("checklist ack `{}` matched no armed event", checklist_id);
                }
            }
            // Procedural record only; no physical effect
            OperatorAction::Dsky { craft_id, entry } => {
                log::debug!(
                    "dsky entry on `{}` at GET {:.1}s: V{:?} N{:?}",
                    craft_id,
                    get_s,
                    entry.verb,
                    entry.noun
                );
            }
        }
    }

    fn apply_effects(&mut self, event: EventId, effects: &EffectPayload, get_s: f64) {
        for delta in &effects.resource_deltas {
            match self.ledger.resolve(&delta.tank_id) {
                Ok(tank) => self.ledger.apply_delta(tank, delta.delta),
                Err(_) => log::warn!(
                    "effect on event `{}` names unknown tank `{}`",
                    self.scheduler.def(event).id,
                    delta.tank_id
                ),
            }
        }
        if let Some(blackout) = effects.comms_blackout {
            self.comms_blackout = blackout;
        }
        if let Some(note) = &effects.breadcrumb {
            self.breadcrumbs.push(Breadcrumb {
                get_s,
                event_id: self.scheduler.def(event).id.clone(),
                note: note.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autopilot::pad::{BurnMetric, Expected};
    use crate::autopilot::runner::FinishReason;
    use crate::sim::presets;

    fn nominal_sim(crew: CrewMode) -> Simulation {
        let config = SimConfig {
            crew,
            ..Default::default()
        };
        Simulation::new(presets::leo_shakedown(), config).unwrap()
    }

    fn event_status(snapshot: &TickSnapshot, id: &str) -> EventStatus {
        snapshot
            .events
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.status)
            .unwrap()
    }

    #[test]
    fn scenario_initial_orbit_figures() {
        let sim = nominal_sim(CrewMode::Auto);
        let snap = sim.snapshot();
        // 185 km circular around Earth
        assert!(
            (snap.orbit.speed_mps - 7_793.0).abs() < 5.0,
            "Initial speed should be ~7,793 m/s, got {:.1}",
            snap.orbit.speed_mps
        );
        assert!(
            snap.orbit.figures.period_s > 5_300.0 && snap.orbit.figures.period_s < 5_400.0,
            "Period should be 5,300–5,400 s, got {:.0}",
            snap.orbit.figures.period_s
        );
    }

    #[test]
    fn nominal_mission_runs_to_completion() {
        let mut sim = nominal_sim(CrewMode::Auto);
        let summary = sim.run_until(1_500.0);
        let snap = sim.snapshot();

        assert_eq!(event_status(&snap, "ascent_config_checklist"), EventStatus::Complete);
        assert_eq!(event_status(&snap, "orbit_raise_burn"), EventStatus::Complete);
        assert_eq!(event_status(&snap, "post_burn_status_report"), EventStatus::Complete);

        assert_eq!(summary.reports.len(), 1);
        let report = &summary.reports[0];
        assert_eq!(report.reason, FinishReason::DurationComplete);
        assert!(
            report.checks.iter().all(|c| c.passed),
            "Nominal burn must satisfy every PAD tolerance: {:?}",
            report.checks
        );

        // Prograde burn raises apoapsis well clear of the initial orbit
        assert!(
            snap.orbit.figures.apoapsis_altitude_m > 400_000.0,
            "Apoapsis should be raised past 400 km, got {:.0}",
            snap.orbit.figures.apoapsis_altitude_m
        );
        assert!(
            (snap.orbit.figures.periapsis_altitude_m - 185_000.0).abs() < 20_000.0,
            "Periapsis should stay near 185 km"
        );

        // Propellant accounting: tank debit matches the report metric
        let sps = summary.tanks.iter().find(|t| t.id == "sps_propellant").unwrap();
        assert!(
            (1_800.0 - sps.quantity - report.metrics.propellant_kg).abs() < 1e-6,
            "SPS tank drain must equal the reported burn mass"
        );
        assert!(summary.autopilot.propellant_kg_by_tank["sps_propellant"] > 600.0);
        assert_eq!(summary.events.complete, 3);
        assert!(summary.breadcrumbs.is_empty(), "Nominal run leaves no breadcrumbs");
    }

    #[test]
    fn prerequisite_gating_holds_in_the_loop() {
        // Manual crew, no acknowledgement: the checklist never completes,
        // so the burn event must sit pending until its window closes.
        let mut sim = nominal_sim(CrewMode::Manual);

        sim.run_until(1_900.0);
        let mid = sim.snapshot();
        assert_eq!(
            event_status(&mid, "orbit_raise_burn"),
            EventStatus::Pending,
            "GET is far past the open window, but the prerequisite is incomplete"
        );

        let summary = sim.run_until(2_100.0);
        let late = sim.snapshot();
        assert_eq!(event_status(&late, "orbit_raise_burn"), EventStatus::Skipped);
        assert_eq!(summary.autopilot.started, 0, "The script must never have run");
        assert!((summary.total_delta_v_mps).abs() < 1e-9);
    }

    #[test]
    fn manual_ack_applies_on_its_tick() {
        let mut sim = nominal_sim(CrewMode::Manual);
        sim.inject_action(
            70.0,
            OperatorAction::ChecklistAck {
                checklist_id: "cl_ascent_config".into(),
            },
        );
        sim.run_until(75.0);
        let snap = sim.snapshot();
        assert_eq!(event_status(&snap, "ascent_config_checklist"), EventStatus::Complete);
        assert_eq!(sim.action_log().len(), 1);
    }

    #[test]
    fn deterministic_replay_matches_auto_run() {
        // Auto run, recording every crew action
        let mut auto_sim = nominal_sim(CrewMode::Auto);
        let auto_summary = auto_sim.run_until(1_500.0);
        let auto_snapshot = auto_sim.snapshot();
        let recorded = auto_sim.action_log().clone();
        assert!(!recorded.is_empty(), "Auto crew must have recorded its actions");

        // Manual run replaying the recorded actions verbatim
        let mut replay_sim = nominal_sim(CrewMode::Manual);
        for timed in recorded.iter() {
            replay_sim.inject_action(timed.get_s, timed.action.clone());
        }
        let replay_summary = replay_sim.run_until(1_500.0);
        let replay_snapshot = replay_sim.snapshot();

        let auto_json = serde_json::to_string(&auto_summary).unwrap();
        let replay_json = serde_json::to_string(&replay_summary).unwrap();
        assert_eq!(auto_json, replay_json, "Run summaries must match bit-for-bit");

        let auto_snap_json = serde_json::to_string(&auto_snapshot).unwrap();
        let replay_snap_json = serde_json::to_string(&replay_snapshot).unwrap();
        assert_eq!(auto_snap_json, replay_snap_json, "Final snapshots must match");

        assert_eq!(replay_sim.action_log(), &recorded, "Replay re-records the same log");
    }

    #[test]
    fn exhausted_tank_fails_event_and_applies_effects() {
        let mut def = presets::leo_shakedown();
        // Not enough SPS propellant to cover the scripted burn
        for tank in &mut def.tanks {
            if tank.id == "sps_propellant" {
                tank.initial = 100.0;
            }
        }
        let mut sim = Simulation::new(def, SimConfig::default()).unwrap();
        let summary = sim.run_until(1_500.0);
        let snap = sim.snapshot();

        assert_eq!(event_status(&snap, "orbit_raise_burn"), EventStatus::Failed);
        assert_eq!(summary.autopilot.aborted, 1);
        let report = &summary.reports[0];
        assert!(matches!(report.reason, FinishReason::ResourceExhausted { .. }));

        // Failure effects: comms blackout plus a breadcrumb
        assert!(snap.comms_blackout);
        assert_eq!(summary.breadcrumbs.len(), 1);
        assert_eq!(summary.breadcrumbs[0].event_id, "orbit_raise_burn");

        // Downstream event never unblocks
        assert_eq!(
            event_status(&snap, "post_burn_status_report"),
            EventStatus::Pending
        );
    }

    #[test]
    fn tolerance_violation_is_scored_not_fatal() {
        let mut def = presets::leo_shakedown();
        // A PAD expecting half the delta-v: hard violation at the default
        // 2× policy → abort → event failure, but the run keeps ticking.
        for ap in &mut def.autopilots {
            if let Some(pad) = &mut ap.pad {
                pad.delta_v_mps = Some(Expected::with_pct(60.0, 5.0));
            }
        }
        let mut sim = Simulation::new(def, SimConfig::default()).unwrap();
        let summary = sim.run_until(1_500.0);

        let report = &summary.reports[0];
        assert!(matches!(
            report.reason,
            FinishReason::ToleranceAbort {
                metric: BurnMetric::DeltaVMps
            }
        ));
        assert_eq!(summary.events.failed, 1);
        assert!(
            summary.ticks >= 30_000,
            "The loop must keep ticking after a failed burn"
        );
    }

    #[test]
    fn stop_request_ends_the_run() {
        let mut sim = nominal_sim(CrewMode::Auto);
        sim.step();
        sim.request_stop();
        let summary = sim.run_until(1_500.0);
        assert_eq!(summary.ticks, 1, "No further ticks after an external stop");
    }
}
