use std::collections::BTreeMap;

use serde::Serialize;

use crate::autopilot::pad::{BurnMetrics, BurnReport};
use crate::autopilot::script::{AttitudeTarget, AutopilotDef, DskyEntry, Step};
use crate::autopilot::sinks::ScriptBus;
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of one script instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStatus {
    Pending,
    Armed,
    Active,
    Complete,
    Aborted,
}

impl RunnerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerStatus::Complete | RunnerStatus::Aborted)
    }
}

/// Why a script reached a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    DurationComplete,
    ToleranceAbort { metric: crate::autopilot::pad::BurnMetric },
    ResourceExhausted { detail: String },
}

/// Stable handle for an autopilot definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutopilotId(usize);

impl AutopilotId {
    /// Position in the definition arena, stable for the whole run.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable handle for a script instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunId(usize);

#[derive(Debug, Clone)]
struct ScriptRun {
    ap: usize,
    status: RunnerStatus,
    armed_get_s: f64,
    dispatched: Vec<bool>,
    throttle: f64,
    attitude: Option<AttitudeTarget>,
    metrics: BurnMetrics,
    dv_baseline: f64,
    dsky_log: Vec<(f64, DskyEntry)>,
    report: Option<BurnReport>,
}

/// Outward per-run progress line for snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    pub autopilot_id: String,
    pub status: RunnerStatus,
    pub elapsed_s: f64,
    pub throttle: f64,
}

/// Aggregate counters across the whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunnerStats {
    pub started: u32,
    pub completed: u32,
    pub aborted: u32,
    pub total_burn_s: f64,
    pub total_ullage_s: f64,
    pub propellant_kg_by_tank: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Interprets time-ordered autopilot scripts against the tick, routing
/// physical effects through the `ScriptBus` seam and judging completed
/// burns against their PAD.
pub struct AutopilotRunner {
    defs: Vec<AutopilotDef>,
    runs: Vec<ScriptRun>,
    stats: RunnerStats,
}

impl AutopilotRunner {
    pub fn new(defs: Vec<AutopilotDef>) -> Self {
        Self {
            defs,
            runs: Vec::new(),
            stats: RunnerStats::default(),
        }
    }

    pub fn resolve(&self, id: &str) -> Result<AutopilotId, SimError> {
        self.defs
            .iter()
            .position(|d| d.id == id)
            .map(AutopilotId)
            .ok_or_else(|| SimError::UnknownAutopilot(id.to_string()))
    }

    pub fn def(&self, ap: AutopilotId) -> &AutopilotDef {
        &self.defs[ap.0]
    }

    pub fn def_of_run(&self, run: RunId) -> &AutopilotDef {
        &self.defs[self.runs[run.0].ap]
    }

    pub fn ap_of_run(&self, run: RunId) -> AutopilotId {
        AutopilotId(self.runs[run.0].ap)
    }

    /// Create a pending instance for a script. One instance per owning
    /// mission event.
    pub fn create_run(&mut self, ap: AutopilotId) -> RunId {
        let steps = self.defs[ap.0].steps.len();
        self.runs.push(ScriptRun {
            ap: ap.0,
            status: RunnerStatus::Pending,
            armed_get_s: 0.0,
            dispatched: vec![false; steps],
            throttle: 0.0,
            attitude: None,
            metrics: BurnMetrics::default(),
            dv_baseline: 0.0,
            dsky_log: Vec::new(),
            report: None,
        });
        RunId(self.runs.len() - 1)
    }

    /// Arm a pending run: its owning event's window opened with
    /// prerequisites satisfied. The script timeline starts here.
    pub fn arm(&mut self, run: RunId, get_s: f64) {
        let r = &mut self.runs[run.0];
        if r.status == RunnerStatus::Pending {
            r.status = RunnerStatus::Armed;
            r.armed_get_s = get_s;
            log::info!("autopilot `{}` armed at GET {:.1}s", self.defs[r.ap].id, get_s);
        }
    }

    pub fn status(&self, run: RunId) -> RunnerStatus {
        self.runs[run.0].status
    }

    pub fn report(&self, run: RunId) -> Option<&BurnReport> {
        self.runs[run.0].report.as_ref()
    }

    pub fn commanded_attitude(&self, run: RunId) -> Option<AttitudeTarget> {
        self.runs[run.0].attitude
    }

    pub fn dsky_log(&self, run: RunId) -> &[(f64, DskyEntry)] {
        &self.runs[run.0].dsky_log
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }

    pub fn reports(&self) -> Vec<BurnReport> {
        self.runs.iter().filter_map(|r| r.report.clone()).collect()
    }

    pub fn run_ids(&self) -> Vec<RunId> {
        (0..self.runs.len()).map(RunId).collect()
    }

    pub fn progress(&self, get_s: f64) -> Vec<RunProgress> {
        self.runs
            .iter()
            .map(|r| RunProgress {
                autopilot_id: self.defs[r.ap].id.clone(),
                status: r.status,
                elapsed_s: match r.status {
                    RunnerStatus::Pending => 0.0,
                    _ => (get_s - r.armed_get_s).max(0.0),
                },
                throttle: r.throttle,
            })
            .collect()
    }

    /// Advance one run by one tick. Dispatches every step in force,
    /// meters the main engine, and resolves completion.
    pub fn tick_run(&mut self, run: RunId, get_s: f64, dt: f64, bus: &mut dyn ScriptBus) {
        let def = &self.defs[self.runs[run.0].ap];
        let r = &mut self.runs[run.0];

        match r.status {
            RunnerStatus::Pending | RunnerStatus::Complete | RunnerStatus::Aborted => return,
            RunnerStatus::Armed => {
                let elapsed = get_s - r.armed_get_s;
                if elapsed < def.first_step_start_s() {
                    return;
                }
                r.status = RunnerStatus::Active;
                r.dv_baseline = bus.total_delta_v();
                self.stats.started += 1;
                log::info!("autopilot `{}` active at GET {:.1}s", def.id, get_s);
            }
            RunnerStatus::Active => {}
        }

        let elapsed = get_s - r.armed_get_s;
        let mut level = 0.0_f64;

        for (i, timed) in def.steps.iter().enumerate() {
            if !timed.in_force(elapsed) {
                continue;
            }
            match &timed.step {
                Step::AttitudeHold { roll, pitch, yaw } => {
                    if !r.dispatched[i] {
                        r.dispatched[i] = true;
                        let target = AttitudeTarget {
                            roll: *roll,
                            pitch: *pitch,
                            yaw: *yaw,
                        };
                        r.attitude = Some(target);
                        bus.set_attitude(target);
                    }
                }
                Step::Throttle { level: l } => {
                    r.dispatched[i] = true;
                    level = *l;
                }
                Step::ThrottleRamp { from, to } => {
                    r.dispatched[i] = true;
                    let frac = if timed.duration_s > 0.0 {
                        ((elapsed - timed.start_s) / timed.duration_s).clamp(0.0, 1.0)
                    } else {
                        1.0
                    };
                    level = from + (to - from) * frac;
                }
                Step::UllageFire => match bus.ullage_burn(dt) {
                    Ok(kg) => {
                        r.metrics.ullage_s += dt;
                        r.metrics.ullage_kg += kg;
                    }
                    Err(err) => {
                        Self::abort_run(&mut self.stats, def, r, get_s, bus, err);
                        return;
                    }
                },
                Step::RcsPulse {
                    selector,
                    duration_s,
                    count,
                    duty_cycle,
                } => {
                    if !r.dispatched[i] {
                        r.dispatched[i] = true;
                        if let Err(err) = bus.rcs_pulse(selector, *duration_s, *count, *duty_cycle)
                        {
                            Self::abort_run(&mut self.stats, def, r, get_s, bus, err);
                            return;
                        }
                    }
                }
                Step::Dsky { entry } => {
                    if !r.dispatched[i] {
                        r.dispatched[i] = true;
                        r.dsky_log.push((get_s, entry.clone()));
                    }
                }
            }
        }

        match bus.throttle_burn(level, dt) {
            Ok(kg) => {
                r.throttle = level;
                if level > 0.0 {
                    r.metrics.burn_s += dt;
                    r.metrics.propellant_kg += kg;
                }
            }
            Err(err) => {
                Self::abort_run(&mut self.stats, def, r, get_s, bus, err);
                return;
            }
        }

        if elapsed > def.duration_s() {
            Self::finish_run(&mut self.stats, def, r, get_s, bus);
        }
    }

    /// Resolve a run that covered its full duration: judge the PAD and
    /// settle on Complete or a tolerance abort.
    fn finish_run(
        stats: &mut RunnerStats,
        def: &AutopilotDef,
        r: &mut ScriptRun,
        get_s: f64,
        bus: &mut dyn ScriptBus,
    ) {
        r.metrics.delta_v_mps = bus.total_delta_v() - r.dv_baseline;
        r.throttle = 0.0;

        let checks = def
            .pad
            .as_ref()
            .map(|pad| pad.evaluate(&r.metrics))
            .unwrap_or_default();

        let hard_violation = checks
            .iter()
            .filter(|c| c.severity > def.abort_policy.hard_multiplier)
            .max_by(|a, b| a.severity.total_cmp(&b.severity));

        let (status, reason) = match hard_violation {
            Some(check) => {
                log::warn!(
                    "autopilot `{}` aborted: {:?} deviation {:+.3} ({}× tolerance)",
                    def.id,
                    check.metric,
                    check.deviation,
                    check.severity
                );
                (
                    RunnerStatus::Aborted,
                    FinishReason::ToleranceAbort {
                        metric: check.metric,
                    },
                )
            }
            None => (RunnerStatus::Complete, FinishReason::DurationComplete),
        };

        Self::settle(stats, def, r, get_s, status, reason, checks);
    }

    /// Abort immediately on a denied physical operation.
    fn abort_run(
        stats: &mut RunnerStats,
        def: &AutopilotDef,
        r: &mut ScriptRun,
        get_s: f64,
        bus: &mut dyn ScriptBus,
        err: SimError,
    ) {
        r.metrics.delta_v_mps = bus.total_delta_v() - r.dv_baseline;
        r.throttle = 0.0;
        log::warn!("autopilot `{}` aborted at GET {:.1}s: {}", def.id, get_s, err);

        let checks = def
            .pad
            .as_ref()
            .map(|pad| pad.evaluate(&r.metrics))
            .unwrap_or_default();
        Self::settle(
            stats,
            def,
            r,
            get_s,
            RunnerStatus::Aborted,
            FinishReason::ResourceExhausted {
                detail: err.to_string(),
            },
            checks,
        );
    }

    fn settle(
        stats: &mut RunnerStats,
        def: &AutopilotDef,
        r: &mut ScriptRun,
        get_s: f64,
        status: RunnerStatus,
        reason: FinishReason,
        checks: Vec<crate::autopilot::pad::ToleranceCheck>,
    ) {
        r.status = status;
        match status {
            RunnerStatus::Complete => stats.completed += 1,
            RunnerStatus::Aborted => stats.aborted += 1,
            _ => {}
        }
        stats.total_burn_s += r.metrics.burn_s;
        stats.total_ullage_s += r.metrics.ullage_s;
        if r.metrics.propellant_kg > 0.0 {
            *stats
                .propellant_kg_by_tank
                .entry(def.tank_id.clone())
                .or_default() += r.metrics.propellant_kg;
        }
        if r.metrics.ullage_kg > 0.0 {
            if let Some(ullage) = &def.ullage {
                *stats
                    .propellant_kg_by_tank
                    .entry(ullage.tank_id.clone())
                    .or_default() += r.metrics.ullage_kg;
            }
        }

        r.report = Some(BurnReport {
            autopilot_id: def.id.clone(),
            completed_get_s: get_s,
            metrics: r.metrics,
            checks,
            status,
            reason,
        });
    }
}
