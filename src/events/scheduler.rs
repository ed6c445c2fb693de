use serde::Serialize;

use crate::error::SimError;
use crate::events::event::{EffectPayload, EventDef, EventStatus};

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Stable handle into the scheduler's event arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventId(usize);

impl EventId {
    /// Position in the event arena, stable for the whole run.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct EventState {
    def: EventDef,
    prereqs: Vec<EventId>,
    status: EventStatus,
    resolved_get_s: Option<f64>,
}

/// Outward per-event line for snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: String,
    pub phase: String,
    pub status: EventStatus,
}

/// Event totals by terminal/live status for run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EventCounts {
    pub pending: u32,
    pub armed: u32,
    pub active: u32,
    pub complete: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// Owns mission events and their window/prerequisite gating. Completion,
/// failure, and activation are driven by the tick loop from autopilot
/// and checklist outcomes; this type never touches the physics.
#[derive(Debug)]
pub struct EventScheduler {
    events: Vec<EventState>,
}

impl EventScheduler {
    /// Build from definitions, resolving prerequisite ids to handles.
    /// An unknown prerequisite is a dataset defect surfaced at load.
    /// Prerequisite cycles are likewise a dataset problem — the external
    /// validator owns that check, not the tick loop.
    pub fn new(defs: Vec<EventDef>) -> Result<Self, SimError> {
        let ids: Vec<String> = defs.iter().map(|d| d.id.clone()).collect();
        let mut events = Vec::with_capacity(defs.len());
        for def in defs {
            let mut prereqs = Vec::with_capacity(def.prerequisites.len());
            for pre in &def.prerequisites {
                let idx = ids
                    .iter()
                    .position(|id| id == pre)
                    .ok_or_else(|| SimError::UnknownEvent(pre.clone(), def.id.clone()))?;
                prereqs.push(EventId(idx));
            }
            events.push(EventState {
                def,
                prereqs,
                status: EventStatus::Pending,
                resolved_get_s: None,
            });
        }
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn resolve(&self, id: &str) -> Option<EventId> {
        self.events
            .iter()
            .position(|e| e.def.id == id)
            .map(EventId)
    }

    pub fn def(&self, event: EventId) -> &EventDef {
        &self.events[event.0].def
    }

    pub fn status(&self, event: EventId) -> EventStatus {
        self.events[event.0].status
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        (0..self.events.len()).map(EventId).collect()
    }

    /// Find the armed event owning a checklist id, if any.
    pub fn armed_checklist(&self, checklist_id: &str) -> Option<EventId> {
        self.events.iter().position(|e| {
            e.status == EventStatus::Armed
                && e.def.checklist_id.as_deref() == Some(checklist_id)
        }).map(EventId)
    }

    /// One gating pass. Pending events arm when the window is open and
    /// every prerequisite is complete; pending/armed events whose close
    /// time has passed are skipped. Returns each transition made.
    pub fn update(&mut self, get_s: f64) -> Vec<(EventId, EventStatus)> {
        let mut transitions = Vec::new();
        for i in 0..self.events.len() {
            let status = self.events[i].status;
            match status {
                EventStatus::Pending => {
                    if self.window_closed(i, get_s) {
                        self.set_status(EventId(i), EventStatus::Skipped, get_s);
                        transitions.push((EventId(i), EventStatus::Skipped));
                        continue;
                    }
                    let open_ok = self.events[i]
                        .def
                        .open_get_s
                        .map_or(true, |open| get_s >= open);
                    let prereqs_ok = self.events[i]
                        .prereqs
                        .iter()
                        .all(|p| self.events[p.0].status == EventStatus::Complete);
                    if open_ok && prereqs_ok {
                        self.set_status(EventId(i), EventStatus::Armed, get_s);
                        transitions.push((EventId(i), EventStatus::Armed));
                    }
                }
                EventStatus::Armed => {
                    if self.window_closed(i, get_s) {
                        self.set_status(EventId(i), EventStatus::Skipped, get_s);
                        transitions.push((EventId(i), EventStatus::Skipped));
                    }
                }
                // Active events ride their autopilot to resolution;
                // terminal events are never re-evaluated.
                _ => {}
            }
        }
        transitions
    }

    /// The attached autopilot or checklist began running.
    pub fn mark_active(&mut self, event: EventId, get_s: f64) {
        if self.events[event.0].status == EventStatus::Armed {
            self.set_status(event, EventStatus::Active, get_s);
        }
    }

    /// Successful completion. Returns the success effects to apply.
    pub fn complete(&mut self, event: EventId, get_s: f64) -> EffectPayload {
        let e = &self.events[event.0];
        if !matches!(e.status, EventStatus::Armed | EventStatus::Active) {
            return EffectPayload::default();
        }
        self.set_status(event, EventStatus::Complete, get_s);
        self.events[event.0].def.success_effects.clone()
    }

    /// Failure from an aborted autopilot or an explicit failure trigger.
    /// Returns the failure effects to apply; the event is terminal after
    /// this and never re-evaluated.
    pub fn fail(&mut self, event: EventId, get_s: f64) -> EffectPayload {
        let e = &self.events[event.0];
        if e.status.is_terminal() {
            return EffectPayload::default();
        }
        self.set_status(event, EventStatus::Failed, get_s);
        self.events[event.0].def.failure_effects.clone()
    }

    pub fn views(&self) -> Vec<EventView> {
        self.events
            .iter()
            .map(|e| EventView {
                id: e.def.id.clone(),
                phase: e.def.phase.clone(),
                status: e.status,
            })
            .collect()
    }

    pub fn counts(&self) -> EventCounts {
        let mut counts = EventCounts::default();
        for e in &self.events {
            match e.status {
                EventStatus::Pending => counts.pending += 1,
                EventStatus::Armed => counts.armed += 1,
                EventStatus::Active => counts.active += 1,
                EventStatus::Complete => counts.complete += 1,
                EventStatus::Failed => counts.failed += 1,
                EventStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    fn window_closed(&self, i: usize, get_s: f64) -> bool {
        self.events[i].def.close_get_s.map_or(false, |close| get_s > close)
    }

    fn set_status(&mut self, event: EventId, status: EventStatus, get_s: f64) {
        let e = &mut self.events[event.0];
        log::info!(
            "event `{}` {:?} → {:?} at GET {:.1}s",
            e.def.id,
            e.status,
            status,
            get_s
        );
        e.status = status;
        if status.is_terminal() {
            e.resolved_get_s = Some(get_s);
        }
    }
}
