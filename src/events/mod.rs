pub mod event;
pub mod scheduler;

pub use event::{EffectPayload, EventDef, EventStatus, ResourceDelta};
pub use scheduler::{EventCounts, EventId, EventScheduler, EventView};
