pub mod pad;
pub mod runner;
pub mod script;
pub mod sinks;

pub use pad::{AbortPolicy, BurnMetrics, BurnPad, BurnReport, Expected, ToleranceCheck};
pub use runner::{AutopilotRunner, RunId, RunnerStats, RunnerStatus};
pub use script::{AttitudeTarget, AutopilotDef, DskyEntry, Step, TimedStep};
pub use sinks::{AttitudeSink, PropulsionSink, ScriptBus};
