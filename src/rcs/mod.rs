pub mod cluster;
pub mod controller;

pub use cluster::{CraftRcs, RcsCluster, Thruster, TorqueAxis, TranslationAxis};
pub use controller::{
    ClusterTotals, ClusterUsage, PulseOutcome, PulseRequest, PulseSelector, RcsController,
    RcsCraftId, UsageListener,
};
