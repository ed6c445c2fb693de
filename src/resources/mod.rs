pub mod ledger;
pub mod tank;

pub use ledger::{ResourceLedger, TankId, TankMargin};
pub use tank::{DvReference, TankDef, TankKind};
