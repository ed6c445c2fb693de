pub mod body;
pub mod elements;
pub mod propagator;

pub use body::CelestialBody;
pub use elements::KeplerianElements;
pub use propagator::{OrbitalPropagator, OrbitalState};
