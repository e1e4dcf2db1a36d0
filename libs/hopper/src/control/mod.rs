pub mod params;
pub mod provider;

pub use params::ControlParams;
pub use provider::{ControlProvider, ControlSequence};
