//! Planar biped hopper: hop-cycle state machine, leg servos and the
//! control-parameter plumbing around them.
//!
//! The controller talks to the dynamics only through [`plant::Plant`], so
//! the same state machine drives the Rapier binding in `hopper-physics`
//! and the scripted plants used in tests.

pub mod config;
pub mod contact;
pub mod control;
pub mod controller;
pub mod error;
pub mod oracle;
pub mod plant;
pub mod snapshot;

pub use config::HopperConfig;
pub use contact::{ContactBodies, ContactSensor};
pub use control::{ControlParams, ControlProvider, ControlSequence};
pub use controller::{ControlState, HopperController, RuntimeState};
pub use error::{HopperError, OracleError};
pub use plant::{ChassisReading, JointKind, JointReading, JointRef, MotorCommand, Plant};
pub use snapshot::AvatarState;
