//! Rapier binding for the biped hopper: world, avatar topology, the
//! engine-backed plant and a fixed-timestep simulation driver.

pub mod avatar;
pub mod config;
pub mod physics;
pub mod plant;
pub mod simulation;

pub use avatar::HopperAvatar;
pub use config::{ActuationMode, SimConfig};
pub use physics::PhysicsWorld;
pub use plant::AvatarPlant;
pub use simulation::HopperSim;
