//! Boundary between the control core and whatever integrates the dynamics.
//!
//! The controller never touches an engine directly. It reads joints and the
//! chassis through [`Plant`] and commands every actuator with
//! [`Plant::apply_effort`], a bounded generalized force (or torque for the
//! hip). Engines that only offer velocity motors translate the effort with
//! [`MotorCommand::saturating`].

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::config::HopperConfig;

/// One of the three joints every leg carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointKind {
    /// Revolute joint between chassis and hip.
    Hip,
    /// Prismatic upper-leg actuator between knee and hip.
    Thrust,
    /// Prismatic lower-leg spring between foot and knee.
    Spring,
}

impl JointKind {
    pub const ALL: [JointKind; 3] = [JointKind::Hip, JointKind::Thrust, JointKind::Spring];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointRef {
    pub leg: usize,
    pub kind: JointKind,
}

impl JointRef {
    pub fn new(leg: usize, kind: JointKind) -> Self {
        Self { leg, kind }
    }

    pub fn hip(leg: usize) -> Self {
        Self::new(leg, JointKind::Hip)
    }

    pub fn thrust(leg: usize) -> Self {
        Self::new(leg, JointKind::Thrust)
    }

    pub fn spring(leg: usize) -> Self {
        Self::new(leg, JointKind::Spring)
    }
}

/// Sensed joint state. Each variant knows its own position-like and
/// rate-like quantity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum JointReading {
    Revolute { angle: f32, angular_speed: f32 },
    Prismatic { translation: f32, linear_speed: f32 },
}

impl JointReading {
    /// Angle for revolute joints, translation for prismatic ones.
    pub fn position(&self) -> f32 {
        match *self {
            JointReading::Revolute { angle, .. } => angle,
            JointReading::Prismatic { translation, .. } => translation,
        }
    }

    /// Time derivative of [`JointReading::position`].
    pub fn rate(&self) -> f32 {
        match *self {
            JointReading::Revolute { angular_speed, .. } => angular_speed,
            JointReading::Prismatic { linear_speed, .. } => linear_speed,
        }
    }
}

/// Sensed pose and velocity of the chassis in the hopping plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisReading {
    pub position: Vector2<f32>,
    pub velocity: Vector2<f32>,
    pub pitch: f32,
    pub angular_velocity: f32,
}

pub trait Plant {
    fn leg_count(&self) -> usize;

    fn chassis(&self) -> ChassisReading;

    /// `None` when the engine no longer knows the joint.
    fn joint(&self, joint: JointRef) -> Option<JointReading>;

    /// Distance between the two bodies of a prismatic joint at construction.
    /// Translations reported by [`Plant::joint`] are relative to it.
    fn reference_length(&self, joint: JointRef) -> f32;

    /// Drive the joint with exactly `effort` (force or torque, signed along
    /// the joint's positive direction) for the coming step.
    fn apply_effort(&mut self, joint: JointRef, effort: f32);
}

/// Limit/velocity pair that pins a velocity motor against its limit so it
/// delivers a chosen force.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorCommand {
    pub max_effort: f32,
    pub target_velocity: f32,
}

impl MotorCommand {
    pub fn saturating(effort: f32) -> Self {
        let target_velocity = if effort > 0.0 {
            HopperConfig::SATURATION_VELOCITY
        } else if effort < 0.0 {
            -HopperConfig::SATURATION_VELOCITY
        } else {
            0.0
        };

        Self {
            max_effort: effort.abs(),
            target_velocity,
        }
    }
}
