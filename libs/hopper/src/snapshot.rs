//! Serializable avatar state for scoring and telemetry collaborators.

use serde::{Deserialize, Serialize};

use crate::controller::ControlState;
use crate::plant::{JointKind, JointReading, JointRef, Plant};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointSample {
    pub joint: JointRef,
    pub reading: JointReading,
}

/// Chassis pose, every readable joint, and the control phase at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvatarState {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
    pub pitch: f32,
    pub angular_velocity: f32,
    pub joints: Vec<JointSample>,
    pub control_state: ControlState,
}

impl AvatarState {
    /// Read the avatar through `plant`. Joints the plant cannot report are
    /// logged and left out.
    pub fn extract<T: Plant>(plant: &T, control_state: ControlState) -> Self {
        let chassis = plant.chassis();

        let mut joints = Vec::with_capacity(plant.leg_count() * JointKind::ALL.len());
        for leg in 0..plant.leg_count() {
            for kind in JointKind::ALL {
                let joint = JointRef::new(leg, kind);
                match plant.joint(joint) {
                    Some(reading) => joints.push(JointSample { joint, reading }),
                    None => log::error!("state extraction skipping {:?}: no reading", joint),
                }
            }
        }

        Self {
            position: [chassis.position.x, chassis.position.y],
            velocity: [chassis.velocity.x, chassis.velocity.y],
            pitch: chassis.pitch,
            angular_velocity: chassis.angular_velocity,
            joints,
            control_state,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Position-like values in joint order.
    pub fn joint_positions(&self) -> Vec<f32> {
        self.joints.iter().map(|s| s.reading.position()).collect()
    }

    /// Rate-like values in joint order.
    pub fn joint_rates(&self) -> Vec<f32> {
        self.joints.iter().map(|s| s.reading.rate()).collect()
    }
}
