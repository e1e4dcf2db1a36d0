use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// How actuator efforts reach the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuationMode {
    /// Force-based joint motors pinned against their limit.
    #[default]
    SaturatedMotor,
    /// Equal and opposite external forces on the two joined bodies.
    NativeForce,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f32,
    pub solver_iterations: usize,
    pub gravity: [f32; 2],
    pub initial_position: [f32; 2],
    pub initial_velocity: [f32; 2],
    pub ground_half_width: f32,
    pub actuation: ActuationMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 1000.0,
            solver_iterations: 8,
            gravity: [0.0, -9.81],
            initial_position: [-2.0, 6.0],
            initial_velocity: [0.0, 0.0],
            ground_half_width: 200.0,
            actuation: ActuationMode::SaturatedMotor,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}
