// Control parameters for a single hop

use serde::{Deserialize, Serialize};

/// Target behavior for one hop cycle.
/// Supplied by the exploration layer and read-only to the controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    /// Chassis pitch (rad) the stance hip servos toward
    pub target_body_pitch: f32,

    /// Forward speed the leg placement servo tracks
    pub target_body_vel_x: f32,

    /// How strongly a speed error shifts the landing point
    pub target_body_vel_x_leg_placement_gain: f32,

    /// Thrust length added to the active leg once per stance, at the compression trough
    pub active_thrust_delta: f32,

    /// Thrust length offset for the retracted idle leg during flight
    pub idle_thrust_delta: f32,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            target_body_pitch: 0.0,
            target_body_vel_x: 0.0,
            target_body_vel_x_leg_placement_gain: 0.1,
            active_thrust_delta: 0.5,
            idle_thrust_delta: -1.0,
        }
    }
}

impl ControlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same parameters with a different forward speed target
    pub fn with_target_vel_x(mut self, vel_x: f32) -> Self {
        self.target_body_vel_x = vel_x;
        self
    }

    /// Same parameters with a different stance thrust
    pub fn with_active_thrust_delta(mut self, delta: f32) -> Self {
        self.active_thrust_delta = delta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_touch_one_field() {
        let params = ControlParams::new()
            .with_target_vel_x(1.5)
            .with_active_thrust_delta(0.25);

        assert_eq!(params.target_body_vel_x, 1.5);
        assert_eq!(params.active_thrust_delta, 0.25);
        assert_eq!(params.idle_thrust_delta, ControlParams::default().idle_thrust_delta);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let params: ControlParams =
            serde_json::from_str(r#"{ "target_body_vel_x": 2.0 }"#).unwrap();

        assert_eq!(params.target_body_vel_x, 2.0);
        assert_eq!(params.target_body_pitch, 0.0);
        assert_eq!(params.active_thrust_delta, 0.5);
    }
}
