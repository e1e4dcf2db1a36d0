//! Servo and spring laws evaluated by the hop controller.
//!
//! All functions are pure; the controller feeds them sensed values and
//! hands the results to [`crate::plant::Plant::apply_effort`].

use crate::config::HopperConfig;
use crate::control::ControlParams;

/// Angular PD law used on the hips.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngularPd {
    pub prop_gain: f32,
    pub drag_gain: f32,
}

impl AngularPd {
    pub const HIP: AngularPd = AngularPd {
        prop_gain: HopperConfig::HIP_PROP_GAIN,
        drag_gain: HopperConfig::HIP_DRAG_GAIN,
    };

    pub fn torque(&self, target_angle: f32, angle: f32, angular_speed: f32) -> f32 {
        self.prop_gain * (target_angle - angle) - self.drag_gain * angular_speed
    }
}

/// Generalized spring-damper: `sign(d) * (kp * |d|)^p - kd * v`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringLaw {
    pub prop_gain: f32,
    pub drag_gain: f32,
    pub exponent: f32,
}

impl SpringLaw {
    pub const THRUST: SpringLaw = SpringLaw {
        prop_gain: HopperConfig::THRUST_SPRING_PROP_GAIN,
        drag_gain: HopperConfig::THRUST_SPRING_DRAG_GAIN,
        exponent: HopperConfig::THRUST_SPRING_EXPONENT,
    };

    pub const HOP: SpringLaw = SpringLaw {
        prop_gain: HopperConfig::HOP_SPRING_PROP_GAIN,
        drag_gain: HopperConfig::HOP_SPRING_DRAG_GAIN,
        exponent: HopperConfig::HOP_SPRING_EXPONENT,
    };

    /// `delta` is target minus current length, both relative to the
    /// joint's reference length.
    pub fn force(&self, delta: f32, velocity: f32) -> f32 {
        let propulsive = (self.prop_gain * delta.abs()).powf(self.exponent);
        sign(delta) * propulsive - self.drag_gain * velocity
    }
}

/// Sign that maps zero to zero (`f32::signum` maps it to one).
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Blend from `x` toward `y`. Exact at both ends, monotonic in `alpha`,
/// and never leaves `[min(x, y), max(x, y)]`.
pub fn lerp(x: f32, y: f32, alpha: f32) -> f32 {
    if alpha >= 1.0 {
        return y;
    }
    (x + alpha * (y - x)).clamp(x.min(y), x.max(y))
}

/// Per-tick blend factor for leg length retargeting during flight.
pub fn blend_alpha(dt: f32) -> f32 {
    (HopperConfig::LEG_PLACEMENT_BLEND_RATE * dt).min(1.0)
}

/// Horizontal foot placement ahead of the chassis for the next landing,
/// bounded to half the leg length.
pub fn landing_offset(
    body_vel_x: f32,
    stance_period_estimate: f32,
    control: &ControlParams,
    leg_length: f32,
) -> f32 {
    let vel_error = body_vel_x - control.target_body_vel_x;
    let offset = 0.5 * body_vel_x * stance_period_estimate
        + control.target_body_vel_x_leg_placement_gain * vel_error;

    let max_offset = HopperConfig::LANDING_OFFSET_LIMIT_FRACTION * leg_length;
    offset.clamp(-max_offset, max_offset)
}

/// Hip angle (relative to the chassis) that puts the foot `offset` ahead
/// of the hip. Degenerate offsets and non-finite results give 0.
pub fn landing_hip_angle(offset: f32, body_pitch: f32, leg_length: f32) -> f32 {
    if offset.abs() < HopperConfig::LANDING_OFFSET_EPSILON {
        return 0.0;
    }

    let angle = -body_pitch + (offset / leg_length).asin();
    if angle.is_finite() {
        angle
    } else {
        0.0
    }
}
