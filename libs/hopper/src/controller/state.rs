use std::fmt;
use std::str::FromStr;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::config::HopperConfig;
use crate::contact::ContactSensor;
use crate::error::HopperError;

/// Phase of the hop cycle.
///
/// `Load` and `Unload` are part of the cycle vocabulary but carry no
/// per-tick behavior and are never entered by the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlState {
    Flight,
    Load,
    Compress,
    Thrust,
    Unload,
}

impl ControlState {
    pub const ALL: [ControlState; 5] = [
        ControlState::Flight,
        ControlState::Load,
        ControlState::Compress,
        ControlState::Thrust,
        ControlState::Unload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ControlState::Flight => "FLIGHT",
            ControlState::Load => "LOAD",
            ControlState::Compress => "COMPRESS",
            ControlState::Thrust => "THRUST",
            ControlState::Unload => "UNLOAD",
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for ControlState {
    type Error = HopperError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ControlState::ALL
            .get(value as usize)
            .copied()
            .ok_or(HopperError::InvalidControlState(value))
    }
}

impl FromStr for ControlState {
    type Err = HopperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HopperError::UnknownControlState(s.to_string()))
    }
}

/// Everything the hop controller tracks between ticks.
///
/// Owned and mutated only by [`super::HopperController`]; everyone else
/// sees it through the read accessors below.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuntimeState {
    pub(crate) control_state: ControlState,
    pub(crate) active_leg: usize,
    pub(crate) idle_leg: usize,
    pub(crate) contact: ContactSensor,

    pub(crate) current_flight_period: f32,
    pub(crate) current_stance_period: f32,
    pub(crate) next_stance_period_estimate: f32,

    pub(crate) last_hop_amplitude: f32,
    pub(crate) last_hop_amplitude_recorded: bool,

    // Per leg, absolute lengths (reference length included)
    pub(crate) target_thrust_lengths: Vec<f32>,
    pub(crate) target_spring_lengths: Vec<f32>,
    pub(crate) thrust_forces: Vec<f32>,
    pub(crate) spring_forces: Vec<f32>,

    pub(crate) target_active_hip_angle: f32,
    pub(crate) target_idle_hip_angle: f32,
    pub(crate) active_hip_torque: f32,
    pub(crate) idle_hip_torque: f32,

    pub(crate) spring_velocity: f32,
    pub(crate) body_velocity: Vector2<f32>,
    pub(crate) body_pitch: f32,
}

impl RuntimeState {
    pub(crate) fn new(spring_reference_lengths: Vec<f32>) -> Self {
        let legs = spring_reference_lengths.len();
        Self {
            control_state: ControlState::Flight,
            active_leg: 0,
            idle_leg: if legs > 1 { 1 } else { 0 },
            contact: ContactSensor::new(),
            current_flight_period: 0.0,
            current_stance_period: 0.0,
            next_stance_period_estimate: HopperConfig::INITIAL_STANCE_PERIOD_ESTIMATE,
            last_hop_amplitude: 0.0,
            last_hop_amplitude_recorded: false,
            target_thrust_lengths: vec![HopperConfig::UPPER_LEG_DEFAULT_LENGTH; legs],
            target_spring_lengths: spring_reference_lengths,
            thrust_forces: vec![0.0; legs],
            spring_forces: vec![0.0; legs],
            target_active_hip_angle: 0.0,
            target_idle_hip_angle: 0.0,
            active_hip_torque: 0.0,
            idle_hip_torque: 0.0,
            spring_velocity: 0.0,
            body_velocity: Vector2::zeros(),
            body_pitch: 0.0,
        }
    }

    pub(crate) fn swap_active_leg(&mut self) {
        std::mem::swap(&mut self.active_leg, &mut self.idle_leg);
    }

    pub fn leg_count(&self) -> usize {
        self.target_thrust_lengths.len()
    }

    pub fn control_state(&self) -> ControlState {
        self.control_state
    }

    pub fn active_leg(&self) -> usize {
        self.active_leg
    }

    pub fn idle_leg(&self) -> usize {
        self.idle_leg
    }

    pub fn foot_in_contact(&self) -> bool {
        self.contact.foot_in_contact()
    }

    pub fn chassis_in_contact(&self) -> bool {
        self.contact.chassis_in_contact()
    }

    pub fn current_flight_period(&self) -> f32 {
        self.current_flight_period
    }

    /// Running length of the current stance, or of the last one while in flight.
    pub fn current_stance_period(&self) -> f32 {
        self.current_stance_period
    }

    pub fn next_stance_period_estimate(&self) -> f32 {
        self.next_stance_period_estimate
    }

    /// Chassis height at the apex of the most recent flight.
    pub fn last_hop_amplitude(&self) -> f32 {
        self.last_hop_amplitude
    }

    pub fn last_hop_amplitude_recorded(&self) -> bool {
        self.last_hop_amplitude_recorded
    }

    pub fn target_thrust_length(&self, leg: usize) -> f32 {
        self.target_thrust_lengths[leg]
    }

    pub fn target_thrust_lengths(&self) -> &[f32] {
        &self.target_thrust_lengths
    }

    pub fn target_spring_length(&self, leg: usize) -> f32 {
        self.target_spring_lengths[leg]
    }

    pub fn target_spring_lengths(&self) -> &[f32] {
        &self.target_spring_lengths
    }

    pub fn thrust_forces(&self) -> &[f32] {
        &self.thrust_forces
    }

    pub fn spring_forces(&self) -> &[f32] {
        &self.spring_forces
    }

    pub fn target_active_hip_angle(&self) -> f32 {
        self.target_active_hip_angle
    }

    pub fn target_idle_hip_angle(&self) -> f32 {
        self.target_idle_hip_angle
    }

    pub fn active_hip_torque(&self) -> f32 {
        self.active_hip_torque
    }

    pub fn idle_hip_torque(&self) -> f32 {
        self.idle_hip_torque
    }

    pub fn spring_velocity(&self) -> f32 {
        self.spring_velocity
    }

    pub fn body_velocity(&self) -> Vector2<f32> {
        self.body_velocity
    }

    pub fn body_pitch(&self) -> f32 {
        self.body_pitch
    }
}
