//! Hop controller: per-tick sensing, the hop state machine and the servo
//! laws that turn both into actuator efforts.

pub mod servo;
mod state;

pub use state::{ControlState, RuntimeState};

use crate::config::HopperConfig;
use crate::contact::ContactBodies;
use crate::control::{ControlParams, ControlProvider, ControlSequence};
use crate::error::HopperError;
use crate::plant::{ChassisReading, JointRef, Plant};
use servo::{AngularPd, SpringLaw};

pub struct HopperController<P: ControlProvider = ControlSequence> {
    state: RuntimeState,
    provider: P,

    // Joint lengths at construction; translations are measured from these
    thrust_reference: Vec<f32>,
    spring_reference: Vec<f32>,

    total_time: f32,
}

impl<P: ControlProvider> HopperController<P> {
    /// Bind a controller to an already built avatar.
    pub fn new<T: Plant>(provider: P, plant: &T) -> Result<Self, HopperError> {
        let legs = plant.leg_count();
        if legs == 0 || legs > HopperConfig::NUM_LEGS {
            return Err(HopperError::UnsupportedLegCount(legs));
        }

        let thrust_reference: Vec<f32> = (0..legs)
            .map(|leg| plant.reference_length(JointRef::thrust(leg)))
            .collect();
        let spring_reference: Vec<f32> = (0..legs)
            .map(|leg| plant.reference_length(JointRef::spring(leg)))
            .collect();

        log::info!(
            "HopperController: {} legs, thrust reference {:?}, spring reference {:?}",
            legs,
            thrust_reference,
            spring_reference
        );

        Ok(Self {
            state: RuntimeState::new(spring_reference.clone()),
            provider,
            thrust_reference,
            spring_reference,
            total_time: 0.0,
        })
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn control_state(&self) -> ControlState {
        self.state.control_state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn current_control(&self) -> &ControlParams {
        self.provider.current()
    }

    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    pub fn on_begin_contact<C: ContactBodies>(&mut self, a: &C::Body, b: &C::Body, bodies: &C) {
        let active_leg = self.state.active_leg;
        self.state.contact.begin_contact(a, b, active_leg, bodies);
    }

    pub fn on_end_contact<C: ContactBodies>(&mut self, a: &C::Body, b: &C::Body, bodies: &C) {
        let active_leg = self.state.active_leg;
        self.state.contact.end_contact(a, b, active_leg, bodies);
    }

    /// Override the sensed foot contact, bypassing engine notifications.
    pub fn set_foot_in_contact(&mut self, in_contact: bool) {
        self.state.contact.set_foot_in_contact(in_contact);
    }

    /// Advance control by one tick. Must run once per physics step,
    /// before the engine integrates that step.
    pub fn update<T: Plant>(&mut self, plant: &mut T, dt: f32) {
        self.total_time += dt;

        let chassis = self.sense(plant);
        self.transition();

        match self.state.control_state {
            ControlState::Flight => {
                self.servo_leg_placement(plant, dt);
                self.record_hop_apex(&chassis);
            }
            ControlState::Load | ControlState::Unload => {}
            ControlState::Compress | ControlState::Thrust => {
                self.servo_body_pitch(plant);
            }
        }

        if self.state.foot_in_contact() {
            self.state.current_stance_period += dt;
        } else {
            self.state.current_flight_period += dt;
        }

        if self.state.leg_count() > 1 {
            self.servo_idle_hip_pitch(plant);
        }

        self.update_springs(plant);
    }

    fn sense<T: Plant>(&mut self, plant: &T) -> ChassisReading {
        let chassis = plant.chassis();
        let (_, spring_velocity) = joint_reading(plant, JointRef::spring(self.state.active_leg));

        self.state.spring_velocity = spring_velocity;
        self.state.body_velocity = chassis.velocity;
        self.state.body_pitch = chassis.pitch;
        chassis
    }

    fn transition(&mut self) {
        let from = self.state.control_state;

        match from {
            ControlState::Flight => {
                if self.state.foot_in_contact() {
                    self.state.control_state = ControlState::Compress;
                    self.state.current_stance_period = 0.0;
                }
            }
            ControlState::Compress => {
                // Spring starts extending again: past the compression trough
                if self.state.spring_velocity > 0.0 {
                    self.state.control_state = ControlState::Thrust;

                    let active = self.state.active_leg;
                    self.state.target_thrust_lengths[active] +=
                        self.provider.current().active_thrust_delta;
                }
            }
            ControlState::Thrust => {
                if !self.state.foot_in_contact() {
                    self.state.control_state = ControlState::Flight;
                    self.state.next_stance_period_estimate = self.state.current_stance_period;
                    self.state.swap_active_leg();
                    self.state.last_hop_amplitude_recorded = false;
                    self.state.current_flight_period = 0.0;

                    // New hop, new parameters
                    self.provider.advance();
                    log::debug!(
                        "liftoff: active leg {}, control {}",
                        self.state.active_leg,
                        self.provider.current_index()
                    );
                }
            }
            ControlState::Load | ControlState::Unload => {}
        }

        if from != self.state.control_state {
            log::debug!(
                "{} -> {} at t={:.4}",
                from,
                self.state.control_state,
                self.total_time
            );
        }
    }

    fn record_hop_apex(&mut self, chassis: &ChassisReading) {
        if !self.state.last_hop_amplitude_recorded && chassis.velocity.y < 0.0 {
            self.state.last_hop_amplitude_recorded = true;
            self.state.last_hop_amplitude = chassis.position.y;
            log::debug!("hop apex {:.3}", chassis.position.y);
        }
    }

    fn servo_leg_placement<T: Plant>(&mut self, plant: &mut T, dt: f32) {
        let control = *self.provider.current();
        let active = self.state.active_leg;
        let idle = self.state.idle_leg;

        // Lengthen the active leg for landing, retract the idle one
        let alpha = servo::blend_alpha(dt);
        let active_terminal_length = HopperConfig::UPPER_LEG_DEFAULT_LENGTH;
        let idle_terminal_length = active_terminal_length + control.idle_thrust_delta;

        self.state.target_thrust_lengths[active] = servo::lerp(
            self.state.target_thrust_lengths[active],
            active_terminal_length,
            alpha,
        );
        if self.state.leg_count() > 1 {
            self.state.target_thrust_lengths[idle] = servo::lerp(
                self.state.target_thrust_lengths[idle],
                idle_terminal_length,
                alpha,
            );
        }

        // Swing the active leg toward the landing point
        let offset = servo::landing_offset(
            self.state.body_velocity.x,
            self.state.next_stance_period_estimate,
            &control,
            active_terminal_length,
        );
        let target =
            servo::landing_hip_angle(offset, self.state.body_pitch, active_terminal_length);

        self.state.target_active_hip_angle = target;
        self.state.active_hip_torque = servo_toward_angle(plant, JointRef::hip(active), target);
    }

    fn servo_body_pitch<T: Plant>(&mut self, plant: &mut T) {
        let target = self.state.body_pitch - self.provider.current().target_body_pitch;
        let active = self.state.active_leg;

        self.state.target_active_hip_angle = target;
        self.state.active_hip_torque = servo_toward_angle(plant, JointRef::hip(active), target);
    }

    fn servo_idle_hip_pitch<T: Plant>(&mut self, plant: &mut T) {
        let (active_hip_angle, _) = joint_reading(plant, JointRef::hip(self.state.active_leg));
        let target = -active_hip_angle;

        self.state.target_idle_hip_angle = target;
        self.state.idle_hip_torque =
            servo_toward_angle(plant, JointRef::hip(self.state.idle_leg), target);
    }

    fn update_springs<T: Plant>(&mut self, plant: &mut T) {
        for leg in 0..self.state.leg_count() {
            let thrust_rest = self.state.target_thrust_lengths[leg] - self.thrust_reference[leg];
            self.state.thrust_forces[leg] =
                drive_spring(plant, JointRef::thrust(leg), thrust_rest, &SpringLaw::THRUST);

            let spring_rest = self.state.target_spring_lengths[leg] - self.spring_reference[leg];
            self.state.spring_forces[leg] =
                drive_spring(plant, JointRef::spring(leg), spring_rest, &SpringLaw::HOP);
        }
    }
}

fn joint_reading<T: Plant>(plant: &T, joint: JointRef) -> (f32, f32) {
    match plant.joint(joint) {
        Some(reading) => (reading.position(), reading.rate()),
        None => {
            log::debug!("no reading for {:?}, treating it as at rest", joint);
            (0.0, 0.0)
        }
    }
}

/// PD torque toward `target_angle`, applied and returned.
fn servo_toward_angle<T: Plant>(plant: &mut T, joint: JointRef, target_angle: f32) -> f32 {
    let (angle, angular_speed) = joint_reading(plant, joint);
    let torque = AngularPd::HIP.torque(target_angle, angle, angular_speed);
    plant.apply_effort(joint, torque);
    torque
}

/// Spring force toward `rest_translation` (relative to the reference
/// length), applied and returned.
fn drive_spring<T: Plant>(
    plant: &mut T,
    joint: JointRef,
    rest_translation: f32,
    law: &SpringLaw,
) -> f32 {
    let (translation, speed) = joint_reading(plant, joint);
    let force = law.force(rest_translation - translation, speed);
    plant.apply_effort(joint, force);
    force
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::testing::ScriptedPlant;
    use approx::assert_relative_eq;

    fn setup(controls: Vec<ControlParams>) -> (HopperController, ScriptedPlant) {
        let plant = ScriptedPlant::new(2);
        let sequence = ControlSequence::new(controls).unwrap();
        let controller = HopperController::new(sequence, &plant).unwrap();
        (controller, plant)
    }

    fn tick(
        controller: &mut HopperController,
        plant: &mut ScriptedPlant,
        in_contact: bool,
        dt: f32,
    ) -> ControlState {
        controller.set_foot_in_contact(in_contact);
        controller.update(plant, dt);
        controller.control_state()
    }

    /// Drive the foot through touchdown, trough and liftoff with the
    /// spring always extending.
    fn run_hop(controller: &mut HopperController, plant: &mut ScriptedPlant, dt: f32) {
        plant.set_spring_rate(0, 0.5);
        plant.set_spring_rate(1, 0.5);
        for in_contact in [true, true, true, false, false, false] {
            tick(controller, plant, in_contact, dt);
        }
    }

    #[test]
    fn test_rejects_unsupported_leg_count() {
        for legs in [0, 3] {
            let plant = ScriptedPlant::new(legs);
            let result = HopperController::new(ControlSequence::default(), &plant);
            assert!(matches!(result, Err(HopperError::UnsupportedLegCount(n)) if n == legs));
        }
    }

    #[test]
    fn test_hop_cycle_order_for_any_dt() {
        for dt in [1.0e-4, 1.0e-3, 1.0 / 60.0, 0.1, 1.0] {
            let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
            let mut observed = vec![controller.control_state()];

            for _ in 0..4 {
                plant.set_spring_rate(0, 0.5);
                plant.set_spring_rate(1, 0.5);
                for in_contact in [true, true, true, false, false, false] {
                    let state = tick(&mut controller, &mut plant, in_contact, dt);
                    assert_ne!(state, ControlState::Load);
                    assert_ne!(state, ControlState::Unload);
                    if observed.last() != Some(&state) {
                        observed.push(state);
                    }
                }
            }

            let cycle = [ControlState::Compress, ControlState::Thrust, ControlState::Flight];
            let expected: Vec<ControlState> = std::iter::once(ControlState::Flight)
                .chain(cycle.iter().copied().cycle().take(12))
                .collect();
            assert_eq!(observed, expected, "dt = {dt}");
        }
    }

    #[test]
    fn test_legs_swap_once_per_liftoff() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        let mut liftoffs = 0;
        let mut swaps = 0;
        let mut previous_state = controller.control_state();
        let mut previous_active = controller.state().active_leg();

        plant.set_spring_rate(0, 0.5);
        plant.set_spring_rate(1, 0.5);
        let pattern = [true, true, false, false, true, false, true, true, true, false];
        for in_contact in pattern.iter().cycle().take(60) {
            let state = tick(&mut controller, &mut plant, *in_contact, 0.01);
            let runtime = controller.state();
            assert_ne!(runtime.active_leg(), runtime.idle_leg());

            if previous_state == ControlState::Thrust && state == ControlState::Flight {
                liftoffs += 1;
            }
            if runtime.active_leg() != previous_active {
                swaps += 1;
                assert_eq!(state, ControlState::Flight);
                assert_eq!(previous_state, ControlState::Thrust);
            }
            previous_state = state;
            previous_active = runtime.active_leg();
        }

        assert!(liftoffs > 0);
        assert_eq!(swaps, liftoffs);
    }

    #[test]
    fn test_flight_without_contact_latches_apex_once() {
        let dt = 1.0 / 1000.0;
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        plant.chassis.position.y = 6.0;

        let mut updates = 0;
        let mut previous = controller.state().last_hop_amplitude_recorded();
        let mut latched_height = None;

        // Released from rest: vertical velocity is zero on the first tick only
        for step in 0..5000 {
            let t = step as f32 * dt;
            plant.chassis.velocity.y = -10.0 * t;
            plant.chassis.position.y = 6.0 - 5.0 * t * t;
            let height = plant.chassis.position.y;

            let state = tick(&mut controller, &mut plant, false, dt);
            assert_eq!(state, ControlState::Flight);

            let recorded = controller.state().last_hop_amplitude_recorded();
            if recorded != previous {
                updates += 1;
                assert_eq!(step, 1);
                latched_height = Some(height);
            }
            previous = recorded;
        }

        assert_eq!(updates, 1);
        assert_eq!(Some(controller.state().last_hop_amplitude()), latched_height);
        assert_relative_eq!(controller.state().current_flight_period(), 5.0, max_relative = 1.0e-3);
    }

    #[test]
    fn test_touchdown_then_trough_adds_thrust_once() {
        let control = ControlParams::new().with_active_thrust_delta(0.5);
        let (mut controller, mut plant) = setup(vec![control]);
        let active = controller.state().active_leg();

        plant.set_spring_rate(active, -0.5);
        assert_eq!(tick(&mut controller, &mut plant, true, 0.001), ControlState::Compress);
        let before = controller.state().target_thrust_length(active);

        plant.set_spring_rate(active, 0.5);
        assert_eq!(tick(&mut controller, &mut plant, true, 0.001), ControlState::Thrust);
        assert_eq!(controller.state().target_thrust_length(active), before + 0.5);

        // Still extending: no second kick within the same stance
        for _ in 0..10 {
            tick(&mut controller, &mut plant, true, 0.001);
        }
        assert_eq!(controller.state().target_thrust_length(active), before + 0.5);
        assert!(controller.state().thrust_forces()[active] > 0.0);
    }

    #[test]
    fn test_provider_advances_on_liftoff_and_holds_last() {
        let (mut controller, mut plant) = setup(vec![
            ControlParams::new().with_target_vel_x(0.5),
            ControlParams::new().with_target_vel_x(1.0),
        ]);
        assert_eq!(controller.provider().current_index(), 0);

        run_hop(&mut controller, &mut plant, 0.001);
        assert_eq!(controller.provider().current_index(), 1);
        assert_eq!(controller.current_control().target_body_vel_x, 1.0);

        run_hop(&mut controller, &mut plant, 0.001);
        assert_eq!(controller.provider().current_index(), 1);
        assert_eq!(controller.current_control().target_body_vel_x, 1.0);
    }

    #[test]
    fn test_stance_estimate_from_last_stance() {
        let dt = 0.25;
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        plant.set_spring_rate(0, 0.5);

        tick(&mut controller, &mut plant, true, dt);
        tick(&mut controller, &mut plant, true, dt);
        assert_eq!(controller.state().current_stance_period(), 0.5);

        tick(&mut controller, &mut plant, false, dt);
        assert_eq!(controller.control_state(), ControlState::Flight);
        assert_eq!(controller.state().next_stance_period_estimate(), 0.5);
        assert_eq!(controller.state().current_flight_period(), 0.25);
    }

    #[test]
    fn test_apex_latch_clears_at_liftoff() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        plant.chassis.velocity.y = -1.0;
        plant.chassis.position.y = 4.0;
        tick(&mut controller, &mut plant, false, 0.01);
        assert!(controller.state().last_hop_amplitude_recorded());
        assert_eq!(controller.state().last_hop_amplitude(), 4.0);

        plant.set_spring_rate(0, 0.5);
        tick(&mut controller, &mut plant, true, 0.01);
        tick(&mut controller, &mut plant, true, 0.01);

        // Rising at liftoff: latch cleared, nothing recorded yet
        plant.chassis.velocity.y = 2.0;
        tick(&mut controller, &mut plant, false, 0.01);
        assert!(!controller.state().last_hop_amplitude_recorded());
        assert_eq!(controller.state().last_hop_amplitude(), 4.0);

        plant.chassis.velocity.y = -0.1;
        plant.chassis.position.y = 5.5;
        tick(&mut controller, &mut plant, false, 0.01);
        assert!(controller.state().last_hop_amplitude_recorded());
        assert_eq!(controller.state().last_hop_amplitude(), 5.5);
    }

    #[test]
    fn test_flight_retargets_leg_lengths() {
        let control = ControlParams {
            idle_thrust_delta: -1.0,
            ..ControlParams::default()
        };
        let (mut controller, mut plant) = setup(vec![control]);

        tick(&mut controller, &mut plant, false, 0.001);
        let state = controller.state();
        assert_relative_eq!(state.target_thrust_length(state.active_leg()), 3.0, max_relative = 1.0e-6);
        assert_relative_eq!(
            state.target_thrust_length(state.idle_leg()),
            0.995 * 3.0 + 0.005 * 2.0,
            max_relative = 1.0e-5
        );

        // A tick long enough to saturate the blend lands on the terminal length
        tick(&mut controller, &mut plant, false, 1.0);
        let state = controller.state();
        assert_eq!(state.target_thrust_length(state.idle_leg()), 2.0);
    }

    #[test]
    fn test_flight_places_active_foot() {
        let control = ControlParams {
            target_body_vel_x: 0.0,
            target_body_vel_x_leg_placement_gain: 0.1,
            ..ControlParams::default()
        };
        let (mut controller, mut plant) = setup(vec![control]);
        plant.chassis.velocity.x = 1.0;

        tick(&mut controller, &mut plant, false, 0.001);

        // 0.5 * 1.0 * 0.2 + 0.1 * 1.0
        let expected = (0.2f32 / 3.0).asin();
        let state = controller.state();
        assert_relative_eq!(state.target_active_hip_angle(), expected, max_relative = 1.0e-5);
        assert_relative_eq!(
            plant.effort(JointRef::hip(state.active_leg())),
            5000.0 * expected,
            max_relative = 1.0e-4
        );
    }

    #[test]
    fn test_flight_at_rest_targets_zero_angle() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        tick(&mut controller, &mut plant, false, 0.001);

        assert_eq!(controller.state().target_active_hip_angle(), 0.0);
        assert_eq!(plant.effort(JointRef::hip(0)), 0.0);
    }

    #[test]
    fn test_stance_servos_body_pitch() {
        let control = ControlParams {
            target_body_pitch: 0.05,
            ..ControlParams::default()
        };
        let (mut controller, mut plant) = setup(vec![control]);
        plant.chassis.pitch = 0.15;
        plant.set_spring_rate(0, -0.5);

        assert_eq!(tick(&mut controller, &mut plant, true, 0.001), ControlState::Compress);
        assert_relative_eq!(controller.state().target_active_hip_angle(), 0.1, max_relative = 1.0e-5);
        assert_relative_eq!(plant.effort(JointRef::hip(0)), 500.0, max_relative = 1.0e-4);
    }

    #[test]
    fn test_idle_hip_mirrors_active() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        plant.set_hip(0, 0.2, 0.0);

        tick(&mut controller, &mut plant, false, 0.001);

        assert_relative_eq!(controller.state().target_idle_hip_angle(), -0.2);
        assert_relative_eq!(plant.effort(JointRef::hip(1)), -1000.0, max_relative = 1.0e-5);
        assert_eq!(controller.state().idle_hip_torque(), plant.effort(JointRef::hip(1)));
    }

    #[test]
    fn test_springs_idle_at_reference() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        tick(&mut controller, &mut plant, false, 0.001);

        for leg in 0..2 {
            assert_eq!(plant.effort(JointRef::spring(leg)), 0.0);
            assert_eq!(controller.state().spring_forces()[leg], 0.0);
        }
        // Active leg stays at its nominal length during flight
        assert!(plant.effort(JointRef::thrust(0)).abs() < 1.0);
        // Idle leg is being retracted
        assert!(plant.effort(JointRef::thrust(1)) < 0.0);
    }

    #[test]
    fn test_single_leg_never_swaps() {
        let mut plant = ScriptedPlant::new(1);
        let mut controller = HopperController::new(ControlSequence::default(), &plant).unwrap();

        plant.set_spring_rate(0, 0.5);
        for in_contact in [true, true, false, false] {
            controller.set_foot_in_contact(in_contact);
            controller.update(&mut plant, 0.01);
            assert_eq!(controller.state().active_leg(), 0);
        }
        assert_eq!(controller.control_state(), ControlState::Flight);
        assert!(plant.efforts.keys().all(|joint| joint.leg == 0));
    }

    #[test]
    fn test_missing_joint_reads_as_rest() {
        let (mut controller, mut plant) = setup(vec![ControlParams::default()]);
        plant.readings.remove(&JointRef::spring(0));

        tick(&mut controller, &mut plant, false, 0.001);
        assert_eq!(controller.state().spring_velocity(), 0.0);
        assert_eq!(plant.effort(JointRef::spring(0)), 0.0);
    }
}
