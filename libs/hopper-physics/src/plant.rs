//! Rapier-backed [`Plant`]: joint sensing and actuation for a built avatar.

use hopper::plant::{ChassisReading, JointKind, JointReading, JointRef, MotorCommand, Plant};
use nalgebra::Vector2;
use rapier3d::prelude::*;

use crate::avatar::HopperAvatar;
use crate::config::ActuationMode;
use crate::physics::PhysicsWorld;

/// Motors saturate immediately: force = factor * (target - current velocity).
const MOTOR_DAMPING_FACTOR: f32 = 1.0;

pub struct AvatarPlant<'a> {
    world: &'a mut PhysicsWorld,
    avatar: &'a HopperAvatar,
    mode: ActuationMode,
}

impl<'a> AvatarPlant<'a> {
    pub fn new(world: &'a mut PhysicsWorld, avatar: &'a HopperAvatar, mode: ActuationMode) -> Self {
        Self { world, avatar, mode }
    }

    /// Clear last tick's external forces. Call once per tick before any
    /// [`Plant::apply_effort`].
    pub fn begin_tick(&mut self) {
        if self.mode != ActuationMode::NativeForce {
            return;
        }
        for handle in self.avatar.bodies() {
            if let Some(body) = self.world.rigid_body_set.get_mut(handle) {
                body.reset_forces(true);
                body.reset_torques(true);
            }
        }
    }

    fn drive_motor(&mut self, joint: JointRef, effort: f32) {
        let Some(handle) = self.avatar.joint_handle(joint) else {
            log::warn!("no motor for {:?}", joint);
            return;
        };
        let Some(impulse_joint) = self.world.impulse_joint_set.get_mut(handle) else {
            log::warn!("joint {:?} missing from the world", joint);
            return;
        };

        let axis = match joint.kind {
            JointKind::Hip => JointAxis::AngX,
            JointKind::Thrust | JointKind::Spring => JointAxis::LinX,
        };
        let command = MotorCommand::saturating(effort);

        impulse_joint
            .data
            .set_motor_model(axis, MotorModel::ForceBased)
            .set_motor_velocity(axis, command.target_velocity, MOTOR_DAMPING_FACTOR)
            .set_motor_max_force(axis, command.max_effort);
    }

    fn push_bodies(&mut self, joint: JointRef, effort: f32) {
        let Some((a, b)) = self.avatar.joint_bodies(joint) else {
            log::warn!("no bodies for {:?}", joint);
            return;
        };

        let load = match joint.kind {
            JointKind::Hip => Load::Torque(vector![0.0, 0.0, effort]),
            JointKind::Thrust | JointKind::Spring => {
                match prismatic_axis(&*self.world, self.avatar, joint) {
                    Some(axis) => Load::Force(axis * effort),
                    None => return,
                }
            }
        };

        // Equal and opposite: body2 along the joint's positive direction
        for (handle, sign) in [(b, 1.0), (a, -1.0)] {
            if let Some(body) = self.world.rigid_body_set.get_mut(handle) {
                match load {
                    Load::Force(f) => body.add_force(f * sign, true),
                    Load::Torque(t) => body.add_torque(t * sign, true),
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Load {
    Force(Vector<f32>),
    Torque(Vector<f32>),
}

/// World-space slide axis, fixed in the joint's first body.
fn prismatic_axis(world: &PhysicsWorld, avatar: &HopperAvatar, joint: JointRef) -> Option<Vector<f32>> {
    let (a, _) = avatar.joint_bodies(joint)?;
    let local_axis = world
        .impulse_joint_set
        .get(avatar.joint_handle(joint)?)?
        .data
        .local_axis1();
    Some(world.rigid_body_set.get(a)?.rotation() * local_axis.into_inner())
}

/// Chassis pose and velocity in the hopping plane.
pub fn read_chassis(world: &PhysicsWorld, avatar: &HopperAvatar) -> ChassisReading {
    let Some(body) = world.rigid_body_set.get(avatar.chassis) else {
        log::error!("chassis body missing from the world");
        return ChassisReading::default();
    };

    let position = body.translation();
    let velocity = body.linvel();
    ChassisReading {
        position: Vector2::new(position.x, position.y),
        velocity: Vector2::new(velocity.x, velocity.y),
        pitch: body.rotation().euler_angles().2,
        angular_velocity: body.angvel().z,
    }
}

pub fn read_joint(world: &PhysicsWorld, avatar: &HopperAvatar, joint: JointRef) -> Option<JointReading> {
    let (a, b) = avatar.joint_bodies(joint)?;
    let body_a = world.rigid_body_set.get(a)?;
    let body_b = world.rigid_body_set.get(b)?;

    match joint.kind {
        JointKind::Hip => {
            let relative = body_a.rotation().inverse() * body_b.rotation();
            Some(JointReading::Revolute {
                angle: relative.euler_angles().2,
                angular_speed: body_b.angvel().z - body_a.angvel().z,
            })
        }
        JointKind::Thrust | JointKind::Spring => {
            let axis = prismatic_axis(world, avatar, joint)?;
            let separation = body_b.translation() - body_a.translation();
            let relative_velocity = body_b.linvel() - body_a.linvel();

            Some(JointReading::Prismatic {
                translation: separation.dot(&axis) - avatar.reference_length(joint),
                // The axis turns with body 1
                linear_speed: axis.dot(&relative_velocity)
                    + separation.dot(&body_a.angvel().cross(&axis)),
            })
        }
    }
}

impl Plant for AvatarPlant<'_> {
    fn leg_count(&self) -> usize {
        self.avatar.leg_count()
    }

    fn chassis(&self) -> ChassisReading {
        read_chassis(&*self.world, self.avatar)
    }

    fn joint(&self, joint: JointRef) -> Option<JointReading> {
        read_joint(&*self.world, self.avatar, joint)
    }

    fn reference_length(&self, joint: JointRef) -> f32 {
        self.avatar.reference_length(joint)
    }

    fn apply_effort(&mut self, joint: JointRef, effort: f32) {
        match self.mode {
            ActuationMode::SaturatedMotor => self.drive_motor(joint, effort),
            ActuationMode::NativeForce => self.push_bodies(joint, effort),
        }
    }
}
