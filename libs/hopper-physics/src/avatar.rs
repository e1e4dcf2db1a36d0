//! Avatar topology: chassis plus, per leg, hip, knee and foot bodies joined
//! by a revolute hip, a thrust prismatic and a spring prismatic.
//!
//! The avatar lives in the x/y plane of the 3-D engine. Every body locks
//! z-translation and x/y rotation, so pitch is the rotation about z.

use hopper::config::HopperConfig;
use hopper::contact::ContactBodies;
use hopper::plant::{JointKind, JointRef};
use rapier3d::prelude::*;

use crate::config::SimConfig;
use crate::physics::PhysicsWorld;

#[derive(Clone, Copy, Debug)]
pub struct LegHandles {
    pub hip: RigidBodyHandle,
    pub knee: RigidBodyHandle,
    pub foot: RigidBodyHandle,
    pub hip_joint: ImpulseJointHandle,
    pub thrust_joint: ImpulseJointHandle,
    pub spring_joint: ImpulseJointHandle,
    pub thrust_reference: f32,
    pub spring_reference: f32,
}

/// Handles into a [`PhysicsWorld`] for one built avatar.
#[derive(Clone, Debug)]
pub struct HopperAvatar {
    pub chassis: RigidBodyHandle,
    pub legs: Vec<LegHandles>,
}

fn planar_body(position: [f32; 2], velocity: [f32; 2]) -> RigidBody {
    RigidBodyBuilder::dynamic()
        .translation(vector![position[0], position[1], 0.0])
        .linvel(vector![velocity[0], velocity[1], 0.0])
        .locked_axes(
            LockedAxes::TRANSLATION_LOCKED_Z
                | LockedAxes::ROTATION_LOCKED_X
                | LockedAxes::ROTATION_LOCKED_Y,
        )
        .can_sleep(false)
        .build()
}

fn avatar_collider(shape: ColliderBuilder, density: f32) -> Collider {
    // Avatar = Group 2, only meets the ground (Group 1)
    shape
        .density(density)
        .collision_groups(InteractionGroups::new(Group::GROUP_2, Group::GROUP_1))
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .build()
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

fn planar_box(half_extents: [f32; 2]) -> ColliderBuilder {
    ColliderBuilder::cuboid(half_extents[0], half_extents[1], HopperConfig::BODY_HALF_DEPTH)
}

impl HopperAvatar {
    /// Build chassis and legs at `config.initial_position`, every body
    /// moving at `config.initial_velocity`.
    pub fn build(world: &mut PhysicsWorld, config: &SimConfig) -> Self {
        Self::build_with_legs(world, config, HopperConfig::NUM_LEGS)
    }

    pub fn build_with_legs(world: &mut PhysicsWorld, config: &SimConfig, legs: usize) -> Self {
        let origin = config.initial_position;
        let velocity = config.initial_velocity;

        let chassis = world.rigid_body_set.insert(planar_body(origin, velocity));
        world.collider_set.insert_with_parent(
            avatar_collider(
                planar_box(HopperConfig::CHASSIS_HALF_EXTENTS),
                HopperConfig::CHASSIS_DENSITY,
            ),
            chassis,
            &mut world.rigid_body_set,
        );

        let legs = (0..legs)
            .map(|_| Self::build_leg(world, chassis, origin, velocity))
            .collect::<Vec<_>>();

        log::info!(
            "HopperAvatar: built {} legs at ({:.2}, {:.2})",
            legs.len(),
            origin[0],
            origin[1]
        );

        Self { chassis, legs }
    }

    fn build_leg(
        world: &mut PhysicsWorld,
        chassis: RigidBodyHandle,
        origin: [f32; 2],
        velocity: [f32; 2],
    ) -> LegHandles {
        let knee_pos = [origin[0], origin[1] - HopperConfig::UPPER_LEG_DEFAULT_LENGTH];
        let foot_pos = [origin[0], knee_pos[1] - HopperConfig::LOWER_LEG_DEFAULT_LENGTH];

        let mut add_body = |position: [f32; 2], collider: Collider| {
            let handle = world.rigid_body_set.insert(planar_body(position, velocity));
            world
                .collider_set
                .insert_with_parent(collider, handle, &mut world.rigid_body_set);
            handle
        };

        let hip = add_body(
            origin,
            avatar_collider(planar_box(HopperConfig::HIP_HALF_EXTENTS), HopperConfig::HIP_DENSITY),
        );
        let knee = add_body(
            knee_pos,
            avatar_collider(planar_box(HopperConfig::KNEE_HALF_EXTENTS), HopperConfig::KNEE_DENSITY),
        );
        let foot = add_body(
            foot_pos,
            avatar_collider(
                ColliderBuilder::ball(HopperConfig::FOOT_RADIUS).friction(HopperConfig::FOOT_FRICTION),
                HopperConfig::FOOT_DENSITY,
            ),
        );

        // Hip pivots about the chassis's initial position, which both share
        let hip_joint = RevoluteJointBuilder::new(Vector::z_axis())
            .local_anchor1(point![0.0, 0.0, 0.0])
            .local_anchor2(point![0.0, 0.0, 0.0])
            .contacts_enabled(false)
            .build();
        let hip_joint = world.impulse_joint_set.insert(chassis, hip, hip_joint, true);

        // Knee first: positive translation and effort extend the upper leg
        let thrust_reference = distance(knee_pos, origin);
        let thrust_joint = PrismaticJointBuilder::new(Vector::y_axis())
            .local_anchor1(point![0.0, 0.5 * thrust_reference, 0.0])
            .local_anchor2(point![0.0, -0.5 * thrust_reference, 0.0])
            .contacts_enabled(false)
            .build();
        let thrust_joint = world.impulse_joint_set.insert(knee, hip, thrust_joint, true);

        // Foot first; the stop keeps the spring between fully compressed and rest
        let spring_reference = distance(foot_pos, knee_pos);
        let spring_joint = PrismaticJointBuilder::new(Vector::y_axis())
            .local_anchor1(point![0.0, 0.5 * spring_reference, 0.0])
            .local_anchor2(point![0.0, -0.5 * spring_reference, 0.0])
            .limits([-HopperConfig::LOWER_LEG_DEFAULT_LENGTH, 0.0])
            .contacts_enabled(false)
            .build();
        let spring_joint = world.impulse_joint_set.insert(foot, knee, spring_joint, true);

        LegHandles {
            hip,
            knee,
            foot,
            hip_joint,
            thrust_joint,
            spring_joint,
            thrust_reference,
            spring_reference,
        }
    }

    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Every avatar body, chassis first.
    pub fn bodies(&self) -> Vec<RigidBodyHandle> {
        let mut bodies = vec![self.chassis];
        for leg in &self.legs {
            bodies.extend([leg.hip, leg.knee, leg.foot]);
        }
        bodies
    }

    pub fn joint_handle(&self, joint: JointRef) -> Option<ImpulseJointHandle> {
        let leg = self.legs.get(joint.leg)?;
        Some(match joint.kind {
            JointKind::Hip => leg.hip_joint,
            JointKind::Thrust => leg.thrust_joint,
            JointKind::Spring => leg.spring_joint,
        })
    }

    /// `(body1, body2)` in the order the joint was created with.
    pub fn joint_bodies(&self, joint: JointRef) -> Option<(RigidBodyHandle, RigidBodyHandle)> {
        let leg = self.legs.get(joint.leg)?;
        Some(match joint.kind {
            JointKind::Hip => (self.chassis, leg.hip),
            JointKind::Thrust => (leg.knee, leg.hip),
            JointKind::Spring => (leg.foot, leg.knee),
        })
    }

    /// Zero-translation length of a prismatic joint. Revolute joints have none.
    pub fn reference_length(&self, joint: JointRef) -> f32 {
        match (self.legs.get(joint.leg), joint.kind) {
            (Some(leg), JointKind::Thrust) => leg.thrust_reference,
            (Some(leg), JointKind::Spring) => leg.spring_reference,
            _ => 0.0,
        }
    }
}

impl ContactBodies for HopperAvatar {
    type Body = RigidBodyHandle;

    fn foot(&self, leg: usize) -> Option<RigidBodyHandle> {
        self.legs.get(leg).map(|l| l.foot)
    }

    fn chassis(&self) -> RigidBodyHandle {
        self.chassis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn build() -> (PhysicsWorld, HopperAvatar) {
        let config = SimConfig::default();
        let mut world = PhysicsWorld::new(&config);
        let avatar = HopperAvatar::build(&mut world, &config);
        (world, avatar)
    }

    #[test]
    fn test_topology_counts() {
        let (world, avatar) = build();

        assert_eq!(avatar.leg_count(), 2);
        assert_eq!(avatar.bodies().len(), 7);
        // ground body plus avatar
        assert_eq!(world.rigid_body_set.len(), 8);
        assert_eq!(world.collider_set.len(), 8);
        assert_eq!(world.impulse_joint_set.len(), 6);
    }

    #[test]
    fn test_reference_lengths_match_body_spacing() {
        let (world, avatar) = build();

        for leg in 0..avatar.leg_count() {
            for joint in [JointRef::thrust(leg), JointRef::spring(leg)] {
                let (a, b) = avatar.joint_bodies(joint).unwrap();
                let distance = (world.rigid_body_set[b].translation()
                    - world.rigid_body_set[a].translation())
                .norm();
                assert_relative_eq!(distance, avatar.reference_length(joint), epsilon = 1.0e-5);
            }
        }
        assert_eq!(avatar.reference_length(JointRef::thrust(0)), 3.0);
        assert_eq!(avatar.reference_length(JointRef::spring(1)), 2.0);
        assert_eq!(avatar.reference_length(JointRef::hip(0)), 0.0);
    }

    #[test]
    fn test_legs_hang_below_chassis() {
        let (world, avatar) = build();
        let chassis = world.rigid_body_set[avatar.chassis].translation();
        let leg = avatar.legs[0];

        assert_relative_eq!(world.rigid_body_set[leg.hip].translation().y, chassis.y);
        assert_relative_eq!(world.rigid_body_set[leg.knee].translation().y, chassis.y - 3.0);
        assert_relative_eq!(world.rigid_body_set[leg.foot].translation().y, chassis.y - 5.0);
    }

    #[test]
    fn test_contact_bodies() {
        let (_, avatar) = build();
        assert_eq!(avatar.foot(1), Some(avatar.legs[1].foot));
        assert_eq!(avatar.foot(2), None);
        assert_eq!(ContactBodies::chassis(&avatar), avatar.chassis);
        assert!(avatar.joint_handle(JointRef::spring(5)).is_none());
    }

    #[test]
    fn test_initial_velocity_on_every_body() {
        let config = SimConfig {
            initial_velocity: [1.5, -0.5],
            ..SimConfig::default()
        };
        let mut world = PhysicsWorld::new(&config);
        let avatar = HopperAvatar::build(&mut world, &config);

        for body in avatar.bodies() {
            let v = world.rigid_body_set[body].linvel();
            assert_eq!((v.x, v.y), (1.5, -0.5));
        }
    }
}
