use std::num::NonZeroUsize;

use rapier3d::crossbeam::channel::{unbounded, Receiver};
use rapier3d::prelude::*;

use crate::config::SimConfig;

/// Ground slab thickness (half extent) and depth across the hopping plane.
const GROUND_HALF_HEIGHT: f32 = 0.1;
const GROUND_HALF_DEPTH: f32 = 10.0;

pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub gravity: Vector<f32>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    pub ground: RigidBodyHandle,

    event_handler: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    contact_force_events: Receiver<ContactForceEvent>,
}

impl PhysicsWorld {
    pub fn new(config: &SimConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.dt;
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(config.solver_iterations).unwrap_or(NonZeroUsize::MIN);

        let (collision_send, collision_events) = unbounded();
        let (contact_force_send, contact_force_events) = unbounded();

        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();

        // Static ground slab, top face at y = 0
        let ground = rigid_body_set.insert(
            RigidBodyBuilder::fixed()
                .translation(vector![0.0, -GROUND_HALF_HEIGHT, 0.0])
                .build(),
        );
        let ground_collider = ColliderBuilder::cuboid(
            config.ground_half_width,
            GROUND_HALF_HEIGHT,
            GROUND_HALF_DEPTH,
        )
        .collision_groups(InteractionGroups::new(Group::GROUP_1, Group::ALL))
        .build();
        collider_set.insert_with_parent(ground_collider, ground, &mut rigid_body_set);

        Self {
            rigid_body_set,
            collider_set,
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            gravity: vector![config.gravity[0], config.gravity[1], 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            ground,
            event_handler: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_events,
            contact_force_events,
        }
    }

    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_handler,
        );

        // Contact force events are not consumed; keep the channel empty
        while self.contact_force_events.try_recv().is_ok() {}
    }

    /// Collision events raised since the last drain, as parent body pairs.
    /// Events on colliders without a parent body are dropped.
    pub fn drain_collision_events(&self) -> Vec<(RigidBodyHandle, RigidBodyHandle, bool)> {
        let mut events = Vec::new();
        while let Ok(event) = self.collision_events.try_recv() {
            let parent = |h: ColliderHandle| self.collider_set.get(h).and_then(|c| c.parent());
            match (parent(event.collider1()), parent(event.collider2())) {
                (Some(a), Some(b)) => events.push((a, b, event.started())),
                _ => log::debug!("collision event on a detached collider: {:?}", event),
            }
        }
        events
    }
}
