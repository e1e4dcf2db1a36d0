//! Fixed-timestep driver: controller update, engine step, contact dispatch.

use hopper::control::{ControlProvider, ControlSequence};
use hopper::controller::HopperController;
use hopper::error::HopperError;
use hopper::snapshot::AvatarState;

use crate::avatar::HopperAvatar;
use crate::config::SimConfig;
use crate::physics::PhysicsWorld;
use crate::plant::AvatarPlant;

pub struct HopperSim<P: ControlProvider = ControlSequence> {
    world: PhysicsWorld,
    avatar: HopperAvatar,
    controller: HopperController<P>,
    config: SimConfig,
    time: f32,
    steps: u64,
}

impl<P: ControlProvider> HopperSim<P> {
    /// Build the world and avatar and bind a controller to them.
    pub fn new(config: SimConfig, provider: P) -> Result<Self, HopperError> {
        let mut world = PhysicsWorld::new(&config);
        let avatar = HopperAvatar::build(&mut world, &config);
        Self::with_avatar(config, world, avatar, provider)
    }

    /// Bind a controller to an avatar that was built separately.
    pub fn with_avatar(
        config: SimConfig,
        mut world: PhysicsWorld,
        avatar: HopperAvatar,
        provider: P,
    ) -> Result<Self, HopperError> {
        let controller = {
            let plant = AvatarPlant::new(&mut world, &avatar, config.actuation);
            HopperController::new(provider, &plant)?
        };

        log::info!(
            "HopperSim: dt {}, {:?} actuation, {} controls",
            config.dt,
            config.actuation,
            controller.provider().len()
        );

        Ok(Self {
            world,
            avatar,
            controller,
            config,
            time: 0.0,
            steps: 0,
        })
    }

    pub fn step(&mut self) {
        let dt = self.world.dt();

        {
            let mut plant = AvatarPlant::new(&mut self.world, &self.avatar, self.config.actuation);
            plant.begin_tick();
            self.controller.update(&mut plant, dt);
        }

        self.world.step();

        for (a, b, started) in self.world.drain_collision_events() {
            if started {
                self.controller.on_begin_contact(&a, &b, &self.avatar);
            } else {
                self.controller.on_end_contact(&a, &b, &self.avatar);
            }
        }

        self.time += dt;
        self.steps += 1;
    }

    /// Step for `seconds` of simulated time. Returns the number of steps.
    pub fn run_for(&mut self, seconds: f32) -> usize {
        let steps = (seconds / self.world.dt()).round().max(0.0) as usize;
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    pub fn avatar_state(&mut self) -> AvatarState {
        let control_state = self.controller.control_state();
        let plant = AvatarPlant::new(&mut self.world, &self.avatar, self.config.actuation);
        AvatarState::extract(&plant, control_state)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn controller(&self) -> &HopperController<P> {
        &self.controller
    }

    pub fn avatar(&self) -> &HopperAvatar {
        &self.avatar
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
