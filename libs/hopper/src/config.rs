pub struct HopperConfig;

impl HopperConfig {
    pub const NUM_LEGS: usize = 2;

    // Hip servo (angular PD)
    pub const HIP_PROP_GAIN: f32 = 5000.0;
    pub const HIP_DRAG_GAIN: f32 = 1000.0;

    // Upper leg thrust actuator
    pub const THRUST_SPRING_PROP_GAIN: f32 = 20000.0;
    pub const THRUST_SPRING_DRAG_GAIN: f32 = 200.0;
    pub const THRUST_SPRING_EXPONENT: f32 = 1.1;

    // Lower leg hop spring
    pub const HOP_SPRING_PROP_GAIN: f32 = 3000.0;
    pub const HOP_SPRING_DRAG_GAIN: f32 = 100.0;
    pub const HOP_SPRING_EXPONENT: f32 = 1.0;

    // Body dimensions (half extents in the hopping plane)
    pub const CHASSIS_HALF_EXTENTS: [f32; 2] = [1.0, 0.5];
    /// Out-of-plane half thickness shared by every body.
    pub const BODY_HALF_DEPTH: f32 = 0.25;
    pub const CHASSIS_DENSITY: f32 = 2.0;

    pub const HIP_HALF_EXTENTS: [f32; 2] = [0.3, 0.1];
    pub const HIP_DENSITY: f32 = Self::CHASSIS_DENSITY * 5.0;
    pub const UPPER_LEG_DEFAULT_LENGTH: f32 = 3.0;

    pub const KNEE_HALF_EXTENTS: [f32; 2] = [0.2, 0.1];
    pub const KNEE_DENSITY: f32 = Self::CHASSIS_DENSITY * 5.0;
    pub const LOWER_LEG_DEFAULT_LENGTH: f32 = 2.0;

    pub const FOOT_RADIUS: f32 = 0.2;
    pub const FOOT_DENSITY: f32 = Self::CHASSIS_DENSITY * 5.0;
    pub const FOOT_FRICTION: f32 = 100.0; // high so the stance foot does not slip

    // Leg placement
    pub const LEG_PLACEMENT_BLEND_RATE: f32 = 5.0;
    pub const LANDING_OFFSET_LIMIT_FRACTION: f32 = 0.5;
    pub const LANDING_OFFSET_EPSILON: f32 = 1.0e-6;

    /// Stance duration assumed before the first liftoff has been observed.
    pub const INITIAL_STANCE_PERIOD_ESTIMATE: f32 = 0.2;

    /// Target velocity used to pin a motor against its force limit.
    pub const SATURATION_VELOCITY: f32 = 1.0e6;
}
