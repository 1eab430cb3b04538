//! Pure movement calculation logic that can be tested without Bevy runtime

use bevy::prelude::*;

/// Which movement keys are held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

/// Normalized XZ direction for the held keys; forward is -Z
pub fn input_direction(keys: MovementKeys) -> Vec3 {
    let mut direction = Vec3::ZERO;
    if keys.forward {
        direction.z -= 1.0;
    }
    if keys.back {
        direction.z += 1.0;
    }
    if keys.left {
        direction.x -= 1.0;
    }
    if keys.right {
        direction.x += 1.0;
    }
    direction.normalize_or_zero()
}

/// Tuning for sliding toy blocks
#[derive(Debug, Clone, Copy)]
pub struct BlockMotionConfig {
    /// Velocity retained per reference frame
    pub friction: f32,
    pub reference_rate: f32,
    /// Below this speed a block comes to rest
    pub rest_speed: f32,
    pub floor_y: f32,
}

impl Default for BlockMotionConfig {
    fn default() -> Self {
        Self {
            friction: 0.9,
            reference_rate: 60.0,
            rest_speed: 0.01,
            floor_y: 0.0,
        }
    }
}

/// Frame-rate independent friction: `friction` per `1 / reference_rate` seconds
///
/// ```
/// use bevy::prelude::Vec3;
/// use chaser::game_logic::movement::{BlockMotionConfig, decay_velocity};
///
/// let slowed = decay_velocity(Vec3::X * 2.0, &BlockMotionConfig::default(), 1.0 / 60.0);
/// assert!((slowed.x - 1.8).abs() < 1e-4);
/// ```
pub fn decay_velocity(velocity: Vec3, config: &BlockMotionConfig, dt: f32) -> Vec3 {
    let decayed = velocity * config.friction.powf(dt * config.reference_rate);
    if decayed.length() < config.rest_speed {
        Vec3::ZERO
    } else {
        decayed
    }
}

/// Advance a block centre by its velocity, never sinking below the floor
pub fn integrate_block(
    center: Vec3,
    half_height: f32,
    velocity: Vec3,
    config: &BlockMotionConfig,
    dt: f32,
) -> Vec3 {
    let mut next = center + velocity * dt;
    next.y = next.y.max(config.floor_y + half_height);
    next
}

/// Horizontal velocity pushing a block away from the pusher
pub fn push_velocity(pusher: Vec3, block: Vec3, speed: f32) -> Vec3 {
    Vec3::new(block.x - pusher.x, 0.0, block.z - pusher.z).normalize_or_zero() * speed
}

/// Closest candidate within `max_distance` on the XZ plane
pub fn nearest_within<T>(
    origin: Vec3,
    candidates: impl IntoIterator<Item = (T, Vec3)>,
    max_distance: f32,
) -> Option<(T, f32)> {
    candidates
        .into_iter()
        .map(|(item, position)| (item, calculate_2d_distance(origin, position)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn calculate_2d_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}
