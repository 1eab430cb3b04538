use crate::pathfinding::obstacles::{Aabb, BoxedObstacle};
use bevy::prelude::*;

/// Configuration for gravity, ground snapping and wall sliding
#[derive(Debug, Clone, Copy)]
pub struct CollisionConfig {
    /// Downward acceleration in units per second squared
    pub gravity: f32,
    /// How far a surface may sit above the actor's feet and still be stood on
    pub ground_band_below: f32,
    /// How far the actor may hover above a surface and still snap to it
    pub ground_band_above: f32,
    pub ground_epsilon: f32,
    pub floor_y: f32,
    pub floor_snap_distance: f32,
    pub bounds_epsilon: f32,
    /// Re-check the combined move when both axes slide freely on their own
    pub strict_corners: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            ground_band_below: 0.5,
            ground_band_above: 0.1,
            ground_epsilon: 0.01,
            floor_y: 0.0,
            floor_snap_distance: 0.1,
            bounds_epsilon: 0.01,
            strict_corners: false,
        }
    }
}

/// Upright box-shaped actor whose position is the centre of its feet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorBody {
    pub position: Vec3,
    pub vertical_velocity: f32,
    pub grounded: bool,
    pub half_width: f32,
    pub height: f32,
}

impl ActorBody {
    pub fn new(position: Vec3, half_width: f32, height: f32) -> Self {
        Self {
            position,
            vertical_velocity: 0.0,
            grounded: false,
            half_width,
            height,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds_at(self.position)
    }

    pub fn bounds_at(&self, position: Vec3) -> Aabb {
        Aabb::from_feet(position, self.half_width, self.height)
    }
}

/// The obstacle an actor ended up standing on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    /// Index into the obstacle slice the physics step was given
    pub index: usize,
    pub top: f32,
    /// Horizontal carry applied by a moving platform this tick
    pub carried: Vec3,
}

/// Horizontal displacement actually applied by a collision-checked move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementOutcome {
    pub applied: Vec3,
    pub blocked_x: bool,
    pub blocked_z: bool,
}

impl MovementOutcome {
    pub fn was_blocked(&self) -> bool {
        self.blocked_x || self.blocked_z
    }
}

/// Integrate gravity and resolve the actor against the surfaces below it
///
/// The highest collidable top whose height relative to the actor's feet lies
/// within the ground band wins. Without one the actor snaps to the world
/// floor when close enough and is otherwise airborne.
pub fn update_physics(
    body: &mut ActorBody,
    obstacles: &[BoxedObstacle],
    config: &CollisionConfig,
    dt: f32,
) -> Option<GroundContact> {
    body.vertical_velocity -= config.gravity * dt;
    body.position.y += body.vertical_velocity * dt;

    let footprint = body.bounds();
    let bottom = body.position.y;

    let ground = obstacles
        .iter()
        .enumerate()
        .filter(|(_, obstacle)| obstacle.is_collidable())
        .filter_map(|(index, obstacle)| {
            let bounds = obstacle.world_bounds();
            if !bounds.overlaps_xz(&footprint) {
                return None;
            }
            let gap = bottom - bounds.max.y;
            (gap >= -config.ground_band_below && gap <= config.ground_band_above)
                .then_some((index, bounds.max.y))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((index, top)) = ground {
        body.position.y = top + config.ground_epsilon;
        body.vertical_velocity = 0.0;
        body.grounded = true;

        let velocity = obstacles[index].platform_velocity();
        let carried = Vec3::new(velocity.x, 0.0, velocity.z) * dt;
        body.position += carried;
        return Some(GroundContact {
            index,
            top,
            carried,
        });
    }

    if body.position.y <= config.floor_y + config.floor_snap_distance {
        snap_to_floor(body, config);
    } else {
        body.grounded = false;
    }
    None
}

/// Place the actor on the world floor with no vertical motion
pub fn snap_to_floor(body: &mut ActorBody, config: &CollisionConfig) {
    body.position.y = config.floor_y;
    body.vertical_velocity = 0.0;
    body.grounded = true;
}

fn is_blocked(
    body: &ActorBody,
    offset: Vec3,
    obstacles: &[BoxedObstacle],
    standing_on: Option<usize>,
) -> bool {
    let candidate = body.bounds_at(body.position + offset);
    obstacles.iter().enumerate().any(|(index, obstacle)| {
        Some(index) != standing_on
            && obstacle.is_collidable()
            && obstacle.world_bounds().intersects(&candidate)
    })
}

/// Move horizontally, sliding along whichever axes stay free
///
/// The obstacle at `standing_on` is ignored so a platform never blocks the
/// actor it carries.
pub fn apply_movement_with_collision(
    body: &mut ActorBody,
    displacement: Vec3,
    obstacles: &[BoxedObstacle],
    standing_on: Option<usize>,
    config: &CollisionConfig,
) -> MovementOutcome {
    let desired = Vec3::new(displacement.x, 0.0, displacement.z);
    if !is_blocked(body, desired, obstacles, standing_on) {
        body.position += desired;
        return MovementOutcome {
            applied: desired,
            blocked_x: false,
            blocked_z: false,
        };
    }

    let step_x = Vec3::new(desired.x, 0.0, 0.0);
    let step_z = Vec3::new(0.0, 0.0, desired.z);
    let mut x_free = desired.x != 0.0 && !is_blocked(body, step_x, obstacles, standing_on);
    let mut z_free = desired.z != 0.0 && !is_blocked(body, step_z, obstacles, standing_on);

    // The combined move is already known to be blocked here.
    if config.strict_corners && x_free && z_free {
        if desired.x.abs() >= desired.z.abs() {
            z_free = false;
        } else {
            x_free = false;
        }
    }

    let applied = Vec3::new(
        if x_free { desired.x } else { 0.0 },
        0.0,
        if z_free { desired.z } else { 0.0 },
    );
    body.position += applied;

    MovementOutcome {
        applied,
        blocked_x: desired.x != 0.0 && !x_free,
        blocked_z: desired.z != 0.0 && !z_free,
    }
}

/// Keep the actor's footprint inside the room on X and Z
pub fn clamp_to_room(body: &mut ActorBody, bounds: &Aabb, config: &CollisionConfig) {
    if !bounds.is_finite() {
        return;
    }
    let margin = body.half_width + config.bounds_epsilon;
    body.position.x = clamp_axis(body.position.x, bounds.min.x + margin, bounds.max.x - margin);
    body.position.z = clamp_axis(body.position.z, bounds.min.z + margin, bounds.max.z - margin);
}

fn clamp_axis(value: f32, low: f32, high: f32) -> f32 {
    if low > high {
        (low + high) * 0.5
    } else {
        value.clamp(low, high)
    }
}
