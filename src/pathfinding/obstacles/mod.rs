//! Trait-based obstacle system shared by pathfinding and collision

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub mod collision_shapes;
pub mod entity_obstacles;
pub mod environment_obstacles;
pub mod obstacle_manager;

pub use collision_shapes::*;
pub use entity_obstacles::*;
pub use environment_obstacles::*;
pub use obstacle_manager::*;

/// What role an obstacle plays in the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Prop,
    StaticBlock,
    MovingPlatform,
    Wall,
    Portal,
}

/// Metadata bag read alongside an obstacle's bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleMetadata {
    pub collidable: bool,
    pub kind: ObstacleKind,
}

impl Default for ObstacleMetadata {
    fn default() -> Self {
        Self {
            collidable: true,
            kind: ObstacleKind::Prop,
        }
    }
}

impl ObstacleMetadata {
    pub fn new(kind: ObstacleKind) -> Self {
        Self {
            collidable: true,
            kind,
        }
    }

    pub fn non_collidable(kind: ObstacleKind) -> Self {
        Self {
            collidable: false,
            kind,
        }
    }

    pub fn is_static_block(&self) -> bool {
        self.kind == ObstacleKind::StaticBlock
    }

    pub fn is_moving_platform(&self) -> bool {
        self.kind == ObstacleKind::MovingPlatform
    }

    pub fn is_wall(&self) -> bool {
        self.kind == ObstacleKind::Wall
    }

    pub fn is_portal(&self) -> bool {
        self.kind == ObstacleKind::Portal
    }
}

/// Core trait for objects that obstruct movement and pathfinding
///
/// Implementors recompute their bounds from their current state on every
/// call; callers never hold on to the result across frames.
pub trait Obstacle: Send + Sync {
    /// Current world-space bounding box
    fn world_bounds(&self) -> Aabb;

    fn metadata(&self) -> ObstacleMetadata {
        ObstacleMetadata::default()
    }

    /// Velocity in world units per second, non-zero only for moving platforms
    fn platform_velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn is_collidable(&self) -> bool {
        self.metadata().collidable
    }
}

/// Type-erased obstacle for collections
pub type BoxedObstacle = Box<dyn Obstacle>;

/// Source of obstacles and room bounds for a level
pub trait Environment {
    fn collidables(&self) -> &[BoxedObstacle];

    fn room_bounds(&self) -> Option<Aabb>;
}
