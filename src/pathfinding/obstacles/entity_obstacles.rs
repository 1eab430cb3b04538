//! Obstacles backed by ECS entities (pushable blocks, platforms, furniture)

use crate::pathfinding::obstacles::{Aabb, Obstacle, ObstacleKind, ObstacleMetadata};
use bevy::prelude::*;

/// Per-frame snapshot of an obstacle entity's transform and metadata
#[derive(Debug, Clone)]
pub struct EntityObstacle {
    pub entity_id: Entity,
    pub position: Vec3,
    pub half_extents: Vec3,
    pub metadata: ObstacleMetadata,
    pub velocity: Vec3,
}

impl EntityObstacle {
    pub fn new(entity_id: Entity, transform: &Transform, source: &ObstacleSource) -> Self {
        Self {
            entity_id,
            position: transform.translation,
            half_extents: source.half_extents * transform.scale.abs(),
            metadata: source.metadata(),
            velocity: Vec3::ZERO,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

impl Obstacle for EntityObstacle {
    fn world_bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    fn metadata(&self) -> ObstacleMetadata {
        self.metadata
    }

    fn platform_velocity(&self) -> Vec3 {
        if self.metadata.is_moving_platform() {
            self.velocity
        } else {
            Vec3::ZERO
        }
    }
}

/// Component to mark entities as collision and pathfinding obstacles
#[derive(Component, Debug, Clone)]
pub struct ObstacleSource {
    pub half_extents: Vec3,
    pub kind: ObstacleKind,
    pub collidable: bool,
}

impl ObstacleSource {
    pub fn new(size: Vec3, kind: ObstacleKind) -> Self {
        Self {
            half_extents: size.abs() * 0.5,
            kind,
            collidable: true,
        }
    }

    pub fn static_block(size: Vec3) -> Self {
        Self::new(size, ObstacleKind::StaticBlock)
    }

    pub fn moving_platform(size: Vec3) -> Self {
        Self::new(size, ObstacleKind::MovingPlatform)
    }

    pub fn metadata(&self) -> ObstacleMetadata {
        ObstacleMetadata {
            collidable: self.collidable,
            kind: self.kind,
        }
    }

    /// Stop this entity from blocking movement and pathfinding
    pub fn disable_collision(&mut self) {
        self.collidable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_obstacle_bounds_use_transform_scale() {
        let entity = Entity::from_raw(7);
        let transform = Transform::from_xyz(1.0, 0.5, 1.0).with_scale(Vec3::new(2.0, 1.0, 1.0));
        let source = ObstacleSource::static_block(Vec3::ONE);

        let obstacle = EntityObstacle::new(entity, &transform, &source);
        let bounds = obstacle.world_bounds();

        assert_eq!(obstacle.entity_id, entity);
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, 0.5));
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 1.5));
    }

    #[test]
    fn test_platform_velocity_only_for_platforms() {
        let entity = Entity::from_raw(8);
        let transform = Transform::default();

        let block = EntityObstacle::new(entity, &transform, &ObstacleSource::static_block(Vec3::ONE))
            .with_velocity(Vec3::X);
        assert_eq!(block.platform_velocity(), Vec3::ZERO);

        let platform =
            EntityObstacle::new(entity, &transform, &ObstacleSource::moving_platform(Vec3::ONE))
                .with_velocity(Vec3::X);
        assert_eq!(platform.platform_velocity(), Vec3::X);
    }

    #[test]
    fn test_obstacle_source_collision_control() {
        let mut source = ObstacleSource::new(Vec3::new(1.0, 2.0, 0.2), ObstacleKind::Portal);
        assert!(source.metadata().collidable);
        assert!(source.metadata().is_portal());

        source.disable_collision();
        let obstacle = EntityObstacle::new(Entity::from_raw(9), &Transform::default(), &source);
        assert!(!obstacle.is_collidable());
    }
}
