//! Room obstacles described by layout data

use crate::map::ObstacleDefinition;
use crate::pathfinding::obstacles::{Aabb, Obstacle, ObstacleKind, ObstacleMetadata};
use bevy::prelude::*;

/// Box-shaped room obstacle: furniture, toy blocks, walls, platforms, portals
#[derive(Debug, Clone)]
pub struct BlockObstacle {
    pub name: String,
    pub center: Vec3,
    pub half_extents: Vec3,
    pub metadata: ObstacleMetadata,
    pub velocity: Vec3,
}

impl BlockObstacle {
    pub fn new(name: impl Into<String>, center: Vec3, size: Vec3, kind: ObstacleKind) -> Self {
        Self {
            name: name.into(),
            center,
            half_extents: size.abs() * 0.5,
            metadata: ObstacleMetadata::new(kind),
            velocity: Vec3::ZERO,
        }
    }

    /// Box whose bottom face is centred on `base`
    pub fn resting(name: impl Into<String>, base: Vec3, size: Vec3, kind: ObstacleKind) -> Self {
        Self::new(name, base + Vec3::Y * size.y.abs() * 0.5, size, kind)
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn non_collidable(mut self) -> Self {
        self.metadata.collidable = false;
        self
    }

    /// Move the block; its bounds follow on the next query
    pub fn translate(&mut self, offset: Vec3) {
        self.center += offset;
    }
}

impl From<&ObstacleDefinition> for BlockObstacle {
    fn from(definition: &ObstacleDefinition) -> Self {
        let mut obstacle = Self::new(
            definition.name.clone(),
            definition.center,
            definition.size,
            definition.kind,
        );
        obstacle.metadata.collidable = definition.collidable;
        if let Some(track) = &definition.platform {
            obstacle.velocity = track.initial_velocity();
        }
        obstacle
    }
}

impl Obstacle for BlockObstacle {
    fn world_bounds(&self) -> Aabb {
        Aabb::from_center(self.center, self.half_extents)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::PlatformTrack;

    #[test]
    fn test_resting_block_sits_on_floor() {
        let block = BlockObstacle::resting(
            "toy",
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::splat(1.0),
            ObstacleKind::StaticBlock,
        );
        let bounds = block.world_bounds();
        assert_eq!(bounds.min.y, 0.0);
        assert_eq!(bounds.max.y, 1.0);
        assert!(block.metadata().is_static_block());
    }

    #[test]
    fn test_bounds_follow_translation() {
        let mut block = BlockObstacle::new("crate", Vec3::ZERO, Vec3::splat(2.0), ObstacleKind::Prop);
        block.translate(Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(block.world_bounds().min.x, 2.0);
        assert_eq!(block.world_bounds().max.x, 4.0);
    }

    #[test]
    fn test_only_platforms_report_velocity() {
        let prop = BlockObstacle::new("chair", Vec3::ZERO, Vec3::ONE, ObstacleKind::Prop)
            .with_velocity(Vec3::X);
        assert_eq!(prop.platform_velocity(), Vec3::ZERO);

        let platform = BlockObstacle::new("shelf", Vec3::ZERO, Vec3::ONE, ObstacleKind::MovingPlatform)
            .with_velocity(Vec3::X);
        assert_eq!(platform.platform_velocity(), Vec3::X);
    }

    #[test]
    fn test_definition_conversion() {
        let definition = ObstacleDefinition {
            name: "train".to_string(),
            kind: ObstacleKind::MovingPlatform,
            center: Vec3::new(0.0, 0.25, 0.0),
            size: Vec3::new(2.0, 0.5, 1.0),
            collidable: true,
            platform: Some(PlatformTrack {
                axis: Vec3::X,
                travel: 4.0,
                speed: 1.5,
            }),
        };

        let obstacle = BlockObstacle::from(&definition);
        assert_eq!(obstacle.half_extents, Vec3::new(1.0, 0.25, 0.5));
        assert_eq!(obstacle.platform_velocity(), Vec3::new(1.5, 0.0, 0.0));
        assert!(obstacle.is_collidable());
    }
}
