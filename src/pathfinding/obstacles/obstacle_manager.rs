//! Centralized obstacle management for collision and pathfinding

use crate::pathfinding::obstacles::*;
use bevy::prelude::*;

/// Holds the room's obstacles and bounds; the level's `Environment`
///
/// Static obstacles occupy the front of the list and dynamic snapshots the
/// back, so indices into `collidables()` stay stable within a frame.
#[derive(Default, Resource)]
pub struct ObstacleManager {
    obstacles: Vec<BoxedObstacle>,
    static_count: usize,
    room_bounds: Option<Aabb>,
}

impl ObstacleManager {
    pub fn new(room_bounds: Option<Aabb>) -> Self {
        Self {
            room_bounds,
            ..Self::default()
        }
    }

    /// Add a static obstacle that stays until cleared
    pub fn add_static_obstacle(&mut self, obstacle: impl Obstacle + 'static) {
        self.obstacles.insert(self.static_count, Box::new(obstacle));
        self.static_count += 1;
    }

    pub fn add_static_obstacles<O: Obstacle + 'static>(&mut self, obstacles: impl IntoIterator<Item = O>) {
        for obstacle in obstacles {
            self.add_static_obstacle(obstacle);
        }
    }

    /// Replace all dynamic obstacles with this frame's snapshots
    pub fn replace_dynamic_obstacles<O: Obstacle + 'static>(
        &mut self,
        obstacles: impl IntoIterator<Item = O>,
    ) {
        self.obstacles.truncate(self.static_count);
        for obstacle in obstacles {
            self.obstacles.push(Box::new(obstacle));
        }
    }

    /// Get count of obstacles by type
    pub fn obstacle_counts(&self) -> (usize, usize) {
        (self.static_count, self.obstacles.len() - self.static_count)
    }
}

impl Environment for ObstacleManager {
    fn collidables(&self) -> &[BoxedObstacle] {
        &self.obstacles
    }

    fn room_bounds(&self) -> Option<Aabb> {
        self.room_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x: f32, z: f32) -> BlockObstacle {
        BlockObstacle::resting("block", Vec3::new(x, 0.0, z), Vec3::ONE, ObstacleKind::StaticBlock)
    }

    #[test]
    fn test_static_and_dynamic_counts() {
        let mut manager = ObstacleManager::new(None);
        manager.add_static_obstacles(vec![block(0.0, 0.0), block(3.0, 3.0)]);
        manager.replace_dynamic_obstacles(vec![block(5.0, 5.0)]);

        assert_eq!(manager.obstacle_counts(), (2, 1));
        assert_eq!(manager.collidables().len(), 3);

        manager.replace_dynamic_obstacles(Vec::<BlockObstacle>::new());
        assert_eq!(manager.obstacle_counts(), (2, 0));
        assert_eq!(manager.collidables().len(), 2);
    }

    #[test]
    fn test_static_obstacles_stay_ahead_of_snapshots() {
        let bounds = Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 3.0, 5.0));
        let mut manager = ObstacleManager::new(Some(bounds));
        manager.replace_dynamic_obstacles(vec![block(4.0, 4.0)]);
        manager.add_static_obstacle(block(1.0, 1.0).non_collidable());

        assert_eq!(manager.room_bounds(), Some(bounds));
        assert_eq!(manager.obstacle_counts(), (1, 1));
        let collidables = manager.collidables();
        assert!(!collidables[0].is_collidable());
        assert_eq!(collidables[1].world_bounds().center().x, 4.0);
    }
}
