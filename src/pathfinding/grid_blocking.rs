//! Marking obstacle footprints on the occupancy grid

use crate::pathfinding::obstacles::{Aabb, Environment};
use crate::pathfinding::{GridNode, OccupancyGrid};

/// Block every cell touched by the box's XZ footprint
///
/// Cell indices come from floor-division of the box corners, so a box edge
/// lying exactly on a cell boundary still marks the cell beyond it.
pub fn block_footprint(grid: &mut OccupancyGrid, bounds: &Aabb) {
    if !bounds.is_finite() {
        return;
    }

    let start = grid.world_to_grid(bounds.min);
    let end = grid.world_to_grid(bounds.max);

    let min_x = start.x.max(0);
    let min_z = start.z.max(0);
    let max_x = end.x.min(grid.width() as i32 - 1);
    let max_z = end.z.min(grid.depth() as i32 - 1);

    for z in min_z..=max_z {
        for x in min_x..=max_x {
            grid.set_blocked(GridNode::new(x, z), true);
        }
    }
}

/// Block the footprints of every collidable obstacle in the environment
pub fn block_environment(grid: &mut OccupancyGrid, environment: &dyn Environment) -> usize {
    let mut marked = 0;
    for obstacle in environment.collidables() {
        if !obstacle.is_collidable() {
            continue;
        }
        block_footprint(grid, &obstacle.world_bounds());
        marked += 1;
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    fn grid_10x10() -> OccupancyGrid {
        OccupancyGrid::new(Aabb::new(Vec3::ZERO, Vec3::new(10.0, 3.0, 10.0)), 1.0).unwrap()
    }

    #[test]
    fn test_footprint_blocks_covered_cells() {
        let mut grid = grid_10x10();
        block_footprint(&mut grid, &Aabb::new(Vec3::new(2.2, 0.0, 3.1), Vec3::new(3.8, 1.0, 4.9)));

        for z in 3..=4 {
            for x in 2..=3 {
                assert!(grid.is_blocked(GridNode::new(x, z)));
            }
        }
        assert!(!grid.is_blocked(GridNode::new(1, 3)));
        assert!(!grid.is_blocked(GridNode::new(4, 4)));
        assert_eq!(grid.blocked_count(), 4);
    }

    #[test]
    fn test_out_of_bounds_footprint_is_clipped() {
        let mut grid = grid_10x10();

        block_footprint(&mut grid, &Aabb::new(Vec3::new(-20.0, 0.0, -20.0), Vec3::new(-15.0, 1.0, -15.0)));
        assert_eq!(grid.blocked_count(), 0);

        block_footprint(&mut grid, &Aabb::new(Vec3::new(8.5, 0.0, -3.0), Vec3::new(14.0, 1.0, 0.5)));
        assert!(grid.is_blocked(GridNode::new(9, 0)));
        assert!(grid.is_blocked(GridNode::new(8, 0)));
        assert_eq!(grid.blocked_count(), 2);
    }

    #[test]
    fn test_non_finite_bounds_are_ignored() {
        let mut grid = grid_10x10();
        block_footprint(&mut grid, &Aabb {
            min: Vec3::new(f32::NAN, 0.0, 0.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        });
        assert_eq!(grid.blocked_count(), 0);
    }
}
