use crate::game_logic::errors::{ChaseError, ChaseResult};
use bevy::prelude::*;
use pathfinding::prelude::bfs;

pub mod grid_blocking;
pub mod obstacles;

pub use obstacles::*;

/// Neighbour expansion order: right, left, down, up, then the diagonals.
/// Ties between equally short paths resolve in this order.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Raw waypoint offsets shorter than this are treated as "already there"
pub const MIN_WAYPOINT_OFFSET: f32 = 0.1;

/// Largest grid the pathfinder will allocate (1024 x 1024 cells)
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Configuration for the occupancy grid
#[derive(Debug, Clone, Copy)]
pub struct PathfindingConfig {
    /// World units per grid cell
    pub cell_size: f32,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self { cell_size: 1.0 }
    }
}

/// A single cell of the occupancy grid; may lie outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridNode {
    pub x: i32,
    pub z: i32,
}

impl GridNode {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// All 8 neighbours in expansion order, unfiltered
    pub fn neighbors(&self) -> impl Iterator<Item = GridNode> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |(dx, dz)| GridNode::new(self.x + dx, self.z + dz))
    }

    /// Number of 8-connected steps between two cells
    pub fn chebyshev_distance(&self, other: &GridNode) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.z - other.z).unsigned_abs())
    }
}

/// Planar walkable/blocked grid over the room's XZ bounds
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    blocked: Vec<bool>,
    width: u32,
    depth: u32,
    cell_size: f32,
    origin: Vec2,
}

impl OccupancyGrid {
    /// Allocate an all-walkable grid covering the bounds' XZ footprint
    pub fn new(bounds: Aabb, cell_size: f32) -> ChaseResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ChaseError::InvalidGrid {
                reason: format!("cell size must be positive, got {cell_size}"),
            });
        }
        if !bounds.is_finite() {
            return Err(ChaseError::InvalidGrid {
                reason: "room bounds are not finite".to_string(),
            });
        }

        let extent = bounds.size();
        let width = (extent.x / cell_size).ceil();
        let depth = (extent.z / cell_size).ceil();
        if width < 1.0 || depth < 1.0 {
            return Err(ChaseError::InvalidGrid {
                reason: format!("room bounds {:.2} x {:.2} cover no cells", extent.x, extent.z),
            });
        }

        let cells = (width as usize).checked_mul(depth as usize);
        let cells = match cells {
            Some(cells) if cells <= MAX_GRID_CELLS => cells,
            _ => {
                return Err(ChaseError::InvalidGrid {
                    reason: format!(
                        "{width} x {depth} cells exceeds the limit of {MAX_GRID_CELLS}"
                    ),
                });
            }
        };

        let (width, depth) = (width as u32, depth as u32);
        Ok(Self {
            blocked: vec![false; cells],
            width,
            depth,
            cell_size,
            origin: Vec2::new(bounds.min.x, bounds.min.z),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn world_to_grid(&self, world_pos: Vec3) -> GridNode {
        GridNode::new(
            ((world_pos.x - self.origin.x) / self.cell_size).floor() as i32,
            ((world_pos.z - self.origin.y) / self.cell_size).floor() as i32,
        )
    }

    /// Centre of the cell on the ground plane (y = 0)
    pub fn grid_to_world(&self, node: GridNode) -> Vec3 {
        Vec3::new(
            self.origin.x + (node.x as f32 + 0.5) * self.cell_size,
            0.0,
            self.origin.y + (node.z as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn in_bounds(&self, node: GridNode) -> bool {
        node.x >= 0 && node.z >= 0 && (node.x as u32) < self.width && (node.z as u32) < self.depth
    }

    fn index(&self, node: GridNode) -> Option<usize> {
        self.in_bounds(node)
            .then(|| node.z as usize * self.width as usize + node.x as usize)
    }

    /// Out-of-range cells count as blocked
    pub fn is_blocked(&self, node: GridNode) -> bool {
        self.index(node)
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(true)
    }

    pub fn set_blocked(&mut self, node: GridNode, blocked: bool) {
        if let Some(index) = self.index(node) {
            self.blocked[index] = blocked;
        }
    }

    /// True iff the cell is in range and walkable
    pub fn is_valid_grid_pos(&self, node: GridNode) -> bool {
        !self.is_blocked(node)
    }

    pub fn reset(&mut self) {
        self.blocked.fill(false);
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|&&blocked| blocked).count()
    }

    /// Breadth-first search over 8-connected walkable cells
    pub fn find_cell_path(&self, start: GridNode, target: GridNode) -> Option<Vec<GridNode>> {
        if !self.is_valid_grid_pos(start) || !self.is_valid_grid_pos(target) {
            return None;
        }

        bfs(
            &start,
            |node| {
                node.neighbors()
                    .filter(|neighbor| self.is_valid_grid_pos(*neighbor))
                    .collect::<Vec<_>>()
            },
            |node| *node == target,
        )
    }

    /// Shortest path as cell-centre world positions, start to target
    pub fn find_path(&self, start: Vec3, target: Vec3) -> Option<Vec<Vec3>> {
        let cells = self.find_cell_path(self.world_to_grid(start), self.world_to_grid(target))?;
        Some(cells.into_iter().map(|node| self.grid_to_world(node)).collect())
    }

    /// Normalized XZ direction toward the first waypoint beyond the start cell
    pub fn next_move_direction(&self, current: Vec3, target: Vec3) -> Option<Vec3> {
        let path = self.find_path(current, target)?;
        if path.len() < 2 {
            return None;
        }

        let offset = flatten(path[1] - current);
        if offset.length() >= MIN_WAYPOINT_OFFSET {
            return Some(offset.normalize());
        }

        let offset = flatten(path.get(2)? - current);
        (offset.length() >= MIN_WAYPOINT_OFFSET).then(|| offset.normalize())
    }
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Grid owner that refreshes occupancy from an environment
#[derive(Debug, Clone, Default)]
pub struct Pathfinder {
    pub config: PathfindingConfig,
    grid: Option<OccupancyGrid>,
}

impl Pathfinder {
    pub fn new(config: PathfindingConfig) -> Self {
        Self { config, grid: None }
    }

    pub fn grid(&self) -> Option<&OccupancyGrid> {
        self.grid.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Allocate the grid for the room and run the first obstacle scan
    pub fn init_grid(&mut self, bounds: Aabb, environment: &dyn Environment) -> ChaseResult<()> {
        let grid = OccupancyGrid::new(bounds, self.config.cell_size)?;
        info!(
            "Pathfinder grid initialized: {}x{} cells of {:.2}",
            grid.width(),
            grid.depth(),
            grid.cell_size()
        );
        self.grid = Some(grid);
        self.update_grid(environment);
        Ok(())
    }

    /// Reset every cell and re-mark the current obstacle footprints
    pub fn update_grid(&mut self, environment: &dyn Environment) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };

        grid.reset();
        let marked = grid_blocking::block_environment(grid, environment);
        debug!(
            "Pathfinder grid refreshed: {marked} obstacles, {blocked} blocked cells",
            blocked = grid.blocked_count()
        );
    }

    pub fn find_path(&self, start: Vec3, target: Vec3) -> Option<Vec<Vec3>> {
        self.grid.as_ref()?.find_path(start, target)
    }

    pub fn next_move_direction(&self, current: Vec3, target: Vec3) -> Option<Vec3> {
        self.grid.as_ref()?.next_move_direction(current, target)
    }
}
