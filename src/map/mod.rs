use crate::game_logic::errors::{ChaseError, ChaseResult};
use crate::pathfinding::obstacles::{Aabb, BlockObstacle, ObstacleKind, ObstacleManager};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError, ValidationErrors};

/// Room description: bounds, spawn points and every obstacle in the room
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Resource)]
#[validate(schema(function = "validate_room"))]
pub struct RoomLayout {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub bounds: Aabb,
    pub player_spawn: Vec3,
    pub chaser_spawn: Vec3,
    #[validate(nested)]
    pub obstacles: Vec<ObstacleDefinition>,
}

/// A box obstacle placed in the room
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObstacleDefinition {
    #[validate(length(min = 1))]
    pub name: String,
    pub kind: ObstacleKind,
    pub center: Vec3,
    #[validate(custom(function = "validate_size"))]
    pub size: Vec3,
    #[serde(default = "default_collidable")]
    pub collidable: bool,
    #[serde(default)]
    #[validate(nested)]
    pub platform: Option<PlatformTrack>,
}

/// Back-and-forth motion of a moving platform along one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct PlatformTrack {
    pub axis: Vec3,
    /// Distance covered before turning around
    #[validate(range(min = 0.0, max = 100.0))]
    pub travel: f32,
    /// Units per second
    #[validate(range(min = 0.0, max = 50.0))]
    pub speed: f32,
}

fn default_collidable() -> bool {
    true
}

fn validate_size(size: &Vec3) -> Result<(), ValidationError> {
    if size.is_finite() && size.min_element() > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("non_positive_size"))
    }
}

fn validate_room(layout: &RoomLayout) -> Result<(), ValidationError> {
    let extent = layout.bounds.size();
    if !layout.bounds.is_finite() || extent.x <= 0.0 || extent.z <= 0.0 {
        return Err(ValidationError::new("degenerate_bounds"));
    }
    for spawn in [layout.player_spawn, layout.chaser_spawn] {
        if !layout.bounds.contains_point_xz(spawn) {
            return Err(ValidationError::new("spawn_outside_bounds"));
        }
    }
    Ok(())
}

fn describe_errors(errors: &ValidationErrors) -> String {
    let mut details: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let codes: Vec<String> = errors.iter().map(|e| e.code.to_string()).collect();
            format!("{field}: {}", codes.join(", "))
        })
        .collect();
    if details.is_empty() {
        details.push(errors.to_string());
    }
    details.join("; ")
}

impl PlatformTrack {
    pub fn direction(&self) -> Vec3 {
        self.axis.normalize_or_zero()
    }

    pub fn initial_velocity(&self) -> Vec3 {
        self.direction() * self.speed
    }

    fn period(&self) -> Option<f32> {
        (self.travel > 0.0 && self.speed > 0.0).then(|| 2.0 * self.travel / self.speed)
    }

    /// Distance from the start of the track after `elapsed` seconds
    pub fn offset_at(&self, elapsed: f32) -> f32 {
        let Some(period) = self.period() else {
            return 0.0;
        };
        let covered = elapsed.rem_euclid(period) * self.speed;
        if covered <= self.travel {
            covered
        } else {
            2.0 * self.travel - covered
        }
    }

    pub fn velocity_at(&self, elapsed: f32) -> Vec3 {
        let Some(period) = self.period() else {
            return Vec3::ZERO;
        };
        if elapsed.rem_euclid(period) * self.speed <= self.travel {
            self.initial_velocity()
        } else {
            -self.initial_velocity()
        }
    }
}

impl ObstacleDefinition {
    pub fn new(name: impl Into<String>, kind: ObstacleKind, center: Vec3, size: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            center,
            size,
            collidable: true,
            platform: None,
        }
    }

    /// Box resting on the floor with its footprint centred on `(x, z)`
    pub fn on_floor(name: impl Into<String>, kind: ObstacleKind, x: f32, z: f32, size: Vec3) -> Self {
        Self::new(name, kind, Vec3::new(x, size.y * 0.5, z), size)
    }

    pub fn with_track(mut self, track: PlatformTrack) -> Self {
        self.platform = Some(track);
        self
    }

    pub fn non_collidable(mut self) -> Self {
        self.collidable = false;
        self
    }

    /// Obstacle snapshot with moving platforms advanced along their track
    pub fn obstacle_at(&self, elapsed: f32) -> BlockObstacle {
        let mut obstacle = BlockObstacle::from(self);
        if let Some(track) = &self.platform {
            obstacle.translate(track.direction() * track.offset_at(elapsed));
            obstacle.velocity = track.velocity_at(elapsed);
        }
        obstacle
    }
}

impl RoomLayout {
    /// Create a new room layout with validation
    pub fn new(
        name: String,
        bounds: Aabb,
        player_spawn: Vec3,
        chaser_spawn: Vec3,
        obstacles: Vec<ObstacleDefinition>,
    ) -> ChaseResult<Self> {
        let layout = Self {
            name,
            bounds,
            player_spawn,
            chaser_spawn,
            obstacles,
        };
        layout.check()?;
        Ok(layout)
    }

    /// Run validation and flatten the report into a `ChaseError`
    pub fn check(&self) -> ChaseResult<()> {
        self.validate().map_err(|errors| ChaseError::InvalidLayout {
            reason: describe_errors(&errors),
        })
    }

    /// The bedroom level: toy blocks in one corner, furniture, a wall, the
    /// exit portal and a sliding shelf
    pub fn bedroom() -> Self {
        use ObstacleKind::*;

        let mut obstacles = vec![
            ObstacleDefinition::on_floor("cabinet", Prop, -24.0, -26.0, Vec3::new(6.0, 7.0, 3.0)),
            ObstacleDefinition::on_floor("chest", Prop, -26.0, 18.0, Vec3::new(4.0, 2.5, 2.5)),
            ObstacleDefinition::on_floor("bed", Prop, 18.0, 20.0, Vec3::new(9.0, 2.0, 12.0)),
            ObstacleDefinition::on_floor("table-top", Prop, 0.0, 0.0, Vec3::new(5.0, 3.2, 3.0)),
            ObstacleDefinition::on_floor("divider-wall", Wall, -8.0, -6.0, Vec3::new(1.0, 8.0, 14.0)),
            ObstacleDefinition::on_floor("portal", Portal, 0.0, 30.5, Vec3::new(3.0, 3.8, 0.2)),
            ObstacleDefinition::new(
                "sliding-shelf",
                MovingPlatform,
                Vec3::new(10.0, 0.25, -10.0),
                Vec3::new(4.0, 0.5, 4.0),
            )
            .with_track(PlatformTrack {
                axis: Vec3::X,
                travel: 8.0,
                speed: 1.5,
            }),
        ];

        // Ten toy blocks scattered along z near the bedroom's east corner
        for i in 0..10 {
            let size = (0.3 + 0.015 * i as f32) * 3.5;
            let x = 25.5 + (i % 3) as f32 * 1.5;
            let z = -29.0 + i as f32 * 1.1;
            obstacles.push(ObstacleDefinition::on_floor(
                format!("toy-block-{i}"),
                StaticBlock,
                x,
                z,
                Vec3::splat(size),
            ));
        }

        Self {
            name: "bedroom".to_string(),
            bounds: Aabb::new(Vec3::new(-32.0, 0.0, -32.0), Vec3::new(32.0, 12.0, 32.0)),
            player_spawn: Vec3::new(0.0, 0.0, 20.0),
            chaser_spawn: Vec3::new(-20.0, 0.0, -15.0),
            obstacles,
        }
    }

    /// Get the layouts directory path
    pub fn get_layouts_dir() -> ChaseResult<PathBuf> {
        Ok(std::env::current_dir()?.join("layouts"))
    }

    fn resolve(filename: &Path) -> ChaseResult<PathBuf> {
        if filename.is_absolute() {
            Ok(filename.to_path_buf())
        } else {
            Ok(Self::get_layouts_dir()?.join(filename))
        }
    }

    fn is_toml(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "toml")
    }

    /// Load a layout; `.toml` files are text, anything else is bincode
    pub fn load_from_file<P: AsRef<Path>>(filename: P) -> ChaseResult<Self> {
        let file_path = Self::resolve(filename.as_ref())?;
        if !file_path.exists() {
            return Err(ChaseError::LayoutFileNotFound { path: file_path });
        }

        let layout: RoomLayout = if Self::is_toml(&file_path) {
            toml::from_str(&std::fs::read_to_string(&file_path)?)?
        } else {
            let data = std::fs::read(&file_path)?;
            let (layout, _): (RoomLayout, usize) =
                bincode::serde::decode_from_slice(&data, bincode::config::standard()).map_err(
                    |e| ChaseError::CorruptedLayoutFile {
                        reason: format!("Failed to deserialize layout data: {e}"),
                    },
                )?;
            layout
        };

        layout.check()?;
        Ok(layout)
    }

    /// Save the layout; the format follows the file extension like `load_from_file`
    pub fn save_to_file<P: AsRef<Path>>(&self, filename: P) -> ChaseResult<PathBuf> {
        self.check()?;

        let file_path = Self::resolve(filename.as_ref())?;
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if Self::is_toml(&file_path) {
            toml::to_string_pretty(self)?.into_bytes()
        } else {
            bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
                ChaseError::InvalidLayout {
                    reason: format!("Failed to serialize layout: {e}"),
                }
            })?
        };

        std::fs::write(&file_path, data)?;
        Ok(file_path)
    }

    pub fn moving_platforms(&self) -> impl Iterator<Item = &ObstacleDefinition> {
        self.obstacles
            .iter()
            .filter(|definition| definition.platform.is_some())
    }

    /// Obstacle manager holding every fixed obstacle; platforms are left as
    /// dynamic obstacles for the caller to refresh each tick
    pub fn build_obstacle_manager(&self) -> ObstacleManager {
        let mut manager = ObstacleManager::new(Some(self.bounds));
        manager.add_static_obstacles(
            self.obstacles
                .iter()
                .filter(|definition| definition.platform.is_none())
                .map(BlockObstacle::from),
        );
        manager.replace_dynamic_obstacles(self.moving_platforms().map(|platform| platform.obstacle_at(0.0)));
        manager
    }
}
