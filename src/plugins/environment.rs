use crate::components::{PlatformMotion, PushableBlock};
use crate::game_logic::errors::ChaseResult;
use crate::game_logic::movement::{BlockMotionConfig, decay_velocity, integrate_block};
use crate::map::{ObstacleDefinition, RoomLayout};
use crate::pathfinding::obstacles::{
    EntityObstacle, Environment, ObstacleKind, ObstacleManager, ObstacleSource,
};
use crate::resources::{GameConfig, GameContext, GameState};
use bevy::prelude::*;

pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ObstacleManager>()
            .add_systems(OnEnter(GameState::Playing), load_room_layout)
            .add_systems(
                OnEnter(GameState::Playing),
                spawn_environment_objects.after(load_room_layout),
            )
            .add_systems(
                Update,
                (move_platforms, slide_blocks, collect_obstacles)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

/// Marker component for room obstacle entities
#[derive(Component)]
pub struct EnvironmentObjectMarker {
    pub name: String,
}

fn load_layout_from_config(game_config: &GameConfig) -> ChaseResult<RoomLayout> {
    match &game_config.settings.layout_file_path {
        Some(path) => RoomLayout::load_from_file(path),
        None => Ok(RoomLayout::bedroom()),
    }
}

pub fn load_room_layout(mut commands: Commands, game_config: Res<GameConfig>) {
    let layout = match load_layout_from_config(&game_config) {
        Ok(layout) => layout,
        Err(err) => {
            warn!("Failed to load room layout: {err}");
            warn!("Falling back to the built-in bedroom");
            RoomLayout::bedroom()
        }
    };

    info!(
        "Loaded room '{}' with {} obstacles",
        layout.name,
        layout.obstacles.len()
    );
    commands.insert_resource(ObstacleManager::new(Some(layout.bounds)));
    commands.insert_resource(layout);
}

fn spawn_environment_objects(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    layout: Res<RoomLayout>,
) {
    for definition in &layout.obstacles {
        spawn_single_environment_object(&mut commands, &mut meshes, &mut materials, definition);
    }
    debug!("Spawned {} environment objects", layout.obstacles.len());
}

fn spawn_single_environment_object(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    definition: &ObstacleDefinition,
) {
    let mut source = ObstacleSource::new(definition.size, definition.kind);
    if !definition.collidable {
        source.disable_collision();
    }

    let mut entity = commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(definition.size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: object_color(definition.kind),
            ..default()
        })),
        Transform::from_translation(definition.center),
        source,
        EnvironmentObjectMarker {
            name: definition.name.clone(),
        },
        Name::new(format!("Obstacle_{}", definition.name)),
    ));

    match (definition.kind, definition.platform) {
        (ObstacleKind::MovingPlatform, Some(track)) => {
            entity.insert(PlatformMotion::new(track, definition.center));
        }
        (ObstacleKind::StaticBlock, _) => {
            entity.insert(PushableBlock {
                velocity: Vec3::ZERO,
                half_height: definition.size.y * 0.5,
            });
        }
        _ => {}
    }
}

fn object_color(kind: ObstacleKind) -> Color {
    match kind {
        ObstacleKind::Prop => Color::srgb(0.55, 0.4, 0.3),
        ObstacleKind::StaticBlock => Color::srgb(0.9, 0.6, 0.2),
        ObstacleKind::MovingPlatform => Color::srgb(0.3, 0.5, 0.8),
        ObstacleKind::Wall => Color::srgb(0.8, 0.8, 0.75),
        ObstacleKind::Portal => Color::srgba(0.6, 0.2, 0.9, 0.7),
    }
}

fn move_platforms(
    mut platforms: Query<(&mut Transform, &mut PlatformMotion)>,
    time: Res<Time>,
    context: Res<GameContext>,
) {
    if context.is_frozen() {
        return;
    }
    for (mut transform, mut motion) in platforms.iter_mut() {
        transform.translation = motion.advance(time.delta_secs());
    }
}

fn slide_blocks(
    mut blocks: Query<(&mut Transform, &mut PushableBlock, &ObstacleSource)>,
    manager: Res<ObstacleManager>,
    time: Res<Time>,
    context: Res<GameContext>,
) {
    if context.is_frozen() {
        return;
    }
    let config = BlockMotionConfig::default();
    let dt = time.delta_secs();
    let room = manager.room_bounds();

    for (mut transform, mut block, source) in blocks.iter_mut() {
        if block.velocity == Vec3::ZERO {
            continue;
        }
        let mut next = integrate_block(
            transform.translation,
            block.half_height,
            block.velocity,
            &config,
            dt,
        );
        if let Some(room) = room {
            let low = room.min + source.half_extents;
            let high = room.max - source.half_extents;
            if low.x <= high.x && low.z <= high.z {
                next.x = next.x.clamp(low.x, high.x);
                next.z = next.z.clamp(low.z, high.z);
            }
        }
        transform.translation = next;
        block.velocity = decay_velocity(block.velocity, &config, dt);
    }
}

/// Rebuild the obstacle snapshot from entity transforms
pub fn collect_obstacles(
    mut manager: ResMut<ObstacleManager>,
    obstacles: Query<(Entity, &Transform, &ObstacleSource, Option<&PlatformMotion>)>,
) {
    manager.replace_dynamic_obstacles(obstacles.iter().map(
        |(entity, transform, source, motion)| {
            let snapshot = EntityObstacle::new(entity, transform, source);
            match motion {
                Some(motion) => snapshot.with_velocity(motion.velocity),
                None => snapshot,
            }
        },
    ));
}
