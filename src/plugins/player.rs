use crate::components::*;
use crate::game_logic::collision::{
    ActorBody, CollisionConfig, apply_movement_with_collision, clamp_to_room, update_physics,
};
use crate::game_logic::movement::{MovementKeys, input_direction, nearest_within, push_velocity};
use crate::map::RoomLayout;
use crate::pathfinding::obstacles::{Environment, ObstacleManager};
use crate::plugins::environment::{collect_obstacles, load_room_layout};
use crate::resources::{GameConfig, GameContext, GameState};
use bevy::prelude::*;

const PLAYER_HALF_WIDTH: f32 = 0.5;
const PLAYER_HEIGHT: f32 = 2.0;

pub struct PlayerPlugin;

/// Player input and movement; runs after the obstacle snapshot is rebuilt
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerSystems;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameState::Playing),
            spawn_player.after(load_room_layout),
        )
        .add_systems(Update, toggle_pause)
        .add_systems(
            Update,
            (push_blocks, move_player)
                .chain()
                .in_set(PlayerSystems)
                .after(collect_obstacles)
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(OnExit(GameState::Playing), cleanup_player);
    }
}

fn spawn_player(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    game_config: Res<GameConfig>,
    layout: Res<RoomLayout>,
    player_query: Query<&Player>,
) {
    if !player_query.is_empty() {
        return;
    }
    let settings = &game_config.settings;
    let spawn = layout.player_spawn;

    commands.spawn((
        Mesh3d(meshes.add(Capsule3d::new(PLAYER_HALF_WIDTH, PLAYER_HEIGHT - 2.0 * PLAYER_HALF_WIDTH))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.6, 0.9),
            ..default()
        })),
        Transform::from_translation(spawn + Vec3::Y * PLAYER_HEIGHT * 0.5),
        Player {
            speed: Speed::new(settings.player_movement_speed.get()),
            health: HealthPool::new_full(settings.player_max_health.get()),
            body: ActorBody::new(spawn, PLAYER_HALF_WIDTH, PLAYER_HEIGHT),
        },
        Name::new("Player"),
    ));
    info!("Player spawned at {spawn:?}");
}

fn toggle_pause(keyboard: Res<ButtonInput<KeyCode>>, mut context: ResMut<GameContext>) {
    if keyboard.just_pressed(KeyCode::Escape) {
        context.paused = !context.paused;
        info!("Game {}", if context.paused { "paused" } else { "resumed" });
    }
}

fn push_blocks(
    keyboard: Res<ButtonInput<KeyCode>>,
    context: Res<GameContext>,
    game_config: Res<GameConfig>,
    player_query: Query<&Player>,
    mut blocks: Query<(Entity, &Transform, &mut PushableBlock)>,
) {
    if !keyboard.just_pressed(KeyCode::KeyP) || !context.can_push_blocks() {
        return;
    }
    let Ok(player) = player_query.single() else {
        return;
    };
    let settings = &game_config.settings;
    let origin = player.body.position;

    let candidates = blocks
        .iter()
        .map(|(entity, transform, _)| (entity, transform.translation));
    let Some((entity, distance)) =
        nearest_within(origin, candidates, settings.block_push_distance.get())
    else {
        debug!("No block within push range");
        return;
    };

    if let Ok((_, transform, mut block)) = blocks.get_mut(entity) {
        block.velocity = push_velocity(origin, transform.translation, settings.block_push_speed.get());
        debug!("Pushed block {entity} at distance {distance:.2}");
    }
}

fn move_player(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    context: Res<GameContext>,
    game_config: Res<GameConfig>,
    manager: Res<ObstacleManager>,
    mut player_query: Query<(&mut Transform, &mut Player)>,
) {
    if context.is_frozen() {
        return;
    }
    let Ok((mut transform, mut player)) = player_query.single_mut() else {
        return;
    };

    let dt = time.delta_secs();
    let collision = CollisionConfig {
        gravity: game_config.settings.gravity.get(),
        strict_corners: game_config.settings.strict_corner_collision,
        ..default()
    };
    let keys = MovementKeys {
        forward: keyboard.pressed(KeyCode::KeyW),
        back: keyboard.pressed(KeyCode::KeyS),
        left: keyboard.pressed(KeyCode::KeyA),
        right: keyboard.pressed(KeyCode::KeyD),
    };

    let player = &mut *player;
    let obstacles = manager.collidables();
    let standing_on = update_physics(&mut player.body, obstacles, &collision, dt).map(|contact| contact.index);

    let direction = input_direction(keys);
    if direction != Vec3::ZERO {
        let step = direction * player.speed * dt;
        apply_movement_with_collision(&mut player.body, step, obstacles, standing_on, &collision);
        transform.look_to(direction, Vec3::Y);
    }
    if let Some(bounds) = manager.room_bounds() {
        clamp_to_room(&mut player.body, &bounds, &collision);
    }

    transform.translation = player.body.position + Vec3::Y * PLAYER_HEIGHT * 0.5;
}

fn cleanup_player(mut commands: Commands, player_query: Query<Entity, With<Player>>) {
    for entity in player_query.iter() {
        commands.entity(entity).despawn();
    }
}
