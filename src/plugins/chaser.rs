use crate::components::*;
use crate::game_logic::animation::ClipLibrary;
use crate::game_logic::chaser::{Chaser, ChaserConfig};
use crate::map::RoomLayout;
use crate::pathfinding::obstacles::{Environment, ObstacleManager};
use crate::plugins::environment::load_room_layout;
use crate::plugins::player::PlayerSystems;
use crate::resources::*;
use bevy::prelude::*;

pub struct ChaserPlugin;

impl Plugin for ChaserPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameState::Playing),
            spawn_chaser.after(load_room_layout),
        )
        .add_systems(
            Update,
            (update_chaser, apply_chaser_hits, check_round_end, tick_round_timer)
                .chain()
                .after(PlayerSystems)
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(OnEnter(GameState::GameOver), report_outcome)
        .add_systems(OnExit(GameState::Playing), cleanup_chaser);
    }
}

fn spawn_chaser(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    game_config: Res<GameConfig>,
    layout: Res<RoomLayout>,
    chaser_query: Query<&ChaserAgent>,
) {
    if !chaser_query.is_empty() {
        return;
    }
    let settings = &game_config.settings;
    let config = ChaserConfig::from(settings);
    let mut controller = Chaser::new(layout.chaser_spawn, config);

    // Without its clips the chaser is spawned but stays inert.
    if let Err(err) = controller.attach_clips(ClipLibrary::standard()) {
        warn!("Chaser spawned without animations: {err}");
    }

    commands.spawn((
        Mesh3d(meshes.add(Capsule3d::new(config.half_width, config.height - 2.0 * config.half_width))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.7, 0.15, 0.15),
            ..default()
        })),
        Transform::from_translation(layout.chaser_spawn + Vec3::Y * config.height * 0.5),
        ChaserAgent {
            controller,
            damage: Damage::new(settings.chaser_attack_damage.get()),
        },
        Name::new("Chaser"),
    ));
}

fn update_chaser(
    time: Res<Time>,
    context: Res<GameContext>,
    manager: Res<ObstacleManager>,
    player_query: Query<&Player>,
    mut chaser_query: Query<(&mut Transform, &mut ChaserAgent)>,
    mut outcome: ResMut<RoundOutcome>,
) {
    let Ok(player) = player_query.single() else {
        return;
    };
    let environment: &dyn Environment = &*manager;

    for (mut transform, mut agent) in chaser_query.iter_mut() {
        let report = agent.controller.update(
            time.delta_secs(),
            player.body.position,
            Some(environment),
            &context,
        );
        if report.caught {
            outcome.reason = Some(GameOverReason::Caught);
        }

        let height = agent.controller.config.height;
        transform.translation = agent.controller.position() + Vec3::Y * height * 0.5;
        transform.rotation = Quat::from_rotation_y(agent.controller.yaw());
    }
}

fn apply_chaser_hits(
    mut chaser_query: Query<&mut ChaserAgent>,
    mut player_query: Query<&mut Player>,
    mut outcome: ResMut<RoundOutcome>,
) {
    let Ok(mut player) = player_query.single_mut() else {
        return;
    };
    for mut agent in chaser_query.iter_mut() {
        if !agent.controller.can_deal_damage() {
            continue;
        }
        player.health.take_damage(agent.damage);
        info!("Player hit for {}, health {}", agent.damage, player.health);
        if player.health.is_dead() {
            outcome.reason = Some(GameOverReason::Defeated);
        }
    }
}

fn check_round_end(outcome: Res<RoundOutcome>, mut next_state: ResMut<NextState<GameState>>) {
    if outcome.reason.is_some() {
        next_state.set(GameState::GameOver);
    }
}

fn tick_round_timer(time: Res<Time>, context: Res<GameContext>, mut outcome: ResMut<RoundOutcome>) {
    if !context.is_frozen() {
        outcome.survived_secs += time.delta_secs();
    }
}

fn report_outcome(outcome: Res<RoundOutcome>) {
    match outcome.reason {
        Some(GameOverReason::Caught) => {
            info!("Caught by the chaser after {:.1}s", outcome.survived_secs)
        }
        Some(GameOverReason::Defeated) => {
            info!("Defeated by the chaser after {:.1}s", outcome.survived_secs)
        }
        None => warn!("Round ended without an outcome"),
    }
}

fn cleanup_chaser(mut commands: Commands, mut chaser_query: Query<(Entity, &mut ChaserAgent)>) {
    for (entity, mut agent) in chaser_query.iter_mut() {
        agent.controller.dispose();
        commands.entity(entity).despawn();
    }
}
