use crate::components::*;
use crate::config::load_config;
use crate::map::RoomLayout;
use crate::plugins::environment::load_room_layout;
use crate::resources::{GameConfig, GameContext, GameState, RoundOutcome};
use bevy::prelude::*;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .insert_resource(load_config())
            .init_resource::<GameContext>()
            .init_resource::<RoundOutcome>()
            .add_systems(
                OnEnter(GameState::Playing),
                setup_scene.after(load_room_layout),
            )
            .add_systems(Update, follow_camera.run_if(in_state(GameState::Playing)));
    }
}

fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    camera_query: Query<&Camera3d>,
    ground_query: Query<&Ground>,
    light_query: Query<&SceneLight>,
    layout: Res<RoomLayout>,
    game_config: Res<GameConfig>,
) {
    if ground_query.is_empty() {
        let size = layout.bounds.size();
        let center = layout.bounds.center();
        info!(
            "Room floor {:.1}x{:.1} centred at ({:.1}, {:.1})",
            size.x, size.z, center.x, center.z
        );

        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(size.x, size.z))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.45, 0.35, 0.3),
                ..default()
            })),
            Transform::from_xyz(center.x, layout.bounds.min.y, center.z),
            Ground,
        ));
    }

    if light_query.is_empty() {
        commands.spawn((
            DirectionalLight {
                shadows_enabled: true,
                ..default()
            },
            Transform {
                translation: Vec3::new(0.0, layout.bounds.max.y, 0.0),
                rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
                ..default()
            },
            SceneLight,
        ));

        commands.insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: game_config.settings.ambient_light_brightness,
            affects_lightmapped_meshes: false,
        });
    }

    if camera_query.is_empty() {
        let offset = Vec3::new(0.0, 18.0, 16.0);
        commands.spawn((
            Camera3d::default(),
            Transform::from_translation(layout.player_spawn + offset)
                .looking_at(layout.player_spawn, Vec3::Y),
            CameraFollow { offset },
        ));
    }
}

fn follow_camera(
    player_query: Query<&Transform, (With<Player>, Without<CameraFollow>)>,
    mut camera_query: Query<(&mut Transform, &CameraFollow), Without<Player>>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };
    for (mut camera_transform, follow) in camera_query.iter_mut() {
        camera_transform.translation = player_transform.translation + follow.offset;
        camera_transform.look_at(player_transform.translation, Vec3::Y);
    }
}
