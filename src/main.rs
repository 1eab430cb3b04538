use bevy::prelude::*;
use ::chaser::plugins::*;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Chaser - Bedroom".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((ScenePlugin, EnvironmentPlugin, PlayerPlugin, ChaserPlugin))
        .run();
}
