use crate::config::range_types::*;
use crate::game_logic::chaser::{ChaseMode, HitTolerance};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default)]
pub struct GameConfig {
    pub username: String,
    pub settings: GameSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct GameSettings {
    // Player settings
    pub player_movement_speed: MovementSpeed,
    pub player_max_health: HealthValue,
    pub block_push_distance: InteractionDistance,
    pub block_push_speed: MovementSpeed,

    // Chaser movement
    pub chaser_base_speed: MovementSpeed,
    pub chaser_far_distance: TierDistance,
    pub chaser_far_speed_multiplier: SpeedMultiplier,
    pub chaser_near_distance: TierDistance,
    pub chaser_near_speed_multiplier: SpeedMultiplier,
    pub chaser_min_distance: StoppingDistance,
    pub chaser_turn_rate: TurnRate,

    // Chaser combat
    pub chase_mode: ChaseMode,
    pub chaser_attack_distance: AttackDistance,
    pub chaser_attack_cooldown: CooldownSeconds,
    pub chaser_attack_damage: DamageValue,
    pub chaser_hit_tolerance: HitTolerance,
    pub chaser_catch_distance: CatchDistance,
    pub chaser_seed: u64,

    // Navigation and physics
    pub path_cell_size: CellSize,
    pub path_refresh_interval: RefreshInterval,
    pub gravity: Gravity,
    pub strict_corner_collision: bool,

    // Visual settings
    pub ambient_light_brightness: f32,

    // Room layout file relative to the layouts directory; the bedroom is built in
    pub layout_file_path: Option<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            // Player settings
            player_movement_speed: MovementSpeed::new(5.0),
            player_max_health: HealthValue::new(100.0),
            block_push_distance: InteractionDistance::new(3.0),
            block_push_speed: MovementSpeed::new(4.0),

            // Chaser movement, 0.01 units per frame at 60 FPS
            chaser_base_speed: MovementSpeed::new(0.6),
            chaser_far_distance: TierDistance::new(8.0),
            chaser_far_speed_multiplier: SpeedMultiplier::new(1.3),
            chaser_near_distance: TierDistance::new(4.0),
            chaser_near_speed_multiplier: SpeedMultiplier::new(0.75),
            chaser_min_distance: StoppingDistance::new(2.5),
            chaser_turn_rate: TurnRate::new(0.1),

            // Chaser combat
            chase_mode: ChaseMode::Combat,
            chaser_attack_distance: AttackDistance::new(3.0),
            chaser_attack_cooldown: CooldownSeconds::new(3.0),
            chaser_attack_damage: DamageValue::new(10.0),
            chaser_hit_tolerance: HitTolerance::Strict,
            chaser_catch_distance: CatchDistance::new(2.5),
            chaser_seed: 42,

            // Navigation and physics
            path_cell_size: CellSize::new(1.0),
            path_refresh_interval: RefreshInterval::new(0.25),
            gravity: Gravity::new(20.0),
            strict_corner_collision: false,

            // Visual settings
            ambient_light_brightness: 300.0,

            layout_file_path: None,
        }
    }
}

impl GameSettings {
    /// Re-apply every range constraint; deserialized values skip the constructors
    pub fn clamped(mut self) -> Self {
        self.player_movement_speed = self.player_movement_speed.clamped();
        self.player_max_health = self.player_max_health.clamped();
        self.block_push_distance = self.block_push_distance.clamped();
        self.block_push_speed = self.block_push_speed.clamped();
        self.chaser_base_speed = self.chaser_base_speed.clamped();
        self.chaser_far_distance = self.chaser_far_distance.clamped();
        self.chaser_far_speed_multiplier = self.chaser_far_speed_multiplier.clamped();
        self.chaser_near_distance = self.chaser_near_distance.clamped();
        self.chaser_near_speed_multiplier = self.chaser_near_speed_multiplier.clamped();
        self.chaser_min_distance = self.chaser_min_distance.clamped();
        self.chaser_turn_rate = self.chaser_turn_rate.clamped();
        self.chaser_attack_distance = self.chaser_attack_distance.clamped();
        self.chaser_attack_cooldown = self.chaser_attack_cooldown.clamped();
        self.chaser_attack_damage = self.chaser_attack_damage.clamped();
        self.chaser_catch_distance = self.chaser_catch_distance.clamped();
        self.path_cell_size = self.path_cell_size.clamped();
        self.path_refresh_interval = self.path_refresh_interval.clamped();
        self.gravity = self.gravity.clamped();
        self
    }
}

/// Shared game-state flags consulted by every chaser update and the push system
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameContext {
    pub paused: bool,
    pub quiz_active: bool,
    pub block_push_disabled: bool,
}

impl GameContext {
    /// Simulation time stands still while paused or while a quiz is open
    pub fn is_frozen(&self) -> bool {
        self.paused || self.quiz_active
    }

    pub fn can_push_blocks(&self) -> bool {
        !self.block_push_disabled && !self.is_frozen()
    }
}

/// Why the round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    Caught,
    Defeated,
}

#[derive(Resource, Debug, Default)]
pub struct RoundOutcome {
    pub reason: Option<GameOverReason>,
    pub survived_secs: f32,
}

#[derive(States, Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameState {
    #[default]
    Playing,
    GameOver,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_roundtrip_through_toml() {
        let config = GameConfig {
            username: "tester".to_string(),
            settings: GameSettings {
                chase_mode: ChaseMode::Catch,
                chaser_hit_tolerance: HitTolerance::Lenient,
                ..Default::default()
            },
        };

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("chase_mode = \"catch\""));

        let parsed: GameConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.settings.chase_mode, ChaseMode::Catch);
        assert_eq!(parsed.settings.chaser_hit_tolerance, HitTolerance::Lenient);
        assert_eq!(parsed.settings.chaser_base_speed, MovementSpeed::new(0.6));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let parsed: GameConfig = toml::from_str(
            "username = \"p\"\n[settings]\nchaser_attack_cooldown = 500.0\n",
        )
        .unwrap();
        let settings = parsed.settings.clamped();

        assert_eq!(settings.chaser_attack_cooldown.get(), 60.0);
        assert_eq!(settings.chaser_min_distance.get(), 2.5);
        assert!(settings.layout_file_path.is_none());
    }

    #[test]
    fn test_context_freeze_rules() {
        let mut context = GameContext::default();
        assert!(!context.is_frozen());
        assert!(context.can_push_blocks());

        context.quiz_active = true;
        assert!(context.is_frozen());
        assert!(!context.can_push_blocks());

        context = GameContext {
            block_push_disabled: true,
            ..Default::default()
        };
        assert!(!context.is_frozen());
        assert!(!context.can_push_blocks());
    }
}
