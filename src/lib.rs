pub mod components;
pub mod config;
pub mod game_logic;
pub mod map;
pub mod pathfinding;
pub mod plugins;
pub mod resources;

// Selective re-exports for external consumers

// Plugins - main.rs needs all plugins
pub use plugins::*;

// Game logic - the headless sim drives the controller directly
pub use game_logic::chaser::{Chaser, ChaserConfig, ChaserReport, ChaserState, ChaserStrategy};
pub use game_logic::errors::{ChaseError, ChaseResult};

// Map - room layouts and their obstacle sets
pub use map::{ObstacleDefinition, PlatformTrack, RoomLayout};
