pub mod chaser;
pub mod environment;
pub mod player;
pub mod scene;

pub use chaser::*;
pub use environment::*;
pub use player::*;
pub use scene::*;
