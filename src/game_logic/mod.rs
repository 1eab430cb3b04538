pub mod animation;
pub mod chaser;
pub mod collision;
pub mod errors;
pub mod movement;

pub use animation::*;
pub use chaser::*;
pub use collision::*;
pub use errors::*;
pub use movement::*;
