use crate::game_logic::chaser::Chaser;
use crate::game_logic::collision::ActorBody;
use crate::map::PlatformTrack;
use bevy::prelude::*;
use derive_more::{Add, Display, From, Mul};
use std::ops::Sub;

// Generic resource pool; only health is tracked in the room
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Component)]
pub struct ResourcePool<T> {
    pub current: f32,
    pub max: f32,
    _marker: std::marker::PhantomData<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Health;

pub type HealthPool = ResourcePool<Health>;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Mul, Display, From)]
pub struct Speed(pub f32);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Add, Mul, Display, From)]
pub struct Damage(pub f32);

impl<T> ResourcePool<T> {
    pub fn new(current: f32, max: f32) -> Self {
        Self {
            current: current.max(0.0).min(max),
            max: max.max(0.0),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn new_full(max: f32) -> Self {
        Self::new(max, max)
    }
}

impl ResourcePool<Health> {
    pub fn is_dead(self) -> bool {
        self.current <= 0.0
    }

    pub fn take_damage(&mut self, damage: Damage) {
        self.current = (self.current - damage.0).max(0.0);
    }
}

impl<T> std::fmt::Display for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}/{:.0}", self.current, self.max)
    }
}

impl Speed {
    pub fn new(value: f32) -> Self {
        Self(value.max(0.0))
    }
}

impl Damage {
    pub fn new(value: f32) -> Self {
        Self(value.max(0.0))
    }
    pub const ZERO: Damage = Damage(0.0);
}

impl Sub for Damage {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self((self.0 - rhs.0).max(0.0))
    }
}

// Custom math operations for Vec3 * Speed
impl std::ops::Mul<Speed> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: Speed) -> Self::Output {
        self * rhs.0
    }
}

#[derive(Component)]
pub struct Player {
    pub speed: Speed,
    pub health: HealthPool,
    pub body: ActorBody,
}

/// The enemy that chases the player; owns its controller
#[derive(Component)]
pub struct ChaserAgent {
    pub controller: Chaser,
    pub damage: Damage,
}

/// Platform oscillating along its track
#[derive(Component, Debug, Clone)]
pub struct PlatformMotion {
    pub track: PlatformTrack,
    pub origin: Vec3,
    pub elapsed: f32,
    pub velocity: Vec3,
}

impl PlatformMotion {
    pub fn new(track: PlatformTrack, origin: Vec3) -> Self {
        Self {
            velocity: track.initial_velocity(),
            track,
            origin,
            elapsed: 0.0,
        }
    }

    /// Advance along the track and return the new centre
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.elapsed += dt;
        self.velocity = self.track.velocity_at(self.elapsed);
        self.origin + self.track.direction() * self.track.offset_at(self.elapsed)
    }
}

/// Toy block the player can shove across the floor
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PushableBlock {
    pub velocity: Vec3,
    pub half_height: f32,
}

#[derive(Component)]
pub struct Ground;

#[derive(Component)]
pub struct SceneLight;

#[derive(Component)]
pub struct CameraFollow {
    pub offset: Vec3,
}
