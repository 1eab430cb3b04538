//! Chaser behaviour: pursuit, attacks and the catch ending
//!
//! One [`Chaser::update`] per frame runs, in order: animation advance,
//! gravity and ground resolution, AI transitions and attack triggers, the
//! rate-limited path refresh, direction selection, collision-checked
//! movement, rotation and the room clamp. A zero delta (or a frozen
//! [`GameContext`]) pauses everything except pose evaluation.

use crate::game_logic::animation::{AnimationMixer, ClipEvent, ClipLibrary, ClipName};
use crate::game_logic::collision::{
    ActorBody, CollisionConfig, apply_movement_with_collision, clamp_to_room, snap_to_floor,
    update_physics,
};
use crate::game_logic::errors::{ChaseError, ChaseResult};
use crate::pathfinding::obstacles::Environment;
use crate::pathfinding::{Pathfinder, PathfindingConfig};
use crate::resources::{GameContext, GameSettings};
use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Directions shorter than this are treated as missing
const MIN_DIRECTION_LENGTH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChaserState {
    #[default]
    Idle,
    Chasing,
    /// Terminal: the target was caught
    Caught,
}

/// How strictly the hit window is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitTolerance {
    /// Hits land only on a frame whose clip time is inside the window
    #[default]
    Strict,
    /// A frame that jumps across the whole window still lands the hit
    Lenient,
}

/// Which ending the chaser plays toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaseMode {
    #[default]
    Combat,
    Catch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatTuning {
    pub attack_distance: f32,
    /// Seconds between the end of one attack and the start of the next
    pub attack_cooldown: f32,
    /// Extra reach granted while the hit window is open
    pub damage_margin: f32,
    pub hit_window_start: f32,
    pub hit_window_end: f32,
    pub hit_tolerance: HitTolerance,
    pub overlay_fade_in: f32,
    pub overlay_fade_out: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            attack_distance: 3.0,
            attack_cooldown: 3.0,
            damage_margin: 0.5,
            hit_window_start: 0.3,
            hit_window_end: 0.7,
            hit_tolerance: HitTolerance::Strict,
            overlay_fade_in: 0.15,
            overlay_fade_out: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchTuning {
    pub catch_distance: f32,
    pub catch_fade: f32,
}

impl Default for CatchTuning {
    fn default() -> Self {
        Self {
            catch_distance: 2.5,
            catch_fade: 0.2,
        }
    }
}

/// Behaviour variant chosen when the chaser is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChaserStrategy {
    /// Keep attacking the target with cooldown-gated overlays
    Combat(CombatTuning),
    /// End the round as soon as the target is within reach
    Catch(CatchTuning),
}

impl Default for ChaserStrategy {
    fn default() -> Self {
        Self::Combat(CombatTuning::default())
    }
}

impl ChaserStrategy {
    fn required_clips(&self) -> &'static [ClipName] {
        match self {
            Self::Combat(_) => &[ClipName::Idle, ClipName::Run, ClipName::JumpAttack, ClipName::Slash],
            Self::Catch(_) => &[ClipName::Idle, ClipName::Run, ClipName::Catch],
        }
    }
}

/// Tuning for the chaser controller
#[derive(Debug, Clone, Copy)]
pub struct ChaserConfig {
    /// Units per second before tier scaling
    pub base_speed: f32,
    pub far_distance: f32,
    pub far_speed_multiplier: f32,
    pub near_distance: f32,
    pub near_speed_multiplier: f32,
    /// Closer than this the chaser idles instead of running
    pub min_distance: f32,
    /// Fraction of the remaining yaw covered each tick
    pub turn_rate: f32,
    pub path_refresh_interval: f32,
    pub base_fade: f32,
    pub half_width: f32,
    pub height: f32,
    pub seed: u64,
    pub strategy: ChaserStrategy,
    pub collision: CollisionConfig,
    pub pathfinding: PathfindingConfig,
}

impl Default for ChaserConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.6,
            far_distance: 8.0,
            far_speed_multiplier: 1.3,
            near_distance: 4.0,
            near_speed_multiplier: 0.75,
            min_distance: 2.5,
            turn_rate: 0.1,
            path_refresh_interval: 0.25,
            base_fade: 0.3,
            half_width: 0.5,
            height: 3.0,
            seed: 42,
            strategy: ChaserStrategy::default(),
            collision: CollisionConfig::default(),
            pathfinding: PathfindingConfig::default(),
        }
    }
}

impl ChaserConfig {
    /// Speed scale for the current distance to the target
    pub fn speed_multiplier(&self, distance: f32) -> f32 {
        if distance > self.far_distance {
            self.far_speed_multiplier
        } else if distance < self.near_distance {
            self.near_speed_multiplier
        } else {
            1.0
        }
    }
}

impl From<&GameSettings> for ChaserConfig {
    fn from(settings: &GameSettings) -> Self {
        let strategy = match settings.chase_mode {
            ChaseMode::Combat => ChaserStrategy::Combat(CombatTuning {
                attack_distance: settings.chaser_attack_distance.get(),
                attack_cooldown: settings.chaser_attack_cooldown.get(),
                hit_tolerance: settings.chaser_hit_tolerance,
                ..Default::default()
            }),
            ChaseMode::Catch => ChaserStrategy::Catch(CatchTuning {
                catch_distance: settings.chaser_catch_distance.get(),
                ..Default::default()
            }),
        };

        Self {
            base_speed: settings.chaser_base_speed.get(),
            far_distance: settings.chaser_far_distance.get(),
            far_speed_multiplier: settings.chaser_far_speed_multiplier.get(),
            near_distance: settings.chaser_near_distance.get(),
            near_speed_multiplier: settings.chaser_near_speed_multiplier.get(),
            min_distance: settings.chaser_min_distance.get(),
            turn_rate: settings.chaser_turn_rate.get(),
            path_refresh_interval: settings.path_refresh_interval.get(),
            seed: settings.chaser_seed,
            strategy,
            collision: CollisionConfig {
                gravity: settings.gravity.get(),
                strict_corners: settings.strict_corner_collision,
                ..Default::default()
            },
            pathfinding: PathfindingConfig {
                cell_size: settings.path_cell_size.get(),
            },
            ..Default::default()
        }
    }
}

/// What happened during one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaserReport {
    pub state: ChaserState,
    pub attack_started: Option<ClipName>,
    /// Set only on the update that caught the target
    pub caught: bool,
    pub displacement: Vec3,
}

impl ChaserReport {
    fn new(state: ChaserState) -> Self {
        Self {
            state,
            attack_started: None,
            caught: false,
            displacement: Vec3::ZERO,
        }
    }
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

fn direction_or_none(v: Vec3) -> Option<Vec3> {
    let flat = flatten(v);
    (flat.length() >= MIN_DIRECTION_LENGTH).then(|| flat.normalize())
}

/// Wrap an angle into `[-PI, PI)`
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Yaw that faces along `direction`
pub fn facing_yaw(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Single-step lerp toward `target` along the shortest arc
///
/// ```
/// use chaser::game_logic::chaser::approach_yaw;
///
/// let yaw = approach_yaw(0.0, 1.0, 0.5);
/// assert!((yaw - 0.5).abs() < 1e-5);
/// ```
pub fn approach_yaw(current: f32, target: f32, rate: f32) -> f32 {
    wrap_angle(current + wrap_angle(target - current) * rate.clamp(0.0, 1.0))
}

/// Enemy that pursues a target through the room
pub struct Chaser {
    pub config: ChaserConfig,
    body: ActorBody,
    yaw: f32,
    state: ChaserState,
    mixer: Option<AnimationMixer>,
    pathfinder: Pathfinder,
    rng: Pcg64,
    attack_cooldown: f32,
    has_dealt_damage: bool,
    // Lenient only: the overlay finished this frame after skipping its window
    pending_hit: bool,
    cached_direction: Option<Vec3>,
    path_timer: f32,
    path_unreachable: bool,
    grid_unavailable: bool,
    target: Option<Vec3>,
    warned_no_environment: bool,
}

impl Chaser {
    /// Build an inert chaser; it acts once clips are attached
    pub fn new(position: Vec3, config: ChaserConfig) -> Self {
        Self {
            body: ActorBody::new(position, config.half_width, config.height),
            yaw: 0.0,
            state: ChaserState::Idle,
            mixer: None,
            pathfinder: Pathfinder::new(config.pathfinding),
            rng: Pcg64::seed_from_u64(config.seed),
            attack_cooldown: 0.0,
            has_dealt_damage: false,
            pending_hit: false,
            cached_direction: None,
            path_timer: 0.0,
            path_unreachable: false,
            grid_unavailable: false,
            target: None,
            warned_no_environment: false,
            config,
        }
    }

    /// Attach the model's clips; the chaser stays inert if any required clip is missing
    pub fn attach_clips(&mut self, library: ClipLibrary) -> ChaseResult<()> {
        if let Some(clip) = library.first_missing(self.config.strategy.required_clips()) {
            error!("Chaser model is missing clip '{clip}', chaser stays inert");
            self.mixer = None;
            return Err(ChaseError::MissingClip { clip });
        }

        let mut mixer = AnimationMixer::new(library);
        mixer.fade_to_base(ClipName::Idle, 0.5);
        self.mixer = Some(mixer);
        self.state = ChaserState::Idle;
        info!("Chaser ready at {:?}", self.body.position);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.mixer.is_some()
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn body(&self) -> &ActorBody {
        &self.body
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn state(&self) -> ChaserState {
        self.state
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn path_timer(&self) -> f32 {
        self.path_timer
    }

    pub fn has_dealt_damage(&self) -> bool {
        self.has_dealt_damage
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn overlay(&self) -> Option<ClipName> {
        self.mixer.as_ref().and_then(|mixer| mixer.overlay_clip())
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Advance the chaser by one frame toward `target`
    pub fn update(
        &mut self,
        delta: f32,
        target: Vec3,
        environment: Option<&dyn Environment>,
        context: &GameContext,
    ) -> ChaserReport {
        let mut report = ChaserReport::new(self.state);
        if self.mixer.is_none() {
            return report;
        }

        let dt = if context.is_frozen() || !delta.is_finite() || delta < 0.0 {
            0.0
        } else {
            delta
        };
        let paused = dt == 0.0;
        self.target = Some(target);
        self.pending_hit = false;

        self.advance_animation(dt);
        if self.state == ChaserState::Caught || paused {
            return report;
        }

        let standing_on = self.resolve_ground(dt, environment);

        let distance = self.body.position.distance(target);
        if self.update_ai(dt, distance, &mut report) {
            return report;
        }

        self.path_timer += dt;

        let moving = self.state == ChaserState::Chasing
            && self.overlay().is_none()
            && distance > self.config.min_distance;
        let mut heading = None;
        if moving {
            let direction = self.steer(target, environment);
            let step = direction * self.config.base_speed * self.config.speed_multiplier(distance) * dt;
            report.displacement = self.move_body(step, environment, standing_on);
            heading = Some(direction);
        }

        if self.state != ChaserState::Idle || self.overlay().is_some() {
            let facing = if self.overlay().is_some() {
                direction_or_none(target - self.body.position)
            } else {
                heading.or_else(|| direction_or_none(target - self.body.position))
            };
            if let Some(facing) = facing {
                self.yaw = approach_yaw(self.yaw, facing_yaw(facing), self.config.turn_rate);
            }
        }

        if let Some(bounds) = environment.and_then(|environment| environment.room_bounds()) {
            clamp_to_room(&mut self.body, &bounds, &self.config.collision);
        }

        report.state = self.state;
        report
    }

    fn advance_animation(&mut self, dt: f32) {
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        for event in mixer.advance(dt) {
            let ClipEvent::Finished(clip) = event;
            if !clip.is_attack() || mixer.overlay_clip() != Some(clip) {
                continue;
            }
            if let ChaserStrategy::Combat(tuning) = self.config.strategy {
                self.pending_hit = tuning.hit_tolerance == HitTolerance::Lenient
                    && !self.has_dealt_damage
                    && mixer
                        .overlay_previous_progress()
                        .is_some_and(|previous| previous <= tuning.hit_window_end);
                mixer.fade_out_overlay(tuning.overlay_fade_out);
                self.attack_cooldown = tuning.attack_cooldown;
                debug!("Attack '{clip}' finished, cooldown {:.1}s", tuning.attack_cooldown);
            }
        }
    }

    /// Physics step; returns the index of the obstacle stood upon
    fn resolve_ground(&mut self, dt: f32, environment: Option<&dyn Environment>) -> Option<usize> {
        match environment {
            Some(environment) => {
                update_physics(&mut self.body, environment.collidables(), &self.config.collision, dt)
                    .map(|contact| contact.index)
            }
            None => {
                if !self.warned_no_environment {
                    warn!("Chaser has no collision environment, moving without collisions");
                    self.warned_no_environment = true;
                }
                snap_to_floor(&mut self.body, &self.config.collision);
                None
            }
        }
    }

    /// Base transitions and attack triggers; returns true once caught
    fn update_ai(&mut self, dt: f32, distance: f32, report: &mut ChaserReport) -> bool {
        let Some(mixer) = self.mixer.as_mut() else {
            return false;
        };

        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);

        if let ChaserStrategy::Catch(tuning) = self.config.strategy {
            if distance <= tuning.catch_distance {
                mixer.play_overlay(ClipName::Catch, tuning.catch_fade);
                self.state = ChaserState::Caught;
                report.state = ChaserState::Caught;
                report.caught = true;
                info!("Chaser caught the target at distance {distance:.2}");
                return true;
            }
        }

        if mixer.overlay_clip().is_some() {
            return false;
        }

        let desired = if distance <= self.config.min_distance {
            ChaserState::Idle
        } else {
            ChaserState::Chasing
        };
        if desired != self.state {
            let clip = match desired {
                ChaserState::Chasing => ClipName::Run,
                _ => ClipName::Idle,
            };
            mixer.fade_to_base(clip, self.config.base_fade);
            debug!("Chaser {:?} -> {:?} at distance {distance:.2}", self.state, desired);
            self.state = desired;
        }

        if let ChaserStrategy::Combat(tuning) = self.config.strategy {
            if distance <= tuning.attack_distance && self.attack_cooldown <= 0.0 {
                let clip = if self.rng.gen_bool(0.5) {
                    ClipName::JumpAttack
                } else {
                    ClipName::Slash
                };
                if mixer.play_overlay(clip, tuning.overlay_fade_in) {
                    self.has_dealt_damage = false;
                    self.pending_hit = false;
                    report.attack_started = Some(clip);
                    info!("Chaser starting attack '{clip}'");
                }
            }
        }
        false
    }

    /// Movement direction, from the pathfinder when a path exists
    fn steer(&mut self, target: Vec3, environment: Option<&dyn Environment>) -> Vec3 {
        let direct = direction_or_none(target - self.body.position).unwrap_or(Vec3::ZERO);
        let Some(environment) = environment else {
            return direct;
        };
        if !self.ensure_grid(environment) {
            return direct;
        }

        let stale = self
            .cached_direction
            .is_none_or(|direction| direction.length() < MIN_DIRECTION_LENGTH);
        if (stale && !self.path_unreachable) || self.path_timer >= self.config.path_refresh_interval {
            self.path_timer = 0.0;
            self.pathfinder.update_grid(environment);
            self.cached_direction = self.pathfinder.next_move_direction(self.body.position, target);
            self.path_unreachable = self.cached_direction.is_none();
            if self.path_unreachable {
                debug!("No path to target, chasing directly");
            }
        }

        self.cached_direction.unwrap_or(direct)
    }

    fn ensure_grid(&mut self, environment: &dyn Environment) -> bool {
        if self.pathfinder.is_initialized() {
            return true;
        }
        if self.grid_unavailable {
            return false;
        }

        let result = match environment.room_bounds() {
            Some(bounds) => self.pathfinder.init_grid(bounds, environment),
            None => Err(ChaseError::InvalidGrid {
                reason: "environment has no room bounds".to_string(),
            }),
        };
        if let Err(e) = result {
            warn!("Pathfinding unavailable, chasing directly: {e}");
            self.grid_unavailable = true;
            return false;
        }
        true
    }

    fn move_body(
        &mut self,
        step: Vec3,
        environment: Option<&dyn Environment>,
        standing_on: Option<usize>,
    ) -> Vec3 {
        match environment {
            Some(environment) => {
                apply_movement_with_collision(
                    &mut self.body,
                    step,
                    environment.collidables(),
                    standing_on,
                    &self.config.collision,
                )
                .applied
            }
            None => {
                let step = flatten(step);
                self.body.position += step;
                step
            }
        }
    }

    /// True while the current attack's hit window is open and the target is in reach
    ///
    /// Ignores whether this attack already landed; see [`Chaser::can_deal_damage`].
    pub fn in_damage_window(&self) -> bool {
        let ChaserStrategy::Combat(tuning) = self.config.strategy else {
            return false;
        };
        let (Some(mixer), Some(target)) = (self.mixer.as_ref(), self.target) else {
            return false;
        };
        if self.body.position.distance(target) > tuning.attack_distance + tuning.damage_margin {
            return false;
        }
        if self.pending_hit {
            return true;
        }
        if !mixer.overlay_clip().is_some_and(|clip| clip.is_attack()) {
            return false;
        }

        let (Some(progress), Some(previous)) =
            (mixer.overlay_progress(), mixer.overlay_previous_progress())
        else {
            return false;
        };
        match tuning.hit_tolerance {
            HitTolerance::Strict => {
                progress >= tuning.hit_window_start && progress <= tuning.hit_window_end
            }
            HitTolerance::Lenient => {
                previous <= tuning.hit_window_end && progress >= tuning.hit_window_start
            }
        }
    }

    /// Consume this attack's single hit if the window is open
    pub fn can_deal_damage(&mut self) -> bool {
        if self.has_dealt_damage || !self.in_damage_window() {
            return false;
        }
        self.has_dealt_damage = true;
        self.pending_hit = false;
        info!("Chaser hit the target");
        true
    }

    /// Stop all animation and leave the chaser inert
    pub fn dispose(&mut self) {
        if let Some(mut mixer) = self.mixer.take() {
            mixer.stop_all();
        }
        self.pending_hit = false;
        self.cached_direction = None;
        debug!("Chaser disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::obstacles::{Aabb, BlockObstacle, ObstacleKind, ObstacleManager};

    const DT: f32 = 1.0 / 60.0;

    fn ready_chaser(position: Vec3, config: ChaserConfig) -> Chaser {
        let mut chaser = Chaser::new(position, config);
        chaser.attach_clips(ClipLibrary::standard()).unwrap();
        chaser
    }

    fn open_room() -> ObstacleManager {
        ObstacleManager::new(Some(Aabb::new(
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::new(20.0, 10.0, 20.0),
        )))
    }

    fn run(chaser: &mut Chaser, ticks: usize, target: Vec3) -> Vec<ChaserReport> {
        let context = GameContext::default();
        (0..ticks)
            .map(|_| chaser.update(DT, target, None, &context))
            .collect()
    }

    #[test]
    fn test_missing_clip_keeps_chaser_inert() {
        let mut chaser = Chaser::new(Vec3::ZERO, ChaserConfig::default());
        let library = ClipLibrary::from_named([("idle", 2.0), ("mutant-run", 0.8), ("slash", 1.0)]);

        let result = chaser.attach_clips(library);
        assert!(matches!(
            result,
            Err(ChaseError::MissingClip {
                clip: ClipName::JumpAttack
            })
        ));

        let report = chaser.update(DT, Vec3::new(10.0, 0.0, 0.0), None, &GameContext::default());
        assert!(!chaser.is_active());
        assert_eq!(report.displacement, Vec3::ZERO);
        assert_eq!(chaser.position(), Vec3::ZERO);
    }

    #[test]
    fn test_far_target_starts_chase_at_tier_speed() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(20.0, 0.0, 0.0);

        let report = chaser.update(DT, target, None, &GameContext::default());
        assert_eq!(report.state, ChaserState::Chasing);
        assert_eq!(chaser.mixer().unwrap().base_clip(), Some(ClipName::Run));
        assert!((report.displacement.x - 0.6 * 1.3 * DT).abs() < 1e-6);
        assert_eq!(report.displacement.z, 0.0);
    }

    #[test]
    fn test_speed_tiers() {
        let config = ChaserConfig::default();
        assert_eq!(config.speed_multiplier(9.0), 1.3);
        assert_eq!(config.speed_multiplier(8.0), 1.0);
        assert_eq!(config.speed_multiplier(5.0), 1.0);
        assert_eq!(config.speed_multiplier(3.0), 0.75);
    }

    #[test]
    fn test_idle_inside_min_distance_holds_position() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig {
            strategy: ChaserStrategy::Catch(CatchTuning {
                catch_distance: 0.5,
                ..Default::default()
            }),
            ..Default::default()
        });
        let target = Vec3::new(2.0, 0.0, 0.0);

        let reports = run(&mut chaser, 30, target);
        assert!(reports.iter().all(|r| r.state == ChaserState::Idle));
        assert_eq!(chaser.position(), Vec3::ZERO);
        assert_eq!(chaser.yaw(), 0.0);
    }

    #[test]
    fn test_damage_delivered_once_in_contiguous_window() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();

        let first = chaser.update(DT, target, None, &context);
        assert!(first.attack_started.is_some());

        let mut hits = 0;
        let mut open_ticks = 0;
        while chaser.overlay().is_some() {
            chaser.update(DT, target, None, &context);
            if chaser.in_damage_window() {
                open_ticks += 1;
            }
            if chaser.can_deal_damage() {
                hits += 1;
            }
        }

        assert_eq!(hits, 1);
        assert!(open_ticks > 1);
        assert!(chaser.has_dealt_damage());

        // The flag survives the cooldown and clears with the next attack.
        let mut next_attack = None;
        for _ in 0..400 {
            let report = chaser.update(DT, target, None, &context);
            if report.attack_started.is_some() {
                next_attack = report.attack_started;
                break;
            }
            assert!(chaser.has_dealt_damage());
        }
        assert!(next_attack.is_some());
        assert!(!chaser.has_dealt_damage());
    }

    #[test]
    fn test_hit_window_predicate_is_one_interval() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();
        chaser.update(DT, target, None, &context);

        let mut samples = Vec::new();
        while chaser.overlay().is_some() {
            chaser.update(DT, target, None, &context);
            samples.push(chaser.in_damage_window());
        }

        let rising = samples.windows(2).filter(|w| !w[0] && w[1]).count();
        let falling = samples.windows(2).filter(|w| w[0] && !w[1]).count();
        assert!(!samples[0]);
        assert_eq!(rising, 1);
        assert_eq!(falling, 1);
    }

    #[test]
    fn test_no_damage_out_of_reach() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let context = GameContext::default();
        chaser.update(DT, Vec3::new(2.0, 0.0, 0.0), None, &context);

        while chaser.overlay().is_some() {
            chaser.update(DT, Vec3::new(3.6, 0.0, 0.0), None, &context);
            assert!(!chaser.can_deal_damage());
        }
    }

    #[test]
    fn test_lenient_tolerance_catches_skipped_window() {
        let tuning = CombatTuning {
            hit_tolerance: HitTolerance::Lenient,
            ..Default::default()
        };
        let config = ChaserConfig {
            strategy: ChaserStrategy::Combat(tuning),
            ..Default::default()
        };
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();

        let mut strict = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let mut lenient = ready_chaser(Vec3::ZERO, config);
        strict.update(DT, target, None, &context);
        lenient.update(DT, target, None, &context);

        // One slow frame lands at 0.2 of the clip, the next jumps to 0.8.
        for chaser in [&mut strict, &mut lenient] {
            let duration = match chaser.overlay().unwrap() {
                ClipName::Slash => 1.2,
                _ => 1.6,
            };
            chaser.update(duration * 0.2, target, None, &context);
            chaser.update(duration * 0.6, target, None, &context);
        }

        assert!(!strict.can_deal_damage());
        assert!(lenient.can_deal_damage());
    }

    #[test]
    fn test_lenient_hit_lands_when_frame_jumps_past_clip_end() {
        let config = ChaserConfig {
            strategy: ChaserStrategy::Combat(CombatTuning {
                hit_tolerance: HitTolerance::Lenient,
                ..Default::default()
            }),
            ..Default::default()
        };
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();

        let mut strict = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let mut lenient = ready_chaser(Vec3::ZERO, config);
        strict.update(DT, target, None, &context);
        lenient.update(DT, target, None, &context);

        for chaser in [&mut strict, &mut lenient] {
            let duration = match chaser.overlay().unwrap() {
                ClipName::Slash => 1.2,
                _ => 1.6,
            };
            chaser.update(duration * 0.2, target, None, &context);
            chaser.update(duration, target, None, &context);
            assert!(chaser.overlay().is_none());
        }

        assert!(!strict.can_deal_damage());
        assert!(lenient.can_deal_damage());
        assert!(!lenient.can_deal_damage());

        // The pending hit only lasts for the frame the attack ended in.
        let mut late = ready_chaser(Vec3::ZERO, config);
        late.update(DT, target, None, &context);
        let duration = match late.overlay().unwrap() {
            ClipName::Slash => 1.2,
            _ => 1.6,
        };
        late.update(duration * 0.2, target, None, &context);
        late.update(duration, target, None, &context);
        late.update(DT, target, None, &context);
        assert!(!late.can_deal_damage());
    }

    #[test]
    fn test_cooldown_gates_second_attack() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(2.0, 0.0, 0.0);

        // Longest clip is 1.6 s, so 4 s covers one attack plus most of the cooldown.
        let starts = run(&mut chaser, 240, target)
            .iter()
            .filter(|r| r.attack_started.is_some())
            .count();
        assert_eq!(starts, 1);
        assert!(chaser.overlay().is_none());
        assert!(chaser.attack_cooldown() > 0.0);

        let starts = run(&mut chaser, 180, target)
            .iter()
            .filter(|r| r.attack_started.is_some())
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_cooldown_counts_down_monotonically() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();

        while chaser.attack_cooldown() == 0.0 {
            chaser.update(DT, target, None, &context);
        }
        let mut previous = chaser.attack_cooldown();
        for _ in 0..60 {
            chaser.update(DT, target, None, &context);
            assert!(chaser.attack_cooldown() <= previous);
            previous = chaser.attack_cooldown();
        }
    }

    #[test]
    fn test_zero_delta_pauses_everything() {
        let room = open_room();
        let mut chaser = ready_chaser(Vec3::new(-10.0, 0.0, 0.0), ChaserConfig::default());
        let target = Vec3::new(10.0, 0.0, 3.0);
        let context = GameContext::default();

        for _ in 0..20 {
            chaser.update(DT, target, Some(&room), &context);
        }
        let snapshot = (
            chaser.position(),
            chaser.yaw(),
            chaser.attack_cooldown(),
            chaser.path_timer(),
            chaser.state(),
        );

        for _ in 0..50 {
            let report = chaser.update(0.0, target, Some(&room), &context);
            assert_eq!(report.displacement, Vec3::ZERO);
        }
        let frozen = GameContext {
            paused: true,
            ..Default::default()
        };
        for _ in 0..50 {
            chaser.update(DT, target, Some(&room), &frozen);
        }
        chaser.update(f32::NAN, target, Some(&room), &context);
        chaser.update(-1.0, target, Some(&room), &context);

        assert_eq!(
            snapshot,
            (
                chaser.position(),
                chaser.yaw(),
                chaser.attack_cooldown(),
                chaser.path_timer(),
                chaser.state(),
            )
        );
    }

    #[test]
    fn test_pause_mid_attack_keeps_cooldown_and_overlay() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(2.0, 0.0, 0.0);
        let context = GameContext::default();

        while chaser.attack_cooldown() == 0.0 {
            chaser.update(DT, target, None, &context);
        }
        let cooldown = chaser.attack_cooldown();
        for _ in 0..100 {
            let report = chaser.update(0.0, target, None, &context);
            assert!(report.attack_started.is_none());
        }
        assert_eq!(chaser.attack_cooldown(), cooldown);
    }

    #[test]
    fn test_yaw_turns_toward_movement_along_shortest_arc() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        chaser.yaw = 3.0;
        // Target straight down -z, facing yaw PI; shortest arc crosses +PI.
        let target = Vec3::new(0.0, 0.0, -20.0);

        chaser.update(DT, target, None, &GameContext::default());
        let expected = wrap_angle(3.0 + wrap_angle(PI - 3.0) * 0.1);
        assert!((chaser.yaw() - expected).abs() < 1e-5);
        assert!(chaser.yaw() > 3.0);

        run(&mut chaser, 200, target);
        assert!((wrap_angle(chaser.yaw() - PI)).abs() < 1e-3);
    }

    #[test]
    fn test_approach_yaw_wraps() {
        let yaw = approach_yaw(-3.0, 3.0, 0.25);
        // Shortest arc from -3 to 3 is through -PI, about 0.28 rad.
        assert!(yaw < -3.0);
        assert!((yaw + 3.0708).abs() < 1e-3);
        assert!((approach_yaw(1.0, 1.0, 0.1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_catch_strategy_is_terminal() {
        let config = ChaserConfig {
            strategy: ChaserStrategy::Catch(CatchTuning::default()),
            ..Default::default()
        };
        let mut chaser = ready_chaser(Vec3::ZERO, config);
        let context = GameContext::default();

        let far = chaser.update(DT, Vec3::new(6.0, 0.0, 0.0), None, &context);
        assert!(!far.caught);
        assert!(far.attack_started.is_none());

        let caught = chaser.update(DT, Vec3::new(2.0, 0.0, 0.0), None, &context);
        assert!(caught.caught);
        assert_eq!(caught.state, ChaserState::Caught);
        assert_eq!(chaser.overlay(), Some(ClipName::Catch));

        let position = chaser.position();
        for _ in 0..120 {
            let report = chaser.update(DT, Vec3::new(15.0, 0.0, 0.0), None, &context);
            assert!(!report.caught);
            assert_eq!(report.state, ChaserState::Caught);
        }
        assert_eq!(chaser.position(), position);
        assert!(!chaser.can_deal_damage());
    }

    #[test]
    fn test_catch_strategy_requires_catch_clip() {
        let config = ChaserConfig {
            strategy: ChaserStrategy::Catch(CatchTuning::default()),
            ..Default::default()
        };
        let mut chaser = Chaser::new(Vec3::ZERO, config);
        let library = ClipLibrary::from_named([("idle", 2.0), ("mutant-run", 0.8)]);
        assert!(matches!(
            chaser.attach_clips(library),
            Err(ChaseError::MissingClip {
                clip: ClipName::Catch
            })
        ));
    }

    #[test]
    fn test_routes_around_wall_with_pathfinder() {
        let mut room = open_room();
        // Wall between chaser and target, open past z = 6.
        room.add_static_obstacle(BlockObstacle::resting(
            "wall",
            Vec3::new(0.0, 0.0, -7.0),
            Vec3::new(1.0, 4.0, 26.0),
            ObstacleKind::Wall,
        ));
        let mut chaser = ready_chaser(Vec3::new(-4.5, 0.0, 0.5), ChaserConfig::default());
        let target = Vec3::new(4.5, 0.0, 0.5);

        let report = chaser.update(DT, target, Some(&room), &GameContext::default());
        assert!(chaser.pathfinder().is_initialized());
        assert!(report.displacement.z > 0.0);
    }

    #[test]
    fn test_falls_back_to_direct_vector_when_unreachable() {
        let mut room = open_room();
        // Box the target in completely.
        for (center, size) in [
            (Vec3::new(10.0, 0.0, 7.0), Vec3::new(7.0, 2.0, 1.0)),
            (Vec3::new(10.0, 0.0, 13.0), Vec3::new(7.0, 2.0, 1.0)),
            (Vec3::new(7.0, 0.0, 10.0), Vec3::new(1.0, 2.0, 7.0)),
            (Vec3::new(13.0, 0.0, 10.0), Vec3::new(1.0, 2.0, 7.0)),
        ] {
            room.add_static_obstacle(BlockObstacle::resting("pen", center, size, ObstacleKind::Wall));
        }
        let start = Vec3::new(-10.0, 0.0, -10.0);
        let mut chaser = ready_chaser(start, ChaserConfig::default());
        let target = Vec3::new(10.0, 0.0, 10.0);

        let report = chaser.update(DT, target, Some(&room), &GameContext::default());
        let expected = flatten(target - start).normalize();
        assert!(report.displacement.normalize().dot(expected) > 0.999);
    }

    #[test]
    fn test_oversized_room_chases_directly() {
        let room = ObstacleManager::new(Some(Aabb::new(
            Vec3::new(-35000.0, 0.0, -35000.0),
            Vec3::new(35000.0, 10.0, 35000.0),
        )));
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        let target = Vec3::new(10.0, 0.0, 10.0);
        let context = GameContext::default();

        let report = chaser.update(DT, target, Some(&room), &context);
        assert!(!chaser.pathfinder().is_initialized());
        let expected = flatten(target).normalize();
        assert!(report.displacement.normalize().dot(expected) > 0.999);

        let report = chaser.update(DT, target, Some(&room), &context);
        assert!(report.displacement.length() > 0.0);
    }

    #[test]
    fn test_room_clamp_applies_after_movement() {
        let room = ObstacleManager::new(Some(Aabb::new(
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 5.0, 5.0),
        )));
        let mut chaser = ready_chaser(Vec3::new(4.8, 0.0, 0.0), ChaserConfig::default());

        chaser.update(DT, Vec3::new(30.0, 0.0, 0.0), Some(&room), &GameContext::default());
        assert!(chaser.position().x <= 5.0 - 0.51 + 1e-5);
    }

    #[test]
    fn test_missing_environment_snaps_to_floor() {
        let mut chaser = ready_chaser(Vec3::new(0.0, 4.0, 0.0), ChaserConfig::default());
        chaser.update(DT, Vec3::new(10.0, 0.0, 0.0), None, &GameContext::default());

        assert_eq!(chaser.position().y, 0.0);
        assert!(chaser.body().grounded);
    }

    #[test]
    fn test_chaser_rides_moving_platform() {
        let mut room = open_room();
        room.replace_dynamic_obstacles(vec![
            BlockObstacle::new(
                "raft",
                Vec3::new(0.0, 0.25, 0.0),
                Vec3::new(4.0, 0.5, 4.0),
                ObstacleKind::MovingPlatform,
            )
            .with_velocity(Vec3::new(0.0, 0.0, 1.2)),
        ]);
        let mut chaser = ready_chaser(Vec3::new(0.0, 0.51, 0.0), ChaserConfig::default());

        // Target close enough to idle, so only the platform moves the chaser.
        chaser.update(DT, Vec3::new(1.0, 0.5, 0.0), Some(&room), &GameContext::default());
        assert!((chaser.position().z - 1.2 * DT).abs() < 1e-5);
        assert!((chaser.position().y - 0.51).abs() < 1e-5);
    }

    #[test]
    fn test_dispose_stops_animation() {
        let mut chaser = ready_chaser(Vec3::ZERO, ChaserConfig::default());
        run(&mut chaser, 5, Vec3::new(2.0, 0.0, 0.0));
        chaser.dispose();

        assert!(!chaser.is_active());
        assert!(chaser.mixer().is_none());
        let report = chaser.update(DT, Vec3::new(20.0, 0.0, 0.0), None, &GameContext::default());
        assert_eq!(report.displacement, Vec3::ZERO);
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = GameSettings::default();
        settings.chase_mode = ChaseMode::Catch;
        settings.strict_corner_collision = true;

        let config = ChaserConfig::from(&settings);
        assert!(matches!(config.strategy, ChaserStrategy::Catch(t) if t.catch_distance == 2.5));
        assert!(config.collision.strict_corners);
        assert_eq!(config.base_speed, 0.6);
        assert_eq!(config.pathfinding.cell_size, 1.0);
    }
}
