//! Base/overlay animation blending for the chaser model
//!
//! Fades are explicit tracks with an elapsed-time field that is advanced on
//! every tick. A faded-out track is dropped on the tick its fade completes.

use bevy::prelude::*;
use derive_more::Display;
use std::collections::HashMap;

/// Named clips the chaser model is expected to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ClipName {
    #[display("idle")]
    Idle,
    #[display("mutant-run")]
    Run,
    #[display("jump-attack")]
    JumpAttack,
    #[display("slash")]
    Slash,
    #[display("catch")]
    Catch,
}

impl ClipName {
    pub const ALL: [ClipName; 5] = [
        ClipName::Idle,
        ClipName::Run,
        ClipName::JumpAttack,
        ClipName::Slash,
        ClipName::Catch,
    ];

    pub fn is_attack(&self) -> bool {
        matches!(self, ClipName::JumpAttack | ClipName::Slash)
    }

    /// Look a clip up by the name it carries in the model file
    pub fn from_asset_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|clip| clip.to_string() == name)
    }
}

/// Playback properties of a clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipSpec {
    /// Clip length in seconds
    pub duration: f32,
    pub looping: bool,
}

impl ClipSpec {
    pub fn looping(duration: f32) -> Self {
        Self {
            duration,
            looping: true,
        }
    }

    pub fn once(duration: f32) -> Self {
        Self {
            duration,
            looping: false,
        }
    }
}

/// Clips available on a loaded model
#[derive(Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<ClipName, ClipSpec>,
}

impl ClipLibrary {
    /// Clip set shipped with the chaser model
    pub fn standard() -> Self {
        let mut library = Self::default();
        library.insert(ClipName::Idle, ClipSpec::looping(2.0));
        library.insert(ClipName::Run, ClipSpec::looping(0.8));
        library.insert(ClipName::JumpAttack, ClipSpec::once(1.6));
        library.insert(ClipName::Slash, ClipSpec::once(1.2));
        library.insert(ClipName::Catch, ClipSpec::once(2.0));
        library
    }

    /// Build a library from asset clip names; unknown names are skipped
    pub fn from_named<'a>(clips: impl IntoIterator<Item = (&'a str, f32)>) -> Self {
        let mut library = Self::default();
        for (name, duration) in clips {
            match ClipName::from_asset_name(name) {
                Some(clip @ (ClipName::Idle | ClipName::Run)) => {
                    library.insert(clip, ClipSpec::looping(duration))
                }
                Some(clip) => library.insert(clip, ClipSpec::once(duration)),
                None => debug!("Ignoring unknown animation clip '{name}'"),
            }
        }
        library
    }

    pub fn insert(&mut self, clip: ClipName, spec: ClipSpec) {
        self.clips.insert(clip, spec);
    }

    pub fn get(&self, clip: ClipName) -> Option<ClipSpec> {
        self.clips.get(&clip).copied()
    }

    pub fn contains(&self, clip: ClipName) -> bool {
        self.clips.contains_key(&clip)
    }

    /// First clip from `required` that is missing, if any
    pub fn first_missing(&self, required: &[ClipName]) -> Option<ClipName> {
        required.iter().copied().find(|clip| !self.contains(*clip))
    }
}

/// Notifications raised while advancing the mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEvent {
    /// A one-shot overlay reached its end
    Finished(ClipName),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Fade {
    fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        self.weight()
    }

    fn weight(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (self.elapsed / self.duration).min(1.0);
        self.from + (self.to - self.from) * t
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ClipTrack {
    clip: ClipName,
    spec: ClipSpec,
    time: f32,
    previous_time: f32,
    weight: f32,
    fade: Option<Fade>,
    finished: bool,
}

impl ClipTrack {
    fn fade_in(clip: ClipName, spec: ClipSpec, time: f32, duration: f32) -> Self {
        let fade = Fade::new(0.0, 1.0, duration);
        Self {
            clip,
            spec,
            time,
            previous_time: time,
            weight: fade.weight(),
            fade: Some(fade),
            finished: false,
        }
    }

    fn start_fade_out(&mut self, duration: f32) {
        let fade = Fade::new(self.weight, 0.0, duration);
        self.weight = fade.weight();
        self.fade = Some(fade);
    }

    /// Returns true on the tick a one-shot clip reaches its end
    fn advance(&mut self, dt: f32) -> bool {
        self.previous_time = self.time;
        if let Some(fade) = self.fade.as_mut() {
            self.weight = fade.advance(dt);
            if fade.is_complete() {
                self.fade = None;
            }
        }

        if self.spec.looping {
            if self.spec.duration > 0.0 {
                self.time = (self.time + dt) % self.spec.duration;
            }
            return false;
        }

        self.time = (self.time + dt).min(self.spec.duration);
        if !self.finished && self.time >= self.spec.duration && dt > 0.0 {
            self.finished = true;
            return true;
        }
        false
    }

    fn progress(&self, time: f32) -> f32 {
        if self.spec.duration <= 0.0 {
            1.0
        } else {
            time / self.spec.duration
        }
    }

    fn faded_out(&self) -> bool {
        self.fade.is_none() && self.weight <= 0.0
    }
}

/// Two-layer mixer: a looping base clip with an optional one-shot overlay
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    library: ClipLibrary,
    base: Option<ClipTrack>,
    overlay: Option<ClipTrack>,
    fading: Vec<ClipTrack>,
    preserved_run_time: Option<f32>,
}

impl AnimationMixer {
    pub fn new(library: ClipLibrary) -> Self {
        Self {
            library,
            base: None,
            overlay: None,
            fading: Vec::new(),
            preserved_run_time: None,
        }
    }

    pub fn library(&self) -> &ClipLibrary {
        &self.library
    }

    /// Advance clip times and fades; a zero delta only re-evaluates the pose
    pub fn advance(&mut self, dt: f32) -> Vec<ClipEvent> {
        let mut events = Vec::new();

        if let Some(base) = self.base.as_mut() {
            base.advance(dt);
            if base.clip == ClipName::Run {
                self.preserved_run_time = Some(base.time);
            }
        }

        if let Some(overlay) = self.overlay.as_mut() {
            if overlay.advance(dt) {
                events.push(ClipEvent::Finished(overlay.clip));
            }
        }

        for track in &mut self.fading {
            track.advance(dt);
        }
        self.fading.retain(|track| !track.faded_out());

        events
    }

    /// Crossfade the base layer to `clip`; no-op when it already plays
    pub fn fade_to_base(&mut self, clip: ClipName, duration: f32) -> bool {
        let Some(spec) = self.library.get(clip) else {
            warn!("Cannot fade to missing clip '{clip}'");
            return false;
        };
        if self.base_clip() == Some(clip) {
            return false;
        }

        if let Some(mut previous) = self.base.take() {
            if previous.clip == ClipName::Run {
                self.preserved_run_time = Some(previous.time);
            }
            previous.start_fade_out(duration);
            self.fading.push(previous);
        }

        // Running resumes where it left off so the gait does not restart.
        let start_time = match (clip, self.preserved_run_time) {
            (ClipName::Run, Some(time)) => time,
            _ => 0.0,
        };
        self.fading.retain(|track| track.clip != clip);
        self.base = Some(ClipTrack::fade_in(clip, spec, start_time, duration));
        debug!("Base animation: {clip}");
        true
    }

    /// Start a one-shot overlay, fading out any overlay already playing
    pub fn play_overlay(&mut self, clip: ClipName, fade: f32) -> bool {
        let Some(spec) = self.library.get(clip) else {
            warn!("Cannot play missing overlay clip '{clip}'");
            return false;
        };
        if self.overlay_clip() == Some(clip) {
            return false;
        }

        if self.overlay.is_none() {
            if let Some(base) = self.base.as_ref().filter(|base| base.clip == ClipName::Run) {
                self.preserved_run_time = Some(base.time);
            }
        }
        self.fade_out_overlay(fade);

        let spec = ClipSpec::once(spec.duration);
        self.overlay = Some(ClipTrack::fade_in(clip, spec, 0.0, fade));
        true
    }

    pub fn fade_out_overlay(&mut self, duration: f32) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.start_fade_out(duration);
            self.fading.push(overlay);
        }
    }

    pub fn base_clip(&self) -> Option<ClipName> {
        self.base.as_ref().map(|track| track.clip)
    }

    pub fn overlay_clip(&self) -> Option<ClipName> {
        self.overlay.as_ref().map(|track| track.clip)
    }

    /// Normalized playback time of the overlay in `[0, 1]`
    pub fn overlay_progress(&self) -> Option<f32> {
        self.overlay.as_ref().map(|track| track.progress(track.time))
    }

    /// Overlay progress before the most recent advance
    pub fn overlay_previous_progress(&self) -> Option<f32> {
        self.overlay
            .as_ref()
            .map(|track| track.progress(track.previous_time))
    }

    pub fn preserved_run_time(&self) -> Option<f32> {
        self.preserved_run_time
    }

    /// Combined weight of every track playing `clip`
    pub fn weight(&self, clip: ClipName) -> f32 {
        self.base
            .iter()
            .chain(self.overlay.iter())
            .chain(self.fading.iter())
            .filter(|track| track.clip == clip)
            .map(|track| track.weight)
            .sum()
    }

    pub fn active_track_count(&self) -> usize {
        self.base.iter().count() + self.overlay.iter().count() + self.fading.len()
    }

    pub fn stop_all(&mut self) {
        self.base = None;
        self.overlay = None;
        self.fading.clear();
    }
}
