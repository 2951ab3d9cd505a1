//! Frame animations over named atlas sprites.
//!
//! An [`AnimationSet`] is built once (in code or from a descriptor) and
//! shared read-only through an `Arc` by every [`SpriteAnimator`] that plays
//! from it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::atlas::{Sprite, SpriteAtlas};
use crate::error::AssetError;

/// Frame duration used when a descriptor omits one, in seconds.
pub const DEFAULT_FRAME_DURATION: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    /// Sprite name in the bound atlas.
    pub sprite: String,
    /// Seconds on screen. Always positive in a registered animation.
    pub duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<AnimationFrame>,
    pub looping: bool,
}

impl Animation {
    /// Empty looping animation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
            looping: true,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_frame(mut self, sprite: impl Into<String>, duration: f32) -> Self {
        self.frames.push(AnimationFrame {
            sprite: sprite.into(),
            duration,
        });
        self
    }

    /// Append one frame per sprite, all with the same duration.
    pub fn with_frames<I, S>(mut self, sprites: I, duration: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames
            .extend(sprites.into_iter().map(|sprite| AnimationFrame {
                sprite: sprite.into(),
                duration,
            }));
        self
    }

    /// Length of one cycle in seconds.
    pub fn total_duration(&self) -> f32 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn validate(&self) -> Result<(), AnimationError> {
        if self.name.is_empty() {
            return Err(AnimationError::EmptyName);
        }
        if self.frames.is_empty() {
            return Err(AnimationError::NoFrames(self.name.clone()));
        }
        if let Some((index, frame)) = self
            .frames
            .iter()
            .enumerate()
            .find(|(_, f)| !(f.duration > 0.0 && f.duration.is_finite()))
        {
            return Err(AnimationError::InvalidDuration {
                animation: self.name.clone(),
                frame: index,
                duration: frame.duration,
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnimationError {
    #[error("animation name is empty")]
    EmptyName,
    #[error("animation '{0}' has no frames")]
    NoFrames(String),
    #[error("animation '{animation}' frame {frame} has invalid duration {duration}")]
    InvalidDuration {
        animation: String,
        frame: usize,
        duration: f32,
    },
}

/// Registry of animations by name.
#[derive(Debug, Clone, Default)]
pub struct AnimationSet {
    animations: BTreeMap<String, Animation>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an animation, replacing one with the same name.
    pub fn insert(&mut self, animation: Animation) -> Result<(), AnimationError> {
        animation.validate()?;
        self.animations.insert(animation.name.clone(), animation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animation> {
        self.animations.values()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| AssetError::io(path, e))?;
        let set = Self::from_json_str(&data)?;
        tracing::info!(path = %path.display(), animations = set.len(), "animations loaded");
        Ok(set)
    }

    /// Parse an `{"animations": {...}}` descriptor.
    ///
    /// Malformed animations and frames are skipped with a warning. Fails
    /// only if the structure is wrong or nothing usable remains.
    pub fn from_json_str(json: &str) -> Result<Self, AssetError> {
        let root: Value = serde_json::from_str(json)?;
        let entries = root
            .get("animations")
            .and_then(Value::as_object)
            .ok_or_else(|| AssetError::Invalid("missing 'animations' object".into()))?;

        let mut set = Self::new();
        for (name, entry) in entries {
            match parse_animation(name, entry) {
                Some(animation) => {
                    if let Err(err) = set.insert(animation) {
                        tracing::warn!(%err, "skipping animation");
                    }
                }
                None => tracing::warn!(animation = %name, "skipping animation without frames"),
            }
        }
        if set.is_empty() {
            return Err(AssetError::Empty("animations"));
        }
        Ok(set)
    }
}

fn parse_animation(name: &str, entry: &Value) -> Option<Animation> {
    let looping = entry.get("loop").and_then(Value::as_bool).unwrap_or(true);
    let frames = entry.get("frames").and_then(Value::as_array)?;

    let mut animation = Animation::new(name).looping(looping);
    for (index, frame) in frames.iter().enumerate() {
        let Some(sprite) = frame.get("sprite").and_then(Value::as_str) else {
            tracing::warn!(animation = name, frame = index, "frame missing sprite name");
            continue;
        };
        let duration = frame
            .get("duration")
            .and_then(Value::as_f64)
            .map_or(DEFAULT_FRAME_DURATION, |d| d as f32);
        if !(duration > 0.0 && duration.is_finite()) {
            tracing::warn!(animation = name, frame = index, duration, "frame duration must be positive");
            continue;
        }
        animation = animation.with_frame(sprite, duration);
    }
    (!animation.is_empty()).then_some(animation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Finished,
}

/// Playback cursor over a shared [`AnimationSet`].
#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    animations: Arc<AnimationSet>,
    atlas: Option<Arc<SpriteAtlas>>,
    current: Option<String>,
    frame: usize,
    timer: f32,
    speed: f32,
    state: PlaybackState,
}

impl SpriteAnimator {
    pub fn new(animations: Arc<AnimationSet>) -> Self {
        Self {
            animations,
            atlas: None,
            current: None,
            frame: 0,
            timer: 0.0,
            speed: 1.0,
            state: PlaybackState::Stopped,
        }
    }

    /// Atlas used to resolve frame sprite names.
    pub fn bind_atlas(&mut self, atlas: Arc<SpriteAtlas>) {
        self.atlas = Some(atlas);
    }

    pub fn animations(&self) -> &AnimationSet {
        &self.animations
    }

    /// Start `name` from its first frame. Unknown names leave playback untouched.
    pub fn play(&mut self, name: &str) {
        if !self.animations.contains(name) {
            tracing::warn!(animation = name, "unknown animation");
            return;
        }
        self.current = Some(name.to_string());
        self.frame = 0;
        self.timer = 0.0;
        self.state = PlaybackState::Playing;
    }

    /// Like [`SpriteAnimator::play`], but keeps an unfinished run of `name` going.
    pub fn play_if_not(&mut self, name: &str) {
        let active = matches!(self.state, PlaybackState::Playing | PlaybackState::Paused);
        if active && self.current.as_deref() == Some(name) {
            return;
        }
        self.play(name);
    }

    pub fn stop(&mut self) {
        self.frame = 0;
        self.timer = 0.0;
        self.state = PlaybackState::Stopped;
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Advance by `dt` seconds scaled by the speed multiplier.
    pub fn update(&mut self, dt: f32) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(animation) = self.current.as_deref().and_then(|n| self.animations.get(n)) else {
            return;
        };

        let mut step = dt * self.speed;
        if !(step.is_finite() && step >= 0.0) {
            tracing::trace!(dt, speed = self.speed, "ignoring animation step");
            return;
        }
        if animation.looping {
            // whole cycles land back on the current frame
            step %= animation.total_duration();
        }
        self.timer = (self.timer + step).min(f32::MAX);
        while let Some(frame) = animation.frames.get(self.frame) {
            if self.timer < frame.duration {
                break;
            }
            self.timer -= frame.duration;
            self.frame += 1;
            if self.frame >= animation.frames.len() {
                if animation.looping {
                    self.frame = 0;
                } else {
                    self.frame = animation.frames.len() - 1;
                    self.state = PlaybackState::Finished;
                    break;
                }
            }
        }
    }

    /// Sprite for the current frame, if an atlas is bound and defines it.
    pub fn current_sprite(&self) -> Option<Sprite> {
        let atlas = self.atlas.as_ref()?;
        atlas.sprite(self.current_sprite_name()?)
    }

    pub fn current_sprite_name(&self) -> Option<&str> {
        let animation = self.animations.get(self.current.as_deref()?)?;
        animation.frames.get(self.frame).map(|f| f.sprite.as_str())
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Time accumulated on the current frame.
    pub fn frame_timer(&self) -> f32 {
        self.timer
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the playback multiplier. Negative and non-finite speeds clamp to 0.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_finite() && speed >= 0.0 {
            speed
        } else {
            tracing::warn!(speed, "invalid animation speed");
            0.0
        };
    }
}
