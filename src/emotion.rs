//! Timer-gated emotion evolution.
//!
//! Each track holds its displayed emotion for a sampled number of frames.
//! Once that hold expires the emotion gets one chance to move to a nearby
//! label, with a per-label probability; either way the hold restarts.

use std::ops::RangeInclusive;

use serde_derive::Serialize;

use crate::attributes::Emotion;
use crate::rng::RandomSource;

/// Live emotion of one track.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionState {
    pub current: Emotion,
    pub last_change_frame: u64,
    pub stability_duration: u32,
}

/// Likelihood of leaving `emotion` once its hold has expired.
pub fn change_probability(emotion: Emotion) -> f32 {
    match emotion {
        Emotion::Happy => 0.15,
        Emotion::Neutral => 0.25,
        Emotion::Sad => 0.10,
        Emotion::Surprised => 0.40,
        Emotion::Angry => 0.20,
        Emotion::Fear => 0.35,
        Emotion::Disgust => 0.30,
        Emotion::Unknown => 0.0,
    }
}

/// Labels reachable from `emotion` in a single change.
pub fn successors(emotion: Emotion) -> &'static [Emotion] {
    use Emotion::*;

    match emotion {
        Happy => &[Neutral, Surprised],
        Neutral => &[Happy, Sad, Surprised],
        Sad => &[Neutral, Angry],
        Surprised => &[Happy, Neutral, Fear],
        Angry => &[Sad, Neutral, Disgust],
        Fear => &[Surprised, Sad, Neutral],
        Disgust => &[Angry, Neutral],
        Unknown => &[],
    }
}

#[derive(Debug, Clone)]
pub struct EmotionDynamics<R> {
    rng: R,
    stability: RangeInclusive<u32>,
}

impl<R: RandomSource> EmotionDynamics<R> {
    pub fn new(rng: R, stability: RangeInclusive<u32>) -> Self {
        Self { rng, stability }
    }

    fn sample_duration(&mut self) -> u32 {
        self.rng.int_in(self.stability.clone())
    }

    /// Initial state for a track created at `frame_index`.
    pub fn seed(&mut self, baseline: Emotion, frame_index: u64) -> EmotionState {
        EmotionState {
            current: baseline,
            last_change_frame: frame_index,
            stability_duration: self.sample_duration(),
        }
    }

    /// Advances `state` to `frame_index` and returns the emotion to display.
    pub fn step(&mut self, state: &mut EmotionState, frame_index: u64) -> Emotion {
        let held = frame_index.saturating_sub(state.last_change_frame);
        if held < state.stability_duration as u64 {
            return state.current;
        }

        let targets = successors(state.current);
        if targets.is_empty() {
            return state.current;
        }

        if self.rng.uniform() < change_probability(state.current) {
            state.current = targets[self.rng.index(targets.len())];
            state.last_change_frame = frame_index;
            state.stability_duration = self.sample_duration();
        } else {
            // kept; the next draw waits for another full hold
            state.last_change_frame = frame_index;
        }

        state.current
    }
}
