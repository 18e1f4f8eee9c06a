//! Loading-to-reveal transition.
//!
//! The overlay starts fully opaque. Once loading completes a settle delay
//! runs; when it elapses the progress bar ends and the overlay alpha eases from
//! 1 to 0 over a fixed duration. Time only moves through [`Reveal::advance`],
//! which the frame loop calls with each frame's delta.

use instant::Duration;

use crate::{config::RevealConfig, progress::ProgressBar};

/// Frame deltas above this are treated as a stall.
pub const LAG_THRESHOLD: Duration = Duration::from_millis(500);
/// What a stalled frame advances the clock by.
pub const LAG_STEP: Duration = Duration::from_millis(33);

/// `power1.out` easing: fast start, slow end.
pub fn power1_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    Loading,
    /// Terminal; `since` is the clock reading when loading completed.
    Revealed { since: Duration },
}

#[derive(Clone, Debug)]
pub struct Reveal {
    state: RevealState,
    clock: Duration,
    delay: Duration,
    duration: Duration,
}

impl Reveal {
    pub fn new(config: RevealConfig) -> Self {
        Self {
            state: RevealState::Loading,
            clock: Duration::ZERO,
            delay: config.delay,
            duration: config.duration,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    /// Moves the clock by `dt` and ends `bar` once the settle delay is over.
    /// Returns `true` on the step that ended the bar.
    ///
    /// A stall (startup, a hidden tab) only counts as one nominal frame, so the
    /// delay and the fade are always seen in full.
    pub fn advance(&mut self, dt: Duration, bar: &mut ProgressBar) -> bool {
        self.clock += if dt > LAG_THRESHOLD { LAG_STEP } else { dt };
        if self.is_fading() && !bar.is_ended() {
            bar.finish();
            return true;
        }
        false
    }

    /// Starts the transition. Returns `false` if it had already been
    /// triggered.
    pub fn trigger(&mut self) -> bool {
        match self.state {
            RevealState::Loading => {
                self.state = RevealState::Revealed { since: self.clock };
                log::info!(
                    "Revealing scene in {} ms over {} ms",
                    self.delay.as_millis(),
                    self.duration.as_millis()
                );
                true
            }
            RevealState::Revealed { .. } => false,
        }
    }

    /// Overlay opacity at the current clock reading.
    pub fn alpha(&self) -> f32 {
        let since = match self.state {
            RevealState::Loading => return 1.0,
            RevealState::Revealed { since } => since,
        };
        let elapsed = self.clock.saturating_sub(since);
        if elapsed < self.delay {
            return 1.0;
        }
        if elapsed >= self.delay + self.duration {
            return 0.0;
        }
        let t = (elapsed - self.delay).as_secs_f32() / self.duration.as_secs_f32();
        1.0 - power1_out(t)
    }

    /// Whether the fade has started.
    pub fn is_fading(&self) -> bool {
        match self.state {
            RevealState::Loading => false,
            RevealState::Revealed { since } => self.clock.saturating_sub(since) >= self.delay,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha() == 0.0
    }
}
