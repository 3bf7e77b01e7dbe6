// StepSequencer - fixed measure grid driving one voice's on/off trigger
// The drum voices: a slot array walked at a fixed grid interval, with one
// global fire probability applied per tick (not per slot).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ScheduleError, ScheduleResult};
use crate::expr::TimeExpr;
use crate::voice::Pitch;

/// What an active slot fires
#[derive(Debug, Clone)]
pub enum StepTrigger {
    /// Unpitched one-shot with an explicit release offset after the fired
    /// instant, so rapid re-triggering cannot leave a voice stuck open
    OneShot { release: TimeExpr },
    /// Pitched trigger with a fixed note length
    Note { pitch: Pitch, length: TimeExpr },
}

impl StepTrigger {
    /// One-shot trigger released `release` after each fired instant
    pub fn one_shot(release: &str) -> ScheduleResult<Self> {
        Ok(StepTrigger::OneShot {
            release: TimeExpr::parse(release)?,
        })
    }

    /// Pitched trigger from note-name configuration
    pub fn note(pitch: &str, length: &str) -> ScheduleResult<Self> {
        Ok(StepTrigger::Note {
            pitch: Pitch::parse(pitch)?,
            length: TimeExpr::parse(length)?,
        })
    }
}

/// Fixed-size slot grid advanced one slot per grid tick
///
/// The grid interval and slot count are fixed at construction; the cursor
/// wraps at the end of the array, so the grid loops until the track is
/// stopped. Each tick makes exactly one fire decision, never re-evaluated.
pub struct StepSequencer {
    slots: Vec<bool>,
    interval: TimeExpr,
    trigger: StepTrigger,
    fire_probability: f64,
    cursor: usize,
    rng: StdRng,
}

impl StepSequencer {
    /// Create a grid over `slots`, ticking every `interval`
    pub fn new(
        slots: Vec<bool>,
        interval: &str,
        trigger: StepTrigger,
        fire_probability: f64,
    ) -> ScheduleResult<Self> {
        assert!(!slots.is_empty(), "Step grid needs at least one slot");

        if !(0.0..=1.0).contains(&fire_probability) {
            return Err(ScheduleError::ProbabilityOutOfRange(fire_probability));
        }

        Ok(Self {
            slots,
            interval: TimeExpr::parse(interval)?,
            trigger,
            fire_probability,
            cursor: 0,
            rng: StdRng::from_entropy(),
        })
    }

    /// Seed the suppression RNG for deterministic playback
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Grid tick interval
    pub fn interval(&self) -> &TimeExpr {
        &self.interval
    }

    /// What active slots fire
    pub fn trigger(&self) -> &StepTrigger {
        &self.trigger
    }

    /// Global per-tick fire probability
    pub fn fire_probability(&self) -> f64 {
        self.fire_probability
    }

    /// Number of slots in the grid
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Rewind the cursor to the first slot
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Advance one grid tick and decide whether to fire
    ///
    /// The cursor advance and the fire decision are one atomic transition;
    /// a suppressed tick is not retried.
    pub fn tick(&mut self) -> bool {
        let active = self.slots[self.cursor];
        self.cursor = (self.cursor + 1) % self.slots.len();

        active && self.rng.gen_range(0.0..1.0) < self.fire_probability
    }
}
