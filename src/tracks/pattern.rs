// PatternSequence - ordered pitch walk advanced one step per sub-interval
// The melodic flourish voice: a finite (or cyclic) list of pitches walked
// in a fixed direction, one step per clock tick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ScheduleResult;
use crate::expr::TimeExpr;
use crate::voice::Pitch;

/// One element of a pattern: a pitch to trigger or a rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Note(Pitch),
    Rest,
}

impl Step {
    /// Build a note step from a name such as "C4"
    pub fn note(name: &str) -> ScheduleResult<Self> {
        Ok(Step::Note(Pitch::parse(name)?))
    }
}

/// Walk direction over the step list
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Traversal {
    Up,
    Down,
    UpDown,
    Random,
}

/// An ordered, finite or cyclic sequence of steps
///
/// Advancement only happens while armed. `start` always re-zeroes the walk
/// before checking the run state, so a replay begins at the first step even
/// if the sequence was already running (kept from the source behavior; see
/// DESIGN.md).
pub struct PatternSequence {
    steps: Vec<Step>,
    traversal: Traversal,
    interval: TimeExpr,
    note_length: TimeExpr,
    looped: bool,
    index: usize,
    running: bool,
    rng: StdRng,
}

impl PatternSequence {
    /// Create a sequence walking `steps` in `traversal` order, one step
    /// every `interval`, triggering notes of `note_length`
    pub fn new(
        steps: Vec<Step>,
        traversal: Traversal,
        interval: &str,
        note_length: &str,
    ) -> ScheduleResult<Self> {
        assert!(!steps.is_empty(), "Pattern needs at least one step");

        Ok(Self {
            steps,
            traversal,
            interval: TimeExpr::parse(interval)?,
            note_length: TimeExpr::parse(note_length)?,
            looped: false,
            index: 0,
            running: false,
            rng: StdRng::from_entropy(),
        })
    }

    /// Whether the walk wraps around instead of going idle at the end
    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    /// Seed the RNG used by `Traversal::Random` for deterministic walks
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Interval between steps
    pub fn interval(&self) -> &TimeExpr {
        &self.interval
    }

    /// Length of each triggered note
    pub fn note_length(&self) -> &TimeExpr {
        &self.note_length
    }

    /// Number of configured steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the step list is empty (never true after construction)
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check if the sequence is armed
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Arm the sequence from the first step
    ///
    /// The index re-zeroes unconditionally; arming is guarded so a second
    /// `start` on a running sequence does not produce a second traversal.
    pub fn start(&mut self) {
        self.index = 0;
        if self.running {
            return;
        }
        self.running = true;
    }

    /// Disarm the sequence; a later `start` replays from the first step
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Hook for variant specialization; no behavior in the base sequence
    pub fn reset(&mut self) {}

    /// Advance one tick: yield the current step's pitch and move the walk
    ///
    /// Returns `None` when disarmed or on a rest. A non-looping sequence
    /// disarms itself after the last step of its cycle.
    pub fn advance(&mut self) -> Option<Pitch> {
        if !self.running {
            return None;
        }

        let len = self.steps.len();
        let cycle = match self.traversal {
            Traversal::UpDown if len > 1 => 2 * len - 2,
            _ => len,
        };

        let pos = match self.traversal {
            Traversal::Up => self.index,
            Traversal::Down => len - 1 - self.index,
            Traversal::UpDown => {
                if self.index < len {
                    self.index
                } else {
                    cycle - self.index
                }
            }
            Traversal::Random => self.rng.gen_range(0..len),
        };

        let step = self.steps[pos];

        self.index += 1;
        if self.index >= cycle {
            self.index = 0;
            if !self.looped {
                self.running = false;
            }
        }

        match step {
            Step::Note(pitch) => Some(pitch),
            Step::Rest => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(names: &[&str]) -> Vec<Step> {
        names.iter().map(|n| Step::note(n).unwrap()).collect()
    }

    fn drain(seq: &mut PatternSequence) -> Vec<Option<u8>> {
        let mut out = Vec::new();
        while seq.is_running() {
            out.push(seq.advance().map(|p| p.midi()));
        }
        out
    }

    #[test]
    fn test_up_traversal() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::Up, "32n", "16n").unwrap();

        seq.start();
        assert_eq!(drain(&mut seq), vec![Some(60), Some(62), Some(64)]);
        // Exhausted and disarmed
        assert_eq!(seq.advance(), None);
    }

    #[test]
    fn test_down_traversal() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::Down, "32n", "16n")
                .unwrap();

        seq.start();
        assert_eq!(drain(&mut seq), vec![Some(64), Some(62), Some(60)]);
    }

    #[test]
    fn test_up_down_traversal() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::UpDown, "32n", "16n")
                .unwrap();

        // Up-down visits the ends once per cycle: C D E D
        seq.start();
        assert_eq!(drain(&mut seq), vec![Some(60), Some(62), Some(64), Some(62)]);
    }

    #[test]
    fn test_random_traversal_stays_in_range() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::Random, "32n", "16n")
                .unwrap();
        seq.set_seed(7);
        seq.set_looped(true);

        seq.start();
        for _ in 0..64 {
            let midi = seq.advance().unwrap().midi();
            assert!([60, 62, 64].contains(&midi));
        }
        assert!(seq.is_running());
    }

    #[test]
    fn test_rests_yield_none() {
        let steps = vec![
            Step::note("C4").unwrap(),
            Step::Rest,
            Step::note("E4").unwrap(),
        ];
        let mut seq = PatternSequence::new(steps, Traversal::Up, "32n", "16n").unwrap();

        seq.start();
        assert_eq!(drain(&mut seq), vec![Some(60), None, Some(64)]);
    }

    #[test]
    fn test_replay_resets_to_first_step() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::Up, "32n", "16n").unwrap();

        seq.start();
        assert_eq!(seq.advance().unwrap().midi(), 60);
        assert_eq!(seq.advance().unwrap().midi(), 62);

        // Stop mid-walk, restart: first pitch again
        seq.stop();
        seq.start();
        assert_eq!(seq.advance().unwrap().midi(), 60);
    }

    #[test]
    fn test_double_start_is_guarded() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4", "E4"]), Traversal::Up, "32n", "16n").unwrap();

        seq.start();
        assert_eq!(seq.advance().unwrap().midi(), 60);

        // A second start while running re-zeroes the walk but does not
        // produce a second traversal
        seq.start();
        assert!(seq.is_running());
        assert_eq!(seq.advance().unwrap().midi(), 60);
        assert_eq!(drain(&mut seq), vec![Some(62), Some(64)]);
    }

    #[test]
    fn test_looped_wraps() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4"]), Traversal::Up, "32n", "16n").unwrap();
        seq.set_looped(true);

        seq.start();
        let midis: Vec<u8> = (0..6).map(|_| seq.advance().unwrap().midi()).collect();
        assert_eq!(midis, vec![60, 62, 60, 62, 60, 62]);
        assert!(seq.is_running());
    }

    #[test]
    fn test_invalid_interval_fails_at_construction() {
        let result = PatternSequence::new(notes(&["C4"]), Traversal::Up, "bogus", "16n");
        assert!(result.is_err());
    }

    #[test]
    fn test_reset_is_a_no_op() {
        let mut seq =
            PatternSequence::new(notes(&["C4", "D4"]), Traversal::Up, "32n", "16n").unwrap();
        seq.start();
        seq.advance();
        seq.reset();
        assert!(seq.is_running());
        assert_eq!(seq.advance().unwrap().midi(), 62);
    }
}
