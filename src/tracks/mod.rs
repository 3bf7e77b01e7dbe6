// Track sources - the three pattern-generation strategies
// Each decides fire-or-not per clock tick; none knows about the clock or
// the voices it will eventually drive.

pub mod events;
pub mod pattern;
pub mod steps;

pub use events::{ProbabilisticEventTrack, SequenceEvent};
pub use pattern::{PatternSequence, Step, Traversal};
pub use steps::{StepSequencer, StepTrigger};
