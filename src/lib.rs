// Backline - procedural backing-track sequencing
// Decides, per subdivision of musical time, whether each voice fires and
// with what pitch and duration, then routes the trigger to an abstract
// voice. Synthesis and the real-time transport are external collaborators.

pub mod clock;
pub mod conductor;
pub mod error;
pub mod expr;
pub mod presets;
pub mod time;
pub mod tracks;
pub mod voice;

// Re-export commonly used types for convenience
pub use clock::{Clock, ClockCallback, ClockHandle, OfflineClock};
pub use conductor::{Conductor, LoopConfig, Source, Track, TrackId};
pub use error::{ScheduleError, ScheduleResult};
pub use expr::TimeExpr;
pub use time::{MusicalTime, Tempo, Ticks, TimeSignature};
pub use tracks::{
    PatternSequence, ProbabilisticEventTrack, SequenceEvent, Step, StepSequencer, StepTrigger,
    Traversal,
};
pub use voice::{Pitch, RecordingVoice, TriggerCall, Voice, VoiceRegistry};
