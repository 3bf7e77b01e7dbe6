// Voice abstraction - trigger contracts for synthesis voices
// The scheduling core owns no audio logic; it only needs something it can
// trigger at a musical position. Voices live in a registry that is built
// once per session and passed by reference, never held in globals.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};
use crate::time::{MusicalTime, Ticks};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch as a MIDI note number (0-127, where 60 = C4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pitch(u8);

impl Pitch {
    /// Creates a pitch from a MIDI note number
    pub fn new(midi: u8) -> Self {
        assert!(midi <= 127, "MIDI pitch must be 0-127");
        Self(midi)
    }

    /// Parse a note name such as "C4", "A#5" or "Db3"
    pub fn parse(name: &str) -> ScheduleResult<Self> {
        let invalid = || ScheduleError::InvalidNoteName(name.to_string());

        let mut chars = name.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let mut semitone: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let octave_str = if let Some(r) = rest.strip_prefix('#') {
            semitone += 1;
            r
        } else if let Some(r) = rest.strip_prefix('b') {
            semitone -= 1;
            r
        } else {
            rest
        };

        let octave = octave_str.parse::<i32>().map_err(|_| invalid())?;
        let midi = (octave + 1) * 12 + semitone;
        if !(0..=127).contains(&midi) {
            return Err(invalid());
        }

        Ok(Self(midi as u8))
    }

    /// MIDI note number
    pub fn midi(&self) -> u8 {
        self.0
    }

    /// The note name (e.g., "C4", "A#5")
    pub fn name(&self) -> String {
        let octave = (self.0 / 12) as i32 - 1;
        let note_index = (self.0 % 12) as usize;
        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}

impl FromStr for Pitch {
    type Err = ScheduleError;

    fn from_str(s: &str) -> ScheduleResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Abstract sound-producing unit
///
/// The scheduler calls these at dispatch time; implementations render the
/// actual audio. Methods take `&self` because all dispatch happens on one
/// cooperative timeline; implementations use interior mutability.
pub trait Voice {
    /// Trigger a pitched note of the given length at a musical position
    fn trigger(&self, pitch: Pitch, length: Ticks, at: MusicalTime);

    /// Trigger an unpitched one-shot (e.g., a sample player) at a position
    fn trigger_one_shot(&self, at: MusicalTime);

    /// Stop whatever is sounding at the given position
    fn stop_at(&self, at: MusicalTime);
}

/// Registry of session voices, keyed by name
///
/// Built once per session and passed by reference to registration calls.
/// A track referencing a name that has not been registered yet fails with
/// `VoiceNotReady` and is excluded from playback.
#[derive(Default)]
pub struct VoiceRegistry {
    voices: HashMap<String, Rc<dyn Voice>>,
}

impl VoiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            voices: HashMap::new(),
        }
    }

    /// Register a voice under a name, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, voice: Rc<dyn Voice>) {
        self.voices.insert(name.into(), voice);
    }

    /// Look up a voice by name
    pub fn get(&self, name: &str) -> ScheduleResult<Rc<dyn Voice>> {
        self.voices
            .get(name)
            .cloned()
            .ok_or_else(|| ScheduleError::VoiceNotReady(name.to_string()))
    }

    /// Check whether a voice is registered
    pub fn contains(&self, name: &str) -> bool {
        self.voices.contains_key(name)
    }

    /// Number of registered voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// A trigger call captured by a `RecordingVoice`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerCall {
    Note {
        pitch: Pitch,
        length: Ticks,
        at: MusicalTime,
    },
    OneShot {
        at: MusicalTime,
    },
    StopAt {
        at: MusicalTime,
    },
}

impl TriggerCall {
    /// The musical position the call was dispatched for
    pub fn at(&self) -> MusicalTime {
        match *self {
            TriggerCall::Note { at, .. } => at,
            TriggerCall::OneShot { at } => at,
            TriggerCall::StopAt { at } => at,
        }
    }
}

/// Voice that records every trigger call instead of producing sound
/// Useful for tests and for dry-running a session offline.
#[derive(Default)]
pub struct RecordingVoice {
    calls: RefCell<Vec<TriggerCall>>,
}

impl RecordingVoice {
    /// Create a new recording voice behind an `Rc` ready for registration
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// All calls captured so far, in dispatch order
    pub fn calls(&self) -> Vec<TriggerCall> {
        self.calls.borrow().clone()
    }

    /// Number of captured calls
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Discard captured calls
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Voice for RecordingVoice {
    fn trigger(&self, pitch: Pitch, length: Ticks, at: MusicalTime) {
        self.calls
            .borrow_mut()
            .push(TriggerCall::Note { pitch, length, at });
    }

    fn trigger_one_shot(&self, at: MusicalTime) {
        self.calls.borrow_mut().push(TriggerCall::OneShot { at });
    }

    fn stop_at(&self, at: MusicalTime) {
        self.calls.borrow_mut().push(TriggerCall::StopAt { at });
    }
}
