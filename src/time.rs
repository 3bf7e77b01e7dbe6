// Musical time representation
// Positions and durations are measured in ticks (480 per beat) against a
// time signature; tempo only matters when placing ticks on the wall clock.

use std::fmt;

/// Duration or absolute position measured in ticks
pub type Ticks = u64;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 3, 4, 5, 6, 7)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    /// Creates a new time signature
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "Time signature numerator must be > 0");
        assert!(
            denominator.is_power_of_two(),
            "Time signature denominator must be power of 2"
        );
        Self {
            numerator,
            denominator,
        }
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::new(4, 4)
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::new(3, 4)
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::new(6, 8)
    }

    /// Number of beats per bar
    pub fn beats_per_bar(&self) -> u8 {
        self.numerator
    }

    /// Ticks in one full bar
    pub fn ticks_per_bar(&self) -> Ticks {
        self.numerator as Ticks * MusicalTime::TICKS_PER_BEAT
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Tempo in BPM (Beats Per Minute)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    /// BPM must be in range [20.0, 999.0]
    pub fn new(bpm: f64) -> Self {
        assert!(
            (20.0..=999.0).contains(&bpm),
            "BPM must be between 20 and 999"
        );
        Self { bpm }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one tick in seconds
    pub fn tick_duration_seconds(&self) -> f64 {
        self.beat_duration_seconds() / MusicalTime::TICKS_PER_BEAT as f64
    }

    /// Duration of one bar in seconds at given time signature
    pub fn bar_duration_seconds(&self, time_signature: &TimeSignature) -> f64 {
        self.beat_duration_seconds() * time_signature.beats_per_bar() as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Musical position as bars, beats, and ticks
///
/// Bar and beat are zero-based (bar 0, beat 0 is the start of playback),
/// matching the position literals the track configuration uses ("0:2").
/// The tick is the sub-beat subdivision: tick / 480 is the fraction of the
/// beat already elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MusicalTime {
    pub bar: u32,  // Bar number (0-based)
    pub beat: u8,  // Beat within bar (0-based)
    pub tick: u16, // Tick within beat (0..TICKS_PER_BEAT)
}

impl MusicalTime {
    /// Ticks per beat (PPQN - Pulses Per Quarter Note)
    /// Standard MIDI resolution
    pub const TICKS_PER_BEAT: Ticks = 480;

    /// Creates a new musical time position
    pub fn new(bar: u32, beat: u8, tick: u16) -> Self {
        assert!(
            (tick as Ticks) < Self::TICKS_PER_BEAT,
            "Tick must be < 480"
        );
        Self { bar, beat, tick }
    }

    /// Start of playback (bar 0, beat 0, tick 0)
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Fraction of the current beat already elapsed, in [0, 1)
    pub fn subdivision(&self) -> f64 {
        self.tick as f64 / Self::TICKS_PER_BEAT as f64
    }

    /// Convert to total ticks from playback start
    pub fn to_total_ticks(&self, time_signature: &TimeSignature) -> Ticks {
        let ticks_per_bar = time_signature.ticks_per_bar();
        self.bar as Ticks * ticks_per_bar
            + self.beat as Ticks * Self::TICKS_PER_BEAT
            + self.tick as Ticks
    }

    /// Create from total ticks, normalizing beat overflow against the bar
    pub fn from_total_ticks(total_ticks: Ticks, time_signature: &TimeSignature) -> Self {
        let ticks_per_bar = time_signature.ticks_per_bar();

        let bar = total_ticks / ticks_per_bar;
        let remaining = total_ticks % ticks_per_bar;
        let beat = remaining / Self::TICKS_PER_BEAT;
        let tick = remaining % Self::TICKS_PER_BEAT;

        Self::new(bar as u32, beat as u8, tick as u16)
    }

    /// Position `delta` ticks later
    pub fn offset_by(&self, delta: Ticks, time_signature: &TimeSignature) -> Self {
        Self::from_total_ticks(self.to_total_ticks(time_signature) + delta, time_signature)
    }
}

impl Default for MusicalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for MusicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{:03}", self.bar, self.beat, self.tick)
    }
}
