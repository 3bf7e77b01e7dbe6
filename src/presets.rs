// Session presets - the built-in backing-track arrangement
// Crash flourish, hi-hats, snare, kick and bass line as data; the caller
// supplies the voices. All tracks enter one measure after transport start
// so the whole session lands together.

use crate::clock::Clock;
use crate::conductor::{Conductor, LoopConfig, Track, TrackId};
use crate::error::ScheduleResult;
use crate::tracks::{
    PatternSequence, ProbabilisticEventTrack, SequenceEvent, Step, StepSequencer, StepTrigger,
    Traversal,
};
use crate::voice::VoiceRegistry;

/// Start offset shared by every preset track
pub const SESSION_START: &str = "1m";

/// Pitches of the crash flourish, walked bottom to top
pub const CRASH_NOTES: [&str; 11] = [
    "C4", "C5", "D4", "D5", "E5", "E5", "C6", "D6", "E6", "F6", "G6",
];

const KICK_SLOTS: [u8; 16] = [1, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1];
const SNARE_SLOTS: [u8; 4] = [0, 1, 0, 1];

fn slots(levels: &[u8]) -> Vec<bool> {
    levels.iter().map(|&level| level == 1).collect()
}

/// Melodic crash flourish: an ascending 32nd-note run of 16th notes,
/// played once per `start` of its pattern
pub fn crash_flourish() -> ScheduleResult<Track> {
    let steps = CRASH_NOTES
        .iter()
        .map(|name| Step::note(name))
        .collect::<ScheduleResult<Vec<Step>>>()?;
    let sequence = PatternSequence::new(steps, Traversal::Up, "32n", "16n")?;
    Ok(Track::pattern("crash", "crash", sequence))
}

/// Hi-hats: every 16th note, full trigger probability, short release
pub fn hi_hats() -> ScheduleResult<Track> {
    let grid = StepSequencer::new(vec![true; 16], "16n", StepTrigger::one_shot("32n")?, 1.0)?;
    Ok(Track::steps("hats", "hats", grid))
}

/// Snare: backbeat on 2 and 4
pub fn snare() -> ScheduleResult<Track> {
    let grid = StepSequencer::new(slots(&SNARE_SLOTS), "4n", StepTrigger::one_shot("4n")?, 1.0)?;
    Ok(Track::steps("snare", "snare", grid))
}

/// Kick: a 16-slot eighth-note figure spanning two measures
pub fn kick() -> ScheduleResult<Track> {
    let grid = StepSequencer::new(slots(&KICK_SLOTS), "8n", StepTrigger::note("C1", "8n")?, 1.0)?;
    Ok(Track::steps("kick", "kick", grid))
}

/// Bass line: a four-measure figure of probability-gated notes
///
/// Downbeats always land (probability 1); the off-beat pushes land with
/// probabilities 0.6 / 0.4 / 0.9, re-drawn every cycle.
pub fn bass_line() -> ScheduleResult<Track> {
    let table: [(&str, &str, &str, f64); 16] = [
        ("0:0", "C2", "4n.", 1.0),
        ("0:2", "C2", "8n", 0.6),
        ("0:2.6666", "C2", "8n", 0.4),
        ("0:3.33333", "C2", "8n", 0.9),
        ("1:0", "C2", "4n.", 1.0),
        ("1:2", "C2", "8n", 0.6),
        ("1:2.6666", "C2", "8n", 0.4),
        ("1:3.33333", "F2", "8n", 0.9),
        ("2:0", "F2", "4n.", 1.0),
        ("2:2", "F2", "8n", 0.6),
        ("2:2.6666", "F2", "8n", 0.4),
        ("2:3.33333", "F2", "8n", 0.9),
        ("3:0", "F2", "4n.", 1.0),
        ("3:2", "F2", "8n", 0.6),
        ("3:2.6666", "F2", "8n", 0.4),
        ("3:3.33333", "F1", "8n", 0.9),
    ];

    let events = table
        .iter()
        .map(|&(offset, pitch, length, probability)| {
            SequenceEvent::new(offset, pitch, length, probability)
        })
        .collect::<ScheduleResult<Vec<SequenceEvent>>>()?;

    Ok(Track::events(
        "bass",
        "bass",
        ProbabilisticEventTrack::new(events),
    ))
}

/// Register the whole session with a conductor
///
/// Tracks whose voices are not ready are logged and excluded; the rest of
/// the session still plays. Returns the ids of the tracks that made it in.
pub fn session<C: Clock>(
    conductor: &mut Conductor<C>,
    registry: &VoiceRegistry,
) -> ScheduleResult<Vec<TrackId>> {
    let tracks = [
        (crash_flourish()?, LoopConfig::Once),
        (hi_hats()?, LoopConfig::Once),
        (snare()?, LoopConfig::Once),
        (kick()?, LoopConfig::Once),
        (bass_line()?, LoopConfig::Loop { bars: 4 }),
    ];

    let mut ids = Vec::new();
    for (track, loop_config) in tracks {
        if let Some(id) = conductor.add_track_or_skip(track, SESSION_START, loop_config, registry)
        {
            ids.push(id);
        }
    }

    Ok(ids)
}
