// Preset session wiring - the built-in arrangement end to end

use std::rc::Rc;

use backline::presets;
use backline::{
    Conductor, MusicalTime, OfflineClock, RecordingVoice, Ticks, TimeSignature, TriggerCall,
    Voice, VoiceRegistry,
};

const VOICES: [&str; 5] = ["crash", "hats", "snare", "kick", "bass"];

fn full_registry() -> (VoiceRegistry, Vec<Rc<RecordingVoice>>) {
    let mut registry = VoiceRegistry::new();
    let mut voices = Vec::new();
    for name in VOICES {
        let voice = RecordingVoice::new();
        registry.register(name, Rc::clone(&voice) as Rc<dyn Voice>);
        voices.push(voice);
    }
    (registry, voices)
}

fn total_ticks(at: MusicalTime) -> Ticks {
    at.to_total_ticks(&TimeSignature::four_four())
}

#[test]
fn session_registers_all_tracks() {
    let (registry, _) = full_registry();
    let mut conductor = Conductor::new(OfflineClock::default());

    let ids = presets::session(&mut conductor, &registry).unwrap();
    assert_eq!(ids.len(), 5);
    assert_eq!(conductor.track_count(), 5);
}

#[test]
fn session_plays_eight_bars() {
    let (registry, voices) = full_registry();
    let mut conductor = Conductor::new(OfflineClock::default());
    presets::session(&mut conductor, &registry).unwrap();

    conductor.start_all();
    // One measure lead-in, then eight bars of playback
    conductor.clock_mut().run_bars(9);

    let [crash, hats, snare, kick, bass] = &voices[..] else {
        unreachable!()
    };

    // Crash flourish: eleven notes, once
    assert_eq!(crash.call_count(), 11);

    // Nothing fires before the shared one-measure entry point
    for voice in &voices {
        for call in voice.calls() {
            assert!(total_ticks(call.at()) >= 1920);
        }
    }

    // Hats: every 16th for 8 bars, each a trigger/release pair
    assert_eq!(hats.call_count(), 2 * 16 * 8);

    // Snare: beats 2 and 4 of every bar
    assert_eq!(snare.call_count(), 2 * 2 * 8);

    // Kick: 4 hits per 2-bar figure, pitched (no releases scheduled)
    assert_eq!(kick.call_count(), 4 * 4);
    assert!(kick
        .calls()
        .iter()
        .all(|call| matches!(call, TriggerCall::Note { .. })));

    // Bass: two full 4-bar cycles; the certain downbeats always land,
    // the gated pushes may or may not
    let bass_positions: Vec<Ticks> = bass.calls().iter().map(|c| total_ticks(c.at())).collect();
    assert!(bass.call_count() >= 8);
    assert!(bass.call_count() <= 32);
    for cycle in 0..2u64 {
        for bar in 0..4u64 {
            let downbeat = 1920 + cycle * 4 * 1920 + bar * 1920;
            assert!(
                bass_positions.contains(&downbeat),
                "missing certain downbeat at {}",
                downbeat
            );
        }
    }
}

#[test]
fn session_survives_a_missing_voice() {
    let mut registry = VoiceRegistry::new();
    let mut voices = Vec::new();
    // Everything except the crash voice is ready
    for name in ["hats", "snare", "kick", "bass"] {
        let voice = RecordingVoice::new();
        registry.register(name, Rc::clone(&voice) as Rc<dyn Voice>);
        voices.push(voice);
    }

    let mut conductor = Conductor::new(OfflineClock::default());
    let ids = presets::session(&mut conductor, &registry).unwrap();

    // Crash is excluded; the rest of the session still plays
    assert_eq!(ids.len(), 4);
    assert_eq!(conductor.track_count(), 4);

    conductor.start_all();
    conductor.clock_mut().run_bars(2);
    assert!(voices.iter().all(|voice| voice.call_count() > 0));
}

#[test]
fn stop_all_silences_the_session() {
    let (registry, voices) = full_registry();
    let mut conductor = Conductor::new(OfflineClock::default());
    presets::session(&mut conductor, &registry).unwrap();

    conductor.start_all();
    conductor.clock_mut().run_bars(3);
    let counts: Vec<usize> = voices.iter().map(|v| v.call_count()).collect();
    assert!(counts.iter().sum::<usize>() > 0);

    conductor.stop_all();
    conductor.clock_mut().run_bars(8);
    let after: Vec<usize> = voices.iter().map(|v| v.call_count()).collect();
    assert_eq!(counts, after);
}
