// Conductor - composes tracks onto the shared clock
// Owns every track's lifecycle: validated registration, synchronized
// start (the session convention is one measure after transport start),
// per-track loop boundaries, and stop.

use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::{Clock, ClockCallback, ClockHandle};
use crate::error::ScheduleResult;
use crate::expr::TimeExpr;
use crate::time::{Ticks, TimeSignature};
use crate::tracks::{PatternSequence, ProbabilisticEventTrack, StepSequencer, StepTrigger};
use crate::voice::{Pitch, Voice, VoiceRegistry};

/// Unique identifier for registered tracks
pub type TrackId = u64;

/// Loop behavior of a registered track
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoopConfig {
    /// Play through once
    Once,
    /// Wrap every `bars` measures
    Loop { bars: u32 },
}

/// A track's generation strategy
///
/// Exactly one per track; the Conductor wraps it in shared state so the
/// scheduled callbacks close over their own track, never over globals.
pub enum Source {
    Pattern(PatternSequence),
    Events(ProbabilisticEventTrack),
    Steps(StepSequencer),
}

/// One playable track: a name, a voice registry key, and a source
pub struct Track {
    name: String,
    voice: String,
    source: Source,
}

impl Track {
    /// Track driven by a pattern walk
    pub fn pattern(name: impl Into<String>, voice: impl Into<String>, sequence: PatternSequence) -> Self {
        Self {
            name: name.into(),
            voice: voice.into(),
            source: Source::Pattern(sequence),
        }
    }

    /// Track driven by probability-gated events
    pub fn events(
        name: impl Into<String>,
        voice: impl Into<String>,
        events: ProbabilisticEventTrack,
    ) -> Self {
        Self {
            name: name.into(),
            voice: voice.into(),
            source: Source::Events(events),
        }
    }

    /// Track driven by a step grid
    pub fn steps(name: impl Into<String>, voice: impl Into<String>, grid: StepSequencer) -> Self {
        Self {
            name: name.into(),
            voice: voice.into(),
            source: Source::Steps(grid),
        }
    }

    /// Track name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Voice registry key this track triggers
    pub fn voice(&self) -> &str {
        &self.voice
    }
}

#[derive(Clone, Copy)]
enum ResolvedTrigger {
    OneShot { release: Ticks },
    Note { pitch: Pitch, length: Ticks },
}

struct Registration {
    id: TrackId,
    name: String,
    voice: Rc<dyn Voice>,
    source: Rc<RefCell<Source>>,
    start_offset: Ticks,
    loop_config: LoopConfig,
    handles: Vec<ClockHandle>,
}

/// Owns the full set of tracks and their clock registrations
///
/// Registration validates everything that can fail (time expressions,
/// voice availability); once a track is accepted, playback cannot fail.
/// A rejected track leaves the conductor unchanged.
pub struct Conductor<C: Clock> {
    clock: C,
    time_signature: TimeSignature,
    tracks: Vec<Registration>,
    next_id: TrackId,
    started: bool,
}

impl<C: Clock> Conductor<C> {
    /// Create a conductor over the shared clock
    pub fn new(clock: C) -> Self {
        let time_signature = clock.time_signature();
        Self {
            clock,
            time_signature,
            tracks: Vec::new(),
            next_id: 1,
            started: false,
        }
    }

    /// The underlying clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the underlying clock (e.g., to drive an
    /// `OfflineClock` forward)
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Number of registered tracks
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Whether `start_all` has armed the session
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Register a track, to enter `start_offset` after transport start
    ///
    /// Fails with `InvalidTimeExpression` or `VoiceNotReady`; in either
    /// case the track is not added.
    pub fn add_track(
        &mut self,
        track: Track,
        start_offset: &str,
        loop_config: LoopConfig,
        registry: &VoiceRegistry,
    ) -> ScheduleResult<TrackId> {
        let offset = TimeExpr::parse(start_offset)?;
        let voice = registry.get(track.voice())?;

        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(track = %track.name, id, start_offset, "track registered");

        self.tracks.push(Registration {
            id,
            name: track.name,
            voice,
            source: Rc::new(RefCell::new(track.source)),
            start_offset: offset.to_ticks(&self.time_signature),
            loop_config,
            handles: Vec::new(),
        });

        Ok(id)
    }

    /// Register a track, logging and skipping it on failure
    ///
    /// A track that cannot be registered is excluded from playback; the
    /// rest of the session is unaffected.
    pub fn add_track_or_skip(
        &mut self,
        track: Track,
        start_offset: &str,
        loop_config: LoopConfig,
        registry: &VoiceRegistry,
    ) -> Option<TrackId> {
        let name = track.name().to_string();
        match self.add_track(track, start_offset, loop_config, registry) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(track = %name, error = %err, "track excluded from playback");
                None
            }
        }
    }

    /// Shared handle to a track's source, e.g. to replay a pattern walk
    /// on demand while the session is running
    pub fn source(&self, id: TrackId) -> Option<Rc<RefCell<Source>>> {
        self.tracks
            .iter()
            .find(|reg| reg.id == id)
            .map(|reg| Rc::clone(&reg.source))
    }

    /// Arm every track and place its callbacks on the clock
    ///
    /// Idempotent: a second call while started is a no-op, so no track can
    /// end up with two overlapping trigger streams.
    pub fn start_all(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let clock = &mut self.clock;
        let time_signature = self.time_signature;

        for reg in &mut self.tracks {
            let loop_ticks = match reg.loop_config {
                LoopConfig::Once => None,
                LoopConfig::Loop { bars } => {
                    Some(bars as Ticks * time_signature.ticks_per_bar())
                }
            };

            let handles = match &mut *reg.source.borrow_mut() {
                Source::Pattern(sequence) => {
                    sequence.set_looped(loop_ticks.is_some());
                    sequence.start();
                    let interval = sequence.interval().to_ticks(&time_signature);
                    let note_length = sequence.note_length().to_ticks(&time_signature);

                    let source = Rc::clone(&reg.source);
                    let voice = Rc::clone(&reg.voice);
                    let callback: ClockCallback = Box::new(move |now| {
                        if let Source::Pattern(sequence) = &mut *source.borrow_mut() {
                            if let Some(pitch) = sequence.advance() {
                                voice.trigger(pitch, note_length, now);
                            }
                        }
                    });

                    vec![clock.schedule_repeating(interval, reg.start_offset, callback)]
                }
                Source::Events(track) => {
                    let mut handles = Vec::with_capacity(track.len());
                    for index in 0..track.len() {
                        let event = &track.events()[index];
                        let offset = event.offset().to_ticks(&time_signature);
                        let pitch = event.pitch();
                        let length = event.length().to_ticks(&time_signature);

                        let source = Rc::clone(&reg.source);
                        let voice = Rc::clone(&reg.voice);
                        let callback: ClockCallback = Box::new(move |now| {
                            if let Source::Events(track) = &mut *source.borrow_mut() {
                                if track.draw(index) {
                                    voice.trigger(pitch, length, now);
                                }
                            }
                        });

                        let at = reg.start_offset + offset;
                        let handle = match loop_ticks {
                            Some(interval) => clock.schedule_repeating(interval, at, callback),
                            None => clock.schedule_once(at, callback),
                        };
                        handles.push(handle);
                    }
                    handles
                }
                Source::Steps(grid) => {
                    grid.rewind();
                    let interval = grid.interval().to_ticks(&time_signature);
                    let trigger = match grid.trigger() {
                        StepTrigger::OneShot { release } => ResolvedTrigger::OneShot {
                            release: release.to_ticks(&time_signature),
                        },
                        StepTrigger::Note { pitch, length } => ResolvedTrigger::Note {
                            pitch: *pitch,
                            length: length.to_ticks(&time_signature),
                        },
                    };

                    let source = Rc::clone(&reg.source);
                    let voice = Rc::clone(&reg.voice);
                    let callback: ClockCallback = Box::new(move |now| {
                        if let Source::Steps(grid) = &mut *source.borrow_mut() {
                            if grid.tick() {
                                match trigger {
                                    ResolvedTrigger::OneShot { release } => {
                                        voice.trigger_one_shot(now);
                                        voice.stop_at(now.offset_by(release, &time_signature));
                                    }
                                    ResolvedTrigger::Note { pitch, length } => {
                                        voice.trigger(pitch, length, now);
                                    }
                                }
                            }
                        }
                    });

                    vec![clock.schedule_repeating(interval, reg.start_offset, callback)]
                }
            };

            reg.handles = handles;
            tracing::debug!(track = %reg.name, "track armed");
        }
    }

    /// Cancel every outstanding callback and disarm all sources
    ///
    /// Takes effect no later than each track's next scheduled tick; an
    /// already-dispatched trigger is not recalled.
    pub fn stop_all(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;

        let clock = &mut self.clock;
        for reg in &mut self.tracks {
            for handle in reg.handles.drain(..) {
                clock.cancel(handle);
            }
            if let Source::Pattern(sequence) = &mut *reg.source.borrow_mut() {
                sequence.stop();
            }
        }
    }
}
