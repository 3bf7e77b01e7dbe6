// ProbabilisticEventTrack - timestamped events gated by independent draws
// The bass-line voice: each event carries a trigger probability evaluated
// once at its instant, every loop iteration, with no retry and no
// memoization across loops.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ScheduleError, ScheduleResult};
use crate::expr::TimeExpr;
use crate::voice::Pitch;

/// One scheduled event: offset from loop start, pitch, length, probability
#[derive(Debug, Clone)]
pub struct SequenceEvent {
    offset: TimeExpr,
    pitch: Pitch,
    length: TimeExpr,
    probability: f64,
}

impl SequenceEvent {
    /// Create an event from literal configuration
    ///
    /// A probability outside [0, 1] is a configuration error and fails
    /// here, before the event can reach a Conductor.
    pub fn new(offset: &str, pitch: &str, length: &str, probability: f64) -> ScheduleResult<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ScheduleError::ProbabilityOutOfRange(probability));
        }

        Ok(Self {
            offset: TimeExpr::parse(offset)?,
            pitch: Pitch::parse(pitch)?,
            length: TimeExpr::parse(length)?,
            probability,
        })
    }

    /// Offset from loop start
    pub fn offset(&self) -> &TimeExpr {
        &self.offset
    }

    /// Pitch triggered when the draw succeeds
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Note length triggered when the draw succeeds
    pub fn length(&self) -> &TimeExpr {
        &self.length
    }

    /// Trigger probability in [0, 1]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

/// A timestamped list of probability-gated events
pub struct ProbabilisticEventTrack {
    events: Vec<SequenceEvent>,
    rng: StdRng,
}

impl ProbabilisticEventTrack {
    /// Create a track over already-validated events
    pub fn new(events: Vec<SequenceEvent>) -> Self {
        assert!(!events.is_empty(), "Event track needs at least one event");

        Self {
            events,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a track with a seeded RNG for deterministic draws
    pub fn seeded(events: Vec<SequenceEvent>, seed: u64) -> Self {
        let mut track = Self::new(events);
        track.rng = StdRng::seed_from_u64(seed);
        track
    }

    /// The configured events
    pub fn events(&self) -> &[SequenceEvent] {
        &self.events
    }

    /// Number of configured events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the event list is empty (never true after construction)
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Evaluate the probability gate for one event
    ///
    /// One independent uniform draw; the decision is final for this cycle.
    pub fn draw(&mut self, index: usize) -> bool {
        let probability = self.events[index].probability;
        self.rng.gen_range(0.0..1.0) < probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let event = SequenceEvent::new("0:2.6666", "C2", "8n", 0.4).unwrap();
        assert_eq!(event.pitch().midi(), 36);
        assert_eq!(event.probability(), 0.4);
    }

    #[test]
    fn test_probability_out_of_range() {
        for p in [1.5, -0.1, f64::NAN] {
            let result = SequenceEvent::new("0:0", "C2", "8n", p);
            assert!(
                matches!(result, Err(ScheduleError::ProbabilityOutOfRange(_))),
                "expected rejection of probability {}",
                p
            );
        }
    }

    #[test]
    fn test_malformed_offset_fails() {
        let result = SequenceEvent::new("zero", "C2", "8n", 1.0);
        assert!(matches!(
            result,
            Err(ScheduleError::InvalidTimeExpression(_))
        ));
    }

    #[test]
    fn test_certain_and_impossible_draws() {
        let events = vec![
            SequenceEvent::new("0:0", "C2", "4n.", 1.0).unwrap(),
            SequenceEvent::new("0:2", "C2", "8n", 0.0).unwrap(),
        ];
        let mut track = ProbabilisticEventTrack::seeded(events, 1);

        for _ in 0..100 {
            assert!(track.draw(0));
            assert!(!track.draw(1));
        }
    }

    #[test]
    fn test_draws_converge_to_probability() {
        let events = vec![SequenceEvent::new("0:0", "C2", "8n", 0.35).unwrap()];
        let mut track = ProbabilisticEventTrack::seeded(events, 42);

        let trials = 2000;
        let fired = (0..trials).filter(|_| track.draw(0)).count();
        let rate = fired as f64 / trials as f64;

        assert!(
            (rate - 0.35).abs() < 0.05,
            "observed rate {} too far from 0.35",
            rate
        );
    }
}
