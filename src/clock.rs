// Clock abstraction and offline implementation
// The transport that actually advances musical time is an external
// collaborator; the core only needs to place callbacks on a schedule
// table. OfflineClock is a deterministic implementation for tests and
// offline rendering.

use crate::time::{MusicalTime, Tempo, Ticks, TimeSignature};

/// Handle to a scheduled callback, used for cancellation
pub type ClockHandle = u64;

/// Callback invoked with the musical position it was due at
pub type ClockCallback = Box<dyn FnMut(MusicalTime)>;

/// The shared musical clock all tracks synchronize to
///
/// Offsets and intervals are in ticks, resolved from time expressions by
/// the caller before scheduling so malformed configuration fails at
/// registration, never at fire time. Registration is serialized through
/// `&mut self`; callbacks must not call back into the clock.
pub trait Clock {
    /// Time signature the clock resolves positions against
    fn time_signature(&self) -> TimeSignature;

    /// Schedule a callback every `interval` ticks, first firing at `start`
    /// ticks after transport start
    fn schedule_repeating(
        &mut self,
        interval: Ticks,
        start: Ticks,
        callback: ClockCallback,
    ) -> ClockHandle;

    /// Schedule a callback to fire once, `at` ticks after transport start
    fn schedule_once(&mut self, at: Ticks, callback: ClockCallback) -> ClockHandle;

    /// Remove a scheduled callback; unknown handles are ignored
    fn cancel(&mut self, handle: ClockHandle);
}

struct Entry {
    handle: ClockHandle,
    due: Ticks,
    interval: Option<Ticks>,
    callback: ClockCallback,
}

/// Deterministic clock driven by explicit `run_until` calls
///
/// Owns the musical context (tempo, time signature) and a schedule table.
/// Entries due in a run window fire in (due, handle) order, so ties fire
/// in registration order; repeating entries re-arm immediately after
/// firing.
pub struct OfflineClock {
    tempo: Tempo,
    time_signature: TimeSignature,
    now: Ticks,
    next_handle: ClockHandle,
    entries: Vec<Entry>,
}

impl OfflineClock {
    /// Create a clock with the given musical context
    pub fn new(tempo: Tempo, time_signature: TimeSignature) -> Self {
        Self {
            tempo,
            time_signature,
            now: 0,
            next_handle: 1,
            entries: Vec::new(),
        }
    }

    /// Current playhead in ticks since transport start
    pub fn now(&self) -> Ticks {
        self.now
    }

    /// Current playhead as a musical position
    pub fn position(&self) -> MusicalTime {
        MusicalTime::from_total_ticks(self.now, &self.time_signature)
    }

    /// Current playhead in seconds at the clock's tempo
    pub fn position_seconds(&self) -> f64 {
        self.now as f64 * self.tempo.tick_duration_seconds()
    }

    /// The clock's tempo
    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    /// Number of outstanding schedule entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Fire everything due in [now, end) in time order, then move the
    /// playhead to `end`
    pub fn run_until(&mut self, end: Ticks) {
        loop {
            let mut next: Option<usize> = None;
            for (i, entry) in self.entries.iter().enumerate() {
                if entry.due >= end {
                    continue;
                }
                match next {
                    None => next = Some(i),
                    Some(j) => {
                        let best = &self.entries[j];
                        if (entry.due, entry.handle) < (best.due, best.handle) {
                            next = Some(i);
                        }
                    }
                }
            }

            let Some(i) = next else {
                break;
            };

            let due = self.entries[i].due;
            self.now = self.now.max(due);
            let position = MusicalTime::from_total_ticks(due, &self.time_signature);
            (self.entries[i].callback)(position);

            match self.entries[i].interval {
                Some(step) => self.entries[i].due = due + step,
                None => {
                    self.entries.remove(i);
                }
            }
        }

        self.now = self.now.max(end);
    }

    /// Run forward by a number of bars from the current playhead
    pub fn run_bars(&mut self, bars: u32) {
        let end = self.now + bars as Ticks * self.time_signature.ticks_per_bar();
        self.run_until(end);
    }

    fn push(&mut self, due: Ticks, interval: Option<Ticks>, callback: ClockCallback) -> ClockHandle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            due,
            interval,
            callback,
        });
        handle
    }
}

impl Default for OfflineClock {
    fn default() -> Self {
        Self::new(Tempo::default(), TimeSignature::default())
    }
}

impl Clock for OfflineClock {
    fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    fn schedule_repeating(
        &mut self,
        interval: Ticks,
        start: Ticks,
        callback: ClockCallback,
    ) -> ClockHandle {
        assert!(interval > 0, "Repeat interval must be > 0");
        self.push(start, Some(interval), callback)
    }

    fn schedule_once(&mut self, at: Ticks, callback: ClockCallback) -> ClockHandle {
        self.push(at, None, callback)
    }

    fn cancel(&mut self, handle: ClockHandle) {
        self.entries.retain(|entry| entry.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<MusicalTime>>>, ClockCallback) {
        let hits: Rc<RefCell<Vec<MusicalTime>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hits);
        let callback: ClockCallback = Box::new(move |at| sink.borrow_mut().push(at));
        (hits, callback)
    }

    #[test]
    fn test_schedule_once() {
        let mut clock = OfflineClock::default();
        let (hits, callback) = recorder();

        clock.schedule_once(480, callback);
        clock.run_until(480);
        assert!(hits.borrow().is_empty()); // end is exclusive

        clock.run_until(481);
        assert_eq!(*hits.borrow(), vec![MusicalTime::new(0, 1, 0)]);
        assert_eq!(clock.entry_count(), 0);
    }

    #[test]
    fn test_schedule_repeating() {
        let mut clock = OfflineClock::default();
        let (hits, callback) = recorder();

        clock.schedule_repeating(480, 0, callback);
        clock.run_until(1920);

        // Fires at 0, 480, 960, 1440; 1920 is outside the window
        assert_eq!(hits.borrow().len(), 4);
        assert_eq!(hits.borrow()[3], MusicalTime::new(0, 3, 0));

        // Next window picks up where the last ended
        clock.run_bars(1);
        assert_eq!(hits.borrow().len(), 8);
    }

    #[test]
    fn test_ties_fire_in_registration_order() {
        let mut clock = OfflineClock::default();
        let order: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

        for tag in [1u8, 2, 3] {
            let sink = Rc::clone(&order);
            clock.schedule_once(100, Box::new(move |_| sink.borrow_mut().push(tag)));
        }

        clock.run_until(200);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_interleaving() {
        let mut clock = OfflineClock::default();
        let (hits, callback) = recorder();

        clock.schedule_repeating(480, 0, callback);
        let (once_hits, once_callback) = recorder();
        clock.schedule_once(700, once_callback);

        clock.run_until(1000);
        assert_eq!(hits.borrow().len(), 3); // 0, 480, 960
        assert_eq!(once_hits.borrow().len(), 1);
        assert!(once_hits.borrow()[0] > hits.borrow()[1]);
    }

    #[test]
    fn test_cancel() {
        let mut clock = OfflineClock::default();
        let (hits, callback) = recorder();

        let handle = clock.schedule_repeating(480, 0, callback);
        clock.run_until(500);
        assert_eq!(hits.borrow().len(), 2);

        clock.cancel(handle);
        clock.run_until(4000);
        assert_eq!(hits.borrow().len(), 2);
        assert_eq!(clock.entry_count(), 0);

        // Cancelling an unknown handle is a no-op
        clock.cancel(999);
    }

    #[test]
    fn test_playhead_and_seconds() {
        let mut clock = OfflineClock::new(Tempo::new(120.0), TimeSignature::four_four());

        clock.run_bars(2);
        assert_eq!(clock.now(), 3840);
        assert_eq!(clock.position(), MusicalTime::new(2, 0, 0));
        // 2 bars of 4/4 at 120 BPM = 4 seconds
        assert!((clock.position_seconds() - 4.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "Repeat interval must be > 0")]
    fn test_zero_interval() {
        let mut clock = OfflineClock::default();
        clock.schedule_repeating(0, 0, Box::new(|_| {}));
    }
}
