//! Fixed-capacity ring buffer of the most recent in-range events.

use patch_tracker_types::{Location, Time};

use crate::{WindowVector, EVENT_WINDOW_SIZE, MIDDLE_EVENT_IDX};

/// One event as retained by the window. Polarity is not used by the
/// tracker and is dropped at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowEvent {
    pub t: Time,
    pub x: Location,
    pub y: Location,
}

/// Ring buffer of exactly [`EVENT_WINDOW_SIZE`] events once filled, with
/// parallel coordinate vectors for vectorized scoring.
#[derive(Debug, Clone)]
pub struct EventWindow {
    times: [Time; EVENT_WINDOW_SIZE],
    xs: WindowVector,
    ys: WindowVector,
    /// Next slot to write; the oldest slot once the window is full.
    next: usize,
    len: usize,
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl EventWindow {
    pub fn new() -> Self {
        Self {
            times: [0.0; EVENT_WINDOW_SIZE],
            xs: WindowVector::zeros(),
            ys: WindowVector::zeros(),
            next: 0,
            len: 0,
        }
    }

    /// Number of events appended so far, saturating at the capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == EVENT_WINDOW_SIZE
    }

    /// Raw slot index of the logically `i`-th event (oldest first).
    fn raw_index(&self, i: usize) -> usize {
        if self.is_full() {
            (self.next + i) % EVENT_WINDOW_SIZE
        } else {
            i
        }
    }

    fn get_raw(&self, raw: usize) -> WindowEvent {
        WindowEvent {
            t: self.times[raw],
            x: self.xs[raw],
            y: self.ys[raw],
        }
    }

    /// Insert the newest event, returning the previous content of the slot
    /// it replaced. The returned event is meaningless until the window has
    /// filled; callers must not consume it before then.
    pub fn append(&mut self, event: WindowEvent) -> WindowEvent {
        let evicted = self.get_raw(self.next);
        self.times[self.next] = event.t;
        self.xs[self.next] = event.x;
        self.ys[self.next] = event.y;
        self.next = (self.next + 1) % EVENT_WINDOW_SIZE;
        if self.len < EVENT_WINDOW_SIZE {
            self.len += 1;
        }
        evicted
    }

    /// The temporally centered event of a full window.
    pub fn middle_event(&self) -> WindowEvent {
        debug_assert!(self.is_full());
        self.get_raw(self.raw_index(MIDDLE_EVENT_IDX))
    }

    /// Event x-coordinates, ordered oldest to newest. Unfilled slots are 0.
    pub fn ex_vec(&self) -> WindowVector {
        WindowVector::from_fn(|i, _| self.xs[self.raw_index(i)])
    }

    /// Event y-coordinates, ordered oldest to newest. Unfilled slots are 0.
    pub fn ey_vec(&self) -> WindowVector {
        WindowVector::from_fn(|i, _| self.ys[self.raw_index(i)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(i: usize) -> WindowEvent {
        WindowEvent {
            t: i as Time,
            x: i as Location,
            y: -(i as Location),
        }
    }

    #[test]
    fn fills_then_evicts_oldest_first() {
        let mut w = EventWindow::new();
        for i in 0..EVENT_WINDOW_SIZE {
            assert_eq!(w.len(), i);
            assert!(!w.is_full());
            w.append(ev(i));
        }
        assert!(w.is_full());

        // The next appends evict 0, 1, 2, ... in order.
        for i in 0..5 {
            let evicted = w.append(ev(EVENT_WINDOW_SIZE + i));
            assert_eq!(evicted, ev(i));
            assert_eq!(w.len(), EVENT_WINDOW_SIZE);
        }
    }

    #[test]
    fn middle_event_tracks_window_advance() {
        let mut w = EventWindow::new();
        for i in 0..EVENT_WINDOW_SIZE {
            w.append(ev(i));
        }
        assert_eq!(w.middle_event(), ev(MIDDLE_EVENT_IDX));

        w.append(ev(EVENT_WINDOW_SIZE));
        assert_eq!(w.middle_event(), ev(MIDDLE_EVENT_IDX + 1));
    }

    #[test]
    fn coordinate_vectors_are_ordered_oldest_to_newest() {
        let mut w = EventWindow::new();
        // Wrap around several times.
        let total = 3 * EVENT_WINDOW_SIZE + 17;
        for i in 0..total {
            w.append(ev(i));
        }
        let xs = w.ex_vec();
        let ys = w.ey_vec();
        let oldest = total - EVENT_WINDOW_SIZE;
        for i in 0..EVENT_WINDOW_SIZE {
            assert_eq!(xs[i], (oldest + i) as Location);
            assert_eq!(ys[i], -((oldest + i) as Location));
        }
    }
}
