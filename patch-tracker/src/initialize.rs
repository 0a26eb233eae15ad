//! Initial event-window fills from a recorded event stream.

use patch_tracker_types::Event;
use tracing::warn;

use crate::errors::{Error, Result};
use crate::tracker::{EventUpdate, HypothesisTracker, TrackerStatus};
use crate::EVENT_WINDOW_SIZE;

fn seed_position<T: HypothesisTracker + ?Sized>(events: &[Event], tracker: &T) -> usize {
    events.partition_point(|event| event.t < tracker.t())
}

/// Feed events forward from the seed time until the tracker initializes.
///
/// The tracker ends up initialized arbitrarily later than the seed,
/// depending on the local event rate. Returns the index of the first
/// unconsumed event.
///
/// Panics if the tracker has already consumed events.
pub fn initialize_tracker_regular<T: HypothesisTracker + ?Sized>(
    events: &[Event],
    tracker: &mut T,
) -> Result<usize> {
    assert_eq!(tracker.status(), TrackerStatus::Uninitialized);
    assert_eq!(tracker.event_counter(), 0);

    let start = seed_position(events, tracker);
    for (idx, event) in events.iter().enumerate().skip(start) {
        if tracker.push_event(event.t, event.x, event.y) == EventUpdate::StateChange {
            return Ok(idx + 1);
        }
    }
    warn!("event stream finished before the tracker initialized");
    Err(Error::EventStreamEnded)
}

/// Feed half an event window from strictly before the seed, then continue
/// forward, so the tracker initializes as close to the seed as the stream
/// allows.
///
/// Exactly `N / 2` in-range events strictly before the seed time are
/// required; with fewer, the fill fails without consuming any event.
/// Returns the index of the first unconsumed event.
///
/// Panics if the tracker has already consumed events.
pub fn initialize_tracker_centered<T: HypothesisTracker + ?Sized>(
    events: &[Event],
    tracker: &mut T,
) -> Result<usize> {
    assert_eq!(tracker.status(), TrackerStatus::Uninitialized);
    assert_eq!(tracker.event_counter(), 0);

    let seed_idx = seed_position(events, tracker);
    let half_window = EVENT_WINDOW_SIZE / 2;

    let mut events_before_seed: Vec<&Event> = Vec::with_capacity(half_window);
    for event in events[..seed_idx].iter().rev() {
        if events_before_seed.len() == half_window {
            break;
        }
        if tracker.is_event_in_range(event.x, event.y) {
            events_before_seed.push(event);
        }
    }
    if events_before_seed.len() != half_window {
        warn!(
            found = events_before_seed.len(),
            required = half_window,
            "not enough events before the seed for centered initialization"
        );
        return Err(Error::NotEnoughEventsBeforeSeed);
    }

    // Collected newest-first; feed in arrival order.
    for event in events_before_seed.iter().rev() {
        let update = tracker.push_event(event.t, event.x, event.y);
        assert_eq!(update, EventUpdate::Initializing);
    }

    for (idx, event) in events.iter().enumerate().skip(seed_idx) {
        if tracker.push_event(event.t, event.x, event.y) == EventUpdate::StateChange {
            return Ok(idx + 1);
        }
    }
    warn!("event stream finished before the tracker initialized");
    Err(Error::EventStreamEnded)
}
