//! Difference scorer: negated squared error between the normalized
//! template and the normalized window model, recomputed from scratch.

use patch_tracker_types::{Location, Orientation, Time};

use crate::event_window::{EventWindow, WindowEvent};
use crate::hypotheses::Hypothesis;
use crate::tracker::{event_window_to_model_unitary, HypothesisTracker, TrackerCore};
use crate::{Patch, Scalar, EVENT_WINDOW_SIZE, NUM_HYPOTHESES, UNITARY_EVENT_WEIGHT};

/// Normalized template minus normalized model for one hypothesis.
///
/// `N * w` is 1 with the uniform weighting, but the factor is kept
/// explicit to mirror the score definition.
pub(crate) fn difference_patch(
    template: &Patch,
    window: &EventWindow,
    hypothesis: &Hypothesis,
) -> Patch {
    let model = event_window_to_model_unitary(window, hypothesis, UNITARY_EVENT_WEIGHT);
    template.unscale(template.sum()) - model / (EVENT_WINDOW_SIZE as Scalar * UNITARY_EVENT_WEIGHT)
}

/// Tracker scoring hypotheses by direct template/model comparison.
pub struct HasteDifferenceTracker {
    core: TrackerCore,
}

impl HasteDifferenceTracker {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        Self {
            core: TrackerCore::new(t, x, y, theta),
        }
    }

    fn score_all_from_scratch(&mut self) {
        for i in 0..NUM_HYPOTHESES {
            let difference = difference_patch(
                &self.core.template,
                &self.core.event_window,
                &self.core.hypotheses[i],
            );
            self.core.scores[i] = -difference.norm_squared();
        }
    }
}

impl HypothesisTracker for HasteDifferenceTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrackerCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "haste-difference"
    }

    fn update_template(&mut self) {
        self.update_template_with_middle_event(UNITARY_EVENT_WEIGHT);
    }

    fn initialize_hypotheses(&mut self) {
        self.score_all_from_scratch();
    }

    fn update_scores(&mut self, _oldest: &WindowEvent, _newest: &WindowEvent) {
        self.score_all_from_scratch();
    }

    fn event_window_to_model(&self, window: &EventWindow, hypothesis: &Hypothesis) -> Patch {
        event_window_to_model_unitary(window, hypothesis, UNITARY_EVENT_WEIGHT)
    }
}
