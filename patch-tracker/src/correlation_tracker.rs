//! Correlation scorer: Gaussian-weighted template sampling, recomputed
//! from scratch on every event.

use patch_tracker_types::{Location, Orientation, Time};

use crate::event_window::{EventWindow, WindowEvent};
use crate::hypotheses::Hypothesis;
use crate::tracker::{
    event_window_to_model_weighted, patch_location_window, HypothesisTracker, TrackerCore,
};
use crate::{
    interpolator, Patch, Scalar, WindowVector, EVENT_WINDOW_SIZE, MIDDLE_EVENT_IDX, NUM_HYPOTHESES,
};

/// Gaussian weights over window positions, centered on the middle event
/// with `sigma = N / 6`, normalized to sum 1.
pub(crate) fn gaussian_window_weights() -> WindowVector {
    let sigma = EVENT_WINDOW_SIZE as Scalar / 6.0;
    let denom = 2.0 * sigma * sigma;
    let mut weights = WindowVector::from_fn(|i, _| {
        let d = i as Scalar - MIDDLE_EVENT_IDX as Scalar;
        (-(d * d) / denom).exp()
    });
    weights /= weights.sum();
    weights
}

/// The non-incremental baseline tracker.
///
/// Scores every hypothesis by sampling the template at each window event's
/// patch coordinate, weighted by the Gaussian window profile.
pub struct CorrelationTracker {
    core: TrackerCore,
    weights: WindowVector,
}

impl CorrelationTracker {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        Self {
            core: TrackerCore::new(t, x, y, theta),
            weights: gaussian_window_weights(),
        }
    }

    fn hypothesis_score(&self, hypothesis: &Hypothesis) -> Scalar {
        let (xp_vec, yp_vec) = patch_location_window(
            hypothesis,
            &self.core.event_window.ex_vec(),
            &self.core.event_window.ey_vec(),
        );
        let sampled = interpolator::sample_window(&self.core.template, &xp_vec, &yp_vec);
        self.weights.dot(&sampled)
    }

    fn score_all_from_scratch(&mut self) {
        for i in 0..NUM_HYPOTHESES {
            let score = self.hypothesis_score(&self.core.hypotheses[i]);
            self.core.scores[i] = score;
        }
    }
}

impl HypothesisTracker for CorrelationTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrackerCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "correlation"
    }

    fn update_template(&mut self) {
        self.update_template_with_middle_event(self.weights[MIDDLE_EVENT_IDX]);
    }

    fn initialize_hypotheses(&mut self) {
        self.score_all_from_scratch();
    }

    fn update_scores(&mut self, _oldest: &WindowEvent, _newest: &WindowEvent) {
        // Old and new event identities are ignored; scoring restarts from
        // scratch each event.
        self.score_all_from_scratch();
    }

    fn event_window_to_model(&self, window: &EventWindow, hypothesis: &Hypothesis) -> Patch {
        event_window_to_model_weighted(window, hypothesis, &self.weights)
    }
}
