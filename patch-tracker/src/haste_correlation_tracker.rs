//! Incremental correlation scorer backed by a per-hypothesis samples
//! stack.

use patch_tracker_types::{Location, Orientation, Time};

use crate::correlation_tracker::gaussian_window_weights;
use crate::event_window::{EventWindow, WindowEvent};
use crate::hypotheses::Hypothesis;
use crate::tracker::{
    event_window_to_model_weighted, patch_location, patch_location_window, HypothesisTracker,
    TrackerCore,
};
use crate::{
    interpolator, Patch, SamplesStack, WindowVector, EVENT_WINDOW_SIZE, MIDDLE_EVENT_IDX,
    NUM_HYPOTHESES,
};

/// Correlation tracker that keeps, for every hypothesis, the template
/// sample of each window event. Between transitions only one stack column
/// changes per event, so scoring reduces to a stack-times-weights product.
pub struct HasteCorrelationTracker {
    core: TrackerCore,
    weights: WindowVector,
    samples_stack: SamplesStack,
}

impl HasteCorrelationTracker {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        Self {
            core: TrackerCore::new(t, x, y, theta),
            weights: gaussian_window_weights(),
            samples_stack: SamplesStack::zeros(),
        }
    }
}

impl HypothesisTracker for HasteCorrelationTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrackerCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "haste-correlation"
    }

    /// Keeps the samples stack aligned with the window: drop the oldest
    /// column, sample the template at the new event under every
    /// hypothesis.
    fn append_event_to_window(&mut self, event: WindowEvent) -> WindowEvent {
        let evicted = self.core.event_window.append(event);

        for j in 1..EVENT_WINDOW_SIZE {
            for i in 0..NUM_HYPOTHESES {
                self.samples_stack[(i, j - 1)] = self.samples_stack[(i, j)];
            }
        }
        for i in 0..NUM_HYPOTHESES {
            let (xp, yp) = patch_location(&self.core.hypotheses[i], event.x, event.y);
            self.samples_stack[(i, EVENT_WINDOW_SIZE - 1)] =
                interpolator::sample(&self.core.template, xp, yp);
        }

        self.core.event_counter += 1;
        evicted
    }

    fn update_template(&mut self) {
        self.update_template_with_middle_event(self.weights[MIDDLE_EVENT_IDX]);
    }

    /// The hypothesis set just changed: rebuild every stack row against the
    /// current template before scoring.
    fn initialize_hypotheses(&mut self) {
        for i in 0..NUM_HYPOTHESES {
            let (xp_vec, yp_vec) = patch_location_window(
                &self.core.hypotheses[i],
                &self.core.event_window.ex_vec(),
                &self.core.event_window.ey_vec(),
            );
            let sampled = interpolator::sample_window(&self.core.template, &xp_vec, &yp_vec);
            for j in 0..EVENT_WINDOW_SIZE {
                self.samples_stack[(i, j)] = sampled[j];
            }
        }
        self.core.scores = self.samples_stack * self.weights;
    }

    fn update_scores(&mut self, _oldest: &WindowEvent, _newest: &WindowEvent) {
        // The stack was already shifted and appended; scoring is a single
        // product against the Gaussian profile.
        self.core.scores = self.samples_stack * self.weights;
    }

    fn event_window_to_model(&self, window: &EventWindow, hypothesis: &Hypothesis) -> Patch {
        event_window_to_model_weighted(window, hypothesis, &self.weights)
    }
}
