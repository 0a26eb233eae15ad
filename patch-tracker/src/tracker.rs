//! The per-feature hypothesis tracking state machine shared by all
//! tracker variants.

use patch_tracker_types::{Location, Orientation, Time};

use crate::event_window::{EventWindow, WindowEvent};
use crate::hypotheses::{self, Hypotheses, Hypothesis};
use crate::{
    interpolator, Patch, Scalar, ScoreVector, WindowVector, EVENT_WINDOW_SIZE, HYSTERESIS_FACTOR,
    NULL_HYPOTHESIS_IDX, PATCH_SIZE_HALF, TEMPLATE_UPDATE_FACTOR,
};

/// Lifecycle of a tracker: collecting its first full event window, or
/// tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Uninitialized,
    Running,
}

/// Classification of one pushed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventUpdate {
    /// Outside the spatial gate; dropped before reaching the window.
    OutOfRange,
    /// Buffered while the first event window fills.
    Initializing,
    /// Processed without a state transition.
    RegularEvent,
    /// The tracker initialized or transitioned to a new hypothesis.
    StateChange,
}

/// Map an image-plane event into the patch frame of `state`.
///
/// The rotation is applied inverted, taking image-plane offsets into patch
/// coordinates anchored at the top-left corner.
pub fn patch_location(state: &Hypothesis, ex: Location, ey: Location) -> (Scalar, Scalar) {
    let dx = ex - state.x();
    let dy = ey - state.y();
    let half = PATCH_SIZE_HALF as Scalar;
    let xp = dx * state.ctheta() + dy * state.stheta() + half;
    let yp = -dx * state.stheta() + dy * state.ctheta() + half;
    (xp, yp)
}

/// [`patch_location`] applied element-wise to window-parallel vectors.
pub fn patch_location_window(
    state: &Hypothesis,
    ex_vec: &WindowVector,
    ey_vec: &WindowVector,
) -> (WindowVector, WindowVector) {
    let (ctheta, stheta) = (state.ctheta(), state.stheta());
    let half = PATCH_SIZE_HALF as Scalar;
    let xp_vec = WindowVector::from_fn(|i, _| {
        let dx = ex_vec[i] - state.x();
        let dy = ey_vec[i] - state.y();
        dx * ctheta + dy * stheta + half
    });
    let yp_vec = WindowVector::from_fn(|i, _| {
        let dx = ex_vec[i] - state.x();
        let dy = ey_vec[i] - state.y();
        -dx * stheta + dy * ctheta + half
    });
    (xp_vec, yp_vec)
}

/// Render the window into a patch model, every event scattering with the
/// same weight.
pub fn event_window_to_model_unitary(
    window: &EventWindow,
    hypothesis: &Hypothesis,
    weight: Scalar,
) -> Patch {
    let mut model = Patch::zeros();
    let (xp_vec, yp_vec) = patch_location_window(hypothesis, &window.ex_vec(), &window.ey_vec());
    for i in 0..EVENT_WINDOW_SIZE {
        interpolator::scatter(&mut model, xp_vec[i], yp_vec[i], weight);
    }
    model
}

/// Render the window into a patch model with per-event weights.
pub fn event_window_to_model_weighted(
    window: &EventWindow,
    hypothesis: &Hypothesis,
    weights: &WindowVector,
) -> Patch {
    let mut model = Patch::zeros();
    let (xp_vec, yp_vec) = patch_location_window(hypothesis, &window.ex_vec(), &window.ey_vec());
    for i in 0..EVENT_WINDOW_SIZE {
        interpolator::scatter(&mut model, xp_vec[i], yp_vec[i], weights[i]);
    }
    model
}

/// Pick the hypothesis to follow, with hysteresis.
///
/// Scores are normalized by the affine map sending the worst score to 0 and
/// the best to 1; the best hypothesis is selected only when it strictly
/// beats the null hypothesis by more than [`HYSTERESIS_FACTOR`] in
/// normalized units. Ties, including a fully degenerate score vector,
/// select the null hypothesis.
pub fn select_best_hypothesis(scores: &ScoreVector) -> usize {
    let null_score = scores[NULL_HYPOTHESIS_IDX];
    let mut best_idx = NULL_HYPOTHESIS_IDX;
    let mut best_score = null_score;
    let mut worst_score = null_score;
    for (i, &s) in scores.iter().enumerate() {
        if s > best_score {
            best_score = s;
            best_idx = i;
        }
        if s < worst_score {
            worst_score = s;
        }
    }
    if best_score <= worst_score {
        return NULL_HYPOTHESIS_IDX;
    }
    let null_normalized = (null_score - worst_score) / (best_score - worst_score);
    if null_score < best_score && (1.0 - null_normalized) > HYSTERESIS_FACTOR {
        best_idx
    } else {
        NULL_HYPOTHESIS_IDX
    }
}

/// State shared by every tracker variant.
#[derive(Debug, Clone)]
pub struct TrackerCore {
    pub(crate) hypotheses: Hypotheses,
    pub(crate) scores: ScoreVector,
    pub(crate) event_window: EventWindow,
    pub(crate) template: Patch,
    pub(crate) event_counter: usize,
    pub(crate) status: TrackerStatus,
}

impl TrackerCore {
    pub(crate) fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        let null = Hypothesis::new(t, x, y, theta);
        Self {
            hypotheses: [null; crate::NUM_HYPOTHESES],
            scores: ScoreVector::zeros(),
            event_window: EventWindow::new(),
            template: Patch::zeros(),
            event_counter: 0,
            status: TrackerStatus::Uninitialized,
        }
    }

    /// The null hypothesis, i.e. the current tracker state.
    pub fn state(&self) -> &Hypothesis {
        &self.hypotheses[NULL_HYPOTHESIS_IDX]
    }

    pub fn hypotheses(&self) -> &Hypotheses {
        &self.hypotheses
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }
}

/// A per-feature patch tracker.
///
/// Variants implement the four hook methods (and optionally extend
/// [`HypothesisTracker::append_event_to_window`]); the per-event state
/// machine is provided. The trait is object safe, so drivers can hold
/// `Box<dyn HypothesisTracker>`.
pub trait HypothesisTracker {
    fn core(&self) -> &TrackerCore;
    fn core_mut(&mut self) -> &mut TrackerCore;

    /// Human-readable variant name, for logs and recorded output.
    fn name(&self) -> &'static str;

    /// Scatter the current observation into the template.
    fn update_template(&mut self);

    /// Recompute every hypothesis score (and any per-hypothesis caches)
    /// from scratch for the current hypothesis set.
    fn initialize_hypotheses(&mut self);

    /// Refresh hypothesis scores after the window advanced, replacing
    /// `oldest` by `newest`.
    fn update_scores(&mut self, oldest: &WindowEvent, newest: &WindowEvent);

    /// Render an event window under a hypothesis with the variant's
    /// weighting. Pure; also used for visualization.
    fn event_window_to_model(&self, window: &EventWindow, hypothesis: &Hypothesis) -> Patch;

    /// Insert the newest event into the window, returning the evicted
    /// event. Variants maintaining per-event caches extend this.
    fn append_event_to_window(&mut self, event: WindowEvent) -> WindowEvent {
        let core = self.core_mut();
        let evicted = core.event_window.append(event);
        core.event_counter += 1;
        evicted
    }

    fn status(&self) -> TrackerStatus {
        self.core().status
    }

    fn t(&self) -> Time {
        self.core().state().t()
    }

    fn x(&self) -> Location {
        self.core().state().x()
    }

    fn y(&self) -> Location {
        self.core().state().y()
    }

    fn theta(&self) -> Orientation {
        self.core().state().theta()
    }

    /// Total number of events accepted into the window.
    fn event_counter(&self) -> usize {
        self.core().event_counter
    }

    /// Spatial gate: strictly within [`PATCH_SIZE_HALF`] pixels of the
    /// current state.
    fn is_event_in_range(&self, ex: Location, ey: Location) -> bool {
        let dx = ex - self.x();
        let dy = ey - self.y();
        let d2_thresh = (PATCH_SIZE_HALF * PATCH_SIZE_HALF) as Scalar;
        dx * dx + dy * dy < d2_thresh
    }

    /// Read-only window view, for diagnostics and visualization.
    fn event_window(&self) -> &EventWindow {
        &self.core().event_window
    }

    /// Read-only template view, for diagnostics and visualization.
    fn tracker_template(&self) -> &Patch {
        &self.core().template
    }

    /// Feed one event through the state machine.
    fn push_event(&mut self, et: Time, ex: Location, ey: Location) -> EventUpdate {
        if !self.is_event_in_range(ex, ey) {
            return EventUpdate::OutOfRange;
        }

        let newest = WindowEvent {
            t: et,
            x: ex,
            y: ey,
        };
        let oldest = self.append_event_to_window(newest);

        if self.core().status == TrackerStatus::Uninitialized {
            if self.core().event_counter >= EVENT_WINDOW_SIZE {
                self.initialize_tracker();
                return EventUpdate::StateChange;
            }
            return EventUpdate::Initializing;
        }

        self.refresh_hypotheses_time();
        self.update_scores(&oldest, &newest);

        let best_idx = select_best_hypothesis(&self.core().scores);
        let update = if best_idx == NULL_HYPOTHESIS_IDX {
            EventUpdate::RegularEvent
        } else {
            let best = self.core().hypotheses[best_idx];
            self.transition_to_hypothesis(best);
            EventUpdate::StateChange
        };

        // The template update applies on every processed event, including
        // transitions.
        self.update_template();
        update
    }

    /// Replace the hypothesis set with the neighborhood of `hypothesis` and
    /// rebuild all scores and caches.
    fn transition_to_hypothesis(&mut self, hypothesis: Hypothesis) {
        self.core_mut().hypotheses = hypotheses::generate_centered(&hypothesis);
        self.initialize_hypotheses();
    }

    /// Render the initial template from the freshly filled window and start
    /// tracking from the seed pose at the middle-event time.
    fn initialize_tracker(&mut self) {
        let mid_t = self.core().event_window.middle_event().t;
        let initial = Hypothesis::new(mid_t, self.x(), self.y(), self.theta());
        let template = self.event_window_to_model(&self.core().event_window, &initial);
        self.core_mut().template = template;
        self.transition_to_hypothesis(initial);
        self.core_mut().status = TrackerStatus::Running;
        tracing::debug!(
            tracker = self.name(),
            t = mid_t,
            x = initial.x(),
            y = initial.y(),
            theta = initial.theta(),
            "tracker initialized"
        );
    }

    /// Stamp every hypothesis with the window's middle-event time.
    fn refresh_hypotheses_time(&mut self) {
        let t_mid = self.core().event_window.middle_event().t;
        for hypothesis in self.core_mut().hypotheses.iter_mut() {
            hypothesis.set_t(t_mid);
        }
    }

    /// Scatter the window's middle event into the template with
    /// `weight * TEMPLATE_UPDATE_FACTOR`.
    fn update_template_with_middle_event(&mut self, weight: Scalar) {
        let mid = self.core().event_window.middle_event();
        let (xp, yp) = patch_location(self.core().state(), mid.x, mid.y);
        interpolator::scatter(
            &mut self.core_mut().template,
            xp,
            yp,
            weight * TEMPLATE_UPDATE_FACTOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn patch_location_identity_rotation() {
        let state = Hypothesis::new(0.0, 50.0, 60.0, 0.0);
        let (xp, yp) = patch_location(&state, 51.0, 60.0);
        assert_relative_eq!(xp, 16.0, epsilon = 1e-5);
        assert_relative_eq!(yp, 15.0, epsilon = 1e-5);

        let (xp, yp) = patch_location(&state, 50.0, 58.5);
        assert_relative_eq!(xp, 15.0, epsilon = 1e-5);
        assert_relative_eq!(yp, 13.5, epsilon = 1e-5);
    }

    #[test]
    fn patch_location_applies_inverse_rotation() {
        let state = Hypothesis::new(0.0, 0.0, 0.0, std::f32::consts::FRAC_PI_2);
        // An offset of +1 in image x maps to -1 in patch y.
        let (xp, yp) = patch_location(&state, 1.0, 0.0);
        assert_relative_eq!(xp, 15.0, epsilon = 1e-5);
        assert_relative_eq!(yp, 14.0, epsilon = 1e-5);
    }

    #[test]
    fn window_vector_mapping_matches_scalar_mapping() {
        let state = Hypothesis::new(0.0, 12.0, 34.0, 0.3);
        let ex = WindowVector::from_fn(|i, _| 12.0 + (i % 13) as Scalar - 6.0);
        let ey = WindowVector::from_fn(|i, _| 34.0 + (i % 7) as Scalar - 3.0);
        let (xp_vec, yp_vec) = patch_location_window(&state, &ex, &ey);
        for i in (0..EVENT_WINDOW_SIZE).step_by(17) {
            let (xp, yp) = patch_location(&state, ex[i], ey[i]);
            assert_relative_eq!(xp_vec[i], xp, epsilon = 1e-5);
            assert_relative_eq!(yp_vec[i], yp, epsilon = 1e-5);
        }
    }

    #[test]
    fn ties_select_null() {
        let scores = ScoreVector::from_element(0.5);
        assert_eq!(select_best_hypothesis(&scores), NULL_HYPOTHESIS_IDX);
    }

    #[test]
    fn null_at_best_score_is_kept() {
        let mut scores = ScoreVector::from_element(0.0);
        scores[0] = 1.0;
        scores[3] = 1.0; // same as null
        assert_eq!(select_best_hypothesis(&scores), NULL_HYPOTHESIS_IDX);
    }

    #[test]
    fn hysteresis_band_blocks_marginal_winners() {
        // Normalized null score 0.96: margin 0.04, inside the band.
        let mut scores = ScoreVector::from_element(0.0);
        scores[0] = 0.96;
        scores[5] = 1.0;
        assert_eq!(select_best_hypothesis(&scores), NULL_HYPOTHESIS_IDX);

        // Margin 0.06: outside the band, the winner is taken.
        let mut scores = ScoreVector::from_element(0.0);
        scores[0] = 0.94;
        scores[5] = 1.0;
        assert_eq!(select_best_hypothesis(&scores), 5);
    }

    #[test]
    fn negative_scores_select_true_maximum() {
        let mut scores = ScoreVector::from_element(-10.0);
        scores[0] = -5.0;
        scores[7] = -1.0;
        assert_eq!(select_best_hypothesis(&scores), 7);
    }
}
