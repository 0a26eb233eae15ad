//! Incremental difference scorer: maintained per-hypothesis difference
//! patches with 2x2-local score updates.

use patch_tracker_types::{Location, Orientation, Time};

use crate::event_window::{EventWindow, WindowEvent};
use crate::haste_difference_tracker::difference_patch;
use crate::hypotheses::Hypothesis;
use crate::tracker::{
    event_window_to_model_unitary, patch_location, HypothesisTracker, TrackerCore,
};
use crate::{
    interpolator, Patch, Scalar, NUM_HYPOTHESES, PATCH_SIZE, UNITARY_EVENT_WEIGHT,
};

/// Difference tracker that maintains each hypothesis's difference patch
/// across window advances instead of re-rendering the model.
///
/// Bilinear scatter touches only a 2x2 block, so replacing one window
/// event is a constant-size update per hypothesis: remove the block's
/// score contribution, shift the block by the event's kernel, re-apply.
pub struct HasteDifferenceStarTracker {
    core: TrackerCore,
    difference_patches: [Patch; NUM_HYPOTHESES],
}

impl HasteDifferenceStarTracker {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        Self {
            core: TrackerCore::new(t, x, y, theta),
            difference_patches: [Patch::zeros(); NUM_HYPOTHESES],
        }
    }

    /// Fold one event in or out of a difference patch.
    ///
    /// Appending an event adds its bilinear contribution to the model,
    /// which subtracts from `template - model`: `sign = -1`. Evicting is
    /// the inverse: `sign = +1`.
    fn fold_event(
        difference: &mut Patch,
        score: &mut Scalar,
        hypothesis: &Hypothesis,
        event: &WindowEvent,
        sign: Scalar,
    ) {
        let (xp, yp) = patch_location(hypothesis, event.x, event.y);
        let limit = (PATCH_SIZE - 1) as Scalar;
        if xp >= 0.0 && yp >= 0.0 && xp < limit && yp < limit {
            let kernel = interpolator::kernel(xp, yp);
            let mut block = interpolator::block_mut(difference, xp, yp);
            // Remove the block's contribution, update it, re-apply.
            *score += block.norm_squared();
            block += kernel * (sign * UNITARY_EVENT_WEIGHT);
            *score -= block.norm_squared();
        }
    }
}

impl HypothesisTracker for HasteDifferenceStarTracker {
    fn core(&self) -> &TrackerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrackerCore {
        &mut self.core
    }

    fn name(&self) -> &'static str {
        "haste-difference-star"
    }

    fn update_template(&mut self) {
        self.update_template_with_middle_event(UNITARY_EVENT_WEIGHT);
    }

    fn initialize_hypotheses(&mut self) {
        for i in 0..NUM_HYPOTHESES {
            let difference = difference_patch(
                &self.core.template,
                &self.core.event_window,
                &self.core.hypotheses[i],
            );
            self.core.scores[i] = -difference.norm_squared();
            self.difference_patches[i] = difference;
        }
    }

    fn update_scores(&mut self, oldest: &WindowEvent, newest: &WindowEvent) {
        for i in 0..NUM_HYPOTHESES {
            let hypothesis = self.core.hypotheses[i];
            let score = &mut self.core.scores[i];
            let difference = &mut self.difference_patches[i];
            Self::fold_event(difference, score, &hypothesis, newest, -1.0);
            Self::fold_event(difference, score, &hypothesis, oldest, 1.0);
        }
    }

    fn event_window_to_model(&self, window: &EventWindow, hypothesis: &Hypothesis) -> Patch {
        event_window_to_model_unitary(window, hypothesis, UNITARY_EVENT_WEIGHT)
    }
}
