//! Candidate patch poses and their neighborhood generators.

use patch_tracker_types::{Location, Orientation, Time};

use crate::NUM_HYPOTHESES;

/// Translation step of the neighbor hypotheses, in pixels.
pub const DELTA_X: Location = 1.0;
pub const DELTA_Y: Location = 1.0;

/// Rotation step of the neighbor hypotheses: 4 degrees.
pub const DELTA_THETA: Orientation = 4.0 * std::f32::consts::PI / 180.0;

/// A candidate patch pose. `ctheta`/`stheta` are derived from `theta` at
/// construction and never diverge from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hypothesis {
    t: Time,
    x: Location,
    y: Location,
    theta: Orientation,
    ctheta: Orientation,
    stheta: Orientation,
}

impl Hypothesis {
    pub fn new(t: Time, x: Location, y: Location, theta: Orientation) -> Self {
        Self {
            t,
            x,
            y,
            theta,
            ctheta: theta.cos(),
            stheta: theta.sin(),
        }
    }

    pub fn t(&self) -> Time {
        self.t
    }

    pub fn x(&self) -> Location {
        self.x
    }

    pub fn y(&self) -> Location {
        self.y
    }

    pub fn theta(&self) -> Orientation {
        self.theta
    }

    pub fn ctheta(&self) -> Orientation {
        self.ctheta
    }

    pub fn stheta(&self) -> Orientation {
        self.stheta
    }

    /// Refresh the pose time without touching the spatial state.
    pub fn set_t(&mut self, t: Time) {
        self.t = t;
    }

    /// The same pose perturbed by `(dx, dy, dtheta)` at the same `t`, with
    /// freshly computed trig.
    pub fn perturbed(&self, p: &HypothesisPerturbation) -> Hypothesis {
        Hypothesis::new(self.t, self.x + p.dx, self.y + p.dy, self.theta + p.dtheta)
    }
}

/// An incremental pose change `(dx, dy, dtheta)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypothesisPerturbation {
    pub dx: Location,
    pub dy: Location,
    pub dtheta: Orientation,
}

impl HypothesisPerturbation {
    const fn new(dx: Location, dy: Location, dtheta: Orientation) -> Self {
        Self { dx, dy, dtheta }
    }
}

/// Default neighborhood: the null pose, the 8-neighborhood translations,
/// and both rotations. The null perturbation is index 0.
pub const PERTURBATIONS: [HypothesisPerturbation; 11] = [
    HypothesisPerturbation::new(0.0, 0.0, 0.0),
    HypothesisPerturbation::new(DELTA_X, 0.0, 0.0),
    HypothesisPerturbation::new(-DELTA_X, 0.0, 0.0),
    HypothesisPerturbation::new(0.0, DELTA_Y, 0.0),
    HypothesisPerturbation::new(0.0, -DELTA_Y, 0.0),
    HypothesisPerturbation::new(DELTA_X, DELTA_Y, 0.0),
    HypothesisPerturbation::new(-DELTA_X, DELTA_Y, 0.0),
    HypothesisPerturbation::new(-DELTA_X, -DELTA_Y, 0.0),
    HypothesisPerturbation::new(DELTA_X, -DELTA_Y, 0.0),
    HypothesisPerturbation::new(0.0, 0.0, DELTA_THETA),
    HypothesisPerturbation::new(0.0, 0.0, -DELTA_THETA),
];

/// Reduced neighborhood: 4-neighborhood translations plus both rotations.
pub const PERTURBATIONS_4NEIGH: [HypothesisPerturbation; 7] = [
    HypothesisPerturbation::new(0.0, 0.0, 0.0),
    HypothesisPerturbation::new(DELTA_X, 0.0, 0.0),
    HypothesisPerturbation::new(-DELTA_X, 0.0, 0.0),
    HypothesisPerturbation::new(0.0, DELTA_Y, 0.0),
    HypothesisPerturbation::new(0.0, -DELTA_Y, 0.0),
    HypothesisPerturbation::new(0.0, 0.0, DELTA_THETA),
    HypothesisPerturbation::new(0.0, 0.0, -DELTA_THETA),
];

/// The hypothesis set scored by the tracker.
pub type Hypotheses = [Hypothesis; NUM_HYPOTHESES];

/// Apply each perturbation of a table to `center`. The first perturbation
/// is zero, so index 0 of the result is `center` itself.
pub fn generate<const K: usize>(
    center: &Hypothesis,
    perturbations: &[HypothesisPerturbation; K],
) -> [Hypothesis; K] {
    std::array::from_fn(|i| center.perturbed(&perturbations[i]))
}

/// Generate the default hypothesis set around `center`.
pub fn generate_centered(center: &Hypothesis) -> Hypotheses {
    generate(center, &PERTURBATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NULL_HYPOTHESIS_IDX;
    use approx::assert_relative_eq;

    #[test]
    fn trig_cache_matches_theta() {
        let h = Hypothesis::new(1.5, 10.0, 20.0, 0.7);
        assert_relative_eq!(h.ctheta(), 0.7f32.cos(), epsilon = 1e-7);
        assert_relative_eq!(h.stheta(), 0.7f32.sin(), epsilon = 1e-7);

        let p = h.perturbed(&HypothesisPerturbation::new(1.0, -1.0, DELTA_THETA));
        assert_relative_eq!(p.ctheta(), (0.7f32 + DELTA_THETA).cos(), epsilon = 1e-7);
        assert_relative_eq!(p.stheta(), (0.7f32 + DELTA_THETA).sin(), epsilon = 1e-7);
        assert_eq!(p.t(), h.t());
        assert_eq!(p.x(), 11.0);
        assert_eq!(p.y(), 19.0);
    }

    #[test]
    fn generated_set_is_centered_with_null_first() {
        let center = Hypothesis::new(0.25, 50.0, 60.0, 0.1);
        let set = generate_centered(&center);
        assert_eq!(set.len(), 11);
        assert_eq!(set[NULL_HYPOTHESIS_IDX], center);
        // Every non-null member differs from the center.
        for h in set.iter().skip(1) {
            assert_ne!(*h, center);
        }
    }

    #[test]
    fn reduced_set_has_seven_members() {
        let center = Hypothesis::new(0.0, 0.0, 0.0, 0.0);
        let set = generate(&center, &PERTURBATIONS_4NEIGH);
        assert_eq!(set.len(), 7);
        assert_eq!(set[0], center);
        // No diagonal translations in the reduced table.
        for h in set.iter() {
            assert!(h.x() == center.x() || h.y() == center.y());
        }
    }
}
