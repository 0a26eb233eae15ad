//! Bilinear scatter/sample primitives over fixed-size patch arrays.
//!
//! Coordinates are patch coordinates with `x` selecting the row and `y` the
//! column. A coordinate is in bounds when `0 <= x < R - 1` and
//! `0 <= y < C - 1`; the strict upper bound keeps the `+1` corner accesses
//! valid. Floors are computed by truncation, which is exact because every
//! in-bounds coordinate is non-negative.

use nalgebra::{Const, MatrixViewMut, SMatrix};

use crate::{Scalar, WindowVector, EVENT_WINDOW_SIZE};

/// Mutable 2x2 view anchored at the integer floor of a patch coordinate.
pub type BlockViewMut<'a, const R: usize, const C: usize> =
    MatrixViewMut<'a, Scalar, Const<2>, Const<2>, Const<1>, Const<R>>;

#[inline]
fn in_bounds<const R: usize, const C: usize>(x: Scalar, y: Scalar) -> bool {
    x >= 0.0 && y >= 0.0 && x < (R - 1) as Scalar && y < (C - 1) as Scalar
}

/// Scatter-add `w` into the four cells surrounding `(x, y)`.
///
/// Returns `true` if the coordinate was in bounds and the addition was
/// applied; out-of-bounds scatters are silent no-ops.
#[inline]
pub fn scatter<const R: usize, const C: usize>(
    mat: &mut SMatrix<Scalar, R, C>,
    x: Scalar,
    y: Scalar,
    w: Scalar,
) -> bool {
    if !in_bounds::<R, C>(x, y) {
        return false;
    }
    let ix = x as usize;
    let iy = y as usize;
    let dx = x - ix as Scalar;
    let dy = y - iy as Scalar;
    let dxdy = dx * dy;

    mat[(ix + 1, iy + 1)] += dxdy * w;
    mat[(ix, iy + 1)] += (dy - dxdy) * w;
    mat[(ix + 1, iy)] += (dx - dxdy) * w;
    mat[(ix, iy)] += (1.0 - dx - dy + dxdy) * w;
    true
}

/// Bilinearly interpolate `mat` at `(x, y)`; 0 if out of bounds.
#[inline]
pub fn sample<const R: usize, const C: usize>(
    mat: &SMatrix<Scalar, R, C>,
    x: Scalar,
    y: Scalar,
) -> Scalar {
    if !in_bounds::<R, C>(x, y) {
        return 0.0;
    }
    let ix = x as usize;
    let iy = y as usize;
    let dx = x - ix as Scalar;
    let dy = y - iy as Scalar;
    let dxdy = dx * dy;

    dxdy * mat[(ix + 1, iy + 1)]
        + (dy - dxdy) * mat[(ix, iy + 1)]
        + (dx - dxdy) * mat[(ix + 1, iy)]
        + (1.0 - dx - dy + dxdy) * mat[(ix, iy)]
}

/// Element-wise [`sample`] over window-parallel coordinate vectors.
///
/// Out-of-bounds elements contribute 0.
#[inline]
pub fn sample_window<const R: usize, const C: usize>(
    mat: &SMatrix<Scalar, R, C>,
    x_vec: &WindowVector,
    y_vec: &WindowVector,
) -> WindowVector {
    let mut out = WindowVector::zeros();
    for i in 0..EVENT_WINDOW_SIZE {
        out[i] = sample(mat, x_vec[i], y_vec[i]);
    }
    out
}

/// The four bilinear weights of `(x, y)` as a 2x2 array, first index the
/// x-offset. Summed, the weights are exactly 1.
#[inline]
pub fn kernel(x: Scalar, y: Scalar) -> SMatrix<Scalar, 2, 2> {
    let ix = x as usize;
    let iy = y as usize;
    let dx = x - ix as Scalar;
    let dy = y - iy as Scalar;
    let dxdy = dx * dy;

    let mut k = SMatrix::<Scalar, 2, 2>::zeros();
    k[(0, 0)] = 1.0 - dx - dy + dxdy;
    k[(1, 0)] = dx - dxdy;
    k[(0, 1)] = dy - dxdy;
    k[(1, 1)] = dxdy;
    k
}

/// Mutable view on the 2x2 block anchored at `(floor(x), floor(y))`.
///
/// The caller must have verified the coordinate is in bounds.
#[inline]
pub fn block_mut<const R: usize, const C: usize>(
    mat: &mut SMatrix<Scalar, R, C>,
    x: Scalar,
    y: Scalar,
) -> BlockViewMut<'_, R, C> {
    mat.fixed_view_mut::<2, 2>(x as usize, y as usize)
}
