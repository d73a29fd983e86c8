// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 4x4 transforms with homogeneous rect mapping.

use core::f64::consts::PI;
use core::ops::Mul;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _; // for `sin_cos` and `abs`
use kurbo::{Affine, Point, Rect, Vec2};

/// A 4x4 transform stored in row-major order.
///
/// Points are treated as column vectors `(x, y, 0, 1)`, so the translation
/// lives in the last column and perspective in the last row. Every operation
/// uses the same homogeneous formulas regardless of whether the matrix also
/// fits a 2x3 affine, which keeps results identical for the affine subset.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix {
    m: [f64; 16],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Builds a matrix from 16 row-major values.
    pub const fn from_row_major(m: [f64; 16]) -> Self {
        Self { m }
    }

    /// The 16 row-major values.
    pub const fn as_row_major(&self) -> &[f64; 16] {
        &self.m
    }

    /// The value at `row`, `col`.
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row * 4 + col]
    }

    /// Builds the 2D affine transform
    /// `x' = mxx*x + mxy*y + mxt`, `y' = myx*x + myy*y + myt`.
    pub const fn from_2d_affine(
        mxx: f64,
        mxy: f64,
        mxt: f64,
        myx: f64,
        myy: f64,
        myt: f64,
    ) -> Self {
        Self {
            m: [
                mxx, mxy, 0.0, mxt, //
                myx, myy, 0.0, myt, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Converts a `kurbo` affine.
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::from_2d_affine(a, c, e, b, d, f)
    }

    /// A translation.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::from_2d_affine(1.0, 0.0, tx, 0.0, 1.0, ty)
    }

    /// A scale about the origin.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::from_2d_affine(sx, 0.0, 0.0, 0.0, sy, 0.0)
    }

    /// A clockwise rotation (in a y-down space) about the origin.
    pub fn rotate_degrees(degrees: f64) -> Self {
        let (s, c) = (degrees * (PI / 180.0)).sin_cos();
        Self::from_2d_affine(c, -s, 0.0, s, c, 0.0)
    }

    /// A skew with `x' = x + sx*y` and `y' = sy*x + y`.
    pub const fn skew(sx: f64, sy: f64) -> Self {
        Self::from_2d_affine(1.0, sx, 0.0, sy, 1.0, 0.0)
    }

    /// Returns `self * other`: `other` is applied to points first.
    pub fn concat(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut m = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                m[row * 4 + col] = a[row * 4] * b[col]
                    + a[row * 4 + 1] * b[4 + col]
                    + a[row * 4 + 2] * b[8 + col]
                    + a[row * 4 + 3] * b[12 + col];
            }
        }
        Self { m }
    }

    /// Whether this is exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether every element is finite.
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// Whether mapping a 2D point can produce `w != 1`.
    pub fn has_perspective(&self) -> bool {
        self.m[12] != 0.0 || self.m[13] != 0.0 || self.m[15] != 1.0
    }

    /// Whether the matrix only touches x and y with an affine map.
    pub fn is_2d_affine(&self) -> bool {
        let m = &self.m;
        !self.has_perspective()
            && m[2] == 0.0
            && m[6] == 0.0
            && m[8] == 0.0
            && m[9] == 0.0
            && m[10] == 1.0
            && m[11] == 0.0
            && m[14] == 0.0
    }

    /// Whether the 2D part is at most a scale plus translation.
    pub fn is_scale_translate(&self) -> bool {
        !self.has_perspective() && self.m[1] == 0.0 && self.m[4] == 0.0
    }

    /// Whether the 2D part is a pure translation.
    pub fn is_translate(&self) -> bool {
        self.is_scale_translate() && self.m[0] == 1.0 && self.m[5] == 1.0
    }

    /// The 2D affine part, or `None` if the matrix has perspective.
    pub fn to_affine(&self) -> Option<Affine> {
        if self.has_perspective() {
            return None;
        }
        let m = &self.m;
        Some(Affine::new([m[0], m[4], m[1], m[5], m[3], m[7]]))
    }

    /// Maps a 2D point, dividing by `w`.
    ///
    /// Returns `None` when the point lands at or behind the eye (`w <= 0`).
    pub fn map_point(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let x = m[0] * p.x + m[1] * p.y + m[3];
        let y = m[4] * p.x + m[5] * p.y + m[7];
        let w = m[12] * p.x + m[13] * p.y + m[15];
        if w <= 0.0 {
            return None;
        }
        if w == 1.0 {
            Some(Point::new(x, y))
        } else {
            Some(Point::new(x / w, y / w))
        }
    }

    /// Maps a rect to the bounding box of its four transformed corners.
    ///
    /// Returns `None` if any corner has `w <= 0`.
    pub fn map_rect(&self, rect: Rect) -> Option<Rect> {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        let first = self.map_point(corners[0])?;
        let mut out = Rect::from_points(first, first);
        for corner in &corners[1..] {
            let p = self.map_point(*corner)?;
            out = out.union_pt(p);
        }
        Some(out)
    }

    /// Maps an axis-aligned outset `(dx, dy)` to the device-space outset
    /// that covers it, using the absolute values of the 2x2 linear part.
    ///
    /// Returns `None` for matrices with perspective.
    pub fn map_outset(&self, dx: f64, dy: f64) -> Option<Vec2> {
        if self.has_perspective() {
            return None;
        }
        let m = &self.m;
        Some(Vec2::new(
            dx * m[0].abs() + dy * m[1].abs(),
            dx * m[4].abs() + dy * m[5].abs(),
        ))
    }

    /// The inverse transform, or `None` if the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        if self.is_2d_affine() {
            let affine = self.to_affine()?;
            let det = affine.determinant();
            if det == 0.0 || !det.is_finite() {
                return None;
            }
            return Some(Self::from_affine(affine.inverse()));
        }
        let m = &self.m;
        let mut inv = [0.0; 16];
        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        for v in &mut inv {
            *v *= inv_det;
        }
        Some(Self { m: inv })
    }
}

impl Mul for Matrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.concat(&rhs)
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::ToOwned;

    #[test]
    fn concat_applies_right_operand_first() {
        let m = Matrix::translate(10.0, 10.0) * Matrix::scale(2.0, 2.0);
        let p = m.map_point(Point::new(1.0, 1.0)).unwrap();
        assert_eq!(p, Point::new(12.0, 12.0));
    }

    #[test]
    fn map_rect_matches_kurbo_for_affine() {
        let affine = Affine::rotate(0.3).then_translate(Vec2::new(5.0, -2.0));
        let rect = Rect::new(1.0, 2.0, 30.0, 40.0);
        let ours = Matrix::from_affine(affine).map_rect(rect).unwrap();
        let theirs = affine.transform_rect_bbox(rect);
        assert!((ours.x0 - theirs.x0).abs() < 1e-9, "x0 {ours:?} vs {theirs:?}");
        assert!((ours.y1 - theirs.y1).abs() < 1e-9, "y1 {ours:?} vs {theirs:?}");
    }

    #[test]
    fn perspective_behind_eye_is_unmappable() {
        let mut m = Matrix::IDENTITY.as_row_major().to_owned();
        m[12] = -0.1;
        let m = Matrix::from_row_major(m);
        assert!(m.has_perspective());
        assert!(m.map_rect(Rect::new(0.0, 0.0, 20.0, 20.0)).is_none());
        assert!(m.map_outset(1.0, 1.0).is_none());
    }

    #[test]
    fn invert_round_trips_perspective() {
        let mut values = *Matrix::rotate_degrees(30.0).as_row_major();
        values[12] = 0.001;
        values[3] = 7.0;
        let m = Matrix::from_row_major(values);
        let inv = m.invert().unwrap();
        let p = Point::new(3.0, 4.0);
        let back = inv.map_point(m.map_point(p).unwrap()).unwrap();
        assert!((back - p).hypot() < 1e-9, "round trip drifted to {back:?}");
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Matrix::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn outset_uses_absolute_linear_part() {
        let v = Matrix::rotate_degrees(90.0).map_outset(3.0, 1.0).unwrap();
        assert!((v.x - 1.0).abs() < 1e-9 && (v.y - 3.0).abs() < 1e-9, "{v:?}");
    }
}
