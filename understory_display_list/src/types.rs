// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small value types carried by display list records.

use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _; // for `sin_cos`
use kurbo::{Affine, Point, Rect};

pub use kurbo::{Cap as StrokeCap, Join as StrokeJoin};

/// Whether geometry is filled, stroked, or both.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawStyle {
    /// Fill the interior.
    #[default]
    Fill = 0,
    /// Stroke the outline.
    Stroke,
    /// Fill the interior and stroke the outline.
    StrokeAndFill,
}

impl DrawStyle {
    /// Decodes a style from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Fill),
            1 => Some(Self::Stroke),
            2 => Some(Self::StrokeAndFill),
            _ => None,
        }
    }
}

/// How a clip shape combines with the current clip.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClipOp {
    /// Keep only what is inside the shape.
    #[default]
    Intersect,
    /// Remove what is inside the shape.
    Difference,
}

/// How `draw_points` interprets its point list.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointMode {
    /// Each point is drawn on its own.
    #[default]
    Points = 0,
    /// Each pair of points is a line segment.
    Lines,
    /// The points form an open polyline.
    Polygon,
}

/// Whether an image-rect draw may sample outside its source rect.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SrcRectConstraint {
    /// Sampling stays inside the source rect.
    #[default]
    Strict = 0,
    /// Sampling may bleed outside the source rect.
    Fast,
}

impl SrcRectConstraint {
    /// Decodes a constraint from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Strict),
            1 => Some(Self::Fast),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Options recorded with a save layer.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SaveLayerOptions: u8 {
        /// The layer is composited using the current paint attributes.
        const RENDERS_WITH_ATTRIBUTES = 1 << 0;
        /// Everything drawn inside the layer can take a group opacity
        /// directly, so the layer's alpha may be distributed to its children.
        ///
        /// The builder sets this when the layer is restored.
        const CAN_DISTRIBUTE_OPACITY = 1 << 1;
    }
}

/// A rotation-scale-translation used to place atlas sprites.
///
/// Maps `(x, y)` to `(scos*x - ssin*y + tx, ssin*x + scos*y + ty)`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RsTransform {
    /// `scale * cos(angle)`.
    pub scos: f64,
    /// `scale * sin(angle)`.
    pub ssin: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl RsTransform {
    /// Builds a transform from its raw components.
    pub const fn new(scos: f64, ssin: f64, tx: f64, ty: f64) -> Self {
        Self { scos, ssin, tx, ty }
    }

    /// A transform that scales and rotates about `anchor` (in sprite space)
    /// and then places the anchor at `(tx, ty)`.
    pub fn from_radians(scale: f64, radians: f64, tx: f64, ty: f64, anchor: Point) -> Self {
        let (s, c) = radians.sin_cos();
        let scos = scale * c;
        let ssin = scale * s;
        Self {
            scos,
            ssin,
            tx: tx - scos * anchor.x + ssin * anchor.y,
            ty: ty - ssin * anchor.x - scos * anchor.y,
        }
    }

    /// The equivalent affine.
    pub fn to_affine(self) -> Affine {
        Affine::new([self.scos, self.ssin, -self.ssin, self.scos, self.tx, self.ty])
    }

    /// The corners of a `width` by `height` sprite after the transform.
    pub fn quad(self, width: f64, height: f64) -> [Point; 4] {
        let affine = self.to_affine();
        [
            affine * Point::new(0.0, 0.0),
            affine * Point::new(width, 0.0),
            affine * Point::new(width, height),
            affine * Point::new(0.0, height),
        ]
    }
}

/// Divisions of an image into stretchable and fixed cells.
///
/// Even-indexed spans (starting from the image edge) are fixed, odd-indexed
/// spans stretch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lattice {
    /// Horizontal division points, in image pixels.
    pub x_divs: Vec<i32>,
    /// Vertical division points, in image pixels.
    pub y_divs: Vec<i32>,
    /// The part of the image the lattice covers; the whole image if `None`.
    pub src: Option<Rect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rs_transform_places_anchor() {
        let xf = RsTransform::from_radians(2.0, 0.0, 10.0, 20.0, Point::new(1.0, 1.0));
        let quad = xf.quad(2.0, 2.0);
        assert_eq!(quad[0], Point::new(8.0, 18.0));
        assert_eq!(quad[2], Point::new(12.0, 22.0));
    }

    #[test]
    fn rs_transform_rotates_like_affine() {
        let xf = RsTransform::new(0.0, 1.0, 0.0, 0.0);
        assert_eq!(xf.to_affine() * Point::new(1.0, 0.0), Point::new(0.0, 1.0));
    }
}
