// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::mem::size_of;

use kurbo::{Point, Rect};
use understory_display_effects::Color;

use crate::DisplayListError;

/// How a vertex list is assembled into triangles.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VertexMode {
    /// Every three vertices form a triangle.
    #[default]
    Triangles = 0,
    /// Each vertex after the first two forms a triangle with the previous two.
    TriangleStrip,
    /// Each vertex after the first two forms a triangle with the previous one
    /// and the first.
    TriangleFan,
}

/// An immutable triangle mesh with optional per-vertex attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertices {
    mode: VertexMode,
    positions: Vec<Point>,
    texture_coordinates: Option<Vec<Point>>,
    colors: Option<Vec<Color>>,
    indices: Option<Vec<u16>>,
    bounds: Rect,
}

impl Vertices {
    /// Builds a mesh.
    ///
    /// Texture coordinates and colors, when present, must have one entry per
    /// position. Indices must refer to existing positions.
    pub fn new(
        mode: VertexMode,
        positions: Vec<Point>,
        texture_coordinates: Option<Vec<Point>>,
        colors: Option<Vec<Color>>,
        indices: Option<Vec<u16>>,
    ) -> Result<Self, DisplayListError> {
        let count = positions.len();
        if let Some(len) = texture_coordinates.as_ref().map(Vec::len)
            && len != count
        {
            return Err(DisplayListError::VertexAttributeCount {
                positions: count,
                attribute: len,
            });
        }
        if let Some(len) = colors.as_ref().map(Vec::len)
            && len != count
        {
            return Err(DisplayListError::VertexAttributeCount {
                positions: count,
                attribute: len,
            });
        }
        if let Some(bad) = indices
            .iter()
            .flatten()
            .find(|index| usize::from(**index) >= count)
        {
            return Err(DisplayListError::VertexIndexOutOfRange {
                index: *bad,
                positions: count,
            });
        }
        let bounds = bounds_of(&positions);
        Ok(Self {
            mode,
            positions,
            texture_coordinates,
            colors,
            indices,
            bounds,
        })
    }

    /// Triangle assembly mode.
    pub fn mode(&self) -> VertexMode {
        self.mode
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    /// Per-vertex texture coordinates.
    pub fn texture_coordinates(&self) -> Option<&[Point]> {
        self.texture_coordinates.as_deref()
    }

    /// Per-vertex colors.
    pub fn colors(&self) -> Option<&[Color]> {
        self.colors.as_deref()
    }

    /// Optional index list.
    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    /// Bounds of all positions.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Approximate footprint, in bytes.
    pub fn size(&self) -> usize {
        let per_vertex = size_of::<Point>()
            + self.texture_coordinates.as_ref().map_or(0, |_| size_of::<Point>())
            + self.colors.as_ref().map_or(0, |_| size_of::<Color>());
        size_of::<Self>()
            + per_vertex * self.positions.len()
            + self.indices.as_ref().map_or(0, |i| i.len() * size_of::<u16>())
    }
}

fn bounds_of(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn bounds_cover_every_position() {
        let v = Vertices::new(
            VertexMode::Triangles,
            vec![Point::new(1.0, 5.0), Point::new(4.0, -2.0), Point::new(0.0, 0.0)],
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(v.bounds(), Rect::new(0.0, -2.0, 4.0, 5.0));
    }

    #[test]
    fn mismatched_attributes_are_rejected() {
        let err = Vertices::new(
            VertexMode::Triangles,
            vec![Point::ZERO; 3],
            None,
            Some(vec![Color::RED; 2]),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DisplayListError::VertexAttributeCount {
                positions: 3,
                attribute: 2
            }
        );
        let err = Vertices::new(
            VertexMode::TriangleFan,
            vec![Point::ZERO; 3],
            None,
            None,
            Some(vec![0, 1, 3]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DisplayListError::VertexIndexOutOfRange { index: 3, .. }
        ));
    }
}
