// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;
use core::mem::size_of;

use kurbo::{Rect, Shape};

/// Discriminates the [`PathEffect`] variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathEffectType {
    /// Dashing.
    Dash,
}

/// A transformation applied to geometry before it is stroked or filled.
#[derive(Clone, Debug, PartialEq)]
pub enum PathEffect {
    /// Alternating on and off intervals along the path.
    Dash {
        /// On/off lengths; always an even, non-empty list.
        intervals: Box<[f64]>,
        /// Offset into the pattern at the start of each contour.
        phase: f64,
    },
}

impl PathEffect {
    /// A dash effect, or `None` when the pattern would not draw anything
    /// meaningful: an empty or odd-length list, a negative or non-finite
    /// interval, or a pattern with zero total length.
    pub fn dash(intervals: &[f64], phase: f64) -> Option<Self> {
        if intervals.is_empty() || intervals.len() % 2 != 0 || !phase.is_finite() {
            return None;
        }
        if intervals.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        if intervals.iter().sum::<f64>() <= 0.0 {
            return None;
        }
        Some(Self::Dash {
            intervals: intervals.into(),
            phase,
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> PathEffectType {
        match self {
            Self::Dash { .. } => PathEffectType::Dash,
        }
    }

    /// Bounds of the effect's output geometry given the input bounds.
    ///
    /// Dashing only removes parts of the path, so the input bounds remain a
    /// valid answer. Returns `None` if an effect cannot bound its output.
    pub fn effect_bounds(&self, rect: Rect) -> Option<Rect> {
        match self {
            Self::Dash { .. } => Some(rect),
        }
    }

    /// Whether the effect can split a stroke into pieces with new end caps.
    pub fn adds_caps(&self) -> bool {
        matches!(self, Self::Dash { .. })
    }

    /// Applies the dash pattern to a shape and returns the visible pieces.
    ///
    /// Renderers without native dashing can stroke the result instead.
    pub fn apply(&self, shape: &impl Shape, tolerance: f64) -> kurbo::BezPath {
        match self {
            Self::Dash { intervals, phase } => {
                kurbo::dash(shape.path_elements(tolerance), *phase, intervals).collect()
            }
        }
    }

    /// Approximate footprint, in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Dash { intervals, .. } => size_of::<Self>() + intervals.len() * size_of::<f64>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Line;

    #[test]
    fn invalid_patterns_are_rejected() {
        assert!(PathEffect::dash(&[], 0.0).is_none());
        assert!(PathEffect::dash(&[1.0, 2.0, 3.0], 0.0).is_none());
        assert!(PathEffect::dash(&[0.0, 0.0], 0.0).is_none());
        assert!(PathEffect::dash(&[1.0, -1.0], 0.0).is_none());
    }

    #[test]
    fn dashing_keeps_bounds_and_splits_lines() {
        let dash = PathEffect::dash(&[5.0, 5.0], 0.0).unwrap();
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(dash.effect_bounds(r), Some(r));
        let path = dash.apply(&Line::new((0.0, 0.0), (20.0, 0.0)), 0.1);
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2, "20 units of 5-on/5-off dashes make two segments");
    }
}
