// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::mem::size_of;

use crate::{BlendMode, Color};

/// Discriminates the [`ColorFilter`] variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorFilterType {
    /// Blend a constant color.
    Blend,
    /// A 4x5 color matrix.
    Matrix,
    /// sRGB to linear transfer.
    SrgbToLinearGamma,
    /// Linear to sRGB transfer.
    LinearToSrgbGamma,
}

const IDENTITY_COLOR_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// A per-pixel color transform applied after the color source.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorFilter {
    /// Blends `color` onto each pixel with `mode`.
    Blend {
        /// The constant color.
        color: Color,
        /// How it is blended.
        mode: BlendMode,
    },
    /// Multiplies `(r, g, b, a, 1)` by a row-major 4x5 matrix.
    Matrix([f32; 20]),
    /// Converts sRGB-encoded channels to linear.
    SrgbToLinearGamma,
    /// Converts linear channels to sRGB encoding.
    LinearToSrgbGamma,
}

impl ColorFilter {
    /// A blend filter, or `None` when blending `color` with `mode` can never
    /// change a pixel.
    ///
    /// Source-over with an opaque color is stored as `Src`, which produces
    /// the same pixels.
    pub fn blend(color: Color, mode: BlendMode) -> Option<Self> {
        let mode = match mode {
            BlendMode::Dst => return None,
            BlendMode::SrcOver if color.is_transparent() => return None,
            BlendMode::SrcOver if color.is_opaque() => BlendMode::Src,
            BlendMode::DstOver
            | BlendMode::DstOut
            | BlendMode::SrcATop
            | BlendMode::Xor
            | BlendMode::Darken
            | BlendMode::Difference
            | BlendMode::Exclusion
                if color.is_transparent() =>
            {
                return None;
            }
            BlendMode::DstIn if color.is_opaque() => return None,
            mode => mode,
        };
        Some(Self::Blend { color, mode })
    }

    /// A color matrix filter, or `None` for an identity or non-finite matrix.
    pub fn matrix(matrix: [f32; 20]) -> Option<Self> {
        if matrix == IDENTITY_COLOR_MATRIX || !matrix.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self::Matrix(matrix))
    }

    /// Which variant this is.
    pub fn kind(&self) -> ColorFilterType {
        match self {
            Self::Blend { .. } => ColorFilterType::Blend,
            Self::Matrix(_) => ColorFilterType::Matrix,
            Self::SrgbToLinearGamma => ColorFilterType::SrgbToLinearGamma,
            Self::LinearToSrgbGamma => ColorFilterType::LinearToSrgbGamma,
        }
    }

    /// Whether filtering a transparent-black pixel yields something else.
    ///
    /// Such a filter affects pixels outside the geometry of a draw, which
    /// makes anything drawn with it unbounded.
    pub fn modifies_transparent_black(&self) -> bool {
        match self {
            Self::Blend { color, mode } => mode.modifies_transparent_black(*color),
            Self::Matrix(m) => m[4] != 0.0 || m[9] != 0.0 || m[14] != 0.0 || m[19] != 0.0,
            Self::SrgbToLinearGamma | Self::LinearToSrgbGamma => false,
        }
    }

    /// Whether `filter(color * opacity) == filter(color) * opacity` for every
    /// color.
    pub fn can_commute_with_opacity(&self) -> bool {
        match self {
            Self::Blend { .. } => false,
            Self::Matrix(m) => {
                m[3] == 0.0
                    && m[8] == 0.0
                    && m[13] == 0.0
                    && m[15] == 0.0
                    && m[16] == 0.0
                    && m[17] == 0.0
                    && m[18] == 1.0
                    && m[19] == 0.0
                    && m[4] == 0.0
                    && m[9] == 0.0
                    && m[14] == 0.0
            }
            Self::SrgbToLinearGamma | Self::LinearToSrgbGamma => true,
        }
    }

    /// Approximate footprint, in bytes.
    pub fn size(&self) -> usize {
        size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_blends_collapse_to_none() {
        assert!(ColorFilter::blend(Color::RED, BlendMode::Dst).is_none());
        assert!(ColorFilter::blend(Color::TRANSPARENT, BlendMode::SrcOver).is_none());
        assert!(ColorFilter::blend(Color::RED, BlendMode::DstIn).is_none());
        assert_eq!(
            ColorFilter::blend(Color::RED, BlendMode::SrcOver),
            Some(ColorFilter::Blend {
                color: Color::RED,
                mode: BlendMode::Src
            })
        );
    }

    #[test]
    fn identity_and_non_finite_matrices_collapse_to_none() {
        assert!(ColorFilter::matrix(IDENTITY_COLOR_MATRIX).is_none());
        let mut m = IDENTITY_COLOR_MATRIX;
        m[0] = f32::INFINITY;
        assert!(ColorFilter::matrix(m).is_none());
    }

    #[test]
    fn translation_columns_modify_transparent_black() {
        let mut m = IDENTITY_COLOR_MATRIX;
        m[0] = 0.5;
        let scale_only = ColorFilter::matrix(m).unwrap();
        assert!(!scale_only.modifies_transparent_black());
        assert!(scale_only.can_commute_with_opacity());
        m[19] = 0.25;
        let offset = ColorFilter::matrix(m).unwrap();
        assert!(offset.modifies_transparent_black());
        assert!(!offset.can_commute_with_opacity());
    }

    #[test]
    fn blend_transparent_black_rules() {
        let src_in = ColorFilter::blend(Color::RED, BlendMode::SrcIn).unwrap();
        assert!(!src_in.modifies_transparent_black());
        let screen = ColorFilter::blend(Color::RED, BlendMode::Screen).unwrap();
        assert!(screen.modifies_transparent_black());
        assert!(!ColorFilter::SrgbToLinearGamma.modifies_transparent_black());
        assert!(ColorFilter::LinearToSrgbGamma.can_commute_with_opacity());
    }
}
