// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::mem::size_of;

/// How a blur mask filter combines the blurred coverage with the original.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurStyle {
    /// Blur inside and outside the shape.
    #[default]
    Normal = 0,
    /// Solid inside, blurred outside.
    Solid,
    /// Nothing inside, blurred outside.
    Outer,
    /// Blurred inside, nothing outside.
    Inner,
}

impl BlurStyle {
    /// Decodes a style from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Solid),
            2 => Some(Self::Outer),
            3 => Some(Self::Inner),
            _ => None,
        }
    }
}

/// Discriminates the [`MaskFilter`] variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MaskFilterType {
    /// Gaussian blur of the coverage mask.
    Blur,
}

/// A filter applied to a draw's coverage mask before shading.
#[derive(Clone, Debug, PartialEq)]
pub enum MaskFilter {
    /// Gaussian blur of the coverage mask.
    Blur {
        /// How blurred and original coverage combine.
        style: BlurStyle,
        /// Blur sigma.
        sigma: f64,
        /// Whether `sigma` is in local space (scaled by the transform) or
        /// device space.
        respect_ctm: bool,
    },
}

impl MaskFilter {
    /// A blur mask, or `None` when `sigma` is not a positive finite value.
    pub fn blur(style: BlurStyle, sigma: f64, respect_ctm: bool) -> Option<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            tracing::trace!(sigma, "mask blur without a positive sigma is no filter");
            return None;
        }
        Some(Self::Blur {
            style,
            sigma,
            respect_ctm,
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> MaskFilterType {
        match self {
            Self::Blur { .. } => MaskFilterType::Blur,
        }
    }

    /// How far the mask can spread beyond the original coverage.
    pub fn effect_radius(&self) -> f64 {
        match self {
            Self::Blur { sigma, .. } => sigma * 3.0,
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
    fn non_positive_sigma_is_no_filter() {
        assert!(MaskFilter::blur(BlurStyle::Normal, 0.0, true).is_none());
        assert!(MaskFilter::blur(BlurStyle::Normal, -2.0, true).is_none());
        assert!(MaskFilter::blur(BlurStyle::Normal, f64::INFINITY, true).is_none());
    }

    #[test]
    fn radius_is_three_sigma() {
        let mask = MaskFilter::blur(BlurStyle::Outer, 2.5, false).unwrap();
        assert_eq!(mask.effect_radius(), 7.5);
        assert_eq!(mask.kind(), MaskFilterType::Blur);
    }
}
