// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::{Compose, Mix};

use crate::Color;

/// Porter-Duff and separable/non-separable blend modes.
///
/// The discriminants are stable and are the values written into display list
/// records.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `r = 0`
    Clear = 0,
    /// `r = s`
    Src,
    /// `r = d`
    Dst,
    /// `r = s + (1-sa)*d`
    #[default]
    SrcOver,
    /// `r = d + (1-da)*s`
    DstOver,
    /// `r = s * da`
    SrcIn,
    /// `r = d * sa`
    DstIn,
    /// `r = s * (1-da)`
    SrcOut,
    /// `r = d * (1-sa)`
    DstOut,
    /// `r = s*da + d*(1-sa)`
    SrcATop,
    /// `r = d*sa + s*(1-da)`
    DstATop,
    /// `r = s*(1-da) + d*(1-sa)`
    Xor,
    /// `r = min(s + d, 1)`
    Plus,
    /// `r = s*d`
    Modulate,
    /// `r = s + d - s*d`
    Screen,
    /// Multiply or screen, depending on the destination.
    Overlay,
    /// `rc = s + d - max(s*da, d*sa)`
    Darken,
    /// `rc = s + d - min(s*da, d*sa)`
    Lighten,
    /// Brighten the destination to reflect the source.
    ColorDodge,
    /// Darken the destination to reflect the source.
    ColorBurn,
    /// Multiply or screen, depending on the source.
    HardLight,
    /// Lighten or darken, depending on the source.
    SoftLight,
    /// `rc = s + d - 2*min(s*da, d*sa)`
    Difference,
    /// `rc = s + d - 2*s*d`
    Exclusion,
    /// `r = s*(1-da) + d*(1-sa) + s*d`
    Multiply,
    /// Hue of the source with saturation and luminosity of the destination.
    Hue,
    /// Saturation of the source with hue and luminosity of the destination.
    Saturation,
    /// Hue and saturation of the source with luminosity of the destination.
    Color,
    /// Luminosity of the source with hue and saturation of the destination.
    Luminosity,
}

impl BlendMode {
    /// Every mode, indexed by its discriminant.
    pub const ALL: [Self; 29] = [
        Self::Clear,
        Self::Src,
        Self::Dst,
        Self::SrcOver,
        Self::DstOver,
        Self::SrcIn,
        Self::DstIn,
        Self::SrcOut,
        Self::DstOut,
        Self::SrcATop,
        Self::DstATop,
        Self::Xor,
        Self::Plus,
        Self::Modulate,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::HardLight,
        Self::SoftLight,
        Self::Difference,
        Self::Exclusion,
        Self::Multiply,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    /// Decodes a mode from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ALL.len() {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Whether a group drawn with this mode can have a uniform opacity
    /// folded into each of its draws instead of compositing a layer.
    ///
    /// Only source-over distributes over alpha modulation.
    pub const fn is_opacity_compatible(self) -> bool {
        matches!(self, Self::SrcOver)
    }

    /// Whether drawing transparent black with this mode leaves the
    /// destination untouched.
    ///
    /// Modes that clear or replace destination pixels outside the source
    /// coverage return `false`.
    pub const fn nops_on_transparent_source(self) -> bool {
        !matches!(
            self,
            Self::Clear
                | Self::Src
                | Self::SrcIn
                | Self::DstIn
                | Self::SrcOut
                | Self::DstATop
                | Self::Modulate
        )
    }

    /// Whether blending `color` onto a transparent-black destination with
    /// this mode produces something other than transparent black.
    pub const fn modifies_transparent_black(self, color: Color) -> bool {
        if color.is_transparent() {
            return false;
        }
        !matches!(
            self,
            Self::Clear
                | Self::Dst
                | Self::SrcIn
                | Self::DstIn
                | Self::DstOut
                | Self::SrcATop
                | Self::Modulate
        )
    }

    /// Converts to a `peniko` blend mode.
    ///
    /// Returns `None` for [`BlendMode::Modulate`], which has no `peniko`
    /// counterpart.
    pub const fn to_peniko(self) -> Option<peniko::BlendMode> {
        let (mix, compose) = match self {
            Self::Clear => (Mix::Normal, Compose::Clear),
            Self::Src => (Mix::Normal, Compose::Copy),
            Self::Dst => (Mix::Normal, Compose::Dest),
            Self::SrcOver => (Mix::Normal, Compose::SrcOver),
            Self::DstOver => (Mix::Normal, Compose::DestOver),
            Self::SrcIn => (Mix::Normal, Compose::SrcIn),
            Self::DstIn => (Mix::Normal, Compose::DestIn),
            Self::SrcOut => (Mix::Normal, Compose::SrcOut),
            Self::DstOut => (Mix::Normal, Compose::DestOut),
            Self::SrcATop => (Mix::Normal, Compose::SrcAtop),
            Self::DstATop => (Mix::Normal, Compose::DestAtop),
            Self::Xor => (Mix::Normal, Compose::Xor),
            Self::Plus => (Mix::Normal, Compose::Plus),
            Self::Modulate => return None,
            Self::Screen => (Mix::Screen, Compose::SrcOver),
            Self::Overlay => (Mix::Overlay, Compose::SrcOver),
            Self::Darken => (Mix::Darken, Compose::SrcOver),
            Self::Lighten => (Mix::Lighten, Compose::SrcOver),
            Self::ColorDodge => (Mix::ColorDodge, Compose::SrcOver),
            Self::ColorBurn => (Mix::ColorBurn, Compose::SrcOver),
            Self::HardLight => (Mix::HardLight, Compose::SrcOver),
            Self::SoftLight => (Mix::SoftLight, Compose::SrcOver),
            Self::Difference => (Mix::Difference, Compose::SrcOver),
            Self::Exclusion => (Mix::Exclusion, Compose::SrcOver),
            Self::Multiply => (Mix::Multiply, Compose::SrcOver),
            Self::Hue => (Mix::Hue, Compose::SrcOver),
            Self::Saturation => (Mix::Saturation, Compose::SrcOver),
            Self::Color => (Mix::Color, Compose::SrcOver),
            Self::Luminosity => (Mix::Luminosity, Compose::SrcOver),
        };
        Some(peniko::BlendMode { mix, compose })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_round_trip_through_table() {
        for (i, mode) in BlendMode::ALL.iter().enumerate() {
            assert_eq!(*mode as usize, i, "ALL must be ordered by discriminant");
        }
        assert_eq!(BlendMode::from_u8(29), None);
    }

    #[test]
    fn only_src_over_is_opacity_compatible() {
        let compatible: usize = BlendMode::ALL
            .iter()
            .filter(|m| m.is_opacity_compatible())
            .count();
        assert_eq!(compatible, 1, "exactly one compatible mode");
        assert!(BlendMode::SrcOver.is_opacity_compatible());
    }

    #[test]
    fn transparent_black_behavior() {
        assert!(!BlendMode::Src.nops_on_transparent_source());
        assert!(BlendMode::SrcOver.nops_on_transparent_source());
        assert!(BlendMode::SrcOver.modifies_transparent_black(Color::RED));
        assert!(!BlendMode::SrcIn.modifies_transparent_black(Color::RED));
        assert!(!BlendMode::Src.modifies_transparent_black(Color::TRANSPARENT));
    }

    #[test]
    fn modulate_has_no_peniko_equivalent() {
        assert!(BlendMode::Modulate.to_peniko().is_none());
        let mode = BlendMode::Multiply.to_peniko().unwrap();
        assert_eq!(mode.mix, Mix::Multiply);
    }
}
