// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed 32-bit colors.

/// A non-premultiplied sRGB color packed as `0xAARRGGBB`.
///
/// This is the color representation stored in display list records. Convert
/// to a [`peniko::Color`] with [`Color::to_peniko`] when handing the value to
/// a renderer.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque green.
    pub const GREEN: Self = Self(0xFF00_FF00);
    /// Opaque blue.
    pub const BLUE: Self = Self(0xFF00_00FF);

    /// Builds a color from its alpha, red, green and blue channels.
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from_be_bytes([a, r, g, b]))
    }

    /// The packed `0xAARRGGBB` value.
    pub const fn argb(self) -> u32 {
        self.0
    }

    /// Alpha channel.
    pub const fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Red channel.
    pub const fn red(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// Green channel.
    pub const fn green(self) -> u8 {
        self.0.to_be_bytes()[2]
    }

    /// Blue channel.
    pub const fn blue(self) -> u8 {
        self.0.to_be_bytes()[3]
    }

    /// Alpha as a fraction in `0.0..=1.0`.
    pub fn opacity(self) -> f32 {
        f32::from(self.alpha()) / 255.0
    }

    /// Returns this color with the alpha channel replaced.
    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [_, r, g, b] = self.0.to_be_bytes();
        Self::from_argb(alpha, r, g, b)
    }

    /// Returns this color with its alpha set from a fractional opacity.
    ///
    /// Non-finite opacities are treated as fully transparent.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is clamped to 0.5..=255.5 before the cast"
        )]
        let alpha = (opacity * 255.0 + 0.5) as u8;
        self.with_alpha(alpha)
    }

    /// Whether the alpha channel is `0xFF`.
    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0xFF
    }

    /// Whether the alpha channel is `0`.
    pub const fn is_transparent(self) -> bool {
        self.alpha() == 0
    }

    /// Converts to a `peniko` color.
    pub fn to_peniko(self) -> peniko::Color {
        peniko::Color::from_rgba8(self.red(), self.green(), self.blue(), self.alpha())
    }
}

impl From<u32> for Color {
    fn from(argb: u32) -> Self {
        Self(argb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_unpack_in_argb_order() {
        let c = Color(0x8011_2233);
        assert_eq!(c.alpha(), 0x80, "alpha");
        assert_eq!(c.red(), 0x11, "red");
        assert_eq!(c.green(), 0x22, "green");
        assert_eq!(c.blue(), 0x33, "blue");
        assert_eq!(Color::from_argb(0x80, 0x11, 0x22, 0x33), c);
    }

    #[test]
    fn with_opacity_rounds_and_clamps() {
        assert_eq!(Color::RED.with_opacity(0.5).alpha(), 128);
        assert_eq!(Color::RED.with_opacity(2.0).alpha(), 255);
        assert_eq!(Color::RED.with_opacity(-1.0).alpha(), 0);
        assert_eq!(Color::RED.with_opacity(f32::NAN).alpha(), 0);
        assert_eq!(Color::RED.with_alpha(0).red(), 0xFF, "rgb survives alpha edits");
    }

    #[test]
    fn converts_to_peniko() {
        let c = Color(0xFF10_2030).to_peniko().to_rgba8();
        assert_eq!((c.r, c.g, c.b, c.a), (0x10, 0x20, 0x30, 0xFF));
    }
}
