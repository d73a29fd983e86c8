// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-operation attribute usage flags.

use understory_display_effects::PathEffect;

use crate::DrawStyle;

bitflags::bitflags! {
    /// Which paint attributes an operation consults and what kind of geometry
    /// it produces.
    ///
    /// Consumers use these flags to decide which of the current attributes
    /// matter for a given op, for example when computing bounds or when
    /// copying attributes from a [`Paint`](crate::Paint).
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct DisplayListAttributeFlags: u32 {
        /// Anti-aliasing applies.
        const USES_ANTI_ALIAS = 1 << 0;
        /// Dithering applies.
        const USES_DITHER = 1 << 1;
        /// The alpha of the color applies.
        const USES_ALPHA = 1 << 2;
        /// The color applies.
        const USES_COLOR = 1 << 3;
        /// The blend mode or blender applies.
        const USES_BLEND = 1 << 4;
        /// The color source applies.
        const USES_SHADER = 1 << 5;
        /// The color filter and color inversion apply.
        const USES_COLOR_FILTER = 1 << 6;
        /// The path effect applies.
        const USES_PATH_EFFECT = 1 << 7;
        /// The mask filter applies.
        const USES_MASK_FILTER = 1 << 8;
        /// The image filter applies.
        const USES_IMAGE_FILTER = 1 << 9;

        /// The geometry is always filled.
        const IS_FILLED_GEOMETRY = 1 << 10;
        /// The geometry is always stroked.
        const IS_STROKED_GEOMETRY = 1 << 11;
        /// The geometry is filled or stroked according to the draw style.
        const IS_DRAWN_GEOMETRY = 1 << 12;
        /// The op draws pixels that are not derived from stroke or fill
        /// geometry (images, vertices).
        const IS_NON_GEOMETRIC = 1 << 13;
        /// The op covers everything inside the clip.
        const FLOODS_SURFACE = 1 << 14;

        /// Stroked output may have end caps.
        const MAY_HAVE_CAPS = 1 << 15;
        /// Stroked output may have joins.
        const MAY_HAVE_JOINS = 1 << 16;
        /// Butt caps render as squares (points drawn as points).
        const BUTT_CAP_IS_SQUARE = 1 << 17;
        /// End caps may lie on a diagonal.
        const MAY_HAVE_DIAGONAL_CAPS = 1 << 18;
        /// Joins may meet at an acute angle, so miters can extend.
        const MAY_HAVE_ACUTE_JOINS = 1 << 19;

        /// The op ignores the paint entirely.
        const IGNORES_PAINT = 1 << 20;

        /// Attributes shared by every op that uses the paint.
        const BASE_PAINT = Self::USES_DITHER.bits()
            | Self::USES_ALPHA.bits()
            | Self::USES_COLOR.bits()
            | Self::USES_BLEND.bits()
            | Self::USES_SHADER.bits()
            | Self::USES_COLOR_FILTER.bits()
            | Self::USES_IMAGE_FILTER.bits();
        /// Attributes of ops that fill or stroke geometry.
        const BASE_STROKE_OR_FILL = Self::BASE_PAINT.bits()
            | Self::USES_ANTI_ALIAS.bits()
            | Self::USES_MASK_FILTER.bits()
            | Self::USES_PATH_EFFECT.bits();
        /// Attributes of image draws that use the paint.
        const BASE_IMAGE = Self::USES_ALPHA.bits()
            | Self::USES_DITHER.bits()
            | Self::USES_BLEND.bits()
            | Self::USES_COLOR_FILTER.bits()
            | Self::USES_IMAGE_FILTER.bits()
            | Self::IS_NON_GEOMETRIC.bits();
    }
}

impl DisplayListAttributeFlags {
    /// Whether the op ignores the paint.
    pub const fn ignores_paint(self) -> bool {
        self.contains(Self::IGNORES_PAINT)
    }

    /// Whether anti-aliasing applies.
    pub const fn applies_anti_alias(self) -> bool {
        self.contains(Self::USES_ANTI_ALIAS)
    }

    /// Whether dithering applies.
    pub const fn applies_dither(self) -> bool {
        self.contains(Self::USES_DITHER)
    }

    /// Whether the alpha channel of the color applies.
    pub const fn applies_alpha(self) -> bool {
        self.contains(Self::USES_ALPHA)
    }

    /// Whether the color applies.
    pub const fn applies_color(self) -> bool {
        self.contains(Self::USES_COLOR)
    }

    /// Whether the blend mode or blender applies.
    pub const fn applies_blend(self) -> bool {
        self.contains(Self::USES_BLEND)
    }

    /// Whether the color source applies.
    pub const fn applies_shader(self) -> bool {
        self.contains(Self::USES_SHADER)
    }

    /// Whether the color filter and color inversion apply.
    pub const fn applies_color_filter(self) -> bool {
        self.contains(Self::USES_COLOR_FILTER)
    }

    /// Whether the path effect applies.
    pub const fn applies_path_effect(self) -> bool {
        self.contains(Self::USES_PATH_EFFECT)
    }

    /// Whether the mask filter applies.
    pub const fn applies_mask_filter(self) -> bool {
        self.contains(Self::USES_MASK_FILTER)
    }

    /// Whether the image filter applies.
    pub const fn applies_image_filter(self) -> bool {
        self.contains(Self::USES_IMAGE_FILTER)
    }

    /// Whether the draw style decides between filling and stroking.
    pub const fn applies_style(self) -> bool {
        self.contains(Self::IS_DRAWN_GEOMETRY)
    }

    /// Whether the op produces stroke or fill geometry.
    pub const fn is_geometric(self) -> bool {
        self.intersects(
            Self::IS_FILLED_GEOMETRY
                .union(Self::IS_STROKED_GEOMETRY)
                .union(Self::IS_DRAWN_GEOMETRY),
        )
    }

    /// Whether the op is always stroked regardless of style.
    pub const fn always_stroked(self) -> bool {
        self.contains(Self::IS_STROKED_GEOMETRY)
    }

    /// Whether the op is stroked under the given style.
    pub fn is_stroked(self, style: DrawStyle) -> bool {
        self.always_stroked() || (self.applies_style() && style != DrawStyle::Fill)
    }

    /// Whether the op covers the whole clip.
    pub const fn is_flood(self) -> bool {
        self.contains(Self::FLOODS_SURFACE)
    }

    /// Whether stroked output may have end caps.
    pub const fn may_have_end_caps(self) -> bool {
        self.contains(Self::MAY_HAVE_CAPS)
    }

    /// Whether stroked output may have joins.
    pub const fn may_have_joins(self) -> bool {
        self.contains(Self::MAY_HAVE_JOINS)
    }

    /// Whether butt caps render as squares.
    pub const fn butt_cap_becomes_square(self) -> bool {
        self.contains(Self::BUTT_CAP_IS_SQUARE)
    }

    /// Whether end caps may be diagonal.
    pub const fn may_have_diagonal_caps(self) -> bool {
        self.contains(Self::MAY_HAVE_DIAGONAL_CAPS)
    }

    /// Whether joins may be acute.
    pub const fn may_have_acute_joins(self) -> bool {
        self.contains(Self::MAY_HAVE_ACUTE_JOINS)
    }

    /// The geometry flags after applying a path effect.
    ///
    /// Dashing a stroke can introduce end caps anywhere along the path, so it
    /// adds diagonal caps. Fills and non-geometric ops are unaffected.
    pub fn with_path_effect(self, effect: Option<&PathEffect>, is_stroked: bool) -> Self {
        match effect {
            Some(effect) if self.is_geometric() && is_stroked && effect.adds_caps() => {
                self | Self::MAY_HAVE_CAPS | Self::MAY_HAVE_DIAGONAL_CAPS
            }
            _ => self,
        }
    }
}

/// The attribute flags of every operation kind.
#[derive(Copy, Clone, Debug)]
pub struct DisplayListOpFlags;

type Flags = DisplayListAttributeFlags;

impl DisplayListOpFlags {
    /// Save layer without paint attributes.
    pub const SAVE_LAYER: Flags = Flags::IGNORES_PAINT;
    /// Save layer that composites with paint attributes.
    pub const SAVE_LAYER_WITH_PAINT: Flags = Flags::USES_ALPHA
        .union(Flags::USES_BLEND)
        .union(Flags::USES_COLOR_FILTER)
        .union(Flags::USES_IMAGE_FILTER);
    /// Fill the clip with a color and explicit blend mode.
    pub const DRAW_COLOR: Flags = Flags::FLOODS_SURFACE.union(Flags::IGNORES_PAINT);
    /// Fill the clip with the paint.
    pub const DRAW_PAINT: Flags = Flags::BASE_PAINT.union(Flags::FLOODS_SURFACE);
    /// Horizontal or vertical line.
    pub const DRAW_HV_LINE: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_STROKED_GEOMETRY)
        .union(Flags::MAY_HAVE_CAPS);
    /// Arbitrary line.
    pub const DRAW_LINE: Flags = Self::DRAW_HV_LINE.union(Flags::MAY_HAVE_DIAGONAL_CAPS);
    /// Rectangle.
    pub const DRAW_RECT: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_DRAWN_GEOMETRY)
        .union(Flags::MAY_HAVE_JOINS);
    /// Oval.
    pub const DRAW_OVAL: Flags = Flags::BASE_STROKE_OR_FILL.union(Flags::IS_DRAWN_GEOMETRY);
    /// Circle.
    pub const DRAW_CIRCLE: Flags = Self::DRAW_OVAL;
    /// Rounded rectangle.
    pub const DRAW_ROUNDED_RECT: Flags = Self::DRAW_OVAL;
    /// Difference of two rounded rectangles.
    pub const DRAW_DOUBLE_ROUNDED_RECT: Flags = Self::DRAW_OVAL;
    /// Arbitrary path.
    pub const DRAW_PATH: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_DRAWN_GEOMETRY)
        .union(Flags::MAY_HAVE_CAPS)
        .union(Flags::MAY_HAVE_DIAGONAL_CAPS)
        .union(Flags::MAY_HAVE_JOINS)
        .union(Flags::MAY_HAVE_ACUTE_JOINS);
    /// Open arc.
    pub const DRAW_ARC_NO_CENTER: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_DRAWN_GEOMETRY)
        .union(Flags::MAY_HAVE_CAPS)
        .union(Flags::MAY_HAVE_DIAGONAL_CAPS);
    /// Pie-slice arc.
    pub const DRAW_ARC_WITH_CENTER: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_DRAWN_GEOMETRY)
        .union(Flags::MAY_HAVE_JOINS)
        .union(Flags::MAY_HAVE_ACUTE_JOINS);
    /// Points drawn as points.
    pub const DRAW_POINTS_AS_POINTS: Flags = Flags::BASE_STROKE_OR_FILL
        .union(Flags::IS_STROKED_GEOMETRY)
        .union(Flags::MAY_HAVE_CAPS)
        .union(Flags::BUTT_CAP_IS_SQUARE);
    /// Points drawn as separate line segments.
    pub const DRAW_POINTS_AS_LINES: Flags =
        Self::DRAW_POINTS_AS_POINTS.union(Flags::MAY_HAVE_DIAGONAL_CAPS);
    /// Points drawn as an open polyline.
    pub const DRAW_POINTS_AS_POLYGON: Flags = Self::DRAW_POINTS_AS_LINES
        .union(Flags::MAY_HAVE_JOINS)
        .union(Flags::MAY_HAVE_ACUTE_JOINS);
    /// Triangle meshes.
    pub const DRAW_VERTICES: Flags = Flags::BASE_PAINT.union(Flags::IS_NON_GEOMETRIC);
    /// Image without paint.
    pub const DRAW_IMAGE: Flags = Flags::IGNORES_PAINT;
    /// Image with paint.
    pub const DRAW_IMAGE_WITH_PAINT: Flags = Flags::BASE_IMAGE
        .union(Flags::USES_ANTI_ALIAS)
        .union(Flags::USES_MASK_FILTER);
    /// Image sub-rect without paint.
    pub const DRAW_IMAGE_RECT: Flags = Flags::IGNORES_PAINT;
    /// Image sub-rect with paint.
    pub const DRAW_IMAGE_RECT_WITH_PAINT: Flags = Self::DRAW_IMAGE_WITH_PAINT;
    /// Nine-patch without paint.
    pub const DRAW_IMAGE_NINE: Flags = Flags::IGNORES_PAINT;
    /// Nine-patch with paint.
    pub const DRAW_IMAGE_NINE_WITH_PAINT: Flags = Flags::BASE_IMAGE;
    /// Lattice without paint.
    pub const DRAW_IMAGE_LATTICE: Flags = Flags::IGNORES_PAINT;
    /// Lattice with paint.
    pub const DRAW_IMAGE_LATTICE_WITH_PAINT: Flags = Flags::BASE_IMAGE;
    /// Atlas without paint.
    pub const DRAW_ATLAS: Flags = Flags::IGNORES_PAINT;
    /// Atlas with paint.
    pub const DRAW_ATLAS_WITH_PAINT: Flags = Flags::BASE_IMAGE;
    /// Nested display list.
    pub const DRAW_DISPLAY_LIST: Flags = Flags::IGNORES_PAINT;
    /// External picture without paint.
    pub const DRAW_PICTURE: Flags = Flags::IGNORES_PAINT;
    /// External picture composited with paint.
    pub const DRAW_PICTURE_WITH_PAINT: Flags = Self::SAVE_LAYER_WITH_PAINT;
    /// Text.
    pub const DRAW_TEXT_RUN: Flags = Flags::BASE_STROKE_OR_FILL
        .difference(Flags::USES_ANTI_ALIAS)
        .union(Flags::IS_DRAWN_GEOMETRY);
    /// Shadows.
    pub const DRAW_SHADOW: Flags = Flags::IGNORES_PAINT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_decision_follows_style_for_drawn_geometry() {
        let rect = DisplayListOpFlags::DRAW_RECT;
        assert!(!rect.is_stroked(DrawStyle::Fill));
        assert!(rect.is_stroked(DrawStyle::Stroke));
        assert!(rect.is_stroked(DrawStyle::StrokeAndFill));
        assert!(DisplayListOpFlags::DRAW_LINE.is_stroked(DrawStyle::Fill));
    }

    #[test]
    fn paintless_ops_use_no_attributes() {
        for flags in [
            DisplayListOpFlags::DRAW_IMAGE,
            DisplayListOpFlags::DRAW_DISPLAY_LIST,
            DisplayListOpFlags::DRAW_SHADOW,
        ] {
            assert!(flags.ignores_paint());
            assert!(!flags.applies_blend(), "{flags:?} must not blend");
            assert!(!flags.is_geometric(), "{flags:?} has no stroke geometry");
        }
    }

    #[test]
    fn dashes_add_diagonal_caps_only_when_stroked() {
        let dash = PathEffect::dash(&[2.0, 2.0], 0.0).unwrap();
        let rect = DisplayListOpFlags::DRAW_RECT;
        assert!(!rect.may_have_diagonal_caps());
        assert!(rect.with_path_effect(Some(&dash), true).may_have_diagonal_caps());
        assert_eq!(rect.with_path_effect(Some(&dash), false), rect);
        assert_eq!(rect.with_path_effect(None, true), rect);
    }

    #[test]
    fn floods_are_flagged() {
        assert!(DisplayListOpFlags::DRAW_PAINT.is_flood());
        assert!(DisplayListOpFlags::DRAW_COLOR.is_flood());
        assert!(!DisplayListOpFlags::DRAW_RECT.is_flood());
    }
}
