// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An owned bundle of drawing attributes.

use alloc::sync::Arc;

use understory_display_effects::{
    BlendMode, Blender, BlurStyle, Color, ColorFilter, ColorSource, ImageFilter, MaskFilter,
    PathEffect,
};

use crate::{DrawStyle, StrokeCap, StrokeJoin};

/// How drawn pixels combine with what is already there.
///
/// A blend mode and a custom blender are mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintBlend {
    /// One of the standard blend modes.
    Mode(BlendMode),
    /// A custom blender that is not a plain mode.
    Blender(Arc<Blender>),
}

impl Default for PaintBlend {
    fn default() -> Self {
        Self::Mode(BlendMode::SrcOver)
    }
}

impl PaintBlend {
    /// Builds the blend state for an optional blender.
    ///
    /// `None` and blenders that are just a mode collapse to [`PaintBlend::Mode`].
    pub fn from_blender(blender: Option<&Arc<Blender>>) -> Self {
        match blender {
            None => Self::default(),
            Some(blender) => match blender.as_blend_mode() {
                Some(mode) => Self::Mode(mode),
                None => Self::Blender(blender.clone()),
            },
        }
    }

    /// The blend mode, or `None` when a custom blender is active.
    pub fn mode(&self) -> Option<BlendMode> {
        match self {
            Self::Mode(mode) => Some(*mode),
            Self::Blender(_) => None,
        }
    }

    /// A blender equivalent to this state.
    pub fn blender(&self) -> Arc<Blender> {
        match self {
            Self::Mode(mode) => Arc::new(Blender::Mode(*mode)),
            Self::Blender(blender) => blender.clone(),
        }
    }

    /// Whether group opacity can be distributed through this blend.
    pub fn is_opacity_compatible(&self) -> bool {
        match self {
            Self::Mode(mode) => mode.is_opacity_compatible(),
            Self::Blender(blender) => blender.is_opacity_compatible(),
        }
    }

    /// Whether blending a transparent source leaves the destination alone.
    pub fn nops_on_transparent_source(&self) -> bool {
        match self {
            Self::Mode(mode) => mode.nops_on_transparent_source(),
            Self::Blender(blender) => blender.nops_on_transparent_source(),
        }
    }
}

/// The coverage filter of a paint.
///
/// An explicit mask filter object and the blur shorthand are mutually
/// exclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PaintMask {
    /// No mask filter.
    #[default]
    None,
    /// A mask filter object.
    Filter(Arc<MaskFilter>),
    /// A blur given by its parameters.
    Blur {
        /// Blur style.
        style: BlurStyle,
        /// Standard deviation; always finite and positive.
        sigma: f64,
    },
}

impl PaintMask {
    /// Builds the blur shorthand, or [`PaintMask::None`] when `sigma` is not
    /// a finite positive number.
    pub fn blur(style: BlurStyle, sigma: f64) -> Self {
        if sigma.is_finite() && sigma > 0.0 {
            Self::Blur { style, sigma }
        } else {
            Self::None
        }
    }

    /// Whether any mask filter is active.
    pub fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// How far the mask can spread coverage beyond the geometry, in local
    /// units.
    pub fn effect_radius(&self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Filter(filter) => filter.effect_radius(),
            Self::Blur { sigma, .. } => sigma * 3.0,
        }
    }

    /// The equivalent mask filter object.
    pub fn to_filter(&self) -> Option<Arc<MaskFilter>> {
        match self {
            Self::None => None,
            Self::Filter(filter) => Some(filter.clone()),
            Self::Blur { style, sigma } => MaskFilter::blur(*style, *sigma, true).map(Arc::new),
        }
    }
}

/// Every drawing attribute as one owned value.
///
/// Use [`set_attributes_from_paint`] to apply a paint before a draw.
///
/// [`set_attributes_from_paint`]: crate::DisplayListBuilder::set_attributes_from_paint
#[derive(Clone, Debug, PartialEq)]
pub struct Paint {
    /// Anti-aliasing.
    pub anti_alias: bool,
    /// Dithering.
    pub dither: bool,
    /// Color inversion.
    pub invert_colors: bool,
    /// Fill, stroke, or both.
    pub draw_style: DrawStyle,
    /// Stroke end cap.
    pub stroke_cap: StrokeCap,
    /// Stroke join.
    pub stroke_join: StrokeJoin,
    /// Stroke width; `0` means hairline.
    pub stroke_width: f64,
    /// Miter limit.
    pub stroke_miter: f64,
    /// Color.
    pub color: Color,
    /// Blend mode or blender.
    pub blend: PaintBlend,
    /// Shader.
    pub color_source: Option<Arc<ColorSource>>,
    /// Color filter.
    pub color_filter: Option<Arc<ColorFilter>>,
    /// Image filter.
    pub image_filter: Option<Arc<ImageFilter>>,
    /// Path effect.
    pub path_effect: Option<Arc<PathEffect>>,
    /// Mask filter.
    pub mask: PaintMask,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            anti_alias: false,
            dither: false,
            invert_colors: false,
            draw_style: DrawStyle::Fill,
            stroke_cap: StrokeCap::Butt,
            stroke_join: StrokeJoin::Miter,
            stroke_width: 0.0,
            stroke_miter: Self::DEFAULT_MITER,
            color: Color::BLACK,
            blend: PaintBlend::default(),
            color_source: None,
            color_filter: None,
            image_filter: None,
            path_effect: None,
            mask: PaintMask::None,
        }
    }
}

impl Paint {
    /// The default miter limit.
    pub const DEFAULT_MITER: f64 = 4.0;

    /// A default paint with the given color.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Sets the anti-alias flag.
    #[must_use]
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    /// Sets the draw style.
    #[must_use]
    pub fn with_draw_style(mut self, style: DrawStyle) -> Self {
        self.draw_style = style;
        self
    }

    /// Sets the stroke width.
    #[must_use]
    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self
    }

    /// Sets the stroke cap.
    #[must_use]
    pub fn with_stroke_cap(mut self, cap: StrokeCap) -> Self {
        self.stroke_cap = cap;
        self
    }

    /// Sets the stroke join.
    #[must_use]
    pub fn with_stroke_join(mut self, join: StrokeJoin) -> Self {
        self.stroke_join = join;
        self
    }

    /// Sets the blend mode, clearing any blender.
    #[must_use]
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend = PaintBlend::Mode(mode);
        self
    }

    /// Sets the color source.
    #[must_use]
    pub fn with_color_source(mut self, source: Option<Arc<ColorSource>>) -> Self {
        self.color_source = source;
        self
    }

    /// Sets the color filter.
    #[must_use]
    pub fn with_color_filter(mut self, filter: Option<Arc<ColorFilter>>) -> Self {
        self.color_filter = filter;
        self
    }

    /// Sets the image filter.
    #[must_use]
    pub fn with_image_filter(mut self, filter: Option<Arc<ImageFilter>>) -> Self {
        self.image_filter = filter;
        self
    }

    /// Sets the path effect.
    #[must_use]
    pub fn with_path_effect(mut self, effect: Option<Arc<PathEffect>>) -> Self {
        self.path_effect = effect;
        self
    }

    /// Sets the mask filter.
    #[must_use]
    pub fn with_mask(mut self, mask: PaintMask) -> Self {
        self.mask = mask;
        self
    }

    /// Half the stroke width, or zero when nothing is stroked.
    pub fn half_stroke_width(&self) -> f64 {
        if self.draw_style == DrawStyle::Fill {
            0.0
        } else {
            self.stroke_width * 0.5
        }
    }

    /// Whether drawing a transparent source with this paint changes nothing.
    ///
    /// False when a filter can turn transparent black into color or when the
    /// blend writes to the destination even for transparent input.
    pub fn nops_on_transparent_source(&self) -> bool {
        if self
            .image_filter
            .as_ref()
            .is_some_and(|f| f.modifies_transparent_black())
        {
            return false;
        }
        if self
            .color_filter
            .as_ref()
            .is_some_and(|f| f.modifies_transparent_black())
        {
            return false;
        }
        self.blend.nops_on_transparent_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_only_blenders_collapse() {
        let blender = Arc::new(Blender::Mode(BlendMode::Multiply));
        assert_eq!(
            PaintBlend::from_blender(Some(&blender)),
            PaintBlend::Mode(BlendMode::Multiply)
        );
        assert_eq!(PaintBlend::from_blender(None), PaintBlend::default());
        assert_eq!(
            *PaintBlend::default().blender(),
            Blender::Mode(BlendMode::SrcOver),
            "the default state is equivalent to a src-over blender"
        );
    }

    #[test]
    fn degenerate_blur_is_no_mask() {
        for sigma in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                PaintMask::blur(BlurStyle::Normal, sigma),
                PaintMask::None,
                "sigma {sigma} must clear the mask"
            );
        }
        let blur = PaintMask::blur(BlurStyle::Solid, 2.0);
        assert!(blur.is_some());
        assert_eq!(blur.effect_radius(), 6.0);
    }

    #[test]
    fn transparent_nop_follows_blend_and_filters() {
        let paint = Paint::default();
        assert!(paint.nops_on_transparent_source());
        assert!(!paint.clone().with_blend_mode(BlendMode::Src).nops_on_transparent_source());
        let flood = ColorFilter::blend(Color::RED, BlendMode::SrcOver).map(Arc::new);
        assert!(
            !paint.with_color_filter(flood).nops_on_transparent_source(),
            "a src-over red filter paints over transparent pixels"
        );
    }

    #[test]
    fn half_stroke_width_ignores_fills() {
        let paint = Paint::default().with_stroke_width(4.0);
        assert_eq!(paint.half_stroke_width(), 0.0);
        assert_eq!(
            paint.with_draw_style(DrawStyle::Stroke).half_stroke_width(),
            2.0
        );
    }
}
