// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shaders that supply per-pixel color to a draw.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f64::consts::PI;
use core::mem::size_of;

use kurbo::{Affine, Point};
use peniko::{Brush, Gradient};

use crate::{Color, DlImage, EffectError, ImageSampling, RuntimeEffectInstance, TileMode};

/// Discriminates the [`ColorSource`] variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorSourceType {
    /// A solid color.
    Color,
    /// A tiled image.
    Image,
    /// A gradient along a line.
    LinearGradient,
    /// A gradient radiating from a point.
    RadialGradient,
    /// A gradient between two circles.
    ConicalGradient,
    /// A gradient sweeping around a point.
    SweepGradient,
    /// A user shader.
    RuntimeEffect,
}

/// Colors, stops, tiling and local matrix shared by every gradient kind.
///
/// Stops are normalized at construction so that consumers can rely on them
/// being finite, within `0.0..=1.0` and non-decreasing.
#[derive(Clone, Debug)]
pub struct GradientStops {
    colors: Box<[Color]>,
    stops: Box<[f32]>,
    tile_mode: TileMode,
    matrix: Option<Affine>,
}

impl GradientStops {
    /// Builds the shared gradient description.
    ///
    /// Without explicit stops the colors are spread evenly, `i / (n - 1)`.
    /// Explicit stops are clamped into `0.0..=1.0` and forced to be
    /// non-decreasing; non-finite stops take the previous stop's value. An
    /// identity local matrix is stored as no matrix.
    pub fn new(
        colors: &[Color],
        stops: Option<&[f32]>,
        tile_mode: TileMode,
        matrix: Option<Affine>,
    ) -> Result<Self, EffectError> {
        if colors.is_empty() {
            return Err(EffectError::EmptyGradient);
        }
        if let Some(stops) = stops
            && stops.len() != colors.len()
        {
            return Err(EffectError::stop_count_mismatch(colors.len(), stops.len()));
        }
        Ok(Self {
            colors: colors.into(),
            stops: normalize_stops(colors.len(), stops),
            tile_mode,
            matrix: matrix.filter(|m| *m != Affine::IDENTITY),
        })
    }

    /// The gradient colors.
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// The normalized stop offsets, one per color.
    pub fn stops(&self) -> &[f32] {
        &self.stops
    }

    /// Tiling outside the gradient's natural range.
    pub fn tile_mode(&self) -> TileMode {
        self.tile_mode
    }

    /// The local matrix, if any.
    pub fn matrix(&self) -> Option<Affine> {
        self.matrix
    }

    /// Whether every color is opaque and tiling never exposes transparency.
    pub fn is_opaque(&self) -> bool {
        self.tile_mode != TileMode::Decal && self.colors.iter().all(|c| c.is_opaque())
    }

    fn difference(&self, other: &Self) -> Option<&'static str> {
        if self.colors != other.colors {
            return Some("colors");
        }
        if !self
            .stops
            .iter()
            .map(|s| s.to_bits())
            .eq(other.stops.iter().map(|s| s.to_bits()))
        {
            return Some("stops");
        }
        if self.tile_mode != other.tile_mode {
            return Some("tile_mode");
        }
        if self.matrix != other.matrix {
            return Some("matrix");
        }
        None
    }

    fn payload_size(&self) -> usize {
        self.colors.len() * size_of::<Color>() + self.stops.len() * size_of::<f32>()
    }

    fn peniko_stops(&self) -> Vec<(f32, peniko::Color)> {
        self.stops
            .iter()
            .zip(self.colors.iter())
            .map(|(stop, color)| (*stop, color.to_peniko()))
            .collect()
    }
}

fn normalize_stops(count: usize, stops: Option<&[f32]>) -> Box<[f32]> {
    match stops {
        None => {
            let div = if count > 1 { (count - 1) as f32 } else { 1.0 };
            (0..count).map(|i| i as f32 / div).collect()
        }
        Some(stops) => {
            let mut prev = 0.0_f32;
            stops
                .iter()
                .map(|&stop| {
                    let stop = if stop.is_finite() {
                        stop.clamp(prev, 1.0)
                    } else {
                        prev
                    };
                    prev = stop;
                    stop
                })
                .collect()
        }
    }
}

/// An image used as a color source.
#[derive(Clone, Debug)]
pub struct ImageSource {
    /// The image.
    pub image: Arc<dyn DlImage>,
    /// Horizontal tiling.
    pub horizontal_tile_mode: TileMode,
    /// Vertical tiling.
    pub vertical_tile_mode: TileMode,
    /// Sampling quality.
    pub sampling: ImageSampling,
    /// Local matrix.
    pub matrix: Option<Affine>,
}

impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        crate::same_image(&self.image, &other.image)
            && self.horizontal_tile_mode == other.horizontal_tile_mode
            && self.vertical_tile_mode == other.vertical_tile_mode
            && self.sampling == other.sampling
            && self.matrix == other.matrix
    }
}

/// A gradient along the line from `start` to `end`.
#[derive(Clone, Debug)]
pub struct LinearGradient {
    /// Where the first color sits.
    pub start: Point,
    /// Where the last color sits.
    pub end: Point,
    /// Colors and stops.
    pub gradient: GradientStops,
}

/// A gradient radiating from `center`.
#[derive(Clone, Debug)]
pub struct RadialGradient {
    /// Center of the gradient.
    pub center: Point,
    /// Radius at which the last color sits.
    pub radius: f64,
    /// Colors and stops.
    pub gradient: GradientStops,
}

/// A two-point conical gradient.
#[derive(Clone, Debug)]
pub struct ConicalGradient {
    /// Center of the start circle.
    pub start_center: Point,
    /// Radius of the start circle.
    pub start_radius: f64,
    /// Center of the end circle.
    pub end_center: Point,
    /// Radius of the end circle.
    pub end_radius: f64,
    /// Colors and stops.
    pub gradient: GradientStops,
}

/// A gradient sweeping clockwise around `center`.
#[derive(Clone, Debug)]
pub struct SweepGradient {
    /// Center of the sweep.
    pub center: Point,
    /// Angle of the first color, in degrees.
    pub start_degrees: f64,
    /// Angle of the last color, in degrees.
    pub end_degrees: f64,
    /// Colors and stops.
    pub gradient: GradientStops,
}

/// A shader that supplies per-pixel color to a draw.
///
/// Color sources are immutable values. They are shared by `Arc` between
/// builders, display lists and the paints that reference them, and compare
/// structurally: two independently built sources with the same parameters are
/// equal.
#[derive(Clone, Debug)]
pub enum ColorSource {
    /// A solid color.
    Color(Color),
    /// A tiled image.
    Image(ImageSource),
    /// A linear gradient.
    LinearGradient(LinearGradient),
    /// A radial gradient.
    RadialGradient(RadialGradient),
    /// A two-point conical gradient.
    ConicalGradient(ConicalGradient),
    /// A sweep gradient.
    SweepGradient(SweepGradient),
    /// A runtime shader.
    RuntimeEffect(RuntimeEffectInstance),
}

impl ColorSource {
    /// A linear gradient.
    pub fn linear_gradient(
        start: Point,
        end: Point,
        colors: &[Color],
        stops: Option<&[f32]>,
        tile_mode: TileMode,
        matrix: Option<Affine>,
    ) -> Result<Self, EffectError> {
        Ok(Self::LinearGradient(LinearGradient {
            start,
            end,
            gradient: GradientStops::new(colors, stops, tile_mode, matrix)?,
        }))
    }

    /// A radial gradient.
    pub fn radial_gradient(
        center: Point,
        radius: f64,
        colors: &[Color],
        stops: Option<&[f32]>,
        tile_mode: TileMode,
        matrix: Option<Affine>,
    ) -> Result<Self, EffectError> {
        Ok(Self::RadialGradient(RadialGradient {
            center,
            radius,
            gradient: GradientStops::new(colors, stops, tile_mode, matrix)?,
        }))
    }

    /// A two-point conical gradient.
    pub fn conical_gradient(
        start_center: Point,
        start_radius: f64,
        end_center: Point,
        end_radius: f64,
        colors: &[Color],
        stops: Option<&[f32]>,
        tile_mode: TileMode,
        matrix: Option<Affine>,
    ) -> Result<Self, EffectError> {
        Ok(Self::ConicalGradient(ConicalGradient {
            start_center,
            start_radius,
            end_center,
            end_radius,
            gradient: GradientStops::new(colors, stops, tile_mode, matrix)?,
        }))
    }

    /// A sweep gradient.
    pub fn sweep_gradient(
        center: Point,
        start_degrees: f64,
        end_degrees: f64,
        colors: &[Color],
        stops: Option<&[f32]>,
        tile_mode: TileMode,
        matrix: Option<Affine>,
    ) -> Result<Self, EffectError> {
        Ok(Self::SweepGradient(SweepGradient {
            center,
            start_degrees,
            end_degrees,
            gradient: GradientStops::new(colors, stops, tile_mode, matrix)?,
        }))
    }

    /// An image source.
    pub fn image(
        image: Arc<dyn DlImage>,
        horizontal_tile_mode: TileMode,
        vertical_tile_mode: TileMode,
        sampling: ImageSampling,
        matrix: Option<Affine>,
    ) -> Self {
        Self::Image(ImageSource {
            image,
            horizontal_tile_mode,
            vertical_tile_mode,
            sampling,
            matrix: matrix.filter(|m| *m != Affine::IDENTITY),
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> ColorSourceType {
        match self {
            Self::Color(_) => ColorSourceType::Color,
            Self::Image(_) => ColorSourceType::Image,
            Self::LinearGradient(_) => ColorSourceType::LinearGradient,
            Self::RadialGradient(_) => ColorSourceType::RadialGradient,
            Self::ConicalGradient(_) => ColorSourceType::ConicalGradient,
            Self::SweepGradient(_) => ColorSourceType::SweepGradient,
            Self::RuntimeEffect(_) => ColorSourceType::RuntimeEffect,
        }
    }

    /// Whether every pixel this source produces is opaque.
    pub fn is_opaque(&self) -> bool {
        match self {
            Self::Color(color) => color.is_opaque(),
            Self::Image(source) => {
                source.image.is_opaque()
                    && source.horizontal_tile_mode != TileMode::Decal
                    && source.vertical_tile_mode != TileMode::Decal
            }
            Self::RuntimeEffect(_) => false,
            _ => self.gradient().is_some_and(GradientStops::is_opaque),
        }
    }

    /// Whether this is one of the gradient variants.
    pub fn is_gradient(&self) -> bool {
        self.gradient().is_some()
    }

    /// Whether the source can be used by a display list built off the UI
    /// thread.
    pub fn is_ui_thread_safe(&self) -> bool {
        match self {
            Self::Image(source) => source.image.is_ui_thread_safe(),
            Self::RuntimeEffect(instance) => instance.is_ui_thread_safe(),
            _ => true,
        }
    }

    /// Approximate heap plus inline footprint, in bytes.
    pub fn size(&self) -> usize {
        let payload = match self {
            Self::RuntimeEffect(instance) => {
                instance.uniforms().len()
                    + instance.samplers().len() * size_of::<Option<Arc<Self>>>()
            }
            _ => self.gradient().map_or(0, GradientStops::payload_size),
        };
        size_of::<Self>() + payload
    }

    /// The shared gradient parameters, for gradient variants.
    pub fn gradient(&self) -> Option<&GradientStops> {
        match self {
            Self::LinearGradient(g) => Some(&g.gradient),
            Self::RadialGradient(g) => Some(&g.gradient),
            Self::ConicalGradient(g) => Some(&g.gradient),
            Self::SweepGradient(g) => Some(&g.gradient),
            _ => None,
        }
    }

    /// The solid color, for [`ColorSource::Color`].
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(color) => Some(*color),
            _ => None,
        }
    }

    /// The image parameters, for [`ColorSource::Image`].
    pub fn as_image(&self) -> Option<&ImageSource> {
        match self {
            Self::Image(source) => Some(source),
            _ => None,
        }
    }

    /// The linear gradient parameters.
    pub fn as_linear_gradient(&self) -> Option<&LinearGradient> {
        match self {
            Self::LinearGradient(g) => Some(g),
            _ => None,
        }
    }

    /// The radial gradient parameters.
    pub fn as_radial_gradient(&self) -> Option<&RadialGradient> {
        match self {
            Self::RadialGradient(g) => Some(g),
            _ => None,
        }
    }

    /// The conical gradient parameters.
    pub fn as_conical_gradient(&self) -> Option<&ConicalGradient> {
        match self {
            Self::ConicalGradient(g) => Some(g),
            _ => None,
        }
    }

    /// The sweep gradient parameters.
    pub fn as_sweep_gradient(&self) -> Option<&SweepGradient> {
        match self {
            Self::SweepGradient(g) => Some(g),
            _ => None,
        }
    }

    /// The runtime shader, for [`ColorSource::RuntimeEffect`].
    pub fn as_runtime_effect(&self) -> Option<&RuntimeEffectInstance> {
        match self {
            Self::RuntimeEffect(instance) => Some(instance),
            _ => None,
        }
    }

    /// Names the first field that differs between two sources, or `None`
    /// when they are equal.
    ///
    /// Useful for test diagnostics; equality itself is defined in terms of
    /// this function.
    pub fn difference(&self, other: &Self) -> Option<&'static str> {
        match (self, other) {
            (Self::Color(a), Self::Color(b)) => (a != b).then_some("color"),
            (Self::Image(a), Self::Image(b)) => (a != b).then_some("image"),
            (Self::LinearGradient(a), Self::LinearGradient(b)) => {
                if a.start != b.start {
                    Some("start")
                } else if a.end != b.end {
                    Some("end")
                } else {
                    a.gradient.difference(&b.gradient)
                }
            }
            (Self::RadialGradient(a), Self::RadialGradient(b)) => {
                if a.center != b.center {
                    Some("center")
                } else if a.radius != b.radius {
                    Some("radius")
                } else {
                    a.gradient.difference(&b.gradient)
                }
            }
            (Self::ConicalGradient(a), Self::ConicalGradient(b)) => {
                if a.start_center != b.start_center || a.start_radius != b.start_radius {
                    Some("start")
                } else if a.end_center != b.end_center || a.end_radius != b.end_radius {
                    Some("end")
                } else {
                    a.gradient.difference(&b.gradient)
                }
            }
            (Self::SweepGradient(a), Self::SweepGradient(b)) => {
                if a.center != b.center {
                    Some("center")
                } else if a.start_degrees != b.start_degrees || a.end_degrees != b.end_degrees {
                    Some("angles")
                } else {
                    a.gradient.difference(&b.gradient)
                }
            }
            (Self::RuntimeEffect(a), Self::RuntimeEffect(b)) => {
                (a != b).then_some("runtime_effect")
            }
            _ => Some("type"),
        }
    }

    /// Converts solid colors and gradients to a `peniko` brush.
    ///
    /// Local matrices are not part of a brush; renderers apply
    /// [`GradientStops::matrix`] as a brush transform. Images, runtime
    /// effects and decal-tiled gradients have no brush equivalent.
    pub fn to_brush(&self) -> Option<Brush> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "peniko gradients take f32 geometry"
        )]
        let gradient = match self {
            Self::Color(color) => return Some(Brush::Solid(color.to_peniko())),
            Self::LinearGradient(g) => Gradient::new_linear(g.start, g.end),
            Self::RadialGradient(g) => Gradient::new_radial(g.center, g.radius as f32),
            Self::ConicalGradient(g) => Gradient::new_two_point_radial(
                g.start_center,
                g.start_radius as f32,
                g.end_center,
                g.end_radius as f32,
            ),
            Self::SweepGradient(g) => Gradient::new_sweep(
                g.center,
                (g.start_degrees * (PI / 180.0)) as f32,
                (g.end_degrees * (PI / 180.0)) as f32,
            ),
            Self::Image(_) | Self::RuntimeEffect(_) => return None,
        };
        let stops = self.gradient()?;
        let extend = stops.tile_mode().to_extend()?;
        Some(Brush::Gradient(
            gradient
                .with_extend(extend)
                .with_stops(stops.peniko_stops().as_slice()),
        ))
    }
}

impl PartialEq for ColorSource {
    fn eq(&self, other: &Self) -> bool {
        self.difference(other).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_colors() -> [Color; 2] {
        [Color::RED, Color::BLUE]
    }

    fn linear(stops: Option<&[f32]>, tile: TileMode, matrix: Option<Affine>) -> ColorSource {
        ColorSource::linear_gradient(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            &two_colors(),
            stops,
            tile,
            matrix,
        )
        .unwrap()
    }

    #[test]
    fn independently_built_gradients_are_equal() {
        let a = linear(Some(&[0.0, 1.0]), TileMode::Clamp, None);
        let b = linear(None, TileMode::Clamp, Some(Affine::IDENTITY));
        assert_eq!(a, b, "implicit stops and identity matrix normalize away");
        assert_eq!(a.kind(), ColorSourceType::LinearGradient);
    }

    #[test]
    fn each_field_change_is_reported() {
        let base = linear(None, TileMode::Clamp, None);
        assert_eq!(
            base.difference(&linear(Some(&[0.0, 0.5]), TileMode::Clamp, None)),
            Some("stops")
        );
        assert_eq!(
            base.difference(&linear(None, TileMode::Mirror, None)),
            Some("tile_mode")
        );
        assert_eq!(
            base.difference(&linear(
                None,
                TileMode::Clamp,
                Some(Affine::translate((1.0, 0.0)))
            )),
            Some("matrix")
        );
        let other_colors = ColorSource::linear_gradient(
            Point::ZERO,
            Point::new(100.0, 0.0),
            &[Color::RED, Color::GREEN],
            None,
            TileMode::Clamp,
            None,
        )
        .unwrap();
        assert_eq!(base.difference(&other_colors), Some("colors"));
        assert_eq!(base.difference(&ColorSource::Color(Color::RED)), Some("type"));
    }

    #[test]
    fn default_stops_are_even() {
        let colors = [Color::RED, Color::GREEN, Color::BLUE];
        let g = GradientStops::new(&colors, None, TileMode::Clamp, None).unwrap();
        assert_eq!(g.stops(), &[0.0, 0.5, 1.0]);
        let single = GradientStops::new(&colors[..1], None, TileMode::Clamp, None).unwrap();
        assert_eq!(single.stops(), &[0.0]);
    }

    #[test]
    fn pathological_stops_are_forced_monotonic() {
        let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
        let g = GradientStops::new(
            &colors,
            Some(&[0.5, 0.2, f32::NAN, 3.0]),
            TileMode::Clamp,
            None,
        )
        .unwrap();
        assert_eq!(g.stops(), &[0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn malformed_gradients_are_rejected() {
        assert_eq!(
            GradientStops::new(&[], None, TileMode::Clamp, None).unwrap_err(),
            EffectError::EmptyGradient
        );
        assert!(matches!(
            GradientStops::new(&two_colors(), Some(&[0.0]), TileMode::Clamp, None),
            Err(EffectError::StopCountMismatch { colors: 2, stops: 1 })
        ));
    }

    #[test]
    fn opacity_depends_on_colors_and_tiling() {
        assert!(linear(None, TileMode::Clamp, None).is_opaque());
        assert!(!linear(None, TileMode::Decal, None).is_opaque());
        assert!(!ColorSource::Color(Color::RED.with_alpha(10)).is_opaque());
    }

    #[test]
    fn gradients_convert_to_brushes() {
        assert!(matches!(
            linear(None, TileMode::Repeat, None).to_brush(),
            Some(Brush::Gradient(_))
        ));
        assert!(linear(None, TileMode::Decal, None).to_brush().is_none());
        assert!(matches!(
            ColorSource::Color(Color::RED).to_brush(),
            Some(Brush::Solid(_))
        ));
    }
}
