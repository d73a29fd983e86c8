// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filters applied to the rendered output of a draw or layer.

use alloc::sync::Arc;
use core::mem::size_of;

use kurbo::{Affine, Rect};

use crate::{ColorFilter, ImageSampling, Matrix, RuntimeEffectInstance, TileMode};

/// Sigmas and radii below this are treated as zero.
const NEARLY_ZERO: f64 = 1.0 / 4096.0;

/// Discriminates the [`ImageFilter`] variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageFilterType {
    /// Gaussian blur.
    Blur,
    /// Morphological dilate.
    Dilate,
    /// Morphological erode.
    Erode,
    /// Transform the input.
    Matrix,
    /// Two filters in sequence.
    Compose,
    /// A color filter applied as an image filter.
    ColorFilter,
    /// A filter evaluated in a different local space.
    LocalMatrix,
    /// A user shader.
    RuntimeEffect,
}

/// What kind of local matrix a filter can absorb through
/// [`ImageFilter::with_local_matrix`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatrixCapability {
    /// Translations only.
    Translate,
    /// Scales and translations.
    ScaleTranslate,
    /// Any matrix.
    Complex,
}

/// A filter applied to the pixels produced by a draw or a save layer.
///
/// All constructors that take numeric parameters return `None` when the
/// parameters describe a filter that would not change anything, so holding a
/// filter always means there is work to do.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageFilter {
    /// Gaussian blur with independent sigmas.
    Blur {
        /// Horizontal sigma.
        sigma_x: f64,
        /// Vertical sigma.
        sigma_y: f64,
        /// Edge treatment.
        tile_mode: TileMode,
    },
    /// Grows opaque regions by the radii.
    Dilate {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
    },
    /// Shrinks opaque regions by the radii.
    Erode {
        /// Horizontal radius.
        radius_x: f64,
        /// Vertical radius.
        radius_y: f64,
    },
    /// Transforms the input image.
    Matrix {
        /// The transform.
        matrix: Affine,
        /// Sampling used when resampling.
        sampling: ImageSampling,
    },
    /// Applies `inner` first, then `outer`.
    Compose {
        /// Applied last.
        outer: Arc<ImageFilter>,
        /// Applied first.
        inner: Arc<ImageFilter>,
    },
    /// Applies a color filter to every pixel.
    ColorFilter(Arc<ColorFilter>),
    /// Evaluates `filter` as if `matrix` were pre-concatenated onto the
    /// current transform.
    LocalMatrix {
        /// The local transform.
        matrix: Affine,
        /// The wrapped filter.
        filter: Arc<ImageFilter>,
    },
    /// A user shader.
    RuntimeEffect(RuntimeEffectInstance),
}

impl ImageFilter {
    /// A blur, or `None` when both sigmas are negligible or either is not
    /// finite.
    pub fn blur(sigma_x: f64, sigma_y: f64, tile_mode: TileMode) -> Option<Self> {
        let Some((sigma_x, sigma_y)) = positive_pair(sigma_x, sigma_y) else {
            tracing::trace!(sigma_x, sigma_y, "negligible blur is no filter");
            return None;
        };
        Some(Self::Blur {
            sigma_x,
            sigma_y,
            tile_mode,
        })
    }

    /// A dilate, or `None` when both radii are negligible or either is not
    /// finite.
    pub fn dilate(radius_x: f64, radius_y: f64) -> Option<Self> {
        let (radius_x, radius_y) = positive_pair(radius_x, radius_y)?;
        Some(Self::Dilate { radius_x, radius_y })
    }

    /// An erode, or `None` when both radii are negligible or either is not
    /// finite.
    pub fn erode(radius_x: f64, radius_y: f64) -> Option<Self> {
        let (radius_x, radius_y) = positive_pair(radius_x, radius_y)?;
        Some(Self::Erode { radius_x, radius_y })
    }

    /// A matrix filter, or `None` for an identity or non-finite matrix.
    pub fn matrix(matrix: Affine, sampling: ImageSampling) -> Option<Self> {
        if matrix == Affine::IDENTITY || !matrix.is_finite() {
            tracing::trace!(?matrix, "identity or non-finite matrix is no filter");
            return None;
        }
        Some(Self::Matrix { matrix, sampling })
    }

    /// Runs `inner` then `outer`. A missing side yields the other side.
    pub fn compose(outer: Option<Arc<Self>>, inner: Option<Arc<Self>>) -> Option<Arc<Self>> {
        match (outer, inner) {
            (Some(outer), Some(inner)) => Some(Arc::new(Self::Compose { outer, inner })),
            (outer, None) => outer,
            (None, inner) => inner,
        }
    }

    /// Wraps a color filter, if there is one.
    pub fn from_color_filter(filter: Option<Arc<ColorFilter>>) -> Option<Self> {
        filter.map(Self::ColorFilter)
    }

    /// Wraps this filter in a local matrix.
    ///
    /// An identity matrix returns the filter unchanged. Returns `None` when
    /// the matrix is more complex than [`ImageFilter::matrix_capability`]
    /// allows.
    pub fn with_local_matrix(self: &Arc<Self>, matrix: Affine) -> Option<Arc<Self>> {
        if matrix == Affine::IDENTITY {
            return Some(self.clone());
        }
        let m = Matrix::from_affine(matrix);
        let allowed = match self.matrix_capability() {
            MatrixCapability::Translate => m.is_translate(),
            MatrixCapability::ScaleTranslate => m.is_scale_translate(),
            MatrixCapability::Complex => true,
        };
        allowed.then(|| {
            Arc::new(Self::LocalMatrix {
                matrix,
                filter: self.clone(),
            })
        })
    }

    /// Which variant this is.
    pub fn kind(&self) -> ImageFilterType {
        match self {
            Self::Blur { .. } => ImageFilterType::Blur,
            Self::Dilate { .. } => ImageFilterType::Dilate,
            Self::Erode { .. } => ImageFilterType::Erode,
            Self::Matrix { .. } => ImageFilterType::Matrix,
            Self::Compose { .. } => ImageFilterType::Compose,
            Self::ColorFilter(_) => ImageFilterType::ColorFilter,
            Self::LocalMatrix { .. } => ImageFilterType::LocalMatrix,
            Self::RuntimeEffect(_) => ImageFilterType::RuntimeEffect,
        }
    }

    /// The most complex local matrix this filter can absorb.
    pub fn matrix_capability(&self) -> MatrixCapability {
        match self {
            Self::Blur { .. } | Self::Dilate { .. } | Self::Erode { .. } => {
                MatrixCapability::ScaleTranslate
            }
            Self::Compose { outer, inner } => {
                outer.matrix_capability().min(inner.matrix_capability())
            }
            Self::LocalMatrix { filter, .. } => filter.matrix_capability(),
            Self::RuntimeEffect(_) => MatrixCapability::Translate,
            Self::Matrix { .. } | Self::ColorFilter(_) => MatrixCapability::Complex,
        }
    }

    /// Whether filtering a fully transparent input produces visible pixels.
    pub fn modifies_transparent_black(&self) -> bool {
        match self {
            Self::Compose { outer, inner } => {
                outer.modifies_transparent_black() || inner.modifies_transparent_black()
            }
            Self::ColorFilter(filter) => filter.modifies_transparent_black(),
            Self::LocalMatrix { filter, .. } => filter.modifies_transparent_black(),
            _ => false,
        }
    }

    /// Whether the filter can be used by a display list built off the UI
    /// thread.
    pub fn is_ui_thread_safe(&self) -> bool {
        match self {
            Self::Compose { outer, inner } => {
                outer.is_ui_thread_safe() && inner.is_ui_thread_safe()
            }
            Self::LocalMatrix { filter, .. } => filter.is_ui_thread_safe(),
            Self::RuntimeEffect(instance) => instance.is_ui_thread_safe(),
            _ => true,
        }
    }

    /// Approximate footprint, in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::RuntimeEffect(instance) => size_of::<Self>() + instance.uniforms().len(),
            _ => size_of::<Self>(),
        }
    }

    /// Bounds of the output in the filter's local space, given the bounds of
    /// its input.
    ///
    /// Returns `None` when the output is unbounded.
    pub fn map_local_bounds(&self, input: Rect) -> Option<Rect> {
        match self {
            Self::Blur {
                sigma_x, sigma_y, ..
            } => Some(input.inflate(sigma_x * 3.0, sigma_y * 3.0)),
            Self::Dilate { radius_x, radius_y } => Some(input.inflate(*radius_x, *radius_y)),
            Self::Erode { radius_x, radius_y } => Some(inset(input, *radius_x, *radius_y)),
            Self::Matrix { matrix, .. } => Some(matrix.transform_rect_bbox(input)),
            Self::Compose { outer, inner } => {
                outer.map_local_bounds(inner.map_local_bounds(input)?)
            }
            Self::ColorFilter(filter) => (!filter.modifies_transparent_black()).then_some(input),
            Self::LocalMatrix { matrix, filter } => {
                let inverse = invert_affine(*matrix)?;
                let local = inverse.transform_rect_bbox(input);
                Some(matrix.transform_rect_bbox(filter.map_local_bounds(local)?))
            }
            Self::RuntimeEffect(_) => Some(input),
        }
    }

    /// Device-space bounds of the output, given device-space input bounds
    /// and the transform the filter is applied under.
    ///
    /// The result is rounded out to whole pixels. Returns `None` when the
    /// output is unbounded or cannot be expressed under `ctm`.
    pub fn map_device_bounds(&self, input: Rect, ctm: &Matrix) -> Option<Rect> {
        let output = match self {
            Self::Blur {
                sigma_x, sigma_y, ..
            } => {
                let outset = ctm.map_outset(sigma_x * 3.0, sigma_y * 3.0)?;
                input.inflate(outset.x, outset.y)
            }
            Self::Dilate { radius_x, radius_y } => {
                let outset = ctm.map_outset(*radius_x, *radius_y)?;
                input.inflate(outset.x, outset.y)
            }
            Self::Erode { radius_x, radius_y } => {
                let outset = ctm.map_outset(*radius_x, *radius_y)?;
                inset(input, outset.x, outset.y)
            }
            Self::Matrix { matrix, .. } => {
                let device = device_matrix(ctm, *matrix)?;
                device.map_rect(input)?
            }
            Self::Compose { outer, inner } => {
                let mid = inner.map_device_bounds(input, ctm)?;
                outer.map_device_bounds(mid, ctm)?
            }
            Self::ColorFilter(filter) => {
                if filter.modifies_transparent_black() {
                    return None;
                }
                input
            }
            Self::LocalMatrix { matrix, filter } => {
                let ctm = ctm.concat(&Matrix::from_affine(*matrix));
                filter.map_device_bounds(input, &ctm)?
            }
            Self::RuntimeEffect(_) => input,
        };
        Some(output.expand())
    }

    /// Device-space bounds of the input needed to produce the given output
    /// bounds.
    ///
    /// This is the reverse of [`ImageFilter::map_device_bounds`]: composed
    /// filters are walked outer first, and erode grows rather than shrinks.
    pub fn get_input_device_bounds(&self, output: Rect, ctm: &Matrix) -> Option<Rect> {
        let input = match self {
            Self::Blur {
                sigma_x, sigma_y, ..
            } => {
                let outset = ctm.map_outset(sigma_x * 3.0, sigma_y * 3.0)?;
                output.inflate(outset.x, outset.y)
            }
            Self::Dilate { radius_x, radius_y } => {
                let outset = ctm.map_outset(*radius_x, *radius_y)?;
                inset(output, outset.x, outset.y)
            }
            Self::Erode { radius_x, radius_y } => {
                let outset = ctm.map_outset(*radius_x, *radius_y)?;
                output.inflate(outset.x, outset.y)
            }
            Self::Matrix { matrix, .. } => {
                let device = device_matrix(ctm, *matrix)?.invert()?;
                device.map_rect(output)?
            }
            Self::Compose { outer, inner } => {
                let mid = outer.get_input_device_bounds(output, ctm)?;
                inner.get_input_device_bounds(mid, ctm)?
            }
            Self::ColorFilter(_) | Self::RuntimeEffect(_) => output,
            Self::LocalMatrix { matrix, filter } => {
                let ctm = ctm.concat(&Matrix::from_affine(*matrix));
                filter.get_input_device_bounds(output, &ctm)?
            }
        };
        Some(input.expand())
    }
}

/// Clamps a pair of non-negative parameters, rejecting non-finite values and
/// pairs where both are negligible.
fn positive_pair(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    if x < NEARLY_ZERO && y < NEARLY_ZERO {
        return None;
    }
    let clamp = |v: f64| if v < NEARLY_ZERO { 0.0 } else { v };
    Some((clamp(x), clamp(y)))
}

/// Shrinks `rect`, collapsing to its center instead of inverting.
fn inset(rect: Rect, dx: f64, dy: f64) -> Rect {
    let mut out = rect.inflate(-dx, -dy);
    if out.x0 > out.x1 {
        let cx = (rect.x0 + rect.x1) * 0.5;
        out.x0 = cx;
        out.x1 = cx;
    }
    if out.y0 > out.y1 {
        let cy = (rect.y0 + rect.y1) * 0.5;
        out.y0 = cy;
        out.y1 = cy;
    }
    out
}

fn invert_affine(matrix: Affine) -> Option<Affine> {
    let det = matrix.determinant();
    (det != 0.0 && det.is_finite()).then(|| matrix.inverse())
}

/// `ctm * matrix * ctm^-1`: the filter transform expressed in device space.
fn device_matrix(ctm: &Matrix, matrix: Affine) -> Option<Matrix> {
    let inverse = ctm.invert()?;
    Some(ctm.concat(&Matrix::from_affine(matrix)).concat(&inverse))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlendMode, Color};

    fn rect() -> Rect {
        Rect::new(10.0, 10.0, 20.0, 20.0)
    }

    #[test]
    fn degenerate_parameters_yield_no_filter() {
        assert!(ImageFilter::blur(0.0, 0.0, TileMode::Decal).is_none());
        assert!(ImageFilter::blur(f64::NAN, 1.0, TileMode::Decal).is_none());
        assert!(ImageFilter::dilate(0.0, 0.0).is_none());
        assert!(ImageFilter::matrix(Affine::IDENTITY, ImageSampling::Linear).is_none());
        assert_eq!(
            ImageFilter::blur(-1.0, 2.0, TileMode::Clamp),
            Some(ImageFilter::Blur {
                sigma_x: 0.0,
                sigma_y: 2.0,
                tile_mode: TileMode::Clamp
            })
        );
    }

    #[test]
    fn blur_outsets_by_three_sigma() {
        let blur = ImageFilter::blur(2.0, 1.0, TileMode::Clamp).unwrap();
        assert_eq!(
            blur.map_local_bounds(rect()),
            Some(Rect::new(4.0, 7.0, 26.0, 23.0))
        );
        let scaled = blur
            .map_device_bounds(rect(), &Matrix::scale(2.0, 2.0))
            .unwrap();
        assert_eq!(scaled, Rect::new(-2.0, 4.0, 32.0, 26.0));
    }

    #[test]
    fn erode_shrinks_output_and_grows_input() {
        let erode = ImageFilter::erode(2.0, 2.0).unwrap();
        assert_eq!(
            erode.map_local_bounds(rect()),
            Some(Rect::new(12.0, 12.0, 18.0, 18.0))
        );
        assert_eq!(
            erode.get_input_device_bounds(rect(), &Matrix::IDENTITY),
            Some(Rect::new(8.0, 8.0, 22.0, 22.0))
        );
        let tiny = ImageFilter::erode(20.0, 20.0).unwrap();
        let out = tiny.map_local_bounds(rect()).unwrap();
        assert_eq!(out.area(), 0.0, "over-eroded bounds collapse");
    }

    #[test]
    fn compose_orders_inner_then_outer() {
        let inner = Arc::new(ImageFilter::dilate(5.0, 5.0).unwrap());
        let outer = Arc::new(
            ImageFilter::matrix(Affine::scale(2.0), ImageSampling::Linear).unwrap(),
        );
        let composed = ImageFilter::compose(Some(outer), Some(inner)).unwrap();
        assert_eq!(
            composed.map_local_bounds(rect()),
            Some(Rect::new(10.0, 10.0, 50.0, 50.0))
        );
        let dilate = ImageFilter::dilate(1.0, 1.0).map(Arc::new);
        let only = ImageFilter::compose(None, dilate);
        assert_eq!(only.unwrap().kind(), ImageFilterType::Dilate);
    }

    #[test]
    fn color_filter_that_floods_is_unbounded() {
        let flood = Arc::new(ColorFilter::blend(Color::RED, BlendMode::SrcOver).unwrap());
        let filter = ImageFilter::from_color_filter(Some(flood)).unwrap();
        assert!(filter.modifies_transparent_black());
        assert_eq!(filter.map_local_bounds(rect()), None);
        assert_eq!(filter.map_device_bounds(rect(), &Matrix::IDENTITY), None);
    }

    #[test]
    fn matrix_filter_device_bounds_conjugate_by_ctm() {
        let filter = ImageFilter::matrix(Affine::translate((5.0, 0.0)), ImageSampling::Linear)
            .unwrap();
        let out = filter
            .map_device_bounds(rect(), &Matrix::scale(2.0, 2.0))
            .unwrap();
        assert_eq!(out, Rect::new(20.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn local_matrix_respects_capability() {
        let blur = Arc::new(ImageFilter::blur(1.0, 1.0, TileMode::Clamp).unwrap());
        assert!(blur.with_local_matrix(Affine::scale(2.0)).is_some());
        assert!(blur.with_local_matrix(Affine::rotate(0.5)).is_none());
        assert!(Arc::ptr_eq(
            &blur.with_local_matrix(Affine::IDENTITY).unwrap(),
            &blur
        ));
    }

    #[test]
    fn perspective_blur_is_unbounded() {
        let mut values = *Matrix::IDENTITY.as_row_major();
        values[13] = 0.01;
        let blur = ImageFilter::blur(1.0, 1.0, TileMode::Clamp).unwrap();
        assert_eq!(
            blur.map_device_bounds(rect(), &Matrix::from_row_major(values)),
            None
        );
    }
}
