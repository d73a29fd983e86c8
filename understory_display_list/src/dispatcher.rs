// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visitor interface for recording and replaying display lists.

use alloc::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};
use understory_display_effects::{
    BlendMode, Blender, BlurStyle, Color, ColorFilter, ColorSource, DlImage, FilterMode,
    ImageFilter, ImageSampling, MaskFilter, Matrix, PathEffect,
};

use crate::{
    ClipOp, DisplayList, DlPicture, DrawStyle, Lattice, PointMode, RsTransform, SaveLayerOptions,
    SrcRectConstraint, StrokeCap, StrokeJoin, TextRun, Vertices,
};

/// Receives the operations of a display list, one call per record.
///
/// [`DisplayList::dispatch`] walks the records in order and calls the
/// matching method. The same interface is used for recording: the
/// [`DisplayListBuilder`](crate::DisplayListBuilder) implements it, so
/// dispatching a list into a builder copies the list.
///
/// Every method has an empty default so receivers only implement what they
/// care about. Attribute setters describe the full state change: an object
/// setter receiving `None` means the attribute was cleared.
///
/// Nested display lists are delivered as a single
/// [`Dispatcher::draw_display_list`] call; whether to recurse is up to the
/// receiver.
#[allow(unused_variables, reason = "default methods ignore their arguments")]
pub trait Dispatcher {
    /// Anti-aliasing on or off.
    fn set_anti_alias(&mut self, aa: bool) {}
    /// Dithering on or off.
    fn set_dither(&mut self, dither: bool) {}
    /// Color inversion on or off.
    fn set_invert_colors(&mut self, invert: bool) {}
    /// Stroke end cap.
    fn set_stroke_cap(&mut self, cap: StrokeCap) {}
    /// Stroke join.
    fn set_stroke_join(&mut self, join: StrokeJoin) {}
    /// Fill, stroke, or both.
    fn set_draw_style(&mut self, style: DrawStyle) {}
    /// Stroke width; `0` means hairline.
    fn set_stroke_width(&mut self, width: f64) {}
    /// Miter limit.
    fn set_stroke_miter(&mut self, limit: f64) {}
    /// Paint color.
    fn set_color(&mut self, color: Color) {}
    /// Blend mode. Also clears any custom blender.
    fn set_blend_mode(&mut self, mode: BlendMode) {}
    /// Custom blender.
    fn set_blender(&mut self, blender: Option<&Arc<Blender>>) {}
    /// Color source.
    fn set_color_source(&mut self, source: Option<&Arc<ColorSource>>) {}
    /// Color filter.
    fn set_color_filter(&mut self, filter: Option<&Arc<ColorFilter>>) {}
    /// Image filter.
    fn set_image_filter(&mut self, filter: Option<&Arc<ImageFilter>>) {}
    /// Path effect.
    fn set_path_effect(&mut self, effect: Option<&Arc<PathEffect>>) {}
    /// Mask filter.
    fn set_mask_filter(&mut self, filter: Option<&Arc<MaskFilter>>) {}
    /// Blur mask filter given by its parameters.
    fn set_mask_blur_filter(&mut self, style: BlurStyle, sigma: f64) {}

    /// Pushes transform and clip state.
    fn save(&mut self) {}
    /// Pushes state and an offscreen layer.
    ///
    /// `bounds` is a hint for the layer's extent in local coordinates.
    /// `backdrop` filters what is already drawn behind the layer.
    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&Arc<ImageFilter>>,
    ) {
    }
    /// Pops the most recent save or save layer.
    fn restore(&mut self) {}

    /// Translates.
    fn translate(&mut self, tx: f64, ty: f64) {}
    /// Scales.
    fn scale(&mut self, sx: f64, sy: f64) {}
    /// Rotates clockwise by degrees.
    fn rotate(&mut self, degrees: f64) {}
    /// Skews.
    fn skew(&mut self, sx: f64, sy: f64) {}
    /// Concatenates `x' = mxx*x + mxy*y + mxt`, `y' = myx*x + myy*y + myt`.
    fn transform_2d_affine(&mut self, mxx: f64, mxy: f64, mxt: f64, myx: f64, myy: f64, myt: f64) {
    }
    /// Concatenates a 4x4 matrix.
    fn transform_full_perspective(&mut self, matrix: &Matrix) {}
    /// Resets to the transform the list was dispatched under.
    fn transform_reset(&mut self) {}

    /// Clips to a rect.
    fn clip_rect(&mut self, rect: Rect, op: ClipOp, is_aa: bool) {}
    /// Clips to a rounded rect.
    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, is_aa: bool) {}
    /// Clips to a path.
    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, is_aa: bool) {}

    /// Fills the clip with the current paint.
    fn draw_paint(&mut self) {}
    /// Fills the clip with a color.
    fn draw_color(&mut self, color: Color, mode: BlendMode) {}
    /// A line segment.
    fn draw_line(&mut self, p0: Point, p1: Point) {}
    /// A rectangle.
    fn draw_rect(&mut self, rect: Rect) {}
    /// An oval inscribed in `bounds`.
    fn draw_oval(&mut self, bounds: Rect) {}
    /// A circle.
    fn draw_circle(&mut self, center: Point, radius: f64) {}
    /// A rounded rectangle.
    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {}
    /// The region inside `outer` and outside `inner`.
    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect) {}
    /// A path.
    fn draw_path(&mut self, path: &Arc<BezPath>) {}
    /// An arc of the oval inscribed in `oval_bounds`, optionally closed
    /// through the center.
    fn draw_arc(
        &mut self,
        oval_bounds: Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
    ) {
    }
    /// Points, line segments or a polyline.
    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {}
    /// A triangle mesh.
    fn draw_vertices(&mut self, vertices: &Arc<Vertices>, mode: BlendMode) {}
    /// An image with its top-left corner at `point`.
    fn draw_image(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
    }
    /// The `src` part of an image, scaled into `dst`.
    fn draw_image_rect(
        &mut self,
        image: &Arc<dyn DlImage>,
        src: Rect,
        dst: Rect,
        sampling: ImageSampling,
        render_with_attributes: bool,
        constraint: SrcRectConstraint,
    ) {
    }
    /// A nine-patch: `center` stretches, the borders do not.
    fn draw_image_nine(
        &mut self,
        image: &Arc<dyn DlImage>,
        center: Rect,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
    }
    /// A lattice-stretched image.
    fn draw_image_lattice(
        &mut self,
        image: &Arc<dyn DlImage>,
        lattice: &Lattice,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
    }
    /// Sprites from `atlas`, one per transform.
    ///
    /// `tex` has one source rect per transform. `colors`, when present, has
    /// one color per sprite, blended with the sprite using `mode`.
    fn draw_atlas(
        &mut self,
        atlas: &Arc<dyn DlImage>,
        xforms: &[RsTransform],
        tex: &[Rect],
        colors: Option<&[Color]>,
        mode: BlendMode,
        sampling: ImageSampling,
        cull_rect: Option<Rect>,
        render_with_attributes: bool,
    ) {
    }
    /// A nested display list.
    fn draw_display_list(&mut self, display_list: &Arc<DisplayList>) {}
    /// An external picture.
    fn draw_picture(
        &mut self,
        picture: &Arc<dyn DlPicture>,
        matrix: Option<Affine>,
        render_with_attributes: bool,
    ) {
    }
    /// A text run with its origin at `(x, y)`.
    fn draw_text_run(&mut self, run: &Arc<dyn TextRun>, x: f64, y: f64) {}
    /// The shadow cast by `path` at `elevation` above the surface.
    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        color: Color,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    ) {
    }
}
