// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conservative bounds of everything a display list can touch.

use alloc::sync::Arc;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _; // for `abs`
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape};
use smallvec::SmallVec;
use understory_display_effects::{
    BlendMode, Blender, BlurStyle, Color, ColorFilter, ColorSource, DlImage, FilterMode,
    ImageFilter, ImageSampling, MaskFilter, Matrix, PathEffect,
};

use crate::{
    ClipOp, DisplayList, DisplayListAttributeFlags, DisplayListOpFlags, Dispatcher, DlPicture,
    DrawStyle, Lattice, Paint, PaintBlend, PaintMask, PointMode, RsTransform, SaveLayerOptions,
    SrcRectConstraint, StrokeCap, StrokeJoin, TextRun, Vertices,
};

/// Stroke pad used for hairlines so zero-width strokes still grow bounds.
const MIN_STROKE_HALF_WIDTH: f64 = 0.01;
/// Height of the light above the canvas for shadow bounds.
const SHADOW_LIGHT_HEIGHT: f64 = 600.0;
/// Radius of the shadow light, in logical pixels.
const SHADOW_LIGHT_RADIUS: f64 = 800.0;

#[derive(Clone, Debug)]
struct SaveEntry {
    matrix: Matrix,
    clip: Option<Rect>,
    is_layer: bool,
}

/// Content collected inside one save layer, in the list's coordinates.
#[derive(Clone, Debug, Default)]
struct LayerBounds {
    content: Option<Rect>,
    /// Transform in effect when the layer was opened.
    matrix: Matrix,
    image_filter: Option<Arc<ImageFilter>>,
    /// False when compositing the layer can change pixels the layer never
    /// drew, for example a color filter that tints transparent black.
    nops_on_transparency: bool,
    has_backdrop: bool,
    /// The caller-supplied extent, in the layer's local coordinates.
    bounds_hint: Option<Rect>,
}

impl LayerBounds {
    fn root() -> Self {
        Self {
            nops_on_transparency: true,
            ..Self::default()
        }
    }
}

/// A [`Dispatcher`] that computes the bounds of a display list.
///
/// The result is in the coordinates the list was recorded in and contains
/// every pixel a replay could touch: strokes are padded for caps and joins,
/// mask blurs and image filters are applied, and anything unbounded (floods,
/// filters that tint transparent black, backdrops) is limited by the clip in
/// effect at the time.
///
/// Clips are tracked as device-space rectangles. Non-rectangular clips use
/// their bounding box and difference clips are ignored, so the clip is always
/// a superset of the real one.
#[derive(Clone, Debug)]
pub struct BoundsCalculator {
    paint: Paint,
    matrix: Matrix,
    clip: Option<Rect>,
    saves: SmallVec<[SaveEntry; 8]>,
    layers: SmallVec<[LayerBounds; 4]>,
    flood_bounds: Option<Rect>,
}

impl BoundsCalculator {
    /// A calculator whose initial clip is `cull_rect`.
    pub fn new(cull_rect: Rect) -> Self {
        let mut layers = SmallVec::new();
        layers.push(LayerBounds::root());
        Self {
            paint: Paint::default(),
            matrix: Matrix::IDENTITY,
            clip: Some(cull_rect),
            saves: SmallVec::new(),
            layers,
            flood_bounds: None,
        }
    }

    /// Closes any open saves and returns the bounds and the flood bounds.
    ///
    /// Bounds are `None` when nothing visible was drawn. Flood bounds are
    /// `None` when no flood op was seen; when present they are already part of
    /// the bounds.
    pub fn finish(mut self) -> (Option<Rect>, Option<Rect>) {
        while !self.saves.is_empty() {
            self.restore();
        }
        let content = self.layers.first().and_then(|root| root.content);
        (union_opt(content, self.flood_bounds), self.flood_bounds)
    }

    fn accumulate_device(&mut self, rect: Rect) {
        if !is_finite(rect) {
            self.accumulate_unbounded();
            return;
        }
        let Some(clipped) = self.clip.and_then(|clip| intersect(clip, rect)) else {
            return;
        };
        if let Some(layer) = self.layers.last_mut() {
            layer.content = union_opt(layer.content, Some(clipped));
        }
    }

    fn accumulate_unbounded(&mut self) {
        if let Some(clip) = self.clip
            && let Some(layer) = self.layers.last_mut()
        {
            layer.content = union_opt(layer.content, Some(clip));
        }
    }

    fn accumulate_local(&mut self, rect: Rect) {
        match self.matrix.map_rect(rect) {
            Some(device) => self.accumulate_device(device),
            None => self.accumulate_unbounded(),
        }
    }

    /// Accumulates `rect` after padding it for the paint attributes `flags`
    /// consults.
    fn accumulate_op(&mut self, rect: Rect, flags: DisplayListAttributeFlags) {
        match self.adjust_for_paint(rect.abs(), flags) {
            Some(rect) => self.accumulate_local(rect),
            None => self.accumulate_unbounded(),
        }
    }

    fn accumulate_flood(&mut self) {
        if let Some(clip) = self.clip {
            self.flood_bounds = union_opt(self.flood_bounds, Some(clip));
        }
        self.accumulate_unbounded();
    }

    /// Pads local bounds for stroking, path effects, mask and image filters.
    ///
    /// Returns `None` when the result is unbounded.
    fn adjust_for_paint(&self, mut bounds: Rect, flags: DisplayListAttributeFlags) -> Option<Rect> {
        if flags.ignores_paint() {
            return Some(bounds);
        }
        if flags.is_geometric() {
            let is_stroked = flags.is_stroked(self.paint.draw_style);
            let flags = flags.with_path_effect(self.paint.path_effect.as_deref(), is_stroked);
            if flags.applies_path_effect()
                && let Some(effect) = &self.paint.path_effect
            {
                bounds = effect.effect_bounds(bounds)?;
            }
            if is_stroked {
                let pad = self.stroke_pad(flags);
                bounds = bounds.inflate(pad, pad);
            }
        }
        if flags.applies_mask_filter() {
            let radius = self.paint.mask.effect_radius();
            if radius > 0.0 {
                bounds = bounds.inflate(radius, radius);
            }
        }
        if flags.applies_image_filter()
            && let Some(filter) = &self.paint.image_filter
        {
            bounds = filter.map_local_bounds(bounds)?;
        }
        Some(bounds)
    }

    fn stroke_pad(&self, flags: DisplayListAttributeFlags) -> f64 {
        let mut pad: f64 = 1.0;
        if self.paint.stroke_join == StrokeJoin::Miter && flags.may_have_acute_joins() {
            pad = pad.max(self.paint.stroke_miter);
        }
        if self.paint.stroke_cap == StrokeCap::Square && flags.may_have_diagonal_caps() {
            pad = pad.max(core::f64::consts::SQRT_2);
        }
        pad * (self.paint.stroke_width * 0.5).max(MIN_STROKE_HALF_WIDTH)
    }

    fn clip_bounds(&mut self, local: Rect, op: ClipOp) {
        if op == ClipOp::Difference {
            return;
        }
        let Some(device) = self.matrix.map_rect(local.abs()) else {
            return;
        };
        self.clip = self.clip.and_then(|clip| intersect(clip, device));
    }

    fn image_flags(
        render_with_attributes: bool,
        with_paint: DisplayListAttributeFlags,
    ) -> DisplayListAttributeFlags {
        if render_with_attributes {
            with_paint
        } else {
            DisplayListAttributeFlags::IGNORES_PAINT
        }
    }

    fn restore_layer(&mut self, layer: LayerBounds) {
        let mut bounds = layer.content;
        if let Some(hint) = layer.bounds_hint {
            bounds = layer.matrix.map_rect(hint.abs());
        }
        let mut unbounded = layer.has_backdrop || !layer.nops_on_transparency;
        if let Some(filter) = &layer.image_filter {
            if filter.modifies_transparent_black() {
                unbounded = true;
            } else if let Some(content) = bounds {
                match filter.map_device_bounds(content, &layer.matrix) {
                    Some(filtered) => bounds = Some(filtered),
                    None => unbounded = true,
                }
            }
        }
        if unbounded {
            self.accumulate_unbounded();
        } else if let Some(bounds) = bounds {
            self.accumulate_device(bounds);
        }
    }
}

fn is_finite(rect: Rect) -> bool {
    rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()
}

/// Intersection that keeps zero-area results but drops disjoint ones.
fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1);
    let y1 = a.y1.min(b.y1);
    (x0 <= x1 && y0 <= y1).then(|| Rect::new(x0, y0, x1, y1))
}

fn union_opt(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn points_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Bounds of the shadow cast by an occluder with `bounds` at `elevation`.
pub(crate) fn shadow_bounds(bounds: Rect, elevation: f64, dpr: f64) -> Rect {
    let elevation = elevation.abs();
    let dx = elevation * (SHADOW_LIGHT_RADIUS * dpr + bounds.width() * 0.5) / SHADOW_LIGHT_HEIGHT;
    let dy = elevation * (SHADOW_LIGHT_RADIUS * dpr + bounds.height() * 0.5) / SHADOW_LIGHT_HEIGHT;
    bounds.inflate(dx, dy)
}

impl Dispatcher for BoundsCalculator {
    fn set_anti_alias(&mut self, aa: bool) {
        self.paint.anti_alias = aa;
    }

    fn set_dither(&mut self, dither: bool) {
        self.paint.dither = dither;
    }

    fn set_invert_colors(&mut self, invert: bool) {
        self.paint.invert_colors = invert;
    }

    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        self.paint.stroke_cap = cap;
    }

    fn set_stroke_join(&mut self, join: StrokeJoin) {
        self.paint.stroke_join = join;
    }

    fn set_draw_style(&mut self, style: DrawStyle) {
        self.paint.draw_style = style;
    }

    fn set_stroke_width(&mut self, width: f64) {
        self.paint.stroke_width = width;
    }

    fn set_stroke_miter(&mut self, limit: f64) {
        self.paint.stroke_miter = limit;
    }

    fn set_color(&mut self, color: Color) {
        self.paint.color = color;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.paint.blend = PaintBlend::Mode(mode);
    }

    fn set_blender(&mut self, blender: Option<&Arc<Blender>>) {
        self.paint.blend = PaintBlend::from_blender(blender);
    }

    fn set_color_source(&mut self, source: Option<&Arc<ColorSource>>) {
        self.paint.color_source = source.cloned();
    }

    fn set_color_filter(&mut self, filter: Option<&Arc<ColorFilter>>) {
        self.paint.color_filter = filter.cloned();
    }

    fn set_image_filter(&mut self, filter: Option<&Arc<ImageFilter>>) {
        self.paint.image_filter = filter.cloned();
    }

    fn set_path_effect(&mut self, effect: Option<&Arc<PathEffect>>) {
        self.paint.path_effect = effect.cloned();
    }

    fn set_mask_filter(&mut self, filter: Option<&Arc<MaskFilter>>) {
        self.paint.mask = filter.map_or(PaintMask::None, |f| PaintMask::Filter(f.clone()));
    }

    fn set_mask_blur_filter(&mut self, style: BlurStyle, sigma: f64) {
        self.paint.mask = PaintMask::blur(style, sigma);
    }

    fn save(&mut self) {
        self.saves.push(SaveEntry {
            matrix: self.matrix,
            clip: self.clip,
            is_layer: false,
        });
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&Arc<ImageFilter>>,
    ) {
        self.saves.push(SaveEntry {
            matrix: self.matrix,
            clip: self.clip,
            is_layer: true,
        });
        let with_attributes = options.contains(SaveLayerOptions::RENDERS_WITH_ATTRIBUTES);
        self.layers.push(LayerBounds {
            content: None,
            matrix: self.matrix,
            image_filter: self
                .paint
                .image_filter
                .clone()
                .filter(|_| with_attributes),
            nops_on_transparency: !with_attributes || self.paint.nops_on_transparent_source(),
            has_backdrop: backdrop.is_some(),
            bounds_hint: bounds,
        });
    }

    fn restore(&mut self) {
        let Some(save) = self.saves.pop() else {
            return;
        };
        self.matrix = save.matrix;
        self.clip = save.clip;
        if save.is_layer
            && self.layers.len() > 1
            && let Some(layer) = self.layers.pop()
        {
            self.restore_layer(layer);
        }
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.matrix = self.matrix.concat(&Matrix::translate(tx, ty));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.matrix = self.matrix.concat(&Matrix::scale(sx, sy));
    }

    fn rotate(&mut self, degrees: f64) {
        self.matrix = self.matrix.concat(&Matrix::rotate_degrees(degrees));
    }

    fn skew(&mut self, sx: f64, sy: f64) {
        self.matrix = self.matrix.concat(&Matrix::skew(sx, sy));
    }

    fn transform_2d_affine(&mut self, mxx: f64, mxy: f64, mxt: f64, myx: f64, myy: f64, myt: f64) {
        self.matrix = self
            .matrix
            .concat(&Matrix::from_2d_affine(mxx, mxy, mxt, myx, myy, myt));
    }

    fn transform_full_perspective(&mut self, matrix: &Matrix) {
        self.matrix = self.matrix.concat(matrix);
    }

    fn transform_reset(&mut self) {
        self.matrix = Matrix::IDENTITY;
    }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, _is_aa: bool) {
        self.clip_bounds(rect, op);
    }

    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, _is_aa: bool) {
        self.clip_bounds(rrect.rect(), op);
    }

    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, _is_aa: bool) {
        self.clip_bounds(path.bounding_box(), op);
    }

    fn draw_paint(&mut self) {
        self.accumulate_flood();
    }

    fn draw_color(&mut self, _color: Color, _mode: BlendMode) {
        self.accumulate_flood();
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        let flags = if p0.x == p1.x || p0.y == p1.y {
            DisplayListOpFlags::DRAW_HV_LINE
        } else {
            DisplayListOpFlags::DRAW_LINE
        };
        self.accumulate_op(Rect::from_points(p0, p1), flags);
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.accumulate_op(rect, DisplayListOpFlags::DRAW_RECT);
    }

    fn draw_oval(&mut self, bounds: Rect) {
        self.accumulate_op(bounds, DisplayListOpFlags::DRAW_OVAL);
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        let r = radius.abs();
        let rect = Rect::new(center.x - r, center.y - r, center.x + r, center.y + r);
        self.accumulate_op(rect, DisplayListOpFlags::DRAW_CIRCLE);
    }

    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        self.accumulate_op(rrect.rect(), DisplayListOpFlags::DRAW_ROUNDED_RECT);
    }

    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, _inner: RoundedRect) {
        self.accumulate_op(outer.rect(), DisplayListOpFlags::DRAW_DOUBLE_ROUNDED_RECT);
    }

    fn draw_path(&mut self, path: &Arc<BezPath>) {
        self.accumulate_op(path.bounding_box(), DisplayListOpFlags::DRAW_PATH);
    }

    fn draw_arc(&mut self, oval_bounds: Rect, _start: f64, _sweep: f64, use_center: bool) {
        let flags = if use_center {
            DisplayListOpFlags::DRAW_ARC_WITH_CENTER
        } else {
            DisplayListOpFlags::DRAW_ARC_NO_CENTER
        };
        self.accumulate_op(oval_bounds, flags);
    }

    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
        let flags = match mode {
            PointMode::Points => DisplayListOpFlags::DRAW_POINTS_AS_POINTS,
            PointMode::Lines => DisplayListOpFlags::DRAW_POINTS_AS_LINES,
            PointMode::Polygon => DisplayListOpFlags::DRAW_POINTS_AS_POLYGON,
        };
        if let Some(rect) = points_bounds(points) {
            self.accumulate_op(rect, flags);
        }
    }

    fn draw_vertices(&mut self, vertices: &Arc<Vertices>, _mode: BlendMode) {
        self.accumulate_op(vertices.bounds(), DisplayListOpFlags::DRAW_VERTICES);
    }

    fn draw_image(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        _sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        let rect = image.bounds() + point.to_vec2();
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_WITH_PAINT,
        );
        self.accumulate_op(rect, flags);
    }

    fn draw_image_rect(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _src: Rect,
        dst: Rect,
        _sampling: ImageSampling,
        render_with_attributes: bool,
        _constraint: SrcRectConstraint,
    ) {
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_RECT_WITH_PAINT,
        );
        self.accumulate_op(dst, flags);
    }

    fn draw_image_nine(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _center: Rect,
        dst: Rect,
        _filter: FilterMode,
        render_with_attributes: bool,
    ) {
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_NINE_WITH_PAINT,
        );
        self.accumulate_op(dst, flags);
    }

    fn draw_image_lattice(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _lattice: &Lattice,
        dst: Rect,
        _filter: FilterMode,
        render_with_attributes: bool,
    ) {
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_LATTICE_WITH_PAINT,
        );
        self.accumulate_op(dst, flags);
    }

    fn draw_atlas(
        &mut self,
        _atlas: &Arc<dyn DlImage>,
        xforms: &[RsTransform],
        tex: &[Rect],
        _colors: Option<&[Color]>,
        _mode: BlendMode,
        _sampling: ImageSampling,
        cull_rect: Option<Rect>,
        render_with_attributes: bool,
    ) {
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_ATLAS_WITH_PAINT,
        );
        let bounds = cull_rect.or_else(|| {
            let corners: SmallVec<[Point; 16]> = xforms
                .iter()
                .zip(tex)
                .flat_map(|(xform, rect)| xform.quad(rect.width(), rect.height()))
                .collect();
            points_bounds(&corners)
        });
        if let Some(bounds) = bounds {
            self.accumulate_op(bounds, flags);
        }
    }

    fn draw_display_list(&mut self, display_list: &Arc<DisplayList>) {
        if let Some(bounds) = display_list.content_bounds() {
            self.accumulate_local(bounds);
        }
    }

    fn draw_picture(
        &mut self,
        picture: &Arc<dyn DlPicture>,
        matrix: Option<Affine>,
        render_with_attributes: bool,
    ) {
        let mut bounds = picture.cull_rect();
        if let Some(matrix) = matrix {
            bounds = matrix.transform_rect_bbox(bounds);
        }
        let flags = Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_PICTURE_WITH_PAINT,
        );
        self.accumulate_op(bounds, flags);
    }

    fn draw_text_run(&mut self, run: &Arc<dyn TextRun>, x: f64, y: f64) {
        let bounds = run.bounds() + kurbo::Vec2::new(x, y);
        self.accumulate_op(bounds, DisplayListOpFlags::DRAW_TEXT_RUN);
    }

    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        _color: Color,
        elevation: f64,
        _transparent_occluder: bool,
        dpr: f64,
    ) {
        let bounds = shadow_bounds(path.bounding_box(), elevation, dpr);
        self.accumulate_op(bounds, DisplayListOpFlags::DRAW_SHADOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> BoundsCalculator {
        BoundsCalculator::new(Rect::new(-1e9, -1e9, 1e9, 1e9))
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(calculator().finish(), (None, None));
    }

    #[test]
    fn strokes_pad_by_half_width() {
        let mut calc = calculator();
        calc.set_draw_style(DrawStyle::Stroke);
        calc.set_stroke_width(4.0);
        calc.draw_circle(Point::new(100.0, 100.0), 20.0);
        assert_eq!(calc.finish().0, Some(Rect::new(78.0, 78.0, 122.0, 122.0)));
    }

    #[test]
    fn miter_joins_pad_by_limit() {
        let mut calc = calculator();
        calc.set_draw_style(DrawStyle::Stroke);
        calc.set_stroke_width(2.0);
        calc.set_stroke_miter(3.0);
        let path = Arc::new(Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1));
        calc.draw_path(&path);
        assert_eq!(calc.finish().0, Some(Rect::new(-3.0, -3.0, 13.0, 13.0)));
    }

    #[test]
    fn square_caps_on_diagonals_pad_by_sqrt2() {
        let mut calc = calculator();
        calc.set_stroke_cap(StrokeCap::Square);
        calc.set_stroke_width(2.0);
        calc.draw_line(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let bounds = calc.finish().0.unwrap_or_default();
        let pad = core::f64::consts::SQRT_2;
        assert!((bounds.x0 + pad).abs() < 1e-12, "{bounds:?}");
        assert!((bounds.x1 - 10.0 - pad).abs() < 1e-12, "{bounds:?}");
    }

    #[test]
    fn hv_lines_do_not_get_diagonal_pad() {
        let mut calc = calculator();
        calc.set_stroke_cap(StrokeCap::Square);
        calc.set_stroke_width(2.0);
        calc.draw_line(Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        assert_eq!(calc.finish().0, Some(Rect::new(-1.0, 4.0, 11.0, 6.0)));
    }

    #[test]
    fn mask_blur_pads_three_sigma() {
        let mut calc = calculator();
        calc.set_mask_blur_filter(BlurStyle::Normal, 2.0);
        calc.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(calc.finish().0, Some(Rect::new(-6.0, -6.0, 16.0, 16.0)));
    }

    #[test]
    fn clip_limits_content_and_floods() {
        let mut calc = calculator();
        calc.clip_rect(Rect::new(10.0, 10.0, 100.0, 100.0), ClipOp::Intersect, true);
        calc.draw_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        calc.draw_color(Color::RED, BlendMode::SrcOver);
        let clip = Rect::new(10.0, 10.0, 100.0, 100.0);
        assert_eq!(calc.finish(), (Some(clip), Some(clip)));
    }

    #[test]
    fn difference_clips_are_ignored() {
        let mut calc = calculator();
        calc.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), ClipOp::Difference, false);
        calc.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(calc.finish().0, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn clip_is_restored() {
        let mut calc = calculator();
        calc.save();
        calc.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0), ClipOp::Intersect, false);
        calc.restore();
        calc.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(calc.finish().0, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn layer_hint_replaces_content() {
        let mut calc = calculator();
        calc.translate(5.0, 0.0);
        calc.save_layer(
            Some(Rect::new(0.0, 0.0, 20.0, 20.0)),
            SaveLayerOptions::empty(),
            None,
        );
        calc.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        calc.restore();
        assert_eq!(calc.finish().0, Some(Rect::new(5.0, 0.0, 25.0, 20.0)));
    }

    #[test]
    fn layer_filter_expands_content() {
        let blur = ImageFilter::blur(2.0, 2.0, understory_display_effects::TileMode::Decal)
            .map(Arc::new);
        let mut calc = calculator();
        calc.set_image_filter(blur.as_ref());
        calc.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
        calc.set_image_filter(None);
        calc.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        calc.restore();
        let bounds = calc.finish().0.unwrap_or_default();
        assert!(
            bounds.contains_rect(Rect::new(-6.0, -6.0, 16.0, 16.0)),
            "{bounds:?}"
        );
    }

    #[test]
    fn backdrop_layers_are_unbounded() {
        let blur = ImageFilter::blur(2.0, 2.0, understory_display_effects::TileMode::Decal)
            .map(Arc::new);
        let mut calc = calculator();
        calc.clip_rect(Rect::new(0.0, 0.0, 50.0, 50.0), ClipOp::Intersect, false);
        calc.save_layer(None, SaveLayerOptions::empty(), blur.as_ref());
        calc.restore();
        assert_eq!(calc.finish().0, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn shadow_grows_with_elevation() {
        let rect = Rect::new(0.0, 0.0, 60.0, 60.0);
        let low = shadow_bounds(rect, 1.0, 1.0);
        let high = shadow_bounds(rect, 10.0, 1.0);
        assert!(high.contains_rect(low));
        assert!(low.contains_rect(rect));
        assert_eq!(shadow_bounds(rect, 0.0, 1.0), rect);
    }
}
