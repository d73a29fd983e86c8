// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Display List Reference Dispatcher.
//!
//! This crate provides [`RefDispatcher`], a small stateful implementation of
//! [`Dispatcher`] for **replay tracing**.
//!
//! It is intentionally *not* a renderer:
//! - It does **not** rasterize to pixels.
//! - It records one [`Event`] per dispatched operation, with the attribute
//!   state, transform and save depth in effect when the op was applied.
//! - It is intended for tests and debugging that want to assert on what a
//!   display list replays, in what order, and under which state.

#![no_std]

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use understory_display_list::kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape};
use understory_display_list::{
    BlendMode, Blender, BlurStyle, ClipOp, Color, ColorFilter, ColorSource, DisplayList,
    DisplayListOpType, Dispatcher, DlImage, DlPicture, DrawStyle, FilterMode, ImageFilter,
    ImageSampling, Lattice, MaskFilter, Matrix, Paint, PaintBlend, PaintMask, PathEffect,
    PointMode, RsTransform, SaveLayerOptions, SrcRectConstraint, StrokeCap, StrokeJoin, TextRun,
    Vertices,
};

/// Snapshot of the replay state when an op was applied.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    /// Current transform, including any transform a nested list was drawn
    /// under.
    pub transform: Matrix,
    /// Number of open saves and save layers.
    pub save_depth: u32,
    /// Number of open save layers.
    pub layer_depth: u32,
    /// Current attributes.
    pub paint: Paint,
    /// How many nested lists enclose the op; `0` for the list being replayed.
    pub nesting: u32,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            save_depth: 0,
            layer_depth: 0,
            paint: Paint::default(),
            nesting: 0,
        }
    }
}

/// Event recorded by the reference dispatcher.
#[derive(Clone, Debug)]
pub enum Event {
    /// Attribute, save/restore, transform or clip op and the resulting state.
    State {
        /// Op kind that was applied.
        op: DisplayListOpType,
        /// Snapshot after applying the op.
        state: StateSnapshot,
    },
    /// Draw op and the state used for drawing.
    Draw {
        /// Op kind that was applied.
        op: DisplayListOpType,
        /// Untransformed extent of the geometry, when the op has one.
        geometry: Option<Rect>,
        /// Snapshot at the time of drawing.
        state: StateSnapshot,
    },
}

impl Event {
    /// The op kind of this event.
    pub fn op(&self) -> DisplayListOpType {
        match self {
            Self::State { op, .. } | Self::Draw { op, .. } => *op,
        }
    }

    /// The state snapshot of this event.
    pub fn state(&self) -> &StateSnapshot {
        match self {
            Self::State { state, .. } | Self::Draw { state, .. } => state,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SaveEntry {
    transform: Matrix,
    is_layer: bool,
}

/// Simple reference implementation of [`Dispatcher`].
///
/// This dispatcher:
/// - Tracks the current attributes, transform and save stack,
/// - Records an [`Event`] for every op it receives,
/// - Optionally replays nested display lists inline, under the transform in
///   effect where they are drawn.
#[derive(Default, Debug)]
pub struct RefDispatcher {
    events: Vec<Event>,
    state: StateSnapshot,
    saves: Vec<SaveEntry>,
    /// Transform that `transform_reset` returns to.
    base_transform: Matrix,
    expand_nested: bool,
}

impl RefDispatcher {
    /// A dispatcher that records nested lists as a single draw event.
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher that also replays nested lists inline after their draw
    /// event.
    pub fn expanding_nested() -> Self {
        Self {
            expand_nested: true,
            ..Self::new()
        }
    }

    /// Returns a slice of recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The op kinds of every recorded event, in order.
    pub fn op_types(&self) -> Vec<DisplayListOpType> {
        self.events.iter().map(Event::op).collect()
    }

    /// Only the draw events.
    pub fn draws(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Draw { .. }))
    }

    /// The current state.
    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Clears all recorded events but keeps the current state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn push_state(&mut self, op: DisplayListOpType) {
        self.events.push(Event::State {
            op,
            state: self.state.clone(),
        });
    }

    fn push_draw(&mut self, op: DisplayListOpType, geometry: Option<Rect>) {
        self.events.push(Event::Draw {
            op,
            geometry,
            state: self.state.clone(),
        });
    }

    fn concat(&mut self, op: DisplayListOpType, matrix: &Matrix) {
        self.state.transform = self.state.transform.concat(matrix);
        self.push_state(op);
    }

    fn update_depths(&mut self) {
        self.state.save_depth = u32::try_from(self.saves.len()).unwrap_or(u32::MAX);
        let layers = self.saves.iter().filter(|save| save.is_layer).count();
        self.state.layer_depth = u32::try_from(layers).unwrap_or(u32::MAX);
    }

    fn points_bounds(points: &[Point]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
        )
    }
}

impl Dispatcher for RefDispatcher {
    fn set_anti_alias(&mut self, aa: bool) {
        self.state.paint.anti_alias = aa;
        self.push_state(DisplayListOpType::SetAntiAlias);
    }

    fn set_dither(&mut self, dither: bool) {
        self.state.paint.dither = dither;
        self.push_state(DisplayListOpType::SetDither);
    }

    fn set_invert_colors(&mut self, invert: bool) {
        self.state.paint.invert_colors = invert;
        self.push_state(DisplayListOpType::SetInvertColors);
    }

    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        self.state.paint.stroke_cap = cap;
        self.push_state(DisplayListOpType::SetStrokeCap);
    }

    fn set_stroke_join(&mut self, join: StrokeJoin) {
        self.state.paint.stroke_join = join;
        self.push_state(DisplayListOpType::SetStrokeJoin);
    }

    fn set_draw_style(&mut self, style: DrawStyle) {
        self.state.paint.draw_style = style;
        self.push_state(DisplayListOpType::SetStyle);
    }

    fn set_stroke_width(&mut self, width: f64) {
        self.state.paint.stroke_width = width;
        self.push_state(DisplayListOpType::SetStrokeWidth);
    }

    fn set_stroke_miter(&mut self, limit: f64) {
        self.state.paint.stroke_miter = limit;
        self.push_state(DisplayListOpType::SetStrokeMiter);
    }

    fn set_color(&mut self, color: Color) {
        self.state.paint.color = color;
        self.push_state(DisplayListOpType::SetColor);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.paint.blend = PaintBlend::Mode(mode);
        self.push_state(DisplayListOpType::SetBlendMode);
    }

    fn set_blender(&mut self, blender: Option<&Arc<Blender>>) {
        self.state.paint.blend = PaintBlend::from_blender(blender);
        self.push_state(DisplayListOpType::SetBlender);
    }

    fn set_color_source(&mut self, source: Option<&Arc<ColorSource>>) {
        self.state.paint.color_source = source.cloned();
        self.push_state(if source.is_some() {
            DisplayListOpType::SetColorSource
        } else {
            DisplayListOpType::ClearColorSource
        });
    }

    fn set_color_filter(&mut self, filter: Option<&Arc<ColorFilter>>) {
        self.state.paint.color_filter = filter.cloned();
        self.push_state(if filter.is_some() {
            DisplayListOpType::SetColorFilter
        } else {
            DisplayListOpType::ClearColorFilter
        });
    }

    fn set_image_filter(&mut self, filter: Option<&Arc<ImageFilter>>) {
        self.state.paint.image_filter = filter.cloned();
        self.push_state(if filter.is_some() {
            DisplayListOpType::SetImageFilter
        } else {
            DisplayListOpType::ClearImageFilter
        });
    }

    fn set_path_effect(&mut self, effect: Option<&Arc<PathEffect>>) {
        self.state.paint.path_effect = effect.cloned();
        self.push_state(if effect.is_some() {
            DisplayListOpType::SetPathEffect
        } else {
            DisplayListOpType::ClearPathEffect
        });
    }

    fn set_mask_filter(&mut self, filter: Option<&Arc<MaskFilter>>) {
        self.state.paint.mask = filter.map_or(PaintMask::None, |f| PaintMask::Filter(f.clone()));
        self.push_state(if filter.is_some() {
            DisplayListOpType::SetMaskFilter
        } else {
            DisplayListOpType::ClearMaskFilter
        });
    }

    fn set_mask_blur_filter(&mut self, style: BlurStyle, sigma: f64) {
        self.state.paint.mask = PaintMask::blur(style, sigma);
        self.push_state(DisplayListOpType::SetMaskBlurFilter);
    }

    fn save(&mut self) {
        self.saves.push(SaveEntry {
            transform: self.state.transform,
            is_layer: false,
        });
        self.update_depths();
        self.push_state(DisplayListOpType::Save);
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        _options: SaveLayerOptions,
        backdrop: Option<&Arc<ImageFilter>>,
    ) {
        self.saves.push(SaveEntry {
            transform: self.state.transform,
            is_layer: true,
        });
        self.update_depths();
        let op = match (bounds.is_some(), backdrop.is_some()) {
            (false, false) => DisplayListOpType::SaveLayer,
            (true, false) => DisplayListOpType::SaveLayerBounds,
            (false, true) => DisplayListOpType::SaveLayerBackdrop,
            (true, true) => DisplayListOpType::SaveLayerBackdropBounds,
        };
        self.push_state(op);
    }

    fn restore(&mut self) {
        if let Some(save) = self.saves.pop() {
            self.state.transform = save.transform;
        }
        self.update_depths();
        self.push_state(DisplayListOpType::Restore);
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.concat(DisplayListOpType::Translate, &Matrix::translate(tx, ty));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(DisplayListOpType::Scale, &Matrix::scale(sx, sy));
    }

    fn rotate(&mut self, degrees: f64) {
        self.concat(DisplayListOpType::Rotate, &Matrix::rotate_degrees(degrees));
    }

    fn skew(&mut self, sx: f64, sy: f64) {
        self.concat(DisplayListOpType::Skew, &Matrix::skew(sx, sy));
    }

    fn transform_2d_affine(&mut self, mxx: f64, mxy: f64, mxt: f64, myx: f64, myy: f64, myt: f64) {
        self.concat(
            DisplayListOpType::Transform2DAffine,
            &Matrix::from_2d_affine(mxx, mxy, mxt, myx, myy, myt),
        );
    }

    fn transform_full_perspective(&mut self, matrix: &Matrix) {
        self.concat(DisplayListOpType::TransformFullPerspective, matrix);
    }

    fn transform_reset(&mut self) {
        self.state.transform = self.base_transform;
        self.push_state(DisplayListOpType::TransformReset);
    }

    fn clip_rect(&mut self, _rect: Rect, op: ClipOp, _is_aa: bool) {
        self.push_state(match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectRect,
            ClipOp::Difference => DisplayListOpType::ClipDifferenceRect,
        });
    }

    fn clip_rounded_rect(&mut self, _rrect: RoundedRect, op: ClipOp, _is_aa: bool) {
        self.push_state(match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectRoundedRect,
            ClipOp::Difference => DisplayListOpType::ClipDifferenceRoundedRect,
        });
    }

    fn clip_path(&mut self, _path: &Arc<BezPath>, op: ClipOp, _is_aa: bool) {
        self.push_state(match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectPath,
            ClipOp::Difference => DisplayListOpType::ClipDifferencePath,
        });
    }

    fn draw_paint(&mut self) {
        self.push_draw(DisplayListOpType::DrawPaint, None);
    }

    fn draw_color(&mut self, _color: Color, _mode: BlendMode) {
        self.push_draw(DisplayListOpType::DrawColor, None);
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        self.push_draw(DisplayListOpType::DrawLine, Some(Rect::from_points(p0, p1)));
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.push_draw(DisplayListOpType::DrawRect, Some(rect));
    }

    fn draw_oval(&mut self, bounds: Rect) {
        self.push_draw(DisplayListOpType::DrawOval, Some(bounds));
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        let rect = Rect::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        );
        self.push_draw(DisplayListOpType::DrawCircle, Some(rect));
    }

    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        self.push_draw(DisplayListOpType::DrawRoundedRect, Some(rrect.rect()));
    }

    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, _inner: RoundedRect) {
        self.push_draw(DisplayListOpType::DrawDoubleRoundedRect, Some(outer.rect()));
    }

    fn draw_path(&mut self, path: &Arc<BezPath>) {
        self.push_draw(DisplayListOpType::DrawPath, Some(path.bounding_box()));
    }

    fn draw_arc(&mut self, oval_bounds: Rect, _start: f64, _sweep: f64, use_center: bool) {
        let op = if use_center {
            DisplayListOpType::DrawArcWithCenter
        } else {
            DisplayListOpType::DrawArc
        };
        self.push_draw(op, Some(oval_bounds));
    }

    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
        let op = match mode {
            PointMode::Points => DisplayListOpType::DrawPoints,
            PointMode::Lines => DisplayListOpType::DrawLines,
            PointMode::Polygon => DisplayListOpType::DrawPolygon,
        };
        self.push_draw(op, Self::points_bounds(points));
    }

    fn draw_vertices(&mut self, vertices: &Arc<Vertices>, _mode: BlendMode) {
        self.push_draw(DisplayListOpType::DrawVertices, Some(vertices.bounds()));
    }

    fn draw_image(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        _sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        let op = if render_with_attributes {
            DisplayListOpType::DrawImageWithAttr
        } else {
            DisplayListOpType::DrawImage
        };
        self.push_draw(op, Some(image.bounds() + point.to_vec2()));
    }

    fn draw_image_rect(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _src: Rect,
        dst: Rect,
        _sampling: ImageSampling,
        _render_with_attributes: bool,
        _constraint: SrcRectConstraint,
    ) {
        self.push_draw(DisplayListOpType::DrawImageRect, Some(dst));
    }

    fn draw_image_nine(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _center: Rect,
        dst: Rect,
        _filter: FilterMode,
        render_with_attributes: bool,
    ) {
        let op = if render_with_attributes {
            DisplayListOpType::DrawImageNineWithAttr
        } else {
            DisplayListOpType::DrawImageNine
        };
        self.push_draw(op, Some(dst));
    }

    fn draw_image_lattice(
        &mut self,
        _image: &Arc<dyn DlImage>,
        _lattice: &Lattice,
        dst: Rect,
        _filter: FilterMode,
        _render_with_attributes: bool,
    ) {
        self.push_draw(DisplayListOpType::DrawImageLattice, Some(dst));
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
        _render_with_attributes: bool,
    ) {
        let op = if cull_rect.is_some() {
            DisplayListOpType::DrawAtlasCulled
        } else {
            DisplayListOpType::DrawAtlas
        };
        let corners: Vec<Point> = xforms
            .iter()
            .zip(tex)
            .flat_map(|(xform, rect)| xform.quad(rect.width(), rect.height()))
            .collect();
        self.push_draw(op, Self::points_bounds(&corners));
    }

    fn draw_display_list(&mut self, display_list: &Arc<DisplayList>) {
        self.push_draw(
            DisplayListOpType::DrawDisplayList,
            display_list.content_bounds(),
        );
        if !self.expand_nested {
            return;
        }
        // The nested list sees a fresh attribute state and resets to the
        // transform it was drawn under.
        let outer_paint = core::mem::take(&mut self.state.paint);
        let outer_base = self.base_transform;
        let outer_depth = self.saves.len();
        self.base_transform = self.state.transform;
        self.state.nesting += 1;
        display_list.dispatch(self);
        while self.saves.len() > outer_depth {
            self.saves.pop();
        }
        self.state.nesting -= 1;
        self.state.transform = self.base_transform;
        self.base_transform = outer_base;
        self.state.paint = outer_paint;
        self.update_depths();
    }

    fn draw_picture(
        &mut self,
        picture: &Arc<dyn DlPicture>,
        matrix: Option<Affine>,
        _render_with_attributes: bool,
    ) {
        let op = if matrix.is_some() {
            DisplayListOpType::DrawPictureMatrix
        } else {
            DisplayListOpType::DrawPicture
        };
        let bounds = picture.cull_rect();
        let geometry = matrix.map_or(bounds, |m| m.transform_rect_bbox(bounds));
        self.push_draw(op, Some(geometry));
    }

    fn draw_text_run(&mut self, run: &Arc<dyn TextRun>, x: f64, y: f64) {
        let geometry = run.bounds() + understory_display_list::kurbo::Vec2::new(x, y);
        self.push_draw(DisplayListOpType::DrawTextRun, Some(geometry));
    }

    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        _color: Color,
        _elevation: f64,
        transparent_occluder: bool,
        _dpr: f64,
    ) {
        let op = if transparent_occluder {
            DisplayListOpType::DrawShadowTransparentOccluder
        } else {
            DisplayListOpType::DrawShadow
        };
        self.push_draw(op, Some(path.bounding_box()));
    }
}
