// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording display lists.

use alloc::sync::Arc;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect};
use smallvec::SmallVec;
use understory_display_effects::{
    BlendMode, Blender, BlurStyle, Color, ColorFilter, ColorSource, DlImage, FilterMode,
    ImageFilter, ImageSampling, MaskFilter, Matrix, PathEffect,
};

use crate::display_list::RecordedList;
use crate::opacity::GroupOpacity;
use crate::storage::{OpWriter, SAVE_LAYER_OPTIONS_OFFSET};
use crate::{
    ClipOp, DisplayList, DisplayListAttributeFlags, DisplayListOpFlags, DisplayListOpType,
    Dispatcher, DlPicture, DrawStyle, Lattice, Paint, PaintBlend, PaintMask, PointMode,
    RsTransform, SaveLayerOptions, SrcRectConstraint, StrokeCap, StrokeJoin, TextRun, Vertices,
};

/// The cull rect used when none is given: effectively unbounded.
pub const DEFAULT_CULL_RECT: Rect = Rect::new(-1e9, -1e9, 1e9, 1e9);

/// One open `save` or `save_layer`.
#[derive(Clone, Debug)]
struct LayerInfo {
    /// Offset of the save-layer record, `None` for a plain save.
    layer_offset: Option<usize>,
    /// Whether the layer itself composites as a group-opacity compatible
    /// draw. Always true for plain saves.
    composite_compatible: bool,
    /// The transform to restore.
    saved_matrix: Matrix,
    opacity: GroupOpacity,
}

impl LayerInfo {
    fn root() -> Self {
        Self {
            layer_offset: None,
            composite_compatible: true,
            saved_matrix: Matrix::IDENTITY,
            opacity: GroupOpacity::Empty,
        }
    }
}

/// Records drawing calls into a [`DisplayList`].
///
/// The builder is a [`Dispatcher`]: every recording call is a trait method,
/// and dispatching an existing list into a builder copies it.
///
/// Attribute setters only emit a record when the value actually changes, so
/// callers can set the full paint before every draw without bloating the
/// list. A few calls are normalized on the way in:
///
/// - identity transforms, and transforms with non-finite values, are dropped;
/// - a 2D affine with an identity linear part is recorded as a translate, and
///   a 4x4 matrix without perspective as a 2D affine;
/// - rounded rects without radii are recorded as rects;
/// - `set_blender(None)` and mode-only blenders become `set_blend_mode`;
/// - a blur mask with a non-positive or non-finite sigma clears the mask;
/// - a solid color source becomes `set_color`.
///
/// ```
/// use understory_display_list::{DisplayListBuilder, Dispatcher, Color, kurbo::Rect};
///
/// let mut builder = DisplayListBuilder::new();
/// builder.set_color(Color::RED);
/// builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
/// let list = builder.build();
/// assert_eq!(list.op_count(false), 2);
/// assert_eq!(list.bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
/// ```
#[derive(Debug)]
pub struct DisplayListBuilder {
    writer: OpWriter,
    op_count: usize,
    nested_bytes: usize,
    nested_op_count: usize,
    cull_rect: Rect,
    root: LayerInfo,
    layers: SmallVec<[LayerInfo; 8]>,
    matrix: Matrix,
    current: Paint,
    current_opacity_compatibility: bool,
    is_ui_thread_safe: bool,
}

impl Default for DisplayListBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayListBuilder {
    /// A builder with the default, effectively unbounded cull rect.
    pub fn new() -> Self {
        Self::with_cull_rect(DEFAULT_CULL_RECT)
    }

    /// A builder whose content is asserted to lie within `cull_rect`.
    pub fn with_cull_rect(cull_rect: Rect) -> Self {
        Self {
            writer: OpWriter::default(),
            op_count: 0,
            nested_bytes: 0,
            nested_op_count: 0,
            cull_rect,
            root: LayerInfo::root(),
            layers: SmallVec::new(),
            matrix: Matrix::IDENTITY,
            current: Paint::default(),
            current_opacity_compatibility: true,
            is_ui_thread_safe: true,
        }
    }

    /// Discards everything recorded so far, keeping the cull rect.
    pub fn reset(&mut self) {
        *self = Self::with_cull_rect(self.cull_rect);
    }

    /// Finishes the recording.
    ///
    /// Open saves are restored first. The builder is left empty and ready to
    /// record a new list with the same cull rect.
    pub fn build(&mut self) -> Arc<DisplayList> {
        while !self.layers.is_empty() {
            self.restore();
        }
        let (bytes, objects) = self.writer.take();
        let list = DisplayList::from_recording(RecordedList {
            bytes,
            objects,
            op_count: self.op_count,
            nested_byte_count: self.nested_bytes,
            nested_op_count: self.nested_op_count,
            cull_rect: self.cull_rect,
            can_apply_group_opacity: !self.root.opacity.cannot_inherit_opacity(),
            is_ui_thread_safe: self.is_ui_thread_safe,
        });
        tracing::debug!(
            id = list.unique_id(),
            ops = list.op_count(false),
            bytes = list.bytes(false),
            group_opacity = list.can_apply_group_opacity(),
            "built display list"
        );
        self.reset();
        Arc::new(list)
    }

    /// The cull rect given at construction.
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Number of open saves plus one for the root; always at least 1.
    pub fn save_count(&self) -> usize {
        self.layers.len() + 1
    }

    /// Restores until [`save_count`](Self::save_count) is at most `count`.
    pub fn restore_to_count(&mut self, count: usize) {
        while self.save_count() > count.max(1) {
            self.restore();
        }
    }

    /// The accumulated transform.
    pub fn transform(&self) -> Matrix {
        self.matrix
    }

    /// The current attributes as a paint.
    pub fn paint(&self) -> &Paint {
        &self.current
    }

    /// Anti-aliasing.
    pub fn anti_alias(&self) -> bool {
        self.current.anti_alias
    }

    /// Dithering.
    pub fn dither(&self) -> bool {
        self.current.dither
    }

    /// Color inversion.
    pub fn invert_colors(&self) -> bool {
        self.current.invert_colors
    }

    /// Draw style.
    pub fn draw_style(&self) -> DrawStyle {
        self.current.draw_style
    }

    /// Stroke cap.
    pub fn stroke_cap(&self) -> StrokeCap {
        self.current.stroke_cap
    }

    /// Stroke join.
    pub fn stroke_join(&self) -> StrokeJoin {
        self.current.stroke_join
    }

    /// Stroke width.
    pub fn stroke_width(&self) -> f64 {
        self.current.stroke_width
    }

    /// Miter limit.
    pub fn stroke_miter(&self) -> f64 {
        self.current.stroke_miter
    }

    /// Color.
    pub fn color(&self) -> Color {
        self.current.color
    }

    /// The blend mode, or `None` while a custom blender is set.
    pub fn blend_mode(&self) -> Option<BlendMode> {
        self.current.blend.mode()
    }

    /// A blender equivalent to the current blend state.
    pub fn blender(&self) -> Arc<Blender> {
        self.current.blend.blender()
    }

    /// Color source.
    pub fn color_source(&self) -> Option<&Arc<ColorSource>> {
        self.current.color_source.as_ref()
    }

    /// Color filter.
    pub fn color_filter(&self) -> Option<&Arc<ColorFilter>> {
        self.current.color_filter.as_ref()
    }

    /// Image filter.
    pub fn image_filter(&self) -> Option<&Arc<ImageFilter>> {
        self.current.image_filter.as_ref()
    }

    /// Path effect.
    pub fn path_effect(&self) -> Option<&Arc<PathEffect>> {
        self.current.path_effect.as_ref()
    }

    /// Mask filter, with the blur shorthand converted to an object.
    pub fn mask_filter(&self) -> Option<Arc<MaskFilter>> {
        self.current.mask.to_filter()
    }

    /// Mask state as set.
    pub fn mask(&self) -> &PaintMask {
        &self.current.mask
    }

    /// Applies the attributes of `paint` that an op with `flags` consults.
    ///
    /// Each attribute goes through its setter, so unchanged values record
    /// nothing.
    pub fn set_attributes_from_paint(&mut self, paint: &Paint, flags: DisplayListAttributeFlags) {
        if flags.ignores_paint() {
            return;
        }
        if flags.applies_anti_alias() {
            self.set_anti_alias(paint.anti_alias);
        }
        if flags.applies_dither() {
            self.set_dither(paint.dither);
        }
        if flags.applies_alpha() || flags.applies_color() {
            self.set_color(paint.color);
        }
        if flags.applies_blend() {
            match &paint.blend {
                PaintBlend::Mode(mode) => self.set_blend_mode(*mode),
                PaintBlend::Blender(blender) => self.set_blender(Some(blender)),
            }
        }
        if flags.applies_style() {
            self.set_draw_style(paint.draw_style);
        }
        if flags.is_stroked(paint.draw_style) {
            self.set_stroke_width(paint.stroke_width);
            self.set_stroke_miter(paint.stroke_miter);
            self.set_stroke_cap(paint.stroke_cap);
            self.set_stroke_join(paint.stroke_join);
        }
        if flags.applies_shader() {
            self.set_color_source(paint.color_source.as_ref());
        }
        if flags.applies_color_filter() {
            self.set_invert_colors(paint.invert_colors);
            self.set_color_filter(paint.color_filter.as_ref());
        }
        if flags.applies_image_filter() {
            self.set_image_filter(paint.image_filter.as_ref());
        }
        if flags.applies_path_effect() {
            self.set_path_effect(paint.path_effect.as_ref());
        }
        if flags.applies_mask_filter() {
            match &paint.mask {
                PaintMask::None => self.set_mask_filter(None),
                PaintMask::Filter(filter) => self.set_mask_filter(Some(filter)),
                PaintMask::Blur { style, sigma } => self.set_mask_blur_filter(*style, *sigma),
            }
        }
    }

    fn push(&mut self, op: DisplayListOpType, fields: impl FnOnce(&mut OpWriter)) -> usize {
        let offset = self.writer.begin(op);
        fields(&mut self.writer);
        self.writer.finish(offset);
        self.op_count += 1;
        offset
    }

    fn current_layer(&mut self) -> &mut LayerInfo {
        self.layers.last_mut().unwrap_or(&mut self.root)
    }

    fn update_current_opacity_compatibility(&mut self) {
        self.current_opacity_compatibility = self.current.color_filter.is_none()
            && !self.current.invert_colors
            && self.current.blend.is_opacity_compatible();
    }

    fn update_layer_opacity(&mut self, compatible: bool) {
        self.current_layer().opacity.update(compatible);
    }

    /// Records a draw that uses the paint according to `flags`.
    fn check_layer_opacity(&mut self, flags: DisplayListAttributeFlags) {
        let compatible = flags.ignores_paint()
            || !flags.applies_blend()
            || self.current_opacity_compatibility;
        self.update_layer_opacity(compatible);
    }

    /// Zero-width strokes render as device hairlines, which cannot take an
    /// inherited opacity.
    fn check_layer_opacity_hairline(&mut self, flags: DisplayListAttributeFlags) {
        if self.current.draw_style == DrawStyle::Fill || self.current.stroke_width > 0.0 {
            self.check_layer_opacity(flags);
        } else {
            self.update_layer_opacity(false);
        }
    }

    fn concat(&mut self, matrix: &Matrix) {
        self.matrix = self.matrix.concat(matrix);
    }

    fn image_flags(
        render_with_attributes: bool,
        plain: DisplayListAttributeFlags,
        with_paint: DisplayListAttributeFlags,
    ) -> DisplayListAttributeFlags {
        if render_with_attributes {
            with_paint
        } else {
            plain
        }
    }

    fn note_image(&mut self, image: &Arc<dyn DlImage>) {
        self.is_ui_thread_safe &= image.is_ui_thread_safe();
    }
}

fn is_zero_radii(rrect: &RoundedRect) -> bool {
    let radii = rrect.radii();
    radii.top_left == 0.0
        && radii.top_right == 0.0
        && radii.bottom_right == 0.0
        && radii.bottom_left == 0.0
}

fn is_finite_rect(rect: Rect) -> bool {
    rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()
}

impl Dispatcher for DisplayListBuilder {
    fn set_anti_alias(&mut self, aa: bool) {
        if self.current.anti_alias != aa {
            self.current.anti_alias = aa;
            self.push(DisplayListOpType::SetAntiAlias, |w| w.bool(aa));
        }
    }

    fn set_dither(&mut self, dither: bool) {
        if self.current.dither != dither {
            self.current.dither = dither;
            self.push(DisplayListOpType::SetDither, |w| w.bool(dither));
        }
    }

    fn set_invert_colors(&mut self, invert: bool) {
        if self.current.invert_colors != invert {
            self.current.invert_colors = invert;
            self.push(DisplayListOpType::SetInvertColors, |w| w.bool(invert));
            self.update_current_opacity_compatibility();
        }
    }

    fn set_stroke_cap(&mut self, cap: StrokeCap) {
        if self.current.stroke_cap != cap {
            self.current.stroke_cap = cap;
            self.push(DisplayListOpType::SetStrokeCap, |w| w.cap(cap));
        }
    }

    fn set_stroke_join(&mut self, join: StrokeJoin) {
        if self.current.stroke_join != join {
            self.current.stroke_join = join;
            self.push(DisplayListOpType::SetStrokeJoin, |w| w.join(join));
        }
    }

    fn set_draw_style(&mut self, style: DrawStyle) {
        if self.current.draw_style != style {
            self.current.draw_style = style;
            self.push(DisplayListOpType::SetStyle, |w| w.u8(style as u8));
        }
    }

    fn set_stroke_width(&mut self, width: f64) {
        if self.current.stroke_width.to_bits() != width.to_bits() {
            self.current.stroke_width = width;
            self.push(DisplayListOpType::SetStrokeWidth, |w| w.f64(width));
        }
    }

    fn set_stroke_miter(&mut self, limit: f64) {
        if self.current.stroke_miter.to_bits() != limit.to_bits() {
            self.current.stroke_miter = limit;
            self.push(DisplayListOpType::SetStrokeMiter, |w| w.f64(limit));
        }
    }

    fn set_color(&mut self, color: Color) {
        if self.current.color != color {
            self.current.color = color;
            self.push(DisplayListOpType::SetColor, |w| w.color(color));
        }
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        let blend = PaintBlend::Mode(mode);
        if self.current.blend != blend {
            self.current.blend = blend;
            self.push(DisplayListOpType::SetBlendMode, |w| w.u8(mode as u8));
            self.update_current_opacity_compatibility();
        }
    }

    fn set_blender(&mut self, blender: Option<&Arc<Blender>>) {
        match PaintBlend::from_blender(blender) {
            PaintBlend::Mode(mode) => self.set_blend_mode(mode),
            blend @ PaintBlend::Blender(_) => {
                if self.current.blend == blend {
                    return;
                }
                if let PaintBlend::Blender(blender) = &blend {
                    let blender = blender.clone();
                    self.push(DisplayListOpType::SetBlender, |w| w.blender(blender));
                }
                self.current.blend = blend;
                self.update_current_opacity_compatibility();
            }
        }
    }

    fn set_color_source(&mut self, source: Option<&Arc<ColorSource>>) {
        if let Some(color) = source.and_then(|s| s.as_color()) {
            self.set_color(color);
            self.set_color_source(None);
            return;
        }
        if self.current.color_source.as_ref() == source {
            return;
        }
        self.current.color_source = source.cloned();
        match source {
            Some(source) => {
                self.is_ui_thread_safe &= source.is_ui_thread_safe();
                let source = source.clone();
                self.push(DisplayListOpType::SetColorSource, |w| w.color_source(source));
            }
            None => {
                self.push(DisplayListOpType::ClearColorSource, |_| {});
            }
        }
    }

    fn set_color_filter(&mut self, filter: Option<&Arc<ColorFilter>>) {
        if self.current.color_filter.as_ref() == filter {
            return;
        }
        self.current.color_filter = filter.cloned();
        match filter {
            Some(filter) => {
                let filter = filter.clone();
                self.push(DisplayListOpType::SetColorFilter, |w| w.color_filter(filter));
            }
            None => {
                self.push(DisplayListOpType::ClearColorFilter, |_| {});
            }
        }
        self.update_current_opacity_compatibility();
    }

    fn set_image_filter(&mut self, filter: Option<&Arc<ImageFilter>>) {
        if self.current.image_filter.as_ref() == filter {
            return;
        }
        self.current.image_filter = filter.cloned();
        match filter {
            Some(filter) => {
                self.is_ui_thread_safe &= filter.is_ui_thread_safe();
                let filter = filter.clone();
                self.push(DisplayListOpType::SetImageFilter, |w| w.image_filter(filter));
            }
            None => {
                self.push(DisplayListOpType::ClearImageFilter, |_| {});
            }
        }
    }

    fn set_path_effect(&mut self, effect: Option<&Arc<PathEffect>>) {
        if self.current.path_effect.as_ref() == effect {
            return;
        }
        self.current.path_effect = effect.cloned();
        match effect {
            Some(effect) => {
                let effect = effect.clone();
                self.push(DisplayListOpType::SetPathEffect, |w| w.path_effect(effect));
            }
            None => {
                self.push(DisplayListOpType::ClearPathEffect, |_| {});
            }
        }
    }

    fn set_mask_filter(&mut self, filter: Option<&Arc<MaskFilter>>) {
        let mask = filter.map_or(PaintMask::None, |f| PaintMask::Filter(f.clone()));
        if self.current.mask == mask {
            return;
        }
        self.current.mask = mask;
        match filter {
            Some(filter) => {
                let filter = filter.clone();
                self.push(DisplayListOpType::SetMaskFilter, |w| w.mask_filter(filter));
            }
            None => {
                self.push(DisplayListOpType::ClearMaskFilter, |_| {});
            }
        }
    }

    fn set_mask_blur_filter(&mut self, style: BlurStyle, sigma: f64) {
        let mask = PaintMask::blur(style, sigma);
        if !mask.is_some() {
            self.set_mask_filter(None);
            return;
        }
        if self.current.mask == mask {
            return;
        }
        self.current.mask = mask;
        self.push(DisplayListOpType::SetMaskBlurFilter, |w| {
            w.u8(style as u8);
            w.f64(sigma);
        });
    }

    fn save(&mut self) {
        self.push(DisplayListOpType::Save, |_| {});
        self.layers.push(LayerInfo {
            layer_offset: None,
            composite_compatible: true,
            saved_matrix: self.matrix,
            opacity: GroupOpacity::Empty,
        });
    }

    fn save_layer(
        &mut self,
        bounds: Option<Rect>,
        options: SaveLayerOptions,
        backdrop: Option<&Arc<ImageFilter>>,
    ) {
        // Distribution is decided by what the layer ends up containing.
        let options = options - SaveLayerOptions::CAN_DISTRIBUTE_OPACITY;
        let bounds = bounds.filter(|b| is_finite_rect(*b));
        let op = match (bounds.is_some(), backdrop.is_some()) {
            (false, false) => DisplayListOpType::SaveLayer,
            (true, false) => DisplayListOpType::SaveLayerBounds,
            (false, true) => DisplayListOpType::SaveLayerBackdrop,
            (true, true) => DisplayListOpType::SaveLayerBackdropBounds,
        };
        if let Some(backdrop) = backdrop {
            self.is_ui_thread_safe &= backdrop.is_ui_thread_safe();
        }
        let backdrop = backdrop.cloned();
        let has_backdrop = backdrop.is_some();
        let offset = self.push(op, |w| {
            w.u8(options.bits());
            if let Some(bounds) = bounds {
                w.rect(bounds);
            }
            if let Some(backdrop) = backdrop {
                w.image_filter(backdrop);
            }
        });
        let paint_compatible = !options.contains(SaveLayerOptions::RENDERS_WITH_ATTRIBUTES)
            || self.current_opacity_compatibility;
        self.layers.push(LayerInfo {
            layer_offset: Some(offset),
            composite_compatible: paint_compatible && !has_backdrop,
            saved_matrix: self.matrix,
            opacity: GroupOpacity::Empty,
        });
    }

    fn restore(&mut self) {
        debug_assert!(!self.layers.is_empty(), "restore without a matching save");
        let Some(layer) = self.layers.pop() else {
            tracing::warn!("restore without a matching save ignored");
            return;
        };
        self.push(DisplayListOpType::Restore, |_| {});
        self.matrix = layer.saved_matrix;
        if let Some(offset) = layer.layer_offset
            && !layer.opacity.cannot_inherit_opacity()
        {
            let at = offset + SAVE_LAYER_OPTIONS_OFFSET;
            let options = SaveLayerOptions::from_bits_retain(self.writer.read_u8(at))
                | SaveLayerOptions::CAN_DISTRIBUTE_OPACITY;
            self.writer.patch_u8(at, options.bits());
        }
        self.current_layer().opacity.absorb_child(
            layer.opacity,
            layer.layer_offset.is_some(),
            layer.composite_compatible,
        );
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        if tx.is_finite() && ty.is_finite() && (tx != 0.0 || ty != 0.0) {
            self.push(DisplayListOpType::Translate, |w| {
                w.f64(tx);
                w.f64(ty);
            });
            self.concat(&Matrix::translate(tx, ty));
        }
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        if sx.is_finite() && sy.is_finite() && (sx != 1.0 || sy != 1.0) {
            self.push(DisplayListOpType::Scale, |w| {
                w.f64(sx);
                w.f64(sy);
            });
            self.concat(&Matrix::scale(sx, sy));
        }
    }

    fn rotate(&mut self, degrees: f64) {
        if degrees.is_finite() && degrees % 360.0 != 0.0 {
            self.push(DisplayListOpType::Rotate, |w| w.f64(degrees));
            self.concat(&Matrix::rotate_degrees(degrees));
        }
    }

    fn skew(&mut self, sx: f64, sy: f64) {
        if sx.is_finite() && sy.is_finite() && (sx != 0.0 || sy != 0.0) {
            self.push(DisplayListOpType::Skew, |w| {
                w.f64(sx);
                w.f64(sy);
            });
            self.concat(&Matrix::skew(sx, sy));
        }
    }

    fn transform_2d_affine(&mut self, mxx: f64, mxy: f64, mxt: f64, myx: f64, myy: f64, myt: f64) {
        let values = [mxx, mxy, mxt, myx, myy, myt];
        if !values.iter().all(|v| v.is_finite()) {
            return;
        }
        if mxx == 1.0 && mxy == 0.0 && myx == 0.0 && myy == 1.0 {
            self.translate(mxt, myt);
            return;
        }
        self.push(DisplayListOpType::Transform2DAffine, |w| {
            for v in values {
                w.f64(v);
            }
        });
        self.concat(&Matrix::from_2d_affine(mxx, mxy, mxt, myx, myy, myt));
    }

    fn transform_full_perspective(&mut self, matrix: &Matrix) {
        if !matrix.is_finite() {
            return;
        }
        if matrix.is_2d_affine() {
            let m = matrix.as_row_major();
            self.transform_2d_affine(m[0], m[1], m[3], m[4], m[5], m[7]);
            return;
        }
        let matrix = *matrix;
        self.push(DisplayListOpType::TransformFullPerspective, |w| w.matrix(&matrix));
        self.concat(&matrix);
    }

    fn transform_reset(&mut self) {
        self.push(DisplayListOpType::TransformReset, |_| {});
        self.matrix = Matrix::IDENTITY;
    }

    fn clip_rect(&mut self, rect: Rect, op: ClipOp, is_aa: bool) {
        if !is_finite_rect(rect) {
            return;
        }
        let kind = match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectRect,
            ClipOp::Difference => DisplayListOpType::ClipDifferenceRect,
        };
        self.push(kind, |w| {
            w.rect(rect);
            w.bool(is_aa);
        });
    }

    fn clip_rounded_rect(&mut self, rrect: RoundedRect, op: ClipOp, is_aa: bool) {
        if is_zero_radii(&rrect) {
            self.clip_rect(rrect.rect(), op, is_aa);
            return;
        }
        let kind = match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectRoundedRect,
            ClipOp::Difference => DisplayListOpType::ClipDifferenceRoundedRect,
        };
        self.push(kind, |w| {
            w.rounded_rect(rrect);
            w.bool(is_aa);
        });
    }

    fn clip_path(&mut self, path: &Arc<BezPath>, op: ClipOp, is_aa: bool) {
        let kind = match op {
            ClipOp::Intersect => DisplayListOpType::ClipIntersectPath,
            ClipOp::Difference => DisplayListOpType::ClipDifferencePath,
        };
        let path = path.clone();
        self.push(kind, |w| {
            w.path(path);
            w.bool(is_aa);
        });
    }

    fn draw_paint(&mut self) {
        self.push(DisplayListOpType::DrawPaint, |_| {});
        self.check_layer_opacity(DisplayListOpFlags::DRAW_PAINT);
    }

    fn draw_color(&mut self, color: Color, mode: BlendMode) {
        self.push(DisplayListOpType::DrawColor, |w| {
            w.color(color);
            w.u8(mode as u8);
        });
        self.update_layer_opacity(mode.is_opacity_compatible());
    }

    fn draw_line(&mut self, p0: Point, p1: Point) {
        self.push(DisplayListOpType::DrawLine, |w| {
            w.point(p0);
            w.point(p1);
        });
        self.check_layer_opacity(DisplayListOpFlags::DRAW_LINE);
    }

    fn draw_rect(&mut self, rect: Rect) {
        self.push(DisplayListOpType::DrawRect, |w| w.rect(rect));
        self.check_layer_opacity(DisplayListOpFlags::DRAW_RECT);
    }

    fn draw_oval(&mut self, bounds: Rect) {
        self.push(DisplayListOpType::DrawOval, |w| w.rect(bounds));
        self.check_layer_opacity(DisplayListOpFlags::DRAW_OVAL);
    }

    fn draw_circle(&mut self, center: Point, radius: f64) {
        self.push(DisplayListOpType::DrawCircle, |w| {
            w.point(center);
            w.f64(radius);
        });
        self.check_layer_opacity(DisplayListOpFlags::DRAW_CIRCLE);
    }

    fn draw_rounded_rect(&mut self, rrect: RoundedRect) {
        if is_zero_radii(&rrect) {
            self.draw_rect(rrect.rect());
            return;
        }
        self.push(DisplayListOpType::DrawRoundedRect, |w| w.rounded_rect(rrect));
        self.check_layer_opacity(DisplayListOpFlags::DRAW_ROUNDED_RECT);
    }

    fn draw_double_rounded_rect(&mut self, outer: RoundedRect, inner: RoundedRect) {
        self.push(DisplayListOpType::DrawDoubleRoundedRect, |w| {
            w.rounded_rect(outer);
            w.rounded_rect(inner);
        });
        self.check_layer_opacity(DisplayListOpFlags::DRAW_DOUBLE_ROUNDED_RECT);
    }

    fn draw_path(&mut self, path: &Arc<BezPath>) {
        let path = path.clone();
        self.push(DisplayListOpType::DrawPath, |w| w.path(path));
        self.check_layer_opacity_hairline(DisplayListOpFlags::DRAW_PATH);
    }

    fn draw_arc(
        &mut self,
        oval_bounds: Rect,
        start_degrees: f64,
        sweep_degrees: f64,
        use_center: bool,
    ) {
        let op = if use_center {
            DisplayListOpType::DrawArcWithCenter
        } else {
            DisplayListOpType::DrawArc
        };
        self.push(op, |w| {
            w.rect(oval_bounds);
            w.f64(start_degrees);
            w.f64(sweep_degrees);
        });
        if use_center {
            self.check_layer_opacity_hairline(DisplayListOpFlags::DRAW_ARC_WITH_CENTER);
        } else {
            self.check_layer_opacity(DisplayListOpFlags::DRAW_ARC_NO_CENTER);
        }
    }

    fn draw_points(&mut self, mode: PointMode, points: &[Point]) {
        if points.is_empty() {
            return;
        }
        let op = match mode {
            PointMode::Points => DisplayListOpType::DrawPoints,
            PointMode::Lines => DisplayListOpType::DrawLines,
            PointMode::Polygon => DisplayListOpType::DrawPolygon,
        };
        self.push(op, |w| {
            w.count(points.len());
            for p in points {
                w.point(*p);
            }
        });
        // Individual points and segments overlap at their ends.
        self.update_layer_opacity(false);
    }

    fn draw_vertices(&mut self, vertices: &Arc<Vertices>, mode: BlendMode) {
        let vertices = vertices.clone();
        self.push(DisplayListOpType::DrawVertices, |w| {
            w.vertices(vertices);
            w.u8(mode as u8);
        });
        // Triangles of one mesh may overlap.
        self.update_layer_opacity(false);
    }

    fn draw_image(
        &mut self,
        image: &Arc<dyn DlImage>,
        point: Point,
        sampling: ImageSampling,
        render_with_attributes: bool,
    ) {
        self.note_image(image);
        let op = if render_with_attributes {
            DisplayListOpType::DrawImageWithAttr
        } else {
            DisplayListOpType::DrawImage
        };
        let image = image.clone();
        self.push(op, |w| {
            w.image(image);
            w.point(point);
            w.u8(sampling as u8);
        });
        self.check_layer_opacity(Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE,
            DisplayListOpFlags::DRAW_IMAGE_WITH_PAINT,
        ));
    }

    fn draw_image_rect(
        &mut self,
        image: &Arc<dyn DlImage>,
        src: Rect,
        dst: Rect,
        sampling: ImageSampling,
        render_with_attributes: bool,
        constraint: SrcRectConstraint,
    ) {
        self.note_image(image);
        let image = image.clone();
        self.push(DisplayListOpType::DrawImageRect, |w| {
            w.image(image);
            w.rect(src);
            w.rect(dst);
            w.u8(sampling as u8);
            w.bool(render_with_attributes);
            w.u8(constraint as u8);
        });
        self.check_layer_opacity(Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_RECT,
            DisplayListOpFlags::DRAW_IMAGE_RECT_WITH_PAINT,
        ));
    }

    fn draw_image_nine(
        &mut self,
        image: &Arc<dyn DlImage>,
        center: Rect,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
        self.note_image(image);
        let op = if render_with_attributes {
            DisplayListOpType::DrawImageNineWithAttr
        } else {
            DisplayListOpType::DrawImageNine
        };
        let image = image.clone();
        self.push(op, |w| {
            w.image(image);
            w.rect(center);
            w.rect(dst);
            w.u8(filter as u8);
        });
        self.check_layer_opacity(Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_NINE,
            DisplayListOpFlags::DRAW_IMAGE_NINE_WITH_PAINT,
        ));
    }

    fn draw_image_lattice(
        &mut self,
        image: &Arc<dyn DlImage>,
        lattice: &Lattice,
        dst: Rect,
        filter: FilterMode,
        render_with_attributes: bool,
    ) {
        self.note_image(image);
        let image = image.clone();
        self.push(DisplayListOpType::DrawImageLattice, |w| {
            w.image(image);
            w.rect(dst);
            w.u8(filter as u8);
            w.bool(render_with_attributes);
            w.bool(lattice.src.is_some());
            if let Some(src) = lattice.src {
                w.rect(src);
            }
            w.count(lattice.x_divs.len());
            for div in &lattice.x_divs {
                w.i32(*div);
            }
            w.count(lattice.y_divs.len());
            for div in &lattice.y_divs {
                w.i32(*div);
            }
        });
        self.check_layer_opacity(Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_IMAGE_LATTICE,
            DisplayListOpFlags::DRAW_IMAGE_LATTICE_WITH_PAINT,
        ));
    }

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
        if xforms.len() != tex.len() || colors.is_some_and(|c| c.len() != xforms.len()) {
            tracing::warn!(
                sprites = xforms.len(),
                rects = tex.len(),
                colors = colors.map(<[Color]>::len),
                "atlas draw with mismatched arrays ignored"
            );
            return;
        }
        if xforms.is_empty() {
            return;
        }
        self.note_image(atlas);
        let op = if cull_rect.is_some() {
            DisplayListOpType::DrawAtlasCulled
        } else {
            DisplayListOpType::DrawAtlas
        };
        let atlas = atlas.clone();
        self.push(op, |w| {
            w.image(atlas);
            w.u8(mode as u8);
            w.u8(sampling as u8);
            w.bool(render_with_attributes);
            w.bool(colors.is_some());
            if let Some(cull) = cull_rect {
                w.rect(cull);
            }
            w.count(xforms.len());
            for xf in xforms {
                w.f64(xf.scos);
                w.f64(xf.ssin);
                w.f64(xf.tx);
                w.f64(xf.ty);
            }
            for rect in tex {
                w.rect(*rect);
            }
            for color in colors.into_iter().flatten() {
                w.color(*color);
            }
        });
        // Sprites may overlap.
        self.update_layer_opacity(false);
    }

    fn draw_display_list(&mut self, display_list: &Arc<DisplayList>) {
        self.nested_op_count += display_list.op_count(true);
        self.nested_bytes += display_list.bytes(true);
        self.is_ui_thread_safe &= display_list.is_ui_thread_safe();
        let compatible = display_list.can_apply_group_opacity();
        let display_list = display_list.clone();
        self.push(DisplayListOpType::DrawDisplayList, |w| w.display_list(display_list));
        self.update_layer_opacity(compatible);
    }

    fn draw_picture(
        &mut self,
        picture: &Arc<dyn DlPicture>,
        matrix: Option<Affine>,
        render_with_attributes: bool,
    ) {
        self.nested_op_count += picture.approximate_op_count(true);
        self.nested_bytes += picture.approximate_bytes_used();
        self.is_ui_thread_safe &= picture.is_ui_thread_safe();
        let matrix = matrix.filter(|m| *m != Affine::IDENTITY);
        let op = if matrix.is_some() {
            DisplayListOpType::DrawPictureMatrix
        } else {
            DisplayListOpType::DrawPicture
        };
        let picture = picture.clone();
        self.push(op, |w| {
            w.picture(picture);
            w.bool(render_with_attributes);
            if let Some(matrix) = matrix {
                w.affine(matrix);
            }
        });
        self.check_layer_opacity(Self::image_flags(
            render_with_attributes,
            DisplayListOpFlags::DRAW_PICTURE,
            DisplayListOpFlags::DRAW_PICTURE_WITH_PAINT,
        ));
    }

    fn draw_text_run(&mut self, run: &Arc<dyn TextRun>, x: f64, y: f64) {
        let run = run.clone();
        self.push(DisplayListOpType::DrawTextRun, |w| {
            w.text_run(run);
            w.f64(x);
            w.f64(y);
        });
        // Glyphs may overlap.
        self.update_layer_opacity(false);
    }

    fn draw_shadow(
        &mut self,
        path: &Arc<BezPath>,
        color: Color,
        elevation: f64,
        transparent_occluder: bool,
        dpr: f64,
    ) {
        let op = if transparent_occluder {
            DisplayListOpType::DrawShadowTransparentOccluder
        } else {
            DisplayListOpType::DrawShadow
        };
        let path = path.clone();
        self.push(op, |w| {
            w.path(path);
            w.color(color);
            w.f64(elevation);
            w.f64(dpr);
        });
        // The ambient and spot shadows overlap.
        self.update_layer_opacity(false);
    }
}
