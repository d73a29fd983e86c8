// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoding records and delivering them to a [`Dispatcher`].

use alloc::vec::Vec;

use kurbo::{Point, Rect};
use understory_display_effects::{BlendMode, BlurStyle, Color, FilterMode, ImageSampling};

use crate::storage::{FieldReader, ObjectTables, Records};
use crate::{
    ClipOp, DisplayListError, DisplayListOpType, Dispatcher, DrawStyle, Lattice, PointMode,
    RsTransform, SaveLayerOptions, SrcRectConstraint,
};

/// Reusable decode buffers for variable-length records.
#[derive(Debug, Default)]
struct Scratch {
    points: Vec<Point>,
    xforms: Vec<RsTransform>,
    rects: Vec<Rect>,
    colors: Vec<Color>,
}

/// Dispatches every record of `bytes` in order.
///
/// Stops at the first malformed record. Records before it have already been
/// delivered.
pub(crate) fn dispatch_records<D: Dispatcher + ?Sized>(
    bytes: &[u8],
    objects: &ObjectTables,
    dispatcher: &mut D,
) -> Result<(), DisplayListError> {
    let mut scratch = Scratch::default();
    for record in Records::new(bytes) {
        let record = record?;
        let mut r = FieldReader::new(record, objects);
        dispatch_one(record.op, &mut r, dispatcher, &mut scratch)?;
    }
    Ok(())
}

fn dispatch_one<D: Dispatcher + ?Sized>(
    op: DisplayListOpType,
    r: &mut FieldReader<'_>,
    d: &mut D,
    scratch: &mut Scratch,
) -> Result<(), DisplayListError> {
    use DisplayListOpType as Op;
    match op {
        Op::SetAntiAlias => d.set_anti_alias(r.bool()?),
        Op::SetDither => d.set_dither(r.bool()?),
        Op::SetInvertColors => d.set_invert_colors(r.bool()?),
        Op::SetStrokeCap => d.set_stroke_cap(r.cap()?),
        Op::SetStrokeJoin => d.set_stroke_join(r.join()?),
        Op::SetStyle => d.set_draw_style(r.enum_u8(DrawStyle::from_u8)?),
        Op::SetStrokeWidth => d.set_stroke_width(r.f64()?),
        Op::SetStrokeMiter => d.set_stroke_miter(r.f64()?),
        Op::SetColor => d.set_color(r.color()?),
        Op::SetBlendMode => d.set_blend_mode(r.enum_u8(BlendMode::from_u8)?),
        Op::SetBlender => d.set_blender(Some(r.blender()?)),
        Op::SetColorSource => d.set_color_source(Some(r.color_source()?)),
        Op::ClearColorSource => d.set_color_source(None),
        Op::SetColorFilter => d.set_color_filter(Some(r.color_filter()?)),
        Op::ClearColorFilter => d.set_color_filter(None),
        Op::SetImageFilter => d.set_image_filter(Some(r.image_filter()?)),
        Op::ClearImageFilter => d.set_image_filter(None),
        Op::SetPathEffect => d.set_path_effect(Some(r.path_effect()?)),
        Op::ClearPathEffect => d.set_path_effect(None),
        Op::SetMaskFilter => d.set_mask_filter(Some(r.mask_filter()?)),
        Op::ClearMaskFilter => d.set_mask_filter(None),
        Op::SetMaskBlurFilter => {
            let style = r.enum_u8(BlurStyle::from_u8)?;
            d.set_mask_blur_filter(style, r.f64()?);
        }

        Op::Save => d.save(),
        Op::SaveLayer => d.save_layer(None, save_layer_options(r)?, None),
        Op::SaveLayerBounds => {
            let options = save_layer_options(r)?;
            d.save_layer(Some(r.rect()?), options, None);
        }
        Op::SaveLayerBackdrop => {
            let options = save_layer_options(r)?;
            d.save_layer(None, options, Some(r.image_filter()?));
        }
        Op::SaveLayerBackdropBounds => {
            let options = save_layer_options(r)?;
            let bounds = r.rect()?;
            d.save_layer(Some(bounds), options, Some(r.image_filter()?));
        }
        Op::Restore => d.restore(),

        Op::Translate => d.translate(r.f64()?, r.f64()?),
        Op::Scale => d.scale(r.f64()?, r.f64()?),
        Op::Rotate => d.rotate(r.f64()?),
        Op::Skew => d.skew(r.f64()?, r.f64()?),
        Op::Transform2DAffine => d.transform_2d_affine(
            r.f64()?,
            r.f64()?,
            r.f64()?,
            r.f64()?,
            r.f64()?,
            r.f64()?,
        ),
        Op::TransformFullPerspective => d.transform_full_perspective(&r.matrix()?),
        Op::TransformReset => d.transform_reset(),

        Op::ClipIntersectRect => d.clip_rect(r.rect()?, ClipOp::Intersect, r.bool()?),
        Op::ClipDifferenceRect => d.clip_rect(r.rect()?, ClipOp::Difference, r.bool()?),
        Op::ClipIntersectRoundedRect => {
            d.clip_rounded_rect(r.rounded_rect()?, ClipOp::Intersect, r.bool()?);
        }
        Op::ClipDifferenceRoundedRect => {
            d.clip_rounded_rect(r.rounded_rect()?, ClipOp::Difference, r.bool()?);
        }
        Op::ClipIntersectPath => d.clip_path(r.path()?, ClipOp::Intersect, r.bool()?),
        Op::ClipDifferencePath => d.clip_path(r.path()?, ClipOp::Difference, r.bool()?),

        Op::DrawPaint => d.draw_paint(),
        Op::DrawColor => d.draw_color(r.color()?, r.enum_u8(BlendMode::from_u8)?),
        Op::DrawLine => d.draw_line(r.point()?, r.point()?),
        Op::DrawRect => d.draw_rect(r.rect()?),
        Op::DrawOval => d.draw_oval(r.rect()?),
        Op::DrawCircle => d.draw_circle(r.point()?, r.f64()?),
        Op::DrawRoundedRect => d.draw_rounded_rect(r.rounded_rect()?),
        Op::DrawDoubleRoundedRect => {
            d.draw_double_rounded_rect(r.rounded_rect()?, r.rounded_rect()?);
        }
        Op::DrawPath => d.draw_path(r.path()?),
        Op::DrawArc | Op::DrawArcWithCenter => d.draw_arc(
            r.rect()?,
            r.f64()?,
            r.f64()?,
            op == Op::DrawArcWithCenter,
        ),
        Op::DrawPoints | Op::DrawLines | Op::DrawPolygon => {
            let mode = match op {
                Op::DrawPoints => PointMode::Points,
                Op::DrawLines => PointMode::Lines,
                _ => PointMode::Polygon,
            };
            read_points(r, &mut scratch.points)?;
            d.draw_points(mode, &scratch.points);
        }
        Op::DrawVertices => {
            let vertices = r.vertices()?;
            d.draw_vertices(vertices, r.enum_u8(BlendMode::from_u8)?);
        }
        Op::DrawImage | Op::DrawImageWithAttr => {
            let image = r.image()?;
            let point = r.point()?;
            let sampling = r.enum_u8(ImageSampling::from_u8)?;
            d.draw_image(image, point, sampling, op == Op::DrawImageWithAttr);
        }
        Op::DrawImageRect => {
            let image = r.image()?;
            let src = r.rect()?;
            let dst = r.rect()?;
            let sampling = r.enum_u8(ImageSampling::from_u8)?;
            let with_attributes = r.bool()?;
            let constraint = r.enum_u8(SrcRectConstraint::from_u8)?;
            d.draw_image_rect(image, src, dst, sampling, with_attributes, constraint);
        }
        Op::DrawImageNine | Op::DrawImageNineWithAttr => {
            let image = r.image()?;
            let center = r.rect()?;
            let dst = r.rect()?;
            let filter = r.enum_u8(FilterMode::from_u8)?;
            d.draw_image_nine(image, center, dst, filter, op == Op::DrawImageNineWithAttr);
        }
        Op::DrawImageLattice => {
            let image = r.image()?;
            let dst = r.rect()?;
            let filter = r.enum_u8(FilterMode::from_u8)?;
            let with_attributes = r.bool()?;
            let lattice = read_lattice(r)?;
            d.draw_image_lattice(image, &lattice, dst, filter, with_attributes);
        }
        Op::DrawAtlas | Op::DrawAtlasCulled => {
            let atlas = r.image()?;
            let mode = r.enum_u8(BlendMode::from_u8)?;
            let sampling = r.enum_u8(ImageSampling::from_u8)?;
            let with_attributes = r.bool()?;
            let has_colors = r.bool()?;
            let cull_rect = if op == Op::DrawAtlasCulled {
                Some(r.rect()?)
            } else {
                None
            };
            read_atlas(r, has_colors, scratch)?;
            d.draw_atlas(
                atlas,
                &scratch.xforms,
                &scratch.rects,
                has_colors.then_some(scratch.colors.as_slice()),
                mode,
                sampling,
                cull_rect,
                with_attributes,
            );
        }
        Op::DrawDisplayList => d.draw_display_list(r.display_list()?),
        Op::DrawPicture => d.draw_picture(r.picture()?, None, r.bool()?),
        Op::DrawPictureMatrix => {
            let picture = r.picture()?;
            let with_attributes = r.bool()?;
            d.draw_picture(picture, Some(r.affine()?), with_attributes);
        }
        Op::DrawTextRun => d.draw_text_run(r.text_run()?, r.f64()?, r.f64()?),
        Op::DrawShadow | Op::DrawShadowTransparentOccluder => {
            let path = r.path()?;
            let color = r.color()?;
            let elevation = r.f64()?;
            let dpr = r.f64()?;
            d.draw_shadow(
                path,
                color,
                elevation,
                op == Op::DrawShadowTransparentOccluder,
                dpr,
            );
        }
    }
    Ok(())
}

fn save_layer_options(r: &mut FieldReader<'_>) -> Result<SaveLayerOptions, DisplayListError> {
    r.enum_u8(SaveLayerOptions::from_bits)
}

fn read_points(r: &mut FieldReader<'_>, out: &mut Vec<Point>) -> Result<(), DisplayListError> {
    let count = r.count(16)?;
    out.clear();
    out.reserve(count);
    for _ in 0..count {
        out.push(r.point()?);
    }
    Ok(())
}

fn read_lattice(r: &mut FieldReader<'_>) -> Result<Lattice, DisplayListError> {
    let src = if r.bool()? { Some(r.rect()?) } else { None };
    let x_count = r.count(4)?;
    let mut x_divs = Vec::with_capacity(x_count);
    for _ in 0..x_count {
        x_divs.push(r.i32()?);
    }
    let y_count = r.count(4)?;
    let mut y_divs = Vec::with_capacity(y_count);
    for _ in 0..y_count {
        y_divs.push(r.i32()?);
    }
    Ok(Lattice {
        x_divs,
        y_divs,
        src,
    })
}

fn read_atlas(
    r: &mut FieldReader<'_>,
    has_colors: bool,
    scratch: &mut Scratch,
) -> Result<(), DisplayListError> {
    // Each sprite is an RS transform and a rect: eight f64s.
    let count = r.count(64)?;
    scratch.xforms.clear();
    scratch.rects.clear();
    scratch.colors.clear();
    for _ in 0..count {
        scratch
            .xforms
            .push(RsTransform::new(r.f64()?, r.f64()?, r.f64()?, r.f64()?));
    }
    for _ in 0..count {
        scratch.rects.push(r.rect()?);
    }
    if has_colors {
        for _ in 0..count {
            scratch.colors.push(r.color()?);
        }
    }
    Ok(())
}
