// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording behavior of `DisplayListBuilder`: attribute dedup, call
//! normalization, nested list accounting and copying by replay.

use std::sync::Arc;

use understory_display_list::kurbo::{Point, Rect, RoundedRect, Shape};
use understory_display_list::{
    BlendMode, Blender, BlurStyle, Color, DisplayListBuilder, DisplayListOpFlags,
    DisplayListOpType, Dispatcher, DrawStyle, ImageFilter, Paint, RuntimeEffect,
    RuntimeEffectInstance, SaveLayerOptions, TileMode,
};
use understory_display_list_ref::{Event, RefDispatcher};

fn replay(list: &understory_display_list::DisplayList) -> Vec<DisplayListOpType> {
    let mut dispatcher = RefDispatcher::new();
    list.dispatch(&mut dispatcher);
    dispatcher.op_types()
}

#[test]
fn repeated_attribute_sets_record_once() {
    let mut builder = DisplayListBuilder::new();
    builder.set_color(Color::RED);
    builder.set_color(Color::RED);
    builder.set_stroke_width(2.0);
    builder.set_stroke_width(2.0);
    builder.set_anti_alias(false);
    builder.set_blend_mode(BlendMode::SrcOver);
    builder.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
    let list = builder.build();

    assert_eq!(
        replay(&list),
        [
            DisplayListOpType::SetColor,
            DisplayListOpType::SetStrokeWidth,
            DisplayListOpType::DrawRect,
        ],
        "sets equal to the current value emit nothing"
    );
    assert_eq!(list.op_count(false), 3);
}

#[test]
fn null_blender_resets_to_src_over() {
    let mut builder = DisplayListBuilder::new();
    builder.set_blend_mode(BlendMode::Multiply);
    builder.set_blender(None);
    assert_eq!(builder.blend_mode(), Some(BlendMode::SrcOver));
    assert_eq!(*builder.blender(), Blender::Mode(BlendMode::SrcOver));

    builder.set_blender(Some(&Arc::new(Blender::Mode(BlendMode::Screen))));
    assert_eq!(builder.blend_mode(), Some(BlendMode::Screen));

    let list = builder.build();
    assert_eq!(
        replay(&list),
        [
            DisplayListOpType::SetBlendMode,
            DisplayListOpType::SetBlendMode,
            DisplayListOpType::SetBlendMode,
        ],
        "mode-only blenders are recorded as blend modes"
    );
}

/// A blend program with no uniforms or children.
#[derive(Debug)]
struct BlendProgram;

impl RuntimeEffect for BlendProgram {
    fn uniform_size(&self) -> usize {
        0
    }
}

fn runtime_blender() -> Arc<Blender> {
    let program: Arc<dyn RuntimeEffect> = Arc::new(BlendProgram);
    let instance = RuntimeEffectInstance::new(program, Vec::new(), Arc::from([0_u8; 0]))
        .expect("program takes no inputs");
    Arc::new(Blender::RuntimeEffect(instance))
}

#[test]
fn custom_blender_replaces_the_blend_mode() {
    let blender = runtime_blender();
    let mut builder = DisplayListBuilder::new();
    builder.set_blender(Some(&blender));
    assert_eq!(builder.blend_mode(), None, "no mode while a blender is set");
    assert_eq!(builder.blender(), blender);
    builder.set_blender(Some(&blender.clone()));

    builder.set_blend_mode(BlendMode::SrcOver);
    assert_eq!(builder.blend_mode(), Some(BlendMode::SrcOver));

    builder.set_blender(Some(&blender));
    assert_eq!(builder.blend_mode(), None);
    builder.set_blender(None);
    assert_eq!(builder.blend_mode(), Some(BlendMode::SrcOver));
    builder.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0));

    let list = builder.build();
    assert_eq!(
        replay(&list),
        [
            DisplayListOpType::SetBlender,
            DisplayListOpType::SetBlendMode,
            DisplayListOpType::SetBlender,
            DisplayListOpType::SetBlendMode,
            DisplayListOpType::DrawRect,
        ],
        "the repeated blender is deduplicated and resetting to src-over is a change"
    );
    assert!(list.can_apply_group_opacity());

    builder.set_blender(Some(&blender));
    builder.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
    assert!(
        !builder.build().can_apply_group_opacity(),
        "custom blenders cannot take an inherited opacity"
    );
}

#[test]
fn degenerate_mask_blur_clears_the_mask() {
    let mut builder = DisplayListBuilder::new();
    builder.set_mask_blur_filter(BlurStyle::Normal, 0.0);
    builder.set_mask_blur_filter(BlurStyle::Normal, -3.0);
    builder.set_mask_blur_filter(BlurStyle::Normal, f64::NAN);
    assert!(builder.mask_filter().is_none());
    assert!(builder.build().is_empty(), "nothing to clear, nothing recorded");

    builder.set_mask_blur_filter(BlurStyle::Outer, 2.0);
    assert!(builder.mask_filter().is_some());
    builder.set_mask_blur_filter(BlurStyle::Outer, 0.0);
    assert!(builder.mask_filter().is_none());
    let list = builder.build();
    assert_eq!(
        replay(&list),
        [
            DisplayListOpType::SetMaskBlurFilter,
            DisplayListOpType::ClearMaskFilter,
        ]
    );
}

#[test]
fn solid_color_sources_become_colors() {
    let mut builder = DisplayListBuilder::new();
    builder.set_color_source(Some(&Arc::new(understory_display_list::ColorSource::Color(
        Color::GREEN,
    ))));
    assert_eq!(builder.color(), Color::GREEN);
    assert!(builder.color_source().is_none());
    assert_eq!(replay(&builder.build()), [DisplayListOpType::SetColor]);
}

#[test]
fn degenerate_transforms_are_dropped() {
    let mut builder = DisplayListBuilder::new();
    builder.translate(0.0, 0.0);
    builder.scale(1.0, 1.0);
    builder.rotate(0.0);
    builder.translate(f64::NAN, 1.0);
    builder.transform_2d_affine(1.0, 0.0, 5.0, 0.0, 1.0, 6.0);
    assert_eq!(
        replay(&builder.build()),
        [DisplayListOpType::Translate],
        "a pure translation affine is recorded as a translate"
    );
}

#[test]
fn square_rounded_rects_become_rects() {
    let mut builder = DisplayListBuilder::new();
    builder.draw_rounded_rect(RoundedRect::new(0.0, 0.0, 10.0, 10.0, 0.0));
    builder.draw_rounded_rect(RoundedRect::new(0.0, 0.0, 10.0, 10.0, 2.0));
    assert_eq!(
        replay(&builder.build()),
        [DisplayListOpType::DrawRect, DisplayListOpType::DrawRoundedRect]
    );
}

#[test]
fn nested_lists_count_toward_totals() {
    let mut inner = DisplayListBuilder::new();
    inner.set_color(Color::BLUE);
    inner.draw_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
    let inner = inner.build();
    assert_eq!(inner.op_count(true), 2);

    let mut outer = DisplayListBuilder::new();
    outer.draw_display_list(&inner);
    outer.translate(10.0, 0.0);
    outer.draw_display_list(&inner);
    let outer = outer.build();

    assert_eq!(outer.op_count(false), 3);
    assert_eq!(outer.op_count(true), 3 + 2 * inner.op_count(true));
    assert_eq!(
        outer.bytes(true),
        outer.bytes(false) + 2 * inner.bytes(true)
    );
    assert_eq!(outer.bounds(), Rect::new(0.0, 0.0, 15.0, 5.0));
}

#[test]
fn replay_into_builder_copies_the_list() {
    let blur = ImageFilter::blur(2.0, 2.0, TileMode::Decal).map(Arc::new);
    let path = Arc::new(Rect::new(0.0, 0.0, 8.0, 4.0).to_path(0.1));

    let mut builder = DisplayListBuilder::new();
    builder.set_anti_alias(true);
    builder.set_color(Color::RED);
    builder.set_image_filter(blur.as_ref());
    builder.save_layer(
        Some(Rect::new(0.0, 0.0, 50.0, 50.0)),
        SaveLayerOptions::RENDERS_WITH_ATTRIBUTES,
        None,
    );
    builder.set_image_filter(None);
    builder.translate(3.0, 4.0);
    builder.draw_path(&path);
    builder.restore();
    builder.set_draw_style(DrawStyle::Stroke);
    builder.draw_points(
        understory_display_list::PointMode::Lines,
        &[Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
    );
    let original = builder.build();

    let mut copier = DisplayListBuilder::new();
    original.dispatch(&mut copier);
    let copy = copier.build();

    assert!(copy.equals(&original), "replaying into a builder is lossless");
    assert_eq!(copy.op_count(true), original.op_count(true));
    assert_eq!(copy.bounds(), original.bounds());
    assert_eq!(
        copy.can_apply_group_opacity(),
        original.can_apply_group_opacity()
    );
    assert_ne!(copy.unique_id(), original.unique_id());
}

#[test]
fn identical_recordings_are_deterministic() {
    let record = || {
        let mut builder = DisplayListBuilder::new();
        builder.set_attributes_from_paint(
            &Paint::new(Color::BLUE)
                .with_draw_style(DrawStyle::Stroke)
                .with_stroke_width(3.0),
            DisplayListOpFlags::DRAW_OVAL,
        );
        builder.save();
        builder.scale(2.0, 2.0);
        builder.draw_oval(Rect::new(0.0, 0.0, 4.0, 2.0));
        builder.restore();
        builder.build()
    };
    let a = record();
    let b = record();
    assert!(a.equals(&b));
    assert_eq!(replay(&a), replay(&b));
    assert_eq!(a.bytes(false), b.bytes(false));
}

#[test]
fn events_carry_the_state_at_each_op() {
    let mut builder = DisplayListBuilder::new();
    builder.set_color(Color::RED);
    builder.save();
    builder.translate(10.0, 10.0);
    builder.draw_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
    builder.restore();
    builder.draw_circle(Point::new(100.0, 100.0), 20.0);
    let list = builder.build();

    let mut dispatcher = RefDispatcher::new();
    list.dispatch(&mut dispatcher);
    let draws: Vec<&Event> = dispatcher.draws().collect();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].op(), DisplayListOpType::DrawRect);
    assert_eq!(draws[0].state().save_depth, 1);
    assert_eq!(
        draws[0].state().transform,
        understory_display_list::Matrix::translate(10.0, 10.0)
    );
    assert_eq!(draws[1].op(), DisplayListOpType::DrawCircle);
    assert_eq!(draws[1].state().save_depth, 0);
    assert_eq!(draws[1].state().paint.color, Color::RED);
}

#[test]
fn restore_to_count_closes_saves() {
    let mut builder = DisplayListBuilder::new();
    builder.save();
    builder.save_layer(None, SaveLayerOptions::empty(), None);
    builder.save();
    assert_eq!(builder.save_count(), 4);
    builder.restore_to_count(2);
    assert_eq!(builder.save_count(), 2);
    builder.restore_to_count(0);
    assert_eq!(builder.save_count(), 1, "the root frame is never popped");
    let list = builder.build();
    assert!(list.validate().is_ok());
}

#[test]
fn scene_replays_in_call_order() {
    let record = || {
        let mut builder = DisplayListBuilder::new();
        builder.set_color(Color::RED);
        builder.save();
        builder.translate(10.0, 10.0);
        builder.draw_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
        builder.restore();
        builder.set_draw_style(DrawStyle::Stroke);
        builder.set_stroke_width(4.0);
        builder.draw_circle(Point::new(100.0, 100.0), 20.0);
        builder.build()
    };
    let list = record();
    assert_eq!(
        replay(&list),
        [
            DisplayListOpType::SetColor,
            DisplayListOpType::Save,
            DisplayListOpType::Translate,
            DisplayListOpType::DrawRect,
            DisplayListOpType::Restore,
            DisplayListOpType::SetStyle,
            DisplayListOpType::SetStrokeWidth,
            DisplayListOpType::DrawCircle,
        ]
    );
    assert_eq!(list.op_count(false), 8);
    assert!(list.equals(&record()), "same calls, same stream");
}
