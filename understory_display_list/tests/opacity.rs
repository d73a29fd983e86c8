// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group opacity decisions made while recording.

use std::sync::Arc;

use understory_display_list::kurbo::{Point, Rect, Shape};
use understory_display_list::{
    BlendMode, Color, ColorFilter, DisplayList, DisplayListBuilder, Dispatcher, DrawStyle,
    ImageFilter, PointMode, SaveLayerOptions,
};

/// Collects the options of every save layer in replay order.
#[derive(Default)]
struct LayerOptions(Vec<SaveLayerOptions>);

impl Dispatcher for LayerOptions {
    fn save_layer(
        &mut self,
        _bounds: Option<Rect>,
        options: SaveLayerOptions,
        _backdrop: Option<&Arc<ImageFilter>>,
    ) {
        self.0.push(options);
    }
}

fn layer_options(list: &DisplayList) -> Vec<bool> {
    let mut options = LayerOptions::default();
    list.dispatch(&mut options);
    options
        .0
        .iter()
        .map(|o| o.contains(SaveLayerOptions::CAN_DISTRIBUTE_OPACITY))
        .collect()
}

fn rect(i: f64) -> Rect {
    Rect::new(i * 20.0, 0.0, i * 20.0 + 10.0, 10.0)
}

#[test]
fn single_draw_in_a_layer_is_compatible() {
    let mut builder = DisplayListBuilder::new();
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.draw_rect(rect(0.0));
    builder.restore();
    let list = builder.build();
    assert!(list.can_apply_group_opacity());
    assert_eq!(layer_options(&list), [true]);
}

#[test]
fn second_draw_in_a_layer_poisons_it() {
    let mut builder = DisplayListBuilder::new();
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.draw_rect(rect(0.0));
    builder.draw_rect(rect(1.0));
    builder.restore();
    let list = builder.build();
    assert!(!list.can_apply_group_opacity());
    assert_eq!(layer_options(&list), [false]);
}

#[test]
fn compatible_child_layer_counts_once() {
    let mut builder = DisplayListBuilder::new();
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.draw_rect(rect(0.0));
    builder.restore();
    builder.restore();
    let list = builder.build();
    assert!(list.can_apply_group_opacity());
    assert_eq!(layer_options(&list), [true, true]);
}

#[test]
fn sibling_layers_are_each_distributable() {
    let mut builder = DisplayListBuilder::new();
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    for i in 0..2 {
        builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
        builder.draw_rect(rect(f64::from(i)));
        builder.restore();
    }
    builder.restore();
    let list = builder.build();
    assert_eq!(
        layer_options(&list),
        [false, true, true],
        "each inner layer holds one draw; the outer one holds two layers"
    );
    assert!(!list.can_apply_group_opacity());
}

#[test]
fn plain_saves_are_transparent() {
    let mut builder = DisplayListBuilder::new();
    builder.save();
    builder.save();
    builder.draw_rect(rect(0.0));
    builder.restore();
    builder.restore();
    assert!(builder.build().can_apply_group_opacity());

    builder.save();
    builder.draw_rect(rect(0.0));
    builder.restore();
    builder.draw_rect(rect(1.0));
    assert!(!builder.build().can_apply_group_opacity());
}

#[test]
fn incompatible_attributes_poison() {
    let mut builder = DisplayListBuilder::new();
    builder.set_blend_mode(BlendMode::Multiply);
    builder.draw_rect(rect(0.0));
    assert!(!builder.build().can_apply_group_opacity());

    builder.set_color_filter(
        ColorFilter::blend(Color::RED, BlendMode::SrcIn)
            .map(Arc::new)
            .as_ref(),
    );
    builder.draw_rect(rect(0.0));
    assert!(!builder.build().can_apply_group_opacity());

    builder.set_invert_colors(true);
    builder.draw_rect(rect(0.0));
    assert!(!builder.build().can_apply_group_opacity());
}

#[test]
fn poison_is_sticky_within_a_layer() {
    let mut builder = DisplayListBuilder::new();
    builder.save_layer(None, SaveLayerOptions::empty(), None);
    builder.set_blend_mode(BlendMode::Multiply);
    builder.draw_rect(rect(0.0));
    builder.set_blend_mode(BlendMode::SrcOver);
    builder.restore();
    let list = builder.build();
    assert_eq!(layer_options(&list), [false]);
    assert!(!list.can_apply_group_opacity());
}

#[test]
fn layer_paint_must_be_compatible() {
    let mut builder = DisplayListBuilder::new();
    builder.set_blend_mode(BlendMode::Multiply);
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.set_blend_mode(BlendMode::SrcOver);
    builder.draw_rect(rect(0.0));
    builder.restore();
    let list = builder.build();
    assert_eq!(
        layer_options(&list),
        [true],
        "the content can still take opacity"
    );
    assert!(
        !list.can_apply_group_opacity(),
        "but the layer composites with multiply"
    );
}

#[test]
fn hairline_strokes_are_incompatible() {
    let path = Arc::new(Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1));
    let mut builder = DisplayListBuilder::new();
    builder.set_draw_style(DrawStyle::Stroke);
    builder.draw_path(&path);
    assert!(!builder.build().can_apply_group_opacity());

    builder.set_draw_style(DrawStyle::Stroke);
    builder.set_stroke_width(1.0);
    builder.draw_path(&path);
    assert!(builder.build().can_apply_group_opacity());

    builder.set_stroke_width(0.0);
    builder.draw_path(&path);
    assert!(
        builder.build().can_apply_group_opacity(),
        "zero width fills are not hairlines"
    );
}

#[test]
fn overlapping_primitives_are_incompatible() {
    let mut builder = DisplayListBuilder::new();
    builder.draw_points(
        PointMode::Polygon,
        &[Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(0.0, 5.0)],
    );
    assert!(!builder.build().can_apply_group_opacity());
}

#[test]
fn nested_lists_bring_their_own_answer() {
    let mut inner = DisplayListBuilder::new();
    inner.draw_rect(rect(0.0));
    let compatible = inner.build();
    inner.draw_rect(rect(0.0));
    inner.draw_rect(rect(1.0));
    let incompatible = inner.build();

    let mut builder = DisplayListBuilder::new();
    builder.draw_display_list(&compatible);
    assert!(builder.build().can_apply_group_opacity());
    builder.draw_display_list(&incompatible);
    assert!(!builder.build().can_apply_group_opacity());
}
