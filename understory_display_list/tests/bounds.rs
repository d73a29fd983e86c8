// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds reported by built display lists.

use std::sync::Arc;

use understory_display_list::kurbo::{BezPath, Point, Rect};
use understory_display_list::{
    BlurStyle, ClipOp, Color, DisplayListBuilder, Dispatcher, DrawStyle, ImageFilter,
    SaveLayerOptions, StrokeCap, StrokeJoin, TileMode,
};

fn zigzag() -> Arc<BezPath> {
    let mut path = BezPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((10.0, 40.0));
    path.line_to((20.0, 0.0));
    Arc::new(path)
}

#[test]
fn transformed_fill_and_stroked_circle() {
    let mut builder = DisplayListBuilder::new();
    builder.set_color(Color::RED);
    builder.save();
    builder.translate(10.0, 10.0);
    builder.draw_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
    builder.restore();
    builder.set_draw_style(DrawStyle::Stroke);
    builder.set_stroke_width(4.0);
    builder.draw_circle(Point::new(100.0, 100.0), 20.0);
    let list = builder.build();

    assert_eq!(list.bounds(), Rect::new(10.0, 10.0, 122.0, 122.0));
    assert_eq!(list.flood_bounds(), None);
}

#[test]
fn flood_is_limited_by_the_clip() {
    let clip = Rect::new(10.0, 10.0, 100.0, 100.0);
    let mut builder = DisplayListBuilder::new();
    builder.clip_rect(clip, ClipOp::Intersect, true);
    builder.draw_paint();
    let list = builder.build();
    assert_eq!(list.bounds(), clip);
    assert_eq!(list.flood_bounds(), Some(clip));
}

#[test]
fn flood_without_clip_covers_the_cull_rect() {
    let cull = Rect::new(0.0, 0.0, 64.0, 48.0);
    let mut builder = DisplayListBuilder::with_cull_rect(cull);
    builder.draw_color(Color::BLUE, understory_display_list::BlendMode::SrcOver);
    assert_eq!(builder.build().bounds(), cull);
}

#[test]
fn bounds_grow_with_stroke_width() {
    let path = zigzag();
    let mut previous: Option<Rect> = None;
    for width in [0.0, 0.5, 1.0, 2.0, 4.0, 8.0] {
        let mut builder = DisplayListBuilder::new();
        builder.set_draw_style(DrawStyle::Stroke);
        builder.set_stroke_width(width);
        builder.draw_path(&path);
        let bounds = builder.build().bounds();
        assert!(
            bounds.contains_rect(Rect::new(0.0, 0.0, 20.0, 40.0)),
            "width {width}: {bounds:?} must cover the geometry"
        );
        if let Some(previous) = previous {
            assert!(
                bounds.contains_rect(previous),
                "width {width}: {bounds:?} must contain {previous:?}"
            );
        }
        previous = Some(bounds);
    }
}

#[test]
fn miter_joins_reach_further_than_round_joins() {
    let path = zigzag();
    let bounds_for = |join| {
        let mut builder = DisplayListBuilder::new();
        builder.set_draw_style(DrawStyle::Stroke);
        builder.set_stroke_width(2.0);
        builder.set_stroke_join(join);
        builder.set_stroke_cap(StrokeCap::Round);
        builder.draw_path(&path);
        builder.build().bounds()
    };
    let miter = bounds_for(StrokeJoin::Miter);
    let round = bounds_for(StrokeJoin::Round);
    assert!(miter.contains_rect(round));
    assert!(miter.width() > round.width(), "{miter:?} vs {round:?}");
}

#[test]
fn blur_filter_is_conservative_under_scale() {
    let blur = ImageFilter::blur(3.0, 3.0, TileMode::Decal).map(Arc::new);
    let mut builder = DisplayListBuilder::new();
    builder.scale(2.0, 2.0);
    builder.set_image_filter(blur.as_ref());
    builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    let bounds = builder.build().bounds();
    // Three sigma on each side, scaled with the geometry.
    assert!(
        bounds.contains_rect(Rect::new(-18.0, -18.0, 38.0, 38.0)),
        "{bounds:?}"
    );
}

#[test]
fn mask_blur_expands_by_three_sigma() {
    let mut builder = DisplayListBuilder::new();
    builder.set_mask_blur_filter(BlurStyle::Normal, 2.0);
    builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(builder.build().bounds(), Rect::new(-6.0, -6.0, 16.0, 16.0));

    builder.set_mask_blur_filter(BlurStyle::Normal, 0.0);
    builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(
        builder.build().bounds(),
        Rect::new(0.0, 0.0, 10.0, 10.0),
        "a zero sigma blur is no blur"
    );
}

#[test]
fn layer_filter_applies_to_its_content() {
    let blur = ImageFilter::blur(2.0, 2.0, TileMode::Decal).map(Arc::new);
    let mut builder = DisplayListBuilder::new();
    builder.set_image_filter(blur.as_ref());
    builder.save_layer(None, SaveLayerOptions::RENDERS_WITH_ATTRIBUTES, None);
    builder.set_image_filter(None);
    builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    builder.restore();
    let bounds = builder.build().bounds();
    assert!(
        bounds.contains_rect(Rect::new(-6.0, -6.0, 16.0, 16.0)),
        "{bounds:?}"
    );
}

#[test]
fn layer_without_attributes_ignores_the_current_filter() {
    let blur = ImageFilter::blur(2.0, 2.0, TileMode::Decal).map(Arc::new);
    let mut builder = DisplayListBuilder::new();
    builder.set_image_filter(blur.as_ref());
    builder.save_layer(None, SaveLayerOptions::empty(), None);
    builder.set_image_filter(None);
    builder.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    builder.restore();
    assert_eq!(builder.build().bounds(), Rect::new(0.0, 0.0, 10.0, 10.0));
}

#[test]
fn nested_list_bounds_follow_the_transform() {
    let mut inner = DisplayListBuilder::new();
    inner.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
    let inner = inner.build();

    let mut outer = DisplayListBuilder::new();
    outer.translate(5.0, 5.0);
    outer.scale(2.0, 2.0);
    outer.draw_display_list(&inner);
    assert_eq!(outer.build().bounds(), Rect::new(5.0, 5.0, 13.0, 13.0));
}

#[test]
fn clipped_out_draws_contribute_nothing() {
    let mut builder = DisplayListBuilder::new();
    builder.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), ClipOp::Intersect, false);
    builder.draw_rect(Rect::new(20.0, 20.0, 30.0, 30.0));
    assert_eq!(builder.build().bounds(), Rect::ZERO);
}

#[test]
fn nested_lists_that_draw_nothing_add_nothing() {
    let mut inner = DisplayListBuilder::new();
    inner.set_color(Color::RED);
    let attributes_only = inner.build();
    inner.clip_rect(Rect::new(0.0, 0.0, 10.0, 10.0), ClipOp::Intersect, false);
    inner.draw_rect(Rect::new(20.0, 20.0, 30.0, 30.0));
    let clipped_out = inner.build();
    assert!(!attributes_only.is_empty());
    assert_eq!(attributes_only.content_bounds(), None);
    assert_eq!(clipped_out.content_bounds(), None);

    let content = Rect::new(100.0, 100.0, 110.0, 110.0);
    let mut outer = DisplayListBuilder::new();
    outer.draw_rect(content);
    outer.draw_display_list(&attributes_only);
    outer.translate(-50.0, -50.0);
    outer.draw_display_list(&clipped_out);
    let outer = outer.build();
    assert_eq!(
        outer.bounds(),
        content,
        "an empty nested list must not pull in its origin"
    );
}
