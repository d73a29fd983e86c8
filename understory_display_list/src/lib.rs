// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Display List: recorded, replayable drawing command streams.
//!
//! A [`DisplayList`] is an immutable recording of 2D drawing operations:
//! attribute changes, save/restore and offscreen layers, transforms, clips
//! and draws. Lists are produced by a [`DisplayListBuilder`], shared as
//! `Arc<DisplayList>`, and replayed any number of times, from any thread,
//! into a [`Dispatcher`].
//!
//! # Core concepts
//!
//! - **[`Dispatcher`]**: one method per operation kind. Renderers, analyzers
//!   and the builder itself implement it; replaying a list into a builder
//!   copies it.
//! - **[`DisplayListBuilder`]**: records operations into a compact byte
//!   stream. Attribute setters are deduplicated against the current state,
//!   degenerate calls are normalized or dropped, and the builder tracks
//!   whether a group opacity can be distributed to the individual draws
//!   ([`DisplayList::can_apply_group_opacity`]). Save layers whose content
//!   allows it are marked with [`SaveLayerOptions::CAN_DISTRIBUTE_OPACITY`].
//! - **Bounds**: [`DisplayList::bounds`] is computed on first use by the
//!   [`BoundsCalculator`], accounting for stroke geometry, mask blurs, image
//!   filters, clips and save layers.
//! - **Attribute flags**: [`DisplayListOpFlags`] describe which paint
//!   attributes each operation consults.
//!
//! Shared objects such as paths, effects, images and nested lists are held
//! by `Arc` in side tables next to the byte stream. Effects come from
//! [`understory_display_effects`], whose common types are re-exported here.
//!
//! # Example
//!
//! ```
//! use understory_display_list::{
//!     Color, Dispatcher, DisplayListBuilder, DrawStyle, kurbo::{Point, Rect},
//! };
//!
//! let mut builder = DisplayListBuilder::new();
//! builder.set_color(Color::RED);
//! builder.save();
//! builder.translate(10.0, 10.0);
//! builder.draw_rect(Rect::new(0.0, 0.0, 50.0, 50.0));
//! builder.restore();
//! builder.set_draw_style(DrawStyle::Stroke);
//! builder.set_stroke_width(4.0);
//! builder.draw_circle(Point::new(100.0, 100.0), 20.0);
//! let list = builder.build();
//!
//! assert_eq!(list.bounds(), Rect::new(10.0, 10.0, 122.0, 122.0));
//! assert!(!list.can_apply_group_opacity(), "two draws may overlap");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod builder;
mod dispatcher;
mod display_list;
mod error;
mod flags;
mod opacity;
mod op_type;
mod opaque;
mod paint;
mod replay;
mod storage;
mod types;
mod vertices;

pub use bounds::BoundsCalculator;
pub use builder::{DEFAULT_CULL_RECT, DisplayListBuilder};
pub use dispatcher::Dispatcher;
pub use display_list::DisplayList;
pub use error::DisplayListError;
pub use flags::{DisplayListAttributeFlags, DisplayListOpFlags};
pub use op_type::DisplayListOpType;
pub use opaque::{DlPicture, TextRun};
pub use paint::{Paint, PaintBlend, PaintMask};
pub use types::{
    ClipOp, DrawStyle, Lattice, PointMode, RsTransform, SaveLayerOptions, SrcRectConstraint,
    StrokeCap, StrokeJoin,
};
pub use vertices::{VertexMode, Vertices};

pub use understory_display_effects::{
    BlendMode, Blender, BlurStyle, Color, ColorFilter, ColorSource, DlImage, EffectError,
    FilterMode, ImageFilter, ImageSampling, MaskFilter, Matrix, PathEffect, RuntimeEffect,
    RuntimeEffectInstance, TileMode,
};

pub use kurbo;
pub use peniko;
