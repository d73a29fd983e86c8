// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Display Effects: immutable paint effect values.
//!
//! These are the attribute objects a display list records alongside its
//! geometry: shaders ([`ColorSource`]), per-pixel color transforms
//! ([`ColorFilter`]), output filters ([`ImageFilter`]), coverage filters
//! ([`MaskFilter`]), geometry transforms ([`PathEffect`]) and custom blend
//! functions ([`Blender`]).
//!
//! Every effect is a plain value. Effects are shared by `Arc`, compare
//! structurally, and never change after construction. Constructors that take
//! numeric parameters return `None` (or an [`EffectError`] for malformed
//! input) when the parameters describe an effect that would do nothing, so
//! "no effect" is always spelled `None` rather than as an identity object.
//!
//! Effects also answer the questions a display list needs for bounds and
//! optimization:
//!
//! - [`ImageFilter::map_local_bounds`], [`ImageFilter::map_device_bounds`] and
//!   [`ImageFilter::get_input_device_bounds`] map bounds through a filter.
//! - [`ColorFilter::modifies_transparent_black`] and
//!   [`ImageFilter::modifies_transparent_black`] tell whether an effect can
//!   paint outside the geometry it is applied to.
//! - [`ColorSource::is_opaque`] and [`ColorFilter::can_commute_with_opacity`]
//!   feed opacity optimizations.
//!
//! Colors, blend modes and transforms are the small value types used by the
//! effects and by the display list records: [`Color`] (packed ARGB),
//! [`BlendMode`] and [`Matrix`] (a 4x4 transform that maps rects exactly for
//! the affine subset and conservatively under perspective).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod blend_mode;
mod blender;
mod color;
mod color_filter;
mod color_source;
mod error;
mod image;
mod image_filter;
mod mask_filter;
mod matrix;
mod path_effect;
mod runtime_effect;
mod sampling;

pub use blend_mode::BlendMode;
pub use blender::Blender;
pub use color::Color;
pub use color_filter::{ColorFilter, ColorFilterType};
pub use color_source::{
    ColorSource, ColorSourceType, ConicalGradient, GradientStops, ImageSource, LinearGradient,
    RadialGradient, SweepGradient,
};
pub use error::EffectError;
pub use image::{DlImage, same_image};
pub use image_filter::{ImageFilter, ImageFilterType, MatrixCapability};
pub use mask_filter::{BlurStyle, MaskFilter, MaskFilterType};
pub use matrix::Matrix;
pub use path_effect::{PathEffect, PathEffectType};
pub use runtime_effect::{RuntimeEffect, RuntimeEffectInstance};
pub use sampling::{FilterMode, ImageSampling, TileMode};

pub use kurbo;
pub use peniko;
