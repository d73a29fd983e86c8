// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{BlendMode, RuntimeEffectInstance};

/// A custom blend function.
///
/// A blender that wraps a plain [`BlendMode`] is treated by display list
/// builders exactly like setting that mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Blender {
    /// A standard blend mode.
    Mode(BlendMode),
    /// A user shader that computes the blended color.
    RuntimeEffect(RuntimeEffectInstance),
}

impl Blender {
    /// The equivalent blend mode, if this blender is a plain mode.
    pub fn as_blend_mode(&self) -> Option<BlendMode> {
        match self {
            Self::Mode(mode) => Some(*mode),
            Self::RuntimeEffect(_) => None,
        }
    }

    /// Whether group opacity can be folded into draws using this blender.
    pub fn is_opacity_compatible(&self) -> bool {
        self.as_blend_mode()
            .is_some_and(BlendMode::is_opacity_compatible)
    }

    /// Whether drawing transparent black through this blender leaves the
    /// destination untouched.
    ///
    /// Unknown blend functions are assumed to touch the destination.
    pub fn nops_on_transparent_source(&self) -> bool {
        self.as_blend_mode()
            .is_some_and(BlendMode::nops_on_transparent_source)
    }
}

impl From<BlendMode> for Blender {
    fn from(mode: BlendMode) -> Self {
        Self::Mode(mode)
    }
}
