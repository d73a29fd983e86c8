// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Errors reported by the fallible effect constructors.
///
/// The infallible constructors never fail loudly: they normalize their input
/// or return `None` when the requested effect would be a no-op.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// A gradient was given no colors.
    #[error("a gradient needs at least one color")]
    EmptyGradient,
    /// Explicit gradient stops did not match the number of colors.
    #[error("gradient has {colors} colors but {stops} stops")]
    StopCountMismatch {
        /// Number of colors supplied.
        colors: usize,
        /// Number of stops supplied.
        stops: usize,
    },
    /// A runtime effect was bound to a uniform buffer of the wrong size.
    #[error("runtime effect expects {expected} bytes of uniforms, got {actual}")]
    UniformSize {
        /// Size declared by the program.
        expected: usize,
        /// Size of the buffer supplied.
        actual: usize,
    },
    /// A runtime effect was bound to the wrong number of child samplers.
    #[error("runtime effect expects {expected} samplers, got {actual}")]
    SamplerCount {
        /// Slots declared by the program.
        expected: usize,
        /// Samplers supplied.
        actual: usize,
    },
}

impl EffectError {
    pub(crate) fn stop_count_mismatch(colors: usize, stops: usize) -> Self {
        Self::StopCountMismatch { colors, stops }
    }
}
