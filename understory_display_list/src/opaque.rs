// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Externally owned objects a display list can draw but never looks inside.

use core::fmt::Debug;

use kurbo::Rect;

/// A recorded picture from another recording system.
pub trait DlPicture: Debug + Send + Sync {
    /// Bounds of everything the picture draws.
    fn cull_rect(&self) -> Rect;

    /// Number of ops in the picture, counting nested pictures when `nested`
    /// is set.
    fn approximate_op_count(&self, nested: bool) -> usize;

    /// Approximate memory used by the picture, in bytes.
    fn approximate_bytes_used(&self) -> usize;

    /// Whether the picture may be referenced off the UI thread.
    fn is_ui_thread_safe(&self) -> bool {
        true
    }
}

/// A shaped run of glyphs.
pub trait TextRun: Debug + Send + Sync {
    /// Bounds of the glyphs relative to the run origin.
    fn bounds(&self) -> Rect;
}
