// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use core::fmt::Debug;

use kurbo::Rect;

/// An opaque image that display lists and image color sources refer to.
///
/// Display lists never look at pixels. They only need the dimensions for
/// bounds, opacity for optimization decisions, and whether the image may be
/// used off the thread that owns the GPU context.
pub trait DlImage: Debug + Send + Sync {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Whether every pixel is known to be opaque.
    fn is_opaque(&self) -> bool {
        false
    }

    /// Whether the image can be referenced from a display list that is built
    /// on a thread other than the one that owns the image's backing store.
    fn is_ui_thread_safe(&self) -> bool {
        true
    }

    /// The image bounds at the origin.
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width()), f64::from(self.height()))
    }
}

impl DlImage for peniko::ImageData {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Identity comparison for shared images.
///
/// Images are opaque, so two handles are only equal when they point at the
/// same allocation.
pub fn same_image(a: &Arc<dyn DlImage>, b: &Arc<dyn DlImage>) -> bool {
    Arc::ptr_eq(a, b)
}
