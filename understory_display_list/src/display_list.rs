// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable recorded display lists.

use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use kurbo::Rect;

use crate::bounds::BoundsCalculator;
use crate::replay::dispatch_records;
use crate::storage::{ObjectTables, Records};
use crate::{DisplayListError, DisplayListOpType, Dispatcher};

static NEXT_UNIQUE_ID: AtomicU32 = AtomicU32::new(1);

fn next_unique_id() -> u32 {
    loop {
        let id = NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed);
        // Skip zero after wraparound.
        if id != 0 {
            return id;
        }
    }
}

/// Everything a finished recording hands to [`DisplayList`].
#[derive(Debug)]
pub(crate) struct RecordedList {
    pub(crate) bytes: Vec<u8>,
    pub(crate) objects: ObjectTables,
    pub(crate) op_count: usize,
    pub(crate) nested_byte_count: usize,
    pub(crate) nested_op_count: usize,
    pub(crate) cull_rect: Rect,
    pub(crate) can_apply_group_opacity: bool,
    pub(crate) is_ui_thread_safe: bool,
}

/// Bounds computed on first use.
///
/// Holds the bounds and the flood bounds as eight `f64` bit patterns, with an
/// inverted rect standing for `None`. Two threads may both compute; they
/// produce the same values.
#[derive(Debug)]
struct LazyBounds {
    ready: AtomicBool,
    cells: [AtomicU64; 8],
}

const NO_RECT: Rect = Rect::new(
    f64::INFINITY,
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
);

impl LazyBounds {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            cells: [const { AtomicU64::new(0) }; 8],
        }
    }

    fn load(&self) -> Option<(Option<Rect>, Option<Rect>)> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        let rect = |start: usize| {
            let rect = Rect::new(
                f64::from_bits(self.cells[start].load(Ordering::Relaxed)),
                f64::from_bits(self.cells[start + 1].load(Ordering::Relaxed)),
                f64::from_bits(self.cells[start + 2].load(Ordering::Relaxed)),
                f64::from_bits(self.cells[start + 3].load(Ordering::Relaxed)),
            );
            (rect.x0 <= rect.x1).then_some(rect)
        };
        Some((rect(0), rect(4)))
    }

    fn store(&self, bounds: Option<Rect>, flood: Option<Rect>) {
        let bounds = bounds.unwrap_or(NO_RECT);
        let flood = flood.unwrap_or(NO_RECT);
        let values = [
            bounds.x0, bounds.y0, bounds.x1, bounds.y1, flood.x0, flood.y0, flood.x1, flood.y1,
        ];
        for (cell, value) in self.cells.iter().zip(values) {
            cell.store(value.to_bits(), Ordering::Relaxed);
        }
        self.ready.store(true, Ordering::Release);
    }
}

/// A finished, immutable recording of drawing operations.
///
/// Lists are built with a [`DisplayListBuilder`](crate::DisplayListBuilder)
/// and shared as `Arc<DisplayList>`. They can be replayed any number of times
/// into a [`Dispatcher`], from any thread, and drawn into other lists.
pub struct DisplayList {
    bytes: Vec<u8>,
    objects: ObjectTables,
    op_count: usize,
    nested_byte_count: usize,
    nested_op_count: usize,
    unique_id: u32,
    cull_rect: Rect,
    can_apply_group_opacity: bool,
    is_ui_thread_safe: bool,
    bounds: LazyBounds,
}

impl fmt::Debug for DisplayList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayList")
            .field("unique_id", &self.unique_id)
            .field("op_count", &self.op_count)
            .field("byte_count", &self.bytes.len())
            .field("cull_rect", &self.cull_rect)
            .field("can_apply_group_opacity", &self.can_apply_group_opacity)
            .finish_non_exhaustive()
    }
}

impl DisplayList {
    pub(crate) fn from_recording(recorded: RecordedList) -> Self {
        Self {
            bytes: recorded.bytes,
            objects: recorded.objects,
            op_count: recorded.op_count,
            nested_byte_count: recorded.nested_byte_count,
            nested_op_count: recorded.nested_op_count,
            unique_id: next_unique_id(),
            cull_rect: recorded.cull_rect,
            can_apply_group_opacity: recorded.can_apply_group_opacity,
            is_ui_thread_safe: recorded.is_ui_thread_safe,
            bounds: LazyBounds::new(),
        }
    }

    /// Replays every operation, in recording order, into `dispatcher`.
    ///
    /// Lists produced by a builder always decode. If the stream is
    /// nevertheless malformed, replay stops at the bad record and the error is
    /// logged; see [`validate`](Self::validate) to check a list up front.
    pub fn dispatch<D: Dispatcher + ?Sized>(&self, dispatcher: &mut D) {
        let result = dispatch_records(&self.bytes, &self.objects, dispatcher);
        if let Err(err) = &result {
            tracing::error!(id = self.unique_id, %err, "display list replay stopped");
        }
        debug_assert!(result.is_ok(), "builder output must always decode");
    }

    /// Number of recorded operations, optionally including those of nested
    /// lists and pictures.
    pub fn op_count(&self, nested: bool) -> usize {
        if nested {
            self.op_count + self.nested_op_count
        } else {
            self.op_count
        }
    }

    /// Approximate memory used, optionally including nested lists and
    /// pictures.
    pub fn bytes(&self, nested: bool) -> usize {
        let own = size_of::<Self>() + self.bytes.len();
        if nested {
            own + self.nested_byte_count
        } else {
            own
        }
    }

    /// A process-wide id, distinct for every list built.
    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    /// The cull rect the list was recorded with.
    pub fn cull_rect(&self) -> Rect {
        self.cull_rect
    }

    /// Conservative bounds of everything the list draws, in the coordinates
    /// it was recorded in. [`Rect::ZERO`] when nothing is drawn.
    ///
    /// Computed on first call.
    pub fn bounds(&self) -> Rect {
        self.content_bounds().unwrap_or(Rect::ZERO)
    }

    /// Like [`bounds`](Self::bounds), but `None` when the list draws nothing
    /// visible: it has no draw ops, or every draw is clipped out.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.computed_bounds().0
    }

    /// The union of the clips in effect for ops that flood their clip, or
    /// `None` if the list has no such op.
    pub fn flood_bounds(&self) -> Option<Rect> {
        self.computed_bounds().1
    }

    fn computed_bounds(&self) -> (Option<Rect>, Option<Rect>) {
        if let Some(computed) = self.bounds.load() {
            return computed;
        }
        let _span = tracing::trace_span!("display_list_bounds", id = self.unique_id).entered();
        let mut calculator = BoundsCalculator::new(self.cull_rect);
        self.dispatch(&mut calculator);
        let (bounds, flood) = calculator.finish();
        tracing::trace!(?bounds, ?flood, "computed bounds");
        self.bounds.store(bounds, flood);
        (bounds, flood)
    }

    /// Whether a single opacity multiplier can be applied to each operation
    /// instead of compositing the list through an offscreen layer.
    pub fn can_apply_group_opacity(&self) -> bool {
        self.can_apply_group_opacity
    }

    /// Whether every image, picture and nested list is safe to use on the UI
    /// thread.
    pub fn is_ui_thread_safe(&self) -> bool {
        self.is_ui_thread_safe
    }

    /// Whether the list has no operations.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether two lists record the same operations with equal objects.
    ///
    /// Objects without value equality (images, pictures, text runs) compare
    /// by identity.
    pub fn equals(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
            || (self.op_count == other.op_count
                && self.bytes == other.bytes
                && self.objects.equals(&other.objects))
    }

    /// Checks that every record decodes and that every restore has a matching
    /// save.
    pub fn validate(&self) -> Result<(), DisplayListError> {
        struct Ignore;
        impl Dispatcher for Ignore {}

        dispatch_records(&self.bytes, &self.objects, &mut Ignore)?;
        let mut depth = 0_usize;
        for record in Records::new(&self.bytes) {
            let record = record?;
            match record.op {
                DisplayListOpType::Save
                | DisplayListOpType::SaveLayer
                | DisplayListOpType::SaveLayerBounds
                | DisplayListOpType::SaveLayerBackdrop
                | DisplayListOpType::SaveLayerBackdropBounds => depth += 1,
                DisplayListOpType::Restore => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(DisplayListError::UnbalancedRestore {
                            offset: record.offset,
                        })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The record stream and object tables.
    #[cfg(test)]
    pub(crate) fn raw_parts(&self) -> (&[u8], &ObjectTables) {
        (&self.bytes, &self.objects)
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use kurbo::Shape;

    use super::*;
    use crate::storage::OpWriter;
    use crate::DisplayListBuilder;

    fn from_writer(writer: &mut OpWriter, op_count: usize) -> DisplayList {
        let (bytes, objects) = writer.take();
        DisplayList::from_recording(RecordedList {
            bytes,
            objects,
            op_count,
            nested_byte_count: 0,
            nested_op_count: 0,
            cull_rect: Rect::ZERO,
            can_apply_group_opacity: true,
            is_ui_thread_safe: true,
        })
    }

    #[test]
    fn ids_are_unique() {
        let mut builder = DisplayListBuilder::new();
        let a = builder.build();
        let b = builder.build();
        assert_ne!(a.unique_id(), b.unique_id());
        assert_ne!(a.unique_id(), 0);
    }

    #[test]
    fn empty_list() {
        let list = DisplayListBuilder::new().build();
        assert!(list.is_empty());
        assert_eq!(list.op_count(true), 0);
        assert_eq!(list.bounds(), Rect::ZERO);
        assert_eq!(list.content_bounds(), None);
        assert_eq!(list.flood_bounds(), None);
        assert!(list.can_apply_group_opacity());
        assert!(list.bytes(false) >= size_of::<DisplayList>());
    }

    #[test]
    fn bounds_are_memoized() {
        let mut builder = DisplayListBuilder::new();
        builder.draw_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        let list = builder.build();
        assert!(list.bounds.load().is_none());
        assert_eq!(list.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            list.bounds.load(),
            Some((Some(Rect::new(1.0, 2.0, 3.0, 4.0)), None))
        );
    }

    #[test]
    fn unbalanced_restore_fails_validation() {
        let mut writer = OpWriter::default();
        let offset = writer.begin(DisplayListOpType::Restore);
        writer.finish(offset);
        let list = from_writer(&mut writer, 1);
        assert_eq!(
            list.validate(),
            Err(DisplayListError::UnbalancedRestore { offset: 0 })
        );
    }

    #[test]
    fn truncated_record_fails_validation() {
        let mut writer = OpWriter::default();
        let offset = writer.begin(DisplayListOpType::DrawRect);
        writer.f64(1.0);
        writer.finish(offset);
        let list = from_writer(&mut writer, 1);
        assert!(matches!(
            list.validate(),
            Err(DisplayListError::Truncated { .. })
        ));
    }

    #[test]
    fn equal_recordings_compare_equal() {
        let record = |color| {
            let mut builder = DisplayListBuilder::new();
            builder.set_color(color);
            builder.draw_path(&Arc::new(Rect::new(0.0, 0.0, 4.0, 4.0).to_path(0.1)));
            builder.build()
        };
        let a = record(crate::Color::RED);
        let b = record(crate::Color::RED);
        let c = record(crate::Color::BLUE);
        assert!(a.equals(&b), "separately allocated equal paths compare by value");
        assert!(!a.equals(&c));
        assert_ne!(a.unique_id(), b.unique_id());
    }
}
