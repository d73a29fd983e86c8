// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The byte stream and shared-object tables behind a display list.
//!
//! Each record is an 8-byte header (`[tag u8][3 reserved][size u32 LE]`)
//! followed by its fixed fields and then any variable-length arrays, padded
//! so the next record starts on an 8-byte boundary. Fields are little-endian.
//! Shared objects (paths, effects, images, nested lists) live in typed side
//! tables and are referenced from records by a `u32` index into the table for
//! their type.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, RoundedRectRadii};
use understory_display_effects::{
    Blender, Color, ColorFilter, ColorSource, DlImage, ImageFilter, MaskFilter, Matrix, PathEffect,
};

use crate::{
    DisplayList, DisplayListError, DisplayListOpType, DlPicture, StrokeCap, StrokeJoin, TextRun,
    Vertices,
};

pub(crate) const HEADER_SIZE: usize = 8;
pub(crate) const RECORD_ALIGN: usize = 8;
/// Offset of the first payload byte of a save-layer record, which holds its
/// [`SaveLayerOptions`](crate::SaveLayerOptions).
pub(crate) const SAVE_LAYER_OPTIONS_OFFSET: usize = HEADER_SIZE;

/// Shared objects referenced by index from records.
#[derive(Clone, Debug, Default)]
pub(crate) struct ObjectTables {
    pub(crate) paths: Vec<Arc<BezPath>>,
    pub(crate) color_sources: Vec<Arc<ColorSource>>,
    pub(crate) color_filters: Vec<Arc<ColorFilter>>,
    pub(crate) image_filters: Vec<Arc<ImageFilter>>,
    pub(crate) mask_filters: Vec<Arc<MaskFilter>>,
    pub(crate) path_effects: Vec<Arc<PathEffect>>,
    pub(crate) blenders: Vec<Arc<Blender>>,
    pub(crate) images: Vec<Arc<dyn DlImage>>,
    pub(crate) vertices: Vec<Arc<Vertices>>,
    pub(crate) display_lists: Vec<Arc<DisplayList>>,
    pub(crate) pictures: Vec<Arc<dyn DlPicture>>,
    pub(crate) text_runs: Vec<Arc<dyn TextRun>>,
}

impl ObjectTables {
    fn shrink_to_fit(&mut self) {
        self.paths.shrink_to_fit();
        self.color_sources.shrink_to_fit();
        self.color_filters.shrink_to_fit();
        self.image_filters.shrink_to_fit();
        self.mask_filters.shrink_to_fit();
        self.path_effects.shrink_to_fit();
        self.blenders.shrink_to_fit();
        self.images.shrink_to_fit();
        self.vertices.shrink_to_fit();
        self.display_lists.shrink_to_fit();
        self.pictures.shrink_to_fit();
        self.text_runs.shrink_to_fit();
    }

    /// Structural equality: effects, paths and vertices by value, opaque
    /// objects by identity, nested lists by their own equality.
    pub(crate) fn equals(&self, other: &Self) -> bool {
        fn by_value<T: PartialEq + ?Sized>(a: &[Arc<T>], b: &[Arc<T>]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| Arc::ptr_eq(a, b) || **a == **b)
        }
        fn by_identity<T: ?Sized>(a: &[Arc<T>], b: &[Arc<T>]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| Arc::ptr_eq(a, b))
        }
        by_value(&self.paths, &other.paths)
            && by_value(&self.color_sources, &other.color_sources)
            && by_value(&self.color_filters, &other.color_filters)
            && by_value(&self.image_filters, &other.image_filters)
            && by_value(&self.mask_filters, &other.mask_filters)
            && by_value(&self.path_effects, &other.path_effects)
            && by_value(&self.blenders, &other.blenders)
            && by_value(&self.vertices, &other.vertices)
            && by_identity(&self.images, &other.images)
            && by_identity(&self.pictures, &other.pictures)
            && by_identity(&self.text_runs, &other.text_runs)
            && self.display_lists.len() == other.display_lists.len()
            && self
                .display_lists
                .iter()
                .zip(&other.display_lists)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a.equals(b))
    }
}

fn push_object<T: ?Sized>(table: &mut Vec<Arc<T>>, object: Arc<T>) -> u32 {
    let index = u32::try_from(table.len()).unwrap_or(u32::MAX);
    table.push(object);
    index
}

/// Appends records to a growable byte buffer.
#[derive(Debug, Default)]
pub(crate) struct OpWriter {
    bytes: Vec<u8>,
    objects: ObjectTables,
}

impl OpWriter {
    /// Starts a record and returns its offset.
    pub(crate) fn begin(&mut self, op: DisplayListOpType) -> usize {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(&[op as u8, 0, 0, 0, 0, 0, 0, 0]);
        offset
    }

    /// Pads the record started at `offset` and writes its size.
    pub(crate) fn finish(&mut self, offset: usize) {
        let padded = self.bytes.len().next_multiple_of(RECORD_ALIGN);
        self.bytes.resize(padded, 0);
        let size = u32::try_from(padded - offset).unwrap_or(u32::MAX);
        self.bytes[offset + 4..offset + 8].copy_from_slice(&size.to_le_bytes());
    }

    pub(crate) fn byte_count(&self) -> usize {
        self.bytes.len()
    }

    /// Overwrites one byte of an already written record.
    pub(crate) fn patch_u8(&mut self, offset: usize, value: u8) {
        if let Some(byte) = self.bytes.get_mut(offset) {
            *byte = value;
        }
    }

    pub(crate) fn read_u8(&self, offset: usize) -> u8 {
        self.bytes.get(offset).copied().unwrap_or(0)
    }

    /// Hands over the finished stream and object tables, leaving the writer
    /// empty.
    pub(crate) fn take(&mut self) -> (Vec<u8>, ObjectTables) {
        let mut bytes = core::mem::take(&mut self.bytes);
        let mut objects = core::mem::take(&mut self.objects);
        bytes.shrink_to_fit();
        objects.shrink_to_fit();
        (bytes, objects)
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub(crate) fn bool(&mut self, value: bool) {
        self.bytes.push(u8::from(value));
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn f64(&mut self, value: f64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a collection length.
    pub(crate) fn count(&mut self, count: usize) {
        self.u32(u32::try_from(count).unwrap_or(u32::MAX));
    }

    pub(crate) fn color(&mut self, color: Color) {
        self.u32(color.argb());
    }

    pub(crate) fn point(&mut self, p: Point) {
        self.f64(p.x);
        self.f64(p.y);
    }

    pub(crate) fn rect(&mut self, r: Rect) {
        self.f64(r.x0);
        self.f64(r.y0);
        self.f64(r.x1);
        self.f64(r.y1);
    }

    pub(crate) fn rounded_rect(&mut self, rr: RoundedRect) {
        let radii = rr.radii();
        self.rect(rr.rect());
        self.f64(radii.top_left);
        self.f64(radii.top_right);
        self.f64(radii.bottom_right);
        self.f64(radii.bottom_left);
    }

    pub(crate) fn affine(&mut self, affine: Affine) {
        for c in affine.as_coeffs() {
            self.f64(c);
        }
    }

    pub(crate) fn matrix(&mut self, matrix: &Matrix) {
        for v in matrix.as_row_major() {
            self.f64(*v);
        }
    }

    pub(crate) fn cap(&mut self, cap: StrokeCap) {
        self.u8(match cap {
            StrokeCap::Butt => 0,
            StrokeCap::Square => 1,
            StrokeCap::Round => 2,
        });
    }

    pub(crate) fn join(&mut self, join: StrokeJoin) {
        self.u8(match join {
            StrokeJoin::Miter => 0,
            StrokeJoin::Round => 1,
            StrokeJoin::Bevel => 2,
        });
    }

    pub(crate) fn path(&mut self, path: Arc<BezPath>) {
        let index = push_object(&mut self.objects.paths, path);
        self.u32(index);
    }

    pub(crate) fn color_source(&mut self, source: Arc<ColorSource>) {
        let index = push_object(&mut self.objects.color_sources, source);
        self.u32(index);
    }

    pub(crate) fn color_filter(&mut self, filter: Arc<ColorFilter>) {
        let index = push_object(&mut self.objects.color_filters, filter);
        self.u32(index);
    }

    pub(crate) fn image_filter(&mut self, filter: Arc<ImageFilter>) {
        let index = push_object(&mut self.objects.image_filters, filter);
        self.u32(index);
    }

    pub(crate) fn mask_filter(&mut self, filter: Arc<MaskFilter>) {
        let index = push_object(&mut self.objects.mask_filters, filter);
        self.u32(index);
    }

    pub(crate) fn path_effect(&mut self, effect: Arc<PathEffect>) {
        let index = push_object(&mut self.objects.path_effects, effect);
        self.u32(index);
    }

    pub(crate) fn blender(&mut self, blender: Arc<Blender>) {
        let index = push_object(&mut self.objects.blenders, blender);
        self.u32(index);
    }

    pub(crate) fn image(&mut self, image: Arc<dyn DlImage>) {
        let index = push_object(&mut self.objects.images, image);
        self.u32(index);
    }

    pub(crate) fn vertices(&mut self, vertices: Arc<Vertices>) {
        let index = push_object(&mut self.objects.vertices, vertices);
        self.u32(index);
    }

    pub(crate) fn display_list(&mut self, display_list: Arc<DisplayList>) {
        let index = push_object(&mut self.objects.display_lists, display_list);
        self.u32(index);
    }

    pub(crate) fn picture(&mut self, picture: Arc<dyn DlPicture>) {
        let index = push_object(&mut self.objects.pictures, picture);
        self.u32(index);
    }

    pub(crate) fn text_run(&mut self, run: Arc<dyn TextRun>) {
        let index = push_object(&mut self.objects.text_runs, run);
        self.u32(index);
    }
}

/// One decoded record header plus its payload.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Record<'a> {
    pub(crate) op: DisplayListOpType,
    pub(crate) offset: usize,
    pub(crate) payload: &'a [u8],
}

/// Walks the records of a stream, validating each header.
///
/// After the first error the iterator is exhausted.
#[derive(Clone, Debug)]
pub(crate) struct Records<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn header(&self) -> Result<Record<'a>, DisplayListError> {
        let offset = self.pos;
        let remaining = self.bytes.len() - offset;
        let header = self
            .bytes
            .get(offset..offset + HEADER_SIZE)
            .ok_or(DisplayListError::BadRecordSize {
                offset,
                size: remaining,
            })?;
        let tag = header[0];
        let mut size_bytes = [0_u8; 4];
        size_bytes.copy_from_slice(&header[4..8]);
        let size = usize::try_from(u32::from_le_bytes(size_bytes)).unwrap_or(usize::MAX);
        if size < HEADER_SIZE || size % RECORD_ALIGN != 0 || size > remaining {
            return Err(DisplayListError::BadRecordSize { offset, size });
        }
        let op = DisplayListOpType::from_u8(tag)
            .ok_or(DisplayListError::UnknownOp { tag, offset })?;
        Ok(Record {
            op,
            offset,
            payload: &self.bytes[offset + HEADER_SIZE..offset + size],
        })
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, DisplayListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        match self.header() {
            Ok(record) => {
                self.pos += HEADER_SIZE + record.payload.len();
                Some(Ok(record))
            }
            Err(err) => {
                self.pos = self.bytes.len();
                Some(Err(err))
            }
        }
    }
}

/// Reads the fields of one record in the order they were written.
#[derive(Debug)]
pub(crate) struct FieldReader<'a> {
    record: Record<'a>,
    objects: &'a ObjectTables,
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(record: Record<'a>, objects: &'a ObjectTables) -> Self {
        Self {
            record,
            objects,
            pos: 0,
        }
    }

    fn truncated(&self) -> DisplayListError {
        DisplayListError::Truncated {
            op: self.record.op.name(),
            offset: self.record.offset,
        }
    }

    fn invalid(&self, value: u8) -> DisplayListError {
        DisplayListError::InvalidValue {
            op: self.record.op.name(),
            offset: self.record.offset,
            value,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DisplayListError> {
        let bytes = self
            .record
            .payload
            .get(self.pos..self.pos + N)
            .ok_or_else(|| self.truncated())?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        self.pos += N;
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DisplayListError> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn bool(&mut self) -> Result<bool, DisplayListError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.invalid(other)),
        }
    }

    /// Reads a byte and decodes it with `decode`.
    pub(crate) fn enum_u8<T>(
        &mut self,
        decode: fn(u8) -> Option<T>,
    ) -> Result<T, DisplayListError> {
        let raw = self.u8()?;
        decode(raw).ok_or_else(|| self.invalid(raw))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DisplayListError> {
        self.take().map(u32::from_le_bytes)
    }

    pub(crate) fn i32(&mut self) -> Result<i32, DisplayListError> {
        self.take().map(i32::from_le_bytes)
    }

    pub(crate) fn f64(&mut self) -> Result<f64, DisplayListError> {
        self.take().map(f64::from_le_bytes)
    }

    /// Reads a collection length, checking that `element_size * len` bytes
    /// remain so corrupt lengths cannot trigger huge allocations.
    pub(crate) fn count(&mut self, element_size: usize) -> Result<usize, DisplayListError> {
        let count = usize::try_from(self.u32()?).unwrap_or(usize::MAX);
        let remaining = self.record.payload.len() - self.pos;
        if count.saturating_mul(element_size) > remaining {
            return Err(self.truncated());
        }
        Ok(count)
    }

    pub(crate) fn color(&mut self) -> Result<Color, DisplayListError> {
        self.u32().map(Color)
    }

    pub(crate) fn point(&mut self) -> Result<Point, DisplayListError> {
        Ok(Point::new(self.f64()?, self.f64()?))
    }

    pub(crate) fn rect(&mut self) -> Result<Rect, DisplayListError> {
        Ok(Rect::new(self.f64()?, self.f64()?, self.f64()?, self.f64()?))
    }

    pub(crate) fn rounded_rect(&mut self) -> Result<RoundedRect, DisplayListError> {
        let rect = self.rect()?;
        let radii = RoundedRectRadii::new(self.f64()?, self.f64()?, self.f64()?, self.f64()?);
        Ok(RoundedRect::from_rect(rect, radii))
    }

    pub(crate) fn affine(&mut self) -> Result<Affine, DisplayListError> {
        let mut coeffs = [0.0; 6];
        for c in &mut coeffs {
            *c = self.f64()?;
        }
        Ok(Affine::new(coeffs))
    }

    pub(crate) fn matrix(&mut self) -> Result<Matrix, DisplayListError> {
        let mut values = [0.0; 16];
        for v in &mut values {
            *v = self.f64()?;
        }
        Ok(Matrix::from_row_major(values))
    }

    pub(crate) fn cap(&mut self) -> Result<StrokeCap, DisplayListError> {
        self.enum_u8(|v| match v {
            0 => Some(StrokeCap::Butt),
            1 => Some(StrokeCap::Square),
            2 => Some(StrokeCap::Round),
            _ => None,
        })
    }

    pub(crate) fn join(&mut self) -> Result<StrokeJoin, DisplayListError> {
        self.enum_u8(|v| match v {
            0 => Some(StrokeJoin::Miter),
            1 => Some(StrokeJoin::Round),
            2 => Some(StrokeJoin::Bevel),
            _ => None,
        })
    }

    fn object<T: ?Sized>(&mut self, table: &'a [Arc<T>]) -> Result<&'a Arc<T>, DisplayListError> {
        let index = self.u32()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| table.get(i))
            .ok_or(DisplayListError::MissingObject {
                op: self.record.op.name(),
                offset: self.record.offset,
                index,
            })
    }

    pub(crate) fn path(&mut self) -> Result<&'a Arc<BezPath>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.paths)
    }

    pub(crate) fn color_source(&mut self) -> Result<&'a Arc<ColorSource>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.color_sources)
    }

    pub(crate) fn color_filter(&mut self) -> Result<&'a Arc<ColorFilter>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.color_filters)
    }

    pub(crate) fn image_filter(&mut self) -> Result<&'a Arc<ImageFilter>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.image_filters)
    }

    pub(crate) fn mask_filter(&mut self) -> Result<&'a Arc<MaskFilter>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.mask_filters)
    }

    pub(crate) fn path_effect(&mut self) -> Result<&'a Arc<PathEffect>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.path_effects)
    }

    pub(crate) fn blender(&mut self) -> Result<&'a Arc<Blender>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.blenders)
    }

    pub(crate) fn image(&mut self) -> Result<&'a Arc<dyn DlImage>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.images)
    }

    pub(crate) fn vertices(&mut self) -> Result<&'a Arc<Vertices>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.vertices)
    }

    pub(crate) fn display_list(&mut self) -> Result<&'a Arc<DisplayList>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.display_lists)
    }

    pub(crate) fn picture(&mut self) -> Result<&'a Arc<dyn DlPicture>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.pictures)
    }

    pub(crate) fn text_run(&mut self) -> Result<&'a Arc<dyn TextRun>, DisplayListError> {
        let objects = self.objects;
        self.object(&objects.text_runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_one(
        op: DisplayListOpType,
        fields: impl FnOnce(&mut OpWriter),
    ) -> (Vec<u8>, ObjectTables) {
        let mut writer = OpWriter::default();
        let offset = writer.begin(op);
        fields(&mut writer);
        writer.finish(offset);
        writer.take()
    }

    #[test]
    fn records_are_aligned_and_sized() {
        let (bytes, _) = write_one(DisplayListOpType::SetAntiAlias, |w| w.bool(true));
        assert_eq!(bytes.len(), 16, "8-byte header plus one padded byte");
        assert_eq!(bytes[0], DisplayListOpType::SetAntiAlias as u8);
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 16);
    }

    #[test]
    fn fields_read_back_in_order() {
        let rr = RoundedRect::new(0.0, 0.0, 10.0, 20.0, (1.0, 2.0, 3.0, 4.0));
        let (bytes, objects) = write_one(DisplayListOpType::DrawRoundedRect, |w| {
            w.rounded_rect(rr);
            w.color(Color::RED);
            w.i32(-7);
        });
        let record = Records::new(&bytes).next().unwrap().unwrap();
        assert_eq!(record.op, DisplayListOpType::DrawRoundedRect);
        let mut reader = FieldReader::new(record, &objects);
        assert_eq!(reader.rounded_rect().unwrap(), rr);
        assert_eq!(reader.color().unwrap(), Color::RED);
        assert_eq!(reader.i32().unwrap(), -7);
    }

    #[test]
    fn truncated_and_corrupt_streams_are_reported() {
        let (bytes, objects) = write_one(DisplayListOpType::SetStrokeWidth, |w| w.f64(2.0));
        let record = Records::new(&bytes).next().unwrap().unwrap();
        let mut reader = FieldReader::new(record, &objects);
        reader.f64().unwrap();
        assert!(matches!(
            reader.f64(),
            Err(DisplayListError::Truncated { .. })
        ));

        let mut corrupt = bytes.clone();
        corrupt[0] = 250;
        assert!(matches!(
            Records::new(&corrupt).next(),
            Some(Err(DisplayListError::UnknownOp { tag: 250, .. }))
        ));

        let mut short = bytes;
        short.truncate(12);
        let mut records = Records::new(&short);
        assert!(matches!(
            records.next(),
            Some(Err(DisplayListError::BadRecordSize { .. }))
        ));
        assert!(records.next().is_none(), "iteration stops after an error");
    }

    #[test]
    fn missing_objects_are_reported() {
        let (bytes, _) = write_one(DisplayListOpType::DrawPath, |w| {
            w.path(Arc::new(BezPath::new()));
        });
        let empty = ObjectTables::default();
        let record = Records::new(&bytes).next().unwrap().unwrap();
        let mut reader = FieldReader::new(record, &empty);
        assert!(matches!(
            reader.path(),
            Err(DisplayListError::MissingObject { index: 0, .. })
        ));
    }
}
