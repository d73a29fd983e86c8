// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Problems found in a display list stream or in the values used to build
/// records.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayListError {
    /// A record header carried a tag that is not a known op type.
    #[error("unknown op tag {tag} at offset {offset}")]
    UnknownOp {
        /// The tag byte.
        tag: u8,
        /// Byte offset of the record.
        offset: usize,
    },
    /// A record header carried a size that is too small, misaligned, or runs
    /// past the end of the stream.
    #[error("record at offset {offset} has invalid size {size}")]
    BadRecordSize {
        /// Byte offset of the record.
        offset: usize,
        /// The size from the header.
        size: usize,
    },
    /// A record's payload ended before all of its fields were read.
    #[error("{op} record at offset {offset} is truncated")]
    Truncated {
        /// The op type name.
        op: &'static str,
        /// Byte offset of the record.
        offset: usize,
    },
    /// A record referred to a shared object that is not in the list.
    #[error("{op} record at offset {offset} refers to missing object {index}")]
    MissingObject {
        /// The op type name.
        op: &'static str,
        /// Byte offset of the record.
        offset: usize,
        /// The handle stored in the record.
        index: u32,
    },
    /// A record held an out-of-range enum value.
    #[error("{op} record at offset {offset} holds invalid value {value}")]
    InvalidValue {
        /// The op type name.
        op: &'static str,
        /// Byte offset of the record.
        offset: usize,
        /// The raw value.
        value: u8,
    },
    /// A restore record had no matching save.
    #[error("restore at offset {offset} has no matching save")]
    UnbalancedRestore {
        /// Byte offset of the record.
        offset: usize,
    },
    /// A vertex attribute list did not have one entry per position.
    #[error("vertex attribute has {attribute} entries for {positions} positions")]
    VertexAttributeCount {
        /// Number of positions.
        positions: usize,
        /// Number of attribute entries.
        attribute: usize,
    },
    /// A vertex index pointed past the end of the position list.
    #[error("vertex index {index} out of range for {positions} positions")]
    VertexIndexOutOfRange {
        /// The offending index.
        index: u16,
        /// Number of positions.
        positions: usize,
    },
}
