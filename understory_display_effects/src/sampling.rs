// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiling and sampling options shared by image sources and filters.

use peniko::{Extend, ImageQuality};

/// How a source is extended outside its natural bounds.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileMode {
    /// Repeat the edge pixels.
    #[default]
    Clamp = 0,
    /// Repeat the source.
    Repeat,
    /// Repeat the source, mirroring every other copy.
    Mirror,
    /// Transparent black outside the source.
    Decal,
}

impl TileMode {
    /// Decodes a tile mode from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Clamp),
            1 => Some(Self::Repeat),
            2 => Some(Self::Mirror),
            3 => Some(Self::Decal),
            _ => None,
        }
    }

    /// Converts to a `peniko` extend mode. `Decal` has no equivalent.
    pub const fn to_extend(self) -> Option<Extend> {
        match self {
            Self::Clamp => Some(Extend::Pad),
            Self::Repeat => Some(Extend::Repeat),
            Self::Mirror => Some(Extend::Reflect),
            Self::Decal => None,
        }
    }
}

/// Sampling quality used when drawing or filtering images.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageSampling {
    /// Nearest texel.
    #[default]
    NearestNeighbor = 0,
    /// Bilinear.
    Linear,
    /// Bilinear with linear mipmap interpolation.
    MipmapLinear,
    /// Bicubic.
    Cubic,
}

impl ImageSampling {
    /// Decodes a sampling mode from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NearestNeighbor),
            1 => Some(Self::Linear),
            2 => Some(Self::MipmapLinear),
            3 => Some(Self::Cubic),
            _ => None,
        }
    }

    /// The closest `peniko` quality hint.
    pub const fn to_quality(self) -> ImageQuality {
        match self {
            Self::NearestNeighbor => ImageQuality::Low,
            Self::Linear | Self::MipmapLinear => ImageQuality::Medium,
            Self::Cubic => ImageQuality::High,
        }
    }
}

/// Filtering used by nine-patch and lattice image draws.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    #[default]
    Nearest = 0,
    /// Bilinear.
    Linear,
}

impl FilterMode {
    /// Decodes a filter mode from its discriminant.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Nearest),
            1 => Some(Self::Linear),
            _ => None,
        }
    }
}

impl From<FilterMode> for ImageSampling {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => Self::NearestNeighbor,
            FilterMode::Linear => Self::Linear,
        }
    }
}
