// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{DisplayListAttributeFlags, DisplayListOpFlags};

macro_rules! op_types {
    ($($(#[$doc:meta])* $name:ident,)*) => {
        /// The kind of a record in a display list stream.
        ///
        /// The discriminant is the tag byte stored at the start of each record.
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum DisplayListOpType {
            $($(#[$doc])* $name,)*
        }

        impl DisplayListOpType {
            /// Every op type, indexed by discriminant.
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// The variant name, for diagnostics.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

op_types! {
    /// Set the anti-alias flag.
    SetAntiAlias,
    /// Set the dither flag.
    SetDither,
    /// Set the invert-colors flag.
    SetInvertColors,
    /// Set the stroke cap.
    SetStrokeCap,
    /// Set the stroke join.
    SetStrokeJoin,
    /// Set the draw style.
    SetStyle,
    /// Set the stroke width.
    SetStrokeWidth,
    /// Set the miter limit.
    SetStrokeMiter,
    /// Set the color.
    SetColor,
    /// Set the blend mode, clearing any blender.
    SetBlendMode,
    /// Set a custom blender.
    SetBlender,
    /// Set the color source.
    SetColorSource,
    /// Clear the color source.
    ClearColorSource,
    /// Set the color filter.
    SetColorFilter,
    /// Clear the color filter.
    ClearColorFilter,
    /// Set the image filter.
    SetImageFilter,
    /// Clear the image filter.
    ClearImageFilter,
    /// Set the path effect.
    SetPathEffect,
    /// Clear the path effect.
    ClearPathEffect,
    /// Set a mask filter object.
    SetMaskFilter,
    /// Clear the mask filter.
    ClearMaskFilter,
    /// Set a blur mask from its style and sigma.
    SetMaskBlurFilter,

    /// Push transform and clip state.
    Save,
    /// Push state and an offscreen layer.
    SaveLayer,
    /// Save layer with a bounds hint.
    SaveLayerBounds,
    /// Save layer with a backdrop filter.
    SaveLayerBackdrop,
    /// Save layer with a backdrop filter and a bounds hint.
    SaveLayerBackdropBounds,
    /// Pop the most recent save.
    Restore,

    /// Translate.
    Translate,
    /// Scale.
    Scale,
    /// Rotate by degrees.
    Rotate,
    /// Skew.
    Skew,
    /// Concatenate a 2x3 affine.
    Transform2DAffine,
    /// Concatenate a 4x4 matrix.
    TransformFullPerspective,
    /// Reset to the transform the list was dispatched under.
    TransformReset,

    /// Intersect the clip with a rect.
    ClipIntersectRect,
    /// Subtract a rect from the clip.
    ClipDifferenceRect,
    /// Intersect the clip with a rounded rect.
    ClipIntersectRoundedRect,
    /// Subtract a rounded rect from the clip.
    ClipDifferenceRoundedRect,
    /// Intersect the clip with a path.
    ClipIntersectPath,
    /// Subtract a path from the clip.
    ClipDifferencePath,

    /// Fill the clip with the paint.
    DrawPaint,
    /// Fill the clip with a color.
    DrawColor,
    /// A line segment.
    DrawLine,
    /// A rectangle.
    DrawRect,
    /// An oval.
    DrawOval,
    /// A circle.
    DrawCircle,
    /// A rounded rectangle.
    DrawRoundedRect,
    /// The region between two rounded rectangles.
    DrawDoubleRoundedRect,
    /// A path.
    DrawPath,
    /// An open arc.
    DrawArc,
    /// A pie-slice arc.
    DrawArcWithCenter,
    /// Points drawn as points.
    DrawPoints,
    /// Points drawn as line segment pairs.
    DrawLines,
    /// Points drawn as a polyline.
    DrawPolygon,
    /// A triangle mesh.
    DrawVertices,
    /// An image at a point.
    DrawImage,
    /// An image at a point, using the paint.
    DrawImageWithAttr,
    /// A sub-rect of an image into a destination rect.
    DrawImageRect,
    /// A nine-patch image.
    DrawImageNine,
    /// A nine-patch image, using the paint.
    DrawImageNineWithAttr,
    /// A lattice image.
    DrawImageLattice,
    /// Sprites from an atlas image.
    DrawAtlas,
    /// Sprites from an atlas image with a cull rect.
    DrawAtlasCulled,
    /// A nested display list.
    DrawDisplayList,
    /// An external picture.
    DrawPicture,
    /// An external picture under a matrix.
    DrawPictureMatrix,
    /// A shaped text run.
    DrawTextRun,
    /// A shadow cast by an opaque occluder.
    DrawShadow,
    /// A shadow cast by a transparent occluder.
    DrawShadowTransparentOccluder,
}

impl DisplayListOpType {
    /// Decodes a tag byte.
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// Whether this record mutates attribute state rather than drawing.
    pub const fn is_attribute(self) -> bool {
        (self as u8) <= (Self::SetMaskBlurFilter as u8)
    }

    /// Whether this record draws.
    pub const fn is_draw(self) -> bool {
        (self as u8) >= (Self::DrawPaint as u8)
    }

    /// The static attribute flags of this kind of op.
    ///
    /// Ops whose flags depend on their arguments report the most general
    /// variant here: lines report diagonal caps, image draws report their
    /// paint-less flags (the `WithAttr` kinds report the paint variant), and
    /// save layers report [`DisplayListOpFlags::SAVE_LAYER`]. Non-draw ops
    /// report no flags.
    pub const fn attribute_flags(self) -> DisplayListAttributeFlags {
        match self {
            Self::SaveLayer
            | Self::SaveLayerBounds
            | Self::SaveLayerBackdrop
            | Self::SaveLayerBackdropBounds => DisplayListOpFlags::SAVE_LAYER,
            Self::DrawPaint => DisplayListOpFlags::DRAW_PAINT,
            Self::DrawColor => DisplayListOpFlags::DRAW_COLOR,
            Self::DrawLine => DisplayListOpFlags::DRAW_LINE,
            Self::DrawRect => DisplayListOpFlags::DRAW_RECT,
            Self::DrawOval => DisplayListOpFlags::DRAW_OVAL,
            Self::DrawCircle => DisplayListOpFlags::DRAW_CIRCLE,
            Self::DrawRoundedRect => DisplayListOpFlags::DRAW_ROUNDED_RECT,
            Self::DrawDoubleRoundedRect => DisplayListOpFlags::DRAW_DOUBLE_ROUNDED_RECT,
            Self::DrawPath => DisplayListOpFlags::DRAW_PATH,
            Self::DrawArc => DisplayListOpFlags::DRAW_ARC_NO_CENTER,
            Self::DrawArcWithCenter => DisplayListOpFlags::DRAW_ARC_WITH_CENTER,
            Self::DrawPoints => DisplayListOpFlags::DRAW_POINTS_AS_POINTS,
            Self::DrawLines => DisplayListOpFlags::DRAW_POINTS_AS_LINES,
            Self::DrawPolygon => DisplayListOpFlags::DRAW_POINTS_AS_POLYGON,
            Self::DrawVertices => DisplayListOpFlags::DRAW_VERTICES,
            Self::DrawImage => DisplayListOpFlags::DRAW_IMAGE,
            Self::DrawImageWithAttr => DisplayListOpFlags::DRAW_IMAGE_WITH_PAINT,
            Self::DrawImageRect => DisplayListOpFlags::DRAW_IMAGE_RECT,
            Self::DrawImageNine => DisplayListOpFlags::DRAW_IMAGE_NINE,
            Self::DrawImageNineWithAttr => DisplayListOpFlags::DRAW_IMAGE_NINE_WITH_PAINT,
            Self::DrawImageLattice => DisplayListOpFlags::DRAW_IMAGE_LATTICE,
            Self::DrawAtlas | Self::DrawAtlasCulled => DisplayListOpFlags::DRAW_ATLAS,
            Self::DrawDisplayList => DisplayListOpFlags::DRAW_DISPLAY_LIST,
            Self::DrawPicture | Self::DrawPictureMatrix => DisplayListOpFlags::DRAW_PICTURE,
            Self::DrawTextRun => DisplayListOpFlags::DRAW_TEXT_RUN,
            Self::DrawShadow | Self::DrawShadowTransparentOccluder => {
                DisplayListOpFlags::DRAW_SHADOW
            }
            _ => DisplayListAttributeFlags::empty(),
        }
    }
}
