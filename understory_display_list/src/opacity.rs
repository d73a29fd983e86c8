// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Group opacity tracking for one save frame.

/// Whether the content recorded in a frame can take an inherited opacity.
///
/// A single opacity multiplier can be folded into the alpha of one draw.
/// Once a second contribution arrives, or any contribution that cannot be
/// modulated, the frame stays incompatible until it is popped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum GroupOpacity {
    /// Nothing drawn yet.
    #[default]
    Empty,
    /// Exactly one compatible contribution.
    SingleCompatibleOp,
    /// Opacity can no longer be distributed.
    Incompatible,
}

impl GroupOpacity {
    /// Records one compatible draw or child group.
    pub(crate) fn add_compatible_op(&mut self) {
        *self = match self {
            Self::Empty => Self::SingleCompatibleOp,
            Self::SingleCompatibleOp | Self::Incompatible => Self::Incompatible,
        };
    }

    /// Records a contribution that cannot take an inherited opacity.
    pub(crate) fn mark_incompatible(&mut self) {
        *self = Self::Incompatible;
    }

    /// Records `compatible` as either kind of contribution.
    pub(crate) fn update(&mut self, compatible: bool) {
        if compatible {
            self.add_compatible_op();
        } else {
            self.mark_incompatible();
        }
    }

    pub(crate) fn cannot_inherit_opacity(self) -> bool {
        self == Self::Incompatible
    }

    pub(crate) fn has_compatible_op(self) -> bool {
        self == Self::SingleCompatibleOp
    }

    /// Folds a popped child frame into this one.
    ///
    /// A child layer composites as a single contribution; a plain save has
    /// no offscreen of its own, so only a poisoned or non-empty child
    /// changes the parent.
    pub(crate) fn absorb_child(&mut self, child: Self, is_layer: bool, layer_compatible: bool) {
        if child.cannot_inherit_opacity() {
            self.mark_incompatible();
        } else if is_layer {
            self.update(layer_compatible);
        } else if child.has_compatible_op() {
            self.add_compatible_op();
        }
    }
}
