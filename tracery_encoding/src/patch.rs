// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Vec2;
use peniko::Color;

use crate::{Attribute, Transform};

/// How the current transform is reset before a patch is composed onto it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetMode {
    /// Pop the top of the transform stack into the current transform.
    Pop,
    /// Copy the top of the transform stack without popping it.
    Last,
    /// Reset to the identity transform and the default point attributes.
    Identity,
}

/// A relative change to the builder's drawing state.
///
/// The transform part is composed onto the current transform; any attribute
/// carried by the patch overwrites the corresponding current attribute.
#[derive(Clone, Debug)]
pub struct TransformPatch {
    pub transform: Transform,
    pub reset: Option<ResetMode>,
    /// Push a copy of the resulting transform onto the stack.
    pub push: bool,
    pub strength: Option<Attribute<f32>>,
    pub thickness: Option<Attribute<f32>>,
    pub color: Option<Attribute<Color>>,
    pub alpha: Option<Attribute<f32>>,
}

impl Default for TransformPatch {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPatch {
    pub const fn new() -> Self {
        Self {
            transform: Transform::IDENTITY,
            reset: None,
            push: false,
            strength: None,
            thickness: None,
            color: None,
            alpha: None,
        }
    }

    #[must_use]
    pub fn translate(mut self, x: f64, y: f64) -> Self {
        self.transform.translate = Vec2::new(x, y);
        self
    }

    /// Uniform scale.
    #[must_use]
    pub fn scale(self, s: f64) -> Self {
        self.scale_xy(s, s)
    }

    #[must_use]
    pub fn scale_xy(mut self, x: f64, y: f64) -> Self {
        self.transform.scale = Vec2::new(x, y);
        self
    }

    /// Rotation in radians.
    #[must_use]
    pub fn rotate(mut self, radians: f64) -> Self {
        self.transform.rotate = radians;
        self
    }

    #[must_use]
    pub fn reset(mut self, mode: ResetMode) -> Self {
        self.reset = Some(mode);
        self
    }

    #[must_use]
    pub fn push(mut self) -> Self {
        self.push = true;
        self
    }

    #[must_use]
    pub fn strength(self, strength: f32) -> Self {
        self.strength_with(Attribute::Fixed(strength))
    }

    #[must_use]
    pub fn strength_with(mut self, strength: Attribute<f32>) -> Self {
        self.strength = Some(strength);
        self
    }

    #[must_use]
    pub fn thickness(self, thickness: f32) -> Self {
        self.thickness_with(Attribute::Fixed(thickness))
    }

    #[must_use]
    pub fn thickness_with(mut self, thickness: Attribute<f32>) -> Self {
        self.thickness = Some(thickness);
        self
    }

    #[must_use]
    pub fn color(self, color: Color) -> Self {
        self.color_with(Attribute::Fixed(color))
    }

    #[must_use]
    pub fn color_with(mut self, color: Attribute<Color>) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn alpha(self, alpha: f32) -> Self {
        self.alpha_with(Attribute::Fixed(alpha))
    }

    #[must_use]
    pub fn alpha_with(mut self, alpha: Attribute<f32>) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn has_attributes(&self) -> bool {
        self.strength.is_some()
            || self.thickness.is_some()
            || self.color.is_some()
            || self.alpha.is_some()
    }
}

impl From<Transform> for TransformPatch {
    fn from(transform: Transform) -> Self {
        Self {
            transform,
            ..Self::new()
        }
    }
}
