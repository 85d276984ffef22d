//! Logical length units

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Density-independent length
///
/// Configuration is expressed in `Dp`; the layout pass supplies a density
/// (pixels per dp) and every value is converted with [`Dp::to_px`] right
/// before use.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dp(pub f32);

impl Dp {
    pub const ZERO: Dp = Dp(0.0);

    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Raw logical value
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to device pixels
    pub fn to_px(self, density: f32) -> f32 {
        self.0 * density
    }
}

impl From<f32> for Dp {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl Add for Dp {
    type Output = Dp;

    fn add(self, rhs: Dp) -> Dp {
        Dp(self.0 + rhs.0)
    }
}

impl Sub for Dp {
    type Output = Dp;

    fn sub(self, rhs: Dp) -> Dp {
        Dp(self.0 - rhs.0)
    }
}

impl Mul<f32> for Dp {
    type Output = Dp;

    fn mul(self, rhs: f32) -> Dp {
        Dp(self.0 * rhs)
    }
}

impl Neg for Dp {
    type Output = Dp;

    fn neg(self) -> Dp {
        Dp(-self.0)
    }
}
