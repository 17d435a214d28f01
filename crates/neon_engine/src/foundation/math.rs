//! Math utilities and types
//!
//! Provides the small set of math types the scene effects need.

use serde::{Deserialize, Serialize};

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// World axis along which an object can be driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Return `v` with the component along this axis replaced by `value`
    pub fn with_component(self, mut v: Vec3, value: f32) -> Vec3 {
        match self {
            Self::X => v.x = value,
            Self::Y => v.y = value,
            Self::Z => v.z = value,
        }
        v
    }
}

/// Linear RGB color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| f32::from(((hex >> shift) & 0xff) as u8) / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_with_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::Y.with_component(v, 0.0), Vec3::new(1.0, 0.0, 3.0));

        let moved = Axis::Z.with_component(v, -40.0);
        assert_eq!(moved, Vec3::new(1.0, 2.0, -40.0));
    }

    #[test]
    fn test_color_hex() {
        let neon_green = Color::from_hex(0x33ff00);
        assert!((neon_green.r - 0.2).abs() < 1e-6);
        assert_eq!(neon_green.g, 1.0);
        assert_eq!(neon_green.b, 0.0);
    }
}
