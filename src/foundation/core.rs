use crate::foundation::error::{EaselError, EaselResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Process-unique handle to a scene-graph node.
///
/// Ids are assigned monotonically per scene graph and never reused;
/// operations on a destroyed id fail with [`EaselError::InvalidState`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u64);

/// Logical stage/layer dimensions in CSS-like pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
}

impl Size {
    /// Validated constructor; zero dimensions are a configuration error.
    pub fn new(width: u32, height: u32) -> EaselResult<Self> {
        if width == 0 || height == 0 {
            return Err(EaselError::configuration("size dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    /// Premultiplied byte representation, matching surface pixel layout.
    pub fn premul_bytes(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    /// Scale alpha by a normalized factor, clamped to `[0, 1]`.
    pub fn with_alpha_scaled(self, factor: f64) -> Self {
        let a = (f64::from(self.a) * factor.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

/// Local transform of a node, derived from its transform attributes.
///
/// Composition order is `T(translate) * R(rotation) * S(scale) * T(-offset)`:
/// the offset point is moved to the local origin before rotation and scale
/// apply, then the node is positioned at `translate` in parent space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocalTransform {
    /// Position in parent space.
    pub translate: Vec2,
    /// Rotation around the offset point, in radians.
    pub rotation_rad: f64,
    /// Per-axis scale, default `(1, 1)`.
    pub scale: Vec2,
    /// Pivot in local space.
    pub offset: Vec2,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
            offset: Vec2::ZERO,
        }
    }
}

impl LocalTransform {
    /// Lower to an affine matrix in parent space.
    pub fn to_affine(self) -> Affine {
        let t_translate = Affine::translate(self.translate);
        let t_rotate = Affine::rotate(self.rotation_rad);
        let t_scale = Affine::scale_non_uniform(self.scale.x, self.scale.y);
        let t_unoffset = Affine::translate(-self.offset);

        t_translate * t_rotate * t_scale * t_unoffset
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
