use glam::{Vec3, Vec4};

/// Packed 8-bit RGBA color.
///
/// Layout (little-endian `u32`):
/// - bits 0..8: red
/// - bits 8..16: green
/// - bits 16..24: blue
/// - bits 24..32: alpha
///
/// This matches `wgpu::VertexFormat::Unorm8x4`, so the packed value is uploaded as-is.
/// Alpha is straight (not premultiplied); shaders premultiply before blending.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Color4u(pub u32);

const R_SHIFT: u32 = 0;
const G_SHIFT: u32 = 8;
const B_SHIFT: u32 = 16;
const A_SHIFT: u32 = 24;

const RGB_MASK: u32 = 0x00ff_ffff;

impl Color4u {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const LIME: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);
    pub const MAROON: Self = Self::rgb(128, 0, 0);
    pub const OLIVE: Self = Self::rgb(128, 128, 0);
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    pub const PURPLE: Self = Self::rgb(128, 0, 128);
    pub const TEAL: Self = Self::rgb(0, 128, 128);
    pub const NAVY: Self = Self::rgb(0, 0, 128);
    pub const ORANGE: Self = Self::rgb(255, 165, 0);
    pub const PINK: Self = Self::rgb(255, 192, 203);
    pub const BROWN: Self = Self::rgb(165, 42, 42);
    pub const SILVER: Self = Self::rgb(192, 192, 192);
    pub const GOLD: Self = Self::rgb(255, 215, 0);
    pub const TURQUOISE: Self = Self::rgb(64, 224, 208);

    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(
            ((a as u32) << A_SHIFT)
                | ((b as u32) << B_SHIFT)
                | ((g as u32) << G_SHIFT)
                | ((r as u32) << R_SHIFT),
        )
    }

    /// Opaque color from 8-bit channels.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    /// Creates a color from float channels in `[0, 1]` (clamped, truncated to 8 bits).
    #[inline]
    pub fn from_vec4(c: Vec4) -> Self {
        let c = c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
        Self::from_rgba8(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }

    /// Opaque color from float RGB in `[0, 1]`.
    #[inline]
    pub fn from_vec3(c: Vec3) -> Self {
        Self::from_vec4(c.extend(1.0))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> R_SHIFT) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> G_SHIFT) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> B_SHIFT) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> A_SHIFT) as u8
    }

    /// Returns the same RGB with the alpha byte replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & RGB_MASK) | ((a as u32) << A_SHIFT))
    }

    /// Float channels in `[0, 1]`.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r() as f32,
            self.g() as f32,
            self.b() as f32,
            self.a() as f32,
        ) / 255.0
    }

    /// Clear color for a render pass (straight alpha, linear values as stored).
    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        let c = self.to_vec4();
        wgpu::Color {
            r: c.x as f64,
            g: c.y as f64,
            b: c.z as f64,
            a: c.w as f64,
        }
    }
}

impl From<u32> for Color4u {
    #[inline]
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<Color4u> for u32 {
    #[inline]
    fn from(c: Color4u) -> Self {
        c.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_pack_red_in_low_byte() {
        let c = Color4u::from_rgba8(1, 2, 3, 4);
        assert_eq!(c.0, 0x0403_0201);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (1, 2, 3, 4));
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Color4u::ORANGE.with_alpha(7);
        assert_eq!(c.a(), 7);
        assert_eq!(c.0 & RGB_MASK, Color4u::ORANGE.0 & RGB_MASK);
    }

    #[test]
    fn from_vec4_clamps() {
        let c = Color4u::from_vec4(Vec4::new(2.0, -1.0, 1.0, 1.0));
        assert_eq!(c, Color4u::MAGENTA);
    }
}
