// SPDX-License-Identifier: MIT
//! # Colorspace Model
//!
//! YUV↔RGB matrices selected by colorspace tag, color range handling and the
//! cosmetic brightness/contrast/saturation controls.
//!
//! Matrices work on a normalized signal domain: luma and RGB in `[0, 1]`,
//! chroma in `[-0.5, 0.5]`. Range (limited vs full) only matters when samples
//! are decoded from or encoded to integers, see [`SampleCoding`].

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::NotSupported;
use crate::pixfmt::Channel;

pub use crate::palette::{palette8_to_packed24, palette8_to_packed32};

/// 1.0 in the 16.16 fixed-point scale used by the cosmetic parameters.
pub const ONE: i32 = 1 << 16;

pub const BRIGHTNESS_MIN: i32 = -ONE;
pub const BRIGHTNESS_MAX: i32 = ONE;
pub const CONTRAST_MAX: i32 = 4 * ONE;
pub const SATURATION_MAX: i32 = 4 * ONE;

pub type Matrix3 = [[f64; 3]; 3];

/// Colorspace tags with stable numeric ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Colorspace {
    Bt709 = 1,
    Fcc = 4,
    /// ITU-R Rec. 624-4 System B, G (BT.601).
    #[default]
    Itu601 = 5,
    Smpte170m = 6,
    Smpte240m = 7,
    Bt2020 = 9,
}

impl Colorspace {
    pub const ALL: [Colorspace; 6] = [
        Colorspace::Bt709,
        Colorspace::Fcc,
        Colorspace::Itu601,
        Colorspace::Smpte170m,
        Colorspace::Smpte240m,
        Colorspace::Bt2020,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Result<Self, NotSupported> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| NotSupported::new("colorspace", id))
    }

    pub fn name(self) -> &'static str {
        match self {
            Colorspace::Bt709 => "bt709",
            Colorspace::Fcc => "fcc",
            Colorspace::Itu601 => "bt601",
            Colorspace::Smpte170m => "smpte170m",
            Colorspace::Smpte240m => "smpte240m",
            Colorspace::Bt2020 => "bt2020",
        }
    }

    /// Red and blue luma weights (Kr, Kb).
    pub fn luma_weights(self) -> (f64, f64) {
        match self {
            Colorspace::Bt709 => (0.2126, 0.0722),
            Colorspace::Fcc => (0.30, 0.11),
            Colorspace::Itu601 | Colorspace::Smpte170m => (0.299, 0.114),
            Colorspace::Smpte240m => (0.212, 0.087),
            Colorspace::Bt2020 => (0.2627, 0.0593),
        }
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colorspace {
    type Err = NotSupported;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u32>() {
            return Self::from_id(id);
        }
        match s.to_ascii_lowercase().as_str() {
            "bt709" | "itu709" => Ok(Colorspace::Bt709),
            "fcc" => Ok(Colorspace::Fcc),
            "bt601" | "itu601" | "itu624" | "default" => Ok(Colorspace::Itu601),
            "smpte170m" => Ok(Colorspace::Smpte170m),
            "smpte240m" => Ok(Colorspace::Smpte240m),
            "bt2020" => Ok(Colorspace::Bt2020),
            _ => Err(NotSupported::new("colorspace", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorRange {
    /// Studio swing: 16..235 luma, 16..240 chroma at 8 bits.
    #[default]
    Limited,
    /// PC swing: the whole sample range.
    Full,
}

impl FromStr for ColorRange {
    type Err = NotSupported;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "limited" | "tv" | "mpeg" => Ok(ColorRange::Limited),
            "full" | "pc" | "jpeg" => Ok(ColorRange::Full),
            _ => Err(NotSupported::new("color range", s)),
        }
    }
}

/// YUV→RGB matrix for `cs`, applied to `(y, cb, cr)`.
pub fn coefficients_for(cs: Colorspace) -> Matrix3 {
    let (kr, kb) = cs.luma_weights();
    let kg = 1.0 - kr - kb;
    let crv = 2.0 * (1.0 - kr);
    let cbu = 2.0 * (1.0 - kb);
    let cgu = 2.0 * kb * (1.0 - kb) / kg;
    let cgv = 2.0 * kr * (1.0 - kr) / kg;
    [[1.0, 0.0, crv], [1.0, -cgu, -cgv], [1.0, cbu, 0.0]]
}

/// RGB→YUV matrix for `cs`, producing `(y, cb, cr)`.
pub fn rgb_to_yuv_matrix(cs: Colorspace) -> Matrix3 {
    let (kr, kb) = cs.luma_weights();
    let kg = 1.0 - kr - kb;
    let cb = 2.0 * (1.0 - kb);
    let cr = 2.0 * (1.0 - kr);
    [
        [kr, kg, kb],
        [-kr / cb, -kg / cb, (1.0 - kb) / cb],
        [(1.0 - kr) / cr, -kg / cr, -kb / cr],
    ]
}

/// `{crv, cbu, cgu, cgv}` in 16.16 fixed point, scaled for limited-range input.
pub fn fixed_point_coefficients(cs: Colorspace) -> [i32; 4] {
    let m = coefficients_for(cs);
    let scale = 255.0 / 224.0 * ONE as f64;
    [
        (m[0][2] * scale).round() as i32,
        (m[2][1] * scale).round() as i32,
        (-m[1][1] * scale).round() as i32,
        (-m[1][2] * scale).round() as i32,
    ]
}

/// Colorspace details bound to a conversion context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorspaceParams {
    /// Matrix used to decode YUV input.
    pub src_colorspace: Colorspace,
    pub src_range: ColorRange,
    /// Matrix used to encode YUV output.
    pub dst_colorspace: Colorspace,
    pub dst_range: ColorRange,
    /// 16.16, `[-1.0, 1.0]` of full scale.
    pub brightness: i32,
    /// 16.16, `[0.0, 4.0]`.
    pub contrast: i32,
    /// 16.16, `[0.0, 4.0]`.
    pub saturation: i32,
}

impl Default for ColorspaceParams {
    fn default() -> Self {
        Self {
            src_colorspace: Colorspace::default(),
            src_range: ColorRange::Limited,
            dst_colorspace: Colorspace::default(),
            dst_range: ColorRange::Limited,
            brightness: 0,
            contrast: ONE,
            saturation: ONE,
        }
    }
}

impl ColorspaceParams {
    /// Build params; cosmetic values outside their ranges are clamped.
    pub fn new(
        src_range: ColorRange,
        dst_range: ColorRange,
        brightness: i32,
        contrast: i32,
        saturation: i32,
    ) -> Self {
        Self {
            src_range,
            dst_range,
            brightness,
            contrast,
            saturation,
            ..Self::default()
        }
        .clamped()
    }

    pub fn with_colorspaces(mut self, src: Colorspace, dst: Colorspace) -> Self {
        self.src_colorspace = src;
        self.dst_colorspace = dst;
        self
    }

    pub fn with_ranges(mut self, src: ColorRange, dst: ColorRange) -> Self {
        self.src_range = src;
        self.dst_range = dst;
        self
    }

    pub fn clamped(self) -> Self {
        let out = Self {
            brightness: self.brightness.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX),
            contrast: self.contrast.clamp(0, CONTRAST_MAX),
            saturation: self.saturation.clamp(0, SATURATION_MAX),
            ..self
        };
        if out != self {
            warn!(
                brightness = self.brightness,
                contrast = self.contrast,
                saturation = self.saturation,
                "clamped colorspace parameters"
            );
        }
        out
    }

    pub fn brightness_f32(&self) -> f32 {
        self.brightness as f32 / ONE as f32
    }

    pub fn contrast_f32(&self) -> f32 {
        self.contrast as f32 / ONE as f32
    }

    pub fn saturation_f32(&self) -> f32 {
        self.saturation as f32 / ONE as f32
    }
}

/// Same range on both sides, default matrices.
pub fn build_params(range: ColorRange, brightness: i32, contrast: i32, saturation: i32) -> ColorspaceParams {
    ColorspaceParams::new(range, range, brightness, contrast, saturation)
}

/// Linear map between integer samples and the signal domain:
/// `raw = offset + value * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleCoding {
    pub offset: f32,
    pub scale: f32,
    pub max: f32,
}

impl SampleCoding {
    pub fn new(channel: Channel, depth: u8, range: ColorRange) -> Self {
        let max = ((1u32 << depth) - 1) as f32;
        let k = (1u32 << depth) as f32 / 256.0;
        let (offset, scale) = match (channel, range) {
            (Channel::Y, ColorRange::Limited) => (16.0 * k, 219.0 * k),
            (Channel::U | Channel::V, ColorRange::Limited) => (128.0 * k, 224.0 * k),
            (Channel::U | Channel::V, ColorRange::Full) => ((1u32 << (depth - 1)) as f32, max),
            _ => (0.0, max),
        };
        Self { offset, scale, max }
    }

    #[inline]
    pub fn decode(&self, raw: u32) -> f32 {
        (raw as f32 - self.offset) / self.scale
    }

    /// Round half to even and clamp to the representable range.
    #[inline]
    pub fn encode(&self, value: f32) -> u32 {
        let raw = (self.offset + value * self.scale).round_ties_even();
        raw.clamp(0.0, self.max) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point_table_bt601() {
        let c = fixed_point_coefficients(Colorspace::Itu601);
        let expected = [104597, 132201, 25675, 53279];
        for (got, want) in c.iter().zip(expected) {
            assert!((got - want).abs() <= 1, "{:?} vs {:?}", c, expected);
        }
    }

    #[test]
    fn test_matrices_are_inverse() {
        for cs in Colorspace::ALL {
            let a = coefficients_for(cs);
            let b = rgb_to_yuv_matrix(cs);
            for i in 0..3 {
                for j in 0..3 {
                    let v: f64 = (0..3).map(|k| a[i][k] * b[k][j]).sum();
                    let id = if i == j { 1.0 } else { 0.0 };
                    assert!((v - id).abs() < 1e-9, "{} [{}][{}] = {}", cs, i, j, v);
                }
            }
        }
    }

    #[test]
    fn test_colorspace_ids() {
        assert_eq!(Colorspace::from_id(5).unwrap(), Colorspace::Itu601);
        assert_eq!(Colorspace::from_id(1).unwrap(), Colorspace::Bt709);
        assert!(Colorspace::from_id(8).is_err());
        assert_eq!("bt2020".parse::<Colorspace>().unwrap(), Colorspace::Bt2020);
    }

    #[test]
    fn test_params_are_clamped() {
        let p = build_params(ColorRange::Full, 5 * ONE, -3, 10 * ONE);
        assert_eq!(p.brightness, BRIGHTNESS_MAX);
        assert_eq!(p.contrast, 0);
        assert_eq!(p.saturation, SATURATION_MAX);
        assert_eq!(p.src_range, ColorRange::Full);
        assert_eq!(p.dst_range, ColorRange::Full);

        let ok = build_params(ColorRange::Limited, ONE / 4, ONE, 2 * ONE);
        assert_eq!(ok.brightness, ONE / 4);
        assert_eq!(ok.saturation, 2 * ONE);
    }

    #[test]
    fn test_sample_coding_limited_luma() {
        let c = SampleCoding::new(Channel::Y, 8, ColorRange::Limited);
        assert_eq!(c.encode(0.0), 16);
        assert_eq!(c.encode(1.0), 235);
        assert_eq!(c.encode(-1.0), 0);
        assert_eq!(c.encode(2.0), 255);
        for raw in 0..=255 {
            assert_eq!(c.encode(c.decode(raw)), raw);
        }
    }

    #[test]
    fn test_sample_coding_neutral_chroma() {
        for depth in [8u8, 10, 16] {
            for range in [ColorRange::Limited, ColorRange::Full] {
                let c = SampleCoding::new(Channel::U, depth, range);
                assert_eq!(c.encode(0.0), 1 << (depth - 1));
            }
        }
    }

    #[test]
    fn test_round_half_to_even() {
        let c = SampleCoding {
            offset: 0.0,
            scale: 1.0,
            max: 255.0,
        };
        assert_eq!(c.encode(2.5), 2);
        assert_eq!(c.encode(3.5), 4);
        assert_eq!(c.encode(-0.5), 0);
    }
}
