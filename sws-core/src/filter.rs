// SPDX-License-Identifier: MIT
//! # Filter Kernels
//!
//! One-dimensional resampling filters for the separable scaler. A
//! [`FilterVector`] holds, for every output sample, the index of the first
//! source sample it reads and a fixed number of coefficients.
//!
//! ## Generation rules
//!
//! - Output sample `i` is centered on source coordinate `(i + 0.5) * s - 0.5`
//!   where `s = src_len / dst_len`.
//! - When downscaling, the kernel support is stretched by `s` so every source
//!   sample contributes (anti-aliasing). `FastBilinear` and `Point` skip this.
//! - Taps that fall outside the source are folded onto the nearest edge sample
//!   (replicate edge). Nothing wraps and nothing is zero padded.
//! - Coefficients of every output position sum to 1.
//! - Equal lengths without a source pre-filter produce the identity filter:
//!   one tap, coefficient 1.
//!
//! Without accurate rounding the coefficients are quantized to 14-bit fixed
//! point; the quantization error is folded into the largest tap so the sum
//! stays exactly 1.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Flag bit requesting full-precision coefficients.
pub const ACCURATE_RND: u32 = 0x40000;

const FILTER_MASK: u32 = 0x7ff;
const FIXED_ONE: f64 = (1 << 14) as f64;

/// Resize filter selection. Discriminants are the classic flag bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterType {
    FastBilinear = 0x1,
    Bilinear = 0x2,
    Bicubic = 0x4,
    /// Experimental raised-cosine kernel.
    X = 0x8,
    Point = 0x10,
    Area = 0x20,
    /// Bicubic for luma, bilinear for chroma.
    Bicublin = 0x40,
    Gauss = 0x80,
    Sinc = 0x100,
    Lanczos = 0x200,
    Spline = 0x400,
}

impl FilterType {
    pub const ALL: [FilterType; 11] = [
        FilterType::FastBilinear,
        FilterType::Bilinear,
        FilterType::Bicubic,
        FilterType::X,
        FilterType::Point,
        FilterType::Area,
        FilterType::Bicublin,
        FilterType::Gauss,
        FilterType::Sinc,
        FilterType::Lanczos,
        FilterType::Spline,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|f| f.id() == id)
            .ok_or(ConfigError::UnsupportedFilter(id))
    }

    /// Pick the filter out of a flag word. Exactly one filter bit must be set.
    pub fn from_flags(flags: u32) -> Result<Self, ConfigError> {
        let bits = flags & FILTER_MASK;
        if bits.count_ones() != 1 {
            return Err(ConfigError::UnsupportedFilter(flags));
        }
        Self::from_id(bits)
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterType::FastBilinear => "fast-bilinear",
            FilterType::Bilinear => "bilinear",
            FilterType::Bicubic => "bicubic",
            FilterType::X => "x",
            FilterType::Point => "point",
            FilterType::Area => "area",
            FilterType::Bicublin => "bicublin",
            FilterType::Gauss => "gauss",
            FilterType::Sinc => "sinc",
            FilterType::Lanczos => "lanczos",
            FilterType::Spline => "spline",
        }
    }

    /// Kernel radius in source samples at scale 1.
    fn support(self, params: &KernelParams) -> f64 {
        match self {
            FilterType::FastBilinear | FilterType::Bilinear | FilterType::X | FilterType::Area => 1.0,
            FilterType::Point => 0.5,
            FilterType::Bicubic | FilterType::Bicublin => 2.0,
            FilterType::Gauss => 4.0,
            FilterType::Sinc => 10.0,
            FilterType::Lanczos => params.param[0].unwrap_or(3.0).max(1.0),
            FilterType::Spline => 3.0,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("0x") {
            let id = u32::from_str_radix(hex, 16).map_err(|_| ConfigError::UnsupportedFilter(0))?;
            return Self::from_id(id);
        }
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or(ConfigError::UnsupportedFilter(0))
    }
}

/// Tunable kernel parameters; `None` selects the kernel's default.
///
/// | Filter  | `param[0]`          | `param[1]`   |
/// |---------|---------------------|--------------|
/// | Bicubic | B (0.0)             | C (0.6)      |
/// | Gauss   | exponent (3.0)      |              |
/// | Lanczos | lobes (3.0)         |              |
/// | X       | exponent (1.0)      |              |
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KernelParams {
    pub param: [Option<f64>; 2],
}

impl KernelParams {
    pub fn new(p0: Option<f64>, p1: Option<f64>) -> Self {
        Self { param: [p0, p1] }
    }
}

/// Per-output tap sets for one axis.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterVector {
    src_len: usize,
    dst_len: usize,
    filter_size: usize,
    positions: Vec<usize>,
    coeffs: Vec<f32>,
}

impl FilterVector {
    pub fn identity(len: usize) -> Self {
        Self {
            src_len: len,
            dst_len: len,
            filter_size: 1,
            positions: (0..len).collect(),
            coeffs: vec![1.0; len],
        }
    }

    pub fn src_len(&self) -> usize {
        self.src_len
    }

    pub fn dst_len(&self) -> usize {
        self.dst_len
    }

    /// Taps per output position.
    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn is_identity(&self) -> bool {
        self.filter_size == 1
            && self.src_len == self.dst_len
            && self.positions.iter().enumerate().all(|(i, &p)| i == p)
            && self.coeffs.iter().all(|&c| c == 1.0)
    }

    /// First source index and coefficients for output position `i`.
    #[inline]
    pub fn taps(&self, i: usize) -> (usize, &[f32]) {
        let at = i * self.filter_size;
        (self.positions[i], &self.coeffs[at..at + self.filter_size])
    }

    pub fn coefficient_sum(&self, i: usize) -> f64 {
        self.taps(i).1.iter().map(|&c| c as f64).sum()
    }
}

/// Filter selection plus per-class kernel parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterKernel {
    pub filter: FilterType,
    pub luma: KernelParams,
    pub chroma: KernelParams,
    pub accurate_rnd: bool,
}

impl FilterKernel {
    pub fn new(filter: FilterType) -> Self {
        Self {
            filter,
            luma: KernelParams::default(),
            chroma: KernelParams::default(),
            accurate_rnd: false,
        }
    }

    pub fn with_accurate_rnd(mut self, accurate_rnd: bool) -> Self {
        self.accurate_rnd = accurate_rnd;
        self
    }

    /// Build the filter taking `src_len` samples to `dst_len` samples.
    /// `chroma` selects chroma parameters (and bilinear for `Bicublin`).
    pub fn generate(
        &self,
        src_len: usize,
        dst_len: usize,
        pre: Option<&Vector>,
        chroma: bool,
    ) -> FilterVector {
        let src_len = src_len.max(1);
        let dst_len = dst_len.max(1);
        let pre = pre.filter(|v| !v.is_identity());
        if src_len == dst_len && pre.is_none() {
            return FilterVector::identity(src_len);
        }

        let kind = match self.filter {
            FilterType::Bicublin if chroma => FilterType::Bilinear,
            FilterType::Bicublin => FilterType::Bicubic,
            f => f,
        };
        let params = if chroma { &self.chroma } else { &self.luma };
        let scale = src_len as f64 / dst_len as f64;

        let raw: Vec<(f64, isize, Vec<f64>)> = (0..dst_len)
            .map(|i| {
                let center = (i as f64 + 0.5) * scale - 0.5;
                let (first, weights) = kernel_taps(kind, params, center, scale);
                let (first, weights) = match pre {
                    Some(v) => convolve(first, &weights, v),
                    None => (first, weights),
                };
                (center, first, weights)
            })
            .collect();

        let last = src_len as isize - 1;
        let span = |first: isize, len: usize| {
            let lo = first.clamp(0, last);
            let hi = (first + len as isize - 1).clamp(0, last);
            (hi - lo + 1) as usize
        };
        let filter_size = raw
            .iter()
            .map(|(_, first, w)| span(*first, w.len()))
            .max()
            .unwrap_or(1)
            .max(1);

        let mut positions = Vec::with_capacity(dst_len);
        let mut coeffs = Vec::with_capacity(dst_len * filter_size);
        let mut window = vec![0f64; filter_size];
        for (center, first, weights) in raw {
            let lo = first.clamp(0, last) as usize;
            let start = lo.min(src_len - filter_size);
            window.iter_mut().for_each(|c| *c = 0.0);
            for (k, &w) in weights.iter().enumerate() {
                let p = (first + k as isize).clamp(0, last) as usize;
                window[p - start] += w;
            }

            let sum: f64 = window.iter().sum();
            if sum.abs() < 1e-12 {
                window.iter_mut().for_each(|c| *c = 0.0);
                window[nearest_tap(center, start, filter_size)] = 1.0;
            } else {
                window.iter_mut().for_each(|c| *c /= sum);
            }
            if !self.accurate_rnd {
                quantize(&mut window);
            }

            positions.push(start);
            coeffs.extend(window.iter().map(|&c| c as f32));
        }

        FilterVector {
            src_len,
            dst_len,
            filter_size,
            positions,
            coeffs,
        }
    }
}

/// Window index of the source sample closest to `center`, kept inside the window.
fn nearest_tap(center: f64, start: usize, filter_size: usize) -> usize {
    let nearest = center.round().max(0.0) as usize;
    nearest.clamp(start, start + filter_size - 1) - start
}

/// Raw taps around `center` before edge handling: first source index and weights.
fn kernel_taps(kind: FilterType, params: &KernelParams, center: f64, scale: f64) -> (isize, Vec<f64>) {
    match kind {
        FilterType::Point => ((center + 0.5).floor() as isize, vec![1.0]),
        FilterType::Area => {
            let half = scale.max(1.0) / 2.0;
            let (lo, hi) = (center - half, center + half);
            let first = lo.floor() as isize;
            let weights = (first..=hi.ceil() as isize)
                .map(|p| {
                    let p = p as f64;
                    ((p + 0.5).min(hi) - (p - 0.5).max(lo)).max(0.0)
                })
                .collect();
            trim(first, weights)
        }
        _ => {
            let fs = if kind == FilterType::FastBilinear {
                1.0
            } else {
                scale.max(1.0)
            };
            let radius = kind.support(params) * fs;
            let first = (center - radius).floor() as isize;
            let weights = (first..=(center + radius).ceil() as isize)
                .map(|p| kernel(kind, params, (p as f64 - center) / fs))
                .collect();
            trim(first, weights)
        }
    }
}

fn trim(mut first: isize, mut weights: Vec<f64>) -> (isize, Vec<f64>) {
    while weights.len() > 1 && weights.last() == Some(&0.0) {
        weights.pop();
    }
    let lead = weights
        .iter()
        .take(weights.len().saturating_sub(1))
        .take_while(|&&w| w == 0.0)
        .count();
    weights.drain(..lead);
    first += lead as isize;
    (first, weights)
}

fn convolve(first: isize, weights: &[f64], pre: &Vector) -> (isize, Vec<f64>) {
    let taps = Vector::new(weights.to_vec()).conv(pre);
    (first - (pre.len() as isize - 1) / 2, taps.coeffs)
}

fn kernel(kind: FilterType, params: &KernelParams, x: f64) -> f64 {
    let d = x.abs();
    match kind {
        FilterType::FastBilinear | FilterType::Bilinear | FilterType::Area => (1.0 - d).max(0.0),
        FilterType::Point => {
            if d < 0.5 {
                1.0
            } else {
                0.0
            }
        }
        FilterType::Bicubic | FilterType::Bicublin => {
            let b = params.param[0].unwrap_or(0.0);
            let c = params.param[1].unwrap_or(0.6);
            mitchell(d, b, c)
        }
        FilterType::X => {
            if d >= 1.0 {
                return 0.0;
            }
            let a = params.param[0].unwrap_or(1.0);
            let c = (d * PI).cos();
            let c = if c < 0.0 { -(-c).powf(a) } else { c.powf(a) };
            c * 0.5 + 0.5
        }
        FilterType::Gauss => {
            let p = params.param[0].unwrap_or(3.0);
            (-p * d * d).exp2()
        }
        FilterType::Sinc => sinc(d),
        FilterType::Lanczos => {
            let a = params.param[0].unwrap_or(3.0).max(1.0);
            if d < a {
                sinc(d) * sinc(d / a)
            } else {
                0.0
            }
        }
        FilterType::Spline => spline36(d),
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (x * PI).sin() / (x * PI)
    }
}

fn mitchell(d: f64, b: f64, c: f64) -> f64 {
    if d < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * d * d * d + (-18.0 + 12.0 * b + 6.0 * c) * d * d + (6.0 - 2.0 * b))
            / 6.0
    } else if d < 2.0 {
        ((-b - 6.0 * c) * d * d * d + (6.0 * b + 30.0 * c) * d * d + (-12.0 * b - 48.0 * c) * d
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

fn spline36(d: f64) -> f64 {
    if d < 1.0 {
        ((13.0 / 11.0 * d - 453.0 / 209.0) * d - 3.0 / 209.0) * d + 1.0
    } else if d < 2.0 {
        let t = d - 1.0;
        ((-6.0 / 11.0 * t + 270.0 / 209.0) * t - 156.0 / 209.0) * t
    } else if d < 3.0 {
        let t = d - 2.0;
        ((1.0 / 11.0 * t - 45.0 / 209.0) * t + 26.0 / 209.0) * t
    } else {
        0.0
    }
}

fn quantize(window: &mut [f64]) {
    let mut q: Vec<i64> = window.iter().map(|&c| (c * FIXED_ONE).round() as i64).collect();
    let err = FIXED_ONE as i64 - q.iter().sum::<i64>();
    if let Some(big) = (0..q.len()).max_by_key(|&k| q[k].abs()) {
        q[big] += err;
    }
    for (c, q) in window.iter_mut().zip(q) {
        *c = q as f64 / FIXED_ONE;
    }
}

/// Free-standing coefficient vector used for source pre-filters.
#[derive(Clone, Debug, PartialEq)]
pub struct Vector {
    coeffs: Vec<f64>,
}

impl Vector {
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    pub fn identity() -> Self {
        Self { coeffs: vec![1.0] }
    }

    /// Normalized gaussian with the given variance; `quality` controls its length.
    pub fn gaussian(variance: f64, quality: f64) -> Self {
        if variance <= 0.0 {
            return Self::identity();
        }
        let length = ((variance * quality + 0.5) as usize) | 1;
        let middle = (length - 1) as f64 * 0.5;
        let coeffs = (0..length)
            .map(|i| {
                let dist = i as f64 - middle;
                (-dist * dist / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt()
            })
            .collect();
        let mut v = Self { coeffs };
        v.normalize(1.0);
        v
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.coeffs == [1.0]
    }

    pub fn scale(&mut self, factor: f64) {
        self.coeffs.iter_mut().for_each(|c| *c *= factor);
    }

    /// Scale so the coefficients sum to `height`. A zero-sum vector is left alone.
    pub fn normalize(&mut self, height: f64) {
        let sum: f64 = self.coeffs.iter().sum();
        if sum != 0.0 {
            self.scale(height / sum);
        }
    }

    pub fn conv(&self, other: &Vector) -> Vector {
        if self.is_empty() || other.is_empty() {
            return Vector::new(Vec::new());
        }
        let mut coeffs = vec![0.0; self.len() + other.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Vector { coeffs }
    }

    /// Center-aligned sum.
    pub fn add(&self, other: &Vector) -> Vector {
        self.combine(other, 1.0)
    }

    /// Center-aligned difference.
    pub fn sub(&self, other: &Vector) -> Vector {
        self.combine(other, -1.0)
    }

    fn combine(&self, other: &Vector, sign: f64) -> Vector {
        let len = self.len().max(other.len());
        let mut coeffs = vec![0.0; len];
        let a_off = (len.saturating_sub(1)) / 2 - (self.len().saturating_sub(1)) / 2;
        let b_off = (len.saturating_sub(1)) / 2 - (other.len().saturating_sub(1)) / 2;
        for (i, c) in self.coeffs.iter().enumerate() {
            coeffs[i + a_off] += c;
        }
        for (i, c) in other.coeffs.iter().enumerate() {
            coeffs[i + b_off] += sign * c;
        }
        Vector { coeffs }
    }

    /// Move the vector's mass by `shift` taps, growing it symmetrically.
    pub fn shift(&self, shift: isize) -> Vector {
        let len = self.len() + 2 * shift.unsigned_abs();
        let mut coeffs = vec![0.0; len];
        let base = (len as isize - 1) / 2 - (self.len() as isize - 1) / 2 - shift;
        for (i, c) in self.coeffs.iter().enumerate() {
            coeffs[(base + i as isize) as usize] = *c;
        }
        Vector { coeffs }
    }
}

/// Per-axis pre-filters convolved into the scaling filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFilter {
    pub luma_h: Option<Vector>,
    pub luma_v: Option<Vector>,
    pub chroma_h: Option<Vector>,
    pub chroma_v: Option<Vector>,
}

impl SourceFilter {
    /// Gaussian blur, sharpening and chroma shift, per luma/chroma class.
    pub fn default_filter(
        luma_gblur: f32,
        chroma_gblur: f32,
        luma_sharpen: f32,
        chroma_sharpen: f32,
        chroma_hshift: f32,
        chroma_vshift: f32,
    ) -> Self {
        let blur = |variance: f32| {
            if variance != 0.0 {
                Vector::gaussian(variance as f64, 3.0)
            } else {
                Vector::identity()
            }
        };
        let sharpen = |v: Vector, amount: f32| {
            if amount == 0.0 {
                return v;
            }
            let mut id = Vector::identity();
            id.scale(-amount as f64);
            v.add(&id)
        };

        let mut luma_h = sharpen(blur(luma_gblur), luma_sharpen);
        let mut luma_v = sharpen(blur(luma_gblur), luma_sharpen);
        let mut chroma_h = sharpen(blur(chroma_gblur), chroma_sharpen);
        let mut chroma_v = sharpen(blur(chroma_gblur), chroma_sharpen);

        if chroma_hshift != 0.0 {
            chroma_h = chroma_h.shift((chroma_hshift + 0.5) as isize);
        }
        if chroma_vshift != 0.0 {
            chroma_v = chroma_v.shift((chroma_vshift + 0.5) as isize);
        }
        for v in [&mut luma_h, &mut luma_v, &mut chroma_h, &mut chroma_v] {
            v.normalize(1.0);
        }

        Self {
            luma_h: Some(luma_h),
            luma_v: Some(luma_v),
            chroma_h: Some(chroma_h),
            chroma_v: Some(chroma_v),
        }
    }

    pub fn for_axis(&self, horizontal: bool, chroma: bool) -> Option<&Vector> {
        match (horizontal, chroma) {
            (true, false) => self.luma_h.as_ref(),
            (false, false) => self.luma_v.as_ref(),
            (true, true) => self.chroma_h.as_ref(),
            (false, true) => self.chroma_v.as_ref(),
        }
    }
}
