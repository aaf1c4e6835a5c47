//! # Output Size Planning
//!
//! Turns a source size plus a size constraint into concrete destination
//! dimensions for a conversion context.
//!
//! - `ScaleTarget::MaxLongSide(n)` clamps the longest side to `n` and
//!   derives the other side proportionally. It never upscales.
//! - `ScaleTarget::Exact(size)` either stretches to `size`
//!   (`AspectMode::Distort`) or fits inside it (`AspectMode::Preserve`).
//!
//! Computed sizes are rounded down to the destination format's chroma
//! subsampling so 4:2:0 outputs get even dimensions. Explicit exact sizes
//! with `Distort` are taken as given.

use std::fmt;
use std::str::FromStr;

use sws_core::PixelFormatDescriptor;

/// A 2D size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

impl FromStr for Size {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension '{}': {}", v, e))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectMode {
    /// Keep the source aspect ratio; the output fits inside the target.
    Preserve,
    /// Stretch to the target dimensions.
    Distort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleTarget {
    MaxLongSide(u32),
    Exact(Size),
}

/// Destination size for `input` under `target`/`aspect`, aligned for `dst`.
pub fn plan_output_size(
    input: Size,
    target: ScaleTarget,
    aspect: AspectMode,
    dst: &PixelFormatDescriptor,
) -> Size {
    let align_w = 1u32 << dst.log2_chroma_w;
    let align_h = 1u32 << dst.log2_chroma_h;
    let (w, h) = match (target, aspect) {
        (ScaleTarget::Exact(out), AspectMode::Distort) => return out,
        (ScaleTarget::MaxLongSide(max_side), AspectMode::Distort) => (max_side, max_side),
        (ScaleTarget::MaxLongSide(max_side), AspectMode::Preserve) => fit_preserve(input, max_side),
        (ScaleTarget::Exact(out), AspectMode::Preserve) => fit_within(input, out),
    };
    Size::new(align_down(w, align_w), align_down(h, align_h))
}

fn align_down(v: u32, align: u32) -> u32 {
    if v <= align {
        v.max(1)
    } else {
        v - v % align
    }
}

/// Longest side clamped to `max_long`; never upscales.
fn fit_preserve(input: Size, max_long: u32) -> (u32, u32) {
    let (w, h) = (input.w as f64, input.h as f64);
    let long = w.max(h);
    let s = (max_long as f64 / long).min(1.0);
    (
        ((w * s).round() as u32).max(1),
        ((h * s).round() as u32).max(1),
    )
}

fn fit_within(input: Size, bounds: Size) -> (u32, u32) {
    let (w, h) = (input.w as f64, input.h as f64);
    let s = (bounds.w as f64 / w).min(bounds.h as f64 / h).min(1.0);
    (
        ((w * s).round() as u32).max(1),
        ((h * s).round() as u32).max(1),
    )
}
