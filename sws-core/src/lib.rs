// SPDX-License-Identifier: MIT
//! # sws-core: Image Rescaling and Pixel-Format Conversion
//!
//! CPU engine that takes pixel buffers in one format, resolution and
//! colorspace and produces them in another.
//!
//! ## Architecture Overview
//!
//! Components, leaf to root:
//!
//! - [`pixfmt`]: static registry of pixel format layouts
//! - [`colorspace`]: YUV↔RGB matrices, ranges, cosmetic controls
//! - [`filter`]: separable resampling kernels and pre-filters
//! - [`context`]: [`ConversionContext`] construction and colorspace updates
//! - [`scale`]: band-wise scale pipeline run through a context
//!
//! A context is built once per format/size pair (all filters are generated
//! up front) and then fed whole frames or row bands.
//!
//! ## Usage Example
//!
//! ```rust
//! use sws_core::{ConversionContext, FilterType, FrameBuffer, PixelFormat};
//!
//! let mut ctx = ConversionContext::new(
//!     PixelFormat::YUV420P,
//!     PixelFormat::RGB24,
//!     64,
//!     48,
//!     32,
//!     24,
//!     FilterType::Bicubic,
//!     None,
//! )?;
//! let src = FrameBuffer::new(PixelFormat::YUV420P, 64, 48)?;
//! let mut dst = FrameBuffer::new(PixelFormat::RGB24, 32, 24)?;
//!
//! // Stream the source in bands of 16 rows.
//! for start in (0..48).step_by(16) {
//!     ctx.scale(&src.band(start, 16), start, 16, &mut dst.planes_mut())?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! `scale` takes `&mut self`; one context converts one stream at a time.
//! Colorspace updates take `&self` and swap an immutable snapshot. Rows
//! inside a call are computed on the rayon pool.

pub mod colorspace;
pub mod context;
pub mod error;
pub mod filter;
pub mod frame;
pub mod palette;
pub mod pixfmt;
pub mod scale;

use once_cell::sync::Lazy;

pub use colorspace::{
    build_params, coefficients_for, fixed_point_coefficients, ColorRange, Colorspace,
    ColorspaceParams,
};
pub use context::{ContextOptions, ConversionContext, MAX_DIMENSION};
pub use error::{ConfigError, NotSupported, ScaleError};
pub use filter::{FilterKernel, FilterType, FilterVector, KernelParams, SourceFilter, Vector, ACCURATE_RND};
pub use frame::{FrameBuffer, Plane, PlaneMut, MAX_PLANES};
pub use palette::{palette8_to_packed24, palette8_to_packed32};
pub use pixfmt::{describe, is_supported_input, is_supported_output, PixelFormat, PixelFormatDescriptor};

static CONFIGURATION: Lazy<String> = Lazy::new(|| {
    let mut features = vec!["rayon", "f32-pipeline"];
    if cfg!(debug_assertions) {
        features.push("debug");
    }
    format!("sws-core {} [{}]", env!("CARGO_PKG_VERSION"), features.join(" "))
});

/// Packed `major << 16 | minor << 8 | micro`.
pub fn version() -> u32 {
    let part = |s: &str| s.parse::<u32>().unwrap_or(0);
    part(env!("CARGO_PKG_VERSION_MAJOR")) << 16
        | part(env!("CARGO_PKG_VERSION_MINOR")) << 8
        | part(env!("CARGO_PKG_VERSION_PATCH"))
}

/// Build description.
pub fn configuration() -> &'static str {
    &CONFIGURATION
}

pub fn license() -> &'static str {
    env!("CARGO_PKG_LICENSE")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata() {
        assert_eq!(version(), 0x000100);
        assert!(configuration().starts_with("sws-core 0.1.0"));
        assert_eq!(license(), "MIT");
    }
}
