//! # Scale Configuration
//!
//! Validated description of one conversion job. It is the common interface
//! between the CLI, the benchmark tool and the library's processing layer.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `src_format` | `PixelFormat` | registered input formats | Source layout |
//! | `src_size` | `Size` | 1-16384 per side | Source dimensions |
//! | `dst_format` | `PixelFormat` | registered output formats | Destination layout |
//! | `target` | `ScaleTarget` | | Exact size or longest-side clamp |
//! | `filter` | `FilterType` | 11 kernels | Resampling filter |
//! | `band_rows` | `usize` | ≥ 1, chroma aligned | Rows per `scale` call |
//! | `brightness` | `f64` | -1.0..=1.0 | Clamped by the engine |
//! | `contrast` | `f64` | 0.0..=4.0 | Clamped by the engine |
//! | `saturation` | `f64` | 0.0..=4.0 | Clamped by the engine |
//!
//! ## Examples
//!
//! ```rust
//! use sws::config::config::ScaleConfig;
//! use sws::geometry::{ScaleTarget, Size};
//! use sws_core::PixelFormat;
//!
//! let config = ScaleConfig::new(
//!     PixelFormat::YUV420P,
//!     Size::new(1920, 1080),
//!     PixelFormat::RGB24,
//!     ScaleTarget::MaxLongSide(640),
//! );
//! assert!(config.validate().is_ok());
//! assert_eq!(config.output_size().unwrap(), Size::new(640, 360));
//! ```

use sws_core::colorspace::ONE;
use sws_core::{
    describe, ColorRange, Colorspace, ColorspaceParams, ContextOptions, ConversionContext,
    FilterType, PixelFormat, MAX_DIMENSION,
};

use crate::error::{SwsError, SwsResult};
use crate::geometry::{plan_output_size, AspectMode, ScaleTarget, Size};

/// Configuration for one conversion job.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleConfig {
    pub src_format: PixelFormat,
    pub src_size: Size,
    pub dst_format: PixelFormat,
    pub target: ScaleTarget,
    pub aspect: AspectMode,
    pub filter: FilterType,
    /// Full-precision coefficients instead of 14-bit fixed point.
    pub accurate_rnd: bool,
    /// Source rows handed to the engine per call.
    pub band_rows: usize,
    /// Matrix for both sides of the conversion.
    pub colorspace: Colorspace,
    /// `None` derives the range from the format.
    pub src_range: Option<ColorRange>,
    pub dst_range: Option<ColorRange>,
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
}

impl Default for ScaleConfig {
    /// 1920x1080 yuv420p to rgb24 at the same size, bicubic, 16-row bands.
    fn default() -> Self {
        Self {
            src_format: PixelFormat::YUV420P,
            src_size: Size::new(1920, 1080),
            dst_format: PixelFormat::RGB24,
            target: ScaleTarget::Exact(Size::new(1920, 1080)),
            aspect: AspectMode::Distort,
            filter: FilterType::Bicubic,
            accurate_rnd: false,
            band_rows: 16,
            colorspace: Colorspace::default(),
            src_range: None,
            dst_range: None,
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

impl ScaleConfig {
    pub fn new(
        src_format: PixelFormat,
        src_size: Size,
        dst_format: PixelFormat,
        target: ScaleTarget,
    ) -> Self {
        Self {
            src_format,
            src_size,
            dst_format,
            target,
            aspect: AspectMode::Preserve,
            ..Self::default()
        }
    }

    /// Check everything the engine would reject, plus job-level settings.
    pub fn validate(&self) -> SwsResult<()> {
        let src = describe(self.src_format)?;
        if !src.input {
            return Err(SwsError::validation(
                "src_format",
                src.name,
                "format is not supported as input",
            ));
        }
        let dst = describe(self.dst_format)?;
        if !dst.output {
            return Err(SwsError::validation(
                "dst_format",
                dst.name,
                "format is not supported as output",
            ));
        }

        check_size("src_size", self.src_size)?;
        if let ScaleTarget::Exact(size) = self.target {
            check_size("target", size)?;
        }
        if let ScaleTarget::MaxLongSide(side) = self.target {
            if side == 0 || side > MAX_DIMENSION {
                return Err(SwsError::validation(
                    "target",
                    side.to_string(),
                    format!("longest side must be between 1 and {}", MAX_DIMENSION),
                ));
            }
        }

        let align = 1usize << src.log2_chroma_h;
        if self.band_rows == 0 || self.band_rows % align != 0 {
            return Err(SwsError::validation(
                "band_rows",
                self.band_rows.to_string(),
                format!("must be a positive multiple of {}", align),
            )
            .with_recovery_suggestion(format!("Use --band-rows {}", align.max(16))));
        }

        for (field, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if !value.is_finite() {
                return Err(SwsError::validation(field, value.to_string(), "must be finite"));
            }
        }
        Ok(())
    }

    /// Destination dimensions after applying the target and aspect mode.
    pub fn output_size(&self) -> SwsResult<Size> {
        let dst = describe(self.dst_format)?;
        Ok(plan_output_size(self.src_size, self.target, self.aspect, dst))
    }

    /// Colorspace details; unset ranges come from the formats.
    pub fn colorspace_params(&self) -> SwsResult<ColorspaceParams> {
        let src = describe(self.src_format)?;
        let dst = describe(self.dst_format)?;
        let defaults = sws_core::context::default_colorspace(src, dst);
        let fixed = |v: f64| (v * ONE as f64).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32;
        Ok(ColorspaceParams::new(
            self.src_range.unwrap_or(defaults.src_range),
            self.dst_range.unwrap_or(defaults.dst_range),
            fixed(self.brightness),
            fixed(self.contrast),
            fixed(self.saturation),
        )
        .with_colorspaces(self.colorspace, self.colorspace))
    }

    pub fn context_options(&self) -> SwsResult<ContextOptions> {
        self.validate()?;
        let out = self.output_size()?;
        Ok(ContextOptions::new(
            self.src_format,
            self.src_size.w,
            self.src_size.h,
            self.dst_format,
            out.w,
            out.h,
        )
        .with_filter(self.filter)
        .with_accurate_rnd(self.accurate_rnd)
        .with_colorspace(self.colorspace_params()?))
    }

    /// Validate and build the engine context.
    pub fn to_context(&self) -> SwsResult<ConversionContext> {
        Ok(ConversionContext::with_options(self.context_options()?)?)
    }
}

fn check_size(field: &str, size: Size) -> SwsResult<()> {
    if size.w == 0 || size.h == 0 || size.w > MAX_DIMENSION || size.h > MAX_DIMENSION {
        return Err(SwsError::validation(
            field,
            size.to_string(),
            format!("dimensions must be between 1 and {}", MAX_DIMENSION),
        ));
    }
    Ok(())
}
