// SPDX-License-Identifier: MIT
//! # Conversion Context
//!
//! A [`ConversionContext`] binds one source format/size to one destination
//! format/size. Construction validates the pair, generates every filter the
//! scale pipeline needs and derives default colorspace details from the two
//! formats. After that the context is reused for any number of frames.
//!
//! Colorspace details live behind an `Arc` snapshot guarded by a `RwLock`:
//! [`ConversionContext::set_colorspace_details`] swaps the whole snapshot, so
//! a reader sees either the old parameters or the new ones, never a mix. A
//! frame picks up the snapshot current when its first band arrives.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::colorspace::{ColorRange, ColorspaceParams};
use crate::error::ConfigError;
use crate::filter::{FilterKernel, FilterType, FilterVector, KernelParams, SourceFilter, ACCURATE_RND};
use crate::pixfmt::{ceil_rshift, describe, ColorFamily, PixelFormat, PixelFormatDescriptor};
use crate::scale::{FrameState, Plan};

/// Largest accepted width or height.
pub const MAX_DIMENSION: u32 = 16384;

/// Everything a context can be configured with.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextOptions {
    pub src_format: PixelFormat,
    pub src_width: u32,
    pub src_height: u32,
    pub dst_format: PixelFormat,
    pub dst_width: u32,
    pub dst_height: u32,
    pub filter: FilterType,
    pub luma_params: KernelParams,
    pub chroma_params: KernelParams,
    pub accurate_rnd: bool,
    pub source_filter: Option<SourceFilter>,
    /// `None` derives the details from the formats.
    pub colorspace: Option<ColorspaceParams>,
}

impl ContextOptions {
    pub fn new(
        src_format: PixelFormat,
        src_width: u32,
        src_height: u32,
        dst_format: PixelFormat,
        dst_width: u32,
        dst_height: u32,
    ) -> Self {
        Self {
            src_format,
            src_width,
            src_height,
            dst_format,
            dst_width,
            dst_height,
            filter: FilterType::Bicubic,
            luma_params: KernelParams::default(),
            chroma_params: KernelParams::default(),
            accurate_rnd: false,
            source_filter: None,
            colorspace: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_accurate_rnd(mut self, accurate_rnd: bool) -> Self {
        self.accurate_rnd = accurate_rnd;
        self
    }

    pub fn with_kernel_params(mut self, luma: KernelParams, chroma: KernelParams) -> Self {
        self.luma_params = luma;
        self.chroma_params = chroma;
        self
    }

    pub fn with_source_filter(mut self, source_filter: SourceFilter) -> Self {
        self.source_filter = Some(source_filter);
        self
    }

    pub fn with_colorspace(mut self, params: ColorspaceParams) -> Self {
        self.colorspace = Some(params);
        self
    }
}

/// Range a format's samples are assumed to use when nothing else is known.
pub fn default_range(desc: &PixelFormatDescriptor) -> ColorRange {
    if desc.family == ColorFamily::Yuv && !desc.full_range {
        ColorRange::Limited
    } else {
        ColorRange::Full
    }
}

/// Default colorspace details for a format pair: BT.601 matrices, range
/// from each format, neutral cosmetic parameters.
pub fn default_colorspace(src: &PixelFormatDescriptor, dst: &PixelFormatDescriptor) -> ColorspaceParams {
    ColorspaceParams::default().with_ranges(default_range(src), default_range(dst))
}

pub struct ConversionContext {
    pub(crate) src: &'static PixelFormatDescriptor,
    pub(crate) dst: &'static PixelFormatDescriptor,
    pub(crate) src_w: usize,
    pub(crate) src_h: usize,
    pub(crate) dst_w: usize,
    pub(crate) dst_h: usize,
    kernel: FilterKernel,
    source_filter: Option<SourceFilter>,
    colorspace: RwLock<Arc<ColorspaceParams>>,
    pub(crate) plan: Plan,
    pub(crate) frame: Option<FrameState>,
}

impl ConversionContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        src_format: PixelFormat,
        dst_format: PixelFormat,
        src_w: u32,
        src_h: u32,
        dst_w: u32,
        dst_h: u32,
        filter: FilterType,
        colorspace: Option<ColorspaceParams>,
    ) -> Result<Self, ConfigError> {
        let mut options = ContextOptions::new(src_format, src_w, src_h, dst_format, dst_w, dst_h)
            .with_filter(filter);
        options.colorspace = colorspace;
        Self::with_options(options)
    }

    /// Build from a classic flag word: one filter bit, optionally `ACCURATE_RND`.
    pub fn with_flags(
        src_format: PixelFormat,
        src_w: u32,
        src_h: u32,
        dst_format: PixelFormat,
        dst_w: u32,
        dst_h: u32,
        flags: u32,
    ) -> Result<Self, ConfigError> {
        let filter = FilterType::from_flags(flags)?;
        Self::with_options(
            ContextOptions::new(src_format, src_w, src_h, dst_format, dst_w, dst_h)
                .with_filter(filter)
                .with_accurate_rnd(flags & ACCURATE_RND != 0),
        )
    }

    pub fn with_options(options: ContextOptions) -> Result<Self, ConfigError> {
        let src = describe(options.src_format)
            .ok()
            .filter(|d| d.input)
            .ok_or(ConfigError::UnsupportedInputFormat(options.src_format))?;
        let dst = describe(options.dst_format)
            .ok()
            .filter(|d| d.output)
            .ok_or(ConfigError::UnsupportedOutputFormat(options.dst_format))?;

        for (which, value) in [
            ("source width", options.src_width),
            ("source height", options.src_height),
            ("destination width", options.dst_width),
            ("destination height", options.dst_height),
        ] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(ConfigError::InvalidDimension { which, value });
            }
        }

        let kernel = FilterKernel {
            filter: options.filter,
            luma: options.luma_params,
            chroma: options.chroma_params,
            accurate_rnd: options.accurate_rnd,
        };
        let (src_w, src_h) = (options.src_width as usize, options.src_height as usize);
        let (dst_w, dst_h) = (options.dst_width as usize, options.dst_height as usize);
        let plan = Plan::build(
            src,
            dst,
            (src_w, src_h),
            (dst_w, dst_h),
            &kernel,
            options.source_filter.as_ref(),
        );
        let colorspace = options
            .colorspace
            .map(ColorspaceParams::clamped)
            .unwrap_or_else(|| default_colorspace(src, dst));

        debug!(
            src = src.name,
            dst = dst.name,
            src_w,
            src_h,
            dst_w,
            dst_h,
            filter = %kernel.filter,
            accurate_rnd = kernel.accurate_rnd,
            luma_taps = plan.filter(plan.luma.0).filter_size(),
            chroma_taps = plan.chroma.map(|(h, _)| plan.filter(h).filter_size()).unwrap_or(0),
            classes = plan.classes.len(),
            "created conversion context"
        );

        Ok(Self {
            src,
            dst,
            src_w,
            src_h,
            dst_w,
            dst_h,
            kernel,
            source_filter: options.source_filter,
            colorspace: RwLock::new(Arc::new(colorspace)),
            plan,
            frame: None,
        })
    }

    /// Replace the colorspace details; returns the previous ones.
    pub fn set_colorspace_details(&self, params: ColorspaceParams) -> ColorspaceParams {
        let params = Arc::new(params.clamped());
        let mut guard = self.colorspace.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, params);
        debug!(?previous, current = ?**guard, "updated colorspace details");
        *previous
    }

    pub fn colorspace_details(&self) -> ColorspaceParams {
        *self.snapshot()
    }

    pub(crate) fn snapshot(&self) -> Arc<ColorspaceParams> {
        self.colorspace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn src_descriptor(&self) -> &'static PixelFormatDescriptor {
        self.src
    }

    pub fn dst_descriptor(&self) -> &'static PixelFormatDescriptor {
        self.dst
    }

    pub fn src_size(&self) -> (usize, usize) {
        (self.src_w, self.src_h)
    }

    pub fn dst_size(&self) -> (usize, usize) {
        (self.dst_w, self.dst_h)
    }

    pub fn filter_type(&self) -> FilterType {
        self.kernel.filter
    }

    pub fn kernel(&self) -> &FilterKernel {
        &self.kernel
    }

    pub fn source_filter(&self) -> Option<&SourceFilter> {
        self.source_filter.as_ref()
    }

    pub fn luma_h_filter(&self) -> &FilterVector {
        self.plan.filter(self.plan.luma.0)
    }

    pub fn luma_v_filter(&self) -> &FilterVector {
        self.plan.filter(self.plan.luma.1)
    }

    /// Chroma filters exist only when both formats carry chroma.
    pub fn chroma_h_filter(&self) -> Option<&FilterVector> {
        self.plan.chroma.map(|(h, _)| self.plan.filter(h))
    }

    pub fn chroma_v_filter(&self) -> Option<&FilterVector> {
        self.plan.chroma.map(|(_, v)| self.plan.filter(v))
    }

    /// Destination chroma plane size, when the destination has chroma.
    pub fn dst_chroma_size(&self) -> Option<(usize, usize)> {
        self.dst.has_chroma().then(|| {
            (
                ceil_rshift(self.dst_w, self.dst.log2_chroma_w),
                ceil_rshift(self.dst_h, self.dst.log2_chroma_h),
            )
        })
    }
}
