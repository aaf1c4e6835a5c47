// SPDX-License-Identifier: MIT
//! # Scale Pipeline
//!
//! Band-wise conversion of source rows into destination rows.
//!
//! ## Model
//!
//! Destination channels are grouped into resolution classes: the luma class
//! (Y, R, G, B, A at full destination size) and, when the destination has
//! chroma, the chroma class (U, V at subsampled size). Every class computes
//! four signal-domain slots per pixel, a colour triplet plus alpha, then
//! runs the colour transform and encodes the slots it owns.
//!
//! Source channels are decoded into `f32` rows as bands arrive and cached
//! until no remaining destination row reads them. A destination row is
//! produced as soon as every source row under its vertical filter window is
//! cached, so a call may return fewer rows than its share of the frame; the
//! last band of a frame always completes it.
//!
//! Per row: vertical filter over cached rows (source width), horizontal
//! filter to the class width, colour transform, round half to even and
//! clamp. Rows of one call are computed in parallel and written afterwards
//! in order, which keeps the output identical to a sequential run.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use crate::colorspace::{coefficients_for, rgb_to_yuv_matrix, ColorspaceParams, Matrix3, SampleCoding};
use crate::context::ConversionContext;
use crate::error::ScaleError;
use crate::filter::{FilterKernel, FilterVector, SourceFilter};
use crate::frame::{Plane, PlaneMut, MAX_PLANES};
use crate::pixfmt::{ceil_rshift, ByteOrder, Channel, ColorFamily, PixelFormatDescriptor};

/// A source channel as the pipeline reads it.
#[derive(Clone, Debug)]
pub(crate) struct SrcChannel {
    channel: Channel,
    plane: usize,
    step: usize,
    offset: usize,
    shift: u8,
    depth: u8,
    order: ByteOrder,
    width: usize,
    height: usize,
    log2_sub_h: u8,
    /// Byte inside a palette entry when this channel is expanded from an index.
    palette_byte: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Input {
    Scaled { channel: usize, h: usize, v: usize },
    Constant(f32),
    Unused,
}

#[derive(Clone, Copy, Debug)]
struct OutputSlot {
    slot: usize,
    component: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct ClassPlan {
    width: usize,
    height: usize,
    inputs: [Input; 4],
    outputs: Vec<OutputSlot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TransformKind {
    Identity,
    YuvToRgb,
    RgbToYuv,
}

/// Static part of a conversion, fixed at context construction.
#[derive(Debug)]
pub(crate) struct Plan {
    src_channels: Vec<SrcChannel>,
    /// Whether any class reads the channel.
    used: Vec<bool>,
    pub(crate) classes: Vec<ClassPlan>,
    transform: TransformKind,
    filters: Vec<FilterVector>,
    pub(crate) luma: (usize, usize),
    pub(crate) chroma: Option<(usize, usize)>,
}

fn slot_of(channel: Channel) -> usize {
    match channel {
        Channel::Y | Channel::R | Channel::Index => 0,
        Channel::U | Channel::G => 1,
        Channel::V | Channel::B => 2,
        Channel::A => 3,
    }
}

fn is_yuv_like(family: ColorFamily) -> bool {
    matches!(family, ColorFamily::Yuv | ColorFamily::Gray)
}

struct FilterBank<'a> {
    kernel: &'a FilterKernel,
    pre: Option<&'a SourceFilter>,
    filters: Vec<FilterVector>,
    index: HashMap<(usize, usize, bool, bool), usize>,
}

impl FilterBank<'_> {
    fn get(&mut self, src_len: usize, dst_len: usize, horizontal: bool, chroma: bool) -> usize {
        let key = (src_len, dst_len, horizontal, chroma);
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let pre = self.pre.and_then(|p| p.for_axis(horizontal, chroma));
        self.filters.push(self.kernel.generate(src_len, dst_len, pre, chroma));
        let i = self.filters.len() - 1;
        self.index.insert(key, i);
        i
    }
}

impl Plan {
    pub(crate) fn build(
        src: &PixelFormatDescriptor,
        dst: &PixelFormatDescriptor,
        (src_w, src_h): (usize, usize),
        (dst_w, dst_h): (usize, usize),
        kernel: &FilterKernel,
        pre: Option<&SourceFilter>,
    ) -> Self {
        let mut src_channels = Vec::new();
        for comp in &src.components {
            let chroma = comp.channel.is_chroma();
            let plane = comp.plane as usize;
            let base = SrcChannel {
                channel: comp.channel,
                plane,
                step: comp.step as usize,
                offset: comp.offset as usize,
                shift: comp.shift,
                depth: comp.depth,
                order: src.byte_order(plane),
                width: if chroma { ceil_rshift(src_w, src.log2_chroma_w) } else { src_w },
                height: if chroma { ceil_rshift(src_h, src.log2_chroma_h) } else { src_h },
                log2_sub_h: src.planes[plane].log2_sub_h,
                palette_byte: None,
            };
            if comp.channel == Channel::Index {
                for (channel, byte) in [(Channel::R, 2), (Channel::G, 1), (Channel::B, 0), (Channel::A, 3)] {
                    src_channels.push(SrcChannel {
                        channel,
                        palette_byte: Some(byte),
                        ..base.clone()
                    });
                }
            } else {
                src_channels.push(base);
            }
        }

        let transform = match (is_yuv_like(src.family), is_yuv_like(dst.family)) {
            (true, false) => TransformKind::YuvToRgb,
            (false, true) => TransformKind::RgbToYuv,
            _ => TransformKind::Identity,
        };

        let triplet: [Option<Channel>; 3] = match src.family {
            ColorFamily::Yuv => [Some(Channel::Y), Some(Channel::U), Some(Channel::V)],
            ColorFamily::Gray => [Some(Channel::Y), None, None],
            ColorFamily::Rgb | ColorFamily::Palette => [Some(Channel::R), Some(Channel::G), Some(Channel::B)],
        };

        let mut bank = FilterBank {
            kernel,
            pre,
            filters: Vec::new(),
            index: HashMap::new(),
        };
        let luma = (bank.get(src_w, dst_w, true, false), bank.get(src_h, dst_h, false, false));
        let chroma = (src.has_chroma() && dst.has_chroma()).then(|| {
            let (sw, sh) = (
                ceil_rshift(src_w, src.log2_chroma_w),
                ceil_rshift(src_h, src.log2_chroma_h),
            );
            let (dw, dh) = (
                ceil_rshift(dst_w, dst.log2_chroma_w),
                ceil_rshift(dst_h, dst.log2_chroma_h),
            );
            (bank.get(sw, dw, true, true), bank.get(sh, dh, false, true))
        });

        let mut classes = Vec::new();
        for chroma_class in [false, true] {
            let outputs: Vec<OutputSlot> = dst
                .components
                .iter()
                .enumerate()
                .filter(|(_, c)| c.channel.is_chroma() == chroma_class)
                .map(|(component, c)| OutputSlot {
                    slot: slot_of(c.channel),
                    component,
                })
                .collect();
            if outputs.is_empty() {
                continue;
            }
            let (width, height) = if chroma_class {
                (
                    ceil_rshift(dst_w, dst.log2_chroma_w),
                    ceil_rshift(dst_h, dst.log2_chroma_h),
                )
            } else {
                (dst_w, dst_h)
            };

            let mut needed = [false; 4];
            for out in &outputs {
                needed[out.slot] = true;
            }
            if transform != TransformKind::Identity && needed[..3].iter().any(|&n| n) {
                needed[..3].iter_mut().for_each(|n| *n = true);
            }

            let mut inputs = [Input::Unused; 4];
            for (slot, input) in inputs.iter_mut().enumerate() {
                if !needed[slot] {
                    continue;
                }
                let wanted = if slot == 3 { Some(Channel::A) } else { triplet[slot] };
                let found = wanted.and_then(|ch| src_channels.iter().position(|s| s.channel == ch));
                *input = match found {
                    Some(channel) => {
                        let sc = &src_channels[channel];
                        let is_chroma = sc.channel.is_chroma();
                        Input::Scaled {
                            channel,
                            h: bank.get(sc.width, width, true, is_chroma),
                            v: bank.get(sc.height, height, false, is_chroma),
                        }
                    }
                    None if slot == 3 => Input::Constant(1.0),
                    None => Input::Constant(0.0),
                };
            }
            classes.push(ClassPlan {
                width,
                height,
                inputs,
                outputs,
            });
        }

        let mut used = vec![false; src_channels.len()];
        for class in &classes {
            for input in &class.inputs {
                if let Input::Scaled { channel, .. } = input {
                    used[*channel] = true;
                }
            }
        }

        Self {
            src_channels,
            used,
            classes,
            transform,
            filters: bank.filters,
            luma,
            chroma,
        }
    }

    pub(crate) fn filter(&self, index: usize) -> &FilterVector {
        &self.filters[index]
    }

    /// First cached row of `channel` any remaining destination row still reads.
    fn keep_from(&self, channel: usize, next_rows: &[usize]) -> Option<usize> {
        self.classes
            .iter()
            .zip(next_rows)
            .filter(|(class, next)| **next < class.height)
            .flat_map(|(class, &next)| {
                class.inputs.iter().filter_map(move |input| match *input {
                    Input::Scaled { channel: c, v, .. } if c == channel => {
                        self.filters[v].positions()[next..].iter().copied().min()
                    }
                    _ => None,
                })
            })
            .min()
    }
}

#[derive(Clone, Copy, Debug)]
enum Transform {
    Identity,
    YuvToRgb {
        m: [[f32; 3]; 3],
        brightness: f32,
        contrast: f32,
        chroma_gain: f32,
    },
    RgbToYuv {
        m: [[f32; 3]; 3],
    },
}

fn to_f32(m: Matrix3) -> [[f32; 3]; 3] {
    m.map(|row| row.map(|v| v as f32))
}

impl Transform {
    fn new(kind: TransformKind, params: &ColorspaceParams) -> Self {
        match kind {
            TransformKind::Identity => Transform::Identity,
            TransformKind::YuvToRgb => Transform::YuvToRgb {
                m: to_f32(coefficients_for(params.src_colorspace)),
                brightness: params.brightness_f32(),
                contrast: params.contrast_f32(),
                chroma_gain: params.contrast_f32() * params.saturation_f32(),
            },
            TransformKind::RgbToYuv => Transform::RgbToYuv {
                m: to_f32(rgb_to_yuv_matrix(params.dst_colorspace)),
            },
        }
    }

    #[inline]
    fn apply(&self, px: [f32; 4]) -> [f32; 4] {
        let mul = |m: &[[f32; 3]; 3], v: [f32; 3]| {
            [0, 1, 2].map(|r| m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2])
        };
        match self {
            Transform::Identity => px,
            Transform::YuvToRgb {
                m,
                brightness,
                contrast,
                chroma_gain,
            } => {
                let y = px[0] * contrast + brightness;
                let [r, g, b] = mul(m, [y, px[1] * chroma_gain, px[2] * chroma_gain]);
                [r, g, b, px[3]]
            }
            Transform::RgbToYuv { m } => {
                let [y, u, v] = mul(m, [px[0], px[1], px[2]]);
                [y, u, v, px[3]]
            }
        }
    }
}

/// Decoded rows of one source channel, indexed by channel row.
#[derive(Debug, Default)]
struct RowCache {
    first: usize,
    rows: VecDeque<Vec<f32>>,
}

impl RowCache {
    fn end(&self) -> usize {
        self.first + self.rows.len()
    }

    #[inline]
    fn row(&self, r: usize) -> &[f32] {
        &self.rows[r - self.first]
    }

    fn trim(&mut self, keep_from: usize) {
        while self.first < keep_from && self.rows.pop_front().is_some() {
            self.first += 1;
        }
        if self.rows.is_empty() {
            self.first = self.first.max(keep_from);
        }
    }
}

/// Per-frame band progress.
#[derive(Debug)]
pub(crate) struct FrameState {
    params: Arc<ColorspaceParams>,
    transform: Transform,
    src_codings: Vec<SampleCoding>,
    dst_codings: Vec<SampleCoding>,
    next_src_row: usize,
    caches: Vec<RowCache>,
    next_dst_rows: Vec<usize>,
}

impl FrameState {
    fn new(
        plan: &Plan,
        dst: &PixelFormatDescriptor,
        params: Arc<ColorspaceParams>,
    ) -> Self {
        let src_codings = plan
            .src_channels
            .iter()
            .map(|c| SampleCoding::new(c.channel, c.depth, params.src_range))
            .collect();
        let dst_codings = dst
            .components
            .iter()
            .map(|c| SampleCoding::new(c.channel, c.depth, params.dst_range))
            .collect();
        Self {
            transform: Transform::new(plan.transform, &params),
            params,
            src_codings,
            dst_codings,
            next_src_row: 0,
            caches: plan.src_channels.iter().map(|_| RowCache::default()).collect(),
            next_dst_rows: vec![0; plan.classes.len()],
        }
    }
}

#[inline]
fn read_sample(data: &[u8], at: usize, bytes: usize, order: ByteOrder) -> u32 {
    if bytes == 1 {
        data[at] as u32
    } else {
        let pair = [data[at], data[at + 1]];
        match order {
            ByteOrder::Little => u16::from_le_bytes(pair) as u32,
            ByteOrder::Big => u16::from_be_bytes(pair) as u32,
        }
    }
}

#[inline]
fn write_sample(data: &mut [u8], at: usize, bytes: usize, order: ByteOrder, value: u32) {
    if bytes == 1 {
        data[at] = value as u8;
    } else {
        let pair = match order {
            ByteOrder::Little => (value as u16).to_le_bytes(),
            ByteOrder::Big => (value as u16).to_be_bytes(),
        };
        data[at..at + 2].copy_from_slice(&pair);
    }
}

fn decode_row(
    ch: &SrcChannel,
    coding: &SampleCoding,
    planes: &[Plane<'_>],
    local_row: usize,
) -> Vec<f32> {
    let plane = &planes[ch.plane];
    let base = local_row * plane.stride + ch.offset;
    let bytes = if ch.depth > 8 { 2 } else { 1 };
    let mask = (1u32 << ch.depth) - 1;
    let raw = |x: usize| (read_sample(plane.data, base + x * ch.step, bytes, ch.order) >> ch.shift) & mask;
    match ch.palette_byte {
        Some(byte) => {
            let palette = planes[1].data;
            (0..ch.width)
                .map(|x| palette[raw(x) as usize * 4 + byte] as f32 / 255.0)
                .collect()
        }
        None => (0..ch.width).map(|x| coding.decode(raw(x))).collect(),
    }
}

impl ConversionContext {
    /// Convert `row_count` source rows starting at `src_start_row`.
    ///
    /// `src` describes only the band (its first row is source row
    /// `src_start_row`); `dst` describes the whole destination frame. Returns
    /// the number of luma destination rows written by this call.
    pub fn scale(
        &mut self,
        src: &[Plane<'_>],
        src_start_row: usize,
        row_count: usize,
        dst: &mut [PlaneMut<'_>],
    ) -> Result<usize, ScaleError> {
        let end = self.validate(src, src_start_row, row_count, dst)?;

        if src_start_row == 0 {
            self.frame = Some(FrameState::new(&self.plan, self.dst, self.snapshot()));
        }
        let src_h = self.src_h;
        let plan = &self.plan;
        let dst_desc = self.dst;
        let state = match self.frame.as_mut() {
            Some(state) if state.next_src_row == src_start_row => state,
            other => {
                return Err(ScaleError::SliceOrder {
                    expected: other.map(|s| s.next_src_row).unwrap_or(0),
                    got: src_start_row,
                })
            }
        };

        let frame_done = end == src_h;
        for (i, ch) in plan.src_channels.iter().enumerate() {
            if !plan.used[i] {
                continue;
            }
            let band_first = src_start_row >> ch.log2_sub_h;
            let avail = ceil_rshift(end, ch.log2_sub_h).min(ch.height);
            let coding = state.src_codings[i];
            let cache = &mut state.caches[i];
            for r in cache.end().max(band_first)..avail {
                cache.rows.push_back(decode_row(ch, &coding, src, r - band_first));
            }
        }
        state.next_src_row = end;

        let mut produced = Vec::with_capacity(plan.classes.len());
        for (ci, class) in plan.classes.iter().enumerate() {
            let first = state.next_dst_rows[ci];
            let mut last = first;
            while last < class.height
                && (frame_done || row_ready(plan, class, &state.caches, last))
            {
                last += 1;
            }

            let frame: &FrameState = state;
            let rows: Vec<Vec<Vec<u32>>> = (first..last)
                .into_par_iter()
                .map(|j| compute_row(plan, class, frame, j))
                .collect();
            for (j, row) in (first..).zip(rows) {
                for (out, values) in class.outputs.iter().zip(row) {
                    let comp = &dst_desc.components[out.component];
                    let plane = &mut dst[comp.plane as usize];
                    let order = dst_desc.byte_order(comp.plane as usize);
                    let base = j * plane.stride + comp.offset as usize;
                    let bytes = comp.sample_bytes();
                    for (x, v) in values.into_iter().enumerate() {
                        write_sample(plane.data, base + x * comp.step as usize, bytes, order, v << comp.shift);
                    }
                }
            }
            state.next_dst_rows[ci] = last;
            produced.push(last - first);
        }

        for (i, cache) in state.caches.iter_mut().enumerate() {
            match plan.keep_from(i, &state.next_dst_rows) {
                Some(keep) => cache.trim(keep),
                None => cache.trim(usize::MAX),
            }
        }

        let luma_rows = produced.first().copied().unwrap_or(0);
        trace!(
            start = src_start_row,
            rows = row_count,
            produced = luma_rows,
            brightness = state.params.brightness,
            "scaled band"
        );
        if frame_done {
            self.frame = None;
        }
        Ok(luma_rows)
    }

    /// Convert a whole frame in one call.
    pub fn scale_frame(&mut self, src: &[Plane<'_>], dst: &mut [PlaneMut<'_>]) -> Result<usize, ScaleError> {
        self.scale(src, 0, self.src_h, dst)
    }

    fn validate(
        &self,
        src: &[Plane<'_>],
        start: usize,
        rows: usize,
        dst: &[PlaneMut<'_>],
    ) -> Result<usize, ScaleError> {
        let end = start
            .checked_add(rows)
            .filter(|&end| rows > 0 && end <= self.src_h)
            .ok_or(ScaleError::OutOfBounds {
                start,
                rows,
                height: self.src_h,
            })?;
        let align = 1usize << self.src.log2_chroma_h;
        if start % align != 0 || (rows % align != 0 && end != self.src_h) {
            return Err(ScaleError::UnalignedSlice { start, rows, align });
        }

        for (desc, count) in [(self.src, src.len()), (self.dst, dst.len())] {
            if count != desc.plane_count() || count > MAX_PLANES {
                return Err(ScaleError::PlaneCount {
                    expected: desc.plane_count(),
                    got: count,
                });
            }
        }

        let src_checks = src.iter().enumerate().map(|(p, plane)| {
            let band_rows = if self.src.planes[p].palette {
                1
            } else {
                ceil_rshift(end, self.src.planes[p].log2_sub_h) - (start >> self.src.planes[p].log2_sub_h)
            };
            (self.src, self.src_w, p, plane.stride, plane.data.len(), band_rows)
        });
        let dst_checks = dst.iter().enumerate().map(|(p, plane)| {
            let height = self.dst.plane_height(p, self.dst_h);
            (self.dst, self.dst_w, p, plane.stride, plane.data.len(), height)
        });
        for (desc, width, p, stride, len, plane_rows) in src_checks.chain(dst_checks) {
            let min = desc.min_row_bytes(p, width);
            if stride < min && !desc.planes[p].palette {
                return Err(ScaleError::MismatchedStrides { plane: p, stride, min });
            }
            let required = desc.plane_len(p, width, plane_rows, stride);
            if len < required {
                return Err(ScaleError::BufferTooSmall { plane: p, len, required });
            }
        }
        Ok(end)
    }
}

fn row_ready(plan: &Plan, class: &ClassPlan, caches: &[RowCache], j: usize) -> bool {
    class.inputs.iter().all(|input| match *input {
        Input::Scaled { channel, v, .. } => {
            let (pos, taps) = plan.filters[v].taps(j);
            pos + taps.len() <= caches[channel].end()
        }
        _ => true,
    })
}

/// Encoded samples of destination row `j`, one vector per class output.
fn compute_row(plan: &Plan, class: &ClassPlan, state: &FrameState, j: usize) -> Vec<Vec<u32>> {
    let width = class.width;
    let slots: Vec<Option<Vec<f32>>> = class
        .inputs
        .iter()
        .map(|input| match *input {
            Input::Scaled { channel, h, v } => {
                let src_width = plan.src_channels[channel].width;
                let cache = &state.caches[channel];
                let (pos, taps) = plan.filters[v].taps(j);
                let mut column = vec![0f32; src_width];
                for (k, &c) in taps.iter().enumerate() {
                    if c == 0.0 {
                        continue;
                    }
                    for (acc, &s) in column.iter_mut().zip(cache.row(pos + k)) {
                        *acc += c * s;
                    }
                }
                let hf = &plan.filters[h];
                Some(
                    (0..width)
                        .map(|x| {
                            let (p, t) = hf.taps(x);
                            t.iter().zip(&column[p..p + t.len()]).map(|(c, s)| c * s).sum()
                        })
                        .collect(),
                )
            }
            Input::Constant(value) => Some(vec![value; width]),
            Input::Unused => None,
        })
        .collect();

    let mut out: Vec<Vec<u32>> = class.outputs.iter().map(|_| Vec::with_capacity(width)).collect();
    for x in 0..width {
        let mut px = [0f32; 4];
        for (slot, values) in slots.iter().enumerate() {
            if let Some(values) = values {
                px[slot] = values[x];
            }
        }
        let px = state.transform.apply(px);
        for (o, target) in class.outputs.iter().zip(out.iter_mut()) {
            target.push(state.dst_codings[o.component].encode(px[o.slot]));
        }
    }
    out
}
