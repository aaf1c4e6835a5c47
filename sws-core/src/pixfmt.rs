// SPDX-License-Identifier: MIT
//! # Pixel Format Registry
//!
//! Static descriptions of every pixel format the engine understands: how many
//! planes a frame has, which channel lives where inside each plane, how deep
//! the samples are and how chroma is subsampled.
//!
//! Formats are keyed by a stable integer id ([`PixelFormat`]). The id space is
//! open: any `u32` can be wrapped, and lookups for ids the registry does not
//! know return [`NotSupported`] instead of failing hard. The registry itself
//! is built once on first use and never mutated afterwards.
//!
//! ## Layout model
//!
//! Each format is a list of planes plus a list of components. A component
//! names a channel (Y, U, V, R, G, B, A or a palette index) and gives its
//! plane, its byte step between horizontally adjacent samples, its byte
//! offset inside a pixel group and its bit depth. Packed, planar and
//! semi-planar layouts all fall out of the same description, which is what
//! lets the scale pipeline read and write any registered format through one
//! code path.

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

use crate::error::NotSupported;

/// Size of the palette plane of paletted formats: 256 entries of 4 bytes.
pub const PALETTE_BYTES: usize = 256 * 4;

/// Stable integer id of a pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    pub const YUV420P: Self = Self(0);
    pub const YUYV422: Self = Self(1);
    pub const RGB24: Self = Self(2);
    pub const BGR24: Self = Self(3);
    pub const YUV422P: Self = Self(4);
    pub const YUV444P: Self = Self(5);
    pub const YUV410P: Self = Self(6);
    pub const YUV411P: Self = Self(7);
    pub const GRAY8: Self = Self(8);
    pub const PAL8: Self = Self(11);
    pub const YUVJ420P: Self = Self(12);
    pub const YUVJ422P: Self = Self(13);
    pub const YUVJ444P: Self = Self(14);
    pub const UYVY422: Self = Self(15);
    pub const NV12: Self = Self(23);
    pub const NV21: Self = Self(24);
    pub const ARGB: Self = Self(25);
    pub const RGBA: Self = Self(26);
    pub const ABGR: Self = Self(27);
    pub const BGRA: Self = Self(28);
    pub const GRAY16BE: Self = Self(29);
    pub const GRAY16LE: Self = Self(30);
    pub const YUV440P: Self = Self(31);
    pub const YUVA420P: Self = Self(33);
    pub const RGB48BE: Self = Self(34);
    pub const RGB48LE: Self = Self(35);
    pub const YUV444P16LE: Self = Self(51);
    pub const YUV444P16BE: Self = Self(52);
    pub const YUV420P10BE: Self = Self(63);
    pub const YUV420P10LE: Self = Self(64);
    pub const GBRP: Self = Self(73);

    pub const fn id(self) -> u32 {
        self.0
    }

    pub fn descriptor(self) -> Result<&'static PixelFormatDescriptor, NotSupported> {
        describe(self)
    }
}

impl From<u32> for PixelFormat {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match describe(*self) {
            Ok(desc) => f.write_str(desc.name),
            Err(_) => write!(f, "#{}", self.0),
        }
    }
}

impl FromStr for PixelFormat {
    type Err = NotSupported;

    /// Resolve a format by registry name (case-insensitive) or numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u32>() {
            return describe(PixelFormat(id)).map(|d| d.format);
        }
        REGISTRY
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(s))
            .map(|d| d.format)
            .ok_or_else(|| NotSupported::new("pixel format", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorFamily {
    Yuv,
    Rgb,
    Gray,
    Palette,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Planar,
    SemiPlanar,
    Packed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Y,
    U,
    V,
    R,
    G,
    B,
    A,
    /// Palette index; expanded through the palette plane on input.
    Index,
}

impl Channel {
    pub fn is_chroma(self) -> bool {
        matches!(self, Channel::U | Channel::V)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneDescriptor {
    pub bits_per_sample: u8,
    pub log2_sub_w: u8,
    pub log2_sub_h: u8,
    pub byte_order: ByteOrder,
    /// The plane holds a 256-entry palette instead of image rows.
    pub palette: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub channel: Channel,
    pub plane: u8,
    /// Bytes between horizontally adjacent samples of this component.
    pub step: u8,
    /// Bytes before the first sample of this component in a row.
    pub offset: u8,
    pub shift: u8,
    pub depth: u8,
}

impl ComponentDescriptor {
    pub fn sample_bytes(&self) -> usize {
        if self.depth > 8 {
            2
        } else {
            1
        }
    }

    pub fn max_value(&self) -> u32 {
        (1u32 << self.depth) - 1
    }
}

#[derive(Clone, Debug)]
pub struct PixelFormatDescriptor {
    pub format: PixelFormat,
    pub name: &'static str,
    pub family: ColorFamily,
    pub layout: Layout,
    pub log2_chroma_w: u8,
    pub log2_chroma_h: u8,
    pub planes: Vec<PlaneDescriptor>,
    pub components: Vec<ComponentDescriptor>,
    /// YUV data in this format is full range by convention (JPEG style).
    pub full_range: bool,
    pub input: bool,
    pub output: bool,
}

#[inline]
pub fn ceil_rshift(v: usize, shift: u8) -> usize {
    (v + (1usize << shift) - 1) >> shift
}

impl PixelFormatDescriptor {
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn is_planar(&self) -> bool {
        self.layout != Layout::Packed
    }

    pub fn has_alpha(&self) -> bool {
        self.family == ColorFamily::Palette
            || self.components.iter().any(|c| c.channel == Channel::A)
    }

    pub fn has_chroma(&self) -> bool {
        self.components.iter().any(|c| c.channel.is_chroma())
    }

    pub fn max_depth(&self) -> u8 {
        self.components.iter().map(|c| c.depth).max().unwrap_or(8)
    }

    pub fn component(&self, channel: Channel) -> Option<&ComponentDescriptor> {
        self.components.iter().find(|c| c.channel == channel)
    }

    pub fn byte_order(&self, plane: usize) -> ByteOrder {
        self.planes
            .get(plane)
            .map(|p| p.byte_order)
            .unwrap_or(ByteOrder::Little)
    }

    pub fn component_width(&self, comp: &ComponentDescriptor, width: usize) -> usize {
        if comp.channel.is_chroma() {
            ceil_rshift(width, self.log2_chroma_w)
        } else {
            width
        }
    }

    pub fn component_height(&self, comp: &ComponentDescriptor, height: usize) -> usize {
        if comp.channel.is_chroma() {
            ceil_rshift(height, self.log2_chroma_h)
        } else {
            height
        }
    }

    pub fn plane_width(&self, plane: usize, width: usize) -> usize {
        ceil_rshift(width, self.planes[plane].log2_sub_w)
    }

    pub fn plane_height(&self, plane: usize, height: usize) -> usize {
        if self.planes[plane].palette {
            1
        } else {
            ceil_rshift(height, self.planes[plane].log2_sub_h)
        }
    }

    /// Smallest stride that holds one row of `plane` at image width `width`.
    pub fn min_row_bytes(&self, plane: usize, width: usize) -> usize {
        if self.planes[plane].palette {
            return PALETTE_BYTES;
        }
        self.components
            .iter()
            .filter(|c| c.plane as usize == plane)
            .map(|c| {
                let w = self.component_width(c, width).max(1);
                c.offset as usize + (w - 1) * c.step as usize + c.sample_bytes()
            })
            .max()
            .unwrap_or(0)
    }

    /// Bytes a buffer must hold for `rows` rows of `plane` at `stride`.
    pub fn plane_len(&self, plane: usize, width: usize, rows: usize, stride: usize) -> usize {
        if rows == 0 {
            0
        } else {
            stride * (rows - 1) + self.min_row_bytes(plane, width)
        }
    }

    /// Total bytes of a tightly packed frame.
    pub fn frame_size(&self, width: usize, height: usize) -> usize {
        (0..self.plane_count())
            .map(|p| {
                let stride = self.min_row_bytes(p, width);
                self.plane_len(p, width, self.plane_height(p, height), stride)
            })
            .sum()
    }

    /// The registered format with the same layout but opposite byte order.
    pub fn byte_swapped(&self) -> Option<PixelFormat> {
        if self.max_depth() <= 8 {
            return None;
        }
        let twin = if let Some(stem) = self.name.strip_suffix("le") {
            format!("{}be", stem)
        } else if let Some(stem) = self.name.strip_suffix("be") {
            format!("{}le", stem)
        } else {
            return None;
        };
        REGISTRY.iter().find(|d| d.name == twin).map(|d| d.format)
    }
}

/// Look up the descriptor for `format`.
pub fn describe(format: PixelFormat) -> Result<&'static PixelFormatDescriptor, NotSupported> {
    REGISTRY
        .binary_search_by_key(&format, |d| d.format)
        .map(|i| &REGISTRY[i])
        .map_err(|_| NotSupported::new("pixel format", format.0))
}

pub fn is_supported_input(format: PixelFormat) -> bool {
    describe(format).map(|d| d.input).unwrap_or(false)
}

pub fn is_supported_output(format: PixelFormat) -> bool {
    describe(format).map(|d| d.output).unwrap_or(false)
}

pub fn supports_endianness_conversion(format: PixelFormat) -> bool {
    describe(format)
        .map(|d| d.byte_swapped().is_some())
        .unwrap_or(false)
}

/// All registered formats, ordered by id.
pub fn formats() -> impl Iterator<Item = &'static PixelFormatDescriptor> {
    REGISTRY.iter()
}

static REGISTRY: Lazy<Vec<PixelFormatDescriptor>> = Lazy::new(|| {
    use ByteOrder::{Big, Little};
    use Channel::{A, B, G, R};

    let mut formats = vec![
        planar_yuv(PixelFormat::YUV420P, "yuv420p", 1, 1, 8, Little, false, false),
        packed_yuv422(PixelFormat::YUYV422, "yuyv422", [0, 1, 3]),
        packed_rgb(PixelFormat::RGB24, "rgb24", &[R, G, B], 8, Little),
        packed_rgb(PixelFormat::BGR24, "bgr24", &[B, G, R], 8, Little),
        planar_yuv(PixelFormat::YUV422P, "yuv422p", 1, 0, 8, Little, false, false),
        planar_yuv(PixelFormat::YUV444P, "yuv444p", 0, 0, 8, Little, false, false),
        planar_yuv(PixelFormat::YUV410P, "yuv410p", 2, 2, 8, Little, false, false),
        planar_yuv(PixelFormat::YUV411P, "yuv411p", 2, 0, 8, Little, false, false),
        gray(PixelFormat::GRAY8, "gray8", 8, Little),
        pal8(),
        planar_yuv(PixelFormat::YUVJ420P, "yuvj420p", 1, 1, 8, Little, false, true),
        planar_yuv(PixelFormat::YUVJ422P, "yuvj422p", 1, 0, 8, Little, false, true),
        planar_yuv(PixelFormat::YUVJ444P, "yuvj444p", 0, 0, 8, Little, false, true),
        packed_yuv422(PixelFormat::UYVY422, "uyvy422", [1, 0, 2]),
        semi_planar(PixelFormat::NV12, "nv12", false),
        semi_planar(PixelFormat::NV21, "nv21", true),
        packed_rgb(PixelFormat::ARGB, "argb", &[A, R, G, B], 8, Little),
        packed_rgb(PixelFormat::RGBA, "rgba", &[R, G, B, A], 8, Little),
        packed_rgb(PixelFormat::ABGR, "abgr", &[A, B, G, R], 8, Little),
        packed_rgb(PixelFormat::BGRA, "bgra", &[B, G, R, A], 8, Little),
        gray(PixelFormat::GRAY16BE, "gray16be", 16, Big),
        gray(PixelFormat::GRAY16LE, "gray16le", 16, Little),
        planar_yuv(PixelFormat::YUV440P, "yuv440p", 0, 1, 8, Little, false, false),
        planar_yuv(PixelFormat::YUVA420P, "yuva420p", 1, 1, 8, Little, true, false),
        packed_rgb(PixelFormat::RGB48BE, "rgb48be", &[R, G, B], 16, Big),
        packed_rgb(PixelFormat::RGB48LE, "rgb48le", &[R, G, B], 16, Little),
        planar_yuv(PixelFormat::YUV444P16LE, "yuv444p16le", 0, 0, 16, Little, false, false),
        planar_yuv(PixelFormat::YUV444P16BE, "yuv444p16be", 0, 0, 16, Big, false, false),
        planar_yuv(PixelFormat::YUV420P10BE, "yuv420p10be", 1, 1, 10, Big, false, false),
        planar_yuv(PixelFormat::YUV420P10LE, "yuv420p10le", 1, 1, 10, Little, false, false),
        gbrp(),
    ];
    formats.sort_by_key(|d| d.format);
    formats
});

fn component(channel: Channel, plane: u8, step: u8, offset: u8, depth: u8) -> ComponentDescriptor {
    ComponentDescriptor {
        channel,
        plane,
        step,
        offset,
        shift: 0,
        depth,
    }
}

fn plane(bits: u8, log2_sub_w: u8, log2_sub_h: u8, byte_order: ByteOrder) -> PlaneDescriptor {
    PlaneDescriptor {
        bits_per_sample: bits,
        log2_sub_w,
        log2_sub_h,
        byte_order,
        palette: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn planar_yuv(
    format: PixelFormat,
    name: &'static str,
    log2_chroma_w: u8,
    log2_chroma_h: u8,
    depth: u8,
    byte_order: ByteOrder,
    alpha: bool,
    full_range: bool,
) -> PixelFormatDescriptor {
    let step = if depth > 8 { 2 } else { 1 };
    let mut planes = vec![
        plane(depth, 0, 0, byte_order),
        plane(depth, log2_chroma_w, log2_chroma_h, byte_order),
        plane(depth, log2_chroma_w, log2_chroma_h, byte_order),
    ];
    let mut components = vec![
        component(Channel::Y, 0, step, 0, depth),
        component(Channel::U, 1, step, 0, depth),
        component(Channel::V, 2, step, 0, depth),
    ];
    if alpha {
        planes.push(plane(depth, 0, 0, byte_order));
        components.push(component(Channel::A, 3, step, 0, depth));
    }
    PixelFormatDescriptor {
        format,
        name,
        family: ColorFamily::Yuv,
        layout: Layout::Planar,
        log2_chroma_w,
        log2_chroma_h,
        planes,
        components,
        full_range,
        input: true,
        output: true,
    }
}

fn semi_planar(format: PixelFormat, name: &'static str, v_first: bool) -> PixelFormatDescriptor {
    let (u_off, v_off) = if v_first { (1, 0) } else { (0, 1) };
    PixelFormatDescriptor {
        format,
        name,
        family: ColorFamily::Yuv,
        layout: Layout::SemiPlanar,
        log2_chroma_w: 1,
        log2_chroma_h: 1,
        planes: vec![plane(8, 0, 0, ByteOrder::Little), plane(8, 1, 1, ByteOrder::Little)],
        components: vec![
            component(Channel::Y, 0, 1, 0, 8),
            component(Channel::U, 1, 2, u_off, 8),
            component(Channel::V, 1, 2, v_off, 8),
        ],
        full_range: false,
        input: true,
        output: true,
    }
}

/// 4:2:2 packed in 4-byte groups; `offsets` are the Y, U and V byte offsets.
fn packed_yuv422(format: PixelFormat, name: &'static str, offsets: [u8; 3]) -> PixelFormatDescriptor {
    PixelFormatDescriptor {
        format,
        name,
        family: ColorFamily::Yuv,
        layout: Layout::Packed,
        log2_chroma_w: 1,
        log2_chroma_h: 0,
        planes: vec![plane(8, 0, 0, ByteOrder::Little)],
        components: vec![
            component(Channel::Y, 0, 2, offsets[0], 8),
            component(Channel::U, 0, 4, offsets[1], 8),
            component(Channel::V, 0, 4, offsets[2], 8),
        ],
        full_range: false,
        input: true,
        output: true,
    }
}

fn packed_rgb(
    format: PixelFormat,
    name: &'static str,
    order: &[Channel],
    depth: u8,
    byte_order: ByteOrder,
) -> PixelFormatDescriptor {
    let bytes: u8 = if depth > 8 { 2 } else { 1 };
    let step = bytes * order.len() as u8;
    PixelFormatDescriptor {
        format,
        name,
        family: ColorFamily::Rgb,
        layout: Layout::Packed,
        log2_chroma_w: 0,
        log2_chroma_h: 0,
        planes: vec![plane(depth, 0, 0, byte_order)],
        components: order
            .iter()
            .enumerate()
            .map(|(i, &ch)| component(ch, 0, step, i as u8 * bytes, depth))
            .collect(),
        full_range: true,
        input: true,
        output: true,
    }
}

fn gray(format: PixelFormat, name: &'static str, depth: u8, byte_order: ByteOrder) -> PixelFormatDescriptor {
    let step = if depth > 8 { 2 } else { 1 };
    PixelFormatDescriptor {
        format,
        name,
        family: ColorFamily::Gray,
        layout: Layout::Planar,
        log2_chroma_w: 0,
        log2_chroma_h: 0,
        planes: vec![plane(depth, 0, 0, byte_order)],
        components: vec![component(Channel::Y, 0, step, 0, depth)],
        full_range: true,
        input: true,
        output: true,
    }
}

fn gbrp() -> PixelFormatDescriptor {
    let le = ByteOrder::Little;
    PixelFormatDescriptor {
        format: PixelFormat::GBRP,
        name: "gbrp",
        family: ColorFamily::Rgb,
        layout: Layout::Planar,
        log2_chroma_w: 0,
        log2_chroma_h: 0,
        planes: vec![plane(8, 0, 0, le), plane(8, 0, 0, le), plane(8, 0, 0, le)],
        components: vec![
            component(Channel::G, 0, 1, 0, 8),
            component(Channel::B, 1, 1, 0, 8),
            component(Channel::R, 2, 1, 0, 8),
        ],
        full_range: true,
        input: true,
        output: true,
    }
}

fn pal8() -> PixelFormatDescriptor {
    let mut palette = plane(32, 0, 0, ByteOrder::Little);
    palette.palette = true;
    PixelFormatDescriptor {
        format: PixelFormat::PAL8,
        name: "pal8",
        family: ColorFamily::Palette,
        layout: Layout::Planar,
        log2_chroma_w: 0,
        log2_chroma_h: 0,
        planes: vec![plane(8, 0, 0, ByteOrder::Little), palette],
        components: vec![component(Channel::Index, 0, 1, 0, 8)],
        full_range: true,
        input: true,
        output: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_and_unknown() {
        let d = describe(PixelFormat::YUV420P).unwrap();
        assert_eq!(d.name, "yuv420p");
        assert_eq!(d.plane_count(), 3);
        assert!(d.is_planar());
        assert_eq!((d.log2_chroma_w, d.log2_chroma_h), (1, 1));

        let err = describe(PixelFormat(9999)).unwrap_err();
        assert_eq!(err.kind, "pixel format");
        assert!(!is_supported_input(PixelFormat(9999)));
        assert!(!is_supported_output(PixelFormat(9999)));
    }

    #[test]
    fn test_registry_sorted_and_unique() {
        let ids: Vec<u32> = formats().map(|d| d.format.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_pal8_is_input_only() {
        assert!(is_supported_input(PixelFormat::PAL8));
        assert!(!is_supported_output(PixelFormat::PAL8));
        let d = describe(PixelFormat::PAL8).unwrap();
        assert_eq!(d.min_row_bytes(1, 17), PALETTE_BYTES);
        assert_eq!(d.plane_height(1, 480), 1);
    }

    #[test]
    fn test_row_bytes() {
        let yuyv = describe(PixelFormat::YUYV422).unwrap();
        assert_eq!(yuyv.min_row_bytes(0, 4), 8);
        assert_eq!(yuyv.min_row_bytes(0, 3), 8);

        let nv12 = describe(PixelFormat::NV12).unwrap();
        assert_eq!(nv12.min_row_bytes(0, 5), 5);
        assert_eq!(nv12.min_row_bytes(1, 5), 6);
        assert_eq!(nv12.plane_height(1, 5), 3);

        let rgb48 = describe(PixelFormat::RGB48LE).unwrap();
        assert_eq!(rgb48.min_row_bytes(0, 10), 60);

        let yuv420 = describe(PixelFormat::YUV420P).unwrap();
        assert_eq!(yuv420.frame_size(4, 4), 16 + 4 + 4);
        assert_eq!(yuv420.frame_size(5, 5), 25 + 9 + 9);
    }

    #[test]
    fn test_endianness_twins() {
        assert!(supports_endianness_conversion(PixelFormat::GRAY16LE));
        assert!(supports_endianness_conversion(PixelFormat::RGB48BE));
        assert!(supports_endianness_conversion(PixelFormat::YUV420P10LE));
        assert!(!supports_endianness_conversion(PixelFormat::RGB24));
        assert!(!supports_endianness_conversion(PixelFormat::GBRP));
        assert_eq!(
            describe(PixelFormat::GRAY16BE).unwrap().byte_swapped(),
            Some(PixelFormat::GRAY16LE)
        );
    }

    #[test]
    fn test_parse_by_name_and_id() {
        assert_eq!("NV12".parse::<PixelFormat>().unwrap(), PixelFormat::NV12);
        assert_eq!("28".parse::<PixelFormat>().unwrap(), PixelFormat::BGRA);
        assert!("yuv999p".parse::<PixelFormat>().is_err());
        assert_eq!(PixelFormat::RGBA.to_string(), "rgba");
        assert_eq!(PixelFormat(4242).to_string(), "#4242");
    }
}
