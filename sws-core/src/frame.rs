// SPDX-License-Identifier: MIT
// Borrowed plane views handed to the scaler, plus an owned tightly packed
// frame for callers that do not manage their own memory.

use crate::error::{NotSupported, ScaleError};
use crate::pixfmt::{describe, PixelFormat, PixelFormatDescriptor};

/// Upper bound on planes per frame.
pub const MAX_PLANES: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }
}

#[derive(Debug)]
pub struct PlaneMut<'a> {
    pub data: &'a mut [u8],
    pub stride: usize,
}

impl<'a> PlaneMut<'a> {
    pub fn new(data: &'a mut [u8], stride: usize) -> Self {
        Self { data, stride }
    }
}

/// Plane views for source rows `start..start + rows` of a full frame.
///
/// `start` must be aligned to the vertical chroma subsampling; palette planes
/// are passed through whole.
pub fn slice_band<'a>(
    desc: &PixelFormatDescriptor,
    planes: &[Plane<'a>],
    start: usize,
    rows: usize,
) -> Vec<Plane<'a>> {
    planes
        .iter()
        .enumerate()
        .map(|(p, plane)| {
            let Some(pd) = desc.planes.get(p) else {
                return *plane;
            };
            if pd.palette {
                return *plane;
            }
            let first = start >> pd.log2_sub_h;
            let end = crate::pixfmt::ceil_rshift(start + rows, pd.log2_sub_h);
            let from = (first * plane.stride).min(plane.data.len());
            let to = (end * plane.stride).min(plane.data.len()).max(from);
            Plane::new(&plane.data[from..to], plane.stride)
        })
        .collect()
}

/// Owned frame: one tightly packed buffer per plane.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    desc: &'static PixelFormatDescriptor,
    width: usize,
    height: usize,
    strides: Vec<usize>,
    planes: Vec<Vec<u8>>,
}

impl FrameBuffer {
    /// Zero-filled frame.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Result<Self, NotSupported> {
        Ok(Self::with_descriptor(describe(format)?, width, height))
    }

    pub fn with_descriptor(desc: &'static PixelFormatDescriptor, width: usize, height: usize) -> Self {
        let strides: Vec<usize> = (0..desc.plane_count())
            .map(|p| desc.min_row_bytes(p, width))
            .collect();
        let planes = strides
            .iter()
            .enumerate()
            .map(|(p, &stride)| vec![0u8; desc.plane_len(p, width, desc.plane_height(p, height), stride)])
            .collect();
        Self {
            desc,
            width,
            height,
            strides,
            planes,
        }
    }

    /// Split a tightly packed frame (planes back to back) into its planes.
    pub fn from_bytes(
        desc: &'static PixelFormatDescriptor,
        width: usize,
        height: usize,
        bytes: &[u8],
    ) -> Result<Self, ScaleError> {
        let mut frame = Self::with_descriptor(desc, width, height);
        let required = desc.frame_size(width, height);
        if bytes.len() < required {
            return Err(ScaleError::BufferTooSmall {
                plane: 0,
                len: bytes.len(),
                required,
            });
        }
        let mut at = 0;
        for plane in frame.planes.iter_mut() {
            let len = plane.len();
            plane.copy_from_slice(&bytes[at..at + len]);
            at += len;
        }
        Ok(frame)
    }

    /// Planes concatenated in order.
    pub fn into_bytes(self) -> Vec<u8> {
        self.planes.concat()
    }

    pub fn descriptor(&self) -> &'static PixelFormatDescriptor {
        self.desc
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self, plane: usize) -> usize {
        self.strides[plane]
    }

    pub fn plane_data(&self, plane: usize) -> &[u8] {
        &self.planes[plane]
    }

    pub fn plane_data_mut(&mut self, plane: usize) -> &mut [u8] {
        &mut self.planes[plane]
    }

    pub fn planes(&self) -> Vec<Plane<'_>> {
        self.planes
            .iter()
            .zip(&self.strides)
            .map(|(data, &stride)| Plane::new(data, stride))
            .collect()
    }

    pub fn planes_mut(&mut self) -> Vec<PlaneMut<'_>> {
        self.planes
            .iter_mut()
            .zip(&self.strides)
            .map(|(data, &stride)| PlaneMut::new(data, stride))
            .collect()
    }

    /// Views of rows `start..start + rows`, ready to pass as a scaler band.
    pub fn band(&self, start: usize, rows: usize) -> Vec<Plane<'_>> {
        slice_band(self.desc, &self.planes(), start, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv420p_plane_sizes() {
        let frame = FrameBuffer::new(PixelFormat::YUV420P, 5, 3).unwrap();
        assert_eq!(frame.plane_data(0).len(), 15);
        assert_eq!(frame.plane_data(1).len(), 6);
        assert_eq!(frame.plane_data(2).len(), 6);
        assert_eq!(frame.stride(1), 3);
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let desc = describe(PixelFormat::NV12).unwrap();
        let bytes: Vec<u8> = (0..desc.frame_size(4, 4)).map(|i| i as u8).collect();
        let frame = FrameBuffer::from_bytes(desc, 4, 4, &bytes).unwrap();
        assert_eq!(frame.plane_data(1)[0], 16);
        assert_eq!(frame.into_bytes(), bytes);

        assert!(FrameBuffer::from_bytes(desc, 4, 4, &bytes[..10]).is_err());
    }

    #[test]
    fn test_band_follows_subsampling() {
        let frame = FrameBuffer::new(PixelFormat::YUV420P, 4, 6).unwrap();
        let band = frame.band(2, 4);
        assert_eq!(band[0].data.len(), 16);
        assert_eq!(band[1].data.len(), 4);

        let pal = FrameBuffer::new(PixelFormat::PAL8, 4, 6).unwrap();
        let band = pal.band(2, 2);
        assert_eq!(band[0].data.len(), 8);
        assert_eq!(band[1].data.len(), crate::pixfmt::PALETTE_BYTES);
    }
}
