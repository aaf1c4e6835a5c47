//! Common test utilities shared by the unit and integration suites.
#![allow(dead_code)]

/// Frame generators in arbitrary pixel formats.
pub mod test_frames {
    use sws_core::{FrameBuffer, PixelFormat};

    /// Every plane filled with a deterministic byte ramp.
    pub fn create_pattern_frame(format: PixelFormat, w: usize, h: usize) -> FrameBuffer {
        let mut frame = FrameBuffer::new(format, w, h).expect("registered format");
        for p in 0..frame.descriptor().plane_count() {
            for (i, b) in frame.plane_data_mut(p).iter_mut().enumerate() {
                *b = ((i * 7 + p * 31) % 200 + 20) as u8;
            }
        }
        frame
    }

    /// Packed pixels all set to `pixel`.
    pub fn create_solid_frame(format: PixelFormat, w: usize, h: usize, pixel: &[u8]) -> FrameBuffer {
        let mut frame = FrameBuffer::new(format, w, h).expect("registered format");
        frame
            .plane_data_mut(0)
            .chunks_exact_mut(pixel.len())
            .for_each(|px| px.copy_from_slice(pixel));
        frame
    }

    /// Planar YUV frame with constant Y, U and V planes.
    pub fn create_yuv_frame(format: PixelFormat, w: usize, h: usize, yuv: [u8; 3]) -> FrameBuffer {
        let mut frame = FrameBuffer::new(format, w, h).expect("registered format");
        for (p, value) in yuv.into_iter().enumerate() {
            frame.plane_data_mut(p).fill(value);
        }
        frame
    }

    /// 8-bit horizontal ramp: each row is `x * step`.
    pub fn create_ramp_gray(w: usize, h: usize, step: usize) -> Vec<u8> {
        (0..h)
            .flat_map(|_| (0..w).map(move |x| (x * step).min(255) as u8))
            .collect()
    }
}

/// Custom assertions for testing
pub mod assertions {
    /// Assert that two byte buffers differ by at most `tolerance` per sample.
    pub fn assert_bytes_within(left: &[u8], right: &[u8], tolerance: i32) {
        assert_eq!(left.len(), right.len(), "buffer length mismatch");
        for (i, (a, b)) in left.iter().zip(right).enumerate() {
            let diff = (*a as i32 - *b as i32).abs();
            assert!(
                diff <= tolerance,
                "sample {} differs by {} ({} vs {})",
                i,
                diff,
                a,
                b
            );
        }
    }

    /// Assert that every sample of `data` equals `value`.
    pub fn assert_all_equal(data: &[u8], value: u8) {
        if let Some(pos) = data.iter().position(|&v| v != value) {
            panic!("sample {} is {}, expected {}", pos, data[pos], value);
        }
    }
}
