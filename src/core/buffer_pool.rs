//! # Frame Pool
//!
//! Reusable destination frames for multi-frame jobs. Converting a stream of
//! frames allocates one destination frame per frame unless the frames are
//! handed back; the pool keeps up to `max_frames` of them for reuse.
//!
//! ## Example
//!
//! ```rust
//! use sws::core::buffer_pool::FramePool;
//! use sws_core::PixelFormat;
//!
//! let pool = FramePool::new(PixelFormat::RGB24, 64, 48, 2)?;
//! let frame = pool.get_frame();
//! assert_eq!(frame.plane_data(0).len(), 64 * 48 * 3);
//! pool.return_frame(frame);
//! assert_eq!(pool.stats(), (1, 2));
//! # Ok::<(), sws_core::NotSupported>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use sws_core::{describe, FrameBuffer, NotSupported, PixelFormat, PixelFormatDescriptor};

/// Bounded pool of same-geometry frames.
#[derive(Debug)]
pub struct FramePool {
    frames: Mutex<VecDeque<FrameBuffer>>,
    desc: &'static PixelFormatDescriptor,
    width: usize,
    height: usize,
    max_frames: usize,
}

impl FramePool {
    pub fn new(
        format: PixelFormat,
        width: usize,
        height: usize,
        max_frames: usize,
    ) -> Result<Self, NotSupported> {
        Ok(Self {
            frames: Mutex::new(VecDeque::with_capacity(max_frames)),
            desc: describe(format)?,
            width,
            height,
            max_frames,
        })
    }

    /// A pooled frame, or a freshly zeroed one when the pool is empty.
    pub fn get_frame(&self) -> FrameBuffer {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        frames
            .pop_front()
            .unwrap_or_else(|| FrameBuffer::with_descriptor(self.desc, self.width, self.height))
    }

    /// Hand a frame back. Frames of another geometry, or beyond capacity, are dropped.
    pub fn return_frame(&self, mut frame: FrameBuffer) {
        if frame.format() != self.desc.format
            || frame.width() != self.width
            || frame.height() != self.height
        {
            return;
        }
        for p in 0..self.desc.plane_count() {
            frame.plane_data_mut(p).fill(0);
        }

        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        if frames.len() < self.max_frames {
            frames.push_back(frame);
        }
    }

    /// `(available, max)` frame counts.
    pub fn stats(&self) -> (usize, usize) {
        let frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        (frames.len(), self.max_frames)
    }

    /// Bytes of one frame when planes are stored back to back.
    pub fn frame_size(&self) -> usize {
        self.desc.frame_size(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pool_basic() {
        let pool = FramePool::new(PixelFormat::YUV420P, 16, 16, 3).unwrap();

        let frame = pool.get_frame();
        assert_eq!(frame.plane_data(1).len(), 64);
        pool.return_frame(frame);

        let frame = pool.get_frame();
        assert_eq!(frame.width(), 16);
        let (available, max) = pool.stats();
        assert_eq!(available, 0);
        assert_eq!(max, 3);
        assert_eq!(pool.frame_size(), 16 * 16 * 3 / 2);
    }

    #[test]
    fn test_frame_pool_overflow() {
        let pool = FramePool::new(PixelFormat::GRAY8, 8, 8, 2).unwrap();

        let frames: Vec<_> = (0..3).map(|_| pool.get_frame()).collect();
        for frame in frames {
            pool.return_frame(frame);
        }
        assert_eq!(pool.stats().0, 2);
    }

    #[test]
    fn test_returned_frames_are_cleared_and_checked() {
        let pool = FramePool::new(PixelFormat::GRAY8, 4, 4, 2).unwrap();
        let mut frame = pool.get_frame();
        frame.plane_data_mut(0).fill(7);
        pool.return_frame(frame);
        assert!(pool.get_frame().plane_data(0).iter().all(|&b| b == 0));

        let other = FrameBuffer::new(PixelFormat::GRAY8, 5, 4).unwrap();
        pool.return_frame(other);
        assert_eq!(pool.stats().0, 0);
    }

    #[test]
    fn test_unknown_format() {
        assert!(FramePool::new(PixelFormat(777), 4, 4, 1).is_err());
    }
}
