//! # Conversion Pipeline
//!
//! Drives a [`ConversionContext`] over raw frame streams: input frames are
//! sliced into row bands, each band goes through the engine, and finished
//! destination frames are handed to a [`FrameSink`].
//!
//! ## Architecture
//!
//! 1. **ConvertJob**: owns the context and a pool of destination frames
//! 2. **FrameSink**: destination for finished frames
//! 3. **RawFileSink / PngSink / MemorySink**: the built-in sinks
//!
//! Input is a byte stream of tightly packed frames, planes back to back in
//! plane order. The stream length must be a whole number of frames.
//!
//! ## Example
//!
//! ```rust
//! use sws::config::ScaleConfig;
//! use sws::geometry::{ScaleTarget, Size};
//! use sws::processing::{ConvertJob, MemorySink};
//! use sws_core::PixelFormat;
//!
//! let config = ScaleConfig::new(
//!     PixelFormat::GRAY8,
//!     Size::new(8, 8),
//!     PixelFormat::RGB24,
//!     ScaleTarget::Exact(Size::new(4, 4)),
//! );
//! let mut job = ConvertJob::new(config)?;
//! let input = vec![128u8; job.input_frame_size() * 2];
//!
//! let mut sink = MemorySink::default();
//! let stats = job.run(&input, &mut sink)?;
//! assert_eq!(stats.frames, 2);
//! assert_eq!(sink.frames[0].plane_data(0).len(), 4 * 4 * 3);
//! # Ok::<(), sws::error::SwsError>(())
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{ExtendedColorType, ImageFormat};
use memmap2::Mmap;
use sws_core::frame::slice_band;
use sws_core::{ConversionContext, FrameBuffer, PixelFormat, PixelFormatDescriptor, Plane, ScaleError};
use tracing::{debug, info};

use crate::config::ScaleConfig;
use crate::core::buffer_pool::FramePool;
use crate::error::{SwsError, SwsResult};

/// Destination frames kept for reuse between `convert_frame` calls.
const POOL_FRAMES: usize = 4;

/// Destination for converted frames.
pub trait FrameSink {
    /// Consume one finished frame.
    fn write_frame(&mut self, frame: &FrameBuffer) -> SwsResult<()>;

    /// Flush anything buffered. Called once after the last frame.
    fn finish(&mut self) -> SwsResult<()>;
}

/// Writes frames back to back, planes in order, into one file.
pub struct RawFileSink {
    writer: BufWriter<File>,
    path: PathBuf,
    frames: u64,
}

impl RawFileSink {
    pub fn create(path: impl AsRef<Path>) -> SwsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| SwsError::io(format!("create {}", path.display()), e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            frames: 0,
        })
    }
}

impl FrameSink for RawFileSink {
    fn write_frame(&mut self, frame: &FrameBuffer) -> SwsResult<()> {
        for p in 0..frame.descriptor().plane_count() {
            self.writer
                .write_all(frame.plane_data(p))
                .map_err(|e| SwsError::io(format!("write {}", self.path.display()), e))?;
        }
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> SwsResult<()> {
        self.writer
            .flush()
            .map_err(|e| SwsError::io(format!("flush {}", self.path.display()), e))?;
        debug!(path = %self.path.display(), frames = self.frames, "raw output finished");
        Ok(())
    }
}

/// Encodes each frame as a PNG image.
///
/// A single-frame job writes to `path`; longer jobs write `stem-N.png`
/// next to it, counting from zero.
pub struct PngSink {
    path: PathBuf,
    expected_frames: usize,
    written: usize,
}

impl PngSink {
    /// Fails unless `format` maps onto an 8-bit PNG color type.
    pub fn new(path: impl AsRef<Path>, format: PixelFormat, expected_frames: usize) -> SwsResult<Self> {
        png_color_type(format)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            expected_frames,
            written: 0,
        })
    }

    /// Output path of frame `index`.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        if self.expected_frames <= 1 {
            return self.path.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        self.path.with_file_name(format!("{}-{}.png", stem, index))
    }
}

impl FrameSink for PngSink {
    fn write_frame(&mut self, frame: &FrameBuffer) -> SwsResult<()> {
        let color = png_color_type(frame.format())?;
        let path = self.frame_path(self.written);
        image::save_buffer_with_format(
            &path,
            frame.plane_data(0),
            frame.width() as u32,
            frame.height() as u32,
            color,
            ImageFormat::Png,
        )?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> SwsResult<()> {
        debug!(path = %self.path.display(), frames = self.written, "png output finished");
        Ok(())
    }
}

fn png_color_type(format: PixelFormat) -> SwsResult<ExtendedColorType> {
    match format {
        PixelFormat::RGB24 => Ok(ExtendedColorType::Rgb8),
        PixelFormat::RGBA => Ok(ExtendedColorType::Rgba8),
        PixelFormat::GRAY8 => Ok(ExtendedColorType::L8),
        other => Err(SwsError::validation(
            "dst_format",
            other.to_string(),
            "PNG output supports rgb24, rgba and gray8",
        )
        .with_recovery_suggestion("Convert to rgb24 or write raw output")),
    }
}

/// Keeps converted frames in memory.
#[derive(Default)]
pub struct MemorySink {
    pub frames: Vec<FrameBuffer>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &FrameBuffer) -> SwsResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> SwsResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Summary of a finished job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JobStats {
    pub frames: usize,
    pub src_bytes: usize,
    pub dst_bytes: usize,
    pub elapsed: Duration,
}

impl JobStats {
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// A configured conversion: one context, fed band by band.
pub struct ConvertJob {
    config: ScaleConfig,
    ctx: ConversionContext,
    pool: FramePool,
}

impl ConvertJob {
    pub fn new(config: ScaleConfig) -> SwsResult<Self> {
        let ctx = config.to_context()?;
        let (dst_w, dst_h) = ctx.dst_size();
        let pool = FramePool::new(config.dst_format, dst_w, dst_h, POOL_FRAMES)?;
        info!(
            src = %ctx.src_descriptor().name,
            dst = %ctx.dst_descriptor().name,
            src_size = %config.src_size,
            dst_size = %format!("{}x{}", dst_w, dst_h),
            filter = %ctx.filter_type(),
            "conversion job ready"
        );
        Ok(Self { config, ctx, pool })
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn context(&self) -> &ConversionContext {
        &self.ctx
    }

    /// Bytes of one tightly packed source frame.
    pub fn input_frame_size(&self) -> usize {
        let (w, h) = self.ctx.src_size();
        self.ctx.src_descriptor().frame_size(w, h)
    }

    /// Bytes of one tightly packed destination frame.
    pub fn output_frame_size(&self) -> usize {
        self.pool.frame_size()
    }

    /// Convert one tightly packed source frame.
    pub fn convert_frame(&mut self, input: &[u8]) -> SwsResult<FrameBuffer> {
        let desc = self.ctx.src_descriptor();
        let (src_w, src_h) = self.ctx.src_size();
        let planes = packed_planes(desc, src_w, src_h, input)?;

        let mut out = self.pool.get_frame();
        let mut produced = 0;
        {
            let mut dst = out.planes_mut();
            let mut start = 0;
            while start < src_h {
                let rows = self.config.band_rows.min(src_h - start);
                let band = slice_band(desc, &planes, start, rows);
                produced += self.ctx.scale(&band, start, rows, &mut dst)?;
                start += rows;
            }
        }
        debug!(rows = produced, "frame converted");
        Ok(out)
    }

    /// Hand a frame from `convert_frame` back for reuse.
    pub fn recycle(&self, frame: FrameBuffer) {
        self.pool.return_frame(frame);
    }

    /// Convert every frame in `input` and pass each one to `sink`.
    pub fn run(&mut self, input: &[u8], sink: &mut dyn FrameSink) -> SwsResult<JobStats> {
        let frame_size = self.input_frame_size();
        let frames = count_frames(input.len(), frame_size)?;

        let started = Instant::now();
        for (index, chunk) in input.chunks_exact(frame_size).enumerate() {
            let frame = self
                .convert_frame(chunk)
                .map_err(|e| e.with_metadata("frame", index.to_string()))?;
            sink.write_frame(&frame)?;
            self.recycle(frame);
        }
        sink.finish()?;

        let stats = JobStats {
            frames,
            src_bytes: input.len(),
            dst_bytes: frames * self.output_frame_size(),
            elapsed: started.elapsed(),
        };
        info!(
            frames = stats.frames,
            src_bytes = stats.src_bytes,
            dst_bytes = stats.dst_bytes,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "conversion finished"
        );
        Ok(stats)
    }
}

/// Where `convert_file` writes its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Raw,
    Png,
}

/// Convert a raw frame file into `output`.
pub fn convert_file(
    config: ScaleConfig,
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    kind: OutputKind,
) -> SwsResult<JobStats> {
    let input_path = input_path.as_ref();
    let mut job = ConvertJob::new(config)?;

    let file = File::open(input_path)
        .map_err(|e| SwsError::io(format!("open {}", input_path.display()), e))?;
    let len = file
        .metadata()
        .map_err(|e| SwsError::io(format!("stat {}", input_path.display()), e))?
        .len() as usize;
    let frames = count_frames(len, job.input_frame_size())?;

    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }
        .map_err(|e| SwsError::io(format!("map {}", input_path.display()), e))?;

    let mut sink: Box<dyn FrameSink> = match kind {
        OutputKind::Raw => Box::new(RawFileSink::create(&output_path)?),
        OutputKind::Png => Box::new(PngSink::new(&output_path, job.config().dst_format, frames)?),
    };
    job.run(&mmap[..], sink.as_mut())
}

fn count_frames(len: usize, frame_size: usize) -> SwsResult<usize> {
    if len == 0 || frame_size == 0 || len % frame_size != 0 {
        return Err(SwsError::validation(
            "input",
            format!("{} bytes", len),
            format!("length must be a positive multiple of the frame size ({} bytes)", frame_size),
        )
        .with_recovery_suggestion("Check --src-format and --src-size against the input"));
    }
    Ok(len / frame_size)
}

/// Tight plane views over a frame stored planes back to back.
fn packed_planes<'a>(
    desc: &PixelFormatDescriptor,
    width: usize,
    height: usize,
    bytes: &'a [u8],
) -> Result<Vec<Plane<'a>>, ScaleError> {
    let required = desc.frame_size(width, height);
    if bytes.len() < required {
        return Err(ScaleError::BufferTooSmall {
            plane: 0,
            len: bytes.len(),
            required,
        });
    }
    let mut planes = Vec::with_capacity(desc.plane_count());
    let mut at = 0;
    for p in 0..desc.plane_count() {
        let stride = desc.min_row_bytes(p, width);
        let len = desc.plane_len(p, width, desc.plane_height(p, height), stride);
        planes.push(Plane::new(&bytes[at..at + len], stride));
        at += len;
    }
    Ok(planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ScaleTarget, Size};
    use sws_core::FilterType;

    fn gray_to_rgb(size: u32, out: u32) -> ScaleConfig {
        ScaleConfig::new(
            PixelFormat::GRAY8,
            Size::new(size, size),
            PixelFormat::RGB24,
            ScaleTarget::Exact(Size::new(out, out)),
        )
    }

    #[test]
    fn test_run_rejects_partial_frames() {
        let mut job = ConvertJob::new(gray_to_rgb(8, 4)).unwrap();
        let mut sink = MemorySink::default();
        let input = vec![0u8; job.input_frame_size() + 3];
        let err = job.run(&input, &mut sink).unwrap_err();
        assert_eq!(err.category(), "validation");
        assert!(sink.frames.is_empty());
        assert!(job.run(&[], &mut sink).is_err());
    }

    #[test]
    fn test_banded_job_matches_single_call() {
        let mut config = ScaleConfig::new(
            PixelFormat::YUV420P,
            Size::new(24, 20),
            PixelFormat::RGB24,
            ScaleTarget::Exact(Size::new(15, 31)),
        );
        config.aspect = crate::geometry::AspectMode::Distort;
        config.filter = FilterType::Lanczos;
        config.band_rows = 4;
        let mut banded = ConvertJob::new(config.clone()).unwrap();
        config.band_rows = 20;
        let mut whole = ConvertJob::new(config).unwrap();

        let input: Vec<u8> = (0..banded.input_frame_size())
            .map(|i| (i * 37 % 251) as u8)
            .collect();
        let a = banded.convert_frame(&input).unwrap();
        let b = whole.convert_frame(&input).unwrap();
        assert_eq!(a.into_bytes(), b.into_bytes());
    }

    #[test]
    fn test_memory_sink_receives_every_frame() {
        let mut job = ConvertJob::new(gray_to_rgb(8, 8)).unwrap();
        let frame = job.input_frame_size();
        let mut input = vec![10u8; frame];
        input.extend(vec![200u8; frame]);

        let mut sink = MemorySink::default();
        let stats = job.run(&input, &mut sink).unwrap();
        assert!(sink.finished);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.dst_bytes, 2 * 8 * 8 * 3);
        assert!(sink.frames[0].plane_data(0).iter().all(|&v| v == 10));
        assert!(sink.frames[1].plane_data(0).iter().all(|&v| v == 200));
    }

    #[test]
    fn test_png_sink_paths_and_formats() {
        let single = PngSink::new("out.png", PixelFormat::RGB24, 1).unwrap();
        assert_eq!(single.frame_path(0), PathBuf::from("out.png"));
        let multi = PngSink::new("dir/out.png", PixelFormat::GRAY8, 3).unwrap();
        assert_eq!(multi.frame_path(2), PathBuf::from("dir/out-2.png"));
        assert!(PngSink::new("out.png", PixelFormat::YUV420P, 1).is_err());
    }

    #[test]
    fn test_convert_file_raw_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.gray");
        std::fs::write(&input, vec![64u8; 16 * 16 * 3]).unwrap();

        let raw = dir.path().join("out.rgb");
        let stats = convert_file(gray_to_rgb(16, 8), &input, &raw, OutputKind::Raw).unwrap();
        assert_eq!(stats.frames, 3);
        assert_eq!(std::fs::metadata(&raw).unwrap().len(), 3 * 8 * 8 * 3);

        let png = dir.path().join("out.png");
        convert_file(gray_to_rgb(16, 8), &input, &png, OutputKind::Png).unwrap();
        let decoded = image::open(dir.path().join("out-1.png")).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(3, 3).0, [64, 64, 64]);
    }
}
