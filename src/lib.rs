//! # sws: Raw Frame Rescaling and Format Conversion
//!
//! Command-line oriented layer over the `sws-core` engine: validated job
//! configuration, output size planning, frame streaming through the engine
//! and output sinks.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `config`: Job configuration and validation
//! - `geometry`: Output size planning (exact, fit-inside, longest side)
//! - `core`: Reusable destination frame pool
//! - `processing`: Conversion jobs and frame sinks
//! - `error`: Error types with context and recovery suggestions
//!
//! ## Example
//!
//! ```rust
//! use sws::config::ScaleConfig;
//! use sws::geometry::{ScaleTarget, Size};
//! use sws_core::PixelFormat;
//!
//! let config = ScaleConfig::new(
//!     PixelFormat::YUV420P,
//!     Size::new(64, 48),
//!     PixelFormat::RGBA,
//!     ScaleTarget::MaxLongSide(32),
//! );
//! let input = vec![128u8; 64 * 48 * 3 / 2];
//! let output = sws::convert_bytes(config, &input)?;
//! assert_eq!(output.len(), 32 * 24 * 4);
//! # Ok::<(), sws::SwsError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod geometry;
pub mod processing;

pub use config::ScaleConfig;
pub use error::{
    ErrorSeverity, HasRecoverySuggestion, HasSeverity, Recoverable, RecoveryStrategy, SwsError,
    SwsResult,
};
pub use geometry::{AspectMode, ScaleTarget, Size};
pub use processing::{convert_file, ConvertJob, FrameSink, JobStats, OutputKind};

/// Convert a buffer of tightly packed frames and return the converted frames
/// back to back.
pub fn convert_bytes(config: ScaleConfig, input: &[u8]) -> SwsResult<Vec<u8>> {
    let mut job = ConvertJob::new(config)?;
    let mut sink = processing::MemorySink::default();
    job.run(input, &mut sink)?;
    Ok(sink
        .frames
        .into_iter()
        .flat_map(|frame| frame.into_bytes())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sws_core::PixelFormat;

    #[test]
    fn test_convert_bytes_identity() {
        let config = ScaleConfig::new(
            PixelFormat::BGRA,
            Size::new(5, 3),
            PixelFormat::BGRA,
            ScaleTarget::Exact(Size::new(5, 3)),
        );
        let input: Vec<u8> = (0..5 * 3 * 4).map(|i| (i * 13) as u8).collect();
        let output = convert_bytes(config, &input).unwrap();
        assert_eq!(output.len(), input.len());
        for (a, b) in input.iter().zip(&output) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_convert_bytes_rejects_bad_config() {
        let mut config = ScaleConfig::default();
        config.band_rows = 0;
        let err = convert_bytes(config, &[0u8; 16]).unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
