//! # Processing Module
//!
//! Conversion jobs over raw frame streams and the sinks they write to.

pub mod processing;

pub use processing::{
    convert_file, ConvertJob, FrameSink, JobStats, MemorySink, OutputKind, PngSink, RawFileSink,
};
