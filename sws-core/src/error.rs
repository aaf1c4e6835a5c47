// SPDX-License-Identifier: MIT
// Engine error types. Configuration problems surface once at context
// construction; scale errors are per-call contract violations.

use crate::pixfmt::PixelFormat;

/// Registry or table lookup miss. A query-time status, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotSupported {
    pub kind: &'static str,
    pub key: String,
}

impl NotSupported {
    pub fn new(kind: &'static str, key: impl ToString) -> Self {
        Self {
            kind,
            key: key.to_string(),
        }
    }
}

impl std::fmt::Display for NotSupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unsupported {}: {}", self.kind, self.key)
    }
}

impl std::error::Error for NotSupported {}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnsupportedInputFormat(PixelFormat),
    UnsupportedOutputFormat(PixelFormat),
    UnsupportedFilter(u32),
    InvalidDimension { which: &'static str, value: u32 },
    NotSupported(NotSupported),
}

impl From<NotSupported> for ConfigError {
    fn from(e: NotSupported) -> Self {
        Self::NotSupported(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnsupportedInputFormat(p) => {
                write!(f, "Pixel format {} is not supported as input", p)
            }
            ConfigError::UnsupportedOutputFormat(p) => {
                write!(f, "Pixel format {} is not supported as output", p)
            }
            ConfigError::UnsupportedFilter(flags) => {
                write!(f, "Flags {:#x} do not select exactly one supported filter", flags)
            }
            ConfigError::InvalidDimension { which, value } => {
                write!(f, "Invalid {}: {}", which, value)
            }
            ConfigError::NotSupported(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::NotSupported(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleError {
    /// A plane stride is smaller than the bytes one row of that plane needs.
    MismatchedStrides {
        plane: usize,
        stride: usize,
        min: usize,
    },
    /// `start + rows` exceeds the configured source height, or the band is empty.
    OutOfBounds {
        start: usize,
        rows: usize,
        height: usize,
    },
    PlaneCount {
        expected: usize,
        got: usize,
    },
    BufferTooSmall {
        plane: usize,
        len: usize,
        required: usize,
    },
    /// Bands must arrive top to bottom; a band starting at row 0 begins a new frame.
    SliceOrder {
        expected: usize,
        got: usize,
    },
    /// Band start and length must be multiples of the vertical chroma subsampling.
    UnalignedSlice {
        start: usize,
        rows: usize,
        align: usize,
    },
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::MismatchedStrides { plane, stride, min } => write!(
                f,
                "Stride {} of plane {} is below the minimum row size {}",
                stride, plane, min
            ),
            ScaleError::OutOfBounds {
                start,
                rows,
                height,
            } => write!(
                f,
                "Rows {}..{} are outside the source height {}",
                start,
                start + rows,
                height
            ),
            ScaleError::PlaneCount { expected, got } => {
                write!(f, "Expected {} planes, got {}", expected, got)
            }
            ScaleError::BufferTooSmall {
                plane,
                len,
                required,
            } => write!(
                f,
                "Plane {} buffer too small: {} < {} bytes",
                plane, len, required
            ),
            ScaleError::SliceOrder { expected, got } => write!(
                f,
                "Slice starts at row {} but row {} was expected",
                got, expected
            ),
            ScaleError::UnalignedSlice { start, rows, align } => write!(
                f,
                "Slice {}+{} is not aligned to {} rows",
                start, rows, align
            ),
        }
    }
}

impl std::error::Error for ScaleError {}
