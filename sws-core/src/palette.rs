// SPDX-License-Identifier: MIT
// 8-bit palette expansion into packed 32-bit and 24-bit pixels.
// Palette entries are 4 bytes each (B, G, R, A in memory), 256 entries.

use crate::error::ScaleError;
use crate::pixfmt::PALETTE_BYTES;

/// Expand `pixel_count` palette indices into 4-byte pixels written to `dst`.
pub fn palette8_to_packed32(
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
    palette: &[u8],
) -> Result<(), ScaleError> {
    check_lengths(src, dst, pixel_count, palette, 4)?;
    for (&idx, out) in src[..pixel_count].iter().zip(dst.chunks_exact_mut(4)) {
        let at = idx as usize * 4;
        out.copy_from_slice(&palette[at..at + 4]);
    }
    Ok(())
}

/// Expand `pixel_count` palette indices into 3-byte pixels (first three bytes of each entry).
pub fn palette8_to_packed24(
    src: &[u8],
    dst: &mut [u8],
    pixel_count: usize,
    palette: &[u8],
) -> Result<(), ScaleError> {
    check_lengths(src, dst, pixel_count, palette, 3)?;
    for (&idx, out) in src[..pixel_count].iter().zip(dst.chunks_exact_mut(3)) {
        let at = idx as usize * 4;
        out.copy_from_slice(&palette[at..at + 3]);
    }
    Ok(())
}

fn check_lengths(
    src: &[u8],
    dst: &[u8],
    pixel_count: usize,
    palette: &[u8],
    bytes_per_pixel: usize,
) -> Result<(), ScaleError> {
    if src.len() < pixel_count {
        return Err(ScaleError::BufferTooSmall {
            plane: 0,
            len: src.len(),
            required: pixel_count,
        });
    }
    if palette.len() < PALETTE_BYTES {
        return Err(ScaleError::BufferTooSmall {
            plane: 1,
            len: palette.len(),
            required: PALETTE_BYTES,
        });
    }
    let required = pixel_count * bytes_per_pixel;
    if dst.len() < required {
        return Err(ScaleError::BufferTooSmall {
            plane: 0,
            len: dst.len(),
            required,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_palette_gives_zeros() {
        let palette = vec![0u8; PALETTE_BYTES];
        let src: Vec<u8> = (0..=255).collect();
        let mut dst = vec![0xAAu8; 256 * 4];
        palette8_to_packed32(&src, &mut dst, 256, &palette).unwrap();
        assert!(dst.iter().all(|&b| b == 0));

        let mut dst24 = vec![0xAAu8; 256 * 3];
        palette8_to_packed24(&src, &mut dst24, 256, &palette).unwrap();
        assert!(dst24.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_single_entry_fill() {
        let mut palette = vec![0u8; PALETTE_BYTES];
        palette[..4].copy_from_slice(&[10, 20, 30, 255]);
        let src = vec![0u8; 9];
        let mut dst = vec![0u8; 36];
        palette8_to_packed32(&src, &mut dst, 9, &palette).unwrap();
        for px in dst.chunks_exact(4) {
            assert_eq!(px, &[10, 20, 30, 255]);
        }

        let mut dst24 = vec![0u8; 27];
        palette8_to_packed24(&src, &mut dst24, 9, &palette).unwrap();
        for px in dst24.chunks_exact(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
    }

    #[test]
    fn test_only_pixel_count_is_written() {
        let mut palette = vec![0u8; PALETTE_BYTES];
        palette[4..8].copy_from_slice(&[1, 2, 3, 4]);
        let src = [1u8, 1, 1, 1];
        let mut dst = vec![9u8; 16];
        palette8_to_packed32(&src, &mut dst, 2, &palette).unwrap();
        assert_eq!(&dst[..8], &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert!(dst[8..].iter().all(|&b| b == 9));
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let palette = vec![0u8; PALETTE_BYTES];
        let mut dst = vec![0u8; 7];
        let err = palette8_to_packed32(&[0, 0], &mut dst, 2, &palette).unwrap_err();
        assert_eq!(
            err,
            ScaleError::BufferTooSmall {
                plane: 0,
                len: 7,
                required: 8
            }
        );
        assert!(dst.iter().all(|&b| b == 0));

        let short_palette = vec![0u8; 16];
        let mut dst = vec![0u8; 8];
        assert!(palette8_to_packed32(&[0, 0], &mut dst, 2, &short_palette).is_err());
    }
}
