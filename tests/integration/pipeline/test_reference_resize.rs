//! Cross-check against fast_image_resize on a plain 8-bit downscale.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType as FirFilter, PixelType, ResizeAlg, ResizeOptions, Resizer};
use sws_core::{ConversionContext, FilterType, FrameBuffer, PixelFormat, Plane};

use crate::common::test_frames::create_ramp_gray;

#[test]
fn test_bilinear_downscale_matches_reference() {
    let (src_w, src_h, dst_w, dst_h) = (64usize, 4usize, 32usize, 4usize);
    let ramp = create_ramp_gray(src_w, src_h, 4);

    let src = Image::from_vec_u8(src_w as u32, src_h as u32, ramp.clone(), PixelType::U8).unwrap();
    let mut reference = Image::new(dst_w as u32, dst_h as u32, PixelType::U8);
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FirFilter::Bilinear));
    Resizer::new().resize(&src, &mut reference, &options).unwrap();

    let mut ctx = ConversionContext::new(
        PixelFormat::GRAY8,
        PixelFormat::GRAY8,
        src_w as u32,
        src_h as u32,
        dst_w as u32,
        dst_h as u32,
        FilterType::Bilinear,
        None,
    )
    .unwrap();
    let mut dst = FrameBuffer::new(PixelFormat::GRAY8, dst_w, dst_h).unwrap();
    ctx.scale_frame(&[Plane::new(&ramp, src_w)], &mut dst.planes_mut())
        .unwrap();

    let ours = dst.plane_data(0);
    let theirs = reference.buffer();
    for y in 0..dst_h {
        // Edge columns differ in how each library extends the border.
        for x in 2..dst_w - 2 {
            let (a, b) = (ours[y * dst_w + x] as i32, theirs[y * dst_w + x] as i32);
            assert!((a - b).abs() <= 1, "({}, {}): {} vs {}", x, y, a, b);
        }
    }
}
