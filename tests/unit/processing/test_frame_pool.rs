//! Unit tests for FramePool under concurrent use.

use std::sync::Arc;
use std::thread;

use sws::core::buffer_pool::FramePool;
use sws_core::PixelFormat;

#[test]
fn test_pool_shared_across_threads() {
    let pool = Arc::new(FramePool::new(PixelFormat::NV12, 32, 16, 4).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut frame = pool.get_frame();
                frame.plane_data_mut(0).fill(i as u8);
                pool.return_frame(frame);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let (available, max) = pool.stats();
    assert!(available >= 1 && available <= max);
    assert!(pool.get_frame().plane_data(0).iter().all(|&b| b == 0));
}

#[test]
fn test_pool_frame_geometry() {
    let pool = FramePool::new(PixelFormat::YUYV422, 10, 4, 1).unwrap();
    let frame = pool.get_frame();
    assert_eq!(frame.plane_data(0).len(), 10 * 2 * 4);
    assert_eq!(pool.frame_size(), 80);
}
