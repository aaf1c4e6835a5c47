/// Conversion throughput benchmark.
///
/// Runs a fixed set of format/size pairs through the engine and reports
/// per-frame time and throughput. Frames come from the job's pool, so the
/// steady state measures conversion only.
use std::time::{Duration, Instant};

use clap::Parser;
use sws::config::ScaleConfig;
use sws::geometry::{AspectMode, ScaleTarget, Size};
use sws::processing::ConvertJob;
use sws_core::{FilterType, PixelFormat};

#[derive(Parser, Debug)]
#[command(name = "benchmark", about = "Measure conversion throughput")]
struct Args {
    /// Frames per case
    #[arg(short, long, default_value_t = 60)]
    frames: usize,

    /// Resampling filter for every case
    #[arg(long, default_value = "bicubic")]
    filter: FilterType,

    /// Source rows per engine call
    #[arg(long, default_value_t = 16)]
    band_rows: usize,
}

struct Case {
    name: &'static str,
    src: PixelFormat,
    src_size: Size,
    dst: PixelFormat,
    dst_size: Size,
}

const CASES: &[Case] = &[
    Case {
        name: "1080p yuv420p -> rgb24",
        src: PixelFormat::YUV420P,
        src_size: Size { w: 1920, h: 1080 },
        dst: PixelFormat::RGB24,
        dst_size: Size { w: 1920, h: 1080 },
    },
    Case {
        name: "1080p yuv420p -> 720p yuv420p",
        src: PixelFormat::YUV420P,
        src_size: Size { w: 1920, h: 1080 },
        dst: PixelFormat::YUV420P,
        dst_size: Size { w: 1280, h: 720 },
    },
    Case {
        name: "1080p bgra -> 540p nv12",
        src: PixelFormat::BGRA,
        src_size: Size { w: 1920, h: 1080 },
        dst: PixelFormat::NV12,
        dst_size: Size { w: 960, h: 540 },
    },
    Case {
        name: "720p rgb24 -> 1080p rgba",
        src: PixelFormat::RGB24,
        src_size: Size { w: 1280, h: 720 },
        dst: PixelFormat::RGBA,
        dst_size: Size { w: 1920, h: 1080 },
    },
];

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Conversion Throughput Benchmark");
    println!("═══════════════════════════════════");
    println!("{}", sws_core::configuration());
    println!(
        "filter: {}, band rows: {}, frames per case: {}",
        args.filter, args.band_rows, args.frames
    );
    println!();

    for case in CASES {
        let mut config = ScaleConfig::new(case.src, case.src_size, case.dst, ScaleTarget::Exact(case.dst_size));
        config.aspect = AspectMode::Distort;
        config.filter = args.filter;
        config.band_rows = args.band_rows;
        let mut job = ConvertJob::new(config)?;

        let input: Vec<u8> = (0..job.input_frame_size()).map(|i| (i * 31 % 256) as u8).collect();
        let warmup = job.convert_frame(&input)?;
        job.recycle(warmup);

        let mut total = Duration::ZERO;
        for _ in 0..args.frames {
            let started = Instant::now();
            let frame = job.convert_frame(&input)?;
            total += started.elapsed();
            job.recycle(frame);
        }

        let per_frame = total.as_secs_f64() / args.frames.max(1) as f64;
        let megapixels = (case.dst_size.w * case.dst_size.h) as f64 / 1_000_000.0;
        println!("{}", case.name);
        println!("───────────");
        println!("  {:.2} ms per frame", per_frame * 1000.0);
        println!("  {:.1} fps", if per_frame > 0.0 { 1.0 / per_frame } else { 0.0 });
        println!(
            "  {:.1} output MP/s",
            if per_frame > 0.0 { megapixels / per_frame } else { 0.0 }
        );
        println!();
    }
    Ok(())
}
