use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use sws::config::ScaleConfig;
use sws::geometry::{AspectMode, ScaleTarget, Size};
use sws::processing::{convert_file, OutputKind};
use sws_core::{
    coefficients_for, fixed_point_coefficients, ColorRange, Colorspace, FilterType, PixelFormat,
};
use tracing::info;

/// Rescale and convert raw video frames between pixel formats.
#[derive(Parser, Debug)]
#[command(name = "sws")]
#[command(version, about = "Rescale raw frames and convert between pixel formats and colorspaces")]
struct Args {
    /// Increase log output (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file of raw frames
    Convert(ConvertArgs),
    /// List registered pixel formats
    Formats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the YUV to RGB matrix for a colorspace
    Coeffs {
        /// bt709, bt601, fcc, smpte170m, smpte240m, bt2020 or a numeric id
        #[arg(default_value = "bt601")]
        colorspace: String,
    },
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Input file: tightly packed frames, planes back to back
    input: PathBuf,

    /// Output file
    output: PathBuf,

    #[arg(long, default_value = "yuv420p", help = "Source pixel format name or id")]
    src_format: String,

    #[arg(long, help = "Source size as WIDTHxHEIGHT")]
    src_size: Size,

    #[arg(long, default_value = "rgb24", help = "Destination pixel format name or id")]
    dst_format: String,

    #[arg(long, conflicts_with = "max_side", help = "Destination size as WIDTHxHEIGHT")]
    dst_size: Option<Size>,

    #[arg(long, help = "Clamp the longest side, keeping the aspect ratio")]
    max_side: Option<u32>,

    #[arg(long, help = "Fit inside --dst-size instead of stretching")]
    keep_aspect: bool,

    #[arg(short, long, default_value = "bicubic",
          help = "fast-bilinear, bilinear, bicubic, x, point, area, bicublin, gauss, sinc, lanczos, spline")]
    filter: String,

    #[arg(long, default_value_t = 16, help = "Source rows per engine call")]
    band_rows: usize,

    #[arg(long, help = "Full-precision filter coefficients")]
    accurate_rnd: bool,

    #[arg(long, default_value = "bt601", help = "YUV matrix")]
    colorspace: String,

    #[arg(long, help = "Source range: limited or full (default from format)")]
    src_range: Option<String>,

    #[arg(long, help = "Destination range: limited or full (default from format)")]
    dst_range: Option<String>,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    brightness: f64,

    #[arg(long, default_value_t = 1.0)]
    contrast: f64,

    #[arg(long, default_value_t = 1.0)]
    saturation: f64,

    /// Encode PNG images instead of raw output
    #[arg(long)]
    png: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Convert(convert) => run_convert(convert),
        Command::Formats { json } => list_formats(json),
        Command::Coeffs { colorspace } => print_coefficients(&colorspace),
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let src_format: PixelFormat = args.src_format.parse()?;
    let dst_format: PixelFormat = args.dst_format.parse()?;
    let target = match (args.dst_size, args.max_side) {
        (Some(size), _) => ScaleTarget::Exact(size),
        (None, Some(side)) => ScaleTarget::MaxLongSide(side),
        (None, None) => ScaleTarget::Exact(args.src_size),
    };

    let mut config = ScaleConfig::new(src_format, args.src_size, dst_format, target);
    config.aspect = if args.keep_aspect || args.max_side.is_some() {
        AspectMode::Preserve
    } else {
        AspectMode::Distort
    };
    config.filter = args.filter.parse::<FilterType>()?;
    config.band_rows = args.band_rows;
    config.accurate_rnd = args.accurate_rnd;
    config.colorspace = args.colorspace.parse::<Colorspace>()?;
    config.src_range = args.src_range.as_deref().map(str::parse::<ColorRange>).transpose()?;
    config.dst_range = args.dst_range.as_deref().map(str::parse::<ColorRange>).transpose()?;
    config.brightness = args.brightness;
    config.contrast = args.contrast;
    config.saturation = args.saturation;

    let kind = if args.png { OutputKind::Png } else { OutputKind::Raw };
    let stats = convert_file(config, &args.input, &args.output, kind)
        .with_context(|| format!("converting {}", args.input.display()))?;

    info!(
        "{} frame(s) written to {} ({:.1} fps)",
        stats.frames,
        args.output.display(),
        stats.frames_per_second()
    );
    Ok(())
}

fn list_formats(json: bool) -> Result<()> {
    let formats: Vec<_> = sws_core::pixfmt::formats().collect();
    if json {
        let entries: Vec<serde_json::Value> = formats
            .iter()
            .map(|d| {
                serde_json::json!({
                    "id": d.format.id(),
                    "name": d.name,
                    "planes": d.plane_count(),
                    "depth": d.max_depth(),
                    "chroma_shift": [d.log2_chroma_w, d.log2_chroma_h],
                    "alpha": d.has_alpha(),
                    "input": d.input,
                    "output": d.output,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:>4}  {:<14} {:>6} {:>5}  {:<6} io", "id", "name", "planes", "depth", "chroma");
    for d in formats {
        let io = match (d.input, d.output) {
            (true, true) => "IO",
            (true, false) => "I.",
            (false, true) => ".O",
            (false, false) => "..",
        };
        println!(
            "{:>4}  {:<14} {:>6} {:>5}  {:<6} {}",
            d.format.id(),
            d.name,
            d.plane_count(),
            d.max_depth(),
            format!("{}:{}", d.log2_chroma_w, d.log2_chroma_h),
            io
        );
    }
    Ok(())
}

fn print_coefficients(name: &str) -> Result<()> {
    let cs: Colorspace = name
        .parse()
        .map_err(|e| anyhow!("{}; try bt709, bt601, fcc, smpte170m, smpte240m or bt2020", e))?;
    let m = coefficients_for(cs);
    println!("{} YUV -> RGB", cs);
    for row in m {
        println!("  [{:>9.6} {:>9.6} {:>9.6}]", row[0], row[1], row[2]);
    }
    let [crv, cbu, cgu, cgv] = fixed_point_coefficients(cs);
    println!("16.16 fixed point: crv={} cbu={} cgu={} cgv={}", crv, cbu, cgu, cgv);
    Ok(())
}
