//! Frame replay
//!
//! Builds a voxel map from every point chunk of a dataset, then casts one
//! frame from a camera pose and reports what the rays hit.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin frame_replay -- --config voxray.toml --pose pose.txt \
//!     --depth-out depth.pgm
//! ```

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use voxray::{AllValid, MappingSession, RaycastFrame, VoxrayConfig};
use voxray_core::CameraPose;
use voxray_io::load_pose;

/// Integrate a point-cloud dataset and replay one camera frame against it
#[derive(Parser, Debug)]
#[command(name = "frame_replay")]
#[command(about = "Integrate point chunks and cast one camera frame", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Camera pose file (16 numbers, row-major 4x4); identity when omitted
    #[arg(short, long)]
    pose: Option<PathBuf>,

    /// Cast the whole sensor instead of the configured region
    #[arg(long)]
    full_frame: bool,

    /// Write the depth image as an 8-bit PGM
    #[arg(long)]
    depth_out: Option<PathBuf>,

    /// Re-encode the loaded ray table as a binary artifact
    #[arg(long)]
    export_lut: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = VoxrayConfig::load(&args.config)?;
    let mut session = MappingSession::from_config(&config)?;

    if let Some(path) = &args.export_lut {
        session.ray_lut().save(path)?;
        info!("wrote ray table to {}", path.display());
    }

    let start = Instant::now();
    let report = session.integrate_dataset()?;
    let stats = session.map().stats();
    info!(
        "map ready in {:.2} s: {} points -> {} voxels ({} of {} shards used, largest {})",
        start.elapsed().as_secs_f64(),
        report.integrated,
        stats.voxels,
        stats.occupied_shards,
        stats.shards,
        stats.largest_shard
    );

    let pose = match &args.pose {
        Some(path) => load_pose(path)?,
        None => CameraPose::IDENTITY,
    };
    let region = if args.full_frame {
        voxray::PixelRegion::full(config.sensor.rows, config.sensor.cols)
    } else {
        session.region()
    };

    let frame = session.cast_frame(&pose, region, &AllValid)?;
    summarize(&frame);

    if let Some(path) = &args.depth_out {
        write_depth_pgm(path, &frame, config.raycast.max_range)?;
        info!("wrote depth image to {}", path.display());
    }

    Ok(())
}

fn summarize(frame: &RaycastFrame) {
    let mut labels = std::collections::BTreeMap::new();
    for (_, voxel) in frame.hit_voxels() {
        if let Some(label) = voxel.label() {
            *labels.entry(label).or_insert(0usize) += 1;
        }
    }

    info!(
        "frame {}x{}: {} hits, {} misses, {} skipped",
        frame.region.height(),
        frame.region.width(),
        frame.hits,
        frame.cast() - frame.hits,
        frame.skipped
    );
    for (label, count) in labels {
        info!("  label {:>5}: {} pixels", label, count);
    }
}

fn write_depth_pgm(path: &Path, frame: &RaycastFrame, max_range: f64) -> std::io::Result<()> {
    let depth = frame.depth_bytes(max_range);
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P5\n{} {}\n255\n", depth.cols(), depth.rows())?;
    out.write_all(depth.as_slice())?;
    out.flush()
}
