//! Voxdet Application
//!
//! Command-line front end for the LIDAR training-data pipeline.
//!
//! Commands:
//! - `frame`: process one point cloud with optional labels and calibration
//! - `dataset`: process every frame of a KITTI-style directory

mod errors;
mod export;

use clap::{Args, Parser, Subcommand};
use errors::AppError;
use std::path::PathBuf;
use tracing::info;
use voxdet_data::{KittiLayout, LabelFormat, LabelFrame, PointCloudFormat};
use voxdet_train::{FailurePolicy, FrameSource, PipelineConfig, process, process_dataset};

/// Voxdet - voxel grids and detection targets from LIDAR scans
#[derive(Parser, Debug)]
#[command(name = "voxdet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a single frame
    Frame(FrameArgs),
    /// Process every frame under a KITTI directory (velodyne/, label_2/, calib/)
    Dataset(DatasetArgs),
}

/// Options shared by both commands.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// JSON pipeline configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Voxel edge length in metres
    #[arg(short, long)]
    resolution: Option<f32>,

    /// Object classes to keep (repeatable)
    #[arg(long = "class")]
    classes: Vec<String>,
}

impl PipelineArgs {
    fn load(&self) -> Result<PipelineConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_path(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(resolution) = self.resolution {
            config.voxel.resolution = resolution;
        }
        if !self.classes.is_empty() {
            config.labels.filter.classes = self.classes.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Point cloud file
    #[arg(long)]
    cloud: PathBuf,

    /// Label file
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Calibration file
    #[arg(long)]
    calib: Option<PathBuf>,

    /// Point cloud format (bin, pcd, ply); guessed from the extension if omitted
    #[arg(long)]
    format: Option<PointCloudFormat>,

    /// Label format (kitti, tracklet)
    #[arg(long, default_value = "kitti")]
    label_format: LabelFormat,

    /// Labels are already in the sensor frame
    #[arg(long)]
    sensor_frame: bool,

    /// Write summary and targets as JSON
    #[arg(long)]
    export: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Dataset root
    #[arg(long)]
    root: PathBuf,

    /// Stop at the first failing frame instead of skipping it
    #[arg(long)]
    fail_fast: bool,

    /// Directory for one JSON export per frame
    #[arg(long)]
    export_dir: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Frame(args) => run_frame(args),
        Command::Dataset(args) => run_dataset(args),
    };
    if let Err(e) = result {
        eprintln!("voxdet error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

fn run_frame(args: FrameArgs) -> Result<(), AppError> {
    let config = args.pipeline.load()?;
    let format = match args.format {
        Some(format) => format,
        None => PointCloudFormat::from_path(&args.cloud).ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "cannot infer point cloud format of {}; pass --format",
                args.cloud.display()
            ))
        })?,
    };
    let frame = if args.sensor_frame {
        LabelFrame::Sensor
    } else {
        LabelFrame::Camera
    };

    let mut source = FrameSource::new(&args.cloud, format);
    if let Some(labels) = &args.labels {
        source = source.with_labels(labels, args.label_format, frame);
    }
    if let Some(calib) = &args.calib {
        source = source.with_calibration(calib);
    }

    let sample = process(&source, &config)?;
    println!("{}", serde_json::to_string_pretty(&sample.summary())?);

    if let Some(path) = &args.export {
        let id = args
            .cloud
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        export::write_frame(path, id, &sample)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_dataset(args: DatasetArgs) -> Result<(), AppError> {
    let config = args.pipeline.load()?;
    let layout = KittiLayout::open(&args.root)?;
    let policy = if args.fail_fast {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Skip
    };
    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir)?;
    }

    let report = process_dataset(&layout, &config, policy, |files, sample| {
        let summary = sample.summary();
        println!(
            "{}: {} occupied voxels, {} boxes, {} positive cells",
            files.id, summary.occupied_voxels, summary.boxes, summary.positive_cells
        );
        if let Some(dir) = &args.export_dir {
            let path = dir.join(format!("{}.json", files.id));
            export::write_frame(&path, &files.id, &sample)?;
        }
        Ok(())
    })?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
