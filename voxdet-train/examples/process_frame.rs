//! Single-frame training-data example
//!
//! Runs one KITTI frame through the pipeline and scores it with a model that
//! always predicts "no object", which gives the loss of an untrained network.
//!
//! Usage:
//!   cargo run --example process_frame -- <velodyne.bin> <label.txt> <calib.txt> [resolution]

use std::error::Error;
use tracing::info;
use voxdet_data::{LabelFormat, LabelFrame, PointCloudFormat};
use voxdet_train::{
    FrameSource, PipelineConfig, Prediction, TrainError, TrainableModel, TrainingTargets,
    VoxelGrid, detection_loss, evaluate, process,
};

/// Predicts uniform objectness and zero corners on the target grid.
struct UniformModel {
    map_shape: glam::UVec3,
}

impl TrainableModel for UniformModel {
    type Error = TrainError;

    fn forward(&mut self, _voxels: &VoxelGrid) -> Result<Prediction, TrainError> {
        Ok(Prediction::zeros(self.map_shape))
    }

    fn loss(&self, prediction: &Prediction, targets: &TrainingTargets) -> Result<f32, TrainError> {
        detection_loss(prediction, targets)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [cloud, labels, calib, rest @ ..] = args.as_slice() else {
        return Err("usage: process_frame <velodyne.bin> <label.txt> <calib.txt> [resolution]".into());
    };

    let mut config = PipelineConfig::default();
    if let Some(resolution) = rest.first() {
        config.voxel.resolution = resolution.parse()?;
    }

    let source = FrameSource::new(cloud, PointCloudFormat::Bin)
        .with_labels(labels, LabelFormat::Kitti, LabelFrame::Camera)
        .with_calibration(calib);
    let sample = process(&source, &config)?;
    info!("{:?}", sample.summary());

    let mut model = UniformModel {
        map_shape: sample.targets.objectness.shape(),
    };
    let loss = evaluate(&mut model, &sample.voxels, &sample.targets)?;
    info!("Untrained loss: {:.3}", loss);
    Ok(())
}
