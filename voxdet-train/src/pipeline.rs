//! Frame pipeline: files in, voxel grid and training targets out.

use crate::config::PipelineConfig;
use crate::error::{Result, TrainError};
use crate::geometry::batch_corners;
use crate::targets::{TargetEncoder, TrainingTargets};
use crate::voxel::{VoxelGrid, Voxelizer};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use voxdet_data::{
    CalibrationParams, Corners, FrameFiles, KittiLayout, LabelFormat, LabelFrame, LabelSet, Point,
    PointCloudFormat, load_point_cloud, read_labels,
};

/// Files and format tags for one frame.
#[derive(Debug, Clone)]
pub struct FrameSource {
    pub point_cloud: PathBuf,
    pub cloud_format: PointCloudFormat,
    pub labels: Option<PathBuf>,
    pub label_format: LabelFormat,
    pub label_frame: LabelFrame,
    pub calibration: Option<PathBuf>,
}

impl FrameSource {
    /// A frame with only a point cloud.
    pub fn new(point_cloud: impl Into<PathBuf>, cloud_format: PointCloudFormat) -> Self {
        Self {
            point_cloud: point_cloud.into(),
            cloud_format,
            labels: None,
            label_format: LabelFormat::default(),
            label_frame: LabelFrame::default(),
            calibration: None,
        }
    }

    pub fn with_labels(mut self, path: impl Into<PathBuf>, format: LabelFormat, frame: LabelFrame) -> Self {
        self.labels = Some(path.into());
        self.label_format = format;
        self.label_frame = frame;
        self
    }

    pub fn with_calibration(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration = Some(path.into());
        self
    }

    /// KITTI object-detection frame: velodyne scan with camera-frame labels.
    pub fn from_kitti(files: &FrameFiles) -> Self {
        Self::new(&files.point_cloud, PointCloudFormat::Bin)
            .with_labels(&files.labels, LabelFormat::Kitti, LabelFrame::Camera)
            .with_calibration(&files.calibration)
    }
}

/// Everything produced for one frame.
#[derive(Debug, Clone)]
pub struct FrameSample {
    pub voxels: VoxelGrid,
    /// Sensor-frame boxes after class filtering.
    pub labels: LabelSet,
    /// Corners of every box in `labels`, same order.
    pub corners: Vec<Corners>,
    pub targets: TrainingTargets,
    pub loaded_points: usize,
    pub points_in_view: usize,
}

/// Counts describing a [`FrameSample`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub loaded_points: usize,
    pub points_in_view: usize,
    pub voxel_shape: [u32; 3],
    pub occupied_voxels: usize,
    pub map_shape: [u32; 3],
    pub boxes: usize,
    pub encoded_boxes: usize,
    pub positive_cells: usize,
}

impl FrameSample {
    pub fn summary(&self) -> FrameSummary {
        FrameSummary {
            loaded_points: self.loaded_points,
            points_in_view: self.points_in_view,
            voxel_shape: self.voxels.shape().to_array(),
            occupied_voxels: self.voxels.count_nonzero(),
            map_shape: self.targets.objectness.shape().to_array(),
            boxes: self.labels.len(),
            encoded_boxes: self.targets.corners.len(),
            positive_cells: self.targets.positive_cells(),
        }
    }

    /// Corner targets as `(n, 24)` rows.
    pub fn corner_rows(&self) -> Vec<[f32; crate::targets::CORNER_CHANNELS]> {
        self.targets.corners.flatten()
    }
}

/// Load a frame's files and run it through the pipeline.
#[tracing::instrument(skip_all, fields(cloud = %source.point_cloud.display()))]
pub fn process(source: &FrameSource, config: &PipelineConfig) -> Result<FrameSample> {
    config.validate()?;

    let points = load_point_cloud(&source.point_cloud, source.cloud_format)?;
    let calibration = source
        .calibration
        .as_ref()
        .map(CalibrationParams::from_path)
        .transpose()?;
    let labels = source
        .labels
        .as_ref()
        .map(|path| {
            read_labels(
                path,
                source.label_format,
                calibration.as_ref(),
                source.label_frame,
                &config.labels,
            )
        })
        .transpose()?;

    process_frame(&points, labels.as_ref(), config)
}

/// Run already-loaded inputs through filtering, voxelization and target
/// encoding. `labels` must be in the sensor frame.
pub fn process_frame(
    points: &[Point],
    labels: Option<&LabelSet>,
    config: &PipelineConfig,
) -> Result<FrameSample> {
    let voxelizer = Voxelizer::new(config.voxel)?;
    let encoder = TargetEncoder::new(config.voxel, config.targets)?;

    let in_view = config.camera_filter.apply(points);
    let voxels = voxelizer.voxelize(&in_view);

    let labels = labels.cloned().unwrap_or_default();
    let corners = batch_corners(
        &labels.centers,
        &labels.rotations,
        &labels.sizes,
        config.corner_rounding,
    )?;
    let targets = if labels.is_empty() {
        TrainingTargets::empty(encoder.map_shape())
    } else {
        encoder.encode(&labels.centers, &labels.sizes, &corners, Some(&voxels))?
    };

    let sample = FrameSample {
        voxels,
        labels,
        corners,
        targets,
        loaded_points: points.len(),
        points_in_view: in_view.len(),
    };
    let summary = sample.summary();
    info!(
        "Frame ready: {} points ({} in view), {} occupied voxels, {} boxes -> {} positive cells",
        summary.loaded_points,
        summary.points_in_view,
        summary.occupied_voxels,
        summary.boxes,
        summary.positive_cells
    );
    Ok(sample)
}

/// What to do when a frame fails in [`process_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the error and continue with the next frame.
    #[default]
    Skip,
    /// Stop and return the error.
    Abort,
}

/// Outcome of a dataset run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetReport {
    pub processed: usize,
    pub skipped: Vec<String>,
}

/// Process every frame of a KITTI layout in id order, handing each sample to
/// `on_sample`. Errors from `on_sample` always abort.
pub fn process_dataset<F>(
    layout: &KittiLayout,
    config: &PipelineConfig,
    policy: FailurePolicy,
    mut on_sample: F,
) -> Result<DatasetReport>
where
    F: FnMut(&FrameFiles, FrameSample) -> Result<()>,
{
    config.validate()?;
    let mut report = DatasetReport::default();
    for files in layout.frames() {
        debug!("Processing frame {}", files.id);
        match process(&FrameSource::from_kitti(files), config) {
            Ok(sample) => {
                on_sample(files, sample)?;
                report.processed += 1;
            }
            Err(err) if policy == FailurePolicy::Skip && is_frame_error(&err) => {
                warn!("Skipping frame {}: {}", files.id, err);
                report.skipped.push(files.id.clone());
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        "Dataset done: {} frames processed, {} skipped",
        report.processed,
        report.skipped.len()
    );
    Ok(report)
}

// Bad configuration fails every frame the same way, so it is never skipped.
fn is_frame_error(err: &TrainError) -> bool {
    !matches!(err, TrainError::Config(_))
}
