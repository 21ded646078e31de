//! Voxdet Training Crate
//!
//! Geometry core for training a 3D single-shot detector on voxelized LIDAR
//! scans. It turns sensor-frame points and boxes into the tensors a model
//! trains on.
//!
//! ## Modules
//!
//! - [`config`]: grid bounds, resolutions and target settings
//! - [`voxel`]: point-to-voxel occupancy binning
//! - [`geometry`]: box corner computation
//! - [`targets`]: objectness map and corner regression targets
//! - [`model`]: the trainable-model interface and reference loss
//! - [`pipeline`]: per-frame and per-dataset processing

pub mod config;
pub mod error;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod targets;
pub mod voxel;

pub use config::{AnchorPoint, GridBounds, PipelineConfig, SphereSearch, TargetConfig, VoxelConfig};
pub use error::{Result, TrainError};
pub use geometry::{batch_corners, box_corners};
pub use model::{Prediction, TrainableModel, detection_loss, evaluate};
pub use pipeline::{DatasetReport, FailurePolicy, FrameSample, FrameSource, FrameSummary, process, process_dataset, process_frame};
pub use targets::{CornerTargets, ObjectnessMap, TargetEncoder, TrainingTargets};
pub use voxel::{CellIndex, DenseGrid, VoxelGrid, Voxelizer};
