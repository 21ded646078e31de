//! Interface to the trainable network.
//!
//! Layer construction, optimisation and normalisation statistics belong to
//! the model implementation. The pipeline only hands it a voxel grid and the
//! encoded targets and reads back a scalar loss.

use crate::error::{Result, TrainError};
use crate::targets::{CORNER_CHANNELS, TrainingTargets};
use crate::voxel::{DenseGrid, VoxelGrid};
use glam::UVec3;

/// Dense network output over the objectness map grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Logits per cell: `[object, background]`.
    pub objectness: DenseGrid<[f32; 2]>,
    /// Predicted corner offsets per cell.
    pub corners: DenseGrid<[f32; CORNER_CHANNELS]>,
}

impl Prediction {
    /// All-zero prediction (uniform objectness) of `shape`.
    pub fn zeros(shape: UVec3) -> Self {
        Self {
            objectness: DenseGrid::new(shape),
            corners: DenseGrid::new(shape),
        }
    }
}

/// A model that can be trained on voxel grids.
pub trait TrainableModel {
    type Error: std::error::Error + From<TrainError>;

    fn forward(&mut self, voxels: &VoxelGrid) -> std::result::Result<Prediction, Self::Error>;

    fn loss(
        &self,
        prediction: &Prediction,
        targets: &TrainingTargets,
    ) -> std::result::Result<f32, Self::Error>;
}

/// Forward pass followed by the loss on one frame.
pub fn evaluate<M: TrainableModel>(
    model: &mut M,
    voxels: &VoxelGrid,
    targets: &TrainingTargets,
) -> std::result::Result<f32, M::Error> {
    let prediction = model.forward(voxels)?;
    model.loss(&prediction, targets)
}

/// Reference detection objective.
///
/// Objectness: softmax cross-entropy of the two logits against the binary
/// map, summed over cells. Corners: squared error of the 24 offsets, summed
/// over positive cells only.
pub fn detection_loss(prediction: &Prediction, targets: &TrainingTargets) -> Result<f32> {
    let shape = targets.objectness.shape();
    if prediction.objectness.shape() != shape || prediction.corners.shape() != shape {
        return Err(TrainError::Shape(format!(
            "prediction {:?} / {:?} vs targets {:?}",
            prediction.objectness.shape().to_array(),
            prediction.corners.shape().to_array(),
            shape.to_array()
        )));
    }

    let mut object_loss = 0.0f64;
    for (logits, label) in prediction
        .objectness
        .as_slice()
        .iter()
        .zip(targets.objectness.as_slice())
    {
        let [obj, bg] = *logits;
        let max = obj.max(bg);
        let log_sum = max + ((obj - max).exp() + (bg - max).exp()).ln();
        let picked = if *label != 0 { obj } else { bg };
        object_loss += (log_sum - picked) as f64;
    }

    let dense = targets.dense_corners();
    let mut corner_loss = 0.0f64;
    for ((pred, target), label) in prediction
        .corners
        .as_slice()
        .iter()
        .zip(dense.as_slice())
        .zip(targets.objectness.as_slice())
    {
        if *label == 0 {
            continue;
        }
        corner_loss += pred
            .iter()
            .zip(target)
            .map(|(p, t)| ((p - t) * (p - t)) as f64)
            .sum::<f64>();
    }

    Ok((object_loss + corner_loss) as f32)
}
