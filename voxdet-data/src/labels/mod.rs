//! 3D box annotations.
//!
//! Two line-oriented schemas are supported (see [`LabelFormat`]). Parsing
//! yields a [`LabelSet`] of sensor-frame boxes; camera-frame labels are
//! converted using the frame's [`CalibrationParams`].

mod kitti;
mod tracklet;

use crate::calib::CalibrationParams;
use crate::error::{DataError, Result, read_to_string};
use crate::types::{Box3D, BoxSize};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Text schema of a label file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// KITTI object label: class, truncation, occlusion, alpha, 2D box,
    /// dimensions (h w l), location (x y z), rotation_y.
    #[default]
    Kitti,
    /// Flattened raw-sequence tracklet: frame, class, h w l, tx ty tz, rx ry rz.
    Tracklet,
}

impl FromStr for LabelFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kitti" | "txt" => Ok(LabelFormat::Kitti),
            "tracklet" => Ok(LabelFormat::Tracklet),
            other => Err(DataError::UnsupportedFormat(format!("label format '{other}'"))),
        }
    }
}

impl fmt::Display for LabelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelFormat::Kitti => write!(f, "kitti"),
            LabelFormat::Tracklet => write!(f, "tracklet"),
        }
    }
}

/// Coordinate frame the label centers are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFrame {
    /// Rectified camera frame; converted to the sensor frame on load.
    #[default]
    Camera,
    /// Already in the sensor frame; passed through unchanged.
    Sensor,
}

/// Which annotated objects are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelFilter {
    /// Class names to keep, compared case-sensitively.
    pub classes: Vec<String>,
    /// Objects longer than this (metres) are dropped.
    pub max_length: Option<f32>,
}

impl LabelFilter {
    pub fn classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            max_length: None,
        }
    }

    /// Listed class other than `DontCare`.
    pub fn accepts_class(&self, class: &str) -> bool {
        class != "DontCare" && self.classes.iter().any(|c| c == class)
    }

    pub fn accepts_length(&self, length: f32) -> bool {
        self.max_length.is_none_or(|max| length <= max)
    }

    pub fn accepts(&self, class: &str, length: f32) -> bool {
        self.accepts_class(class) && self.accepts_length(length)
    }
}

impl Default for LabelFilter {
    fn default() -> Self {
        Self {
            classes: vec!["Car".to_string()],
            max_length: Some(10.0),
        }
    }
}

/// Label parsing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub filter: LabelFilter,
    /// Forward shift (metres, sensor x) added after camera-to-sensor
    /// conversion; KITTI label origins sit this far behind the LIDAR origin.
    pub camera_offset: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            filter: LabelFilter::default(),
            camera_offset: 0.27,
        }
    }
}

/// Parallel per-object sequences, one entry per kept annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    pub centers: Vec<Vec3>,
    pub rotations: Vec<f32>,
    pub sizes: Vec<BoxSize>,
}

impl LabelSet {
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn push(&mut self, b: Box3D) {
        self.centers.push(b.center);
        self.rotations.push(b.rotation);
        self.sizes.push(b.size);
    }

    pub fn to_boxes(&self) -> Vec<Box3D> {
        self.centers
            .iter()
            .zip(&self.rotations)
            .zip(&self.sizes)
            .map(|((c, r), s)| Box3D::new(*c, *r, *s))
            .collect()
    }
}

impl FromIterator<Box3D> for LabelSet {
    fn from_iter<T: IntoIterator<Item = Box3D>>(iter: T) -> Self {
        let mut set = LabelSet::default();
        for b in iter {
            set.push(b);
        }
        set
    }
}

/// One annotation as written in the file, before frame conversion.
///
/// Dimensions stay unchecked until the class filter has accepted the line:
/// `DontCare` rows carry placeholder `-1` sizes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawLabel {
    pub class: String,
    pub center: Vec3,
    pub rotation: f32,
    /// Height, width, length.
    pub dims: [f32; 3],
    pub line: usize,
}

impl RawLabel {
    fn size(&self) -> Result<BoxSize> {
        let [h, w, l] = self.dims;
        BoxSize::new(h, w, l).map_err(|e| DataError::parse(self.line, e.to_string()))
    }
}

/// Read and convert a label file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), format = %format))]
pub fn read_labels(
    path: impl AsRef<Path>,
    format: LabelFormat,
    calibration: Option<&CalibrationParams>,
    frame: LabelFrame,
    config: &LabelConfig,
) -> Result<LabelSet> {
    let text = read_to_string(path.as_ref())?;
    parse_labels(&text, format, calibration, frame, config)
}

/// Parse label text. Lines failing the class or length filter are dropped
/// silently; a kept class with a malformed size is a parse error.
///
/// Tracklet rows are sensor-frame by definition and ignore `frame`.
pub fn parse_labels(
    text: &str,
    format: LabelFormat,
    calibration: Option<&CalibrationParams>,
    frame: LabelFrame,
    config: &LabelConfig,
) -> Result<LabelSet> {
    let frame = match format {
        LabelFormat::Kitti => frame,
        LabelFormat::Tracklet => LabelFrame::Sensor,
    };
    if frame == LabelFrame::Camera && calibration.is_none() {
        return Err(DataError::MissingCalibration);
    }

    let mut set = LabelSet::default();
    let mut dropped = 0usize;
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw = match format {
            LabelFormat::Kitti => kitti::parse_line(line, idx + 1)?,
            LabelFormat::Tracklet => tracklet::parse_line(line, idx + 1)?,
        };
        if !config.filter.accepts_class(&raw.class) {
            dropped += 1;
            continue;
        }
        let size = raw.size()?;
        if !config.filter.accepts_length(size.length) {
            dropped += 1;
            continue;
        }
        set.push(to_sensor_frame(&raw, size, calibration, frame, config.camera_offset));
    }

    debug!("Parsed {} labels ({} filtered out)", set.len(), dropped);
    Ok(set)
}

fn to_sensor_frame(
    raw: &RawLabel,
    size: BoxSize,
    calibration: Option<&CalibrationParams>,
    frame: LabelFrame,
    camera_offset: f32,
) -> Box3D {
    match (frame, calibration) {
        (LabelFrame::Camera, Some(calib)) => {
            let center = calib.camera_to_sensor(raw.center) + Vec3::X * camera_offset;
            Box3D::new(center, camera_to_sensor_yaw(raw.rotation), size)
        }
        _ => Box3D::new(raw.center, raw.rotation, size),
    }
}

/// Camera rotation_y (about camera y, pointing down) to sensor yaw (about z, up).
pub fn camera_to_sensor_yaw(rotation_y: f32) -> f32 {
    std::f32::consts::FRAC_PI_2 - rotation_y
}

pub(crate) fn parse_f32(field: &str, line: usize, name: &str) -> Result<f32> {
    field
        .parse::<f32>()
        .map_err(|_| DataError::parse(line, format!("{name}: '{field}' is not a number")))
}
