//! KITTI object-detection directory layout.
//!
//! ```text
//! root/
//!   velodyne/000000.bin
//!   label_2/000000.txt
//!   calib/000000.txt
//! ```

use crate::error::{DataError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const VELODYNE_DIR: &str = "velodyne";
pub const LABEL_DIR: &str = "label_2";
pub const CALIB_DIR: &str = "calib";

/// Files making up one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFiles {
    /// File stem shared by the three files, e.g. `000700`.
    pub id: String,
    pub point_cloud: PathBuf,
    pub labels: PathBuf,
    pub calibration: PathBuf,
}

/// Frames found under a KITTI-style root, sorted by id.
#[derive(Debug, Clone)]
pub struct KittiLayout {
    root: PathBuf,
    frames: Vec<FrameFiles>,
}

impl KittiLayout {
    /// Scan `root`. Scans without a matching label and calibration file are
    /// skipped with a warning.
    #[tracing::instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let velodyne = root.join(VELODYNE_DIR);
        let entries = std::fs::read_dir(&velodyne).map_err(|source| DataError::ReadFile {
            path: velodyne.clone(),
            source,
        })?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let labels = root.join(LABEL_DIR).join(format!("{id}.txt"));
            let calibration = root.join(CALIB_DIR).join(format!("{id}.txt"));
            if !labels.is_file() || !calibration.is_file() {
                warn!("Skipping frame {}: missing label or calibration", id);
                continue;
            }
            frames.push(FrameFiles {
                id,
                point_cloud: path,
                labels,
                calibration,
            });
        }
        frames.sort_by(|a, b| a.id.cmp(&b.id));

        info!("Found {} frames", frames.len());
        Ok(Self { root, frames })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames(&self) -> &[FrameFiles] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl IntoIterator for KittiLayout {
    type Item = FrameFiles;
    type IntoIter = std::vec::IntoIter<FrameFiles>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_frames_sorted_and_incomplete_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for id in ["000002", "000000", "000001"] {
            touch(root.join(VELODYNE_DIR).join(format!("{id}.bin")));
        }
        for id in ["000000", "000002"] {
            touch(root.join(LABEL_DIR).join(format!("{id}.txt")));
            touch(root.join(CALIB_DIR).join(format!("{id}.txt")));
        }
        touch(root.join(VELODYNE_DIR).join("notes.md"));

        let layout = KittiLayout::open(root).unwrap();
        let ids: Vec<&str> = layout.frames().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["000000", "000002"]);
        assert_eq!(layout.frames()[1].labels, root.join(LABEL_DIR).join("000002.txt"));
    }

    #[test]
    fn test_missing_velodyne_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(KittiLayout::open(dir.path()).unwrap_err().is_io());
    }
}
