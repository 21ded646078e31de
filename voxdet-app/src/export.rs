//! JSON export of processed frames.

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use voxdet_train::{FrameSample, FrameSummary};

#[derive(Serialize)]
struct FrameExport<'a> {
    id: &'a str,
    summary: FrameSummary,
    /// Cells flagged in the objectness map.
    positive_cells: Vec<[u32; 3]>,
    /// Corner offsets, one row of 24 values per encoded box.
    corner_targets: Vec<Vec<f32>>,
}

/// Write a frame's summary and targets as pretty-printed JSON.
pub fn write_frame(path: &Path, id: &str, sample: &FrameSample) -> voxdet_train::Result<()> {
    let export = FrameExport {
        id,
        summary: sample.summary(),
        positive_cells: sample
            .targets
            .objectness
            .nonzero_cells()
            .iter()
            .map(|c| c.to_array())
            .collect(),
        corner_targets: sample.corner_rows().iter().map(|r| r.to_vec()).collect(),
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}
