//! Per-frame tracklet lines, already in the sensor frame.
//!
//! `frame type h w l tx ty tz rx ry rz`; only the yaw `rz` is used.

use super::{RawLabel, parse_f32};
use crate::error::{DataError, Result};
use glam::Vec3;

const FIELD_COUNT: usize = 11;

pub(crate) fn parse_line(line: &str, line_no: usize) -> Result<RawLabel> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FIELD_COUNT {
        return Err(DataError::parse(
            line_no,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }
    fields[0]
        .parse::<u32>()
        .map_err(|_| DataError::parse(line_no, format!("frame: '{}' is not an index", fields[0])))?;

    let mut values = [0.0f32; 9];
    const NAMES: [&str; 9] = ["height", "width", "length", "tx", "ty", "tz", "rx", "ry", "rz"];
    for (i, name) in NAMES.iter().enumerate() {
        values[i] = parse_f32(fields[i + 2], line_no, name)?;
    }
    let [h, w, l, tx, ty, tz, _rx, _ry, rz] = values;

    Ok(RawLabel {
        class: fields[1].to_string(),
        center: Vec3::new(tx, ty, tz),
        rotation: rz,
        dims: [h, w, l],
        line: line_no,
    })
}
