//! KITTI object label lines.
//!
//! `type truncated occluded alpha x1 y1 x2 y2 h w l x y z rotation_y [score]`

use super::{RawLabel, parse_f32};
use crate::error::{DataError, Result};
use glam::Vec3;

const FIELD_COUNT: usize = 15;

pub(crate) fn parse_line(line: &str, line_no: usize) -> Result<RawLabel> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    // Detection results append a confidence score.
    if fields.len() != FIELD_COUNT && fields.len() != FIELD_COUNT + 1 {
        return Err(DataError::parse(
            line_no,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    // Truncation, occlusion, alpha and the 2D box are validated but unused.
    for (i, name) in [
        (1, "truncated"),
        (2, "occluded"),
        (3, "alpha"),
        (4, "bbox_left"),
        (5, "bbox_top"),
        (6, "bbox_right"),
        (7, "bbox_bottom"),
    ] {
        parse_f32(fields[i], line_no, name)?;
    }

    let h = parse_f32(fields[8], line_no, "height")?;
    let w = parse_f32(fields[9], line_no, "width")?;
    let l = parse_f32(fields[10], line_no, "length")?;
    let x = parse_f32(fields[11], line_no, "x")?;
    let y = parse_f32(fields[12], line_no, "y")?;
    let z = parse_f32(fields[13], line_no, "z")?;
    let rotation = parse_f32(fields[14], line_no, "rotation_y")?;

    Ok(RawLabel {
        class: fields[0].to_string(),
        center: Vec3::new(x, y, z),
        rotation,
        dims: [h, w, l],
        line: line_no,
    })
}
