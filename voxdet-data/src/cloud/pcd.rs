//! PCD point clouds through `pcd-rs` dynamic records.

use crate::error::{DataError, Result};
use crate::types::Point;
use glam::Vec3;
use pcd_rs::{DynReader, DynRecord, Field};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub(crate) fn read(path: &Path) -> Result<Vec<Point>> {
    let file = File::open(path).map_err(|source| DataError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let reader =
        DynReader::from_reader(BufReader::new(file)).map_err(|e| DataError::Pcd(e.to_string()))?;
    let columns = Columns::resolve(reader.meta().field_defs.iter().map(|def| def.name.as_str()))?;

    let mut points = Vec::new();
    for (i, record) in reader.enumerate() {
        let record = record.map_err(|e| DataError::Pcd(e.to_string()))?;
        points.push(columns.point(&record).ok_or_else(|| {
            DataError::Pcd(format!("record {i}: x/y/z must be single scalar values"))
        })?);
    }
    Ok(points)
}

/// Record positions of the fields a point is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    xyz: [usize; 3],
    reflectance: Option<usize>,
}

impl Columns {
    fn resolve<'a>(names: impl Iterator<Item = &'a str>) -> Result<Self> {
        let names: Vec<&str> = names.collect();
        let find = |name: &str| names.iter().position(|n| n.eq_ignore_ascii_case(name));
        let axis = |name: &str| {
            find(name).ok_or_else(|| {
                DataError::Pcd(format!("missing field '{name}' (fields: {})", names.join(" ")))
            })
        };
        Ok(Self {
            xyz: [axis("x")?, axis("y")?, axis("z")?],
            reflectance: find("intensity").or_else(|| find("reflectance")),
        })
    }

    fn point(&self, record: &DynRecord) -> Option<Point> {
        let value = |idx: usize| record.0.get(idx).and_then(scalar_f32);
        let [x, y, z] = self.xyz;
        let position = Vec3::new(value(x)?, value(y)?, value(z)?);
        Some(match self.reflectance.and_then(value) {
            Some(r) => Point::with_reflectance(position, r),
            None => Point::new(position),
        })
    }
}

fn scalar_f32(field: &Field) -> Option<f32> {
    let value = match field {
        Field::F32(v) if v.len() == 1 => v[0],
        Field::F64(v) if v.len() == 1 => v[0] as f32,
        Field::U8(v) if v.len() == 1 => v[0] as f32,
        Field::U16(v) if v.len() == 1 => v[0] as f32,
        Field::U32(v) if v.len() == 1 => v[0] as f32,
        Field::I8(v) if v.len() == 1 => v[0] as f32,
        Field::I16(v) if v.len() == 1 => v[0] as f32,
        Field::I32(v) if v.len() == 1 => v[0] as f32,
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ASCII_PCD: &str = "\
# .PCD v0.7 - Point Cloud Data file format
VERSION 0.7
FIELDS x y z intensity
SIZE 4 4 4 4
TYPE F F F F
COUNT 1 1 1 1
WIDTH 2
HEIGHT 1
VIEWPOINT 0 0 0 1 0 0 0
POINTS 2
DATA ascii
1.0 2.0 3.0 0.25
4.0 -5.0 0.5 0.75
";

    #[test]
    fn test_read_ascii_pcd() {
        let mut file = tempfile::Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(ASCII_PCD.as_bytes()).unwrap();
        let points = read(file.path()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, Vec3::new(4.0, -5.0, 0.5));
        assert_eq!(points[0].reflectance, Some(0.25));
    }

    #[test]
    fn test_fields_resolved_by_name() {
        let text = ASCII_PCD
            .replace("FIELDS x y z intensity", "FIELDS intensity x y z")
            .replace("1.0 2.0 3.0 0.25", "0.5 10.0 2.0 -1.0");
        let mut file = tempfile::Builder::new().suffix(".pcd").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let points = read(file.path()).unwrap();
        assert_eq!(points[0].position, Vec3::new(10.0, 2.0, -1.0));
        assert_eq!(points[0].reflectance, Some(0.5));
    }

    #[test]
    fn test_unrelated_fourth_field_is_not_reflectance() {
        let columns = Columns::resolve(["x", "y", "z", "rgb"].into_iter()).unwrap();
        assert_eq!(columns.xyz, [0, 1, 2]);
        assert_eq!(columns.reflectance, None);
        let columns = Columns::resolve(["reflectance", "z", "y", "x"].into_iter()).unwrap();
        assert_eq!(columns.xyz, [3, 2, 1]);
        assert_eq!(columns.reflectance, Some(0));
    }

    #[test]
    fn test_missing_axis_is_pcd_error() {
        let err = Columns::resolve(["x", "y", "intensity"].into_iter()).unwrap_err();
        assert!(matches!(err, DataError::Pcd(ref m) if m.contains("'z'")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(read(Path::new("/nonexistent/cloud.pcd")).unwrap_err().is_io());
    }
}
