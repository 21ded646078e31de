//! PLY point clouds (vertex element only).

use crate::error::{DataError, Result};
use crate::types::Point;
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::warn;

// Faces, if any, are ignored.
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
}

pub(crate) fn read<R: BufRead>(reader: R) -> Result<Vec<Point>> {
    let ply_data: PlyFile = serde_ply::from_reader(reader).map_err(|e| {
        warn!("Failed to parse PLY file: {}", e);
        DataError::Ply(e.to_string())
    })?;

    fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
        prop.and_then(|v| match v {
            JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
    }

    let mut points = Vec::with_capacity(ply_data.vertex.len());
    for (i, vertex) in ply_data.vertex.iter().enumerate() {
        let x = get_f32(vertex.get("x"))
            .ok_or_else(|| DataError::Ply(format!("Missing 'x' at vertex {i}")))?;
        let y = get_f32(vertex.get("y"))
            .ok_or_else(|| DataError::Ply(format!("Missing 'y' at vertex {i}")))?;
        let z = get_f32(vertex.get("z"))
            .ok_or_else(|| DataError::Ply(format!("Missing 'z' at vertex {i}")))?;

        let reflectance =
            get_f32(vertex.get("intensity")).or_else(|| get_f32(vertex.get("reflectance")));
        points.push(Point {
            position: Vec3::new(x, y, z),
            reflectance,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_PLY: &str = "\
ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
property float intensity
end_header
1 2 3 0.5
-1 0.5 2 0.25
";

    #[test]
    fn test_read_ascii_ply() {
        let points = read(ASCII_PLY.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(points[1].reflectance, Some(0.25));
    }

    #[test]
    fn test_garbage_is_ply_error() {
        let err = read("not a ply".as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Ply(_)));
    }
}
