//! KITTI velodyne scans: packed little-endian `f32` records `x y z reflectance`.

use crate::error::{DataError, Result};
use crate::types::Point;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// On-disk layout of one return.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct VelodyneRecord {
    x: f32,
    y: f32,
    z: f32,
    reflectance: f32,
}

pub(crate) const RECORD_SIZE: usize = std::mem::size_of::<VelodyneRecord>();

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<Point>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(DataError::PayloadLength {
            len: bytes.len(),
            record: RECORD_SIZE,
        });
    }
    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            let r: VelodyneRecord = bytemuck::pod_read_unaligned(chunk);
            Point::with_reflectance(Vec3::new(r.x, r.y, r.z), r.reflectance)
        })
        .collect())
}

#[cfg(test)]
pub(crate) fn encode(points: &[[f32; 4]]) -> Vec<u8> {
    points
        .iter()
        .flat_map(|p| p.iter().flat_map(|v| v.to_le_bytes()))
        .collect()
}
