//! End-to-end frame processing on synthetic KITTI-style files.

use glam::Vec3;
use std::fs;
use std::path::Path;
use voxdet_data::{KittiLayout, LabelFormat, LabelFrame, PointCloudFormat};
use voxdet_train::{FailurePolicy, FrameSource, PipelineConfig, TrainError, process, process_dataset};

const CALIB: &str = "\
P2: 7.2e+02 0 6.1e+02 4.5e+01 0 7.2e+02 1.7e+02 -3.4e-01 0 0 1 2.7e-03
R0_rect: 1 0 0 0 1 0 0 0 1
Tr_velo_to_cam: 0 -1 0 0 0 0 -1 0 1 0 0 0
";

// Camera frame: x right, y down, z forward. This car sits 20 m ahead, 2 m
// to the right of the sensor, with its bottom 1.6 m below the camera.
const LABELS: &str = "\
Car 0.00 0 -1.57 614.24 181.78 727.31 284.77 1.50 1.60 4.00 2.00 1.60 20.00 0.00
Pedestrian 0.00 0 0.21 423.17 173.67 433.17 224.03 1.87 0.50 0.90 -6.82 1.71 29.80 0.02
DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10
";

fn write_velodyne(path: &Path, points: &[[f32; 4]]) {
    let bytes: Vec<u8> = points
        .iter()
        .flat_map(|p| p.iter().flat_map(|v| v.to_le_bytes()))
        .collect();
    fs::write(path, bytes).unwrap();
}

fn write_frame(root: &Path, id: &str, points: &[[f32; 4]]) {
    for dir in ["velodyne", "label_2", "calib"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    write_velodyne(&root.join("velodyne").join(format!("{id}.bin")), points);
    fs::write(root.join("label_2").join(format!("{id}.txt")), LABELS).unwrap();
    fs::write(root.join("calib").join(format!("{id}.txt")), CALIB).unwrap();
}

const POINTS: [[f32; 4]; 4] = [
    [20.05, -2.05, -1.02, 0.3],
    [20.1, -2.1, -1.08, 0.4],
    [5.0, 8.0, 0.0, 0.1],
    [-3.0, 0.0, 0.0, 0.1],
];

#[test]
fn frame_with_camera_labels() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "000000", &POINTS);
    let root = dir.path();

    let source = FrameSource::new(root.join("velodyne/000000.bin"), PointCloudFormat::Bin)
        .with_labels(root.join("label_2/000000.txt"), LabelFormat::Kitti, LabelFrame::Camera)
        .with_calibration(root.join("calib/000000.txt"));
    let sample = process(&source, &PipelineConfig::default()).unwrap();

    assert_eq!(sample.loaded_points, 4);
    // (5, 8) and (-3, 0) are outside the forward cone.
    assert_eq!(sample.points_in_view, 2);
    // Both remaining points share one 0.2 m voxel.
    assert_eq!(sample.voxels.count_nonzero(), 1);

    assert_eq!(sample.labels.len(), 1);
    let center = sample.labels.centers[0];
    assert!((center - Vec3::new(20.27, -2.0, -1.6)).length() < 1e-4, "{center}");
    assert_eq!(sample.labels.rotations[0], std::f32::consts::FRAC_PI_2);

    assert_eq!(sample.targets.positive_cells(), 1);
    let rows = sample.corner_rows();
    assert_eq!(rows.len(), 1);

    // Offsets plus the anchor give back the corners.
    let cell = sample.targets.corners.cells[0];
    let anchor = cell.as_vec3() * 0.8 + Vec3::new(0.0, -50.0, -4.5);
    for (slot, corner) in sample.corners[0].points().iter().enumerate() {
        let rebuilt = Vec3::new(rows[0][slot * 3], rows[0][slot * 3 + 1], rows[0][slot * 3 + 2]) + anchor;
        assert!((rebuilt - *corner).length() < 1e-4);
    }
}

#[test]
fn frame_without_labels() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = dir.path().join("scan.bin");
    write_velodyne(&cloud, &POINTS);
    let sample = process(&FrameSource::new(&cloud, PointCloudFormat::Bin), &PipelineConfig::default()).unwrap();
    assert!(sample.labels.is_empty());
    assert_eq!(sample.targets.positive_cells(), 0);
    assert_eq!(sample.summary().voxel_shape, [450, 500, 50]);
}

#[test]
fn truncated_scan_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = dir.path().join("scan.bin");
    fs::write(&cloud, [0u8; 10]).unwrap();
    let err = process(&FrameSource::new(&cloud, PointCloudFormat::Bin), &PipelineConfig::default())
        .unwrap_err();
    match err {
        TrainError::Data(data) => assert!(data.is_io()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dataset_skips_broken_frames() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "000000", &POINTS);
    write_frame(dir.path(), "000001", &POINTS);
    fs::write(dir.path().join("calib/000001.txt"), "R0_rect: 1 0 0\n").unwrap();

    let layout = KittiLayout::open(dir.path()).unwrap();
    let mut seen = Vec::new();
    let report = process_dataset(&layout, &PipelineConfig::default(), FailurePolicy::Skip, |files, sample| {
        seen.push((files.id.clone(), sample.targets.positive_cells()));
        Ok(())
    })
    .unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, vec!["000001".to_string()]);
    assert_eq!(seen, vec![("000000".to_string(), 1)]);

    let err = process_dataset(&layout, &PipelineConfig::default(), FailurePolicy::Abort, |_, _| Ok(()));
    assert!(err.is_err());
}
