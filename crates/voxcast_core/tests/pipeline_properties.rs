//! Integration tests across the CPU-side rendering model
//!
//! These tests drive volumes, transfer functions, the cutting plane and the
//! reference ray marcher together:
//! 1. Lookup tables are exact at the ends and flat white when empty
//! 2. Flipping the plane twice changes nothing
//! 3. Empty rays are transparent
//! 4. The cut removes exactly one half of the volume
//! 5. Failed loads leave the current volume alone

use std::path::PathBuf;

use voxcast_core::raycast::march;
use voxcast_core::{
    Color, CuttingPlane, LoadGeneration, RenderSettings, Stop, TransferCurve, TransferFunction, Vec3, Volume,
    VolumeError, DEFAULT_HISTOGRAM_BINS,
};

fn uniform_volume(size: u32, value: u16) -> Volume {
    Volume::load(vec![value; (size * size * size) as usize], size, size, size).expect("valid volume")
}

fn translucent_tf() -> TransferFunction {
    TransferFunction::new(
        TransferCurve::new([Stop::color(0.0, Color::new(1.0, 0.5, 0.25))]),
        TransferCurve::new([Stop::new(0.0, Color::WHITE, 0.05)]),
    )
}

fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("voxcast_{}_{}.raw", name, std::process::id()));
    std::fs::write(&path, bytes).expect("write temp file");
    path
}

// ==================== Transfer Function Tests ====================

#[test]
fn test_lookup_boundaries_match_end_stops() {
    let color = TransferCurve::new([
        Stop::color(0.0, Color::from_rgb8(12, 34, 56)),
        Stop::color(0.4, Color::from_rgb8(200, 0, 0)),
        Stop::color(1.0, Color::from_rgb8(78, 90, 123)),
    ]);
    let alpha = TransferCurve::new([
        Stop::from_luminance(0.0, Color::BLACK),
        Stop::from_luminance(0.7, Color::from_rgb8(128, 128, 128)),
        Stop::from_luminance(1.0, Color::WHITE),
    ]);

    for resolution in [2, 16, 256, 1024] {
        let lookup = TransferFunction::new(color.clone(), alpha.clone()).build_lookup(resolution);
        let texels = lookup.texels();
        assert_eq!(texels.len(), resolution as usize);
        assert_eq!(texels[0], [12, 34, 56, 0]);
        assert_eq!(texels[texels.len() - 1], [78, 90, 123, 255]);
    }
}

#[test]
fn test_empty_curves_give_flat_white() {
    let lookup = TransferFunction::default().build_lookup(64);
    assert_eq!(lookup.texels().len(), 64);
    assert!(lookup.texels().iter().all(|t| *t == [255, 255, 255, 255]));
}

#[test]
fn test_lookup_is_stateless() {
    let tf = translucent_tf();
    assert_eq!(tf.build_lookup(128), tf.build_lookup(128));
}

// ==================== Cutting Plane Tests ====================

#[test]
fn test_flip_twice_restores_transform() {
    let mut plane = CuttingPlane::new(0.8, 17.0, 250.0, Color::WHITE, false);
    let before = plane.transform();
    plane.flip();
    plane.flip();
    let after = plane.transform();
    assert!((before.translation_z - after.translation_z).abs() < 1e-5);
    assert!((before.rotation_x_deg - after.rotation_x_deg).abs() < 1e-5);
    assert!((before.rotation_y_deg - after.rotation_y_deg).abs() < 1e-4);
}

// ==================== Ray Marching Tests ====================

#[test]
fn test_entry_equals_exit_is_transparent() {
    let volume = uniform_volume(4, u16::MAX);
    let lookup = TransferFunction::default().build_lookup(256);
    let settings = RenderSettings::default();
    let params = settings.ray_march_parameters(volume.extent());

    for p in [Vec3::ZERO, Vec3::ONE, Vec3::new(0.2, 0.7, 0.1)] {
        let rgba = march(p, p, 0.3, &volume, &lookup, &params);
        assert_eq!(rgba, [0.0; 4]);
    }
}

/// Sum of ray alphas over a grid of rays parallel to X, split by the
/// rays' height above or below the volume's mid-plane
fn alpha_sums(volume: &Volume, settings: &RenderSettings) -> (f32, f32) {
    let lookup = settings.transfer_function().build_lookup(256);
    let params = settings.ray_march_parameters(volume.extent());
    let mut below = 0.0;
    let mut above = 0.0;
    for iy in 0..8 {
        for iz in 0..8 {
            let y = (iy as f32 + 0.5) / 8.0;
            let z = (iz as f32 + 0.5) / 8.0;
            let rgba = march(Vec3::new(0.0, y, z), Vec3::new(1.0, y, z), 0.0, volume, &lookup, &params);
            if z < 0.5 {
                below += rgba[3];
            } else {
                above += rgba[3];
            }
        }
    }
    (below, above)
}

#[test]
fn test_cut_discards_exactly_one_half() {
    let volume = uniform_volume(16, 40_000);
    let mut settings = RenderSettings::new(CuttingPlane::default(), translucent_tf());

    let (below_off, above_off) = alpha_sums(&volume, &settings);
    assert!(below_off > 0.0);
    assert!((below_off - above_off).abs() < 1e-4);

    settings.set_cut_enabled(true);
    let (below_on, above_on) = alpha_sums(&volume, &settings);
    assert_eq!(below_on, 0.0);
    assert!((above_on - above_off).abs() < 1e-5);

    // Flipping keeps the other half
    settings.flip_plane();
    let (below_flip, above_flip) = alpha_sums(&volume, &settings);
    assert_eq!(above_flip, 0.0);
    assert!((below_flip - below_off).abs() < 1e-5);
}

#[test]
fn test_mip_of_uniform_volume() {
    let volume = uniform_volume(8, 65535);
    let mut settings = RenderSettings::new(CuttingPlane::default(), TransferFunction::default());
    settings.set_mip(true);
    let lookup = settings.transfer_function().build_lookup(256);
    let params = settings.ray_march_parameters(volume.extent());
    let rgba = march(Vec3::new(0.5, 0.5, 0.0), Vec3::new(0.5, 0.5, 1.0), 0.0, &volume, &lookup, &params);
    assert_eq!(rgba, [1.0, 1.0, 1.0, 1.0]);
}

// ==================== Volume Tests ====================

#[test]
fn test_all_zero_histogram() {
    let volume = uniform_volume(4, 0);
    let histogram = volume.histogram(DEFAULT_HISTOGRAM_BINS);
    assert_eq!(histogram.bins()[0].count, 64);
    assert_eq!(histogram.total(), 64);
    assert!(histogram.bins().iter().skip(1).all(|b| b.count == 0));
}

#[test]
fn test_truncated_file_reports_sizes() {
    let bad = temp_file("bad", &[0u8; 15]);

    match Volume::load_from_file(&bad, 2, 2, 2) {
        Err(VolumeError::Format(err)) => {
            assert_eq!(err.expected_bytes, 16);
            assert_eq!(err.actual_bytes, 15);
        }
        other => panic!("Expected FormatError, got {:?}", other.map(|v| v.dimensions())),
    }

    let _ = std::fs::remove_file(bad);
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("voxcast_does_not_exist.raw");
    match Volume::load_from_file(path, 1, 1, 1) {
        Err(VolumeError::Io(_)) => {}
        other => panic!("Expected IO error, got {:?}", other.map(|v| v.dimensions())),
    }
}

#[test]
fn test_stale_load_does_not_replace_newer_volume() {
    let mut loads = LoadGeneration::new();
    let slow = loads.begin();
    let fast = loads.begin();

    let mut current: Option<Volume> = None;
    let fast_volume = uniform_volume(2, 7);
    let slow_volume = uniform_volume(4, 9);

    if loads.accept(fast) {
        current = Some(fast_volume);
    }
    if loads.accept(slow) {
        current = Some(slow_volume);
    }
    assert_eq!(current.map(|v| v.max()), Some(7));
}
