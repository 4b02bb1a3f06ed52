use super::*;
use crate::depth::sampler::DepthSampler;
use crate::mask::MaskExtractor;
use crate::params::DepthCalibration;

fn placement(w: u32, h: u32) -> Placement {
    Placement { x: 0, y: 0, w, h }
}

fn disc_subject(w: u32, h: u32) -> RasterImage {
    let mut img = image::RgbaImage::new(w, h);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let r = cx.min(cy);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let d = ((x as f32 + 0.5 - cx).powi(2) + (y as f32 + 0.5 - cy).powi(2)).sqrt();
        let a = ((r - d).clamp(0.0, 1.0) * 255.0) as u8;
        px.0 = [10, 20, 30, a];
    }
    RasterImage::new(img)
}

fn gradient_depth(w: u32, h: u32) -> RasterImage {
    let mut img = image::RgbaImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let v = (((x + y) * 255) / (w + h - 2).max(1)) as u8;
        px.0 = [v, v, v, 255];
    }
    RasterImage::new(img)
}

#[test]
fn band_index_matches_interval_rule() {
    for n in [1u32, 3, 8, 10, 16, 32] {
        for step in 0..=1000 {
            let z = step as f32 / 1000.0;
            let li = band_index(z, n);
            let z0 = li as f32 / n as f32;
            let z1 = (li + 1) as f32 / n as f32;
            assert!(li < n);
            assert!(z >= z0, "z={z} n={n} li={li}");
            if li + 1 < n {
                assert!(z < z1, "z={z} n={n} li={li}");
            } else {
                assert!(z <= 1.0);
            }
        }
    }
    assert_eq!(band_index(1.0, 8), 7);
    assert_eq!(band_index(0.0, 8), 0);
    assert_eq!(band_index(0.5, 0), 0);
}

#[test]
fn bands_form_a_disjoint_complete_cover_of_the_silhouette() {
    let (w, h) = (24u32, 18u32);
    let p = placement(w, h);
    let mask = MaskExtractor::new().extract(&disc_subject(w, h), &p).unwrap();
    let depth = DepthSampler::new()
        .sample(&gradient_depth(w, h), (w, h), DepthCalibration::default())
        .unwrap();
    let layers = DepthSlicer::new().slice(&mask, &depth, 12).unwrap();

    assert_eq!(layers.len(), 12);
    for y in 0..h {
        for x in 0..w {
            let i = ((y * w + x) * 4 + 3) as usize;
            let owners: Vec<&DepthLayer> = layers
                .layers()
                .iter()
                .filter(|l| l.raster().as_bytes()[i] > 0)
                .collect();
            let a = mask.alpha_at(x, y);
            if a == 0 {
                assert!(owners.is_empty());
            } else {
                assert_eq!(owners.len(), 1, "pixel ({x},{y}) must be in exactly one band");
                assert_eq!(owners[0].raster().as_bytes()[i], a, "band keeps mask alpha");
                let z = depth.get(x, y);
                assert!(z >= owners[0].z0);
            }
        }
    }

    let total: usize = layers.layers().iter().map(|l| l.pixel_count).sum();
    assert_eq!(total, mask.alphas().filter(|&a| a > 0).count());
}

#[test]
fn empty_bands_are_kept_with_stable_midpoints() {
    let p = placement(4, 4);
    let mask = MaskExtractor::new()
        .extract(&RasterImage::solid(4, 4, [0, 0, 0, 255]), &p)
        .unwrap();
    let depth = DepthSampler::new()
        .sample(
            &RasterImage::solid(4, 4, [255, 255, 255, 255]),
            (4, 4),
            DepthCalibration::default(),
        )
        .unwrap();
    let layers = DepthSlicer::new().slice(&mask, &depth, 8).unwrap();

    assert_eq!(layers.len(), 8);
    for (i, l) in layers.layers().iter().enumerate() {
        assert_eq!(l.index as usize, i);
        assert!((l.z_mid - (i as f32 + 0.5) / 8.0).abs() < 1e-6);
    }
    assert!(layers.layers()[..7].iter().all(DepthLayer::is_empty));
    assert_eq!(layers.layers()[7].pixel_count, 16);
    assert_eq!(
        layers.source_revisions(),
        (mask.revision(), depth.revision())
    );
}

#[test]
fn mismatched_sizes_defer_slicing() {
    let mask = MaskExtractor::new()
        .extract(&RasterImage::solid(4, 4, [0, 0, 0, 255]), &placement(4, 4))
        .unwrap();
    let depth = DepthSampler::new()
        .sample(
            &RasterImage::solid(4, 4, [0, 0, 0, 255]),
            (5, 4),
            DepthCalibration::default(),
        )
        .unwrap();
    let mut slicer = DepthSlicer::new();
    assert!(slicer.slice(&mask, &depth, 8).is_none());
    assert_eq!(slicer.current_revision(), Revision(0));
}

#[test]
fn zero_layer_count_is_clamped_to_one() {
    let p = placement(2, 2);
    let mask = MaskExtractor::new()
        .extract(&RasterImage::solid(2, 2, [0, 0, 0, 255]), &p)
        .unwrap();
    let depth = DepthSampler::new()
        .sample(
            &RasterImage::solid(2, 2, [90, 90, 90, 255]),
            (2, 2),
            DepthCalibration::default(),
        )
        .unwrap();
    let layers = DepthSlicer::new().slice(&mask, &depth, 0).unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers.layers()[0].pixel_count, 4);
    assert!(!layers.is_stale_for(&p));
}
