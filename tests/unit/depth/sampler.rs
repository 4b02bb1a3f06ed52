use super::*;
use crate::mask::MaskExtractor;

fn gradient_source(w: u32, h: u32) -> RasterImage {
    let mut img = image::RgbaImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let v = ((x * 255) / w.max(1)) as u8;
        let g = ((y * 255) / h.max(1)) as u8;
        px.0 = [v, g, v / 2, 255];
    }
    RasterImage::new(img)
}

fn cal(invert: bool, gamma: f32) -> DepthCalibration {
    DepthCalibration {
        invert,
        gamma,
        ..DepthCalibration::default()
    }
}

#[test]
fn values_stay_in_unit_range_for_any_calibration() {
    let src = gradient_source(23, 17);
    for invert in [false, true] {
        for gamma in [0.0, 0.4, 1.0, 2.5, 40.0] {
            for scale in [0.05, 0.5, 1.0, 2.0, 9.0] {
                let c = DepthCalibration {
                    invert,
                    gamma,
                    scale,
                    offset_x: 5,
                    offset_y: -7,
                };
                let v = sample_depth_values(&src, (31, 19), c).unwrap();
                assert_eq!(v.len(), 31 * 19);
                assert!(v.iter().all(|z| (0.0..=1.0).contains(z)), "{c:?}");
            }
        }
    }
}

#[test]
fn invert_is_pointwise_complement_at_unit_gamma() {
    let src = gradient_source(16, 16);
    let a = sample_depth_values(&src, (16, 16), cal(false, 1.0)).unwrap();
    let b = sample_depth_values(&src, (16, 16), cal(true, 1.0)).unwrap();
    for (za, zb) in a.iter().zip(&b) {
        assert!((za - (1.0 - zb)).abs() < 1e-6);
    }
}

#[test]
fn identical_inputs_are_bit_identical() {
    let src = gradient_source(40, 30);
    let c = DepthCalibration {
        invert: true,
        gamma: 1.7,
        scale: 1.3,
        offset_x: -3,
        offset_y: 9,
    };
    let mut sampler = DepthSampler::new();
    let a = sampler.sample(&src, (25, 35), c).unwrap();
    let b = sampler.sample(&src, (25, 35), c).unwrap();
    let bits = |d: &DepthBuffer| d.values().iter().map(|z| z.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
    assert!(b.revision() > a.revision());
}

#[test]
fn gamma_below_one_boosts_mid_grey() {
    let src = RasterImage::solid(4, 4, [128, 128, 128, 255]);
    let lin = sample_depth_values(&src, (4, 4), cal(false, 1.0)).unwrap();
    let boosted = sample_depth_values(&src, (4, 4), cal(false, 0.5)).unwrap();
    assert!((lin[0] - 128.0 / 255.0).abs() < 1e-6);
    assert!((boosted[0] - lin[0].sqrt()).abs() < 1e-6);
    assert!(boosted[0] > lin[0]);
}

#[test]
fn half_scale_leaves_uncovered_border_at_zero() {
    let src = RasterImage::solid(10, 10, [255, 255, 255, 255]);
    let c = DepthCalibration {
        scale: 0.5,
        ..DepthCalibration::default()
    };
    let v = sample_depth_values(&src, (10, 10), c).unwrap();
    assert_eq!(v[0], 0.0);
    assert_eq!(v[5 * 10 + 5], 1.0);
}

#[test]
fn offset_shifts_the_source() {
    let src = RasterImage::solid(10, 10, [255, 255, 255, 255]);
    let c = DepthCalibration {
        offset_x: 4,
        ..DepthCalibration::default()
    };
    let v = sample_depth_values(&src, (10, 10), c).unwrap();
    assert_eq!(v[3], 0.0);
    assert_eq!(v[4], 1.0);
}

#[test]
fn transparent_source_pixels_read_as_far() {
    let src = RasterImage::solid(3, 3, [255, 255, 255, 0]);
    let v = sample_depth_values(&src, (3, 3), cal(false, 1.0)).unwrap();
    assert!(v.iter().all(|&z| z == 0.0));
}

#[test]
fn empty_inputs_produce_nothing() {
    let src = RasterImage::solid(0, 0, [0, 0, 0, 0]);
    assert!(sample_depth_values(&src, (4, 4), cal(false, 1.0)).is_none());
    let src = RasterImage::solid(2, 2, [0, 0, 0, 255]);
    assert!(DepthSampler::new().sample(&src, (0, 4), cal(false, 1.0)).is_none());
}

#[test]
fn visualizations_follow_depth_and_mask() {
    let src = RasterImage::solid(2, 1, [255, 255, 255, 255]);
    let depth = DepthSampler::new()
        .sample(&src, (2, 1), cal(false, 1.0))
        .unwrap();
    let gray = depth.to_grayscale();
    assert_eq!(gray.as_bytes(), &[255, 255, 255, 255, 255, 255, 255, 255]);

    let subject = RasterImage::from_rgba8(2, 1, vec![0, 0, 0, 255, 0, 0, 0, 0]).unwrap();
    let placement = Placement {
        x: 0,
        y: 0,
        w: 2,
        h: 1,
    };
    let mask = MaskExtractor::new().extract(&subject, &placement).unwrap();
    let masked = depth.to_masked_grayscale(&mask).unwrap();
    assert_eq!(masked.as_bytes(), &[255, 255, 255, 255, 255, 255, 255, 0]);
    assert!(!depth.is_stale_for(&placement));
}

#[test]
fn fractional_draw_rect_snaps_to_whole_pixels() {
    // 10 * 0.5 = 5 wide at x = 2.5, drawn as columns 3..8.
    let src = RasterImage::solid(10, 10, [255, 255, 255, 255]);
    let c = DepthCalibration {
        scale: 0.5,
        ..DepthCalibration::default()
    };
    let v = sample_depth_values(&src, (10, 10), c).unwrap();
    let row: Vec<f32> = v[5 * 10..6 * 10].to_vec();
    assert_eq!(row, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
}
