use super::*;

#[test]
fn small_subject_is_centered_and_floor_aligned() {
    let p = resolve_placement((100, 100), (400, 300)).unwrap();
    assert_eq!(
        p,
        Placement {
            x: 150,
            y: 200,
            w: 100,
            h: 100
        }
    );
}

#[test]
fn large_subject_is_downscaled_uniformly() {
    let p = resolve_placement((800, 400), (400, 300)).unwrap();
    assert_eq!((p.w, p.h), (400, 200));
    assert_eq!((p.x, p.y), (0, 100));
}

#[test]
fn zero_sized_inputs_produce_no_placement() {
    assert!(resolve_placement((0, 10), (10, 10)).is_none());
    assert!(resolve_placement((10, 10), (10, 0)).is_none());
}

#[test]
fn placement_invariants_hold_across_sizes() {
    let sizes = [1u32, 3, 17, 64, 99, 100, 101, 333, 640, 1920];
    for &sw in &sizes {
        for &sh in &sizes {
            for &(bw, bh) in &[(100u32, 100u32), (640, 480), (37, 911), (1920, 1080)] {
                let p = resolve_placement((sw, sh), (bw, bh)).unwrap();
                let scale = fit_scale((sw, sh), (bw, bh));

                assert!(p.x >= 0, "x must be >= 0 for {sw}x{sh} on {bw}x{bh}");
                assert!(p.x as u32 + p.w <= bw + 1, "right edge within rounding");
                assert_eq!(p.y as u32 + p.h, bh, "bottom edge touches background bottom");
                assert!(p.w <= bw && p.h <= bh);
                if scale == 1.0 {
                    assert_eq!((p.w, p.h), (sw, sh));
                } else {
                    assert!(scale < 1.0);
                    assert!(p.w <= sw && p.h <= sh);
                    assert!((f64::from(p.w) - scale * f64::from(sw)).abs() <= 1.0);
                    assert!((f64::from(p.h) - scale * f64::from(sh)).abs() <= 1.0);
                }
            }
        }
    }
}
