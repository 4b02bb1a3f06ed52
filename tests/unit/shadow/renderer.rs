use super::*;
use crate::depth::layers::DepthSlicer;
use crate::depth::sampler::DepthSampler;
use crate::foundation::core::RasterImage;
use crate::mask::MaskExtractor;
use crate::params::{DepthCalibration, Light};

const CANVAS: Canvas = Canvas {
    width: 400,
    height: 300,
};

const PLACEMENT: Placement = Placement {
    x: 150,
    y: 200,
    w: 100,
    h: 100,
};

fn params(depth_strength: f64) -> ShadowParams {
    ShadowParams {
        light: Light {
            angle_deg: 180.0,
            elevation_deg: 55.0,
        },
        depth_strength,
        ..ShadowParams::default()
    }
}

fn opaque_mask() -> Mask {
    MaskExtractor::new()
        .extract(&RasterImage::solid(100, 100, [200, 40, 40, 255]), &PLACEMENT)
        .unwrap()
}

fn uniform_layers(mask: &Mask, gray: u8) -> DepthLayers {
    let depth = DepthSampler::new()
        .sample(
            &RasterImage::solid(100, 100, [gray, gray, gray, 255]),
            (100, 100),
            DepthCalibration::default(),
        )
        .unwrap();
    DepthSlicer::new().slice(mask, &depth, 16).unwrap()
}

fn alpha(frame: &FrameRGBA, x: u32, y: u32) -> u8 {
    frame.alpha_at(x, y)
}

/// Largest x (along `+dir` for a 180 degree light) with any shadow coverage.
fn reach(frame: &FrameRGBA) -> u32 {
    let mut max_x = 0;
    for y in 0..frame.height {
        for x in 0..frame.width {
            if alpha(frame, x, y) > 0 {
                max_x = max_x.max(x);
            }
        }
    }
    max_x
}

#[test]
fn fallback_cast_lies_along_dir_from_anchor() {
    let mask = opaque_mask();
    let mut renderer = ShadowRenderer::new();
    let shadow = renderer
        .render(CANVAS, &PLACEMENT, &mask, None, &params(1.0))
        .unwrap()
        .unwrap();

    assert_eq!(shadow.path(), ShadowPath::Fallback);
    assert_eq!(shadow.size(), (400, 300));
    assert!(!shadow.is_empty());
    assert!(shadow.frame().premultiplied);

    let frame = shadow.frame();
    let mut best = (0u8, 0u32, 0u32);
    for y in 0..300 {
        for x in 0..400 {
            let a = alpha(frame, x, y);
            if x < 199 {
                assert_eq!(a, 0, "nothing is cast behind the anchor ({x},{y})");
            }
            if a > best.0 {
                best = (a, x, y);
            }
        }
    }
    let (peak, px, py) = best;
    assert!(peak > 200, "peak alpha {peak}");
    assert!((200..240).contains(&px), "peak at x={px}");
    assert!((265..300).contains(&py), "peak at y={py}");

    // Black, premultiplied.
    assert!(frame.data.chunks_exact(4).all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
}

#[test]
fn fallback_is_taken_when_depth_is_disabled() {
    let mask = opaque_mask();
    let layers = uniform_layers(&mask, 255);
    let mut p = params(2.0);
    p.use_depth = false;

    let shadow = ShadowRenderer::new()
        .render(CANVAS, &PLACEMENT, &mask, Some(&layers), &p)
        .unwrap()
        .unwrap();
    assert_eq!(shadow.path(), ShadowPath::Fallback);
}

#[test]
fn depth_path_draws_only_non_empty_bands() {
    let mask = opaque_mask();
    let layers = uniform_layers(&mask, 255);
    let shadow = ShadowRenderer::new()
        .render(CANVAS, &PLACEMENT, &mask, Some(&layers), &params(2.0))
        .unwrap()
        .unwrap();
    assert_eq!(shadow.path(), ShadowPath::Depth { drawn: 1 });
    assert!(!shadow.is_empty());
}

#[test]
fn near_depth_casts_further_than_far_depth() {
    let mask = opaque_mask();
    let far = uniform_layers(&mask, 0);
    let near = uniform_layers(&mask, 255);
    let mut renderer = ShadowRenderer::new();

    let far_shadow = renderer
        .render(CANVAS, &PLACEMENT, &mask, Some(&far), &params(2.0))
        .unwrap()
        .unwrap();
    let near_shadow = renderer
        .render(CANVAS, &PLACEMENT, &mask, Some(&near), &params(2.0))
        .unwrap()
        .unwrap();

    let far_reach = reach(far_shadow.frame());
    let near_reach = reach(near_shadow.frame());
    assert!(
        near_reach > far_reach + 50,
        "near {near_reach} vs far {far_reach}"
    );
}

#[test]
fn fallback_and_depth_paths_differ_at_zero_depth_strength() {
    let mask = opaque_mask();
    let layers = uniform_layers(&mask, 128);
    let mut renderer = ShadowRenderer::new();

    let fallback = renderer
        .render(CANVAS, &PLACEMENT, &mask, None, &params(0.0))
        .unwrap()
        .unwrap();
    let depth = renderer
        .render(CANVAS, &PLACEMENT, &mask, Some(&layers), &params(0.0))
        .unwrap()
        .unwrap();

    assert!(!fallback.is_empty() && !depth.is_empty());
    assert_ne!(fallback.frame(), depth.frame());

    // Same cast length, but the whole-silhouette cast is denser next to the anchor than a
    // mid-depth band.
    let fa = alpha(fallback.frame(), 201, 299);
    let da = alpha(depth.frame(), 201, 299);
    assert!(fa > da, "fallback {fa} vs depth {da}");
    assert!(da > 0);
}

#[test]
fn stale_inputs_defer_without_bumping_revision() {
    let mask = opaque_mask();
    let layers = uniform_layers(&mask, 255);
    let mut renderer = ShadowRenderer::new();

    let moved = Placement {
        x: 100,
        y: 100,
        w: 200,
        h: 200,
    };
    assert!(
        renderer
            .render(CANVAS, &moved, &mask, None, &params(1.0))
            .unwrap()
            .is_none()
    );

    let small_mask = MaskExtractor::new()
        .extract(&RasterImage::solid(50, 50, [0, 0, 0, 255]), &Placement {
            x: 0,
            y: 250,
            w: 50,
            h: 50,
        })
        .unwrap();
    let small = Placement {
        x: 0,
        y: 250,
        w: 50,
        h: 50,
    };
    assert!(
        renderer
            .render(CANVAS, &small, &small_mask, Some(&layers), &params(1.0))
            .unwrap()
            .is_none()
    );

    let empty = Canvas {
        width: 0,
        height: 300,
    };
    assert!(
        renderer
            .render(empty, &PLACEMENT, &mask, None, &params(1.0))
            .unwrap()
            .is_none()
    );
    assert_eq!(renderer.current_revision(), Revision(0));
}

#[test]
fn each_render_bumps_the_shadow_revision() {
    let mask = opaque_mask();
    let mut renderer = ShadowRenderer::new();
    let a = renderer
        .render(CANVAS, &PLACEMENT, &mask, None, &params(1.0))
        .unwrap()
        .unwrap();
    let b = renderer
        .render(CANVAS, &PLACEMENT, &mask, None, &params(1.0))
        .unwrap()
        .unwrap();
    assert_eq!(a.revision(), Revision(1));
    assert_eq!(b.revision(), Revision(2));
    assert_eq!(a.frame(), b.frame(), "renders are deterministic");
    assert_eq!(b.placement(), PLACEMENT);
}

#[test]
fn surface_is_reused_across_canvas_sizes() {
    let mask = opaque_mask();
    let mut renderer = ShadowRenderer::new();
    let big = renderer
        .render(CANVAS, &PLACEMENT, &mask, None, &params(1.0))
        .unwrap()
        .unwrap();
    let wide = Canvas {
        width: 500,
        height: 300,
    };
    let other = renderer
        .render(wide, &PLACEMENT, &mask, None, &params(1.0))
        .unwrap()
        .unwrap();
    assert_eq!(other.size(), (500, 300));
    let (a, b) = (alpha(big.frame(), 210, 295), alpha(other.frame(), 210, 295));
    assert!(a > 0 && a.abs_diff(b) <= 2, "{a} vs {b}");
}

#[test]
fn extreme_elevations_stay_finite() {
    let mask = opaque_mask();
    let mut renderer = ShadowRenderer::new();
    for elevation_deg in [0.0, 1.0, 89.0, 90.0] {
        let mut p = params(1.0);
        p.light.elevation_deg = elevation_deg;
        let shadow = renderer
            .render(CANVAS, &PLACEMENT, &mask, None, &p)
            .unwrap()
            .unwrap();
        assert_eq!(shadow.size(), (400, 300));
    }
}
