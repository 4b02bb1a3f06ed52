use super::*;

fn placement(w: u32, h: u32) -> Placement {
    Placement { x: 0, y: 0, w, h }
}

#[test]
fn opaque_subject_yields_opaque_white_mask() {
    let subject = RasterImage::solid(100, 100, [12, 34, 56, 255]);
    let mut ex = MaskExtractor::new();
    let mask = ex.extract(&subject, &placement(100, 100)).unwrap();

    assert_eq!(mask.size(), (100, 100));
    assert!(
        mask.image()
            .as_bytes()
            .chunks_exact(4)
            .all(|px| px == [255, 255, 255, 255])
    );
}

#[test]
fn mask_alpha_follows_subject_alpha_and_discards_color() {
    let mut img = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 10, 10, 0]));
    img.put_pixel(1, 0, image::Rgba([0, 0, 0, 90]));
    img.put_pixel(3, 1, image::Rgba([1, 2, 3, 255]));
    let subject = RasterImage::new(img);

    let mask = MaskExtractor::new()
        .extract(&subject, &placement(4, 2))
        .unwrap();

    assert_eq!(mask.alpha_at(1, 0), 90);
    assert_eq!(mask.alpha_at(3, 1), 255);
    assert_eq!(mask.alpha_at(0, 0), 0);
    assert!(
        mask.image()
            .as_bytes()
            .chunks_exact(4)
            .all(|px| px[..3] == [255, 255, 255])
    );
}

#[test]
fn mask_is_resampled_to_placement_size() {
    let subject = RasterImage::solid(40, 20, [0, 0, 0, 255]);
    let mask = MaskExtractor::new()
        .extract(&subject, &placement(10, 5))
        .unwrap();
    assert_eq!(mask.size(), (10, 5));
    assert!(mask.is_stale_for(&placement(10, 6)));
    assert!(!mask.is_stale_for(&placement(10, 5)));
}

#[test]
fn each_extraction_gets_a_new_revision() {
    let subject = RasterImage::solid(2, 2, [0, 0, 0, 255]);
    let mut ex = MaskExtractor::new();
    let a = ex.extract(&subject, &placement(2, 2)).unwrap();
    let b = ex.extract(&subject, &placement(2, 2)).unwrap();
    assert!(b.revision() > a.revision());
    assert_eq!(ex.current_revision(), b.revision());
}

#[test]
fn empty_subject_produces_no_mask() {
    let subject = RasterImage::solid(0, 3, [0, 0, 0, 255]);
    let mut ex = MaskExtractor::new();
    assert!(ex.extract(&subject, &placement(2, 2)).is_none());
    assert_eq!(ex.current_revision(), Revision(0));
}

#[test]
fn premultiplied_copy_keeps_alpha() {
    let subject = RasterImage::from_rgba8(2, 1, vec![9, 9, 9, 77, 9, 9, 9, 0]).unwrap();
    let mask = MaskExtractor::new()
        .extract(&subject, &placement(2, 1))
        .unwrap();
    assert_eq!(mask.to_premul_bytes(), vec![77, 77, 77, 77, 0, 0, 0, 0]);
}
