use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_keeps_straight_alpha() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba.clone()).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let raster = decode_image(&buf).unwrap();
    assert_eq!(raster.dimensions(), (1, 1));
    assert_eq!(raster.as_bytes(), src_rgba.as_slice());
}

#[test]
fn decode_garbage_is_decode_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, ShadowError::Decode(_)));
}

#[test]
fn decode_missing_path_is_decode_error() {
    let err = decode_image_path("no/such/file.png").unwrap_err();
    assert!(matches!(err, ShadowError::Decode(_)));
}
