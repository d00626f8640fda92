use super::*;

fn two_tone_png(w: u32, h: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((w * h * 4) as usize);
    for _y in 0..h {
        for x in 0..w {
            if x < w / 2 {
                rgba.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 255, 255]);
            }
        }
    }
    png::encode_rgba8(w, h, rgba).unwrap()
}

#[test]
fn traces_two_color_halves() {
    let svg = PaletteVectorizer
        .vectorize(&two_tone_png(8, 4), &VectorizeParams::circuit_profile())
        .unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains(r#"viewBox="0 0 8 4""#));
    assert!(svg.contains(
        r#"fill="rgb(255,0,0)" fill-rule="evenodd" d="M0.5 0L3.5 0L4 0.5L4 3.5L3.5 4L0.5 4L0 3.5L0 0.5Z""#
    ));
    assert!(svg.contains(
        r#"fill="rgb(0,0,255)" fill-rule="evenodd" d="M4.5 0L7.5 0L8 0.5L8 3.5L7.5 4L4.5 4L4 3.5L4 0.5Z""#
    ));
}

#[test]
fn diagonal_edges_are_traced_as_lines() {
    let (w, h) = (32u32, 32u32);
    let mut rgba = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if x + y < 16 {
                rgba.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 255, 255]);
            }
        }
    }
    let png = png::encode_rgba8(w, h, rgba).unwrap();
    let svg = PaletteVectorizer
        .vectorize(&png, &VectorizeParams::circuit_profile())
        .unwrap();
    assert!(svg.contains(
        r#"fill="rgb(255,0,0)" fill-rule="evenodd" d="M0.5 0L15.5 0L16 0.5L0.5 16L0 15.5L0 0.5Z""#
    ));
}

/// 7x7 red raster with a blue block at `x, y` in `lo..hi`.
fn red_with_blue_block(lo: u32, hi: u32) -> Vec<u8> {
    let mut rgba = Vec::new();
    for y in 0..7 {
        for x in 0..7 {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                rgba.extend_from_slice(&[0, 0, 255, 255]);
            } else {
                rgba.extend_from_slice(&[255, 0, 0, 255]);
            }
        }
    }
    png::encode_rgba8(7, 7, rgba).unwrap()
}

#[test]
fn enclosed_regions_cut_holes() {
    let svg = PaletteVectorizer
        .vectorize(&red_with_blue_block(2, 5), &VectorizeParams::circuit_profile())
        .unwrap();
    assert!(svg.contains(r#"fill="rgb(0,0,255)""#));
    // Red outline and hole, plus the blue block.
    assert_eq!(svg.matches('Z').count(), 3);
}

#[test]
fn speckles_below_path_omit_are_dropped() {
    let params = VectorizeParams {
        min_color_ratio: 0.0,
        ..VectorizeParams::circuit_profile()
    };
    let svg = PaletteVectorizer
        .vectorize(&red_with_blue_block(3, 4), &params)
        .unwrap();
    assert!(!svg.contains("rgb(0,0,255)"));
    assert_eq!(svg.matches('Z').count(), 1);
}

#[test]
fn transparent_raster_yields_empty_svg() {
    let png = png::encode_rgba8(4, 4, vec![0u8; 64]).unwrap();
    let svg = PaletteVectorizer
        .vectorize(&png, &VectorizeParams::circuit_profile())
        .unwrap();
    assert!(!svg.contains("<path"));
    assert!(svg.contains("</svg>"));
}

#[test]
fn background_blending_fills_transparent_pixels() {
    let png = png::encode_rgba8(4, 4, vec![0u8; 64]).unwrap();
    let params =
        VectorizeParams::circuit_profile().with_background(Rgb8 { r: 0, g: 255, b: 0 }, 1.0);
    let svg = PaletteVectorizer.vectorize(&png, &params).unwrap();
    assert!(svg.contains(r#"fill="rgb(0,255,0)""#));
}

#[test]
fn large_rasters_are_downsampled() {
    let svg = PaletteVectorizer
        .vectorize(&two_tone_png(640, 64), &VectorizeParams::circuit_profile())
        .unwrap();
    assert!(svg.contains(r#"width="640" height="64" viewBox="0 0 320 32""#));
}

#[test]
fn small_layers_are_omitted() {
    // 1 blue pixel among 63 red ones: below both the color ratio and the path-omit threshold.
    let mut rgba = Vec::new();
    for i in 0..64 {
        if i == 0 {
            rgba.extend_from_slice(&[0, 0, 255, 255]);
        } else {
            rgba.extend_from_slice(&[255, 0, 0, 255]);
        }
    }
    let png = png::encode_rgba8(8, 8, rgba).unwrap();
    let svg = PaletteVectorizer
        .vectorize(&png, &VectorizeParams::circuit_profile())
        .unwrap();
    assert_eq!(svg.matches("<path").count(), 1);
}

#[test]
fn undecodable_input_is_a_vectorization_error() {
    let err = PaletteVectorizer
        .vectorize(b"nope", &VectorizeParams::circuit_profile())
        .unwrap_err();
    assert!(matches!(err, RenderError::Vectorization(_)));

    let params = VectorizeParams {
        palette_size: 0,
        ..VectorizeParams::circuit_profile()
    };
    assert!(PaletteVectorizer.vectorize(&two_tone_png(2, 2), &params).is_err());
}

#[test]
fn blend_formula_matches_source_over() {
    let mut px = vec![255u8, 0, 0, 128];
    blend_background(&mut px, Rgb8::WHITE, 1.0);
    assert_eq!(px[3], 255);
    assert_eq!(px[0], 255);
    assert!((126..=128).contains(&px[1]));
}
