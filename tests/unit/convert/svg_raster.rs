use super::*;

const RED_SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10"><rect width="20" height="10" fill="#ff0000"/></svg>"##;

fn opts(width: Option<u32>, height: Option<u32>, density: Option<u32>) -> RasterizeOptions {
    RasterizeOptions {
        width,
        height,
        density,
    }
}

#[test]
fn geometry_native_and_density() {
    let g = raster_geometry(20.0, 10.0, &RasterizeOptions::default()).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (20, 10));
    assert_eq!(g.scale, 1.0);

    let g = raster_geometry(20.0, 10.0, &opts(None, None, Some(72))).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (20, 10));

    let g = raster_geometry(20.0, 10.0, &opts(None, None, Some(144))).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (40, 20));
    assert_eq!(g.scale, 2.0);
}

#[test]
fn geometry_single_dimension_keeps_aspect() {
    let g = raster_geometry(20.0, 10.0, &opts(Some(100), None, None)).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (100, 50));

    let g = raster_geometry(20.0, 10.0, &opts(None, Some(30), None)).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (60, 30));
}

#[test]
fn geometry_contain_centers_with_padding() {
    let g = raster_geometry(20.0, 10.0, &opts(Some(100), Some(100), None)).unwrap();
    assert_eq!((g.canvas_w, g.canvas_h), (100, 100));
    assert_eq!(g.scale, 5.0);
    assert_eq!(g.offset_x, 0.0);
    assert_eq!(g.offset_y, 25.0);
}

#[test]
fn geometry_rejects_degenerate_and_huge() {
    assert!(raster_geometry(0.0, 10.0, &RasterizeOptions::default()).is_err());
    assert!(raster_geometry(f32::NAN, 10.0, &RasterizeOptions::default()).is_err());
    assert!(raster_geometry(20.0, 10.0, &opts(Some(100_000), None, None)).is_err());
}

#[test]
fn font_families_are_normalized() {
    let svg = r#"<text font-family="Inter, Helvetica">a</text><text font-family='x'>b</text>"#;
    let out = normalize_font_families(svg);
    assert!(out.contains(&format!(r#"font-family="{RASTER_FONT_STACK}""#)));
    assert!(!out.contains("Inter"));
    // Single-quoted attributes are left untouched.
    assert!(out.contains("font-family='x'"));
}

#[test]
fn rasterizes_with_contain_padding() {
    let r = ResvgRasterizer::with_fontdb(Arc::new(usvg::fontdb::Database::new()));
    let bytes = r
        .rasterize(RED_SQUARE, &opts(Some(40), Some(40), None))
        .unwrap();
    let decoded = png::decode_rgba8(&bytes).unwrap();
    assert_eq!((decoded.width, decoded.height), (40, 40));

    let px = |x: u32, y: u32| {
        let i = ((y * decoded.width + x) * 4) as usize;
        decoded.rgba8[i..i + 4].to_vec()
    };
    // Top padding stays transparent, center is red.
    assert_eq!(px(20, 2)[3], 0);
    assert_eq!(px(20, 20), vec![255, 0, 0, 255]);
}

#[test]
fn invalid_svg_is_a_conversion_failure() {
    let r = ResvgRasterizer::with_fontdb(Arc::new(usvg::fontdb::Database::new()));
    assert!(r.rasterize("<svg", &RasterizeOptions::default()).is_err());
}
