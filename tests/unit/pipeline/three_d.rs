use super::*;

fn bg(color: &str, opacity: f64) -> BackgroundSpec {
    BackgroundSpec::new(Some(color), Some(opacity))
}

#[test]
fn background_rect_follows_opening_tag() {
    let svg = r#"<svg width="4" height="4"><path d="M0 0h1v1h-1z"/></svg>"#;
    let out = inject_background(svg, &bg("#000", 0.5));
    assert_eq!(
        out,
        r##"<svg width="4" height="4"><rect width="100%" height="100%" fill="#000" fill-opacity="0.5"/><path d="M0 0h1v1h-1z"/></svg>"##
    );
}

#[test]
fn transparent_background_injects_nothing() {
    let svg = "<svg><g/></svg>";
    assert!(matches!(
        inject_background(svg, &BackgroundSpec::default()),
        Cow::Borrowed(_)
    ));
}

#[test]
fn only_first_svg_tag_gets_a_rect() {
    let svg = "<SVG a='1'><svg b='2'/></SVG>";
    let out = inject_background(svg, &bg("#fff", 1.0));
    assert_eq!(out.matches("<rect").count(), 1);
    assert!(out.starts_with("<SVG a='1'><rect"));
}

#[test]
fn compaction_removes_layout_whitespace() {
    let svg = "  <svg>\n    <g>  <path d=\"M0 0\"/>\n  </g>\n</svg>\n";
    assert_eq!(compact_svg(svg), r#"<svg><g><path d="M0 0"/></g></svg>"#);
}

#[test]
fn embedded_raster_uses_png_dimensions() {
    let raster = png::encode_rgba8(3, 2, vec![255; 3 * 2 * 4]).unwrap();
    let svg = embed_raster(&raster, &BackgroundSpec::default()).unwrap();
    assert!(svg.contains(r#"width="3" height="2""#));
    assert!(svg.contains("data:image/png;base64,"));
    assert!(svg.contains("<image"));
    assert!(!svg.contains("<rect"));

    assert!(embed_raster(b"not a png", &BackgroundSpec::default()).is_err());
}

#[test]
fn raster_defaults() {
    let d = RasterDefaults::default();
    assert_eq!(d.png_size, 1024);
    assert_eq!(d.svg_raster_size, 1024);
}
