use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(RenderError::input("x").to_string().contains("input error:"));
    assert!(
        RenderError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        RenderError::circuit_validation("x")
            .to_string()
            .contains("circuit validation error:")
    );
    assert!(
        RenderError::conversion("x")
            .to_string()
            .contains("conversion error:")
    );
    assert!(
        RenderError::vectorization("x")
            .to_string()
            .contains("vectorization error:")
    );
    assert!(
        RenderError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RenderError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn client_errors_map_to_400() {
    assert_eq!(RenderError::input("x").status(), 400);
    assert_eq!(RenderError::circuit_validation("x").status(), 400);
    assert!(RenderError::input("x").is_client_error());

    assert_eq!(RenderError::evaluation("x").status(), 500);
    assert_eq!(RenderError::conversion("x").status(), 500);
    assert!(!RenderError::conversion("x").is_client_error());
}

#[test]
fn serde_json_errors_convert() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err = RenderError::from(e);
    assert!(matches!(err, RenderError::Serde(_)));
}

#[test]
fn detail_drops_variant_prefix() {
    assert_eq!(
        RenderError::conversion("Error: bad net").detail(),
        "Error: bad net"
    );
    let err = RenderError::from(anyhow::anyhow!("inner").context("outer"));
    assert_eq!(err.detail(), "outer: inner");
}
