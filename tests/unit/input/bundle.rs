use super::*;

fn sample() -> FileBundle {
    FileBundle::from([
        ("index.tsx".to_owned(), "export default () => <board />".to_owned()),
        ("lib/util.ts".to_owned(), "export const x = 1".to_owned()),
    ])
}

#[test]
fn compressed_hash_round_trips() {
    let hash = encode_bundle_to_hash(&sample()).unwrap();
    assert_eq!(decode_compressed_bundle(&hash), Some(sample()));
}

#[test]
fn accepts_url_safe_and_unpadded_hashes() {
    let hash = encode_bundle_to_hash(&sample()).unwrap();
    let url_safe = hash.replace('+', "-").replace('/', "_");
    assert_eq!(decode_compressed_bundle(&url_safe), Some(sample()));
    let unpadded = hash.trim_end_matches('=');
    assert_eq!(decode_compressed_bundle(unpadded), Some(sample()));
}

#[test]
fn rejects_garbage_and_non_string_values() {
    assert_eq!(decode_compressed_bundle("not base64!!"), None);
    assert_eq!(decode_compressed_bundle(&STANDARD.encode(b"plain")), None);

    let non_string = STANDARD.encode(gzip(br#"{"index.tsx": 1}"#).unwrap());
    assert_eq!(decode_compressed_bundle(&non_string), None);
}

#[test]
fn bundle_param_accepts_three_encodings() {
    let raw = serde_json::to_string(&sample()).unwrap();
    assert_eq!(parse_bundle_param(&raw), Some(sample()));
    assert_eq!(parse_bundle_param(&STANDARD.encode(&raw)), Some(sample()));
    let hash = encode_bundle_to_hash(&sample()).unwrap();
    assert_eq!(parse_bundle_param(&hash), Some(sample()));

    assert_eq!(parse_bundle_param("[1,2]"), None);
    assert_eq!(parse_bundle_param(""), None);
}

#[test]
fn bundle_value_accepts_inline_objects() {
    let v = serde_json::json!({"index.tsx": "x"});
    assert_eq!(
        parse_bundle_value(&v),
        Some(FileBundle::from([("index.tsx".to_owned(), "x".to_owned())]))
    );
    assert_eq!(parse_bundle_value(&serde_json::json!(42)), None);
}

#[test]
fn compressed_source_round_trips() {
    let code = encode_compressed_source("circuit.add(<resistor />)").unwrap();
    assert_eq!(decode_compressed_source(&code).unwrap(), "circuit.add(<resistor />)");
    assert!(matches!(
        decode_compressed_source("%%%"),
        Err(RenderError::Evaluation(_))
    ));
    assert!(matches!(
        decode_compressed_source(&STANDARD.encode(b"not gzip")),
        Err(RenderError::Evaluation(_))
    ));
}
