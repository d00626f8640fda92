use std::{collections::BTreeMap, io::Read as _, io::Write as _};

use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde_json::Value;

use crate::foundation::error::{RenderError, RenderResult};

/// File path to source text. Ordered so serialization is stable.
pub type FileBundle = BTreeMap<String, String>;

fn decode_base64(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(text).ok())
}

fn gunzip(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .context("gunzip payload")?;
    Ok(out)
}

fn gzip(bytes: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(bytes).context("gzip payload")?;
    enc.finish().context("finish gzip stream")
}

/// Accept only JSON objects whose values are all strings.
fn bundle_from_value(v: Value) -> Option<FileBundle> {
    let Value::Object(map) = v else {
        return None;
    };
    map.into_iter()
        .map(|(path, src)| match src {
            Value::String(s) => Some((path, s)),
            _ => None,
        })
        .collect()
}

fn bundle_from_json(text: &str) -> Option<FileBundle> {
    bundle_from_value(serde_json::from_str(text).ok()?)
}

/// Decode a compressed bundle hash: base64, then gzip, then a UTF-8 JSON object of strings.
pub fn decode_compressed_bundle(hash: &str) -> Option<FileBundle> {
    let compressed = decode_base64(hash)?;
    let raw = gunzip(&compressed).ok()?;
    let text = std::str::from_utf8(&raw).ok()?;
    bundle_from_json(text)
}

/// Inverse of [`decode_compressed_bundle`]: JSON, gzip, standard base64.
pub fn encode_bundle_to_hash(bundle: &FileBundle) -> RenderResult<String> {
    let text = serde_json::to_vec(bundle)?;
    Ok(STANDARD.encode(gzip(&text)?))
}

/// Decode a compressed single source file: base64, then gzip, then UTF-8 text.
pub fn decode_compressed_source(code: &str) -> RenderResult<String> {
    let compressed = decode_base64(code)
        .ok_or_else(|| RenderError::evaluation("compressed code is not valid base64"))?;
    let raw = gunzip(&compressed)
        .map_err(|e| RenderError::evaluation(format!("decompress code: {e:#}")))?;
    String::from_utf8(raw).map_err(|_| RenderError::evaluation("compressed code is not UTF-8"))
}

/// Parse a bundle supplied as a request parameter.
///
/// Tries a compressed hash, then a raw JSON object, then a base64-encoded JSON object.
pub fn parse_bundle_param(value: &str) -> Option<FileBundle> {
    if let Some(bundle) = decode_compressed_bundle(value) {
        return Some(bundle);
    }
    if let Some(bundle) = bundle_from_json(value) {
        return Some(bundle);
    }
    let decoded = decode_base64(value)?;
    bundle_from_json(std::str::from_utf8(&decoded).ok()?)
}

/// Accept a bundle given either as a string parameter or as an inline JSON object.
pub fn parse_bundle_value(value: &Value) -> Option<FileBundle> {
    match value {
        Value::String(s) => parse_bundle_param(s),
        other => bundle_from_value(other.clone()),
    }
}

/// gzip + base64 a single source file. Used to build compressed code parameters.
pub fn encode_compressed_source(source: &str) -> RenderResult<String> {
    Ok(STANDARD.encode(gzip(source.as_bytes())?))
}

#[cfg(test)]
#[path = "../../tests/unit/input/bundle.rs"]
mod tests;
