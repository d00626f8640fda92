use serde::Serialize;

/// `Content-Type` for SVG artifacts.
pub const CONTENT_TYPE_SVG: &str = "image/svg+xml";
/// `Content-Type` for PNG artifacts.
pub const CONTENT_TYPE_PNG: &str = "image/png";
/// `Content-Type` for JSON artifacts.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Payload of an [`Artifact`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactBody {
    /// UTF-8 text (SVG or JSON).
    Text(String),
    /// Binary payload (PNG).
    Bytes(Vec<u8>),
}

/// Final output of a render: content type, HTTP-equivalent status, and body.
///
/// The pipeline never frames HTTP responses itself; callers map this onto whatever transport they
/// use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// MIME type of `body`.
    pub content_type: &'static str,
    /// HTTP-equivalent status code.
    pub status: u16,
    /// Artifact payload.
    pub body: ArtifactBody,
    /// Whether this artifact depicts a failure (error image or error JSON).
    pub is_error: bool,
}

#[derive(Serialize)]
struct JsonStatus<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Artifact {
    /// Successful SVG artifact.
    pub fn svg(svg: impl Into<String>) -> Self {
        Self {
            content_type: CONTENT_TYPE_SVG,
            status: 200,
            body: ArtifactBody::Text(svg.into()),
            is_error: false,
        }
    }

    /// Successful PNG artifact.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            content_type: CONTENT_TYPE_PNG,
            status: 200,
            body: ArtifactBody::Bytes(bytes),
            is_error: false,
        }
    }

    /// JSON artifact with an explicit status.
    pub fn json(text: impl Into<String>, status: u16) -> Self {
        Self {
            content_type: CONTENT_TYPE_JSON,
            status,
            body: ArtifactBody::Text(text.into()),
            is_error: status >= 400,
        }
    }

    /// `{"ok":false,"error":...}` body with the given status.
    pub fn json_error(message: &str, status: u16) -> Self {
        let body = JsonStatus {
            ok: false,
            error: Some(message),
        };
        // Serializing a struct of a bool and a &str cannot fail.
        let text = serde_json::to_string(&body).unwrap_or_else(|_| r#"{"ok":false}"#.to_owned());
        Self::json(text, status)
    }

    /// `{"ok":true}` body.
    pub fn json_ok() -> Self {
        Self::json(r#"{"ok":true}"#, 200)
    }

    /// Mark this artifact as depicting a failure.
    pub(crate) fn into_error(mut self) -> Self {
        self.is_error = true;
        self
    }

    /// Body as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.body {
            ArtifactBody::Text(s) => s.as_bytes(),
            ArtifactBody::Bytes(b) => b,
        }
    }

    /// Body as text, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            ArtifactBody::Text(s) => Some(s),
            ArtifactBody::Bytes(_) => None,
        }
    }

    /// Whether the artifact is an image (SVG or PNG).
    pub fn is_image(&self) -> bool {
        self.content_type == CONTENT_TYPE_SVG || self.content_type == CONTENT_TYPE_PNG
    }

    /// Suggested `Cache-Control` header value.
    ///
    /// Successful images are content-addressed by their request and may be cached forever; error
    /// images are cached for a day; JSON errors are never cached.
    pub fn cache_control(&self) -> &'static str {
        match (self.is_image(), self.is_error) {
            (true, false) => "public, max-age=86400, s-maxage=31536000, immutable",
            (true, true) => "public, max-age=86400, s-maxage=86400",
            (false, false) => "no-cache",
            (false, true) => "no-store",
        }
    }
}
