/// Convenience result type used across the render pipeline.
pub type RenderResult<T> = Result<T, RenderError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Malformed or absent circuit source supplied by the client.
    #[error("input error: {0}")]
    Input(String),

    /// The evaluation sandbox failed, could not decode its input, or never settled.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The circuit document contains fatal error elements.
    #[error("circuit validation error: {0}")]
    CircuitValidation(String),

    /// A per-view or 3D converter failed or returned an unexpected shape.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Raster vectorization failed. Resolved internally by the raster-embed fallback.
    #[error("vectorization error: {0}")]
    Vectorization(String),

    /// Errors when serializing or deserializing documents or configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    /// Build a [`RenderError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`RenderError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`RenderError::CircuitValidation`] value.
    pub fn circuit_validation(msg: impl Into<String>) -> Self {
        Self::CircuitValidation(msg.into())
    }

    /// Build a [`RenderError::Conversion`] value.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Build a [`RenderError::Vectorization`] value.
    pub fn vectorization(msg: impl Into<String>) -> Self {
        Self::Vectorization(msg.into())
    }

    /// Build a [`RenderError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// HTTP-equivalent status for structured (JSON) error bodies.
    ///
    /// Client-caused failures map to `400`; everything else is a `500`.
    pub fn status(&self) -> u16 {
        match self {
            Self::Input(_) | Self::CircuitValidation(_) => 400,
            _ => 500,
        }
    }

    /// The message without the variant prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::Input(m)
            | Self::Evaluation(m)
            | Self::CircuitValidation(m)
            | Self::Conversion(m)
            | Self::Vectorization(m)
            | Self::Serde(m) => m.clone(),
            Self::Other(e) => format!("{e:#}"),
        }
    }

    /// Whether the error was caused by the request rather than the pipeline.
    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
