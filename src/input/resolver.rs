use std::{
    sync::{Arc, mpsc},
    time::Duration,
};

use serde_json::Value;

use crate::{
    circuit::document::CircuitDocument,
    foundation::error::{RenderError, RenderResult},
    input::bundle::{
        FileBundle, decode_compressed_bundle, decode_compressed_source, parse_bundle_value,
    },
};

/// Entrypoint used when a bundle does not name one.
pub const DEFAULT_ENTRYPOINT: &str = "index.tsx";

/// Default wall-clock budget for one sandbox evaluation.
pub const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Every way a request can describe a circuit.
///
/// Precedence when several are present: `circuit_json`, then `bundle`, then `compressed_code`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CircuitSource {
    /// Pre-evaluated circuit document.
    pub circuit_json: Option<CircuitDocument>,
    /// Source files to evaluate.
    pub bundle: Option<FileBundle>,
    /// Compressed bundle hash or compressed single source file.
    pub compressed_code: Option<String>,
    /// Bundle file to evaluate first.
    pub entrypoint: Option<String>,
    /// File whose default export is the board to render.
    pub main_component_path: Option<String>,
    /// Base URL that relative project imports resolve against.
    pub project_base_url: Option<String>,
}

fn non_blank_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

impl CircuitSource {
    /// Source holding an already evaluated document.
    pub fn from_document(doc: CircuitDocument) -> Self {
        Self {
            circuit_json: Some(doc),
            ..Self::default()
        }
    }

    /// Source holding a bundle of files.
    pub fn from_bundle(bundle: FileBundle) -> Self {
        Self {
            bundle: Some(bundle),
            ..Self::default()
        }
    }

    /// Source holding a compressed code parameter.
    pub fn from_compressed_code(code: impl Into<String>) -> Self {
        Self {
            compressed_code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Read the circuit fields of a JSON request body.
    ///
    /// Recognizes `circuit_json`, `fs_map`/`fsMap` (inline object or any encoding accepted by
    /// [`crate::parse_bundle_param`]), `code`, `entrypoint`, `main_component_path` and
    /// `project_base_url`. A bundle that cannot be parsed is an input error.
    pub fn from_request_body(body: &Value) -> RenderResult<Self> {
        if !body.is_object() {
            return Err(RenderError::input("Invalid JSON in request body"));
        }
        let mut src = Self::default();

        if let Some(v) = body.get("circuit_json").filter(|v| !v.is_null()) {
            src.circuit_json = Some(CircuitDocument::from_value(v.clone())?);
        }
        if let Some(v) = body
            .get("fsMap")
            .filter(|v| !v.is_null())
            .or_else(|| body.get("fs_map").filter(|v| !v.is_null()))
        {
            src.bundle = Some(
                parse_bundle_value(v)
                    .ok_or_else(|| RenderError::input("Invalid fs_map provided in request body"))?,
            );
        }
        src.compressed_code = non_blank_str(body, "code").map(str::to_owned);
        src.entrypoint = non_blank_str(body, "entrypoint").map(str::to_owned);
        src.main_component_path = non_blank_str(body, "main_component_path").map(str::to_owned);
        src.project_base_url = non_blank_str(body, "project_base_url").map(str::to_owned);
        Ok(src)
    }
}

/// One unit of work for an [`EvaluationSandbox`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationJob {
    /// Files to evaluate.
    pub bundle: FileBundle,
    /// File evaluated first.
    pub entrypoint: String,
    /// File whose default export is the board to render.
    pub main_component_path: Option<String>,
    /// Base URL for relative project imports.
    pub project_base_url: Option<String>,
}

/// Isolated executor that evaluates user source into a circuit document.
///
/// Implementations run the code, wait for every asynchronous part of the circuit to settle and
/// return the final document. The call blocks; the resolver enforces the deadline.
pub trait EvaluationSandbox: Send + Sync {
    /// Evaluate `job` into a circuit document.
    fn execute(&self, job: &EvaluationJob) -> RenderResult<CircuitDocument>;
}

/// Normalizes a [`CircuitSource`] into a [`CircuitDocument`].
#[derive(Clone)]
pub struct InputResolver {
    sandbox: Option<Arc<dyn EvaluationSandbox>>,
    timeout: Duration,
    default_entrypoint: String,
}

impl std::fmt::Debug for InputResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputResolver")
            .field("has_sandbox", &self.sandbox.is_some())
            .field("timeout", &self.timeout)
            .field("default_entrypoint", &self.default_entrypoint)
            .finish()
    }
}

impl InputResolver {
    /// Resolver that evaluates source through `sandbox`.
    pub fn new(sandbox: Arc<dyn EvaluationSandbox>) -> Self {
        Self {
            sandbox: Some(sandbox),
            timeout: DEFAULT_EVALUATION_TIMEOUT,
            default_entrypoint: DEFAULT_ENTRYPOINT.to_owned(),
        }
    }

    /// Resolver that only accepts pre-evaluated documents.
    pub fn documents_only() -> Self {
        Self {
            sandbox: None,
            timeout: DEFAULT_EVALUATION_TIMEOUT,
            default_entrypoint: DEFAULT_ENTRYPOINT.to_owned(),
        }
    }

    /// Set the evaluation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the entrypoint used when a source does not name one.
    pub fn with_default_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.default_entrypoint = entrypoint.into();
        self
    }

    /// Produce the circuit document described by `src`.
    #[tracing::instrument(skip(self, src))]
    pub fn resolve(&self, src: &CircuitSource) -> RenderResult<CircuitDocument> {
        if let Some(doc) = &src.circuit_json {
            return Ok(doc.clone());
        }
        if let Some(bundle) = &src.bundle {
            return self.evaluate(self.job(src, bundle.clone()));
        }
        if let Some(code) = &src.compressed_code {
            let bundle = match decode_compressed_bundle(code) {
                Some(bundle) => bundle,
                None => {
                    // A lone source is stored under the entrypoint the job will run.
                    let source = decode_compressed_source(code)?;
                    FileBundle::from([(self.entrypoint(src), source)])
                }
            };
            return self.evaluate(self.job(src, bundle));
        }
        Err(RenderError::input("No circuit data provided"))
    }

    fn entrypoint(&self, src: &CircuitSource) -> String {
        src.entrypoint
            .clone()
            .unwrap_or_else(|| self.default_entrypoint.clone())
    }

    fn job(&self, src: &CircuitSource, bundle: FileBundle) -> EvaluationJob {
        EvaluationJob {
            bundle,
            entrypoint: self.entrypoint(src),
            main_component_path: src.main_component_path.clone(),
            project_base_url: src.project_base_url.clone(),
        }
    }

    fn evaluate(&self, job: EvaluationJob) -> RenderResult<CircuitDocument> {
        let sandbox = self
            .sandbox
            .clone()
            .ok_or_else(|| RenderError::evaluation("no evaluation sandbox configured"))?;

        tracing::debug!(
            files = job.bundle.len(),
            entrypoint = %job.entrypoint,
            "evaluating circuit source"
        );

        // The worker is detached: on timeout its result is dropped with the channel.
        let (tx, rx) = mpsc::sync_channel(1);
        std::thread::Builder::new()
            .name("circuit-eval".to_owned())
            .spawn(move || {
                let _ = tx.send(sandbox.execute(&job));
            })
            .map_err(|e| RenderError::evaluation(format!("spawn evaluation worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result.map_err(|e| match e {
                RenderError::Evaluation(_) => e,
                other => RenderError::evaluation(other.to_string()),
            }),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "evaluation timed out"
                );
                Err(RenderError::evaluation(format!(
                    "circuit evaluation timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(RenderError::evaluation("evaluation worker panicked"))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/resolver.rs"]
mod tests;
