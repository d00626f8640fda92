use std::sync::Arc;

use crate::{
    artifact::Artifact,
    cache::ArtifactCaches,
    circuit::document::CircuitDocument,
    config::PipelineOpts,
    convert::{Collaborators, RasterizeOptions, SvgView, ViewOptions},
    error_artifact::ErrorArtifactFormatter,
    foundation::error::{RenderError, RenderResult},
    input::{CircuitSource, EvaluationSandbox, InputResolver},
    pipeline::three_d::{RasterDefaults, ThreeDPipeline},
    request::{Encoding, RenderRequest, View},
};

/// Routes a resolved document and a request to the right converter chain.
///
/// One dispatcher is meant to live for the whole process and be shared across request threads;
/// its only mutable state is the pair of artifact caches.
#[derive(Clone, Debug)]
pub struct RenderDispatcher {
    collaborators: Collaborators,
    resolver: InputResolver,
    three_d: ThreeDPipeline,
    errors: ErrorArtifactFormatter,
}

impl RenderDispatcher {
    /// Build a dispatcher with fresh caches sized from `opts`.
    ///
    /// Without [`RenderDispatcher::with_sandbox`] only pre-evaluated documents can be rendered.
    pub fn new(collaborators: Collaborators, opts: &PipelineOpts) -> Self {
        let caches = Arc::new(ArtifactCaches::new(
            opts.scene_cache_capacity,
            opts.raster_cache_capacity,
        ));
        let three_d = ThreeDPipeline::new(
            collaborators.scenes.clone(),
            collaborators.scene_rasterizer.clone(),
            collaborators.vectorizer.clone(),
            caches,
        )
        .with_defaults(RasterDefaults {
            png_size: opts.default_png_size,
            svg_raster_size: opts.svg_raster_size,
        })
        .with_profile(opts.vectorize.clone());
        let resolver = InputResolver::documents_only()
            .with_timeout(opts.evaluation_timeout())
            .with_default_entrypoint(opts.default_entrypoint.clone());

        Self {
            errors: ErrorArtifactFormatter::new(collaborators.svg_rasterizer.clone()),
            collaborators,
            resolver,
            three_d,
        }
    }

    /// Evaluate source inputs with `sandbox`.
    pub fn with_sandbox(
        mut self,
        sandbox: Arc<dyn EvaluationSandbox>,
        opts: &PipelineOpts,
    ) -> Self {
        self.resolver = InputResolver::new(sandbox)
            .with_timeout(opts.evaluation_timeout())
            .with_default_entrypoint(opts.default_entrypoint.clone());
        self
    }

    /// The GLB and raster caches.
    pub fn caches(&self) -> &ArtifactCaches {
        self.three_d.caches()
    }

    /// The error formatter used by the catch-all entry points.
    pub fn error_formatter(&self) -> &ErrorArtifactFormatter {
        &self.errors
    }

    /// Render `doc` per `req`, surfacing failures as errors.
    #[tracing::instrument(
        skip(self, doc, req),
        fields(view = %req.view, encoding = req.encoding.as_str())
    )]
    pub fn render(&self, doc: &CircuitDocument, req: &RenderRequest) -> RenderResult<Artifact> {
        doc.ensure_renderable()?;

        if req.encoding == Encoding::RawDocument {
            return Ok(Artifact::json(doc.to_json_string()?, 200));
        }

        let Some(view) = req.view.svg_view() else {
            return self.three_d.render(doc, req);
        };

        let svg = self.view_svg(view, doc, req)?;
        match req.encoding {
            Encoding::Png => {
                let opts = RasterizeOptions {
                    width: req.width,
                    height: req.height,
                    density: req.density,
                };
                Ok(Artifact::png(self.collaborators.svg_rasterizer.rasterize(&svg, &opts)?))
            }
            _ => Ok(Artifact::svg(svg)),
        }
    }

    fn view_svg(
        &self,
        view: SvgView,
        doc: &CircuitDocument,
        req: &RenderRequest,
    ) -> RenderResult<String> {
        let mut opts = ViewOptions::default();
        match req.view {
            View::Pcb => opts.show_solder_mask = req.show_solder_mask,
            View::SchematicSimulation => {
                let experiment_id = req
                    .simulation
                    .experiment_id
                    .clone()
                    .or_else(|| doc.first_simulation_experiment_id().map(str::to_owned))
                    .ok_or_else(|| {
                        RenderError::input(
                            "simulation_experiment_id is required and could not be automatically determined",
                        )
                    })?;
                opts.simulation_experiment_id = Some(experiment_id);
                opts.simulation_transient_voltage_graph_ids =
                    req.simulation.transient_graph_ids.clone();
                opts.schematic_height_ratio = req.simulation.schematic_height_ratio;
            }
            _ => {}
        }

        let svg = self.collaborators.views.convert(view, doc, &opts)?;
        if !svg.contains("<svg") {
            return Err(RenderError::conversion(format!(
                "{} converter did not return SVG",
                req.view
            )));
        }
        Ok(svg)
    }

    /// Render `doc` per `req`; failures become error artifacts.
    pub fn render_or_error(&self, doc: &CircuitDocument, req: &RenderRequest) -> Artifact {
        match self.render(doc, req) {
            Ok(artifact) => artifact,
            Err(e) => self.error_artifact(&e, req.encoding),
        }
    }

    /// Resolve `src` into a document and render it; failures become error artifacts.
    pub fn render_source(&self, src: &CircuitSource, req: &RenderRequest) -> Artifact {
        match self
            .resolver
            .resolve(src)
            .and_then(|doc| self.render(&doc, req))
        {
            Ok(artifact) => artifact,
            Err(e) => self.error_artifact(&e, req.encoding),
        }
    }

    fn error_artifact(&self, err: &RenderError, encoding: Encoding) -> Artifact {
        if err.is_client_error() {
            tracing::info!(error = %err, "render rejected");
        } else {
            tracing::error!(error = %err, "render failed");
        }
        self.errors.format(err, encoding)
    }

    /// Liveness probe body.
    pub fn health(&self) -> Artifact {
        Artifact::json_ok()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/dispatch.rs"]
mod tests;
