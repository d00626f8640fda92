use std::path::{Path, PathBuf};

use anyhow::Context as _;
use circuit_render::{
    BackgroundSpec, CacheKey, CircuitDocument, DEFAULT_ENTRYPOINT, Encoding,
    ErrorArtifactFormatter, FileBundle, PaletteVectorizer, PipelineOpts, RasterParams,
    RasterizeOptions, ResvgRasterizer, SvgRasterizer, Vectorizer, decode_compressed_source,
    document_key, frame_camera, normalize_zoom, parse_bundle_param,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "circuit-render", version)]
struct Cli {
    /// Pipeline options JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an error message as an SVG or PNG error image.
    ErrorImage(ErrorImageArgs),
    /// Rasterize an SVG file to PNG.
    Rasterize(RasterizeArgs),
    /// Trace a PNG file into SVG.
    Vectorize(VectorizeArgs),
    /// Summarize a circuit document.
    Inspect(InspectArgs),
    /// Decode a compressed bundle or code parameter and print its files as JSON.
    DecodeBundle(DecodeBundleArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImageFormat {
    Svg,
    Png,
}

#[derive(Parser, Debug)]
struct ErrorImageArgs {
    /// Error message, optionally prefixed with a `Label:`.
    #[arg(long)]
    message: String,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = ImageFormat::Svg)]
    format: ImageFormat,

    /// Output path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RasterizeArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Rendering density in DPI.
    #[arg(long)]
    density: Option<u32>,
}

#[derive(Parser, Debug)]
struct VectorizeArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output SVG.
    #[arg(long)]
    out: PathBuf,

    /// Background color blended under translucent pixels (`#RGB` or `#RRGGBB`).
    #[arg(long)]
    background_color: Option<String>,

    /// Background opacity in `[0, 1]`.
    #[arg(long)]
    background_opacity: Option<f64>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Circuit document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Zoom multiplier used for the camera frame.
    #[arg(long, default_value_t = 1.2)]
    zoom: f64,
}

#[derive(Parser, Debug)]
struct DecodeBundleArgs {
    /// Compressed bundle hash, JSON bundle, base64 JSON bundle, or compressed source.
    #[arg(long)]
    code: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = match &cli.config {
        Some(path) => PipelineOpts::from_path(path)?,
        None => PipelineOpts::default(),
    };

    match cli.cmd {
        Command::ErrorImage(args) => cmd_error_image(args, &opts),
        Command::Rasterize(args) => cmd_rasterize(args, &opts),
        Command::Vectorize(args) => cmd_vectorize(args, &opts),
        Command::Inspect(args) => cmd_inspect(args),
        Command::DecodeBundle(args) => cmd_decode_bundle(args),
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

fn cmd_error_image(args: ErrorImageArgs, opts: &PipelineOpts) -> anyhow::Result<()> {
    let formatter =
        ErrorArtifactFormatter::new(std::sync::Arc::new(ResvgRasterizer::new(&opts.font_dirs)));
    let encoding = match args.format {
        ImageFormat::Svg => Encoding::Svg,
        ImageFormat::Png => Encoding::Png,
    };
    let artifact = formatter.format_message(&args.message, encoding, 500);
    if !artifact.is_image() {
        anyhow::bail!("could not rasterize error image");
    }
    write_output(&args.out, artifact.as_bytes())
}

fn cmd_rasterize(args: RasterizeArgs, opts: &PipelineOpts) -> anyhow::Result<()> {
    let svg = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read svg '{}'", args.in_path.display()))?;
    let raster_opts = RasterizeOptions {
        width: args.width,
        height: args.height,
        density: args.density,
    };
    let png = ResvgRasterizer::new(&opts.font_dirs).rasterize(&svg, &raster_opts)?;
    write_output(&args.out, &png)
}

fn cmd_vectorize(args: VectorizeArgs, opts: &PipelineOpts) -> anyhow::Result<()> {
    let png = std::fs::read(&args.in_path)
        .with_context(|| format!("read png '{}'", args.in_path.display()))?;
    let bg = BackgroundSpec::new(args.background_color.as_deref(), args.background_opacity);
    let params = opts.vectorize.clone().with_background(bg.rgb, bg.opacity);
    let svg = PaletteVectorizer.vectorize(&png, &params)?;
    write_output(&args.out, svg.as_bytes())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read circuit document '{}'", args.in_path.display()))?;
    let doc = CircuitDocument::from_json_str(&text)?;
    let doc_key = document_key(&doc)?;
    let zoom = normalize_zoom(args.zoom);
    let frame = frame_camera(&doc, zoom);
    let raster_key = CacheKey::raster(
        &doc_key,
        &RasterParams {
            width: 1024,
            height: 1024,
            zoom,
            grid: false,
            baked_background: None,
        },
    );

    let summary = serde_json::json!({
        "elements": doc.len(),
        "board": doc.board_dimensions().map(|s| [s.width, s.height]),
        "fatal_errors": doc
            .fatal_errors()
            .iter()
            .map(|e| serde_json::json!({"type": e.kind, "message": e.message}))
            .collect::<Vec<_>>(),
        "camera": {"position": frame.position, "look_at": frame.look_at},
        "document_key": doc_key.as_str(),
        "scene_key": CacheKey::scene(&doc_key).as_str(),
        "raster_key": raster_key.as_str(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_decode_bundle(args: DecodeBundleArgs) -> anyhow::Result<()> {
    let bundle = match parse_bundle_param(&args.code) {
        Some(bundle) => bundle,
        None => {
            let source = decode_compressed_source(&args.code)?;
            FileBundle::from([(DEFAULT_ENTRYPOINT.to_owned(), source)])
        }
    };
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
