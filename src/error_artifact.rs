use std::{fmt::Write as _, sync::Arc};

use crate::{
    artifact::Artifact,
    convert::{RasterizeOptions, SvgRasterizer},
    foundation::error::RenderError,
    request::Encoding,
};

/// Characters per wrapped line.
pub const WRAP_WIDTH: usize = 33;
/// Lines kept before the message is cut with an ellipsis.
pub const MAX_LINES: usize = 3;

const LINE_HEIGHT: f64 = 24.0;
const TOP_MARGIN: f64 = 50.0;
const BOTTOM_MARGIN: f64 = 20.0;
const HORIZONTAL_PADDING: f64 = 40.0;
const CHAR_WIDTH: f64 = 8.0;
const ASPECT: f64 = 16.0 / 9.0;

const BACKGROUND: &str = "#FEF2F2";
const TEXT_COLOR: &str = "#dc2626";
const FONT: &str = "400 16px/1.4 'Segoe UI', system-ui, sans-serif";

/// Drop a leading `"<Label>:"` (everything up to the first colon) and trim.
pub fn strip_label_prefix(message: &str) -> &str {
    match message.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => message.trim(),
    }
}

/// Greedy word wrap at [`WRAP_WIDTH`] characters, capped at [`MAX_LINES`] lines.
///
/// Words longer than a line are hard-broken every [`WRAP_WIDTH`] characters. When text is cut,
/// the last line ends with `…`.
pub fn wrap_message(message: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in message.split_whitespace().flat_map(line_pieces) {
        let len = current.chars().count();
        if len > 0 && len + 1 + word.chars().count() > WRAP_WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    lines.push(current);

    if lines.len() > MAX_LINES {
        lines.truncate(MAX_LINES);
        if let Some(last) = lines.last_mut() {
            let keep = last.chars().count().min(WRAP_WIDTH - 1);
            *last = last.chars().take(keep).collect::<String>().trim_end().to_owned();
            last.push('…');
        }
    }
    lines
}

/// Split `word` into pieces of at most [`WRAP_WIDTH`] characters.
fn line_pieces(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(WRAP_WIDTH)
        .map(|piece| piece.iter().collect())
        .collect()
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Canvas size for `lines`, stretched to 16:9.
fn canvas_size(lines: &[String]) -> (f64, f64) {
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let w = longest as f64 * CHAR_WIDTH + HORIZONTAL_PADDING;
    let h = TOP_MARGIN + lines.len() as f64 * LINE_HEIGHT + BOTTOM_MARGIN;
    let ratio = w / h;
    if ratio < ASPECT {
        (h * ASPECT, h)
    } else if ratio > ASPECT {
        (w, w / ASPECT)
    } else {
        (w, h)
    }
}

/// Render `message` as a self-contained error image.
pub fn error_svg(message: &str) -> String {
    let lines = wrap_message(strip_label_prefix(message));
    let (w, h) = canvas_size(&lines);

    let mut spans = String::new();
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { LINE_HEIGHT };
        let _ = write!(
            spans,
            r#"<tspan x="50%" dy="{dy}">{}</tspan>"#,
            xml_escape(line)
        );
    }

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="100%" height="100%" preserveAspectRatio="xMidYMid meet"><rect width="100%" height="100%" fill="{BACKGROUND}"/><style>.error-subtext {{ font: {FONT}; fill: {TEXT_COLOR}; }}</style><g transform="translate(0, {TOP_MARGIN})"><text x="50%" y="0" class="error-subtext" text-anchor="middle" fill="{TEXT_COLOR}">{spans}</text></g></svg>"#
    )
}

/// Turns failures into artifacts a client can display.
#[derive(Clone)]
pub struct ErrorArtifactFormatter {
    rasterizer: Arc<dyn SvgRasterizer>,
}

impl std::fmt::Debug for ErrorArtifactFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorArtifactFormatter").finish_non_exhaustive()
    }
}

impl ErrorArtifactFormatter {
    /// Formatter rasterizing PNG error images with `rasterizer`.
    pub fn new(rasterizer: Arc<dyn SvgRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Artifact describing `err` in `encoding`. Never fails.
    pub fn format(&self, err: &RenderError, encoding: Encoding) -> Artifact {
        self.format_message(&err.detail(), encoding, err.status())
    }

    /// Artifact describing `message`. `status` is used only for JSON bodies.
    pub fn format_message(&self, message: &str, encoding: Encoding, status: u16) -> Artifact {
        match encoding {
            Encoding::Svg => Artifact::svg(error_svg(message)).into_error(),
            Encoding::Png => self.png(message),
            Encoding::RawDocument => Artifact::json_error(message, status),
        }
    }

    fn png(&self, message: &str) -> Artifact {
        let svg = error_svg(message);
        let (w, h) = canvas_size(&wrap_message(strip_label_prefix(message)));
        let opts = RasterizeOptions {
            width: Some(w.ceil() as u32),
            height: Some(h.ceil() as u32),
            density: None,
        };
        // Panicking rasterizers are treated like failing ones.
        let rasterized = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.rasterizer.rasterize(&svg, &opts)
        }));
        match rasterized {
            Ok(Ok(png)) => Artifact::png(png).into_error(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "error image rasterization failed");
                Artifact::json_error(message, 500)
            }
            Err(_) => {
                tracing::warn!("error image rasterizer panicked");
                Artifact::json_error(message, 500)
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/error_artifact.rs"]
mod tests;
