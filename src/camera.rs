use crate::circuit::document::{CircuitDocument, MIN_COMPONENT_DIM};

/// Zoom multiplier that reproduces the reference framing (`scale == 1`).
pub const ZOOM_PIVOT: f64 = 1.2;
/// Smallest zoom multiplier honored by the framer.
pub const MIN_ZOOM: f64 = 0.1;
/// Scene size assumed when the document has neither a board nor a sized component.
pub const DEFAULT_SCENE_DIM: f64 = 10.0;
/// Camera height per unit of scene size.
pub const HEIGHT_FACTOR: f64 = 1.4;
/// Camera horizontal offset (on both X and Z) per unit of scene size.
pub const OFFSET_FACTOR: f64 = 0.75;

/// Camera placement for a 3D render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    /// Camera position `(x, y, z)`, Y up.
    pub position: [f64; 3],
    /// Point the camera looks at.
    pub look_at: [f64; 3],
}

/// Largest planar dimension of the scene, used to scale the camera distance.
pub fn scene_max_dim(doc: &CircuitDocument) -> f64 {
    if let Some(board) = doc.board_dimensions() {
        return board.max_dim();
    }
    if let Some(component) = doc.first_sized_component() {
        return component.max_dim().max(MIN_COMPONENT_DIM);
    }
    DEFAULT_SCENE_DIM
}

/// Normalize a zoom multiplier for framing: non-finite becomes the pivot, then clamp to
/// [`MIN_ZOOM`].
pub fn framing_zoom(zoom: f64) -> f64 {
    let zoom = if zoom.is_finite() { zoom } else { ZOOM_PIVOT };
    zoom.max(MIN_ZOOM)
}

/// Frame an overhead-angled view of `doc`.
///
/// Larger boards move the camera out proportionally; a larger `zoom` moves it in.
pub fn frame_camera(doc: &CircuitDocument, zoom: f64) -> CameraFrame {
    let max_dim = scene_max_dim(doc);
    let scale = ZOOM_PIVOT / framing_zoom(zoom);
    let y = max_dim * HEIGHT_FACTOR * scale;
    let xz = max_dim * OFFSET_FACTOR * scale;
    CameraFrame {
        position: [xz, y, xz],
        look_at: [0.0, 0.0, 0.0],
    }
}

#[cfg(test)]
#[path = "../tests/unit/camera.rs"]
mod tests;
