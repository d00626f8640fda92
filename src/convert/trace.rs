//! Boundary tracing for one palette layer.
//!
//! A layer mask is turned into closed pixel-edge loops, each loop is smoothed through the
//! midpoints of its unit edges, split at corners, and every run between two corners is reduced
//! to the fewest chords that stay within the splice angle.

use std::fmt::Write as _;

const NO_EDGE: usize = usize::MAX;

/// Neighbor distance used to measure the turn at a smoothed point.
const CORNER_WINDOW: usize = 2;

/// Point in traced-raster coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    fn minus(self, other: Point) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    fn distance(self, other: Point) -> f64 {
        let (dx, dy) = self.minus(other);
        dx.hypot(dy)
    }
}

/// Thresholds applied while turning loops into polygons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TraceThresholds {
    /// Turn in degrees at or above which a point is kept as a corner.
    pub(crate) corner_deg: f64,
    /// Points closer than this to the current anchor are ignored when fitting a chord.
    pub(crate) length: f64,
    /// Largest angle in degrees between a chord and a point it replaces.
    pub(crate) splice_deg: f64,
    /// Loops with fewer unit edges than this are dropped as speckles.
    pub(crate) min_edges: usize,
}

/// Unsigned angle in degrees between two vectors, in `[0, 180]`.
fn angle_between(a: (f64, f64), b: (f64, f64)) -> f64 {
    let cross = a.0 * b.1 - a.1 * b.0;
    let dot = a.0 * b.0 + a.1 * b.1;
    if cross == 0.0 && dot == 0.0 {
        return 0.0;
    }
    cross.abs().atan2(dot).to_degrees()
}

fn push_edge(out: &mut [[usize; 2]], stride: usize, from: (usize, usize), to: (usize, usize)) {
    let slot = &mut out[from.1 * stride + from.0];
    let target = to.1 * stride + to.0;
    if slot[0] == NO_EDGE {
        slot[0] = target;
    } else {
        slot[1] = target;
    }
}

fn take_edge(slot: &mut [usize; 2]) -> Option<usize> {
    for edge in slot.iter_mut().rev() {
        if *edge != NO_EDGE {
            return Some(std::mem::replace(edge, NO_EDGE));
        }
    }
    None
}

/// Closed loops of pixel-corner vertices around the set cells of `mask`.
///
/// Outer boundaries run clockwise and holes counter-clockwise (screen coordinates), so the loops
/// fill correctly with the even-odd rule. Each vertex is followed by a unit step to the next.
pub(crate) fn boundary_loops(
    mask: &[bool],
    width: usize,
    height: usize,
) -> Vec<Vec<(usize, usize)>> {
    let stride = width + 1;
    let inside = |x: usize, y: usize| mask[y * width + x];
    let mut out = vec![[NO_EDGE; 2]; stride * (height + 1)];

    for y in 0..height {
        for x in 0..width {
            if !inside(x, y) {
                continue;
            }
            if y == 0 || !inside(x, y - 1) {
                push_edge(&mut out, stride, (x, y), (x + 1, y));
            }
            if x + 1 == width || !inside(x + 1, y) {
                push_edge(&mut out, stride, (x + 1, y), (x + 1, y + 1));
            }
            if y + 1 == height || !inside(x, y + 1) {
                push_edge(&mut out, stride, (x + 1, y + 1), (x, y + 1));
            }
            if x == 0 || !inside(x - 1, y) {
                push_edge(&mut out, stride, (x, y + 1), (x, y));
            }
        }
    }

    // Every vertex has as many incoming as outgoing edges, so each walk returns to its start.
    let mut loops = Vec::new();
    for start in 0..out.len() {
        while out[start] != [NO_EDGE; 2] {
            let mut ring = Vec::new();
            let mut at = start;
            loop {
                ring.push((at % stride, at / stride));
                let Some(next) = take_edge(&mut out[at]) else {
                    break;
                };
                at = next;
                if at == start {
                    break;
                }
            }
            loops.push(ring);
        }
    }
    loops
}

/// Midpoint of every unit edge of `ring`.
fn edge_midpoints(ring: &[(usize, usize)]) -> Vec<Point> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (ax, ay) = ring[i];
            let (bx, by) = ring[(i + 1) % n];
            Point {
                x: (ax + bx) as f64 / 2.0,
                y: (ay + by) as f64 / 2.0,
            }
        })
        .collect()
}

fn corner_indices(points: &[Point], corner_deg: f64) -> Vec<usize> {
    let n = points.len();
    let k = CORNER_WINDOW.min(n / 2).max(1);
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - k) % n];
            let next = points[(i + k) % n];
            let here = points[i];
            angle_between(here.minus(prev), next.minus(here)) >= corner_deg
        })
        .collect()
}

/// Whether the chord `run[anchor] -> run[end]` can stand in for every point between them.
fn chord_fits(run: &[Point], anchor: usize, end: usize, t: &TraceThresholds) -> bool {
    let origin = run[anchor];
    let chord = run[end].minus(origin);
    if chord.0.hypot(chord.1) < 1e-9 {
        return false;
    }
    run[anchor + 1..end].iter().all(|p| {
        p.distance(origin) < t.length || angle_between(p.minus(origin), chord) <= t.splice_deg
    })
}

/// Reduce a corner-to-corner run. Keeps the first point, drops the last one.
fn simplify_run(run: &[Point], t: &TraceThresholds) -> Vec<Point> {
    let mut kept = vec![run[0]];
    let last = run.len() - 1;
    let mut anchor = 0;
    let mut end = 1;
    while end < last {
        if chord_fits(run, anchor, end + 1, t) {
            end += 1;
        } else {
            kept.push(run[end]);
            anchor = end;
            end = anchor + 1;
        }
    }
    kept
}

/// Polygon for one boundary loop, or `None` when it is a speckle or collapses.
pub(crate) fn loop_polygon(ring: &[(usize, usize)], t: &TraceThresholds) -> Option<Vec<Point>> {
    if ring.len() < t.min_edges.max(4) {
        return None;
    }
    let points = edge_midpoints(ring);
    let n = points.len();
    let mut corners = corner_indices(&points, t.corner_deg);
    if corners.is_empty() {
        corners.push(0);
    }

    let mut polygon = Vec::new();
    for (i, &from) in corners.iter().enumerate() {
        let to = corners[(i + 1) % corners.len()];
        let span = if to > from { to - from } else { to + n - from };
        let run: Vec<Point> = (0..=span).map(|j| points[(from + j) % n]).collect();
        polygon.extend(simplify_run(&run, t));
    }
    (polygon.len() >= 3).then_some(polygon)
}

/// Polygons for every loop of a layer mask.
pub(crate) fn trace_layer(
    mask: &[bool],
    width: usize,
    height: usize,
    t: &TraceThresholds,
) -> Vec<Vec<Point>> {
    boundary_loops(mask, width, height)
        .iter()
        .filter_map(|ring| loop_polygon(ring, t))
        .collect()
}

/// Append `polygon` to SVG path data as an absolute closed subpath.
pub(crate) fn write_subpath(d: &mut String, polygon: &[Point]) {
    for (i, p) in polygon.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{} {}", p.x, p.y);
    }
    d.push('Z');
}

#[cfg(test)]
#[path = "../../tests/unit/convert/trace.rs"]
mod tests;
