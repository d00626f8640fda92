use super::*;

const THRESHOLDS: TraceThresholds = TraceThresholds {
    corner_deg: 60.0,
    length: 4.0,
    splice_deg: 12.0,
    min_edges: 6,
};

fn pt(x: f64, y: f64) -> Point {
    Point { x, y }
}

fn block_mask(width: usize, height: usize, inside: impl Fn(usize, usize) -> bool) -> Vec<bool> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| inside(x, y))
        .collect()
}

#[test]
fn angles_are_unsigned_degrees() {
    assert_eq!(angle_between((1.0, 0.0), (1.0, 0.0)), 0.0);
    assert!((angle_between((1.0, 0.0), (0.0, 1.0)) - 90.0).abs() < 1e-9);
    assert!((angle_between((1.0, 0.0), (0.0, -1.0)) - 90.0).abs() < 1e-9);
    assert!((angle_between((1.0, 0.0), (-1.0, 0.0)) - 180.0).abs() < 1e-9);
    assert_eq!(angle_between((0.0, 0.0), (1.0, 0.0)), 0.0);
}

#[test]
fn single_cell_is_one_clockwise_loop() {
    let loops = boundary_loops(&[true], 1, 1);
    assert_eq!(loops, vec![vec![(0, 0), (1, 0), (1, 1), (0, 1)]]);
}

#[test]
fn holes_get_their_own_loop() {
    let mask = block_mask(3, 3, |x, y| !(x == 1 && y == 1));
    let loops = boundary_loops(&mask, 3, 3);
    assert_eq!(loops.len(), 2);
    assert_eq!(loops[0].len(), 12);
    assert_eq!(loops[1], vec![(1, 1), (1, 2), (2, 2), (2, 1)]);
}

#[test]
fn diagonal_touching_cells_use_every_edge_once() {
    let mask = block_mask(2, 2, |x, y| x == y);
    let loops = boundary_loops(&mask, 2, 2);
    assert_eq!(loops.iter().map(Vec::len).sum::<usize>(), 8);
}

#[test]
fn square_keeps_its_corners() {
    let mask = block_mask(4, 4, |_, _| true);
    let loops = boundary_loops(&mask, 4, 4);
    let polygon = loop_polygon(&loops[0], &THRESHOLDS).unwrap();
    assert_eq!(
        polygon,
        vec![
            pt(0.5, 0.0),
            pt(3.5, 0.0),
            pt(4.0, 0.5),
            pt(4.0, 3.5),
            pt(3.5, 4.0),
            pt(0.5, 4.0),
            pt(0.0, 3.5),
            pt(0.0, 0.5),
        ]
    );
}

#[test]
fn staircase_diagonal_becomes_one_edge() {
    let mask = block_mask(32, 32, |x, y| x + y < 32);
    let polygons = trace_layer(&mask, 32, 32, &THRESHOLDS);
    assert_eq!(polygons.len(), 1);

    let mut d = String::new();
    write_subpath(&mut d, &polygons[0]);
    assert_eq!(d, "M0.5 0L31.5 0L32 0.5L0.5 32L0 31.5L0 0.5Z");
}

#[test]
fn speckles_are_dropped() {
    let mask = block_mask(5, 5, |x, y| x == 2 && y == 2);
    assert!(trace_layer(&mask, 5, 5, &THRESHOLDS).is_empty());

    let keep_all = TraceThresholds {
        min_edges: 0,
        ..THRESHOLDS
    };
    let polygons = trace_layer(&mask, 5, 5, &keep_all);
    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].len(), 4);
}

#[test]
fn round_shapes_are_simplified() {
    let (cx, cy, r) = (20.0, 20.0, 15.0);
    let mask = block_mask(40, 40, |x, y| {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        dx * dx + dy * dy <= r * r
    });
    let loops = boundary_loops(&mask, 40, 40);
    assert_eq!(loops.len(), 1);

    let polygon = loop_polygon(&loops[0], &THRESHOLDS).unwrap();
    assert!(polygon.len() >= 6, "{} vertices", polygon.len());
    assert!(polygon.len() < loops[0].len() / 2, "{} vertices", polygon.len());
    for p in &polygon {
        let dist = (p.x - cx).hypot(p.y - cy);
        assert!((dist - r).abs() < 1.5, "({}, {}) is {dist} from center", p.x, p.y);
    }
}
