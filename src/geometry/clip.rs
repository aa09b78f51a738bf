//! Liang–Barsky segment clipping against an axis-aligned rectangle.

use super::{Point, Rect};

/// Below this magnitude a direction component is treated as parallel to the edge.
const PARALLEL_EPSILON: f64 = 1.0e-8;

/// Result of clipping a segment.
///
/// When `in_rect` is false the endpoints are the unclipped input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub p0: Point,
    pub p1: Point,
    pub in_rect: bool,
}

impl Clip {
    fn outside(p0: Point, p1: Point) -> Self {
        Self {
            p0,
            p1,
            in_rect: false,
        }
    }
}

/// Reduces the segment `p0`→`p1` to the part inside `rect`.
///
/// Each edge contributes a pair `(p, q)`: `p` is the segment direction
/// projected on the edge's outward normal and `q` the signed distance from
/// `p0` to that edge. The entry parameter `t0` starts at 0 and the exit
/// parameter `t1` at 1; the segment is rejected as soon as they cross.
pub fn liang_barsky(rect: &Rect, p0: Point, p1: Point) -> Clip {
    let xd = p1.x - p0.x;
    let yd = p1.y - p0.y;

    let edges = [
        (-xd, p0.x - rect.min_x()),
        (xd, rect.max_x() - p0.x),
        (-yd, p0.y - rect.min_y()),
        (yd, rect.max_y() - p0.y),
    ];

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in edges {
        if p.abs() < PARALLEL_EPSILON {
            // Parallel to this edge: either fully outside it or unconstrained by it.
            if q < 0.0 {
                return Clip::outside(p0, p1);
            }
            continue;
        }

        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return Clip::outside(p0, p1);
            } else if r > t0 {
                t0 = r;
            }
        } else if r < t0 {
            return Clip::outside(p0, p1);
        } else if r < t1 {
            t1 = r;
        }
    }

    Clip {
        p0: Point::new(p0.x + t0 * xd, p0.y + t0 * yd),
        p1: Point::new(p0.x + t1 * xd, p0.y + t1 * yd),
        in_rect: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn square() -> Rect {
        Rect::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0))
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn segment_inside_is_unchanged() {
        let p0 = Point::new(2.0, 3.0);
        let p1 = Point::new(8.0, 7.0);
        let clip = liang_barsky(&square(), p0, p1);
        assert!(clip.in_rect);
        assert_eq!(clip.p0, p0);
        assert_eq!(clip.p1, p1);
    }

    #[test]
    fn crossing_left_edge_moves_entry_point() {
        let clip = liang_barsky(&square(), Point::new(-5.0, 5.0), Point::new(5.0, 5.0));
        assert!(clip.in_rect);
        assert!(close(clip.p0, Point::new(0.0, 5.0)));
        assert!(close(clip.p1, Point::new(5.0, 5.0)));
    }

    #[test]
    fn crossing_right_edge_moves_exit_point() {
        let clip = liang_barsky(&square(), Point::new(5.0, 2.0), Point::new(15.0, 2.0));
        assert!(clip.in_rect);
        assert!(close(clip.p0, Point::new(5.0, 2.0)));
        assert!(close(clip.p1, Point::new(10.0, 2.0)));
    }

    #[test]
    fn segment_spanning_rect_is_clipped_on_both_ends() {
        let clip = liang_barsky(&square(), Point::new(-10.0, -10.0), Point::new(20.0, 20.0));
        assert!(clip.in_rect);
        assert!(close(clip.p0, Point::new(0.0, 0.0)));
        assert!(close(clip.p1, Point::new(10.0, 10.0)));
    }

    #[test]
    fn vertical_segment_left_of_rect_is_rejected() {
        let p0 = Point::new(-3.0, 1.0);
        let p1 = Point::new(-3.0, 9.0);
        let clip = liang_barsky(&square(), p0, p1);
        assert!(!clip.in_rect);
        assert_eq!(clip.p0, p0);
        assert_eq!(clip.p1, p1);
    }

    #[test]
    fn diagonal_segment_missing_corner_is_rejected() {
        let p0 = Point::new(8.0, -5.0);
        let p1 = Point::new(15.0, 2.0);
        let clip = liang_barsky(&square(), p0, p1);
        assert!(!clip.in_rect);
        assert_eq!(clip.p0, p0);
        assert_eq!(clip.p1, p1);
    }

    #[test]
    fn segment_beyond_far_edge_is_rejected() {
        let clip = liang_barsky(&square(), Point::new(12.0, 5.0), Point::new(20.0, 6.0));
        assert!(!clip.in_rect);
    }

    #[test]
    fn degenerate_point_inside_is_kept() {
        let p = Point::new(4.0, 4.0);
        let clip = liang_barsky(&square(), p, p);
        assert!(clip.in_rect);
        assert_eq!(clip.p0, p);
        assert_eq!(clip.p1, p);
    }
}
