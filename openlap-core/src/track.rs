//! Closed-loop track geometry
//!
//! A `TrackPath` is an ordered polyline forming a closed loop, parameterized
//! by arc length: a scalar position `s` in meters maps to a world position
//! and a tangent heading. Paths are immutable after construction and are
//! rebuilt wholesale on a preset change.

use crate::model::{Pose, Vec2};
use std::f64::consts::PI;

/// Arc-length-parameterized closed polyline.
///
/// Invariant: `length() == 0` iff the path holds fewer than 2 distinct
/// points. Sampling an empty path returns the origin with zero heading;
/// callers that care must check `is_empty()` first.
#[derive(Debug, Clone, Default)]
pub struct TrackPath {
    points: Vec<Vec2>,
    cumulative: Vec<f64>,
    length: f64,
}

impl TrackPath {
    /// Build a path from a point sequence.
    ///
    /// Fewer than 2 points yields an empty path. The loop is closed by
    /// repeating the first point at the end if it is not already there.
    pub fn from_points(points: Vec<Vec2>) -> Self {
        let mut path = TrackPath::default();
        path.set_points(points);
        path
    }

    /// Rounded-rectangle "stadium" loop centered at the origin.
    ///
    /// `straight_len` is the centerline length of each straight,
    /// `radius` the corner radius, `arc_pts_per_quadrant` the polygonization
    /// detail of the two 180-degree end arcs.
    pub fn stadium(straight_len: f64, radius: f64, arc_pts_per_quadrant: usize) -> Self {
        let r = radius;
        let l = straight_len * 0.5;
        let steps = arc_pts_per_quadrant.max(1) * 2;

        let arc = |pts: &mut Vec<Vec2>, cx: f64, cy: f64, a0: f64, a1: f64| {
            for i in 0..=steps {
                let a = a0 + (a1 - a0) * (i as f64 / steps as f64);
                pts.push(Vec2::new(cx + r * a.cos(), cy + r * a.sin()));
            }
        };

        // Right arc, bottom to top; top straight; left arc; bottom straight
        // back to the start (closing is handled by from_points).
        let mut pts = Vec::with_capacity(2 * (steps + 1) + 2);
        arc(&mut pts, l, 0.0, -PI / 2.0, PI / 2.0);
        pts.push(Vec2::new(-l, r));
        arc(&mut pts, -l, 0.0, PI / 2.0, 3.0 * PI / 2.0);
        pts.push(Vec2::new(l, -r));

        Self::from_points(pts)
    }

    /// Smooth closed loop through a control polygon, sampled from a uniform
    /// Catmull-Rom spline. Needs at least 3 control points; fewer yields an
    /// empty path.
    pub fn from_closed_catmull_rom(ctrl: &[Vec2], samples_per_seg: usize) -> Self {
        let n = ctrl.len();
        if n < 3 {
            return TrackPath::default();
        }
        let samples = samples_per_seg.max(1);

        let at = |i: isize| -> Vec2 {
            let n = n as isize;
            ctrl[((i % n + n) % n) as usize]
        };

        let mut pts = Vec::with_capacity(n * samples);
        for i in 0..n as isize {
            let p0 = at(i - 1);
            let p1 = at(i);
            let p2 = at(i + 1);
            let p3 = at(i + 2);
            for s in 0..samples {
                let u = s as f64 / samples as f64;
                pts.push(catmull_rom(p0, p1, p2, p3, u));
            }
        }
        Self::from_points(pts)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Total loop length in meters.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 2
    }

    /// Sample the pose at arc position `s`.
    ///
    /// `s` is taken modulo the loop length (negative values wrap forward),
    /// so sampling is defined for any finite input once the path is
    /// non-empty. Heading is the tangent of the bracketing segment and is
    /// therefore piecewise constant across a segment.
    pub fn sample_pose(&self, s: f64) -> Pose {
        if self.is_empty() || self.length <= 0.0 {
            return Pose::default();
        }
        let mut sw = s % self.length;
        if sw < 0.0 {
            sw += self.length;
        }

        // First cumulative entry strictly greater than sw brackets the
        // segment; clamp keeps the result a valid segment end.
        let i1 = self
            .cumulative
            .partition_point(|&c| c <= sw)
            .clamp(1, self.points.len() - 1);
        let i0 = i1 - 1;

        let s0 = self.cumulative[i0];
        let seg_len = self.cumulative[i1] - s0;
        let t = if seg_len > 0.0 { (sw - s0) / seg_len } else { 0.0 };

        let a = self.points[i0];
        let b = self.points[i1];
        Pose {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            heading_rad: (b.y - a.y).atan2(b.x - a.x),
        }
    }

    fn set_points(&mut self, points: Vec<Vec2>) {
        self.points = points;
        if self.points.len() < 2 {
            self.points.clear();
            self.cumulative.clear();
            self.length = 0.0;
            return;
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if first.x != last.x || first.y != last.y {
            self.points.push(first);
        }
        self.build_cumulative();
    }

    fn build_cumulative(&mut self) {
        self.cumulative.clear();
        self.cumulative.reserve(self.points.len());
        let mut total = 0.0;
        self.cumulative.push(total);
        for w in self.points.windows(2) {
            total += w[0].distance(&w[1]);
            self.cumulative.push(total);
        }
        self.length = total;
    }
}

/// Uniform Catmull-Rom point for the segment P1->P2 at parameter u in [0,1).
fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, u: f64) -> Vec2 {
    let u2 = u * u;
    let u3 = u2 * u;

    let a0x = -p0.x + 3.0 * p1.x - 3.0 * p2.x + p3.x;
    let a0y = -p0.y + 3.0 * p1.y - 3.0 * p2.y + p3.y;
    let a1x = 2.0 * p0.x - 5.0 * p1.x + 4.0 * p2.x - p3.x;
    let a1y = 2.0 * p0.y - 5.0 * p1.y + 4.0 * p2.y - p3.y;
    let a2x = p2.x - p0.x;
    let a2y = p2.y - p0.y;
    let a3x = 2.0 * p1.x;
    let a3y = 2.0 * p1.y;

    Vec2 {
        x: 0.5 * (a0x * u3 + a1x * u2 + a2x * u + a3x),
        y: 0.5 * (a0y * u3 + a1y * u2 + a2y * u + a3y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn square() -> TrackPath {
        TrackPath::from_points(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_too_few_points_yields_empty_path() {
        let path = TrackPath::from_points(vec![Vec2::new(1.0, 1.0)]);
        assert!(path.is_empty());
        assert_eq!(path.length(), 0.0);

        let pose = path.sample_pose(123.0);
        assert_eq!(pose, Pose::default());
    }

    #[test]
    fn test_open_polygon_is_closed_automatically() {
        let path = square();
        assert!(!path.is_empty());
        // 4 corners + repeated start
        assert_eq!(path.points().len(), 5);
        assert_eq!(path.points()[0], path.points()[4]);
        assert!((path.length() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_pose_interpolates_within_segment() {
        let path = square();

        let p = path.sample_pose(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!((p.y - 0.0).abs() < 1e-12);
        assert!(p.heading_rad.abs() < 1e-12);

        let p = path.sample_pose(15.0);
        assert!((p.x - 10.0).abs() < 1e-12);
        assert!((p.y - 5.0).abs() < 1e-12);
        assert!((p.heading_rad - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_pose_wraps_negative_and_overflow() {
        let path = square();

        // -5 wraps forward to 35: halfway down the left edge
        let p = path.sample_pose(-5.0);
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 5.0).abs() < 1e-12);
        assert!((p.heading_rad + PI / 2.0).abs() < 1e-12);

        // One full loop later is the same pose
        let a = path.sample_pose(5.0);
        let b = path.sample_pose(45.0);
        assert!((a.x - b.x).abs() < 1e-12);
        assert!((a.y - b.y).abs() < 1e-12);
    }

    #[test]
    fn test_stadium_length_close_to_analytic() {
        let path = TrackPath::stadium(250.0, 80.0, 14);
        // Two straights plus a full circle, minus polygonization shortfall
        let ideal = 2.0 * 250.0 + TAU * 80.0;
        assert!(!path.is_empty());
        assert!(path.length() < ideal);
        assert!(path.length() > ideal * 0.99);
    }

    #[test]
    fn test_catmull_rom_needs_three_control_points() {
        let ctrl = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        let path = TrackPath::from_closed_catmull_rom(&ctrl, 8);
        assert!(path.is_empty());
    }

    #[test]
    fn test_catmull_rom_produces_closed_loop() {
        let ctrl = [
            Vec2::new(100.0, 0.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(-100.0, 0.0),
            Vec2::new(0.0, -100.0),
        ];
        let path = TrackPath::from_closed_catmull_rom(&ctrl, 16);
        assert!(!path.is_empty());
        assert_eq!(path.points().len(), 4 * 16 + 1);
        assert_eq!(path.points()[0], *path.points().last().unwrap());
        assert!(path.length() > 0.0);
    }
}
