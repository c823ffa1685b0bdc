//! Planar geometry used across the clustering and stem stages.
//!
//! Pixel boxes follow raster conventions: `x`/`y` address the first pixel and
//! `w`/`h` count pixels, so the last column is `x + w - 1`. Points and lines
//! are real-valued. Lines are handled in homogeneous form (`ax + by + c = 0`)
//! through `nalgebra` so that crossings reduce to cross products.

use nalgebra::{Point2, Rotation2, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// Integer pixel rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn center(&self) -> [f64; 2] {
        [
            self.x as f64 + self.w as f64 * 0.5,
            self.y as f64 + self.h as f64 * 0.5,
        ]
    }

    /// Interior intersection test (touching edges do not count).
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        other.x < self.right()
            && other.right() > self.x
            && other.y < self.bottom()
            && other.bottom() > self.y
    }

    pub fn contains_point(&self, p: [i32; 2]) -> bool {
        p[0] >= self.x && p[0] < self.right() && p[1] >= self.y && p[1] < self.bottom()
    }

    pub fn grown(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2 * dx, self.h + 2 * dy)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let r = self.right().max(other.right());
        let b = self.bottom().max(other.bottom());
        Rect::new(x, y, r - x, b - y)
    }

    /// Rectangle corners as real points, clockwise from top-left.
    pub fn corners(&self) -> [[f64; 2]; 4] {
        let (x0, y0) = (self.x as f64, self.y as f64);
        let (x1, y1) = (self.right() as f64, self.bottom() as f64);
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    /// True if ordinate `y` lies within the rectangle rows.
    #[inline]
    pub fn y_embraces(&self, y: i32) -> bool {
        y >= self.y && y < self.bottom()
    }
}

/// Length of the common abscissa range of two boxes (negative when apart).
#[inline]
pub fn x_overlap(a: &Rect, b: &Rect) -> i32 {
    a.right().min(b.right()) - a.x.max(b.x)
}

/// Length of the common ordinate range of two boxes (negative when apart).
#[inline]
pub fn y_overlap(a: &Rect, b: &Rect) -> i32 {
    a.bottom().min(b.bottom()) - a.y.max(b.y)
}

/// Horizontal white space between two boxes (negative when they overlap).
#[inline]
pub fn x_gap(a: &Rect, b: &Rect) -> i32 {
    -x_overlap(a, b)
}

/// Side of an entity along the horizontal axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalSide {
    Left,
    Right,
}

impl HorizontalSide {
    pub fn opposite(self) -> Self {
        match self {
            HorizontalSide::Left => HorizontalSide::Right,
            HorizontalSide::Right => HorizontalSide::Left,
        }
    }
}

/// Side of an entity along the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalSide {
    Top,
    Bottom,
}

impl VerticalSide {
    pub fn opposite(self) -> Self {
        match self {
            VerticalSide::Top => VerticalSide::Bottom,
            VerticalSide::Bottom => VerticalSide::Top,
        }
    }
}

/// Straight line through two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: [f64; 2],
    pub p2: [f64; 2],
}

impl Line {
    pub fn new(p1: [f64; 2], p2: [f64; 2]) -> Self {
        Self { p1, p2 }
    }

    /// Homogeneous representation `(a, b, c)` of the infinite line.
    pub fn homogeneous(&self) -> Vector3<f64> {
        let a = Vector3::new(self.p1[0], self.p1[1], 1.0);
        let b = Vector3::new(self.p2[0], self.p2[1], 1.0);
        a.cross(&b)
    }

    /// Crossing point of the two infinite lines, `None` when parallel.
    pub fn intersection(&self, other: &Line) -> Option<[f64; 2]> {
        let p = self.homogeneous().cross(&other.homogeneous());
        if p[2].abs() <= EPS {
            return None;
        }
        Some([p[0] / p[2], p[1] / p[2]])
    }

    /// Distance from `p` to the infinite line.
    pub fn pt_line_dist(&self, p: [f64; 2]) -> f64 {
        let l = self.homogeneous();
        let norm = (l[0] * l[0] + l[1] * l[1]).sqrt();
        if norm <= EPS {
            let dx = p[0] - self.p1[0];
            let dy = p[1] - self.p1[1];
            return (dx * dx + dy * dy).sqrt();
        }
        (l[0] * p[0] + l[1] * p[1] + l[2]).abs() / norm
    }

    /// Abscissa of the line at ordinate `y` (line assumed not horizontal).
    pub fn x_at_y(&self, y: f64) -> f64 {
        let dy = self.p2[1] - self.p1[1];
        if dy.abs() <= EPS {
            return self.p1[0];
        }
        self.p1[0] + (y - self.p1[1]) * (self.p2[0] - self.p1[0]) / dy
    }

    /// Ordinate of the line at abscissa `x` (line assumed not vertical).
    pub fn y_at_x(&self, x: f64) -> f64 {
        let dx = self.p2[0] - self.p1[0];
        if dx.abs() <= EPS {
            return self.p1[1];
        }
        self.p1[1] + (x - self.p1[0]) * (self.p2[1] - self.p1[1]) / dx
    }

    /// True if `x` lies within the abscissa span of the segment.
    pub fn x_embraces(&self, x: f64) -> bool {
        let (lo, hi) = if self.p1[0] <= self.p2[0] {
            (self.p1[0], self.p2[0])
        } else {
            (self.p2[0], self.p1[0])
        };
        x >= lo && x <= hi
    }

    /// Same line translated vertically by `dy`.
    pub fn shifted_y(&self, dy: f64) -> Line {
        Line::new([self.p1[0], self.p1[1] + dy], [self.p2[0], self.p2[1] + dy])
    }
}

/// Convex polygon, used for the corner lookup areas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<[f64; 2]>,
}

impl Polygon {
    pub fn new(vertices: Vec<[f64; 2]>) -> Self {
        Self { vertices }
    }

    /// Point-in-polygon test for convex polygons of either winding; the
    /// boundary counts as inside.
    pub fn contains_point(&self, p: [f64; 2]) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut pos = false;
        let mut neg = false;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
            if cross > 1e-7 {
                pos = true;
            } else if cross < -1e-7 {
                neg = true;
            }
            if pos && neg {
                return false;
            }
        }
        true
    }

    /// True when the whole pixel box lies within the polygon.
    pub fn contains_rect(&self, r: &Rect) -> bool {
        !r.is_empty() && r.corners().iter().all(|c| self.contains_point(*c))
    }

    /// Interior overlap test between the polygon and a pixel box, by
    /// separating axes.
    pub fn intersects_rect(&self, r: &Rect) -> bool {
        if r.is_empty() || self.vertices.len() < 3 {
            return false;
        }
        let corners = r.corners();
        let mut axes: Vec<[f64; 2]> = vec![[1.0, 0.0], [0.0, 1.0]];
        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let edge = [b[0] - a[0], b[1] - a[1]];
            if edge[0].abs() > EPS || edge[1].abs() > EPS {
                axes.push([-edge[1], edge[0]]);
            }
        }
        for axis in axes {
            let (pmin, pmax) = project(&self.vertices, axis);
            let (rmin, rmax) = project(&corners, axis);
            if pmax <= rmin + 1e-7 || rmax <= pmin + 1e-7 {
                return false;
            }
        }
        true
    }

    pub fn bounds(&self) -> Rect {
        if self.vertices.is_empty() {
            return Rect::default();
        }
        let mut x0 = f64::INFINITY;
        let mut y0 = f64::INFINITY;
        let mut x1 = f64::NEG_INFINITY;
        let mut y1 = f64::NEG_INFINITY;
        for v in &self.vertices {
            x0 = x0.min(v[0]);
            y0 = y0.min(v[1]);
            x1 = x1.max(v[0]);
            y1 = y1.max(v[1]);
        }
        let x = x0.floor() as i32;
        let y = y0.floor() as i32;
        Rect::new(x, y, x1.ceil() as i32 - x, y1.ceil() as i32 - y)
    }
}

fn project(points: &[[f64; 2]], axis: [f64; 2]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in points {
        let d = p[0] * axis[0] + p[1] * axis[1];
        lo = lo.min(d);
        hi = hi.max(d);
    }
    (lo, hi)
}

/// Global sheet skew, expressed as the slope of the staff lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skew {
    pub slope: f64,
}

impl Skew {
    pub fn new(slope: f64) -> Self {
        Self { slope }
    }

    pub fn angle(&self) -> f64 {
        self.slope.atan()
    }

    /// Point coordinates once the global rotation is removed, so that points
    /// on a same staff line share the same deskewed ordinate.
    pub fn deskewed(&self, p: [f64; 2]) -> [f64; 2] {
        let rot = Rotation2::new(-self.angle());
        let q = rot * Point2::new(p[0], p[1]);
        [q.x, q.y]
    }

    /// Abscissa shift of a sheet "vertical" over a vertical run of `dy`.
    #[inline]
    pub fn vertical_dx(&self, dy: f64) -> f64 {
        -self.slope * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn rect_overlaps_and_gaps() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(8, 5, 10, 10);
        assert_eq!(x_overlap(&a, &b), 2);
        assert_eq!(y_overlap(&a, &b), 5);
        let c = Rect::new(15, 0, 5, 5);
        assert_eq!(x_gap(&a, &c), 5);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        // Touching edges are not an intersection.
        assert!(!a.intersects(&Rect::new(10, 0, 3, 3)));
    }

    #[test]
    fn line_intersection_and_distance() {
        let vertical = Line::new([5.0, 0.0], [5.0, 10.0]);
        let horizontal = Line::new([0.0, 3.0], [10.0, 3.0]);
        let p = vertical.intersection(&horizontal).expect("lines cross");
        assert!(approx_eq(p[0], 5.0) && approx_eq(p[1], 3.0));
        assert!(approx_eq(vertical.pt_line_dist([8.0, 42.0]), 3.0));
        assert!(vertical
            .intersection(&Line::new([6.0, 0.0], [6.0, 1.0]))
            .is_none());
        let slanted = Line::new([0.0, 0.0], [2.0, 10.0]);
        assert!(approx_eq(slanted.x_at_y(5.0), 1.0));
    }

    #[test]
    fn polygon_rect_relations() {
        let quad = Polygon::new(vec![[0.0, 0.0], [10.0, 0.0], [12.0, 20.0], [-2.0, 20.0]]);
        assert!(quad.contains_rect(&Rect::new(2, 2, 4, 4)));
        assert!(!quad.contains_rect(&Rect::new(8, 0, 6, 4)));
        assert!(quad.intersects_rect(&Rect::new(8, 0, 6, 4)));
        assert!(!quad.intersects_rect(&Rect::new(20, 0, 3, 3)));
        assert!(!quad.intersects_rect(&Rect::new(0, -5, 3, 5)));
    }

    #[test]
    fn deskew_flattens_sloped_line() {
        let skew = Skew::new(0.05);
        let a = skew.deskewed([0.0, 100.0]);
        let b = skew.deskewed([400.0, 120.0]);
        assert!((a[1] - b[1]).abs() < 1e-6);
    }
}
