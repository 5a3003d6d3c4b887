//! # Exact 2D predicates
//!
//! Orientation, containment and intersection tests over UV points.
//!
//! Points enter and leave as `glam::DVec2`; inside the predicates every
//! coordinate is lifted to a rational over arbitrary-precision integers, so
//! the sign of a determinant is exact no matter how large the truncated UV
//! magnitudes get. Point equality is plain `==` on the doubles, which is
//! exact once coordinates are integral.

use glam::DVec2;
use num_rational::BigRational;
use num_traits::Zero;
use std::cmp::Ordering;

/// Sign of a signed area: Positive is counterclockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Negative,
    Zero,
    Positive,
}

impl Orientation {
    /// The opposite sign; Zero stays Zero
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Negative => Orientation::Positive,
            Orientation::Zero => Orientation::Zero,
            Orientation::Positive => Orientation::Negative,
        }
    }
}

/// Position of a point relative to a closed region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundedness {
    Outside,
    OnBoundary,
    Inside,
}

fn rational(x: f64) -> BigRational {
    // finite f64 always converts
    BigRational::from_float(x).unwrap_or_else(BigRational::zero)
}

/// Exact orientation of the triangle (a, b, c)
pub fn orient2d(a: DVec2, b: DVec2, c: DVec2) -> Orientation {
    let bax = rational(b.x) - rational(a.x);
    let bay = rational(b.y) - rational(a.y);
    let cax = rational(c.x) - rational(a.x);
    let cay = rational(c.y) - rational(a.y);

    let det = bax * cay - bay * cax;
    match det.cmp(&BigRational::zero()) {
        Ordering::Less => Orientation::Negative,
        Ordering::Equal => Orientation::Zero,
        Ordering::Greater => Orientation::Positive,
    }
}

/// Exact orientation of two direction vectors (sign of the cross product)
#[inline]
pub fn orient2d_vec(u: DVec2, v: DVec2) -> Orientation {
    orient2d(DVec2::ZERO, u, v)
}

/// Whether three points lie on a common line
#[inline]
pub fn is_collinear(a: DVec2, b: DVec2, c: DVec2) -> bool {
    orient2d(a, b, c) == Orientation::Zero
}

/// Axis-aligned bounding box over f64 coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bbox2 {
    pub fn of(points: &[DVec2]) -> Self {
        let mut min = points[0];
        let mut max = points[0];
        for &p in &points[1..] {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Closed containment test
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// A closed 2D segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment2 {
    #[inline]
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// A segment is degenerate when its endpoints coincide
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    #[inline]
    pub fn bbox(&self) -> Bbox2 {
        Bbox2::of(&[self.a, self.b])
    }

    /// Exact closed containment: p on the line through a, b and inside the
    /// bounding box
    pub fn has_on(&self, p: DVec2) -> bool {
        orient2d(self.a, self.b, p) == Orientation::Zero && self.bbox().contains(p)
    }

    /// Exact closed segment-segment intersection test
    pub fn intersects(&self, other: &Segment2) -> bool {
        let o1 = orient2d(self.a, self.b, other.a);
        let o2 = orient2d(self.a, self.b, other.b);
        let o3 = orient2d(other.a, other.b, self.a);
        let o4 = orient2d(other.a, other.b, self.b);

        let straddle = |x: Orientation, y: Orientation| {
            (x == Orientation::Positive && y == Orientation::Negative)
                || (x == Orientation::Negative && y == Orientation::Positive)
        };
        if straddle(o1, o2) && straddle(o3, o4) {
            return true;
        }

        (o1 == Orientation::Zero && self.bbox().contains(other.a))
            || (o2 == Orientation::Zero && self.bbox().contains(other.b))
            || (o3 == Orientation::Zero && other.bbox().contains(self.a))
            || (o4 == Orientation::Zero && other.bbox().contains(self.b))
    }
}

/// A 2D triangle with indexable corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle2 {
    pub a: DVec2,
    pub b: DVec2,
    pub c: DVec2,
}

impl Triangle2 {
    #[inline]
    pub fn new(a: DVec2, b: DVec2, c: DVec2) -> Self {
        Self { a, b, c }
    }

    /// Corner by index 0..3
    #[inline]
    pub fn corner(&self, idx: usize) -> DVec2 {
        match idx {
            0 => self.a,
            1 => self.b,
            2 => self.c,
            _ => panic!("triangle corner index out of range: {idx}"),
        }
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        orient2d(self.a, self.b, self.c)
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.orientation() == Orientation::Zero
    }

    #[inline]
    pub fn bbox(&self) -> Bbox2 {
        Bbox2::of(&[self.a, self.b, self.c])
    }

    /// Classify a point against the closed triangle
    pub fn bounded_side(&self, p: DVec2) -> Boundedness {
        let o1 = orient2d(self.a, self.b, p);
        let o2 = orient2d(self.b, self.c, p);
        let o3 = orient2d(self.c, self.a, p);

        if o1 == Orientation::Zero && o2 == Orientation::Zero && o3 == Orientation::Zero {
            // degenerate triangle: fall back to the closed edge segments
            let on_any = Segment2::new(self.a, self.b).has_on(p)
                || Segment2::new(self.b, self.c).has_on(p)
                || Segment2::new(self.c, self.a).has_on(p);
            return if on_any {
                Boundedness::OnBoundary
            } else {
                Boundedness::Outside
            };
        }

        let mut has_pos = false;
        let mut has_neg = false;
        let mut has_zero = false;
        for o in [o1, o2, o3] {
            match o {
                Orientation::Positive => has_pos = true,
                Orientation::Negative => has_neg = true,
                Orientation::Zero => has_zero = true,
            }
        }

        if has_pos && has_neg {
            Boundedness::Outside
        } else if has_zero {
            Boundedness::OnBoundary
        } else {
            Boundedness::Inside
        }
    }

    /// Whether p lies strictly inside
    #[inline]
    pub fn has_on_bounded_side(&self, p: DVec2) -> bool {
        self.bounded_side(p) == Boundedness::Inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_orient2d_signs() {
        assert_eq!(
            orient2d(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)),
            Orientation::Positive
        );
        assert_eq!(
            orient2d(v(0.0, 0.0), v(0.0, 1.0), v(1.0, 0.0)),
            Orientation::Negative
        );
        assert_eq!(
            orient2d(v(0.0, 0.0), v(1.0, 1.0), v(2.0, 2.0)),
            Orientation::Zero
        );
    }

    #[test]
    fn test_orient2d_large_magnitudes() {
        // magnitudes in the truncation range; a naive double evaluation
        // would lose the sign here
        let base = 2f64.powi(40);
        let a = v(base, base);
        let b = v(base + 1.0, base);
        let c = v(base, base + 1.0);
        assert_eq!(orient2d(a, b, c), Orientation::Positive);
        assert_eq!(orient2d(a, c, b), Orientation::Negative);
    }

    #[test]
    fn test_segment_has_on() {
        let seg = Segment2::new(v(0.0, 0.0), v(4.0, 2.0));
        assert!(seg.has_on(v(2.0, 1.0)));
        assert!(seg.has_on(v(0.0, 0.0)));
        assert!(seg.has_on(v(4.0, 2.0)));
        assert!(!seg.has_on(v(6.0, 3.0))); // collinear but outside
        assert!(!seg.has_on(v(2.0, 1.5)));
    }

    #[test]
    fn test_segment_intersects() {
        let s1 = Segment2::new(v(0.0, 0.0), v(2.0, 2.0));
        let s2 = Segment2::new(v(0.0, 2.0), v(2.0, 0.0));
        assert!(s1.intersects(&s2));

        // touching at an endpoint counts
        let s3 = Segment2::new(v(1.0, 1.0), v(3.0, 1.0));
        assert!(s1.intersects(&s3));

        // disjoint parallel segments do not
        let s4 = Segment2::new(v(0.0, 1.0), v(1.0, 2.0));
        assert!(!s1.intersects(&s4));

        // collinear overlapping segments do
        let s5 = Segment2::new(v(1.0, 1.0), v(3.0, 3.0));
        assert!(s1.intersects(&s5));
    }

    #[test]
    fn test_triangle_bounded_side() {
        let tri = Triangle2::new(v(0.0, 0.0), v(4.0, 0.0), v(0.0, 4.0));
        assert_eq!(tri.bounded_side(v(1.0, 1.0)), Boundedness::Inside);
        assert_eq!(tri.bounded_side(v(2.0, 0.0)), Boundedness::OnBoundary);
        assert_eq!(tri.bounded_side(v(0.0, 0.0)), Boundedness::OnBoundary);
        assert_eq!(tri.bounded_side(v(3.0, 3.0)), Boundedness::Outside);
        assert_eq!(tri.bounded_side(v(5.0, 0.0)), Boundedness::Outside);
        assert_eq!(tri.bounded_side(v(-1.0, 0.0)), Boundedness::Outside);
    }

    #[test]
    fn test_triangle_bounded_side_cw() {
        // classification is orientation independent
        let tri = Triangle2::new(v(0.0, 0.0), v(0.0, 4.0), v(4.0, 0.0));
        assert_eq!(tri.orientation(), Orientation::Negative);
        assert_eq!(tri.bounded_side(v(1.0, 1.0)), Boundedness::Inside);
        assert_eq!(tri.bounded_side(v(2.0, 2.0)), Boundedness::OnBoundary);
    }

    #[test]
    fn test_degenerate_triangle_bounded_side() {
        let tri = Triangle2::new(v(0.0, 0.0), v(2.0, 0.0), v(4.0, 0.0));
        assert!(tri.is_degenerate());
        assert_eq!(tri.bounded_side(v(1.0, 0.0)), Boundedness::OnBoundary);
        assert_eq!(tri.bounded_side(v(5.0, 0.0)), Boundedness::Outside);
        assert_eq!(tri.bounded_side(v(1.0, 1.0)), Boundedness::Outside);
    }
}
