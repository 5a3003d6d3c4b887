//! # Transition functions
//!
//! The group of integer grid automorphisms relating the UV charts of two
//! faces across an edge: a rotation by `r * 90` degrees followed by an
//! integer translation `(tu, tv)`.

use glam::DVec2;

/// An integer similarity `p -> rot(r, p) + (tu, tv)` with `r` in `0..4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionFunction {
    /// Number of 90 degree counterclockwise rotations, 0..=3
    pub r: i32,
    /// Translation along u
    pub tu: i32,
    /// Translation along v
    pub tv: i32,
}

impl TransitionFunction {
    pub const IDENTITY: Self = Self { r: 0, tu: 0, tv: 0 };

    #[inline]
    pub fn new(r: i32, tu: i32, tv: i32) -> Self {
        debug_assert!((0..4).contains(&r));
        Self { r, tu, tv }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Rotate an integer vector by `r * 90` degrees counterclockwise
    #[inline]
    fn rotate(r: i32, u: i32, v: i32) -> (i32, i32) {
        match r & 3 {
            0 => (u, v),
            1 => (-v, u),
            2 => (-u, -v),
            _ => (v, -u),
        }
    }

    /// Rotate a UV point by `r * 90` degrees counterclockwise
    #[inline]
    fn rotate_point(r: i32, p: DVec2) -> DVec2 {
        match r & 3 {
            0 => p,
            1 => DVec2::new(-p.y, p.x),
            2 => DVec2::new(-p.x, -p.y),
            _ => DVec2::new(p.y, -p.x),
        }
    }

    /// Composition `self o rhs`: apply `rhs` first, then `self`
    #[inline]
    pub fn compose(self, rhs: Self) -> Self {
        let (tu, tv) = Self::rotate(self.r, rhs.tu, rhs.tv);
        Self {
            r: (self.r + rhs.r) & 3,
            tu: tu + self.tu,
            tv: tv + self.tv,
        }
    }

    /// The inverse transition
    #[inline]
    pub fn inverse(self) -> Self {
        let r_inv = (4 - self.r) & 3;
        let (tu, tv) = Self::rotate(r_inv, self.tu, self.tv);
        Self {
            r: r_inv,
            tu: -tu,
            tv: -tv,
        }
    }

    /// Apply the transition to a UV point
    #[inline]
    pub fn transform_point(self, p: DVec2) -> DVec2 {
        Self::rotate_point(self.r, p) + DVec2::new(self.tu as f64, self.tv as f64)
    }

    /// Apply only the rotational part (for direction vectors)
    #[inline]
    pub fn transform_vector(self, v: DVec2) -> DVec2 {
        Self::rotate_point(self.r, v)
    }
}

impl Default for TransitionFunction {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::fmt::Display for TransitionFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(r={}, tu={}, tv={})", self.r, self.tu, self.tv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let tf = TransitionFunction::IDENTITY;
        let p = DVec2::new(3.0, -2.0);
        assert_eq!(tf.transform_point(p), p);
        assert_eq!(tf.inverse(), tf);
    }

    #[test]
    fn test_rotation_quarters() {
        let p = DVec2::new(1.0, 0.0);
        assert_eq!(
            TransitionFunction::new(1, 0, 0).transform_point(p),
            DVec2::new(0.0, 1.0)
        );
        assert_eq!(
            TransitionFunction::new(2, 0, 0).transform_point(p),
            DVec2::new(-1.0, 0.0)
        );
        assert_eq!(
            TransitionFunction::new(3, 0, 0).transform_point(p),
            DVec2::new(0.0, -1.0)
        );
    }

    #[test]
    fn test_compose_applies_rhs_first() {
        // rotate then translate vs translate then rotate
        let rot = TransitionFunction::new(1, 0, 0);
        let trans = TransitionFunction::new(0, 2, 0);
        let p = DVec2::new(1.0, 0.0);

        // rot o trans: p+2 then rotate -> (0, 3)
        assert_eq!(rot.compose(trans).transform_point(p), DVec2::new(0.0, 3.0));
        // trans o rot: rotate then +2 -> (2, 1)
        assert_eq!(trans.compose(rot).transform_point(p), DVec2::new(2.0, 1.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        for r in 0..4 {
            for (tu, tv) in [(0, 0), (3, -1), (-7, 5)] {
                let tf = TransitionFunction::new(r, tu, tv);
                assert_eq!(tf.compose(tf.inverse()), TransitionFunction::IDENTITY);
                assert_eq!(tf.inverse().compose(tf), TransitionFunction::IDENTITY);

                let p = DVec2::new(11.0, -4.0);
                assert_eq!(tf.inverse().transform_point(tf.transform_point(p)), p);
            }
        }
    }

    #[test]
    fn test_compose_matches_pointwise() {
        let a = TransitionFunction::new(3, 2, -5);
        let b = TransitionFunction::new(2, -1, 4);
        let p = DVec2::new(6.0, 7.0);
        assert_eq!(
            a.compose(b).transform_point(p),
            a.transform_point(b.transform_point(p))
        );
    }
}
