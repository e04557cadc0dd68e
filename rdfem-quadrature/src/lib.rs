//! Quadrature rules for the `rdfem` reference domains.
//!
//! Reference domains follow a single convention:
//!
//! - the segment is `[-1, 1]`,
//! - the quadrilateral and hexahedron are `[-1, 1]^2` and `[-1, 1]^3`,
//! - the triangle has vertices `(-1, -1)`, `(1, -1)`, `(-1, 1)` (area 2),
//! - the tetrahedron has vertices `(-1, -1, -1)`, `(1, -1, -1)`, `(-1, 1, -1)`, `(-1, -1, 1)`
//!   (volume 4/3).
//!
//! Rules are plain `f64` data so that the crate can be used without `rdfem`. The *strength*
//! of a rule is the largest total polynomial degree it integrates exactly.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

pub use simplex::{tetrahedron, triangle};

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// No rule of the requested strength is available for the domain.
    NoRuleAvailable { domain: &'static str, strength: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable { domain, strength } => {
                write!(f, "no {domain} quadrature rule of strength {strength} is available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A two-dimensional point.
pub type Point2 = Point<2>;

/// A three-dimensional point.
pub type Point3 = Point<3>;

/// A D-dimensional rule, stored as weights and points.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// A three-dimensional rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, x)| w * f(x)).sum()
}

/// Number of Gauss points per dimension needed to reach the given strength.
fn gauss_points_for_strength(strength: usize) -> usize {
    strength / 2 + 1
}

/// A Gauss rule on `[-1, 1]` of at least the given strength.
pub fn segment(strength: usize) -> Rule<1> {
    univariate::gauss(gauss_points_for_strength(strength))
}

/// A tensor-product Gauss rule on the reference quadrilateral of at least the given strength.
pub fn quadrilateral(strength: usize) -> Rule<2> {
    tensor::quadrilateral_gauss(gauss_points_for_strength(strength))
}

/// A tensor-product Gauss rule on the reference hexahedron of at least the given strength.
pub fn hexahedron(strength: usize) -> Rule<3> {
    tensor::hexahedron_gauss(gauss_points_for_strength(strength))
}
