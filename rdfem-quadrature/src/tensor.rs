//! 2D and 3D quadrature rules formed by tensor products of Gauss rules.

use crate::univariate::gauss;
use crate::Rule;

/// Builds the D-fold tensor product of a univariate rule.
///
/// The last coordinate varies fastest.
fn tensor_product<const D: usize>(rule1d: &Rule<1>) -> Rule<D> {
    let (weights1d, points1d) = rule1d;
    let n = weights1d.len();
    let total = n.pow(D as u32);
    let mut weights = Vec::with_capacity(total);
    let mut points = Vec::with_capacity(total);

    for linear_index in 0..total {
        let mut remainder = linear_index;
        let mut point = [0.0; D];
        let mut weight = 1.0;
        for d in (0..D).rev() {
            let i = remainder % n;
            remainder /= n;
            point[d] = points1d[i][0];
            weight *= weights1d[i];
        }
        weights.push(weight);
        points.push(point);
    }

    (weights, points)
}

/// A Gauss quadrature rule for the reference quadrilateral with the given number of points
/// per dimension.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    tensor_product(&gauss(num_points_per_dim))
}

/// A Gauss quadrature rule for the reference hexahedron with the given number of points
/// per dimension.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    tensor_product(&gauss(num_points_per_dim))
}
