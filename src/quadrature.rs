//! Quadrature rules expressed in the scalar type of the mesh.
//!
//! The rules themselves come from `rdfem-quadrature`, which tabulates them as `f64`. The
//! functions here convert them to [`QuadraturePair`]s over the element's reference points.
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, OPoint, Point1, Point2, Point3, U1, U2, U3};
use rdfem_quadrature::Rule;

use crate::Real;

pub use rdfem_quadrature::Error as QuadratureError;

/// Quadrature weights and points on a `D`-dimensional reference domain.
pub type QuadraturePair<T, D> = (Vec<T>, Vec<OPoint<T, D>>);
pub type QuadraturePair1d<T> = QuadraturePair<T, U1>;
pub type QuadraturePair2d<T> = QuadraturePair<T, U2>;
pub type QuadraturePair3d<T> = QuadraturePair<T, U3>;

fn convert_weights<T: Real>(weights: Vec<f64>) -> Vec<T> {
    weights.into_iter().map(convert).collect()
}

pub fn convert_quadrature_rule_from_1d_f64<T: Real>((weights, points): Rule<1>) -> QuadraturePair1d<T> {
    let points = points.into_iter().map(|[x]| Point1::new(convert(x))).collect();
    (convert_weights(weights), points)
}

pub fn convert_quadrature_rule_from_2d_f64<T: Real>((weights, points): Rule<2>) -> QuadraturePair2d<T> {
    let points = points
        .into_iter()
        .map(|[x, y]| Point2::new(convert(x), convert(y)))
        .collect();
    (convert_weights(weights), points)
}

pub fn convert_quadrature_rule_from_3d_f64<T: Real>((weights, points): Rule<3>) -> QuadraturePair3d<T> {
    let points = points
        .into_iter()
        .map(|[x, y, z]| Point3::new(convert(x), convert(y), convert(z)))
        .collect();
    (convert_weights(weights), points)
}

/// Rules selected by the polynomial degree they integrate exactly.
pub mod total_order {
    use super::*;

    pub fn segment<T: Real>(strength: usize) -> QuadraturePair1d<T> {
        convert_quadrature_rule_from_1d_f64(rdfem_quadrature::segment(strength))
    }

    pub fn quadrilateral<T: Real>(strength: usize) -> QuadraturePair2d<T> {
        convert_quadrature_rule_from_2d_f64(rdfem_quadrature::quadrilateral(strength))
    }

    pub fn hexahedron<T: Real>(strength: usize) -> QuadraturePair3d<T> {
        convert_quadrature_rule_from_3d_f64(rdfem_quadrature::hexahedron(strength))
    }

    pub fn triangle<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
        rdfem_quadrature::triangle(strength).map(convert_quadrature_rule_from_2d_f64)
    }

    pub fn tetrahedron<T: Real>(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError> {
        rdfem_quadrature::tetrahedron(strength).map(convert_quadrature_rule_from_3d_f64)
    }
}

/// Tensor-product Gauss rules selected by the number of points per dimension.
pub mod tensor {
    use super::*;

    pub fn quadrilateral_gauss<T: Real>(points_per_dim: usize) -> QuadraturePair2d<T> {
        convert_quadrature_rule_from_2d_f64(rdfem_quadrature::tensor::quadrilateral_gauss(points_per_dim))
    }

    pub fn hexahedron_gauss<T: Real>(points_per_dim: usize) -> QuadraturePair3d<T> {
        convert_quadrature_rule_from_3d_f64(rdfem_quadrature::tensor::hexahedron_gauss(points_per_dim))
    }
}

/// Approximates the integral of `f` over the reference domain.
pub fn integrate<T, D>(quadrature: &QuadraturePair<T, D>, mut f: impl FnMut(&OPoint<T, D>) -> T) -> T
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    let (weights, points) = quadrature;
    weights
        .iter()
        .zip(points)
        .map(|(&w, x)| w * f(x))
        .fold(T::zero(), |acc, v| acc + v)
}
