use nalgebra::{Matrix1x4, Matrix2x4, Point2, Vector2, U2, U4};
use numeric_literals::replace_float_literals;

use crate::element::{phi_linear_1d, phi_linear_1d_grad, ElementShape, FiniteElement, ReferenceFiniteElement};
use crate::quadrature::{tensor, total_order, QuadratureError, QuadraturePair2d};
use crate::Real;

/// A bilinear quadrilateral in two dimensions.
///
/// Vertices are ordered counter-clockwise, matching the reference vertices
/// `(-1, -1)`, `(1, -1)`, `(1, 1)`, `(-1, 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad4d2Element<T: Real> {
    vertices: [Point2<T>; 4],
}

impl<T: Real> Quad4d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Quad4d2Element<T> {
    type ReferenceDim = U2;
    type NodalDim = U4;

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &Point2<T>) -> Matrix1x4<T> {
        // N_{alpha, beta} is one at the vertex (alpha, beta)
        let phi = |alpha, beta| phi_linear_1d(alpha, xi[0]) * phi_linear_1d(beta, xi[1]);
        Matrix1x4::new(
            phi(-1.0, -1.0),
            phi( 1.0, -1.0),
            phi( 1.0,  1.0),
            phi(-1.0,  1.0),
        )
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, xi: &Point2<T>) -> Matrix2x4<T> {
        let phi_grad = |alpha, beta|
            Vector2::new(
                phi_linear_1d_grad(alpha) * phi_linear_1d(beta, xi[1]),
                phi_linear_1d(alpha, xi[0]) * phi_linear_1d_grad(beta),
            );

        Matrix2x4::from_columns(&[
            phi_grad(-1.0, -1.0),
            phi_grad( 1.0, -1.0),
            phi_grad( 1.0,  1.0),
            phi_grad(-1.0,  1.0),
        ])
    }
}

impl<T: Real> FiniteElement<T> for Quad4d2Element<T> {
    type GeometryDim = U2;

    const SHAPE: ElementShape = ElementShape::Quad4d2;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point2<T>] {
        &mut self.vertices
    }

    fn jacobian_determinant(&self, xi: &Point2<T>) -> T {
        self.reference_jacobian(xi).determinant()
    }

    fn canonical_quadrature() -> QuadraturePair2d<T> {
        tensor::quadrilateral_gauss(2)
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
        Ok(total_order::quadrilateral(strength))
    }
}
