use nalgebra::{OMatrix, Point3, Vector3, U1, U3, U8};
use numeric_literals::replace_float_literals;

use crate::element::{phi_linear_1d, phi_linear_1d_grad, ElementShape, FiniteElement, ReferenceFiniteElement};
use crate::quadrature::{tensor, total_order, QuadratureError, QuadraturePair3d};
use crate::Real;

/// A trilinear hexahedron.
///
/// The first four vertices form the bottom face (`z = -1` in the reference domain) in
/// counter-clockwise order, the last four the top face in the same order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hex8Element<T: Real> {
    vertices: [Point3<T>; 8],
}

impl<T: Real> Hex8Element<T> {
    pub fn from_vertices(vertices: [Point3<T>; 8]) -> Self {
        Self { vertices }
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Hex8Element<T> {
    type ReferenceDim = U3;
    type NodalDim = U8;

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &Point3<T>) -> OMatrix<T, U1, U8> {
        let phi = |alpha, beta, gamma|
            phi_linear_1d(alpha, xi[0]) * phi_linear_1d(beta, xi[1]) * phi_linear_1d(gamma, xi[2]);
        OMatrix::<_, U1, U8>::from_row_slice(&[
            phi(-1.0, -1.0, -1.0),
            phi( 1.0, -1.0, -1.0),
            phi( 1.0,  1.0, -1.0),
            phi(-1.0,  1.0, -1.0),
            phi(-1.0, -1.0,  1.0),
            phi( 1.0, -1.0,  1.0),
            phi( 1.0,  1.0,  1.0),
            phi(-1.0,  1.0,  1.0),
        ])
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, xi: &Point3<T>) -> OMatrix<T, U3, U8> {
        let phi_1d = phi_linear_1d;
        let grad_1d = phi_linear_1d_grad;
        let phi_grad = |alpha, beta, gamma|
            Vector3::new(
                grad_1d(alpha) * phi_1d(beta, xi[1]) * phi_1d(gamma, xi[2]),
                phi_1d(alpha, xi[0]) * grad_1d(beta) * phi_1d(gamma, xi[2]),
                phi_1d(alpha, xi[0]) * phi_1d(beta, xi[1]) * grad_1d(gamma),
            );

        OMatrix::from_columns(&[
            phi_grad(-1.0, -1.0, -1.0),
            phi_grad( 1.0, -1.0, -1.0),
            phi_grad( 1.0,  1.0, -1.0),
            phi_grad(-1.0,  1.0, -1.0),
            phi_grad(-1.0, -1.0,  1.0),
            phi_grad( 1.0, -1.0,  1.0),
            phi_grad( 1.0,  1.0,  1.0),
            phi_grad(-1.0,  1.0,  1.0),
        ])
    }
}

impl<T: Real> FiniteElement<T> for Hex8Element<T> {
    type GeometryDim = U3;

    const SHAPE: ElementShape = ElementShape::Hex8;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(1.0, 1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
        ])
    }

    fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point3<T>] {
        &mut self.vertices
    }

    fn jacobian_determinant(&self, xi: &Point3<T>) -> T {
        self.reference_jacobian(xi).determinant()
    }

    fn canonical_quadrature() -> QuadraturePair3d<T> {
        tensor::hexahedron_gauss(2)
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError> {
        Ok(total_order::hexahedron(strength))
    }
}
