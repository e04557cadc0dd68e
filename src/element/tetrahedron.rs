use nalgebra::{Matrix1x4, Matrix3x4, Point3, U3, U4};
use numeric_literals::replace_float_literals;

use crate::element::{ElementShape, FiniteElement, ReferenceFiniteElement};
use crate::quadrature::{total_order, QuadratureError, QuadraturePair3d};
use crate::Real;

/// A linear tetrahedron.
///
/// The reference vertices are `(-1, -1, -1)`, `(1, -1, -1)`, `(-1, 1, -1)` and `(-1, -1, 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tet4Element<T: Real> {
    vertices: [Point3<T>; 4],
}

impl<T: Real> Tet4Element<T> {
    pub fn from_vertices(vertices: [Point3<T>; 4]) -> Self {
        Self { vertices }
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Tet4Element<T> {
    type ReferenceDim = U3;
    type NodalDim = U4;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &Point3<T>) -> Matrix1x4<T> {
        Matrix1x4::new(
            -0.5 * xi.x - 0.5 * xi.y - 0.5 * xi.z - 0.5,
            0.5 * xi.x + 0.5,
            0.5 * xi.y + 0.5,
            0.5 * xi.z + 0.5,
        )
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, _xi: &Point3<T>) -> Matrix3x4<T> {
        Matrix3x4::new(-0.5, 0.5, 0.0, 0.0,
                       -0.5, 0.0, 0.5, 0.0,
                       -0.5, 0.0, 0.0, 0.5)
    }
}

impl<T: Real> FiniteElement<T> for Tet4Element<T> {
    type GeometryDim = U3;

    const SHAPE: ElementShape = ElementShape::Tet4;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([
            Point3::new(-1.0, -1.0, -1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
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
        Self::quadrature(2).expect("Strength 2 tetrahedron rules are always available")
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError> {
        total_order::tetrahedron(strength)
    }
}
