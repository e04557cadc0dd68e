use nalgebra::{Matrix1x3, Matrix2x3, Point2, Point3, Vector3, U2, U3};
use numeric_literals::replace_float_literals;

use crate::element::{ElementShape, FiniteElement, ReferenceFiniteElement, SurfaceFiniteElement};
use crate::quadrature::{total_order, QuadratureError, QuadraturePair2d};
use crate::Real;

// Reference triangle vertices: (-1, -1), (1, -1), (-1, 1)

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn triangle_basis<T: Real>(xi: &Point2<T>) -> Matrix1x3<T> {
    Matrix1x3::new(-0.5 * xi.x - 0.5 * xi.y, 0.5 * xi.x + 0.5, 0.5 * xi.y + 0.5)
}

#[rustfmt::skip]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn triangle_gradients<T: Real>() -> Matrix2x3<T> {
    Matrix2x3::new(-0.5, 0.5, 0.0,
                   -0.5, 0.0, 0.5)
}

/// A linear triangle in two dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d2Element<T: Real> {
    vertices: [Point2<T>; 3],
}

impl<T: Real> Tri3d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Tri3d2Element<T> {
    type ReferenceDim = U2;
    type NodalDim = U3;

    fn evaluate_basis(&self, xi: &Point2<T>) -> Matrix1x3<T> {
        triangle_basis(xi)
    }

    fn gradients(&self, _xi: &Point2<T>) -> Matrix2x3<T> {
        triangle_gradients()
    }
}

impl<T: Real> FiniteElement<T> for Tri3d2Element<T> {
    type GeometryDim = U2;

    const SHAPE: ElementShape = ElementShape::Tri3d2;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)])
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
        Self::quadrature(2).expect("Strength 2 triangle rules are always available")
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
        total_order::triangle(strength)
    }
}

/// A linear triangle embedded in three dimensions.
///
/// Mostly used for boundary faces of three-dimensional meshes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d3Element<T: Real> {
    vertices: [Point3<T>; 3],
}

impl<T: Real> Tri3d3Element<T> {
    pub fn from_vertices(vertices: [Point3<T>; 3]) -> Self {
        Self { vertices }
    }

    /// Cross product of the two edges emanating from the first vertex.
    fn edge_cross_product(&self) -> Vector3<T> {
        let [a, b, c] = &self.vertices;
        (b - a).cross(&(c - a))
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Tri3d3Element<T> {
    type ReferenceDim = U2;
    type NodalDim = U3;

    fn evaluate_basis(&self, xi: &Point2<T>) -> Matrix1x3<T> {
        triangle_basis(xi)
    }

    fn gradients(&self, _xi: &Point2<T>) -> Matrix2x3<T> {
        triangle_gradients()
    }
}

impl<T: Real> FiniteElement<T> for Tri3d3Element<T> {
    type GeometryDim = U3;

    const SHAPE: ElementShape = ElementShape::Tri3d3;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ])
    }

    fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point3<T>] {
        &mut self.vertices
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn jacobian_determinant(&self, _xi: &Point2<T>) -> T {
        // The Jacobian columns are half the edge vectors
        self.edge_cross_product().norm() / 4.0
    }

    fn canonical_quadrature() -> QuadraturePair2d<T> {
        Self::quadrature(2).expect("Strength 2 triangle rules are always available")
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
        total_order::triangle(strength)
    }
}

impl<T: Real> SurfaceFiniteElement<T> for Tri3d3Element<T> {
    fn normal(&self, _xi: &Point2<T>) -> Vector3<T> {
        self.edge_cross_product().normalize()
    }
}
