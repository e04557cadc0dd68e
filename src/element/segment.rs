use nalgebra::{Matrix1x2, Point1, Point2, Vector2, U1, U2};
use numeric_literals::replace_float_literals;

use crate::element::{ElementShape, FiniteElement, ReferenceFiniteElement, SurfaceFiniteElement};
use crate::quadrature::{total_order, QuadratureError, QuadraturePair1d};
use crate::Real;

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn segment_basis<T: Real>(xi: &Point1<T>) -> Matrix1x2<T> {
    Matrix1x2::new((1.0 - xi[0]) / 2.0, (1.0 + xi[0]) / 2.0)
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn segment_gradients<T: Real>() -> Matrix1x2<T> {
    Matrix1x2::new(-0.5, 0.5)
}

/// A two-node segment on the real line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment2d1Element<T: Real> {
    vertices: [Point1<T>; 2],
}

impl<T: Real> Segment2d1Element<T> {
    pub fn from_vertices(vertices: [Point1<T>; 2]) -> Self {
        Self { vertices }
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Segment2d1Element<T> {
    type ReferenceDim = U1;
    type NodalDim = U2;

    fn evaluate_basis(&self, xi: &Point1<T>) -> Matrix1x2<T> {
        segment_basis(xi)
    }

    fn gradients(&self, _xi: &Point1<T>) -> Matrix1x2<T> {
        segment_gradients()
    }
}

impl<T: Real> FiniteElement<T> for Segment2d1Element<T> {
    type GeometryDim = U1;

    const SHAPE: ElementShape = ElementShape::Segment2d1;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([Point1::new(-1.0), Point1::new(1.0)])
    }

    fn vertices(&self) -> &[Point1<T>] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point1<T>] {
        &mut self.vertices
    }

    fn jacobian_determinant(&self, xi: &Point1<T>) -> T {
        self.reference_jacobian(xi)[(0, 0)]
    }

    fn canonical_quadrature() -> QuadraturePair1d<T> {
        total_order::segment(2)
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair1d<T>, QuadratureError> {
        Ok(total_order::segment(strength))
    }
}

/// A two-node segment embedded in the plane.
///
/// Mostly used for boundary faces of two-dimensional meshes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment2d2Element<T: Real> {
    vertices: [Point2<T>; 2],
}

impl<T: Real> Segment2d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 2]) -> Self {
        Self { vertices }
    }

    /// The (unnormalized) direction from the first to the second vertex.
    pub fn tangent(&self) -> Vector2<T> {
        self.vertices[1] - self.vertices[0]
    }
}

impl<T: Real> ReferenceFiniteElement<T> for Segment2d2Element<T> {
    type ReferenceDim = U1;
    type NodalDim = U2;

    fn evaluate_basis(&self, xi: &Point1<T>) -> Matrix1x2<T> {
        segment_basis(xi)
    }

    fn gradients(&self, _xi: &Point1<T>) -> Matrix1x2<T> {
        segment_gradients()
    }
}

impl<T: Real> FiniteElement<T> for Segment2d2Element<T> {
    type GeometryDim = U2;

    const SHAPE: ElementShape = ElementShape::Segment2d2;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, 0.0), Point2::new(1.0, 0.0)])
    }

    fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Point2<T>] {
        &mut self.vertices
    }

    fn jacobian_determinant(&self, xi: &Point1<T>) -> T {
        self.reference_jacobian(xi).norm()
    }

    fn canonical_quadrature() -> QuadraturePair1d<T> {
        total_order::segment(2)
    }

    fn quadrature(strength: usize) -> Result<QuadraturePair1d<T>, QuadratureError> {
        Ok(total_order::segment(strength))
    }
}

impl<T: Real> SurfaceFiniteElement<T> for Segment2d2Element<T> {
    fn normal(&self, _xi: &Point1<T>) -> Vector2<T> {
        // Rotating the tangent clockwise gives the outward normal of a counter-clockwise boundary
        let t = self.tangent();
        Vector2::new(t.y, -t.x).normalize()
    }
}
