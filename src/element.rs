//! Reference elements, their geometric mappings and the runtime shape tag.
//!
//! Every supported element type is a concrete struct holding its vertex coordinates. The
//! basis functions are defined on a fixed reference domain, and the geometric map from the
//! reference domain to physical space is the isoparametric one, i.e. the same basis functions
//! interpolate the vertex coordinates.
//!
//! Element structs are statically typed: all matrix dimensions are known at compile time.
//! A mesh, on the other hand, stores a runtime [`ElementShape`] tag per element. The
//! dispatcher bridges the two by matching on the tag and instantiating the statically typed
//! code path for each shape.
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

use itertools::Itertools;
use nalgebra::{DefaultAllocator, DimName, OMatrix, OPoint, OVector, U1};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

use crate::allocators::{BiDimAllocator, ElementAllocator};
use crate::quadrature::{QuadratureError, QuadraturePair};
use crate::{Real, SmallDim};

mod hexahedron;
mod quadrilateral;
mod segment;
mod tetrahedron;
mod triangle;

pub use hexahedron::*;
pub use quadrilateral::*;
pub use segment::*;
pub use tetrahedron::*;
pub use triangle::*;

/// Runtime tag identifying the concrete element type of a mesh element.
///
/// The naming follows `<Shape><NumNodes>d<GeometryDim>`, except for the segments whose
/// suffix is only the geometric dimension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementShape {
    /// Two-node line segment in one dimension.
    Segment2d1,
    /// Two-node line segment embedded in two dimensions, typically a boundary face.
    Segment2d2,
    /// Three-node triangle in two dimensions.
    Tri3d2,
    /// Four-node quadrilateral in two dimensions.
    Quad4d2,
    /// Three-node triangle embedded in three dimensions, typically a boundary face.
    Tri3d3,
    /// Four-node tetrahedron.
    Tet4,
    /// Eight-node hexahedron.
    Hex8,
}

impl ElementShape {
    pub const ALL: [ElementShape; 7] = [
        ElementShape::Segment2d1,
        ElementShape::Segment2d2,
        ElementShape::Tri3d2,
        ElementShape::Quad4d2,
        ElementShape::Tri3d3,
        ElementShape::Tet4,
        ElementShape::Hex8,
    ];

    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Segment2d1 | Self::Segment2d2 => 2,
            Self::Tri3d2 | Self::Tri3d3 => 3,
            Self::Quad4d2 | Self::Tet4 => 4,
            Self::Hex8 => 8,
        }
    }

    /// Dimension of the physical space the element lives in.
    pub fn geometry_dim(&self) -> usize {
        match self {
            Self::Segment2d1 => 1,
            Self::Segment2d2 | Self::Tri3d2 | Self::Quad4d2 => 2,
            Self::Tri3d3 | Self::Tet4 | Self::Hex8 => 3,
        }
    }

    /// Dimension of the reference domain.
    pub fn reference_dim(&self) -> usize {
        match self {
            Self::Segment2d1 | Self::Segment2d2 => 1,
            Self::Tri3d2 | Self::Quad4d2 | Self::Tri3d3 => 2,
            Self::Tet4 | Self::Hex8 => 3,
        }
    }

    /// Whether the element has co-dimension one, i.e. it is a face rather than a cell.
    pub fn is_boundary(&self) -> bool {
        self.geometry_dim() > self.reference_dim()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Segment2d1 => "Segment2d1",
            Self::Segment2d2 => "Segment2d2",
            Self::Tri3d2 => "Tri3d2",
            Self::Quad4d2 => "Quad4d2",
            Self::Tri3d3 => "Tri3d3",
            Self::Tet4 => "Tet4",
            Self::Hex8 => "Hex8",
        }
    }
}

impl Display for ElementShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Basis functions on a fixed reference domain.
pub trait ReferenceFiniteElement<T>
where
    T: Real,
    DefaultAllocator: BiDimAllocator<T, Self::ReferenceDim, Self::NodalDim>,
{
    type ReferenceDim: SmallDim;
    type NodalDim: DimName;

    fn num_nodes(&self) -> usize {
        <Self::NodalDim as DimName>::dim()
    }

    /// Evaluates each basis function at the given reference coordinates, as a row vector.
    fn evaluate_basis(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OMatrix<T, U1, Self::NodalDim>;

    /// Gradients of the basis functions with respect to reference coordinates.
    ///
    /// Column `i` holds the gradient of basis function `i`.
    fn gradients(
        &self,
        reference_coords: &OPoint<T, Self::ReferenceDim>,
    ) -> OMatrix<T, Self::ReferenceDim, Self::NodalDim>;
}

/// An element with vertices in physical space and an isoparametric geometric map.
pub trait FiniteElement<T>: ReferenceFiniteElement<T> + Clone + Debug
where
    T: Real,
    DefaultAllocator: ElementAllocator<T, Self::GeometryDim, Self::ReferenceDim, Self::NodalDim>,
{
    type GeometryDim: SmallDim;

    /// The runtime tag corresponding to this element type.
    const SHAPE: ElementShape;

    /// The element whose vertices coincide with the reference domain's vertices.
    ///
    /// For boundary elements the reference vertices are embedded in the higher-dimensional
    /// space with trailing coordinates set to zero.
    fn reference() -> Self;

    fn vertices(&self) -> &[OPoint<T, Self::GeometryDim>];

    fn vertices_mut(&mut self) -> &mut [OPoint<T, Self::GeometryDim>];

    /// Measure of the geometric map's local scaling.
    ///
    /// For cells this is the signed determinant of the Jacobian, which is non-positive for
    /// degenerate or inverted elements. For boundary elements it is the length of the
    /// tangent (segments) or the area of the tangent parallelogram (triangles).
    fn jacobian_determinant(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> T;

    /// The quadrature rule used when no other rule is requested.
    fn canonical_quadrature() -> QuadraturePair<T, Self::ReferenceDim>;

    /// A quadrature rule of at least the given polynomial strength.
    fn quadrature(strength: usize) -> Result<QuadraturePair<T, Self::ReferenceDim>, QuadratureError>;

    /// Vertex coordinates as the columns of a matrix.
    fn vertex_matrix(&self) -> OMatrix<T, Self::GeometryDim, Self::NodalDim> {
        OMatrix::<T, Self::GeometryDim, Self::NodalDim>::from_fn(|i, j| self.vertices()[j][i])
    }

    /// Jacobian of the geometric map, with shape `GeometryDim x ReferenceDim`.
    #[allow(non_snake_case)]
    fn reference_jacobian(
        &self,
        reference_coords: &OPoint<T, Self::ReferenceDim>,
    ) -> OMatrix<T, Self::GeometryDim, Self::ReferenceDim> {
        let X = self.vertex_matrix();
        let G = self.gradients(reference_coords);
        X * G.transpose()
    }

    /// Maps reference coordinates to physical coordinates.
    #[allow(non_snake_case)]
    fn map_reference_coords(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OPoint<T, Self::GeometryDim> {
        let X = self.vertex_matrix();
        let N = self.evaluate_basis(reference_coords);
        OPoint::from(X * N.transpose())
    }

    /// Length, area or volume of the element.
    ///
    /// Integrates the Jacobian determinant with the canonical rule, which is exact for all
    /// supported element types. Inverted cells therefore have negative volume.
    fn volume(&self) -> T {
        let (weights, points) = Self::canonical_quadrature();
        weights
            .iter()
            .zip(&points)
            .map(|(&w, xi)| w * self.jacobian_determinant(xi))
            .fold(T::zero(), |acc, v| acc + v)
    }

    /// Largest distance between any two vertices.
    fn diameter(&self) -> T {
        self.vertices()
            .iter()
            .tuple_combinations()
            .map(|(x, y)| (x - y).norm())
            .fold(T::zero(), |a, b| a.max(b))
    }
}

/// A boundary element with a well-defined unit normal.
pub trait SurfaceFiniteElement<T>: FiniteElement<T>
where
    T: Real,
    DefaultAllocator: ElementAllocator<T, Self::GeometryDim, Self::ReferenceDim, Self::NodalDim>,
{
    /// Unit normal at the given reference coordinates.
    ///
    /// Segments in counter-clockwise order and triangles with counter-clockwise vertices
    /// (seen from outside) give outward normals.
    fn normal(&self, reference_coords: &OPoint<T, Self::ReferenceDim>) -> OVector<T, Self::GeometryDim>;
}

/// One-dimensional linear Lagrange basis function associated with the node at `alpha`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn phi_linear_1d<T: Real>(alpha: T, xi: T) -> T {
    (1.0 + alpha * xi) / 2.0
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn phi_linear_1d_grad<T: Real>(alpha: T) -> T {
    alpha / 2.0
}
