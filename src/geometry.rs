//! Per-element geometric data for the element currently being processed.
use nalgebra::allocator::Allocator;
use nalgebra::{try_convert, DefaultAllocator, DimName, OMatrix, OPoint, OVector, Scalar, U1};

use crate::allocators::ElementAllocator;
use crate::element::{FiniteElement, SurfaceFiniteElement};
use crate::mesh::Mesh;
use crate::{Error, Real};

/// An axis-aligned box enclosing a set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAlignedBoundingBox<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    min: OPoint<T, D>,
    max: OPoint<T, D>,
}

impl<T, D> AxisAlignedBoundingBox<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// A box containing only the given point.
    pub fn from_point(point: OPoint<T, D>) -> Self {
        Self {
            min: point.clone(),
            max: point,
        }
    }

    /// Grows the box so that it contains the given point.
    pub fn enclose_point(&mut self, point: &OPoint<T, D>) {
        for i in 0..D::dim() {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    pub fn min(&self) -> &OPoint<T, D> {
        &self.min
    }

    pub fn max(&self) -> &OPoint<T, D> {
        &self.max
    }

    /// Side lengths of the box along each axis.
    pub fn extents(&self) -> OVector<T, D> {
        &self.max - &self.min
    }

    /// Length of the box diagonal.
    pub fn diagonal_length(&self) -> T {
        self.extents().norm()
    }
}

/// Geometric data of a single mesh element of a fixed element type.
///
/// A cache is bound to one mesh and one element type. [`GeometryCache::set_element`] loads
/// the vertex coordinates of an element into the cache, after which all queries refer to
/// that element until the next call. Before the first call the cache holds the reference
/// element.
#[derive(Debug, Clone)]
pub struct GeometryCache<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    mesh: &'a Mesh<T>,
    element: E,
    element_index: Option<usize>,
}

impl<'a, T, E> GeometryCache<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    /// Creates a cache for elements of type `E` in the given mesh.
    ///
    /// Fails if the mesh coordinates do not have the geometric dimension of `E`.
    pub fn new(mesh: &'a Mesh<T>) -> Result<Self, Error> {
        let expected = <E::GeometryDim as DimName>::dim();
        if mesh.dim() != expected {
            return Err(Error::MeshDimensionMismatch {
                shape: E::SHAPE,
                expected,
                actual: mesh.dim(),
            });
        }
        Ok(Self {
            mesh,
            element: E::reference(),
            element_index: None,
        })
    }

    /// Loads the vertex coordinates of the given element.
    ///
    /// The coordinates are copied in the element's local node order. The element must have
    /// the shape of `E`.
    pub fn set_element(&mut self, element_index: usize) -> Result<(), Error> {
        self.mesh.check_element_index(element_index)?;
        let actual = self.mesh.element_shape(element_index);
        if actual != E::SHAPE {
            return Err(Error::ShapeMismatch {
                element_index,
                expected: E::SHAPE,
                actual,
            });
        }

        let mesh = self.mesh;
        let nodes = mesh.element_nodes(element_index);
        for (vertex, &node) in self.element.vertices_mut().iter_mut().zip(nodes) {
            vertex
                .coords
                .copy_from_slice(mesh.vertex_coordinates(node));
        }
        self.element_index = Some(element_index);
        Ok(())
    }

    pub fn mesh(&self) -> &'a Mesh<T> {
        self.mesh
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// Index of the current element, if one has been set.
    pub fn element_index(&self) -> Option<usize> {
        self.element_index
    }

    /// Global vertex indices of the current element.
    ///
    /// Empty if no element has been set.
    pub fn element_nodes(&self) -> &'a [usize] {
        match self.element_index {
            Some(index) => self.mesh.element_nodes(index),
            None => &[],
        }
    }

    /// Vertex coordinates of the current element, one row per node.
    pub fn nodes(&self) -> OMatrix<T, E::NodalDim, E::GeometryDim> {
        self.element.vertex_matrix().transpose()
    }

    pub fn shape_function(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> OMatrix<T, U1, E::NodalDim> {
        self.element.evaluate_basis(reference_coords)
    }

    /// Basis function gradients with respect to reference coordinates.
    pub fn mapped_gradient(
        &self,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> OMatrix<T, E::ReferenceDim, E::NodalDim> {
        self.element.gradients(reference_coords)
    }

    /// Outer product of the basis function values with themselves.
    pub fn sf_outer_product(
        &self,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> OMatrix<T, E::NodalDim, E::NodalDim> {
        let phi = self.shape_function(reference_coords);
        phi.transpose() * phi
    }

    pub fn jacobian(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> OMatrix<T, E::GeometryDim, E::ReferenceDim> {
        self.element.reference_jacobian(reference_coords)
    }

    /// The Jacobian determinant of the current element.
    ///
    /// Fails with [`Error::DegenerateElement`] if the determinant is not strictly positive.
    pub fn jacobian_determinant(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> Result<T, Error> {
        let det = self.element.jacobian_determinant(reference_coords);
        if det > T::zero() {
            Ok(det)
        } else {
            Err(self.degenerate(det))
        }
    }

    /// Maps reference coordinates to physical coordinates.
    pub fn coordinates(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> OPoint<T, E::GeometryDim> {
        self.element.map_reference_coords(reference_coords)
    }

    /// Basis function gradients with respect to physical coordinates.
    ///
    /// Column `i` holds the gradient of basis function `i`. For boundary elements this is the
    /// tangential gradient.
    #[allow(non_snake_case)]
    pub fn gradient(
        &self,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<OMatrix<T, E::GeometryDim, E::NodalDim>, Error> {
        let det = self.jacobian_determinant(reference_coords)?;
        let J = self.jacobian(reference_coords);
        // J (J^T J)^{-1} reduces to J^{-T} for square Jacobians
        let metric_inverse = (J.transpose() * &J)
            .try_inverse()
            .ok_or_else(|| self.degenerate(det))?;
        Ok(J * metric_inverse * self.mapped_gradient(reference_coords))
    }

    /// Length, area or volume of the current element.
    ///
    /// Integrates the Jacobian determinant with the canonical rule. Fails with
    /// [`Error::DegenerateElement`] if the determinant is not strictly positive at any of the
    /// quadrature points.
    pub fn volume(&self) -> Result<T, Error> {
        let (weights, points) = E::canonical_quadrature();
        weights
            .iter()
            .zip(&points)
            .try_fold(T::zero(), |volume, (&w, xi)| Ok(volume + w * self.jacobian_determinant(xi)?))
    }

    pub fn diameter(&self) -> T {
        self.element.diameter()
    }

    pub fn bounding_box(&self) -> AxisAlignedBoundingBox<T, E::GeometryDim> {
        let vertices = self.element.vertices();
        let mut bounds = AxisAlignedBoundingBox::from_point(vertices[0].clone());
        for vertex in &vertices[1..] {
            bounds.enclose_point(vertex);
        }
        bounds
    }

    fn degenerate(&self, jacobian_determinant: T) -> Error {
        Error::DegenerateElement {
            element_index: self.element_index.unwrap_or_default(),
            jacobian_determinant: try_convert(jacobian_determinant).unwrap_or(f64::NAN),
        }
    }
}

impl<'a, T, E> GeometryCache<'a, T, E>
where
    T: Real,
    E: SurfaceFiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    /// Unit normal of the current boundary element.
    ///
    /// Fails with [`Error::DegenerateElement`] if the element has collapsed at the given
    /// point, since the normal is undefined there.
    pub fn normal(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> Result<OVector<T, E::GeometryDim>, Error> {
        self.jacobian_determinant(reference_coords)?;
        Ok(self.element.normal(reference_coords))
    }
}
