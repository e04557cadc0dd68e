//! The element context: geometry plus an ordered set of variable bindings.
use log::trace;
use nalgebra::{DefaultAllocator, OPoint};

use crate::allocators::ElementAllocator;
use crate::binding::{FieldValue, VariableBinding, VariableDescriptor};
use crate::element::FiniteElement;
use crate::geometry::GeometryCache;
use crate::mesh::Mesh;
use crate::quadrature::QuadraturePair;
use crate::{Error, Real};

/// Everything an element algorithm needs to know about the current element.
///
/// The context owns one [`GeometryCache`] and `N` [`VariableBinding`]s whose order matches
/// the descriptors the context was created from. [`ElementContext::set_element`] moves the
/// geometry and then each binding, in slot order, to the same element, so that all of them
/// consistently refer to one element between calls.
///
/// The context also carries the quadrature rule used on the element. It is chosen once,
/// when the context is created, and does not change from element to element.
#[derive(Debug, Clone)]
pub struct ElementContext<'a, T, E, const N: usize>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    geometry: GeometryCache<'a, T, E>,
    variables: [VariableBinding<'a, T, E>; N],
    quadrature: QuadraturePair<T, E::ReferenceDim>,
}

impl<'a, T, E, const N: usize> ElementContext<'a, T, E, N>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    /// Resolves the descriptors against the mesh and sets up the geometry cache.
    ///
    /// All name lookups happen here. A missing field or variable fails before any element
    /// is visited.
    pub fn new(mesh: &'a Mesh<T>, descriptors: &[VariableDescriptor<T>; N]) -> Result<Self, Error> {
        let geometry = GeometryCache::new(mesh)?;
        let variables = descriptors
            .iter()
            .map(|descriptor| VariableBinding::new(mesh, descriptor))
            .collect::<Result<Vec<_>, _>>()?;
        let variables = <[VariableBinding<'a, T, E>; N]>::try_from(variables)
            .unwrap_or_else(|_| unreachable!("one binding is created per descriptor"));
        Ok(Self {
            geometry,
            variables,
            quadrature: E::canonical_quadrature(),
        })
    }

    /// Replaces the quadrature rule used on every element.
    pub fn with_quadrature(mut self, quadrature: QuadraturePair<T, E::ReferenceDim>) -> Self {
        self.set_quadrature(quadrature);
        self
    }

    pub fn set_quadrature(&mut self, quadrature: QuadraturePair<T, E::ReferenceDim>) {
        assert_eq!(
            quadrature.0.len(),
            quadrature.1.len(),
            "quadrature must have as many weights as points"
        );
        self.quadrature = quadrature;
    }

    /// Moves the geometry and all bindings to the given element.
    ///
    /// The geometry is updated first, so a wrong index or shape is reported before any
    /// binding is touched.
    pub fn set_element(&mut self, element_index: usize) -> Result<(), Error> {
        self.geometry.set_element(element_index)?;
        for variable in &mut self.variables {
            variable.set_element(element_index)?;
        }
        trace!("Context moved to {} element {element_index}", E::SHAPE);
        Ok(())
    }

    pub fn element_index(&self) -> Option<usize> {
        self.geometry.element_index()
    }

    pub fn geometry(&self) -> &GeometryCache<'a, T, E> {
        &self.geometry
    }

    pub fn quadrature(&self) -> &QuadraturePair<T, E::ReferenceDim> {
        &self.quadrature
    }

    /// The binding in the given slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= N`.
    pub fn variable(&self, slot: usize) -> &VariableBinding<'a, T, E> {
        &self.variables[slot]
    }

    pub fn variable_mut(&mut self, slot: usize) -> &mut VariableBinding<'a, T, E> {
        &mut self.variables[slot]
    }

    pub fn variables(&self) -> &[VariableBinding<'a, T, E>; N] {
        &self.variables
    }

    /// Evaluates the binding in the given slot at the given reference coordinates.
    pub fn eval(
        &self,
        slot: usize,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<FieldValue<T, E::GeometryDim>, Error> {
        self.variables[slot].eval(reference_coords)
    }

    /// Splits the context into the geometry and quadrature, which are read-only during
    /// element processing, and mutable access to the bindings.
    pub fn split_mut(
        &mut self,
    ) -> (
        &GeometryCache<'a, T, E>,
        &QuadraturePair<T, E::ReferenceDim>,
        &mut [VariableBinding<'a, T, E>; N],
    ) {
        (&self.geometry, &self.quadrature, &mut self.variables)
    }
}
