//! Allocator trait aliases for element-generic code.
//!
//! Almost every generic function in this crate needs nalgebra to allocate matrices whose
//! dimensions are taken from an element's associated types. [`ElementAllocator`] collects
//! all of these requirements so that a single bound suffices.
pub use rdfem_traits::allocators::{BiDimAllocator, DimAllocator, TriDimAllocator};

use nalgebra::{DefaultAllocator, DimName, Scalar};

/// Allocator requirements for an element with the given geometric, reference and nodal
/// dimensions.
pub trait ElementAllocator<T, GeometryDim, ReferenceDim, NodalDim>:
    TriDimAllocator<T, GeometryDim, ReferenceDim, NodalDim>
where
    T: Scalar,
    GeometryDim: DimName,
    ReferenceDim: DimName,
    NodalDim: DimName,
{
}

impl<T, GeometryDim, ReferenceDim, NodalDim> ElementAllocator<T, GeometryDim, ReferenceDim, NodalDim>
    for DefaultAllocator
where
    T: Scalar,
    GeometryDim: DimName,
    ReferenceDim: DimName,
    NodalDim: DimName,
    DefaultAllocator: TriDimAllocator<T, GeometryDim, ReferenceDim, NodalDim>,
{
}
