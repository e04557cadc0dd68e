//! Element iteration and per-element data binding for mesh-based PDE solvers.
//!
//! A [`mesh::Mesh`] stores vertex coordinates, a mixed-shape connectivity table, named nodal
//! [`field::Field`]s and named element [`mesh::Region`]s. Element algorithms declare the
//! variables they need as [`binding::VariableDescriptor`]s and receive, for each element, an
//! [`context::ElementContext`] holding the element geometry and the bound variables. The
//! [`dispatch`] module walks a region and instantiates the statically typed element code for
//! each element shape. [`scheme`] builds a flux-redistribution scheme on top of this.

pub mod allocators;
pub mod binding;
pub mod connectivity;
pub mod context;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod procedural;
pub mod quadrature;
pub mod scheme;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use error::Error;
pub use rdfem_traits::{Real, SmallDim};

pub extern crate nalgebra;
