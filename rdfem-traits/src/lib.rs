//! Core traits shared by the `rdfem` crates.
//!
//! Element, quadrature and binding code is written generically over the scalar type and
//! over statically known dimensions. The traits here bundle the bounds that such code
//! needs so that signatures stay readable.
use nalgebra::{DimMin, DimName, RealField};

pub use nalgebra;

pub mod allocators;

/// Scalar type used for coordinates, field values and residuals.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// A small, statically known dimension, such as a geometric or reference dimension.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
