//! Library-wide error type.
//!
//! Binding and geometry code report failures through [`Error`]. Element algorithms return
//! [`eyre::Result`] so that they can attach context, and callers recover the structured
//! error with [`eyre::Report::downcast_ref`].
use thiserror::Error;

use crate::binding::VariableKind;
use crate::element::ElementShape;

#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("field `{field}` is not registered on the mesh")]
    FieldNotFound { field: String },

    #[error("field `{field}` has no variable named `{variable}`")]
    VariableNotFound { field: String, variable: String },

    #[error("variable `{variable}` of field `{field}` has {actual} components, expected {expected}")]
    VariableDimensionMismatch {
        field: String,
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("constant with {actual} components cannot be bound in {expected} dimensions")]
    ConstantDimensionMismatch { expected: usize, actual: usize },

    #[error("{shape} elements need {expected}-dimensional coordinates, but the mesh is {actual}-dimensional")]
    MeshDimensionMismatch {
        shape: ElementShape,
        expected: usize,
        actual: usize,
    },

    #[error("`{operation}` is not supported by {kind} bindings")]
    InvalidOperation { operation: &'static str, kind: VariableKind },

    #[error("element {element_index} is degenerate (Jacobian determinant {jacobian_determinant:e})")]
    DegenerateElement {
        element_index: usize,
        jacobian_determinant: f64,
    },

    #[error("element {element_index} is a {actual} element, not {expected}")]
    ShapeMismatch {
        element_index: usize,
        expected: ElementShape,
        actual: ElementShape,
    },

    #[error("element index {element_index} is out of bounds for a mesh with {num_elements} elements")]
    ElementIndexOutOfBounds { element_index: usize, num_elements: usize },

    #[error("region `{region}` does not exist")]
    RegionNotFound { region: String },

    #[error("region `{region}` lists element {element_index} more than once")]
    DuplicateRegionElement { region: String, element_index: usize },

    #[error("slot holds a {actual} binding, but a {expected} binding was requested")]
    SlotKindMismatch { expected: VariableKind, actual: VariableKind },

    #[error("invalid mesh data: {reason}")]
    InvalidMeshData { reason: String },

    #[error("scatter target has {actual} entries, but the mesh has {expected} vertices")]
    ScatterLengthMismatch { expected: usize, actual: usize },
}
