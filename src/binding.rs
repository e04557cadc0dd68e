//! Variable bindings: per-element views of constants, nodal fields and local accumulators.
//!
//! An element algorithm declares the data it needs as a list of [`VariableDescriptor`]s.
//! When a context is created for an element type, each descriptor is resolved against the
//! mesh into a [`VariableBinding`]. Field and variable names are looked up once, at that
//! point, so that moving to the next element only gathers nodal values.
use std::fmt;
use std::fmt::{Display, Formatter};

use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OMatrix, OPoint, OVector, Scalar};
use serde::{Deserialize, Serialize};

use crate::allocators::ElementAllocator;
use crate::element::FiniteElement;
use crate::field::Field;
use crate::geometry::GeometryCache;
use crate::mesh::Mesh;
use crate::{Error, Real};

/// A constant value, either a scalar or a vector with one entry per spatial dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue<T> {
    Scalar(T),
    Vector(Vec<T>),
}

/// Where the nodal values of a scalar field binding come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarSource<T> {
    /// A scalar variable of a field registered on the mesh.
    Field { field: String, variable: String },
    /// The same value at every node.
    Uniform(T),
}

/// Declaration of one variable slot of an element algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableDescriptor<T> {
    Constant(ConstantValue<T>),
    ScalarField(ScalarSource<T>),
    VectorField { field: String, variable: String },
    /// A local square matrix with one row and column per element node.
    ElementMatrix,
    /// A local vector with one entry per element node.
    ElementVector,
}

impl<T> VariableDescriptor<T> {
    pub fn scalar_field(field: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::ScalarField(ScalarSource::Field {
            field: field.into(),
            variable: variable.into(),
        })
    }

    pub fn uniform_scalar(value: T) -> Self {
        Self::ScalarField(ScalarSource::Uniform(value))
    }

    pub fn vector_field(field: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::VectorField {
            field: field.into(),
            variable: variable.into(),
        }
    }

    pub fn constant_scalar(value: T) -> Self {
        Self::Constant(ConstantValue::Scalar(value))
    }

    pub fn constant_vector(value: impl Into<Vec<T>>) -> Self {
        Self::Constant(ConstantValue::Vector(value.into()))
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Self::Constant(_) => VariableKind::Constant,
            Self::ScalarField(_) => VariableKind::ScalarField,
            Self::VectorField { .. } => VariableKind::VectorField,
            Self::ElementMatrix => VariableKind::ElementMatrix,
            Self::ElementVector => VariableKind::ElementVector,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Constant,
    ScalarField,
    VectorField,
    ElementMatrix,
    ElementVector,
}

impl Display for VariableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::ScalarField => "scalar field",
            Self::VectorField => "vector field",
            Self::ElementMatrix => "element matrix",
            Self::ElementVector => "element vector",
        };
        write!(f, "{name}")
    }
}

/// A scalar or a `D`-dimensional vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    Scalar(T),
    Vector(OVector<T, D>),
}

impl<T, D> FieldValue<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn as_scalar(&self) -> Option<&T> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&OVector<T, D>> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(value) => Some(value),
        }
    }
}

/// Nodes of an element, after checking that the element has the shape of `E`.
fn element_nodes_checked<'a, T, E>(mesh: &'a Mesh<T>, element_index: usize) -> Result<&'a [usize], Error>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    mesh.check_element_index(element_index)?;
    let actual = mesh.element_shape(element_index);
    if actual == E::SHAPE {
        Ok(mesh.element_nodes(element_index))
    } else {
        Err(Error::ShapeMismatch {
            element_index,
            expected: E::SHAPE,
            actual,
        })
    }
}

/// A constant, identical for every element.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantData<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    value: FieldValue<T, D>,
}

impl<T, D> ConstantData<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(value: &ConstantValue<T>) -> Result<Self, Error> {
        let value = match value {
            ConstantValue::Scalar(scalar) => FieldValue::Scalar(*scalar),
            ConstantValue::Vector(vector) if vector.len() == D::dim() => {
                FieldValue::Vector(OVector::<T, D>::from_column_slice(vector))
            }
            ConstantValue::Vector(vector) => {
                return Err(Error::ConstantDimensionMismatch {
                    expected: D::dim(),
                    actual: vector.len(),
                })
            }
        };
        Ok(Self { value })
    }

    pub fn value(&self) -> &FieldValue<T, D> {
        &self.value
    }
}

#[derive(Debug, Clone)]
enum NodalSource<'a, T> {
    Uniform,
    Column { field: &'a Field<T>, column: usize },
}

/// Nodal values of a scalar variable on the current element.
#[derive(Debug, Clone)]
pub struct ScalarFieldData<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    mesh: &'a Mesh<T>,
    source: NodalSource<'a, T>,
    // Provides the basis functions used for interpolation
    interpolant: E,
    values: OVector<T, E::NodalDim>,
}

impl<'a, T, E> ScalarFieldData<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    /// Resolves the source against the mesh.
    ///
    /// Fails if the field or variable does not exist, or if the variable is not scalar.
    pub fn new(mesh: &'a Mesh<T>, source: &ScalarSource<T>) -> Result<Self, Error> {
        let (source, values) = match source {
            ScalarSource::Uniform(value) => (NodalSource::Uniform, OVector::repeat_generic(E::NodalDim::name(), nalgebra::Const::<1>, *value)),
            ScalarSource::Field { field, variable } => {
                let field = mesh.field(field)?;
                let variable = field.variable(variable)?;
                if variable.dim() != 1 {
                    return Err(Error::VariableDimensionMismatch {
                        field: field.name().to_string(),
                        variable: variable.name().to_string(),
                        expected: 1,
                        actual: variable.dim(),
                    });
                }
                let column = variable.offset();
                (NodalSource::Column { field, column }, OVector::zeros_generic(E::NodalDim::name(), nalgebra::Const::<1>))
            }
        };
        Ok(Self {
            mesh,
            source,
            interpolant: E::reference(),
            values,
        })
    }

    /// Gathers the nodal values of the given element.
    pub fn set_element(&mut self, element_index: usize) -> Result<(), Error> {
        let nodes = element_nodes_checked::<T, E>(self.mesh, element_index)?;
        if let NodalSource::Column { field, column } = &self.source {
            for (value, &node) in self.values.iter_mut().zip(nodes) {
                *value = field.node_values(node)[*column];
            }
        }
        Ok(())
    }

    /// Whether the field has the same value at every node of every element.
    pub fn is_uniform(&self) -> bool {
        matches!(self.source, NodalSource::Uniform)
    }

    /// Nodal values on the current element, in local node order.
    pub fn value(&self) -> &OVector<T, E::NodalDim> {
        &self.values
    }

    /// Interpolates the nodal values at the given reference coordinates.
    pub fn eval(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> T {
        let phi = self.interpolant.evaluate_basis(reference_coords);
        phi.dot(&self.values.transpose())
    }

    /// Physical gradient of the interpolated field.
    pub fn gradient(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<OVector<T, E::GeometryDim>, Error> {
        Ok(geometry.gradient(reference_coords)? * &self.values)
    }

    /// The matrix `G^T G` of physical basis gradients `G`.
    ///
    /// Multiplying it with the nodal values gives the weak-form Laplacian contribution at the
    /// given point.
    pub fn laplacian(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<OMatrix<T, E::NodalDim, E::NodalDim>, Error> {
        let gradients = geometry.gradient(reference_coords)?;
        Ok(gradients.transpose() * gradients)
    }
}

/// Nodal values of a vector variable on the current element.
///
/// The variable must have one component per geometric dimension.
#[derive(Debug, Clone)]
pub struct VectorFieldData<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    mesh: &'a Mesh<T>,
    field: &'a Field<T>,
    offset: usize,
    interpolant: E,
    // One row per node
    values: OMatrix<T, E::NodalDim, E::GeometryDim>,
}

impl<'a, T, E> VectorFieldData<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    pub fn new(mesh: &'a Mesh<T>, field: &str, variable: &str) -> Result<Self, Error> {
        let field = mesh.field(field)?;
        let variable = field.variable(variable)?;
        let expected = <E::GeometryDim as DimName>::dim();
        if variable.dim() != expected {
            return Err(Error::VariableDimensionMismatch {
                field: field.name().to_string(),
                variable: variable.name().to_string(),
                expected,
                actual: variable.dim(),
            });
        }
        Ok(Self {
            mesh,
            field,
            offset: variable.offset(),
            interpolant: E::reference(),
            values: OMatrix::zeros_generic(E::NodalDim::name(), E::GeometryDim::name()),
        })
    }

    pub fn set_element(&mut self, element_index: usize) -> Result<(), Error> {
        let nodes = element_nodes_checked::<T, E>(self.mesh, element_index)?;
        let dim = <E::GeometryDim as DimName>::dim();
        for (i, &node) in nodes.iter().enumerate() {
            let components = &self.field.node_values(node)[self.offset..self.offset + dim];
            for (d, &component) in components.iter().enumerate() {
                self.values[(i, d)] = component;
            }
        }
        Ok(())
    }

    /// Nodal vectors on the current element, one row per node.
    pub fn value(&self) -> &OMatrix<T, E::NodalDim, E::GeometryDim> {
        &self.values
    }

    /// Interpolates the nodal vectors at the given reference coordinates.
    pub fn eval(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> OVector<T, E::GeometryDim> {
        let phi = self.interpolant.evaluate_basis(reference_coords);
        (phi * &self.values).transpose()
    }

    /// Physical gradient of the interpolated field, with entry `(i, j)` the derivative of
    /// component `i` along axis `j`.
    pub fn gradient(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<OMatrix<T, E::GeometryDim, E::GeometryDim>, Error> {
        let gradients = geometry.gradient(reference_coords)?;
        Ok(self.values.transpose() * gradients.transpose())
    }

    pub fn divergence(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        reference_coords: &OPoint<T, E::ReferenceDim>,
    ) -> Result<T, Error> {
        Ok(self.gradient(geometry, reference_coords)?.trace())
    }
}

/// A variable slot of an element context, resolved against a mesh.
#[derive(Debug, Clone)]
pub enum VariableBinding<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    Constant(ConstantData<T, E::GeometryDim>),
    ScalarField(ScalarFieldData<'a, T, E>),
    VectorField(VectorFieldData<'a, T, E>),
    /// Zeroed whenever the element changes.
    ElementMatrix(OMatrix<T, E::NodalDim, E::NodalDim>),
    /// Zeroed whenever the element changes.
    ElementVector(OVector<T, E::NodalDim>),
}

/// Borrowed value of a binding on the current element.
#[derive(Debug)]
pub enum VariableValue<'b, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    Constant(&'b FieldValue<T, E::GeometryDim>),
    NodalScalars(&'b OVector<T, E::NodalDim>),
    NodalVectors(&'b OMatrix<T, E::NodalDim, E::GeometryDim>),
    ElementMatrix(&'b OMatrix<T, E::NodalDim, E::NodalDim>),
    ElementVector(&'b OVector<T, E::NodalDim>),
}

impl<'a, T, E> VariableBinding<'a, T, E>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    /// Resolves a descriptor against the mesh.
    pub fn new(mesh: &'a Mesh<T>, descriptor: &VariableDescriptor<T>) -> Result<Self, Error> {
        Ok(match descriptor {
            VariableDescriptor::Constant(value) => Self::Constant(ConstantData::new(value)?),
            VariableDescriptor::ScalarField(source) => Self::ScalarField(ScalarFieldData::new(mesh, source)?),
            VariableDescriptor::VectorField { field, variable } => {
                Self::VectorField(VectorFieldData::new(mesh, field, variable)?)
            }
            VariableDescriptor::ElementMatrix => Self::ElementMatrix(OMatrix::zeros_generic(E::NodalDim::name(), E::NodalDim::name())),
            VariableDescriptor::ElementVector => Self::ElementVector(OVector::zeros_generic(E::NodalDim::name(), nalgebra::Const::<1>)),
        })
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            Self::Constant(_) => VariableKind::Constant,
            Self::ScalarField(_) => VariableKind::ScalarField,
            Self::VectorField(_) => VariableKind::VectorField,
            Self::ElementMatrix(_) => VariableKind::ElementMatrix,
            Self::ElementVector(_) => VariableKind::ElementVector,
        }
    }

    /// Moves the binding to the given element.
    ///
    /// Fields gather their nodal values, accumulators are reset to zero and constants are
    /// left untouched.
    pub fn set_element(&mut self, element_index: usize) -> Result<(), Error> {
        match self {
            Self::Constant(_) => Ok(()),
            Self::ScalarField(data) => data.set_element(element_index),
            Self::VectorField(data) => data.set_element(element_index),
            Self::ElementMatrix(matrix) => {
                matrix.fill(T::zero());
                Ok(())
            }
            Self::ElementVector(vector) => {
                vector.fill(T::zero());
                Ok(())
            }
        }
    }

    /// Evaluates the binding at the given reference coordinates.
    ///
    /// Accumulators have no interpolated value and fail with [`Error::InvalidOperation`].
    pub fn eval(&self, reference_coords: &OPoint<T, E::ReferenceDim>) -> Result<FieldValue<T, E::GeometryDim>, Error> {
        match self {
            Self::Constant(data) => Ok(data.value().clone()),
            Self::ScalarField(data) => Ok(FieldValue::Scalar(data.eval(reference_coords))),
            Self::VectorField(data) => Ok(FieldValue::Vector(data.eval(reference_coords))),
            Self::ElementMatrix(_) | Self::ElementVector(_) => Err(Error::InvalidOperation {
                operation: "eval",
                kind: self.kind(),
            }),
        }
    }

    /// The binding's value on the current element.
    pub fn value(&self) -> VariableValue<'_, T, E> {
        match self {
            Self::Constant(data) => VariableValue::Constant(data.value()),
            Self::ScalarField(data) => VariableValue::NodalScalars(data.value()),
            Self::VectorField(data) => VariableValue::NodalVectors(data.value()),
            Self::ElementMatrix(matrix) => VariableValue::ElementMatrix(matrix),
            Self::ElementVector(vector) => VariableValue::ElementVector(vector),
        }
    }

    fn mismatch(&self, expected: VariableKind) -> Error {
        Error::SlotKindMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_constant(&self) -> Result<&ConstantData<T, E::GeometryDim>, Error> {
        match self {
            Self::Constant(data) => Ok(data),
            _ => Err(self.mismatch(VariableKind::Constant)),
        }
    }

    pub fn as_scalar_field(&self) -> Result<&ScalarFieldData<'a, T, E>, Error> {
        match self {
            Self::ScalarField(data) => Ok(data),
            _ => Err(self.mismatch(VariableKind::ScalarField)),
        }
    }

    pub fn as_vector_field(&self) -> Result<&VectorFieldData<'a, T, E>, Error> {
        match self {
            Self::VectorField(data) => Ok(data),
            _ => Err(self.mismatch(VariableKind::VectorField)),
        }
    }

    pub fn element_matrix(&self) -> Result<&OMatrix<T, E::NodalDim, E::NodalDim>, Error> {
        match self {
            Self::ElementMatrix(matrix) => Ok(matrix),
            _ => Err(self.mismatch(VariableKind::ElementMatrix)),
        }
    }

    pub fn element_matrix_mut(&mut self) -> Result<&mut OMatrix<T, E::NodalDim, E::NodalDim>, Error> {
        let actual = self.kind();
        match self {
            Self::ElementMatrix(matrix) => Ok(matrix),
            _ => Err(Error::SlotKindMismatch {
                expected: VariableKind::ElementMatrix,
                actual,
            }),
        }
    }

    pub fn element_vector(&self) -> Result<&OVector<T, E::NodalDim>, Error> {
        match self {
            Self::ElementVector(vector) => Ok(vector),
            _ => Err(self.mismatch(VariableKind::ElementVector)),
        }
    }

    pub fn element_vector_mut(&mut self) -> Result<&mut OVector<T, E::NodalDim>, Error> {
        let actual = self.kind();
        match self {
            Self::ElementVector(vector) => Ok(vector),
            _ => Err(Error::SlotKindMismatch {
                expected: VariableKind::ElementVector,
                actual,
            }),
        }
    }
}
