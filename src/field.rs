//! Nodal data tables attached to a mesh.
//!
//! A [`Field`] stores one row of values per mesh vertex. Each row is partitioned into named
//! [`FieldVariable`]s, each occupying a contiguous block of columns. A scalar variable has
//! one column, a vector variable one column per spatial dimension.
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A named block of columns within a field row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVariable {
    name: String,
    offset: usize,
    dim: usize,
}

impl FieldVariable {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the first column of the variable within a row.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of columns occupied by the variable.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn columns(&self) -> Range<usize> {
        self.offset..self.offset + self.dim
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldData<T>")]
pub struct Field<T> {
    name: String,
    variables: Vec<FieldVariable>,
    row_size: usize,
    num_nodes: usize,
    data: Vec<T>,
}

/// Serialized form of a [`Field`], checked before it is accepted.
#[derive(Deserialize)]
struct FieldData<T> {
    name: String,
    variables: Vec<FieldVariable>,
    row_size: usize,
    num_nodes: usize,
    data: Vec<T>,
}

impl<T> TryFrom<FieldData<T>> for Field<T> {
    type Error = Error;

    fn try_from(field: FieldData<T>) -> Result<Self, Error> {
        let invalid = |reason: String| Err(Error::InvalidMeshData { reason });
        let mut offset = 0;
        for variable in &field.variables {
            if variable.offset != offset {
                return invalid(format!(
                    "variable `{}` of field `{}` starts at column {}, expected {offset}",
                    variable.name, field.name, variable.offset
                ));
            }
            offset += variable.dim;
        }
        if offset != field.row_size {
            return invalid(format!(
                "field `{}` has rows of {} values, but its variables cover {offset}",
                field.name, field.row_size
            ));
        }
        if field.data.len() != field.row_size * field.num_nodes {
            return invalid(format!(
                "field `{}` holds {} values, expected {} rows of {}",
                field.name,
                field.data.len(),
                field.num_nodes,
                field.row_size
            ));
        }
        Ok(Self {
            name: field.name,
            variables: field.variables,
            row_size: field.row_size,
            num_nodes: field.num_nodes,
            data: field.data,
        })
    }
}

impl<T: Clone + num::Zero> Field<T> {
    /// Creates a zero-initialized field with the given `(name, dimension)` variables.
    ///
    /// Variables are laid out in the given order.
    pub fn new<'a>(
        name: impl Into<String>,
        num_nodes: usize,
        variables: impl IntoIterator<Item = (&'a str, usize)>,
    ) -> Self {
        let mut row_size = 0;
        let variables: Vec<_> = variables
            .into_iter()
            .map(|(name, dim)| {
                let variable = FieldVariable {
                    name: name.to_string(),
                    offset: row_size,
                    dim,
                };
                row_size += dim;
                variable
            })
            .collect();
        Self {
            name: name.into(),
            variables,
            row_size,
            num_nodes,
            data: vec![T::zero(); row_size * num_nodes],
        }
    }
}

impl<T> Field<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[FieldVariable] {
        &self.variables
    }

    /// Looks up a variable by name.
    pub fn variable(&self, name: &str) -> Result<&FieldVariable, Error> {
        self.variables
            .iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| Error::VariableNotFound {
                field: self.name.clone(),
                variable: name.to_string(),
            })
    }

    /// Number of values stored per node.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// All values of a node.
    pub fn node_values(&self, node: usize) -> &[T] {
        &self.data[self.row_size * node..self.row_size * (node + 1)]
    }

    pub fn node_values_mut(&mut self, node: usize) -> &mut [T] {
        &mut self.data[self.row_size * node..self.row_size * (node + 1)]
    }

    /// The values of a single variable at a node.
    pub fn variable_values(&self, node: usize, variable: &FieldVariable) -> &[T] {
        &self.node_values(node)[variable.columns()]
    }

    /// Row-major data, one row per node.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Clone> Field<T> {
    /// Overwrites the values of the named variable at a node.
    pub fn set_variable_values(&mut self, variable: &str, node: usize, values: &[T]) -> Result<(), Error> {
        let columns = {
            let variable = self.variable(variable)?;
            if values.len() != variable.dim {
                return Err(Error::VariableDimensionMismatch {
                    field: self.name.clone(),
                    variable: variable.name.clone(),
                    expected: variable.dim,
                    actual: values.len(),
                });
            }
            variable.columns()
        };
        self.node_values_mut(node)[columns].clone_from_slice(values);
        Ok(())
    }

    /// Sets the named variable at every node from a function of the node index.
    pub fn fill_variable_with<F, V>(&mut self, variable: &str, mut f: F) -> Result<(), Error>
    where
        F: FnMut(usize) -> V,
        V: AsRef<[T]>,
    {
        for node in 0..self.num_nodes {
            self.set_variable_values(variable, node, f(node).as_ref())?;
        }
        Ok(())
    }
}
