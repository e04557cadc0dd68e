//! Meshes with mixed element shapes, nodal fields and named regions.
use itertools::Itertools;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar};
use serde::{Deserialize, Serialize};

use crate::connectivity::ConnectivityTable;
use crate::element::ElementShape;
use crate::field::Field;
use crate::Error;

/// A named subset of a mesh's elements.
///
/// The element order of a region is the order in which the dispatcher visits its elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    name: String,
    elements: Vec<usize>,
}

impl Region {
    pub fn new(name: impl Into<String>, elements: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A mesh whose vertex coordinates have a runtime dimension.
///
/// Coordinates are stored as a row-major table with one row of `dim` entries per vertex.
/// The element shapes determine which dimension the mesh must have for an element type to
/// be bound, which is checked when a geometry cache is created.
///
/// Deserialized meshes are subject to the same checks as meshes built with the
/// constructors, and invalid data is rejected with [`Error::InvalidMeshData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshData<T>")]
pub struct Mesh<T> {
    dim: usize,
    coordinates: Vec<T>,
    connectivity: ConnectivityTable,
    fields: Vec<Field<T>>,
    regions: Vec<Region>,
}

/// Serialized form of a [`Mesh`], checked before it is accepted.
#[derive(Deserialize)]
struct MeshData<T> {
    dim: usize,
    coordinates: Vec<T>,
    connectivity: ConnectivityTable,
    fields: Vec<Field<T>>,
    regions: Vec<Region>,
}

impl<T> TryFrom<MeshData<T>> for Mesh<T> {
    type Error = Error;

    fn try_from(data: MeshData<T>) -> Result<Self, Error> {
        let invalid = |reason: String| Err(Error::InvalidMeshData { reason });
        if data.dim == 0 {
            return invalid("mesh dimension must be positive".to_string());
        }
        if data.coordinates.len() % data.dim != 0 {
            return invalid(format!(
                "{} coordinates do not form rows of {} entries",
                data.coordinates.len(),
                data.dim
            ));
        }
        let num_vertices = data.coordinates.len() / data.dim;
        if let Some(max_index) = data.connectivity.max_node_index() {
            if max_index >= num_vertices {
                return invalid(format!(
                    "connectivity references vertex {max_index}, but the mesh has {num_vertices} vertices"
                ));
            }
        }
        for (i, field) in data.fields.iter().enumerate() {
            if field.num_nodes() != num_vertices {
                return invalid(format!(
                    "field `{}` has {} rows, but the mesh has {num_vertices} vertices",
                    field.name(),
                    field.num_nodes()
                ));
            }
            if data.fields[..i].iter().any(|f| f.name() == field.name()) {
                return invalid(format!("field `{}` is defined more than once", field.name()));
            }
        }
        for (i, region) in data.regions.iter().enumerate() {
            if data.regions[..i].iter().any(|r| r.name() == region.name()) {
                return invalid(format!("region `{}` is defined more than once", region.name()));
            }
        }

        let mesh = Self {
            dim: data.dim,
            coordinates: data.coordinates,
            connectivity: data.connectivity,
            fields: data.fields,
            regions: data.regions,
        };
        for region in &mesh.regions {
            mesh.check_region(region)?;
        }
        Ok(mesh)
    }
}

impl<T: Scalar> Mesh<T> {
    /// Creates a mesh from a row-major coordinate table and a connectivity table.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero, if the coordinate table is not a whole number of rows, or if
    /// the connectivity references a vertex that does not exist.
    pub fn from_coordinates_and_connectivity(dim: usize, coordinates: Vec<T>, connectivity: ConnectivityTable) -> Self {
        assert!(dim > 0, "mesh dimension must be positive");
        assert_eq!(
            coordinates.len() % dim,
            0,
            "coordinate table length must be a multiple of the dimension"
        );
        let num_vertices = coordinates.len() / dim;
        if let Some(max_index) = connectivity.max_node_index() {
            assert!(
                max_index < num_vertices,
                "connectivity references vertex {max_index}, but the mesh has {num_vertices} vertices"
            );
        }
        Self {
            dim,
            coordinates,
            connectivity,
            fields: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// Creates a mesh from statically sized vertices.
    pub fn from_vertices_and_connectivity<D>(vertices: &[OPoint<T, D>], connectivity: ConnectivityTable) -> Self
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let coordinates = vertices
            .iter()
            .flat_map(|v| v.coords.iter().cloned())
            .collect();
        Self::from_coordinates_and_connectivity(D::dim(), coordinates, connectivity)
    }
}

impl<T> Mesh<T> {
    /// Dimension of the vertex coordinates.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_vertices(&self) -> usize {
        self.coordinates.len() / self.dim
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn coordinates(&self) -> &[T] {
        &self.coordinates
    }

    pub fn vertex_coordinates(&self, vertex_index: usize) -> &[T] {
        &self.coordinates[self.dim * vertex_index..self.dim * (vertex_index + 1)]
    }

    pub fn connectivity(&self) -> &ConnectivityTable {
        &self.connectivity
    }

    pub fn element_shape(&self, element_index: usize) -> ElementShape {
        self.connectivity.shape(element_index)
    }

    pub fn element_nodes(&self, element_index: usize) -> &[usize] {
        self.connectivity.element_nodes(element_index)
    }

    /// Checks that an element index is valid for this mesh.
    pub fn check_element_index(&self, element_index: usize) -> Result<(), Error> {
        if element_index < self.num_elements() {
            Ok(())
        } else {
            Err(Error::ElementIndexOutOfBounds {
                element_index,
                num_elements: self.num_elements(),
            })
        }
    }

    /// Registers a field, replacing and returning any field with the same name.
    ///
    /// # Panics
    ///
    /// Panics if the field does not have one row per mesh vertex.
    pub fn insert_field(&mut self, field: Field<T>) -> Option<Field<T>> {
        assert_eq!(
            field.num_nodes(),
            self.num_vertices(),
            "field `{}` must have one row per mesh vertex",
            field.name()
        );
        match self.fields.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => Some(std::mem::replace(existing, field)),
            None => {
                self.fields.push(field);
                None
            }
        }
    }

    pub fn field(&self, name: &str) -> Result<&Field<T>, Error> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::FieldNotFound { field: name.to_string() })
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field<T>, Error> {
        self.fields
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::FieldNotFound { field: name.to_string() })
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Checks that every element of the region exists and appears only once.
    pub fn check_region(&self, region: &Region) -> Result<(), Error> {
        for &element_index in region.elements() {
            self.check_element_index(element_index)?;
        }
        match region.elements().iter().duplicates().next() {
            Some(&element_index) => Err(Error::DuplicateRegionElement {
                region: region.name().to_string(),
                element_index,
            }),
            None => Ok(()),
        }
    }

    /// Registers a region, replacing and returning any region with the same name.
    pub fn insert_region(&mut self, region: Region) -> Result<Option<Region>, Error> {
        self.check_region(&region)?;
        match self.regions.iter_mut().find(|r| r.name() == region.name()) {
            Some(existing) => Ok(Some(std::mem::replace(existing, region))),
            None => {
                self.regions.push(region);
                Ok(None)
            }
        }
    }

    pub fn region(&self, name: &str) -> Result<&Region, Error> {
        self.regions
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| Error::RegionNotFound { region: name.to_string() })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// A region containing every element of the mesh, in index order.
    pub fn all_elements(&self) -> Region {
        Region::new("all", (0..self.num_elements()).collect())
    }

    /// The elements of the given shape, in index order.
    pub fn elements_with_shape(&self, shape: ElementShape) -> Region {
        let elements = self
            .connectivity
            .shapes()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == shape)
            .map(|(i, _)| i)
            .collect();
        Region::new(shape.name(), elements)
    }
}
