//! Element-to-vertex connectivity for meshes with mixed element shapes.
use serde::{Deserialize, Serialize};

use crate::element::ElementShape;
use crate::Error;

/// Connectivity of a mesh whose elements may have different shapes.
///
/// Node indices are stored contiguously, with an offset table marking where each element's
/// nodes begin. Each element also carries its [`ElementShape`] tag, and the number of nodes
/// of an element always equals the node count of its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConnectivityTableData")]
pub struct ConnectivityTable {
    shapes: Vec<ElementShape>,
    // Always has one more entry than there are elements
    offsets: Vec<usize>,
    node_indices: Vec<usize>,
}

/// Serialized form of a [`ConnectivityTable`], checked before it is accepted.
#[derive(Deserialize)]
struct ConnectivityTableData {
    shapes: Vec<ElementShape>,
    offsets: Vec<usize>,
    node_indices: Vec<usize>,
}

impl TryFrom<ConnectivityTableData> for ConnectivityTable {
    type Error = Error;

    fn try_from(data: ConnectivityTableData) -> Result<Self, Error> {
        let invalid = |reason: String| Err(Error::InvalidMeshData { reason });
        if data.offsets.len() != data.shapes.len() + 1 || data.offsets[0] != 0 {
            return invalid(format!(
                "connectivity has {} offsets for {} elements",
                data.offsets.len(),
                data.shapes.len()
            ));
        }
        for (element_index, (shape, range)) in data.shapes.iter().zip(data.offsets.windows(2)).enumerate() {
            if range[1] < range[0] || range[1] - range[0] != shape.num_nodes() {
                return invalid(format!(
                    "element {element_index} is a {shape} element, but its offsets span {}..{}",
                    range[0], range[1]
                ));
            }
        }
        if data.offsets.last() != Some(&data.node_indices.len()) {
            return invalid(format!(
                "connectivity offsets end before the {} node indices do",
                data.node_indices.len()
            ));
        }
        Ok(Self {
            shapes: data.shapes,
            offsets: data.offsets,
            node_indices: data.node_indices,
        })
    }
}

impl Default for ConnectivityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityTable {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            offsets: vec![0],
            node_indices: Vec::new(),
        }
    }

    /// Builds a table in which every element has the same shape.
    ///
    /// # Panics
    ///
    /// Panics if any row does not have exactly `shape.num_nodes()` entries.
    pub fn from_uniform<I, R>(shape: ElementShape, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[usize]>,
    {
        let mut table = Self::new();
        for row in rows {
            table.push(shape, row.as_ref());
        }
        table
    }

    /// Appends an element and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if `nodes` does not have exactly `shape.num_nodes()` entries.
    pub fn push(&mut self, shape: ElementShape, nodes: &[usize]) -> usize {
        assert_eq!(
            nodes.len(),
            shape.num_nodes(),
            "{shape} elements have {} nodes, got {}",
            shape.num_nodes(),
            nodes.len()
        );
        self.node_indices.extend_from_slice(nodes);
        self.offsets.push(self.node_indices.len());
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn shape(&self, element_index: usize) -> ElementShape {
        self.shapes[element_index]
    }

    pub fn shapes(&self) -> &[ElementShape] {
        &self.shapes
    }

    /// Global vertex indices of the element, in the element's local node order.
    pub fn element_nodes(&self, element_index: usize) -> &[usize] {
        let begin = self.offsets[element_index];
        let end = self.offsets[element_index + 1];
        &self.node_indices[begin..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementShape, &[usize])> {
        self.shapes
            .iter()
            .zip(self.offsets.windows(2))
            .map(move |(&shape, range)| (shape, &self.node_indices[range[0]..range[1]]))
    }

    /// The largest vertex index referenced by any element.
    pub fn max_node_index(&self) -> Option<usize> {
        self.node_indices.iter().copied().max()
    }
}
