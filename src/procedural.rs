//! Basic procedural mesh generation routines.
use nalgebra::{Point2, Point3, Vector2};

use crate::connectivity::ConnectivityTable;
use crate::element::ElementShape;
use crate::mesh::{Mesh, Region};
use crate::Real;

fn cell_size<T: Real>(unit_length: T, cells_per_unit: usize) -> T {
    unit_length / T::from_usize(cells_per_unit).expect("Must be able to fit usize in T")
}

fn usize_as_t<T: Real>(i: usize) -> T {
    T::from_usize(i).expect("Must be able to fit usize in T")
}

pub fn create_unit_square_uniform_quad_mesh_2d<T: Real>(cells_per_dim: usize) -> Mesh<T> {
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::new(T::zero(), T::one()))
}

pub fn create_unit_square_uniform_tri_mesh_2d<T: Real>(cells_per_dim: usize) -> Mesh<T> {
    let quad_mesh = create_unit_square_uniform_quad_mesh_2d::<T>(cells_per_dim);
    let triangles = quad_mesh
        .connectivity()
        .iter()
        .flat_map(|(_, quad)| [[quad[0], quad[1], quad[2]], [quad[0], quad[2], quad[3]]]);
    let connectivity = ConnectivityTable::from_uniform(ElementShape::Tri3d2, triangles);
    Mesh::from_coordinates_and_connectivity(2, quad_mesh.coordinates().to_vec(), connectivity)
}

pub fn create_unit_box_uniform_hex_mesh_3d<T: Real>(cells_per_dim: usize) -> Mesh<T> {
    create_rectangular_uniform_hex_mesh(T::one(), 1, 1, 1, cells_per_dim)
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// Vertices are numbered row by row, starting at the top left corner.
pub fn create_rectangular_uniform_quad_mesh_2d<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> Mesh<T> {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return Mesh::from_coordinates_and_connectivity(2, Vec::new(), ConnectivityTable::new());
    }

    let cell_size = cell_size(unit_length, cells_per_unit);
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

    let mut vertices = Vec::new();
    for j in 0..=num_cells_y {
        for i in 0..=num_cells_x {
            let v = top_left + Vector2::new(usize_as_t::<T>(i), -usize_as_t::<T>(j)) * cell_size;
            vertices.push(Point2::from(v));
        }
    }

    let mut connectivity = ConnectivityTable::new();
    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            connectivity.push(
                ElementShape::Quad4d2,
                &[
                    to_global_vertex_index(i, j + 1),
                    to_global_vertex_index(i + 1, j + 1),
                    to_global_vertex_index(i + 1, j),
                    to_global_vertex_index(i, j),
                ],
            );
        }
    }

    Mesh::from_vertices_and_connectivity(&vertices, connectivity)
}

/// Generates a uniform quad mesh of the unit square together with boundary segments.
///
/// The segments traverse the boundary counterclockwise, so that their normals point out of
/// the square. The mesh has the regions `interior` (the quads), `boundary` (the segments)
/// and `all`.
pub fn create_unit_square_quad_mesh_with_boundary_2d<T: Real>(cells_per_dim: usize) -> Mesh<T> {
    let quad_mesh = create_unit_square_uniform_quad_mesh_2d::<T>(cells_per_dim);
    let mut connectivity = quad_mesh.connectivity().clone();
    let num_quads = connectivity.len();

    let n = cells_per_dim;
    let index = |i: usize, j: usize| (n + 1) * j + i;
    // Row j = n is the bottom edge, row j = 0 the top edge
    let mut boundary_loop = Vec::new();
    boundary_loop.extend((0..n).map(|i| [index(i, n), index(i + 1, n)]));
    boundary_loop.extend((0..n).rev().map(|j| [index(n, j + 1), index(n, j)]));
    boundary_loop.extend((0..n).rev().map(|i| [index(i + 1, 0), index(i, 0)]));
    boundary_loop.extend((0..n).map(|j| [index(0, j), index(0, j + 1)]));
    for segment in &boundary_loop {
        connectivity.push(ElementShape::Segment2d2, segment);
    }

    let mut mesh = Mesh::from_coordinates_and_connectivity(2, quad_mesh.coordinates().to_vec(), connectivity);
    let regions = [
        Region::new("interior", (0..num_quads).collect()),
        Region::new("boundary", (num_quads..mesh.num_elements()).collect()),
        mesh.all_elements(),
    ];
    for region in regions {
        mesh.insert_region(region)
            .expect("Procedurally generated regions are always valid");
    }
    mesh
}

pub fn create_rectangular_uniform_hex_mesh<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    units_z: usize,
    cells_per_unit: usize,
) -> Mesh<T> {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 || units_z == 0 {
        return Mesh::from_coordinates_and_connectivity(3, Vec::new(), ConnectivityTable::new());
    }

    let cell_size = cell_size(unit_length, cells_per_unit);
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;
    let num_cells_z = units_z * cells_per_unit;
    let num_vertices_x = num_cells_x + 1;
    let num_vertices_y = num_cells_y + 1;
    let idx = |i: usize, j: usize, k: usize| (num_vertices_x * num_vertices_y) * k + num_vertices_x * j + i;

    let mut vertices = Vec::new();
    for k in 0..=num_cells_z {
        for j in 0..=num_cells_y {
            for i in 0..=num_cells_x {
                vertices.push(Point3::new(usize_as_t(i), usize_as_t(j), usize_as_t(k)) * cell_size);
            }
        }
    }

    let mut connectivity = ConnectivityTable::new();
    for k in 0..num_cells_z {
        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                connectivity.push(
                    ElementShape::Hex8,
                    &[
                        idx(i, j, k),
                        idx(i + 1, j, k),
                        idx(i + 1, j + 1, k),
                        idx(i, j + 1, k),
                        idx(i, j, k + 1),
                        idx(i + 1, j, k + 1),
                        idx(i + 1, j + 1, k + 1),
                        idx(i, j + 1, k + 1),
                    ],
                );
            }
        }
    }

    Mesh::from_vertices_and_connectivity(&vertices, connectivity)
}
