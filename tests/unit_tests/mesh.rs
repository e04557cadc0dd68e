use matrixcompare::assert_scalar_eq;
use nalgebra::Point2;
use rdfem::connectivity::ConnectivityTable;
use rdfem::element::ElementShape;
use rdfem::field::Field;
use rdfem::mesh::{Mesh, Region};
use rdfem::procedural::{
    create_rectangular_uniform_hex_mesh, create_unit_square_quad_mesh_with_boundary_2d,
    create_unit_square_uniform_quad_mesh_2d, create_unit_square_uniform_tri_mesh_2d,
};
use rdfem::Error;

use crate::rectangle_mesh;

#[test]
fn mixed_connectivity_table() {
    let mut table = ConnectivityTable::new();
    assert!(table.is_empty());
    assert_eq!(table.push(ElementShape::Tri3d2, &[0, 1, 2]), 0);
    assert_eq!(table.push(ElementShape::Quad4d2, &[1, 3, 4, 2]), 1);
    assert_eq!(table.push(ElementShape::Segment2d2, &[4, 2]), 2);

    assert_eq!(table.len(), 3);
    assert_eq!(table.shape(1), ElementShape::Quad4d2);
    assert_eq!(table.element_nodes(1), &[1, 3, 4, 2]);
    assert_eq!(table.element_nodes(2), &[4, 2]);
    assert_eq!(table.max_node_index(), Some(4));
    let shapes: Vec<_> = table.iter().map(|(shape, _)| shape).collect();
    assert_eq!(shapes, vec![ElementShape::Tri3d2, ElementShape::Quad4d2, ElementShape::Segment2d2]);
}

#[test]
#[should_panic]
fn connectivity_rejects_wrong_node_count() {
    let mut table = ConnectivityTable::new();
    table.push(ElementShape::Quad4d2, &[0, 1, 2]);
}

#[test]
#[should_panic]
fn mesh_rejects_connectivity_beyond_vertices() {
    let connectivity = ConnectivityTable::from_uniform(ElementShape::Tri3d2, [[0, 1, 5]]);
    let vertices = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    Mesh::from_vertices_and_connectivity(&vertices, connectivity);
}

#[test]
fn fields_are_looked_up_by_name() {
    let mut mesh = rectangle_mesh();
    assert_eq!(mesh.fields().len(), 1);
    let field = mesh.field("solution").unwrap();
    assert_eq!(field.row_size(), 3);
    assert_eq!(field.node_values(2), &[4.0, 2.0, 1.0]);
    let velocity = field.variable("velocity").unwrap();
    assert_eq!(velocity.columns(), 1..3);
    assert_eq!(field.variable_values(3, velocity), &[0.0, 1.0]);

    assert_eq!(
        mesh.field("pressure").unwrap_err(),
        Error::FieldNotFound {
            field: "pressure".to_string()
        }
    );

    let replaced = mesh.insert_field(Field::new("solution", 4, [("u", 1)]));
    assert!(replaced.is_some());
    assert_eq!(mesh.field("solution").unwrap().row_size(), 1);
}

#[test]
fn field_values_are_checked_against_variable_dimension() {
    let mut field = Field::<f64>::new("state", 2, [("u", 1), ("v", 2)]);
    field.set_variable_values("v", 1, &[1.0, 2.0]).unwrap();
    assert_eq!(field.data(), &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
    assert_eq!(
        field.set_variable_values("v", 0, &[1.0]).unwrap_err(),
        Error::VariableDimensionMismatch {
            field: "state".to_string(),
            variable: "v".to_string(),
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn regions_are_validated_and_replaced_by_name() {
    let mut mesh = rectangle_mesh();
    assert_eq!(mesh.region("all").unwrap().elements(), &[0]);
    assert_eq!(
        mesh.insert_region(Region::new("outlet", vec![0, 1])).unwrap_err(),
        Error::ElementIndexOutOfBounds {
            element_index: 1,
            num_elements: 1
        }
    );
    assert!(mesh.region("outlet").is_err());

    let mut mesh_with_boundary = create_unit_square_quad_mesh_with_boundary_2d::<f64>(2);
    assert_eq!(
        mesh_with_boundary
            .insert_region(Region::new("inlet", vec![4, 5, 4]))
            .unwrap_err(),
        Error::DuplicateRegionElement {
            region: "inlet".to_string(),
            element_index: 4
        }
    );
    assert!(mesh_with_boundary.region("inlet").is_err());

    let previous = mesh.insert_region(Region::new("all", Vec::new())).unwrap();
    assert_eq!(previous.map(|region| region.len()), Some(1));
    assert!(mesh.region("all").unwrap().is_empty());
}

#[test]
fn elements_can_be_selected_by_shape() {
    let mesh = create_unit_square_quad_mesh_with_boundary_2d::<f64>(2);
    let quads = mesh.elements_with_shape(ElementShape::Quad4d2);
    assert_eq!(quads.elements(), &[0, 1, 2, 3]);
    assert_eq!(quads.name(), ElementShape::Quad4d2.name());
    assert_eq!(mesh.elements_with_shape(ElementShape::Segment2d2).len(), 8);
    assert!(mesh.elements_with_shape(ElementShape::Tet4).is_empty());
}

#[test]
fn procedural_meshes_have_expected_sizes() {
    let quads = create_unit_square_uniform_quad_mesh_2d::<f64>(3);
    assert_eq!(quads.num_vertices(), 16);
    assert_eq!(quads.num_elements(), 9);

    let triangles = create_unit_square_uniform_tri_mesh_2d::<f64>(3);
    assert_eq!(triangles.num_vertices(), 16);
    assert_eq!(triangles.num_elements(), 18);
    assert!(triangles.connectivity().shapes().iter().all(|&s| s == ElementShape::Tri3d2));

    let hexes = create_rectangular_uniform_hex_mesh::<f64>(0.5, 2, 1, 1, 2);
    assert_eq!(hexes.dim(), 3);
    assert_eq!(hexes.num_vertices(), 5 * 3 * 3);
    assert_eq!(hexes.num_elements(), 16);
    assert_scalar_eq!(hexes.vertex_coordinates(hexes.num_vertices() - 1)[0], 1.0, comp = abs, tol = 1e-14);

    let with_boundary = create_unit_square_quad_mesh_with_boundary_2d::<f64>(3);
    assert_eq!(with_boundary.region("interior").unwrap().len(), 9);
    assert_eq!(with_boundary.region("boundary").unwrap().len(), 12);
    assert_eq!(with_boundary.region("all").unwrap().len(), 21);
}

#[test]
fn boundary_segments_are_counterclockwise() {
    let mesh = create_unit_square_quad_mesh_with_boundary_2d::<f64>(2);
    let boundary = mesh.region("boundary").unwrap();
    // Consecutive segments share a vertex, and the loop is closed
    let segments: Vec<_> = boundary.elements().iter().map(|&i| mesh.element_nodes(i)).collect();
    for (current, next) in segments.iter().zip(segments.iter().cycle().skip(1)) {
        assert_eq!(current[1], next[0]);
    }
    // The first segment starts at the origin and runs along the x axis
    let first = segments[0];
    assert_eq!(mesh.vertex_coordinates(first[0]), &[0.0, 0.0]);
    assert_eq!(mesh.vertex_coordinates(first[1]), &[0.5, 0.0]);
}

#[test]
fn serialized_mesh_is_restored() {
    let mesh = rectangle_mesh();
    let value = serde_json::to_value(&mesh).unwrap();
    let restored: Mesh<f64> = serde_json::from_value(value).unwrap();
    assert_eq!(restored, mesh);
}

#[test]
fn deserialized_mesh_is_validated() {
    let value = serde_json::to_value(rectangle_mesh()).unwrap();
    let is_invalid_mesh_data = |value: serde_json::Value| {
        let err = serde_json::from_value::<Mesh<f64>>(value).unwrap_err();
        err.to_string().contains("invalid mesh data")
    };

    let mut out_of_range = value.clone();
    out_of_range["connectivity"]["node_indices"][2] = serde_json::json!(99);
    assert!(is_invalid_mesh_data(out_of_range));

    let mut no_dimension = value.clone();
    no_dimension["dim"] = serde_json::json!(0);
    assert!(is_invalid_mesh_data(no_dimension));

    let mut odd_coordinates = value.clone();
    odd_coordinates["dim"] = serde_json::json!(3);
    assert!(is_invalid_mesh_data(odd_coordinates));

    let mut short_field = value.clone();
    short_field["fields"][0]["data"]
        .as_array_mut()
        .unwrap()
        .truncate(9);
    assert!(is_invalid_mesh_data(short_field));

    let mut missing_rows = value.clone();
    missing_rows["fields"][0]["num_nodes"] = serde_json::json!(3);
    missing_rows["fields"][0]["data"]
        .as_array_mut()
        .unwrap()
        .truncate(9);
    assert!(is_invalid_mesh_data(missing_rows));

    let mut bad_offsets = value.clone();
    bad_offsets["connectivity"]["offsets"] = serde_json::json!([0, 3]);
    assert!(is_invalid_mesh_data(bad_offsets));

    let mut repeated_region_element = value.clone();
    repeated_region_element["regions"][0]["elements"] = serde_json::json!([0, 0]);
    let err = serde_json::from_value::<Mesh<f64>>(repeated_region_element).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}
