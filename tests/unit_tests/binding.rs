use matrixcompare::assert_scalar_eq;
use nalgebra::{Matrix2, Point2, Vector2, Vector4};
use proptest::prelude::*;
use rdfem::binding::{FieldValue, VariableBinding, VariableDescriptor, VariableKind};
use rdfem::element::Quad4d2Element;
use rdfem::geometry::GeometryCache;
use rdfem::Error;
use util::assert_approx_matrix_eq;

use crate::{insert_scalar_field, rectangle_mesh};

type QuadBinding<'a> = VariableBinding<'a, f64, Quad4d2Element<f64>>;

#[test]
fn missing_names_are_reported_at_creation() {
    let mesh = rectangle_mesh();

    let error = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("temperature", "u")).unwrap_err();
    assert_eq!(
        error,
        Error::FieldNotFound {
            field: "temperature".to_string()
        }
    );

    let error = QuadBinding::new(&mesh, &VariableDescriptor::vector_field("solution", "w")).unwrap_err();
    assert_eq!(
        error,
        Error::VariableNotFound {
            field: "solution".to_string(),
            variable: "w".to_string()
        }
    );
}

#[test]
fn variable_dimensions_are_checked() {
    let mesh = rectangle_mesh();

    let error = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("solution", "velocity")).unwrap_err();
    assert_eq!(
        error,
        Error::VariableDimensionMismatch {
            field: "solution".to_string(),
            variable: "velocity".to_string(),
            expected: 1,
            actual: 2
        }
    );

    let error = QuadBinding::new(&mesh, &VariableDescriptor::vector_field("solution", "u")).unwrap_err();
    assert!(matches!(error, Error::VariableDimensionMismatch { expected: 2, actual: 1, .. }));

    let error = QuadBinding::new(&mesh, &VariableDescriptor::constant_vector([1.0, 2.0, 3.0])).unwrap_err();
    assert_eq!(error, Error::ConstantDimensionMismatch { expected: 2, actual: 3 });
}

#[test]
fn scalar_field_interpolates_nodal_values() {
    let mesh = rectangle_mesh();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("solution", "u")).unwrap();
    assert_eq!(binding.kind(), VariableKind::ScalarField);
    binding.set_element(0).unwrap();

    let data = binding.as_scalar_field().unwrap();
    assert!(!data.is_uniform());
    assert_approx_matrix_eq!(*data.value(), Vector4::new(0.0, 2.0, 4.0, 2.0), abstol = 1e-14);

    // Corner (1, 1) in reference coordinates is the vertex (2, 1)
    assert_scalar_eq!(data.eval(&Point2::new(1.0, 1.0)), 4.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(data.eval(&Point2::origin()), 2.0, comp = abs, tol = 1e-14);

    let value = binding.eval(&Point2::new(0.5, -0.5)).unwrap();
    // (0.5, -0.5) maps to (1.5, 0.25)
    assert_scalar_eq!(*value.as_scalar().unwrap(), 2.0, comp = abs, tol = 1e-14);
    assert!(value.as_vector().is_none());
}

#[test]
fn scalar_field_gradient_and_laplacian() {
    let mesh = rectangle_mesh();
    let mut geometry = GeometryCache::<f64, Quad4d2Element<f64>>::new(&mesh).unwrap();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("solution", "u")).unwrap();
    geometry.set_element(0).unwrap();
    binding.set_element(0).unwrap();

    let data = binding.as_scalar_field().unwrap();
    let xi = Point2::new(-0.3, 0.8);
    assert_approx_matrix_eq!(data.gradient(&geometry, &xi).unwrap(), Vector2::new(1.0, 2.0), abstol = 1e-13);

    let laplacian = data.laplacian(&geometry, &xi).unwrap();
    assert_approx_matrix_eq!(laplacian, laplacian.transpose(), abstol = 1e-14);
    // Constants are in the kernel
    assert_approx_matrix_eq!(laplacian * Vector4::repeat(1.0), Vector4::zeros(), abstol = 1e-13);
}

#[test]
fn uniform_scalar_is_stored_per_node() {
    let mesh = rectangle_mesh();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::uniform_scalar(3.5)).unwrap();
    binding.set_element(0).unwrap();

    let data = binding.as_scalar_field().unwrap();
    assert!(data.is_uniform());
    assert_approx_matrix_eq!(*data.value(), Vector4::repeat(3.5), abstol = 0.0);
}

proptest! {
    #[test]
    fn constant_scalars_interpolate_to_the_constant(
        xi in (-1.0..=1.0f64, -1.0..=1.0f64).prop_map(|(x, y)| Point2::new(x, y)),
        level in -10.0..10.0f64
    ) {
        let mut mesh = rectangle_mesh();
        insert_scalar_field(&mut mesh, "level", |_| level);

        let mut uniform = QuadBinding::new(&mesh, &VariableDescriptor::uniform_scalar(level)).unwrap();
        let mut nodal = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("level", "u")).unwrap();
        uniform.set_element(0).unwrap();
        nodal.set_element(0).unwrap();

        let nodal = nodal.as_scalar_field().unwrap();
        prop_assert!(!nodal.is_uniform());
        let uniform = uniform.as_scalar_field().unwrap();
        prop_assert!((uniform.eval(&xi) - level).abs() <= 1e-12);
        prop_assert!((nodal.eval(&xi) - level).abs() <= 1e-12);
    }
}

#[test]
fn vector_field_gradient_and_divergence() {
    let mesh = rectangle_mesh();
    let mut geometry = GeometryCache::<f64, Quad4d2Element<f64>>::new(&mesh).unwrap();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::vector_field("solution", "velocity")).unwrap();
    geometry.set_element(0).unwrap();
    binding.set_element(0).unwrap();

    let data = binding.as_vector_field().unwrap();
    let xi = Point2::new(0.4, 0.1);
    // The velocity field is the identity map
    assert_approx_matrix_eq!(data.eval(&xi), geometry.coordinates(&xi).coords, abstol = 1e-14);
    assert_approx_matrix_eq!(data.gradient(&geometry, &xi).unwrap(), Matrix2::identity(), abstol = 1e-13);
    assert_scalar_eq!(data.divergence(&geometry, &xi).unwrap(), 2.0, comp = abs, tol = 1e-13);
}

#[test]
fn constants_do_not_change_between_elements() {
    let mesh = rectangle_mesh();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::constant_vector([1.0, 0.5])).unwrap();
    binding.set_element(0).unwrap();

    let expected = FieldValue::Vector(Vector2::new(1.0, 0.5));
    assert_eq!(binding.as_constant().unwrap().value(), &expected);
    assert_eq!(binding.eval(&Point2::new(0.3, 0.3)).unwrap(), expected);

    let scalar = QuadBinding::new(&mesh, &VariableDescriptor::constant_scalar(2.0)).unwrap();
    assert_eq!(scalar.eval(&Point2::origin()).unwrap(), FieldValue::Scalar(2.0));
}

#[test]
fn accumulators_are_reset_on_set_element() {
    let mesh = rectangle_mesh();
    let mut vector = QuadBinding::new(&mesh, &VariableDescriptor::ElementVector).unwrap();
    let mut matrix = QuadBinding::new(&mesh, &VariableDescriptor::ElementMatrix).unwrap();

    vector.element_vector_mut().unwrap().fill(1.0);
    matrix.element_matrix_mut().unwrap()[(1, 2)] = 5.0;
    vector.set_element(0).unwrap();
    matrix.set_element(0).unwrap();

    assert_eq!(vector.element_vector().unwrap().amax(), 0.0);
    assert_eq!(matrix.element_matrix().unwrap().amax(), 0.0);
}

#[test]
fn accumulators_cannot_be_evaluated() {
    let mesh = rectangle_mesh();
    let binding = QuadBinding::new(&mesh, &VariableDescriptor::ElementMatrix).unwrap();
    assert_eq!(
        binding.eval(&Point2::origin()).unwrap_err(),
        Error::InvalidOperation {
            operation: "eval",
            kind: VariableKind::ElementMatrix
        }
    );
}

#[test]
fn slot_kind_is_checked_by_accessors() {
    let mesh = rectangle_mesh();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::ElementVector).unwrap();
    assert_eq!(
        binding.as_scalar_field().unwrap_err(),
        Error::SlotKindMismatch {
            expected: VariableKind::ScalarField,
            actual: VariableKind::ElementVector
        }
    );
    assert!(binding.element_matrix_mut().is_err());
    assert!(binding.element_vector_mut().is_ok());
}

#[test]
fn field_binding_rejects_invalid_element_index() {
    let mesh = rectangle_mesh();
    let mut binding = QuadBinding::new(&mesh, &VariableDescriptor::scalar_field("solution", "u")).unwrap();
    assert_eq!(
        binding.set_element(1).unwrap_err(),
        Error::ElementIndexOutOfBounds {
            element_index: 1,
            num_elements: 1
        }
    );
}
