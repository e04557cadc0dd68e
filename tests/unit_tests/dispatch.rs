use eyre::eyre;
use matrixcompare::assert_scalar_eq;
use nalgebra::DefaultAllocator;
use rdfem::allocators::ElementAllocator;
use rdfem::binding::VariableDescriptor;
use rdfem::connectivity::ConnectivityTable;
use rdfem::context::ElementContext;
use rdfem::dispatch::{
    for_each_element, for_each_element_in_region, par_for_each_element_in_region, DegenerateElementPolicy,
    DispatchSettings, ElementAlgorithm, ParallelElementAlgorithm,
};
use rdfem::element::{ElementShape, FiniteElement};
use rdfem::mesh::{Mesh, Region};
use rdfem::procedural::{create_unit_box_uniform_hex_mesh_3d, create_unit_square_quad_mesh_with_boundary_2d};
use rdfem::Error;

use crate::{insert_scalar_field, mesh_with_degenerate_quad};

/// Records the elements it visits and integrates a scalar over them.
struct RecordingAlgorithm {
    descriptor: VariableDescriptor<f64>,
    visited: Vec<(ElementShape, usize)>,
    integral: f64,
}

impl RecordingAlgorithm {
    fn integrating(descriptor: VariableDescriptor<f64>) -> Self {
        Self {
            descriptor,
            visited: Vec::new(),
            integral: 0.0,
        }
    }

    fn new() -> Self {
        Self::integrating(VariableDescriptor::uniform_scalar(1.0))
    }
}

impl ElementAlgorithm<f64, 1> for RecordingAlgorithm {
    fn variables(&self) -> [VariableDescriptor<f64>; 1] {
        [self.descriptor.clone()]
    }

    fn execute<E>(&mut self, context: &mut ElementContext<'_, f64, E, 1>) -> eyre::Result<()>
    where
        E: FiniteElement<f64>,
        DefaultAllocator: ElementAllocator<f64, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        let field = context.variable(0).as_scalar_field()?;
        let (weights, points) = context.quadrature();
        let mut integral = 0.0;
        for (&w, xi) in weights.iter().zip(points) {
            integral += w * context.geometry().jacobian_determinant(xi)? * field.eval(xi);
        }
        self.integral += integral;
        let element_index = context.element_index().ok_or_else(|| eyre!("no element set"))?;
        self.visited.push((E::SHAPE, element_index));
        Ok(())
    }
}

fn boundary_mesh() -> Mesh<f64> {
    create_unit_square_quad_mesh_with_boundary_2d(2)
}

#[test]
fn every_matching_element_is_visited_once_grouped_by_shape() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::new();
    let candidates = [ElementShape::Segment2d2, ElementShape::Quad4d2];
    let summary = for_each_element(&mesh, "all", &candidates, &mut algorithm, &DispatchSettings::default()).unwrap();

    let expected: Vec<_> = (4..12)
        .map(|i| (ElementShape::Segment2d2, i))
        .chain((0..4).map(|i| (ElementShape::Quad4d2, i)))
        .collect();
    assert_eq!(algorithm.visited, expected);
    assert_eq!(summary.visited(), 12);
    assert_eq!(summary.unmatched, 0);
    assert_eq!(summary.passes.len(), 2);
    assert_eq!(summary.passes[0].shape, ElementShape::Segment2d2);
    assert_eq!(summary.passes[0].visited, 8);
    assert_eq!(summary.passes[1].visited, 4);
    // Boundary length plus the area of the unit square
    assert_scalar_eq!(algorithm.integral, 5.0, comp = abs, tol = 1e-12);
}

#[test]
fn region_order_is_kept_within_a_shape() {
    let mesh = boundary_mesh();
    let region = Region::new("shuffled", vec![3, 9, 0, 5, 2]);
    let mut algorithm = RecordingAlgorithm::new();
    let candidates = [ElementShape::Quad4d2, ElementShape::Segment2d2];
    for_each_element_in_region(&mesh, &region, &candidates, &mut algorithm, &DispatchSettings::default()).unwrap();

    let indices: Vec<_> = algorithm.visited.iter().map(|&(_, i)| i).collect();
    assert_eq!(indices, vec![3, 0, 2, 9, 5]);
}

#[test]
fn elements_of_other_shapes_are_skipped() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::new();
    let summary =
        for_each_element(&mesh, "all", &[ElementShape::Quad4d2], &mut algorithm, &DispatchSettings::default()).unwrap();

    assert!(algorithm.visited.iter().all(|&(shape, _)| shape == ElementShape::Quad4d2));
    assert_eq!(summary.visited(), 4);
    assert_eq!(summary.unmatched, 8);
    assert_scalar_eq!(algorithm.integral, 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn empty_candidate_list_visits_nothing() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::new();
    let summary = for_each_element(&mesh, "all", &[], &mut algorithm, &DispatchSettings::default()).unwrap();
    assert!(algorithm.visited.is_empty());
    assert!(summary.passes.is_empty());
    assert_eq!(summary.unmatched, 12);
}

#[test]
fn empty_region_visits_nothing() {
    let mesh = boundary_mesh();
    let region = Region::new("empty", Vec::new());
    let mut algorithm = RecordingAlgorithm::new();
    let summary = for_each_element_in_region(
        &mesh,
        &region,
        &ElementShape::ALL,
        &mut algorithm,
        &DispatchSettings::default(),
    )
    .unwrap();
    assert!(algorithm.visited.is_empty());
    assert_eq!(summary.visited(), 0);
    assert_eq!(summary.passes.len(), ElementShape::ALL.len());
}

#[test]
fn duplicate_candidates_are_processed_once() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::new();
    let candidates = [ElementShape::Quad4d2, ElementShape::Quad4d2];
    let summary = for_each_element(&mesh, "interior", &candidates, &mut algorithm, &DispatchSettings::default()).unwrap();
    assert_eq!(algorithm.visited.len(), 4);
    assert_eq!(summary.passes.len(), 1);
}

#[test]
fn unknown_region_is_an_error() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::new();
    let report = for_each_element(&mesh, "inlet", &ElementShape::ALL, &mut algorithm, &DispatchSettings::default())
        .unwrap_err();
    assert_eq!(
        report.downcast_ref::<Error>(),
        Some(&Error::RegionNotFound {
            region: "inlet".to_string()
        })
    );
}

#[test]
fn region_with_invalid_element_is_an_error() {
    let mesh = boundary_mesh();
    let region = Region::new("broken", vec![0, 42]);
    let mut algorithm = RecordingAlgorithm::new();
    let report = for_each_element_in_region(&mesh, &region, &ElementShape::ALL, &mut algorithm, &DispatchSettings::default())
        .unwrap_err();
    assert!(matches!(
        report.downcast_ref::<Error>(),
        Some(Error::ElementIndexOutOfBounds { element_index: 42, .. })
    ));
    assert!(algorithm.visited.is_empty());
}

#[test]
fn region_listing_an_element_twice_is_an_error() {
    let mesh = boundary_mesh();
    let region = Region::new("dup", vec![0, 0]);
    let mut algorithm = RecordingAlgorithm::new();
    let report = for_each_element_in_region(&mesh, &region, &ElementShape::ALL, &mut algorithm, &DispatchSettings::default())
        .unwrap_err();
    assert_eq!(
        report.downcast_ref::<Error>(),
        Some(&Error::DuplicateRegionElement {
            region: "dup".to_string(),
            element_index: 0
        })
    );
    assert!(algorithm.visited.is_empty());

    let report = par_for_each_element_in_region(
        &mesh,
        &region,
        &[ElementShape::Quad4d2],
        &CollectingAlgorithm,
        &DispatchSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(
        report.downcast_ref::<Error>(),
        Some(Error::DuplicateRegionElement { element_index: 0, .. })
    ));
}

#[test]
fn unknown_field_fails_before_any_element_is_visited() {
    let mesh = boundary_mesh();
    let mut algorithm = RecordingAlgorithm::integrating(VariableDescriptor::scalar_field("pressure", "p"));
    let report = for_each_element(&mesh, "all", &ElementShape::ALL, &mut algorithm, &DispatchSettings::default())
        .unwrap_err();
    assert!(matches!(report.downcast_ref::<Error>(), Some(Error::FieldNotFound { .. })));
    assert!(algorithm.visited.is_empty());
}

#[test]
fn field_variables_are_bound_per_shape() {
    let mut mesh = boundary_mesh();
    insert_scalar_field(&mut mesh, "solution", |x| x[0] + x[1]);
    let mut algorithm = RecordingAlgorithm::integrating(VariableDescriptor::scalar_field("solution", "u"));
    for_each_element(&mesh, "all", &ElementShape::ALL, &mut algorithm, &DispatchSettings::default()).unwrap();

    // Integral of x + y over the unit square is 1, over its boundary 4
    assert_scalar_eq!(algorithm.integral, 5.0, comp = abs, tol = 1e-12);
    assert_eq!(algorithm.visited.len(), 12);
}

#[test]
fn mesh_dimension_mismatch_is_reported_for_used_shapes() {
    // A quad in a three-dimensional mesh cannot be bound
    let mut connectivity = ConnectivityTable::new();
    connectivity.push(ElementShape::Quad4d2, &[0, 1, 2, 3]);
    let coordinates = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
    let mesh = Mesh::from_coordinates_and_connectivity(3, coordinates, connectivity);
    let region = mesh.all_elements();

    let mut algorithm = RecordingAlgorithm::new();
    let report = for_each_element_in_region(&mesh, &region, &ElementShape::ALL, &mut algorithm, &DispatchSettings::default())
        .unwrap_err();
    assert!(matches!(
        report.downcast_ref::<Error>(),
        Some(Error::MeshDimensionMismatch {
            shape: ElementShape::Quad4d2,
            ..
        })
    ));
}

#[test]
fn degenerate_element_aborts_by_default() {
    let mesh = mesh_with_degenerate_quad();
    let mut algorithm = RecordingAlgorithm::new();
    let report = for_each_element(&mesh, "all", &[ElementShape::Quad4d2], &mut algorithm, &DispatchSettings::default())
        .unwrap_err();

    assert!(matches!(
        report.downcast_ref::<Error>(),
        Some(Error::DegenerateElement { element_index: 1, .. })
    ));
    assert_eq!(algorithm.visited, vec![(ElementShape::Quad4d2, 0)]);
}

#[test]
fn degenerate_element_can_be_skipped() {
    let mesh = mesh_with_degenerate_quad();
    let mut algorithm = RecordingAlgorithm::new();
    let settings = DispatchSettings {
        degenerate_elements: DegenerateElementPolicy::SkipAndWarn,
        ..DispatchSettings::default()
    };
    let summary = for_each_element(&mesh, "all", &[ElementShape::Quad4d2], &mut algorithm, &settings).unwrap();

    assert_eq!(algorithm.visited, vec![(ElementShape::Quad4d2, 0)]);
    assert_eq!(summary.visited(), 1);
    assert_eq!(summary.skipped_degenerate(), 1);
    assert_scalar_eq!(algorithm.integral, 1.0, comp = abs, tol = 1e-12);
}

struct FailingAlgorithm;

impl ElementAlgorithm<f64, 0> for FailingAlgorithm {
    fn variables(&self) -> [VariableDescriptor<f64>; 0] {
        []
    }

    fn execute<E>(&mut self, _context: &mut ElementContext<'_, f64, E, 0>) -> eyre::Result<()>
    where
        E: FiniteElement<f64>,
        DefaultAllocator: ElementAllocator<f64, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        Err(eyre!("solver diverged"))
    }
}

#[test]
fn other_errors_abort_regardless_of_policy() {
    let mesh = boundary_mesh();
    let settings = DispatchSettings {
        degenerate_elements: DegenerateElementPolicy::SkipAndWarn,
        ..DispatchSettings::default()
    };
    let report = for_each_element(&mesh, "interior", &ElementShape::ALL, &mut FailingAlgorithm, &settings).unwrap_err();
    let message = format!("{report:#}");
    assert!(message.contains("solver diverged"));
    assert!(message.contains("element 0"));
}

/// Collects visited element indices per chunk, to be compared with the sequential order.
struct CollectingAlgorithm;

impl ParallelElementAlgorithm<f64, 1> for CollectingAlgorithm {
    type Accumulator = (Vec<usize>, f64);

    fn variables(&self) -> [VariableDescriptor<f64>; 1] {
        [VariableDescriptor::uniform_scalar(1.0)]
    }

    fn new_accumulator(&self) -> Self::Accumulator {
        (Vec::new(), 0.0)
    }

    fn execute<E>(
        &self,
        context: &mut ElementContext<'_, f64, E, 1>,
        (visited, volume): &mut Self::Accumulator,
    ) -> eyre::Result<()>
    where
        E: FiniteElement<f64>,
        DefaultAllocator: ElementAllocator<f64, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        let (weights, points) = context.quadrature();
        for (&w, xi) in weights.iter().zip(points) {
            *volume += w * context.geometry().jacobian_determinant(xi)?;
        }
        visited.extend(context.element_index());
        Ok(())
    }

    fn merge(&self, (target_visited, target_volume): &mut Self::Accumulator, (visited, volume): Self::Accumulator) {
        target_visited.extend(visited);
        *target_volume += volume;
    }
}

#[test]
fn parallel_traversal_matches_sequential_order() {
    let mesh = create_unit_box_uniform_hex_mesh_3d::<f64>(4);
    let region = mesh.all_elements();
    let settings = DispatchSettings {
        parallel_chunk_size: 5,
        ..DispatchSettings::default()
    };

    let mut sequential = RecordingAlgorithm::new();
    for_each_element_in_region(&mesh, &region, &[ElementShape::Hex8], &mut sequential, &settings).unwrap();
    let ((visited, volume), summary) =
        par_for_each_element_in_region(&mesh, &region, &[ElementShape::Hex8], &CollectingAlgorithm, &settings).unwrap();

    let sequential_visited: Vec<_> = sequential.visited.iter().map(|&(_, i)| i).collect();
    assert_eq!(visited, sequential_visited);
    assert_eq!(summary.visited(), 64);
    assert_scalar_eq!(volume, 1.0, comp = abs, tol = 1e-12);
}

#[test]
fn parallel_traversal_skips_degenerate_elements() {
    let mesh = mesh_with_degenerate_quad();
    let region = mesh.region("all").unwrap();

    let report = par_for_each_element_in_region(
        &mesh,
        region,
        &[ElementShape::Quad4d2],
        &CollectingAlgorithm,
        &DispatchSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(report.downcast_ref::<Error>(), Some(Error::DegenerateElement { .. })));

    let settings = DispatchSettings {
        degenerate_elements: DegenerateElementPolicy::SkipAndWarn,
        parallel_chunk_size: 1,
    };
    let ((visited, _), summary) =
        par_for_each_element_in_region(&mesh, region, &[ElementShape::Quad4d2], &CollectingAlgorithm, &settings)
            .unwrap();
    assert_eq!(visited, vec![0]);
    assert_eq!(summary.skipped_degenerate(), 1);
}
