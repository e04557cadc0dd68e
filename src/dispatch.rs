//! Iteration over the elements of a region, dispatched on element shape.
//!
//! A mesh may mix element shapes, but element algorithms are written generically over a
//! statically typed element `E`. The dispatcher walks a caller-supplied list of candidate
//! shapes. For each candidate it filters the region down to the elements of that shape,
//! builds one [`ElementContext`] for the corresponding element type and runs the algorithm
//! on every matching element. Elements whose shape is not a candidate are skipped.
//!
//! Within one shape, elements are visited in region order. Shapes are processed in the
//! order they appear in the candidate list.
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::DefaultAllocator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::allocators::ElementAllocator;
use crate::binding::VariableDescriptor;
use crate::context::ElementContext;
use crate::element::{
    ElementShape, FiniteElement, Hex8Element, Quad4d2Element, Segment2d1Element, Segment2d2Element, Tet4Element,
    Tri3d2Element, Tri3d3Element,
};
use crate::mesh::{Mesh, Region};
use crate::{Error, Real};

/// What to do when an algorithm reports [`Error::DegenerateElement`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DegenerateElementPolicy {
    /// Stop the traversal and return the error.
    #[default]
    Abort,
    /// Log a warning, skip the element and continue.
    SkipAndWarn,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    pub degenerate_elements: DegenerateElementPolicy,
    /// Number of elements processed by one worker context in the parallel traversal.
    ///
    /// Results of the parallel traversal depend on the chunk size through the summation
    /// order, but not on the number of threads.
    pub parallel_chunk_size: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            degenerate_elements: DegenerateElementPolicy::default(),
            parallel_chunk_size: 256,
        }
    }
}

/// Statistics for one candidate shape of a traversal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapePass {
    pub shape: ElementShape,
    /// Elements on which the algorithm completed.
    pub visited: usize,
    /// Elements skipped because they were degenerate.
    pub skipped_degenerate: usize,
}

/// Statistics for a complete traversal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispatchSummary {
    /// One entry per distinct candidate shape, in candidate order.
    pub passes: Vec<ShapePass>,
    /// Region elements whose shape was not among the candidates.
    pub unmatched: usize,
}

impl DispatchSummary {
    pub fn visited(&self) -> usize {
        self.passes.iter().map(|pass| pass.visited).sum()
    }

    pub fn skipped_degenerate(&self) -> usize {
        self.passes.iter().map(|pass| pass.skipped_degenerate).sum()
    }
}

/// An algorithm run once per element by [`for_each_element_in_region`].
///
/// The algorithm declares `N` variable slots. Its `execute` method is generic over the
/// element type and is instantiated once per candidate shape.
pub trait ElementAlgorithm<T: Real, const N: usize> {
    fn variables(&self) -> [VariableDescriptor<T>; N];

    /// Strength of the quadrature rule to install in each context.
    ///
    /// `None` keeps each element type's canonical rule.
    fn quadrature_strength(&self) -> Option<usize> {
        None
    }

    /// Processes the element the context currently refers to.
    fn execute<E>(&mut self, context: &mut ElementContext<'_, T, E, N>) -> eyre::Result<()>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>;
}

/// An algorithm that can be run on disjoint chunks of elements concurrently.
///
/// Each chunk writes into its own accumulator. Accumulators are merged in chunk order once
/// all chunks are done.
pub trait ParallelElementAlgorithm<T: Real, const N: usize>: Sync {
    type Accumulator: Send;

    fn variables(&self) -> [VariableDescriptor<T>; N];

    fn quadrature_strength(&self) -> Option<usize> {
        None
    }

    fn new_accumulator(&self) -> Self::Accumulator;

    fn execute<E>(
        &self,
        context: &mut ElementContext<'_, T, E, N>,
        accumulator: &mut Self::Accumulator,
    ) -> eyre::Result<()>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>;

    fn merge(&self, target: &mut Self::Accumulator, source: Self::Accumulator);
}

/// Runs the algorithm on every element of the region whose shape is among the candidates.
///
/// Contexts are only created for shapes that have at least one element in the region, so
/// descriptor errors for unused shapes are not reported. Duplicate candidates are ignored.
pub fn for_each_element_in_region<T, A, const N: usize>(
    mesh: &Mesh<T>,
    region: &Region,
    candidates: &[ElementShape],
    algorithm: &mut A,
    settings: &DispatchSettings,
) -> eyre::Result<DispatchSummary>
where
    T: Real,
    A: ElementAlgorithm<T, N>,
{
    let candidates = prepare_traversal(mesh, region, candidates)?;

    let mut summary = DispatchSummary {
        passes: Vec::with_capacity(candidates.len()),
        unmatched: count_unmatched(mesh, region, &candidates),
    };
    for &shape in &candidates {
        let pass = match shape {
            ElementShape::Segment2d1 => dispatch_shape::<T, Segment2d1Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Segment2d2 => dispatch_shape::<T, Segment2d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tri3d2 => dispatch_shape::<T, Tri3d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Quad4d2 => dispatch_shape::<T, Quad4d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tri3d3 => dispatch_shape::<T, Tri3d3Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tet4 => dispatch_shape::<T, Tet4Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Hex8 => dispatch_shape::<T, Hex8Element<T>, A, N>(mesh, region, algorithm, settings),
        }?;
        summary.passes.push(pass);
    }

    debug!(
        "Visited {} elements of region `{}` ({} unmatched, {} degenerate skipped)",
        summary.visited(),
        region.name(),
        summary.unmatched,
        summary.skipped_degenerate()
    );
    Ok(summary)
}

/// Looks up the region by name and runs [`for_each_element_in_region`] on it.
pub fn for_each_element<T, A, const N: usize>(
    mesh: &Mesh<T>,
    region_name: &str,
    candidates: &[ElementShape],
    algorithm: &mut A,
    settings: &DispatchSettings,
) -> eyre::Result<DispatchSummary>
where
    T: Real,
    A: ElementAlgorithm<T, N>,
{
    let region = mesh.region(region_name)?;
    for_each_element_in_region(mesh, region, candidates, algorithm, settings)
}

/// Parallel counterpart of [`for_each_element_in_region`].
///
/// The matching elements of each shape are split into chunks of
/// [`DispatchSettings::parallel_chunk_size`] elements. Every chunk gets its own context and
/// accumulator, and the accumulators are merged in chunk order, so the result does not
/// depend on how chunks are scheduled.
pub fn par_for_each_element_in_region<T, A, const N: usize>(
    mesh: &Mesh<T>,
    region: &Region,
    candidates: &[ElementShape],
    algorithm: &A,
    settings: &DispatchSettings,
) -> eyre::Result<(A::Accumulator, DispatchSummary)>
where
    T: Real + Send + Sync,
    A: ParallelElementAlgorithm<T, N>,
{
    let candidates = prepare_traversal(mesh, region, candidates)?;

    let mut accumulator = algorithm.new_accumulator();
    let mut summary = DispatchSummary {
        passes: Vec::with_capacity(candidates.len()),
        unmatched: count_unmatched(mesh, region, &candidates),
    };
    for &shape in &candidates {
        let (shape_accumulator, pass) = match shape {
            ElementShape::Segment2d1 => par_dispatch_shape::<T, Segment2d1Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Segment2d2 => par_dispatch_shape::<T, Segment2d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tri3d2 => par_dispatch_shape::<T, Tri3d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Quad4d2 => par_dispatch_shape::<T, Quad4d2Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tri3d3 => par_dispatch_shape::<T, Tri3d3Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Tet4 => par_dispatch_shape::<T, Tet4Element<T>, A, N>(mesh, region, algorithm, settings),
            ElementShape::Hex8 => par_dispatch_shape::<T, Hex8Element<T>, A, N>(mesh, region, algorithm, settings),
        }?;
        algorithm.merge(&mut accumulator, shape_accumulator);
        summary.passes.push(pass);
    }

    debug!(
        "Visited {} elements of region `{}` in parallel ({} unmatched, {} degenerate skipped)",
        summary.visited(),
        region.name(),
        summary.unmatched,
        summary.skipped_degenerate()
    );
    Ok((accumulator, summary))
}

/// Validates the region and removes duplicate candidates, keeping the first occurrence.
///
/// Regions built by hand are not necessarily registered on the mesh, so they are checked here
/// as well.
fn prepare_traversal<T>(mesh: &Mesh<T>, region: &Region, candidates: &[ElementShape]) -> Result<Vec<ElementShape>, Error> {
    mesh.check_region(region)?;
    if candidates.is_empty() && !region.is_empty() {
        warn!(
            "Empty candidate shape list for region `{}`, none of its {} elements will be visited",
            region.name(),
            region.len()
        );
    }
    Ok(candidates.iter().copied().unique().collect())
}

fn count_unmatched<T>(mesh: &Mesh<T>, region: &Region, candidates: &[ElementShape]) -> usize {
    region
        .elements()
        .iter()
        .filter(|&&element_index| !candidates.contains(&mesh.element_shape(element_index)))
        .count()
}

fn matching_elements<'r, T>(mesh: &'r Mesh<T>, region: &'r Region, shape: ElementShape) -> impl Iterator<Item = usize> + 'r {
    region
        .elements()
        .iter()
        .copied()
        .filter(move |&element_index| mesh.element_shape(element_index) == shape)
}

/// Builds a context for element type `E` with the algorithm's variables and quadrature.
fn build_context<'a, T, E, const N: usize>(
    mesh: &'a Mesh<T>,
    descriptors: &[VariableDescriptor<T>; N],
    quadrature_strength: Option<usize>,
) -> eyre::Result<ElementContext<'a, T, E, N>>
where
    T: Real,
    E: FiniteElement<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    let mut context = ElementContext::new(mesh, descriptors)?;
    if let Some(strength) = quadrature_strength {
        context.set_quadrature(E::quadrature(strength)?);
    }
    Ok(context)
}

/// Decides whether a failed element is skipped (`Ok(())`) or ends the traversal.
fn handle_element_error(
    error: eyre::Report,
    shape: ElementShape,
    element_index: usize,
    settings: &DispatchSettings,
) -> eyre::Result<()> {
    let degenerate = matches!(error.downcast_ref::<Error>(), Some(Error::DegenerateElement { .. }));
    if degenerate && settings.degenerate_elements == DegenerateElementPolicy::SkipAndWarn {
        warn!("Skipping {shape} element {element_index}: {error}");
        Ok(())
    } else {
        Err(error.wrap_err(format!("Failed to process {shape} element {element_index}")))
    }
}

fn dispatch_shape<T, E, A, const N: usize>(
    mesh: &Mesh<T>,
    region: &Region,
    algorithm: &mut A,
    settings: &DispatchSettings,
) -> eyre::Result<ShapePass>
where
    T: Real,
    E: FiniteElement<T>,
    A: ElementAlgorithm<T, N>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    let mut pass = ShapePass {
        shape: E::SHAPE,
        visited: 0,
        skipped_degenerate: 0,
    };

    let mut elements = matching_elements(mesh, region, E::SHAPE).peekable();
    if elements.peek().is_none() {
        debug!("No {} elements in region `{}`", E::SHAPE, region.name());
        return Ok(pass);
    }

    let mut context = build_context::<T, E, N>(mesh, &algorithm.variables(), algorithm.quadrature_strength())?;
    for element_index in elements {
        context.set_element(element_index)?;
        match algorithm.execute(&mut context) {
            Ok(()) => pass.visited += 1,
            Err(error) => {
                handle_element_error(error, E::SHAPE, element_index, settings)?;
                pass.skipped_degenerate += 1;
            }
        }
    }
    Ok(pass)
}

fn par_dispatch_shape<T, E, A, const N: usize>(
    mesh: &Mesh<T>,
    region: &Region,
    algorithm: &A,
    settings: &DispatchSettings,
) -> eyre::Result<(A::Accumulator, ShapePass)>
where
    T: Real + Send + Sync,
    E: FiniteElement<T>,
    A: ParallelElementAlgorithm<T, N>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    let elements: Vec<usize> = matching_elements(mesh, region, E::SHAPE).collect();
    let mut pass = ShapePass {
        shape: E::SHAPE,
        visited: 0,
        skipped_degenerate: 0,
    };
    let mut accumulator = algorithm.new_accumulator();
    if elements.is_empty() {
        return Ok((accumulator, pass));
    }

    let descriptors = algorithm.variables();
    let quadrature_strength = algorithm.quadrature_strength();
    let chunk_size = settings.parallel_chunk_size.max(1);
    let chunk_results = elements
        .par_chunks(chunk_size)
        .map(|chunk| -> eyre::Result<_> {
            let mut context = build_context::<T, E, N>(mesh, &descriptors, quadrature_strength)?;
            let mut chunk_accumulator = algorithm.new_accumulator();
            let (mut visited, mut skipped) = (0, 0);
            for &element_index in chunk {
                context.set_element(element_index)?;
                match algorithm.execute(&mut context, &mut chunk_accumulator) {
                    Ok(()) => visited += 1,
                    Err(error) => {
                        handle_element_error(error, E::SHAPE, element_index, settings)?;
                        skipped += 1;
                    }
                }
            }
            Ok((chunk_accumulator, visited, skipped))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    for (chunk_accumulator, visited, skipped) in chunk_results {
        algorithm.merge(&mut accumulator, chunk_accumulator);
        pass.visited += visited;
        pass.skipped_degenerate += skipped;
    }
    Ok((accumulator, pass))
}
