//! A flux-redistribution (residual distribution) scheme for steady advection problems.
//!
//! On every element the scheme evaluates, at each quadrature point `q`, a scalar residual
//! `R(q)` and one influence coefficient `L(n, q)` per element node. The residual is split
//! among the nodes with positive influence, in proportion to that influence:
//!
//! ```text
//! phi(n) += max(0, L(n, q)) / sum_m max(0, L(m, q)) * R(q)
//! ```
//!
//! so that every quadrature point hands out exactly its residual and no node receives a
//! contribution of opposite sign to it. The nodal residuals `phi` are then scattered into a
//! global residual, and the diagonal of the element's bounding box is added to a global
//! inverse update coefficient for every node of the element.
use log::trace;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector};
use serde::{Deserialize, Serialize};

use crate::allocators::ElementAllocator;
use crate::binding::VariableDescriptor;
use crate::context::ElementContext;
use crate::dispatch::{ElementAlgorithm, ParallelElementAlgorithm};
use crate::element::FiniteElement;
use crate::geometry::GeometryCache;
use crate::quadrature::QuadraturePair;
use crate::{Error, Real};

/// Slot of the solution variable in the scheme's context.
pub const SOLUTION_SLOT: usize = 0;
/// Slot of the per-element nodal residual in the scheme's context.
pub const NODAL_RESIDUAL_SLOT: usize = 1;

/// An advection velocity that may depend on position and on the solution value.
pub trait AdvectionVelocity<T: Real> {
    fn velocity<D>(&self, x: &OPoint<T, D>, u: T) -> OVector<T, D>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>;
}

/// A uniform velocity.
///
/// Components beyond the length of the stored velocity are zero, and surplus components are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearAdvection<T> {
    velocity: Vec<T>,
}

impl<T> LinearAdvection<T> {
    pub fn new(velocity: impl Into<Vec<T>>) -> Self {
        Self {
            velocity: velocity.into(),
        }
    }

    /// The stored velocity components.
    pub fn components(&self) -> &[T] {
        &self.velocity
    }
}

impl<T: Real> AdvectionVelocity<T> for LinearAdvection<T> {
    fn velocity<D>(&self, _x: &OPoint<T, D>, _u: T) -> OVector<T, D>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        OVector::from_fn(|i, _| self.velocity.get(i).copied().unwrap_or_else(T::zero))
    }
}

/// Solid body rotation about the origin, `a(x) = (x_1, -x_0)`.
///
/// The velocity is zero in one dimension. Components beyond the second are zero.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationAdvection;

impl<T: Real> AdvectionVelocity<T> for RotationAdvection {
    fn velocity<D>(&self, x: &OPoint<T, D>, _u: T) -> OVector<T, D>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        if D::dim() < 2 {
            return OVector::zeros();
        }
        OVector::from_fn(|i, _| match i {
            0 => x[1],
            1 => -x[0],
            _ => T::zero(),
        })
    }
}

/// Inviscid Burgers' equation written as a steady problem in (x, t), `a(u) = (u, 1)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurgersAdvection;

impl<T: Real> AdvectionVelocity<T> for BurgersAdvection {
    fn velocity<D>(&self, _x: &OPoint<T, D>, u: T) -> OVector<T, D>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        OVector::from_fn(|i, _| match i {
            0 => u,
            1 => T::one(),
            _ => T::zero(),
        })
    }
}

/// Computes quadrature point residuals and influence coefficients on one element.
pub trait FluxOperator<T: Real> {
    /// Evaluates the operator on the element the geometry refers to.
    ///
    /// `influence` holds one row of `solution.len()` coefficients per quadrature point,
    /// stored row after row. `flux` holds one residual per quadrature point.
    fn compute<E>(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        solution: &OVector<T, E::NodalDim>,
        quadrature: &QuadraturePair<T, E::ReferenceDim>,
        influence: &mut [T],
        flux: &mut [T],
    ) -> Result<(), Error>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>;
}

/// The advection operator `a(x, u) . grad u`.
///
/// With `w` the quadrature weight and `|J|` the Jacobian determinant at a point,
/// `L(n, q) = a . grad N_n * w * |J|` and `R(q) = a . grad u_h * w * |J|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvectionOperator<V> {
    velocity: V,
}

impl<V> AdvectionOperator<V> {
    pub fn new(velocity: V) -> Self {
        Self { velocity }
    }

    pub fn velocity(&self) -> &V {
        &self.velocity
    }
}

impl<T, V> FluxOperator<T> for AdvectionOperator<V>
where
    T: Real,
    V: AdvectionVelocity<T>,
{
    fn compute<E>(
        &self,
        geometry: &GeometryCache<'_, T, E>,
        solution: &OVector<T, E::NodalDim>,
        (weights, points): &QuadraturePair<T, E::ReferenceDim>,
        influence: &mut [T],
        flux: &mut [T],
    ) -> Result<(), Error>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        let num_nodes = solution.len();
        assert_eq!(influence.len(), weights.len() * num_nodes);
        assert_eq!(flux.len(), weights.len());

        let influence_rows = influence.chunks_exact_mut(num_nodes);
        for (((&w, xi), row), flux_q) in weights.iter().zip(points).zip(influence_rows).zip(flux) {
            let scale = w * geometry.jacobian_determinant(xi)?;
            let gradients = geometry.gradient(xi)?;
            let u = geometry.shape_function(xi).dot(&solution.transpose());
            let a = self.velocity.velocity(&geometry.coordinates(xi), u);

            *flux_q = a.dot(&(&gradients * solution)) * scale;
            for (l, gradient) in row.iter_mut().zip(gradients.column_iter()) {
                *l = a.dot(&gradient) * scale;
            }
        }
        Ok(())
    }
}

/// Distributes the residual of one quadrature point among the nodes.
///
/// Each node receives the share `max(0, L_n) / sum_m max(0, L_m)` of `flux`. If no
/// coefficient is positive, nothing is distributed and `false` is returned.
pub fn distribute_quadrature_point<T: Real>(influence: &[T], flux: T, nodal_residual: &mut [T]) -> bool {
    assert_eq!(influence.len(), nodal_residual.len());
    let positive_sum = influence
        .iter()
        .fold(T::zero(), |sum, &l| sum + l.max(T::zero()));
    if !(positive_sum > T::zero()) {
        return false;
    }
    for (phi, &l) in nodal_residual.iter_mut().zip(influence) {
        *phi += l.max(T::zero()) / positive_sum * flux;
    }
    true
}

/// Scratch buffers and counters reused across elements.
#[derive(Debug, Clone)]
pub struct RedistributionWorkspace<T> {
    influence: Vec<T>,
    flux: Vec<T>,
    elements: usize,
    skipped_quadrature_points: usize,
}

impl<T> Default for RedistributionWorkspace<T> {
    fn default() -> Self {
        Self {
            influence: Vec::new(),
            flux: Vec::new(),
            elements: 0,
            skipped_quadrature_points: 0,
        }
    }
}

impl<T> RedistributionWorkspace<T> {
    /// Number of elements whose residual was scattered.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Number of quadrature points that had no positive influence coefficient.
    pub fn skipped_quadrature_points(&self) -> usize {
        self.skipped_quadrature_points
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSettings {
    /// Quadrature strength used on every element. `None` selects each element type's
    /// canonical rule.
    pub quadrature_strength: Option<usize>,
}

/// The per-element part of the scheme, shared by the sequential and parallel drivers.
///
/// Binds the solution as a scalar field in [`SOLUTION_SLOT`] and an element vector
/// accumulator for the nodal residual in [`NODAL_RESIDUAL_SLOT`].
#[derive(Debug, Clone)]
pub struct FluxRedistribution<Op> {
    operator: Op,
    solution_field: String,
    solution_variable: String,
    settings: SchemeSettings,
}

impl<Op> FluxRedistribution<Op> {
    pub fn new(operator: Op, solution_field: impl Into<String>, solution_variable: impl Into<String>) -> Self {
        Self {
            operator,
            solution_field: solution_field.into(),
            solution_variable: solution_variable.into(),
            settings: SchemeSettings::default(),
        }
    }

    pub fn with_settings(self, settings: SchemeSettings) -> Self {
        Self { settings, ..self }
    }

    pub fn operator(&self) -> &Op {
        &self.operator
    }

    pub fn settings(&self) -> &SchemeSettings {
        &self.settings
    }

    fn descriptors<T>(&self) -> [VariableDescriptor<T>; 2] {
        [
            VariableDescriptor::scalar_field(&self.solution_field, &self.solution_variable),
            VariableDescriptor::ElementVector,
        ]
    }
}

fn check_scatter_length(expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ScatterLengthMismatch { expected, actual })
    }
}

/// Computes the nodal residual of the current element and scatters it.
///
/// Nothing is scattered if the operator fails, so a skipped element leaves the global
/// arrays untouched.
fn redistribute_element<T, E, Op>(
    operator: &Op,
    context: &mut ElementContext<'_, T, E, 2>,
    workspace: &mut RedistributionWorkspace<T>,
    residual: &mut [T],
    inverse_update_coefficient: &mut [T],
) -> eyre::Result<()>
where
    T: Real,
    E: FiniteElement<T>,
    Op: FluxOperator<T>,
    DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
{
    let (geometry, quadrature, [solution, nodal_residual]) = context.split_mut();
    let num_vertices = geometry.mesh().num_vertices();
    check_scatter_length(num_vertices, residual.len())?;
    check_scatter_length(num_vertices, inverse_update_coefficient.len())?;

    let solution = solution.as_scalar_field()?.value();
    let phi = nodal_residual.element_vector_mut()?;
    let num_nodes = phi.len();
    let num_points = quadrature.0.len();

    workspace.influence.clear();
    workspace.influence.resize(num_points * num_nodes, T::zero());
    workspace.flux.clear();
    workspace.flux.resize(num_points, T::zero());
    operator.compute(geometry, solution, quadrature, &mut workspace.influence, &mut workspace.flux)?;

    let influence_rows = workspace.influence.chunks_exact(num_nodes);
    for (influence, &flux) in influence_rows.zip(&workspace.flux) {
        if !distribute_quadrature_point(influence, flux, phi.as_mut_slice()) {
            workspace.skipped_quadrature_points += 1;
        }
    }

    let nodes = geometry.element_nodes();
    let update_coefficient = geometry.bounding_box().diagonal_length();
    for (&node, &phi_n) in nodes.iter().zip(phi.iter()) {
        residual[node] += phi_n;
        inverse_update_coefficient[node] += update_coefficient;
    }
    workspace.elements += 1;
    trace!("Redistributed residual of {} element {:?}", E::SHAPE, geometry.element_index());
    Ok(())
}

/// Sequential driver of the scheme, scattering into caller-owned arrays.
///
/// Both arrays must have one entry per mesh vertex. The scheme only adds to them, so they
/// are usually zeroed by the caller before a traversal.
#[derive(Debug)]
pub struct FluxRedistributionScheme<'r, T, Op> {
    kernel: FluxRedistribution<Op>,
    residual: &'r mut [T],
    inverse_update_coefficient: &'r mut [T],
    workspace: RedistributionWorkspace<T>,
    phi: Vec<T>,
}

impl<'r, T, Op> FluxRedistributionScheme<'r, T, Op> {
    pub fn new(
        kernel: FluxRedistribution<Op>,
        residual: &'r mut [T],
        inverse_update_coefficient: &'r mut [T],
    ) -> Self {
        Self {
            kernel,
            residual,
            inverse_update_coefficient,
            workspace: RedistributionWorkspace::default(),
            phi: Vec::new(),
        }
    }

    pub fn kernel(&self) -> &FluxRedistribution<Op> {
        &self.kernel
    }

    /// Nodal residual of the most recently processed element.
    pub fn phi(&self) -> &[T] {
        &self.phi
    }

    pub fn residual(&self) -> &[T] {
        &*self.residual
    }

    pub fn inverse_update_coefficient(&self) -> &[T] {
        &*self.inverse_update_coefficient
    }

    pub fn workspace(&self) -> &RedistributionWorkspace<T> {
        &self.workspace
    }

    /// Number of quadrature points so far that had no positive influence coefficient.
    pub fn skipped_quadrature_points(&self) -> usize {
        self.workspace.skipped_quadrature_points
    }
}

impl<'r, T, Op> ElementAlgorithm<T, 2> for FluxRedistributionScheme<'r, T, Op>
where
    T: Real,
    Op: FluxOperator<T>,
{
    fn variables(&self) -> [VariableDescriptor<T>; 2] {
        self.kernel.descriptors()
    }

    fn quadrature_strength(&self) -> Option<usize> {
        self.kernel.settings.quadrature_strength
    }

    fn execute<E>(&mut self, context: &mut ElementContext<'_, T, E, 2>) -> eyre::Result<()>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        redistribute_element(
            &self.kernel.operator,
            context,
            &mut self.workspace,
            self.residual,
            self.inverse_update_coefficient,
        )?;
        let phi = context.variable(NODAL_RESIDUAL_SLOT).element_vector()?;
        self.phi.clear();
        self.phi.extend(phi.iter().copied());
        Ok(())
    }
}

/// Per-worker output of the parallel scheme.
///
/// The arrays are sized to the mesh on first use, so an accumulator that never saw an
/// element is empty.
#[derive(Debug, Clone)]
pub struct NodalAccumulator<T> {
    pub residual: Vec<T>,
    pub inverse_update_coefficient: Vec<T>,
    workspace: RedistributionWorkspace<T>,
}

impl<T> Default for NodalAccumulator<T> {
    fn default() -> Self {
        Self {
            residual: Vec::new(),
            inverse_update_coefficient: Vec::new(),
            workspace: RedistributionWorkspace::default(),
        }
    }
}

impl<T: Real> NodalAccumulator<T> {
    fn ensure_len(&mut self, num_vertices: usize) {
        if self.residual.len() < num_vertices {
            self.residual.resize(num_vertices, T::zero());
            self.inverse_update_coefficient.resize(num_vertices, T::zero());
        }
    }

    pub fn workspace(&self) -> &RedistributionWorkspace<T> {
        &self.workspace
    }

    pub fn skipped_quadrature_points(&self) -> usize {
        self.workspace.skipped_quadrature_points
    }

    /// Adds another accumulator into this one.
    pub fn merge(&mut self, other: Self) {
        self.ensure_len(other.residual.len());
        for (target, source) in self.residual.iter_mut().zip(other.residual) {
            *target += source;
        }
        let coefficients = self.inverse_update_coefficient.iter_mut();
        for (target, source) in coefficients.zip(other.inverse_update_coefficient) {
            *target += source;
        }
        self.workspace.elements += other.workspace.elements;
        self.workspace.skipped_quadrature_points += other.workspace.skipped_quadrature_points;
    }
}

impl<T, Op> ParallelElementAlgorithm<T, 2> for FluxRedistribution<Op>
where
    T: Real + Send,
    Op: FluxOperator<T> + Sync,
{
    type Accumulator = NodalAccumulator<T>;

    fn variables(&self) -> [VariableDescriptor<T>; 2] {
        self.descriptors()
    }

    fn quadrature_strength(&self) -> Option<usize> {
        self.settings.quadrature_strength
    }

    fn new_accumulator(&self) -> NodalAccumulator<T> {
        NodalAccumulator::default()
    }

    fn execute<E>(
        &self,
        context: &mut ElementContext<'_, T, E, 2>,
        accumulator: &mut NodalAccumulator<T>,
    ) -> eyre::Result<()>
    where
        E: FiniteElement<T>,
        DefaultAllocator: ElementAllocator<T, E::GeometryDim, E::ReferenceDim, E::NodalDim>,
    {
        accumulator.ensure_len(context.geometry().mesh().num_vertices());
        let NodalAccumulator {
            residual,
            inverse_update_coefficient,
            workspace,
        } = accumulator;
        redistribute_element(&self.operator, context, workspace, residual, inverse_update_coefficient)
    }

    fn merge(&self, target: &mut NodalAccumulator<T>, source: NodalAccumulator<T>) {
        target.merge(source);
    }
}
