// Copyright © 2021-2023 HQS Quantum Simulations GmbH. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the
// License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either
// express or implied. See the License for the specific language governing permissions and
// limitations under the License.

#![deny(missing_docs)]
#![warn(clippy::all)]

//! `heom_core` assembles and propagates the Hierarchical Equations of Motion (HEOM)
//! superoperator for open quantum systems.
//!
//! Given a system Hamiltonian and one or more exponential bath expansions (bosonic,
//! fermionic, or both), [`make_heom_boson`], [`make_heom_fermion`] and
//! [`make_heom_boson_fermion`] assemble the sparse block-structured generator `M`
//! acting on the flattened auxiliary-density-operator (ADO) vector. [`evolve`] and
//! [`evolve_ode`] propagate an initial state under `M`; [`steady_state`] solves for
//! its fixed point directly.
//!
//! This crate assembles and propagates `M`; it does not itself generate bath
//! expansion coefficients from a spectral density (Drude-Lorentz, Matsubara, Pade) —
//! callers supply [`bath::BathTerm`] tables from wherever those coefficients come
//! from.

pub mod ado;
pub mod assembler;
pub mod bath;
pub mod checkpoint;
pub mod config;
pub mod dissipator;
pub mod error;
pub mod evolve;
pub mod gradients;
pub mod hierarchy;
pub mod matrix;
pub mod prelude;
pub mod sparse;
pub mod steady_state;
pub mod superop;
pub mod types;

use ado::AdoVector;
use bath::Bath;
use checkpoint::{CheckpointSink, ProgressSink};
use config::{AssemblyOptions, ExpmOptions, OdeOptions, SolverOptions};
use error::{HeomError, HeomResult};
use matrix::HeomMatrix;
use nalgebra::DMatrix;
use num_complex::Complex64;
use steady_state::LinearSolver;
use types::Parity;

/// Converts a host-supplied `i64` tier (e.g. from a dynamically-typed caller) into
/// the `usize` the assembler expects, rejecting negative values (§7).
fn tier_from_i64(tier: i64) -> HeomResult<usize> {
    usize::try_from(tier).map_err(|_| HeomError::NegativeTier { tier })
}

/// Assembles a purely bosonic HEOM superoperator (§6).
///
/// `baths` is concatenated in order via [`Bath::combine`] before assembly, so
/// multiple independently-constructed baths (e.g. one per physical bath coupled to
/// the system) behave exactly as a single bath listing all their terms.
pub fn make_heom_boson(
    hsys: DMatrix<Complex64>,
    tier: i64,
    baths: &[Bath],
    opts: &AssemblyOptions,
) -> HeomResult<HeomMatrix> {
    let tier = tier_from_i64(tier)?;
    let combined = Bath::combine(baths)?;
    assembler::build_heom(hsys, Some(&combined), None, tier, 0, None, opts)
}

/// Assembles a purely fermionic HEOM superoperator, graded by `parity` (§6).
pub fn make_heom_fermion(
    hsys: DMatrix<Complex64>,
    tier: i64,
    baths: &[Bath],
    parity: Parity,
    opts: &AssemblyOptions,
) -> HeomResult<HeomMatrix> {
    let tier = tier_from_i64(tier)?;
    let combined = Bath::combine(baths)?;
    assembler::build_heom(hsys, None, Some(&combined), 0, tier, Some(parity), opts)
}

/// Assembles a mixed boson-fermion HEOM superoperator (§6).
#[allow(clippy::too_many_arguments)]
pub fn make_heom_boson_fermion(
    hsys: DMatrix<Complex64>,
    tier_boson: i64,
    tier_fermion: i64,
    boson_baths: &[Bath],
    fermion_baths: &[Bath],
    parity: Parity,
    opts: &AssemblyOptions,
) -> HeomResult<HeomMatrix> {
    let tier_boson = tier_from_i64(tier_boson)?;
    let tier_fermion = tier_from_i64(tier_fermion)?;
    let combined_boson = Bath::combine(boson_baths)?;
    let combined_fermion = Bath::combine(fermion_baths)?;
    assembler::build_heom(
        hsys,
        Some(&combined_boson),
        Some(&combined_fermion),
        tier_boson,
        tier_fermion,
        Some(parity),
        opts,
    )
}

/// Adds a sum of Lindblad jump operators to every diagonal ADO block of `matrix`, in
/// place (§6 `add_dissipator`).
pub fn add_dissipator(matrix: &mut HeomMatrix, jump_ops: &[DMatrix<Complex64>]) -> HeomResult<()> {
    dissipator::add_dissipator(matrix, jump_ops)
}

/// Extracts the physical reduced density matrix from an ADO vector (§6 `get_rho`).
pub fn get_rho(ado: &AdoVector) -> DMatrix<Complex64> {
    dissipator::get_rho(ado)
}

/// Expectation value `Tr(O rho)` of observable `O` in the reduced state of `ado`.
pub fn expect(o: &DMatrix<Complex64>, ado: &AdoVector) -> Complex64 {
    dissipator::expect(o, ado)
}

/// Propagates an initial density matrix under `matrix` via the truncated-Taylor
/// matrix-exponential propagator, for `steps` fixed steps of size `dt` (§6 `evolve`).
///
/// Returns the trajectory including the initial state, so the result has
/// `steps + 1` entries.
#[allow(clippy::too_many_arguments)]
pub fn evolve(
    matrix: &HeomMatrix,
    rho0: &DMatrix<Complex64>,
    dt: f64,
    steps: usize,
    opts: &ExpmOptions,
    checkpoint: Option<&mut dyn CheckpointSink>,
    progress: Option<&dyn ProgressSink>,
) -> HeomResult<Vec<AdoVector>> {
    let ado0 = AdoVector::from_density_matrix(rho0, matrix.n_ado(), matrix.parity())?;
    evolve::propagate(matrix, &ado0, dt, steps, opts, checkpoint, progress)
}

/// Propagates an initial density matrix under `matrix` via the externally-driven ODE
/// path across `tlist`, optionally with a time-dependent system Hamiltonian `h_t`
/// (§6 `evolve_ode`).
#[allow(clippy::too_many_arguments)]
pub fn evolve_ode(
    matrix: &HeomMatrix,
    rho0: &DMatrix<Complex64>,
    tlist: &[f64],
    opts: &OdeOptions,
    h_t: Option<&(dyn Fn(f64) -> DMatrix<Complex64> + Send + Sync)>,
    checkpoint: Option<&mut dyn CheckpointSink>,
    progress: Option<&dyn ProgressSink>,
) -> HeomResult<Vec<AdoVector>> {
    let ado0 = AdoVector::from_density_matrix(rho0, matrix.n_ado(), matrix.parity())?;
    evolve::propagate_ode(matrix, &ado0, tlist, opts, h_t, checkpoint, progress)
}

/// Solves for the steady-state ADO vector of `matrix` using the default dense-LU
/// solver (§6 `steady_state`).
pub fn steady_state(matrix: &HeomMatrix, opts: &SolverOptions) -> HeomResult<AdoVector> {
    steady_state::solve(matrix, &steady_state::DenseLuSolver, opts)
}

/// As [`steady_state`], but with a caller-supplied [`LinearSolver`] (e.g. a sparse
/// iterative solver for a genuinely large hierarchy).
pub fn steady_state_with_solver(
    matrix: &HeomMatrix,
    solver: &dyn LinearSolver,
    opts: &SolverOptions,
) -> HeomResult<AdoVector> {
    steady_state::solve(matrix, solver, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bath::{BathKind, BathTerm};

    fn hsys2() -> DMatrix<Complex64> {
        DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.6969, 0.0),
                Complex64::new(0.4364, 0.0),
                Complex64::new(0.4364, 0.0),
                Complex64::new(0.3215, 0.0),
            ],
        )
    }

    fn coupling() -> DMatrix<Complex64> {
        DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.1234, 0.0),
                Complex64::new(0.1357, 0.2468),
                Complex64::new(0.1357, -0.2468),
                Complex64::new(0.5678, 0.0),
            ],
        )
    }

    fn single_term_bath() -> Bath {
        let term = BathTerm::new(
            BathKind::BosonRealImag,
            Complex64::new(0.145, 0.6464),
            None,
            Complex64::new(0.7414, 0.0),
            coupling(),
        )
        .unwrap();
        Bath::new(vec![term]).unwrap()
    }

    #[test]
    fn negative_tier_is_rejected() {
        let opts = AssemblyOptions::default();
        let err = make_heom_boson(hsys2(), -1, &[single_term_bath()], &opts).unwrap_err();
        assert!(matches!(err, HeomError::NegativeTier { tier: -1 }));
    }

    #[test]
    fn make_heom_boson_round_trips_through_evolve() {
        let opts = AssemblyOptions::default();
        let matrix = make_heom_boson(hsys2(), 2, &[single_term_bath()], &opts).unwrap();
        let rho0 = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.6, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.4, 0.0),
            ],
        );
        let expm_opts = ExpmOptions::default();
        let trajectory = evolve(&matrix, &rho0, 0.01, 5, &expm_opts, None, None).unwrap();
        assert_eq!(trajectory.len(), 6);
        for ado in &trajectory {
            let rho = get_rho(ado);
            assert!((rho.trace() - Complex64::new(1.0, 0.0)).norm() < 1e-6);
        }
    }

    #[test]
    fn combining_multiple_baths_matches_manual_concatenation() {
        let opts = AssemblyOptions::default();
        let b1 = single_term_bath();
        let b2 = single_term_bath();
        let via_helper = make_heom_boson(hsys2(), 1, &[b1.clone(), b2.clone()], &opts).unwrap();
        let combined = Bath::combine(&[b1, b2]).unwrap();
        let via_manual = assembler::build_heom(hsys2(), Some(&combined), None, 1, 0, None, &opts).unwrap();
        assert_eq!(via_helper.nnz(), via_manual.nnz());
    }
}
