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

//! The steady-state solver adapter (§4.6): replaces one row of `L` with the
//! trace-preservation constraint and delegates the resulting linear system to a
//! pluggable [`LinearSolver`].

use crate::ado::AdoVector;
use crate::config::SolverOptions;
use crate::error::{HeomError, HeomResult};
use crate::matrix::HeomMatrix;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;

/// A pluggable linear solve `L x = b` over the assembled superoperator. The default
/// [`DenseLuSolver`] densifies `L` and runs `nalgebra`'s LU factorisation; a caller
/// with a genuinely large hierarchy can substitute a sparse iterative solver without
/// touching [`solve`].
pub trait LinearSolver: Send + Sync {
    /// Solves `l * x = b` for `x`.
    fn solve(&self, l: &CscMatrix<Complex64>, b: &DVector<Complex64>) -> HeomResult<DVector<Complex64>>;
}

fn to_dense(m: &CscMatrix<Complex64>) -> DMatrix<Complex64> {
    let mut dense = DMatrix::from_element(m.nrows(), m.ncols(), Complex64::new(0.0, 0.0));
    for (r, c, v) in m.triplet_iter() {
        dense[(r, c)] = *v;
    }
    dense
}

/// The crate's default solver: dense LU factorisation via `nalgebra`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenseLuSolver;

impl LinearSolver for DenseLuSolver {
    fn solve(&self, l: &CscMatrix<Complex64>, b: &DVector<Complex64>) -> HeomResult<DVector<Complex64>> {
        let dense = to_dense(l);
        dense.lu().solve(b).ok_or(HeomError::SteadyStateResidualTooLarge {
            residual: f64::INFINITY,
            tolerance: 0.0,
        })
    }
}

/// Replaces `constraint_row` of `M.data` with the trace-preservation constraint
/// `sum_i rho[i,i] = 1` on ADO block 0, and builds the matching right-hand side.
fn build_constrained_system(
    matrix: &HeomMatrix,
    constraint_row: usize,
) -> (CscMatrix<Complex64>, DVector<Complex64>) {
    let d = matrix.d();
    let dim = matrix.data().nrows();
    let mut coo = CooMatrix::new(dim, dim);
    for (r, c, v) in matrix.data().triplet_iter() {
        if r != constraint_row {
            coo.push(r, c, *v);
        }
    }
    for i in 0..d {
        coo.push(constraint_row, i * d + i, Complex64::new(1.0, 0.0));
    }
    let mut b = DVector::from_element(dim, Complex64::new(0.0, 0.0));
    b[constraint_row] = Complex64::new(1.0, 0.0);
    (CscMatrix::from(&coo), b)
}

/// Solves for the steady-state ADO vector of `matrix`: `L rho = 0` subject to
/// `Tr(rho) = 1`, validated against `opts.tolerance` by substituting the solution
/// back into the original (unconstrained) generator (§4.6, §6 `steady_state`).
pub fn solve(matrix: &HeomMatrix, solver: &dyn LinearSolver, opts: &SolverOptions) -> HeomResult<AdoVector> {
    let (l_constrained, b) = build_constrained_system(matrix, 0);
    let x = solver.solve(&l_constrained, &b)?;

    let residual = (matrix.data() * &x).norm();
    tracing::debug!(residual, tolerance = opts.tolerance, "steady-state residual");
    if residual > opts.tolerance {
        return Err(HeomError::SteadyStateResidualTooLarge {
            residual,
            tolerance: opts.tolerance,
        });
    }

    AdoVector::from_raw(x, matrix.d(), matrix.n_ado(), matrix.parity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::build_heom;
    use crate::bath::{Bath, BathKind, BathTerm};
    use crate::config::AssemblyOptions;

    fn dephasing_matrix() -> HeomMatrix {
        // A tier-0 single-bath hierarchy with a purely dephasing system Hamiltonian
        // (diagonal Hsys) has a known steady state: the Liouvillian reduces to pure
        // dephasing of the off-diagonal, so the maximally mixed state is a fixed point.
        let hsys = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.5, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(-0.5, 0.0),
            ],
        );
        let op = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(1.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(-1.0, 0.0),
            ],
        );
        let term = BathTerm::new(
            BathKind::BosonReal,
            Complex64::new(0.3, 0.0),
            None,
            Complex64::new(1.0, 0.0),
            op,
        )
        .unwrap();
        let bath = Bath::new(vec![term]).unwrap();
        build_heom(hsys, Some(&bath), None, 0, 0, None, &AssemblyOptions::default()).unwrap()
    }

    #[test]
    fn steady_state_has_unit_trace() {
        let m = dephasing_matrix();
        let opts = SolverOptions::default();
        let ado = solve(&m, &DenseLuSolver, &opts).unwrap();
        let rho = ado.get_rho();
        assert!((rho.trace() - Complex64::new(1.0, 0.0)).norm() < 1e-8);
    }

    #[test]
    fn steady_state_is_hermitian() {
        let m = dephasing_matrix();
        let opts = SolverOptions::default();
        let ado = solve(&m, &DenseLuSolver, &opts).unwrap();
        let rho = ado.get_rho();
        let diff = &rho - rho.adjoint();
        for v in diff.iter() {
            assert!(v.norm() < 1e-6);
        }
    }

    #[test]
    fn steady_state_satisfies_generator_to_tolerance() {
        let m = dephasing_matrix();
        let opts = SolverOptions::default();
        let ado = solve(&m, &DenseLuSolver, &opts).unwrap();
        let residual = (m.data() * ado.data()).norm();
        assert!(residual < 1e-6);
    }

    #[test]
    fn unreasonably_tight_tolerance_is_reported() {
        let m = dephasing_matrix();
        let opts = SolverOptions { tolerance: 0.0 };
        let err = solve(&m, &DenseLuSolver, &opts).unwrap_err();
        assert!(matches!(err, HeomError::SteadyStateResidualTooLarge { .. }));
    }
}
