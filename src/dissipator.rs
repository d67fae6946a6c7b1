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

//! Lindblad dissipator injection and observable extraction (§4.4).

use crate::ado::AdoVector;
use crate::error::{HeomError, HeomResult};
use crate::matrix::HeomMatrix;
use crate::sparse::{coo_from_csc, embed_block};
use crate::superop::lindblad_super;
use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;

/// Adds a sum of Lindblad jump operators to the diagonal `L_sys` block of `M`, and
/// re-stamps that change into every diagonal ADO block.
///
/// An empty `jump_ops` list is a deliberate no-op (the idempotence invariant of §8):
/// the zero dissipator superoperator would contribute no entries above the matrix's
/// own drop tolerance, so skipping the rebuild entirely keeps `M` structurally
/// byte-for-byte identical rather than relying on that cancellation.
pub fn add_dissipator(matrix: &mut HeomMatrix, jump_ops: &[DMatrix<Complex64>]) -> HeomResult<()> {
    let d = matrix.d();
    for j in jump_ops {
        if j.nrows() != d || j.ncols() != d {
            return Err(HeomError::DimensionMismatch {
                context: "jump operator must be d x d",
                expected: d,
                found: j.nrows().max(j.ncols()),
            });
        }
    }
    if jump_ops.is_empty() {
        return Ok(());
    }

    let d2 = d * d;
    let mut diss = DMatrix::from_element(d2, d2, Complex64::new(0.0, 0.0));
    for j in jump_ops {
        diss += lindblad_super(j);
    }

    let mut coo = coo_from_csc(&matrix.data);
    for b in 0..matrix.n_ado() {
        embed_block(&mut coo, b, b, d2, &diss, matrix.drop_tol);
    }
    matrix.data = CscMatrix::from(&coo);
    Ok(())
}

/// Extracts the physical reduced density matrix (ADO block `0`) from an ADO vector.
pub fn get_rho(ado: &AdoVector) -> DMatrix<Complex64> {
    ado.get_rho()
}

/// Expectation value `Tr(O * rho)` of observable `O` in the reduced state of `ado`.
pub fn expect(o: &DMatrix<Complex64>, ado: &AdoVector) -> Complex64 {
    let rho = get_rho(ado);
    (o * rho).trace()
}
