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

//! Shared utilities for placing small dense `d^2 x d^2` blocks into the global sparse
//! `(N_ado * d^2)^2` matrix. Used by both the hierarchy assembler and `add_dissipator`
//! (§4.7).

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;

/// A single block emission: the destination block row/col (in units of `d^2`) and the
/// dense values to add there.
pub type BlockTriples = Vec<(usize, usize, Complex64)>;

/// Flattens a dense `d^2 x d^2` block into global `(row, col, value)` triples at block
/// offset `(row_blk * d2, col_blk * d2)`, dropping entries with magnitude `<= tol`.
pub fn block_triples(
    row_blk: usize,
    col_blk: usize,
    d2: usize,
    block: &DMatrix<Complex64>,
    tol: f64,
) -> BlockTriples {
    let row0 = row_blk * d2;
    let col0 = col_blk * d2;
    let mut out = Vec::new();
    for j in 0..block.ncols() {
        for i in 0..block.nrows() {
            let v = block[(i, j)];
            if v.norm() > tol {
                out.push((row0 + i, col0 + j, v));
            }
        }
    }
    out
}

/// Pushes a dense `d^2 x d^2` block directly into a `CooMatrix` accumulator at block
/// offset `(row_blk * d2, col_blk * d2)`, dropping entries with magnitude `<= tol`.
pub fn embed_block(
    coo: &mut CooMatrix<Complex64>,
    row_blk: usize,
    col_blk: usize,
    d2: usize,
    block: &DMatrix<Complex64>,
    tol: f64,
) {
    for (r, c, v) in block_triples(row_blk, col_blk, d2, block, tol) {
        coo.push(r, c, v);
    }
}

/// Builds a fresh `CooMatrix` from the triplets of an existing CSC matrix, so new
/// entries can be merged in before re-converting to CSC (duplicates are summed on
/// conversion, per §4.3 step 4 and §5's additive-duplicate rule).
pub fn coo_from_csc(csc: &CscMatrix<Complex64>) -> CooMatrix<Complex64> {
    let mut coo = CooMatrix::new(csc.nrows(), csc.ncols());
    for (r, c, v) in csc.triplet_iter() {
        coo.push(r, c, *v);
    }
    coo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_block_drops_small_entries() {
        let mut coo = CooMatrix::new(4, 4);
        let mut block = DMatrix::from_element(2, 2, Complex64::new(0.0, 0.0));
        block[(0, 0)] = Complex64::new(1e-20, 0.0);
        block[(1, 1)] = Complex64::new(1.0, 0.0);
        embed_block(&mut coo, 0, 0, 2, &block, 1e-14);
        let csc = CscMatrix::from(&coo);
        assert_eq!(csc.nnz(), 1);
    }

    #[test]
    fn embed_block_offsets_by_block_size() {
        let mut coo = CooMatrix::new(8, 8);
        let block = DMatrix::from_element(2, 2, Complex64::new(1.0, 0.0));
        embed_block(&mut coo, 1, 2, 2, &block, 1e-14);
        let csc = CscMatrix::from(&coo);
        let triples: Vec<_> = csc.triplet_iter().map(|(r, c, _)| (r, c)).collect();
        assert!(triples.contains(&(2, 4)));
        assert!(triples.contains(&(3, 5)));
    }
}
