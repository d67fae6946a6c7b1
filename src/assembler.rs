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

//! The hierarchy assembler (§4.3): builds the sparse `M.data` from a system
//! Hamiltonian, up to one bosonic and one fermionic bath, and the hierarchy tiers.
//!
//! The outer loop over source labels is embarrassingly parallel (§5): each rayon
//! worker computes its own partition of `(row, col, value)` triples for the labels it
//! is handed, and partitions are concatenated and reduced to CSC once, with no locking
//! during emission.

use crate::bath::Bath;
use crate::config::AssemblyOptions;
use crate::error::{HeomError, HeomResult};
use crate::gradients::{bosonic_next_grad, bosonic_prev_grad, fermionic_next_grad, fermionic_prev_grad};
use crate::hierarchy::{n_before, step_down, step_up, total_occupation, LabelEnumerator};
use crate::matrix::HeomMatrix;
use crate::sparse::block_triples;
use crate::superop::system_liouvillian;
use crate::types::Parity;
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use num_complex::Complex64;
use rayon::prelude::*;

/// Assembles the HEOM superoperator from a (possibly absent) bosonic bath and a
/// (possibly absent) fermionic bath. At least one of the two must be present.
#[allow(clippy::too_many_arguments)]
pub fn build_heom(
    hsys: DMatrix<Complex64>,
    boson_bath: Option<&Bath>,
    fermion_bath: Option<&Bath>,
    tier_boson: usize,
    tier_fermion: usize,
    parity: Option<Parity>,
    opts: &AssemblyOptions,
) -> HeomResult<HeomMatrix> {
    if hsys.nrows() != hsys.ncols() {
        return Err(HeomError::DimensionMismatch {
            context: "Hsys must be square",
            expected: hsys.nrows(),
            found: hsys.ncols(),
        });
    }
    let d = hsys.nrows();
    if boson_bath.is_none() && fermion_bath.is_none() {
        return Err(HeomError::EmptyBathList);
    }
    if let Some(b) = boson_bath {
        if b.d() != d {
            return Err(HeomError::DimensionMismatch {
                context: "boson bath coupling operators must match Hsys dimension",
                expected: d,
                found: b.d(),
            });
        }
    }
    if let Some(b) = fermion_bath {
        if b.d() != d {
            return Err(HeomError::DimensionMismatch {
                context: "fermion bath coupling operators must match Hsys dimension",
                expected: d,
                found: b.d(),
            });
        }
        if parity.is_none() {
            return Err(HeomError::InvalidParity {
                token: "none (fermionic hierarchy requires Even or Odd)".to_string(),
            });
        }
    } else if parity.is_some() {
        return Err(HeomError::InvalidParity {
            token: "some (purely bosonic hierarchy must not carry a parity)".to_string(),
        });
    }

    let boson_labels = match boson_bath {
        Some(b) => Some(LabelEnumerator::new(vec![tier_boson + 1; b.len()], tier_boson)?),
        None => None,
    };
    let fermion_labels = match fermion_bath {
        Some(b) => Some(LabelEnumerator::new(vec![2; b.len()], tier_fermion)?),
        None => None,
    };

    let n_ado_boson = boson_labels.as_ref().map(|e| e.len()).unwrap_or(1);
    let n_ado_fermion = fermion_labels.as_ref().map(|e| e.len()).unwrap_or(1);
    let d2 = d * d;
    let l_sys = system_liouvillian(&hsys);

    if opts.verbose {
        tracing::info!(
            n_ado_boson,
            n_ado_fermion,
            d,
            "assembling HEOM hierarchy"
        );
    }

    let indices: Vec<(usize, usize)> = (0..n_ado_boson)
        .flat_map(|ib| (0..n_ado_fermion).map(move |ifr| (ib, ifr)))
        .collect();

    let assemble_one = |&(idx_b, idx_f): &(usize, usize)| -> Vec<(usize, usize, Complex64)> {
        let idx = idx_b * n_ado_fermion + idx_f;
        let mut triples = Vec::new();

        let label_b = boson_labels.as_ref().map(|e| e.idx2label(idx_b).unwrap());
        let label_f = fermion_labels.as_ref().map(|e| e.idx2label(idx_f).unwrap());

        // Diagonal block: L_sys - (sum_k s_k * gamma_k) * I.
        let mut sum_gamma = Complex64::new(0.0, 0.0);
        if let (Some(b), Some(label)) = (boson_bath, label_b) {
            for (k, term) in b.terms().iter().enumerate() {
                let s_k = label[k] as usize;
                if s_k >= 1 {
                    sum_gamma += Complex64::new(s_k as f64, 0.0) * term.gamma();
                }
            }
        }
        if let (Some(b), Some(label)) = (fermion_bath, label_f) {
            for (k, term) in b.terms().iter().enumerate() {
                let s_k = label[k] as usize;
                if s_k >= 1 {
                    sum_gamma += Complex64::new(s_k as f64, 0.0) * term.gamma();
                }
            }
        }
        let diag = &l_sys - DMatrix::identity(d2, d2) * sum_gamma;
        triples.extend(block_triples(idx, idx, d2, &diag, opts.drop_tol));

        // Bosonic off-diagonal neighbours.
        if let (Some(b), Some(enum_b), Some(label)) = (boson_bath, boson_labels.as_ref(), label_b) {
            let total_b = total_occupation(label);
            for (k, term) in b.terms().iter().enumerate() {
                let s_k = label[k] as usize;
                if s_k >= 1 {
                    let prev_label = step_down(label, k);
                    let prev_idx_b = enum_b.label2idx(&prev_label).expect("prev boson label must be valid");
                    let prev_idx = prev_idx_b * n_ado_fermion + idx_f;
                    let block = bosonic_prev_grad(term, s_k);
                    triples.extend(block_triples(idx, prev_idx, d2, &block, opts.drop_tol));
                }
                if total_b < tier_boson && s_k + 1 < enum_b.dims()[k] {
                    let next_label = step_up(label, k);
                    let next_idx_b = enum_b.label2idx(&next_label).expect("next boson label must be valid");
                    let next_idx = next_idx_b * n_ado_fermion + idx_f;
                    let block = bosonic_next_grad(term);
                    triples.extend(block_triples(idx, next_idx, d2, &block, opts.drop_tol));
                }
            }
        }

        // Fermionic off-diagonal neighbours.
        if let (Some(b), Some(enum_f), Some(label)) = (fermion_bath, fermion_labels.as_ref(), label_f) {
            let total_f = total_occupation(label);
            let p = parity.expect("fermionic hierarchy always carries a parity");
            for (k, term) in b.terms().iter().enumerate() {
                let s_k = label[k] as usize;
                let nb = n_before(label, k);
                if s_k >= 1 {
                    let prev_label = step_down(label, k);
                    let prev_idx_f = enum_f.label2idx(&prev_label).expect("prev fermion label must be valid");
                    let prev_idx = idx_b * n_ado_fermion + prev_idx_f;
                    let block = fermionic_prev_grad(term, p, nb, total_f);
                    triples.extend(block_triples(idx, prev_idx, d2, &block, opts.drop_tol));
                }
                if total_f < tier_fermion && s_k + 1 < enum_f.dims()[k] {
                    let next_label = step_up(label, k);
                    let next_idx_f = enum_f.label2idx(&next_label).expect("next fermion label must be valid");
                    let next_idx = idx_b * n_ado_fermion + next_idx_f;
                    let block = fermionic_next_grad(term, p, nb, total_f);
                    triples.extend(block_triples(idx, next_idx, d2, &block, opts.drop_tol));
                }
            }
        }

        triples
    };

    let partitions: Vec<Vec<(usize, usize, Complex64)>> = if let Some(n) = opts.num_threads {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| HeomError::SinkWriteFailed {
                source: e.to_string(),
            })?;
        pool.install(|| indices.par_iter().map(assemble_one).collect())
    } else {
        indices.par_iter().map(assemble_one).collect()
    };

    let total_dim = n_ado_boson * n_ado_fermion * d2;
    let mut coo = CooMatrix::new(total_dim, total_dim);
    for partition in partitions {
        for (r, c, v) in partition {
            coo.push(r, c, v);
        }
    }
    let data = CscMatrix::from(&coo);

    if opts.verbose {
        tracing::info!(nnz = data.nnz(), "HEOM hierarchy assembled");
    }

    Ok(HeomMatrix::new(
        data,
        d,
        n_ado_boson,
        n_ado_fermion,
        tier_boson,
        tier_fermion,
        parity,
        hsys,
        opts.drop_tol,
        boson_labels,
        fermion_labels,
    ))
}
