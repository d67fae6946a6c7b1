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

//! The assembled HEOM superoperator `M` (§3.3).

use crate::hierarchy::LabelEnumerator;
use crate::types::Parity;
use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;
use num_complex::Complex64;

/// The assembled sparse HEOM superoperator, together with the metadata needed to
/// interpret its block structure and to support time-dependent re-assembly (§4.5).
#[derive(Debug, Clone)]
pub struct HeomMatrix {
    pub(crate) data: CscMatrix<Complex64>,
    d: usize,
    n_ado: usize,
    n_ado_boson: usize,
    n_ado_fermion: usize,
    tier_boson: usize,
    tier_fermion: usize,
    parity: Option<Parity>,
    hsys: DMatrix<Complex64>,
    pub(crate) drop_tol: f64,
    boson_labels: Option<LabelEnumerator>,
    fermion_labels: Option<LabelEnumerator>,
}

impl HeomMatrix {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        data: CscMatrix<Complex64>,
        d: usize,
        n_ado_boson: usize,
        n_ado_fermion: usize,
        tier_boson: usize,
        tier_fermion: usize,
        parity: Option<Parity>,
        hsys: DMatrix<Complex64>,
        drop_tol: f64,
        boson_labels: Option<LabelEnumerator>,
        fermion_labels: Option<LabelEnumerator>,
    ) -> Self {
        HeomMatrix {
            data,
            d,
            n_ado: n_ado_boson * n_ado_fermion,
            n_ado_boson,
            n_ado_fermion,
            tier_boson,
            tier_fermion,
            parity,
            hsys,
            drop_tol,
            boson_labels,
            fermion_labels,
        }
    }

    /// System dimension `d`.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Total number of ADOs, `N_ado = N_ado_boson * N_ado_fermion`.
    pub fn n_ado(&self) -> usize {
        self.n_ado
    }

    /// Number of bosonic-sector ADOs.
    pub fn n_ado_boson(&self) -> usize {
        self.n_ado_boson
    }

    /// Number of fermionic-sector ADOs.
    pub fn n_ado_fermion(&self) -> usize {
        self.n_ado_fermion
    }

    /// The bosonic excitation tier.
    pub fn tier_boson(&self) -> usize {
        self.tier_boson
    }

    /// The fermionic excitation tier.
    pub fn tier_fermion(&self) -> usize {
        self.tier_fermion
    }

    /// Parity grading, or `None` for a purely bosonic `M`.
    pub fn parity(&self) -> Option<Parity> {
        self.parity
    }

    /// Shape of the full sparse matrix, `(N_ado * d^2, N_ado * d^2)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.data.nrows(), self.data.ncols())
    }

    /// Number of explicitly stored nonzero entries.
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// The assembled sparse matrix.
    pub fn data(&self) -> &CscMatrix<Complex64> {
        &self.data
    }

    /// The system Hamiltonian used at assembly time, retained so the time-dependent
    /// evolver (§4.5) can recover `L_0 = M.data - lift(L_sys(hsys))`.
    pub fn hsys(&self) -> &DMatrix<Complex64> {
        &self.hsys
    }

    /// The bosonic label table, if this `M` has a bosonic sector.
    pub fn boson_labels(&self) -> Option<&LabelEnumerator> {
        self.boson_labels.as_ref()
    }

    /// The fermionic label table, if this `M` has a fermionic sector.
    pub fn fermion_labels(&self) -> Option<&LabelEnumerator> {
        self.fermion_labels.as_ref()
    }

    /// Combined linear index for a `(idx_boson, idx_fermion)` pair, per §4.3 step 2:
    /// `idx = idx_boson * N_ado_fermion + idx_fermion`.
    pub fn combined_index(&self, idx_boson: usize, idx_fermion: usize) -> usize {
        idx_boson * self.n_ado_fermion + idx_fermion
    }
}
