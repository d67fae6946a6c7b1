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

//! The flat ADO state vector (§3.4).

use crate::error::{HeomError, HeomResult};
use crate::types::Parity;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The flattened auxiliary-density-operator vector paired with a [`crate::matrix::HeomMatrix`].
///
/// Block `b` occupies `data[b*d^2 .. (b+1)*d^2]` and is interpreted column-major as a
/// `d x d` matrix; block `0` (the zero label) is the physical reduced density matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AdoVector {
    data: DVector<Complex64>,
    d: usize,
    n_ado: usize,
    parity: Option<Parity>,
}

impl AdoVector {
    /// Builds an ADO vector from an initial `d x d` density matrix: block 0 is filled
    /// with `rho0`, every other block is zeroed.
    pub fn from_density_matrix(
        rho0: &DMatrix<Complex64>,
        n_ado: usize,
        parity: Option<Parity>,
    ) -> HeomResult<Self> {
        if rho0.nrows() != rho0.ncols() {
            return Err(HeomError::DimensionMismatch {
                context: "initial density matrix must be square",
                expected: rho0.nrows(),
                found: rho0.ncols(),
            });
        }
        let d = rho0.nrows();
        let d2 = d * d;
        let mut data = DVector::from_element(n_ado * d2, Complex64::new(0.0, 0.0));
        for (idx, v) in rho0.iter().enumerate() {
            data[idx] = *v;
        }
        Ok(AdoVector {
            data,
            d,
            n_ado,
            parity,
        })
    }

    /// Wraps a raw flattened vector, validating its length against `n_ado * d^2`.
    pub fn from_raw(
        data: DVector<Complex64>,
        d: usize,
        n_ado: usize,
        parity: Option<Parity>,
    ) -> HeomResult<Self> {
        let expected = n_ado * d * d;
        if data.len() != expected {
            return Err(HeomError::AdoMatrixSizeMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(AdoVector {
            data,
            d,
            n_ado,
            parity,
        })
    }

    /// System dimension `d`.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Number of ADO blocks `N_ado`.
    pub fn n_ado(&self) -> usize {
        self.n_ado
    }

    /// The parity this vector was tagged with, if any.
    pub fn parity(&self) -> Option<Parity> {
        self.parity
    }

    /// The underlying flat data.
    pub fn data(&self) -> &DVector<Complex64> {
        &self.data
    }

    /// Mutable access to the underlying flat data, used only by the evolver.
    pub fn data_mut(&mut self) -> &mut DVector<Complex64> {
        &mut self.data
    }

    /// Reshapes ADO block `b` as a `d x d` matrix (column-major, per §3.4).
    pub fn block(&self, b: usize) -> DMatrix<Complex64> {
        let d = self.d;
        let d2 = d * d;
        let slice = self.data.rows(b * d2, d2);
        DMatrix::from_iterator(d, d, slice.iter().copied())
    }

    /// The physical reduced density matrix, i.e. block `0`.
    pub fn get_rho(&self) -> DMatrix<Complex64> {
        self.block(0)
    }

    /// Validates that this vector's `(d, n_ado, parity)` match the matrix it is about
    /// to be propagated under.
    pub fn check_compatible(
        &self,
        expected_d: usize,
        expected_n_ado: usize,
        expected_parity: Option<Parity>,
    ) -> HeomResult<()> {
        if self.d != expected_d || self.n_ado != expected_n_ado {
            return Err(HeomError::AdoMatrixSizeMismatch {
                expected: expected_n_ado * expected_d * expected_d,
                found: self.data.len(),
            });
        }
        if self.parity != expected_parity {
            return Err(HeomError::AdoMatrixParityMismatch);
        }
        Ok(())
    }
}

/// The on-the-wire shape of an [`AdoVector`]; deserialization round-trips through
/// [`AdoVector::from_raw`] so the length invariant is re-checked rather than trusted.
#[derive(Serialize, Deserialize)]
struct AdoVectorWire {
    d: usize,
    n_ado: usize,
    parity: Option<Parity>,
    data: Vec<Complex64>,
}

impl Serialize for AdoVector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = AdoVectorWire {
            d: self.d,
            n_ado: self.n_ado,
            parity: self.parity,
            data: self.data.iter().copied().collect(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AdoVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = AdoVectorWire::deserialize(deserializer)?;
        let data = DVector::from_vec(wire.data);
        AdoVector::from_raw(data, wire.d, wire.n_ado, wire.parity).map_err(serde::de::Error::custom)
    }
}
