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

//! Bath expansion terms: the flat tables of exponentials `{eta_k, gamma_k, Q_k, kind}`
//! the hierarchy assembler consumes. Generating these tables from an analytic bath
//! correlation function (Drude-Lorentz, Lorentz, underdamped, Matsubara/Pade) is out of
//! scope; this module only stores and validates them.

use crate::error::{HeomError, HeomResult};
use crate::superop::{spost, spre};
use crate::types::Statistics;
use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tag distinguishing the five supported bath expansion term kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub enum BathKind {
    /// Bosonic term contributing only through the real part of `eta`.
    BosonReal,
    /// Bosonic term contributing only through the imaginary part of `eta`.
    BosonImag,
    /// Bosonic term contributing through both real and imaginary parts of `eta`.
    BosonRealImag,
    /// Fermionic term that absorbs an excitation from the bath.
    FermionAbsorb,
    /// Fermionic term that emits an excitation into the bath.
    FermionEmit,
}

impl BathKind {
    /// The exchange statistics this kind belongs to.
    pub fn statistics(&self) -> Statistics {
        match self {
            BathKind::BosonReal | BathKind::BosonImag | BathKind::BosonRealImag => {
                Statistics::Boson
            }
            BathKind::FermionAbsorb | BathKind::FermionEmit => Statistics::Fermion,
        }
    }

    /// Whether this kind requires a cross-referenced partner coefficient (the
    /// fermionic absorb/emit pairing of §3.1).
    pub fn requires_partner(&self) -> bool {
        matches!(self, BathKind::FermionAbsorb | BathKind::FermionEmit)
    }
}

/// A single exponential expansion term of a bath correlation function.
///
/// Derived quantities (`spre(Q)`, `spost(Q)`, the commutator superoperator, and for
/// fermionic kinds the daggered-coupling pre/post forms) are computed once at
/// construction and cached, since every hierarchy label that touches this term reuses
/// them unchanged.
#[derive(Debug, Clone)]
pub struct BathTerm {
    kind: BathKind,
    eta: Complex64,
    eta_partner: Option<Complex64>,
    gamma: Complex64,
    op: DMatrix<Complex64>,
    spre_op: DMatrix<Complex64>,
    spost_op: DMatrix<Complex64>,
    spre_dagger: DMatrix<Complex64>,
    spost_dagger: DMatrix<Complex64>,
}

impl BathTerm {
    /// Builds a new expansion term, validating that `op` is square and that fermionic
    /// kinds carry a cross-referenced partner coefficient.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which of the five supported term kinds this is.
    /// * `eta` - The coefficient `eta_k` (for fermionic absorb/emit, this is the
    ///   coefficient of this term specifically: `eta_absorb` for `FermionAbsorb`,
    ///   `eta_emit` for `FermionEmit`).
    /// * `eta_partner` - For fermionic kinds, the cross-referenced partner
    ///   coefficient (`eta_emit` for a `FermionAbsorb` term and vice versa). Must be
    ///   `None` for bosonic kinds.
    /// * `gamma` - The exponential decay rate `gamma_k`.
    /// * `op` - The system-side coupling operator `Q_k`, a `d x d` complex matrix.
    pub fn new(
        kind: BathKind,
        eta: Complex64,
        eta_partner: Option<Complex64>,
        gamma: Complex64,
        op: DMatrix<Complex64>,
    ) -> HeomResult<Self> {
        if op.nrows() != op.ncols() {
            return Err(HeomError::DimensionMismatch {
                context: "BathTerm::op must be square",
                expected: op.nrows(),
                found: op.ncols(),
            });
        }
        if kind.requires_partner() != eta_partner.is_some() {
            return Err(HeomError::DimensionMismatch {
                context: "fermionic bath terms require a cross-referenced eta_partner",
                expected: kind.requires_partner() as usize,
                found: eta_partner.is_some() as usize,
            });
        }
        let spre_op = spre(&op);
        let spost_op = spost(&op);
        let dagger = op.adjoint();
        let spre_dagger = spre(&dagger);
        let spost_dagger = spost(&dagger);
        Ok(BathTerm {
            kind,
            eta,
            eta_partner,
            gamma,
            op,
            spre_op,
            spost_op,
            spre_dagger,
            spost_dagger,
        })
    }

    /// System dimension `d` of the coupling operator.
    pub fn d(&self) -> usize {
        self.op.nrows()
    }

    /// The term's kind.
    pub fn kind(&self) -> BathKind {
        self.kind
    }

    /// The term's own coefficient `eta_k`.
    pub fn eta(&self) -> Complex64 {
        self.eta
    }

    /// The cross-referenced partner coefficient, for fermionic kinds.
    pub fn eta_partner(&self) -> Option<Complex64> {
        self.eta_partner
    }

    /// The exponential rate `gamma_k`.
    pub fn gamma(&self) -> Complex64 {
        self.gamma
    }

    /// The coupling operator `Q_k`.
    pub fn op(&self) -> &DMatrix<Complex64> {
        &self.op
    }

    /// Cached `spre(Q_k)`.
    pub fn spre_op(&self) -> &DMatrix<Complex64> {
        &self.spre_op
    }

    /// Cached `spost(Q_k)`.
    pub fn spost_op(&self) -> &DMatrix<Complex64> {
        &self.spost_op
    }

    /// Cached `spre(Q_k^dagger)`, used by the fermionic "next" gradient.
    pub fn spre_dagger(&self) -> &DMatrix<Complex64> {
        &self.spre_dagger
    }

    /// Cached `spost(Q_k^dagger)`, used by the fermionic "next" gradient.
    pub fn spost_dagger(&self) -> &DMatrix<Complex64> {
        &self.spost_dagger
    }
}

/// The on-the-wire shape of a [`BathTerm`]: only the source fields, never the derived
/// `spre`/`spost`/daggered caches, which `BathTerm::new` recomputes on deserialization
/// rather than trusting a potentially stale serialized copy.
#[derive(Serialize, Deserialize)]
struct BathTermWire {
    kind: BathKind,
    eta: Complex64,
    eta_partner: Option<Complex64>,
    gamma: Complex64,
    op_rows: usize,
    op_cols: usize,
    op_data: Vec<Complex64>,
}

impl Serialize for BathTerm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = BathTermWire {
            kind: self.kind,
            eta: self.eta,
            eta_partner: self.eta_partner,
            gamma: self.gamma,
            op_rows: self.op.nrows(),
            op_cols: self.op.ncols(),
            op_data: self.op.iter().copied().collect(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BathTerm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = BathTermWire::deserialize(deserializer)?;
        let op = DMatrix::from_vec(wire.op_rows, wire.op_cols, wire.op_data);
        BathTerm::new(wire.kind, wire.eta, wire.eta_partner, wire.gamma, op)
            .map_err(serde::de::Error::custom)
    }
}

/// An ordered list of bath expansion terms sharing a common system dimension `d` and
/// exchange statistics.
#[derive(Debug, Clone)]
pub struct Bath {
    statistics: Statistics,
    d: usize,
    terms: Vec<BathTerm>,
}

impl Bath {
    /// Builds a bath from a non-empty list of terms of consistent statistics and
    /// dimension.
    pub fn new(terms: Vec<BathTerm>) -> HeomResult<Self> {
        let first = terms.first().ok_or(HeomError::EmptyBathList)?;
        let statistics = first.kind().statistics();
        let d = first.d();
        for t in &terms {
            if t.kind().statistics() != statistics {
                return Err(HeomError::DimensionMismatch {
                    context: "Bath terms must share exchange statistics",
                    expected: 0,
                    found: 1,
                });
            }
            if t.d() != d {
                return Err(HeomError::DimensionMismatch {
                    context: "Bath terms must share system dimension d",
                    expected: d,
                    found: t.d(),
                });
            }
        }
        Ok(Bath {
            statistics,
            d,
            terms,
        })
    }

    /// Number of expansion terms `K` in this bath.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether this bath carries no terms (always false for a validly constructed `Bath`).
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The shared system dimension `d`.
    pub fn d(&self) -> usize {
        self.d
    }

    /// The shared exchange statistics.
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    /// The ordered list of terms.
    pub fn terms(&self) -> &[BathTerm] {
        &self.terms
    }

    /// Concatenates several baths of the same statistics and dimension into one,
    /// preserving term order (the "CombinedBath" of §3.1).
    pub fn combine(baths: &[Bath]) -> HeomResult<Bath> {
        if baths.is_empty() {
            return Err(HeomError::EmptyBathList);
        }
        let statistics = baths[0].statistics();
        let d = baths[0].d();
        let mut terms = Vec::new();
        for b in baths {
            if b.statistics() != statistics || b.d() != d {
                return Err(HeomError::DimensionMismatch {
                    context: "combined baths must share statistics and dimension",
                    expected: d,
                    found: b.d(),
                });
            }
            terms.extend(b.terms.iter().cloned());
        }
        Bath::new(terms)
    }
}

/// `statistics` and `d` are always derivable from the first term, so only `terms` is
/// serialized; deserialization reconstructs through [`Bath::new`] so the consistency
/// checks run on every deserialized value rather than trusting the wire data.
impl Serialize for Bath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.terms.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let terms = Vec::<BathTerm>::deserialize(deserializer)?;
        Bath::new(terms).map_err(serde::de::Error::custom)
    }
}
