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

//! Small shared value types used across the hierarchy, bath and superoperator modules.

use crate::error::HeomError;
use std::str::FromStr;

/// The grading of an ADO (and of the `M` it belongs to) under fermion exchange.
///
/// `None` is represented separately by [`crate::matrix::HeomMatrix`] (a purely bosonic
/// `M` carries no parity at all); this type only distinguishes the two fermionic
/// gradings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub enum Parity {
    /// Even fermionic grading.
    Even,
    /// Odd fermionic grading.
    Odd,
}

impl Parity {
    /// The sign `(-1)^pi(parity)` used throughout §4.2/§4.3 of the design, with
    /// `pi(Even) = 0`, `pi(Odd) = 1`.
    pub fn sign(&self) -> f64 {
        match self {
            Parity::Even => 1.0,
            Parity::Odd => -1.0,
        }
    }
}

impl FromStr for Parity {
    type Err = HeomError;

    /// Parses a parity token, e.g. one read from a configuration file or CLI flag.
    ///
    /// Used to reproduce the validation behavior a dynamically-typed host would see
    /// when handed an unrecognized parity atom: a native `Parity` argument is already
    /// statically exhaustive, so this is the entry point that can actually fail.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(Parity::Even),
            "odd" => Ok(Parity::Odd),
            other => Err(HeomError::InvalidParity {
                token: other.to_string(),
            }),
        }
    }
}

/// Which exchange statistics a bath's expansion terms follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub enum Statistics {
    /// Bosonic expansion terms: occupation `s_k in [0, tier]`.
    Boson,
    /// Fermionic expansion terms: occupation `s_k in {0, 1}`.
    Fermion,
}
