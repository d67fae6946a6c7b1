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

use thiserror::Error;

/// Errors that can occur while building or propagating a HEOM superoperator.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum HeomError {
    /// Error when two components that must share a dimension disagree.
    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Where the mismatch was detected.
        context: &'static str,
        /// The dimension required by the rest of the construction.
        expected: usize,
        /// The dimension actually supplied.
        found: usize,
    },
    /// Error when a parity token does not parse to `Even` or `Odd`.
    #[error("'{token}' is not a valid parity (expected \"even\" or \"odd\")")]
    InvalidParity {
        /// The offending token.
        token: String,
    },
    /// Error when a tier is supplied as a negative number.
    #[error("Tier must be non-negative, found {tier}")]
    NegativeTier {
        /// The offending tier.
        tier: i64,
    },
    /// Error when a bath list is empty but at least one bath is required.
    #[error("At least one bath is required for this construction")]
    EmptyBathList,
    /// Error when a hierarchy has zero expansion terms (`K = 0`).
    #[error("Hierarchy has zero expansion terms; at least one is required")]
    ZeroTerms,
    /// Error when a checkpoint sink targets a key or path that already exists.
    #[error("Checkpoint target already exists: {path}")]
    CheckpointAlreadyExists {
        /// The offending path or key.
        path: String,
    },
    /// Error when the truncated Taylor expansion of the propagator did not converge.
    #[error(
        "Matrix exponential failed to reach threshold {threshold:e} within {max_terms} terms (achieved {achieved_error:e})"
    )]
    ExpmDidNotConverge {
        /// The error actually achieved by the truncated series.
        achieved_error: f64,
        /// The requested convergence threshold.
        threshold: f64,
        /// The iteration cap that was hit.
        max_terms: usize,
    },
    /// Error when the ODE integrator exceeds its step budget before reaching the final time point.
    #[error("Integrator exceeded max_steps = {max_steps} before reaching the requested time")]
    IntegratorExceededMaxSteps {
        /// The configured step budget.
        max_steps: usize,
    },
    /// Error when the steady-state solve returns a residual above tolerance.
    #[error("Steady-state residual {residual:e} exceeds tolerance {tolerance:e}")]
    SteadyStateResidualTooLarge {
        /// The residual norm actually achieved.
        residual: f64,
        /// The requested tolerance.
        tolerance: f64,
    },
    /// Error when an ADO vector's parity does not match the `M` it is paired with.
    #[error("ADO vector parity does not match the parity of the HEOM matrix")]
    AdoMatrixParityMismatch,
    /// Error when an ADO vector's length does not match `N_ado * d^2`.
    #[error("ADO vector length mismatch: expected {expected}, found {found}")]
    AdoMatrixSizeMismatch {
        /// Expected length, `N_ado * d^2`.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
    /// Error when writing to a checkpoint sink fails.
    #[error("Checkpoint sink write failed: {source}")]
    SinkWriteFailed {
        /// Underlying error message.
        source: String,
    },
    /// Error when a keyed blob store key is written to twice.
    #[error("Key already exists in store: {key}")]
    KeyAlreadyExists {
        /// The offending key.
        key: String,
    },
}

/// Convenience alias for fallible HEOM operations.
pub type HeomResult<T> = Result<T, HeomError>;
