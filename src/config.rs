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

//! Small `Default`-deriving option structs carrying the tolerances named in §4.5/§4.6.

/// Options controlling parallel hierarchy assembly (§4.3, §5).
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Number of rayon worker threads to use; `None` uses rayon's global pool default.
    pub num_threads: Option<usize>,
    /// Magnitude below which an assembled block entry is dropped rather than stored.
    pub drop_tol: f64,
    /// Whether to emit `tracing` progress events while assembling.
    pub verbose: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        AssemblyOptions {
            num_threads: None,
            drop_tol: 1e-14,
            verbose: false,
        }
    }
}

/// Options for the truncated-Taylor-series matrix-exponential propagator (§4.5a).
#[derive(Debug, Clone)]
pub struct ExpmOptions {
    /// Series truncation threshold `tau`: the last Taylor term's norm, relative to the
    /// initial state norm, must fall below this before the series is accepted.
    pub threshold: f64,
    /// Magnitude below which intermediate block entries are dropped.
    pub nonzero_tol: f64,
    /// Hard cap on the number of Taylor terms per step, guarding against a
    /// non-converging series.
    pub max_terms: usize,
}

impl Default for ExpmOptions {
    fn default() -> Self {
        ExpmOptions {
            threshold: 1e-6,
            nonzero_tol: 1e-14,
            max_terms: 200,
        }
    }
}

/// Options for the externally-driven ODE integration path (§4.5b).
#[derive(Debug, Clone)]
pub struct OdeOptions {
    /// Relative error tolerance.
    pub rtol: f64,
    /// Absolute error tolerance.
    pub atol: f64,
    /// Maximum number of integrator steps before `IntegratorExceededMaxSteps`.
    pub max_steps: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        OdeOptions {
            rtol: 1e-6,
            atol: 1e-8,
            max_steps: 100_000,
        }
    }
}

/// Options for the steady-state linear solve (§4.6).
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Residual tolerance above which `SteadyStateResidualTooLarge` is raised.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions { tolerance: 1e-10 }
    }
}
