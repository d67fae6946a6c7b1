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

//! Convenience re-exports of the types most callers need.

pub use crate::ado::AdoVector;
pub use crate::bath::{Bath, BathKind, BathTerm};
pub use crate::checkpoint::{CheckpointSink, FileCheckpointSink, ProgressSink};
pub use crate::config::{AssemblyOptions, ExpmOptions, OdeOptions, SolverOptions};
pub use crate::error::{HeomError, HeomResult};
pub use crate::matrix::HeomMatrix;
pub use crate::steady_state::{DenseLuSolver, LinearSolver};
pub use crate::types::{Parity, Statistics};
pub use crate::{
    add_dissipator, evolve, evolve_ode, expect, get_rho, make_heom_boson, make_heom_boson_fermion,
    make_heom_fermion, steady_state, steady_state_with_solver,
};
