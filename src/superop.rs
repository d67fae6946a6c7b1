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

//! Lifting of `d x d` system operators to the `d^2 x d^2` vectorised (Liouville) space.
//!
//! Vectorisation is column-major throughout: `vec(A X B) = (B^T kron A) vec(X)`, so left
//! multiplication by `A` lifts to `spre(A) = I kron A` and right multiplication by `A`
//! lifts to `spost(A) = A^T kron I`.

use nalgebra::DMatrix;
use num_complex::Complex64;

/// The Kronecker product of two dense matrices.
///
/// `kron(a, b)[(i * b.nrows() + k, j * b.ncols() + l)] = a[(i, j)] * b[(k, l)]`.
pub fn kron(a: &DMatrix<Complex64>, b: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    let (ar, ac) = a.shape();
    let (br, bc) = b.shape();
    let mut out = DMatrix::from_element(ar * br, ac * bc, Complex64::new(0.0, 0.0));
    for j in 0..ac {
        for i in 0..ar {
            let aij = a[(i, j)];
            if aij == Complex64::new(0.0, 0.0) {
                continue;
            }
            for l in 0..bc {
                for k in 0..br {
                    out[(i * br + k, j * bc + l)] += aij * b[(k, l)];
                }
            }
        }
    }
    out
}

/// Left multiplication lifted to the vectorised space: `spre(A) = I_d kron A`.
pub fn spre(a: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    let d = a.nrows();
    let eye = DMatrix::identity(d, d);
    kron(&eye, a)
}

/// Right multiplication lifted to the vectorised space: `spost(A) = A^T kron I_d`.
pub fn spost(a: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    let d = a.nrows();
    let eye = DMatrix::identity(d, d);
    kron(&a.transpose(), &eye)
}

/// The commutator superoperator `[A, .] = spre(A) - spost(A)`.
pub fn commutator_super(a: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    spre(a) - spost(a)
}

/// The system Liouvillian `L_sys = -i (spre(H) - spost(H))`.
pub fn system_liouvillian(h: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    let minus_i = Complex64::new(0.0, -1.0);
    commutator_super(h) * minus_i
}

/// Lindblad dissipator superoperator for a single jump operator `J`:
/// `spre(J) * spost(J^dagger) - 1/2 spre(J^dagger J) - 1/2 spost(J^dagger J)`.
pub fn lindblad_super(j: &DMatrix<Complex64>) -> DMatrix<Complex64> {
    let jd = j.adjoint();
    let jdj = &jd * j;
    let half = Complex64::new(0.5, 0.0);
    spre(j) * spost(&jd) - spre(&jdj) * half - spost(&jdj) * half
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(d: usize) -> DMatrix<Complex64> {
        DMatrix::identity(d, d)
    }

    #[test]
    fn spre_of_identity_is_identity() {
        let i2 = id(2);
        let s = spre(&i2);
        assert_eq!(s, id(4));
    }

    #[test]
    fn spost_of_identity_is_identity() {
        let i2 = id(2);
        let s = spost(&i2);
        assert_eq!(s, id(4));
    }

    #[test]
    fn commutator_of_identity_vanishes() {
        let i2 = id(2);
        let c = commutator_super(&i2);
        for v in c.iter() {
            assert!(v.norm() < 1e-12);
        }
    }

    #[test]
    fn kron_shape_is_product() {
        let a = DMatrix::from_element(2, 3, Complex64::new(1.0, 0.0));
        let b = DMatrix::from_element(4, 5, Complex64::new(1.0, 0.0));
        let k = kron(&a, &b);
        assert_eq!(k.shape(), (8, 15));
    }

    #[test]
    fn system_liouvillian_is_anti_hermitian_generator() {
        // For Hermitian H, L_sys should satisfy L_sys^dagger = -L_sys (it generates
        // unitary evolution of a Hermitian density matrix).
        let h = DMatrix::from_row_slice(
            2,
            2,
            &[
                Complex64::new(0.6969, 0.0),
                Complex64::new(0.4364, 0.0),
                Complex64::new(0.4364, 0.0),
                Complex64::new(0.3215, 0.0),
            ],
        );
        let l = system_liouvillian(&h);
        let sum = &l + l.adjoint();
        for v in sum.iter() {
            assert!(v.norm() < 1e-10);
        }
    }
}
