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

//! Enumeration of ADO hierarchy labels and the label <-> linear index bijection.

use crate::error::{HeomError, HeomResult};
use std::collections::HashMap;
use tinyvec::TinyVec;

/// A hierarchy label: a non-negative integer vector bounded componentwise by `dims`
/// and in total by the excitation tier. Backed by a `TinyVec` since `K` (the number of
/// bath expansion terms) is almost always small.
pub type Label = TinyVec<[u16; 8]>;

/// Enumerates every valid label in the canonical order of §4.1: starting from the zero
/// label, the rightmost coordinate is incremented repeatedly; when it would exceed its
/// bound in `dims`, or the running total would exceed `tier`, it is reset to zero and
/// the carry moves one coordinate to the left.
///
/// `dims[k]` is the exclusive upper bound on `s_k` (so bosonic terms pass `tier + 1`
/// and fermionic terms pass `2`). `K = dims.len()` must be at least 1.
pub fn enumerate_labels(dims: &[usize], tier: usize) -> HeomResult<Vec<Label>> {
    if dims.is_empty() {
        return Err(HeomError::ZeroTerms);
    }
    for (k, &dim) in dims.iter().enumerate() {
        if dim == 0 {
            return Err(HeomError::DimensionMismatch {
                context: "hierarchy dims[k] must be at least 1",
                expected: 1,
                found: dim,
            });
        }
        let _ = k;
    }
    let mut out = Vec::new();
    let mut current: Label = std::iter::repeat(0u16).take(dims.len()).collect();
    enumerate_rec(0, tier, dims, &mut current, &mut out);
    Ok(out)
}

fn enumerate_rec(pos: usize, remaining_tier: usize, dims: &[usize], current: &mut Label, out: &mut Vec<Label>) {
    if pos == dims.len() {
        out.push(current.clone());
        return;
    }
    let max_here = (dims[pos] - 1).min(remaining_tier);
    for s in 0..=max_here {
        current[pos] = s as u16;
        enumerate_rec(pos + 1, remaining_tier - s, dims, current, out);
    }
    current[pos] = 0;
}

/// Bundles the enumerated label list with the reverse `label -> idx` lookup, so the
/// bijection (and hence `N_ado`) is fixed once and reused for the lifetime of an `M`.
#[derive(Debug, Clone)]
pub struct LabelEnumerator {
    dims: Vec<usize>,
    tier: usize,
    idx2label: Vec<Label>,
    label2idx: HashMap<Label, usize>,
}

impl LabelEnumerator {
    /// Enumerates labels for the given per-term dimension bounds and tier.
    pub fn new(dims: Vec<usize>, tier: usize) -> HeomResult<Self> {
        let idx2label = enumerate_labels(&dims, tier)?;
        let label2idx = idx2label
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Ok(LabelEnumerator {
            dims,
            tier,
            idx2label,
            label2idx,
        })
    }

    /// Number of valid labels, `N_ado`.
    pub fn len(&self) -> usize {
        self.idx2label.len()
    }

    /// Whether the enumeration is empty (never true for a validly constructed hierarchy,
    /// since the zero label is always valid).
    pub fn is_empty(&self) -> bool {
        self.idx2label.is_empty()
    }

    /// Number of expansion terms `K`.
    pub fn k(&self) -> usize {
        self.dims.len()
    }

    /// The excitation tier `T`.
    pub fn tier(&self) -> usize {
        self.tier
    }

    /// The per-term dimension bounds.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Looks up the label at a linear index.
    pub fn idx2label(&self, idx: usize) -> Option<&Label> {
        self.idx2label.get(idx)
    }

    /// Looks up the linear index of a label.
    pub fn label2idx(&self, label: &Label) -> Option<usize> {
        self.label2idx.get(label).copied()
    }

    /// Iterates all `(idx, label)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Label)> {
        self.idx2label.iter().enumerate()
    }
}

/// Sum of occupations strictly left of position `k` in `label`, i.e. `n_before` in §4.2.
pub fn n_before(label: &Label, k: usize) -> usize {
    label[..k].iter().map(|&s| s as usize).sum()
}

/// Total occupation `Sum s_k` of a label.
pub fn total_occupation(label: &Label) -> usize {
    label.iter().map(|&s| s as usize).sum()
}

/// The label reached by incrementing component `k` of `label` by one (the "next"
/// neighbour, `label + e_k`).
pub fn step_up(label: &Label, k: usize) -> Label {
    let mut next = label.clone();
    next[k] += 1;
    next
}

/// The label reached by decrementing component `k` of `label` by one (the "prev"
/// neighbour, `label - e_k`). Panics if `label[k] == 0`; callers must check `s_k >= 1`
/// first, as specified in §4.3.
pub fn step_down(label: &Label, k: usize) -> Label {
    let mut prev = label.clone();
    prev[k] -= 1;
    prev
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(vec![4, 4, 4, 4, 4], 3, 56; "five terms tier three")]
    #[test_case(vec![2, 2, 2, 2], 4, 16; "four fermionic terms")]
    #[test_case(vec![5], 0, 1; "single term tier zero")]
    #[test_case(vec![5], 4, 5; "single term dims bound binds")]
    fn enumerated_count_matches_expected(dims: Vec<usize>, tier: usize, expected: usize) {
        let labels = enumerate_labels(&dims, tier).unwrap();
        assert_eq!(labels.len(), expected);
    }

    fn binomial(n: u64, k: u64) -> u64 {
        if k > n {
            return 0;
        }
        let k = k.min(n - k);
        let mut result: u64 = 1;
        for i in 0..k {
            result = result * (n - i) / (i + 1);
        }
        result
    }

    fn unbounded_count(num_terms: u64, tier: u64) -> u64 {
        (0..=tier)
            .map(|n| binomial(n + num_terms - 1, num_terms - 1))
            .sum()
    }

    #[test]
    fn zero_terms_rejected() {
        assert_eq!(
            enumerate_labels(&[], 3).unwrap_err(),
            HeomError::ZeroTerms
        );
    }

    #[test]
    fn tier_zero_yields_single_label() {
        let labels = enumerate_labels(&[4, 4, 4], 0).unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].iter().all(|&s| s == 0));
    }

    #[test]
    fn untruncated_count_matches_closed_form() {
        // dims large enough that the dims bound never binds: dims[k] = T + 1.
        let k = 5usize;
        let t = 3usize;
        let dims = vec![t + 1; k];
        let labels = enumerate_labels(&dims, t).unwrap();
        assert_eq!(labels.len() as u64, unbounded_count(k as u64, t as u64));
        assert_eq!(labels.len(), 56);
    }

    #[test]
    fn fermion_style_count() {
        // dims = [2,2,2,2], T = 4: dims bound binds (fermionic occupation <= 1),
        // so this must be fewer than the unbounded closed form (35) and equal to 2^4=16
        // since tier=4 never actually restricts a 4-mode, max-sum-4 fermionic label.
        let dims = vec![2, 2, 2, 2];
        let labels = enumerate_labels(&dims, 4).unwrap();
        assert_eq!(labels.len(), 16);
    }

    #[test]
    fn bijection_round_trips() {
        let dims = vec![4, 4, 4, 4, 4];
        let en = LabelEnumerator::new(dims, 3).unwrap();
        for idx in 0..en.len() {
            let label = en.idx2label(idx).unwrap().clone();
            assert_eq!(en.label2idx(&label), Some(idx));
        }
    }

    #[test]
    fn canonical_order_increments_rightmost_fastest() {
        let labels = enumerate_labels(&[3, 3], 3).unwrap();
        let expected: Vec<Label> = vec![
            [0u16, 0].into_iter().collect(),
            [0, 1].into_iter().collect(),
            [0, 2].into_iter().collect(),
            [1, 0].into_iter().collect(),
            [1, 1].into_iter().collect(),
            [1, 2].into_iter().collect(),
            [2, 0].into_iter().collect(),
            [2, 1].into_iter().collect(),
        ];
        assert_eq!(labels, expected);
    }

    #[test]
    fn n_before_sums_prefix() {
        let label: Label = [2u16, 0, 1, 3].into_iter().collect();
        assert_eq!(n_before(&label, 0), 0);
        assert_eq!(n_before(&label, 2), 2);
        assert_eq!(n_before(&label, 4), 6);
    }
}
