/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate fxhash;
extern crate ordered_float;
extern crate priority_queue;
extern crate rand;

use fxhash::FxHashMap;
use itertools::Itertools;
use ordered_float::NotNan;
use priority_queue::PriorityQueue;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;

use crate::whippet::bn_structure::BNStructure;
use crate::whippet::dag_learner::approximated_learning;
use crate::whippet::dandelion::{code_distance, CodeDistance, DandelionCode};
use crate::whippet::error::{BTWError, BTWResult};
use crate::whippet::ktree::KTree;
use crate::whippet::mutual_info::MutInfo;
use crate::whippet::optimizer::{
    validate_treewidth, Optimizer, PARM_CODE_DISTANCE, PARM_MUTUAL_INFO, PARM_NUM_TREES,
    PARM_TREEWIDTH,
};
use crate::whippet::ranker::ScoreRanker;
use crate::whippet::varset::Varset;

const DIST_SUM: &str = "sum";
const DIST_DIFF: &str = "diff";

fn gauss_kernel(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

/// The mutual-information guided sampling strategy. Candidate k-trees pass
/// two acceptance gates before they are projected: a diversity gate that
/// rejects codes close to previously accepted ones (Gaussian kernel over
/// code distance) and an informativeness gate on the I-score. Accepted
/// trees are served highest I-score first.
pub struct SelectSampleSearch {
    ranker: Arc<dyn ScoreRanker + Send + Sync>,
    nv: usize,
    tw: usize,
    rng: StdRng,
    num_trees: usize,
    distance_name: String,
    mut_info: Option<MutInfo>,
    // previously accepted codes, for the diversity gate
    prev_codes: Vec<DandelionCode>,
    best_iscore: f64,
    kernel_zero: f64,
    // accepted trees by descending I-score; payloads live in the store
    tk_queue: PriorityQueue<usize, NotNan<f64>>,
    tk_store: FxHashMap<usize, KTree>,
    next_tk: usize,
}

impl SelectSampleSearch {
    pub fn new(ranker: Arc<dyn ScoreRanker + Send + Sync>) -> Self {
        let nv = ranker.size();
        SelectSampleSearch {
            ranker,
            nv,
            tw: 0,
            rng: StdRng::from_entropy(),
            num_trees: 0,
            distance_name: DIST_SUM.to_owned(),
            mut_info: None,
            prev_codes: Vec::new(),
            best_iscore: 0.0,
            kernel_zero: gauss_kernel(0.0),
            tk_queue: PriorityQueue::new(),
            tk_store: FxHashMap::default(),
            next_tk: 0,
        }
    }

    /// Fixes the randomness source, for reproducible runs.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn distance_variant(&self) -> CodeDistance {
        match self.distance_name.as_str() {
            DIST_DIFF => CodeDistance::AbsDiff,
            _ => CodeDistance::Sum,
        }
    }

    /// Samples codes until `num_trees` k-trees pass both acceptance gates.
    fn select_k_trees(&mut self) {
        while self.tk_queue.len() < self.num_trees {
            let code = DandelionCode::sample(self.nv, self.tw, &mut self.rng);
            if !self.accept_code(&code) {
                continue;
            }
            let tk = KTree::from_code(&code, self.nv, self.tw);
            self.prev_codes.push(code);
            let iscore = self.i_score(&tk);
            if !self.accept_tree(iscore) {
                continue;
            }
            let ix = self.next_tk;
            self.next_tk += 1;
            self.tk_store.insert(ix, tk);
            self.tk_queue
                .push(ix, NotNan::new(iscore).expect("I-score is NaN"));
        }
    }

    /// Diversity gate: accept with probability `1 - mean kernel / kernel(0)`
    /// against the previously accepted codes.
    fn accept_code(&mut self, code: &DandelionCode) -> bool {
        if self.prev_codes.is_empty() {
            return true;
        }
        let variant = self.distance_variant();
        let mut q = 0.0;
        for prev in &self.prev_codes {
            q += gauss_kernel(code_distance(code, prev, variant));
        }
        q /= self.prev_codes.len() as f64;
        self.rng.gen::<f64>() < 1.0 - q / self.kernel_zero
    }

    /// Informativeness gate: a new best I-score always passes and raises
    /// the bar; anything else passes with probability `iscore / best`.
    fn accept_tree(&mut self, iscore: f64) -> bool {
        if iscore >= self.best_iscore {
            self.best_iscore = iscore;
            return true;
        }
        self.rng.gen::<f64>() < iscore / self.best_iscore
    }

    /// Scores a k-tree by accumulated pairwise mutual information over the
    /// clique-tree walk, normalized by the best local scores reachable
    /// under the walk's restriction sets.
    fn i_score(&self, tk: &KTree) -> f64 {
        let mut partial: Vec<Option<f64>> = vec![None; self.nv];
        let mut restric = Varset::new(self.nv);
        let mut mi_sum = 0.0;
        self.i_score_node(tk, 0, &mut restric, &mut partial, &mut mi_sum);
        let total: f64 = partial.iter().map(|s| s.unwrap_or(0.0)).sum();
        mi_sum / total.abs()
    }

    fn i_score_node(
        &self,
        tk: &KTree,
        ix: usize,
        restric: &mut Varset,
        partial: &mut Vec<Option<f64>>,
        mi_sum: &mut f64,
    ) {
        let mi = self
            .mut_info
            .as_ref()
            .expect("mutual information matrix was validated");
        let node = tk.node(ix);
        match node.swap() {
            None => {
                for &v in node.clique() {
                    restric.set(v);
                }
                for (u, v) in node.clique().iter().copied().tuple_combinations::<(_, _)>() {
                    *mi_sum += mi.get(u, v);
                }
            }
            Some(swap) => {
                restric.set(swap.var_in);
                restric.clear(swap.var_out);
                for &v in node.clique() {
                    if v != swap.var_in {
                        *mi_sum += mi.get(swap.var_in, v);
                    }
                }
            }
        }
        for &v in node.clique() {
            let (_, score) = self.ranker.best_in(v, restric);
            match partial[v] {
                None => partial[v] = Some(score),
                Some(old) if score > old => partial[v] = Some(score),
                _ => {}
            }
        }
        for &ch in node.children() {
            self.i_score_node(tk, ch, restric, partial, mi_sum);
        }
        if let Some(swap) = node.swap() {
            restric.clear(swap.var_in);
            restric.set(swap.var_out);
        }
    }
}

impl Optimizer for SelectSampleSearch {
    fn search(&mut self) -> BNStructure {
        if self.tk_queue.is_empty() {
            self.select_k_trees();
        }
        let (ix, _) = self.tk_queue.pop().expect("tree queue was refilled");
        let tk = self
            .tk_store
            .remove(&ix)
            .expect("tree stored alongside its queue entry");
        let ranker = self.ranker.clone();
        approximated_learning(&tk, ranker.as_ref(), &mut self.rng)
    }

    fn set_default_parameters(&mut self) {
        self.tw = 3;
        self.num_trees = 1;
        self.distance_name = DIST_SUM.to_owned();
    }

    fn set_file_parameters(&mut self, parms: &HashMap<String, String>) -> BTWResult<()> {
        if let Some(tw) = parms.get(PARM_TREEWIDTH) {
            self.tw = tw.parse()?;
        }
        if let Some(num_trees) = parms.get(PARM_NUM_TREES) {
            self.num_trees = num_trees.parse()?;
        }
        if let Some(name) = parms.get(PARM_CODE_DISTANCE) {
            self.distance_name = name.clone();
        }
        if let Some(path) = parms.get(PARM_MUTUAL_INFO) {
            self.mut_info = Some(MutInfo::from_file(path)?);
        }
        Ok(())
    }

    fn validate_parameters(&self) -> BTWResult<()> {
        validate_treewidth(self.nv, self.tw)?;
        if self.num_trees == 0 {
            return Err(BTWError::new("selected sampling requires num_trees > 0"));
        }
        if self.distance_name != DIST_SUM && self.distance_name != DIST_DIFF {
            return Err(BTWError::Generic(format!(
                "invalid code distance option: '{}'",
                self.distance_name
            )));
        }
        match &self.mut_info {
            None => {
                return Err(BTWError::new(
                    "selected sampling requires a mutual information file",
                ))
            }
            Some(mi) => {
                if mi.nvar() != self.nv {
                    return Err(BTWError::Generic(format!(
                        "mutual information covers {} variables, scores cover {}",
                        mi.nvar(),
                        self.nv
                    )));
                }
            }
        }
        Ok(())
    }

    fn print_parameters(&self) {
        log::info!(" ========== ALGORITHM PARAMETERS ========== ");
        log::info!("number of variables: {}", self.nv);
        log::info!("{}: {}", PARM_TREEWIDTH, self.tw);
        log::info!("{}: {}", PARM_NUM_TREES, self.num_trees);
        log::info!("{}: {}", PARM_CODE_DISTANCE, self.distance_name);
        log::info!(" ------------------------------------------ ");
    }

    fn treewidth(&self) -> usize {
        self.tw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whippet::dandelion::{CharTree, CodePair};
    use crate::whippet::test_utils::FakeRanker;

    fn fixture_search() -> SelectSampleSearch {
        let mut s = SelectSampleSearch::new(Arc::new(FakeRanker { n: 4 }));
        s.set_default_parameters();
        s.tw = 2;
        s.num_trees = 2;
        s.reseed(11);
        let mi = "9.0\n0.10 9.0\n0.20 0.30 9.0\n0.40 0.50 0.60 9.0";
        s.mut_info = Some(MutInfo::read(mi.as_bytes()).unwrap());
        s
    }

    #[test]
    fn test_kernel() {
        let k0 = gauss_kernel(0.0);
        assert!((k0 - 0.3989422804014327).abs() < 1e-12);
        assert!(gauss_kernel(1.0) < k0);
        assert!(gauss_kernel(10.0) < 1e-20);
    }

    #[test]
    fn test_i_score_fixed_tree() {
        let s = fixture_search();
        // root {0, 2, 3} with one child {1, 2, 3} exchanging 1 for 0
        let t = CharTree {
            parent: vec![-1, 0, 0],
            label: vec![-1, -1, -1],
        };
        let tk = KTree::from_char_tree(&t, &[0, 1, 2, 3], 4, 2);
        assert_eq!(tk.root().clique(), &[0, 2, 3]);
        assert_eq!(tk.node(1).clique(), &[1, 2, 3]);

        // root: mi(0,2) + mi(0,3) + mi(2,3) = 1.2, partials 2, 1, 0
        // child: mi(1,2) + mi(1,3) = 0.8, partial for 1 is 2
        // iscore = 2.0 / |2 + 2 + 1 + 0|
        let iscore = s.i_score(&tk);
        assert!((iscore - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_first_code_always_accepted() {
        let mut s = fixture_search();
        let code = DandelionCode {
            q: vec![0, 1],
            s: CodePair {
                p: vec![0],
                l: vec![-1],
            },
        };
        assert!(s.accept_code(&code));
    }

    #[test]
    fn test_search_returns_complete_networks() {
        let mut s = fixture_search();
        for _ in 0..4 {
            let bn = s.search();
            assert_eq!(bn.size(), 4);
            assert!(bn.score() > std::f64::NEG_INFINITY);
        }
        assert!(!s.prev_codes.is_empty());
        assert!(s.best_iscore > 0.0);
    }
}
