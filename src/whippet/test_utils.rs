/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
use crate::whippet::ranker::ScoreRanker;
use crate::whippet::varset::Varset;

/// A deterministic ranker for projector and strategy tests: the best
/// parent set in a restriction is the whole restriction (optionally
/// truncated to the cap), and a family scores one point per parent with a
/// higher index than the child.
pub struct FakeRanker {
    pub n: usize,
}

impl ScoreRanker for FakeRanker {
    fn size(&self) -> usize {
        self.n
    }

    fn score_of(&self, v: usize, parents: &Varset) -> f64 {
        parents.dump_as_ints().iter().filter(|&&u| u > v).count() as f64
    }

    fn best_in(&self, v: usize, restric: &Varset) -> (Varset, f64) {
        let parents = restric.clone();
        let score = self.score_of(v, &parents);
        (parents, score)
    }

    fn best_in_lim(&self, v: usize, restric: &Varset, max_pa: usize) -> (Varset, f64) {
        let ints = restric.dump_as_ints();
        let take = ints.len().min(max_pa);
        let parents = Varset::from_ints(self.n, &ints[..take]);
        let score = self.score_of(v, &parents);
        (parents, score)
    }
}

/// The PSS excerpt shared by the cache and ranker tests.
pub const PSS_EXCERPT: &str = "META pss_version = 0.1
META num_variables = 3

VAR A
-2
-9 B
-8 C
-6 B C

VAR B
-9
-9 A
-1 C
-3 A C

VAR C
-10
-10.1 A
-2 B
-1 A B
";
