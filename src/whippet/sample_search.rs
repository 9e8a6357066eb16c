/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate rand;

use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;

use crate::whippet::bn_structure::BNStructure;
use crate::whippet::dag_learner::approximated_learning;
use crate::whippet::error::BTWResult;
use crate::whippet::ktree::KTree;
use crate::whippet::optimizer::{validate_treewidth, Optimizer, PARM_TREEWIDTH};
use crate::whippet::ranker::ScoreRanker;

/// The plain sampling strategy: every iteration draws a fresh uniform
/// k-tree and projects it onto a DAG.
pub struct SampleSearch {
    ranker: Arc<dyn ScoreRanker + Send + Sync>,
    nv: usize,
    tw: usize,
    rng: StdRng,
}

impl SampleSearch {
    pub fn new(ranker: Arc<dyn ScoreRanker + Send + Sync>) -> Self {
        let nv = ranker.size();
        SampleSearch {
            ranker,
            nv,
            tw: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixes the randomness source, for reproducible runs.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl Optimizer for SampleSearch {
    fn search(&mut self) -> BNStructure {
        let tk = KTree::uniform_sample(self.nv, self.tw, &mut self.rng);
        let ranker = self.ranker.clone();
        approximated_learning(&tk, ranker.as_ref(), &mut self.rng)
    }

    fn set_default_parameters(&mut self) {
        self.tw = 3;
    }

    fn set_file_parameters(&mut self, parms: &HashMap<String, String>) -> BTWResult<()> {
        if let Some(tw) = parms.get(PARM_TREEWIDTH) {
            self.tw = tw.parse()?;
        }
        Ok(())
    }

    fn validate_parameters(&self) -> BTWResult<()> {
        validate_treewidth(self.nv, self.tw)
    }

    fn print_parameters(&self) {
        log::info!(" ========== ALGORITHM PARAMETERS ========== ");
        log::info!("number of variables: {}", self.nv);
        log::info!("{}: {}", PARM_TREEWIDTH, self.tw);
        log::info!(" ------------------------------------------ ");
    }

    fn treewidth(&self) -> usize {
        self.tw
    }
}
