/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate fxhash;
extern crate rand;

use fxhash::FxHashSet;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::whippet::bn_structure::BNStructure;
use crate::whippet::dag_learner::{InitialDagLearner, RestartedProjection};
use crate::whippet::error::{BTWError, BTWResult};
use crate::whippet::optimizer::{
    validate_treewidth, Optimizer, OP_ASTAR, OP_GREEDY, PARM_INIT_ITERS, PARM_SEARCH_VARIATION,
    PARM_TREEWIDTH,
};
use crate::whippet::ranker::ScoreRanker;
use crate::whippet::record::{Record, RecordHeap};
use crate::whippet::varset::Varset;

const DEFAULT_INIT_ITERS: usize = 50;

/// The iterative extension strategy: learn an exact-ish DAG over the first
/// k+1 variables of a sampled ordering, then extend it one variable at a
/// time, either greedily or with A*. Orderings whose tail was already
/// tried are rejected so that restarts explore new ground.
pub struct IterativeSearch {
    ranker: Arc<dyn ScoreRanker + Send + Sync>,
    nv: usize,
    tw: usize,
    rng: StdRng,
    variation: String,
    init_iters: usize,
    initial_learner: Box<dyn InitialDagLearner>,
    // literal tail sequences ord[tw+1..] sampled so far
    prev_tails: FxHashSet<Vec<usize>>,
}

impl IterativeSearch {
    pub fn new(ranker: Arc<dyn ScoreRanker + Send + Sync>) -> Self {
        let nv = ranker.size();
        IterativeSearch {
            ranker,
            nv,
            tw: 0,
            rng: StdRng::from_entropy(),
            variation: OP_GREEDY.to_owned(),
            init_iters: DEFAULT_INIT_ITERS,
            initial_learner: Box::new(RestartedProjection::new(DEFAULT_INIT_ITERS)),
            prev_tails: FxHashSet::default(),
        }
    }

    /// Fixes the randomness source, for reproducible runs.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.initial_learner = Box::new(RestartedProjection::with_seed(
            self.init_iters,
            seed.wrapping_add(1),
        ));
    }

    /// Swaps in another initial-DAG learner (e.g. an exact solver bridge).
    pub fn set_initial_learner(&mut self, learner: Box<dyn InitialDagLearner>) {
        self.initial_learner = learner;
    }

    /// Samples a full ordering of the variables, rejecting any whose tail
    /// `ord[tw+1..]` has been sampled before.
    fn sample_order(&mut self) -> Vec<usize> {
        loop {
            let mut ord: Vec<usize> = (0..self.nv).collect();
            ord.shuffle(&mut self.rng);
            let tail = ord[self.tw + 1..].to_vec();
            if self.prev_tails.insert(tail) {
                return ord;
            }
        }
    }

    /// Extends the initial DAG over `ord[tw+1..]` greedily: each variable
    /// takes the best capped parent set found in any accumulated clique,
    /// and its parents plus itself open a new clique.
    fn greedy_extension(&self, bn: &mut BNStructure, ord: &[usize]) {
        let mut cliques = vec![Varset::from_ints(self.nv, &ord[..self.tw + 1])];
        for &v in &ord[self.tw + 1..] {
            let mut best: Option<(Varset, f64)> = None;
            for clique in &cliques {
                let (pset, score) = self.ranker.best_in_lim(v, clique, self.tw);
                if best.as_ref().map_or(true, |(_, b)| score > *b) {
                    best = Some((pset, score));
                }
            }
            let (pset, score) = best.expect("at least one clique is accumulated");
            let mut opened = pset.clone();
            opened.set(v);
            bn.set_parents(v, pset, score);
            cliques.push(opened);
        }
    }

    /// Extends the initial DAG with best-first search over placements of
    /// the remaining variables. For each accumulated clique C and member u,
    /// the next variable v may take its parents from C minus u, opening
    /// C minus u plus v as the new frontier clique. The heuristic adds each
    /// remaining variable's best score unconstrained by cliques, an
    /// admissible bound, so the first goal popped is optimal for the
    /// ordering.
    fn astar_extension(&self, bn: &mut BNStructure, ord: &[usize]) {
        let n = self.nv;
        let tw = self.tw;

        let mut hval = vec![0.0f64; n + 1];
        let mut restric = Varset::from_ints(n, ord);
        for i in (tw + 1..n).rev() {
            restric.clear(ord[i]);
            let (_, score) = self.ranker.best_in(ord[i], &restric);
            hval[i] = score + hval[i + 1];
        }

        let g0: f64 = ord[..tw + 1].iter().map(|&v| bn.local_score(v)).sum();
        let start = Rc::new(SearchNode {
            state: ProblemState {
                next: tw + 1,
                cliques: vec![Varset::from_ints(n, &ord[..tw + 1])],
                step: None,
            },
            parent: None,
            g: g0,
        });
        let mut open = RecordHeap::min();
        open.push(Record::new(-(g0 + hval[tw + 1]), start));

        while let Some(record) = open.pop() {
            let node = record.into_payload();
            if node.state.next >= n {
                let mut walker: &SearchNode = &node;
                loop {
                    if let Some(step) = &walker.state.step {
                        bn.set_parents(step.v, step.parents.clone(), step.score);
                    }
                    match &walker.parent {
                        Some(parent) => walker = parent.as_ref(),
                        None => return,
                    }
                }
            }
            let v = ord[node.state.next];
            for clique in &node.state.cliques {
                for u in clique.dump_as_ints() {
                    let mut pool = clique.clone();
                    pool.clear(u);
                    let (pset, score) = self.ranker.best_in(v, &pool);
                    let mut frontier = pool;
                    frontier.set(v);
                    let mut cliques = Vec::with_capacity(node.state.cliques.len() + 1);
                    cliques.push(frontier);
                    cliques.extend(node.state.cliques.iter().cloned());
                    let g = node.g + score;
                    open.push(Record::new(
                        -(g + hval[node.state.next + 1]),
                        Rc::new(SearchNode {
                            state: ProblemState {
                                next: node.state.next + 1,
                                cliques,
                                step: Some(Step {
                                    v,
                                    parents: pset,
                                    score,
                                }),
                            },
                            parent: Some(node.clone()),
                            g,
                        }),
                    ));
                }
            }
        }
        unreachable!("a-star open list drained before reaching a goal state");
    }
}

struct Step {
    v: usize,
    parents: Varset,
    score: f64,
}

struct ProblemState {
    // index into the ordering of the next variable to place
    next: usize,
    // accumulated cliques, frontier first
    cliques: Vec<Varset>,
    step: Option<Step>,
}

struct SearchNode {
    state: ProblemState,
    parent: Option<Rc<SearchNode>>,
    g: f64,
}

impl Optimizer for IterativeSearch {
    fn search(&mut self) -> BNStructure {
        let ord = self.sample_order();
        let ranker = self.ranker.clone();
        let mut bn = self
            .initial_learner
            .initial_dag(&ord[..self.tw + 1], ranker.as_ref());
        if self.variation == OP_ASTAR {
            self.astar_extension(&mut bn, &ord);
        } else {
            self.greedy_extension(&mut bn, &ord);
        }
        bn
    }

    fn set_default_parameters(&mut self) {
        self.tw = 3;
        self.variation = OP_GREEDY.to_owned();
        self.init_iters = DEFAULT_INIT_ITERS;
    }

    fn set_file_parameters(&mut self, parms: &HashMap<String, String>) -> BTWResult<()> {
        if let Some(tw) = parms.get(PARM_TREEWIDTH) {
            self.tw = tw.parse()?;
        }
        if let Some(variation) = parms.get(PARM_SEARCH_VARIATION) {
            self.variation = variation.clone();
        }
        if let Some(init_iters) = parms.get(PARM_INIT_ITERS) {
            self.init_iters = init_iters.parse()?;
            self.initial_learner = Box::new(RestartedProjection::new(self.init_iters));
        }
        Ok(())
    }

    fn validate_parameters(&self) -> BTWResult<()> {
        validate_treewidth(self.nv, self.tw)?;
        if self.variation != OP_GREEDY && self.variation != OP_ASTAR {
            return Err(BTWError::Generic(format!(
                "invalid search variation option: '{}'",
                self.variation
            )));
        }
        if self.init_iters == 0 {
            return Err(BTWError::new("iterative search requires init_iters > 0"));
        }
        Ok(())
    }

    fn print_parameters(&self) {
        log::info!(" ========== ALGORITHM PARAMETERS ========== ");
        log::info!("number of variables: {}", self.nv);
        log::info!("{}: {}", PARM_TREEWIDTH, self.tw);
        log::info!("{}: '{}'", PARM_SEARCH_VARIATION, self.variation);
        log::info!("{}: {}", PARM_INIT_ITERS, self.init_iters);
        log::info!(" ------------------------------------------ ");
    }

    fn treewidth(&self) -> usize {
        self.tw
    }
}
