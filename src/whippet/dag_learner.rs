/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate rand;

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::whippet::bn_structure::BNStructure;
use crate::whippet::ktree::KTree;
use crate::whippet::ranker::ScoreRanker;
use crate::whippet::varset::Varset;

/// A clique ordering split into an already-placed prefix (`vars[..ini]`,
/// inherited from the parent clique) and a suffix of variables whose
/// parents are still to be assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialOrder {
    pub vars: Vec<usize>,
    pub ini: usize,
}

/// Learns a DAG from a k-tree approximately: every variable starts with the
/// empty family, then each sampled partial order may upgrade the variables
/// in its suffix to the best parent set drawn from the variables placed
/// before them. The per-clique orders are consistent with the clique-tree
/// walk, which keeps the result acyclic.
pub fn approximated_learning(
    tk: &KTree,
    ranker: &dyn ScoreRanker,
    rng: &mut impl Rng,
) -> BNStructure {
    let n = ranker.size();
    let mut bn = BNStructure::new(n);
    let empty = Varset::new(n);
    for x in 0..n {
        bn.set_parents(x, empty.clone(), ranker.score_of(x, &empty));
    }
    for order in sample_partial_orders(tk, rng) {
        set_parents_from_order(&order, ranker, &mut bn);
    }
    bn
}

/// Samples one partial order per clique: a shuffle of the root clique, then
/// recursively for each child a copy of its parent's order with `var_out`
/// removed and `var_in` inserted at a random position. Everything before
/// the insertion point is inherited and stays fixed.
pub fn sample_partial_orders(tk: &KTree, rng: &mut impl Rng) -> Vec<PartialOrder> {
    let mut orders = Vec::with_capacity(tk.len());
    let mut root_vars = tk.root().clique().to_vec();
    root_vars.shuffle(rng);
    orders.push(PartialOrder {
        vars: root_vars,
        ini: 0,
    });
    sample_children_orders(tk, 0, 0, rng, &mut orders);
    orders
}

fn sample_children_orders(
    tk: &KTree,
    node_ix: usize,
    order_ix: usize,
    rng: &mut impl Rng,
    orders: &mut Vec<PartialOrder>,
) {
    for &ch in tk.node(node_ix).children() {
        let swap = tk.node(ch).swap().expect("non-root node carries a swap");
        let child = child_order(&orders[order_ix].vars, swap.var_in, swap.var_out, rng);
        orders.push(child);
        let child_ix = orders.len() - 1;
        sample_children_orders(tk, ch, child_ix, rng, orders);
    }
}

fn child_order(
    parent: &[usize],
    var_in: usize,
    var_out: usize,
    rng: &mut impl Rng,
) -> PartialOrder {
    let pos = rng.gen_range(0, parent.len());
    let mut vars: Vec<usize> = parent.iter().copied().filter(|&x| x != var_out).collect();
    vars.insert(pos, var_in);
    PartialOrder { vars, ini: pos }
}

/// Walks the unplaced suffix of a partial order, assigning each variable
/// the best parent set drawn from the restriction built so far whenever it
/// strictly improves on the variable's current family.
pub fn set_parents_from_order(
    order: &PartialOrder,
    ranker: &dyn ScoreRanker,
    bn: &mut BNStructure,
) {
    let mut restric = Varset::new(ranker.size());
    for &v in &order.vars[..order.ini] {
        restric.set(v);
    }
    for &v in &order.vars[order.ini..] {
        let (new_parents, new_score) = ranker.best_in(v, &restric);
        if new_score > bn.local_score(v) {
            bn.set_parents(v, new_parents, new_score);
        }
        restric.set(v);
    }
}

/// Seam for producing the exact parent assignment of an initial clique.
/// The production path approximates exactness by restarting; an external
/// integer-programming solver can be slotted in through this trait (its
/// input file comes from `ListRanker::save_subset`).
pub trait InitialDagLearner: Send {
    /// Learns parents for exactly the given variables; every other variable
    /// of the returned structure stays unassigned.
    fn initial_dag(&mut self, vars: &[usize], ranker: &dyn ScoreRanker) -> BNStructure;
}

/// Keeps the best of a fixed number of random-order projections over the
/// clique variables.
pub struct RestartedProjection {
    iters: usize,
    rng: StdRng,
}

impl RestartedProjection {
    pub fn new(iters: usize) -> Self {
        RestartedProjection {
            iters,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(iters: usize, seed: u64) -> Self {
        RestartedProjection {
            iters,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl InitialDagLearner for RestartedProjection {
    fn initial_dag(&mut self, vars: &[usize], ranker: &dyn ScoreRanker) -> BNStructure {
        let n = ranker.size();
        let mut best: Option<BNStructure> = None;
        let mut order = vars.to_vec();
        for _ in 0..self.iters.max(1) {
            order.shuffle(&mut self.rng);
            let mut bn = BNStructure::new(n);
            set_parents_from_order(
                &PartialOrder {
                    vars: order.clone(),
                    ini: 0,
                },
                ranker,
                &mut bn,
            );
            if bn.better_than(best.as_ref()) {
                best = Some(bn);
            }
        }
        best.expect("at least one projection ran")
    }
}
