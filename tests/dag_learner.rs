/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate lib_whippet;
extern crate rand;

use rand::rngs::StdRng;
use rand::SeedableRng;

use lib_whippet::{
    approximated_learning, sample_partial_orders, set_parents_from_order, BNStructure, FakeRanker,
    InitialDagLearner, KTree, PartialOrder, RestartedProjection, Varset,
};

fn tree_varsets(tk: &KTree) -> Vec<Varset> {
    tk.nodes()
        .map(|node| Varset::from_ints(tk.n(), node.clique()))
        .collect()
}

fn is_subset_of_some(pset: &Varset, cliques: &[Varset]) -> bool {
    cliques.iter().any(|clique| clique.is_superset(pset))
}

#[cfg(test)]
#[test]
fn test_approximated_learning_respects_cliques() {
    let mut rng = StdRng::seed_from_u64(41);
    for &(n, k) in &[(7usize, 2usize), (11, 4)] {
        let ranker = FakeRanker { n };
        let tk = KTree::uniform_sample(n, k, &mut rng);
        let bn = approximated_learning(&tk, &ranker, &mut rng);
        let cliques = tree_varsets(&tk);
        assert_eq!(bn.size(), n);
        for v in 0..n {
            // the learned family plus the child fits inside some clique
            let mut family = bn.parents(v).unwrap().clone();
            family.set(v);
            assert!(
                is_subset_of_some(&family, &cliques),
                "family of {} not contained in any clique",
                v
            );
        }
    }
}

#[test]
fn test_sampled_orders_are_cliques() {
    let mut rng = StdRng::seed_from_u64(43);
    for &(n, k) in &[(7usize, 2usize), (11, 4)] {
        let tk = KTree::uniform_sample(n, k, &mut rng);
        let orders = sample_partial_orders(&tk, &mut rng);
        let cliques = tree_varsets(&tk);
        assert_eq!(orders.len(), tk.len());
        for order in &orders {
            assert_eq!(order.vars.len(), k + 1);
            assert!(order.ini <= k);
            let as_set = Varset::from_ints(n, &order.vars);
            assert!(
                cliques.iter().any(|clique| *clique == as_set),
                "order {:?} is not a clique of the tree",
                order.vars
            );
        }
    }
}

#[test]
fn test_set_parents_from_order() {
    let ranker = FakeRanker { n: 9 };

    // nothing placed: each variable may draw on everything before it
    let mut bn = BNStructure::new(9);
    let order = PartialOrder {
        vars: vec![1, 2, 3, 4],
        ini: 0,
    };
    set_parents_from_order(&order, &ranker, &mut bn);
    assert_eq!(bn.parents(1).unwrap().dump_as_ints(), Vec::<usize>::new());
    assert_eq!(bn.parents(2).unwrap().dump_as_ints(), vec![1]);
    assert_eq!(bn.parents(3).unwrap().dump_as_ints(), vec![1, 2]);
    assert_eq!(bn.parents(4).unwrap().dump_as_ints(), vec![1, 2, 3]);

    // a placed prefix of two: only the suffix is assigned
    let mut bn = BNStructure::new(9);
    let order = PartialOrder {
        vars: vec![5, 2, 1, 7],
        ini: 2,
    };
    set_parents_from_order(&order, &ranker, &mut bn);
    assert!(bn.parents(5).is_none());
    assert!(bn.parents(2).is_none());
    assert_eq!(bn.parents(1).unwrap().dump_as_ints(), vec![2, 5]);
    assert_eq!(bn.parents(7).unwrap().dump_as_ints(), vec![1, 2, 5]);
}

#[test]
fn test_initial_dag_only_assigns_the_clique() {
    let cases: Vec<(Vec<usize>, Vec<usize>)> = vec![
        (vec![0, 1, 2], vec![3, 4, 5, 6, 7, 8, 9]),
        (vec![4, 7, 3], vec![0, 1, 2, 5, 6, 8, 9]),
    ];
    for (clique, remain) in cases {
        let n = clique.len() + remain.len();
        let ranker = FakeRanker { n };
        let mut learner = RestartedProjection::with_seed(50, 47);
        let bn = learner.initial_dag(&clique, &ranker);
        assert_eq!(bn.size(), n);
        for &v in &remain {
            assert!(bn.parents(v).is_none());
        }
        // the fake ranker rewards high-index parents, so some family in
        // the clique must be non-empty
        let assigned: usize = clique
            .iter()
            .map(|&v| bn.parents(v).unwrap().count())
            .sum();
        assert!(assigned > 0, "initial clique {:?} is empty", clique);
    }
}

#[test]
fn test_initial_dag_finds_the_best_order() {
    // the fake ranker scores one point per parent above the child, so the
    // optimum places variables in descending order; restarts find it on
    // a three-variable clique
    let ranker = FakeRanker { n: 5 };
    let mut learner = RestartedProjection::with_seed(200, 53);
    let bn = learner.initial_dag(&[0, 2, 4], &ranker);
    let total: f64 = [0usize, 2, 4].iter().map(|&v| bn.local_score(v)).sum();
    assert_eq!(total, 3.0);
    assert_eq!(bn.parents(0).unwrap().dump_as_ints(), vec![2, 4]);
    assert_eq!(bn.parents(2).unwrap().dump_as_ints(), vec![4]);
    assert_eq!(bn.parents(4).unwrap().dump_as_ints(), Vec::<usize>::new());
}
