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

use lib_whippet::{CharTree, KTree, Varset};

/// Flattens a tree into breadth-first rows of (sorted clique, var_in,
/// var_out), with -1 standing for the root's missing swap.
fn variables_list(tk: &KTree) -> Vec<Vec<i64>> {
    tk.nodes()
        .map(|node| {
            let mut row: Vec<i64> = node.clique().iter().map(|&v| v as i64).collect();
            match node.swap() {
                Some(swap) => {
                    row.push(swap.var_in as i64);
                    row.push(swap.var_out as i64);
                }
                None => {
                    row.push(-1);
                    row.push(-1);
                }
            }
            row
        })
        .collect()
}

#[cfg(test)]
#[test]
fn test_from_char_tree() {
    // characteristic tree over 11 variables with width 3
    let chartree = CharTree {
        parent: vec![-1, 5, 0, 0, 2, 8, 8, 1, 0],
        label: vec![-1, 2, -1, -1, 0, 2, 1, 2, -1],
    };
    let iphi = vec![0, 10, 9, 3, 4, 5, 6, 7, 1, 2, 8];
    let tk = KTree::from_char_tree(&chartree, &iphi, 11, 3);
    let expected: Vec<Vec<i64>> = vec![
        vec![1, 2, 8, 10, -1, -1],
        vec![2, 3, 8, 10, 3, 1],
        vec![1, 2, 8, 9, 9, 10],
        vec![1, 2, 7, 8, 7, 10],
        vec![1, 2, 4, 7, 4, 8],
        vec![1, 5, 7, 8, 5, 2],
        vec![0, 1, 4, 7, 0, 2],
        vec![0, 4, 6, 7, 6, 1],
    ];
    assert_eq!(variables_list(&tk), expected);
    assert_eq!(tk.n(), 11);
    assert_eq!(tk.width(), 3);
}

#[test]
fn test_uniform_sample_shape() {
    let mut rng = StdRng::seed_from_u64(29);
    for &(n, k) in &[(5, 2), (7, 2), (11, 3), (11, 4), (20, 5)] {
        for _ in 0..20 {
            let tk = KTree::uniform_sample(n, k, &mut rng);
            // n - k cliques of k + 1 distinct variables each
            assert_eq!(tk.len(), n - k);
            assert!(tk.root().swap().is_none());
            for node in tk.nodes() {
                assert_eq!(node.clique().len(), k + 1);
                let mut sorted = node.clique().to_vec();
                sorted.dedup();
                assert_eq!(sorted.len(), k + 1);
                assert!(node.clique().windows(2).all(|w| w[0] < w[1]));
                assert!(node.clique().iter().all(|&v| v < n));
            }
        }
    }
}

#[test]
fn test_child_cliques_differ_by_swap() {
    let mut rng = StdRng::seed_from_u64(31);
    for &(n, k) in &[(7, 2), (11, 3), (16, 4)] {
        let tk = KTree::uniform_sample(n, k, &mut rng);
        let mut stack = vec![0usize];
        let mut visited = 0usize;
        while let Some(ix) = stack.pop() {
            visited += 1;
            let node = tk.node(ix);
            let clique = Varset::from_ints(n, node.clique());
            for &ch in node.children() {
                let child = tk.node(ch);
                let swap = child.swap().expect("child nodes carry a swap");
                let mut derived = clique.clone();
                derived.clear(swap.var_out);
                derived.set(swap.var_in);
                assert_eq!(
                    derived.dump_as_ints(),
                    child.clique().to_vec(),
                    "child clique is not parent - var_out + var_in"
                );
                assert!(clique.contains(swap.var_out));
                assert!(!clique.contains(swap.var_in));
                stack.push(ch);
            }
        }
        // the arena holds a single connected tree
        assert_eq!(visited, tk.len());
    }
}

#[test]
fn test_every_variable_appears() {
    let mut rng = StdRng::seed_from_u64(37);
    for &(n, k) in &[(6, 2), (12, 3)] {
        let tk = KTree::uniform_sample(n, k, &mut rng);
        let mut seen = Varset::new(n);
        for node in tk.nodes() {
            for &v in node.clique() {
                seen.set(v);
            }
        }
        assert_eq!(seen.count(), n);
    }
}
