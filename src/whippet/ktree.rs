/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate rand;

use rand::prelude::*;
use std::collections::VecDeque;

use crate::whippet::dandelion::{decode, CharTree, DandelionCode};

/// The variable exchanged between a clique and its parent clique.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarSwap {
    pub var_in: usize,
    pub var_out: usize,
}

/// One clique of a k-tree in clique-tree form: k+1 sorted variables, the
/// swap relative to the parent node (`None` for the root), and child node
/// indices into the owning arena.
#[derive(Clone, Debug)]
pub struct KTreeNode {
    clique: Vec<usize>,
    swap: Option<VarSwap>,
    children: Vec<usize>,
}

impl KTreeNode {
    pub fn clique(&self) -> &[usize] {
        &self.clique
    }

    pub fn swap(&self) -> Option<&VarSwap> {
        self.swap.as_ref()
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// A width-k clique tree over n variables, stored as an arena of nodes in
/// breadth-first order with node 0 as the root. Every node is a
/// (k+1)-clique and every child shares k variables with its parent.
#[derive(Clone, Debug)]
pub struct KTree {
    n: usize,
    k: usize,
    nodes: Vec<KTreeNode>,
}

impl KTree {
    /// Samples a uniform random k-tree by drawing a dandelion code and
    /// decoding it.
    pub fn uniform_sample(n: usize, k: usize, rng: &mut impl Rng) -> KTree {
        KTree::from_code(&DandelionCode::sample(n, k, rng), n, k)
    }

    /// Decodes a given dandelion code (the non-random half of sampling).
    pub fn from_code(code: &DandelionCode, n: usize, k: usize) -> KTree {
        let (t, iphi) = decode(code, n, k);
        KTree::from_char_tree(&t, &iphi, n, k)
    }

    /// Builds the clique tree from a characteristic tree and the inverse
    /// relabeling permutation.
    ///
    /// The characteristic root carries the top k internal labels; each
    /// other node's clique copies its parent's clique minus the position
    /// named by the edge label (the dropped variable becomes `var_out`),
    /// gains the parent node's index when the parent is not the root, and
    /// finally gains the node's own index as `var_in`. The characteristic
    /// root is then removed by promoting its first child: the remaining
    /// former siblings become children of the promoted node with `var_out`
    /// equal to its former `var_in`.
    pub fn from_char_tree(t: &CharTree, iphi: &[usize], n: usize, k: usize) -> KTree {
        let m = t.parent.len(); // n - k + 1 characteristic nodes
        debug_assert_eq!(m, n - k + 1);
        debug_assert_eq!(iphi.len(), n);

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); m];
        for v in 1..m {
            children[t.parent[v] as usize].push(v);
        }

        // clique matrix in internal labels; each row excludes the node's
        // own vertex
        let mut kmat: Vec<Vec<usize>> = vec![Vec::new(); m];
        let mut varout = vec![0usize; m]; // internal label; 0 means none
        kmat[0] = (1..=k).map(|i| n - k + i).collect();
        let mut queue: VecDeque<usize> = children[0].iter().copied().collect();
        while let Some(v) = queue.pop_front() {
            let pa = t.parent[v] as usize;
            let row = kmat[pa].clone();
            let mut kv = Vec::with_capacity(k);
            for (i, &x) in row.iter().enumerate() {
                if i as i64 != t.label[v] {
                    kv.push(x);
                } else {
                    varout[v] = x;
                }
            }
            if pa != 0 {
                kv.push(pa);
                kv.sort_unstable();
            }
            kmat[v] = kv;
            queue.extend(children[v].iter().copied());
        }

        // relabel to user variables; node i's own vertex has internal
        // label i
        let relabel = |x: usize| iphi[x - 1];
        let mut cliques: Vec<Vec<usize>> = vec![Vec::new(); m];
        let mut varin = vec![0usize; m];
        for i in 1..m {
            let mut clique: Vec<usize> = kmat[i].iter().map(|&x| relabel(x)).collect();
            varin[i] = relabel(i);
            clique.push(varin[i]);
            clique.sort_unstable();
            cliques[i] = clique;
        }

        // drop the characteristic root, promoting its first child
        let first = children[0][0];
        let adopted_out = varin[first];
        let mut nodes: Vec<KTreeNode> = Vec::with_capacity(m - 1);
        let mut arena_ix = vec![0usize; m];
        let mut bfs: VecDeque<usize> = VecDeque::new();
        bfs.push_back(first);
        while let Some(v) = bfs.pop_front() {
            let swap = if v == first {
                None
            } else if t.parent[v] == 0 {
                // former sibling of the promoted root
                Some(VarSwap {
                    var_in: varin[v],
                    var_out: adopted_out,
                })
            } else {
                Some(VarSwap {
                    var_in: varin[v],
                    var_out: relabel(varout[v]),
                })
            };
            arena_ix[v] = nodes.len();
            nodes.push(KTreeNode {
                clique: std::mem::replace(&mut cliques[v], Vec::new()),
                swap,
                children: Vec::new(),
            });
            for &ch in &children[v] {
                bfs.push_back(ch);
            }
            if v == first {
                for &ch in &children[0][1..] {
                    bfs.push_back(ch);
                }
            }
        }
        // wire up child indices now that every node has an arena slot
        for v in 1..m {
            if v == first {
                continue;
            }
            let pa = t.parent[v] as usize;
            let arena_pa = if pa == 0 { arena_ix[first] } else { arena_ix[pa] };
            nodes[arena_pa].children.push(arena_ix[v]);
        }
        for node in nodes.iter_mut() {
            node.children.sort_unstable();
        }

        KTree { n, k, nodes }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn width(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &KTreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, ix: usize) -> &KTreeNode {
        &self.nodes[ix]
    }

    /// Nodes in breadth-first order (the arena layout order).
    pub fn nodes(&self) -> impl Iterator<Item = &KTreeNode> {
        self.nodes.iter()
    }
}
