/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate rand;

use rand::prelude::*;

/// The pair component of a generalized dandelion code: for each coded node
/// a (parent, edge label) pair. A pair is either `(0, -1)` (child of the
/// root) or `(p, l)` with `p` in `1..=n-k` and `l` in `0..k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodePair {
    pub p: Vec<usize>,
    pub l: Vec<i64>,
}

/// Bijective encoding of a labeled k-tree over `n` variables: an ordered
/// list `q` of k variables plus a dandelion code pair of length `n-k-1`.
/// Sampling codes uniformly and decoding yields uniform random k-trees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DandelionCode {
    pub q: Vec<usize>,
    pub s: CodePair,
}

impl DandelionCode {
    /// Draws a uniform random code. Each code pair is drawn from the
    /// `k*(n-k) + 1` element domain `{(0,-1)} ∪ {1..n-k} × {0..k-1}`.
    pub fn sample(n: usize, k: usize, rng: &mut impl Rng) -> DandelionCode {
        assert!(k > 0 && n >= k + 2, "dandelion: need n >= k + 2 and k > 0");
        let mut pool: Vec<usize> = (0..n).collect();
        pool.shuffle(rng);
        pool.truncate(k);

        let m = n - k;
        let domain = k * m + 1;
        let mut p = Vec::with_capacity(m - 1);
        let mut l = Vec::with_capacity(m - 1);
        for _ in 0..m - 1 {
            let r = rng.gen_range(0, domain);
            if r == 0 {
                p.push(0);
                l.push(-1);
            } else {
                p.push((r - 1) / k + 1);
                l.push(((r - 1) % k) as i64);
            }
        }
        DandelionCode {
            q: pool,
            s: CodePair { p, l },
        }
    }
}

/// Characteristic tree of a relabeled k-tree: parent and edge-label arrays
/// over nodes `0..=n-k`, where node 0 is the root (`parent = label = -1`)
/// and `label = -1` exactly for children of the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharTree {
    pub parent: Vec<i64>,
    pub label: Vec<i64>,
}

/// Decodes a dandelion code into its characteristic tree plus the inverse
/// relabeling permutation `iphi` (internal label `i` maps to user variable
/// `iphi[i-1]`).
///
/// The code pairs define a functional graph over nodes `2..=n-k` whose
/// sinks are the root 0 and the distinguished node 1. Decoding opens every
/// cycle of that graph at its maximum node and splices the openings, maxima
/// in descending order, into the path from node 1 to the root; all other
/// nodes keep their coded pair.
pub fn decode(code: &DandelionCode, n: usize, k: usize) -> (CharTree, Vec<usize>) {
    let m = n - k;
    debug_assert_eq!(code.s.p.len(), m - 1);
    debug_assert_eq!(code.s.l.len(), m - 1);
    let pair = |v: usize| (code.s.p[v - 2], code.s.l[v - 2]);

    // cycle detection by walk coloring: 0 unseen, 1 on the current walk,
    // 2 finished
    let mut color = vec![0u8; m + 1];
    color[0] = 2;
    color[1] = 2;
    let mut cycle_maxima: Vec<usize> = Vec::new();
    for start in 2..=m {
        if color[start] != 0 {
            continue;
        }
        let mut path = Vec::new();
        let mut v = start;
        while color[v] == 0 {
            color[v] = 1;
            path.push(v);
            v = pair(v).0;
        }
        if color[v] == 1 {
            // the tail of the walk closed a new cycle
            let ix = path.iter().position(|&u| u == v).unwrap();
            cycle_maxima.push(*path[ix..].iter().max().unwrap());
        }
        for u in path {
            color[u] = 2;
        }
    }
    cycle_maxima.sort_unstable_by(|a, b| b.cmp(a));

    let mut parent = vec![-1i64; m + 1];
    let mut label = vec![-1i64; m + 1];
    for v in 2..=m {
        let (p, l) = pair(v);
        parent[v] = p as i64;
        label[v] = l;
    }
    let mut prev = 1usize;
    for &mx in &cycle_maxima {
        let (p, l) = pair(mx);
        parent[prev] = p as i64;
        label[prev] = l;
        prev = mx;
    }
    parent[prev] = 0;
    label[prev] = -1;

    // q occupies the top k internal labels in sampled order; the remaining
    // variables fill 1..=n-k ascending
    let mut in_q = vec![false; n];
    for &x in &code.q {
        in_q[x] = true;
    }
    let mut iphi = Vec::with_capacity(n);
    iphi.extend((0..n).filter(|&x| !in_q[x]));
    iphi.extend(code.q.iter().copied());

    (CharTree { parent, label }, iphi)
}

/// Which distance formula the code selector uses. `Sum` adds the three
/// component norms; `AbsDiff` adds the q norm to the absolute difference of
/// the pair norms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeDistance {
    Sum,
    AbsDiff,
}

/// Distance between two codes of identical dimensions: the Euclidean norms
/// of the componentwise differences of `q`, `s.p` and `s.l`, combined per
/// the chosen variant.
pub fn code_distance(a: &DandelionCode, b: &DandelionCode, variant: CodeDistance) -> f64 {
    let dq = norm_usize(&a.q, &b.q);
    let dp = norm_usize(&a.s.p, &b.s.p);
    let dl = norm_i64(&a.s.l, &b.s.l);
    match variant {
        CodeDistance::Sum => dq + dp + dl,
        CodeDistance::AbsDiff => dq + (dp - dl).abs(),
    }
}

fn norm_usize(a: &[usize], b: &[usize]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn norm_i64(a: &[i64], b: &[i64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
