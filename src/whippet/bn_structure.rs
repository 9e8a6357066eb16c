/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
use std::fmt;
use std::io::Write;

use crate::whippet::error::BTWResult;
use crate::whippet::varset::Varset;

/// A (possibly partial) parent-set assignment over a fixed set of
/// variables, tracking each assigned family's local score and the running
/// total.
#[derive(Clone, Debug)]
pub struct BNStructure {
    tot_score: f64,
    initialized: usize,
    nodes: Vec<Option<FamilyNode>>,
}

#[derive(Clone, Debug)]
struct FamilyNode {
    loc_score: f64,
    parents: Varset,
}

impl BNStructure {
    pub fn new(nvars: usize) -> Self {
        BNStructure {
            tot_score: 0.0,
            initialized: 0,
            nodes: vec![None; nvars],
        }
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// The total score, or negative infinity while any variable is still
    /// unassigned.
    pub fn score(&self) -> f64 {
        if self.size() != self.initialized {
            return std::f64::NEG_INFINITY;
        }
        self.tot_score
    }

    /// Compares structures by how many variables are assigned first, then
    /// by accumulated score; any structure beats `None`.
    pub fn better_than(&self, other: Option<&BNStructure>) -> bool {
        match other {
            None => true,
            Some(o) => {
                if self.initialized == o.initialized {
                    self.tot_score > o.tot_score
                } else {
                    self.initialized > o.initialized
                }
            }
        }
    }

    /// Assigns the parent set and local score of `v`, replacing any prior
    /// assignment and keeping the total consistent.
    pub fn set_parents(&mut self, v: usize, parents: Varset, local_score: f64) {
        if let Some(node) = &self.nodes[v] {
            self.tot_score -= node.loc_score;
        } else {
            self.initialized += 1;
        }
        self.tot_score += local_score;
        self.nodes[v] = Some(FamilyNode {
            loc_score: local_score,
            parents,
        });
    }

    /// The local score of `v`'s family, or negative infinity when
    /// unassigned.
    pub fn local_score(&self, v: usize) -> f64 {
        match &self.nodes[v] {
            Some(node) => node.loc_score,
            None => std::f64::NEG_INFINITY,
        }
    }

    pub fn parents(&self, v: usize) -> Option<&Varset> {
        self.nodes[v].as_ref().map(|node| &node.parents)
    }
}

impl fmt::Display for BNStructure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{{size: {}", self.size())?;
        for v in 0..self.size() {
            match &self.nodes[v] {
                Some(node) => writeln!(f, "\t{}: {{s({}), p({})}}", v, node.loc_score, node.parents)?,
                None => writeln!(f, "\t{}: unassigned", v)?,
            }
        }
        writeln!(f, "total: {}}}", self.score())
    }
}

/// Writes a learned network in the solution file format: META header lines
/// followed by one `name: parent names` line per variable.
pub fn write_solution<W: Write>(
    mut out: W,
    bn: &BNStructure,
    names: &[String],
    treewidth: usize,
) -> BTWResult<()> {
    writeln!(out, "META variables = {}", bn.size())?;
    writeln!(out, "META treewidth = {}", treewidth)?;
    writeln!(out, "META score = {}", bn.score())?;
    writeln!(out)?;
    for v in 0..bn.size() {
        let parents = match bn.parents(v) {
            Some(pset) => pset
                .dump_as_ints()
                .iter()
                .map(|&u| names[u].as_str())
                .collect::<Vec<&str>>()
                .join(" "),
            None => String::new(),
        };
        writeln!(out, "{}: {}", names[v], parents)?;
    }
    Ok(())
}
