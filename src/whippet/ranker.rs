/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate fxhash;

use fxhash::FxHashMap;
use itertools::Itertools;
use std::io::Write;

use crate::whippet::error::{BTWError, BTWResult};
use crate::whippet::record::{sort_records_desc, Record};
use crate::whippet::score_cache::ScoreCache;
use crate::whippet::varset::Varset;

/// Answers best-scoring-parent-set queries for each variable. The varsets
/// handed out are owned copies; callers may mutate them freely.
pub trait ScoreRanker {
    /// Number of variables covered by the ranker.
    fn size(&self) -> usize;

    /// Exact score lookup for a family; 0.0 when the parent set was never
    /// scored.
    fn score_of(&self, v: usize, parents: &Varset) -> f64;

    /// The highest-scoring parent set of `v` contained in the restriction
    /// set. The empty family is always a candidate, so the query cannot
    /// come up empty.
    fn best_in(&self, v: usize, restric: &Varset) -> (Varset, f64);

    /// Like `best_in`, additionally capping the parent-set cardinality.
    fn best_in_lim(&self, v: usize, restric: &Varset, max_pa: usize) -> (Varset, f64);
}

struct VarRanker {
    score_map: FxHashMap<String, f64>,
    // candidate parent sets by descending score
    score_list: Vec<Record<Varset>>,
}

impl VarRanker {
    fn new(nvar: usize, score_map: FxHashMap<String, f64>, max_pa: usize) -> VarRanker {
        let mut score_list: Vec<Record<Varset>> = Vec::with_capacity(score_map.len());
        for (key, &score) in &score_map {
            let pset = Varset::from_hash_string(nvar, key);
            if max_pa == 0 || pset.count() <= max_pa {
                score_list.push(Record::new(score, pset));
            }
        }
        sort_records_desc(&mut score_list);
        VarRanker {
            score_map,
            score_list,
        }
    }
}

/// Ranker backed by per-variable sorted score lists built from a cache.
pub struct ListRanker {
    vars: Vec<VarRanker>,
    var_name: Vec<String>,
}

impl ListRanker {
    /// Builds the ranker, dropping candidate sets with more than `max_pa`
    /// parents (0 means no cap).
    pub fn from_cache(cache: ScoreCache, max_pa: usize) -> BTWResult<ListRanker> {
        let (nvar, caches, var_name) = cache.into_parts();
        let mut vars = Vec::with_capacity(nvar);
        for (v, score_map) in caches.into_iter().enumerate() {
            let ranker = VarRanker::new(nvar, score_map, max_pa);
            if ranker.score_list.is_empty() {
                return Err(BTWError::Generic(format!(
                    "ranker: no candidate parent sets for variable '{}'",
                    var_name[v]
                )));
            }
            vars.push(ranker);
        }
        Ok(ListRanker { vars, var_name })
    }

    pub fn var_name(&self, v: usize) -> &str {
        &self.var_name[v]
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_name
    }

    /// Writes the PSS projection of the score lists onto a variable subset:
    /// only families whose parents all lie inside `vars` survive. The
    /// output feeds the external exact-solver bridge.
    pub fn save_subset<W: Write>(&self, mut out: W, vars: &[usize]) -> BTWResult<()> {
        let sub = Varset::from_ints(self.size(), vars);
        for &v in vars {
            writeln!(out, "VAR {}", self.var_name(v))?;
            for record in &self.vars[v].score_list {
                let pset = record.payload();
                if sub.is_superset(pset) {
                    if pset.is_empty() {
                        writeln!(out, "{}", record.score())?;
                    } else {
                        let names = pset
                            .dump_as_ints()
                            .iter()
                            .map(|&u| self.var_name(u))
                            .join(" ");
                        writeln!(out, "{} {}", record.score(), names)?;
                    }
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl ScoreRanker for ListRanker {
    fn size(&self) -> usize {
        self.vars.len()
    }

    fn score_of(&self, v: usize, parents: &Varset) -> f64 {
        self.vars[v]
            .score_map
            .get(&parents.dump_hash_string())
            .copied()
            .unwrap_or(0.0)
    }

    fn best_in(&self, v: usize, restric: &Varset) -> (Varset, f64) {
        if self.vars[v].score_list.is_empty() {
            panic!("ranker: score list is empty for variable {}", v);
        }
        for record in &self.vars[v].score_list {
            if restric.is_superset(record.payload()) {
                return (record.payload().clone(), record.score());
            }
        }
        panic!(
            "ranker: no feasible parent set for variable {} under restriction {}",
            v, restric
        );
    }

    fn best_in_lim(&self, v: usize, restric: &Varset, max_pa: usize) -> (Varset, f64) {
        if self.vars[v].score_list.is_empty() {
            panic!("ranker: score list is empty for variable {}", v);
        }
        for record in &self.vars[v].score_list {
            if record.payload().count() <= max_pa && restric.is_superset(record.payload()) {
                return (record.payload().clone(), record.score());
            }
        }
        panic!(
            "ranker: no feasible parent set for variable {} under restriction {}",
            v, restric
        );
    }
}
