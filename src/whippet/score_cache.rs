/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate fxhash;

use fxhash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::whippet::error::{BTWError, BTWResult};
use crate::whippet::varset::Varset;

/// Precomputed family scores read from a PSS file. For each variable the
/// cache maps the fingerprint of a candidate parent set to its local score.
/// Variable names are interned in file order and assigned indices 0..n-1.
pub struct ScoreCache {
    nvar: usize,
    caches: Vec<FxHashMap<String, f64>>,
    var_name: Vec<String>,
    var_index: FxHashMap<String, usize>,
}

impl ScoreCache {
    pub fn from_file(path: &str) -> BTWResult<ScoreCache> {
        ScoreCache::read(BufReader::new(File::open(path)?))
    }

    /// Reads a PSS-formatted score file. The input is scanned twice: the
    /// first pass interns every `VAR` declaration so that parent names can
    /// be resolved no matter where they appear, the second parses the
    /// family scores.
    pub fn read<R: BufRead>(input: R) -> BTWResult<ScoreCache> {
        let lines: Vec<String> = input.lines().collect::<Result<_, _>>()?;

        let mut var_name: Vec<String> = Vec::new();
        let mut var_index: FxHashMap<String, usize> = FxHashMap::default();
        for line in &lines {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.len() >= 2 && words[0] == "VAR" {
                if var_index.contains_key(words[1]) {
                    return Err(BTWError::Generic(format!(
                        "cache: duplicate variable '{}'",
                        words[1]
                    )));
                }
                var_index.insert(words[1].to_owned(), var_name.len());
                var_name.push(words[1].to_owned());
            }
        }
        if var_name.is_empty() {
            return Err(BTWError::new("cache: no variables declared in score file"));
        }

        let nvar = var_name.len();
        let mut caches: Vec<FxHashMap<String, f64>> = vec![FxHashMap::default(); nvar];
        let mut curr_var = 0;
        for line in &lines {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() || words[0] == "META" {
                continue;
            }
            if words[0] == "VAR" {
                curr_var = words
                    .get(1)
                    .and_then(|name| var_index.get(*name))
                    .copied()
                    .ok_or_else(|| BTWError::new("cache: malformed VAR line"))?;
                continue;
            }
            let score: f64 = words[0].parse()?;
            let mut parents = Varset::new(nvar);
            for w in &words[1..] {
                let &ix = var_index.get(*w).ok_or_else(|| {
                    BTWError::Generic(format!("cache: unknown parent variable '{}'", w))
                })?;
                parents.set(ix);
            }
            caches[curr_var].insert(parents.dump_hash_string(), score);
        }

        // The ranker relies on every variable having a scored empty family
        // to fall back on; synthesize a sentinel when the file omits it.
        let empty_key = Varset::new(nvar).dump_hash_string();
        for cache in caches.iter_mut() {
            cache.entry(empty_key.clone()).or_insert(std::f64::MIN);
        }

        Ok(ScoreCache {
            nvar,
            caches,
            var_name,
            var_index,
        })
    }

    pub fn nvar(&self) -> usize {
        self.nvar
    }

    /// The score map for variable `v`, keyed by parent-set fingerprint.
    pub fn scores(&self, v: usize) -> &FxHashMap<String, f64> {
        &self.caches[v]
    }

    pub fn var_name(&self, v: usize) -> &str {
        &self.var_name[v]
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_name
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.var_index.get(name).copied()
    }

    pub(crate) fn into_parts(self) -> (usize, Vec<FxHashMap<String, f64>>, Vec<String>) {
        (self.nvar, self.caches, self.var_name)
    }
}
