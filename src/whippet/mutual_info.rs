/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate fxhash;
extern crate rayon;

use fxhash::FxHashMap;
use itertools::Itertools;
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use crate::whippet::error::{BTWError, BTWResult};

/// Pairwise mutual information in a lower-triangular matrix, with each
/// variable's marginal entropy on the diagonal.
pub struct MutInfo {
    mat: Vec<Vec<f64>>,
}

impl MutInfo {
    pub fn from_file(path: &str) -> BTWResult<MutInfo> {
        MutInfo::read(BufReader::new(File::open(path)?))
    }

    /// Reads the lower-triangular text format: row i holds i+1
    /// space-separated floats.
    pub fn read<R: BufRead>(input: R) -> BTWResult<MutInfo> {
        let mut mat: Vec<Vec<f64>> = Vec::new();
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row: Vec<f64> = line
                .split_whitespace()
                .map(|w| w.parse::<f64>())
                .collect::<Result<_, _>>()?;
            if row.len() != mat.len() + 1 {
                return Err(BTWError::new(
                    "mutinf: matrix file is not lower triangular",
                ));
            }
            mat.push(row);
        }
        if mat.is_empty() {
            return Err(BTWError::new("mutinf: empty matrix file"));
        }
        Ok(MutInfo { mat })
    }

    pub fn write<W: Write>(&self, mut out: W) -> BTWResult<()> {
        for row in &self.mat {
            writeln!(out, "{}", row.iter().join(" "))?;
        }
        Ok(())
    }

    pub fn write_file(&self, path: &str) -> BTWResult<()> {
        self.write(File::create(path)?)
    }

    pub fn nvar(&self) -> usize {
        self.mat.len()
    }

    /// The mutual information of a variable pair; `get(i, i)` is the
    /// marginal entropy of variable i.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i > j {
            self.mat[i][j]
        } else {
            self.mat[j][i]
        }
    }

    /// Computes empirical pairwise mutual information (in nats) from a CSV
    /// dataset: a header row of variable names followed by rows of integer
    /// states. Matrix rows are filled in parallel.
    pub fn from_dataset<R: BufRead>(input: R) -> BTWResult<MutInfo> {
        let mut lines = input.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(BTWError::new("mutinf: empty dataset file")),
        };
        let nvar = header.split(',').count();

        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); nvar];
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let values: Vec<&str> = line.split(',').collect();
            if values.len() != nvar {
                return Err(BTWError::new("mutinf: dataset row with wrong arity"));
            }
            for (col, value) in columns.iter_mut().zip(&values) {
                col.push(value.trim().parse()?);
            }
        }
        if columns[0].is_empty() {
            return Err(BTWError::new("mutinf: dataset has no data rows"));
        }

        let mat: Vec<Vec<f64>> = (0..nvar)
            .into_par_iter()
            .map(|i| {
                (0..=i)
                    .map(|j| {
                        if i == j {
                            entropy(&columns[i])
                        } else {
                            pairwise_mi(&columns[i], &columns[j])
                        }
                    })
                    .collect()
            })
            .collect();
        Ok(MutInfo { mat })
    }
}

fn entropy(xs: &[usize]) -> f64 {
    let total = xs.len() as f64;
    let mut counts: FxHashMap<usize, usize> = FxHashMap::default();
    for &x in xs {
        *counts.entry(x).or_insert(0) += 1;
    }
    -counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * p.ln()
        })
        .sum::<f64>()
}

fn pairwise_mi(xs: &[usize], ys: &[usize]) -> f64 {
    let total = xs.len() as f64;
    let mut joint: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    let mut px: FxHashMap<usize, usize> = FxHashMap::default();
    let mut py: FxHashMap<usize, usize> = FxHashMap::default();
    for (&x, &y) in xs.iter().zip(ys) {
        *joint.entry((x, y)).or_insert(0) += 1;
        *px.entry(x).or_insert(0) += 1;
        *py.entry(y).or_insert(0) += 1;
    }
    joint
        .iter()
        .map(|(&(x, y), &c)| {
            let pxy = c as f64 / total;
            let marg = (px[&x] as f64 / total) * (py[&y] as f64 / total);
            pxy * (pxy / marg).ln()
        })
        .sum()
}
