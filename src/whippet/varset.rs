/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate roaring;

use itertools::Itertools;
use roaring::RoaringBitmap;
use std::fmt;

/// A set of variable indices over a fixed universe `[0, n)`. The universe
/// size is pinned at construction; binary operations require both operands
/// to come from the same universe.
#[derive(Clone, Debug)]
pub struct Varset {
    size: usize,
    bits: RoaringBitmap,
}

impl Varset {
    pub fn new(size: usize) -> Self {
        Varset {
            size,
            bits: RoaringBitmap::new(),
        }
    }

    pub fn from_ints(size: usize, vars: &[usize]) -> Self {
        let mut vs = Varset::new(size);
        vs.set_ints(vars);
        vs
    }

    pub fn from_hash_string(size: usize, s: &str) -> Self {
        let mut vs = Varset::new(size);
        vs.load_hash_string(s);
        vs
    }

    pub fn universe(&self) -> usize {
        self.size
    }

    pub fn set(&mut self, i: usize) {
        debug_assert!(i < self.size);
        self.bits.insert(i as u32);
    }

    pub fn clear(&mut self, i: usize) {
        debug_assert!(i < self.size);
        self.bits.remove(i as u32);
    }

    pub fn contains(&self, i: usize) -> bool {
        self.bits.contains(i as u32)
    }

    pub fn count(&self) -> usize {
        self.bits.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn is_superset(&self, other: &Varset) -> bool {
        debug_assert_eq!(self.size, other.size);
        other.bits.is_subset(&self.bits)
    }

    pub fn set_ints(&mut self, vars: &[usize]) {
        for &v in vars {
            self.set(v);
        }
    }

    /// Member indices in ascending order.
    pub fn dump_as_ints(&self) -> Vec<usize> {
        self.bits.iter().map(|i| i as usize).collect()
    }

    /// A stable fingerprint usable as a mapping key: the member indices in
    /// decimal, joined by commas. Two varsets with the same bits produce the
    /// same string across program runs; the empty set maps to the empty
    /// string.
    pub fn dump_hash_string(&self) -> String {
        self.bits.iter().join(",")
    }

    pub fn load_hash_string(&mut self, s: &str) {
        self.bits.clear();
        if s.is_empty() {
            return;
        }
        for token in s.split(',') {
            let i: usize = token.parse().expect("malformed varset hash string");
            self.set(i);
        }
    }

    pub fn intersection(&self, other: &Varset) -> Varset {
        debug_assert_eq!(self.size, other.size);
        Varset {
            size: self.size,
            bits: &self.bits & &other.bits,
        }
    }

    pub fn difference(&self, other: &Varset) -> Varset {
        debug_assert_eq!(self.size, other.size);
        Varset {
            size: self.size,
            bits: &self.bits - &other.bits,
        }
    }
}

impl PartialEq for Varset {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.bits == other.bits
    }
}
impl Eq for Varset {}

impl fmt::Display for Varset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.bits.iter().join(" "))
    }
}
