/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate lib_whippet;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lib_whippet::whippet::optimizer::{
    self, create, parse_parameters, ALG_ITERATIVE, ALG_SAMPLE, ALG_SELECTED, PARM_MUTUAL_INFO,
    PARM_NUM_TREES, PARM_SEARCH_VARIATION, PARM_TREEWIDTH,
};
use lib_whippet::whippet::test_utils::PSS_EXCERPT;
use lib_whippet::{BNStructure, BTWResult, ListRanker, Optimizer, ScoreCache, Varset};

/// Strategy double for driver tests: every call sleeps for a fixed delay
/// and returns a strictly better single-variable network.
struct Sleeper {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl Optimizer for Sleeper {
    fn search(&mut self) -> BNStructure {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        thread::sleep(self.delay);
        let mut bn = BNStructure::new(1);
        bn.set_parents(0, Varset::new(1), -100.0 + call as f64);
        bn
    }
    fn set_default_parameters(&mut self) {}
    fn set_file_parameters(&mut self, _parms: &HashMap<String, String>) -> BTWResult<()> {
        Ok(())
    }
    fn validate_parameters(&self) -> BTWResult<()> {
        Ok(())
    }
    fn print_parameters(&self) {}
    fn treewidth(&self) -> usize {
        0
    }
}

#[cfg(test)]
#[test]
fn test_driver_iteration_cap() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = Sleeper {
        delay: Duration::from_millis(0),
        calls: calls.clone(),
    };
    let best = optimizer::search(Box::new(sleeper), 3, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // strictly improving, so the last completion wins
    assert_eq!(best.unwrap().score(), -97.0);
}

#[test]
fn test_driver_defaults_to_one_iteration() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = Sleeper {
        delay: Duration::from_millis(0),
        calls: calls.clone(),
    };
    let best = optimizer::search(Box::new(sleeper), 0, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(best.unwrap().score(), -99.0);
}

#[test]
fn test_driver_deadline_returns_best_completed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = Sleeper {
        delay: Duration::from_millis(20),
        calls: calls.clone(),
    };
    let best = optimizer::search(Box::new(sleeper), 0, 1);
    let launched = calls.load(Ordering::SeqCst);
    assert!(launched >= 1);
    let best = best.expect("iterations completed before the deadline");
    // the driver counts completions, not launches: the in-flight call at
    // the deadline is discarded
    let completed = best.score() + 100.0;
    assert!(completed >= 1.0);
    assert!(completed >= launched as f64 - 1.0);
    assert!(completed <= launched as f64);
}

#[test]
fn test_driver_no_completion_within_budget() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = Sleeper {
        delay: Duration::from_secs(5),
        calls: calls.clone(),
    };
    let best = optimizer::search(Box::new(sleeper), 0, 1);
    assert!(best.is_none());
}

#[test]
fn test_driver_stops_at_cap_before_deadline() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sleeper = Sleeper {
        delay: Duration::from_millis(1),
        calls: calls.clone(),
    };
    let best = optimizer::search(Box::new(sleeper), 2, 30);
    assert_eq!(best.unwrap().score(), -98.0);
}

fn excerpt_ranker() -> Arc<ListRanker> {
    let cache = ScoreCache::read(PSS_EXCERPT.as_bytes()).unwrap();
    Arc::new(ListRanker::from_cache(cache, 0).unwrap())
}

fn write_temp_mi_file(tag: &str) -> String {
    let path = std::env::temp_dir().join(format!("whippet_mi_{}_{}.txt", tag, std::process::id()));
    std::fs::write(&path, "0.5\n0.05 0.5\n0.11 0.11 0.67\n").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_create_and_search_every_algorithm() {
    let mi_file = write_temp_mi_file("common");
    let algorithms: Vec<(&str, HashMap<String, String>)> = vec![
        (ALG_SAMPLE, {
            let mut parms = HashMap::new();
            parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
            parms
        }),
        (ALG_ITERATIVE, {
            let mut parms = HashMap::new();
            parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
            parms.insert(PARM_SEARCH_VARIATION.to_owned(), "greedy".to_owned());
            parms
        }),
        (ALG_ITERATIVE, {
            let mut parms = HashMap::new();
            parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
            parms.insert(PARM_SEARCH_VARIATION.to_owned(), "astar".to_owned());
            parms
        }),
        (ALG_SELECTED, {
            let mut parms = HashMap::new();
            parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
            parms.insert(PARM_NUM_TREES.to_owned(), "2".to_owned());
            parms.insert(PARM_MUTUAL_INFO.to_owned(), mi_file.clone());
            parms
        }),
    ];
    for (alg, parms) in algorithms {
        let algorithm = create(alg, excerpt_ranker(), &parms).unwrap();
        assert_eq!(algorithm.treewidth(), 1);
        let bn = optimizer::search(algorithm, 2, 0).unwrap();
        assert_eq!(bn.size(), 3, "algorithm '{}' built a wrong-sized net", alg);
        assert!(bn.score() > std::f64::NEG_INFINITY);
        // no better than the best possible total, no worse than all-empty
        assert!(bn.score() <= -4.0 + 1e-9);
        assert!(bn.score() >= -21.0 - 1e-9);
    }
    let _ = std::fs::remove_file(&mi_file);
}

#[test]
fn test_create_rejects_bad_configurations() {
    // unknown algorithm
    assert!(create("anneal", excerpt_ranker(), &HashMap::new()).is_err());

    // treewidth too large for three variables (needs n >= tw + 2)
    let mut parms = HashMap::new();
    parms.insert(PARM_TREEWIDTH.to_owned(), "2".to_owned());
    assert!(create(ALG_SAMPLE, excerpt_ranker(), &parms).is_err());

    // zero treewidth
    let mut parms = HashMap::new();
    parms.insert(PARM_TREEWIDTH.to_owned(), "0".to_owned());
    assert!(create(ALG_SAMPLE, excerpt_ranker(), &parms).is_err());

    // selected sampling without a mutual information file
    let mut parms = HashMap::new();
    parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
    assert!(create(ALG_SELECTED, excerpt_ranker(), &parms).is_err());

    // invalid search variation
    let mut parms = HashMap::new();
    parms.insert(PARM_TREEWIDTH.to_owned(), "1".to_owned());
    parms.insert(PARM_SEARCH_VARIATION.to_owned(), "simulated".to_owned());
    assert!(create(ALG_ITERATIVE, excerpt_ranker(), &parms).is_err());

    // unparsable numeric field
    let mut parms = HashMap::new();
    parms.insert(PARM_TREEWIDTH.to_owned(), "three".to_owned());
    assert!(create(ALG_SAMPLE, excerpt_ranker(), &parms).is_err());
}

#[test]
fn test_parse_parameters() {
    let parms = parse_parameters(
        "{\"treewidth\": 4, \"search_variation\": \"astar\", \"num_trees\": \"7\"}",
    )
    .unwrap();
    assert_eq!(parms.get(PARM_TREEWIDTH).map(String::as_str), Some("4"));
    assert_eq!(
        parms.get(PARM_SEARCH_VARIATION).map(String::as_str),
        Some("astar")
    );
    assert_eq!(parms.get(PARM_NUM_TREES).map(String::as_str), Some("7"));

    assert!(parse_parameters("[1, 2, 3]").is_err());
    assert!(parse_parameters("treewidth: 4").is_err());
}
