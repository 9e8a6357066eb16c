/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate crossbeam;
extern crate serde_json;

use crossbeam::channel;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::whippet::bn_structure::BNStructure;
use crate::whippet::error::{BTWError, BTWResult};
use crate::whippet::iterative_search::IterativeSearch;
use crate::whippet::ranker::ScoreRanker;
use crate::whippet::sample_search::SampleSearch;
use crate::whippet::select_sample_search::SelectSampleSearch;

// search algorithm names
pub const ALG_SAMPLE: &str = "sample";
pub const ALG_SELECTED: &str = "selected";
pub const ALG_ITERATIVE: &str = "iterative";

// parameter file keys
pub const PARM_TREEWIDTH: &str = "treewidth";
pub const PARM_MAX_PARENTS: &str = "max_parents";
pub const PARM_NUM_TREES: &str = "num_trees";
pub const PARM_MUTUAL_INFO: &str = "mutual_info";
pub const PARM_SEARCH_VARIATION: &str = "search_variation";
pub const PARM_INIT_ITERS: &str = "init_iters";
pub const PARM_CODE_DISTANCE: &str = "code_distance";

// search variation names
pub const OP_GREEDY: &str = "greedy";
pub const OP_ASTAR: &str = "astar";

/// A structure-search strategy. Implementations are initialized with
/// defaults, then file overrides, then validated, and are driven
/// sequentially: `search()` is never called concurrently on one instance.
pub trait Optimizer: Send {
    /// Runs one search iteration and returns the candidate network.
    fn search(&mut self) -> BNStructure;
    fn set_default_parameters(&mut self);
    fn set_file_parameters(&mut self, parms: &HashMap<String, String>) -> BTWResult<()>;
    fn validate_parameters(&self) -> BTWResult<()>;
    fn print_parameters(&self);
    fn treewidth(&self) -> usize;
}

/// Creates a fully initialized strategy from its algorithm name.
pub fn create(
    alg: &str,
    ranker: Arc<dyn ScoreRanker + Send + Sync>,
    parms: &HashMap<String, String>,
) -> BTWResult<Box<dyn Optimizer>> {
    let mut opt: Box<dyn Optimizer> = match alg {
        ALG_SAMPLE => Box::new(SampleSearch::new(ranker)),
        ALG_SELECTED => Box::new(SelectSampleSearch::new(ranker)),
        ALG_ITERATIVE => Box::new(IterativeSearch::new(ranker)),
        _ => {
            return Err(BTWError::Generic(format!(
                "invalid algorithm option: '{}'",
                alg
            )))
        }
    };
    opt.set_default_parameters();
    opt.set_file_parameters(parms)?;
    opt.validate_parameters()?;
    Ok(opt)
}

pub(crate) fn validate_treewidth(nv: usize, tw: usize) -> BTWResult<()> {
    if tw == 0 || nv < tw + 2 {
        return Err(BTWError::Generic(format!(
            "invalid treewidth: n={}, tw={}; need tw > 0 and n >= tw + 2",
            nv, tw
        )));
    }
    Ok(())
}

/// Reads a parameters file: a JSON object whose values (strings or
/// numbers) normalize to the string map the strategies consume.
pub fn read_parameters_file(path: &str) -> BTWResult<HashMap<String, String>> {
    parse_parameters(&std::fs::read_to_string(path)?)
}

pub fn parse_parameters(data: &str) -> BTWResult<HashMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    let object = value
        .as_object()
        .ok_or_else(|| BTWError::new("parameters file must hold a JSON object"))?;
    let mut parms = HashMap::new();
    for (key, val) in object {
        let text = match val.as_str() {
            Some(s) => s.to_owned(),
            None => val.to_string(),
        };
        parms.insert(key.clone(), text);
    }
    Ok(parms)
}

/// Runs a strategy under iteration and wall-clock budgets and returns the
/// best network found, if any. Zero for both budgets means one iteration.
///
/// With a time budget the strategy moves into a worker thread that streams
/// results over a channel; the driver waits for each result or the
/// deadline, whichever comes first. Once the deadline fires the receiver
/// is dropped and the in-flight iteration is abandoned: the worker notices
/// the failed send and exits on its own.
pub fn search(
    algorithm: Box<dyn Optimizer>,
    num_solutions: usize,
    time_seconds: u64,
) -> Option<BNStructure> {
    let mut algorithm = algorithm;
    let mut num_solutions = num_solutions;
    if num_solutions == 0 && time_seconds == 0 {
        num_solutions = 1;
    }

    if time_seconds == 0 {
        let mut best: Option<BNStructure> = None;
        for _ in 0..num_solutions {
            let current = algorithm.search();
            if current.better_than(best.as_ref()) {
                best = Some(current);
            }
        }
        return best;
    }

    let (sender, receiver) = channel::unbounded();
    thread::spawn(move || loop {
        let current = algorithm.search();
        if sender.send(current).is_err() {
            break;
        }
    });

    let deadline = Instant::now() + Duration::from_secs(time_seconds);
    let mut best: Option<BNStructure> = None;
    let mut completed = 0usize;
    loop {
        let now = Instant::now();
        if now >= deadline {
            log::info!("search timed out after {} completed iterations", completed);
            break;
        }
        match receiver.recv_timeout(deadline - now) {
            Ok(current) => {
                completed += 1;
                if current.better_than(best.as_ref()) {
                    best = Some(current);
                }
                if num_solutions > 0 && completed >= num_solutions {
                    break;
                }
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                log::info!("search timed out after {} completed iterations", completed);
                break;
            }
            Err(channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    best
}
