/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

extern crate rand;
extern crate thiserror;

pub mod whippet;

pub use whippet::bn_structure::{write_solution, BNStructure};
pub use whippet::dag_learner::{
    approximated_learning, sample_partial_orders, set_parents_from_order, InitialDagLearner,
    PartialOrder, RestartedProjection,
};
pub use whippet::dandelion::{code_distance, CharTree, CodeDistance, CodePair, DandelionCode};
pub use whippet::error::{BTWError, BTWResult};
pub use whippet::iterative_search::IterativeSearch;
pub use whippet::ktree::{KTree, KTreeNode, VarSwap};
pub use whippet::mutual_info::MutInfo;
pub use whippet::optimizer::Optimizer;
pub use whippet::ranker::{ListRanker, ScoreRanker};
pub use whippet::record::{Record, RecordHeap};
pub use whippet::sample_search::SampleSearch;
pub use whippet::score_cache::ScoreCache;
pub use whippet::select_sample_search::SelectSampleSearch;
pub use whippet::test_utils::FakeRanker;
pub use whippet::varset::Varset;
