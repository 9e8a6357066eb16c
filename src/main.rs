/*
 * Copyright (c) Facebook, Inc. and its affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */
extern crate clap;
extern crate env_logger;
extern crate lib_whippet;
extern crate log;

use clap::{App, Arg, ArgMatches, SubCommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;

use lib_whippet::whippet::bn_structure::write_solution;
use lib_whippet::whippet::error::BTWResult;
use lib_whippet::whippet::mutual_info::MutInfo;
use lib_whippet::whippet::optimizer::{self, Optimizer};
use lib_whippet::whippet::ranker::{ListRanker, ScoreRanker};
use lib_whippet::whippet::score_cache::ScoreCache;
use lib_whippet::whippet::varset::Varset;

fn get_command_line_args() -> ArgMatches<'static> {
    App::new("Whippet")
        .version("0.1.0")
        .about("Learns bounded tree-width Bayesian network structures from precomputed scores.")
        .subcommand(
            SubCommand::with_name("struct")
                .about("run the bounded tree-width structure learning search")
                .arg(
                    Arg::with_name("scores")
                        .short("s")
                        .long("scores")
                        .takes_value(true)
                        .help("Precomputed scores file (PSS format)"),
                )
                .arg(
                    Arg::with_name("parameters")
                        .short("p")
                        .long("parameters")
                        .takes_value(true)
                        .help("Parameters file (JSON object of algorithm settings)"),
                )
                .arg(
                    Arg::with_name("bnet")
                        .short("b")
                        .long("bnet")
                        .takes_value(true)
                        .help("Network output file (stdout when omitted)"),
                )
                .arg(
                    Arg::with_name("algorithm")
                        .short("a")
                        .long("algorithm")
                        .takes_value(true)
                        .default_value("sample")
                        .help("Structure optimizer algorithm {sample|selected|iterative}"),
                )
                .arg(
                    Arg::with_name("time")
                        .short("t")
                        .long("time")
                        .takes_value(true)
                        .default_value("60")
                        .help("Available time in seconds to search for a solution (0 = unbounded)"),
                )
                .arg(
                    Arg::with_name("iterations")
                        .short("i")
                        .long("iterations")
                        .takes_value(true)
                        .default_value("1")
                        .help("Max number of search iterations (0 = unbounded)"),
                )
                .arg(
                    Arg::with_name("max_parents")
                        .short("m")
                        .long("max-parents")
                        .takes_value(true)
                        .help("Max number of parents per variable (0 = unbounded)"),
                )
                .arg(
                    Arg::with_name("verbose")
                        .short("v")
                        .long("verbose")
                        .help("Prints detailed steps"),
                ),
        )
        .subcommand(
            SubCommand::with_name("mutinf")
                .about("computes pairwise mutual information from a dataset")
                .arg(
                    Arg::with_name("dataset")
                        .short("d")
                        .long("dataset")
                        .takes_value(true)
                        .help("Dataset file in CSV format"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("File to save the mutual information matrix"),
                )
                .arg(
                    Arg::with_name("verbose")
                        .short("v")
                        .long("verbose")
                        .help("Prints detailed steps"),
                ),
        )
        .get_matches()
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn main() {
    let matches = get_command_line_args();
    let code = match matches.subcommand() {
        ("struct", Some(sub)) => run_struct(sub),
        ("mutinf", Some(sub)) => run_mutinf(sub),
        _ => {
            eprintln!("whippet is a tool for learning bounded tree-width Bayesian networks");
            eprintln!();
            eprintln!("Usage:");
            eprintln!("\twhippet <command> [options]");
            eprintln!();
            eprintln!("Commands:");
            eprintln!("\tstruct\t\trun the bounded tree-width structure learning search");
            eprintln!("\tmutinf\t\tcomputes pairwise mutual information");
            eprintln!();
            eprintln!("For usage details of each command, run:");
            eprintln!("\twhippet <command> --help");
            1
        }
    };
    std::process::exit(code);
}

fn run_struct(matches: &ArgMatches) -> i32 {
    let score_file = match matches.value_of("scores") {
        Some(path) => path.to_owned(),
        None => {
            eprintln!("error: missing score file");
            return 1;
        }
    };
    init_logger(matches.is_present("verbose"));

    let run = || -> BTWResult<()> {
        let alg = matches.value_of("algorithm").unwrap_or("sample");
        let time_seconds: u64 = matches.value_of("time").unwrap_or("60").parse()?;
        let num_solutions: usize = matches.value_of("iterations").unwrap_or("1").parse()?;
        let parm_file = matches.value_of("parameters");
        let bnet_file = matches.value_of("bnet");

        log::info!(" ========== STEP: STRUCTURE OPTIMIZATION ========== ");
        log::info!("Learning algorithm: '{}'", alg);
        log::info!("Max. iterations: {}", num_solutions);
        log::info!("Max. time available (sec): {}", time_seconds);
        log::info!("Pre-computed scores file: '{}'", score_file);
        log::info!("Parameters file: '{}'", parm_file.unwrap_or(""));
        log::info!("Save solution in: '{}'", bnet_file.unwrap_or(""));
        log::info!(" -------------------------------------------------- ");

        let parms = match parm_file {
            Some(path) => optimizer::read_parameters_file(path)?,
            None => HashMap::new(),
        };
        let max_parents: usize = match matches.value_of("max_parents") {
            Some(mp) => mp.parse()?,
            None => match parms.get(optimizer::PARM_MAX_PARENTS) {
                Some(mp) => mp.parse()?,
                None => 0,
            },
        };

        log::info!("Reading score cache");
        let cache = ScoreCache::from_file(&score_file)?;
        log::info!("Creating score ranker");
        let ranker = Arc::new(ListRanker::from_cache(cache, max_parents)?);
        let names = ranker.var_names().to_vec();
        let empty_score = empty_set_score(ranker.as_ref());

        log::info!("Creating bounded-treewidth structure learning algorithm");
        let algorithm = optimizer::create(alg, ranker, &parms)?;
        algorithm.print_parameters();
        let treewidth = algorithm.treewidth();

        log::info!("Searching bounded-treewidth structure");
        let start = Instant::now();
        let solution = optimizer::search(algorithm, num_solutions, time_seconds);
        let elapsed = start.elapsed();

        log::info!(" ========== SOLUTION ============================ ");
        match solution {
            None => {
                log::info!("Couldn't find any solution in the given time!");
            }
            Some(bn) => {
                let tot_score = bn.score();
                log::info!("Time: {:?}", elapsed);
                log::info!("Best Score: {:.6}", tot_score);
                log::info!(
                    "Normalized: {:.6}",
                    (tot_score - empty_score) / empty_score.abs()
                );
                match bnet_file {
                    Some(path) => {
                        log::info!("Printing solution: '{}'", path);
                        let out = BufWriter::new(File::create(path)?);
                        write_solution(out, &bn, &names, treewidth)?;
                    }
                    None => {
                        let stdout = io::stdout();
                        write_solution(stdout.lock(), &bn, &names, treewidth)?;
                    }
                }
            }
        }
        log::info!(" -------------------------------------------------- ");
        Ok(())
    };

    match run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("whippet: {}", err);
            1
        }
    }
}

fn run_mutinf(matches: &ArgMatches) -> i32 {
    let data_file = match matches.value_of("dataset") {
        Some(path) => path.to_owned(),
        None => {
            eprintln!("error: missing dataset file");
            return 1;
        }
    };
    let out_file = match matches.value_of("output") {
        Some(path) => path.to_owned(),
        None => {
            eprintln!("error: missing output file");
            return 1;
        }
    };
    init_logger(matches.is_present("verbose"));

    let run = || -> BTWResult<()> {
        log::info!(" ========== COMPUTING MUTUAL INFORMATION ========== ");
        log::info!("Dataset file: '{}'", data_file);
        log::info!("Save values in: '{}'", out_file);
        log::info!(" -------------------------------------------------- ");

        let start = Instant::now();
        let mi = MutInfo::from_dataset(BufReader::new(File::open(&data_file)?))?;
        let mut out = BufWriter::new(File::create(&out_file)?);
        mi.write(&mut out)?;
        out.flush()?;
        log::info!("Time: {:?}", start.elapsed());
        Ok(())
    };

    match run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("whippet: {}", err);
            1
        }
    }
}

// The total score when every variable keeps the empty family; used to
// normalize the reported solution score.
fn empty_set_score(ranker: &dyn ScoreRanker) -> f64 {
    let empty = Varset::new(ranker.size());
    (0..ranker.size()).map(|v| ranker.score_of(v, &empty)).sum()
}
