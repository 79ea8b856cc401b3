//! Decide a word by driving the step engine until no path is left.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::core::automaton::Automaton;
use crate::core::path::Path;
use crate::core::step::{StepOptions, advance};
use crate::core::types::SimulationError;

/// Outcome of an exhaustive run over one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub word: String,
    /// True iff at least one path ended in acceptance.
    pub accepted: bool,
    /// Accepted paths, de-duplicated, in the order they were found.
    pub accepted_paths: Vec<Path>,
    /// Rejected and stuck paths, de-duplicated, in the order they were found.
    pub rejected_paths: Vec<Path>,
    /// True if an ε-loop was cut somewhere in the search.
    pub did_loop: bool,
    /// Generations advanced before the frontier emptied.
    pub generations: usize,
}

/// Explore every computation of `automaton` on `word`.
///
/// Terminates on every automaton: looping children are never admitted, and
/// without loops each generation either consumes input or shortens the
/// remaining ε-reachable state set of a path.
pub fn run(automaton: &Automaton, word: &str) -> Result<RunReport, SimulationError> {
    let initial = automaton
        .initial_state()
        .ok_or(SimulationError::NoInitialState)?
        .label()
        .clone();

    let mut accepted: IndexSet<Path> = IndexSet::new();
    let mut rejected: IndexSet<Path> = IndexSet::new();
    let mut did_loop = false;
    let mut generations = 0usize;
    let mut paths = vec![Path::start(initial, word)];

    while !paths.is_empty() {
        let generation = advance(automaton, paths, StepOptions::EXHAUSTIVE);
        generations += 1;
        if generation.loops_found > 0 {
            did_loop = true;
        }
        for ended in generation.ended {
            if ended.verdict.is_accepted() {
                accepted.insert(ended.path);
            } else {
                rejected.insert(ended.path);
            }
        }
        debug!(
            generation = generations,
            active = generation.continuing.len(),
            accepted = accepted.len(),
            rejected = rejected.len(),
            "advanced generation"
        );
        paths = generation.continuing;
    }

    Ok(RunReport {
        word: word.to_string(),
        accepted: !accepted.is_empty(),
        accepted_paths: accepted.into_iter().collect(),
        rejected_paths: rejected.into_iter().collect(),
        did_loop,
        generations,
    })
}
