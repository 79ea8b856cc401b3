//! The step engine: advance every active path by one transition.
//!
//! A generation is advanced in one pass over the active paths. Each path
//! either spawns one child per applicable transition or, when nothing
//! applies, ends with a [`Verdict`]. Children that would revisit a
//! `(state, residual)` pair already on their parent are detected here;
//! whether they are kept is the caller's choice ([`LoopPolicy`]).

use tracing::trace;

use crate::core::automaton::Automaton;
use crate::core::path::Path;
use crate::core::transition::Transition;
use crate::core::types::{PathStatus, Verdict};

/// What to do with a child path that closes an ε-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Drop it, so the search space stays finite.
    Discard,
    /// Keep it; the caller bounds the run some other way.
    Admit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    pub loops: LoopPolicy,
    /// Scan new children for loops at all.
    pub detect_loops: bool,
    /// When a path has consumed its input but can still take ε-moves, also
    /// end it where it stands (the word may be decided right here).
    pub settle_consumed_input: bool,
}

impl StepOptions {
    /// Settings for deciding a word exhaustively.
    pub const EXHAUSTIVE: StepOptions = StepOptions {
        loops: LoopPolicy::Discard,
        detect_loops: true,
        settle_consumed_input: true,
    };

    /// Settings for step-by-step simulation; `detect_loops` is switched off
    /// by the simulator once the first loop has been reported.
    pub const INTERACTIVE: StepOptions = StepOptions {
        loops: LoopPolicy::Admit,
        detect_loops: true,
        settle_consumed_input: false,
    };
}

/// A path that ended during a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedPath {
    pub path: Path,
    pub verdict: Verdict,
}

/// Result of advancing one generation.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Children still in flight, in the order they were produced.
    pub continuing: Vec<Path>,
    /// Parents that ended this generation.
    pub ended: Vec<EndedPath>,
    /// Transition taken for each admitted child, index-aligned with `continuing`.
    pub transitions: Vec<Transition>,
    /// First child found to close a loop.
    pub first_loop: Option<Path>,
    pub loops_found: usize,
}

/// Advance `paths` by one transition each.
pub fn advance(automaton: &Automaton, paths: Vec<Path>, options: StepOptions) -> Generation {
    let mut generation = Generation::default();

    for path in paths {
        let label = path.current_state().clone();
        let accepting = automaton.state(&label).is_some_and(|s| s.is_accepting());
        let outgoing = automaton.outgoing_transitions(&label).unwrap_or_default();
        let next = path.next_symbol();
        let mut dead_end = true;

        for transition in outgoing {
            if !transition.symbol().matches(next) {
                continue;
            }
            dead_end = false;

            let consumed = if transition.symbol().is_epsilon() {
                path.consumed()
            } else {
                path.consumed() + 1
            };
            let looping =
                options.detect_loops && path.closes_loop(transition.to_label(), consumed);
            let child = path.extended(transition.to_label().clone(), consumed);

            if looping {
                trace!(path = %child, "child closes a loop");
                generation.loops_found += 1;
                if generation.first_loop.is_none() {
                    generation.first_loop = Some(child.clone());
                }
            }
            if !looping || options.loops == LoopPolicy::Admit {
                generation.continuing.push(child);
                generation.transitions.push(transition.clone());
            }

            if options.settle_consumed_input && next.is_none() {
                generation.ended.push(EndedPath {
                    path: path.clone(),
                    verdict: settled_verdict(accepting),
                });
            }
        }

        if dead_end {
            let verdict = match next {
                None => settled_verdict(accepting),
                Some(_) => Verdict::Stuck,
            };
            generation.ended.push(EndedPath { path, verdict });
        }
    }

    generation
}

fn settled_verdict(accepting: bool) -> Verdict {
    if accepting {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    }
}

/// Classify a path on the interactive frontier.
///
/// A path whose input is consumed counts as ended even if ε-moves remain.
pub fn frontier_status(automaton: &Automaton, path: &Path) -> PathStatus {
    let accepting = automaton
        .state(path.current_state())
        .is_some_and(|s| s.is_accepting());
    let Some(next) = path.next_symbol() else {
        return settled_verdict(accepting).into();
    };
    let can_move = automaton
        .outgoing_transitions(path.current_state())
        .unwrap_or_default()
        .iter()
        .any(|t| t.symbol().matches(Some(next)));
    if can_move {
        PathStatus::Active
    } else {
        PathStatus::Stuck
    }
}
