//! Test-only helpers for constructing automata and `.fsm` files.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::automaton::Automaton;
use crate::core::state::State;
use crate::core::symbol::Symbol;
use crate::core::transition::Transition;
use crate::io::fsm_file::{FsmDocument, save_fsm};

/// Build an automaton from transition triples.
///
/// States are registered in order of first mention; `initial` gets the initial
/// flag and every label in `accepting` the accepting flag.
pub fn automaton(initial: &str, accepting: &[&str], transitions: &[(&str, Symbol, &str)]) -> Automaton {
    let mut fsm = Automaton::new();
    let register = |fsm: &mut Automaton, label: &str| {
        fsm.add_state(
            State::new(label)
                .with_initial(label == initial)
                .with_accepting(accepting.contains(&label)),
        );
    };
    register(&mut fsm, initial);
    for (from, symbol, to) in transitions {
        register(&mut fsm, from);
        register(&mut fsm, to);
        if let Symbol::Char(c) = symbol {
            fsm.add_symbol(*c);
        }
    }
    for &(from, symbol, to) in transitions {
        fsm.add_transition(Transition::new(from, symbol, to));
    }
    fsm
}

/// `Q0 --0--> Q1`, with `Q1` accepting.
pub fn single_zero() -> Automaton {
    automaton("Q0", &["Q1"], &[("Q0", Symbol::Char('0'), "Q1")])
}

/// `Q0 --0--> Q1 --1--> Q2`, with `Q2` accepting.
pub fn zero_then_one() -> Automaton {
    automaton(
        "Q0",
        &["Q2"],
        &[
            ("Q0", Symbol::Char('0'), "Q1"),
            ("Q1", Symbol::Char('1'), "Q2"),
        ],
    )
}

/// Nondeterministic: words over `{0,1}` ending in `1`.
pub fn ends_with_one() -> Automaton {
    automaton(
        "Q0",
        &["Q1"],
        &[
            ("Q0", Symbol::Char('0'), "Q0"),
            ("Q0", Symbol::Char('1'), "Q0"),
            ("Q0", Symbol::Char('1'), "Q1"),
        ],
    )
}

/// A single non-accepting state with an ε self-loop.
pub fn epsilon_self_loop() -> Automaton {
    automaton("Q0", &[], &[("Q0", Symbol::Epsilon, "Q0")])
}

/// `Q0` and `Q1` joined by an ε-cycle; `a` loops on `Q0`, `b` leads to accepting `Q2`.
pub fn epsilon_cycle() -> Automaton {
    automaton(
        "Q0",
        &["Q2"],
        &[
            ("Q0", Symbol::Epsilon, "Q1"),
            ("Q1", Symbol::Epsilon, "Q0"),
            ("Q0", Symbol::Char('a'), "Q0"),
            ("Q1", Symbol::Char('b'), "Q2"),
        ],
    )
}

/// Every path splits in two on each `a`.
pub fn doubling() -> Automaton {
    automaton(
        "Q0",
        &["Q1"],
        &[
            ("Q0", Symbol::Char('a'), "Q0"),
            ("Q0", Symbol::Char('a'), "Q1"),
            ("Q1", Symbol::Char('a'), "Q0"),
            ("Q1", Symbol::Char('a'), "Q1"),
        ],
    )
}

/// One state looping on `a`: exactly one path, one step per symbol.
pub fn counting_loop() -> Automaton {
    automaton("Q0", &["Q0"], &[("Q0", Symbol::Char('a'), "Q0")])
}

/// Write `automaton` as `<dir>/<name>.fsm` and return the file path.
pub fn write_fsm(dir: &Path, name: &str, automaton: &Automaton) -> Result<PathBuf> {
    let path = dir.join(format!("{name}.fsm"));
    save_fsm(&path, &FsmDocument::from_automaton(automaton))?;
    Ok(path)
}
