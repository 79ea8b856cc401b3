//! Finite automata with exhaustive and step-by-step simulation.
//!
//! An automaton is run on a word by tracking every computation path at once.
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (the automaton model, paths, the
//!   step engine, the exhaustive runner, the interactive simulation). No I/O,
//!   fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (`.fsm` files, configuration).
//!
//! Orchestration modules ([`test_word`], [`simulate`], [`player`]) combine core
//! logic with I/O and threads to implement the CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod player;
pub mod simulate;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod test_word;
