//! Deterministic, pure logic for automata and their simulation.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod automaton;
pub mod exhaustive;
pub mod path;
pub mod simulation;
pub mod speed;
pub mod state;
pub mod step;
pub mod symbol;
pub mod transition;
pub mod types;
