//! Stable exit codes for fsm CLI commands.

/// Command succeeded, or `fsm test` accepted the word.
pub const OK: i32 = 0;
/// Command failed due to an unreadable file, bad config, or other errors.
pub const INVALID: i32 = 1;
/// `fsm test` rejected the word.
pub const REJECTED: i32 = 2;
/// The automaton has no initial state, so nothing could be run.
pub const NO_INITIAL_STATE: i32 = 3;
