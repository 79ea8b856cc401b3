//! One-shot acceptance test for `fsm test`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::automaton::Automaton;
use crate::core::exhaustive::{RunReport, run};
use crate::core::symbol::EPSILON;
use crate::core::types::SimulationError;
use crate::exit_codes;
use crate::io::fsm_file::load_fsm;

/// Structured result of testing one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Accepted(RunReport),
    Rejected(RunReport),
    /// Nothing was run.
    NoInitialState,
}

impl TestOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            TestOutcome::Accepted(_) => exit_codes::OK,
            TestOutcome::Rejected(_) => exit_codes::REJECTED,
            TestOutcome::NoInitialState => exit_codes::NO_INITIAL_STATE,
        }
    }

    pub fn report(&self) -> Option<&RunReport> {
        match self {
            TestOutcome::Accepted(report) | TestOutcome::Rejected(report) => Some(report),
            TestOutcome::NoInitialState => None,
        }
    }

    /// Human-readable summary: verdict, then the paths that justify it.
    ///
    /// The path heading carries a `*` when an ε-cycle was cut, meaning the
    /// listed paths are representatives of infinitely many.
    pub fn render(&self) -> String {
        let Some(report) = self.report() else {
            return "No initial state defined\n".to_string();
        };
        let word = if report.word.is_empty() {
            EPSILON
        } else {
            report.word.as_str()
        };
        let (verdict, heading, paths) = if report.accepted {
            ("Accepted", "Accepted Paths", &report.accepted_paths)
        } else {
            ("Rejected", "Rejected Paths", &report.rejected_paths)
        };
        let marker = if report.did_loop { "*" } else { "" };

        let mut out = format!("Result: '{word}' has been {verdict}!\n{heading}{marker}\n");
        for path in paths {
            out.push_str(&format!("{path}\n"));
        }
        out
    }
}

/// Test `word` against an in-memory automaton.
pub fn test_word(automaton: &Automaton, word: &str) -> Result<TestOutcome> {
    match run(automaton, word) {
        Ok(report) => {
            info!(
                word,
                accepted = report.accepted,
                did_loop = report.did_loop,
                "word tested"
            );
            if report.accepted {
                Ok(TestOutcome::Accepted(report))
            } else {
                Ok(TestOutcome::Rejected(report))
            }
        }
        Err(SimulationError::NoInitialState) => Ok(TestOutcome::NoInitialState),
        Err(err) => Err(err).context("test word"),
    }
}

/// Load an `.fsm` file and test `word` against it.
pub fn test_word_from_file(path: &Path, word: &str) -> Result<TestOutcome> {
    let doc = load_fsm(path).with_context(|| "load automaton for testing")?;
    test_word(&doc.to_automaton(), word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{epsilon_cycle, single_zero, write_fsm};

    #[test]
    fn accepted_word_lists_accepted_paths() {
        let outcome = test_word(&single_zero(), "0").expect("test");
        assert_eq!(outcome.exit_code(), exit_codes::OK);
        assert_eq!(
            outcome.render(),
            "Result: '0' has been Accepted!\nAccepted Paths\n(Q0,0), (Q1,ε)\n"
        );
    }

    #[test]
    fn empty_word_renders_as_epsilon() {
        let outcome = test_word(&single_zero(), "").expect("test");
        assert_eq!(outcome.exit_code(), exit_codes::REJECTED);
        assert_eq!(
            outcome.render(),
            "Result: 'ε' has been Rejected!\nRejected Paths\n(Q0,ε)\n"
        );
    }

    #[test]
    fn cut_cycles_mark_the_heading() {
        let outcome = test_word(&epsilon_cycle(), "b").expect("test");
        assert_eq!(outcome.exit_code(), exit_codes::OK);
        assert!(outcome.render().contains("Accepted Paths*\n"));
    }

    #[test]
    fn missing_initial_state_has_its_own_code() {
        let mut fsm = single_zero();
        fsm.set_initial_state(None);
        let outcome = test_word(&fsm, "0").expect("test");
        assert_eq!(outcome, TestOutcome::NoInitialState);
        assert_eq!(outcome.exit_code(), exit_codes::NO_INITIAL_STATE);
    }

    #[test]
    fn loads_from_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_fsm(temp.path(), "single", &single_zero()).expect("write");
        let outcome = test_word_from_file(&path, "0").expect("test");
        assert!(matches!(outcome, TestOutcome::Accepted(_)));
    }
}
