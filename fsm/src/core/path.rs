//! Computation paths: alternating machine states and residual input.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::core::state::Label;
use crate::core::symbol::EPSILON;
use crate::core::transition::endpoint_key;

/// One `(state, residual input)` pair of a path.
///
/// The residual is stored as the number of input characters consumed so far;
/// the unread suffix is recovered from the path's word.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub state: Label,
    pub consumed: usize,
}

/// One candidate computation of the automaton on a word.
///
/// A path always holds at least one step. Steps are only ever appended by the
/// step engine or removed from the tail when stepping backward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    word: Arc<[char]>,
    steps: Vec<PathStep>,
}

impl Path {
    /// A fresh path at `initial` with the whole of `word` unread.
    pub fn start(initial: Label, word: &str) -> Self {
        Self {
            word: word.chars().collect(),
            steps: vec![PathStep {
                state: initial,
                consumed: 0,
            }],
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of `(state, residual)` pairs.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn last(&self) -> &PathStep {
        // Paths are never emptied: `truncate_last` keeps the first step.
        &self.steps[self.steps.len() - 1]
    }

    pub fn current_state(&self) -> &Label {
        &self.last().state
    }

    /// Machine state before the most recent transition, if any.
    pub fn previous_state(&self) -> Option<&Label> {
        self.steps.len().checked_sub(2).map(|idx| &self.steps[idx].state)
    }

    pub fn consumed(&self) -> usize {
        self.last().consumed
    }

    /// The unread input. Empty once the word has been consumed.
    pub fn residual(&self) -> &[char] {
        &self.word[self.consumed().min(self.word.len())..]
    }

    pub fn next_symbol(&self) -> Option<char> {
        self.residual().first().copied()
    }

    pub fn is_input_consumed(&self) -> bool {
        self.residual().is_empty()
    }

    pub fn word_len(&self) -> usize {
        self.word.len()
    }

    /// Child path that moves to `to` after consuming `consumed` characters in total.
    pub fn extended(&self, to: Label, consumed: usize) -> Path {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(PathStep {
            state: to,
            consumed,
        });
        Path {
            word: Arc::clone(&self.word),
            steps,
        }
    }

    /// True if appending `(state, consumed)` to this path would revisit a pair
    /// already on it.
    ///
    /// The scan walks back from the tail only while the residual is unchanged:
    /// residuals never grow along a path, so once one differs no earlier pair
    /// can match.
    pub fn closes_loop(&self, state: &Label, consumed: usize) -> bool {
        for step in self.steps.iter().rev() {
            if step.consumed != consumed {
                return false;
            }
            if step.state == *state {
                return true;
            }
        }
        false
    }

    /// Drop the newest pair. Returns `false` (leaving the path intact) for a
    /// single-pair path.
    pub fn truncate_last(&mut self) -> bool {
        if self.steps.len() <= 1 {
            return false;
        }
        self.steps.pop();
        true
    }

    /// The path made of the first `pairs` pairs.
    pub fn prefix(&self, pairs: usize) -> Path {
        Path {
            word: Arc::clone(&self.word),
            steps: self.steps[..pairs.min(self.steps.len())].to_vec(),
        }
    }

    /// Ordering key: previous state label followed by current state label.
    ///
    /// Matches [`crate::core::transition::Transition::cmp_endpoints`] for the
    /// transition that produced the newest pair.
    pub fn sort_key(&self) -> String {
        let previous = self.previous_state().map(AsRef::as_ref).unwrap_or("");
        endpoint_key(previous, self.current_state())
    }

    fn residual_at(&self, step: &PathStep) -> String {
        let rest = &self.word[step.consumed.min(self.word.len())..];
        if rest.is_empty() {
            EPSILON.to_string()
        } else {
            rest.iter().collect()
        }
    }
}

/// Stable-sort paths by [`Path::sort_key`]; equal keys keep their order.
pub fn sort_paths(paths: &mut [Path]) {
    paths.sort_by_cached_key(Path::sort_key);
}

/// Remove repeated paths, keeping the first occurrence of each.
pub fn dedup_paths(paths: &mut Vec<Path>) {
    let mut seen = std::collections::HashSet::with_capacity(paths.len());
    paths.retain(|path| seen.insert(path.clone()));
}

impl fmt::Display for Path {
    /// Renders as `(Q0,010), (Q1,10), (Q2,0), (Q2,ε)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({},{})", step.state, self.residual_at(step))?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Label {
        Label::from(s)
    }

    #[test]
    fn empty_word_renders_as_epsilon() {
        let path = Path::start(label("Q0"), "");
        assert!(path.is_input_consumed());
        assert_eq!(path.to_string(), "(Q0,ε)");
    }

    #[test]
    fn renders_pairs_in_order() {
        let path = Path::start(label("Q0"), "010")
            .extended(label("Q1"), 1)
            .extended(label("Q2"), 2)
            .extended(label("Q2"), 3);
        assert_eq!(path.to_string(), "(Q0,010), (Q1,10), (Q2,0), (Q2,ε)");
    }

    #[test]
    fn loop_scan_finds_repeated_pair() {
        let path = Path::start(label("Q0"), "0").extended(label("Q1"), 0);
        assert!(path.closes_loop(&label("Q0"), 0));
        assert!(path.closes_loop(&label("Q1"), 0));
        assert!(!path.closes_loop(&label("Q2"), 0));
    }

    #[test]
    fn loop_scan_stops_at_first_residual_change() {
        // Q0 appears with the same residual, but behind a pair with a different one.
        let path = Path::start(label("Q0"), "00")
            .extended(label("Q0"), 1)
            .extended(label("Q1"), 0);
        assert!(!path.closes_loop(&label("Q0"), 0));
    }

    #[test]
    fn truncate_keeps_first_pair() {
        let mut path = Path::start(label("Q0"), "0").extended(label("Q1"), 1);
        assert!(path.truncate_last());
        assert_eq!(path, Path::start(label("Q0"), "0"));
        assert!(!path.truncate_last());
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn sort_key_uses_previous_and_current_state() {
        let root = Path::start(label("Q0"), "0");
        assert_eq!(root.sort_key(), "Q0");
        assert_eq!(root.extended(label("Q3"), 1).sort_key(), "Q0Q3");
    }

    #[test]
    fn sort_is_stable_on_equal_keys() {
        let root = Path::start(label("Q0"), "ab");
        let first = root.extended(label("Q1"), 1);
        let second = root.extended(label("Q1"), 0);
        let third = root.extended(label("Q0"), 1);
        let mut paths = vec![first.clone(), second.clone(), third.clone()];
        sort_paths(&mut paths);
        assert_eq!(paths, vec![third, first, second]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = Path::start(label("Q0"), "0");
        let b = a.extended(label("Q1"), 1);
        let mut paths = vec![b.clone(), a.clone(), b.clone()];
        dedup_paths(&mut paths);
        assert_eq!(paths, vec![b, a]);
    }
}
