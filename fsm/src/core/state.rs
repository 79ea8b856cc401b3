//! Automaton states, identified by label.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shared, cheaply clonable state label. Paths hold many copies of these.
pub type Label = Arc<str>;

/// A state of the automaton.
///
/// Equality, hashing, and ordering consider the label only; the flags are
/// attributes owned by the automaton that contains the state.
#[derive(Debug, Clone)]
pub struct State {
    label: Label,
    initial: bool,
    accepting: bool,
}

impl State {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            initial: false,
            accepting: false,
        }
    }

    pub fn with_initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_accepting(mut self, accepting: bool) -> Self {
        self.accepting = accepting;
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub(crate) fn set_initial(&mut self, value: bool) {
        self.initial = value;
    }

    pub(crate) fn set_accepting(&mut self, value: bool) {
        self.accepting = value;
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_labels(&self.label, &other.label)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)?;
        if self.initial {
            f.write_str(" (initial)")?;
        }
        Ok(())
    }
}

/// Order labels by their numeric suffix (`Q2 < Q10`), falling back to plain
/// string order when either label has no numeric suffix.
///
/// The suffix is everything after the first character. Equal suffixes with
/// different spellings (`Q1` vs `Q01`) are ordered lexically so the result
/// stays consistent with label equality.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (numeric_suffix(a), numeric_suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// Parse the id of a `Q<n>`-style label: the integer after the first character.
pub(crate) fn numeric_suffix(label: &str) -> Option<u64> {
    let mut chars = label.chars();
    chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
