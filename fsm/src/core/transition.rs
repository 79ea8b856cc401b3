//! Labelled transitions between states.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::core::state::Label;
use crate::core::symbol::Symbol;

/// A `(from, symbol, to)` triple. The triple is the transition's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Transition {
    #[serde(serialize_with = "serialize_label")]
    from: Label,
    symbol: Symbol,
    #[serde(serialize_with = "serialize_label")]
    to: Label,
}

impl Transition {
    pub fn new(from: impl Into<Label>, symbol: Symbol, to: impl Into<Label>) -> Self {
        Self {
            from: from.into(),
            symbol,
            to: to.into(),
        }
    }

    pub fn from_label(&self) -> &Label {
        &self.from
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn to_label(&self) -> &Label {
        &self.to
    }

    /// Order transitions by the concatenation `from + to`.
    ///
    /// This is the same key used to order paths (previous state + current
    /// state), which keeps per-step transition history index-aligned with the
    /// path list it produced.
    pub fn cmp_endpoints(&self, other: &Self) -> Ordering {
        endpoint_key(&self.from, &self.to).cmp(&endpoint_key(&other.from, &other.to))
    }
}

pub(crate) fn endpoint_key(from: &str, to: &str) -> String {
    let mut key = String::with_capacity(from.len() + to.len());
    key.push_str(from);
    key.push_str(to);
    key
}

fn serialize_label<S: serde::Serializer>(label: &Label, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(label)
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  \u{2501}\u{3014} {} \u{3015}\u{2501}\u{2B9E}  {}",
            self.from, self.symbol, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_triples_are_equal() {
        let a = Transition::new("Q0", Symbol::Char('a'), "Q1");
        let b = Transition::new("Q0", Symbol::Char('a'), "Q1");
        assert_eq!(a, b);
        assert_eq!(a.cmp_endpoints(&b), Ordering::Equal);
    }

    #[test]
    fn symbol_is_part_of_identity() {
        let a = Transition::new("Q0", Symbol::Char('a'), "Q1");
        let b = Transition::new("Q0", Symbol::Epsilon, "Q1");
        assert_ne!(a, b);
        // Endpoint order ignores the symbol.
        assert_eq!(a.cmp_endpoints(&b), Ordering::Equal);
    }

    #[test]
    fn endpoint_order_concatenates_labels() {
        let a = Transition::new("Q0", Symbol::Char('a'), "Q2");
        let b = Transition::new("Q1", Symbol::Char('a'), "Q0");
        assert_eq!(a.cmp_endpoints(&b), Ordering::Less);
    }
}
