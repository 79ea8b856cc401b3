//! Transition symbols and the empty word.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Rendering of the empty word (GREEK SMALL LETTER EPSILON).
pub const EPSILON: &str = "\u{03B5}";

const EPSILON_CHAR: char = '\u{03B5}';

/// Symbol read by a transition: one input character or the empty word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Char(char),
    Epsilon,
}

impl Symbol {
    pub fn is_epsilon(self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    /// True if this symbol can be taken when `next` is the next unread input character.
    ///
    /// Epsilon always matches; a character only matches itself.
    pub fn matches(self, next: Option<char>) -> bool {
        match self {
            Symbol::Epsilon => true,
            Symbol::Char(c) => next == Some(c),
        }
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        if c == EPSILON_CHAR {
            Symbol::Epsilon
        } else {
            Symbol::Char(c)
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Char(c) => write!(f, "{c}"),
            Symbol::Epsilon => f.write_str(EPSILON),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse failure for a symbol that is neither one character nor epsilon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("symbol must be a single character or ε, got '{0}'")]
pub struct ParseSymbolError(pub String);

impl FromStr for Symbol {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Symbol::Epsilon),
            (Some(c), None) => Ok(Symbol::from(c)),
            _ => Err(ParseSymbolError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_matches_any_input() {
        assert!(Symbol::Epsilon.matches(Some('0')));
        assert!(Symbol::Epsilon.matches(None));
    }

    #[test]
    fn char_matches_only_itself() {
        assert!(Symbol::Char('0').matches(Some('0')));
        assert!(!Symbol::Char('0').matches(Some('1')));
        assert!(!Symbol::Char('0').matches(None));
    }

    #[test]
    fn parse_accepts_epsilon_spellings() {
        assert_eq!("ε".parse::<Symbol>(), Ok(Symbol::Epsilon));
        assert_eq!("".parse::<Symbol>(), Ok(Symbol::Epsilon));
        assert_eq!("a".parse::<Symbol>(), Ok(Symbol::Char('a')));
        assert!("ab".parse::<Symbol>().is_err());
    }

    #[test]
    fn display_renders_epsilon_glyph() {
        assert_eq!(Symbol::Epsilon.to_string(), "ε");
        assert_eq!(Symbol::Char('1').to_string(), "1");
    }
}
