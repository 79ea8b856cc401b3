//! The automaton model: alphabet, states, and an outgoing-transition index.
//!
//! All mutations are synchronous and local to the model. Structural
//! conflicts (duplicate symbol, state, or transition) are reported as a
//! `false` return and leave the model unchanged.

use std::fmt;

use indexmap::IndexMap;

use crate::core::state::{Label, State, numeric_suffix};
use crate::core::symbol::Symbol;
use crate::core::transition::Transition;

/// A finite automaton with at most one initial state.
///
/// Transition symbols are not validated against the alphabet.
#[derive(Debug, Clone, Default)]
pub struct Automaton {
    alphabet: Vec<char>,
    states: IndexMap<Label, State>,
    /// Outgoing transitions per registered state, in insertion order.
    transitions: IndexMap<Label, Vec<Transition>>,
    initial: Option<Label>,
    epsilon_transitions: usize,
}

impl Automaton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol to the alphabet. Returns `false` if it is already present.
    pub fn add_symbol(&mut self, symbol: char) -> bool {
        if self.alphabet.contains(&symbol) {
            return false;
        }
        self.alphabet.push(symbol);
        true
    }

    /// Remove a symbol from the alphabet. Returns `false` if it was absent.
    pub fn remove_symbol(&mut self, symbol: char) -> bool {
        match self.alphabet.iter().position(|&c| c == symbol) {
            Some(idx) => {
                self.alphabet.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Register a state. A state flagged initial replaces the current initial state.
    ///
    /// Returns `false` if a state with the same label is already registered.
    pub fn add_state(&mut self, state: State) -> bool {
        if self.states.contains_key(state.label()) {
            return false;
        }
        let label = state.label().clone();
        if state.is_initial() {
            self.clear_initial_flag();
            self.initial = Some(label.clone());
        }
        self.states.insert(label.clone(), state);
        self.transitions.insert(label, Vec::new());
        true
    }

    /// Remove a state and its outgoing-transition index entry.
    ///
    /// Transitions from other states into this one are left in place; use
    /// [`Automaton::remove_related_transitions`] first to drop them.
    pub fn remove_state(&mut self, label: &str) -> Option<State> {
        let state = self.states.shift_remove(label)?;
        if self.initial.as_deref() == Some(label) {
            self.initial = None;
        }
        if let Some(outgoing) = self.transitions.shift_remove(label) {
            let epsilons = outgoing.iter().filter(|t| t.symbol().is_epsilon()).count();
            self.epsilon_transitions -= epsilons;
        }
        Some(state)
    }

    /// Remove every transition that starts or ends at `label`. Returns how many were removed.
    pub fn remove_related_transitions(&mut self, label: &str) -> usize {
        let related: Vec<Transition> = self
            .all_transitions()
            .filter(|t| t.from_label().as_ref() == label || t.to_label().as_ref() == label)
            .cloned()
            .collect();
        let mut removed = 0;
        for transition in &related {
            if self.remove_transition(transition) {
                removed += 1;
            }
        }
        removed
    }

    pub fn has_initial_state(&self) -> bool {
        self.initial.is_some()
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.initial.as_ref().and_then(|label| self.states.get(label))
    }

    /// Make `label` the initial state, or clear the initial state with `None`.
    ///
    /// Returns `false` (and changes nothing) if `label` is not registered.
    pub fn set_initial_state(&mut self, label: Option<&str>) -> bool {
        let Some(label) = label else {
            self.clear_initial_flag();
            self.initial = None;
            return true;
        };
        let Some(key) = self.states.get_key_value(label).map(|(k, _)| k.clone()) else {
            return false;
        };
        self.clear_initial_flag();
        if let Some(state) = self.states.get_mut(&key) {
            state.set_initial(true);
        }
        self.initial = Some(key);
        true
    }

    fn clear_initial_flag(&mut self) {
        if let Some(state) = self
            .initial
            .take()
            .and_then(|previous| self.states.get_mut(&previous))
        {
            state.set_initial(false);
        }
    }

    /// Set or clear the accepting flag. Returns `false` if `label` is not registered.
    pub fn set_accepting(&mut self, label: &str, accepting: bool) -> bool {
        match self.states.get_mut(label) {
            Some(state) => {
                state.set_accepting(accepting);
                true
            }
            None => false,
        }
    }

    /// Accepting states in registration order (computed on every call).
    pub fn accepting_states(&self) -> Vec<&State> {
        self.states.values().filter(|s| s.is_accepting()).collect()
    }

    pub fn state(&self, label: &str) -> Option<&State> {
        self.states.get(label)
    }

    pub fn contains_state(&self, label: &str) -> bool {
        self.states.contains_key(label)
    }

    pub fn states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.values()
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Add a transition between two registered states.
    ///
    /// Returns `false` if either endpoint is not registered or the identical
    /// triple already exists.
    pub fn add_transition(&mut self, transition: Transition) -> bool {
        if !self.states.contains_key(transition.to_label()) {
            return false;
        }
        let Some(outgoing) = self.transitions.get_mut(transition.from_label()) else {
            return false;
        };
        if outgoing.contains(&transition) {
            return false;
        }
        if transition.symbol().is_epsilon() {
            self.epsilon_transitions += 1;
        }
        outgoing.push(transition);
        true
    }

    /// Remove a transition. Returns `false` if it was not present.
    pub fn remove_transition(&mut self, transition: &Transition) -> bool {
        let Some(outgoing) = self.transitions.get_mut(transition.from_label()) else {
            return false;
        };
        let Some(idx) = outgoing.iter().position(|t| t == transition) else {
            return false;
        };
        outgoing.remove(idx);
        if transition.symbol().is_epsilon() {
            self.epsilon_transitions -= 1;
        }
        true
    }

    /// Outgoing transitions of a registered state (possibly empty); `None` for unknown labels.
    pub fn outgoing_transitions(&self, label: &str) -> Option<&[Transition]> {
        self.transitions.get(label).map(Vec::as_slice)
    }

    pub fn all_transitions(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.values().flatten()
    }

    pub fn has_epsilon_transition(&self) -> bool {
        self.epsilon_transitions > 0
    }

    /// Reset to an empty automaton.
    pub fn clear(&mut self) {
        self.alphabet.clear();
        self.states.clear();
        self.transitions.clear();
        self.initial = None;
        self.epsilon_transitions = 0;
    }

    /// Label for a newly created state: `Q<n>` with the lowest id not taken
    /// below the current state count, or `Q<len>` when there is no gap.
    pub fn next_state_label(&self) -> String {
        let mut taken = vec![false; self.states.len()];
        let ids = self
            .states
            .keys()
            .filter_map(|label| numeric_suffix(label))
            .filter_map(|id| usize::try_from(id).ok());
        for id in ids {
            if let Some(slot) = taken.get_mut(id) {
                *slot = true;
            }
        }
        let id = taken
            .iter()
            .position(|used| !used)
            .unwrap_or(taken.len());
        format!("Q{id}")
    }

    /// Tabulate the transition relation: states (sorted) by symbols (sorted, ε last).
    pub fn transition_table(&self) -> TransitionTable {
        let mut columns: Vec<Symbol> = self.alphabet.iter().copied().map(Symbol::Char).collect();
        columns.sort();
        if self.has_epsilon_transition() {
            columns.push(Symbol::Epsilon);
        }

        let mut states: Vec<&State> = self.states.values().collect();
        states.sort();

        let rows = states
            .into_iter()
            .map(|state| {
                let outgoing = self.outgoing_transitions(state.label()).unwrap_or_default();
                let cells = columns
                    .iter()
                    .map(|&symbol| {
                        outgoing
                            .iter()
                            .filter(|t| t.symbol() == symbol)
                            .map(|t| t.to_label().clone())
                            .collect()
                    })
                    .collect();
                TransitionRow {
                    state: state.label().clone(),
                    cells,
                }
            })
            .collect();

        TransitionTable { columns, rows }
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size = {}", self.states.len())?;
        match self.initial_state() {
            Some(state) => writeln!(f, "Initial state = {state}")?,
            None => writeln!(f, "Initial state = none")?,
        }
        let alphabet: Vec<String> = self.alphabet.iter().map(char::to_string).collect();
        writeln!(f, "Alphabet = [{}]", alphabet.join(", "))?;
        let states: Vec<String> = self.states.values().map(State::to_string).collect();
        writeln!(f, "States = [{}]", states.join(", "))?;
        let accepting: Vec<&str> = self
            .accepting_states()
            .into_iter()
            .map(|s| s.label().as_ref())
            .collect();
        writeln!(f, "Accepting = [{}]", accepting.join(", "))?;
        let transitions: Vec<String> = self.all_transitions().map(Transition::to_string).collect();
        writeln!(f, "Transitions = [{}]", transitions.join(", "))
    }
}

/// Transition relation laid out as a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    pub columns: Vec<Symbol>,
    pub rows: Vec<TransitionRow>,
}

/// Targets reached from one state, one cell per column of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRow {
    pub state: Label,
    pub cells: Vec<Vec<Label>>,
}

impl fmt::Display for TransitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render_cell = |cell: &Vec<Label>| {
            let labels: Vec<&str> = cell.iter().map(AsRef::as_ref).collect();
            labels.join(",")
        };
        let width = self
            .rows
            .iter()
            .flat_map(|row| row.cells.iter().map(|cell| render_cell(cell).chars().count()))
            .chain(self.rows.iter().map(|row| row.state.chars().count()))
            .max()
            .unwrap_or(1)
            .max(1);

        write!(f, "{:width$}", "")?;
        for symbol in &self.columns {
            write!(f, " | {:width$}", symbol.to_string())?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:width$}", row.state.as_ref())?;
            for cell in &row.cells {
                write!(f, " | {:width$}", render_cell(cell))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
