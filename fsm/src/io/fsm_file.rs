//! Reader and writer for `.fsm` automaton files.
//!
//! The format is line-oriented, one `key=value` line per section:
//!
//! ```text
//! states={Q0,100.0000,80.0000}{Q1,240.0000,80.0000}
//! alphabet=[0, 1]
//! initialState=Q0
//! acceptingStates=[Q1]
//! transitions={Q0,0,Q1,0.5000,0.0000,0.0000,false}
//! ```
//!
//! Layout (state positions, arrow geometry) is kept in [`FsmDocument`] so a
//! loaded file can be written back unchanged; the automaton itself ignores it.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::{debug, warn};

use crate::core::automaton::Automaton;
use crate::core::state::State;
use crate::core::symbol::Symbol;
use crate::core::transition::Transition;

static BRACES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("braces regex"));
static BRACKETS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("brackets regex"));

/// Spacing used when laying out states that have no stored position.
const GRID_SPACING: f64 = 140.0;
const GRID_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct StateLayout {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Where a transition arrow is drawn between its two states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    /// Position of the anchor along the line between the states, `0.0..=1.0`.
    pub percentage: f64,
    pub perpendicular_distance: f64,
    pub anchor_angle: f64,
    pub anchor_set_by_user: bool,
}

impl Default for ArrowGeometry {
    fn default() -> Self {
        Self {
            percentage: 0.5,
            perpendicular_distance: 0.0,
            anchor_angle: 0.0,
            anchor_set_by_user: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionLayout {
    pub from: String,
    pub symbol: Symbol,
    pub to: String,
    pub arrow: ArrowGeometry,
}

/// Parsed contents of an `.fsm` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FsmDocument {
    pub states: Vec<StateLayout>,
    pub alphabet: Vec<char>,
    pub initial_state: Option<String>,
    pub accepting_states: Vec<String>,
    pub transitions: Vec<TransitionLayout>,
}

impl FsmDocument {
    /// Parse the textual format. Unknown lines are ignored.
    pub fn parse(contents: &str) -> Result<Self> {
        let mut doc = FsmDocument::default();
        for (idx, line) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "states" => {
                    doc.states = parse_states(value).with_context(|| format!("line {line_no}"))?;
                }
                "alphabet" => {
                    doc.alphabet =
                        parse_alphabet(value).with_context(|| format!("line {line_no}"))?;
                }
                "initialState" => {
                    let label = value.trim();
                    doc.initial_state = (!label.is_empty()).then(|| label.to_string());
                }
                "acceptingStates" => doc.accepting_states = bracket_items(value),
                "transitions" => {
                    doc.transitions =
                        parse_transitions(value).with_context(|| format!("line {line_no}"))?;
                }
                other => debug!(key = other, line = line_no, "ignoring unknown fsm line"),
            }
        }
        Ok(doc)
    }

    /// Render in the textual format, with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::from("states=");
        for state in &self.states {
            out.push_str(&format!("{{{},{:.4},{:.4}}}", state.label, state.x, state.y));
        }

        out.push_str("\nalphabet=");
        if !self.alphabet.is_empty() {
            let symbols: Vec<String> = self.alphabet.iter().map(char::to_string).collect();
            out.push_str(&format!("[{}]", symbols.join(", ")));
        }

        out.push_str("\ninitialState=");
        if let Some(initial) = &self.initial_state {
            out.push_str(initial);
        }

        out.push_str(&format!(
            "\nacceptingStates=[{}]",
            self.accepting_states.join(",")
        ));

        out.push_str("\ntransitions=");
        for t in &self.transitions {
            out.push_str(&format!(
                "{{{},{},{},{:.4},{:.4},{:.4},{}}}",
                t.from,
                t.symbol,
                t.to,
                t.arrow.percentage,
                t.arrow.perpendicular_distance,
                t.arrow.anchor_angle,
                t.arrow.anchor_set_by_user
            ));
        }
        out.push('\n');
        out
    }

    /// Build the automaton described by this document.
    ///
    /// Transitions naming an unknown state are skipped, as are duplicates.
    pub fn to_automaton(&self) -> Automaton {
        let mut fsm = Automaton::new();
        for &symbol in &self.alphabet {
            fsm.add_symbol(symbol);
        }
        for layout in &self.states {
            let state = State::new(layout.label.as_str())
                .with_initial(self.initial_state.as_deref() == Some(layout.label.as_str()))
                .with_accepting(self.accepting_states.contains(&layout.label));
            if !fsm.add_state(state) {
                warn!(label = %layout.label, "duplicate state in fsm file");
            }
        }
        for layout in &self.transitions {
            if !fsm.contains_state(&layout.from) || !fsm.contains_state(&layout.to) {
                warn!(from = %layout.from, to = %layout.to, "transition refers to unknown state");
                continue;
            }
            let transition =
                Transition::new(layout.from.as_str(), layout.symbol, layout.to.as_str());
            if !fsm.add_transition(transition) {
                debug!(from = %layout.from, to = %layout.to, "duplicate transition dropped");
            }
        }
        fsm
    }

    /// Describe `automaton` with a default grid layout.
    pub fn from_automaton(automaton: &Automaton) -> Self {
        let states = automaton
            .states()
            .enumerate()
            .map(|(idx, state)| StateLayout {
                label: state.label().to_string(),
                x: GRID_SPACING * (idx % GRID_COLUMNS) as f64,
                y: GRID_SPACING * (idx / GRID_COLUMNS) as f64,
            })
            .collect();
        let transitions = automaton
            .all_transitions()
            .map(|t| TransitionLayout {
                from: t.from_label().to_string(),
                symbol: t.symbol(),
                to: t.to_label().to_string(),
                arrow: ArrowGeometry::default(),
            })
            .collect();
        Self {
            states,
            alphabet: automaton.alphabet().to_vec(),
            initial_state: automaton.initial_state().map(|s| s.label().to_string()),
            accepting_states: automaton
                .accepting_states()
                .into_iter()
                .map(|s| s.label().to_string())
                .collect(),
            transitions,
        }
    }
}

fn brace_groups(value: &str) -> impl Iterator<Item = Vec<&str>> + '_ {
    BRACES_RE
        .captures_iter(value)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().split(',').collect())
}

fn bracket_items(value: &str) -> Vec<String> {
    BRACKETS_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_states(value: &str) -> Result<Vec<StateLayout>> {
    brace_groups(value)
        .map(|fields| -> Result<StateLayout> {
            match fields.as_slice() {
                [label, x, y] => Ok(StateLayout {
                    label: label.trim().to_string(),
                    x: parse_number(x)?,
                    y: parse_number(y)?,
                }),
                other => Err(anyhow!("state entry needs 3 fields, got {}", other.len())),
            }
        })
        .collect()
}

fn parse_alphabet(value: &str) -> Result<Vec<char>> {
    bracket_items(value)
        .iter()
        .map(|item| {
            let mut chars = item.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(anyhow!("alphabet symbol {item:?} is not a single character")),
            }
        })
        .collect()
}

fn parse_transitions(value: &str) -> Result<Vec<TransitionLayout>> {
    brace_groups(value)
        .map(|fields| -> Result<TransitionLayout> {
            let [from, symbol, to, percentage, distance, angle, by_user] = fields.as_slice()
            else {
                bail!("transition entry needs 7 fields, got {}", fields.len());
            };
            Ok(TransitionLayout {
                from: from.trim().to_string(),
                symbol: symbol.parse()?,
                to: to.trim().to_string(),
                arrow: ArrowGeometry {
                    percentage: parse_number(percentage)?,
                    perpendicular_distance: parse_number(distance)?,
                    anchor_angle: parse_number(angle)?,
                    anchor_set_by_user: by_user
                        .trim()
                        .parse()
                        .with_context(|| format!("parse flag {by_user:?}"))?,
                },
            })
        })
        .collect()
}

fn parse_number(raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .with_context(|| format!("parse number {raw:?}"))
}

/// Read and parse an `.fsm` file.
pub fn load_fsm(path: &Path) -> Result<FsmDocument> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    FsmDocument::parse(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Atomically write an `.fsm` file (temp file + rename).
pub fn save_fsm(path: &Path, doc: &FsmDocument) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("fsm path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("fsm.tmp");
    fs::write(&tmp_path, doc.render())
        .with_context(|| format!("write temp fsm {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace fsm {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "states={Q0,100.0000,80.0000}{Q1,240.0000,80.0000}\n\
alphabet=[0, 1]\n\
initialState=Q0\n\
acceptingStates=[Q1]\n\
transitions={Q0,0,Q1,.5000,.0000,.0000,false}{Q1,\u{03B5},Q0,0.2500,12.5000,1.5708,true}\n";

    #[test]
    fn parses_every_section() {
        let doc = FsmDocument::parse(SAMPLE).expect("parse");
        assert_eq!(doc.states.len(), 2);
        assert_eq!(doc.states[1].x, 240.0);
        assert_eq!(doc.alphabet, vec!['0', '1']);
        assert_eq!(doc.initial_state.as_deref(), Some("Q0"));
        assert_eq!(doc.accepting_states, vec!["Q1"]);
        assert_eq!(doc.transitions.len(), 2);
        assert_eq!(doc.transitions[0].arrow.percentage, 0.5);
        assert_eq!(doc.transitions[1].symbol, Symbol::Epsilon);
        assert!(doc.transitions[1].arrow.anchor_set_by_user);
    }

    #[test]
    fn builds_automaton() {
        let fsm = FsmDocument::parse(SAMPLE).expect("parse").to_automaton();
        assert_eq!(fsm.len(), 2);
        assert_eq!(
            fsm.initial_state().map(|s| s.label().to_string()),
            Some("Q0".to_string())
        );
        assert!(fsm.state("Q1").expect("Q1").is_accepting());
        assert!(fsm.has_epsilon_transition());
        assert_eq!(fsm.all_transitions().count(), 2);
    }

    #[test]
    fn empty_sections_parse() {
        let doc = FsmDocument::parse(
            "states=\nalphabet=\ninitialState=\nacceptingStates=[]\ntransitions=\n",
        )
        .expect("parse");
        assert_eq!(doc, FsmDocument::default());
        assert_eq!(
            doc.render(),
            "states=\nalphabet=\ninitialState=\nacceptingStates=[]\ntransitions=\n"
        );
    }

    #[test]
    fn skips_transitions_to_unknown_states() {
        let doc = FsmDocument::parse(
            "states={Q0,0,0}\ninitialState=Q0\ntransitions={Q0,a,Q9,0.5,0,0,false}{Q0,a,Q0,0.5,0,0,false}{Q0,a,Q0,0.5,0,0,false}\n",
        )
        .expect("parse");
        let fsm = doc.to_automaton();
        assert_eq!(fsm.all_transitions().count(), 1);
    }

    #[test]
    fn malformed_entries_are_errors() {
        let err = FsmDocument::parse("states={Q0,1}\n").expect_err("bad state");
        assert!(format!("{err:#}").contains("3 fields"));
        let err = FsmDocument::parse("transitions={Q0,ab,Q1,0,0,0,false}\n").expect_err("bad symbol");
        assert!(format!("{err:#}").contains("line 1"));
        assert!(FsmDocument::parse("alphabet=[01]\n").is_err());
    }

    #[test]
    fn save_then_load_preserves_document() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("machine.fsm");
        let doc = FsmDocument::parse(SAMPLE).expect("parse");
        save_fsm(&path, &doc).expect("save");
        assert_eq!(load_fsm(&path).expect("load"), doc);
    }

    #[test]
    fn document_from_automaton_round_trips_structure() {
        let original = FsmDocument::parse(SAMPLE).expect("parse").to_automaton();
        let rebuilt = FsmDocument::from_automaton(&original).to_automaton();
        assert_eq!(rebuilt.to_string(), original.to_string());
    }
}
