//! Interactive, resumable simulation of an automaton on one word.
//!
//! The simulation keeps the live frontier of paths plus two per-step history
//! maps: the paths that ended while advancing into a step, and the
//! transitions taken into it. Together they let [`Simulation::step_backward`]
//! rebuild the previous frontier exactly.
//!
//! Every operation returns a [`Frame`] describing what to render.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::automaton::Automaton;
use crate::core::path::{Path, dedup_paths, sort_paths};
use crate::core::step::{self, StepOptions, frontier_status};
use crate::core::transition::Transition;
use crate::core::types::{Activity, Direction, Notice, PathStatus, Phase, SimulationError};

/// Hard caps on a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationLimits {
    /// Forward stepping halts once this many paths are active.
    pub max_active_paths: usize,
    /// Forward stepping halts at this step number.
    pub step_cap: usize,
    /// Steps still allowed after the first ε-loop is detected.
    pub loop_step_allowance: usize,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            max_active_paths: 10_000,
            step_cap: 300,
            loop_step_allowance: 100,
        }
    }
}

/// One path as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathView {
    pub text: String,
    pub status: PathStatus,
}

/// Everything needed to render the simulation after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub step: usize,
    pub phase: Phase,
    pub activity: Activity,
    pub step_cap: usize,
    pub active_paths: usize,
    pub paths: Vec<PathView>,
    /// Distinct current states of the active paths, in path order.
    pub current_states: Vec<String>,
    /// Transitions taken into the current step.
    pub transitions: Vec<Transition>,
    pub notices: Vec<Notice>,
}

impl Frame {
    pub fn has_notice(&self) -> bool {
        !self.notices.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    automaton: Automaton,
    limits: SimulationLimits,
    word: Option<String>,
    paths: Vec<Path>,
    step: usize,
    step_cap: usize,
    ended: BTreeMap<usize, Vec<Path>>,
    transitions: BTreeMap<usize, Vec<Transition>>,
    phase: Phase,
    activity: Activity,
    loop_flagged: bool,
    /// Set when the frontier ran dry; cleared by stepping backward.
    exhausted: bool,
}

impl Simulation {
    pub fn new(automaton: Automaton) -> Self {
        Self::with_limits(automaton, SimulationLimits::default())
    }

    pub fn with_limits(automaton: Automaton, limits: SimulationLimits) -> Self {
        Self {
            automaton,
            limits,
            word: None,
            paths: Vec::new(),
            step: 0,
            step_cap: limits.step_cap,
            ended: BTreeMap::new(),
            transitions: BTreeMap::new(),
            phase: Phase::States,
            activity: Activity::Idle,
            loop_flagged: false,
            exhausted: false,
        }
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn limits(&self) -> SimulationLimits {
        self.limits
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_cap(&self) -> usize {
        self.step_cap
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Paths that ended while advancing into `step`.
    pub fn ended_at(&self, step: usize) -> &[Path] {
        self.ended.get(&step).map(Vec::as_slice).unwrap_or_default()
    }

    /// Transitions taken into `step`, ordered like the paths they produced.
    pub fn transitions_at(&self, step: usize) -> &[Transition] {
        self.transitions
            .get(&step)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Begin a run on `word`, discarding any previous run.
    ///
    /// Fails without touching the current state if there is no initial state.
    pub fn start(&mut self, word: &str) -> Result<Frame, SimulationError> {
        let initial = self
            .automaton
            .initial_state()
            .ok_or(SimulationError::NoInitialState)?
            .label()
            .clone();
        self.clear();
        self.word = Some(word.to_string());
        self.paths = vec![Path::start(initial, word)];
        self.ended.insert(0, Vec::new());
        self.transitions.insert(0, Vec::new());
        self.activity = Activity::InputSet;
        info!(word, step_cap = self.step_cap, "simulation started");
        Ok(self.frame(Vec::new()))
    }

    /// Drop all run state and return to idle.
    pub fn reset(&mut self) -> Frame {
        self.clear();
        info!("simulation reset");
        self.frame(Vec::new())
    }

    /// The current frame, without notices.
    pub fn snapshot(&self) -> Frame {
        self.frame(Vec::new())
    }

    /// Advance one logical step.
    ///
    /// Refuses (with a notice) once every path has ended or a cap is reached.
    /// If the step leaves no path alive, the view reverts to the previous step.
    pub fn step_forward(&mut self) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        self.mark_stepping();
        let mut notices = Vec::new();
        if let Some(notice) = self.forward_blocked() {
            self.halt_playback();
            notices.push(notice);
        } else {
            self.advance(&mut notices);
        }
        Ok(self.frame(notices))
    }

    /// Undo one logical step. A no-op at step 0.
    pub fn step_backward(&mut self) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        self.mark_stepping();
        self.retreat();
        Ok(self.frame(Vec::new()))
    }

    /// Advance half a step: show the transitions into the next step, then its states.
    pub fn tick_forward(&mut self) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        self.mark_stepping();
        let mut notices = Vec::new();
        match self.phase {
            Phase::Transitions => self.phase = Phase::States,
            Phase::States => {
                if let Some(notice) = self.forward_blocked() {
                    self.halt_playback();
                    notices.push(notice);
                } else {
                    self.advance(&mut notices);
                }
            }
        }
        Ok(self.frame(notices))
    }

    /// Undo half a step: the mirror of [`Simulation::tick_forward`].
    pub fn tick_backward(&mut self) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        self.mark_stepping();
        if self.phase == Phase::States && !self.paths.is_empty() && self.step > 0 {
            self.phase = Phase::Transitions;
        } else {
            self.retreat();
        }
        Ok(self.frame(Vec::new()))
    }

    /// Enter automatic playback. The caller drives the ticks.
    pub fn play(&mut self, direction: Direction) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        self.activity = match direction {
            Direction::Forward => Activity::Playing,
            Direction::Backward => Activity::Rewinding,
        };
        debug!(?direction, "playback started");
        Ok(self.frame(Vec::new()))
    }

    /// Leave automatic playback. Idempotent.
    pub fn pause(&mut self) -> Frame {
        self.halt_playback();
        self.frame(Vec::new())
    }

    /// Remove the active path at `index`.
    ///
    /// If no remaining path shares the removed path's parent, the parent is
    /// recorded as ended at this step so stepping backward still recovers it.
    pub fn delete_path(&mut self, index: usize) -> Result<Frame, SimulationError> {
        self.ensure_started()?;
        if index >= self.paths.len() {
            return Err(SimulationError::PathIndexOutOfRange {
                index,
                len: self.paths.len(),
            });
        }
        let removed = self.paths.remove(index);
        debug!(path = %removed, step = self.step, "path deleted");

        if self.step > 0 {
            let parent = removed.prefix(self.step);
            let reachable = self
                .paths
                .iter()
                .any(|path| path.prefix(self.step) == parent);
            if !reachable {
                self.ended.entry(self.step).or_default().push(parent);
            }
        }
        if let Some(used) = self.transitions.get_mut(&self.step) {
            if index < used.len() {
                used.remove(index);
            }
        }

        let mut notices = Vec::new();
        if self.paths.is_empty() {
            self.exhausted = true;
            self.halt_playback();
            notices.push(Notice::AllPathsExplored);
        }
        Ok(self.frame(notices))
    }

    fn clear(&mut self) {
        self.word = None;
        self.paths.clear();
        self.step = 0;
        self.step_cap = self.limits.step_cap;
        self.ended.clear();
        self.transitions.clear();
        self.phase = Phase::States;
        self.activity = Activity::Idle;
        self.loop_flagged = false;
        self.exhausted = false;
    }

    fn ensure_started(&self) -> Result<(), SimulationError> {
        if self.activity == Activity::Idle {
            return Err(SimulationError::NotStarted);
        }
        Ok(())
    }

    fn mark_stepping(&mut self) {
        if self.activity == Activity::InputSet {
            self.activity = Activity::Stepping;
        }
    }

    fn halt_playback(&mut self) {
        if matches!(self.activity, Activity::Playing | Activity::Rewinding) {
            self.activity = Activity::Stepping;
        }
    }

    fn forward_blocked(&self) -> Option<Notice> {
        if self.paths.is_empty() || self.exhausted {
            return Some(Notice::AllPathsExplored);
        }
        if self.step >= self.step_cap {
            warn!(cap = self.step_cap, "step cap reached");
            return Some(Notice::StepCapReached { cap: self.step_cap });
        }
        if self.paths.len() >= self.limits.max_active_paths {
            warn!(
                cap = self.limits.max_active_paths,
                active = self.paths.len(),
                "path cap reached"
            );
            return Some(Notice::PathCapReached {
                cap: self.limits.max_active_paths,
            });
        }
        None
    }

    fn advance(&mut self, notices: &mut Vec<Notice>) {
        let options = StepOptions {
            detect_loops: !self.loop_flagged,
            ..StepOptions::INTERACTIVE
        };
        let generation = step::advance(&self.automaton, std::mem::take(&mut self.paths), options);
        self.step += 1;

        let ended: Vec<Path> = generation.ended.into_iter().map(|e| e.path).collect();
        let mut used = generation.transitions;
        used.sort_by(Transition::cmp_endpoints);
        self.ended.insert(self.step, ended);
        self.transitions.insert(self.step, used);
        self.paths = generation.continuing;
        sort_paths(&mut self.paths);
        debug!(
            step = self.step,
            active = self.paths.len(),
            ended = self.ended_at(self.step).len(),
            "stepped forward"
        );

        if let Some(path) = generation.first_loop {
            self.loop_flagged = true;
            self.step_cap = self.step + self.limits.loop_step_allowance;
            warn!(path = %path, step_cap = self.step_cap, "epsilon loop detected");
            self.halt_playback();
            notices.push(Notice::LoopDetected {
                path,
                step_cap: self.step_cap,
            });
        }

        if self.paths.is_empty() {
            self.retreat();
            self.exhausted = true;
            self.halt_playback();
            info!(step = self.step, "all paths explored");
            notices.push(Notice::AllPathsExplored);
        } else {
            self.phase = Phase::Transitions;
        }
    }

    fn retreat(&mut self) {
        if self.step == 0 {
            if self.activity == Activity::Rewinding {
                self.activity = Activity::Stepping;
            }
            self.phase = Phase::States;
            return;
        }
        for path in &mut self.paths {
            path.truncate_last();
        }
        if let Some(ended) = self.ended.remove(&self.step) {
            self.paths.extend(ended);
        }
        self.transitions.remove(&self.step);
        dedup_paths(&mut self.paths);
        sort_paths(&mut self.paths);
        self.step -= 1;
        self.phase = Phase::States;
        self.exhausted = false;
        debug!(step = self.step, active = self.paths.len(), "stepped backward");
    }

    fn frame(&self, notices: Vec<Notice>) -> Frame {
        let paths = self
            .paths
            .iter()
            .map(|path| PathView {
                text: path.to_string(),
                status: frontier_status(&self.automaton, path),
            })
            .collect();
        let current_states: IndexSet<&str> = self
            .paths
            .iter()
            .map(|path| path.current_state().as_ref())
            .collect();
        Frame {
            step: self.step,
            phase: self.phase,
            activity: self.activity,
            step_cap: self.step_cap,
            active_paths: self.paths.len(),
            paths,
            current_states: current_states.into_iter().map(str::to_string).collect(),
            transitions: self.transitions_at(self.step).to_vec(),
            notices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::symbol::Symbol;
    use crate::test_support::{
        counting_loop, doubling, ends_with_one, epsilon_cycle, epsilon_self_loop, single_zero,
    };

    fn texts(sim: &Simulation) -> Vec<String> {
        sim.paths().iter().map(ToString::to_string).collect()
    }

    fn sorted_texts(sim: &Simulation) -> Vec<String> {
        let mut texts = texts(sim);
        texts.sort();
        texts
    }

    #[test]
    fn start_without_initial_state_creates_nothing() {
        let mut fsm = single_zero();
        fsm.set_initial_state(None);
        let mut sim = Simulation::new(fsm);
        assert_eq!(sim.start("0"), Err(SimulationError::NoInitialState));
        assert_eq!(sim.activity(), Activity::Idle);
        assert!(sim.paths().is_empty());
        assert_eq!(sim.step_forward(), Err(SimulationError::NotStarted));
    }

    #[test]
    fn start_seeds_one_path() {
        let mut sim = Simulation::new(single_zero());
        let frame = sim.start("").expect("start");
        assert_eq!(frame.step, 0);
        assert_eq!(frame.activity, Activity::InputSet);
        assert_eq!(frame.paths[0].text, "(Q0,ε)");
        assert_eq!(frame.paths[0].status, PathStatus::Rejected);
        assert_eq!(frame.current_states, vec!["Q0"]);
    }

    #[test]
    fn forward_twice_then_back_once_matches_one_forward() {
        let cases = [
            (ends_with_one(), "0111"),
            (ends_with_one(), "10"),
            (epsilon_cycle(), "ab"),
            (doubling(), "aaaa"),
        ];
        for (fsm, word) in cases {
            let mut sim = Simulation::new(fsm);
            sim.start(word).expect("start");
            sim.step_forward().expect("forward");
            let after_one = sorted_texts(&sim);
            sim.step_forward().expect("forward");
            sim.step_backward().expect("backward");
            assert_eq!(sorted_texts(&sim), after_one, "word {word:?}");
            assert_eq!(sim.step(), 1);
        }
    }

    #[test]
    fn paths_and_transitions_share_order() {
        let mut sim = Simulation::new(ends_with_one());
        sim.start("11").expect("start");
        let frame = sim.step_forward().expect("forward");
        assert_eq!(
            texts(&sim),
            vec!["(Q0,11), (Q0,1)", "(Q0,11), (Q1,1)"]
        );
        assert_eq!(
            frame.transitions,
            vec![
                Transition::new("Q0", Symbol::Char('1'), "Q0"),
                Transition::new("Q0", Symbol::Char('1'), "Q1"),
            ]
        );
        assert_eq!(frame.phase, Phase::Transitions);
        assert_eq!(frame.paths[1].status, PathStatus::Stuck);
    }

    #[test]
    fn empty_frontier_reverts_one_step() {
        let mut sim = Simulation::new(single_zero());
        sim.start("0").expect("start");
        sim.step_forward().expect("forward");
        assert_eq!(texts(&sim), vec!["(Q0,0), (Q1,ε)"]);

        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.notices, vec![Notice::AllPathsExplored]);
        assert_eq!(frame.step, 1);
        assert_eq!(frame.paths[0].text, "(Q0,0), (Q1,ε)");
        assert_eq!(frame.paths[0].status, PathStatus::Accepted);

        let again = sim.step_forward().expect("forward");
        assert_eq!(again.notices, vec![Notice::AllPathsExplored]);
        assert_eq!(again.step, 1);

        sim.step_backward().expect("backward");
        assert_eq!(texts(&sim), vec!["(Q0,0)"]);
    }

    #[test]
    fn path_cap_halts_forward_stepping() {
        let mut sim = Simulation::new(doubling());
        sim.start(&"a".repeat(20)).expect("start");
        for _ in 0..14 {
            let frame = sim.step_forward().expect("forward");
            assert!(frame.notices.is_empty());
        }
        assert_eq!(sim.paths().len(), 16_384);

        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.notices, vec![Notice::PathCapReached { cap: 10_000 }]);
        assert_eq!(frame.step, 14);
        assert_eq!(frame.active_paths, 16_384);
    }

    #[test]
    fn step_cap_halts_forward_stepping() {
        let mut sim = Simulation::new(counting_loop());
        sim.start(&"a".repeat(400)).expect("start");
        for _ in 0..300 {
            sim.step_forward().expect("forward");
        }
        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.notices, vec![Notice::StepCapReached { cap: 300 }]);
        assert_eq!(frame.step, 300);
    }

    #[test]
    fn first_loop_tightens_step_cap_once() {
        let mut sim = Simulation::new(epsilon_self_loop());
        sim.start("0").expect("start");
        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.step_cap, 101);
        match &frame.notices[..] {
            [Notice::LoopDetected { path, step_cap }] => {
                assert_eq!(path.to_string(), "(Q0,0), (Q0,0)");
                assert_eq!(*step_cap, 101);
            }
            other => panic!("unexpected notices {other:?}"),
        }

        for _ in 1..101 {
            let frame = sim.step_forward().expect("forward");
            assert!(frame.notices.is_empty(), "step {}", frame.step);
        }
        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.notices, vec![Notice::StepCapReached { cap: 101 }]);
        assert_eq!(frame.step, 101);
    }

    #[test]
    fn delete_path_keeps_shared_parent_implicit() {
        let mut sim = Simulation::new(ends_with_one());
        sim.start("11").expect("start");
        sim.step_forward().expect("forward");

        let frame = sim.delete_path(1).expect("delete");
        assert_eq!(frame.paths.len(), 1);
        assert!(sim.ended_at(1).is_empty());
        assert_eq!(
            sim.transitions_at(1),
            &[Transition::new("Q0", Symbol::Char('1'), "Q0")]
        );

        let frame = sim.delete_path(0).expect("delete");
        assert_eq!(frame.notices, vec![Notice::AllPathsExplored]);
        assert_eq!(
            sim.ended_at(1)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["(Q0,11)"]
        );
        assert!(sim.transitions_at(1).is_empty());

        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.notices, vec![Notice::AllPathsExplored]);

        sim.step_backward().expect("backward");
        assert_eq!(texts(&sim), vec!["(Q0,11)"]);
        assert_eq!(sim.step(), 0);
    }

    #[test]
    fn delete_path_rejects_bad_index() {
        let mut sim = Simulation::new(single_zero());
        sim.start("0").expect("start");
        assert_eq!(
            sim.delete_path(3),
            Err(SimulationError::PathIndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(sim.paths().len(), 1);
    }

    #[test]
    fn ticks_alternate_phases() {
        let mut sim = Simulation::new(ends_with_one());
        sim.start("1").expect("start");

        let frame = sim.tick_forward().expect("tick");
        assert_eq!((frame.step, frame.phase), (1, Phase::Transitions));
        let frame = sim.tick_forward().expect("tick");
        assert_eq!((frame.step, frame.phase), (1, Phase::States));
        let frame = sim.tick_backward().expect("tick");
        assert_eq!((frame.step, frame.phase), (1, Phase::Transitions));
        let frame = sim.tick_backward().expect("tick");
        assert_eq!((frame.step, frame.phase), (0, Phase::States));
        let frame = sim.tick_backward().expect("tick");
        assert_eq!((frame.step, frame.phase), (0, Phase::States));
    }

    #[test]
    fn notices_halt_playback() {
        let mut sim = Simulation::new(single_zero());
        sim.start("0").expect("start");
        assert_eq!(
            sim.play(Direction::Forward).expect("play").activity,
            Activity::Playing
        );
        sim.step_forward().expect("forward");
        assert_eq!(sim.activity(), Activity::Playing);
        let frame = sim.step_forward().expect("forward");
        assert_eq!(frame.activity, Activity::Stepping);

        sim.play(Direction::Backward).expect("rewind");
        sim.step_backward().expect("backward");
        assert_eq!(sim.activity(), Activity::Rewinding);
        sim.step_backward().expect("backward");
        assert_eq!(sim.activity(), Activity::Stepping);
        assert_eq!(sim.pause().activity, Activity::Stepping);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut sim = Simulation::new(ends_with_one());
        sim.start("11").expect("start");
        sim.step_forward().expect("forward");
        let frame = sim.reset();
        assert_eq!(frame.activity, Activity::Idle);
        assert_eq!(frame.step, 0);
        assert!(frame.paths.is_empty());
        assert!(sim.ended_at(1).is_empty());
        assert_eq!(sim.step_cap(), 300);
    }
}
