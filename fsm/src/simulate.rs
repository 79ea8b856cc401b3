//! Driver for `fsm simulate`: run a simulation until it stops.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::info;

use crate::core::automaton::Automaton;
use crate::core::simulation::{Frame, Simulation, SimulationLimits};
use crate::core::speed::Speed;
use crate::core::types::{Activity, Notice, Phase, SimulationError};
use crate::io::fsm_file::load_fsm;
use crate::player::{Player, PlayerError};

/// Extra time allowed for a playback frame beyond the tick delay.
const EVENT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulateOptions {
    /// Stop after this many logical steps.
    pub max_steps: Option<usize>,
    /// Drive the run with timed playback instead of stepping directly.
    pub play: bool,
    pub speed: Speed,
    pub limits: SimulationLimits,
}

/// Reason why `run_simulation` stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulateStop {
    /// The automaton has no initial state; nothing ran.
    NoInitialState,
    AllPathsExplored,
    StepCapReached { cap: usize },
    PathCapReached { cap: usize },
    /// The requested number of steps was taken.
    StepsTaken { steps: usize },
}

impl fmt::Display for SimulateStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulateStop::NoInitialState => write!(f, "no initial state defined"),
            SimulateStop::AllPathsExplored => write!(f, "all paths explored"),
            SimulateStop::StepCapReached { cap } => write!(f, "step cap of {cap} reached"),
            SimulateStop::PathCapReached { cap } => write!(f, "path cap of {cap} reached"),
            SimulateStop::StepsTaken { steps } => write!(f, "{steps} requested step(s) taken"),
        }
    }
}

/// Summary of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulateOutcome {
    pub word: String,
    pub steps_taken: usize,
    pub stop: SimulateStop,
}

fn stop_for(notices: &[Notice]) -> Option<SimulateStop> {
    notices.iter().find_map(|notice| match notice {
        Notice::AllPathsExplored => Some(SimulateStop::AllPathsExplored),
        Notice::StepCapReached { cap } => Some(SimulateStop::StepCapReached { cap: *cap }),
        Notice::PathCapReached { cap } => Some(SimulateStop::PathCapReached { cap: *cap }),
        Notice::LoopDetected { .. } => None,
    })
}

/// Step through `word` until every path has ended, a cap is hit, or
/// `max_steps` logical steps have been taken. `on_frame` sees every frame,
/// starting with the initial one.
///
/// An ε-loop notice does not stop the run; the tightened step cap will.
pub fn run_simulation<F: FnMut(&Frame)>(
    automaton: Automaton,
    word: &str,
    options: &SimulateOptions,
    on_frame: F,
) -> Result<SimulateOutcome> {
    let simulation = Simulation::with_limits(automaton, options.limits);
    if options.play {
        play_simulation(simulation, word, options, on_frame)
    } else {
        step_simulation(simulation, word, options, on_frame)
    }
}

/// Load an `.fsm` file and simulate `word` on it.
pub fn simulate_file<F: FnMut(&Frame)>(
    path: &Path,
    word: &str,
    options: &SimulateOptions,
    on_frame: F,
) -> Result<SimulateOutcome> {
    let doc = load_fsm(path).with_context(|| "load automaton for simulation")?;
    run_simulation(doc.to_automaton(), word, options, on_frame)
}

fn outcome(word: &str, steps_taken: usize, stop: SimulateStop) -> SimulateOutcome {
    info!(word, steps_taken, ?stop, "simulation stopped");
    SimulateOutcome {
        word: word.to_string(),
        steps_taken,
        stop,
    }
}

fn step_simulation<F: FnMut(&Frame)>(
    mut simulation: Simulation,
    word: &str,
    options: &SimulateOptions,
    mut on_frame: F,
) -> Result<SimulateOutcome> {
    match simulation.start(word) {
        Ok(frame) => on_frame(&frame),
        Err(SimulationError::NoInitialState) => {
            return Ok(outcome(word, 0, SimulateStop::NoInitialState));
        }
        Err(err) => return Err(err).context("start simulation"),
    }

    let mut steps_taken = 0usize;
    loop {
        if options.max_steps.is_some_and(|max| steps_taken >= max) {
            return Ok(outcome(
                word,
                steps_taken,
                SimulateStop::StepsTaken { steps: steps_taken },
            ));
        }
        let step_before = simulation.step();
        let frame = simulation.step_forward().context("step simulation")?;
        if frame.step > step_before {
            steps_taken += 1;
        }
        on_frame(&frame);
        if let Some(stop) = stop_for(&frame.notices) {
            return Ok(outcome(word, steps_taken, stop));
        }
    }
}

fn play_simulation<F: FnMut(&Frame)>(
    simulation: Simulation,
    word: &str,
    options: &SimulateOptions,
    mut on_frame: F,
) -> Result<SimulateOutcome> {
    let player = Player::spawn(simulation, options.speed);
    match player.start(word) {
        Ok(frame) => on_frame(&frame),
        Err(PlayerError::Simulation(SimulationError::NoInitialState)) => {
            return Ok(outcome(word, 0, SimulateStop::NoInitialState));
        }
        Err(err) => return Err(err).context("start simulation"),
    }
    player.play().context("start playback")?;

    let timeout = options.speed.delay() + EVENT_GRACE;
    let mut steps_taken = 0usize;
    loop {
        let Some(frame) = player.recv_event(timeout) else {
            let frame = player.snapshot().context("inspect stalled playback")?;
            if frame.activity != Activity::Playing {
                bail!("playback stopped at step {} without a notice", frame.step);
            }
            continue;
        };
        // Each logical step shows its transitions first.
        if frame.phase == Phase::Transitions {
            steps_taken += 1;
        }
        on_frame(&frame);

        if let Some(stop) = stop_for(&frame.notices) {
            return Ok(outcome(word, steps_taken, stop));
        }
        if options.max_steps.is_some_and(|max| steps_taken >= max) {
            player.pause().context("pause playback")?;
            return Ok(outcome(
                word,
                steps_taken,
                SimulateStop::StepsTaken { steps: steps_taken },
            ));
        }
        if frame.activity != Activity::Playing {
            // Halted by a loop notice: carry on under the tightened cap.
            player.play().context("resume playback")?;
        }
    }
}

/// Render a frame for terminal output.
pub fn render_frame(frame: &Frame) -> String {
    let phase = match frame.phase {
        Phase::States => "states",
        Phase::Transitions => "transitions",
    };
    let mut out = format!(
        "step {} ({phase}): {} active, cap {}\n",
        frame.step, frame.active_paths, frame.step_cap
    );
    for path in &frame.paths {
        out.push_str(&format!("  [{}] {}\n", path.status, path.text));
    }
    if frame.phase == Phase::Transitions {
        for transition in &frame.transitions {
            out.push_str(&format!("  {transition}\n"));
        }
    }
    for notice in &frame.notices {
        out.push_str(&format!("  ! {notice}\n"));
    }
    out
}
