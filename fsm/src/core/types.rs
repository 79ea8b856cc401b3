//! Shared deterministic types for the simulation core.
//!
//! These define the contract between the engine and whatever presents its
//! results. They carry no I/O and serialize to stable, lowercase names.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::path::Path;

/// Outcome of a path that can make no further progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Input consumed in an accepting state.
    Accepted,
    /// Input consumed in a non-accepting state.
    Rejected,
    /// Input left over with no applicable transition.
    Stuck,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Where a path on the interactive frontier stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    /// Still has input and at least one applicable transition.
    Active,
    Accepted,
    Rejected,
    Stuck,
}

impl From<Verdict> for PathStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted => PathStatus::Accepted,
            Verdict::Rejected => PathStatus::Rejected,
            Verdict::Stuck => PathStatus::Stuck,
        }
    }
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathStatus::Active => "active",
            PathStatus::Accepted => "accepted",
            PathStatus::Rejected => "rejected",
            PathStatus::Stuck => "stuck",
        })
    }
}

/// Preconditions a caller violated. The operation had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("no initial state defined")]
    NoInitialState,
    #[error("no input word has been set")]
    NotStarted,
    #[error("path index {index} out of range for {len} active paths")]
    PathIndexOutOfRange { index: usize, len: usize },
}

/// Advisory stop conditions. Progress (and playback) halts, nothing fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Every path has ended; the view stays on the last non-empty step.
    AllPathsExplored,
    StepCapReached { cap: usize },
    PathCapReached { cap: usize },
    /// A path revisited a `(state, residual)` pair. Reported once per run.
    LoopDetected { path: Path, step_cap: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AllPathsExplored => f.write_str("all paths explored"),
            Notice::StepCapReached { cap } => write!(f, "step cap of {cap} reached"),
            Notice::PathCapReached { cap } => write!(f, "path cap of {cap} reached"),
            Notice::LoopDetected { path, step_cap } => {
                write!(f, "\u{03B5}-loop detected on {path}; step cap now {step_cap}")
            }
        }
    }
}

/// Which half of a logical step is on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Current states (and ended paths) are shown.
    States,
    /// The transitions taken into the current step are shown.
    Transitions,
}

/// Lifecycle of an interactive simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    InputSet,
    Stepping,
    Playing,
    Rewinding,
}

/// Direction of automatic playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}
