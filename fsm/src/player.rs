//! Threaded playback around a [`Simulation`].
//!
//! A worker thread owns the simulation. Callers talk to it through a command
//! channel and wait for a reply, so every command is applied atomically with
//! respect to playback ticks: when `pause` or `reset` returns, no tick is in
//! flight and none will follow. While playing or rewinding the worker waits
//! on the command channel with a timeout equal to the tick delay; a command
//! arriving in the meantime (such as a speed change) wakes it immediately.
//!
//! Frames produced by playback ticks are published on an event channel.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::simulation::{Frame, Simulation};
use crate::core::speed::Speed;
use crate::core::types::{Activity, Direction, SimulationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("playback worker is not running")]
    Disconnected,
}

#[derive(Debug, Clone)]
enum Command {
    Start(String),
    StepForward,
    StepBackward,
    Play(Direction),
    Pause,
    SetSpeed(Speed),
    DeletePath(usize),
    Reset,
    Snapshot,
}

enum Message {
    Request {
        command: Command,
        reply: Sender<Result<Frame, SimulationError>>,
    },
    Shutdown,
}

/// Handle to a simulation running on its own worker thread.
pub struct Player {
    requests: Sender<Message>,
    events: Receiver<Frame>,
    worker: Option<JoinHandle<()>>,
}

impl Player {
    pub fn spawn(simulation: Simulation, speed: Speed) -> Self {
        let (requests, inbox) = mpsc::channel();
        let (outbox, events) = mpsc::channel();
        let worker = thread::spawn(move || {
            Worker {
                simulation,
                speed,
                deadline: None,
            }
            .run(&inbox, &outbox);
        });
        Self {
            requests,
            events,
            worker: Some(worker),
        }
    }

    pub fn start(&self, word: &str) -> Result<Frame, PlayerError> {
        self.request(Command::Start(word.to_string()))
    }

    pub fn step_forward(&self) -> Result<Frame, PlayerError> {
        self.request(Command::StepForward)
    }

    pub fn step_backward(&self) -> Result<Frame, PlayerError> {
        self.request(Command::StepBackward)
    }

    /// Tick forward automatically until paused or a stop condition is reached.
    /// Replaces any rewind in progress.
    pub fn play(&self) -> Result<Frame, PlayerError> {
        self.request(Command::Play(Direction::Forward))
    }

    /// Tick backward automatically until paused or step 0 is reached.
    /// Replaces any forward playback in progress.
    pub fn rewind(&self) -> Result<Frame, PlayerError> {
        self.request(Command::Play(Direction::Backward))
    }

    /// Stop playback. Idempotent; no tick runs after this returns.
    pub fn pause(&self) -> Result<Frame, PlayerError> {
        self.request(Command::Pause)
    }

    /// Change the tick delay. Takes effect from the next tick on, even if the
    /// worker is already waiting out the old delay.
    pub fn set_speed(&self, speed: Speed) -> Result<Frame, PlayerError> {
        self.request(Command::SetSpeed(speed))
    }

    pub fn delete_path(&self, index: usize) -> Result<Frame, PlayerError> {
        self.request(Command::DeletePath(index))
    }

    pub fn reset(&self) -> Result<Frame, PlayerError> {
        self.request(Command::Reset)
    }

    pub fn snapshot(&self) -> Result<Frame, PlayerError> {
        self.request(Command::Snapshot)
    }

    /// Wait up to `timeout` for the next playback frame.
    pub fn recv_event(&self, timeout: Duration) -> Option<Frame> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Playback frames published so far and not yet received.
    pub fn drain_events(&self) -> Vec<Frame> {
        self.events.try_iter().collect()
    }

    fn request(&self, command: Command) -> Result<Frame, PlayerError> {
        let (reply, response) = mpsc::channel();
        self.requests
            .send(Message::Request { command, reply })
            .map_err(|_| PlayerError::Disconnected)?;
        let result = response.recv().map_err(|_| PlayerError::Disconnected)?;
        Ok(result?)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        // The worker may already be gone; joining below is all that matters.
        if self.requests.send(Message::Shutdown).is_err() {
            debug!("playback worker already stopped");
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("playback worker panicked");
            }
        }
    }
}

struct Worker {
    simulation: Simulation,
    speed: Speed,
    /// When the next playback tick is due; `None` while not playing.
    deadline: Option<Instant>,
}

impl Worker {
    fn run(mut self, inbox: &Receiver<Message>, outbox: &Sender<Frame>) {
        loop {
            let message = match self.deadline {
                Some(at) => match inbox.recv_timeout(at.saturating_duration_since(Instant::now())) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                },
                None => match inbox.recv() {
                    Ok(message) => Some(message),
                    Err(_) => return,
                },
            };

            match message {
                None => {
                    if let Some(frame) = self.tick() {
                        if outbox.send(frame).is_err() {
                            return;
                        }
                    }
                }
                Some(Message::Shutdown) => return,
                Some(Message::Request { command, reply }) => {
                    let result = self.apply(command);
                    if reply.send(result).is_err() {
                        debug!("requester went away before the reply");
                    }
                }
            }
        }
    }

    fn playing(&self) -> bool {
        matches!(
            self.simulation.activity(),
            Activity::Playing | Activity::Rewinding
        )
    }

    fn schedule(&mut self) {
        self.deadline = if self.playing() {
            Some(Instant::now() + self.speed.delay())
        } else {
            None
        };
    }

    fn tick(&mut self) -> Option<Frame> {
        let result = match self.simulation.activity() {
            Activity::Playing => self.simulation.tick_forward(),
            Activity::Rewinding => self.simulation.tick_backward(),
            _ => {
                self.deadline = None;
                return None;
            }
        };
        self.schedule();
        match result {
            Ok(frame) => {
                debug!(step = frame.step, phase = ?frame.phase, "playback tick");
                Some(frame)
            }
            Err(err) => {
                warn!(%err, "playback tick failed");
                self.deadline = None;
                None
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<Frame, SimulationError> {
        let result = match command {
            Command::Start(word) => self.simulation.start(&word),
            Command::StepForward => self.simulation.step_forward(),
            Command::StepBackward => self.simulation.step_backward(),
            Command::Play(direction) => {
                let frame = self.simulation.play(direction)?;
                self.schedule();
                return Ok(frame);
            }
            Command::Pause => Ok(self.simulation.pause()),
            Command::SetSpeed(speed) => {
                debug!(%speed, "speed changed");
                self.speed = speed;
                self.schedule();
                return Ok(self.simulation.snapshot());
            }
            Command::DeletePath(index) => self.simulation.delete_path(index),
            Command::Reset => Ok(self.simulation.reset()),
            Command::Snapshot => Ok(self.simulation.snapshot()),
        };
        if !self.playing() {
            self.deadline = None;
        }
        result
    }
}
