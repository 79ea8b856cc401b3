//! Playback lifecycle tests for the threaded player.
//!
//! Drives play, pause, rewind, speed changes and reset through the public
//! API and checks that the worker stops ticking whenever it should.

use std::thread;
use std::time::Duration;

use fsm::core::simulation::{Frame, Simulation};
use fsm::core::speed::Speed;
use fsm::core::types::{Activity, Notice, SimulationError};
use fsm::player::{Player, PlayerError};
use fsm::test_support::{counting_loop, ends_with_one, epsilon_self_loop, single_zero};

const WAIT: Duration = Duration::from_secs(5);

fn fastest() -> Speed {
    Speed::new(9).expect("speed")
}

/// Collect playback frames until one shows playback has stopped.
fn until_stopped(player: &Player) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = player.recv_event(WAIT) {
        let stopped = !matches!(frame.activity, Activity::Playing | Activity::Rewinding);
        frames.push(frame);
        if stopped {
            return frames;
        }
    }
    panic!("playback did not stop; frames so far: {}", frames.len());
}

#[test]
fn play_runs_until_all_paths_explored() {
    let player = Player::spawn(Simulation::new(ends_with_one()), fastest());
    player.start("011").expect("start");
    player.play().expect("play");

    let frames = until_stopped(&player);
    let last = frames.last().expect("frames");
    assert_eq!(last.notices, vec![Notice::AllPathsExplored]);
    assert_eq!(last.activity, Activity::Stepping);
    assert_eq!(last.step, 3);
}

#[test]
fn pause_stops_ticks_before_returning() {
    let player = Player::spawn(Simulation::new(counting_loop()), fastest());
    player.start(&"a".repeat(200)).expect("start");
    player.play().expect("play");
    player.recv_event(WAIT).expect("first tick");

    let paused = player.pause().expect("pause");
    assert_eq!(paused.activity, Activity::Stepping);
    player.drain_events();

    thread::sleep(Duration::from_millis(350));
    assert!(player.drain_events().is_empty());
    let frame = player.snapshot().expect("snapshot");
    assert_eq!((frame.step, frame.phase), (paused.step, paused.phase));

    // Idempotent.
    assert_eq!(player.pause().expect("pause again").step, paused.step);
}

#[test]
fn speed_change_interrupts_a_long_wait() {
    let slowest = Speed::new(-5).expect("speed");
    let player = Player::spawn(Simulation::new(counting_loop()), slowest);
    player.start("aaaa").expect("start");
    player.play().expect("play");

    player.set_speed(fastest()).expect("speed");
    let frame = player
        .recv_event(Duration::from_secs(2))
        .expect("tick at the new speed");
    assert_eq!(frame.step, 1);
    player.pause().expect("pause");
}

#[test]
fn rewind_returns_to_the_start() {
    let player = Player::spawn(Simulation::new(ends_with_one()), fastest());
    player.start("0101").expect("start");
    for _ in 0..3 {
        player.step_forward().expect("forward");
    }

    let frame = player.rewind().expect("rewind");
    assert_eq!(frame.activity, Activity::Rewinding);
    let frames = until_stopped(&player);
    let last = frames.last().expect("frames");
    assert_eq!(last.step, 0);
    assert_eq!(last.paths.len(), 1);
    assert_eq!(last.paths[0].text, "(Q0,0101)");
}

#[test]
fn play_replaces_rewind() {
    let player = Player::spawn(Simulation::new(counting_loop()), Speed::default());
    player.start("aaaa").expect("start");
    player.step_forward().expect("forward");

    assert_eq!(player.rewind().expect("rewind").activity, Activity::Rewinding);
    assert_eq!(player.play().expect("play").activity, Activity::Playing);
    player.pause().expect("pause");
}

#[test]
fn loop_detection_pauses_playback() {
    let player = Player::spawn(Simulation::new(epsilon_self_loop()), fastest());
    player.start("0").expect("start");
    player.play().expect("play");

    let frames = until_stopped(&player);
    let last = frames.last().expect("frames");
    assert!(matches!(
        last.notices.as_slice(),
        [Notice::LoopDetected { step_cap: 101, .. }]
    ));
    assert_eq!(last.step_cap, 101);
}

#[test]
fn reset_while_playing_goes_idle() {
    let player = Player::spawn(Simulation::new(counting_loop()), fastest());
    player.start(&"a".repeat(200)).expect("start");
    player.play().expect("play");
    player.recv_event(WAIT).expect("first tick");

    let frame = player.reset().expect("reset");
    assert_eq!(frame.activity, Activity::Idle);
    player.drain_events();
    thread::sleep(Duration::from_millis(250));
    assert!(player.drain_events().is_empty());
    assert_eq!(
        player.step_forward(),
        Err(PlayerError::Simulation(SimulationError::NotStarted))
    );
}

#[test]
fn start_without_initial_state_is_rejected() {
    let mut fsm = single_zero();
    fsm.set_initial_state(None);
    let player = Player::spawn(Simulation::new(fsm), Speed::default());
    assert_eq!(
        player.start("0"),
        Err(PlayerError::Simulation(SimulationError::NoInitialState))
    );
    assert_eq!(player.snapshot().expect("snapshot").activity, Activity::Idle);
}

#[test]
fn delete_path_through_player() {
    let player = Player::spawn(Simulation::new(ends_with_one()), Speed::default());
    player.start("11").expect("start");
    player.step_forward().expect("forward");
    let frame = player.delete_path(0).expect("delete");
    assert_eq!(frame.active_paths, 1);
    assert_eq!(
        player.delete_path(4),
        Err(PlayerError::Simulation(
            SimulationError::PathIndexOutOfRange { index: 4, len: 1 }
        ))
    );
}
