//! Finite automaton tester and simulator.
//!
//! Loads an automaton from an `.fsm` file and either decides a word
//! exhaustively (`fsm test`), walks through its computation step by step
//! (`fsm simulate`), or prints the automaton (`fsm show`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use fsm::core::speed::Speed;
use fsm::exit_codes;
use fsm::io::config::{CONFIG_FILE, load_config};
use fsm::io::fsm_file::load_fsm;
use fsm::logging;
use fsm::simulate::{SimulateOptions, SimulateStop, render_frame, simulate_file};
use fsm::test_word::test_word_from_file;

#[derive(Parser)]
#[command(
    name = "fsm",
    version,
    about = "Test and simulate finite automata"
)]
struct Cli {
    /// Simulator configuration file.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether the automaton accepts WORD (exit 0 accepted, 2 rejected).
    Test {
        file: PathBuf,
        /// Input word; empty for the empty word.
        word: String,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Walk through every computation path on WORD one step at a time.
    Simulate {
        file: PathBuf,
        /// Input word; empty for the empty word.
        word: String,
        /// Stop after this many steps.
        #[arg(long)]
        steps: Option<usize>,
        /// Use timed playback instead of stepping immediately.
        #[arg(long)]
        play: bool,
        /// Playback speed in -5..=9 (overrides the config file).
        #[arg(long, allow_negative_numbers = true)]
        speed: Option<i64>,
        /// Print frames and the outcome as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// Print the automaton and its transition table.
    Show { file: PathBuf },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Test { file, word, json } => cmd_test(&file, &word, json),
        Command::Simulate {
            file,
            word,
            steps,
            play,
            speed,
            json,
        } => cmd_simulate(&cli.config, &file, &word, steps, play, speed, json),
        Command::Show { file } => cmd_show(&file),
    }
}

fn cmd_test(file: &Path, word: &str, json: bool) -> Result<i32> {
    let outcome = test_word_from_file(file, word)?;
    if json {
        match outcome.report() {
            Some(report) => print_json(report)?,
            None => print_json(&serde_json::json!({ "error": "no initial state defined" }))?,
        }
    } else {
        print!("{}", outcome.render());
    }
    Ok(outcome.exit_code())
}

fn cmd_simulate(
    config_path: &Path,
    file: &Path,
    word: &str,
    steps: Option<usize>,
    play: bool,
    speed: Option<i64>,
    json: bool,
) -> Result<i32> {
    let config = load_config(config_path)?;
    let speed = match speed {
        Some(value) => Speed::new(value).context("parse --speed")?,
        None => config.speed,
    };
    let options = SimulateOptions {
        max_steps: steps,
        play,
        speed,
        limits: config.limits,
    };

    let mut print_error = None;
    let outcome = simulate_file(file, word, &options, |frame| {
        if print_error.is_some() {
            return;
        }
        if json {
            match serde_json::to_string(frame) {
                Ok(line) => println!("{line}"),
                Err(err) => print_error = Some(err),
            }
        } else {
            println!("{}", render_frame(frame));
        }
    })?;
    if let Some(err) = print_error {
        return Err(err).context("serialize frame");
    }

    if json {
        println!(
            "{}",
            serde_json::to_string(&outcome).context("serialize outcome")?
        );
    } else {
        println!("stopped after {} step(s): {}", outcome.steps_taken, outcome.stop);
    }
    if outcome.stop == SimulateStop::NoInitialState {
        eprintln!("no initial state defined");
        return Ok(exit_codes::NO_INITIAL_STATE);
    }
    Ok(exit_codes::OK)
}

fn cmd_show(file: &Path) -> Result<i32> {
    let automaton = load_fsm(file)?.to_automaton();
    print!("{automaton}");
    println!();
    print!("{}", automaton.transition_table());
    Ok(exit_codes::OK)
}

/// Print `value` as pretty JSON with a trailing newline.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
