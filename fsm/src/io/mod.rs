//! I/O helpers for fsm commands.

pub mod config;
pub mod fsm_file;
