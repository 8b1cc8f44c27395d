//! Integration tests for swarm CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! Every test points `SWARM_CONFIG` at a temp directory so nothing under
//! `~/.swarm` is read or written.

mod cli_tests;
mod config_command;
mod deploy_command;
