//! Unit tests for swarm CLI
//!
//! These tests use in-memory port implementations and run without touching
//! the real filesystem or home directory.

mod architecture;
mod deployments_service;
mod mocks;
mod property_tests;
