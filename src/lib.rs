//! turtlecore: multi-market turtle trend-following decision engine.
//!
//! Hexagonal architecture: decision logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
