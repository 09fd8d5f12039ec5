//! Core decision logic: pure functions over explicit state.

pub mod bar;
pub mod price_window;
pub mod indicators;
pub mod universe;
pub mod position;
pub mod risk_budget;
pub mod sizing;
pub mod order;
pub mod entry;
pub mod scaling;
pub mod exit;
pub mod rollover;
pub mod engine;
pub mod market_data;
pub mod replay;
pub mod config;
pub mod config_validation;
pub mod error;
