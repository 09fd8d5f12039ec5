//! Port traits the host implements.

pub mod config_port;
pub mod data_port;
pub mod intent_sink;
