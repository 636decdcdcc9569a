//! Port traits for the collaborators around the indicator engine.

pub mod chart_port;
pub mod config_port;
pub mod data_port;
