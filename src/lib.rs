//! stockta: technical indicator engine for historical stock prices.
//!
//! Hexagonal architecture: indicator math in [`domain`], collaborator traits in
//! [`ports`], concrete data sources and renderers in [`adapters`], and the
//! command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
