//! Core domain + application logic for the weekly availability survey bot.
//!
//! This crate is framework-agnostic. Discord lives behind the messaging
//! port (trait) implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod survey;
pub mod tally;
pub mod week;

pub use errors::{Error, Result};
