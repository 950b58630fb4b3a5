//! Core domain + application logic for the Jackett search bot.
//!
//! This crate is intentionally framework-agnostic. Telegram, Jackett and Telegraph
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod formatting;
pub mod liveness;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod query;
pub mod render;
pub mod search;
pub mod security;

pub use errors::{Error, Result};
