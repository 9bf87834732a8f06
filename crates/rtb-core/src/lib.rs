//! Core domain + application logic for the Redmine Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and Redmine
//! live behind ports (traits) implemented in adapter crates.

pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod security;
pub mod status;
pub mod tracker;

pub use errors::{Error, Result};
