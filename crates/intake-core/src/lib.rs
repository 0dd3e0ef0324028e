//! Core domain + application logic for the consultation intake bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port implemented in the adapter crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod form;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod store;
pub mod submit;
pub mod texts;

pub use errors::{Error, Result};
