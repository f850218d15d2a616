//! Core of the channel relay bot.
//!
//! Framework-agnostic: Telegram and the text-generation service live behind
//! ports (traits) implemented in adapter crates.

pub mod buttons;
pub mod caption;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod hashtags;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod publisher;
pub mod retraction;
pub mod scheduler;
pub mod security;
pub mod watermark;

pub use errors::{Error, Result};
