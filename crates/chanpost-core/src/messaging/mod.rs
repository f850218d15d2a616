//! Chat-platform abstractions (Telegram behind `ChannelPort`).

pub mod port;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
