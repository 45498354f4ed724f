//! tabtoss - chat bot that keeps a per-chat list of names and tosses for who pays

pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod names;
pub mod roster;
pub mod router;
pub mod store;
pub mod telegram;
pub mod telemetry;
pub mod template;
pub mod toss;
