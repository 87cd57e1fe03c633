//! XDCC transfer engine.
//!
//! Drives one IRC connection per download: request a pack from a bot, parse
//! its DCC SEND offer, pull the file over a raw socket, and report progress
//! as an ordered event stream.

pub mod event;
pub mod locator;
pub mod parser;
pub mod security;
pub mod transfer;
