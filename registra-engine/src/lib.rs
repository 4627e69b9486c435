//! Async alignment engine
//!
//! Wires the core alignment logic to an executor:
//!
//! - Alignment process actor that runs boards through their sessions
//! - Session control for operator proceed/cancel
//! - Machine worker queue serializing vision and motion work
//! - TOML settings loading
//!
//! Runs under embassy on target, or `embassy_futures::block_on` on a host.
//! TOML parsing needs a global allocator.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible in every module
mod fmt;

pub mod config;
pub mod control;
pub mod process;
pub mod worker;

pub use config::{parse_config, ConfigError};
pub use control::SessionControl;
pub use process::AlignmentProcess;
pub use worker::{WorkClient, WorkQueue, WorkRequest, WorkResult};

#[cfg(test)]
use critical_section as _;
