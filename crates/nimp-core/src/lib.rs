//! nimptool core library
//!
//! Host-side helper for the Nimrod portal on a shared HPC cluster:
//! - Identity and group resolution from the OS databases
//! - Group-derived storage paths and account classification
//! - Process liveness checks against `/proc`
//! - Exit codes and logging for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod commands;
pub mod exit_codes;
pub mod identity;
pub mod liveness;
pub mod logging;
pub mod policy;
