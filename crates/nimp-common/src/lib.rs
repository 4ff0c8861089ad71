//! nimptool common types and errors.
//!
//! This crate provides the types shared across nimp-core modules:
//! - User identity, group records and the ordered group set
//! - Pid tokens and liveness records
//! - The unified error type

pub mod error;
pub mod id;
pub mod identity;

pub use error::{Error, ErrorCategory, Result};
pub use id::{PidRecord, PidToken};
pub use identity::{GroupRecord, GroupSet, Identity};
