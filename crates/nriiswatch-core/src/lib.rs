//! Core building blocks shared by every nriiswatch crate:
//! configuration, error types, the process-wide run state with its
//! single-flight guard, record types, and the trait seams that let the
//! workflow run against mocks in tests.

pub mod config;
pub mod error;
pub mod state;
pub mod traits;
pub mod types;

/// Prefix stamped on every user-visible notification and error report.
pub const NAME_PREFIX: &str = "Comet :: ";
