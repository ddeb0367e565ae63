// src/jobs/mod.rs

//! Job lifecycle bookkeeping.
//!
//! A job goes `running` → exactly one of `finished`, `failed`, `stuck`. Only
//! the latest build per project is tracked and nothing is persisted; a
//! restart forgets every status (the log files survive).

pub mod registry;

pub use registry::JobRegistry;
pub use crate::types::JobState;
