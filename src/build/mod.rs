// src/build/mod.rs

//! Build orchestration: request validation, invocation construction and the
//! job lifecycle around the process runner.

pub mod invocation;
pub mod orchestrator;
pub mod request;

pub use invocation::{android_command, build_env};
pub use orchestrator::BuildOrchestrator;
pub use request::{validate_project_id, BuildRequest};
