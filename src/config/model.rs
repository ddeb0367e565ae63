// src/config/model.rs

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8000"
///
/// [build]
/// command = ["docker", "compose", "up", "--build"]
/// working_dir = "sdufReactNative"
/// logs_dir = "logs"
/// timeout = "1h"
/// max_concurrent_builds = 2
/// ```
///
/// All sections are optional and have reasonable defaults. Nothing here is
/// validated yet; convert into [`ConfigFile`] with `TryFrom`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub build: BuildSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Socket address the HTTP API listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Build tool invocation as an argument vector. The first element is the
    /// program; it is executed directly, never through a shell.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Directory the build tool runs in (relative to the server's cwd).
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Directory holding one `<project_id>_log.txt` per project.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Wall-clock limit per build, e.g. `"45m"`. A build exceeding it is
    /// killed and marked `stuck`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Upper bound on builds executing at the same time.
    #[serde(default = "default_max_concurrent_builds")]
    pub max_concurrent_builds: usize,
}

fn default_command() -> Vec<String> {
    ["docker", "compose", "up", "--build"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("sdufReactNative")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_timeout() -> String {
    "1h".to_string()
}

fn default_max_concurrent_builds() -> usize {
    2
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            working_dir: default_working_dir(),
            logs_dir: default_logs_dir(),
            timeout: default_timeout(),
            max_concurrent_builds: default_max_concurrent_builds(),
        }
    }
}

/// Validated configuration used by the rest of the application.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub bind: SocketAddr,
    pub build: BuildSettings,
}

impl ConfigFile {
    /// Construct without validation. Only `validate.rs` should call this.
    pub(crate) fn new_unchecked(bind: SocketAddr, build: BuildSettings) -> Self {
        Self { bind, build }
    }
}

/// Resolved build settings consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub timeout: Duration,
    pub max_concurrent_builds: usize,
}
