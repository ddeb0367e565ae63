// src/config/validate.rs

use std::net::SocketAddr;

use crate::config::model::{BuildSection, BuildSettings, ConfigFile, RawConfigFile};
use crate::errors::{BuildRunnerError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildRunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let bind = validate_bind(&raw.server.bind)?;
        let build = validate_build(raw.build)?;
        Ok(ConfigFile::new_unchecked(bind, build))
    }
}

fn validate_bind(bind: &str) -> Result<SocketAddr> {
    bind.trim().parse().map_err(|e| {
        BuildRunnerError::ConfigError(format!(
            "[server].bind must be a socket address like \"0.0.0.0:8000\" (got '{}': {})",
            bind, e
        ))
    })
}

fn validate_build(build: BuildSection) -> Result<BuildSettings> {
    let mut command = build.command.into_iter();
    let program = match command.next() {
        Some(p) if !p.trim().is_empty() => p,
        Some(_) => {
            return Err(BuildRunnerError::ConfigError(
                "[build].command must start with a non-empty program name".to_string(),
            ));
        }
        None => {
            return Err(BuildRunnerError::ConfigError(
                "[build].command must not be empty".to_string(),
            ));
        }
    };

    let timeout = parse_duration(&build.timeout)
        .map_err(|e| BuildRunnerError::ConfigError(format!("[build].timeout: {}", e)))?;
    if timeout.is_zero() {
        return Err(BuildRunnerError::ConfigError(
            "[build].timeout must be greater than zero".to_string(),
        ));
    }

    if build.max_concurrent_builds == 0 {
        return Err(BuildRunnerError::ConfigError(
            "[build].max_concurrent_builds must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(BuildSettings {
        program,
        args: command.collect(),
        working_dir: build.working_dir,
        logs_dir: build.logs_dir,
        timeout,
        max_concurrent_builds: build.max_concurrent_builds,
    })
}
