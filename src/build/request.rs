// src/build/request.rs

//! Build request payload and the allow-list every field must pass.
//!
//! Field values end up in the build tool's environment and the project id
//! ends up in a file name, so anything outside the expected shape is rejected
//! before a job is registered.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::errors::{BuildRunnerError, Result};

/// Body of `POST /build/{platform}`.
///
/// Field names follow the snake_case wire format; camelCase spellings are
/// accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildRequest {
    pub url: String,
    #[serde(alias = "appEnv")]
    pub app_env: String,
    #[serde(alias = "projectToken")]
    pub socket_project_token: String,
    #[serde(alias = "projectId")]
    pub socket_project_id: String,
    #[serde(alias = "styleUrl")]
    pub style_url: String,
    #[serde(alias = "appName")]
    pub app_name: String,
    #[serde(alias = "appPackageName")]
    pub app_package_name: String,
}

static PROJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]{0,127}$").expect("valid regex"));
static APP_ENV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,64}$").expect("valid regex"));
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._~+/=:-]{1,512}$").expect("valid regex"));
static PACKAGE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)+$").expect("valid regex")
});

const MAX_URL_LEN: usize = 2048;
const MAX_APP_NAME_CHARS: usize = 128;
const MAX_PACKAGE_NAME_LEN: usize = 255;

impl BuildRequest {
    /// The join key for logs and job status.
    pub fn project_id(&self) -> &str {
        &self.socket_project_id
    }

    /// Check every field against its allow-list.
    pub fn validate(&self) -> Result<()> {
        validate_project_id(&self.socket_project_id)?;
        validate_url("url", &self.url)?;
        validate_url("style_url", &self.style_url)?;
        check_pattern(
            "app_env",
            &self.app_env,
            &APP_ENV_RE,
            "expected 1-64 letters, digits, '.', '_' or '-'",
        )?;
        check_pattern(
            "socket_project_token",
            &self.socket_project_token,
            &TOKEN_RE,
            "expected 1-512 URL-safe token characters",
        )?;
        validate_app_name(&self.app_name)?;
        if self.app_package_name.len() > MAX_PACKAGE_NAME_LEN {
            return Err(invalid("app_package_name", "longer than 255 bytes"));
        }
        check_pattern(
            "app_package_name",
            &self.app_package_name,
            &PACKAGE_NAME_RE,
            "expected a dotted package name like com.example.app",
        )?;
        Ok(())
    }
}

/// Project ids name log files, so they must be a single safe path component.
pub fn validate_project_id(project_id: &str) -> Result<()> {
    check_pattern(
        "socket_project_id",
        project_id,
        &PROJECT_ID_RE,
        "expected 1-128 letters, digits, '.', '_' or '-', starting with a letter or digit",
    )
}

fn validate_url(field: &'static str, value: &str) -> Result<()> {
    if value.len() > MAX_URL_LEN {
        return Err(invalid(field, "longer than 2048 bytes"));
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(invalid(field, "must start with http:// or https://"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid(field, "must not contain whitespace or control characters"));
    }
    Ok(())
}

fn validate_app_name(value: &str) -> Result<()> {
    let chars = value.chars().count();
    if chars == 0 || chars > MAX_APP_NAME_CHARS {
        return Err(invalid("app_name", "must be 1-128 characters"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid("app_name", "must not contain control characters"));
    }
    Ok(())
}

fn check_pattern(field: &'static str, value: &str, re: &Regex, reason: &str) -> Result<()> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(invalid(field, reason))
    }
}

fn invalid(field: &'static str, reason: &str) -> BuildRunnerError {
    BuildRunnerError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}
