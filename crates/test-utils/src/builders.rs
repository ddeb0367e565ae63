#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use buildrunner::build::BuildRequest;
use buildrunner::config::BuildSettings;

/// Builder for `BuildSettings` to simplify test setup.
///
/// Defaults to running `sh -c "true"` in the current directory with a
/// 5-second timeout.
pub struct BuildSettingsBuilder {
    settings: BuildSettings,
}

impl BuildSettingsBuilder {
    pub fn new(logs_dir: impl AsRef<Path>) -> Self {
        Self {
            settings: BuildSettings {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), "true".to_string()],
                working_dir: PathBuf::from("."),
                logs_dir: logs_dir.as_ref().to_path_buf(),
                timeout: Duration::from_secs(5),
                max_concurrent_builds: 4,
            },
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(mut self, script: &str) -> Self {
        self.settings.program = "sh".to_string();
        self.settings.args = vec!["-c".to_string(), script.to_string()];
        self
    }

    pub fn program(mut self, program: &str, args: &[&str]) -> Self {
        self.settings.program = program.to_string();
        self.settings.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.settings.working_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    pub fn max_concurrent_builds(mut self, n: usize) -> Self {
        self.settings.max_concurrent_builds = n;
        self
    }

    pub fn build(self) -> BuildSettings {
        self.settings
    }
}

/// Builder for `BuildRequest` with valid values for every field.
pub struct BuildRequestBuilder {
    request: BuildRequest,
}

impl BuildRequestBuilder {
    pub fn new(project_id: &str) -> Self {
        Self {
            request: BuildRequest {
                url: "https://api.example.com".to_string(),
                app_env: "production".to_string(),
                socket_project_token: "tok_abc123".to_string(),
                socket_project_id: project_id.to_string(),
                style_url: "https://maps.example.com/style.json".to_string(),
                app_name: "Example App".to_string(),
                app_package_name: "com.example.app".to_string(),
            },
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.request.url = url.to_string();
        self
    }

    pub fn app_env(mut self, app_env: &str) -> Self {
        self.request.app_env = app_env.to_string();
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.request.socket_project_token = token.to_string();
        self
    }

    pub fn style_url(mut self, style_url: &str) -> Self {
        self.request.style_url = style_url.to_string();
        self
    }

    pub fn app_name(mut self, app_name: &str) -> Self {
        self.request.app_name = app_name.to_string();
        self
    }

    pub fn package_name(mut self, package_name: &str) -> Self {
        self.request.app_package_name = package_name.to_string();
        self
    }

    pub fn build(self) -> BuildRequest {
        self.request
    }

    /// JSON body as sent to `POST /build/{platform}`.
    pub fn json(self) -> String {
        format!(
            r#"{{"url":"{}","app_env":"{}","socket_project_token":"{}","socket_project_id":"{}","style_url":"{}","app_name":"{}","app_package_name":"{}"}}"#,
            self.request.url,
            self.request.app_env,
            self.request.socket_project_token,
            self.request.socket_project_id,
            self.request.style_url,
            self.request.app_name,
            self.request.app_package_name,
        )
    }
}
