// src/build/invocation.rs

//! Turning a request into a concrete build tool invocation.

use crate::build::request::BuildRequest;
use crate::config::BuildSettings;
use crate::exec::CommandSpec;

/// Environment variable names read by the build tool's compose project.
pub const ENV_URL: &str = "URL";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_PROJECT_TOKEN: &str = "SOCKET_PROJECT_TOKEN";
pub const ENV_PROJECT_ID: &str = "SOCKET_PROJECT_ID";
pub const ENV_STYLE_URL: &str = "styleURL";
pub const ENV_APP_NAME: &str = "APP_NAME";
pub const ENV_APP_PACKAGE_NAME: &str = "APP_PACKAGE_NAME";

/// Map every request field to its build tool variable. Total and order-stable.
pub fn build_env(request: &BuildRequest) -> [(&'static str, String); 7] {
    [
        (ENV_URL, request.url.clone()),
        (ENV_APP_ENV, request.app_env.clone()),
        (ENV_PROJECT_TOKEN, request.socket_project_token.clone()),
        (ENV_PROJECT_ID, request.socket_project_id.clone()),
        (ENV_STYLE_URL, request.style_url.clone()),
        (ENV_APP_NAME, request.app_name.clone()),
        (ENV_APP_PACKAGE_NAME, request.app_package_name.clone()),
    ]
}

/// Full invocation for an (already validated) Android build.
pub fn android_command(settings: &BuildSettings, request: &BuildRequest) -> CommandSpec {
    CommandSpec {
        label: request.project_id().to_string(),
        program: settings.program.clone(),
        args: settings.args.clone(),
        working_dir: Some(settings.working_dir.clone()),
        env: build_env(request)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}
