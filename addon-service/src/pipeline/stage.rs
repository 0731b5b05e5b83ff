use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// One step of the installation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Probing,
    Installing,
    Registering,
    Minting,
    Delivering,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Probing,
        Stage::Installing,
        Stage::Registering,
        Stage::Minting,
        Stage::Delivering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Probing => "probing",
            Stage::Installing => "installing",
            Stage::Registering => "registering",
            Stage::Minting => "minting",
            Stage::Delivering => "delivering",
        }
    }

    /// User-facing summary of a failure at this stage.
    pub fn failure_message(&self, addon: &str, registry: &str) -> String {
        match self {
            Stage::Probing => {
                format!("could not find addon \"{}\" in registry {}", addon, registry)
            }
            Stage::Installing => format!("failed to install \"{}\"", addon),
            Stage::Registering => format!("failed to generate client for \"{}\"", addon),
            Stage::Minting => format!("failed to generate access token for \"{}\"", addon),
            Stage::Delivering => format!("failed to deliver access token for \"{}\"", addon),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single installation run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running(Stage),
    Done,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

/// Failure of an HTTP exchange with a collaborator.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl HttpError {
    pub fn invalid_url(url: &str, reason: impl fmt::Display) -> Self {
        HttpError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// HTTP client for the POST stages. Redirects are not followed, so a 3xx
/// answer is judged by its own status.
pub fn post_client() -> Result<reqwest::Client, HttpError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(HttpError::Transport)
}

/// Treat any status of 400 or above as a failure.
pub(crate) fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HttpError> {
    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(HttpError::Status(status));
    }
    Ok(response)
}

/// Typed failure reported by a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("registry responded with {0}")]
    NotFound(StatusCode),

    #[error("registry unreachable: {0}")]
    Network(#[source] HttpError),

    #[error("{0}")]
    Install(String),

    #[error("client registration failed: {0}")]
    Registration(#[source] HttpError),

    #[error("token mint failed: {0}")]
    Mint(#[source] HttpError),

    #[error("client has no callback url")]
    MissingCallback,

    #[error("token delivery failed: {0}")]
    Delivery(#[source] HttpError),
}

/// Terminal failure of an installation run, attributed to the stage that
/// failed.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
    #[source]
    pub cause: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, addon: &str, registry: &str, cause: StageError) -> Self {
        Self {
            stage,
            message: stage.failure_message(addon, registry),
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_name_the_stage() {
        let messages: Vec<String> = Stage::ALL
            .iter()
            .map(|stage| stage.failure_message("weather", "https://registry.npmjs.org"))
            .collect();

        assert_eq!(
            messages[0],
            "could not find addon \"weather\" in registry https://registry.npmjs.org"
        );
        assert_eq!(messages[1], "failed to install \"weather\"");
        assert_eq!(messages[2], "failed to generate client for \"weather\"");
        assert_eq!(messages[3], "failed to generate access token for \"weather\"");
        assert_eq!(messages[4], "failed to deliver access token for \"weather\"");
    }

    #[test]
    fn test_pipeline_error_keeps_cause() {
        let err = PipelineError::new(
            Stage::Probing,
            "missing-pkg",
            "https://registry.npmjs.org",
            StageError::NotFound(StatusCode::NOT_FOUND),
        );

        assert_eq!(err.stage, Stage::Probing);
        assert!(err.to_string().starts_with("could not find addon"));
        assert!(matches!(err.cause, StageError::NotFound(StatusCode::NOT_FOUND)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PipelineState::Idle.is_terminal());
        assert!(!PipelineState::Running(Stage::Minting).is_terminal());
        assert!(PipelineState::Done.is_terminal());
        assert!(PipelineState::Failed(Stage::Probing).is_terminal());
    }
}
