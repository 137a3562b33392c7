use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error, warn, Level};
use wheel_shared::{ConfigError, WheelError};

#[derive(Debug)]
pub enum Error {
    Wheel(WheelError),
    Validation(validator::ValidationErrors),
    /// The spin task died before reporting back
    SpinTask,
}

impl From<WheelError> for Error {
    fn from(err: WheelError) -> Self {
        Error::Wheel(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Wheel(WheelError::Config(err))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Validation(err)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Wheel(e) => match e {
                WheelError::Config(_) | WheelError::UnknownPayout(_) => StatusCode::BAD_REQUEST,
                WheelError::AlreadySpinning | WheelError::Aborted | WheelError::NotSpinning => StatusCode::CONFLICT,
                WheelError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::SpinTask => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Level the rejection is logged at. Routine busy/idle races stay quiet.
    pub fn log_level(&self) -> Level {
        match self {
            _ if self.status().is_server_error() => Level::ERROR,
            Error::Wheel(e) if e.is_recoverable() => Level::DEBUG,
            _ => Level::WARN,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Error::Wheel(e) => e.to_string(),
            Error::Validation(e) => format!("Invalid request: {}", e),
            Error::SpinTask => "Spin failed unexpectedly".to_string(),
        };
        match self.log_level() {
            Level::ERROR => error!("{}", message),
            Level::WARN => warn!("{}", message),
            _ => debug!("{}", message),
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
