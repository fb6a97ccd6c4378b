//! The response envelope and the mapping from domain errors to HTTP statuses.
//!
//! Every response body is `{success, data | error, timestamp}`. Client-caused
//! errors carry their message; internal failures are logged and rendered as
//! `internal error`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::atomspace::store::now_millis;
use crate::atomspace::AtomSpaceError;
use crate::instances::InstanceError;
use crate::mindagent::MindAgentError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Wrap a successful payload.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        data: Some(data),
        error: None,
        timestamp: now_millis(),
    }))
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    fn conflict(message: String) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message,
        }
    }

    /// Log the detail; the client only learns that something broke.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".into(),
        }
    }

    /// The text-completion service failed or is not configured.
    pub fn upstream(detail: impl std::fmt::Display) -> Self {
        tracing::warn!(error = %detail, "reasoning provider failed");
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: format!("reasoning provider failed: {detail}"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AtomSpaceError> for ApiError {
    fn from(error: AtomSpaceError) -> Self {
        match error {
            AtomSpaceError::Validation(_)
            | AtomSpaceError::EmptyOutgoing
            | AtomSpaceError::DanglingReference { .. } => Self::validation(error.to_string()),
            AtomSpaceError::DuplicateName { .. } => Self::conflict(error.to_string()),
            AtomSpaceError::Storage(_) | AtomSpaceError::Unavailable(_) => Self::internal(error),
        }
    }
}

impl From<MindAgentError> for ApiError {
    fn from(error: MindAgentError) -> Self {
        match error {
            MindAgentError::NotFound(_) => Self::not_found(error.to_string()),
            MindAgentError::AgentDisabled(_) => Self::conflict(error.to_string()),
            MindAgentError::Validation(_) => Self::validation(error.to_string()),
            MindAgentError::AtomSpace(inner) => inner.into(),
            MindAgentError::Storage(_)
            | MindAgentError::Encoding(_)
            | MindAgentError::Background(_)
            | MindAgentError::Unavailable(_) => Self::internal(error),
        }
    }
}

impl From<InstanceError> for ApiError {
    fn from(error: InstanceError) -> Self {
        match error {
            InstanceError::InvalidName(_) => Self::validation(error.to_string()),
            InstanceError::MindAgent(inner) => inner.into(),
            InstanceError::Activation { .. } => Self::internal(error),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(format!("invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(Envelope::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            timestamp: now_millis(),
        });
        (self.status, body).into_response()
    }
}
