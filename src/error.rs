use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;

/// Error taxonomy shared by every booking operation.
///
/// `Input` and `NotFound` carry a message meant for the caller. `Internal`
/// keeps the full cause chain for operators and is never shown to clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Input(String),

    #[error("{0}")]
    NotFound(String),

    /// The store aborted the transaction because of a concurrent write.
    /// The whole operation may be retried.
    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn input(msg: impl Into<String>) -> Self {
        AppError::Input(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Postgres SQLSTATE codes that mean "retry the transaction"
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    tracing::debug!(constraint = ?db_err.constraint(), "unique violation");
                    return AppError::input("data already exists!");
                }
                ErrorKind::ForeignKeyViolation => {
                    tracing::debug!(constraint = ?db_err.constraint(), "foreign key violation");
                    return AppError::input("input invalid, check and try again later!");
                }
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    return AppError::input("input violates a data constraint");
                }
                _ => {}
            }

            if let Some(code) = db_err.code() {
                if code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED {
                    tracing::warn!(%code, "transaction aborted by a concurrent update");
                    return AppError::Conflict(
                        "the data was changed concurrently, please retry".to_string(),
                    );
                }
            }
        }

        if matches!(err, sqlx::Error::RowNotFound) {
            return AppError::not_found("data not found");
        }

        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, reason)
            })
            .collect();
        fields.sort();
        AppError::Input(fields.join(", "))
    }
}

/// Response envelope used for both success and failure bodies.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            message: "ok".to_string(),
            data: Some(data),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            AppError::Internal(ref err) => {
                let error_id = uuid::Uuid::new_v4();
                tracing::error!(
                    %error_id,
                    error = ?err,
                    backtrace = %err.backtrace(),
                    "internal error"
                );
                format!("something went wrong (ref {})", error_id)
            }
            other => {
                tracing::warn!(err = %other, status = status.as_u16());
                other.to_string()
            }
        };

        let body = ApiResponse::<()> {
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}
