use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::error::{FieldError, ServiceError};
use crate::domain::rules::RuleViolation;

/// JSON error body shared by every route.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<FieldErrorItem>)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldErrorItem {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<FieldError>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "authentication required")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => Self {
                status: StatusCode::BAD_REQUEST,
                message: "validation failed".into(),
                errors,
            },
            ServiceError::BadRequest(m) => Self::new(StatusCode::BAD_REQUEST, m),
            ServiceError::Unauthorized => Self::unauthorized(),
            ServiceError::Forbidden(m) => Self::new(StatusCode::FORBIDDEN, m),
            e @ ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, m),
            ServiceError::Unprocessable(m) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, m),
            ServiceError::Internal(e) => {
                tracing::error!(error = ?e, "internal_error");
                Self::internal()
            }
        }
    }
}

impl From<RuleViolation> for ApiError {
    fn from(v: RuleViolation) -> Self {
        ServiceError::from(v).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rej: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rej.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

/// `Json` extractor whose rejections use the shared error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let err: ApiError = ServiceError::Validation(vec![FieldError {
            field: "email".into(),
            message: "must be a valid email address".into(),
        }])
        .into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "validation failed");
        assert_eq!(json["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn internal_errors_are_masked() {
        let err: ApiError = ServiceError::Internal(anyhow::anyhow!("db exploded")).into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "internal server error");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases = [
            (ServiceError::NotFound("order"), StatusCode::NOT_FOUND),
            (ServiceError::forbidden("no"), StatusCode::FORBIDDEN),
            (ServiceError::conflict("taken"), StatusCode::CONFLICT),
            (ServiceError::unprocessable("stock"), StatusCode::UNPROCESSABLE_ENTITY),
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
        assert_eq!(
            ApiError::from(ServiceError::NotFound("order")).message,
            "order not found"
        );
    }
}
