//! Common API types and utilities

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jb_common::{PageRequest, DEFAULT_PAGE_SIZE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::error::PlatformError;

/// Standard API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

pub type ApiResult<T> = Result<Json<T>, PlatformError>;

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PlatformError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PlatformError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PlatformError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PlatformError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            PlatformError::Conflict { .. } => (StatusCode::BAD_REQUEST, "CONFLICT"),
            PlatformError::Upstream { client_fault: true, .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            PlatformError::Unavailable { .. } => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            PlatformError::Upstream { client_fault: false, .. }
            | PlatformError::Configuration { .. }
            | PlatformError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %self, "Request failed");
                "Something went wrong!".to_string()
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                error!(error = %self, "Backing service unavailable");
                "Service temporarily unavailable, please retry".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ApiError::new(code, message))).into_response()
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    pub fn to_page_request(self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Success response with a message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// JSON body extractor whose rejections use the platform error body
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> PlatformError {
    match rejection {
        JsonRejection::JsonDataError(e) => PlatformError::validation(e.body_text()),
        JsonRejection::JsonSyntaxError(_) => PlatformError::validation("Malformed JSON body"),
        JsonRejection::MissingJsonContentType(_) => {
            PlatformError::validation("Expected request with `Content-Type: application/json`")
        }
        other => PlatformError::validation(other.body_text()),
    }
}

/// Query-string extractor whose rejections use the platform error body
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ValidQuery(value))
            .map_err(|rejection: QueryRejection| PlatformError::validation(rejection.body_text()))
    }
}

/// Path-parameter extractor whose rejections use the platform error body
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ValidPath(value))
            .map_err(|rejection: PathRejection| PlatformError::validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> ApiError {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let cases = [
            (PlatformError::unauthenticated("x"), StatusCode::UNAUTHORIZED),
            (PlatformError::forbidden("x"), StatusCode::FORBIDDEN),
            (PlatformError::not_found("Job", "1"), StatusCode::NOT_FOUND),
            (PlatformError::validation("x"), StatusCode::BAD_REQUEST),
            (PlatformError::conflict("x"), StatusCode::BAD_REQUEST),
            (PlatformError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = PlatformError::Upstream {
            message: "relation \"jobs\" does not exist".to_string(),
            client_fault: false,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert!(!body.message.contains("relation"));
    }

    #[tokio::test]
    async fn test_conflict_keeps_its_message() {
        let body = body_of(PlatformError::conflict("Job already saved").into_response()).await;
        assert_eq!(body.error, "CONFLICT");
        assert_eq!(body.message, "Job already saved");
    }

    #[tokio::test]
    async fn test_bad_path_param_is_validation_error() {
        use axum::{body::Body, routing::get, Router};
        use tower::ServiceExt;
        use uuid::Uuid;

        async fn echo(ValidPath(id): ValidPath<Uuid>) -> String {
            id.to_string()
        }
        let router = Router::new().route("/items/:id", get(echo));

        let id = Uuid::new_v4();
        let request = axum::http::Request::builder().uri(format!("/items/{}", id)).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = axum::http::Request::builder().uri("/items/42").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert!(!body.message.is_empty());
    }

    #[test]
    fn test_pagination_defaults() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.to_page_request(), PageRequest::new(1, 10));
    }
}
