use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use harness_core::HarnessError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<HarnessError>() {
            Some(e) => match e {
                HarnessError::InvalidWorkflowMode(_)
                | HarnessError::InvalidTaskStatus(_)
                | HarnessError::InvalidPriority(_)
                | HarnessError::InvalidRuleCategory(_) => StatusCode::BAD_REQUEST,
                HarnessError::InvalidConfig(_) | HarnessError::Yaml(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                HarnessError::Tokenizer(_) => StatusCode::SERVICE_UNAVAILABLE,
                HarnessError::Overflow(_)
                | HarnessError::ComponentFailed { .. }
                | HarnessError::Io(_)
                | HarnessError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_mode_maps_to_400() {
        let err = AppError(HarnessError::InvalidWorkflowMode("trio".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_config_maps_to_422() {
        let err = AppError(HarnessError::InvalidConfig("bad url".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn tokenizer_failure_maps_to_503() {
        let err = AppError(HarnessError::Tokenizer("no vocab".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn io_error_maps_to_500() {
        let err = AppError(HarnessError::Io(std::io::Error::other("disk full")).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn foreign_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_is_json() {
        let response = AppError(HarnessError::InvalidPriority("!!".into()).into()).into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
