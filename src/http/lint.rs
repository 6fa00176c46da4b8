use crate::lint::{BuiltinLinter, LintError, LintResponse};
use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use tracing::debug;

/// Lint metrics text
///
/// Checks Prometheus text exposition format with the built-in linter.
/// Speaks the same protocol the proxy expects from a remote lint service.
#[utoipa::path(
    put,
    path = "/lint",
    tag = "Lint",
    request_body(content = String, content_type = "text/plain", description = "Metrics text"),
    responses(
        (status = 200, description = "Metrics parsed, with or without lint problems", body = LintResponse),
        (status = 400, description = "Empty input or unparseable metrics", body = LintResponse),
    )
)]
pub async fn lint_metrics(body: Bytes) -> (StatusCode, Json<LintResponse>) {
    let text = match std::str::from_utf8(&body) {
        Ok(text) if text.trim().is_empty() => {
            return (StatusCode::BAD_REQUEST, Json(LintResponse::empty_input()));
        }
        Ok(text) => text,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LintResponse::parse_error(format!("input is not valid UTF-8: {}", err))),
            );
        }
    };

    match BuiltinLinter::new().lint_text(text) {
        Ok(problems) if problems.is_empty() => (StatusCode::OK, Json(LintResponse::success())),
        Ok(problems) => {
            debug!("Lint endpoint found {} problem(s)", problems.len());
            (StatusCode::OK, Json(LintResponse::warning(problems)))
        }
        Err(LintError::Parse(error)) | Err(LintError::Unreachable(error)) => (
            StatusCode::BAD_REQUEST,
            Json(LintResponse::parse_error(error)),
        ),
    }
}
