//! Mapping of gateway errors onto HTTP responses

use super::models::ErrorBody;
use crate::compensation::CompensationOutcome;
use crate::error::GatewayError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::error;

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::InvalidIntent(_) => StatusCode::BAD_REQUEST,
            GatewayError::Credential { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UnexpectedStatus { .. } => StatusCode::CONFLICT,
            GatewayError::ResourceResolution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::PlanExecution { .. }
            | GatewayError::Poll { .. }
            | GatewayError::Descriptor(_) => StatusCode::BAD_GATEWAY,
            GatewayError::WaitTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn details(&self) -> Value {
        match &self.0 {
            GatewayError::ResourceResolution { what, reason } => {
                json!({ "what": what, "reason": reason })
            }
            GatewayError::PlanExecution {
                step,
                cause,
                compensation,
            } => json!({
                "step": step,
                "code": cause.code(),
                "cause": cause.to_string(),
                "suggestion": cause.suggestion(),
                "compensation": compensation_details(compensation),
            }),
            GatewayError::WaitTimeout {
                descriptor,
                target,
                last_status,
                elapsed,
                intervals,
            } => json!({
                "resource": descriptor,
                "target": target,
                "last_status": last_status,
                "elapsed_secs": elapsed.as_secs_f64(),
                "intervals_secs": intervals.iter().map(|d| d.as_secs_f64()).collect::<Vec<_>>(),
            }),
            GatewayError::Poll {
                descriptor,
                attempts,
                cause,
            } => json!({
                "resource": descriptor,
                "attempts": attempts,
                "cause": cause.to_string(),
            }),
            GatewayError::NotFound { kind, handle, cause } => json!({
                "kind": kind,
                "handle": handle,
                "code": cause.code(),
            }),
            GatewayError::Credential { cause } => json!({
                "code": cause.code(),
                "cause": cause.to_string(),
            }),
            GatewayError::UnexpectedStatus {
                descriptor,
                target,
                observed,
            } => json!({
                "resource": descriptor,
                "target": target,
                "observed": observed,
            }),
            GatewayError::Cancelled { step, compensation } => json!({
                "step": step,
                "compensation": compensation_details(compensation),
            }),
            GatewayError::InvalidIntent(_) | GatewayError::Descriptor(_) => json!({}),
        }
    }
}

fn compensation_details(outcome: &CompensationOutcome) -> Value {
    match outcome {
        CompensationOutcome::NotRequired => json!({ "status": "not_required" }),
        CompensationOutcome::Succeeded { steps } => {
            json!({ "status": "succeeded", "steps": steps })
        }
        CompensationOutcome::Failed {
            succeeded,
            failures,
        } => json!({
            "status": "failed",
            "steps": succeeded,
            "failures": failures
                .iter()
                .map(|f| json!({ "step": f.step, "error": f.cause.to_string() }))
                .collect::<Vec<_>>(),
        }),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
