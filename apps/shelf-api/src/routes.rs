use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use shelf_service::{Error, RerankedResult, SearchRequest};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/products/search", post(search))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<RerankedResult>, ApiError> {
	let Json(request) = payload.map_err(|rejection| {
		json_error(StatusCode::BAD_REQUEST, "invalid_argument", rejection.body_text())
	})?;
	let cancel = state.shutdown.child_token();
	let run = state.pipeline.run(&request, &cancel).await;

	Ok(Json(run.outcome?))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let status = match &err {
			Error::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
			Error::Retrieval { .. } => StatusCode::BAD_GATEWAY,
			Error::RerankUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
			Error::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
		};

		json_error(status, err.code(), err.to_string())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
