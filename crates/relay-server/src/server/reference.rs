//! `/client/dynamic/reference` — reference-transcript store (spec.md §4.F).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;

use relay_core::ReferenceEntry;

use crate::state::AppState;

const ALLOW_ORIGIN: HeaderName = HeaderName::from_static("access-control-allow-origin");
const ALLOW_METHODS: HeaderName = HeaderName::from_static("access-control-allow-methods");
const ALLOW_HEADERS: HeaderName = HeaderName::from_static("access-control-allow-headers");
const MAX_AGE: HeaderName = HeaderName::from_static("access-control-max-age");

pub async fn post_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
	let Some(content_id) = headers.get("content-id").and_then(|v| v.to_str().ok()) else {
		return (StatusCode::BAD_REQUEST, "Missing Content-Id header").into_response();
	};
	let user_id = headers
		.get("user-id")
		.and_then(|v| v.to_str().ok())
		.unwrap_or_default()
		.to_string();
	let content = String::from_utf8_lossy(&body).into_owned();

	match state
		.reference_store
		.save(content_id.to_string(), ReferenceEntry { content, user_id })
		.await
	{
		Ok(()) => {
			let mut resp = StatusCode::OK.into_response();
			resp.headers_mut().insert(ALLOW_ORIGIN, HeaderValue::from_static("*"));
			resp
		}
		Err(err) => {
			error!(error = %err, content_id, "reference store write failed");
			(StatusCode::INTERNAL_SERVER_ERROR, "reference store write failed").into_response()
		}
	}
}

pub async fn options_handler() -> Response {
	let mut resp = StatusCode::OK.into_response();
	let h = resp.headers_mut();
	h.insert(ALLOW_ORIGIN, HeaderValue::from_static("*"));
	h.insert(ALLOW_METHODS, HeaderValue::from_static("POST"));
	h.insert(
		ALLOW_HEADERS,
		HeaderValue::from_static("origin, x-csrftoken, content-type, accept, User-Id, Content-Id"),
	);
	h.insert(MAX_AGE, HeaderValue::from_static("1000"));
	resp
}
