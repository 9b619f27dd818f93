//! `POST`/`PUT /client/dynamic/recognize` — chunked HTTP client protocol
//! (spec.md §4.E).

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use relay_core::{ChunkedClientSession, OpenParams, RelayError};
use relay_proto::SessionId;

use crate::state::AppState;

fn default_none() -> String {
	"none".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RecognizeQuery {
	#[serde(rename = "device-id", default = "default_none")]
	device_id: String,
	#[serde(rename = "content-id", default = "default_none")]
	content_id: String,
	#[serde(rename = "content-type", default)]
	content_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct Hypothesis {
	utterance: String,
}

#[derive(Debug, Serialize)]
struct RecognizeResponse {
	status: i32,
	id: SessionId,
	hypotheses: Vec<Hypothesis>,
}

pub async fn handler(State(state): State<AppState>, Query(query): Query<RecognizeQuery>, request: Request) -> Response {
	let id = SessionId::new();
	let params = OpenParams {
		user_id: query.device_id,
		content_id: query.content_id,
		content_type: query.content_type,
	};

	let session = match ChunkedClientSession::open(id, &state.registry, state.status.clone(), params).await {
		Ok(session) => session,
		Err(RelayError::NoWorkerAvailable) => {
			return (StatusCode::SERVICE_UNAVAILABLE, "No workers available").into_response();
		}
		Err(err) => {
			warn!(error = %err, "unexpected error claiming worker");
			return (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response();
		}
	};

	let mut body = request.into_body().into_data_stream();
	while let Some(chunk) = body.next().await {
		match chunk {
			Ok(bytes) => session.forward_audio(bytes.to_vec()).await,
			Err(err) => {
				warn!(session = %id, error = %err, "error reading request body, ending early");
				break;
			}
		}
	}

	let rendezvous = session.send_eos().await;
	let transcript = match tokio::time::timeout(state.worker_timeout, rendezvous).await {
		Ok(Ok(hyp)) => hyp,
		Ok(Err(_)) => String::new(),
		Err(_) => {
			warn!(session = %id, "worker timed out waiting for final result");
			session.force_release().await;
			return (StatusCode::GATEWAY_TIMEOUT, "Worker timed out").into_response();
		}
	};

	info!(session = %id, "recognize request completed");
	Json(RecognizeResponse {
		status: 0,
		id,
		hypotheses: vec![Hypothesis { utterance: transcript }],
	})
	.into_response()
}
