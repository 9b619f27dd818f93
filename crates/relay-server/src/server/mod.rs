//! Route table (spec.md §4.G): path → handler.

mod landing;
mod recognize;
mod reference;
mod worker_ws;
mod ws_speech;
mod ws_status;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full axum router over `state`.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(landing::handler))
		.route("/client/ws/speech", get(ws_speech::handler))
		.route("/client/ws/status", get(ws_status::handler))
		.route(
			"/client/dynamic/reference",
			post(reference::post_handler).options(reference::options_handler),
		)
		.route("/client/dynamic/recognize", post(recognize::handler).put(recognize::handler))
		.route("/worker/ws/speech", get(worker_ws::handler))
		.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
		.with_state(state)
}
