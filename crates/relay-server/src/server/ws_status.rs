//! `GET /client/ws/status` — status fan-out (spec.md §4.B, §6).
//!
//! Inbound frames from the observer are ignored; outbound is a JSON status
//! frame on attach and on every subsequent worker/request-count change.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::state::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(socket: WebSocket, state: AppState) {
	let mut subscription = state.status.attach().await;
	let (mut ws_tx, mut ws_rx) = socket.split();

	// Owns the subscription: when the loop ends (send failure or the
	// registry already dropped us), detaching here is what the spec calls
	// doing so "on next underlying socket close".
	let mut egress = tokio::spawn(async move {
		while let Some(frame) = subscription.rx.recv().await {
			let Ok(json) = serde_json::to_string(&frame) else {
				continue;
			};
			if ws_tx.send(Message::Text(json.into())).await.is_err() {
				break;
			}
		}
		subscription.detach().await;
	});

	let mut ingest = tokio::spawn(async move { while let Some(Ok(_)) = ws_rx.next().await {} });

	tokio::select! {
		_ = &mut egress => { ingest.abort(); }
		_ = &mut ingest => { egress.abort(); }
	}
}
