//! `GET /worker/ws/speech` — worker protocol (spec.md §4.C, §6).
//!
//! Origin is intentionally unrestricted — a deliberate deployment choice
//! carried over from the source, not an oversight (spec.md §4.C).

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use relay_core::{ChannelSink, WorkerOutbound, WorkerSession};

use crate::state::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(socket: WebSocket, state: AppState) {
	let id = state.worker_ids.next();
	let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WorkerOutbound>();
	let sink = ChannelSink::new(out_tx);
	let worker = WorkerSession::register(id, sink, state.registry.clone(), state.status.clone()).await;

	let (mut ws_tx, mut ws_rx) = socket.split();

	let mut egress = tokio::spawn(async move {
		while let Some(msg) = out_rx.recv().await {
			let ws_msg = match msg {
				WorkerOutbound::Opening(frame) => match serde_json::to_string(&frame) {
					Ok(json) => Message::Text(json.into()),
					Err(err) => {
						warn!(worker = %id, error = %err, "failed to serialize opening frame");
						continue;
					}
				},
				WorkerOutbound::Audio(bytes) => Message::Binary(Bytes::from(bytes)),
				WorkerOutbound::Eos => Message::Binary(Bytes::from_static(b"EOS")),
				WorkerOutbound::Close => break,
			};
			if ws_tx.send(ws_msg).await.is_err() {
				break;
			}
		}
		let _ = ws_tx.close().await;
	});

	let worker_for_ingest = worker.clone();
	let mut ingest = tokio::spawn(async move {
		while let Some(frame) = ws_rx.next().await {
			match frame {
				Ok(Message::Text(text)) => {
					if worker_for_ingest.on_message(&text).await.is_err() {
						break;
					}
				}
				Ok(Message::Close(_)) | Err(_) => break,
				Ok(_) => {}
			}
		}
	});

	tokio::select! {
		_ = &mut egress => { ingest.abort(); }
		_ = &mut ingest => { egress.abort(); }
	}

	worker.on_close().await;
	info!(worker = %id, "worker connection closed");
}
