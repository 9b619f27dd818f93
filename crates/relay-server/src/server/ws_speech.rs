//! `GET /client/ws/speech` — streaming websocket client protocol (spec.md §4.D).

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;

use relay_core::{ChannelSink, ClientOutbound, OpenParams, StreamingClientSession};
use relay_proto::SessionId;

use crate::state::AppState;

fn default_none() -> String {
	"none".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SpeechQuery {
	#[serde(rename = "user-id", default = "default_none")]
	user_id: String,
	#[serde(rename = "content-id", default = "default_none")]
	content_id: String,
	#[serde(rename = "content-type", default)]
	content_type: Option<String>,
}

pub async fn handler(
	ws: WebSocketUpgrade,
	Query(query): Query<SpeechQuery>,
	State(state): State<AppState>,
) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle(socket, state, query))
}

async fn handle(socket: WebSocket, state: AppState, query: SpeechQuery) {
	let id = SessionId::new();
	let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientOutbound>();
	let sink = ChannelSink::new(out_tx);
	let params = OpenParams {
		user_id: query.user_id,
		content_id: query.content_id,
		content_type: query.content_type,
	};
	let session = StreamingClientSession::open(id, sink, &state.registry, state.status.clone(), params).await;

	let (mut ws_tx, mut ws_rx) = socket.split();

	let mut egress = tokio::spawn(async move {
		while let Some(msg) = out_rx.recv().await {
			let ws_msg = match msg {
				ClientOutbound::Event(event) => match serde_json::to_string(&event) {
					Ok(json) => Message::Text(json.into()),
					Err(_) => continue,
				},
				ClientOutbound::Close => break,
			};
			if ws_tx.send(ws_msg).await.is_err() {
				break;
			}
		}
		let _ = ws_tx.close().await;
	});

	let session_for_ingest = session.clone();
	let mut ingest = tokio::spawn(async move {
		while let Some(frame) = ws_rx.next().await {
			match frame {
				Ok(Message::Binary(bytes)) => session_for_ingest.forward_audio(bytes.to_vec()).await,
				Ok(Message::Close(_)) | Err(_) => break,
				Ok(_) => {}
			}
		}
	});

	tokio::select! {
		_ = &mut egress => { ingest.abort(); }
		_ = &mut ingest => { egress.abort(); }
	}

	session.on_client_disconnect().await;
	info!(session = %id, "streaming client disconnected");
}
