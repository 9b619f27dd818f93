//! Shared harness for the chunked-HTTP integration tests: boots a real
//! `relayd` router on an ephemeral port and hands back its base URL plus a
//! connected fake-worker websocket client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use relay_core::{ReferenceStore, RegistryService, StatusService, WorkerIdGen};
use relay_server::state::AppState;

pub struct TestServer {
	pub addr: SocketAddr,
}

impl TestServer {
	pub async fn start() -> Self {
		Self::start_with_timeout(Duration::from_secs(120)).await
	}

	pub async fn start_with_timeout(worker_timeout: Duration) -> Self {
		let state = AppState {
			registry: RegistryService::start(),
			status: StatusService::start(),
			reference_store: Arc::new(ReferenceStore::new(std::env::temp_dir().join(format!(
				"relay-test-reference-{}.json",
				uuid::Uuid::new_v4()
			)))),
			worker_ids: Arc::new(WorkerIdGen::default()),
			worker_timeout,
		};
		let router = relay_server::server::router(state);
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, router).await.unwrap();
		});
		Self { addr }
	}

	pub fn http_base(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn ws_url(&self, path: &str) -> String {
		format!("ws://{}{}", self.addr, path)
	}
}

/// A fake worker driven from the test: reads JSON/binary frames sent by the
/// broker and can push recognition events back.
pub struct FakeWorker {
	pub socket: tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
}

impl FakeWorker {
	pub async fn connect(server: &TestServer) -> Self {
		let (socket, _) = tokio_tungstenite::connect_async(server.ws_url("/worker/ws/speech"))
			.await
			.expect("worker connects");
		Self { socket }
	}

	pub async fn recv_text(&mut self) -> String {
		match self.socket.next().await.expect("frame available").unwrap() {
			WsMessage::Text(text) => text.to_string(),
			other => panic!("expected text frame, got {other:?}"),
		}
	}

	pub async fn recv_binary(&mut self) -> Vec<u8> {
		match self.socket.next().await.expect("frame available").unwrap() {
			WsMessage::Binary(bytes) => bytes.to_vec(),
			other => panic!("expected binary frame, got {other:?}"),
		}
	}

	pub async fn send_event(&mut self, json: &str) {
		self.socket.send(WsMessage::Text(json.to_string().into())).await.unwrap();
	}

	pub async fn close(mut self) {
		let _ = self.socket.close(None).await;
	}
}
