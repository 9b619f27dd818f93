//! Transport-level coverage for spec.md §4.C's protocol-violation path: a
//! worker that reports an event while unpaired is disconnected (and its
//! registry entry torn down), never the process (`SPEC_FULL.md` §9.3).

mod common;

use common::TestServer;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[tokio::test]
async fn unpaired_worker_event_closes_only_that_worker_session() {
	let server = TestServer::start().await;

	let (mut status, _) = tokio_tungstenite::connect_async(server.ws_url("/client/ws/status"))
		.await
		.unwrap();
	let initial: Value = match status.next().await.unwrap().unwrap() {
		WsMessage::Text(text) => serde_json::from_str(&text).unwrap(),
		other => panic!("expected status frame, got {other:?}"),
	};
	assert_eq!(initial["num_workers_available"], 0);

	let (mut worker, _) = tokio_tungstenite::connect_async(server.ws_url("/worker/ws/speech"))
		.await
		.unwrap();

	let after_connect: Value = match status.next().await.unwrap().unwrap() {
		WsMessage::Text(text) => serde_json::from_str(&text).unwrap(),
		other => panic!("expected status frame, got {other:?}"),
	};
	assert_eq!(after_connect["num_workers_available"], 1);

	// No client ever claimed this worker — reporting an event here is a
	// protocol violation, not a crash.
	worker
		.send(WsMessage::Text(r#"{"status":0}"#.to_string().into()))
		.await
		.unwrap();

	let next = worker.next().await;
	assert!(matches!(next, Some(Ok(WsMessage::Close(_))) | None));

	let after_violation: Value = match status.next().await.unwrap().unwrap() {
		WsMessage::Text(text) => serde_json::from_str(&text).unwrap(),
		other => panic!("expected status frame, got {other:?}"),
	};
	assert_eq!(after_violation["num_workers_available"], 0);
}
