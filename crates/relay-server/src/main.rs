//! `relayd`: the relay speech-recognition broker's listener binary.
//!
//! Wires `relay-core`'s domain actors to a real `tokio`/`axum` listener.
//! Everything that touches a socket lives in this crate; session lifecycle,
//! pairing, and teardown logic live in `relay-core`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use relay_core::{ReferenceStore, RegistryService, StatusService, WorkerIdGen};
use relay_server::{server, state::AppState};

/// `relayd` command-line arguments. The only flag spec.md mandates is
/// `--port`; `--verbose` and `--worker-timeout-secs` are this
/// implementation's ambient-stack and Open-Question resolutions
/// (`SPEC_FULL.md` §6, §9).
#[derive(Parser, Debug)]
#[command(name = "relayd")]
#[command(about = "Dispatch core of a speech-recognition gateway")]
struct Args {
	/// Port to listen on.
	#[arg(long)]
	port: u16,

	/// Enable debug-level logging.
	#[arg(short, long)]
	verbose: bool,

	/// Seconds a chunked-HTTP request waits for its paired worker to close
	/// after EOS before giving up with a 504. See `SPEC_FULL.md` §4.E.
	#[arg(long, default_value_t = 120)]
	worker_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	info!(port = args.port, "starting relayd");

	let state = AppState {
		registry: RegistryService::start(),
		status: StatusService::start(),
		reference_store: Arc::new(ReferenceStore::new("reference-content.json".into())),
		worker_ids: Arc::new(WorkerIdGen::default()),
		worker_timeout: Duration::from_secs(args.worker_timeout_secs),
	};

	let router = server::router(state);
	let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
	info!(addr = %listener.local_addr()?, "listening");

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	info!("relayd shut down cleanly");
	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
	info!("shutdown signal received");
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("relay_core=debug,relay_server=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
