//! # Local Collector
//!
//! Stands in for the esdata collector while running `server_esdata` by hand:
//!
//! ```text
//! cargo run --bin test_collector -- --port 8080
//! ESDATA_COLLECTOR_HOST=127.0.0.1:8080 ESDATA_USE_TLS=false cargo run --bin server_esdata -- --input feed.ndjson
//! ```
//!
//! Every posted document is printed with a timestamp. `--status` makes it
//! answer with something other than 200 to watch the relay's error path.

#![forbid(unsafe_code)]

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use clap::Parser;
use serde_json::Value;

#[derive(Parser, Debug)]
#[clap(about = "Prints diff documents posted by server_esdata")]
struct Args {
    #[clap(long, default_value_t = 8080)]
    port: u16,

    #[clap(long, default_value_t = 200)]
    status: u16,
}

/// Accepts a diff document on any path and answers with `status`.
fn app(status: StatusCode) -> Router {
    Router::new()
        .route("/", post(receive))
        .route("/{*path}", post(receive))
        .with_state(status)
}

async fn receive(State(status): State<StatusCode>, Json(doc): Json<Value>) -> StatusCode {
    let entities = doc.as_object().map_or(0, |o| o.len());
    println!("[{}] POST ({} entities)", chrono::Local::now().format("%H:%M:%S"), entities);
    match serde_json::to_string_pretty(&doc) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => eprintln!("❌ Failed to print document: {}", e),
    }
    status
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let status = StatusCode::from_u16(args.status)
        .with_context(|| format!("Invalid status {}", args.status))?;

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;
    println!("--- Collector listening on http://{} ---", addr);

    axum::serve(listener, app(status).into_make_service()).await?;
    Ok(())
}
