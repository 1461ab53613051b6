//! NeuroMark RPC Server: JSON-RPC over stdin/stdout for a host shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready",...} once at startup, then
//!           {"event":"stateChanged","payload":{...}} whenever the host status changes.
//!
//! Logs go to stderr; stdout carries only the protocol.

use std::io::{self, Write};

use neuromark::app::App;
use neuromark::rpc_handler::handle_method;
use neuromark::services::cloud_sync::RemoteStateStore;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("NEUROMARK_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn emit(message: &Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", message)?;
    stdout.flush()
}

fn emit_status<R: RemoteStateStore>(app: &mut App<R>) -> io::Result<()> {
    match app.status_event() {
        Some(payload) => emit(&json!({"event": "stateChanged", "payload": payload})),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let mut app = match App::new(None) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("failed to initialize NeuroMark: {}", e);
            std::process::exit(1);
        }
    };

    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if emit(&ready).is_err() || emit_status(&mut app).is_err() {
        return;
    }
    tracing::info!("rpc server ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                if emit(&json!({"id": null, "error": format!("parse error: {}", e)})).is_err() {
                    break;
                }
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&mut app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => {
                tracing::debug!("{} failed: {}", method, err);
                json!({"id": id, "error": err})
            }
        };
        if emit(&response).is_err() || emit_status(&mut app).is_err() {
            break;
        }
    }
    tracing::info!("rpc server stopped");
}
