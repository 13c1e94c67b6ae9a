//! Dark Browser RPC Server: JSON-RPC over stdin/stdout for an external UI host.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.open_url", "params":{"url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Host events (`{"event": ...}`) produced while handling a request are
//! written before its response.

use std::error::Error;
use std::future;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

use darkbrowser::app::AppPaths;
use darkbrowser::logging::init_logging;
use darkbrowser::managers::tab_manager::RESTORE_RELOAD_GRACE;
use darkbrowser::rpc_handler::{handle_method, RpcSession};

async fn write_line(out: &mut Stdout, value: &Value) -> io::Result<()> {
    out.write_all(value.to_string().as_bytes()).await?;
    out.write_all(b"\n").await
}

async fn flush_events(out: &mut Stdout, session: &RpcSession) -> io::Result<()> {
    for event in session.outbox.drain() {
        write_line(out, &event).await?;
    }
    out.flush().await
}

async fn run() -> Result<(), Box<dyn Error>> {
    let mut session = RpcSession::new(AppPaths::from_env());
    session.app.startup();

    let mut stdout = io::stdout();
    write_line(&mut stdout, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")})).await?;
    flush_events(&mut stdout, &session).await?;

    let mut reload_at = session
        .app
        .tab_manager
        .has_pending_reload()
        .then(|| Instant::now() + RESTORE_RELOAD_GRACE);

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let deadline = reload_at;
        let reload_timer = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }

                let req: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        write_line(&mut stdout, &json!({"id": null, "error": format!("parse error: {}", e)})).await?;
                        stdout.flush().await?;
                        continue;
                    }
                };

                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                let response = match handle_method(&mut session, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                };
                flush_events(&mut stdout, &session).await?;
                write_line(&mut stdout, &response).await?;
                stdout.flush().await?;

                if method == "app.shutdown" {
                    return Ok(());
                }
            }
            _ = reload_timer => {
                reload_at = None;
                session.app.tab_manager.reload_restored_tabs();
                flush_events(&mut stdout, &session).await?;
            }
        }
    }

    info!("Input closed, shutting down");
    session.app.shutdown();
    flush_events(&mut stdout, &session).await?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run()).map_err(|e| {
        error!(error = %e, "RPC server failed");
        e
    })
}
