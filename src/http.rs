//! HTTP front door: the index route and the outgoing webhook endpoint.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const WEBHOOK_PATH: &str = "/outgoing_webhook";
pub const WEBHOOK_ACK: &str = "foodbot is here!";

async fn index() -> &'static str {
    "hi"
}

/// The platform posts form fields; the reply is always the same.
async fn outgoing_webhook(Form(fields): Form<HashMap<String, String>>) -> Json<Value> {
    info!(
        "🪝 Outgoing webhook from {} in {}",
        fields.get("user_name").map(String::as_str).unwrap_or("unknown"),
        fields.get("channel_name").map(String::as_str).unwrap_or("unknown"),
    );
    Json(json!({ "text": WEBHOOK_ACK }))
}

fn with_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `GET /`, plus the webhook route when it shares the port.
pub fn front_door(include_webhook: bool) -> Router {
    let mut router = Router::new().route("/", get(index));
    if include_webhook {
        router = router.route(WEBHOOK_PATH, post(outgoing_webhook));
    }
    with_layers(router)
}

/// Standalone router for the webhook listener.
pub fn webhook() -> Router {
    with_layers(Router::new().route(WEBHOOK_PATH, post(outgoing_webhook)))
}

/// Bind `0.0.0.0:port` and serve until Ctrl+C or SIGTERM.
pub async fn serve(name: &'static str, port: u16, router: Router) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("🌐 {} listening on: {}", name, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(name))
        .await
}

async fn shutdown_signal(name: &'static str) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("{} shutting down", name);
}
