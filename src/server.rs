use axum::{http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::error::CpMigrateError;
use crate::migration::UpdateEngine;

pub struct WebServer {
    host: String,
    port: u16,
    state: AppState,
}

impl WebServer {
    pub fn new(host: String, port: u16, engine: UpdateEngine) -> Self {
        Self {
            host,
            port,
            state: AppState::new(engine),
        }
    }

    pub async fn start(&self) -> Result<(), CpMigrateError> {
        let app = self.create_router();

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| CpMigrateError::Error(format!("Invalid address: {}", e)))?;

        println!("cpmigrate server listening on http://{}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CpMigrateError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("Server ready to handle requests");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                log::info!("Shutdown signal received, stopping server");
                println!("\nShutdown signal received - stopping server gracefully...");
            })
            .await
            .map_err(|e| CpMigrateError::Error(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");

        Ok(())
    }

    fn create_router(&self) -> Router {
        router(self.state.clone())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/database-update",
            get(api::database_update::get_update_status).post(api::database_update::apply_updates),
        )
        .with_state(state)
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
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
}
