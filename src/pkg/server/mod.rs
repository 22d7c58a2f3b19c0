pub mod handlers;
pub mod middlewares;
pub mod router;
pub mod state;

use crate::{conf::settings, prelude::Result};
use router::build_routes;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for ctrl+c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl+c interrupt, draining connections");
}

pub async fn listen() -> Result<()> {
    let app = build_routes().await?;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &settings.listen_port)).await?;
    tracing::info!("{} listening at port {}", &settings.service_name, &settings.listen_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}
