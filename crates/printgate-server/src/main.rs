// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate — HTTP print middleware for LAN label clients
//
// Entry point. Initialises logging, loads configuration, wires the services
// and serves HTTP until interrupted, then flushes pending temp-file cleanups.

use actix_web::{App, HttpServer, middleware, web};

use printgate_core::AppConfig;
use printgate_core::error::Result;
use printgate_server::network::detect_local_ip;
use printgate_server::{AppState, configure};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Printgate starting");

    let config = AppConfig::load()?;
    let state = web::Data::new(AppState::from_config(&config));
    let lan_ip = detect_local_ip();
    let host = config.host.clone().unwrap_or_else(|| lan_ip.to_string());

    tracing::info!(
        url = %format!("http://{host}:{}", config.port),
        %lan_ip,
        printer = %state.registry.current(),
        store = %state.registry.store_path().display(),
        "print middleware listening"
    );

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), config.port))?
    .run()
    .await?;

    tracing::info!("server stopped");
    state.temp_files.drain().await;
    Ok(())
}
