//! # Static HTTPD - Entry Point
//! src/main.rs
//!
//! Punto de entrada: instala el logging, lee la configuración y corre el
//! servidor hasta recibir Ctrl+C.

use anyhow::{anyhow, Context};
use static_httpd::config::Config;
use static_httpd::server::{spawn_ctrl_c_listener, Server};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = Config::new();
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .context("Invalid configuration")?;
    config.log_summary();

    let server = Server::bind(&config)
        .with_context(|| format!("Failed to start server on {}", config.address()))?;

    spawn_ctrl_c_listener(server.shutdown_handle()).context("Failed to install Ctrl+C handler")?;
    server.run().context("Accept loop failed")?;

    tracing::info!("Server stopped");
    Ok(())
}
