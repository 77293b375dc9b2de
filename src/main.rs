// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use restyle_node::{
    api::{build_state, start_server},
    config::ServerConfig,
};
use std::env;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Restyle Node...\n");
    println!("📦 BUILD VERSION: {}", restyle_node::version::VERSION);
    println!("📅 {}", restyle_node::version::get_version_string());
    println!("🧩 Features: {}", restyle_node::version::FEATURES.join(", "));
    println!();

    let config = ServerConfig::parse();
    if let Err(e) = config.validate() {
        tracing::error!("❌ {}", e);
        tracing::error!("Please set your OpenAI API key in the .env file or environment");
        std::process::exit(1);
    }
    println!("✅ OpenAI API key found, initializing server...");

    let state = build_state(&config).await?;
    let styles = state.pipeline.styles().keys().join(", ");
    let port = config.port;

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 Restyle Node is running!");
    println!("{}", separator);
    println!("Listening:      {}", config.listen_addr());
    println!("Model:          {}", config.model);
    println!("Styles:         {}", styles);
    println!("Uploads dir:    {}", config.uploads_dir.display());
    println!("Results dir:    {}", config.results_dir.display());
    println!(
        "OpenAI API key: {}",
        if config.readiness().credential_configured() {
            "✅ Configured"
        } else {
            "❌ Missing"
        }
    );
    println!("\nAPI Endpoints:");
    println!("  Transform:    POST http://localhost:{}/transform", port);
    println!("  Result:       GET  http://localhost:{}/result/:id", port);
    println!("  Health:       GET  http://localhost:{}/health", port);
    println!("\nTest with curl:");
    println!(
        "  curl -F image=@photo.jpg -F style=shadow http://localhost:{}/transform",
        port
    );
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    tokio::select! {
        result = start_server(&config, state) => {
            result?;
        }
        _ = signal::ctrl_c() => {
            println!("\n⏹️  Shutting down...");
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}
