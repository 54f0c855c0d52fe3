//! Pinegate Web Server
//!
//! Delegated access control for Pine scripts behind a small JSON API.

use clap::Parser;
use pinegate_core::logging::{init_logging, LoggingConfig};
use pinegate_web::server::PinegateServer;
use pinegate_web::WebConfig;

/// Pinegate Web Server - delegated Pine-script access control
#[derive(Parser)]
#[command(name = "pinegate-web")]
#[command(about = "A web interface for Pinegate")]
#[command(version)]
struct Args {
    /// Server host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Credentials and platform settings come from the environment
    dotenvy::dotenv().ok();

    let logging = LoggingConfig {
        level: args.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mut config = WebConfig::from_env();
    config.host = args.host;
    config.port = args.port;

    let server = match PinegateServer::new(config).await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
