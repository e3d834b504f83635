//! svckit demo service.
//!
//! ```text
//! svckit [--flag value ...]          run until SIGINT/SIGTERM/SIGQUIT
//! svckit outenv [--flag value ...]   print resolved parameters as KEY=VALUE
//! ```
//!
//! `SVCKIT_CONFIG` may point at a TOML file with service-level options.

use std::path::Path;
use std::time::Duration;

use svckit::{load_config, HttpServer, Service, ServiceConfig, WorkerFn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    svckit::init_tracing("svckit=info,tower_http=debug");

    let config = match std::env::var("SVCKIT_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => ServiceConfig {
            name: "svckit-demo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..ServiceConfig::default()
        },
    };

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let outenv = args.first().is_some_and(|a| a == "outenv");
    if outenv {
        args.remove(0);
    }

    let http = HttpServer::new("http").with_handler(|router| {
        router.route("/hello", axum::routing::get(|| async { "hello" }))
    });

    let service = Service::builder()
        .config(config)
        .with_http_server(http)
        .with_runnable(WorkerFn::new("ticker", "ticker", |ctx, token| async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = token.cancelled() => return Ok(()),
                    _ = interval.tick() => {
                        tracing::info!(service = %ctx.name(), env = %ctx.env(), "Heartbeat");
                    }
                }
            }
        }))
        .args(args)
        .build()?;

    if outenv {
        service.write_env(std::io::stdout().lock())?;
        return Ok(());
    }

    service.init().await?;
    tracing::info!(
        service = %service.name(),
        address = %service.http_server().map(|s| s.uri()).unwrap_or_default(),
        "Service ready"
    );
    service.start().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
