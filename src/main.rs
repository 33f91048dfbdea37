use tls_hello_probe::AppState;
use tls_hello_probe::config::ProbeConfig;
use tls_hello_probe::handlers::batch_handler::scan_targets;
use tls_hello_probe::routes::probe_routes;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main] // the program entry point using the Tokio async runtime.
async fn main() {
    dotenvy::dotenv().ok(); //loads environment variables

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ProbeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() {
        serve(config).await;
    } else {
        let failures = probe_targets(targets, config).await;
        if failures > 0 {
            std::process::exit(1);
        }
    }
}

/// Probes every target concurrently (bounded), printing one JSON line per
/// success. Failures are logged and skipped; returns how many failed.
async fn probe_targets(targets: Vec<String>, config: ProbeConfig) -> usize {
    let state = AppState::new(config);
    let mut failures = 0;

    for (target, outcome) in scan_targets(&state, targets).await {
        match outcome {
            Ok(result) => match serde_json::to_string(&result) {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    failures += 1;
                    error!(target = %target, error = %e, "failed to serialize result");
                }
            },
            Err(e) => {
                failures += 1;
                warn!(target = %target, kind = e.kind(), error = %e, "probe failed");
            }
        }
    }
    failures
}

async fn serve(config: ProbeConfig) {
    let bind_addr = config.bind_addr.clone();
    let app = probe_routes::router(AppState::new(config));

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %bind_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
    }
}
