use crate::AppState;
use crate::models::scan_result::ScanResult;
use crate::services::scanner::{ScanError, scan_domain};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Probe did not run: {0}")]
    NotRun(String),
}

impl TargetError {
    pub fn kind(&self) -> &'static str {
        match self {
            TargetError::Scan(e) => e.kind(),
            TargetError::NotRun(_) => "unavailable",
        }
    }
}

/// Scans every target concurrently, at most `limiter` permits at a time.
/// Results come back in completion order, one per target.
pub async fn scan_targets(
    state: &AppState,
    targets: Vec<String>,
) -> Vec<(String, Result<ScanResult, TargetError>)> {
    let mut tasks = JoinSet::new();

    for target in targets {
        let state = state.clone();
        tasks.spawn(async move {
            let permit = match state.limiter.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (target, Err(TargetError::NotRun(e.to_string()))),
            };
            let config = Arc::clone(&state.config);
            let scan_target = target.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                scan_domain(&scan_target, &config)
            })
            .await;
            let outcome = match outcome {
                Ok(scan) => scan.map_err(TargetError::from),
                Err(e) => Err(TargetError::NotRun(e.to_string())),
            };
            (target, outcome)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            Err(e) => debug!(error = %e, "scan task aborted"),
        }
    }
    results
}
