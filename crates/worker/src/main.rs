//! Groupflow worker: connects to the engine, listens for group
//! trigger events, and drives the group scheduler.

mod config;
mod processor;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use groupflow_core::canvas::CanvasModel;
use groupflow_engine::api::EngineApi;
use groupflow_engine::client::EngineClient;
use groupflow_scheduler::scheduler::GroupScheduler;

use crate::config::WorkerConfig;
use crate::processor::process_messages;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groupflow_worker=debug,groupflow_scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    tracing::info!(
        engine_url = %config.engine_url,
        ws_url = %config.ws_url,
        workflow = %config.workflow_path,
        "Worker starting",
    );

    let model = match load_model(&config.workflow_path) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            tracing::error!(path = %config.workflow_path, error = %e, "Failed to load workflow");
            std::process::exit(1);
        }
    };

    let transport = Arc::new(EngineApi::new(config.engine_url.clone()));
    let scheduler = Arc::new(GroupScheduler::new(model, transport));
    let client = EngineClient::new(config.ws_url.clone());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        });
    }

    run_connection_loop(&client, &scheduler, &cancel).await;
    tracing::info!("Worker shut down");
}

/// Load and parse the canvas document the scheduler resolves groups
/// against.
fn load_model(path: &str) -> Result<CanvasModel, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(CanvasModel::from_json(&text)?)
}

/// Core connection loop: connect -> process messages -> reconnect.
///
/// Runs until the cancellation token is triggered.
async fn run_connection_loop(
    client: &EngineClient,
    scheduler: &Arc<GroupScheduler>,
    cancel: &CancellationToken,
) {
    loop {
        // Connect, retrying with backoff; None means we were cancelled.
        let Some(mut ws_stream) = client.connect_with_retry(cancel).await else {
            return;
        };

        // Process messages until the connection drops.
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = process_messages(&mut ws_stream, scheduler) => {}
        }

        if cancel.is_cancelled() {
            return;
        }

        tracing::info!("Connection lost, reconnecting");
    }
}
