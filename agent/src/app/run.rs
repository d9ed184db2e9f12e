//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::errors::AgentError;
use crate::eventer::github::{self, GithubEventer};
use crate::http::client::{Auth, HttpClient};
use crate::informer::{self, Informer};
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::store::rest::{self, RestStateStore};

/// Run the conveyor agent
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AgentError> {
    info!("Initializing conveyor agent...");

    let informer = init_informer(&options)?;

    // Shutdown channel for the auxiliary server
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);

    let server_handle = if options.enable_server {
        let mut rx = shutdown_tx.subscribe();
        let handle = serve(&options.server, Arc::new(ServerState::new()), async move {
            let _ = rx.recv().await;
        })
        .await?;
        Some(handle)
    } else {
        None
    };

    let mut informer_task = tokio::spawn(async move { informer.run().await });

    let result = tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
            informer_task.abort();
            Ok(())
        }
        result = &mut informer_task => {
            match result {
                // The informer only returns after exhausting its retry
                // budget; surface that as the terminal error.
                Ok(result) => {
                    if let Err(e) = &result {
                        error!("informer cannot make progress: {}", e);
                    }
                    result
                }
                Err(e) => Err(AgentError::Internal(format!("informer task failed: {}", e))),
            }
        }
    };

    let _ = shutdown_tx.send(());
    if let Some(handle) = server_handle {
        match handle.await {
            Ok(server_result) => server_result?,
            Err(e) => error!("server task failed during shutdown: {}", e),
        }
    }

    result
}

fn init_informer(options: &AppOptions) -> Result<Informer, AgentError> {
    let github_client = Arc::new(HttpClient::with_auth(
        &options.github.base_url,
        options.http_timeout,
        Auth {
            scheme: "token",
            token: options.github.token.clone(),
        },
    )?);

    let eventer = Arc::new(GithubEventer::new(github::Config {
        http_client: github_client,
        organisation: options.github.organisation.clone(),
        poll_interval: options.github.poll_interval,
    })?);

    let store_client = Arc::new(HttpClient::new(&options.store.base_url, options.http_timeout)?);

    let store = Arc::new(RestStateStore::new(rest::Config {
        http_client: store_client,
        object_name: options.store.object_name.clone(),
    })?);

    Informer::new(informer::Config {
        eventer,
        store,
        backoff: options.backoff.clone(),
        environment: options.github.environment.clone(),
        projects: options.github.projects.clone(),
    })
}
