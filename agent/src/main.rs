//! Conveyor Agent - Entry Point
//!
//! A daemon that polls a hosted VCS for deployment records and reconciles
//! them into a shared desired-state object for a deployment controller.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use conveyor::app::options::{AppOptions, GithubOptions, ServerOptions, StoreOptions};
use conveyor::app::run::run;
use conveyor::logs::{init_logging, LogOptions};
use conveyor::storage::settings::Settings;
use conveyor::utils::version_info;

use secrecy::SecretString;
use tracing::{error, info};

const DEFAULT_SETTINGS_PATH: &str = "/etc/conveyor/settings.json";
const TOKEN_ENV_VAR: &str = "CONVEYOR_GITHUB_TOKEN";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = match Settings::load(&settings_path).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", settings_path.display(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // The token may come from the environment instead of the settings file
    let token = env::var(TOKEN_ENV_VAR).unwrap_or_else(|_| settings.github.token.clone());

    let options = AppOptions {
        github: GithubOptions {
            base_url: settings.github.base_url.clone(),
            organisation: settings.github.organisation.clone(),
            token: SecretString::from(token),
            environment: settings.github.environment.clone(),
            projects: settings.github.projects.clone(),
            poll_interval: Duration::from_secs(settings.github.poll_interval_secs),
        },
        store: StoreOptions {
            base_url: settings.store.base_url.clone(),
            object_name: settings.store.object_name.clone(),
        },
        http_timeout: Duration::from_secs(settings.http_timeout_secs),
        enable_server: settings.enable_server,
        server: ServerOptions {
            host: settings.server_host.clone(),
            port: settings.server_port,
        },
        ..Default::default()
    };

    info!("Running conveyor agent with options: {:?}", options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        // Sustained failure against the remotes is escalated to the process
        // supervisor via a non-zero exit.
        error!("Failed to run the agent: {e}");
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to listen for SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to listen for SIGINT");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
